//! Builtins of the `Object` root class.
//!
//! Instance methods defined here are inherited by every value; the
//! class-level `new`/`name` pair is inherited by every class object through
//! the class-method chain.

use super::instance::RObject;
use super::method::{BuiltinMethodObject, CallContext};
use super::{values_equal, ErrorKind, Value};
use crate::frame::surrounding_block;
use crate::thread::Thread;

pub(crate) fn instance_methods() -> Vec<BuiltinMethodObject> {
    vec![
        BuiltinMethodObject::new("send", object_send),
        BuiltinMethodObject::new("==", object_eq),
        BuiltinMethodObject::new("!=", object_ne),
        BuiltinMethodObject::new("to_s", object_to_s),
        BuiltinMethodObject::new("to_json", object_to_json),
        BuiltinMethodObject::new("class", object_class),
        BuiltinMethodObject::new("block_given?", object_block_given),
    ]
}

pub(crate) fn class_methods() -> Vec<BuiltinMethodObject> {
    vec![
        BuiltinMethodObject::new("new", class_new),
        BuiltinMethodObject::new("name", class_name),
    ]
}

// =============================================================================
// Instance methods
// =============================================================================

/// `receiver.send(name, args...)`: re-enters the shared calling
/// convention. The name argument is still on the stack in the marker
/// position, so the forwarded call reuses the snapshot window in place.
fn object_send(thread: &mut Thread, call: CallContext) -> Value {
    let Some(name_value) = call.args.first() else {
        return thread.machine().init_error_object(
            ErrorKind::Argument,
            "Expect at least 1 args for method 'send'. got: 0".to_string(),
        );
    };
    let name = name_value.to_string();
    thread.send_method(
        &name,
        call.args.len(),
        call.block_frame.clone(),
        &Default::default(),
        call.source_line,
    );
    thread.stack.top().cloned().unwrap_or(Value::Null)
}

fn object_eq(_thread: &mut Thread, call: CallContext) -> Value {
    let right = call.args.first().cloned().unwrap_or(Value::Null);
    Value::Boolean(values_equal(&call.receiver, &right))
}

fn object_ne(_thread: &mut Thread, call: CallContext) -> Value {
    let right = call.args.first().cloned().unwrap_or(Value::Null);
    Value::Boolean(!values_equal(&call.receiver, &right))
}

fn object_to_s(_thread: &mut Thread, call: CallContext) -> Value {
    Value::string(&call.receiver.to_string())
}

fn object_to_json(_thread: &mut Thread, call: CallContext) -> Value {
    Value::string(&call.receiver.to_json())
}

fn object_class(thread: &mut Thread, call: CallContext) -> Value {
    Value::Class(call.receiver.class(thread.machine()))
}

/// Whether the invocation the current frame belongs to received a block.
fn object_block_given(thread: &mut Thread, _call: CallContext) -> Value {
    let given = thread
        .call_frame_stack
        .top()
        .map(|frame| surrounding_block(frame).is_some())
        .unwrap_or(false);
    Value::Boolean(given)
}

// =============================================================================
// Class methods
// =============================================================================

/// Allocate an instance. When the class defines `initialize`, the
/// interpreter binds the constructor arguments against it right after this
/// body returns (see the `new` special case in builtin invocation).
fn class_new(thread: &mut Thread, call: CallContext) -> Value {
    let Value::Class(class) = &call.receiver else {
        return thread.machine().init_error_object(
            ErrorKind::Internal,
            format!("'new' called on non-class {}", call.receiver),
        );
    };
    let object = RObject::new(class.clone());
    if let Some(Value::Method(method)) = class.lookup_instance_method("initialize") {
        object.set_initialize_method(method);
    }
    Value::Instance(object)
}

fn class_name(thread: &mut Thread, call: CallContext) -> Value {
    let Value::Class(class) = &call.receiver else {
        return thread.machine().init_error_object(
            ErrorKind::Internal,
            format!("'name' called on non-class {}", call.receiver),
        );
    };
    Value::string(class.name())
}
