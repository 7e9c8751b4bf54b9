//! Arrays and their builtins.

use std::rc::Rc;

use super::class::RClass;
use super::method::{BuiltinMethodObject, CallContext};
use super::{ErrorKind, Value};
use crate::thread::Thread;

/// A growable ordered collection.
///
/// `splat` tags an array produced at a splat argument site: the send
/// protocol expands such an array into individual actuals instead of
/// passing it as one.
pub struct ArrayObject {
    pub class: Rc<RClass>,
    pub elements: Vec<Value>,
    pub splat: bool,
}

impl ArrayObject {
    pub fn new(class: Rc<RClass>, elements: Vec<Value>) -> Self {
        Self {
            class,
            elements,
            splat: false,
        }
    }
}

// =============================================================================
// Builtins
// =============================================================================

pub(crate) fn instance_methods() -> Vec<BuiltinMethodObject> {
    vec![
        BuiltinMethodObject::new("each", array_each),
        BuiltinMethodObject::new("push", array_push),
        BuiltinMethodObject::new("length", array_length),
        BuiltinMethodObject::new("at", array_at),
    ]
}

/// Yields every element to the block, in order. Returns the receiver.
/// A yield that produces an error aborts the iteration and propagates it.
fn array_each(thread: &mut Thread, call: CallContext) -> Value {
    let Some(block_frame) = call.block_frame.clone() else {
        return thread.machine().init_error_object(
            ErrorKind::Internal,
            "Method each requires a block argument".to_string(),
        );
    };
    let Value::Array(array) = &call.receiver else {
        return thread.wrong_type_error("Array", &call.receiver);
    };

    let elements = array.borrow().elements.clone();
    for element in elements {
        let result = thread.builtin_method_yield(&block_frame, &[element]);
        if result.is_error() {
            return result;
        }
    }
    call.receiver.clone()
}

/// Appends every argument. Returns the receiver.
fn array_push(thread: &mut Thread, call: CallContext) -> Value {
    let Value::Array(array) = &call.receiver else {
        return thread.wrong_type_error("Array", &call.receiver);
    };
    array.borrow_mut().elements.extend(call.args.iter().cloned());
    call.receiver.clone()
}

fn array_length(thread: &mut Thread, call: CallContext) -> Value {
    let Value::Array(array) = &call.receiver else {
        return thread.wrong_type_error("Array", &call.receiver);
    };
    let len = array.borrow().elements.len();
    Value::Integer(len as i64)
}

/// Element at a zero-based index; out-of-range reads produce `nil`.
fn array_at(thread: &mut Thread, call: CallContext) -> Value {
    let Value::Array(array) = &call.receiver else {
        return thread.wrong_type_error("Array", &call.receiver);
    };
    let Some(Value::Integer(index)) = call.args.first() else {
        let got = call.args.first().cloned().unwrap_or(Value::Null);
        return thread.wrong_type_error("Integer", &got);
    };
    if *index < 0 {
        return Value::Null;
    }
    array
        .borrow()
        .elements
        .get(*index as usize)
        .cloned()
        .unwrap_or(Value::Null)
}
