//! Definition opcodes: methods, classes, constants.

use std::rc::Rc;

use super::str_param;
use crate::frame::{CallFrame, FrameRef};
use crate::instruction::{Action, Param};
use crate::objects::{ErrorKind, MethodObject, Value};
use crate::thread::Thread;

/// `def_method <name>`. No stack traffic.
///
/// Looks up the method body registered under `(name, current file)` and
/// attaches it to `self`'s class: inside a class body `self` is the class
/// itself, at the top level it is the main object (so the method lands on
/// `Object`).
pub static DEF_METHOD: Action = Action {
    name: "def_method",
    operation: def_method,
};

fn def_method(thread: &mut Thread, frame: &FrameRef, params: &[Param]) {
    let name = str_param(params, 0).to_string();
    let filename = frame.borrow().instruction_set.filename.clone();
    let Some(set) = thread.machine().get_method_is(&name, &filename) else {
        thread.push_error_object(
            ErrorKind::Internal,
            format!("Undefined method definition '{}' in {}", name, filename),
        );
        return;
    };
    let method = Value::Method(Rc::new(MethodObject::new(&name, set)));
    let self_value = frame.borrow().self_value.clone();
    let target = match &self_value {
        Value::Class(class) => class.clone(),
        other => other.class(thread.machine()),
    };
    target.define_instance_method(&name, method);
}

/// `def_class <name>`. Stack: `[...]` to `[..., class]`.
///
/// Gets or creates the top-level class, runs its class body (when one is
/// registered for the current file) with `self` bound to the class, and
/// leaves the class on the stack. Body leftovers are discarded; a body
/// error unwinds as usual.
pub static DEF_CLASS: Action = Action {
    name: "def_class",
    operation: def_class,
};

fn def_class(thread: &mut Thread, frame: &FrameRef, params: &[Param]) {
    let name = str_param(params, 0).to_string();
    let filename = frame.borrow().instruction_set.filename.clone();
    let class = thread.machine().define_top_level_class(&name);

    if let Some(body) = thread.machine().get_class_is(&name, &filename) {
        let sp_before = thread.stack.sp();
        let body_frame = CallFrame::new(body, Value::Class(class.clone())).into_ref();
        thread.call_frame_stack.push(body_frame);
        thread.start_from_top_frame();
        thread.call_frame_stack.pop();
        if thread.has_error() {
            return;
        }
        thread.stack.set_sp(sp_before);
    }

    thread.stack.push(Value::Class(class));
}

/// `get_constant <name>`. Stack: `[...]` to `[..., class]`.
pub static GET_CONSTANT: Action = Action {
    name: "get_constant",
    operation: get_constant,
};

fn get_constant(thread: &mut Thread, _frame: &FrameRef, params: &[Param]) {
    let name = str_param(params, 0);
    match thread.machine().top_level_class(name) {
        Some(class) => thread.stack.push(Value::Class(class)),
        None => thread.push_error_object(
            ErrorKind::Internal,
            format!("uninitialized constant {}", name),
        ),
    }
}
