//! Literal, local, and instance-variable traffic.

use super::{str_param, usize_param};
use crate::frame::{self, FrameRef};
use crate::instruction::{Action, Param};
use crate::objects::Value;
use crate::thread::Thread;

/// `put_object <literal>`. Stack: `[...]` to `[..., literal]`.
pub static PUT_OBJECT: Action = Action {
    name: "put_object",
    operation: put_object,
};

fn put_object(thread: &mut Thread, _frame: &FrameRef, params: &[Param]) {
    let value = params.first().map(Param::to_value).unwrap_or(Value::Null);
    thread.stack.push(value);
}

/// `put_self`. Stack: `[...]` to `[..., self]`.
pub static PUT_SELF: Action = Action {
    name: "put_self",
    operation: put_self,
};

fn put_self(thread: &mut Thread, frame: &FrameRef, _params: &[Param]) {
    let value = frame.borrow().self_value.clone();
    thread.stack.push(value);
}

/// `pop`. Stack: `[..., a]` to `[...]`.
pub static POP: Action = Action {
    name: "pop",
    operation: pop,
};

fn pop(thread: &mut Thread, _frame: &FrameRef, _params: &[Param]) {
    thread.stack.pop();
}

/// `dup`. Stack: `[..., a]` to `[..., a, a]`.
pub static DUP: Action = Action {
    name: "dup",
    operation: dup,
};

fn dup(thread: &mut Thread, _frame: &FrameRef, _params: &[Param]) {
    let value = thread.stack.top().cloned().unwrap_or(Value::Null);
    thread.stack.push(value);
}

/// `get_local <index> <depth>`. Stack: `[...]` to `[..., value]`.
/// Resolves through the `ep` chain; an unset local reads as `nil`.
pub static GET_LOCAL: Action = Action {
    name: "get_local",
    operation: get_local,
};

fn get_local(thread: &mut Thread, frame: &FrameRef, params: &[Param]) {
    let index = usize_param(params, 0);
    let depth = usize_param(params, 1);
    let value = frame::lookup_local(frame, index, depth).unwrap_or(Value::Null);
    thread.stack.push(value);
}

/// `set_local <index> <depth>`. Stack: `[..., value]` to `[..., value]`.
/// Assignment is an expression: the value stays on the stack.
pub static SET_LOCAL: Action = Action {
    name: "set_local",
    operation: set_local,
};

fn set_local(thread: &mut Thread, frame: &FrameRef, params: &[Param]) {
    let index = usize_param(params, 0);
    let depth = usize_param(params, 1);
    let value = thread.stack.top().cloned().unwrap_or(Value::Null);
    frame::assign_local(frame, index, depth, value);
}

/// `get_ivar <name>`. Stack: `[...]` to `[..., value]`.
/// Reads an instance variable of `self`; unset or non-instance reads as
/// `nil`.
pub static GET_IVAR: Action = Action {
    name: "get_ivar",
    operation: get_ivar,
};

fn get_ivar(thread: &mut Thread, frame: &FrameRef, params: &[Param]) {
    let name = str_param(params, 0);
    let value = match &frame.borrow().self_value {
        Value::Instance(object) => object.instance_variable(name).unwrap_or(Value::Null),
        _ => Value::Null,
    };
    thread.stack.push(value);
}

/// `set_ivar <name>`. Stack: `[..., value]` to `[..., value]`.
/// Writes an instance variable of `self`; ignored on non-instances.
pub static SET_IVAR: Action = Action {
    name: "set_ivar",
    operation: set_ivar,
};

fn set_ivar(thread: &mut Thread, frame: &FrameRef, params: &[Param]) {
    let name = str_param(params, 0);
    let value = thread.stack.top().cloned().unwrap_or(Value::Null);
    if let Value::Instance(object) = &frame.borrow().self_value {
        object.set_instance_variable(name, value);
    }
}
