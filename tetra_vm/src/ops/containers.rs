//! Array construction.

use super::usize_param;
use crate::frame::FrameRef;
use crate::instruction::{Action, Param};
use crate::objects::Value;
use crate::thread::Thread;

/// `new_array <count>`. Stack: `[..., e0..eN-1]` to `[..., array]`.
pub static NEW_ARRAY: Action = Action {
    name: "new_array",
    operation: new_array,
};

fn new_array(thread: &mut Thread, _frame: &FrameRef, params: &[Param]) {
    let count = usize_param(params, 0);
    let start = thread.stack.sp().saturating_sub(count);
    let mut elements = Vec::with_capacity(count);
    for i in 0..count {
        elements.push(thread.stack.get(start + i).cloned().unwrap_or(Value::Null));
    }
    thread.stack.set_sp(start);
    let array = thread.machine().init_array(elements);
    thread.stack.push(array);
}

/// `splat_array`. Stack: `[..., array]` to `[..., array*]`.
/// Tags the array on top as a splat site, making the send protocol expand
/// it into individual actuals. A non-array top is left untouched.
pub static SPLAT_ARRAY: Action = Action {
    name: "splat_array",
    operation: splat_array,
};

fn splat_array(thread: &mut Thread, _frame: &FrameRef, _params: &[Param]) {
    if let Some(Value::Array(array)) = thread.stack.top() {
        array.borrow_mut().splat = true;
    }
}
