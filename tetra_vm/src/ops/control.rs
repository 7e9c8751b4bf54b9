//! Jumps and frame termination.

use super::usize_param;
use crate::frame::FrameRef;
use crate::instruction::{Action, Param};
use crate::thread::Thread;

/// `jump <target>`. Unconditional; `target` is an absolute pc.
pub static JUMP: Action = Action {
    name: "jump",
    operation: jump,
};

fn jump(_thread: &mut Thread, frame: &FrameRef, params: &[Param]) {
    frame.borrow_mut().pc = usize_param(params, 0);
}

/// `branch_unless <target>`. Stack: `[..., cond]` to `[...]`.
/// Jumps when the condition is falsy (`nil` or `false`).
pub static BRANCH_UNLESS: Action = Action {
    name: "branch_unless",
    operation: branch_unless,
};

fn branch_unless(thread: &mut Thread, frame: &FrameRef, params: &[Param]) {
    let condition = thread.stack.pop();
    if !condition.map(|v| v.is_truthy()).unwrap_or(false) {
        frame.borrow_mut().pc = usize_param(params, 0);
    }
}

/// `branch_if <target>`. Stack: `[..., cond]` to `[...]`.
pub static BRANCH_IF: Action = Action {
    name: "branch_if",
    operation: branch_if,
};

fn branch_if(thread: &mut Thread, frame: &FrameRef, params: &[Param]) {
    let condition = thread.stack.pop();
    if condition.map(|v| v.is_truthy()).unwrap_or(false) {
        frame.borrow_mut().pc = usize_param(params, 0);
    }
}

/// `leave`. Terminates the current frame by forcing `pc` past the end.
/// The code path that pushed the frame pops it once the loop returns.
pub static LEAVE: Action = Action {
    name: "leave",
    operation: leave,
};

fn leave(_thread: &mut Thread, frame: &FrameRef, _params: &[Param]) {
    let mut frame = frame.borrow_mut();
    frame.pc = frame.instruction_set.instructions.len();
}
