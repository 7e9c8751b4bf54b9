//! Call-site opcodes.

use super::{str_param, usize_param};
use crate::frame::{self, CallFrame, FrameRef};
use crate::instruction::{Action, Param};
use crate::objects::{ErrorKind, Value};
use crate::thread::Thread;

use tetra_bytecode::ArgSet;

/// `send <name> <argc> <block-flag> [<call-arg-set>]`
///
/// Stack: `[..., receiver, name-marker, arg0..argN-1]` to `[..., result]`.
///
/// `argc` counts the real actuals; the marker slot is accounted for when
/// entering the shared convention (`Thread::send_method` compacts it away
/// unconditionally). A non-empty block flag materializes the named block
/// first; the block frame is pushed for the duration of the call and
/// popped here afterwards.
pub static SEND: Action = Action {
    name: "send",
    operation: send,
};

fn send(thread: &mut Thread, frame: &FrameRef, params: &[Param]) {
    let name = str_param(params, 0).to_string();
    let argc = usize_param(params, 1);
    let block_flag = str_param(params, 2).to_string();
    let source_line = frame.borrow().source_line;

    let block_frame = if block_flag.is_empty() {
        None
    } else {
        match thread.retrieve_block(frame, &block_flag) {
            Some(block_frame) => Some(block_frame),
            // Lookup failed; the error is already on the stack.
            None => return,
        }
    };

    let call_args = match params.get(3) {
        Some(Param::ArgSet(arg_set)) => arg_set.clone(),
        _ => ArgSet::default(),
    };

    thread.send_method(&name, argc + 1, block_frame.clone(), &call_args, source_line);

    if block_frame.is_some() {
        thread.call_frame_stack.pop();
    }
}

/// `invoke_block <argc>`, the `yield` opcode.
///
/// Stack: `[..., self, arg0..argN-1]` to `[..., result]`.
///
/// The yield target is the block of the nearest frame up the `ep` chain
/// that carries one; yielding without a surrounding block is an
/// `InternalError`. The invocation frame inherits `ep` from the block's
/// defining frame, which is what makes free variables late-bound.
pub static INVOKE_BLOCK: Action = Action {
    name: "invoke_block",
    operation: invoke_block,
};

fn invoke_block(thread: &mut Thread, frame: &FrameRef, params: &[Param]) {
    let argc = usize_param(params, 0);
    if thread.stack.sp() < argc + 1 {
        thread.push_error_object(
            ErrorKind::Internal,
            "malformed yield site".to_string(),
        );
        return;
    }
    let arg_ptr = thread.stack.sp() - argc;
    let receiver_ptr = arg_ptr - 1;

    let Some(block_frame) = frame::surrounding_block(frame) else {
        let error = thread
            .machine()
            .init_error_object(ErrorKind::Internal, "Can't yield without a block".to_string());
        thread.stack.set(receiver_ptr, error);
        thread.stack.set_sp(receiver_ptr + 1);
        return;
    };

    let receiver = thread.stack.get(receiver_ptr).cloned().unwrap_or(Value::Null);
    let mut args = Vec::with_capacity(argc);
    for i in 0..argc {
        args.push(thread.stack.get(arg_ptr + i).cloned().unwrap_or(Value::Null));
    }

    let invocation = {
        let block = block_frame.borrow();
        let mut invocation = CallFrame::new(block.instruction_set.clone(), receiver);
        invocation.is_block = true;
        invocation.ep = block.ep.clone();
        invocation.into_ref()
    };
    {
        let mut invocation = invocation.borrow_mut();
        for (index, arg) in args.into_iter().enumerate() {
            invocation.insert_local(index, arg);
        }
    }

    thread.call_frame_stack.push(invocation);
    thread.start_from_top_frame();
    thread.call_frame_stack.pop();

    let result = thread.stack.top().cloned().unwrap_or(Value::Null);
    thread.stack.set(receiver_ptr, result);
    thread.stack.set_sp(arg_ptr);
}
