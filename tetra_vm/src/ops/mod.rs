//! Instruction actions, organized by category.
//!
//! One static [`Action`](crate::instruction::Action) per opcode. Each
//! handler documents its own stack layout; the layouts are per-opcode
//! conventions shared with the compiler.

mod calls;
mod containers;
mod control;
mod load_store;
mod objects;

pub use calls::{INVOKE_BLOCK, SEND};
pub use containers::{NEW_ARRAY, SPLAT_ARRAY};
pub use control::{BRANCH_IF, BRANCH_UNLESS, JUMP, LEAVE};
pub use load_store::{DUP, GET_IVAR, GET_LOCAL, POP, PUT_OBJECT, PUT_SELF, SET_IVAR, SET_LOCAL};
pub use objects::{DEF_CLASS, DEF_METHOD, GET_CONSTANT};

use crate::instruction::Param;

/// String parameter at `index`, or `""` for a malformed emission.
pub(crate) fn str_param<'a>(params: &'a [Param], index: usize) -> &'a str {
    params.get(index).and_then(Param::as_str).unwrap_or("")
}

/// Non-negative integer parameter at `index`, or `0`.
pub(crate) fn usize_param(params: &[Param], index: usize) -> usize {
    params
        .get(index)
        .and_then(Param::as_int)
        .map(|i| i.max(0) as usize)
        .unwrap_or(0)
}
