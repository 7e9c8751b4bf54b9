//! Method objects: compiled methods and builtins.

use std::sync::Arc;

use smallvec::SmallVec;
use tetra_bytecode::ArgSet;

use crate::frame::FrameRef;
use crate::instruction::InstructionSet;
use crate::thread::Thread;

use super::Value;

/// A compiled method: a name bound to a registered instruction set.
pub struct MethodObject {
    pub name: Arc<str>,
    pub instruction_set: Arc<InstructionSet>,
}

impl MethodObject {
    pub fn new(name: &str, instruction_set: Arc<InstructionSet>) -> Self {
        Self {
            name: Arc::from(name),
            instruction_set,
        }
    }

    /// The parameter metadata the binder walks.
    pub fn arg_set(&self) -> &ArgSet {
        &self.instruction_set.arg_set
    }
}

/// Everything a builtin body receives for one invocation.
///
/// The receiver and the stack window `[receiver+1, receiver+1+argc)` are
/// snapshotted before the body runs, so the body may grow and shrink the
/// evaluation stack freely (e.g. through [`Thread::builtin_method_yield`]).
pub struct CallContext {
    pub receiver: Value,
    pub args: SmallVec<[Value; 8]>,
    pub block_frame: Option<FrameRef>,
    pub source_line: usize,
}

/// A builtin method body. Plain function pointer: builtins never capture
/// state; everything they need arrives through the context.
pub type BuiltinBody = fn(&mut Thread, CallContext) -> Value;

/// A native method attached to a class method table.
pub struct BuiltinMethodObject {
    pub name: &'static str,
    pub body: BuiltinBody,
}

impl BuiltinMethodObject {
    pub fn new(name: &'static str, body: BuiltinBody) -> Self {
        Self { name, body }
    }
}

impl std::fmt::Debug for BuiltinMethodObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#<Method: {}>", self.name)
    }
}
