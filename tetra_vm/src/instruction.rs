//! Instructions, instruction sets, and the emission builder.
//!
//! An [`Instruction`] pairs a static [`Action`] with its parameters. Actions
//! are plain function pointers over the thread and the current frame, so a
//! compiled [`InstructionSet`] is immutable and freely shared.
//!
//! Instruction sets are identified by a `(label, filename)` key in the
//! machine registries and come in the flavors of [`SetKind`]. A method set
//! additionally carries its [`ArgSet`] and the default instruction sequences
//! its optioned parameters refer to.
//!
//! [`InstructionSetBuilder`] is the emission API the compiler (and the test
//! suites standing in for it) drive.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use tetra_bytecode::{ArgSet, ParamKind};

use crate::frame::FrameRef;
use crate::objects::Value;
use crate::ops;
use crate::thread::Thread;

// =============================================================================
// Parameters
// =============================================================================

/// One instruction parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum Param {
    Int(i64),
    Str(Arc<str>),
    Bool(bool),
    Null,
    /// Call-site argument descriptor carried by `send` when any actual is a
    /// keyword argument.
    ArgSet(ArgSet),
}

impl Param {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Param::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Param::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The runtime value of a literal parameter.
    pub fn to_value(&self) -> Value {
        match self {
            Param::Int(i) => Value::Integer(*i),
            Param::Str(s) => Value::string(s),
            Param::Bool(b) => Value::Boolean(*b),
            Param::Null => Value::Null,
            // Descriptors are call metadata, never data.
            Param::ArgSet(_) => Value::Null,
        }
    }
}

// =============================================================================
// Actions and instructions
// =============================================================================

/// Operation signature shared by every instruction.
pub type Operation = fn(&mut Thread, &FrameRef, &[Param]);

/// A named operation. One static per opcode lives in [`crate::ops`].
pub struct Action {
    pub name: &'static str,
    pub operation: Operation,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action({})", self.name)
    }
}

/// One `(action, params)` pair.
#[derive(Clone)]
pub struct Instruction {
    pub action: &'static Action,
    pub params: SmallVec<[Param; 4]>,
    pub source_line: usize,
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.action.name, self.params)
    }
}

// =============================================================================
// Instruction sets
// =============================================================================

/// Flavor of an instruction set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetKind {
    /// Top-level code of a file.
    Program,
    /// A method body.
    Method,
    /// A block body.
    Block,
    /// A class body.
    ClassBody,
    /// A default-value sequence of an optioned parameter.
    Default,
}

/// An immutable, shared sequence of instructions plus its identity.
#[derive(Debug)]
pub struct InstructionSet {
    /// Registry label: a method name, a block label, a class name, or
    /// [`tetra_bytecode::PROGRAM_SET`].
    pub label: Arc<str>,
    /// The source file this set was compiled from. Scopes the label.
    pub filename: Arc<str>,
    pub kind: SetKind,
    pub instructions: Vec<Instruction>,
    /// Parameter metadata; empty for non-method sets.
    pub arg_set: ArgSet,
    /// Default sequences referenced by `ParamKind::Optioned` entries.
    pub defaults: Vec<Arc<InstructionSet>>,
}

impl InstructionSet {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Error produced when a builder finishes an inconsistent set.
#[derive(Debug, PartialEq, Eq)]
pub enum BuildError {
    /// An optioned parameter names a default sequence that was never added.
    MissingDefaultSequence {
        parameter: String,
        default_index: usize,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::MissingDefaultSequence {
                parameter,
                default_index,
            } => write!(
                f,
                "optioned parameter '{}' refers to missing default sequence {}",
                parameter, default_index
            ),
        }
    }
}

impl std::error::Error for BuildError {}

/// Emission API for one instruction set.
pub struct InstructionSetBuilder {
    label: Arc<str>,
    filename: Arc<str>,
    kind: SetKind,
    instructions: Vec<Instruction>,
    arg_set: ArgSet,
    defaults: Vec<Arc<InstructionSet>>,
    current_line: usize,
}

impl InstructionSetBuilder {
    pub fn new(label: &str, filename: &str, kind: SetKind) -> Self {
        Self {
            label: Arc::from(label),
            filename: Arc::from(filename),
            kind,
            instructions: Vec::new(),
            arg_set: ArgSet::new(),
            defaults: Vec::new(),
            current_line: 0,
        }
    }

    /// Builder for a file's top-level code.
    pub fn program(filename: &str) -> Self {
        Self::new(tetra_bytecode::PROGRAM_SET, filename, SetKind::Program)
    }

    /// Builder for a method body.
    pub fn method(name: &str, filename: &str) -> Self {
        Self::new(name, filename, SetKind::Method)
    }

    /// Builder for a block body.
    pub fn block(label: &str, filename: &str) -> Self {
        Self::new(label, filename, SetKind::Block)
    }

    /// Builder for a class body.
    pub fn class_body(name: &str, filename: &str) -> Self {
        Self::new(name, filename, SetKind::ClassBody)
    }

    /// Attach the method's parameter metadata.
    pub fn with_arg_set(mut self, arg_set: ArgSet) -> Self {
        self.arg_set = arg_set;
        self
    }

    /// Source line attributed to subsequently emitted instructions.
    pub fn set_line(&mut self, line: usize) {
        self.current_line = line;
    }

    /// Register a default sequence for an optioned parameter and return the
    /// `default_index` its [`ParamKind::Optioned`] entry must carry.
    pub fn add_default(&mut self, set: InstructionSet) -> usize {
        self.defaults.push(Arc::new(set));
        self.defaults.len() - 1
    }

    /// Emit one instruction; returns its index for jump patching.
    pub fn emit(&mut self, action: &'static Action, params: &[Param]) -> usize {
        self.instructions.push(Instruction {
            action,
            params: params.iter().cloned().collect(),
            source_line: self.current_line,
        });
        self.instructions.len() - 1
    }

    // -- Emission helpers, one per opcode -------------------------------------

    pub fn emit_put_object(&mut self, literal: Param) -> usize {
        self.emit(&ops::PUT_OBJECT, &[literal])
    }

    pub fn emit_put_self(&mut self) -> usize {
        self.emit(&ops::PUT_SELF, &[])
    }

    pub fn emit_pop(&mut self) -> usize {
        self.emit(&ops::POP, &[])
    }

    pub fn emit_dup(&mut self) -> usize {
        self.emit(&ops::DUP, &[])
    }

    pub fn emit_get_local(&mut self, index: usize, depth: usize) -> usize {
        self.emit(
            &ops::GET_LOCAL,
            &[Param::Int(index as i64), Param::Int(depth as i64)],
        )
    }

    pub fn emit_set_local(&mut self, index: usize, depth: usize) -> usize {
        self.emit(
            &ops::SET_LOCAL,
            &[Param::Int(index as i64), Param::Int(depth as i64)],
        )
    }

    pub fn emit_get_ivar(&mut self, name: &str) -> usize {
        self.emit(&ops::GET_IVAR, &[Param::Str(Arc::from(name))])
    }

    pub fn emit_set_ivar(&mut self, name: &str) -> usize {
        self.emit(&ops::SET_IVAR, &[Param::Str(Arc::from(name))])
    }

    /// Emit a jump; pass `0` and patch later for forward targets.
    pub fn emit_jump(&mut self, target: usize) -> usize {
        self.emit(&ops::JUMP, &[Param::Int(target as i64)])
    }

    pub fn emit_branch_unless(&mut self, target: usize) -> usize {
        self.emit(&ops::BRANCH_UNLESS, &[Param::Int(target as i64)])
    }

    pub fn emit_branch_if(&mut self, target: usize) -> usize {
        self.emit(&ops::BRANCH_IF, &[Param::Int(target as i64)])
    }

    /// Patch the target of a previously emitted jump or branch.
    pub fn patch_target(&mut self, at: usize, target: usize) {
        if let Some(instruction) = self.instructions.get_mut(at) {
            if let Some(slot) = instruction.params.get_mut(0) {
                *slot = Param::Int(target as i64);
            }
        }
    }

    /// Index the next emitted instruction will receive.
    pub fn next_index(&self) -> usize {
        self.instructions.len()
    }

    pub fn emit_new_array(&mut self, count: usize) -> usize {
        self.emit(&ops::NEW_ARRAY, &[Param::Int(count as i64)])
    }

    pub fn emit_splat_array(&mut self) -> usize {
        self.emit(&ops::SPLAT_ARRAY, &[])
    }

    /// Emit a call. `argc` counts the real actuals; the caller must have
    /// pushed `[receiver, name-marker, arg0..argN-1]` (see [`crate::ops::SEND`]).
    pub fn emit_send(&mut self, name: &str, argc: usize, block_flag: &str) -> usize {
        self.emit(
            &ops::SEND,
            &[
                Param::Str(Arc::from(name)),
                Param::Int(argc as i64),
                Param::Str(Arc::from(block_flag)),
            ],
        )
    }

    /// Emit a call whose actuals include keyword arguments.
    pub fn emit_send_with_arg_set(
        &mut self,
        name: &str,
        argc: usize,
        block_flag: &str,
        call_args: ArgSet,
    ) -> usize {
        self.emit(
            &ops::SEND,
            &[
                Param::Str(Arc::from(name)),
                Param::Int(argc as i64),
                Param::Str(Arc::from(block_flag)),
                Param::ArgSet(call_args),
            ],
        )
    }

    pub fn emit_invoke_block(&mut self, argc: usize) -> usize {
        self.emit(&ops::INVOKE_BLOCK, &[Param::Int(argc as i64)])
    }

    pub fn emit_leave(&mut self) -> usize {
        self.emit(&ops::LEAVE, &[])
    }

    pub fn emit_def_method(&mut self, name: &str) -> usize {
        self.emit(&ops::DEF_METHOD, &[Param::Str(Arc::from(name))])
    }

    pub fn emit_def_class(&mut self, name: &str) -> usize {
        self.emit(&ops::DEF_CLASS, &[Param::Str(Arc::from(name))])
    }

    pub fn emit_get_constant(&mut self, name: &str) -> usize {
        self.emit(&ops::GET_CONSTANT, &[Param::Str(Arc::from(name))])
    }

    /// Validate and seal the set.
    pub fn finish(self) -> Result<InstructionSet, BuildError> {
        for (_, name, kind) in self.arg_set.iter() {
            if let ParamKind::Optioned { default_index } = kind {
                if default_index >= self.defaults.len() {
                    return Err(BuildError::MissingDefaultSequence {
                        parameter: name.to_string(),
                        default_index,
                    });
                }
            }
        }
        Ok(InstructionSet {
            label: self.label,
            filename: self.filename,
            kind: self.kind,
            instructions: self.instructions,
            arg_set: self.arg_set,
            defaults: self.defaults,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_emits_in_order() {
        let mut builder = InstructionSetBuilder::program("test.tt");
        builder.set_line(3);
        builder.emit_put_object(Param::Int(1));
        builder.emit_put_object(Param::Int(2));
        builder.emit_leave();
        let set = builder.finish().unwrap();

        assert_eq!(set.kind, SetKind::Program);
        assert_eq!(set.len(), 3);
        assert_eq!(set.instructions[0].action.name, "put_object");
        assert_eq!(set.instructions[2].action.name, "leave");
        assert_eq!(set.instructions[1].source_line, 3);
    }

    #[test]
    fn test_finish_rejects_dangling_default_index() {
        let builder = InstructionSetBuilder::method("opt", "test.tt").with_arg_set(
            ArgSet::new()
                .with("a", ParamKind::Normal)
                .with("b", ParamKind::Optioned { default_index: 0 }),
        );
        let err = builder.finish().unwrap_err();
        assert_eq!(
            err,
            BuildError::MissingDefaultSequence {
                parameter: "b".to_string(),
                default_index: 0,
            }
        );
    }

    #[test]
    fn test_patch_target() {
        let mut builder = InstructionSetBuilder::program("test.tt");
        let jump = builder.emit_jump(0);
        builder.emit_put_object(Param::Null);
        let end = builder.next_index();
        builder.patch_target(jump, end);
        let set = builder.finish().unwrap();
        assert_eq!(set.instructions[jump].params[0], Param::Int(end as i64));
    }

    #[test]
    fn test_param_literals() {
        assert!(matches!(Param::Int(5).to_value(), Value::Integer(5)));
        assert!(matches!(Param::Bool(true).to_value(), Value::Boolean(true)));
        assert!(matches!(Param::Null.to_value(), Value::Null));
        match Param::Str(Arc::from("hi")).to_value() {
            Value::String(s) => assert_eq!(&*s, "hi"),
            other => panic!("expected string, got {:?}", other.class_name()),
        }
    }
}
