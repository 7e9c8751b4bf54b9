//! Bytecode interpreter core for the Tetra scripting language.
//!
//! Tetra is a dynamic, class-based language with Ruby-flavored surface
//! syntax. This crate is the execution core: it drives pre-compiled
//! instruction sets, manages call frames, performs method lookup and
//! dispatch, binds arguments (optional, splat, and keyword forms included),
//! invokes blocks, and propagates runtime errors as stack values.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │                     Machine                       │
//! │  instruction-set registries · class table ·       │
//! │  error factory                                    │
//! ├───────────────────────────────────────────────────┤
//! │                     Thread                        │
//! │  ┌─────────────┐      ┌────────────────────────┐  │
//! │  │  EvalStack  │      │     CallFrameStack     │  │
//! │  │  slots, sp  │      │  frame → frame → frame │  │
//! │  └─────────────┘      └────────────────────────┘  │
//! │  dispatch loop · send protocol · argument binder  │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! The compiler is an external collaborator: it registers
//! [`InstructionSet`]s with the machine through
//! [`InstructionSetBuilder`], then a thread is seeded with a top-level
//! frame and run.
//!
//! # Example
//!
//! ```
//! use tetra_vm::instruction::{InstructionSetBuilder, Param};
//! use tetra_vm::{Machine, Value};
//!
//! // 1 + 2
//! let mut builder = InstructionSetBuilder::program("demo.tt");
//! builder.emit_put_object(Param::Int(1));
//! builder.emit_put_object(Param::Str("+".into()));
//! builder.emit_put_object(Param::Int(2));
//! builder.emit_send("+", 1, "");
//! builder.emit_leave();
//! let program = std::sync::Arc::new(builder.finish().unwrap());
//!
//! let machine = Machine::new();
//! let mut thread = machine.new_thread();
//! assert!(matches!(thread.run(&program), Value::Integer(3)));
//! ```

pub mod call_object;
pub mod frame;
pub mod instruction;
pub mod machine;
pub mod objects;
pub mod ops;
pub mod stack;
pub mod thread;

pub use call_object::CallObject;
pub use frame::{CallFrame, CallFrameStack, FrameRef};
pub use instruction::{Action, BuildError, Instruction, InstructionSet, InstructionSetBuilder, Param, SetKind};
pub use machine::Machine;
pub use objects::{ErrorKind, Value};
pub use stack::{EvalStack, Slot};
pub use thread::Thread;
