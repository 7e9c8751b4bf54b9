//! Compiler-side bytecode contracts for the Tetra VM.
//!
//! The compiler and the interpreter live in separate crates; this crate
//! holds the pieces of the bytecode format both of them must agree on:
//!
//! - [`ArgSet`] / [`ParamKind`]: the parameter metadata that travels with a
//!   compiled method's instruction set and drives argument binding.
//! - Set labels: the well-known names under which instruction sets are
//!   registered (`ProgramStart` for top-level code, numbered labels for
//!   blocks).
//! - The block flag: the `"block:<NAME>"` string a call instruction carries
//!   when the call site has a block literal.
//!
//! Everything here is plain data: no runtime values, no interpreter state.

pub mod arg_set;

pub use arg_set::{ArgSet, ParamKind};

/// Label under which the top-level instruction set of a file is registered.
pub const PROGRAM_SET: &str = "ProgramStart";

/// Prefix of the block flag carried by call instructions.
const BLOCK_FLAG_PREFIX: &str = "block";

/// Format the registry label for the `id`-th block literal of a file.
///
/// Blocks have no source-level name, so the compiler numbers them in
/// definition order within each file.
pub fn block_label(id: usize) -> String {
    id.to_string()
}

/// Format the block flag a call instruction carries for a block literal.
pub fn block_flag(label: &str) -> String {
    format!("{}:{}", BLOCK_FLAG_PREFIX, label)
}

/// Split a block flag back into the block's registry label.
///
/// Returns `None` for the empty flag (call site without a block) and for
/// strings that do not follow the `"block:<NAME>"` shape.
pub fn parse_block_flag(flag: &str) -> Option<&str> {
    let (prefix, label) = flag.split_once(':')?;
    if prefix != BLOCK_FLAG_PREFIX || label.is_empty() {
        return None;
    }
    Some(label)
}
