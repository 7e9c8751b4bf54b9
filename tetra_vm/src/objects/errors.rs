//! Runtime error values.
//!
//! Errors are ordinary values: producing one places it on the evaluation
//! stack, where the dispatch loop's sentinel check (see
//! [`crate::thread::Thread::eval_call_frame`]) terminates frame after frame
//! until the stack unwinds. The core never catches.

use std::rc::Rc;

use super::class::RClass;

/// The error taxonomy recognized by the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Method lookup returned nothing.
    UndefinedMethod,
    /// Arity mismatch, missing required keyword, or binder failure.
    Argument,
    /// A builtin received an operand of an unsupported class.
    Type,
    /// A reserved method name was invoked (e.g. `Decimal.new`).
    UnsupportedMethod,
    /// Pathological conditions: lookup yielded an error-typed entry,
    /// missing block registration, yield without a block.
    Internal,
}

impl ErrorKind {
    /// Name of the top-level class backing this kind.
    pub fn class_name(self) -> &'static str {
        match self {
            ErrorKind::UndefinedMethod => "UndefinedMethodError",
            ErrorKind::Argument => "ArgumentError",
            ErrorKind::Type => "TypeError",
            ErrorKind::UnsupportedMethod => "UnsupportedMethodError",
            ErrorKind::Internal => "InternalError",
        }
    }

    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::UndefinedMethod,
        ErrorKind::Argument,
        ErrorKind::Type,
        ErrorKind::UnsupportedMethod,
        ErrorKind::Internal,
    ];
}

pub struct ErrorObject {
    pub class: Rc<RClass>,
    pub kind: ErrorKind,
    pub message: String,
}

impl std::fmt::Debug for ErrorObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.class_name(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_class_names() {
        assert_eq!(ErrorKind::Argument.class_name(), "ArgumentError");
        assert_eq!(
            ErrorKind::UnsupportedMethod.class_name(),
            "UnsupportedMethodError"
        );
        assert_eq!(ErrorKind::ALL.len(), 5);
    }
}
