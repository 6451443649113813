//! Error types shared by the reader, the compiler and the builtin table.

use thiserror::Error;

use crate::form::Form;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Expected argument count reported by an arity failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AritySpec {
    Exact(usize),
    AtLeast(usize),
}

impl std::fmt::Display for AritySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AritySpec::Exact(n) => write!(f, "{n}"),
            AritySpec::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The input contained nothing but whitespace and comments.
    /// The REPL treats this as "re-prompt", not as a failure.
    #[error("blank input")]
    Blank,

    /// Delimiters did not balance; the message names the delimiter the
    /// reader was waiting for.
    #[error("unbalanced input: {0}")]
    Unbalanced(String),

    /// A map literal or constructor was given a non-String/Keyword key,
    /// or an odd number of entry forms.
    #[error("invalid map key: {0}")]
    InvalidMapKey(String),

    /// A symbol had no binding anywhere on the environment chain.
    #[error("'{0}' not found")]
    Unbound(String),

    /// Vectors and maps are data, not syntax; handing one to the
    /// translator fails.
    #[error("cannot evaluate a {0} form directly")]
    Unsupported(&'static str),

    /// The head of an application evaluated to something that is not
    /// callable.
    #[error("cannot call value: {0}")]
    NotCallable(String),

    /// A special form had the wrong shape at translation time.
    #[error("bad {form} form: {message}")]
    Syntax {
        form: &'static str,
        message: String,
    },

    /// A builtin was handed an argument of the wrong kind.
    #[error("type error: expected {expected}, got {got}")]
    Type {
        expected: &'static str,
        got: &'static str,
    },

    /// Wrong number of arguments to a callable.
    #[error("wrong number of arguments to '{name}': expected {expected}, got {got}")]
    Arity {
        name: String,
        expected: AritySpec,
        got: usize,
    },

    /// Sequence index outside the valid range.
    #[error("index {index} out of range for length {length}")]
    OutOfBounds { index: i64, length: usize },

    #[error("division by zero")]
    DivisionByZero,

    /// A value raised by `throw`, carried until it reaches the REPL
    /// boundary (there is no in-language handler form).
    #[error("uncaught exception: {0}")]
    Thrown(Form),

    /// The shared recursion budget ran out. Stands in for host stack
    /// exhaustion so the REPL can report it and keep going.
    #[error("maximum recursion depth exceeded")]
    RecursionLimit,

    /// Anything without a more precise kind (IO failures in `slurp`,
    /// integer literals that do not fit, ...).
    #[error("{0}")]
    Eval(String),
}

impl Error {
    /// Arity failure for a named callable with a fixed count.
    pub fn arity(name: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::Arity {
            name: name.into(),
            expected: AritySpec::Exact(expected),
            got,
        }
    }

    /// Arity failure for a named callable with a minimum count.
    pub fn arity_at_least(name: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::Arity {
            name: name.into(),
            expected: AritySpec::AtLeast(expected),
            got,
        }
    }

    /// Type failure naming the offending value's kind.
    pub fn type_mismatch(expected: &'static str, got: &Form) -> Self {
        Error::Type {
            expected,
            got: got.type_name(),
        }
    }

    pub fn syntax(form: &'static str, message: impl Into<String>) -> Self {
        Error::Syntax {
            form,
            message: message.into(),
        }
    }
}
