//! Error types for the Cascara evaluation environment

use thiserror::Error;

/// Usage errors raised during environment setup.
///
/// These are fatal at the call site: registration aborts and nothing is
/// recorded. Failed *lookups* (variables, mixins, function names) are not
/// errors at this layer; they surface as empty `Option`/`Vec` results and the
/// caller decides whether that aborts the compile.
#[derive(Error, Debug)]
pub enum EnvironmentError {
    /// An extension of this concrete kind is already registered
    #[error("extension `{name}` is already registered")]
    DuplicateExtension {
        /// Name reported by the extension
        name: &'static str,
    },

    /// A function was registered under an empty name
    #[error("function name must not be empty")]
    EmptyFunctionName,
}

/// Errors raised by function implementations when invoked.
#[derive(Error, Debug)]
pub enum EvalError {
    /// An argument had the wrong type or shape
    #[error("bad argument to `{function}`: {reason}")]
    BadArgument {
        /// Function name as invoked
        function: &'static str,
        /// What was wrong with the argument
        reason: String,
    },

    /// The call supplied the wrong number of arguments
    #[error("`{function}` expects {expected} argument(s), got {got}")]
    WrongArgumentCount {
        /// Function name as invoked
        function: &'static str,
        /// Expected argument count
        expected: usize,
        /// Actual argument count
        got: usize,
    },
}

/// Result type alias for function evaluation
pub type Result<T> = std::result::Result<T, EvalError>;
