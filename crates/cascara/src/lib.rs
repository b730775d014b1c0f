//! # Cascara Evaluation Environment
//!
//! The semantic core of the Cascara style-sheet compiler: lexical variable
//! scoping over a stack of rule-block frames, mixin/ruleset matching with
//! recursion-proof deduplication, and pluggable registries of callable
//! functions and compiler extensions.
//!
//! ## Architecture
//!
//! - **Rule Tree Contract**: narrow traits the externally parsed tree
//!   implements ([`Frame`], [`Node`], [`Selector`])
//! - **Environment**: scope stack, variable resolution, mixin matching, and
//!   context forking for nested evaluation
//! - **Function Registry**: name-to-constructor table seeded by module
//!   discovery
//! - **Extension Registry**: singleton-per-kind plugins with a setup hook
//!
//! The tree-walking evaluator itself, the parser, and the output stage are
//! separate crates; this one owns the scoping and dispatch rules they build
//! on.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod environment;
pub mod error;
pub mod extensions;
pub mod functions;
pub mod tree;
pub mod value;

// Re-export main types
pub use environment::{Environment, ScopeGuard};
pub use error::{EnvironmentError, EvalError, Result};
pub use extensions::{Extension, ExtensionRegistry};
pub use functions::{
    CoreFunctions, FunctionConstructor, FunctionModule, FunctionRegistry, StyleFunction,
};
pub use tree::{Closure, Frame, Node, Output, OutputHandle, Selector, Variable};
pub use value::Value;

/// Cascara version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
