//! The evaluator.
//!
//! [`Compiler::eval`] is the single entry point. Every call performs the
//! same three steps: expand macro calls, translate each syntax node into a
//! named invokable unit, then run the root unit with the environment.
//! Translation happens anew on every call; there is no cross-call cache,
//! and function bodies are translated only when the function is applied.

mod eval;
mod unit;

pub use eval::{Compiler, MAX_DEPTH};
