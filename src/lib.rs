//! Tarn Programming Language
//!
//! A small Lisp whose evaluator is a compiler in miniature: every syntax
//! node is translated into a named, directly-invokable unit, and running a
//! program means invoking the root unit. Features:
//! - Lists, vectors, maps, keywords, atoms and first-class functions
//! - Lexical closures over an environment chain
//! - User macros: ordinary functions promoted with an explicit flag
//! - A REPL with history and structured tracing of every unit
//!
//! # Architecture
//!
//! ```text
//! Source → Lexer → Reader → Form → Translate → Units → Invoke → Form → Printer
//! ```
//!
//! # Example
//!
//! ```lisp
//! (def! fact
//!   (fn* (n) (if (<= n 1) 1 (* n (fact (- n 1))))))
//! (fact 10)   ;=> 3628800
//! ```

pub mod compile;
pub mod core;
pub mod env;
pub mod error;
pub mod form;
pub mod lexer;
pub mod printer;
pub mod reader;

// Re-exports for convenience
pub use compile::Compiler;
pub use env::Env;
pub use error::{Error, Result};
pub use form::Form;
pub use printer::pr_str;
pub use reader::read_str;

/// Interpreter version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One read-eval-print step: parse a single form, evaluate it, render the
/// result readably.
pub fn rep(source: &str, env: &Env, vm: &Compiler) -> Result<String> {
    let ast = reader::read_str(source)?;
    let value = vm.eval(&ast, env)?;
    Ok(printer::pr_str(&value, true))
}

/// Evaluate source in a fresh session, returning the resulting form.
pub fn interpret(source: &str) -> Result<Form> {
    let vm = Compiler::new();
    let env = crate::core::top_env(&vm)?;
    vm.eval(&reader::read_str(source)?, &env)
}
