//! Evaluation driver: the depth budget, macro expansion, and application.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use crate::env::Env;
use crate::error::{Error, Result};
use crate::form::{Form, Lambda};
use crate::printer;

/// Default recursion budget. Deep or self-referential programs fail with
/// [`Error::RecursionLimit`] once the budget is spent instead of blowing
/// the host stack.
pub const MAX_DEPTH: usize = 1024;

/// Name of the root translation unit. Children extend it per node, so an
/// `if` at the root translates its condition as `blk_0` and so on.
pub(crate) const ROOT_UNIT: &str = "blk";

/// The evaluation engine. Cloning shares the depth budget, so a builtin
/// that re-enters evaluation (like `swap!`) draws from the same allowance
/// as the call that reached it.
#[derive(Clone)]
pub struct Compiler {
    depth: Rc<Cell<usize>>,
    max_depth: usize,
}

impl Compiler {
    pub fn new() -> Compiler {
        Compiler::with_max_depth(MAX_DEPTH)
    }

    /// A compiler with a custom recursion budget. Mainly useful in tests
    /// that want divergent programs to fail fast.
    pub fn with_max_depth(max_depth: usize) -> Compiler {
        Compiler {
            depth: Rc::new(Cell::new(0)),
            max_depth,
        }
    }

    /// Evaluate `ast` in `env`: expand macros, translate every node into a
    /// named unit, then invoke the root unit.
    pub fn eval(&self, ast: &Form, env: &Env) -> Result<Form> {
        let _frame = self.enter()?;
        debug!(ast = %ast, "eval");
        let root = self.translate(ast, env, ROOT_UNIT)?;
        root.run(env, self)
    }

    /// Apply a callable to already-evaluated arguments. A user function
    /// binds its parameters in a child of its captured environment and
    /// routes the body back through [`Compiler::eval`]; nothing about the
    /// body was translated ahead of time.
    pub fn apply(&self, callable: &Form, args: Vec<Form>) -> Result<Form> {
        match callable {
            Form::Native(native) => native.call(&args),
            Form::Fn(lambda) => {
                let env = lambda.bind(args);
                self.eval(&lambda.body, &env)
            }
            other => Err(Error::NotCallable(printer::pr_str(other, true))),
        }
    }

    /// Repeatedly expand `ast` while it is a macro call, passing the
    /// arguments through unevaluated. Each step claims a frame, so a macro
    /// that always returns another macro call exhausts the budget rather
    /// than hanging the session.
    pub(crate) fn macroexpand(&self, ast: Form, env: &Env) -> Result<Form> {
        match macro_call(&ast, env) {
            None => Ok(ast),
            Some((lambda, args)) => {
                let _frame = self.enter()?;
                debug!(call = %ast, "expanding macro");
                let expanded = self.apply(&Form::Fn(lambda), args)?;
                self.macroexpand(expanded, env)
            }
        }
    }

    /// Claim one frame of the shared recursion budget.
    pub(crate) fn enter(&self) -> Result<Frame<'_>> {
        let depth = self.depth.get() + 1;
        if depth > self.max_depth {
            return Err(Error::RecursionLimit);
        }
        self.depth.set(depth);
        Ok(Frame(&self.depth))
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}

/// Releases its frame of the depth budget when dropped, including on the
/// error path.
pub(crate) struct Frame<'a>(&'a Cell<usize>);

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

/// A macro call is a non-empty list whose head symbol resolves to a
/// function carrying the macro flag. Unbound heads are not an error here;
/// they fall through to ordinary translation.
fn macro_call(ast: &Form, env: &Env) -> Option<(Rc<Lambda>, Vec<Form>)> {
    let Form::List(items, _) = ast else {
        return None;
    };
    let Some(Form::Symbol(name)) = items.first() else {
        return None;
    };
    let lambda = env.get(name)?.as_macro()?;
    Some((lambda, items[1..].to_vec()))
}
