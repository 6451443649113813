//! Translation units.
//!
//! Each syntax node becomes a named, directly-invokable unit. Names encode
//! the node's path in the tree: the root is `blk`, its children `blk_0`,
//! `blk_0_1`, and so on. A unit captures its sub-units and any sub-forms it
//! needs at translation time and is invoked later with an environment.

use std::cell::Cell;
use std::rc::Rc;

use tracing::trace;

use crate::env::Env;
use crate::error::{Error, Result};
use crate::form::{Form, Lambda, Params};

use super::eval::Compiler;

pub struct Unit {
    name: String,
    op: Op,
}

enum Op {
    /// Look the symbol up along the environment chain.
    Lookup(String),
    /// Yield a value captured at translation time. Scalars translate to
    /// constants, as does the empty list (which reads as nil).
    Constant(Form),
    /// Yield an already-evaluated value unchanged. Functions and atoms
    /// reach the translator when evaluated data re-enters through `eval`.
    Identity(Form),
    /// Yield the quoted sub-form without evaluating it.
    Quote(Form),
    Def {
        name: String,
        value: Box<Unit>,
    },
    Let {
        bindings: Vec<(String, Unit)>,
        body: Box<Unit>,
    },
    Do {
        steps: Vec<Unit>,
    },
    If {
        cond: Box<Unit>,
        then: Box<Unit>,
        orelse: Box<Unit>,
    },
    /// Capture the invocation environment into a function value. The body
    /// stays a plain form until the function is applied.
    Lambda {
        params: Params,
        body: Form,
    },
    Call {
        target: Box<Unit>,
        args: Vec<Unit>,
    },
}

impl Compiler {
    /// Translate one node into a unit, expanding macro calls first.
    /// Sub-nodes are translated by the same step, so the unit tree mirrors
    /// the post-expansion syntax tree.
    pub(crate) fn translate(&self, ast: &Form, env: &Env, name: &str) -> Result<Unit> {
        let _frame = self.enter()?;
        let ast = self.macroexpand(ast.clone(), env)?;
        trace!(unit = %name, ast = %ast, "translate");
        let op = match &ast {
            Form::Symbol(sym) => Op::Lookup(sym.clone()),
            Form::List(items, _) => self.translate_list(items, env, name)?,
            Form::Nil | Form::Bool(_) | Form::Number(_) | Form::Str(_) | Form::Keyword(_) => {
                Op::Constant(ast.clone())
            }
            Form::Fn(_) | Form::Native(_) | Form::Atom(_) => Op::Identity(ast.clone()),
            Form::Vector(..) => return Err(Error::Unsupported("vector")),
            Form::Map(..) => return Err(Error::Unsupported("map")),
        };
        Ok(Unit {
            name: name.to_string(),
            op,
        })
    }

    fn translate_list(&self, items: &[Form], env: &Env, name: &str) -> Result<Op> {
        let Some(head) = items.first() else {
            return Ok(Op::Constant(Form::Nil));
        };
        if let Form::Symbol(sym) = head {
            match sym.as_str() {
                "def!" => return self.translate_def(items, env, name),
                "let*" => return self.translate_let(items, env, name),
                "do" => return self.translate_do(items, env, name),
                "if" => return self.translate_if(items, env, name),
                "fn*" => return translate_fn(items),
                "quote" => return Ok(Op::Quote(items.get(1).cloned().unwrap_or(Form::Nil))),
                _ => {}
            }
        }
        // Function application: the head is unit 0, arguments follow.
        let mut units = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            units.push(self.translate(item, env, &child_name(name, i))?);
        }
        let target = Box::new(units.remove(0));
        Ok(Op::Call {
            target,
            args: units,
        })
    }

    fn translate_def(&self, items: &[Form], env: &Env, name: &str) -> Result<Op> {
        let target = match items.get(1) {
            Some(Form::Symbol(sym)) => sym.clone(),
            Some(other) => {
                return Err(Error::syntax(
                    "def!",
                    format!("name must be a symbol, got {other}"),
                ));
            }
            None => return Err(Error::syntax("def!", "expected a name and a value")),
        };
        let Some(value) = items.get(2) else {
            return Err(Error::syntax("def!", "expected a name and a value"));
        };
        let value = self.translate(value, env, &child_name(name, 0))?;
        Ok(Op::Def {
            name: target,
            value: Box::new(value),
        })
    }

    fn translate_let(&self, items: &[Form], env: &Env, name: &str) -> Result<Op> {
        let Some(bindings) = items.get(1).and_then(Form::as_seq) else {
            return Err(Error::syntax("let*", "expected a binding sequence"));
        };
        if bindings.len() % 2 != 0 {
            return Err(Error::syntax("let*", "odd number of binding forms"));
        }
        let mut pairs = Vec::with_capacity(bindings.len() / 2);
        for (i, pair) in bindings.chunks(2).enumerate() {
            let Form::Symbol(sym) = &pair[0] else {
                return Err(Error::syntax(
                    "let*",
                    format!("binding name must be a symbol, got {}", pair[0]),
                ));
            };
            let unit = self.translate(&pair[1], env, &child_name(name, i))?;
            pairs.push((sym.clone(), unit));
        }
        let body = self.translate_optional(items.get(2), env, &child_name(name, pairs.len()))?;
        Ok(Op::Let {
            bindings: pairs,
            body: Box::new(body),
        })
    }

    fn translate_do(&self, items: &[Form], env: &Env, name: &str) -> Result<Op> {
        let mut steps = Vec::with_capacity(items.len().saturating_sub(1));
        for (i, item) in items[1..].iter().enumerate() {
            steps.push(self.translate(item, env, &child_name(name, i))?);
        }
        Ok(Op::Do { steps })
    }

    fn translate_if(&self, items: &[Form], env: &Env, name: &str) -> Result<Op> {
        // (if), (if c) and (if c t) are all accepted; missing pieces read
        // as nil and surplus forms are ignored.
        let cond = self.translate_optional(items.get(1), env, &child_name(name, 0))?;
        let then = self.translate_optional(items.get(2), env, &child_name(name, 1))?;
        let orelse = self.translate_optional(items.get(3), env, &child_name(name, 2))?;
        Ok(Op::If {
            cond: Box::new(cond),
            then: Box::new(then),
            orelse: Box::new(orelse),
        })
    }

    /// Translate a sub-form, or produce a nil constant when it is absent.
    fn translate_optional(&self, ast: Option<&Form>, env: &Env, name: &str) -> Result<Unit> {
        match ast {
            Some(form) => self.translate(form, env, name),
            None => Ok(Unit {
                name: name.to_string(),
                op: Op::Constant(Form::Nil),
            }),
        }
    }
}

impl Unit {
    /// Invoke this unit with an environment.
    pub(crate) fn run(&self, env: &Env, vm: &Compiler) -> Result<Form> {
        let value = match &self.op {
            Op::Lookup(name) => env.lookup(name)?,
            Op::Constant(form) | Op::Identity(form) | Op::Quote(form) => form.clone(),
            Op::Def { name, value } => {
                let value = value.run(env, vm)?;
                env.define(name.clone(), value.clone());
                value
            }
            Op::Let { bindings, body } => {
                let child = env.child();
                for (name, unit) in bindings {
                    let value = unit.run(&child, vm)?;
                    child.define(name.clone(), value);
                }
                body.run(&child, vm)?
            }
            Op::Do { steps } => {
                let mut last = Form::Nil;
                for step in steps {
                    last = step.run(env, vm)?;
                }
                last
            }
            Op::If { cond, then, orelse } => {
                if cond.run(env, vm)?.is_truthy() {
                    then.run(env, vm)?
                } else {
                    orelse.run(env, vm)?
                }
            }
            Op::Lambda { params, body } => Form::Fn(Rc::new(Lambda {
                params: params.clone(),
                body: body.clone(),
                env: env.clone(),
                is_macro: Cell::new(false),
                meta: None,
            })),
            Op::Call { target, args } => {
                let callable = target.run(env, vm)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(arg.run(env, vm)?);
                }
                vm.apply(&callable, values)?
            }
        };
        trace!(unit = %self.name, value = %value, "invoke");
        Ok(value)
    }
}

fn translate_fn(items: &[Form]) -> Result<Op> {
    let Some(params) = items.get(1) else {
        return Err(Error::syntax("fn*", "expected a parameter sequence"));
    };
    let params = parse_params(params)?;
    let body = items.get(2).cloned().unwrap_or(Form::Nil);
    Ok(Op::Lambda { params, body })
}

/// Parse a `(a b & rest)` style parameter sequence.
fn parse_params(form: &Form) -> Result<Params> {
    let Some(items) = form.as_seq() else {
        return Err(Error::syntax(
            "fn*",
            format!("parameters must be a sequence, got {form}"),
        ));
    };
    let mut required = Vec::new();
    let mut rest = None;
    let mut iter = items.iter();
    while let Some(item) = iter.next() {
        let Form::Symbol(sym) = item else {
            return Err(Error::syntax(
                "fn*",
                format!("parameter must be a symbol, got {item}"),
            ));
        };
        if sym == "&" {
            match (iter.next(), iter.next()) {
                (Some(Form::Symbol(tail)), None) => rest = Some(tail.clone()),
                _ => {
                    return Err(Error::syntax(
                        "fn*",
                        "'&' must be followed by exactly one symbol",
                    ));
                }
            }
        } else {
            required.push(sym.clone());
        }
    }
    Ok(Params { required, rest })
}

/// Name for the `index`-th child of the unit called `parent`.
fn child_name(parent: &str, index: usize) -> String {
    format!("{parent}_{index}")
}
