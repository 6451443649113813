//! Lexical environments.
//!
//! An [`Env`] is one binding frame plus a parent pointer. Handles are cheap
//! to clone and share the underlying frame, which is what lets closures and
//! `def!` observe each other.
//!
//! ```rust
//! use tarn::{Env, Form};
//!
//! let outer = Env::new();
//! outer.define("x", Form::Number(1));
//! let inner = outer.child();
//! inner.define("x", Form::Number(2));
//! assert_eq!(inner.lookup("x").unwrap(), Form::Number(2));
//! assert_eq!(outer.lookup("x").unwrap(), Form::Number(1));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::form::Form;

#[derive(Clone)]
pub struct Env {
    inner: Rc<RefCell<EnvInner>>,
}

struct EnvInner {
    bindings: FxHashMap<String, Form>,
    parent: Option<Env>,
}

impl Env {
    /// A root frame with no parent.
    pub fn new() -> Env {
        Env::with_parent(None)
    }

    /// An empty frame whose parent is `self`.
    pub fn child(&self) -> Env {
        Env::with_parent(Some(self.clone()))
    }

    fn with_parent(parent: Option<Env>) -> Env {
        Env {
            inner: Rc::new(RefCell::new(EnvInner {
                bindings: FxHashMap::default(),
                parent,
            })),
        }
    }

    /// Bind `name` in this frame, shadowing any outer binding.
    pub fn define(&self, name: impl Into<String>, value: Form) {
        self.inner.borrow_mut().bindings.insert(name.into(), value);
    }

    /// Walk the chain outward for `name`. `None` when unbound anywhere.
    pub fn get(&self, name: &str) -> Option<Form> {
        let mut frame = self.clone();
        loop {
            let next = {
                let inner = frame.inner.borrow();
                if let Some(value) = inner.bindings.get(name) {
                    return Some(value.clone());
                }
                inner.parent.clone()
            };
            match next {
                Some(parent) => frame = parent,
                None => return None,
            }
        }
    }

    /// Like [`Env::get`] but a miss is an error.
    pub fn lookup(&self, name: &str) -> Result<Form> {
        self.get(name).ok_or_else(|| Error::Unbound(name.to_string()))
    }
}

impl Default for Env {
    fn default() -> Self {
        Env::new()
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bindings can hold functions that close over this very frame, so
        // printing stays shallow.
        write!(f, "#<env {} bindings>", self.inner.borrow().bindings.len())
    }
}
