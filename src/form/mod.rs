//! The value model.
//!
//! Every datum in the language is a [`Form`]: the reader produces them, the
//! compiler translates them, builtins consume and return them. `Form` is
//! cheap to clone; sequences and maps share their storage through `Rc`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::env::Env;
use crate::error::{Error, Result};

// ==================== FORM ====================

#[derive(Clone)]
pub enum Form {
    Nil,
    Bool(bool),
    /// Signed integer. There is no wider numeric tower.
    Number(i64),
    /// Bare identifier, looked up in the environment when evaluated.
    Symbol(String),
    Str(String),
    /// `:name` literal. Evaluates to itself.
    Keyword(String),
    /// `(a b c)` with an optional metadata form.
    List(Rc<Vec<Form>>, Option<Rc<Form>>),
    /// `[a b c]` with an optional metadata form.
    Vector(Rc<Vec<Form>>, Option<Rc<Form>>),
    /// `{k v ...}` keyed by strings and keywords, insertion-ordered.
    Map(Rc<IndexMap<MapKey, Form>>, Option<Rc<Form>>),
    /// User function created by `fn*`. Doubles as a macro once flagged.
    Fn(Rc<Lambda>),
    /// Builtin function.
    Native(Native),
    /// Shared mutable cell. Mutation is visible to every holder.
    Atom(Rc<RefCell<Form>>),
}

impl Form {
    pub fn symbol(name: impl Into<String>) -> Form {
        Form::Symbol(name.into())
    }

    pub fn string(text: impl Into<String>) -> Form {
        Form::Str(text.into())
    }

    pub fn keyword(name: impl Into<String>) -> Form {
        Form::Keyword(name.into())
    }

    pub fn list(items: Vec<Form>) -> Form {
        Form::List(Rc::new(items), None)
    }

    pub fn vector(items: Vec<Form>) -> Form {
        Form::Vector(Rc::new(items), None)
    }

    pub fn map(entries: IndexMap<MapKey, Form>) -> Form {
        Form::Map(Rc::new(entries), None)
    }

    pub fn atom(value: Form) -> Form {
        Form::Atom(Rc::new(RefCell::new(value)))
    }

    pub fn native(name: &'static str, func: impl Fn(&[Form]) -> Result<Form> + 'static) -> Form {
        Form::Native(Native::new(name, func))
    }

    /// Everything is truthy except `nil` and `false`. Zero and empty
    /// collections are truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Form::Nil | Form::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Form::Nil => "nil",
            Form::Bool(_) => "bool",
            Form::Number(_) => "number",
            Form::Symbol(_) => "symbol",
            Form::Str(_) => "string",
            Form::Keyword(_) => "keyword",
            Form::List(..) => "list",
            Form::Vector(..) => "vector",
            Form::Map(..) => "map",
            Form::Fn(_) => "function",
            Form::Native(_) => "builtin",
            Form::Atom(_) => "atom",
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Form::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Form::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Items of a list or vector. The two are interchangeable wherever a
    /// sequence is expected.
    pub fn as_seq(&self) -> Option<&[Form]> {
        match self {
            Form::List(items, _) | Form::Vector(items, _) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// The lambda behind this form when it is a macro-flagged function.
    pub fn as_macro(&self) -> Option<Rc<Lambda>> {
        match self {
            Form::Fn(lambda) if lambda.is_macro.get() => Some(lambda.clone()),
            _ => None,
        }
    }

    /// Attach a metadata form, yielding a new value. Only collections and
    /// user functions carry metadata.
    pub fn with_meta(&self, meta: &Form) -> Result<Form> {
        let meta = Rc::new(meta.clone());
        match self {
            Form::List(items, _) => Ok(Form::List(items.clone(), Some(meta))),
            Form::Vector(items, _) => Ok(Form::Vector(items.clone(), Some(meta))),
            Form::Map(entries, _) => Ok(Form::Map(entries.clone(), Some(meta))),
            Form::Fn(lambda) => Ok(Form::Fn(Rc::new(lambda.clone_with_meta(meta)))),
            other => Err(Error::type_mismatch("collection or function", other)),
        }
    }

    /// The attached metadata, or nil when none was ever attached.
    pub fn meta(&self) -> Result<Form> {
        match self {
            Form::List(_, meta) | Form::Vector(_, meta) | Form::Map(_, meta) => {
                Ok(meta.as_deref().cloned().unwrap_or(Form::Nil))
            }
            Form::Fn(lambda) => Ok(lambda.meta.as_deref().cloned().unwrap_or(Form::Nil)),
            other => Err(Error::type_mismatch("collection or function", other)),
        }
    }
}

/// The equality law:
/// - scalars compare by value, symbols/strings/keywords by text and kind
///   (a symbol never equals a string, even with identical text);
/// - a list and a vector with pairwise-equal elements are equal;
/// - maps compare as unordered key/value sets;
/// - functions and atoms compare by reference identity;
/// - metadata never participates.
impl PartialEq for Form {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Form::Nil, Form::Nil) => true,
            (Form::Bool(a), Form::Bool(b)) => a == b,
            (Form::Number(a), Form::Number(b)) => a == b,
            (Form::Symbol(a), Form::Symbol(b)) => a == b,
            (Form::Str(a), Form::Str(b)) => a == b,
            (Form::Keyword(a), Form::Keyword(b)) => a == b,
            (Form::List(a, _) | Form::Vector(a, _), Form::List(b, _) | Form::Vector(b, _)) => {
                a == b
            }
            (Form::Map(a, _), Form::Map(b, _)) => a == b,
            (Form::Fn(a), Form::Fn(b)) => Rc::ptr_eq(a, b),
            (Form::Native(a), Form::Native(b)) => a == b,
            (Form::Atom(a), Form::Atom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// ==================== MAP KEYS ====================

/// Map keys are restricted to strings and keywords.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Str(String),
    Keyword(String),
}

impl MapKey {
    /// Validate a form as a map key. Everything else is rejected, at read
    /// time for literals and at construction time for `hash-map`/`assoc`.
    pub fn from_form(form: &Form) -> Result<MapKey> {
        match form {
            Form::Str(s) => Ok(MapKey::Str(s.clone())),
            Form::Keyword(k) => Ok(MapKey::Keyword(k.clone())),
            other => Err(Error::InvalidMapKey(crate::printer::pr_str(other, true))),
        }
    }

    /// Lookup variant of [`MapKey::from_form`]: symbols coerce to string
    /// keys, a legacy compatibility for membership tests. Returns `None`
    /// for forms that can never be keys.
    pub fn for_lookup(form: &Form) -> Option<MapKey> {
        match form {
            Form::Str(s) | Form::Symbol(s) => Some(MapKey::Str(s.clone())),
            Form::Keyword(k) => Some(MapKey::Keyword(k.clone())),
            _ => None,
        }
    }

    pub fn to_form(&self) -> Form {
        match self {
            MapKey::Str(s) => Form::Str(s.clone()),
            MapKey::Keyword(k) => Form::Keyword(k.clone()),
        }
    }
}

// ==================== FUNCTIONS ====================

/// Parameter list of a user function: required names plus an optional
/// variadic tail introduced by `&`.
#[derive(Debug, Clone)]
pub struct Params {
    pub required: Vec<String>,
    pub rest: Option<String>,
}

/// A user function: the closure descriptor produced by `fn*`.
///
/// The body is kept as an untranslated form; every application routes it
/// back through the compiler against a fresh child of the captured
/// environment.
pub struct Lambda {
    pub params: Params,
    pub body: Form,
    pub env: Env,
    /// Macros are ordinary functions with this flag set (see
    /// `set-ismacro`). The flag is out-of-band state, not part of equality.
    pub is_macro: Cell<bool>,
    pub meta: Option<Rc<Form>>,
}

impl Lambda {
    /// Build the application environment: a child of the captured one with
    /// parameters bound to arguments. Argument counts are not validated;
    /// surplus arguments are dropped, missing ones bind to nil, and a `&`
    /// tail collects whatever remains (possibly nothing).
    pub fn bind(&self, args: Vec<Form>) -> Env {
        let child = self.env.child();
        let mut args = args.into_iter();
        for name in &self.params.required {
            let value = args.next().unwrap_or(Form::Nil);
            child.define(name.clone(), value);
        }
        if let Some(rest) = &self.params.rest {
            child.define(rest.clone(), Form::list(args.collect()));
        }
        child
    }

    fn clone_with_meta(&self, meta: Rc<Form>) -> Lambda {
        Lambda {
            params: self.params.clone(),
            body: self.body.clone(),
            env: self.env.clone(),
            is_macro: Cell::new(self.is_macro.get()),
            meta: Some(meta),
        }
    }
}

/// A builtin function: a name for error messages plus the implementation.
#[derive(Clone)]
pub struct Native {
    name: &'static str,
    func: Rc<dyn Fn(&[Form]) -> Result<Form>>,
}

impl Native {
    pub fn new(name: &'static str, func: impl Fn(&[Form]) -> Result<Form> + 'static) -> Native {
        Native {
            name,
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn call(&self, args: &[Form]) -> Result<Form> {
        (self.func)(args)
    }
}

impl PartialEq for Native {
    fn eq(&self, other: &Self) -> bool {
        // Identity of the implementation, compared as thin pointers.
        std::ptr::eq(
            Rc::as_ptr(&self.func) as *const u8,
            Rc::as_ptr(&other.func) as *const u8,
        )
    }
}

// ==================== TESTS ====================
