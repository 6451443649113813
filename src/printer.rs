//! Rendering forms back to text.
//!
//! Two modes: readable output escapes and quotes strings so it re-parses to
//! an equal value (the REPL and `pr-str` use this), display output shows
//! string content raw (`str` and `println` use this). Keywords render as
//! `:name` in both.

use std::fmt;

use crate::form::{Form, MapKey};

/// Nesting levels rendered before deeper structure is elided as `...`,
/// so a self-referential atom prints finitely.
const MAX_DEPTH: usize = 256;

/// Render one form in the requested mode.
pub fn pr_str(form: &Form, readably: bool) -> String {
    Printed(form, readably).to_string()
}

/// Render several forms joined by `sep`.
pub fn pr_seq(forms: &[Form], readably: bool, sep: &str) -> String {
    forms
        .iter()
        .map(|form| pr_str(form, readably))
        .collect::<Vec<_>>()
        .join(sep)
}

struct Printed<'a>(&'a Form, bool);

impl fmt::Display for Printed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_form(f, self.0, self.1, 0)
    }
}

fn write_form(
    f: &mut fmt::Formatter<'_>,
    form: &Form,
    readably: bool,
    depth: usize,
) -> fmt::Result {
    if depth > MAX_DEPTH {
        return write!(f, "...");
    }
    match form {
        Form::Nil => write!(f, "nil"),
        Form::Bool(b) => write!(f, "{b}"),
        Form::Number(n) => write!(f, "{n}"),
        Form::Symbol(s) => write!(f, "{s}"),
        Form::Str(s) if readably => write!(f, "\"{}\"", escape(s)),
        Form::Str(s) => write!(f, "{s}"),
        Form::Keyword(k) => write!(f, ":{k}"),
        Form::List(items, _) => write_items(f, items, readably, "(", ")", depth),
        Form::Vector(items, _) => write_items(f, items, readably, "[", "]", depth),
        Form::Map(entries, _) => {
            write!(f, "{{")?;
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write_key(f, key, readably)?;
                write!(f, " ")?;
                write_form(f, value, readably, depth + 1)?;
            }
            write!(f, "}}")
        }
        Form::Fn(lambda) if lambda.is_macro.get() => write!(f, "#<macro>"),
        Form::Fn(_) | Form::Native(_) => write!(f, "#<function>"),
        Form::Atom(cell) => {
            write!(f, "(atom ")?;
            write_form(f, &cell.borrow(), readably, depth + 1)?;
            write!(f, ")")
        }
    }
}

fn write_items(
    f: &mut fmt::Formatter<'_>,
    items: &[Form],
    readably: bool,
    open: &str,
    close: &str,
    depth: usize,
) -> fmt::Result {
    write!(f, "{open}")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write_form(f, item, readably, depth + 1)?;
    }
    write!(f, "{close}")
}

fn write_key(f: &mut fmt::Formatter<'_>, key: &MapKey, readably: bool) -> fmt::Result {
    match key {
        MapKey::Str(s) if readably => write!(f, "\"{}\"", escape(s)),
        MapKey::Str(s) => write!(f, "{s}"),
        MapKey::Keyword(k) => write!(f, ":{k}"),
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Readable rendering. Tracing and error messages go through this.
impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_form(f, self, true, 0)
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
