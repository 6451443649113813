//! Reader: tokens to forms.
//!
//! One [`read_str`] call produces one form; trailing tokens are ignored,
//! which is why a stray closing delimiter after a complete form is
//! harmless. Blank input (nothing but whitespace and comments) is its own
//! signal so the REPL can re-prompt without printing.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::form::{Form, MapKey};
use crate::lexer::{self, Token, TokenKind};

/// Nesting budget for one [`read_str`] call. Input nested deeper than this
/// fails with [`Error::RecursionLimit`] instead of blowing the host stack.
const MAX_DEPTH: usize = 256;

/// Read the first form in `source`.
pub fn read_str(source: &str) -> Result<Form> {
    let tokens = lexer::lex(source)?;
    if tokens.is_empty() {
        return Err(Error::Blank);
    }
    Reader {
        tokens: &tokens,
        pos: 0,
    }
    .read_form(0)
}

// ==================== READER ====================

struct Reader<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    /// Consume and return the current token.
    fn bump(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn read_form(&mut self, depth: usize) -> Result<Form> {
        if depth > MAX_DEPTH {
            return Err(Error::RecursionLimit);
        }
        let token = self
            .bump()
            .ok_or_else(|| Error::Unbalanced("expected a form, got end of input".to_string()))?;
        match token.kind {
            TokenKind::LParen => Ok(Form::list(self.read_seq(TokenKind::RParen, depth)?)),
            TokenKind::LBracket => Ok(Form::vector(self.read_seq(TokenKind::RBracket, depth)?)),
            TokenKind::LBrace => self.read_map(depth),
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                Err(Error::Unbalanced(format!(
                    "unexpected '{}' at byte {}",
                    token.text, token.span.start
                )))
            }
            TokenKind::Quote => self.read_sugar("quote", depth),
            TokenKind::Quasiquote => self.read_sugar("quasiquote", depth),
            TokenKind::Unquote => self.read_sugar("unquote", depth),
            TokenKind::SpliceUnquote => self.read_sugar("splice-unquote", depth),
            TokenKind::Deref => self.read_sugar("deref", depth),
            TokenKind::WithMeta => {
                // ^meta form  =>  (with-meta form meta)
                let meta = self.read_form(depth + 1)?;
                let target = self.read_form(depth + 1)?;
                Ok(Form::list(vec![Form::symbol("with-meta"), target, meta]))
            }
            TokenKind::Nil => Ok(Form::Nil),
            TokenKind::True => Ok(Form::Bool(true)),
            TokenKind::False => Ok(Form::Bool(false)),
            TokenKind::Int => token
                .text
                .parse::<i64>()
                .map(Form::Number)
                .map_err(|_| Error::Eval(format!("integer literal out of range: {}", token.text))),
            TokenKind::Str => Ok(Form::Str(unescape(&token.text))),
            TokenKind::Keyword => Ok(Form::Keyword(token.text[1..].to_string())),
            TokenKind::Symbol => Ok(Form::Symbol(token.text.clone())),
        }
    }

    /// Read forms until `closer`, consuming it.
    fn read_seq(&mut self, closer: TokenKind, depth: usize) -> Result<Vec<Form>> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => {
                    return Err(Error::Unbalanced(format!(
                        "expected '{}', got end of input",
                        closer.as_str()
                    )));
                }
                Some(token) if token.kind == closer => {
                    self.bump();
                    return Ok(items);
                }
                Some(_) => items.push(self.read_form(depth + 1)?),
            }
        }
    }

    fn read_map(&mut self, depth: usize) -> Result<Form> {
        let items = self.read_seq(TokenKind::RBrace, depth)?;
        if items.len() % 2 != 0 {
            return Err(Error::InvalidMapKey(
                "map literal has an odd number of forms".to_string(),
            ));
        }
        let mut entries = IndexMap::with_capacity(items.len() / 2);
        let mut items = items.into_iter();
        while let (Some(key), Some(value)) = (items.next(), items.next()) {
            entries.insert(MapKey::from_form(&key)?, value);
        }
        Ok(Form::map(entries))
    }

    /// Expand a reader-macro token into `(name form)`.
    fn read_sugar(&mut self, name: &str, depth: usize) -> Result<Form> {
        let form = self.read_form(depth + 1)?;
        Ok(Form::list(vec![Form::symbol(name), form]))
    }
}

/// Strip the surrounding quotes and resolve `\"`, `\\` and `\n`. Unknown
/// escapes keep the escaped character as-is.
fn unescape(text: &str) -> String {
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}
