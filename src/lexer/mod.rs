//! Lexer: source text to tokens.

pub mod tokens;

use logos::Logos;

pub use tokens::{Span, Token, TokenKind};

use crate::error::{Error, Result};

/// Tokenize one unit of input.
///
/// Comment-only and whitespace-only input yields an empty vector; the
/// reader turns that into a blank-input signal. The only character
/// sequence the token grammar cannot absorb is an unterminated string.
pub fn lex(source: &str) -> Result<Vec<Token>> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                span: lexer.span(),
                text: lexer.slice().to_string(),
            }),
            Err(()) if lexer.slice().starts_with('"') => {
                return Err(Error::Unbalanced(
                    "expected '\"', got end of input".to_string(),
                ));
            }
            Err(()) => {
                return Err(Error::Eval(format!(
                    "unexpected character {:?} at byte {}",
                    lexer.slice(),
                    lexer.span().start
                )));
            }
        }
    }
    Ok(tokens)
}
