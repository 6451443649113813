//! Token definitions for the Tarn lexer

use logos::Logos;

/// Byte range of a token in the source line.
pub type Span = std::ops::Range<usize>;

/// A token with its kind, span, and text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

/// Token kinds recognized by the lexer.
///
/// Whitespace and commas separate tokens; `;` comments run to end of line.
/// Symbols are any run of non-special characters, which is what lets
/// `swap!`, `*ARGV*`, `-` and `&` all lex as plain symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos)]
#[logos(skip r"[ \t\r\n\f,]+")]
#[logos(skip r";[^\n]*")]
pub enum TokenKind {
    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // Reader macros
    #[token("'")]
    Quote,
    #[token("`")]
    Quasiquote,
    #[token("~@")]
    SpliceUnquote,
    #[token("~")]
    Unquote,
    #[token("@")]
    Deref,
    #[token("^")]
    WithMeta,

    // Named literals
    #[token("nil", priority = 4)]
    Nil,
    #[token("true", priority = 4)]
    True,
    #[token("false", priority = 4)]
    False,

    // Literals
    #[regex(r"-?[0-9]+", priority = 3)]
    Int,
    #[regex(r#""([^"\\]|\\[\s\S])*""#)]
    Str,
    #[regex(r#":[^\s\[\]{}()'"`;,~@^]+"#, priority = 3)]
    Keyword,

    // Symbols (priority 2 so ints, keywords and named literals win ties)
    #[regex(r#"[^\s\[\]{}()'"`;,~@^]+"#, priority = 2)]
    Symbol,
}

impl TokenKind {
    /// Get the string representation of the token
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Quote => "'",
            TokenKind::Quasiquote => "`",
            TokenKind::SpliceUnquote => "~@",
            TokenKind::Unquote => "~",
            TokenKind::Deref => "@",
            TokenKind::WithMeta => "^",
            TokenKind::Nil => "nil",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Int => "<int>",
            TokenKind::Str => "<string>",
            TokenKind::Keyword => "<keyword>",
            TokenKind::Symbol => "<symbol>",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
