use logos::Logos;
use miette::SourceSpan;

/// A token of a type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub span: SourceSpan,
}

/// Tokens of the source language's type syntax.
#[derive(Debug, Logos, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    #[token("map")]
    Map,
    #[token("chan")]
    Chan,
    #[token("func")]
    Func,
    #[token("interface")]
    Interface,
    #[token("struct")]
    Struct,

    #[token("<-")]
    Arrow,
    #[token("...")]
    Ellipsis,

    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("*")]
    Star,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,

    #[regex(r"[0-9]+")]
    Number,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    /// A quoted import path qualifying a type name.
    #[regex(r#""[^"]*""#)]
    Path,

    #[regex(r"[ \t\n\r]+", logos::skip)]
    Whitespace,

    #[error]
    Error,
}
