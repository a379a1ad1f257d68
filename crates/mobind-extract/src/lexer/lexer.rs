use super::token::*;
use crate::error::ParseError;
use logos::Logos;
use miette::SourceSpan;

/// Lexes a type expression into tokens.
pub fn lex(input: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let mut lexer = TokenKind::lexer(input);
    let mut tokens = Vec::new();

    while let Some(kind) = lexer.next() {
        let range = lexer.span();
        let lexeme = &input[range.clone()];
        let span = SourceSpan::new(range.start.into(), range.len());

        match kind {
            TokenKind::Error => {
                return Err(ParseError {
                    span,
                    message: format!("Unrecognized token: '{}'", lexeme),
                });
            }
            _ => tokens.push(Token { kind, lexeme, span }),
        }
    }

    Ok(tokens)
}
