use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{lex, Token, TokenKind};
use miette::SourceSpan;

/// Parses one complete type expression such as `map[string][]*Node`.
pub fn parse_type(input: &str) -> ParseResult<TypeExpr> {
    let tokens = lex(input)?;
    let mut parser = Parser::new(&tokens, input.len());
    let ty = parser.parse_type()?;
    parser.finish()?;
    Ok(ty)
}

/// Hand-rolled recursive descent parser over lexed type tokens.
pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    end: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token<'a>], end: usize) -> Self {
        Self { tokens, pos: 0, end }
    }

    fn peek(&self) -> Option<&'a Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_kind_at(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    fn next(&mut self) -> Option<&'a Token<'a>> {
        let tok = self.tokens.get(self.pos);
        self.pos += 1;
        tok
    }

    fn eof_span(&self) -> SourceSpan {
        SourceSpan::new(self.end.into(), 0usize)
    }

    fn expect(&mut self, expected: TokenKind) -> ParseResult<&'a Token<'a>> {
        let eof = self.eof_span();
        match self.next() {
            Some(t) if t.kind == expected => Ok(t),
            Some(t) => Err(ParseError {
                span: t.span,
                message: format!("Expected {:?}, found '{}'", expected, t.lexeme),
            }),
            None => Err(ParseError {
                span: eof,
                message: format!("Unexpected end of input; expected {:?}", expected),
            }),
        }
    }

    /// Fails if any token is left over.
    pub fn finish(&self) -> ParseResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(ParseError {
                span: t.span,
                message: format!("Unexpected trailing '{}'", t.lexeme),
            }),
        }
    }

    fn starts_type(kind: TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Ident
                | TokenKind::Path
                | TokenKind::Star
                | TokenKind::LBracket
                | TokenKind::Map
                | TokenKind::Chan
                | TokenKind::Arrow
                | TokenKind::Func
                | TokenKind::Interface
                | TokenKind::Struct
                | TokenKind::Ellipsis
                | TokenKind::LParen
        )
    }

    //--------------------------------------------------------------------------
    // <Type> ::= <Name> | "[" "]" <Type> | "[" N "]" <Type> | "*" <Type>
    //          | "map" "[" <Type> "]" <Type> | "func" <Signature>
    //          | "chan" <Type> | "..." <Type> | "(" <Type> ")" | ...
    //--------------------------------------------------------------------------

    pub fn parse_type(&mut self) -> ParseResult<TypeExpr> {
        let eof = self.eof_span();
        let Some(tok) = self.peek() else {
            return Err(ParseError {
                span: eof,
                message: "Unexpected end of input; expected a type".to_string(),
            });
        };
        let span = tok.span;

        match tok.kind {
            TokenKind::Ident | TokenKind::Path => self.parse_named(),
            TokenKind::Star => {
                self.next();
                Ok(TypeExpr::Pointer(Box::new(self.parse_type()?)))
            }
            TokenKind::LBracket => {
                self.next();
                if self.peek_kind() == Some(TokenKind::RBracket) {
                    self.next();
                    return Ok(TypeExpr::Slice(Box::new(self.parse_type()?)));
                }
                let len_tok = self.expect(TokenKind::Number)?;
                let len_span = len_tok.span;
                let len = len_tok.lexeme.parse::<u64>().map_err(|_| ParseError {
                    span: len_span,
                    message: "Array length out of range".to_string(),
                })?;
                self.expect(TokenKind::RBracket)?;
                Ok(TypeExpr::Array(len, Box::new(self.parse_type()?)))
            }
            TokenKind::Map => {
                self.next();
                self.expect(TokenKind::LBracket)?;
                let key = self.parse_type()?;
                self.expect(TokenKind::RBracket)?;
                let value = self.parse_type()?;
                Ok(TypeExpr::Map(Box::new(key), Box::new(value)))
            }
            TokenKind::Chan => {
                self.next();
                let dir = if self.peek_kind() == Some(TokenKind::Arrow) {
                    self.next();
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                Ok(TypeExpr::Chan(dir, Box::new(self.parse_type()?)))
            }
            TokenKind::Arrow => {
                self.next();
                self.expect(TokenKind::Chan)?;
                Ok(TypeExpr::Chan(ChanDir::Recv, Box::new(self.parse_type()?)))
            }
            TokenKind::Func => {
                self.next();
                Ok(TypeExpr::Func(self.parse_signature()?))
            }
            TokenKind::Ellipsis => {
                self.next();
                Ok(TypeExpr::Variadic(Box::new(self.parse_type()?)))
            }
            TokenKind::Interface => {
                self.next();
                self.skip_braced()?;
                Ok(TypeExpr::InterfaceLit)
            }
            TokenKind::Struct => {
                self.next();
                self.skip_braced()?;
                Ok(TypeExpr::StructLit)
            }
            TokenKind::LParen => {
                self.next();
                let inner = self.parse_type()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            _ => Err(ParseError {
                span,
                message: format!("Expected a type, found '{}'", tok.lexeme),
            }),
        }
    }

    /// `Name`, `pkg.Name`, `"path".Name`, optionally followed by type arguments.
    fn parse_named(&mut self) -> ParseResult<TypeExpr> {
        let eof = self.eof_span();
        let Some(first) = self.next() else {
            return Err(ParseError {
                span: eof,
                message: "Unexpected end of input; expected a type name".to_string(),
            });
        };
        let (first_kind, first_lexeme) = (first.kind, first.lexeme);

        let base = if self.peek_kind() == Some(TokenKind::Dot) {
            self.next();
            let name = self.expect(TokenKind::Ident)?.lexeme.to_string();
            let package = match first_kind {
                TokenKind::Path => Qualifier::Path(first_lexeme.trim_matches('"').to_string()),
                _ => Qualifier::Name(first_lexeme.to_string()),
            };
            TypeExpr::Qualified { package, name }
        } else if first_kind == TokenKind::Path {
            return Err(ParseError {
                span: self.tokens[self.pos - 1].span,
                message: "An import path must be followed by '.Name'".to_string(),
            });
        } else {
            TypeExpr::Ident(first_lexeme.to_string())
        };

        if self.peek_kind() != Some(TokenKind::LBracket) {
            return Ok(base);
        }
        self.next();
        let mut args = vec![self.parse_type()?];
        while self.peek_kind() == Some(TokenKind::Comma) {
            self.next();
            args.push(self.parse_type()?);
        }
        self.expect(TokenKind::RBracket)?;
        Ok(TypeExpr::Generic(Box::new(base), args))
    }

    //--------------------------------------------------------------------------
    // <Signature> ::= "(" <Params>? ")" <Results>?
    //--------------------------------------------------------------------------

    fn parse_signature(&mut self) -> ParseResult<FuncExpr> {
        let params = self.parse_list()?;
        let results = match self.peek_kind() {
            Some(TokenKind::LParen) => self.parse_list()?,
            // A closing token ends the enclosing construct, not a result.
            Some(kind) if Self::starts_type(kind) => vec![self.parse_type()?],
            _ => Vec::new(),
        };
        Ok(FuncExpr { params, results })
    }

    /// A parenthesized, comma separated list of optionally named types.
    fn parse_list(&mut self) -> ParseResult<Vec<TypeExpr>> {
        self.expect(TokenKind::LParen)?;
        let mut items = Vec::new();
        while self.peek_kind() != Some(TokenKind::RParen) {
            // `name Type`: drop the name.
            if self.peek_kind() == Some(TokenKind::Ident)
                && self.peek_kind_at(1).map_or(false, Self::starts_type)
                && self.peek_kind_at(1) != Some(TokenKind::LParen)
            {
                self.next();
            }
            items.push(self.parse_type()?);
            if self.peek_kind() == Some(TokenKind::Comma) {
                self.next();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(items)
    }

    fn skip_braced(&mut self) -> ParseResult<()> {
        let open = self.expect(TokenKind::LBrace)?.span;
        let mut depth = 1usize;
        while depth > 0 {
            match self.next().map(|t| t.kind) {
                Some(TokenKind::LBrace) => depth += 1,
                Some(TokenKind::RBrace) => depth -= 1,
                Some(_) => {}
                None => {
                    return Err(ParseError {
                        span: open,
                        message: "Unclosed '{'".to_string(),
                    })
                }
            }
        }
        Ok(())
    }
}
