//! BUG lexer.

use crate::{ParseError, PResult};
use bugc_ast::token::{BinOpToken, Delimiter, Keyword, LitKind, Token, TokenKind};
use bugc_interface::Span;

mod cursor;
use cursor::token::{Base, RawLiteralKind, RawToken, RawTokenKind};
pub use cursor::{Cursor, is_id_continue, is_id_start, is_whitespace};

/// BUG lexer.
///
/// Converts a [`Cursor`]'s output from simple [`RawTokenKind`]s into rich [`TokenKind`]s,
/// resolving keywords, unescaping strings, and dropping comments and whitespace.
pub struct Lexer<'src> {
    /// Source text to tokenize.
    src: &'src str,
    /// Cursor for getting lexer tokens.
    cursor: Cursor<'src>,
    /// The absolute offset of the current character.
    pos: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a new `Lexer` for the given source string.
    pub fn new(src: &'src str) -> Self {
        Self { src, cursor: Cursor::new(src), pos: 0 }
    }

    /// Consumes the lexer and collects the tokens into a vector, ending with
    /// [`Eof`](TokenKind::Eof).
    #[instrument(name = "lex", level = "debug", skip_all)]
    pub fn into_tokens(mut self) -> PResult<Vec<Token>> {
        let mut tokens = Vec::with_capacity(self.src.len() / 4);
        loop {
            let token = self.next_token()?;
            let eof = token.is_eof();
            tokens.push(token);
            if eof {
                break;
            }
        }
        trace!(src.len = self.src.len(), tokens.len = tokens.len(), "lexed");
        Ok(tokens)
    }

    /// Returns the next token, advancing the lexer.
    pub fn next_token(&mut self) -> PResult<Token> {
        loop {
            let RawToken { kind: raw_kind, len } = self.cursor.advance_token();
            let start = self.pos;
            self.pos += len;
            let span = Span::new(start, self.pos);

            let kind = match raw_kind {
                RawTokenKind::LineComment | RawTokenKind::Whitespace => continue,
                RawTokenKind::BlockComment { terminated } => {
                    if !terminated {
                        return Err(ParseError::UnterminatedComment { span });
                    }
                    continue;
                }
                RawTokenKind::Ident => {
                    let text = self.str_from(start);
                    match Keyword::from_str_opt(text) {
                        Some(kw) => TokenKind::Keyword(kw),
                        None => TokenKind::Ident(text.to_string()),
                    }
                }
                RawTokenKind::Literal { kind } => self.cook_literal(start, kind, span)?,

                RawTokenKind::Semi => TokenKind::Semi,
                RawTokenKind::Comma => TokenKind::Comma,
                RawTokenKind::Dot => TokenKind::Dot,
                RawTokenKind::OpenParen => TokenKind::OpenDelim(Delimiter::Parenthesis),
                RawTokenKind::CloseParen => TokenKind::CloseDelim(Delimiter::Parenthesis),
                RawTokenKind::OpenBrace => TokenKind::OpenDelim(Delimiter::Brace),
                RawTokenKind::CloseBrace => TokenKind::CloseDelim(Delimiter::Brace),
                RawTokenKind::OpenBracket => TokenKind::OpenDelim(Delimiter::Bracket),
                RawTokenKind::CloseBracket => TokenKind::CloseDelim(Delimiter::Bracket),
                RawTokenKind::Colon => TokenKind::Colon,
                RawTokenKind::Eq => TokenKind::Eq,
                RawTokenKind::EqEq => TokenKind::EqEq,
                RawTokenKind::Bang => TokenKind::Not,
                RawTokenKind::Ne => TokenKind::Ne,
                RawTokenKind::Lt => TokenKind::Lt,
                RawTokenKind::Le => TokenKind::Le,
                RawTokenKind::Gt => TokenKind::Gt,
                RawTokenKind::Ge => TokenKind::Ge,
                RawTokenKind::Arrow => TokenKind::Arrow,
                RawTokenKind::AndAnd => TokenKind::AndAnd,
                RawTokenKind::OrOr => TokenKind::OrOr,
                RawTokenKind::Minus => TokenKind::BinOp(BinOpToken::Minus),
                RawTokenKind::Plus => TokenKind::BinOp(BinOpToken::Plus),
                RawTokenKind::Star => TokenKind::BinOp(BinOpToken::Star),
                RawTokenKind::Slash => TokenKind::BinOp(BinOpToken::Slash),
                RawTokenKind::Percent => TokenKind::BinOp(BinOpToken::Percent),

                RawTokenKind::Unknown => {
                    let c = self.str_from(start).chars().next().unwrap_or('\0');
                    return Err(ParseError::UnknownCharacter { c, span });
                }
                RawTokenKind::Eof => TokenKind::Eof,
            };
            return Ok(Token::new(kind, span));
        }
    }

    fn cook_literal(&self, start: u32, kind: RawLiteralKind, span: Span) -> PResult<TokenKind> {
        let text = self.str_from(start);
        Ok(match kind {
            RawLiteralKind::Int { base, empty_int } => {
                if empty_int {
                    return Err(ParseError::InvalidNumber {
                        literal: text.to_string(),
                        reason: "missing digits after the base prefix",
                        span,
                    });
                }
                let text = text.replace('_', "");
                let kind = match base {
                    Base::Decimal => LitKind::Integer,
                    Base::Hexadecimal => LitKind::HexInteger,
                };
                TokenKind::Literal(kind, text)
            }
            RawLiteralKind::Str { terminated } => {
                if !terminated {
                    return Err(ParseError::UnterminatedString { span });
                }
                let quote_len = 1;
                let inner = &text[quote_len..text.len() - quote_len];
                TokenKind::Literal(LitKind::Str, unescape(inner, span)?)
            }
        })
    }

    fn str_from(&self, start: u32) -> &'src str {
        &self.src[start as usize..self.pos as usize]
    }
}

fn unescape(s: &str, span: Span) -> PResult<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('0') => '\0',
            Some(c @ ('\\' | '"' | '\'')) => c,
            other => {
                return Err(ParseError::InvalidEscape {
                    escape: other.map(String::from).unwrap_or_default(),
                    span,
                });
            }
        };
        out.push(escaped);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).into_tokens().unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_and_idents() {
        assert_eq!(
            lex("let counter"),
            [
                TokenKind::Keyword(Keyword::Let),
                TokenKind::Ident("counter".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            lex(r#"1_000 0xAB "a\nb""#),
            [
                TokenKind::Literal(LitKind::Integer, "1000".into()),
                TokenKind::Literal(LitKind::HexInteger, "0xAB".into()),
                TokenKind::Literal(LitKind::Str, "a\nb".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_spans_skip_comments() {
        let tokens = Lexer::new("/* c */ x // y\n;").into_tokens().unwrap();
        assert_eq!(tokens[0].span, Span::new(8, 9));
        assert_eq!(tokens[1].kind, TokenKind::Semi);
        assert_eq!(tokens[1].span, Span::new(15, 16));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Lexer::new("x # y").into_tokens(),
            Err(ParseError::UnknownCharacter { c: '#', .. })
        ));
        assert!(matches!(
            Lexer::new("\"abc").into_tokens(),
            Err(ParseError::UnterminatedString { .. })
        ));
        assert!(matches!(Lexer::new("0x").into_tokens(), Err(ParseError::InvalidNumber { .. })));
        assert!(matches!(
            Lexer::new(r#""\q""#).into_tokens(),
            Err(ParseError::InvalidEscape { .. })
        ));
    }
}
