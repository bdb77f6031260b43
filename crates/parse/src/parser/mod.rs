use crate::{PResult, ParseError};
use bugc_ast::{
    Ident, NodeId,
    token::{Delimiter, Keyword, Token, TokenKind},
};
use bugc_interface::Span;
use std::fmt;

mod expr;
mod item;
mod stmt;
mod ty;

/// BUG parser.
pub struct Parser {
    /// The current token.
    pub token: Token,
    /// The previous token.
    pub prev_token: Token,
    /// List of expected tokens. Cleared after each `bump` call.
    expected_tokens: Vec<ExpectedToken>,
    /// The token stream.
    tokens: std::vec::IntoIter<Token>,
    /// The next node ID to hand out.
    next_node_id: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ExpectedToken {
    Token(TokenKind),
    Keyword(Keyword),
    Lit,
    Ident,
    Type,
    Expr,
    Stmt,
}

impl fmt::Display for ExpectedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Token(t) => return write!(f, "`{t}`"),
            Self::Keyword(kw) => return write!(f, "`{}`", kw.to_str()),
            Self::Lit => "literal",
            Self::Ident => "identifier",
            Self::Type => "type name",
            Self::Expr => "expression",
            Self::Stmt => "statement",
        })
    }
}

impl Parser {
    /// Creates a new parser.
    ///
    /// The token stream is expected to end with [`Eof`](TokenKind::Eof); a missing end is treated
    /// as end of file.
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut parser = Self {
            token: Token::EOF,
            prev_token: Token::EOF,
            expected_tokens: Vec::new(),
            tokens: tokens.into_iter(),
            next_node_id: 0,
        };
        parser.bump();
        parser
    }

    /// Creates a new parser from a source code string.
    pub fn from_source_code(src: &str) -> PResult<Self> {
        crate::Lexer::new(src).into_tokens().map(Self::new)
    }

    /// Allocates a fresh node ID.
    pub(crate) fn next_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    /// Advance the parser by one token.
    pub fn bump(&mut self) {
        let mut next = self.tokens.next().unwrap_or(Token::EOF);
        if next.is_eof() && next.span.is_dummy() {
            next.span = self.token.span.shrink_to_hi();
        }
        self.prev_token = std::mem::replace(&mut self.token, next);
        self.expected_tokens.clear();
    }

    /// Returns the token `dist` tokens ahead of the current one, without consuming anything.
    pub fn look_ahead(&self, dist: usize) -> TokenKind {
        if dist == 0 {
            return self.token.kind.clone();
        }
        self.tokens.as_slice().get(dist - 1).map(|t| t.kind.clone()).unwrap_or(TokenKind::Eof)
    }

    /// Returns an "unexpected token" error for the current token, listing what was expected.
    #[track_caller]
    pub fn unexpected<T>(&mut self) -> PResult<T> {
        Err(self.unexpected_error())
    }

    fn unexpected_error(&mut self) -> ParseError {
        let mut expected: Vec<String> =
            self.expected_tokens.iter().map(ToString::to_string).collect();
        expected.sort();
        expected.dedup();
        ParseError::UnexpectedToken {
            found: self.token.kind.description(),
            expected,
            span: self.token.span,
        }
    }

    /// Expects and consumes the token `tok`. Signals an error if the next token is not `tok`.
    #[track_caller]
    pub fn expect(&mut self, tok: &TokenKind) -> PResult<()> {
        if self.eat(tok) { Ok(()) } else { self.unexpected() }
    }

    /// Expects and consumes a semicolon.
    pub(crate) fn expect_semi(&mut self) -> PResult<()> {
        self.expect(&TokenKind::Semi)
    }

    /// Expects and consumes the keyword `kw`.
    pub(crate) fn expect_keyword(&mut self, kw: Keyword) -> PResult<()> {
        if self.eat_keyword(kw) { Ok(()) } else { self.unexpected() }
    }

    /// Checks if the next token is `tok`, and returns `true` if so.
    ///
    /// This method will automatically add `tok` to `expected_tokens` if `tok` is not
    /// encountered.
    fn check(&mut self, tok: &TokenKind) -> bool {
        let is_present = self.token.kind == *tok;
        if !is_present {
            self.expected_tokens.push(ExpectedToken::Token(tok.clone()));
        }
        is_present
    }

    /// Consumes a token 'tok' if it exists. Returns whether the given token was present.
    pub fn eat(&mut self, tok: &TokenKind) -> bool {
        let is_present = self.check(tok);
        if is_present {
            self.bump()
        }
        is_present
    }

    /// Checks if the next token is the keyword `kw`.
    fn check_keyword(&mut self, kw: Keyword) -> bool {
        let is_present = self.token.is_keyword(kw);
        if !is_present {
            self.expected_tokens.push(ExpectedToken::Keyword(kw));
        }
        is_present
    }

    /// If the next token is the given keyword, eats it and returns `true`.
    pub fn eat_keyword(&mut self, kw: Keyword) -> bool {
        let is_present = self.check_keyword(kw);
        if is_present {
            self.bump();
        }
        is_present
    }

    fn check_open(&mut self, delim: Delimiter) -> bool {
        self.check(&TokenKind::OpenDelim(delim))
    }

    fn eat_open(&mut self, delim: Delimiter) -> bool {
        self.eat(&TokenKind::OpenDelim(delim))
    }

    fn expect_open(&mut self, delim: Delimiter) -> PResult<()> {
        self.expect(&TokenKind::OpenDelim(delim))
    }

    fn eat_close(&mut self, delim: Delimiter) -> bool {
        self.eat(&TokenKind::CloseDelim(delim))
    }

    fn expect_close(&mut self, delim: Delimiter) -> PResult<()> {
        self.expect(&TokenKind::CloseDelim(delim))
    }

    /// Parses a comma-separated sequence delimited by `delim`, allowing a trailing comma.
    ///
    /// The opening delimiter must already have been consumed.
    fn parse_delim_comma_seq<T>(
        &mut self,
        delim: Delimiter,
        mut f: impl FnMut(&mut Self) -> PResult<T>,
    ) -> PResult<Vec<T>> {
        let mut items = Vec::new();
        loop {
            if self.eat_close(delim) {
                break;
            }
            items.push(f(self)?);
            if !self.eat(&TokenKind::Comma) {
                self.expect_close(delim)?;
                break;
            }
        }
        Ok(items)
    }

    /// Parses an identifier.
    pub fn parse_ident(&mut self) -> PResult<Ident> {
        match &self.token.kind {
            TokenKind::Ident(name) => {
                let ident = Ident::new(name.clone(), self.token.span);
                self.bump();
                Ok(ident)
            }
            _ => {
                self.expected_tokens.push(ExpectedToken::Ident);
                self.unexpected()
            }
        }
    }

    /// Returns the span from `lo` to the end of the previous token.
    fn span_from(&self, lo: Span) -> Span {
        lo.to(self.prev_token.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_tokens_reported() {
        let mut parser = Parser::from_source_code("name Foo }").unwrap();
        let err = parser.parse_program().unwrap_err();
        let ParseError::UnexpectedToken { found, expected, span } = err else {
            panic!("unexpected error kind");
        };
        assert_eq!(found, "`}`");
        assert_eq!(expected, ["`;`"]);
        assert_eq!(span, Span::new(9, 10));
    }

    #[test]
    fn test_eof_span_points_after_last_token() {
        let mut parser = Parser::from_source_code("name Foo;").unwrap();
        let err = parser.parse_program().unwrap_err();
        assert_eq!(err.span(), Span::new(9, 9));
        assert!(err.to_string().contains("end of file"), "{err}");
    }
}
