use super::{ExpectedToken, Parser};
use crate::{PResult, ParseError};
use alloy_primitives::{Address, U256};
use bugc_ast::{
    BinOp, BinOpKind, Expr, ExprKind, Lit, Special, UnOp, UnOpKind,
    token::{BinOpToken, Delimiter, Keyword, LitKind, TokenKind},
};
use bugc_interface::Span;

/// Number of hex digits in an address literal.
const ADDRESS_HEX_DIGITS: usize = 40;

impl Parser {
    /// Parses an expression.
    #[inline]
    pub fn parse_expr(&mut self) -> PResult<Box<Expr>> {
        self.parse_binary_expr(1)
    }

    /// Parses a binary expression whose operators all bind at least as tightly as
    /// `min_precedence`. All binary operators are left-associative.
    fn parse_binary_expr(&mut self, min_precedence: usize) -> PResult<Box<Expr>> {
        let mut expr = self.parse_cast_expr()?;
        while let Some((kind, precedence)) = token_binop(&self.token.kind) {
            if precedence < min_precedence {
                break;
            }
            let op = BinOp { span: self.token.span, kind };
            self.bump(); // binop token
            let rhs = self.parse_binary_expr(precedence + 1)?;
            let span = expr.span.to(rhs.span);
            expr = self.mk_expr(span, ExprKind::Binary(expr, op, rhs));
        }
        Ok(expr)
    }

    /// Parses a unary expression followed by any number of `as T` casts.
    fn parse_cast_expr(&mut self) -> PResult<Box<Expr>> {
        let mut expr = self.parse_unary_expr()?;
        while self.eat_keyword(Keyword::As) {
            let ty = self.parse_type()?;
            let span = expr.span.to(ty.span);
            expr = self.mk_expr(span, ExprKind::Cast(expr, ty));
        }
        Ok(expr)
    }

    /// Parses a unary expression.
    fn parse_unary_expr(&mut self) -> PResult<Box<Expr>> {
        let lo = self.token.span;
        let kind = match self.token.kind {
            TokenKind::Not => UnOpKind::Not,
            TokenKind::BinOp(BinOpToken::Minus) => UnOpKind::Neg,
            _ => return self.parse_postfix_expr(),
        };
        self.bump(); // unop
        let operand = self.parse_unary_expr()?;
        let span = self.span_from(lo);
        Ok(self.mk_expr(span, ExprKind::Unary(UnOp { span: lo, kind }, operand)))
    }

    /// Parses a primary expression followed by member accesses, index accesses and calls.
    fn parse_postfix_expr(&mut self) -> PResult<Box<Expr>> {
        let lo = self.token.span;
        let mut expr = self.parse_primary_expr()?;
        loop {
            let kind = if self.eat(&TokenKind::Dot) {
                // expr.member
                let member = self.parse_ident()?;
                ExprKind::Member(expr, member)
            } else if self.eat_open(Delimiter::Bracket) {
                // expr[index]
                let index = self.parse_expr()?;
                self.expect_close(Delimiter::Bracket)?;
                ExprKind::Index(expr, index)
            } else if self.eat_open(Delimiter::Parenthesis) {
                // expr(args)
                let args = self.parse_expr_list(Delimiter::Parenthesis)?;
                ExprKind::Call(expr, args)
            } else {
                break;
            };
            let span = self.span_from(lo);
            expr = self.mk_expr(span, kind);
        }
        Ok(expr)
    }

    /// Parses a primary expression.
    fn parse_primary_expr(&mut self) -> PResult<Box<Expr>> {
        let lo = self.token.span;
        let kind = match &self.token.kind {
            TokenKind::Literal(kind, text) => {
                let lit = parse_lit(*kind, text, lo)?;
                self.bump();
                ExprKind::Lit(lit)
            }
            TokenKind::Ident(_) => ExprKind::Ident(self.parse_ident()?),
            TokenKind::Keyword(Keyword::True) => {
                self.bump();
                ExprKind::Lit(Lit::Bool(true))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.bump();
                ExprKind::Lit(Lit::Bool(false))
            }
            TokenKind::Keyword(base @ (Keyword::Msg | Keyword::Block)) => {
                let base = base.to_str();
                self.bump();
                self.expect(&TokenKind::Dot)?;
                let member = self.parse_ident()?;
                let special = Special::from_parts(base, member.as_str()).ok_or_else(|| {
                    ParseError::UnknownSpecial {
                        base: base.to_string(),
                        member: member.name.clone(),
                        span: lo.to(member.span),
                    }
                })?;
                ExprKind::Special(special)
            }
            TokenKind::Keyword(Keyword::Keccak256) => {
                self.bump();
                self.expect_open(Delimiter::Parenthesis)?;
                let arg = self.parse_expr()?;
                self.expect_close(Delimiter::Parenthesis)?;
                ExprKind::Keccak256(arg)
            }
            TokenKind::OpenDelim(Delimiter::Bracket) => {
                self.bump();
                ExprKind::Array(self.parse_expr_list(Delimiter::Bracket)?)
            }
            TokenKind::OpenDelim(Delimiter::Parenthesis) => {
                self.bump();
                let mut inner = self.parse_expr()?;
                self.expect_close(Delimiter::Parenthesis)?;
                inner.span = self.span_from(lo);
                return Ok(inner);
            }
            _ => {
                self.expected_tokens.push(ExpectedToken::Expr);
                return self.unexpected();
            }
        };
        let span = self.span_from(lo);
        Ok(self.mk_expr(span, kind))
    }

    /// Parses a comma-separated expression list after its opening delimiter.
    fn parse_expr_list(&mut self, delim: Delimiter) -> PResult<Vec<Expr>> {
        self.parse_delim_comma_seq(delim, |this| this.parse_expr().map(|expr| *expr))
    }

    fn mk_expr(&mut self, span: Span, kind: ExprKind) -> Box<Expr> {
        Box::new(Expr { id: self.next_id(), span, kind })
    }
}

/// Returns the binary operator and its precedence for the given token, if it is one.
/// Higher binds tighter.
fn token_binop(kind: &TokenKind) -> Option<(BinOpKind, usize)> {
    Some(match kind {
        TokenKind::OrOr => (BinOpKind::Or, 1),
        TokenKind::AndAnd => (BinOpKind::And, 2),
        TokenKind::EqEq => (BinOpKind::Eq, 3),
        TokenKind::Ne => (BinOpKind::Ne, 3),
        TokenKind::Lt => (BinOpKind::Lt, 4),
        TokenKind::Le => (BinOpKind::Le, 4),
        TokenKind::Gt => (BinOpKind::Gt, 4),
        TokenKind::Ge => (BinOpKind::Ge, 4),
        TokenKind::BinOp(BinOpToken::Plus) => (BinOpKind::Add, 5),
        TokenKind::BinOp(BinOpToken::Minus) => (BinOpKind::Sub, 5),
        TokenKind::BinOp(BinOpToken::Star) => (BinOpKind::Mul, 6),
        TokenKind::BinOp(BinOpToken::Slash) => (BinOpKind::Div, 6),
        TokenKind::BinOp(BinOpToken::Percent) => (BinOpKind::Rem, 6),
        _ => return None,
    })
}

/// Converts a cooked literal token into a [`Lit`].
fn parse_lit(kind: LitKind, text: &str, span: Span) -> PResult<Lit> {
    let invalid = |reason| ParseError::InvalidNumber { literal: text.to_string(), reason, span };
    match kind {
        LitKind::Integer => {
            U256::from_str_radix(text, 10).map(Lit::Number).map_err(|_| invalid("number too large"))
        }
        LitKind::HexInteger => {
            let digits = text.strip_prefix("0x").unwrap_or(text);
            if digits.len() == ADDRESS_HEX_DIGITS {
                digits.parse::<Address>().map(Lit::Address).map_err(|_| invalid("invalid address"))
            } else {
                U256::from_str_radix(digits, 16)
                    .map(Lit::Number)
                    .map_err(|_| invalid("number too large"))
            }
        }
        LitKind::Str => Ok(Lit::Str(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(src: &str) -> Box<Expr> {
        Parser::from_source_code(src).unwrap().parse_expr().unwrap()
    }

    fn binop(expr: &Expr) -> (BinOpKind, &Expr, &Expr) {
        match &expr.kind {
            ExprKind::Binary(lhs, op, rhs) => (op.kind, lhs, rhs),
            kind => panic!("expected binary expression, got {kind:?}"),
        }
    }

    #[test]
    fn test_precedence() {
        let e = expr("a || b && c == d + e * f");
        let (op, _, rhs) = binop(&e);
        assert_eq!(op, BinOpKind::Or);
        let (op, _, rhs) = binop(rhs);
        assert_eq!(op, BinOpKind::And);
        let (op, _, rhs) = binop(rhs);
        assert_eq!(op, BinOpKind::Eq);
        let (op, _, rhs) = binop(rhs);
        assert_eq!(op, BinOpKind::Add);
        let (op, _, _) = binop(rhs);
        assert_eq!(op, BinOpKind::Mul);
    }

    #[test]
    fn test_left_associative() {
        let e = expr("a - b - c");
        let (op, lhs, rhs) = binop(&e);
        assert_eq!(op, BinOpKind::Sub);
        assert!(matches!(lhs.kind, ExprKind::Binary(..)));
        assert!(matches!(rhs.kind, ExprKind::Ident(_)));
    }

    #[test]
    fn test_cast_binds_tighter_than_mul() {
        let e = expr("-x as int8 * 2");
        let (op, lhs, _) = binop(&e);
        assert_eq!(op, BinOpKind::Mul);
        let ExprKind::Cast(inner, _) = &lhs.kind else { panic!("expected cast") };
        assert!(matches!(inner.kind, ExprKind::Unary(UnOp { kind: UnOpKind::Neg, .. }, _)));
    }

    #[test]
    fn test_postfix_chain() {
        let e = expr("users[i].balance");
        let ExprKind::Member(base, member) = &e.kind else { panic!("expected member") };
        assert_eq!(member.as_str(), "balance");
        assert!(matches!(base.kind, ExprKind::Index(..)));

        let e = expr("add(1, 2,)");
        let ExprKind::Call(callee, args) = &e.kind else { panic!("expected call") };
        assert!(callee.as_ident().is_some());
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_literals() {
        assert!(matches!(expr("0x2a").kind, ExprKind::Lit(Lit::Number(n)) if n == U256::from(42)));
        let lit = expr("1_000").kind;
        assert!(matches!(lit, ExprKind::Lit(Lit::Number(n)) if n == U256::from(1000)));
        let ExprKind::Lit(Lit::Address(address)) =
            expr("0x0000000000000000000000000000000000000001").kind
        else {
            panic!("expected address");
        };
        assert_eq!(address, Address::with_last_byte(1));
        assert!(matches!(expr("\"hi\"").kind, ExprKind::Lit(Lit::Str(ref s)) if s == "hi"));
        assert!(matches!(expr("false").kind, ExprKind::Lit(Lit::Bool(false))));
    }

    #[test]
    fn test_number_too_large() {
        let src = format!("1{}", "0".repeat(80));
        let err = Parser::from_source_code(&src).unwrap().parse_expr().unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { .. }));
    }

    #[test]
    fn test_specials() {
        assert!(matches!(expr("msg.sender").kind, ExprKind::Special(Special::MsgSender)));
        let e = expr("msg.data.length");
        let ExprKind::Member(base, _) = &e.kind else { panic!("expected member") };
        assert!(matches!(base.kind, ExprKind::Special(Special::MsgData)));

        let err = Parser::from_source_code("block.coinbase").unwrap().parse_expr().unwrap_err();
        assert_eq!(err.to_string(), "unknown member `block.coinbase`");
    }

    #[test]
    fn test_array_keccak_and_parens() {
        let ExprKind::Array(elems) = expr("[1, 2, 3]").kind else { panic!("expected array") };
        assert_eq!(elems.len(), 3);
        assert!(matches!(expr("keccak256(x)").kind, ExprKind::Keccak256(_)));
        let e = expr("(a + b) * c");
        let (op, lhs, _) = binop(&e);
        assert_eq!(op, BinOpKind::Mul);
        assert_eq!(lhs.span, Span::new(0, 7));
    }

    #[test]
    fn test_expected_expression() {
        let err = Parser::from_source_code(";").unwrap().parse_expr().unwrap_err();
        assert!(err.to_string().contains("expression"), "{err}");
    }

    #[test]
    fn test_node_ids_unique() {
        let e = expr("a + b");
        let (_, lhs, rhs) = binop(&e);
        assert_ne!(lhs.id, rhs.id);
        assert_ne!(e.id, lhs.id);
    }
}
