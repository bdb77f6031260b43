use super::{ExpectedToken, Parser};
use crate::PResult;
use bugc_ast::{
    Block, LetStmt, Stmt, StmtKind,
    token::{Delimiter, Keyword, TokenKind},
};

impl Parser {
    /// Parses a braced block of statements.
    pub fn parse_block(&mut self) -> PResult<Block> {
        let lo = self.token.span;
        self.expect_open(Delimiter::Brace)?;
        let mut stmts = Vec::new();
        while !self.eat_close(Delimiter::Brace) {
            if self.token.is_eof() {
                self.expected_tokens.push(ExpectedToken::Stmt);
                return self.unexpected();
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(Block { span: self.span_from(lo), stmts })
    }

    /// Parses a statement.
    pub fn parse_stmt(&mut self) -> PResult<Stmt> {
        let lo = self.token.span;
        let kind = if self.check_open(Delimiter::Brace) {
            StmtKind::Block(self.parse_block()?)
        } else if self.eat_keyword(Keyword::If) {
            self.parse_if()?
        } else if self.eat_keyword(Keyword::For) {
            self.parse_for()?
        } else if self.eat_keyword(Keyword::While) {
            self.expect_open(Delimiter::Parenthesis)?;
            let cond = self.parse_expr()?;
            self.expect_close(Delimiter::Parenthesis)?;
            StmtKind::While(cond, self.parse_block()?)
        } else if self.eat_keyword(Keyword::Return) {
            let value = if self.check(&TokenKind::Semi) { None } else { Some(self.parse_expr()?) };
            self.expect_semi()?;
            StmtKind::Return(value)
        } else if self.eat_keyword(Keyword::Break) {
            self.expect_semi()?;
            StmtKind::Break
        } else if self.eat_keyword(Keyword::Continue) {
            self.expect_semi()?;
            StmtKind::Continue
        } else {
            let kind = self.parse_simple_stmt()?;
            self.expect_semi()?;
            kind
        };
        Ok(Stmt { span: self.span_from(lo), kind })
    }

    /// Parses a `let`, assignment or expression statement, without the trailing semicolon.
    ///
    /// These are the statement forms allowed in the header of a `for` loop.
    fn parse_simple_stmt(&mut self) -> PResult<StmtKind> {
        if self.eat_keyword(Keyword::Let) {
            let id = self.next_id();
            let name = self.parse_ident()?;
            let ty = if self.eat(&TokenKind::Colon) { Some(self.parse_type()?) } else { None };
            self.expect(&TokenKind::Eq)?;
            let init = self.parse_expr()?;
            return Ok(StmtKind::Let(LetStmt { id, name, ty, init }));
        }

        let expr = self.parse_expr()?;
        if self.eat(&TokenKind::Eq) {
            let value = self.parse_expr()?;
            Ok(StmtKind::Assign(expr, value))
        } else {
            Ok(StmtKind::Expr(expr))
        }
    }

    /// Parses an `if` statement after the `if` keyword.
    fn parse_if(&mut self) -> PResult<StmtKind> {
        self.expect_open(Delimiter::Parenthesis)?;
        let cond = self.parse_expr()?;
        self.expect_close(Delimiter::Parenthesis)?;
        let then = self.parse_block()?;
        let else_ = if self.eat_keyword(Keyword::Else) {
            let lo = self.token.span;
            let kind = if self.eat_keyword(Keyword::If) {
                self.parse_if()?
            } else {
                StmtKind::Block(self.parse_block()?)
            };
            Some(Box::new(Stmt { span: self.span_from(lo), kind }))
        } else {
            None
        };
        Ok(StmtKind::If(cond, then, else_))
    }

    /// Parses a `for` statement after the `for` keyword.
    fn parse_for(&mut self) -> PResult<StmtKind> {
        self.expect_open(Delimiter::Parenthesis)?;

        let init = if self.eat(&TokenKind::Semi) {
            None
        } else {
            let lo = self.token.span;
            let kind = self.parse_simple_stmt()?;
            let init = Stmt { span: self.span_from(lo), kind };
            self.expect_semi()?;
            Some(Box::new(init))
        };

        let cond = if self.check(&TokenKind::Semi) { None } else { Some(self.parse_expr()?) };
        self.expect_semi()?;

        let update = if self.check_close_paren() {
            None
        } else {
            let lo = self.token.span;
            let kind = self.parse_simple_stmt()?;
            Some(Box::new(Stmt { span: self.span_from(lo), kind }))
        };
        self.expect_close(Delimiter::Parenthesis)?;

        let body = self.parse_block()?;
        Ok(StmtKind::For { init, cond, update, body })
    }

    fn check_close_paren(&mut self) -> bool {
        self.check(&TokenKind::CloseDelim(Delimiter::Parenthesis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bugc_ast::ExprKind;

    fn stmt(src: &str) -> StmtKind {
        Parser::from_source_code(src).unwrap().parse_stmt().unwrap().kind
    }

    #[test]
    fn test_let_and_assign() {
        let StmtKind::Let(let_) = stmt("let x: uint8 = 1;") else { panic!("expected let") };
        assert_eq!(let_.name.as_str(), "x");
        assert!(let_.ty.is_some());

        let StmtKind::Let(let_) = stmt("let y = x;") else { panic!("expected let") };
        assert!(let_.ty.is_none());

        let StmtKind::Assign(lhs, _) = stmt("a[1].b = 2;") else { panic!("expected assign") };
        assert!(matches!(lhs.kind, ExprKind::Member(..)));

        assert!(matches!(stmt("f(1);"), StmtKind::Expr(_)));
    }

    #[test]
    fn test_else_if_chain() {
        let StmtKind::If(_, _, Some(else_)) = stmt("if (a) { } else if (b) { } else { x = 1; }")
        else {
            panic!("expected if/else");
        };
        let StmtKind::If(_, _, Some(last)) = &else_.kind else { panic!("expected else if") };
        let StmtKind::Block(block) = &last.kind else { panic!("expected else block") };
        assert_eq!(block.stmts.len(), 1);
    }

    #[test]
    fn test_for_headers() {
        let StmtKind::For { init, cond, update, body } =
            stmt("for (let i = 0; i < 10; i = i + 1) { continue; }")
        else {
            panic!("expected for");
        };
        assert!(matches!(init.unwrap().kind, StmtKind::Let(_)));
        assert!(cond.is_some());
        assert!(matches!(update.unwrap().kind, StmtKind::Assign(..)));
        assert!(matches!(body.stmts[0].kind, StmtKind::Continue));

        let StmtKind::For { init, cond, update, .. } = stmt("for (;;) { break; }") else {
            panic!("expected for");
        };
        assert!(init.is_none() && cond.is_none() && update.is_none());
    }

    #[test]
    fn test_return_and_loops() {
        assert!(matches!(stmt("return;"), StmtKind::Return(None)));
        assert!(matches!(stmt("return a + 1;"), StmtKind::Return(Some(_))));
        assert!(matches!(stmt("while (x < 3) { x = x + 1; }"), StmtKind::While(..)));
        assert!(matches!(stmt("{ let a = 1; }"), StmtKind::Block(_)));
    }

    #[test]
    fn test_missing_semicolon() {
        let err = Parser::from_source_code("x = 1 }").unwrap().parse_stmt().unwrap_err();
        assert!(err.to_string().contains("`;`"), "{err}");
    }

    #[test]
    fn test_unclosed_block() {
        let err = Parser::from_source_code("{ x = 1;").unwrap().parse_block().unwrap_err();
        assert!(err.to_string().contains("end of file"), "{err}");
    }
}
