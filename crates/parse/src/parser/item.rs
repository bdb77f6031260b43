use super::{ExpectedToken, Parser};
use crate::{PResult, ParseError};
use bugc_ast::{
    FieldDecl, FunctionDef, Param, Program, StorageDecl, StructDef,
    token::{Delimiter, Keyword, LitKind, TokenKind},
};
use bugc_interface::Spanned;

impl Parser {
    /// Parses a complete program, up to and including end of file.
    #[instrument(level = "debug", skip_all)]
    pub fn parse_program(&mut self) -> PResult<Program> {
        let lo = self.token.span;
        self.expect_keyword(Keyword::Name)?;
        let name = self.parse_ident()?;
        self.expect_semi()?;

        let mut structs = Vec::new();
        let mut functions = Vec::new();
        if self.eat_keyword(Keyword::Define) {
            self.parse_define(&mut structs, &mut functions)?;
        }
        let storage =
            if self.eat_keyword(Keyword::Storage) { self.parse_storage()? } else { Vec::new() };
        let create =
            if self.eat_keyword(Keyword::Create) { Some(self.parse_block()?) } else { None };
        self.expect_keyword(Keyword::Code)?;
        let code = self.parse_block()?;
        self.expect(&TokenKind::Eof)?;

        debug!(
            name = %name,
            structs = structs.len(),
            functions = functions.len(),
            storage = storage.len(),
            "parsed program"
        );
        Ok(Program { span: self.span_from(lo), name, structs, functions, storage, create, code })
    }

    /// Parses the body of a `define { ... }` block.
    fn parse_define(
        &mut self,
        structs: &mut Vec<StructDef>,
        functions: &mut Vec<FunctionDef>,
    ) -> PResult<()> {
        self.expect_open(Delimiter::Brace)?;
        loop {
            if self.eat_close(Delimiter::Brace) {
                return Ok(());
            }
            if self.eat_keyword(Keyword::Struct) {
                structs.push(self.parse_struct()?);
            } else if self.eat_keyword(Keyword::Function) {
                functions.push(self.parse_function()?);
            } else {
                return self.unexpected();
            }
            self.eat(&TokenKind::Semi);
        }
    }

    /// Parses a struct definition after the `struct` keyword.
    fn parse_struct(&mut self) -> PResult<StructDef> {
        let lo = self.prev_token.span;
        let id = self.next_id();
        let name = self.parse_ident()?;
        self.expect_open(Delimiter::Brace)?;
        let mut fields = Vec::new();
        while !self.eat_close(Delimiter::Brace) {
            let field_lo = self.token.span;
            let name = self.parse_ident()?;
            self.expect(&TokenKind::Colon)?;
            let ty = self.parse_type()?;
            self.expect_semi()?;
            fields.push(FieldDecl { span: self.span_from(field_lo), name, ty });
        }
        Ok(StructDef { id, span: self.span_from(lo), name, fields })
    }

    /// Parses a function definition after the `function` keyword.
    fn parse_function(&mut self) -> PResult<FunctionDef> {
        let lo = self.prev_token.span;
        let id = self.next_id();
        let name = self.parse_ident()?;
        self.expect_open(Delimiter::Parenthesis)?;
        let params = self.parse_delim_comma_seq(Delimiter::Parenthesis, |this| {
            let lo = this.token.span;
            let id = this.next_id();
            let name = this.parse_ident()?;
            this.expect(&TokenKind::Colon)?;
            let ty = this.parse_type()?;
            Ok(Param { id, span: this.span_from(lo), name, ty })
        })?;
        let ret = if self.eat(&TokenKind::Arrow) { Some(self.parse_type()?) } else { None };
        let body = self.parse_block()?;
        Ok(FunctionDef { id, span: self.span_from(lo), name, params, ret, body })
    }

    /// Parses the body of a `storage { ... }` block.
    fn parse_storage(&mut self) -> PResult<Vec<StorageDecl>> {
        self.expect_open(Delimiter::Brace)?;
        let mut decls = Vec::new();
        while !self.eat_close(Delimiter::Brace) {
            let lo = self.token.span;
            self.expect_open(Delimiter::Bracket)?;
            let slot = self.parse_u64()?;
            self.expect_close(Delimiter::Bracket)?;
            let id = self.next_id();
            let name = self.parse_ident()?;
            self.expect(&TokenKind::Colon)?;
            let ty = self.parse_type()?;
            self.expect_semi()?;
            decls.push(StorageDecl { id, span: self.span_from(lo), slot, name, ty });
        }
        Ok(decls)
    }

    /// Parses a decimal integer literal that fits in a `u64`.
    pub(super) fn parse_u64(&mut self) -> PResult<Spanned<u64>> {
        let TokenKind::Literal(LitKind::Integer, text) = &self.token.kind else {
            self.expected_tokens.push(ExpectedToken::Lit);
            return self.unexpected();
        };
        let span = self.token.span;
        let value = text.parse::<u64>().map_err(|_| ParseError::InvalidNumber {
            literal: text.clone(),
            reason: "value does not fit in 64 bits",
            span,
        })?;
        self.bump();
        Ok(Spanned::new(span, value))
    }
}

#[cfg(test)]
mod tests {
    use crate::parse_program;
    use bugc_ast::TypeKind;

    #[test]
    fn test_parse_full_program() {
        let src = r#"
            name Bank;
            define {
                struct Account { owner: address; balance: uint256; };
                function add(a: uint256, b: uint256) -> uint256 { return a + b; };
            }
            storage {
                [0] total: uint256;
                [1] accounts: mapping<address, Account>;
            }
            create { total = 1; }
            code { total = add(total, 2); }
        "#;
        let program = parse_program(src).unwrap();
        assert_eq!(program.name.as_str(), "Bank");
        assert_eq!(program.structs.len(), 1);
        assert_eq!(program.structs[0].fields.len(), 2);
        let add = program.find_function("add").unwrap();
        assert_eq!(add.params.len(), 2);
        assert!(add.ret.is_some());
        assert_eq!(program.storage.len(), 2);
        assert_eq!(*program.storage[1].slot, 1);
        assert!(matches!(program.storage[1].ty.kind, TypeKind::Mapping(..)));
        assert!(program.create.is_some());
        assert_eq!(program.code.stmts.len(), 1);
    }

    #[test]
    fn test_minimal_program() {
        let program = parse_program("name Empty; code {}").unwrap();
        assert!(program.storage.is_empty());
        assert!(program.create.is_none());
        assert!(program.code.stmts.is_empty());
    }

    #[test]
    fn test_node_ids_unique() {
        let program =
            parse_program("name X; storage { [0] a: uint256; [1] b: uint256; } code { a = b; }")
                .unwrap();
        assert_ne!(program.storage[0].id, program.storage[1].id);
    }

    #[test]
    fn test_missing_code_block() {
        let err = parse_program("name X; storage {}").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("`code`"), "{msg}");
        assert!(msg.contains("`create`"), "{msg}");
    }

    #[test]
    fn test_storage_slot_overflow() {
        let err = parse_program("name X; storage { [99999999999999999999] a: uint256; } code {}")
            .unwrap_err();
        assert!(matches!(err, crate::ParseError::InvalidNumber { .. }));
    }
}
