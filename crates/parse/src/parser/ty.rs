use super::{ExpectedToken, Parser};
use crate::{PResult, ParseError};
use bugc_ast::{
    ElementaryType, TypeExpr, TypeKind,
    token::{Keyword, TokenKind},
};

impl Parser {
    /// Parses a type name.
    pub fn parse_type(&mut self) -> PResult<TypeExpr> {
        let lo = self.token.span;
        let kind = if self.eat_keyword(Keyword::Array) {
            self.expect(&TokenKind::Lt)?;
            let element = self.parse_type()?;
            let size = if self.eat(&TokenKind::Comma) { Some(*self.parse_u64()?) } else { None };
            self.expect(&TokenKind::Gt)?;
            TypeKind::Array(Box::new(element), size)
        } else if self.eat_keyword(Keyword::Mapping) {
            self.expect(&TokenKind::Lt)?;
            let key = self.parse_type()?;
            self.expect(&TokenKind::Comma)?;
            let value = self.parse_type()?;
            self.expect(&TokenKind::Gt)?;
            TypeKind::Mapping(Box::new(key), Box::new(value))
        } else if let TokenKind::Ident(_) = self.token.kind {
            let ident = self.parse_ident()?;
            match ElementaryType::parse(ident.as_str()) {
                Some(ty) => TypeKind::Elementary(ty),
                None if looks_elementary(ident.as_str()) => {
                    return Err(ParseError::InvalidType { name: ident.name, span: ident.span });
                }
                None => TypeKind::Custom(ident),
            }
        } else {
            self.expected_tokens.push(ExpectedToken::Type);
            return self.unexpected();
        };
        Ok(TypeExpr { span: self.span_from(lo), kind })
    }

}

/// Returns `true` for names shaped like a sized elementary type, such as `uint7` or `bytes40`.
fn looks_elementary(name: &str) -> bool {
    ["uint", "int", "bytes"].iter().any(|prefix| {
        name.strip_prefix(prefix)
            .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
    })
}
