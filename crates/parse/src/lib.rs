//! BUG lexer and parser.
//!
//! The parser returns the first error it encounters, positioned at the offending token and
//! listing the tokens that would have been accepted there.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

use bugc_ast::Program;

pub mod lexer;
pub use lexer::{Cursor, Lexer};

mod parser;
pub use parser::Parser;

mod error;
pub use error::{PResult, ParseError};

/// Parses a complete BUG program.
#[instrument(level = "debug", skip_all)]
pub fn parse_program(src: &str) -> PResult<Program> {
    let tokens = Lexer::new(src).into_tokens()?;
    Parser::new(tokens).parse_program()
}
