//! AST types.

use bugc_interface::Span;
use std::fmt;

mod expr;
pub use expr::*;

mod item;
pub use item::*;

mod stmt;
pub use stmt::*;

mod ty;
pub use ty::*;

bugc_data_structures::newtype_index! {
    /// A unique identifier for expressions and declarations, assigned by the parser.
    ///
    /// The type checker keys its results by these IDs.
    pub struct NodeId("n");
}

/// An identifier.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    /// Creates a new identifier.
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self { name: name.into(), span }
    }

    /// Returns the identifier as a string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}..{}", self.name, self.span.lo(), self.span.hi())
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A parsed BUG program.
///
/// ```text
/// name Foo;
/// define { ... }   // optional
/// storage { ... }  // optional
/// create { ... }   // optional
/// code { ... }
/// ```
#[derive(Clone, Debug)]
pub struct Program {
    pub span: Span,
    pub name: Ident,
    pub structs: Vec<StructDef>,
    pub functions: Vec<FunctionDef>,
    pub storage: Vec<StorageDecl>,
    pub create: Option<Block>,
    pub code: Block,
}

impl Program {
    /// Looks up a struct definition by name.
    pub fn find_struct(&self, name: &str) -> Option<&StructDef> {
        self.structs.iter().find(|s| s.name.as_str() == name)
    }

    /// Looks up a function definition by name.
    pub fn find_function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name.as_str() == name)
    }
}
