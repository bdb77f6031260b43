use super::{Block, Ident, NodeId, TypeExpr};
use bugc_interface::{Span, Spanned};

/// A struct definition inside `define`: `struct User { id: uint256; };`.
#[derive(Clone, Debug)]
pub struct StructDef {
    pub id: NodeId,
    pub span: Span,
    pub name: Ident,
    pub fields: Vec<FieldDecl>,
}

/// A struct field: `id: uint256;`.
#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub span: Span,
    pub name: Ident,
    pub ty: TypeExpr,
}

/// A function definition inside `define`.
///
/// `function add(a: uint256, b: uint256) -> uint256 { ... };`
#[derive(Clone, Debug)]
pub struct FunctionDef {
    pub id: NodeId,
    pub span: Span,
    pub name: Ident,
    pub params: Vec<Param>,
    pub ret: Option<TypeExpr>,
    pub body: Block,
}

/// A function parameter.
#[derive(Clone, Debug)]
pub struct Param {
    pub id: NodeId,
    pub span: Span,
    pub name: Ident,
    pub ty: TypeExpr,
}

/// A storage variable declaration: `[0] count: uint256;`.
#[derive(Clone, Debug)]
pub struct StorageDecl {
    pub id: NodeId,
    pub span: Span,
    pub slot: Spanned<u64>,
    pub name: Ident,
    pub ty: TypeExpr,
}
