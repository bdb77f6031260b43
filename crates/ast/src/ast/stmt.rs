use super::{Expr, Ident, NodeId, TypeExpr};
use bugc_interface::Span;

/// A braced block of statements.
#[derive(Clone, Debug)]
pub struct Block {
    pub span: Span,
    pub stmts: Vec<Stmt>,
}

/// A statement.
#[derive(Clone, Debug)]
pub struct Stmt {
    pub span: Span,
    pub kind: StmtKind,
}

/// A kind of statement.
#[derive(Clone, Debug)]
pub enum StmtKind {
    /// A variable declaration: `let x: uint256 = 42;`.
    Let(LetStmt),

    /// An assignment: `a.b[c] = d;`.
    Assign(Box<Expr>, Box<Expr>),

    /// An expression with a trailing semicolon.
    Expr(Box<Expr>),

    /// An `if` statement with an optional `else` branch, which is either a block or another `if`.
    If(Box<Expr>, Block, Option<Box<Stmt>>),

    /// A for statement: `for (let i = 0; i < 42; i = i + 1) { ... }`.
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Box<Expr>>,
        update: Option<Box<Stmt>>,
        body: Block,
    },

    /// A while statement: `while (i < 42) { ... }`.
    While(Box<Expr>, Block),

    /// A return statement: `return 42;`.
    Return(Option<Box<Expr>>),

    /// A break statement: `break;`.
    Break,

    /// A continue statement: `continue;`.
    Continue,

    /// A nested scope: `{ ... }`.
    Block(Block),
}

/// A `let` statement.
#[derive(Clone, Debug)]
pub struct LetStmt {
    pub id: NodeId,
    pub name: Ident,
    pub ty: Option<TypeExpr>,
    pub init: Box<Expr>,
}
