use super::{Ident, NodeId, TypeExpr};
use alloy_primitives::{Address, U256};
use bugc_interface::Span;
use std::fmt;

/// An expression.
#[derive(Clone, Debug)]
pub struct Expr {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExprKind,
}

impl Expr {
    /// Returns the identifier if this is a plain identifier expression.
    pub fn as_ident(&self) -> Option<&Ident> {
        match &self.kind {
            ExprKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }
}

/// A kind of expression.
#[derive(Clone, Debug)]
pub enum ExprKind {
    /// An array literal: `[a, b, c]`.
    Array(Vec<Expr>),

    /// A binary operation: `a + b`.
    Binary(Box<Expr>, BinOp, Box<Expr>),

    /// A function call: `add(1, 2)`.
    Call(Box<Expr>, Vec<Expr>),

    /// A cast: `x as uint8`.
    Cast(Box<Expr>, TypeExpr),

    /// An identifier: `foo`.
    Ident(Ident),

    /// An indexing expression: `values[i]`.
    Index(Box<Expr>, Box<Expr>),

    /// The `keccak256(x)` builtin.
    Keccak256(Box<Expr>),

    /// A literal.
    Lit(Lit),

    /// Access of a named member: `user.balance`, `values.length`.
    Member(Box<Expr>, Ident),

    /// An execution environment value: `msg.sender`, `block.number`.
    Special(Special),

    /// A unary operation: `!x`, `-x`.
    Unary(UnOp, Box<Expr>),
}

/// A literal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lit {
    /// `true` or `false`.
    Bool(bool),
    /// An integer literal.
    Number(U256),
    /// A 40 digit hex literal: `0x0000000000000000000000000000000000000001`.
    Address(Address),
    /// A string literal.
    Str(String),
}

/// Execution environment values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Special {
    /// `msg.sender`
    MsgSender,
    /// `msg.value`
    MsgValue,
    /// `msg.data`
    MsgData,
    /// `block.timestamp`
    BlockTimestamp,
    /// `block.number`
    BlockNumber,
}

impl Special {
    /// Resolves `base.member`, where `base` is `msg` or `block`.
    pub fn from_parts(base: &str, member: &str) -> Option<Self> {
        Some(match (base, member) {
            ("msg", "sender") => Self::MsgSender,
            ("msg", "value") => Self::MsgValue,
            ("msg", "data") => Self::MsgData,
            ("block", "timestamp") => Self::BlockTimestamp,
            ("block", "number") => Self::BlockNumber,
            _ => return None,
        })
    }

    /// Returns the source spelling.
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::MsgSender => "msg.sender",
            Self::MsgValue => "msg.value",
            Self::MsgData => "msg.data",
            Self::BlockTimestamp => "block.timestamp",
            Self::BlockNumber => "block.number",
        }
    }
}

/// A binary operation: `a + b`.
#[derive(Clone, Copy, Debug)]
pub struct BinOp {
    pub span: Span,
    pub kind: BinOpKind,
}

/// A kind of binary operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOpKind {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `||`
    Or,
    /// `&&`
    And,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

impl fmt::Display for BinOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl BinOpKind {
    /// Returns the string representation of the operator.
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Or => "||",
            Self::And => "&&",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }

    /// Returns `true` if the operator is a comparison producing a boolean.
    pub const fn is_comparison(self) -> bool {
        matches!(self, Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::Eq | Self::Ne)
    }

    /// Returns `true` if the operator is a logical connective over booleans.
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Returns `true` if the operator is arithmetic.
    pub const fn is_arithmetic(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Rem)
    }
}

/// A unary operation: `!x`, `-x`.
#[derive(Clone, Copy, Debug)]
pub struct UnOp {
    pub span: Span,
    pub kind: UnOpKind,
}

/// A kind of unary operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnOpKind {
    /// `!`
    Not,
    /// `-`
    Neg,
}

impl UnOpKind {
    /// Returns the string representation of the operator.
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Neg => "-",
        }
    }
}
