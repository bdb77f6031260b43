//! IR instructions.

use super::{Constant, DebugContext, TempId, Value};
use bugc_sema::Type;
use smallvec::{SmallVec, smallvec};
use std::fmt;

/// A non-terminator instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub kind: InstKind,
    pub debug: Option<DebugContext>,
}

impl Instruction {
    /// Creates a new instruction.
    pub fn new(kind: InstKind, debug: Option<DebugContext>) -> Self {
        Self { kind, debug }
    }
}

/// The kind of an instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum InstKind {
    /// Materializes a constant.
    Const { value: Constant, ty: Type, dest: TempId },
    /// `ty` is the result type: the operand type for arithmetic, `bool` for comparisons.
    Binary { op: BinOp, left: Value, right: Value, ty: Type, dest: TempId },
    Unary { op: UnaryOp, operand: Value, dest: TempId },
    /// Converts a word to another word type.
    Cast { value: Value, to: Type, dest: TempId },
    /// Reads one word.
    Read { location: Location, address: Value, ty: Type, dest: TempId },
    /// Writes one word.
    Write { location: Location, address: Value, value: Value },
    Env { op: EnvOp, dest: TempId },
    /// `keccak256` of a single word.
    Hash { value: Value, dest: TempId },
    /// Calldata size or the length word of a dynamic array.
    Length { object: Value, location: Location, dest: TempId },
    /// Storage slot arithmetic.
    ComputeSlot { kind: SlotKind, base: Value, dest: TempId },
    /// Memory offset arithmetic.
    ComputeOffset { kind: OffsetKind, base: Value, dest: TempId },
    /// Bump-allocates `size` bytes of memory and yields the start offset.
    Allocate { size: Value, dest: TempId },
}

/// A binary operator.
///
/// Signed variants of division, remainder and ordering are selected from the operand types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    /// Converts a source-level operator.
    pub fn from_ast(op: bugc_ast::BinOpKind) -> Self {
        use bugc_ast::BinOpKind as K;
        match op {
            K::Add => Self::Add,
            K::Sub => Self::Sub,
            K::Mul => Self::Mul,
            K::Div => Self::Div,
            K::Rem => Self::Mod,
            K::Eq => Self::Eq,
            K::Ne => Self::Ne,
            K::Lt => Self::Lt,
            K::Le => Self::Le,
            K::Gt => Self::Gt,
            K::Ge => Self::Ge,
            K::And => Self::And,
            K::Or => Self::Or,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Mod => "mod",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// Returns `true` if the result is a boolean.
    pub const fn is_comparison(self) -> bool {
        matches!(self, Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge)
    }

    /// Returns `true` if `op(a, b) == op(b, a)`.
    pub const fn is_commutative(self) -> bool {
        matches!(self, Self::Add | Self::Mul | Self::Eq | Self::Ne | Self::And | Self::Or)
    }
}

/// Returns `true` if a binary operation over these operands uses signed semantics.
pub fn is_signed_operation(left: &Value, right: &Value) -> bool {
    left.ty().is_signed() || right.ty().is_signed()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Logical negation.
    Not,
    /// Two's complement negation.
    Neg,
}

/// An addressable data location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    Storage,
    Memory,
    Calldata,
}

impl Location {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Storage => "storage",
            Self::Memory => "memory",
            Self::Calldata => "calldata",
        }
    }
}

/// Execution environment reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnvOp {
    Caller,
    CallValue,
    Timestamp,
    Number,
    CalldataSize,
}

impl EnvOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Caller => "caller",
            Self::CallValue => "callvalue",
            Self::Timestamp => "timestamp",
            Self::Number => "number",
            Self::CalldataSize => "calldatasize",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// `keccak256(key . base)`.
    Mapping { key: Value },
    /// `keccak256(base)`, the first data slot of a dynamic array.
    ArrayData,
    /// `base + offset`.
    Field { offset: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OffsetKind {
    /// `base + index * stride`.
    Element { index: Value, stride: u64 },
    /// `base + offset`.
    Field { offset: u64 },
}

impl InstKind {
    /// Returns the temporary defined by this instruction.
    pub fn dest(&self) -> Option<TempId> {
        match self {
            Self::Const { dest, .. }
            | Self::Binary { dest, .. }
            | Self::Unary { dest, .. }
            | Self::Cast { dest, .. }
            | Self::Read { dest, .. }
            | Self::Env { dest, .. }
            | Self::Hash { dest, .. }
            | Self::Length { dest, .. }
            | Self::ComputeSlot { dest, .. }
            | Self::ComputeOffset { dest, .. }
            | Self::Allocate { dest, .. } => Some(*dest),
            Self::Write { .. } => None,
        }
    }

    /// Returns a mutable reference to the destination temporary.
    pub fn dest_mut(&mut self) -> Option<&mut TempId> {
        match self {
            Self::Const { dest, .. }
            | Self::Binary { dest, .. }
            | Self::Unary { dest, .. }
            | Self::Cast { dest, .. }
            | Self::Read { dest, .. }
            | Self::Env { dest, .. }
            | Self::Hash { dest, .. }
            | Self::Length { dest, .. }
            | Self::ComputeSlot { dest, .. }
            | Self::ComputeOffset { dest, .. }
            | Self::Allocate { dest, .. } => Some(dest),
            Self::Write { .. } => None,
        }
    }

    /// Returns the operands in evaluation order.
    pub fn operands(&self) -> SmallVec<[&Value; 2]> {
        match self {
            Self::Const { .. } | Self::Env { .. } => SmallVec::new(),
            Self::Binary { left, right, .. } => smallvec![left, right],
            Self::Unary { operand: value, .. }
            | Self::Cast { value, .. }
            | Self::Read { address: value, .. }
            | Self::Hash { value, .. }
            | Self::Length { object: value, .. }
            | Self::Allocate { size: value, .. } => smallvec![value],
            Self::Write { address, value, .. } => smallvec![address, value],
            Self::ComputeSlot { kind, base, .. } => match kind {
                SlotKind::Mapping { key } => smallvec![key, base],
                SlotKind::ArrayData | SlotKind::Field { .. } => smallvec![base],
            },
            Self::ComputeOffset { kind, base, .. } => match kind {
                OffsetKind::Element { index, .. } => smallvec![index, base],
                OffsetKind::Field { .. } => smallvec![base],
            },
        }
    }

    /// Returns mutable references to the operands.
    pub fn operands_mut(&mut self) -> SmallVec<[&mut Value; 2]> {
        match self {
            Self::Const { .. } | Self::Env { .. } => SmallVec::new(),
            Self::Binary { left, right, .. } => smallvec![left, right],
            Self::Unary { operand: value, .. }
            | Self::Cast { value, .. }
            | Self::Read { address: value, .. }
            | Self::Hash { value, .. }
            | Self::Length { object: value, .. }
            | Self::Allocate { size: value, .. } => smallvec![value],
            Self::Write { address, value, .. } => smallvec![address, value],
            Self::ComputeSlot { kind, base, .. } => match kind {
                SlotKind::Mapping { key } => smallvec![key, base],
                SlotKind::ArrayData | SlotKind::Field { .. } => smallvec![base],
            },
            Self::ComputeOffset { kind, base, .. } => match kind {
                OffsetKind::Element { index, .. } => smallvec![index, base],
                OffsetKind::Field { .. } => smallvec![base],
            },
        }
    }

    /// Returns `true` if removing the instruction could change observable behavior.
    pub fn has_side_effects(&self) -> bool {
        match self {
            Self::Write { .. } | Self::Allocate { .. } => true,
            Self::Const { .. }
            | Self::Binary { .. }
            | Self::Unary { .. }
            | Self::Cast { .. }
            | Self::Read { .. }
            | Self::Env { .. }
            | Self::Hash { .. }
            | Self::Length { .. }
            | Self::ComputeSlot { .. }
            | Self::ComputeOffset { .. } => false,
        }
    }

    /// Returns the mnemonic for this instruction.
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Self::Const { .. } => "const",
            Self::Binary { op, .. } => op.mnemonic(),
            Self::Unary { op: UnaryOp::Not, .. } => "not",
            Self::Unary { op: UnaryOp::Neg, .. } => "neg",
            Self::Cast { .. } => "cast",
            Self::Read { .. } => "read",
            Self::Write { .. } => "write",
            Self::Env { op, .. } => op.as_str(),
            Self::Hash { .. } => "keccak256",
            Self::Length { .. } => "length",
            Self::ComputeSlot { .. } => "slot",
            Self::ComputeOffset { .. } => "offset",
            Self::Allocate { .. } => "allocate",
        }
    }
}

impl fmt::Display for InstKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dest) = self.dest() {
            write!(f, "{dest} = ")?;
        }
        let m = self.mnemonic();
        match self {
            Self::Const { value, ty, .. } => write!(f, "{m} {value} : {ty}"),
            Self::Binary { left, right, .. } => write!(f, "{m} {left}, {right}"),
            Self::Unary { operand, .. } => write!(f, "{m} {operand}"),
            Self::Cast { value, to, .. } => write!(f, "{m} {value} to {to}"),
            Self::Read { location, address, ty, .. } => {
                write!(f, "{m} {}[{address}] : {ty}", location.as_str())
            }
            Self::Write { location, address, value } => {
                write!(f, "{m} {}[{address}], {value}", location.as_str())
            }
            Self::Env { .. } => f.write_str(m),
            Self::Hash { value, .. } => write!(f, "{m} {value}"),
            Self::Length { object, location, .. } => {
                write!(f, "{m} {}[{object}]", location.as_str())
            }
            Self::ComputeSlot { kind, base, .. } => match kind {
                SlotKind::Mapping { key } => write!(f, "{m} mapping {base}[{key}]"),
                SlotKind::ArrayData => write!(f, "{m} array_data {base}"),
                SlotKind::Field { offset } => write!(f, "{m} field {base} + {offset}"),
            },
            Self::ComputeOffset { kind, base, .. } => match kind {
                OffsetKind::Element { index, stride } => {
                    write!(f, "{m} element {base} + {index} * {stride}")
                }
                OffsetKind::Field { offset } => write!(f, "{m} field {base} + {offset}"),
            },
            Self::Allocate { size, .. } => write!(f, "{m} {size}"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(n: usize) -> Value {
        Value::temp(TempId::new(n), Type::UINT256)
    }

    #[test]
    fn test_operands_and_dest() {
        let inst = InstKind::Binary {
            op: BinOp::Add,
            left: t(0),
            right: t(1),
            ty: Type::UINT256,
            dest: TempId::new(2),
        };
        assert_eq!(inst.dest(), Some(TempId::new(2)));
        assert_eq!(inst.operands().len(), 2);
        assert!(!inst.has_side_effects());

        let write = InstKind::Write { location: Location::Storage, address: t(0), value: t(1) };
        assert_eq!(write.dest(), None);
        assert!(write.has_side_effects());

        let slot = InstKind::ComputeSlot {
            kind: SlotKind::Mapping { key: t(4) },
            base: Value::uint(2),
            dest: TempId::new(5),
        };
        let operands = slot.operands();
        assert_eq!(operands[0].as_temp(), Some(TempId::new(4)));
        assert_eq!(operands[1].as_word(), Some(alloy_primitives::U256::from(2)));
    }

    #[test]
    fn test_display() {
        let inst = InstKind::Read {
            location: Location::Storage,
            address: Value::uint(0),
            ty: Type::UINT256,
            dest: TempId::new(1),
        };
        assert_eq!(inst.to_string(), "t1 = read storage[0] : uint256");
        let inst = InstKind::Env { op: EnvOp::Caller, dest: TempId::new(0) };
        assert_eq!(inst.to_string(), "t0 = caller");
        let inst = InstKind::Binary {
            op: BinOp::Le,
            left: t(0),
            right: Value::uint(3),
            ty: Type::Bool,
            dest: TempId::new(9),
        };
        assert_eq!(inst.to_string(), "t9 = le t0, 3");
    }

    #[test]
    fn test_signedness() {
        let signed = Value::temp(TempId::new(0), Type::Int(8));
        assert!(is_signed_operation(&signed, &Value::uint(1)));
        assert!(!is_signed_operation(&t(0), &t(1)));
    }
}
