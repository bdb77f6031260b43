//! Constant propagation and folding with EVM word semantics.

use crate::ir::{BinOp, Function, InstKind, TempId, UnaryOp, Value, is_signed_operation};
use alloy_primitives::U256;
use bugc_data_structures::map::FxHashMap;
use bugc_sema::Type;

/// Propagates `const` instructions into their uses and folds operations over constants.
///
/// Returns the number of rewritten temporaries.
pub(super) fn run(func: &mut Function) -> usize {
    let mut replacements = FxHashMap::default();
    for block in func.blocks.values() {
        for inst in &block.instructions {
            if let Some((dest, value)) = fold(&inst.kind) {
                replacements.insert(dest, value);
            }
        }
    }
    let count = replacements.len();
    if count > 0 {
        for block in func.blocks.values_mut() {
            block.instructions.retain(|inst| {
                !inst.kind.dest().is_some_and(|dest| replacements.contains_key(&dest))
            });
        }
        func.replace_uses(&replacements);
    }
    count
}

/// Returns the constant an instruction evaluates to, if it can be computed statically.
fn fold(kind: &InstKind) -> Option<(TempId, Value)> {
    match kind {
        InstKind::Const { value, ty, dest } => {
            Some((*dest, Value::Const { value: value.clone(), ty: ty.clone(), debug: None }))
        }
        InstKind::Binary { op, left, right, ty, dest } => {
            let (a, b) = (left.as_word()?, right.as_word()?);
            let signed = is_signed_operation(left, right);
            Some((*dest, fold_binary(*op, a, b, signed, ty)))
        }
        InstKind::Unary { op, operand, dest } => {
            let x = operand.as_word()?;
            let value = match op {
                UnaryOp::Not => Value::bool(x.is_zero()),
                UnaryOp::Neg => Value::int(U256::ZERO.wrapping_sub(x), operand.ty().clone()),
            };
            Some((*dest, value))
        }
        InstKind::Cast { value, to, dest } => {
            let x = value.as_word()?;
            let value = match to {
                Type::Bool => Value::bool(!x.is_zero()),
                _ => Value::int(cast_word(x, to), to.clone()),
            };
            Some((*dest, value))
        }
        InstKind::Read { .. }
        | InstKind::Write { .. }
        | InstKind::Env { .. }
        | InstKind::Hash { .. }
        | InstKind::Length { .. }
        | InstKind::ComputeSlot { .. }
        | InstKind::ComputeOffset { .. }
        | InstKind::Allocate { .. } => None,
    }
}

fn fold_binary(op: BinOp, a: U256, b: U256, signed: bool, ty: &Type) -> Value {
    let int = |value: U256| Value::int(value, ty.clone());
    let flag = |b: bool| Value::bool(b).with_type(ty.clone());
    match op {
        BinOp::Add => int(a.wrapping_add(b)),
        BinOp::Sub => int(a.wrapping_sub(b)),
        BinOp::Mul => int(a.wrapping_mul(b)),
        BinOp::Div if signed => int(sdiv(a, b)),
        BinOp::Div => int(if b.is_zero() { U256::ZERO } else { a / b }),
        BinOp::Mod if signed => int(smod(a, b)),
        BinOp::Mod => int(if b.is_zero() { U256::ZERO } else { a % b }),
        BinOp::Eq => flag(a == b),
        BinOp::Ne => flag(a != b),
        BinOp::Lt => flag(less_than(a, b, signed)),
        BinOp::Gt => flag(less_than(b, a, signed)),
        BinOp::Le => flag(!less_than(b, a, signed)),
        BinOp::Ge => flag(!less_than(a, b, signed)),
        BinOp::And => flag(!a.is_zero() && !b.is_zero()),
        BinOp::Or => flag(!a.is_zero() || !b.is_zero()),
    }
}

const SIGN_BIT: usize = 255;

fn is_negative(x: U256) -> bool {
    x.bit(SIGN_BIT)
}

fn abs(x: U256) -> U256 {
    if is_negative(x) { x.wrapping_neg() } else { x }
}

/// `SDIV`: truncates toward zero; division by zero yields zero.
fn sdiv(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::ZERO;
    }
    let q = abs(a) / abs(b);
    if is_negative(a) != is_negative(b) { q.wrapping_neg() } else { q }
}

/// `SMOD`: the result takes the sign of the dividend.
fn smod(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::ZERO;
    }
    let r = abs(a) % abs(b);
    if is_negative(a) { r.wrapping_neg() } else { r }
}

fn less_than(a: U256, b: U256, signed: bool) -> bool {
    if signed {
        let flip = U256::from(1) << SIGN_BIT;
        (a ^ flip) < (b ^ flip)
    } else {
        a < b
    }
}

/// Converts a word to the representation of `to`.
///
/// Unsigned integers and addresses are truncated, signed integers are sign-extended from their
/// width; other word types are left unchanged.
pub fn cast_word(x: U256, to: &Type) -> U256 {
    match *to {
        Type::Uint(bits) if bits < 256 => x & low_mask(bits as usize),
        Type::Address => x & low_mask(160),
        Type::Int(bits) if bits < 256 => {
            let mask = low_mask(bits as usize);
            if x.bit(bits as usize - 1) { x | !mask } else { x & mask }
        }
        Type::Bool => U256::from(u8::from(!x.is_zero())),
        _ => x,
    }
}

fn low_mask(bits: usize) -> U256 {
    (U256::from(1) << bits) - U256::from(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(x: i64) -> U256 {
        if x < 0 { U256::from(x.unsigned_abs()).wrapping_neg() } else { U256::from(x) }
    }

    fn fold_word(kind: InstKind) -> U256 {
        fold(&kind).unwrap().1.as_word().unwrap()
    }

    fn binary(op: BinOp, a: i64, b: i64, ty: Type) -> InstKind {
        let result = if op.is_comparison() { Type::Bool } else { ty.clone() };
        InstKind::Binary {
            op,
            left: Value::int(int(a), ty.clone()),
            right: Value::int(int(b), ty),
            ty: result,
            dest: TempId::new(0),
        }
    }

    #[test]
    fn test_unsigned_arithmetic() {
        let u = Type::UINT256;
        assert_eq!(fold_word(binary(BinOp::Add, 2, 3, u.clone())), int(5));
        assert_eq!(fold_word(binary(BinOp::Sub, 2, 3, u.clone())), U256::MAX);
        assert_eq!(fold_word(binary(BinOp::Div, 7, 0, u.clone())), U256::ZERO);
        assert_eq!(fold_word(binary(BinOp::Mod, 7, 4, u.clone())), int(3));
        assert_eq!(fold_word(binary(BinOp::Lt, 2, 3, u.clone())), int(1));
        assert_eq!(fold_word(binary(BinOp::Ge, 2, 3, u)), int(0));
    }

    #[test]
    fn test_signed_arithmetic() {
        let i = Type::INT256;
        assert_eq!(fold_word(binary(BinOp::Div, -7, 2, i.clone())), int(-3));
        assert_eq!(fold_word(binary(BinOp::Mod, -7, 2, i.clone())), int(-1));
        assert_eq!(fold_word(binary(BinOp::Mod, 7, -2, i.clone())), int(1));
        assert_eq!(fold_word(binary(BinOp::Lt, -1, 0, i.clone())), int(1));
        assert_eq!(fold_word(binary(BinOp::Gt, -1, 0, i)), int(0));
        // Unsigned, -1 is the largest word.
        assert_eq!(fold_word(binary(BinOp::Gt, -1, 0, Type::UINT256)), int(1));
    }

    #[test]
    fn test_result_takes_declared_type() {
        let add = InstKind::Binary {
            op: BinOp::Add,
            left: Value::int(int(200), Type::Uint(8)),
            right: Value::uint(100),
            ty: Type::UINT256,
            dest: TempId::new(0),
        };
        let (_, folded) = fold(&add).unwrap();
        assert_eq!(folded, Value::int(int(300), Type::UINT256));

        let lt = binary(BinOp::Lt, 1, 2, Type::Uint(8));
        assert_eq!(*fold(&lt).unwrap().1.ty(), Type::Bool);
    }

    #[test]
    fn test_casts() {
        assert_eq!(cast_word(int(0x1ff), &Type::Uint(8)), int(0xff));
        assert_eq!(cast_word(int(0xff), &Type::Int(8)), int(-1));
        assert_eq!(cast_word(int(0x7f), &Type::Int(8)), int(0x7f));
        assert_eq!(cast_word(U256::MAX, &Type::Address), low_mask(160));
        assert_eq!(cast_word(int(5), &Type::Bool), int(1));
        assert_eq!(cast_word(int(5), &Type::UINT256), int(5));
    }

    #[test]
    fn test_unary_and_non_constant() {
        let neg = InstKind::Unary {
            op: UnaryOp::Neg,
            operand: Value::int(int(1), Type::INT256),
            dest: TempId::new(1),
        };
        assert_eq!(fold_word(neg), U256::MAX);
        let not =
            InstKind::Unary { op: UnaryOp::Not, operand: Value::bool(false), dest: TempId::new(2) };
        assert_eq!(fold_word(not), int(1));
        let open = InstKind::Binary {
            op: BinOp::Add,
            left: Value::temp(TempId::new(3), Type::UINT256),
            right: Value::uint(1),
            ty: Type::UINT256,
            dest: TempId::new(4),
        };
        assert!(fold(&open).is_none());
    }
}
