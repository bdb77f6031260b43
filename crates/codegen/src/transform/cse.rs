//! Block-local common subexpression elimination.

use crate::ir::{Function, InstKind, Location, TempId, Value, ValueKey};
use bugc_data_structures::map::{FxHashMap, FxHashSet};
use bugc_sema::Type;

/// Reuses the result of an identical pure instruction computed earlier in the same block.
///
/// Returns the number of removed instructions.
pub(super) fn run(func: &mut Function) -> usize {
    let mut replacements = FxHashMap::default();
    for block in func.blocks.values() {
        let mut seen: FxHashMap<InstKind, TempId> = FxHashMap::default();
        for inst in &block.instructions {
            let Some(dest) = inst.kind.dest() else { continue };
            let Some(key) = expression_key(&inst.kind) else { continue };
            match seen.get(&key) {
                Some(&prev) => {
                    replacements.insert(dest, Value::temp(prev, Type::UINT256));
                }
                None => {
                    seen.insert(key, dest);
                }
            }
        }
    }
    remove_replaced(func, replacements)
}

/// Reuses storage reads of the same slot within a block until storage is written.
///
/// Returns the number of removed reads.
pub(super) fn redundant_reads(func: &mut Function) -> usize {
    let mut replacements = FxHashMap::default();
    for block in func.blocks.values() {
        let mut loaded: FxHashMap<(bool, ValueKey), TempId> = FxHashMap::default();
        for inst in &block.instructions {
            let (key, dest) = match &inst.kind {
                InstKind::Read { location: Location::Storage, address, dest, .. } => {
                    ((false, address.key()), *dest)
                }
                InstKind::Length { location: Location::Storage, object, dest } => {
                    ((true, object.key()), *dest)
                }
                InstKind::Write { location: Location::Storage, .. } => {
                    loaded.clear();
                    continue;
                }
                InstKind::Const { .. }
                | InstKind::Binary { .. }
                | InstKind::Unary { .. }
                | InstKind::Cast { .. }
                | InstKind::Read { .. }
                | InstKind::Write { .. }
                | InstKind::Env { .. }
                | InstKind::Hash { .. }
                | InstKind::Length { .. }
                | InstKind::ComputeSlot { .. }
                | InstKind::ComputeOffset { .. }
                | InstKind::Allocate { .. } => continue,
            };
            match loaded.get(&key) {
                Some(&prev) => {
                    replacements.insert(dest, Value::temp(prev, Type::UINT256));
                }
                None => {
                    loaded.insert(key, dest);
                }
            }
        }
    }
    remove_replaced(func, replacements)
}

/// Returns the instruction with its destination and debug information erased, if it computes a
/// value from its operands alone.
fn expression_key(kind: &InstKind) -> Option<InstKind> {
    let pure = match kind {
        InstKind::Const { .. }
        | InstKind::Binary { .. }
        | InstKind::Unary { .. }
        | InstKind::Cast { .. }
        | InstKind::Env { .. }
        | InstKind::Hash { .. }
        | InstKind::ComputeSlot { .. }
        | InstKind::ComputeOffset { .. } => true,
        InstKind::Read { location, .. } | InstKind::Length { location, .. } => {
            *location == Location::Calldata
        }
        InstKind::Write { .. } | InstKind::Allocate { .. } => false,
    };
    if !pure {
        return None;
    }
    let mut key = kind.clone();
    if let Some(dest) = key.dest_mut() {
        *dest = TempId::new(0);
    }
    for operand in key.operands_mut() {
        if let Value::Const { debug, .. } | Value::Temp { debug, .. } = operand {
            *debug = None;
        }
    }
    Some(key)
}

fn remove_replaced(func: &mut Function, replacements: FxHashMap<TempId, Value>) -> usize {
    if replacements.is_empty() {
        return 0;
    }
    let removed: FxHashSet<TempId> = replacements.keys().copied().collect();
    for block in func.blocks.values_mut() {
        block.instructions.retain(|inst| !inst.kind.dest().is_some_and(|d| removed.contains(&d)));
    }
    func.replace_uses(&replacements);
    removed.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinOp, Block, BlockId, Instruction, Terminator};
    use bugc_data_structures::map::FxIndexMap;

    fn func(instructions: Vec<InstKind>, ret: TempId) -> Function {
        let value = Some(Value::temp(ret, Type::UINT256));
        let mut block = Block::new(BlockId::new(0), Terminator::Return { value });
        block.instructions = instructions.into_iter().map(|k| Instruction::new(k, None)).collect();
        let mut blocks = FxIndexMap::default();
        blocks.insert(block.id, block);
        Function {
            name: "main".into(),
            params: vec![],
            entry: BlockId::new(0),
            blocks,
            ret: None,
            ssa_variables: FxHashMap::default(),
        }
    }

    fn read(slot: u64, dest: usize) -> InstKind {
        InstKind::Read {
            location: Location::Storage,
            address: Value::uint(slot),
            ty: Type::UINT256,
            dest: TempId::new(dest),
        }
    }

    fn add(a: usize, b: usize, dest: usize) -> InstKind {
        InstKind::Binary {
            op: BinOp::Add,
            left: Value::temp(TempId::new(a), Type::UINT256),
            right: Value::temp(TempId::new(b), Type::UINT256),
            ty: Type::UINT256,
            dest: TempId::new(dest),
        }
    }

    #[test]
    fn test_common_subexpressions() {
        let mut f =
            func(vec![read(0, 0), add(0, 0, 1), add(0, 0, 2), add(1, 2, 3)], TempId::new(3));
        assert_eq!(run(&mut f), 1);
        let block = f.block(BlockId::new(0));
        assert_eq!(block.instructions.len(), 3);
        assert_eq!(block.instructions[2].kind, add(1, 1, 3));
    }

    #[test]
    fn test_reads_invalidated_by_writes() {
        let write = InstKind::Write {
            location: Location::Storage,
            address: Value::uint(0),
            value: Value::uint(1),
        };
        let instructions = vec![read(0, 0), read(0, 1), write, read(0, 2), add(1, 2, 3)];
        let mut f = func(instructions, TempId::new(3));
        assert_eq!(redundant_reads(&mut f), 1);
        let reads = f
            .block(BlockId::new(0))
            .instructions
            .iter()
            .filter(|i| matches!(i.kind, InstKind::Read { .. }))
            .count();
        assert_eq!(reads, 2);
    }
}
