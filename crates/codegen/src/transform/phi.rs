//! Trivial phi elimination.

use crate::ir::{Function, Value};
use bugc_data_structures::map::FxHashMap;

/// Removes phis whose sources, ignoring references to the phi itself, are all the same value,
/// and replaces their uses with that value.
///
/// Returns the number of removed phis.
pub(super) fn eliminate_trivial(func: &mut Function) -> usize {
    let mut replacements = FxHashMap::default();
    for block in func.blocks.values_mut() {
        block.phis.retain(|phi| {
            let mut unique: Option<&Value> = None;
            for value in phi.sources.values() {
                if value.as_temp() == Some(phi.dest) {
                    continue;
                }
                match unique {
                    Some(seen) if seen.same(value) => {}
                    Some(_) => return true,
                    None => unique = Some(value),
                }
            }
            let Some(value) = unique else { return true };
            replacements.insert(phi.dest, value.clone());
            false
        });
    }
    let removed = replacements.len();
    func.replace_uses(&replacements);
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Block, BlockId, Param, Phi, TempId, Terminator};
    use bugc_data_structures::map::FxIndexMap;
    use bugc_sema::Type;

    #[test]
    fn test_self_referencing_phi() {
        let t = |n| Value::temp(TempId::new(n), Type::UINT256);
        let mut header = Block::new(BlockId::new(1), Terminator::Return { value: Some(t(1)) });
        let mut sources = FxIndexMap::default();
        sources.insert(BlockId::new(0), t(0));
        sources.insert(BlockId::new(1), t(1));
        header.phis.push(Phi { dest: TempId::new(1), ty: Type::UINT256, sources, debug: None });

        let mut blocks = FxIndexMap::default();
        blocks.insert(BlockId::new(1), header);
        let mut func = Function {
            name: "f".into(),
            params: vec![Param { id: TempId::new(0), name: "a".into(), ty: Type::UINT256 }],
            entry: BlockId::new(1),
            blocks,
            ret: Some(Type::UINT256),
            ssa_variables: Default::default(),
        };
        assert_eq!(eliminate_trivial(&mut func), 1);
        let block = func.block(BlockId::new(1));
        assert!(block.phis.is_empty());
        assert_eq!(block.terminator, Terminator::Return { value: Some(t(0)) });
    }
}
