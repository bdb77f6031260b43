//! Control-flow graph simplification.

use crate::ir::{Function, Terminator};

/// Removes blocks not reachable from the entry and drops phi sources from removed edges.
///
/// Returns the number of removed blocks.
pub(super) fn prune_unreachable(func: &mut Function) -> usize {
    let reachable = func.reachable();
    let before = func.blocks.len();
    func.blocks.retain(|id, _| reachable.contains(id));
    let removed = before - func.blocks.len();
    if removed > 0 {
        trace!(function = %func.name, removed, "pruned unreachable blocks");
    }
    remove_stale_phi_sources(func);
    removed
}

/// Keeps only the phi sources whose block is still a predecessor.
fn remove_stale_phi_sources(func: &mut Function) {
    let preds = func.predecessors();
    for block in func.blocks.values_mut() {
        let Some(preds) = preds.get(&block.id) else { continue };
        for phi in &mut block.phis {
            phi.sources.retain(|pred, _| preds.contains(pred));
        }
    }
}

/// Replaces branches on constant conditions with jumps.
///
/// Returns the number of folded branches.
pub(super) fn fold_branches(func: &mut Function) -> usize {
    let mut folded = 0;
    for block in func.blocks.values_mut() {
        let Terminator::Branch { condition, then_block, else_block } = &block.terminator else {
            continue;
        };
        let Some(word) = condition.as_word() else { continue };
        let target = if word.is_zero() { *else_block } else { *then_block };
        block.terminator = Terminator::Jump { target };
        folded += 1;
    }
    if folded > 0 {
        remove_stale_phi_sources(func);
    }
    folded
}

/// Merges a block into its predecessor when the predecessor jumps to it and nothing else does.
///
/// Returns the number of merged blocks.
pub(super) fn merge_blocks(func: &mut Function) -> usize {
    let mut merged = 0;
    loop {
        let preds = func.predecessors();
        let candidate = func.blocks.values().find_map(|block| {
            let Terminator::Jump { target } = block.terminator else { return None };
            let succ = func.blocks.get(&target)?;
            let single = preds.get(&target).is_some_and(|p| p.len() == 1);
            (target != block.id && target != func.entry && single && succ.phis.is_empty())
                .then_some((block.id, target))
        });
        let Some((pred, succ)) = candidate else { break };

        let Some(absorbed) = func.blocks.shift_remove(&succ) else { break };
        let block = func.block_mut(pred);
        block.instructions.extend(absorbed.instructions);
        block.terminator = absorbed.terminator;
        for next in block.terminator.successors() {
            for phi in &mut func.block_mut(next).phis {
                if let Some(value) = phi.sources.shift_remove(&succ) {
                    phi.sources.insert(pred, value);
                }
            }
        }
        merged += 1;
    }
    if merged > 0 {
        trace!(function = %func.name, merged, "merged blocks");
    }
    merged
}
