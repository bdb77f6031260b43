//! Dead code elimination.

use crate::ir::{Function, TempId};
use bugc_data_structures::map::FxHashSet;

/// Removes pure instructions and phis whose results are never used.
///
/// Returns the number of removed definitions.
pub(super) fn run(func: &mut Function) -> usize {
    let mut removed = 0;
    loop {
        let used = used_temps(func);
        let mut round = 0;
        for block in func.blocks.values_mut() {
            let before = block.phis.len() + block.instructions.len();
            block.phis.retain(|phi| used.contains(&phi.dest));
            block.instructions.retain(|inst| {
                inst.kind.has_side_effects()
                    || inst.kind.dest().is_none_or(|dest| used.contains(&dest))
            });
            round += before - block.phis.len() - block.instructions.len();
        }
        if round == 0 {
            break;
        }
        removed += round;
    }
    if removed > 0 {
        trace!(function = %func.name, removed, "removed dead code");
    }
    removed
}

/// Returns every temporary read somewhere in the function, ignoring phis that only feed
/// themselves.
fn used_temps(func: &Function) -> FxHashSet<TempId> {
    let mut used = FxHashSet::default();
    for block in func.blocks.values() {
        for phi in &block.phis {
            used.extend(
                phi.sources.values().filter_map(|v| v.as_temp()).filter(|&id| id != phi.dest),
            );
        }
        for inst in &block.instructions {
            used.extend(inst.kind.operands().into_iter().filter_map(|v| v.as_temp()));
        }
        used.extend(block.terminator.operands().into_iter().filter_map(|v| v.as_temp()));
    }
    used
}
