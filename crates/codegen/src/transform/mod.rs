//! IR optimizer.
//!
//! Rewrites are grouped by [`OptLevel`]; each level includes the rewrites of the levels below it.
//! Every function is rewritten until no rewrite applies or the iteration limit is hit.

use crate::ir::{Function, Module};
use bugc_config::OptLevel;
use std::fmt;

mod cfg;
mod constant_fold;
mod cse;
mod dce;
mod phi;

pub use constant_fold::cast_word;

/// Upper bound on rewrite rounds per function.
const MAX_ROUNDS: usize = 16;

/// Optimizes a module at the given level, returning the rewritten module.
#[instrument(name = "optimize", level = "debug", skip_all, fields(level = %level))]
pub fn optimize(module: &Module, level: OptLevel) -> Module {
    let mut module = module.clone();
    if level == OptLevel::O0 {
        return module;
    }

    let before = module.instruction_count();
    let mut stats = Stats::default();
    for func in module.iter_functions_mut() {
        optimize_function(func, level, &mut stats);
    }
    debug!(before, after = module.instruction_count(), %stats, "optimized module");
    module
}

/// Rewrites a single function to a fixpoint.
pub fn optimize_function(func: &mut Function, level: OptLevel, stats: &mut Stats) {
    let level = level.as_u8();
    for round in 0..MAX_ROUNDS {
        let mut round_stats = Stats::default();
        if level >= 1 {
            round_stats.folded += constant_fold::run(func);
            round_stats.dead += dce::run(func);
            round_stats.unreachable += cfg::prune_unreachable(func);
        }
        if level >= 2 {
            round_stats.branches += cfg::fold_branches(func);
            round_stats.unreachable += cfg::prune_unreachable(func);
            round_stats.phis += phi::eliminate_trivial(func);
            round_stats.merged += cfg::merge_blocks(func);
        }
        if level >= 3 {
            round_stats.cse += cse::run(func);
            round_stats.reads += cse::redundant_reads(func);
        }
        trace!(function = %func.name, round, stats = %round_stats, "rewrite round");
        let changed = round_stats.total() > 0;
        stats.add(&round_stats);
        if !changed {
            break;
        }
    }
}

/// Counts of applied rewrites.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Folded or propagated constants.
    pub folded: usize,
    /// Removed dead instructions and phis.
    pub dead: usize,
    /// Removed unreachable blocks.
    pub unreachable: usize,
    /// Branches on constants turned into jumps.
    pub branches: usize,
    /// Removed trivial phis.
    pub phis: usize,
    /// Merged blocks.
    pub merged: usize,
    /// Removed common subexpressions.
    pub cse: usize,
    /// Removed redundant storage reads.
    pub reads: usize,
}

impl Stats {
    fn total(&self) -> usize {
        self.folded
            + self.dead
            + self.unreachable
            + self.branches
            + self.phis
            + self.merged
            + self.cse
            + self.reads
    }

    fn add(&mut self, other: &Self) {
        self.folded += other.folded;
        self.dead += other.dead;
        self.unreachable += other.unreachable;
        self.branches += other.branches;
        self.phis += other.phis;
        self.merged += other.merged;
        self.cse += other.cse;
        self.reads += other.reads;
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "folded={} dead={} unreachable={} branches={} phis={} merged={} cse={} reads={}",
            self.folded,
            self.dead,
            self.unreachable,
            self.branches,
            self.phis,
            self.merged,
            self.cse,
            self.reads
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{InstKind, Terminator};

    fn lower(src: &str) -> Module {
        let program = bugc_parse::parse_program(src).unwrap();
        let typed = bugc_sema::check(&program).unwrap();
        crate::lower::generate(&program, &typed).unwrap()
    }

    const LOOP: &str = "name L;
        storage { [0] out: uint256; [1] flag: bool; }
        code {
            let sum = 0;
            for (let i = 0; i < 4; i = i + 1) {
                if (true) { sum = sum + i * 2; } else { sum = 0; }
            }
            out = sum + (3 * 4);
            flag = out == out;
        }";

    #[test]
    fn test_level_zero_is_identity() {
        let module = lower(LOOP);
        assert_eq!(optimize(&module, OptLevel::O0), module);
    }

    #[test]
    fn test_levels_are_monotonic() {
        let module = lower(LOOP);
        let mut previous = module.instruction_count();
        for level in [OptLevel::O1, OptLevel::O2, OptLevel::O3] {
            let optimized = optimize(&module, level);
            optimized.verify().unwrap();
            let count = optimized.instruction_count();
            assert!(count <= previous, "{level}: {count} > {previous}");
            previous = count;
        }
        assert!(previous < module.instruction_count());
    }

    #[test]
    fn test_level_one_folds_constants() {
        let module = optimize(&lower(LOOP), OptLevel::O1);
        let consts = module
            .main
            .blocks
            .values()
            .flat_map(|b| &b.instructions)
            .filter(|i| matches!(i.kind, InstKind::Const { .. }))
            .count();
        assert_eq!(consts, 0);
    }

    #[test]
    fn test_level_two_folds_constant_branches() {
        let module = optimize(&lower(LOOP), OptLevel::O2);
        let branches = module
            .main
            .blocks
            .values()
            .filter(|b| matches!(b.terminator, Terminator::Branch { .. }))
            .count();
        // Only the loop condition remains.
        assert_eq!(branches, 1);
    }

    #[test]
    fn test_level_three_reuses_storage_reads() {
        let src = "name R;
            storage { [0] a: uint256; [1] b: uint256; }
            code { b = a + a; a = 1; b = a; }";
        let count_reads = |module: &Module| {
            module
                .main
                .blocks
                .values()
                .flat_map(|b| &b.instructions)
                .filter(|i| matches!(i.kind, InstKind::Read { .. }))
                .count()
        };
        let module = lower(src);
        assert_eq!(count_reads(&optimize(&module, OptLevel::O2)), 3);
        // The write to `a` invalidates the first read.
        assert_eq!(count_reads(&optimize(&module, OptLevel::O3)), 2);
    }
}
