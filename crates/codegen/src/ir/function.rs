//! IR functions.

use super::{Block, BlockId, TempId, Terminator, Value};
use bugc_data_structures::map::{FxHashMap, FxHashSet, FxIndexMap, FxIndexSet};
use bugc_interface::Span;
use bugc_sema::Type;
use smallvec::SmallVec;

/// A function parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub id: TempId,
    pub name: String,
    pub ty: Type,
}

/// Source-level identity of an SSA temporary bound to a variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SsaVariable {
    pub name: String,
    /// Lexical scope the variable was declared in.
    pub scope: u32,
    /// Number of assignments to the variable before this one.
    pub version: u32,
    pub span: Span,
}

/// A function in SSA form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub entry: BlockId,
    /// Blocks in layout order.
    pub blocks: FxIndexMap<BlockId, Block>,
    pub ret: Option<Type>,
    pub ssa_variables: FxHashMap<TempId, SsaVariable>,
}

impl Function {
    /// Returns the block with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the block does not exist.
    #[track_caller]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[&id]
    }

    /// Returns a mutable reference to the block with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the block does not exist.
    #[track_caller]
    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[&id]
    }

    /// Returns the number of instructions, counting phis and terminators.
    pub fn instruction_count(&self) -> usize {
        self.blocks.values().map(|b| b.phis.len() + b.instructions.len() + 1).sum()
    }

    /// Returns the predecessors of every block, in layout order.
    pub fn predecessors(&self) -> FxHashMap<BlockId, SmallVec<[BlockId; 4]>> {
        let mut preds: FxHashMap<BlockId, SmallVec<[BlockId; 4]>> =
            self.blocks.keys().map(|&id| (id, SmallVec::new())).collect();
        for block in self.blocks.values() {
            for succ in block.terminator.successors() {
                let entry = preds.entry(succ).or_default();
                if !entry.contains(&block.id) {
                    entry.push(block.id);
                }
            }
        }
        preds
    }

    /// Returns the blocks reachable from the entry, in depth-first preorder.
    pub fn reachable(&self) -> FxIndexSet<BlockId> {
        let mut seen = FxIndexSet::default();
        let mut stack = vec![self.entry];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(block) = self.blocks.get(&id) else { continue };
            stack.extend(block.terminator.successors().into_iter().rev());
        }
        seen
    }

    /// Returns the blocks that are only entered through a call return.
    pub fn continuations(&self) -> FxHashMap<BlockId, Option<TempId>> {
        self.blocks
            .values()
            .filter_map(|block| match &block.terminator {
                Terminator::Call { dest, continuation, .. } => Some((*continuation, *dest)),
                _ => None,
            })
            .collect()
    }

    /// Replaces every use of the given temporaries, following chains of replacements.
    ///
    /// Uses keep their own type.
    pub fn replace_uses(&mut self, replacements: &FxHashMap<TempId, Value>) {
        if replacements.is_empty() {
            return;
        }
        let resolve = |value: &mut Value| {
            let mut steps = 0;
            while let Some(id) = value.as_temp()
                && let Some(next) = replacements.get(&id)
                && steps <= replacements.len()
            {
                let mut next = next.clone().with_type(value.ty().clone());
                if next.debug().is_none()
                    && let Some(debug) = value.debug()
                {
                    next = next.with_debug(debug.clone());
                }
                *value = next;
                steps += 1;
            }
        };
        for block in self.blocks.values_mut() {
            for phi in &mut block.phis {
                phi.sources.values_mut().for_each(resolve);
            }
            for inst in &mut block.instructions {
                inst.kind.operands_mut().into_iter().for_each(resolve);
            }
            block.terminator.operands_mut().into_iter().for_each(resolve);
        }
    }

    /// Checks structural invariants: every temporary is defined exactly once, and every
    /// referenced block exists.
    pub fn verify(&self) -> Result<(), String> {
        let mut defined = FxHashSet::default();
        let mut define = |id: TempId| {
            if defined.insert(id) { Ok(()) } else { Err(format!("{id} is defined more than once")) }
        };
        for param in &self.params {
            define(param.id)?;
        }
        for block in self.blocks.values() {
            for id in block.defs() {
                define(id)?;
            }
            if let Terminator::Call { dest: Some(dest), .. } = &block.terminator {
                define(*dest)?;
            }
        }

        if !self.blocks.contains_key(&self.entry) {
            return Err(format!("entry block {} is missing", self.entry));
        }
        for (id, block) in &self.blocks {
            if *id != block.id {
                return Err(format!("block {} is stored under {id}", block.id));
            }
            for succ in block.terminator.successors() {
                if !self.blocks.contains_key(&succ) {
                    return Err(format!("{id} jumps to missing block {succ}"));
                }
            }
            for phi in &block.phis {
                for pred in phi.sources.keys() {
                    if !self.blocks.contains_key(pred) {
                        return Err(format!("phi {} names missing block {pred}", phi.dest));
                    }
                }
            }
            for value in block.uses() {
                if let Some(temp) = value.as_temp()
                    && !defined.contains(&temp)
                {
                    return Err(format!("{id} uses undefined {temp}"));
                }
            }
        }
        Ok(())
    }
}
