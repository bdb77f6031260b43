//! Static memory planning.
//!
//! Values that cannot live on the stack for their whole lifetime get a fixed 32-byte slot. Slots
//! are handed out by a single [`Allocator`] for the whole module, so the frames of different
//! functions never overlap and a call needs no frame setup.

use crate::ir::{Function, TempId, Terminator, Value};
use bugc_data_structures::map::{FxHashMap, FxIndexSet};

/// Scratch space used for hashing.
pub const SCRATCH: u64 = 0x00;
/// Location of the free memory pointer.
pub const FREE_POINTER: u64 = 0x40;
/// Start of the static slot region.
pub const STATIC_START: u64 = 0x80;

/// Deepest stack position reachable with `DUP16`.
pub(crate) const MAX_DUP_DEPTH: usize = 16;
/// Stack slots that may be pushed on top of the live values while an instruction loads its
/// operands.
const OPERAND_HEADROOM: usize = 3;

/// Hands out word slots, starting at [`STATIC_START`].
#[derive(Clone, Debug)]
pub struct Allocator {
    next: u64,
}

impl Default for Allocator {
    fn default() -> Self {
        Self { next: STATIC_START }
    }
}

impl Allocator {
    /// Allocates a new word slot.
    pub fn allocate(&mut self) -> u64 {
        let offset = self.next;
        self.next += 32;
        offset
    }

    /// Returns the end of the static region, where dynamic allocations begin.
    pub fn end(&self) -> u64 {
        self.next
    }
}

/// The memory slots of one function.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Memory {
    slots: FxHashMap<TempId, u64>,
    return_address: Option<u64>,
}

impl Memory {
    /// Returns the slot of a temporary, if it has one.
    #[inline]
    pub fn offset(&self, temp: TempId) -> Option<u64> {
        self.slots.get(&temp).copied()
    }

    /// Returns the slot holding the return address of a user function.
    #[inline]
    pub fn return_address(&self) -> Option<u64> {
        self.return_address
    }

    /// Returns the number of slotted temporaries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Gives `temp` a slot, unless it already has one.
    pub fn insert(&mut self, temp: TempId, allocator: &mut Allocator) -> u64 {
        *self.slots.entry(temp).or_insert_with(|| allocator.allocate())
    }
}

/// Plans the memory slots of a function.
///
/// A temporary gets a slot when it is a parameter, a phi destination or source, a call argument or
/// result, is used outside the block defining it, or may sit deeper than `DUP16` can reach when
/// one of its uses is generated. `callee_returns` tells whether a called function leaves a value
/// on the stack.
pub fn plan(
    func: &Function,
    is_user_function: bool,
    callee_returns: impl Fn(&str) -> bool,
    allocator: &mut Allocator,
) -> Memory {
    let mut wanted = FxIndexSet::default();
    wanted.extend(func.params.iter().map(|param| param.id));

    let mut defined_in = FxHashMap::default();
    for block in func.blocks.values() {
        for phi in &block.phis {
            wanted.insert(phi.dest);
            wanted.extend(phi.sources.values().filter_map(Value::as_temp));
        }
        for id in block.defs() {
            defined_in.insert(id, block.id);
        }
        if let Terminator::Call { arguments, dest, continuation, .. } = &block.terminator {
            wanted.extend(arguments.iter().filter_map(Value::as_temp));
            if let Some(dest) = dest {
                wanted.insert(*dest);
                defined_in.insert(*dest, *continuation);
            }
        }
    }

    for block in func.blocks.values() {
        let crosses = |temp: &TempId| defined_in.get(temp).is_some_and(|&def| def != block.id);
        wanted.extend(block.uses().filter_map(Value::as_temp).filter(crosses));
    }

    // Every instruction with a destination leaves exactly one value on the stack until the end
    // of its block; replay that to find uses out of `DUP16` reach.
    let continuations = func.continuations();
    let calls: FxHashMap<_, _> = func
        .blocks
        .values()
        .filter_map(|block| match &block.terminator {
            Terminator::Call { function, continuation, .. } => {
                Some((*continuation, function.as_str()))
            }
            _ => None,
        })
        .collect();
    for block in func.blocks.values() {
        let mut stack: Vec<Option<TempId>> = Vec::new();
        if let Some(&function) = calls.get(&block.id)
            && callee_returns(function)
        {
            stack.push(continuations.get(&block.id).copied().flatten());
        }
        for inst in &block.instructions {
            for operand in inst.kind.operands() {
                check(&stack, operand, &mut wanted);
            }
            if let Some(dest) = inst.kind.dest() {
                stack.push(Some(dest));
            }
        }
        for operand in block.terminator.operands() {
            check(&stack, operand, &mut wanted);
        }
    }

    let mut memory = Memory::default();
    for temp in wanted {
        memory.insert(temp, allocator);
    }
    if is_user_function {
        memory.return_address = Some(allocator.allocate());
    }
    trace!(function = %func.name, slots = memory.len(), "planned memory");
    memory
}

fn check(stack: &[Option<TempId>], value: &Value, wanted: &mut FxIndexSet<TempId>) {
    let Some(temp) = value.as_temp() else { return };
    let Some(pos) = stack.iter().rposition(|&item| item == Some(temp)) else { return };
    if stack.len() - pos + OPERAND_HEADROOM > MAX_DUP_DEPTH {
        wanted.insert(temp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinOp, Block, BlockId, InstKind, Instruction, Phi};
    use bugc_data_structures::map::FxIndexMap;
    use bugc_sema::Type;

    fn t(n: usize) -> Value {
        Value::temp(TempId::new(n), Type::UINT256)
    }

    fn function(blocks: Vec<Block>) -> Function {
        Function {
            name: "main".into(),
            params: vec![],
            entry: BlockId::new(0),
            blocks: blocks.into_iter().map(|b| (b.id, b)).collect(),
            ret: None,
            ssa_variables: FxHashMap::default(),
        }
    }

    fn add(left: Value, right: Value, dest: usize) -> Instruction {
        let dest = TempId::new(dest);
        let ty = Type::UINT256;
        Instruction::new(InstKind::Binary { op: BinOp::Add, left, right, ty, dest }, None)
    }

    #[test]
    fn test_cross_block_and_phi_values() {
        let mut entry = Block::new(BlockId::new(0), Terminator::Jump { target: BlockId::new(1) });
        entry.instructions = vec![add(Value::uint(1), Value::uint(2), 0), add(t(0), t(0), 1)];
        let mut exit = Block::new(BlockId::new(1), Terminator::Return { value: Some(t(2)) });
        let mut sources = FxIndexMap::default();
        sources.insert(BlockId::new(0), t(1));
        exit.phis.push(Phi { dest: TempId::new(2), ty: Type::UINT256, sources, debug: None });
        exit.instructions = vec![add(t(0), t(2), 3)];

        let mut allocator = Allocator::default();
        let memory = plan(&function(vec![entry, exit]), false, |_| false, &mut allocator);
        // t0 crosses blocks, t1 is a phi source, t2 a phi destination; t3 stays on the stack.
        assert_eq!(memory.len(), 3);
        assert_eq!(memory.offset(TempId::new(2)), Some(STATIC_START));
        assert_eq!(memory.offset(TempId::new(1)), Some(STATIC_START + 32));
        assert_eq!(memory.offset(TempId::new(0)), Some(STATIC_START + 64));
        assert_eq!(memory.offset(TempId::new(3)), None);
        assert_eq!(allocator.end(), STATIC_START + 96);
    }

    #[test]
    fn test_deep_uses() {
        let mut block = Block::new(BlockId::new(0), Terminator::Return { value: None });
        block.instructions.push(add(Value::uint(1), Value::uint(1), 0));
        for i in 1..20 {
            block.instructions.push(add(Value::uint(1), Value::uint(1), i));
        }
        block.instructions.push(add(t(0), t(19), 20));

        let mut allocator = Allocator::default();
        let memory = plan(&function(vec![block]), false, |_| false, &mut allocator);
        assert!(memory.offset(TempId::new(0)).is_some());
        assert!(memory.offset(TempId::new(19)).is_none());
    }

    #[test]
    fn test_frames_do_not_overlap() {
        let block = |n| Block::new(BlockId::new(n), Terminator::Return { value: None });
        let mut allocator = Allocator::default();
        let mut f = function(vec![block(0)]);
        f.params.push(crate::ir::Param { id: TempId::new(0), name: "a".into(), ty: Type::UINT256 });
        let first = plan(&f, true, |_| false, &mut allocator);
        let second = plan(&f, true, |_| false, &mut allocator);
        assert_eq!(first.offset(TempId::new(0)), Some(STATIC_START));
        assert_eq!(first.return_address(), Some(STATIC_START + 32));
        assert_eq!(second.offset(TempId::new(0)), Some(STATIC_START + 64));
        assert_eq!(second.return_address(), Some(STATIC_START + 96));
    }
}
