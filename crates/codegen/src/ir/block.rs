//! IR basic blocks.

use super::{BlockId, DebugContext, Instruction, TempId, Value};
use bugc_data_structures::map::FxIndexMap;
use bugc_sema::Type;
use smallvec::{SmallVec, smallvec};
use std::fmt;

/// A phi node, selecting a value by the predecessor control arrived from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Phi {
    pub dest: TempId,
    pub ty: Type,
    /// Incoming value per predecessor block.
    pub sources: FxIndexMap<BlockId, Value>,
    pub debug: Option<DebugContext>,
}

/// A basic block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    /// Phi nodes, evaluated in parallel on entry.
    pub phis: Vec<Phi>,
    pub instructions: Vec<Instruction>,
    pub terminator: Terminator,
    pub debug: Option<DebugContext>,
}

impl Block {
    /// Creates a block with no phis or instructions.
    pub fn new(id: BlockId, terminator: Terminator) -> Self {
        Self { id, phis: Vec::new(), instructions: Vec::new(), terminator, debug: None }
    }

    /// Iterates over every value read in this block: phi sources, instruction operands and
    /// terminator operands.
    pub fn uses(&self) -> impl Iterator<Item = &Value> {
        self.phis
            .iter()
            .flat_map(|phi| phi.sources.values())
            .chain(self.instructions.iter().flat_map(|inst| inst.kind.operands()))
            .chain(self.terminator.operands())
    }

    /// Iterates over the temporaries defined by phis and instructions of this block.
    ///
    /// A call result is not included; it is defined by the caller's terminator.
    pub fn defs(&self) -> impl Iterator<Item = TempId> {
        self.phis
            .iter()
            .map(|phi| phi.dest)
            .chain(self.instructions.iter().filter_map(|inst| inst.kind.dest()))
    }
}

/// A block terminator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Terminator {
    /// Unconditional jump.
    Jump { target: BlockId },
    /// Conditional branch on a boolean.
    Branch { condition: Value, then_block: BlockId, else_block: BlockId },
    /// Return from the current function.
    Return { value: Option<Value> },
    /// Call a user function and resume at `continuation`, where `dest` holds the result.
    Call { function: String, arguments: Vec<Value>, dest: Option<TempId>, continuation: BlockId },
}

impl Terminator {
    /// Returns the successor blocks of this terminator.
    pub fn successors(&self) -> SmallVec<[BlockId; 2]> {
        match self {
            Self::Jump { target } => smallvec![*target],
            Self::Branch { then_block, else_block, .. } => smallvec![*then_block, *else_block],
            Self::Return { .. } => SmallVec::new(),
            Self::Call { continuation, .. } => smallvec![*continuation],
        }
    }

    /// Returns mutable references to the successor blocks.
    pub fn successors_mut(&mut self) -> SmallVec<[&mut BlockId; 2]> {
        match self {
            Self::Jump { target } => smallvec![target],
            Self::Branch { then_block, else_block, .. } => smallvec![then_block, else_block],
            Self::Return { .. } => SmallVec::new(),
            Self::Call { continuation, .. } => smallvec![continuation],
        }
    }

    /// Returns the values read by this terminator.
    pub fn operands(&self) -> SmallVec<[&Value; 2]> {
        match self {
            Self::Jump { .. } | Self::Return { value: None } => SmallVec::new(),
            Self::Branch { condition, .. } => smallvec![condition],
            Self::Return { value: Some(value) } => smallvec![value],
            Self::Call { arguments, .. } => arguments.iter().collect(),
        }
    }

    /// Returns mutable references to the values read by this terminator.
    pub fn operands_mut(&mut self) -> SmallVec<[&mut Value; 2]> {
        match self {
            Self::Jump { .. } | Self::Return { value: None } => SmallVec::new(),
            Self::Branch { condition, .. } => smallvec![condition],
            Self::Return { value: Some(value) } => smallvec![value],
            Self::Call { arguments, .. } => arguments.iter_mut().collect(),
        }
    }

    /// Returns the mnemonic for this terminator.
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Self::Jump { .. } => "jump",
            Self::Branch { .. } => "branch",
            Self::Return { .. } => "return",
            Self::Call { .. } => "call",
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jump { target } => write!(f, "jump {target}"),
            Self::Branch { condition, then_block, else_block } => {
                write!(f, "branch {condition}, {then_block}, {else_block}")
            }
            Self::Return { value: None } => f.write_str("return"),
            Self::Return { value: Some(value) } => write!(f, "return {value}"),
            Self::Call { function, arguments, dest, continuation } => {
                if let Some(dest) = dest {
                    write!(f, "{dest} = ")?;
                }
                write!(f, "call {function}(")?;
                for (i, arg) in arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ") -> {continuation}")
            }
        }
    }
}

impl fmt::Display for Phi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = phi", self.dest)?;
        for (i, (block, value)) in self.sources.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}[{block}: {value}]")?;
        }
        write!(f, " : {}", self.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successors() {
        let b = |n| BlockId::new(n);
        assert_eq!(Terminator::Jump { target: b(1) }.successors().as_slice(), [b(1)]);
        let branch =
            Terminator::Branch { condition: Value::bool(true), then_block: b(2), else_block: b(3) };
        assert_eq!(branch.successors().as_slice(), [b(2), b(3)]);
        assert!(Terminator::Return { value: None }.successors().is_empty());
        let call = Terminator::Call {
            function: "f".into(),
            arguments: vec![Value::uint(1), Value::uint(2)],
            dest: Some(TempId::new(0)),
            continuation: b(4),
        };
        assert_eq!(call.successors().as_slice(), [b(4)]);
        assert_eq!(call.operands().len(), 2);
        assert_eq!(call.to_string(), "t0 = call f(1, 2) -> bb4");
    }

    #[test]
    fn test_phi_display() {
        let mut sources = FxIndexMap::default();
        sources.insert(BlockId::new(1), Value::uint(1));
        sources.insert(BlockId::new(2), Value::temp(TempId::new(4), Type::UINT256));
        let phi = Phi { dest: TempId::new(5), ty: Type::UINT256, sources, debug: None };
        assert_eq!(phi.to_string(), "t5 = phi [bb1: 1], [bb2: t4] : uint256");
    }
}
