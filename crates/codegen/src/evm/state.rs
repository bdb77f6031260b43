//! Operand stack tracking with statically checked shapes.
//!
//! A [`State<S>`] pairs the runtime view of the stack with a type-level list `S` of the labels
//! on top of it: `(Lhs, (Rhs, Any))` is a stack with a left operand on top of a right operand,
//! above anything. Each primitive is only defined for the shapes it consumes and returns the
//! shape it produces, so emitting `SSTORE` without a slot on top of a value does not compile.
//!
//! Code that loops over a runtime number of values steps out of the static world with
//! [`State::erase`] and back in with [`State::assume`], which checks the runtime view.

use super::{
    EvmgenError,
    assembler::{Assembler, Instruction, Label},
    memory::{MAX_DUP_DEPTH, Memory},
    opcodes,
};
use crate::ir::{TempId, Value};
use alloy_primitives::U256;
use std::{fmt, marker::PhantomData};

type Result<T, E = EvmgenError> = std::result::Result<T, E>;

/// A type-level name for a stack slot.
pub trait StackLabel {
    const NAME: &'static str;
}

/// A type-level list of stack labels, top first.
pub trait Shape {
    /// Appends the labels of this shape, top first.
    fn labels(out: &mut Vec<&'static str>);
}

/// The statically unknown rest of the stack.
#[derive(Debug)]
pub enum Any {}

impl Shape for Any {
    fn labels(_out: &mut Vec<&'static str>) {}
}

impl<L: StackLabel, R: Shape> Shape for (L, R) {
    fn labels(out: &mut Vec<&'static str>) {
        out.push(L::NAME);
        R::labels(out);
    }
}

macro_rules! stack_labels {
    ($($(#[$attr:meta])* $name:ident),* $(,)?) => {$(
        $(#[$attr])*
        #[derive(Debug)]
        pub enum $name {}

        impl StackLabel for $name {
            const NAME: &'static str = stringify!($name);
        }
    )*};
}

stack_labels! {
    /// A computed word.
    Word,
    /// The first operand of a binary opcode.
    Lhs,
    /// The second operand of a binary opcode.
    Rhs,
    /// A storage slot.
    Slot,
    /// A memory or calldata offset.
    Addr,
    /// A byte count.
    Size,
    /// A branch condition.
    Cond,
    /// A jump destination.
    Target,
    /// An offset into the executing code.
    CodeOffset,
}

/// A slot of the runtime stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackItem {
    pub label: &'static str,
    /// The temporary this slot holds, if it is the defining copy.
    pub temp: Option<TempId>,
}

/// The code generation state of one function.
pub struct State<S> {
    /// Bottom first.
    stack: Vec<StackItem>,
    memory: Memory,
    asm: Assembler,
    _shape: PhantomData<fn() -> S>,
}

impl<S> fmt::Debug for State<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State").field("stack", &self.stack).field("memory", &self.memory).finish()
    }
}

/// A step from one stack shape to another.
pub trait Transition<In, Out>: FnOnce(State<In>) -> Result<State<Out>> {}

impl<In, Out, F> Transition<In, Out> for F where F: FnOnce(State<In>) -> Result<State<Out>> {}

/// Chains two transitions; the output shape of `first` must be the input shape of `second`.
pub fn pipe<A, B, C>(
    first: impl Transition<A, B>,
    second: impl Transition<B, C>,
) -> impl Transition<A, C> {
    move |state: State<A>| -> Result<State<C>> { second(first(state)?) }
}

impl State<Any> {
    /// Creates a state with an empty stack.
    pub fn new(memory: Memory, asm: Assembler) -> Self {
        Self { stack: Vec::new(), memory, asm, _shape: PhantomData }
    }

    /// Re-enters the static world, checking that the stack starts with the labels of `T`.
    pub fn assume<T: Shape>(self) -> Result<State<T>> {
        let mut expected = Vec::new();
        T::labels(&mut expected);
        let found: Vec<_> = self.stack.iter().rev().take(expected.len()).map(|i| i.label).collect();
        if found != expected {
            return Err(EvmgenError::StackShapeMismatch {
                expected: expected.join(", "),
                found: found.join(", "),
            });
        }
        Ok(self.cast())
    }

    /// Pops every slot.
    pub fn discard_all(mut self) -> Self {
        for _ in 0..self.stack.len() {
            self.asm.emit_op(opcodes::POP);
        }
        self.stack.clear();
        self
    }

    /// Starts a new block at `label`.
    ///
    /// Blocks are only entered by jumps, which leave nothing on the stack.
    pub fn enter_block(mut self, label: Label) -> Self {
        self.stack.clear();
        self.asm.define_label(label);
        self.asm.emit_op(opcodes::JUMPDEST);
        self
    }

    /// Returns the memory plan and the emitted code.
    pub fn into_parts(self) -> (Memory, Assembler) {
        (self.memory, self.asm)
    }
}

impl<S> State<S> {
    fn cast<T>(self) -> State<T> {
        State { stack: self.stack, memory: self.memory, asm: self.asm, _shape: PhantomData }
    }

    fn grow<L: StackLabel, T>(mut self, temp: Option<TempId>) -> State<T> {
        self.stack.push(StackItem { label: L::NAME, temp });
        self.cast()
    }

    fn shrink<T>(mut self, n: usize) -> State<T> {
        let len = self.stack.len();
        self.stack.truncate(len.saturating_sub(n));
        self.cast()
    }

    /// Emits `opcode`, which pops `pops` slots and pushes one labeled `L`.
    fn op<L: StackLabel, T>(mut self, opcode: u8, pops: usize) -> State<T> {
        self.asm.emit_op(opcode);
        self.shrink::<S>(pops).grow::<L, T>(None)
    }

    /// Emits `opcode`, which pops `pops` slots and pushes nothing.
    fn consume<T>(mut self, opcode: u8, pops: usize) -> State<T> {
        self.asm.emit_op(opcode);
        self.shrink(pops)
    }

    /// Forgets the static shape.
    pub fn erase(self) -> State<Any> {
        self.cast()
    }

    /// Applies a transition.
    pub fn apply<T>(self, transition: impl Transition<S, T>) -> Result<State<T>> {
        transition(self)
    }

    /// Returns the runtime stack, bottom first.
    pub fn stack(&self) -> &[StackItem] {
        &self.stack
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Pushes an immediate.
    pub fn push<L: StackLabel>(mut self, value: U256) -> State<(L, S)> {
        self.asm.emit_push(value);
        self.grow::<L, _>(None)
    }

    /// Pushes a fixed-width `PUSH2` immediate.
    pub fn push2<L: StackLabel>(mut self, value: u16) -> State<(L, S)> {
        self.asm.emit(Instruction::push2(value));
        self.grow::<L, _>(None)
    }

    /// Pushes the offset of a label.
    pub fn push_label<L: StackLabel>(mut self, label: Label) -> State<(L, S)> {
        self.asm.emit_push_label(label);
        self.grow::<L, _>(None)
    }

    /// Pushes an environment value, such as `CALLER`.
    pub fn env<L: StackLabel>(self, opcode: u8) -> State<(L, S)> {
        self.op::<L, _>(opcode, 0)
    }

    /// Records a slot that control flow left on the stack before entering this code.
    pub fn receive<L: StackLabel>(self, temp: Option<TempId>) -> State<(L, S)> {
        self.grow::<L, _>(temp)
    }

    /// Pushes a copy of `value`.
    ///
    /// Constants become immediates. A temporary is duplicated from the stack when `DUP16` can
    /// reach it, and reloaded from its memory slot otherwise.
    pub fn load<L: StackLabel>(mut self, value: &Value) -> Result<State<(L, S)>> {
        let temp = match value {
            Value::Const { value, .. } => {
                let word = value
                    .to_word()
                    .ok_or_else(|| EvmgenError::UnsupportedConstant { value: value.to_string() })?;
                return Ok(self.push::<L>(word));
            }
            Value::Temp { id, .. } => *id,
        };

        let depth = self.stack.iter().rev().position(|item| item.temp == Some(temp)).map(|p| p + 1);
        if let Some(depth) = depth
            && depth <= MAX_DUP_DEPTH
        {
            self.asm.emit_op(opcodes::dup(depth as u8));
            return Ok(self.grow::<L, _>(None));
        }
        if let Some(offset) = self.memory.offset(temp) {
            self.asm.emit_push(U256::from(offset));
            self.asm.emit_op(opcodes::MLOAD);
            return Ok(self.grow::<L, _>(None));
        }
        Err(match depth {
            Some(depth) => EvmgenError::DupDepthExceeded { temp, depth },
            None => EvmgenError::ValueNotFound { temp },
        })
    }
}

impl<A: StackLabel, S> State<(A, S)> {
    /// Marks the top slot as the defining copy of `temp`, and writes it to the slot of `temp` if
    /// it has one.
    pub fn store_if_needed(mut self, temp: TempId) -> Self {
        if let Some(top) = self.stack.last_mut() {
            top.temp = Some(temp);
        }
        if let Some(offset) = self.memory.offset(temp) {
            self.asm.emit_op(opcodes::DUP1);
            self.asm.emit_push(U256::from(offset));
            self.asm.emit_op(opcodes::MSTORE);
        }
        self
    }

    pub fn pop(self) -> State<S> {
        self.consume(opcodes::POP, 1)
    }

    pub fn dup1(mut self) -> State<(A, (A, S))> {
        self.asm.emit_op(opcodes::DUP1);
        self.grow::<A, _>(None)
    }

    /// Applies a one-operand opcode such as `ISZERO`.
    pub fn unary<L: StackLabel>(self, opcode: u8) -> State<(L, S)> {
        self.op::<L, _>(opcode, 1)
    }
}

impl<A: StackLabel> State<(A, Any)> {
    /// Pops every slot below the top one.
    pub fn drop_below(mut self) -> Self {
        let below = self.stack.len().saturating_sub(1);
        for _ in 0..below {
            self.asm.emit_op(opcodes::swap(1));
            self.asm.emit_op(opcodes::POP);
        }
        self.stack.drain(..below);
        self
    }
}

impl<A: StackLabel, B: StackLabel, S> State<(A, (B, S))> {
    pub fn swap1(mut self) -> State<(B, (A, S))> {
        self.asm.emit_op(opcodes::swap(1));
        let len = self.stack.len();
        if len >= 2 {
            self.stack.swap(len - 1, len - 2);
        }
        self.cast()
    }
}

impl<S> State<(Lhs, (Rhs, S))> {
    /// Applies a two-operand opcode; `SUB` computes `Lhs - Rhs`.
    pub fn binary<L: StackLabel>(self, opcode: u8) -> State<(L, S)> {
        self.op::<L, _>(opcode, 2)
    }
}

impl<S> State<(Slot, S)> {
    pub fn sload<L: StackLabel>(self) -> State<(L, S)> {
        self.op::<L, _>(opcodes::SLOAD, 1)
    }
}

impl<S> State<(Slot, (Word, S))> {
    pub fn sstore(self) -> State<S> {
        self.consume(opcodes::SSTORE, 2)
    }
}

impl<S> State<(Addr, S)> {
    pub fn mload<L: StackLabel>(self) -> State<(L, S)> {
        self.op::<L, _>(opcodes::MLOAD, 1)
    }

    pub fn calldataload<L: StackLabel>(self) -> State<(L, S)> {
        self.op::<L, _>(opcodes::CALLDATALOAD, 1)
    }
}

impl<S> State<(Addr, (Word, S))> {
    pub fn mstore(self) -> State<S> {
        self.consume(opcodes::MSTORE, 2)
    }
}

impl<S> State<(Addr, (Size, S))> {
    pub fn keccak256<L: StackLabel>(self) -> State<(L, S)> {
        self.op::<L, _>(opcodes::KECCAK256, 2)
    }

    /// Ends execution returning the memory range.
    pub fn return_(self) -> State<S> {
        self.consume(opcodes::RETURN, 2)
    }
}

impl<S> State<(Addr, (CodeOffset, (Size, S)))> {
    pub fn codecopy(self) -> State<S> {
        self.consume(opcodes::CODECOPY, 3)
    }
}

impl<S> State<(Target, S)> {
    pub fn jump(self) -> State<S> {
        self.consume(opcodes::JUMP, 1)
    }
}

impl<S> State<(Target, (Cond, S))> {
    pub fn jumpi(self) -> State<S> {
        self.consume(opcodes::JUMPI, 2)
    }
}

impl<S> State<S> {
    /// Ends execution.
    pub fn stop(self) -> State<S> {
        self.consume(opcodes::STOP, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evm::{
        memory::{Allocator, Memory},
        serialize::serialize,
    };
    use bugc_sema::Type;

    fn state() -> State<Any> {
        State::new(Memory::default(), Assembler::new())
    }

    fn code(state: State<impl Sized>) -> Vec<u8> {
        let (_, asm) = state.cast::<Any>().into_parts();
        serialize(&asm.finish().unwrap())
    }

    fn t(n: usize) -> Value {
        Value::temp(TempId::new(n), Type::UINT256)
    }

    #[test]
    fn test_storage_write() {
        let s = state()
            .load::<Word>(&Value::uint(7))
            .unwrap()
            .load::<Slot>(&Value::uint(1))
            .unwrap();
        let s = s.sstore();
        assert!(s.stack().is_empty());
        assert_eq!(code(s), [0x60, 7, 0x60, 1, 0x55]);
    }

    #[test]
    fn test_prefers_dup_over_memory() {
        let mut allocator = Allocator::default();
        let mut memory = Memory::default();
        memory.insert(TempId::new(0), &mut allocator);
        let s = State::new(memory, Assembler::new())
            .push::<Word>(U256::from(5))
            .store_if_needed(TempId::new(0))
            .load::<Word>(&t(0))
            .unwrap();
        // PUSH1 5, DUP1 PUSH1 0x80 MSTORE, DUP1
        assert_eq!(code(s), [0x60, 5, 0x80, 0x60, 0x80, 0x52, 0x80]);
    }

    #[test]
    fn test_depth_limits() {
        let mut s = state().push::<Word>(U256::from(1)).store_if_needed(TempId::new(0)).erase();
        for _ in 0..16 {
            s = s.push::<Word>(U256::ZERO).erase();
        }
        let err = s.load::<Word>(&t(0)).unwrap_err();
        assert_eq!(err, EvmgenError::DupDepthExceeded { temp: TempId::new(0), depth: 17 });

        let err = state().load::<Word>(&t(3)).unwrap_err();
        assert_eq!(err, EvmgenError::ValueNotFound { temp: TempId::new(3) });
    }

    #[test]
    fn test_memory_reload() {
        let mut allocator = Allocator::default();
        let mut memory = Memory::default();
        memory.insert(TempId::new(0), &mut allocator);
        let s = State::new(memory, Assembler::new()).load::<Word>(&t(0)).unwrap();
        assert_eq!(code(s), [0x60, 0x80, 0x51]);
    }

    #[test]
    fn test_assume() {
        let s = state().push::<Word>(U256::from(1)).push::<Addr>(U256::ZERO).erase();
        let s = s.assume::<(Addr, (Word, Any))>().unwrap().mstore();
        assert!(s.stack().is_empty());

        let err = state().push::<Word>(U256::from(1)).erase().assume::<(Slot, Any)>().unwrap_err();
        assert_eq!(
            err,
            EvmgenError::StackShapeMismatch { expected: "Slot".into(), found: "Word".into() }
        );
    }

    #[test]
    fn test_pipe() {
        let load = |s: State<Any>| -> Result<State<(Lhs, (Rhs, Any))>> {
            s.load::<Rhs>(&Value::uint(2))?.load::<Lhs>(&Value::uint(3))
        };
        let sub = |s: State<(Lhs, (Rhs, Any))>| -> Result<State<(Word, Any)>> {
            Ok(s.binary::<Word>(opcodes::SUB))
        };
        let s = state().apply(pipe(load, sub)).unwrap();
        assert_eq!(s.stack().len(), 1);
        assert_eq!(code(s), [0x60, 2, 0x60, 3, 0x03]);
    }

    #[test]
    fn test_drop_below() {
        let s = state()
            .push::<Word>(U256::from(1))
            .push::<Word>(U256::from(2))
            .push::<Cond>(U256::from(3))
            .erase()
            .assume::<(Cond, Any)>()
            .unwrap()
            .drop_below();
        assert_eq!(s.stack().len(), 1);
        assert_eq!(code(s), [0x60, 1, 0x60, 2, 0x60, 3, 0x90, 0x50, 0x90, 0x50]);
    }
}
