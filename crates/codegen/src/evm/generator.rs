//! IR to EVM lowering.
//!
//! Each instruction loads its operands onto the stack, applies its opcodes and leaves its result
//! on top, where later instructions of the same block duplicate it. The stack is emptied at every
//! block boundary: values live across blocks are kept in their memory slots.
//!
//! User functions use static frames: the caller pushes the continuation and the arguments and
//! jumps, the callee stores them in its frame and jumps back with the result on the stack.

use super::{
    EvmgenError, Instruction,
    assembler::{Assembler, Label},
    memory::{self, Allocator, FREE_POINTER, Memory, SCRATCH},
    opcodes,
    serialize::calculate_size,
    state::{Addr, Any, CodeOffset, Cond, Lhs, Rhs, Size, Slot, State, Target, Transition, Word},
};
use crate::ir::{
    BinOp, Block, BlockId, EnvOp, Function, InstKind, Location, Module, OffsetKind, SlotKind,
    TempId, Terminator, UnaryOp, Value, is_signed_operation,
};
use alloy_primitives::U256;
use bugc_data_structures::map::{FxHashMap, FxIndexSet};
use bugc_sema::Type;

type Result<T, E = EvmgenError> = std::result::Result<T, E>;

/// Size of the deploy trailer when no `create` code precedes it.
const TRAILER_SIZE: u16 = 11;

/// Generated code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bytecode {
    /// The code run on every call.
    pub runtime: Vec<Instruction>,
    /// The init code when the program has a `create` block: the create body, the deploy trailer
    /// and the functions it calls, followed by the runtime.
    pub create: Option<Vec<Instruction>>,
}

impl Bytecode {
    /// Returns the init code that deploys the runtime.
    ///
    /// Without a `create` block, this is only the deploy trailer followed by the runtime.
    pub fn deployment(&self) -> Vec<Instruction> {
        if let Some(create) = &self.create {
            return create.clone();
        }
        // The runtime size is checked to fit during generation.
        let len = calculate_size(&self.runtime) as u16;
        let mut code = vec![
            Instruction::push2(len),
            Instruction::op(opcodes::DUP1),
            Instruction::push2(TRAILER_SIZE),
            Instruction::op(opcodes::PUSH0),
            Instruction::op(opcodes::CODECOPY),
            Instruction::op(opcodes::PUSH0),
            Instruction::op(opcodes::RETURN),
        ];
        code.extend_from_slice(&self.runtime);
        code
    }
}

/// Generates EVM code for a module.
#[instrument(name = "evmgen", level = "debug", skip_all, fields(module = %module.name))]
pub fn generate(module: &Module) -> Result<Bytecode> {
    check_calls(module)?;

    let mut allocator = Allocator::default();
    let returns = |name: &str| module.functions.get(name).is_some_and(|f| f.ret.is_some());
    let mut frames = FxHashMap::default();
    if let Some(create) = &module.create {
        frames.insert(Unit::Create, memory::plan(create, false, returns, &mut allocator));
    }
    frames.insert(Unit::Main, memory::plan(&module.main, false, returns, &mut allocator));
    for (i, func) in module.functions.values().enumerate() {
        frames.insert(Unit::Function(i), memory::plan(func, true, returns, &mut allocator));
    }

    let generator = Generator { module, frames, static_end: allocator.end() };
    let runtime = generator.code_object(Unit::Main)?;
    let size = calculate_size(&runtime);
    let len = u16::try_from(size).map_err(|_| EvmgenError::CodeTooLarge { size })?;
    let create = match module.create {
        Some(_) => {
            let mut code = generator.code_object_with_trailer(len)?;
            code.extend_from_slice(&runtime);
            Some(code)
        }
        None => None,
    };

    debug!(
        runtime = size,
        create = create.as_deref().map(calculate_size),
        static_end = generator.static_end,
        "generated bytecode"
    );
    Ok(Bytecode { runtime, create })
}

/// A function being laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Unit {
    Main,
    Create,
    /// A user function, by index in the module.
    Function(usize),
}

/// Labels of one code object.
struct Labels {
    blocks: FxHashMap<(Unit, BlockId), Label>,
    entries: FxHashMap<Unit, Label>,
}

impl Labels {
    fn block(&self, unit: Unit, id: BlockId) -> Result<Label> {
        self.blocks
            .get(&(unit, id))
            .copied()
            .ok_or_else(|| EvmgenError::internal(format!("no label for block {id}")))
    }

    fn entry(&self, unit: Unit) -> Result<Label> {
        self.entries
            .get(&unit)
            .copied()
            .ok_or_else(|| EvmgenError::internal(format!("no entry label for {unit:?}")))
    }
}

struct Generator<'m> {
    module: &'m Module,
    frames: FxHashMap<Unit, Memory>,
    /// End of the static slots; the free memory pointer starts here.
    static_end: u64,
}

impl<'m> Generator<'m> {
    fn function(&self, unit: Unit) -> Result<&'m Function> {
        let func = match unit {
            Unit::Main => Some(&self.module.main),
            Unit::Create => self.module.create.as_ref(),
            Unit::Function(i) => self.module.functions.get_index(i).map(|(_, func)| func),
        };
        func.ok_or_else(|| EvmgenError::internal(format!("missing function {unit:?}")))
    }

    /// Returns `root` followed by every user function it transitively calls, in module order.
    fn layout(&self, root: Unit) -> Result<Vec<Unit>> {
        let mut reached = FxIndexSet::default();
        let mut pending = vec![self.function(root)?];
        while let Some(func) = pending.pop() {
            for callee in callees(func) {
                let Some((index, _, callee)) = self.module.functions.get_full(callee) else {
                    return Err(EvmgenError::UnknownFunction { name: callee.to_string() });
                };
                if reached.insert(index) {
                    pending.push(callee);
                }
            }
        }
        let mut functions: Vec<_> = reached.into_iter().collect();
        functions.sort_unstable();
        Ok(std::iter::once(root).chain(functions.into_iter().map(Unit::Function)).collect())
    }

    fn labels(&self, asm: &mut Assembler, units: &[Unit]) -> Result<Labels> {
        let mut labels = Labels { blocks: FxHashMap::default(), entries: FxHashMap::default() };
        for &unit in units {
            labels.entries.insert(unit, asm.new_label());
            for &id in self.function(unit)?.blocks.keys() {
                labels.blocks.insert((unit, id), asm.new_label());
            }
        }
        Ok(labels)
    }

    fn frame(&self, unit: Unit) -> Result<Memory> {
        self.frames
            .get(&unit)
            .cloned()
            .ok_or_else(|| EvmgenError::internal(format!("no frame for {unit:?}")))
    }

    /// Generates the runtime code.
    fn code_object(&self, root: Unit) -> Result<Vec<Instruction>> {
        let mut asm = Assembler::new();
        let units = self.layout(root)?;
        let labels = self.labels(&mut asm, &units)?;
        let mut state = self.prologue(State::new(Memory::default(), asm));
        for &unit in &units {
            state = self.emit_unit(state, unit, &labels, None)?;
        }
        let (_, asm) = state.into_parts();
        asm.finish()
    }

    /// Generates the `create` code, the deploy trailer for a runtime of `len` bytes and the
    /// functions `create` calls.
    fn code_object_with_trailer(&self, len: u16) -> Result<Vec<Instruction>> {
        let mut asm = Assembler::new();
        let units = self.layout(Unit::Create)?;
        let labels = self.labels(&mut asm, &units)?;
        let trailer = asm.new_label();
        let runtime_start = asm.new_label();

        let mut state = self.prologue(State::new(Memory::default(), asm));
        let (root, callees) =
            units.split_first().ok_or_else(|| EvmgenError::internal("empty layout"))?;
        state = self.emit_unit(state, *root, &labels, Some(trailer))?;
        state = state
            .enter_block(trailer)
            .push2::<Size>(len)
            .dup1()
            .push_label::<CodeOffset>(runtime_start)
            .push::<Addr>(U256::ZERO)
            .codecopy()
            .push::<Addr>(U256::ZERO)
            .return_();
        for &unit in callees {
            state = self.emit_unit(state, unit, &labels, Some(trailer))?;
        }
        let (_, mut asm) = state.into_parts();
        asm.define_label(runtime_start);
        asm.finish()
    }

    /// Points the free memory pointer past the static slots.
    fn prologue(&self, state: State<Any>) -> State<Any> {
        state
            .push::<Word>(U256::from(self.static_end))
            .push::<Addr>(U256::from(FREE_POINTER))
            .mstore()
    }

    fn emit_unit(
        &self,
        state: State<Any>,
        unit: Unit,
        labels: &Labels,
        trailer: Option<Label>,
    ) -> Result<State<Any>> {
        let func = self.function(unit)?;
        trace!(function = %func.name, blocks = func.blocks.len(), "generating function");
        let (_, asm) = state.into_parts();
        let mut state = State::new(self.frame(unit)?, asm);
        if let Unit::Function(_) = unit {
            state = store_arguments(state.enter_block(labels.entry(unit)?), func)?;
        }
        if func.blocks.first().map(|(&id, _)| id) != Some(func.entry) {
            state = state.push_label::<Target>(labels.block(unit, func.entry)?).jump();
        }

        let results = self.call_results(func);
        for block in func.blocks.values() {
            state = state.enter_block(labels.block(unit, block.id)?);
            match results.get(&block.id) {
                Some(&(Some(dest), true)) => {
                    state = state.receive::<Word>(Some(dest)).store_if_needed(dest).erase();
                }
                Some(&(None, true)) => state = state.receive::<Word>(None).erase(),
                Some(&(Some(dest), false)) => {
                    return Err(EvmgenError::internal(format!(
                        "{dest} receives the result of a function without one"
                    )));
                }
                Some(&(None, false)) | None => {}
            }
            for inst in &block.instructions {
                state = emit_instruction(state, &inst.kind)?;
            }
            state = self.emit_terminator(state, unit, func, block, labels, trailer)?;
        }
        Ok(state)
    }

    /// Returns, for every continuation block, the temporary receiving the call result and
    /// whether the callee leaves one on the stack.
    fn call_results(&self, func: &Function) -> FxHashMap<BlockId, (Option<TempId>, bool)> {
        func.blocks
            .values()
            .filter_map(|block| match &block.terminator {
                Terminator::Call { function, dest, continuation, .. } => {
                    let returns =
                        self.module.functions.get(function).is_some_and(|f| f.ret.is_some());
                    Some((*continuation, (*dest, returns)))
                }
                Terminator::Jump { .. } | Terminator::Branch { .. } | Terminator::Return { .. } => {
                    None
                }
            })
            .collect()
    }

    fn emit_terminator(
        &self,
        state: State<Any>,
        unit: Unit,
        func: &Function,
        block: &Block,
        labels: &Labels,
        trailer: Option<Label>,
    ) -> Result<State<Any>> {
        let target_phis = |id: BlockId| {
            func.blocks
                .get(&id)
                .map(|block| block.phis.as_slice())
                .ok_or_else(|| EvmgenError::internal(format!("{} jumps to missing {id}", block.id)))
        };

        match &block.terminator {
            Terminator::Jump { target } => {
                let phis = target_phis(*target)?;
                let mut state = state;
                for phi in phis {
                    let source = phi.sources.get(&block.id).ok_or_else(|| {
                        let message = format!("{} has no source for {}", phi.dest, block.id);
                        EvmgenError::internal(message)
                    })?;
                    state = state.load::<Word>(source)?.erase();
                }
                for phi in phis.iter().rev() {
                    let offset = slot(state.memory(), phi.dest)?;
                    state = state.assume::<(Word, Any)>()?.push::<Addr>(offset).mstore();
                }
                Ok(state.discard_all().push_label::<Target>(labels.block(unit, *target)?).jump())
            }
            Terminator::Branch { condition, then_block, else_block } => {
                for target in [then_block, else_block] {
                    if !target_phis(*target)?.is_empty() {
                        return Err(EvmgenError::internal(format!(
                            "branch target {target} has phis"
                        )));
                    }
                }
                Ok(state
                    .load::<Cond>(condition)?
                    .drop_below()
                    .push_label::<Target>(labels.block(unit, *then_block)?)
                    .jumpi()
                    .push_label::<Target>(labels.block(unit, *else_block)?)
                    .jump())
            }
            Terminator::Return { value } => match unit {
                Unit::Main => Ok(match value {
                    Some(value) => state
                        .load::<Word>(value)?
                        .push::<Addr>(U256::from(SCRATCH))
                        .mstore()
                        .push::<Size>(U256::from(32))
                        .push::<Addr>(U256::from(SCRATCH))
                        .return_(),
                    None => state.stop(),
                }),
                Unit::Create => {
                    let trailer = trailer
                        .ok_or_else(|| EvmgenError::internal("`create` without a deploy trailer"))?;
                    Ok(state.discard_all().push_label::<Target>(trailer).jump())
                }
                Unit::Function(_) => {
                    let ret = state.memory().return_address().ok_or_else(|| {
                        EvmgenError::internal(format!("`{}` has no return address slot", func.name))
                    })?;
                    Ok(match value {
                        Some(value) => state
                            .load::<Word>(value)?
                            .drop_below()
                            .push::<Addr>(U256::from(ret))
                            .mload::<Target>()
                            .jump()
                            .erase(),
                        None => state
                            .discard_all()
                            .push::<Addr>(U256::from(ret))
                            .mload::<Target>()
                            .jump(),
                    })
                }
            },
            Terminator::Call { function, arguments, dest: _, continuation } => {
                let Some((index, _, callee)) = self.module.functions.get_full(function) else {
                    return Err(EvmgenError::UnknownFunction { name: function.clone() });
                };
                if callee.params.len() != arguments.len() {
                    return Err(EvmgenError::internal(format!(
                        "`{function}` takes {} arguments, {} given",
                        callee.params.len(),
                        arguments.len()
                    )));
                }
                if !target_phis(*continuation)?.is_empty() {
                    return Err(EvmgenError::internal(format!(
                        "continuation {continuation} has phis"
                    )));
                }
                let mut state = state
                    .discard_all()
                    .push_label::<Target>(labels.block(unit, *continuation)?)
                    .erase();
                for argument in arguments {
                    state = state.load::<Word>(argument)?.erase();
                }
                Ok(state.push_label::<Target>(labels.entry(Unit::Function(index))?).jump())
            }
        }
    }
}

/// Moves the return address and the arguments left by the caller into the frame.
fn store_arguments(state: State<Any>, func: &Function) -> Result<State<Any>> {
    let mut state = state.receive::<Word>(None).erase();
    for param in &func.params {
        state = state.receive::<Word>(Some(param.id)).erase();
    }
    for param in func.params.iter().rev() {
        let offset = slot(state.memory(), param.id)?;
        state = state.assume::<(Word, Any)>()?.push::<Addr>(offset).mstore();
    }
    let ret = state.memory().return_address().ok_or_else(|| {
        EvmgenError::internal(format!("`{}` has no return address slot", func.name))
    })?;
    Ok(state.assume::<(Word, Any)>()?.push::<Addr>(U256::from(ret)).mstore())
}

fn slot(memory: &Memory, temp: TempId) -> Result<U256> {
    memory
        .offset(temp)
        .map(U256::from)
        .ok_or_else(|| EvmgenError::internal(format!("{temp} has no memory slot")))
}

fn emit_instruction(state: State<Any>, kind: &InstKind) -> Result<State<Any>> {
    Ok(match kind {
        InstKind::Const { value, dest, .. } => {
            let word = value
                .to_word()
                .ok_or_else(|| EvmgenError::UnsupportedConstant { value: value.to_string() })?;
            state.push::<Word>(word).store_if_needed(*dest).erase()
        }
        InstKind::Binary { op, left, right, dest, .. } => {
            state.apply(binary(*op, left, right))?.store_if_needed(*dest).erase()
        }
        InstKind::Unary { op, operand, dest } => {
            let state = match op {
                UnaryOp::Not => state.load::<Word>(operand)?.unary::<Word>(opcodes::ISZERO),
                UnaryOp::Neg => state
                    .load::<Rhs>(operand)?
                    .push::<Lhs>(U256::ZERO)
                    .binary::<Word>(opcodes::SUB),
            };
            state.store_if_needed(*dest).erase()
        }
        InstKind::Cast { value, to, dest } => {
            state.apply(cast(value, to))?.store_if_needed(*dest).erase()
        }
        InstKind::Read { location, address, dest, .. } => {
            let state = match location {
                Location::Storage => state.load::<Slot>(address)?.sload::<Word>(),
                Location::Memory => state.load::<Addr>(address)?.mload::<Word>(),
                Location::Calldata => state.load::<Addr>(address)?.calldataload::<Word>(),
            };
            state.store_if_needed(*dest).erase()
        }
        InstKind::Write { location, address, value } => match location {
            Location::Storage => state.load::<Word>(value)?.load::<Slot>(address)?.sstore(),
            Location::Memory => state.load::<Word>(value)?.load::<Addr>(address)?.mstore(),
            Location::Calldata => return Err(EvmgenError::internal("calldata is read-only")),
        },
        InstKind::Env { op, dest } => {
            let opcode = match op {
                EnvOp::Caller => opcodes::CALLER,
                EnvOp::CallValue => opcodes::CALLVALUE,
                EnvOp::Timestamp => opcodes::TIMESTAMP,
                EnvOp::Number => opcodes::NUMBER,
                EnvOp::CalldataSize => opcodes::CALLDATASIZE,
            };
            state.env::<Word>(opcode).store_if_needed(*dest).erase()
        }
        InstKind::Hash { value, dest } => {
            state.apply(hash_word(value))?.store_if_needed(*dest).erase()
        }
        InstKind::Length { object, location, dest } => {
            let state = match location {
                Location::Calldata => state.env::<Word>(opcodes::CALLDATASIZE),
                Location::Storage => state.load::<Slot>(object)?.sload::<Word>(),
                Location::Memory => {
                    return Err(EvmgenError::internal("memory arrays have a static length"));
                }
            };
            state.store_if_needed(*dest).erase()
        }
        InstKind::ComputeSlot { kind, base, dest } => {
            let state = match kind {
                SlotKind::Mapping { key } => state
                    .load::<Word>(key)?
                    .push::<Addr>(U256::from(SCRATCH))
                    .mstore()
                    .load::<Word>(base)?
                    .push::<Addr>(U256::from(SCRATCH + 32))
                    .mstore()
                    .push::<Size>(U256::from(64))
                    .push::<Addr>(U256::from(SCRATCH))
                    .keccak256::<Word>(),
                SlotKind::ArrayData => state.apply(hash_word(base))?,
                SlotKind::Field { offset } => state.apply(add_offset(base, *offset))?,
            };
            state.store_if_needed(*dest).erase()
        }
        InstKind::ComputeOffset { kind, base, dest } => {
            let state = match kind {
                OffsetKind::Element { index, stride } => state
                    .load::<Rhs>(index)?
                    .push::<Lhs>(U256::from(*stride))
                    .binary::<Rhs>(opcodes::MUL)
                    .load::<Lhs>(base)?
                    .binary::<Word>(opcodes::ADD),
                OffsetKind::Field { offset } => state.apply(add_offset(base, *offset))?,
            };
            state.store_if_needed(*dest).erase()
        }
        InstKind::Allocate { size, dest } => state
            .push::<Addr>(U256::from(FREE_POINTER))
            .mload::<Lhs>()
            .dup1()
            .load::<Rhs>(size)?
            .swap1()
            .binary::<Word>(opcodes::ADD)
            .push::<Addr>(U256::from(FREE_POINTER))
            .mstore()
            .store_if_needed(*dest)
            .erase(),
    })
}

fn binary<'a>(
    op: BinOp,
    left: &'a Value,
    right: &'a Value,
) -> impl Transition<Any, (Word, Any)> + 'a {
    move |state: State<Any>| -> Result<State<(Word, Any)>> {
        let signed = is_signed_operation(left, right);
        let pick = |unsigned, signed_op| if signed { signed_op } else { unsigned };
        let operands = |state: State<Any>| -> Result<State<(Lhs, (Rhs, Any))>> {
            state.load::<Rhs>(right)?.load::<Lhs>(left)
        };
        let state = match op {
            BinOp::Add => operands(state)?.binary(opcodes::ADD),
            BinOp::Sub => operands(state)?.binary(opcodes::SUB),
            BinOp::Mul => operands(state)?.binary(opcodes::MUL),
            BinOp::Div => operands(state)?.binary(pick(opcodes::DIV, opcodes::SDIV)),
            BinOp::Mod => operands(state)?.binary(pick(opcodes::MOD, opcodes::SMOD)),
            BinOp::Eq => operands(state)?.binary(opcodes::EQ),
            BinOp::Ne => operands(state)?.binary::<Word>(opcodes::EQ).unary(opcodes::ISZERO),
            BinOp::Lt => operands(state)?.binary(pick(opcodes::LT, opcodes::SLT)),
            BinOp::Gt => operands(state)?.binary(pick(opcodes::GT, opcodes::SGT)),
            BinOp::Le => operands(state)?
                .binary::<Word>(pick(opcodes::GT, opcodes::SGT))
                .unary(opcodes::ISZERO),
            BinOp::Ge => operands(state)?
                .binary::<Word>(pick(opcodes::LT, opcodes::SLT))
                .unary(opcodes::ISZERO),
            BinOp::And => state
                .load::<Word>(right)?
                .unary::<Word>(opcodes::ISZERO)
                .unary::<Rhs>(opcodes::ISZERO)
                .load::<Word>(left)?
                .unary::<Word>(opcodes::ISZERO)
                .unary::<Lhs>(opcodes::ISZERO)
                .binary(opcodes::AND),
            BinOp::Or => operands(state)?
                .binary::<Word>(opcodes::OR)
                .unary::<Word>(opcodes::ISZERO)
                .unary(opcodes::ISZERO),
        };
        Ok(state)
    }
}

/// Converts a word to the representation of `to`, matching constant folding.
fn cast<'a>(value: &'a Value, to: &'a Type) -> impl Transition<Any, (Word, Any)> + 'a {
    move |state: State<Any>| -> Result<State<(Word, Any)>> {
        let mask = |bits: usize| U256::MAX >> (256 - bits);
        Ok(match *to {
            Type::Uint(bits) if bits < 256 => state
                .load::<Rhs>(value)?
                .push::<Lhs>(mask(bits as usize))
                .binary(opcodes::AND),
            Type::Address => state.load::<Rhs>(value)?.push::<Lhs>(mask(160)).binary(opcodes::AND),
            Type::Int(bits) if bits < 256 => state
                .load::<Rhs>(value)?
                .push::<Lhs>(U256::from(bits / 8 - 1))
                .binary(opcodes::SIGNEXTEND),
            Type::Bool => {
                state.load::<Word>(value)?.unary::<Word>(opcodes::ISZERO).unary(opcodes::ISZERO)
            }
            _ => state.load::<Word>(value)?,
        })
    }
}

/// `keccak256` of a single word, hashed in scratch space.
fn hash_word(value: &Value) -> impl Transition<Any, (Word, Any)> + '_ {
    move |state: State<Any>| -> Result<State<(Word, Any)>> {
        Ok(state
            .load::<Word>(value)?
            .push::<Addr>(U256::from(SCRATCH))
            .mstore()
            .push::<Size>(U256::from(32))
            .push::<Addr>(U256::from(SCRATCH))
            .keccak256())
    }
}

fn add_offset(base: &Value, offset: u64) -> impl Transition<Any, (Word, Any)> + '_ {
    move |state: State<Any>| -> Result<State<(Word, Any)>> {
        Ok(state.load::<Rhs>(base)?.push::<Lhs>(U256::from(offset)).binary(opcodes::ADD))
    }
}

/// Returns the names of the functions called by `func`.
fn callees(func: &Function) -> impl Iterator<Item = &str> {
    func.blocks.values().filter_map(|block| match &block.terminator {
        Terminator::Call { function, .. } => Some(function.as_str()),
        Terminator::Jump { .. } | Terminator::Branch { .. } | Terminator::Return { .. } => None,
    })
}

/// Rejects calls to unknown functions and recursive call graphs.
fn check_calls(module: &Module) -> Result<()> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Active,
        Done,
    }

    fn visit(module: &Module, index: usize, marks: &mut [Option<Mark>]) -> Result<()> {
        let Some((name, func)) = module.functions.get_index(index) else { return Ok(()) };
        match marks[index] {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Active) => return Err(EvmgenError::RecursiveCall { function: name.clone() }),
            None => {}
        }
        marks[index] = Some(Mark::Active);
        for callee in callees(func) {
            let Some(callee) = module.functions.get_index_of(callee) else {
                return Err(EvmgenError::UnknownFunction { name: callee.to_string() });
            };
            visit(module, callee, marks)?;
        }
        marks[index] = Some(Mark::Done);
        Ok(())
    }

    for func in module.create.iter().chain(std::iter::once(&module.main)) {
        if let Some(name) = callees(func).find(|name| !module.functions.contains_key(*name)) {
            return Err(EvmgenError::UnknownFunction { name: name.to_string() });
        }
    }
    let mut marks = vec![None; module.functions.len()];
    for index in 0..module.functions.len() {
        visit(module, index, &mut marks)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{evm::serialize::serialize, ir::Param};
    use bugc_config::OptLevel;

    fn compile(src: &str, level: OptLevel) -> Result<Bytecode> {
        let program = bugc_parse::parse_program(src).unwrap();
        let typed = bugc_sema::check(&program).unwrap();
        let module = crate::lower::generate(&program, &typed).unwrap();
        generate(&crate::transform::optimize(&module, level))
    }

    fn empty_function(name: &str, terminator: Terminator) -> Function {
        Function {
            name: name.into(),
            params: vec![],
            entry: BlockId::new(0),
            blocks: std::iter::once((BlockId::new(0), Block::new(BlockId::new(0), terminator)))
                .collect(),
            ret: None,
            ssa_variables: FxHashMap::default(),
        }
    }

    fn module(functions: Vec<Function>, main: Function) -> Module {
        Module {
            name: "Test".into(),
            functions: functions.into_iter().map(|f| (f.name.clone(), f)).collect(),
            create: None,
            main,
            debug: None,
        }
    }

    #[test]
    fn test_storage_write() {
        let code = compile("name S; storage { [0] x: uint256; } code { x = 42; }", OptLevel::O1)
            .unwrap();
        let bytes = serialize(&code.runtime);
        // Free memory pointer, then the entry block.
        assert_eq!(bytes[..6], [0x60, 0x80, 0x60, 0x40, 0x52, 0x5b]);
        assert!(bytes.ends_with(&[opcodes::SSTORE, opcodes::STOP]));
        assert!(code.create.is_none());
    }

    #[test]
    fn test_deployment_trailer() {
        let code = compile("name S; code {}", OptLevel::O0).unwrap();
        let runtime = serialize(&code.runtime);
        let deployment = serialize(&code.deployment());
        let len = runtime.len() as u8;
        assert_eq!(
            deployment[..11],
            [0x61, 0x00, len, 0x80, 0x61, 0x00, 0x0b, 0x5f, 0x39, 0x5f, 0xf3]
        );
        assert_eq!(deployment[11..], runtime[..]);
    }

    #[test]
    fn test_create_appends_runtime() {
        let code = compile(
            "name S; storage { [0] x: uint256; } create { x = 1; } code { x = 2; }",
            OptLevel::O2,
        )
        .unwrap();
        let runtime = serialize(&code.runtime);
        let create = serialize(code.create.as_ref().unwrap());
        assert!(create.ends_with(&runtime));
        assert!(create.contains(&opcodes::CODECOPY));
    }

    #[test]
    fn test_every_level_generates() {
        let src = "name Loop;
            define { function double(a: uint256) -> uint256 { return a + a; }; }
            storage { [0] total: uint256; }
            code {
                let sum = 0;
                for (let i = 0; i < 4; i = i + 1) {
                    if (i == 2) { continue; }
                    sum = sum + double(i);
                }
                total = sum;
            }";
        for level in [OptLevel::O0, OptLevel::O1, OptLevel::O2, OptLevel::O3] {
            let code = compile(src, level).unwrap();
            assert!(!code.runtime.is_empty());
        }
    }

    #[test]
    fn test_recursion_is_rejected() {
        let call = |continuation| Terminator::Call {
            function: "f".into(),
            arguments: vec![],
            dest: None,
            continuation,
        };
        let mut f = empty_function("f", call(BlockId::new(1)));
        f.blocks.insert(
            BlockId::new(1),
            Block::new(BlockId::new(1), Terminator::Return { value: None }),
        );
        let main = empty_function("main", Terminator::Return { value: None });
        let err = generate(&module(vec![f], main)).unwrap_err();
        assert_eq!(err, EvmgenError::RecursiveCall { function: "f".into() });
    }

    #[test]
    fn test_unknown_function() {
        let mut main = empty_function(
            "main",
            Terminator::Call {
                function: "g".into(),
                arguments: vec![],
                dest: None,
                continuation: BlockId::new(1),
            },
        );
        main.blocks.insert(
            BlockId::new(1),
            Block::new(BlockId::new(1), Terminator::Return { value: None }),
        );
        let err = generate(&module(vec![], main)).unwrap_err();
        assert_eq!(err, EvmgenError::UnknownFunction { name: "g".into() });
    }

    #[test]
    fn test_function_frames() {
        let mut f = empty_function("f", Terminator::Return { value: None });
        f.params.push(Param { id: TempId::new(0), name: "a".into(), ty: Type::UINT256 });
        let main = empty_function("main", Terminator::Return { value: None });
        let module = module(vec![f], main);
        let code = generate(&module).unwrap();
        // `f` is never called, so only `main` is laid out.
        assert_eq!(serialize(&code.runtime)[..2], [0x60, 0xc0]);
    }
}
