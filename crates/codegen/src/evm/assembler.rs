//! Instruction stream assembly with label resolution.
//!
//! Every label reference is a fixed-width `PUSH2`, so offsets are known after a single layout pass
//! and references are patched in a second one.

use super::{EvmgenError, opcodes, serialize};
use alloy_primitives::U256;
use bugc_data_structures::map::FxHashMap;
use std::fmt;

/// A machine instruction: an opcode and its immediate bytes, if any.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub opcode: u8,
    pub immediates: Option<Vec<u8>>,
}

impl Instruction {
    /// Creates an instruction without immediates.
    pub const fn op(opcode: u8) -> Self {
        Self { opcode, immediates: None }
    }

    /// Creates the shortest push of `value`, `PUSH0` for zero.
    pub fn push(value: U256) -> Self {
        let bytes = value.to_be_bytes_trimmed_vec();
        if bytes.is_empty() {
            return Self::op(opcodes::PUSH0);
        }
        Self { opcode: opcodes::push(bytes.len() as u8), immediates: Some(bytes) }
    }

    /// Creates a `PUSH2` of `value`.
    pub fn push2(value: u16) -> Self {
        Self { opcode: opcodes::push(2), immediates: Some(value.to_be_bytes().to_vec()) }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opcode = self.opcode;
        match opcode {
            opcodes::PUSH0..=opcodes::PUSH32 => write!(f, "PUSH{}", opcode - opcodes::PUSH0)?,
            opcodes::DUP1..=opcodes::DUP16 => write!(f, "DUP{}", opcode - opcodes::DUP1 + 1)?,
            opcodes::SWAP1..=opcodes::SWAP16 => write!(f, "SWAP{}", opcode - opcodes::SWAP1 + 1)?,
            _ => match opcodes::name(opcode) {
                Some(name) => f.write_str(name)?,
                None => write!(f, "UNKNOWN(0x{opcode:02x})")?,
            },
        }
        if let Some(immediates) = &self.immediates {
            f.write_str(" 0x")?;
            for byte in immediates {
                write!(f, "{byte:02x}")?;
            }
        }
        Ok(())
    }
}

/// A jump target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Label(pub u32);

#[derive(Clone, Debug)]
enum AsmInst {
    Inst(Instruction),
    /// A `PUSH2` of the label's offset.
    PushLabel(Label),
    /// Marks a position; emits nothing.
    Label(Label),
}

/// Collects instructions and label references for one code object.
#[derive(Debug, Default)]
pub struct Assembler {
    code: Vec<AsmInst>,
    next_label: u32,
}

impl Assembler {
    /// Creates a new assembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new label.
    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    pub fn emit(&mut self, inst: Instruction) {
        self.code.push(AsmInst::Inst(inst));
    }

    /// Emits an opcode without immediates.
    pub fn emit_op(&mut self, opcode: u8) {
        self.emit(Instruction::op(opcode));
    }

    /// Emits the shortest push of `value`.
    pub fn emit_push(&mut self, value: U256) {
        self.emit(Instruction::push(value));
    }

    /// Emits a push that will be resolved to a label's offset.
    pub fn emit_push_label(&mut self, label: Label) {
        self.code.push(AsmInst::PushLabel(label));
    }

    /// Defines a label at the current position.
    pub fn define_label(&mut self, label: Label) {
        self.code.push(AsmInst::Label(label));
    }

    /// Returns the number of instructions emitted so far.
    pub fn len(&self) -> usize {
        self.code.iter().filter(|inst| !matches!(inst, AsmInst::Label(_))).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lays out the code and patches every label reference.
    pub fn finish(self) -> Result<Vec<Instruction>, EvmgenError> {
        let mut offsets = FxHashMap::default();
        let mut offset = 0;
        for inst in &self.code {
            match inst {
                AsmInst::Inst(inst) => offset += serialize::instruction_size(inst),
                AsmInst::PushLabel(_) => offset += 3,
                AsmInst::Label(label) => {
                    offsets.insert(*label, offset);
                }
            }
        }
        if offset > usize::from(u16::MAX) {
            return Err(EvmgenError::CodeTooLarge { size: offset });
        }

        let mut out = Vec::with_capacity(self.code.len());
        for inst in self.code {
            match inst {
                AsmInst::Inst(inst) => out.push(inst),
                AsmInst::PushLabel(label) => {
                    let target = offsets.get(&label).copied().ok_or_else(|| {
                        EvmgenError::internal(format!("label {} is never defined", label.0))
                    })?;
                    // Bounded by the total size checked above.
                    out.push(Instruction::push2(target as u16));
                }
                AsmInst::Label(_) => {}
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evm::serialize::serialize;

    #[test]
    fn test_push_width() {
        assert_eq!(Instruction::push(U256::ZERO), Instruction::op(opcodes::PUSH0));
        assert_eq!(Instruction::push(U256::from(255)).immediates, Some(vec![0xff]));
        assert_eq!(Instruction::push(U256::from(256)).immediates, Some(vec![0x01, 0x00]));
        assert_eq!(Instruction::push(U256::MAX).opcode, opcodes::PUSH32);
    }

    #[test]
    fn test_simple_assembly() {
        let mut asm = Assembler::new();
        asm.emit_push(U256::from(42));
        asm.emit_push(U256::from(10));
        asm.emit_op(opcodes::ADD);
        asm.emit_op(opcodes::STOP);
        let code = asm.finish().unwrap();
        assert_eq!(serialize(&code), [0x60, 42, 0x60, 10, 0x01, 0x00]);
    }

    #[test]
    fn test_label_resolution() {
        let mut asm = Assembler::new();
        let start = asm.new_label();
        let end = asm.new_label();

        asm.define_label(start);
        asm.emit_op(opcodes::JUMPDEST);
        asm.emit_push(U256::from(1));
        asm.emit_push_label(end);
        asm.emit_op(opcodes::JUMPI);
        asm.emit_push_label(start);
        asm.emit_op(opcodes::JUMP);
        asm.define_label(end);
        asm.emit_op(opcodes::JUMPDEST);
        asm.emit_op(opcodes::STOP);

        let code = asm.finish().unwrap();
        assert_eq!(
            serialize(&code),
            [0x5b, 0x60, 0x01, 0x61, 0x00, 0x0b, 0x57, 0x61, 0x00, 0x00, 0x56, 0x5b, 0x00]
        );
    }

    #[test]
    fn test_undefined_label() {
        let mut asm = Assembler::new();
        let label = asm.new_label();
        asm.emit_push_label(label);
        assert!(matches!(asm.finish(), Err(EvmgenError::Internal { .. })));
    }

    #[test]
    fn test_display() {
        assert_eq!(Instruction::push2(0x1234).to_string(), "PUSH2 0x1234");
        assert_eq!(Instruction::op(opcodes::dup(3)).to_string(), "DUP3");
        assert_eq!(Instruction::op(opcodes::SSTORE).to_string(), "SSTORE");
    }
}
