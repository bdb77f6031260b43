//! Instruction stream serialization.

use super::Instruction;
use std::fmt::Write;

/// Returns the encoded size of an instruction in bytes.
#[inline]
pub fn instruction_size(inst: &Instruction) -> usize {
    1 + inst.immediates.as_ref().map_or(0, Vec::len)
}

/// Returns the encoded size of an instruction stream in bytes.
pub fn calculate_size(instructions: &[Instruction]) -> usize {
    instructions.iter().map(instruction_size).sum()
}

/// Encodes an instruction stream as raw bytecode.
pub fn serialize(instructions: &[Instruction]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(calculate_size(instructions));
    for inst in instructions {
        bytes.push(inst.opcode);
        if let Some(immediates) = &inst.immediates {
            bytes.extend_from_slice(immediates);
        }
    }
    debug_assert_eq!(bytes.len(), calculate_size(instructions));
    bytes
}

/// Renders an instruction stream one instruction per line, prefixed with its byte offset.
pub fn disassemble(instructions: &[Instruction]) -> String {
    let mut out = String::new();
    let mut offset = 0;
    for inst in instructions {
        let _ = writeln!(out, "{offset:04x}: {inst}");
        offset += instruction_size(inst);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evm::opcodes;
    use alloy_primitives::U256;
    use proptest::prelude::*;

    fn arb_instruction() -> impl Strategy<Value = Instruction> {
        (any::<u8>(), proptest::option::of(proptest::collection::vec(any::<u8>(), 0..=32)))
            .prop_map(|(opcode, immediates)| Instruction { opcode, immediates })
    }

    proptest! {
        #[test]
        fn size_matches_serialization(
            instructions in proptest::collection::vec(arb_instruction(), 0..64)
        ) {
            prop_assert_eq!(calculate_size(&instructions), serialize(&instructions).len());
        }
    }

    #[test]
    fn test_disassemble() {
        let code = [
            Instruction::push(U256::from(0x2a)),
            Instruction::op(opcodes::PUSH0),
            Instruction::op(opcodes::SSTORE),
            Instruction::op(opcodes::STOP),
        ];
        assert_eq!(serialize(&code), [0x60, 0x2a, 0x5f, 0x55, 0x00]);
        assert_eq!(
            disassemble(&code),
            "0000: PUSH1 0x2a\n0002: PUSH0\n0003: SSTORE\n0004: STOP\n"
        );
    }
}
