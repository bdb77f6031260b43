//! EVM opcodes used by the code generator.

pub const STOP: u8 = 0x00;
pub const ADD: u8 = 0x01;
pub const MUL: u8 = 0x02;
pub const SUB: u8 = 0x03;
pub const DIV: u8 = 0x04;
pub const SDIV: u8 = 0x05;
pub const MOD: u8 = 0x06;
pub const SMOD: u8 = 0x07;
pub const SIGNEXTEND: u8 = 0x0b;

pub const LT: u8 = 0x10;
pub const GT: u8 = 0x11;
pub const SLT: u8 = 0x12;
pub const SGT: u8 = 0x13;
pub const EQ: u8 = 0x14;
pub const ISZERO: u8 = 0x15;
pub const AND: u8 = 0x16;
pub const OR: u8 = 0x17;

pub const KECCAK256: u8 = 0x20;

pub const CALLER: u8 = 0x33;
pub const CALLVALUE: u8 = 0x34;
pub const CALLDATALOAD: u8 = 0x35;
pub const CALLDATASIZE: u8 = 0x36;
pub const CODECOPY: u8 = 0x39;

pub const TIMESTAMP: u8 = 0x42;
pub const NUMBER: u8 = 0x43;

pub const POP: u8 = 0x50;
pub const MLOAD: u8 = 0x51;
pub const MSTORE: u8 = 0x52;
pub const SLOAD: u8 = 0x54;
pub const SSTORE: u8 = 0x55;
pub const JUMP: u8 = 0x56;
pub const JUMPI: u8 = 0x57;
pub const JUMPDEST: u8 = 0x5b;
pub const PUSH0: u8 = 0x5f;
pub const PUSH1: u8 = 0x60;
pub const PUSH32: u8 = 0x7f;

pub const DUP1: u8 = 0x80;
pub const DUP16: u8 = 0x8f;
pub const SWAP1: u8 = 0x90;
pub const SWAP16: u8 = 0x9f;

pub const RETURN: u8 = 0xf3;
pub const REVERT: u8 = 0xfd;
pub const INVALID: u8 = 0xfe;

/// Returns the `PUSHn` opcode for an immediate of `n` bytes (0-32).
#[must_use]
pub const fn push(n: u8) -> u8 {
    debug_assert!(n <= 32);
    PUSH0 + n
}

/// Returns the DUP opcode for the given depth (1-16).
#[must_use]
pub const fn dup(n: u8) -> u8 {
    debug_assert!(n >= 1 && n <= 16);
    DUP1 + n - 1
}

/// Returns the SWAP opcode for the given depth (1-16).
#[must_use]
pub const fn swap(n: u8) -> u8 {
    debug_assert!(n >= 1 && n <= 16);
    SWAP1 + n - 1
}

/// Returns the number of immediate bytes following `opcode`.
#[must_use]
pub const fn immediate_size(opcode: u8) -> usize {
    match opcode {
        PUSH1..=PUSH32 => (opcode - PUSH0) as usize,
        _ => 0,
    }
}

/// Returns the mnemonic of an opcode the generator emits, without the numeric suffix of
/// `PUSH`, `DUP` and `SWAP`.
#[must_use]
pub const fn name(opcode: u8) -> Option<&'static str> {
    Some(match opcode {
        STOP => "STOP",
        ADD => "ADD",
        MUL => "MUL",
        SUB => "SUB",
        DIV => "DIV",
        SDIV => "SDIV",
        MOD => "MOD",
        SMOD => "SMOD",
        SIGNEXTEND => "SIGNEXTEND",
        LT => "LT",
        GT => "GT",
        SLT => "SLT",
        SGT => "SGT",
        EQ => "EQ",
        ISZERO => "ISZERO",
        AND => "AND",
        OR => "OR",
        KECCAK256 => "KECCAK256",
        CALLER => "CALLER",
        CALLVALUE => "CALLVALUE",
        CALLDATALOAD => "CALLDATALOAD",
        CALLDATASIZE => "CALLDATASIZE",
        CODECOPY => "CODECOPY",
        TIMESTAMP => "TIMESTAMP",
        NUMBER => "NUMBER",
        POP => "POP",
        MLOAD => "MLOAD",
        MSTORE => "MSTORE",
        SLOAD => "SLOAD",
        SSTORE => "SSTORE",
        JUMP => "JUMP",
        JUMPI => "JUMPI",
        JUMPDEST => "JUMPDEST",
        PUSH0..=PUSH32 => "PUSH",
        DUP1..=DUP16 => "DUP",
        SWAP1..=SWAP16 => "SWAP",
        RETURN => "RETURN",
        REVERT => "REVERT",
        INVALID => "INVALID",
        _ => return None,
    })
}
