//! EVM backend: stack scheduling, memory planning, assembly and serialization.

mod assembler;
pub use assembler::{Assembler, Instruction, Label};

mod error;
pub use error::EvmgenError;

mod generator;
pub use generator::{Bytecode, generate};

pub mod memory;
pub mod opcodes;

mod serialize;
pub use serialize::{calculate_size, disassemble, instruction_size, serialize};

pub mod state;
