//! SSA intermediate representation.
//!
//! A [`Module`] holds the `main` and `create` entry points and the user functions. Functions are
//! made of [`Block`]s, each with its phis, straight-line [`Instruction`]s and exactly one
//! [`Terminator`]. Every [`TempId`] is defined exactly once.

use bugc_data_structures::newtype_index;

mod value;
pub use value::{Constant, DebugContext, Value, ValueKey};

mod inst;
pub use inst::{
    BinOp, EnvOp, InstKind, Instruction, Location, OffsetKind, SlotKind, UnaryOp,
    is_signed_operation,
};

mod block;
pub use block::{Block, Phi, Terminator};

mod function;
pub use function::{Function, Param, SsaVariable};

mod module;
pub use module::Module;

mod display;

newtype_index! {
    /// An SSA temporary, unique within its function.
    pub struct TempId("t");

    /// A basic block, unique within its function.
    pub struct BlockId("bb");
}
