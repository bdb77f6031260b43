//! Type checking.

use crate::Type;
use bugc_ast::{NodeId, Program};
use bugc_data_structures::map::FxHashMap;
use bugc_interface::{Diagnostic, Diagnostics};

mod checker;
use checker::TypeChecker;

/// The type of every expression and declaration, keyed by node ID.
///
/// Function definitions map to their return type, if any.
pub type TypeMap = FxHashMap<NodeId, Type>;

/// Maps each identifier use (and each call's callee) to the ID of the declaration it refers to.
pub type Bindings = FxHashMap<NodeId, NodeId>;

/// The result of a successful type check.
#[derive(Clone, Debug, Default)]
pub struct Typed {
    pub types: TypeMap,
    pub bindings: Bindings,
    /// Non-fatal diagnostics, such as shadowed variables.
    pub warnings: Vec<Diagnostic>,
}

impl Typed {
    /// Returns the type of the given node.
    #[inline]
    pub fn type_of(&self, id: NodeId) -> Option<&Type> {
        self.types.get(&id)
    }

    /// Returns the declaration a use refers to.
    #[inline]
    pub fn binding(&self, id: NodeId) -> Option<NodeId> {
        self.bindings.get(&id).copied()
    }
}

/// Type checks a program.
///
/// All errors found are reported together, followed by the warnings collected so far.
#[instrument(level = "debug", skip_all)]
pub fn check(program: &Program) -> Result<Typed, Diagnostics> {
    TypeChecker::new(program).check_program()
}
