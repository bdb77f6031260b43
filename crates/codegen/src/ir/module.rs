//! IR modules.

use super::{DebugContext, Function};
use bugc_data_structures::map::FxIndexMap;
use std::fmt;

/// A compiled program: the runtime entry point, an optional constructor and the user functions
/// they call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    /// User functions, in definition order.
    pub functions: FxIndexMap<String, Function>,
    /// The `create` block, run once at deployment.
    pub create: Option<Function>,
    /// The `code` block, run on every call.
    pub main: Function,
    pub debug: Option<DebugContext>,
}

impl Module {
    /// Iterates over all functions: `create`, `main`, then user functions.
    pub fn iter_functions(&self) -> impl Iterator<Item = &Function> {
        self.create.iter().chain(std::iter::once(&self.main)).chain(self.functions.values())
    }

    /// Iterates mutably over all functions.
    pub fn iter_functions_mut(&mut self) -> impl Iterator<Item = &mut Function> {
        self.create
            .iter_mut()
            .chain(std::iter::once(&mut self.main))
            .chain(self.functions.values_mut())
    }

    /// Returns the total number of instructions, counting phis and terminators.
    pub fn instruction_count(&self) -> usize {
        self.iter_functions().map(Function::instruction_count).sum()
    }

    /// Verifies every function.
    pub fn verify(&self) -> Result<(), String> {
        for func in self.iter_functions() {
            func.verify().map_err(|e| format!("in `{}`: {e}", func.name))?;
        }
        Ok(())
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "module {} {{", self.name)?;
        for func in self.iter_functions() {
            writeln!(f)?;
            super::display::write_function(f, func, "    ")?;
        }
        f.write_str("}")
    }
}
