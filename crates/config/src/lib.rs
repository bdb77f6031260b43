//! BUG compiler configuration.
//!
//! Enumerations here are declared with `str_enum!`, which derives their string forms through
//! [`strum`] and (de)serializes them as those strings.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
mod macros;

mod opts;
pub use opts::{OptimizerSettings, Opts};

str_enum! {
    /// Compiler stage, in pipeline order.
    ///
    /// Each stage names the artifact produced by the sequence that stops there.
    #[derive(Default)]
    #[derive(strum::EnumIs)]
    #[strum(serialize_all = "lowercase")]
    pub enum CompilerStage {
        /// Source code was parsed into an AST.
        #[strum(to_string = "ast", serialize = "parsed")]
        Ast,
        /// The AST was type checked and identifiers were bound.
        #[strum(to_string = "types", serialize = "typecheck")]
        Types,
        /// SSA IR was generated and optimized.
        Ir,
        /// EVM bytecode was generated.
        #[default]
        Bytecode,
    }
}

impl CompilerStage {
    /// Returns the stage that runs before `self`, if any.
    pub fn prev(self) -> Option<Self> {
        match self {
            Self::Ast => None,
            Self::Types => Some(Self::Ast),
            Self::Ir => Some(Self::Types),
            Self::Bytecode => Some(Self::Ir),
        }
    }
}

str_enum! {
    /// Optimization level.
    ///
    /// Every level enables a superset of the rewrites of the level below it.
    #[derive(Default)]
    pub enum OptLevel {
        /// No rewrites; the IR is passed through unchanged.
        #[default]
        #[strum(serialize = "0")]
        O0,
        /// Constant folding, dead code elimination, unreachable block pruning.
        #[strum(serialize = "1")]
        O1,
        /// Adds branch folding, trivial phi elimination and block merging.
        #[strum(serialize = "2")]
        O2,
        /// Adds common subexpression and redundant storage read elimination.
        #[strum(serialize = "3")]
        O3,
    }
}

impl OptLevel {
    /// Returns the level for the given number, if it is in `0..=3`.
    pub fn from_u8(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::O0),
            1 => Some(Self::O1),
            2 => Some(Self::O2),
            3 => Some(Self::O3),
            _ => None,
        }
    }

    /// Returns the numeric level.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_stage_order() {
        let stages: Vec<_> = CompilerStage::iter().collect();
        assert_eq!(
            stages,
            [CompilerStage::Ast, CompilerStage::Types, CompilerStage::Ir, CompilerStage::Bytecode]
        );
        assert!(CompilerStage::Ast < CompilerStage::Bytecode);
        assert_eq!(CompilerStage::Ir.prev(), Some(CompilerStage::Types));
        assert_eq!(CompilerStage::Ast.prev(), None);
    }

    #[test]
    fn test_stage_strings() {
        assert_eq!(CompilerStage::from_str("typecheck").unwrap(), CompilerStage::Types);
        assert_eq!(CompilerStage::Bytecode.to_str(), "bytecode");
        assert!(CompilerStage::from_str("hir").is_err());
    }

    #[test]
    fn test_opt_level() {
        for level in OptLevel::iter() {
            assert_eq!(OptLevel::from_u8(level.as_u8()), Some(level));
            assert_eq!(OptLevel::from_str(level.to_str()).unwrap(), level);
        }
        assert_eq!(OptLevel::from_u8(4), None);
        assert_eq!(OptLevel::default(), OptLevel::O0);
    }

    #[test]
    fn test_serde() {
        let level: OptLevel = serde_json::from_str("2").unwrap();
        assert_eq!(level, OptLevel::O2);
        let level: OptLevel = serde_json::from_str("\"3\"").unwrap();
        assert_eq!(level, OptLevel::O3);
        assert!(serde_json::from_str::<OptLevel>("7").is_err());
        assert_eq!(serde_json::to_string(&CompilerStage::Ir).unwrap(), "\"ir\"");
    }
}
