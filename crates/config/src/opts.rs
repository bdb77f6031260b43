//! Compiler options.

use crate::{CompilerStage, OptLevel};
use serde::{Deserialize, Serialize};

/// Optimizer configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Optimization level. Defaults to `0`.
    pub level: OptLevel,
}

impl OptimizerSettings {
    /// Creates settings for the given level.
    pub const fn new(level: OptLevel) -> Self {
        Self { level }
    }
}

/// Options for a single compilation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Opts {
    /// Optimizer settings.
    pub optimizer: OptimizerSettings,
    /// Stop execution after the given compiler stage.
    pub stop_after: Option<CompilerStage>,
}

impl Opts {
    /// Returns the last stage to run.
    pub fn target(&self) -> CompilerStage {
        self.stop_after.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opts_json() {
        let opts: Opts =
            serde_json::from_str(r#"{ "optimizer": { "level": 1 }, "stopAfter": "ir" }"#).unwrap();
        assert_eq!(opts.optimizer.level, OptLevel::O1);
        assert_eq!(opts.target(), CompilerStage::Ir);

        let opts: Opts = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, Opts::default());
        assert_eq!(opts.target(), CompilerStage::Bytecode);
    }
}
