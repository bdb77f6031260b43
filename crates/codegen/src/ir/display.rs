//! Textual IR dumps.

use super::Function;
use std::fmt;

/// Writes a function, one instruction per line.
pub(super) fn write_function(
    f: &mut fmt::Formatter<'_>,
    func: &Function,
    indent: &str,
) -> fmt::Result {
    write!(f, "{indent}function {}(", func.name)?;
    for (i, param) in func.params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}: {} = {}", param.name, param.ty, param.id)?;
    }
    f.write_str(")")?;
    if let Some(ret) = &func.ret {
        write!(f, " -> {ret}")?;
    }
    writeln!(f, " {{")?;

    for (i, block) in func.blocks.values().enumerate() {
        if i > 0 {
            writeln!(f)?;
        }
        let entry = if block.id == func.entry { " (entry)" } else { "" };
        writeln!(f, "{indent}  {}{entry}:", block.id)?;
        for phi in &block.phis {
            writeln!(f, "{indent}    {phi}")?;
        }
        for inst in &block.instructions {
            write!(f, "{indent}    {inst}")?;
            if let Some(name) = inst.debug.as_ref().and_then(|d| d.name.as_deref()) {
                write!(f, "  // {name}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{indent}    {}", block.terminator)?;
    }
    writeln!(f, "{indent}}}")
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_function(f, self, "")
    }
}
