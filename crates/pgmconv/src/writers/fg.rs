//! libDAI factor-graph output.

use std::fmt::Write as FmtWrite;

use crate::error::Result;
use crate::model::ModelView;

/// Render `model` in the `.fg` format.
///
/// ```text
/// <variable count>
///
/// <scope size>
/// <ids...>
/// <cardinalities...>
/// <value count>
/// <offset>\t<value>
/// ...
/// ```
///
/// One factor block follows per family. Values are listed in canonical order.
pub fn write_fg(model: &dyn ModelView) -> Result<String> {
    let families = model.families();
    let mut out = String::new();
    writeln!(out, "{}", model.variables().len())?;
    writeln!(out)?;

    for family in &families {
        let scope = family.potential.variables();
        let ids: Vec<String> = scope.iter().map(|v| v.id().to_string()).collect();
        let cards: Vec<String> = scope.iter().map(|v| v.cardinality().to_string()).collect();
        writeln!(out, "{}", scope.len())?;
        writeln!(out, "{}", ids.join(" "))?;
        writeln!(out, "{}", cards.join(" "))?;

        let values = family.potential.flat_values();
        writeln!(out, "{}", values.len())?;
        for (i, v) in values.iter().enumerate() {
            writeln!(out, "{}\t{}", i, v)?;
        }
        writeln!(out)?;
    }
    Ok(out)
}
