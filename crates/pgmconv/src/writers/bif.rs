//! Hierarchical BIF output.

use std::fmt::Write as FmtWrite;

use super::format::{join_values, scientific};
use crate::error::Result;
use crate::model::ModelView;
use crate::variable::Variable;

/// Render `model` as BIF.
///
/// ```text
/// network unknown {}
/// variable x {
///   type discrete [ 2 ] { 0, 1 };
/// }
/// probability ( y | x ) {
///   (0) 2E-01, 8E-01;
///   (1) 5E-01, 5E-01;
/// }
/// ```
pub fn write_bif(model: &dyn ModelView) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "network {} {{}}", model.name())?;

    for v in model.variables() {
        writeln!(out, "variable {} {{", v.display_name())?;
        writeln!(
            out,
            "  type discrete [ {} ] {{ {} }};",
            v.cardinality(),
            v.states().join(", ")
        )?;
        writeln!(out, "}}")?;
    }

    for family in model.families() {
        if family.tail.is_empty() {
            writeln!(out, "probability ( {} ) {{", names(&family.head))?;
            let values = family.potential.flat_values();
            writeln!(out, "  table {};", join_values(&values, ", ", scientific))?;
        } else {
            writeln!(
                out,
                "probability ( {} | {} ) {{",
                names(&family.head),
                names(&family.tail)
            )?;
            for row in family.conditionals() {
                let labels: Vec<String> = family
                    .tail
                    .iter()
                    .zip(&row.tail_states)
                    .map(|(v, &s)| v.state_label(s))
                    .collect();
                writeln!(
                    out,
                    "  ({}) {};",
                    labels.join(", "),
                    join_values(&row.values, ", ", scientific)
                )?;
            }
        }
        writeln!(out, "}}")?;
    }
    Ok(out)
}

fn names(vars: &[&Variable]) -> String {
    vars.iter()
        .map(|v| v.display_name())
        .collect::<Vec<_>>()
        .join(", ")
}
