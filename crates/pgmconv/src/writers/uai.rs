//! UAI Markov network output.

use std::fmt::Write as FmtWrite;

use serde::{Deserialize, Serialize};

use crate::error::{PgmError, Result};
use crate::model::ModelView;

/// Options for the UAI writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UaiOptions {
    /// Replaces exact 0.0 entries by `smoothing` and exact 1.0 entries by
    /// `1.0 - smoothing`; 0 disables. Tables are not renormalized.
    pub smoothing: f64,
}

impl UaiOptions {
    pub fn with_smoothing(smoothing: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&smoothing) {
            return Err(PgmError::Config(format!(
                "smoothing must be in [0, 1), got {}",
                smoothing
            )));
        }
        Ok(Self { smoothing })
    }

    fn smooth(&self, value: f64) -> f64 {
        if value == 1.0 {
            value - self.smoothing
        } else if value == 0.0 {
            value + self.smoothing
        } else {
            value
        }
    }
}

/// Render `model` as a UAI `MARKOV` file with one factor per family.
///
/// Variables are listed by id; factor scopes and tables are in canonical
/// order, last variable fastest.
pub fn write_uai(model: &dyn ModelView, options: UaiOptions) -> Result<String> {
    let mut vars = model.variables();
    vars.sort_by_key(|v| v.id());
    let families = model.families();

    let mut out = String::new();
    writeln!(out, "MARKOV")?;
    writeln!(out, "{}", vars.len())?;
    let cards: Vec<String> = vars.iter().map(|v| v.cardinality().to_string()).collect();
    writeln!(out, "{}", cards.join(" "))?;
    writeln!(out, "{}", families.len())?;
    for family in &families {
        let ids: Vec<String> = family
            .potential
            .ids()
            .iter()
            .map(|id| id.to_string())
            .collect();
        writeln!(out, "{}\t{}", ids.len(), ids.join(" "))?;
    }
    writeln!(out)?;

    for family in &families {
        let values = family.potential.flat_values();
        writeln!(out, "{}", values.len())?;
        let rendered: Vec<String> = values
            .iter()
            .map(|&v| options.smooth(v).to_string())
            .collect();
        writeln!(out, "{}", rendered.join(" "))?;
        writeln!(out)?;
    }
    Ok(out)
}
