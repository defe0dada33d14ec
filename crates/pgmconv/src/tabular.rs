//! Line-oriented conversions for evidence, datasets and marginals.

use std::fmt::Write as FmtWrite;

use tracing::info;

use crate::error::{PgmError, Result};
use crate::variable::Registry;

/// Marker for an unobserved value in evidence rows.
pub const UNOBSERVED: &str = "*";

/// Convert comma-separated evidence rows to the UAI evidence format.
///
/// Each non-empty row becomes `<k> <id> <value> ...` listing only the
/// observed columns, preceded by a line with the number of rows.
pub fn ev_to_evid(src: &str) -> Result<String> {
    let rows: Vec<String> = src
        .lines()
        .filter(|l| !l.is_empty())
        .map(|line| {
            let observed: Vec<(usize, &str)> = line
                .split(',')
                .map(str::trim)
                .enumerate()
                .filter(|(_, v)| *v != UNOBSERVED)
                .collect();
            let mut row = observed.len().to_string();
            for (id, value) in observed {
                row.push_str(&format!(" {} {}", id, value));
            }
            row
        })
        .collect();

    let mut out = String::new();
    writeln!(out, "{}", rows.len())?;
    for row in &rows {
        writeln!(out, "{}", row)?;
    }
    info!(rows = rows.len(), "converted evidence");
    Ok(out)
}

/// Prefix ARFF attribute names with `x`, since bare integers are not valid names.
pub const ATTRIBUTE_PREFIX: &str = "x";

/// Prepend an ARFF header built from `schema` to a CSV body.
///
/// Attributes are nominal with states `0..k-1`; the body is copied verbatim.
pub fn csv_to_arff(src: &str, schema: &Registry) -> Result<String> {
    if schema.is_empty() {
        return Err(PgmError::Config(
            "csv2arff needs a schema with at least one variable".to_string(),
        ));
    }
    let mut out = String::new();
    writeln!(out, "@relation data")?;
    for v in schema.iter() {
        let states: Vec<String> = (0..v.cardinality()).map(|s| s.to_string()).collect();
        writeln!(
            out,
            "@attribute {}{} {{{}}}",
            ATTRIBUTE_PREFIX,
            v.display_name(),
            states.join(",")
        )?;
    }
    writeln!(out, "@data")?;
    out.push_str(src);
    Ok(out)
}

/// Convert whitespace-separated marginal rows to the UAI `MAR` format.
///
/// Output is `MAR` then a single line: the row count followed, per row, by
/// its length and its values with seven decimals.
pub fn mo_to_mar(src: &str) -> Result<String> {
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (i, line) in src.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|_| PgmError::parse(i + 1, format!("invalid marginal '{}'", t)))
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    let mut fields = vec![rows.len().to_string()];
    for row in &rows {
        fields.push(row.len().to_string());
        fields.extend(row.iter().map(|v| format!("{:.7}", v)));
    }
    let mut out = String::new();
    writeln!(out, "MAR")?;
    writeln!(out, "{}", fields.join(" "))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::parse_schema;

    #[test]
    fn test_ev_to_evid() {
        let out = ev_to_evid("1,*,0\n\n*,*,*\n2,1,*\n").unwrap();
        assert_eq!(out, "3\n2 0 1 2 0\n0\n2 0 2 1 1\n");
    }

    #[test]
    fn test_csv_to_arff() {
        let schema = parse_schema("a,b\n2,3\n").unwrap();
        let out = csv_to_arff("0,2\n1,0\n", &schema).unwrap();
        assert_eq!(
            out,
            "@relation data\n@attribute xa {0,1}\n@attribute xb {0,1,2}\n@data\n0,2\n1,0\n"
        );
    }

    #[test]
    fn test_csv_to_arff_unnamed_schema() {
        let schema = parse_schema("2,2").unwrap();
        let out = csv_to_arff("", &schema).unwrap();
        assert!(out.contains("@attribute x0 {0,1}\n@attribute x1 {0,1}\n"));
    }

    #[test]
    fn test_csv_to_arff_needs_schema() {
        assert!(matches!(
            csv_to_arff("0\n", &Registry::new()),
            Err(PgmError::Config(_))
        ));
    }

    #[test]
    fn test_mo_to_mar() {
        let out = mo_to_mar("0.25 0.75\n\n1 0 0\n").unwrap();
        assert_eq!(
            out,
            "MAR\n2 2 0.2500000 0.7500000 3 1.0000000 0.0000000 0.0000000\n"
        );
    }

    #[test]
    fn test_mo_to_mar_rejects_garbage() {
        assert!(matches!(
            mo_to_mar("0.5 abc"),
            Err(PgmError::Parse { line: 1, .. })
        ));
    }
}
