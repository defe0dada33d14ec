//! XMLBIF 0.3 output.
//!
//! Each family becomes a `DEFINITION` whose `TABLE` lists the tail
//! assignments outer-first, each followed by the conditional over the head:
//! (given..., for...) with the `FOR` variables fastest.

use std::fmt::Write as FmtWrite;

use super::format::{join_values, scientific};
use crate::error::Result;
use crate::model::ModelView;

/// `PROPERTY` value attached to hidden variables.
pub const LATENT_PROPERTY: &str = "latent = true";

/// Render `model` as an XMLBIF document.
pub fn write_xml(model: &dyn ModelView) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "<?xml version=\"1.0\"?>")?;
    writeln!(out, "<BIF VERSION=\"0.3\">")?;
    writeln!(out, "<NETWORK>")?;
    writeln!(out, "\t<NAME>{}</NAME>", escape(model.name()))?;

    for v in model.variables() {
        writeln!(out, "\t<VARIABLE TYPE=\"nature\">")?;
        writeln!(out, "\t\t<NAME>{}</NAME>", escape(&v.display_name()))?;
        for state in v.states() {
            writeln!(out, "\t\t<OUTCOME>{}</OUTCOME>", escape(state))?;
        }
        if v.is_latent() {
            writeln!(out, "\t\t<PROPERTY>{}</PROPERTY>", LATENT_PROPERTY)?;
        }
        writeln!(out, "\t</VARIABLE>")?;
    }

    for family in model.families() {
        writeln!(out, "\t<DEFINITION>")?;
        for v in &family.head {
            writeln!(out, "\t\t<FOR>{}</FOR>", escape(&v.display_name()))?;
        }
        for v in &family.tail {
            writeln!(out, "\t\t<GIVEN>{}</GIVEN>", escape(&v.display_name()))?;
        }
        let table: Vec<f64> = if family.tail.is_empty() {
            family.potential.flat_values()
        } else {
            family
                .conditionals()
                .into_iter()
                .flat_map(|row| row.values)
                .collect()
        };
        writeln!(
            out,
            "\t\t<TABLE>{}</TABLE>",
            join_values(&table, " ", scientific)
        )?;
        writeln!(out, "\t</DEFINITION>")?;
    }

    writeln!(out, "</NETWORK>")?;
    writeln!(out, "</BIF>")?;
    Ok(out)
}

/// Escape the five XML special characters.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
