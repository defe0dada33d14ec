//! Conversion entry point: text in, text out.

use tracing::{info, info_span};

use crate::bif::parse_bif;
use crate::clique_tree::CliqueTree;
use crate::config::{ConversionKind, ConvertOptions};
use crate::error::{PgmError, Result};
use crate::inspect::inspect_normalization;
use crate::ltm::LtmParser;
use crate::tabular::{csv_to_arff, ev_to_evid, mo_to_mar};
use crate::variable::{parse_schema, Registry};
use crate::writers::{write_bif, write_fg, write_uai, write_xml};
use crate::xmlbif::parse_xmlbif;

/// Run one conversion over in-memory text.
///
/// `schema` is the optional comma-separated header; it seeds the registry of
/// latent-tree conversions and is required by `csv2arff`.
pub fn convert(
    kind: ConversionKind,
    input: &str,
    schema: Option<&str>,
    options: &ConvertOptions,
) -> Result<String> {
    let _span = info_span!("convert", kind = kind.as_str()).entered();
    options.validate()?;
    let mut registry = match schema {
        Some(text) => parse_schema(text)?,
        None => Registry::new(),
    };
    if kind.requires_schema() && registry.is_empty() {
        return Err(PgmError::Config(format!("{} needs a schema", kind)));
    }

    let output = match kind {
        ConversionKind::Bi2Bif | ConversionKind::Bi2Xml => {
            let tree = build_tree(input, &mut registry, options)?;
            inspect_normalization(&tree, options.normalization_tolerance);
            if kind == ConversionKind::Bi2Bif {
                write_bif(&tree)?
            } else {
                write_xml(&tree)?
            }
        }
        ConversionKind::Xml2Bif => write_bif(&parse_xmlbif(input)?)?,
        ConversionKind::Bif2Fg => write_fg(&parse_bif(input)?)?,
        ConversionKind::Bif2Uai => write_uai(&parse_bif(input)?, options.uai()?)?,
        ConversionKind::Ev2Evid => ev_to_evid(input)?,
        ConversionKind::Csv2Arff => csv_to_arff(input, &registry)?,
        ConversionKind::Mo2Mar => mo_to_mar(input)?,
    };
    info!(bytes = output.len(), "conversion finished");
    Ok(output)
}

/// Parse a latent-tree model and arrange its factors into a clique tree.
pub fn build_tree(
    input: &str,
    registry: &mut Registry,
    options: &ConvertOptions,
) -> Result<CliqueTree> {
    let factors = LtmParser::new(registry)
        .with_latent_marker(options.latent_marker.as_str())
        .parse(input)?;
    Ok(CliqueTree::build(factors)?.with_name(options.network_name.as_str()))
}
