//! Conversion options and the closed set of supported conversions.
//!
//! Options can be loaded from a TOML file; every field has a default:
//!
//! ```toml
//! network_name = "unknown"
//! smoothing = 0.0
//! latent_marker = "variable"
//! normalization_tolerance = 1e-6
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{PgmError, Result};
use crate::ltm::LATENT_MARKER;
use crate::model::DEFAULT_NETWORK_NAME;
use crate::writers::UaiOptions;

/// Options shared by every conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Name written in headers of synthesized networks
    pub network_name: String,

    /// UAI smoothing of deterministic entries, in [0, 1)
    pub smoothing: f64,

    /// Name substring marking hidden variables in latent-tree input
    pub latent_marker: String,

    /// Allowed deviation from 1 before a conditional is reported
    pub normalization_tolerance: f64,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            network_name: DEFAULT_NETWORK_NAME.to_string(),
            smoothing: 0.0,
            latent_marker: LATENT_MARKER.to_string(),
            normalization_tolerance: 1e-6,
        }
    }
}

impl ConvertOptions {
    /// Parse options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: Self =
            toml::from_str(text).map_err(|e| PgmError::Config(format!("invalid TOML: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PgmError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(PgmError::Config(format!(
                "smoothing must be in [0, 1), got {}",
                self.smoothing
            )));
        }
        if self.normalization_tolerance.is_nan() || self.normalization_tolerance < 0.0 {
            return Err(PgmError::Config(format!(
                "normalization_tolerance must be non-negative, got {}",
                self.normalization_tolerance
            )));
        }
        if self.latent_marker.is_empty() {
            return Err(PgmError::Config("latent_marker must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn uai(&self) -> Result<UaiOptions> {
        UaiOptions::with_smoothing(self.smoothing)
    }
}

/// A supported conversion, resolved once from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    /// Latent-tree BIF to hierarchical BIF
    Bi2Bif,
    /// Latent-tree BIF to XMLBIF
    Bi2Xml,
    /// XMLBIF to BIF
    Xml2Bif,
    /// BIF to libDAI factor graph
    Bif2Fg,
    /// BIF to UAI Markov network
    Bif2Uai,
    /// CSV evidence to UAI evidence
    Ev2Evid,
    /// CSV dataset to ARFF
    Csv2Arff,
    /// Marginal rows to UAI MAR
    Mo2Mar,
}

impl ConversionKind {
    pub const ALL: [ConversionKind; 8] = [
        ConversionKind::Bi2Bif,
        ConversionKind::Bi2Xml,
        ConversionKind::Xml2Bif,
        ConversionKind::Bif2Fg,
        ConversionKind::Bif2Uai,
        ConversionKind::Ev2Evid,
        ConversionKind::Csv2Arff,
        ConversionKind::Mo2Mar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionKind::Bi2Bif => "bi2bif",
            ConversionKind::Bi2Xml => "bi2xml",
            ConversionKind::Xml2Bif => "xml2bif",
            ConversionKind::Bif2Fg => "bif2fg",
            ConversionKind::Bif2Uai => "bif2uai",
            ConversionKind::Ev2Evid => "ev2evid",
            ConversionKind::Csv2Arff => "csv2arff",
            ConversionKind::Mo2Mar => "mo2mar",
        }
    }

    /// True when the conversion cannot run without a schema.
    pub fn requires_schema(&self) -> bool {
        matches!(self, ConversionKind::Csv2Arff)
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionKind {
    type Err = PgmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                PgmError::UnsupportedConversion(format!("{} (expected one of {})", s, known.join("|")))
            })
    }
}
