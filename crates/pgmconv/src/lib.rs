//! # pgmconv
//!
//! **Conversion between text encodings of discrete probabilistic graphical models**
//!
//! The crate reads a constrained latent-tree BIF dialect, standard BIF and
//! XMLBIF, and writes hierarchical BIF, XMLBIF, UAI Markov networks and libDAI
//! factor graphs. When the source has no explicit hierarchy, the factors are
//! arranged into a rooted clique tree first.
//!
//! ## Pipeline
//!
//! ```text
//! latent-tree text ─▶ LtmParser ─▶ Vec<Factor> ─▶ CliqueTree ─┐
//! BIF text        ─▶ parse_bif ──────────────▶ BayesNet ──────┼─▶ ModelView ─▶ writers
//! XMLBIF text     ─▶ parse_xmlbif ───────────▶ BayesNet ──────┘
//! ```
//!
//! ## Orderings
//!
//! Three variable orderings meet in every conversion: the order a table was
//! declared in, canonical order (ascending [`Variable::id`]) in which every
//! [`Factor`] stores its values, and each writer's output order. Flat arrays
//! are always row-major (last variable fastest); [`Index`] and [`permute`]
//! move values between orderings.
//!
//! ## Example
//!
//! ```
//! use pgmconv::{convert, ConversionKind, ConvertOptions};
//!
//! let model = r#"
//! variable "x" { type discrete[2] {"s0" "s1"}; }
//! probability ( "x" ) { table 0.25 0.75 ; }
//! "#;
//! let bif = convert(ConversionKind::Bi2Bif, model, None, &ConvertOptions::default()).unwrap();
//! assert!(bif.contains("table 2.5E-01, 7.5E-01;"));
//! ```

pub mod bif;
pub mod clique_tree;
pub mod config;
pub mod convert;
pub mod error;
pub mod factor;
pub mod index;
pub mod inspect;
pub mod logging;
pub mod ltm;
pub mod model;
pub mod tabular;
pub mod token;
pub mod variable;
pub mod writers;
pub mod xmlbif;

pub use bif::{parse_bif, BayesNet, TableLayout};
pub use clique_tree::{CliqueNode, CliqueTree, NodeId};
pub use config::{ConversionKind, ConvertOptions};
pub use convert::{build_tree, convert};
pub use error::{PgmError, Result};
pub use factor::Factor;
pub use index::{permute, Index};
pub use inspect::{inspect_normalization, NormalizationIssue};
pub use ltm::{parse_ltm, LtmParser};
pub use model::{ConditionalRow, Family, ModelView};
pub use tabular::{csv_to_arff, ev_to_evid, mo_to_mar};
pub use variable::{parse_schema, Registry, Variable};
pub use writers::{write_bif, write_fg, write_uai, write_xml, UaiOptions};
pub use xmlbif::parse_xmlbif;
