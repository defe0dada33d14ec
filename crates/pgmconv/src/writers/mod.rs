//! Text writers, one per target format.
//!
//! Writers are read-only over a [`ModelView`](crate::model::ModelView); any
//! conditional they need is derived on a copy of the potential.

pub mod bif;
pub mod fg;
pub mod format;
pub mod uai;
pub mod xml;

pub use bif::write_bif;
pub use fg::write_fg;
pub use uai::{write_uai, UaiOptions};
pub use xml::write_xml;
