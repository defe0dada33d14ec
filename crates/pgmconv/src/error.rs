//! Error types for model conversion.

use thiserror::Error;

/// Errors that can occur while parsing, building or writing a model.
#[derive(Error, Debug)]
pub enum PgmError {
    /// Malformed token stream
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    /// Token stream ended in the middle of a block
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
    /// Two variables declared with the same non-empty name
    #[error("Variable declared twice: {0}")]
    DuplicateVariable(String),
    /// Probability block references a variable that was never declared
    #[error("Variable not found: {0}")]
    UnknownVariable(String),
    /// Latent-tree probability blocks admit at most one parent
    #[error("Probability block for {child} has {parents} parents, at most one is supported")]
    TooManyParents { child: String, parents: usize },
    /// Declared state labels disagree with the bracketed cardinality
    #[error("Variable {name} declares {declared} states but lists {labels} labels")]
    StateCountMismatch {
        name: String,
        declared: usize,
        labels: usize,
    },
    /// Value array length does not match the scope's cardinality product
    #[error("Dimension mismatch: expected {expected} values, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    /// Negative or non-finite potential value
    #[error("Invalid potential value {value}")]
    InvalidValue { value: f64 },
    /// Nothing to build a tree from
    #[error("Model has no factors")]
    EmptyModel,
    /// Some factors share no variable with any attached node
    #[error("{unreachable} factors cannot be attached to the clique tree ({attached} attached)")]
    UnreachableFactors { attached: usize, unreachable: usize },
    /// An index addresses a variable it does not enumerate
    #[error("Index addresses variable {0} which is not enumerated")]
    IndexMismatch(usize),
    /// Malformed XMLBIF document
    #[error("XML error: {message}")]
    Xml { message: String },
    /// Invalid conversion options
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// Conversion kind name not in the strategy table
    #[error("Unsupported conversion: {0}")]
    UnsupportedConversion(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl PgmError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn xml(message: impl Into<String>) -> Self {
        Self::Xml {
            message: message.into(),
        }
    }
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, PgmError>;
