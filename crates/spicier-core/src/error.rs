//! Core error taxonomy.

/// Errors produced by the linear-algebra substrate and the MNA assembler.
///
/// Component-construction errors (`ParseError`/`InvalidValue`) are raised
/// eagerly at device construction time, never during stamping — see §6/§7.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum Error {
    #[error("matrix/vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("singular matrix: pivot magnitude below threshold at column {0}")]
    SingularMatrix(usize),

    #[error("invalid value for {component}.{field}: {reason}")]
    InvalidValue {
        component: String,
        field: String,
        reason: String,
    },

    #[error("duplicate node definition: {0}")]
    DuplicateNode(String),
}

pub type Result<T> = std::result::Result<T, Error>;
