//! Device construction error taxonomy.
//!
//! Construction is the sole source of semantic validation (§6): components
//! reject invalid parameters here, never during stamping.

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum Error {
    #[error("invalid value for {component}.{field}: {reason}")]
    InvalidValue {
        component: String,
        field: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn invalid(component: &str, field: &str, reason: impl Into<String>) -> Error {
    Error::InvalidValue {
        component: component.to_string(),
        field: field.to_string(),
        reason: reason.into(),
    }
}
