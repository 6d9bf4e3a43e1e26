use thiserror::Error;

pub type WwResult<T> = Result<T, WwError>;

/// Errors raised by values, keys and tank functions.
///
/// `Value` is the error every tank raises when an input is absent or falls
/// outside the tank's domain (dtype mismatch, shapes its broadcasting rule
/// cannot reconcile, integer overflow).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WwError {
    #[error("Value error: {what}")]
    Value { what: String },

    #[error("Tank {tank} broke its contract: {what}")]
    Contract { tank: String, what: String },

    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("Invalid signature: {what}")]
    InvalidSignature { what: String },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}

impl WwError {
    /// Shorthand for a `Value` error.
    pub fn value(what: impl Into<String>) -> Self {
        Self::Value { what: what.into() }
    }
}
