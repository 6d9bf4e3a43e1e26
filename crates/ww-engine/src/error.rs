//! Error types for pour and pump.

use thiserror::Error;
use ww_core::{PortKey, WwError};

/// Errors that abort a whole pour or pump call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("No value for funnel {key}: it was left unset at build time and not supplied")]
    MissingInput { key: PortKey },

    #[error(transparent)]
    Value(#[from] WwError),

    #[error("Cannot pump: {what}")]
    Reversal { what: String },

    #[error("Unknown port {key}")]
    UnknownKey { key: String },

    #[error("{key} is not a funnel")]
    NotAFunnel { key: String },
}

pub type FlowResult<T> = Result<T, FlowError>;
