//! Graph construction errors.

use thiserror::Error;
use ww_core::{PortKey, TankKey, WwError};

pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised while building a waterwork. Any of them poisons the builder.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Unknown tank type '{type_name}'")]
    UnknownTankType { type_name: String },

    #[error("Unknown tank {tank}")]
    UnknownTank { tank: TankKey },

    #[error("{tank} has no slot '{slot}'")]
    UnknownSlot { tank: String, slot: String },

    #[error("{tank} has no tube '{tube}'")]
    UnknownTube { tank: String, tube: String },

    #[error("Slot {slot} already has a producer")]
    SlotAlreadyConnected { slot: PortKey },

    #[error("Connecting {tube} to {slot} would create a cycle")]
    Cycle { tube: PortKey, slot: PortKey },

    #[error("Builder was poisoned by an earlier error")]
    Poisoned,

    #[error(transparent)]
    Value(#[from] WwError),
}
