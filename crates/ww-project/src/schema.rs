//! Waterwork definition schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use crate::values::{ElementType, ValueDef};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaterworkDef {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub tanks: Vec<TankDef>,
    #[serde(default)]
    pub connections: Vec<ConnectionDef>,
}

/// One tank. Its key is assigned from its type and position, so the second
/// `Add` in the list is `Add_1`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TankDef {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub slots: BTreeMap<String, SlotDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SlotDef {
    Value(ValueDef),
    Empty,
    /// Path of an upstream tube, e.g. `Add_0/tubes/target`.
    Tube(String),
}

/// Explicit tube -> slot wiring, applied after all tanks exist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionDef {
    pub from: String,
    pub to: String,
}
