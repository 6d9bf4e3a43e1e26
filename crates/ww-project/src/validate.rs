//! Definition validation, run before anything is built.

use std::collections::BTreeMap;

use ww_core::{PortKey, PortKind, TankKey};
use ww_tanks::Registry;

use crate::schema::{SlotDef, WaterworkDef};

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Invalid value: {field} ({reason})")]
    InvalidValue { field: String, reason: String },

    #[error("Unknown tank type: {type_name}")]
    UnknownTankType { type_name: String },

    #[error("Unknown slot: {slot} on {tank}")]
    UnknownSlot { tank: String, slot: String },

    #[error("Invalid port path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },
}

/// Keys the builder will hand out, in definition order.
pub fn tank_keys(def: &WaterworkDef) -> Vec<TankKey> {
    let mut counters: BTreeMap<&str, u32> = BTreeMap::new();
    def.tanks
        .iter()
        .map(|tank| {
            let count = counters.entry(tank.type_name.as_str()).or_default();
            let key = TankKey::new(&tank.type_name, *count);
            *count += 1;
            key
        })
        .collect()
}

pub fn validate_definition(def: &WaterworkDef, registry: &Registry) -> Result<(), ValidationError> {
    if def.version == 0 || def.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: def.version,
        });
    }
    if def.name.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "name".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    let keys = tank_keys(def);
    for (i, (tank, key)) in def.tanks.iter().zip(&keys).enumerate() {
        let op = registry
            .get(&tank.type_name)
            .ok_or_else(|| ValidationError::UnknownTankType {
                type_name: tank.type_name.clone(),
            })?;
        for (name, slot) in &tank.slots {
            if !op.signature().has_slot(name) {
                return Err(ValidationError::UnknownSlot {
                    tank: key.to_string(),
                    slot: name.clone(),
                });
            }
            match slot {
                SlotDef::Value(value) => {
                    value.to_value().map_err(|e| ValidationError::InvalidValue {
                        field: key.slot(name).to_string(),
                        reason: e.to_string(),
                    })?;
                }
                SlotDef::Empty => {}
                // a tank can only read from tanks created before it
                SlotDef::Tube(path) => check_port(path, PortKind::Tube, &keys[..i], registry, def)?,
            }
        }
    }

    for connection in &def.connections {
        check_port(&connection.from, PortKind::Tube, &keys, registry, def)?;
        check_port(&connection.to, PortKind::Slot, &keys, registry, def)?;
    }
    Ok(())
}

fn check_port(
    path: &str,
    kind: PortKind,
    known: &[TankKey],
    registry: &Registry,
    def: &WaterworkDef,
) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidPath {
        path: path.to_string(),
        reason,
    };
    let key: PortKey = path.parse().map_err(|e: ww_core::WwError| invalid(e.to_string()))?;
    if key.kind != kind {
        return Err(invalid(format!("expected a path into {}", kind.segment())));
    }
    let Some(position) = known.iter().position(|k| *k == key.tank) else {
        return Err(ValidationError::MissingReference {
            id: key.tank.to_string(),
            context: path.to_string(),
        });
    };
    let signature = registry
        .get(&def.tanks[position].type_name)
        .map(|op| op.signature());
    let exists = signature.is_some_and(|sig| match kind {
        PortKind::Slot => sig.has_slot(&key.name),
        PortKind::Tube => sig.has_tube(&key.name),
    });
    if !exists {
        return Err(invalid(format!("{} has no such port", key.tank)));
    }
    Ok(())
}
