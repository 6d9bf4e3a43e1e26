//! Lookup from keys to compact ids.
//!
//! Tank and port ids are contiguous (`0..N`) by construction, so evaluation
//! state can live in plain vectors indexed by `id.slot()`. This map resolves
//! the user-facing keys, in either addressing style, to those ids.

use std::collections::BTreeMap;

use ww_core::{Key, PortId, PortKey, TankId, TankKey, WwResult};

/// Keys to ids. The reverse direction is the `key` field of every tank and
/// port.
#[derive(Debug, Clone, Default)]
pub struct PortIndex {
    tanks: BTreeMap<TankKey, TankId>,
    ports: BTreeMap<PortKey, PortId>,
}

impl PortIndex {
    pub fn tank_count(&self) -> usize {
        self.tanks.len()
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn tank_id(&self, key: &TankKey) -> Option<TankId> {
        self.tanks.get(key).copied()
    }

    pub fn port_id(&self, key: &PortKey) -> Option<PortId> {
        self.ports.get(key).copied()
    }

    /// Resolve a key in either style. Malformed path keys are an error;
    /// well-formed keys naming no port give `Ok(None)`.
    pub fn resolve(&self, key: &Key) -> WwResult<Option<PortId>> {
        Ok(self.port_id(&key.resolve()?))
    }

    pub(crate) fn insert_tank(&mut self, key: TankKey, id: TankId) {
        self.tanks.insert(key, id);
    }

    pub(crate) fn insert_port(&mut self, key: PortKey, id: PortId) {
        self.ports.insert(key, id);
    }
}
