//! Call-local working values.

use std::collections::BTreeMap;

use ww_core::{Key, PortId, Value};

/// Values keyed in the style requested by the caller.
pub type Outputs = BTreeMap<Key, Value>;

/// One optional value per port of the waterwork, indexed by `PortId`.
///
/// Created fresh for every pour or pump so the frozen graph is never
/// written to.
#[derive(Debug, Clone)]
pub(crate) struct FlowState {
    values: Vec<Option<Value>>,
}

impl FlowState {
    pub fn new(ports: usize) -> Self {
        Self {
            values: vec![None; ports],
        }
    }

    pub fn get(&self, port: PortId) -> Option<&Value> {
        self.values[port.slot()].as_ref()
    }

    pub fn set(&mut self, port: PortId, value: Option<Value>) {
        self.values[port.slot()] = value;
    }

    pub fn take(&mut self, port: PortId) -> Option<Value> {
        self.values[port.slot()].take()
    }
}
