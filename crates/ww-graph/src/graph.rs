//! Frozen waterwork data structures.

use std::fmt;
use std::sync::Arc;

use ww_core::{Fill, PortId, PortKey, PortKind, TankId, TankKey, Value};
use ww_tanks::{Signature, TankOp};

use crate::indexing::PortIndex;

/// A slot or tube, owned by exactly one tank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub id: PortId,
    pub key: PortKey,
    pub tank: TankId,
}

impl Port {
    pub fn kind(&self) -> PortKind {
        self.key.kind
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }
}

/// One instance of a tank type inside a waterwork.
///
/// Slot and tube ids are listed in signature order.
#[derive(Clone)]
pub struct Tank {
    pub id: TankId,
    pub key: TankKey,
    pub slots: Vec<PortId>,
    pub tubes: Vec<PortId>,
    pub(crate) op: Arc<dyn TankOp>,
}

impl Tank {
    pub fn op(&self) -> &dyn TankOp {
        self.op.as_ref()
    }

    pub fn signature(&self) -> &Signature {
        self.op.signature()
    }
}

impl fmt::Debug for Tank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tank")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("slots", &self.slots)
            .field("tubes", &self.tubes)
            .finish()
    }
}

/// A validated, immutable reversible graph.
///
/// Holds:
/// - tanks and ports in vectors indexed by their ids
/// - the producer of every connected slot and the consumers of every tube
/// - build-time fills of funnels and values computed eagerly while building
/// - a topological tank order
///
/// Evaluation never mutates it, so one waterwork can serve any number of
/// concurrent pour and pump calls.
#[derive(Debug, Clone)]
pub struct Waterwork {
    pub(crate) tanks: Vec<Tank>,
    pub(crate) ports: Vec<Port>,
    /// Per port: upstream tube of a connected slot.
    pub(crate) producer: Vec<Option<PortId>>,
    /// Per port: downstream slots of a tube.
    pub(crate) consumers: Vec<Vec<PortId>>,
    /// Per port: build-time state of a funnel; `None` when unset.
    pub(crate) fills: Vec<Option<Fill>>,
    /// Per port: value known at build time.
    pub(crate) values: Vec<Option<Value>>,
    pub(crate) order: Vec<TankId>,
    /// Free slots, sorted by key.
    pub(crate) funnels: Vec<PortId>,
    /// Free tubes, sorted by key.
    pub(crate) taps: Vec<PortId>,
    pub(crate) index: PortIndex,
}

impl Waterwork {
    /// All tanks, in creation order.
    pub fn tanks(&self) -> &[Tank] {
        &self.tanks
    }

    pub fn tank(&self, key: &TankKey) -> Option<&Tank> {
        self.index.tank_id(key).map(|id| &self.tanks[id.slot()])
    }

    pub fn tank_at(&self, id: TankId) -> Option<&Tank> {
        self.tanks.get(id.slot())
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id.slot())
    }

    /// Keys of the free slots, sorted.
    pub fn funnels(&self) -> Vec<&PortKey> {
        self.keys(&self.funnels)
    }

    /// Keys of the free tubes, sorted.
    pub fn taps(&self) -> Vec<&PortKey> {
        self.keys(&self.taps)
    }

    pub fn funnel_ids(&self) -> &[PortId] {
        &self.funnels
    }

    pub fn tap_ids(&self) -> &[PortId] {
        &self.taps
    }

    /// Every tube -> slot connection, in slot creation order.
    pub fn edges(&self) -> Vec<(&PortKey, &PortKey)> {
        self.ports
            .iter()
            .filter_map(|slot| {
                let tube = self.producer[slot.id.slot()]?;
                Some((&self.ports[tube.slot()].key, &slot.key))
            })
            .collect()
    }

    /// Tanks in topological order: every producer before its consumers.
    pub fn order(&self) -> &[TankId] {
        &self.order
    }

    /// The tube feeding `slot`, if it is connected.
    pub fn producer(&self, slot: &PortKey) -> Option<&PortKey> {
        let id = self.index.port_id(slot)?;
        self.producer_of(id).map(|tube| &self.ports[tube.slot()].key)
    }

    /// The slots fed by `tube`.
    pub fn consumers(&self, tube: &PortKey) -> Vec<&PortKey> {
        self.index
            .port_id(tube)
            .map(|id| self.keys(self.consumers_of(id)))
            .unwrap_or_default()
    }

    /// Value of a port fixed at build time, if any.
    pub fn build_value(&self, port: &PortKey) -> Option<&Value> {
        self.build_value_of(self.index.port_id(port)?)
    }

    /// Build-time fill of a funnel; `None` for unset funnels and connected slots.
    pub fn funnel_fill(&self, slot: &PortKey) -> Option<&Fill> {
        self.fill_of(self.index.port_id(slot)?)
    }

    pub fn port_index(&self) -> &PortIndex {
        &self.index
    }

    pub fn producer_of(&self, slot: PortId) -> Option<PortId> {
        self.producer.get(slot.slot()).copied().flatten()
    }

    pub fn consumers_of(&self, tube: PortId) -> &[PortId] {
        self.consumers.get(tube.slot()).map_or(&[], Vec::as_slice)
    }

    pub fn build_value_of(&self, port: PortId) -> Option<&Value> {
        self.values.get(port.slot())?.as_ref()
    }

    pub fn fill_of(&self, slot: PortId) -> Option<&Fill> {
        self.fills.get(slot.slot())?.as_ref()
    }

    pub fn is_funnel(&self, port: PortId) -> bool {
        self.port(port).is_some_and(|p| p.kind() == PortKind::Slot) && self.producer_of(port).is_none()
    }

    pub fn is_tap(&self, port: PortId) -> bool {
        self.port(port).is_some_and(|p| p.kind() == PortKind::Tube) && self.consumers_of(port).is_empty()
    }

    fn keys(&self, ids: &[PortId]) -> Vec<&PortKey> {
        ids.iter().map(|id| &self.ports[id.slot()].key).collect()
    }
}
