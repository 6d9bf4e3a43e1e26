//! Incremental waterwork builder with eager evaluation.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use tracing::{debug, trace};
use ww_core::{Array, Fill, PortId, PortKey, PortKind, TankId, TankKey, Value, WwError};
use ww_tanks::{PortValues, Registry, checked_pour};

use crate::error::{GraphError, GraphResult};
use crate::graph::{Port, Tank, Waterwork};
use crate::indexing::PortIndex;
use crate::validate;

/// What feeds a slot when a tank is created.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotInput {
    /// A funnel, concrete or deferred to pour time.
    Fill(Fill),
    /// The output of an existing tank.
    Tube(PortKey),
}

impl From<Fill> for SlotInput {
    fn from(fill: Fill) -> Self {
        SlotInput::Fill(fill)
    }
}

impl From<Value> for SlotInput {
    fn from(value: Value) -> Self {
        SlotInput::Fill(Fill::Value(value))
    }
}

impl From<PortKey> for SlotInput {
    fn from(tube: PortKey) -> Self {
        SlotInput::Tube(tube)
    }
}

impl From<&PortKey> for SlotInput {
    fn from(tube: &PortKey) -> Self {
        SlotInput::Tube(tube.clone())
    }
}

macro_rules! slot_input_from_value {
    ($($t:ty),*) => {
        $(impl From<$t> for SlotInput {
            fn from(v: $t) -> Self {
                SlotInput::from(Value::from(v))
            }
        })*
    };
}

slot_input_from_value!(bool, i32, i64, f64, &str, String, Array, Vec<i32>, Vec<i64>, Vec<f64>, Vec<bool>, Vec<Value>);

/// Builder for constructing a waterwork one tank at a time.
///
/// Tanks get keys `"{type}_{n}"` from per-type counters owned by the
/// builder. A tank whose slots are all known at build time is poured right
/// away and its tube values cached, so downstream tanks can be evaluated
/// eagerly too. Any error poisons the builder: later calls fail with
/// [`GraphError::Poisoned`] and it can no longer be frozen.
pub struct WaterworkBuilder<'r> {
    registry: &'r Registry,
    tanks: Vec<Tank>,
    ports: Vec<Port>,
    producer: Vec<Option<PortId>>,
    consumers: Vec<Vec<PortId>>,
    fills: Vec<Option<Fill>>,
    values: Vec<Option<Value>>,
    counters: BTreeMap<String, u32>,
    index: PortIndex,
    /// Tank-level dependencies: producer tank -> consumer tank.
    deps: DiGraph<TankId, ()>,
    poisoned: bool,
}

impl<'r> WaterworkBuilder<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            tanks: Vec::new(),
            ports: Vec::new(),
            producer: Vec::new(),
            consumers: Vec::new(),
            fills: Vec::new(),
            values: Vec::new(),
            counters: BTreeMap::new(),
            index: PortIndex::default(),
            deps: DiGraph::new(),
            poisoned: false,
        }
    }

    /// Create a tank of `type_name`.
    ///
    /// Slots not named in `inputs` stay unset funnels. Returns the new tank's
    /// key; `key.tube(name)` addresses its outputs.
    pub fn add_tank<I, S>(&mut self, type_name: &str, inputs: I) -> GraphResult<TankKey>
    where
        I: IntoIterator<Item = (S, SlotInput)>,
        S: Into<String>,
    {
        let inputs: Vec<(String, SlotInput)> =
            inputs.into_iter().map(|(name, input)| (name.into(), input)).collect();
        self.guard(|b| b.add_tank_inner(type_name, inputs))
    }

    /// Feed `slot` from `tube`, then re-evaluate everything downstream.
    pub fn connect(&mut self, tube: &PortKey, slot: &PortKey) -> GraphResult<()> {
        self.guard(|b| b.connect_inner(tube, slot))
    }

    /// Value of a port known at build time.
    pub fn value(&self, port: &PortKey) -> Option<&Value> {
        let id = self.index.port_id(port)?;
        self.values[id.slot()].as_ref()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Validate and freeze into an immutable `Waterwork`.
    pub fn finish(self) -> GraphResult<Waterwork> {
        if self.poisoned {
            return Err(GraphError::Poisoned);
        }
        let order = validate::topological_order(&self.deps).ok_or(WwError::Invariant {
            what: "tank dependencies are cyclic",
        })?;
        validate::validate_structure(&self.tanks, &self.ports, &self.producer, &self.consumers)?;

        let mut funnels: Vec<PortId> = self
            .ports
            .iter()
            .filter(|p| p.kind() == PortKind::Slot && self.producer[p.id.slot()].is_none())
            .map(|p| p.id)
            .collect();
        let mut taps: Vec<PortId> = self
            .ports
            .iter()
            .filter(|p| p.kind() == PortKind::Tube && self.consumers[p.id.slot()].is_empty())
            .map(|p| p.id)
            .collect();
        funnels.sort_by(|a, b| self.ports[a.slot()].key.cmp(&self.ports[b.slot()].key));
        taps.sort_by(|a, b| self.ports[a.slot()].key.cmp(&self.ports[b.slot()].key));

        debug!(
            tanks = self.tanks.len(),
            funnels = funnels.len(),
            taps = taps.len(),
            "froze waterwork"
        );

        Ok(Waterwork {
            tanks: self.tanks,
            ports: self.ports,
            producer: self.producer,
            consumers: self.consumers,
            fills: self.fills,
            values: self.values,
            order,
            funnels,
            taps,
            index: self.index,
        })
    }

    fn guard<T>(&mut self, f: impl FnOnce(&mut Self) -> GraphResult<T>) -> GraphResult<T> {
        if self.poisoned {
            return Err(GraphError::Poisoned);
        }
        let result = f(self);
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }

    fn add_tank_inner(
        &mut self,
        type_name: &str,
        inputs: Vec<(String, SlotInput)>,
    ) -> GraphResult<TankKey> {
        let op = self
            .registry
            .get(type_name)
            .cloned()
            .ok_or_else(|| GraphError::UnknownTankType {
                type_name: type_name.to_string(),
            })?;

        // Check every input before touching the graph.
        let mut given: BTreeMap<String, SlotInput> = BTreeMap::new();
        for (name, input) in inputs {
            if !op.signature().has_slot(&name) {
                return Err(GraphError::UnknownSlot {
                    tank: type_name.to_string(),
                    slot: name,
                });
            }
            if let SlotInput::Tube(tube) = &input {
                self.lookup(tube, PortKind::Tube)?;
            }
            if given.contains_key(&name) {
                let index = self.counters.get(type_name).copied().unwrap_or(0);
                return Err(GraphError::SlotAlreadyConnected {
                    slot: TankKey::new(type_name, index).slot(name),
                });
            }
            given.insert(name, input);
        }

        let counter = self.counters.entry(type_name.to_string()).or_insert(0);
        let key = TankKey::new(type_name, *counter);
        *counter += 1;

        let tank_id = TankId::from_index(self.tanks.len() as u32);
        let ix = self.deps.add_node(tank_id);
        debug_assert_eq!(ix.index(), tank_id.slot());
        self.index.insert_tank(key.clone(), tank_id);

        let sig = op.signature();
        let mut slots = Vec::with_capacity(sig.slots().len());
        for name in sig.slots() {
            let id = self.push_port(key.slot(name.as_str()), tank_id);
            match given.remove(name) {
                Some(SlotInput::Fill(fill)) => self.fills[id.slot()] = Some(fill),
                Some(SlotInput::Tube(tube)) => {
                    let tube_id = self.lookup(&tube, PortKind::Tube)?;
                    self.link(tube_id, id);
                }
                None => {}
            }
            slots.push(id);
        }
        let tubes = sig
            .tubes()
            .iter()
            .map(|name| self.push_port(key.tube(name.as_str()), tank_id))
            .collect();

        self.tanks.push(Tank {
            id: tank_id,
            key: key.clone(),
            slots,
            tubes,
            op,
        });
        self.refresh(tank_id)?;
        Ok(key)
    }

    fn connect_inner(&mut self, tube: &PortKey, slot: &PortKey) -> GraphResult<()> {
        let tube_id = self.lookup(tube, PortKind::Tube)?;
        let slot_id = self.lookup(slot, PortKind::Slot)?;
        if self.producer[slot_id.slot()].is_some() {
            return Err(GraphError::SlotAlreadyConnected { slot: slot.clone() });
        }

        let from = node(self.ports[tube_id.slot()].tank);
        let to = node(self.ports[slot_id.slot()].tank);
        if from == to || has_path_connecting(&self.deps, to, from, None) {
            return Err(GraphError::Cycle {
                tube: tube.clone(),
                slot: slot.clone(),
            });
        }

        self.fills[slot_id.slot()] = None;
        self.link(tube_id, slot_id);

        // Everything reachable from the consuming tank may change.
        let mut stale = BTreeSet::new();
        let mut dfs = Dfs::new(&self.deps, to);
        while let Some(n) = dfs.next(&self.deps) {
            stale.insert(self.deps[n]);
        }
        let order = validate::topological_order(&self.deps).ok_or(WwError::Invariant {
            what: "tank dependencies are cyclic",
        })?;
        for tank in order.into_iter().filter(|t| stale.contains(t)) {
            self.refresh(tank)?;
        }
        Ok(())
    }

    /// Resolve a port key of the expected kind to its id.
    fn lookup(&self, key: &PortKey, kind: PortKind) -> GraphResult<PortId> {
        let tank = self
            .index
            .tank_id(&key.tank)
            .ok_or_else(|| GraphError::UnknownTank {
                tank: key.tank.clone(),
            })?;
        match self.index.port_id(key) {
            Some(id) if key.kind == kind => Ok(id),
            _ => {
                let tank = self.tanks[tank.slot()].key.to_string();
                let name = key.name.clone();
                Err(match kind {
                    PortKind::Slot => GraphError::UnknownSlot { tank, slot: name },
                    PortKind::Tube => GraphError::UnknownTube { tank, tube: name },
                })
            }
        }
    }

    fn push_port(&mut self, key: PortKey, tank: TankId) -> PortId {
        let id = PortId::from_index(self.ports.len() as u32);
        self.index.insert_port(key.clone(), id);
        self.ports.push(Port { id, key, tank });
        self.producer.push(None);
        self.consumers.push(Vec::new());
        self.fills.push(None);
        self.values.push(None);
        id
    }

    fn link(&mut self, tube: PortId, slot: PortId) {
        self.producer[slot.slot()] = Some(tube);
        self.consumers[tube.slot()].push(slot);
        let from = node(self.ports[tube.slot()].tank);
        let to = node(self.ports[slot.slot()].tank);
        self.deps.update_edge(from, to, ());
    }

    /// Recompute a tank's known slot values and, when all are known, pour it.
    fn refresh(&mut self, tank: TankId) -> GraphResult<()> {
        let t = &self.tanks[tank.slot()];
        let mut inputs = PortValues::new();
        let mut complete = true;
        for &slot in &t.slots {
            let known = match self.producer[slot.slot()] {
                Some(tube) => self.values[tube.slot()].clone(),
                None => self.fills[slot.slot()]
                    .as_ref()
                    .and_then(Fill::value)
                    .cloned(),
            };
            match &known {
                Some(v) => {
                    inputs.insert(self.ports[slot.slot()].key.name.clone(), v.clone());
                }
                None => complete = false,
            }
            self.values[slot.slot()] = known;
        }

        if !complete {
            for &tube in &t.tubes {
                self.values[tube.slot()] = None;
            }
            return Ok(());
        }

        trace!(tank = %t.key, "eager pour");
        let label = t.key.to_string();
        let mut outputs = checked_pour(t.op.as_ref(), &label, &inputs)?;
        for &tube in &t.tubes {
            self.values[tube.slot()] = outputs.remove(&self.ports[tube.slot()].key.name);
        }
        Ok(())
    }
}

fn node(tank: TankId) -> NodeIndex {
    NodeIndex::new(tank.slot())
}

impl Waterwork {
    /// Build a waterwork inside a closure scope.
    ///
    /// The builder is frozen when the closure returns `Ok`; on error it is
    /// dropped and the error returned.
    pub fn build<F>(registry: &Registry, f: F) -> GraphResult<Waterwork>
    where
        F: FnOnce(&mut WaterworkBuilder<'_>) -> GraphResult<()>,
    {
        Self::build_with(registry, f).map(|(ww, ())| ww)
    }

    /// Like [`Waterwork::build`], also handing back what the closure returns.
    pub fn build_with<T, F>(registry: &Registry, f: F) -> GraphResult<(Waterwork, T)>
    where
        F: FnOnce(&mut WaterworkBuilder<'_>) -> GraphResult<T>,
    {
        let mut builder = WaterworkBuilder::new(registry);
        let out = f(&mut builder)?;
        Ok((builder.finish()?, out))
    }
}
