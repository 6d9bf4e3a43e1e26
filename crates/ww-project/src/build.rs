//! Replay a definition through the graph builder.

use tracing::debug;
use ww_core::PortKey;
use ww_graph::{GraphResult, SlotInput, Waterwork};
use ww_tanks::Registry;

use crate::ProjectResult;
use crate::schema::{SlotDef, WaterworkDef};
use crate::validate::validate_definition;

impl WaterworkDef {
    /// Validate, then build the waterwork. Tanks are created in list order,
    /// then the explicit connections are applied.
    pub fn build(&self, registry: &Registry) -> ProjectResult<Waterwork> {
        validate_definition(self, registry)?;
        let ww = Waterwork::build(registry, |b| {
            for tank in &self.tanks {
                let inputs = tank
                    .slots
                    .iter()
                    .map(|(name, slot)| Ok((name.as_str(), slot_input(slot)?)))
                    .collect::<GraphResult<Vec<_>>>()?;
                b.add_tank(&tank.type_name, inputs)?;
            }
            for connection in &self.connections {
                let tube: PortKey = connection.from.parse()?;
                let slot: PortKey = connection.to.parse()?;
                b.connect(&tube, &slot)?;
            }
            Ok(())
        })?;
        debug!(name = %self.name, tanks = ww.tanks().len(), "built definition");
        Ok(ww)
    }
}

fn slot_input(slot: &SlotDef) -> GraphResult<SlotInput> {
    Ok(match slot {
        SlotDef::Value(value) => SlotInput::from(value.to_value()?),
        SlotDef::Empty => SlotInput::from(ww_core::Fill::Empty),
        SlotDef::Tube(path) => SlotInput::from(path.parse::<PortKey>()?),
    })
}
