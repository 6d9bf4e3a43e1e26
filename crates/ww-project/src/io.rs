//! Value files: JSON objects mapping port paths to literals.

use std::collections::BTreeMap;
use std::path::Path;

use ww_core::{Key, Value};
use ww_engine::Outputs;

use crate::ProjectResult;
use crate::values::ValueDef;

/// Read `{ "Add_0/slots/b": [3, 4, 5], ... }` as path-keyed values.
pub fn read_values(path: &Path) -> ProjectResult<Vec<(Key, Value)>> {
    let content = std::fs::read_to_string(path)?;
    parse_values(&content)
}

pub fn parse_values(json: &str) -> ProjectResult<Vec<(Key, Value)>> {
    let defs: BTreeMap<String, ValueDef> = serde_json::from_str(json)?;
    defs.into_iter()
        .map(|(path, def)| Ok((Key::Path(path), def.to_value()?)))
        .collect()
}

/// Render evaluation outputs as a JSON object keyed by port path.
pub fn values_to_json(values: &Outputs) -> ProjectResult<String> {
    let defs: BTreeMap<String, ValueDef> = values
        .iter()
        .map(|(key, value)| Ok((key.resolve()?.path(), ValueDef::from_value(value))))
        .collect::<ProjectResult<_>>()?;
    Ok(serde_json::to_string_pretty(&defs)?)
}
