//! ww-project: declarative waterwork definitions in YAML or JSON.

pub mod build;
pub mod io;
pub mod schema;
pub mod validate;
pub mod values;

use std::path::Path;

pub use io::{parse_values, read_values, values_to_json};
pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, tank_keys, validate_definition};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Graph error: {0}")]
    Graph(#[from] ww_graph::GraphError),

    #[error("Flow error: {0}")]
    Flow(#[from] ww_engine::FlowError),

    #[error("Value error: {0}")]
    Value(#[from] ww_core::WwError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &Path) -> ProjectResult<WaterworkDef> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

pub fn save_yaml(path: &Path, def: &WaterworkDef) -> ProjectResult<()> {
    let content = serde_yaml::to_string(def)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<WaterworkDef> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_json(path: &Path, def: &WaterworkDef) -> ProjectResult<()> {
    let content = serde_json::to_string_pretty(def)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load by extension: `.json` as JSON, anything else as YAML.
pub fn load(path: &Path) -> ProjectResult<WaterworkDef> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json(path),
        _ => load_yaml(path),
    }
}
