//! sl-scenario: scenario file format, migration and validation.

pub mod migrate;
pub mod presets;
pub mod schema;
pub mod validate;

use std::path::Path;

use tracing::debug;

pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use presets::{preset, presets};
pub use schema::{RunDef, Scenario};
pub use validate::{ValidationError, validate_scenario};

pub type ScenarioResult<T> = Result<T, ScenarioError>;

#[derive(thiserror::Error, Debug)]
pub enum ScenarioError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("Unsupported scenario file extension: {path}")]
    UnknownFormat { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn finish(scenario: Scenario) -> ScenarioResult<Scenario> {
    let scenario = migrate_to_latest(scenario)?;
    validate_scenario(&scenario)?;
    debug!(name = %scenario.name, model = %scenario.kind(), "scenario loaded");
    Ok(scenario)
}

pub fn parse_yaml(content: &str) -> ScenarioResult<Scenario> {
    finish(serde_yaml::from_str(content)?)
}

pub fn parse_json(content: &str) -> ScenarioResult<Scenario> {
    finish(serde_json::from_str(content)?)
}

pub fn load_yaml(path: &Path) -> ScenarioResult<Scenario> {
    parse_yaml(&std::fs::read_to_string(path)?)
}

pub fn load_json(path: &Path) -> ScenarioResult<Scenario> {
    parse_json(&std::fs::read_to_string(path)?)
}

/// Load by file extension (`.yaml`/`.yml` or `.json`).
pub fn load(path: &Path) -> ScenarioResult<Scenario> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => load_yaml(path),
        Some("json") => load_json(path),
        _ => Err(ScenarioError::UnknownFormat {
            path: path.display().to_string(),
        }),
    }
}

pub fn to_yaml(scenario: &Scenario) -> ScenarioResult<String> {
    validate_scenario(scenario)?;
    Ok(serde_yaml::to_string(scenario)?)
}
