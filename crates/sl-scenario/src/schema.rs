//! Scenario file schema.

use serde::{Deserialize, Serialize};
use sl_core::Real;
use sl_sim::{ModelKind, ModelParams, SimOptions};

/// One saved demo configuration: model parameters plus run options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub version: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Version 0 files kept the step size at the top level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt: Option<Real>,
    pub model: ModelParams,
    #[serde(default)]
    pub run: RunDef,
}

/// Run options. Unset values fall back to the model's own defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dt: Option<Real>,
    pub t_end: Real,
    pub max_steps: usize,
    pub record_every: usize,
    /// Interactive frame rate (frames per second).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_hz: Option<Real>,
}

impl Default for RunDef {
    fn default() -> Self {
        let sim = SimOptions::default();
        Self {
            dt: None,
            t_end: sim.t_end,
            max_steps: sim.max_steps,
            record_every: sim.record_every,
            rate_hz: None,
        }
    }
}

impl Scenario {
    pub fn new(name: impl Into<String>, model: ModelParams) -> Self {
        Self {
            version: crate::migrate::LATEST_VERSION,
            name: name.into(),
            description: None,
            dt: None,
            model,
            run: RunDef::default(),
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.model.kind()
    }

    pub fn dt(&self) -> Real {
        self.run.dt.unwrap_or_else(|| self.kind().default_dt())
    }

    /// Options for a headless run of this scenario.
    pub fn sim_options(&self) -> SimOptions {
        SimOptions {
            dt: self.dt(),
            t_end: self.run.t_end,
            max_steps: self.run.max_steps,
            record_every: self.run.record_every,
        }
    }
}
