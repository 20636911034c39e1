//! Post-step events: clamping results and stop conditions.

use std::fmt;

use serde::{Deserialize, Serialize};
use sl_core::Real;

/// Why a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Liquid height reached zero.
    Empty,
    /// Liquid height reached the tank rim.
    Full,
    /// Cancelled by the user.
    Halted,
    /// A step failed or produced a non-finite state.
    Diverged,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::Empty => "tank empty",
            StopReason::Full => "tank full",
            StopReason::Halted => "halted",
            StopReason::Diverged => "diverged",
        };
        f.write_str(text)
    }
}

/// Notable per-step occurrence that does not end the run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepEvent {
    /// One column of a multi-fluid rig ran dry.
    ColumnDrained { column: usize, name: String },
}

/// Event stamped with the simulation time at which it occurred.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub t: Real,
    pub tick: u64,
    pub event: StepEvent,
}

/// Result of applying a model's clamp/stop policy after an integration step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostStep {
    pub stop: Option<StopReason>,
    pub events: Vec<StepEvent>,
}

impl PostStep {
    pub fn proceed() -> Self {
        Self::default()
    }

    pub fn stop(reason: StopReason) -> Self {
        Self {
            stop: Some(reason),
            events: Vec::new(),
        }
    }
}
