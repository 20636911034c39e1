//! Headless batch runner and result recording.
//!
//! Drives a [`Session`] without pacing or rendering, so a recorded trajectory
//! is exactly what the interactive loop would have shown.

use serde::{Deserialize, Serialize};
use sl_core::Real;
use tracing::{debug, info};

use crate::error::{SimError, SimResult};
use crate::events::{EventRecord, StopReason};
use crate::models::{DampingRegime, ModelKind, ModelParams};
use crate::session::{Session, TickOutcome};
use crate::state::StateVector;

/// Options for headless runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimOptions {
    /// Fixed time step (seconds)
    pub dt: Real,
    /// Final simulation time (seconds)
    pub t_end: Real,
    /// Maximum number of steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 0.01,
            t_end: 10.0,
            max_steps: 1_000_000,
            record_every: 1,
        }
    }
}

impl SimOptions {
    /// Defaults using the model's own step size.
    pub fn for_kind(kind: ModelKind) -> Self {
        Self {
            dt: kind.default_dt(),
            ..Self::default()
        }
    }

    fn validate(&self) -> SimResult<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if !self.t_end.is_finite() || self.t_end < 0.0 {
            return Err(SimError::InvalidArg {
                what: "t_end must be non-negative",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        if self.record_every == 0 {
            return Err(SimError::InvalidArg {
                what: "record_every must be positive",
            });
        }
        Ok(())
    }
}

/// Recorded trajectory of one run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimRecord {
    pub kind: ModelKind,
    /// Names of the state components, in order.
    pub labels: Vec<String>,
    /// Time points (seconds)
    pub t: Vec<Real>,
    /// State snapshots
    pub x: Vec<StateVector>,
    /// Steps actually taken.
    pub steps: usize,
    /// Set when the model's stop rule ended the run early.
    pub stop: Option<StopReason>,
    pub events: Vec<EventRecord>,
    pub regime: Option<DampingRegime>,
}

impl SimRecord {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn final_time(&self) -> Real {
        self.t.last().copied().unwrap_or(0.0)
    }

    pub fn final_state(&self) -> Option<&StateVector> {
        self.x.last()
    }
}

/// Progress reported while a headless run advances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimProgress {
    pub step: usize,
    pub t: Real,
    pub t_end: Real,
    pub fraction_complete: Real,
}

/// Run a model to `t_end`, its stop rule, or `max_steps`, whichever comes first.
pub fn run_sim(params: ModelParams, opts: &SimOptions) -> SimResult<SimRecord> {
    run_sim_with_progress(params, opts, |_| {})
}

pub fn run_sim_with_progress<F>(
    params: ModelParams,
    opts: &SimOptions,
    mut on_progress: F,
) -> SimResult<SimRecord>
where
    F: FnMut(&SimProgress),
{
    opts.validate()?;

    let mut session = Session::from_params(params, opts.dt)?;
    session.start()?;

    let mut t_record = vec![session.t()];
    let mut x_record = vec![session.state().clone()];
    let mut stop = None;
    let mut step = 0;
    // Report roughly every percent of the horizon.
    let report_every = (opts.max_steps.min((opts.t_end / opts.dt).ceil() as usize) / 100).max(1);

    while session.t() < opts.t_end && step < opts.max_steps {
        let outcome = session.tick()?;
        step += 1;

        let stopped = match outcome {
            TickOutcome::Stopped(reason) => {
                stop = Some(reason);
                true
            }
            _ => false,
        };

        if stopped || step % opts.record_every == 0 {
            t_record.push(session.t());
            x_record.push(session.state().clone());
        }
        if step % report_every == 0 {
            on_progress(&SimProgress {
                step,
                t: session.t(),
                t_end: opts.t_end,
                fraction_complete: sl_core::guarded_div(session.t(), opts.t_end).min(1.0),
            });
        }
        if stopped {
            break;
        }
    }

    // Always record the final state.
    if stop.is_none() && step % opts.record_every != 0 {
        t_record.push(session.t());
        x_record.push(session.state().clone());
    }

    if step == opts.max_steps && session.t() < opts.t_end {
        debug!(max_steps = opts.max_steps, t = session.t(), "step limit reached");
    }
    info!(
        model = %session.model().kind(),
        steps = step,
        t = session.t(),
        stop = ?stop,
        "headless run finished"
    );

    Ok(SimRecord {
        kind: session.model().kind(),
        labels: session.model().state_labels(),
        t: t_record,
        x: x_record,
        steps: step,
        stop,
        events: session.events().to_vec(),
        regime: session.model().regime(),
    })
}
