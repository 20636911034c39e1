//! Simulation session: owns state, clock, parameters and the run phase.
//!
//! ```text
//! Idle --start--> Running --stop rule / halt--> Stopped --start--> Running
//!                 Running <--pause/resume--> Paused
//! any --reset--> Idle
//! ```
//!
//! Every operation either succeeds completely or leaves the session exactly
//! as it was.

use std::fmt;

use serde::Serialize;
use sl_core::{ParameterSet, Real};
use tracing::{debug, info, warn};

use crate::error::{SimError, SimResult};
use crate::events::{EventRecord, StopReason};
use crate::integrator::{ForwardEuler, Integrator};
use crate::model::TransientModel;
use crate::models::{DampingRegime, Model, ModelParams, Tuning};
use crate::scene::Readout;
use crate::state::StateVector;

/// Run phase of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "reason", rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Stopped(StopReason),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => f.write_str("idle"),
            Phase::Running => f.write_str("running"),
            Phase::Paused => f.write_str("paused"),
            Phase::Stopped(reason) => write!(f, "stopped ({reason})"),
        }
    }
}

/// What a call to [`Session::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; nothing changed.
    Skipped,
    /// State and clock advanced by one step.
    Advanced,
    /// Advanced, and the model's stop rule ended the run.
    Stopped(StopReason),
}

/// State plus derived display quantities, as handed to a render sink.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub t: Real,
    pub tick: u64,
    pub phase: Phase,
    pub state: StateVector,
    pub readouts: Vec<Readout>,
    pub regime: Option<DampingRegime>,
}

#[derive(Clone, Debug)]
pub struct Session {
    model: Model,
    integrator: ForwardEuler,
    dt: Real,
    t: Real,
    ticks: u64,
    state: StateVector,
    phase: Phase,
    events: Vec<EventRecord>,
}

fn check_dt(dt: Real) -> SimResult<Real> {
    if !dt.is_finite() || dt <= 0.0 {
        return Err(SimError::InvalidArg {
            what: "dt must be positive",
        });
    }
    Ok(dt)
}

impl Session {
    pub fn new(model: Model, dt: Real) -> SimResult<Self> {
        let dt = check_dt(dt)?;
        let state = model.initial_state();
        Ok(Self {
            model,
            integrator: ForwardEuler,
            dt,
            t: 0.0,
            ticks: 0,
            state,
            phase: Phase::Idle,
            events: Vec::new(),
        })
    }

    pub fn from_params(params: ModelParams, dt: Real) -> SimResult<Self> {
        Self::new(Model::from_params(params)?, dt)
    }

    /// Session using the demo's own step size.
    pub fn with_default_dt(params: ModelParams) -> SimResult<Self> {
        let dt = params.kind().default_dt();
        Self::from_params(params, dt)
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn params(&self) -> ModelParams {
        self.model.params()
    }

    pub fn dt(&self) -> Real {
        self.dt
    }

    /// Elapsed simulation time (s).
    pub fn t(&self) -> Real {
        self.t
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn state(&self) -> &StateVector {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Events recorded since the last start/reset.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    fn reinitialize(&mut self) {
        self.state = self.model.initial_state();
        self.t = 0.0;
        self.ticks = 0;
        self.events.clear();
    }

    fn ensure_can_start(&self) -> SimResult<()> {
        match self.phase {
            Phase::Idle | Phase::Stopped(_) => Ok(()),
            phase => Err(SimError::InvalidTransition { op: "start", phase }),
        }
    }

    fn ensure_not_running(&self, op: &'static str) -> SimResult<()> {
        if self.phase == Phase::Running {
            return Err(SimError::InvalidTransition {
                op,
                phase: self.phase,
            });
        }
        Ok(())
    }

    /// Begin a run from the initial conditions of the current parameters.
    pub fn start(&mut self) -> SimResult<()> {
        self.ensure_can_start()?;
        self.reinitialize();
        self.phase = Phase::Running;
        let model = self.model.kind();
        match self.model.regime() {
            Some(regime) => debug!(%model, dt = self.dt, %regime, "run started"),
            None => debug!(%model, dt = self.dt, "run started"),
        }
        Ok(())
    }

    /// Replace the parameters and begin a run with them.
    pub fn start_with(&mut self, params: ModelParams) -> SimResult<()> {
        self.ensure_can_start()?;
        self.model = Model::from_params(params)?;
        self.start()
    }

    /// Ends the run after a failed step. State, clock and tick count keep
    /// their last valid values.
    fn diverge(&mut self, err: SimError) -> SimError {
        warn!(t = self.t, ticks = self.ticks, %err, "run diverged");
        self.phase = Phase::Stopped(StopReason::Diverged);
        err
    }

    /// Advance one fixed step. Skipped unless running.
    ///
    /// A failed or non-finite step stops the run as
    /// [`StopReason::Diverged`] and returns the error.
    pub fn tick(&mut self) -> SimResult<TickOutcome> {
        if self.phase != Phase::Running {
            return Ok(TickOutcome::Skipped);
        }

        let stepped = self
            .integrator
            .step(&self.model, self.t, &self.state, self.dt);
        let mut next = match stepped {
            Ok(next) => next,
            Err(err) => return Err(self.diverge(err)),
        };
        let t_next = self.t + self.dt;
        let post = self.model.post_step(t_next, &self.state, &mut next);
        if !next.is_finite() {
            return Err(self.diverge(SimError::NonPhysical {
                what: "state became non-finite",
            }));
        }

        self.state = next;
        self.t = t_next;
        self.ticks += 1;

        for event in post.events {
            info!(t = self.t, ?event, "step event");
            self.events.push(EventRecord {
                t: self.t,
                tick: self.ticks,
                event,
            });
        }

        if let Some(reason) = post.stop {
            self.phase = Phase::Stopped(reason);
            info!(t = self.t, ticks = self.ticks, %reason, "run stopped");
            return Ok(TickOutcome::Stopped(reason));
        }
        Ok(TickOutcome::Advanced)
    }

    pub fn pause(&mut self) -> SimResult<()> {
        if self.phase != Phase::Running {
            return Err(SimError::InvalidTransition {
                op: "pause",
                phase: self.phase,
            });
        }
        self.phase = Phase::Paused;
        debug!(t = self.t, "paused");
        Ok(())
    }

    pub fn resume(&mut self) -> SimResult<()> {
        if self.phase != Phase::Paused {
            return Err(SimError::InvalidTransition {
                op: "resume",
                phase: self.phase,
            });
        }
        self.phase = Phase::Running;
        debug!(t = self.t, "resumed");
        Ok(())
    }

    /// Cooperative cancellation of an active run.
    pub fn halt(&mut self) -> SimResult<()> {
        match self.phase {
            Phase::Running | Phase::Paused => {
                self.phase = Phase::Stopped(StopReason::Halted);
                info!(t = self.t, ticks = self.ticks, "run halted");
                Ok(())
            }
            phase => Err(SimError::InvalidTransition { op: "halt", phase }),
        }
    }

    /// Back to Idle with the initial state of the current parameters.
    pub fn reset(&mut self) {
        self.reinitialize();
        self.phase = Phase::Idle;
        debug!(model = %self.model.kind(), "reset");
    }

    /// Replace the parameters wholesale. Not allowed while running; implies reset.
    pub fn update_parameters(&mut self, params: ModelParams) -> SimResult<()> {
        self.ensure_not_running("update parameters")?;
        self.model = Model::from_params(params)?;
        self.reset();
        Ok(())
    }

    /// Swap in another parameter set (possibly another model) and step size.
    pub fn load(&mut self, params: ModelParams, dt: Real) -> SimResult<()> {
        self.ensure_not_running("load a model")?;
        let dt = check_dt(dt)?;
        self.model = Model::from_params(params)?;
        self.dt = dt;
        self.reset();
        info!(model = %self.model.kind(), dt, "model loaded");
        Ok(())
    }

    /// Apply one numeric text entry (`name`, `text`) through [`Self::update_parameters`].
    ///
    /// Non-numeric, out-of-range or unknown entries are rejected and the
    /// session keeps its previous parameters and state.
    pub fn set_parameter(&mut self, name: &str, text: &str) -> SimResult<Real> {
        self.ensure_not_running("update parameters")?;
        let mut params = self.model.params();
        let value = match params.parameters_mut().set_from_text(name, text) {
            Ok(value) => value,
            Err(err) => {
                warn!(name, text, %err, "parameter entry rejected");
                return Err(err.into());
            }
        };
        self.update_parameters(params)?;
        Ok(value)
    }

    /// Change the fixed step. Not allowed while running; implies reset.
    pub fn set_dt(&mut self, dt: Real) -> SimResult<()> {
        self.ensure_not_running("change dt")?;
        self.dt = check_dt(dt)?;
        self.reset();
        Ok(())
    }

    /// Live adjustment, accepted in every phase.
    ///
    /// While idle, a change to an initial condition is reflected in the
    /// displayed state immediately; otherwise it applies from the next start.
    pub fn tune(&mut self, tuning: &Tuning) -> SimResult<()> {
        self.model.tune(tuning)?;
        if self.phase == Phase::Idle && tuning.affects_initial_state() {
            self.state = self.model.initial_state();
        }
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            t: self.t,
            tick: self.ticks,
            phase: self.phase,
            state: self.state.clone(),
            readouts: self.model.readouts(self.t, &self.state),
            regime: self.model.regime(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelKind, SpringMassParams};

    fn session(kind: ModelKind) -> Session {
        Session::with_default_dt(ModelParams::defaults(kind)).unwrap()
    }

    #[test]
    fn rejects_bad_dt() {
        let params = ModelParams::defaults(ModelKind::Rlc);
        assert!(Session::from_params(params.clone(), 0.0).is_err());
        assert!(Session::from_params(params.clone(), -0.1).is_err());
        assert!(Session::from_params(params, f64::NAN).is_err());
    }

    #[test]
    fn lifecycle_transitions() {
        let mut s = session(ModelKind::SpringMass);
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.tick().unwrap(), TickOutcome::Skipped);

        s.start().unwrap();
        assert!(s.start().is_err());
        assert_eq!(s.tick().unwrap(), TickOutcome::Advanced);

        s.pause().unwrap();
        assert!(s.pause().is_err());
        assert!(s.start().is_err());
        s.resume().unwrap();

        s.halt().unwrap();
        assert_eq!(s.phase(), Phase::Stopped(StopReason::Halted));
        assert!(s.halt().is_err());

        s.start().unwrap();
        assert_eq!(s.ticks(), 0);
        assert_eq!(s.t(), 0.0);

        s.reset();
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn start_with_swaps_parameters_when_not_running() {
        let stiff = ModelParams::SpringMass(SpringMassParams {
            k: 12.0,
            ..SpringMassParams::default()
        });
        let mut s = session(ModelKind::SpringMass);
        s.start_with(stiff.clone()).unwrap();
        assert_eq!(s.params(), stiff);
        assert_eq!(s.phase(), Phase::Running);
        s.tick().unwrap();

        let soft = ModelParams::defaults(ModelKind::SpringMass);
        assert!(s.start_with(soft.clone()).is_err());
        s.pause().unwrap();
        assert!(s.start_with(soft.clone()).is_err());
        assert_eq!(s.params(), stiff);
        assert_eq!(s.ticks(), 1);

        s.halt().unwrap();
        s.start_with(soft.clone()).unwrap();
        assert_eq!(s.params(), soft);
        assert_eq!(s.t(), 0.0);
        assert_eq!(s.ticks(), 0);
    }

    #[test]
    fn parameters_locked_while_running() {
        let mut s = session(ModelKind::MixedTank);
        s.start().unwrap();
        let err = s.set_parameter("q_in", "0.05").unwrap_err();
        assert!(matches!(err, SimError::InvalidTransition { .. }));
        assert!(s.set_dt(0.2).is_err());
        assert_eq!(s.phase(), Phase::Running);

        // Pausing unlocks editing; the edit resets the run.
        s.tick().unwrap();
        s.pause().unwrap();
        assert_eq!(s.set_parameter("q_in", "0.05").unwrap(), 0.05);
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.ticks(), 0);
        match s.params() {
            ModelParams::MixedTank(p) => assert_eq!(p.q_in, 0.05),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejected_entry_changes_nothing() {
        let mut s = session(ModelKind::DrainingTank);
        s.start().unwrap();
        for _ in 0..10 {
            s.tick().unwrap();
        }
        s.pause().unwrap();
        let before = (s.params(), s.state().clone(), s.t(), s.phase());

        assert!(s.set_parameter("k", "fast").is_err());
        assert!(s.set_parameter("k", "99").is_err());
        assert!(s.set_parameter("nope", "1.0").is_err());

        let after = (s.params(), s.state().clone(), s.t(), s.phase());
        assert_eq!(before, after);
    }

    #[test]
    fn physically_invalid_update_is_rejected() {
        let mut s = session(ModelKind::MixedTank);
        let before = s.params();
        let mut bad = before.clone();
        bad.parameters_mut().set("h0", 9.0).unwrap();
        assert!(s.update_parameters(bad).is_err());
        assert_eq!(s.params(), before);
    }

    #[test]
    fn update_parameters_can_switch_model() {
        let mut s = session(ModelKind::DrainingTank);
        s.update_parameters(ModelParams::defaults(ModelKind::Rlc))
            .unwrap();
        assert_eq!(s.model().kind(), ModelKind::Rlc);
        assert_eq!(s.state().len(), 2);
    }

    #[test]
    fn tune_in_idle_refreshes_initial_state() {
        let mut s = session(ModelKind::MultiFluid);
        s.tune(&Tuning::InitialHeight {
            column: 1,
            height: 3.0,
        })
        .unwrap();
        assert_eq!(s.state()[1], 3.0);

        s.start().unwrap();
        s.tick().unwrap();
        let h_before = s.state()[0];
        s.tune(&Tuning::InitialHeight {
            column: 0,
            height: 1.0,
        })
        .unwrap();
        // Mid-run, the live column keeps its current height.
        assert_eq!(s.state()[0], h_before);
        assert_eq!(s.phase(), Phase::Running);
    }

    #[test]
    fn snapshot_carries_readouts() {
        let mut s = session(ModelKind::Rlc);
        s.start().unwrap();
        s.tick().unwrap();
        let snap = s.snapshot();
        assert_eq!(snap.tick, 1);
        assert_eq!(snap.phase, Phase::Running);
        assert_eq!(snap.regime, Some(DampingRegime::Overdamped));
        assert!(snap.readouts.iter().any(|r| r.name == "voltage"));
    }

    #[test]
    fn unstable_run_stops_as_diverged() {
        let params = ModelParams::SpringMass(SpringMassParams {
            k: 20.0,
            mass: 0.1,
            ..SpringMassParams::default()
        });
        let mut s = Session::from_params(params, 1.0).unwrap();
        s.start().unwrap();

        let mut last_good = None;
        for _ in 0..2000 {
            let before = (s.state().clone(), s.t(), s.ticks());
            if s.tick().is_err() {
                last_good = Some(before);
                break;
            }
        }
        let (state, t, ticks) = last_good.expect("run never diverged");
        assert!(state.is_finite());
        assert_eq!(s.state(), &state);
        assert_eq!(s.t(), t);
        assert_eq!(s.ticks(), ticks);
        assert_eq!(s.phase(), Phase::Stopped(StopReason::Diverged));
        assert_eq!(s.tick().unwrap(), TickOutcome::Skipped);

        // A diverged run can be restarted like any other stopped run.
        s.start().unwrap();
        assert_eq!(s.phase(), Phase::Running);
        assert_eq!(s.ticks(), 0);
    }

    #[test]
    fn phase_display() {
        assert_eq!(
            Phase::Stopped(StopReason::Full).to_string(),
            "stopped (tank full)"
        );
        assert_eq!(
            Phase::Stopped(StopReason::Diverged).to_string(),
            "stopped (diverged)"
        );
        assert_eq!(Phase::Paused.to_string(), "paused");
    }
}
