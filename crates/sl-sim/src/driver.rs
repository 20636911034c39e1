//! Cooperative single-threaded frame loop.
//!
//! Each frame drains the pending commands, performs at most one tick, pushes
//! the new state to the render sink and then yields through a
//! [`RateLimiter`]. Commands are only ever applied between ticks.

use sl_core::{RateLimiter, Real};
use tracing::{debug, warn};

use crate::error::SimResult;
use crate::models::{ModelParams, Tuning};
use crate::scene::{RenderSink, SceneGeneration};
use crate::session::{Phase, Session, TickOutcome};

/// Discrete input from the widget layer.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Start,
    /// Start a run with a replacement parameter set.
    StartWith(ModelParams),
    Pause,
    Resume,
    Reset,
    Halt,
    /// Numeric text entry for one named parameter.
    SetParam { name: String, text: String },
    SetDt(Real),
    Tune(Tuning),
    /// Switch to another model (or a full parameter set).
    Load(ModelParams),
}

/// What happened during one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub outcome: TickOutcome,
    /// Messages for commands the session refused.
    pub rejected: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub ticks: u64,
    pub t: Real,
    pub phase: Phase,
}

#[derive(Debug)]
pub struct Driver {
    session: Session,
    scene: Option<SceneGeneration>,
    limiter: RateLimiter,
}

impl Driver {
    pub fn new(session: Session, limiter: RateLimiter) -> Self {
        Self {
            session,
            scene: None,
            limiter,
        }
    }

    /// Driver paced at the frame rate of the session's model.
    pub fn paced(session: Session) -> SimResult<Self> {
        let limiter = RateLimiter::new(session.model().kind().frame_rate_hz())?;
        Ok(Self::new(session, limiter))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn scene(&self) -> Option<&SceneGeneration> {
        self.scene.as_ref()
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Release the current scene generation and build a fresh one.
    fn rebuild_scene<S: RenderSink + ?Sized>(&mut self, sink: &mut S) {
        if let Some(old) = self.scene.take() {
            old.release(sink);
        }
        self.scene = Some(SceneGeneration::build(sink, &self.session));
    }

    /// Build the scene if none exists yet.
    pub fn open<S: RenderSink + ?Sized>(&mut self, sink: &mut S) {
        if self.scene.is_none() {
            self.rebuild_scene(sink);
        }
    }

    fn present<S: RenderSink + ?Sized>(&mut self, sink: &mut S) {
        match &self.scene {
            Some(scene) => scene.present(sink, &self.session),
            None => self.rebuild_scene(sink),
        }
    }

    /// Apply one command. On error the session is unchanged.
    pub fn apply<S: RenderSink + ?Sized>(
        &mut self,
        sink: &mut S,
        command: Command,
    ) -> SimResult<()> {
        debug!(?command, phase = %self.session.phase(), "applying command");
        match command {
            Command::Start => {
                self.session.start()?;
                self.rebuild_scene(sink);
            }
            Command::StartWith(params) => {
                self.session.start_with(params)?;
                self.rebuild_scene(sink);
            }
            Command::Pause => self.session.pause()?,
            Command::Resume => self.session.resume()?,
            Command::Halt => {
                self.session.halt()?;
                self.present(sink);
            }
            Command::Reset => {
                self.session.reset();
                self.rebuild_scene(sink);
            }
            Command::SetParam { name, text } => {
                self.session.set_parameter(&name, &text)?;
                self.rebuild_scene(sink);
            }
            Command::SetDt(dt) => {
                self.session.set_dt(dt)?;
                self.present(sink);
            }
            Command::Tune(tuning) => {
                self.session.tune(&tuning)?;
                self.present(sink);
            }
            Command::Load(params) => {
                let kind = params.kind();
                self.session.load(params, kind.default_dt())?;
                if !self.limiter.is_unpaced() {
                    self.limiter = RateLimiter::new(kind.frame_rate_hz())?;
                }
                self.rebuild_scene(sink);
            }
        }
        Ok(())
    }

    /// Drain `commands`, then tick once and present the result.
    ///
    /// Rejected commands are reported, not fatal. A tick that fails stops the
    /// session at its last valid state, which is still presented, and is
    /// returned as an error.
    pub fn frame<S, I>(&mut self, sink: &mut S, commands: I) -> SimResult<FrameReport>
    where
        S: RenderSink + ?Sized,
        I: IntoIterator<Item = Command>,
    {
        let mut rejected = Vec::new();
        for command in commands {
            if let Err(err) = self.apply(sink, command) {
                warn!(%err, "command rejected");
                rejected.push(err.to_string());
            }
        }

        let outcome = match self.session.tick() {
            Ok(outcome) => outcome,
            Err(err) => {
                self.present(sink);
                return Err(err);
            }
        };
        if outcome != TickOutcome::Skipped {
            self.present(sink);
        }
        Ok(FrameReport { outcome, rejected })
    }

    /// Run paced frames until the session stops or `max_frames` is reached.
    ///
    /// `poll` is called once per frame to collect pending commands.
    pub fn run<S, F>(
        &mut self,
        sink: &mut S,
        max_frames: u64,
        mut poll: F,
    ) -> SimResult<RunSummary>
    where
        S: RenderSink + ?Sized,
        F: FnMut(&Session) -> Vec<Command>,
    {
        self.open(sink);
        let mut frames = 0;
        while frames < max_frames {
            let commands = poll(&self.session);
            let report = self.frame(sink, commands)?;
            frames += 1;
            if let Phase::Stopped(reason) = self.session.phase() {
                debug!(frames, %reason, outcome = ?report.outcome, "frame loop finished");
                break;
            }
            self.limiter.wait();
        }
        Ok(RunSummary {
            frames,
            ticks: self.session.ticks(),
            t: self.session.t(),
            phase: self.session.phase(),
        })
    }

    /// Release all renderables and hand the session back.
    pub fn shutdown<S: RenderSink + ?Sized>(mut self, sink: &mut S) -> Session {
        if let Some(scene) = self.scene.take() {
            scene.release(sink);
        }
        self.session
    }
}
