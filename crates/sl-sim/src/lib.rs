//! Fixed-step simulation core for the teaching demos.
//!
//! Provides:
//! - `StateVector` and the `TransientModel` trait
//! - Explicit (forward) Euler integrator
//! - Physical models: draining tank, multi-fluid draining tanks,
//!   mixed tank (CSTR), RLC circuit, spring-mass-damper
//! - `Session` state machine (start/tick/pause/resume/halt/reset)
//! - Render sink seam with per-run scene generations
//! - Cooperative paced `Driver` loop and headless `run_sim`

pub mod driver;
pub mod error;
pub mod events;
pub mod integrator;
pub mod model;
pub mod models;
pub mod scene;
pub mod session;
pub mod sim;
pub mod state;

// Re-exports for public API
pub use driver::{Command, Driver, FrameReport, RunSummary};
pub use error::{SimError, SimResult};
pub use events::{EventRecord, PostStep, StepEvent, StopReason};
pub use integrator::{ForwardEuler, Integrator};
pub use model::TransientModel;
pub use models::{
    DampingRegime, DrainingTank, DrainingTankParams, FluidColumn, MixedTank, MixedTankParams,
    Model, ModelKind, ModelParams, MultiFluidParams, MultiFluidTanks, RlcCircuit, RlcParams,
    SpringMassDamper, SpringMassParams, Tuning,
};
pub use scene::{Readout, RenderSink, RenderableId, Rgb, SceneGeneration, Update};
pub use session::{Phase, Session, Snapshot, TickOutcome};
pub use sim::{SimOptions, SimProgress, SimRecord, run_sim, run_sim_with_progress};
pub use state::StateVector;
