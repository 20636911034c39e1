//! Physical models and the tagged variant the session drives.

pub mod draining_tank;
pub mod mixed_tank;
pub mod multi_fluid;
pub mod rlc;
pub mod spring_mass;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sl_core::{CoreError, ParameterSet, Real};

use crate::error::{SimError, SimResult};
use crate::events::PostStep;
use crate::model::TransientModel;
use crate::scene::{Readout, Update};
use crate::state::StateVector;

pub use draining_tank::{DrainingTank, DrainingTankParams};
pub use mixed_tank::{MixedTank, MixedTankParams};
pub use multi_fluid::{FluidColumn, MultiFluidParams, MultiFluidTanks, Tuning};
pub use rlc::{DampingRegime, RlcCircuit, RlcParams};
pub use spring_mass::{SpringMassDamper, SpringMassParams};

/// Which physical model a session runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    DrainingTank,
    MultiFluid,
    MixedTank,
    Rlc,
    SpringMass,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::DrainingTank,
        ModelKind::MultiFluid,
        ModelKind::MixedTank,
        ModelKind::Rlc,
        ModelKind::SpringMass,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::DrainingTank => "draining_tank",
            ModelKind::MultiFluid => "multi_fluid",
            ModelKind::MixedTank => "mixed_tank",
            ModelKind::Rlc => "rlc",
            ModelKind::SpringMass => "spring_mass",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ModelKind::DrainingTank => "Draining cylindrical tank",
            ModelKind::MultiFluid => "Multi-fluid draining tanks",
            ModelKind::MixedTank => "Mixing tank: concentration and level",
            ModelKind::Rlc => "RLC circuit",
            ModelKind::SpringMass => "Spring-mass-damper",
        }
    }

    /// Fixed step used by the demo (s).
    pub fn default_dt(self) -> Real {
        match self {
            ModelKind::DrainingTank | ModelKind::MultiFluid | ModelKind::SpringMass => 0.01,
            ModelKind::MixedTank => 0.1,
            ModelKind::Rlc => 0.005,
        }
    }

    /// Host yield rate of the interactive loop (frames per second).
    pub fn frame_rate_hz(self) -> Real {
        match self {
            ModelKind::DrainingTank | ModelKind::MultiFluid | ModelKind::MixedTank => 60.0,
            ModelKind::Rlc => 100.0,
            ModelKind::SpringMass => 200.0,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| CoreError::Parse {
                what: "model kind".to_string(),
                input: s.to_string(),
            })
    }
}

/// Parameters of one run, tagged by model kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelParams {
    DrainingTank(DrainingTankParams),
    MultiFluid(MultiFluidParams),
    MixedTank(MixedTankParams),
    Rlc(RlcParams),
    SpringMass(SpringMassParams),
}

impl ModelParams {
    pub fn defaults(kind: ModelKind) -> Self {
        match kind {
            ModelKind::DrainingTank => ModelParams::DrainingTank(Default::default()),
            ModelKind::MultiFluid => ModelParams::MultiFluid(Default::default()),
            ModelKind::MixedTank => ModelParams::MixedTank(Default::default()),
            ModelKind::Rlc => ModelParams::Rlc(Default::default()),
            ModelKind::SpringMass => ModelParams::SpringMass(Default::default()),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            ModelParams::DrainingTank(_) => ModelKind::DrainingTank,
            ModelParams::MultiFluid(_) => ModelKind::MultiFluid,
            ModelParams::MixedTank(_) => ModelKind::MixedTank,
            ModelParams::Rlc(_) => ModelKind::Rlc,
            ModelParams::SpringMass(_) => ModelKind::SpringMass,
        }
    }

    pub fn parameters(&self) -> &dyn ParameterSet {
        match self {
            ModelParams::DrainingTank(p) => p,
            ModelParams::MultiFluid(p) => p,
            ModelParams::MixedTank(p) => p,
            ModelParams::Rlc(p) => p,
            ModelParams::SpringMass(p) => p,
        }
    }

    pub fn parameters_mut(&mut self) -> &mut dyn ParameterSet {
        match self {
            ModelParams::DrainingTank(p) => p,
            ModelParams::MultiFluid(p) => p,
            ModelParams::MixedTank(p) => p,
            ModelParams::Rlc(p) => p,
            ModelParams::SpringMass(p) => p,
        }
    }
}

/// Model tagged variant: one uniform derivative/clamp capability over every kind.
#[derive(Clone, Debug)]
pub enum Model {
    DrainingTank(DrainingTank),
    MultiFluid(MultiFluidTanks),
    MixedTank(MixedTank),
    Rlc(RlcCircuit),
    SpringMass(SpringMassDamper),
}

macro_rules! dispatch {
    ($self:expr, $m:ident => $body:expr) => {
        match $self {
            Model::DrainingTank($m) => $body,
            Model::MultiFluid($m) => $body,
            Model::MixedTank($m) => $body,
            Model::Rlc($m) => $body,
            Model::SpringMass($m) => $body,
        }
    };
}

impl Model {
    /// Build a model, checking that the parameters are physically meaningful.
    pub fn from_params(params: ModelParams) -> SimResult<Self> {
        Ok(match params {
            ModelParams::DrainingTank(p) => Model::DrainingTank(DrainingTank::new(p)?),
            ModelParams::MultiFluid(p) => Model::MultiFluid(MultiFluidTanks::new(p)?),
            ModelParams::MixedTank(p) => Model::MixedTank(MixedTank::new(p)?),
            ModelParams::Rlc(p) => Model::Rlc(RlcCircuit::new(p)?),
            ModelParams::SpringMass(p) => Model::SpringMass(SpringMassDamper::new(p)?),
        })
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Model::DrainingTank(_) => ModelKind::DrainingTank,
            Model::MultiFluid(_) => ModelKind::MultiFluid,
            Model::MixedTank(_) => ModelKind::MixedTank,
            Model::Rlc(_) => ModelKind::Rlc,
            Model::SpringMass(_) => ModelKind::SpringMass,
        }
    }

    /// Copy of the parameters this model was built from.
    pub fn params(&self) -> ModelParams {
        match self {
            Model::DrainingTank(m) => ModelParams::DrainingTank(m.params().clone()),
            Model::MultiFluid(m) => ModelParams::MultiFluid(m.params().clone()),
            Model::MixedTank(m) => ModelParams::MixedTank(m.params().clone()),
            Model::Rlc(m) => ModelParams::Rlc(m.params().clone()),
            Model::SpringMass(m) => ModelParams::SpringMass(m.params().clone()),
        }
    }

    /// Damping regime, for models that have one.
    pub fn regime(&self) -> Option<DampingRegime> {
        match self {
            Model::Rlc(m) => Some(m.regime()),
            _ => None,
        }
    }

    /// Apply a live adjustment (multi-fluid rig only).
    pub fn tune(&mut self, tuning: &Tuning) -> SimResult<()> {
        match self {
            Model::MultiFluid(m) => m.tune(tuning),
            other => Err(SimError::UnsupportedTuning {
                model: other.kind().title(),
            }),
        }
    }

    /// Column names for the state vector, used for exports.
    pub fn state_labels(&self) -> Vec<String> {
        match self {
            Model::DrainingTank(_) => vec!["h_m".to_string()],
            Model::MultiFluid(m) => m
                .params()
                .columns
                .iter()
                .map(|c| format!("{}_h_m", c.name))
                .collect(),
            Model::MixedTank(_) => vec!["c_g_per_l".to_string(), "h_m".to_string()],
            Model::Rlc(_) => vec!["q_c".to_string(), "i_a".to_string()],
            Model::SpringMass(_) => vec!["x_m".to_string(), "v_m_per_s".to_string()],
        }
    }

    pub fn readouts(&self, t: Real, x: &StateVector) -> Vec<Readout> {
        match self {
            Model::DrainingTank(m) => m.readouts(x),
            Model::MultiFluid(m) => m.readouts(x),
            Model::MixedTank(m) => m.readouts(x),
            Model::Rlc(m) => m.readouts(t, x),
            Model::SpringMass(m) => m.readouts(t, x),
        }
    }

    /// Renderables to spawn for a run, with their initial placement.
    pub fn scene_layout(&self) -> Vec<(String, Update)> {
        dispatch!(self, m => m.scene_layout())
    }

    /// Per-tick updates for the current state.
    pub fn scene_frame(&self, t: Real, x: &StateVector) -> Vec<(String, Update)> {
        dispatch!(self, m => m.scene_frame(t, x))
    }
}

impl TransientModel for Model {
    fn dim(&self) -> usize {
        dispatch!(self, m => m.dim())
    }

    fn initial_state(&self) -> StateVector {
        dispatch!(self, m => m.initial_state())
    }

    fn rhs(&self, t: Real, x: &StateVector) -> SimResult<StateVector> {
        dispatch!(self, m => m.rhs(t, x))
    }

    fn post_step(&self, t: Real, prev: &StateVector, x: &mut StateVector) -> PostStep {
        dispatch!(self, m => m.post_step(t, prev, x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_loosely() {
        assert_eq!("rlc".parse::<ModelKind>().unwrap(), ModelKind::Rlc);
        assert_eq!(
            "Mixed-Tank".parse::<ModelKind>().unwrap(),
            ModelKind::MixedTank
        );
        assert!("pendulum".parse::<ModelKind>().is_err());
    }

    #[test]
    fn defaults_build_for_every_kind() {
        for kind in ModelKind::ALL {
            let params = ModelParams::defaults(kind);
            assert_eq!(params.kind(), kind);
            assert!(params.parameters().check_ranges().is_ok(), "{kind}");
            let model = Model::from_params(params.clone()).unwrap();
            assert_eq!(model.kind(), kind);
            assert_eq!(model.params(), params);
            assert_eq!(model.initial_state().len(), model.dim());
            assert!(!model.scene_layout().is_empty());
        }
    }

    #[test]
    fn only_rlc_has_a_regime() {
        for kind in ModelKind::ALL {
            let model = Model::from_params(ModelParams::defaults(kind)).unwrap();
            assert_eq!(model.regime().is_some(), kind == ModelKind::Rlc);
        }
    }

    #[test]
    fn tuning_rejected_for_single_tank() {
        let mut model = Model::from_params(ModelParams::defaults(ModelKind::DrainingTank)).unwrap();
        let err = model
            .tune(&Tuning::OrificeDiameter {
                column: 0,
                diameter: 0.1,
            })
            .unwrap_err();
        assert!(matches!(err, SimError::UnsupportedTuning { .. }));
    }

    #[test]
    fn params_deserialize_with_partial_fields() {
        let params: ModelParams = serde_json::from_str(r#"{"kind":"rlc","r":0.0}"#).unwrap();
        match params {
            ModelParams::Rlc(p) => {
                assert_eq!(p.r, 0.0);
                assert_eq!(p.l, 1.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
