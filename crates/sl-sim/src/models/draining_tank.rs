//! Gravity-drained cylindrical tank: dh/dt = -k * sqrt(h).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use sl_core::{CoreError, CoreResult, ParamSpec, ParameterSet, Real, ensure_non_negative, sqrt_pos};

use crate::error::SimResult;
use crate::events::{PostStep, StopReason};
use crate::model::TransientModel;
use crate::scene::{Readout, Rgb, Update};
use crate::state::StateVector;

/// Rendered height of the tank shell (m).
const TANK_DISPLAY_HEIGHT: Real = 3.0;

pub const DRAINING_TANK_PARAMS: [ParamSpec; 3] = [
    ParamSpec::new("h0", "Initial height", "m", 0.5, 10.0, 2.0),
    ParamSpec::new("k", "Drain constant", "m^0.5/s", 0.05, 1.5, 0.4),
    ParamSpec::new("radius", "Tank radius", "m", 0.2, 2.5, 0.5),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrainingTankParams {
    /// Initial liquid height (m)
    pub h0: Real,
    /// Drain constant
    pub k: Real,
    /// Tank radius (m), display and volume only
    pub radius: Real,
}

impl Default for DrainingTankParams {
    fn default() -> Self {
        Self {
            h0: 2.0,
            k: 0.4,
            radius: 0.5,
        }
    }
}

impl ParameterSet for DrainingTankParams {
    fn specs(&self) -> &'static [ParamSpec] {
        &DRAINING_TANK_PARAMS
    }

    fn get(&self, name: &str) -> Option<Real> {
        match name {
            "h0" => Some(self.h0),
            "k" => Some(self.k),
            "radius" => Some(self.radius),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Real) -> CoreResult<()> {
        match name {
            "h0" => self.h0 = value,
            "k" => self.k = value,
            "radius" => self.radius = value,
            _ => {
                return Err(CoreError::UnknownParam {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Simple draining tank. State: `[h]`.
#[derive(Clone, Debug)]
pub struct DrainingTank {
    params: DrainingTankParams,
}

impl DrainingTank {
    pub fn new(params: DrainingTankParams) -> SimResult<Self> {
        ensure_non_negative(params.h0, "h0")?;
        ensure_non_negative(params.k, "k")?;
        ensure_non_negative(params.radius, "radius")?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &DrainingTankParams {
        &self.params
    }

    /// Liquid volume (m³) at height `h`.
    pub fn volume(&self, h: Real) -> Real {
        PI * self.params.radius * self.params.radius * h.max(0.0)
    }

    pub fn readouts(&self, x: &StateVector) -> Vec<Readout> {
        vec![
            Readout::new("height", x[0], "m"),
            Readout::new("volume", self.volume(x[0]), "m^3"),
        ]
    }

    pub fn scene_layout(&self) -> Vec<(String, Update)> {
        vec![
            (
                "tank".to_string(),
                Update::new()
                    .at([0.0, 0.0, 0.0])
                    .scaled(TANK_DISPLAY_HEIGHT)
                    .colored(Rgb::GRAY),
            ),
            (
                "liquid".to_string(),
                Update::new()
                    .at([0.0, 0.0, 0.0])
                    .scaled(self.params.h0)
                    .colored(Rgb::CYAN),
            ),
            (
                "label".to_string(),
                Update::new().at([0.0, TANK_DISPLAY_HEIGHT + 0.2, 0.0]),
            ),
        ]
    }

    pub fn scene_frame(&self, _t: Real, x: &StateVector) -> Vec<(String, Update)> {
        let h = x[0];
        vec![
            ("liquid".to_string(), Update::new().scaled(h)),
            (
                "label".to_string(),
                Update::new().text(format!("Water height: {h:.2} m")),
            ),
        ]
    }
}

impl TransientModel for DrainingTank {
    fn dim(&self) -> usize {
        1
    }

    fn initial_state(&self) -> StateVector {
        StateVector::from([self.params.h0])
    }

    fn rhs(&self, _t: Real, x: &StateVector) -> SimResult<StateVector> {
        x.expect_len(1)?;
        Ok(StateVector::from([-self.params.k * sqrt_pos(x[0])]))
    }

    fn post_step(&self, _t: Real, _prev: &StateVector, x: &mut StateVector) -> PostStep {
        if x[0] <= 0.0 {
            x[0] = 0.0;
            return PostStep::stop(StopReason::Empty);
        }
        PostStep::proceed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::{ForwardEuler, Integrator};

    #[test]
    fn first_euler_step_matches_hand_calculation() {
        let tank = DrainingTank::new(DrainingTankParams::default()).unwrap();
        let x0 = tank.initial_state();
        let x1 = ForwardEuler.step(&tank, 0.0, &x0, 0.01).unwrap();
        let expected = 2.0 - 0.4 * 2.0_f64.sqrt() * 0.01;
        assert!((x1[0] - expected).abs() < 1e-15);
        assert!((x1[0] - 1.99434).abs() < 1e-5);
    }

    #[test]
    fn overshoot_is_clamped_and_stops() {
        let tank = DrainingTank::new(DrainingTankParams::default()).unwrap();
        let prev = StateVector::from([1e-6]);
        let mut x = StateVector::from([-3e-6]);
        let post = tank.post_step(0.0, &prev, &mut x);
        assert_eq!(x[0], 0.0);
        assert_eq!(post.stop, Some(StopReason::Empty));
    }

    #[test]
    fn empty_tank_has_zero_derivative() {
        let tank = DrainingTank::new(DrainingTankParams::default()).unwrap();
        let dx = tank.rhs(0.0, &StateVector::from([0.0])).unwrap();
        assert_eq!(dx[0], 0.0);
    }

    #[test]
    fn rejects_negative_parameters() {
        let params = DrainingTankParams {
            k: -0.1,
            ..Default::default()
        };
        assert!(DrainingTank::new(params).is_err());
    }

    #[test]
    fn volume_uses_radius() {
        let tank = DrainingTank::new(DrainingTankParams {
            radius: 1.0,
            ..Default::default()
        })
        .unwrap();
        assert!((tank.volume(2.0) - 2.0 * PI).abs() < 1e-12);
        assert_eq!(tank.volume(-1.0), 0.0);
    }
}
