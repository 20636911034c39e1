//! Forced spring-mass-damper: m*x'' + b*x' + k*x = A*cos(w t).

use serde::{Deserialize, Serialize};
use sl_core::{
    CoreError, CoreResult, ParamSpec, ParameterSet, Real, ensure_finite, ensure_non_negative,
    guarded_div,
};

use crate::error::SimResult;
use crate::events::PostStep;
use crate::model::TransientModel;
use crate::scene::{Readout, Rgb, Update};
use crate::state::StateVector;

/// X position of the fixed wall the spring hangs from (m).
const WALL_X: Real = -3.0;

pub const SPRING_MASS_PARAMS: [ParamSpec; 7] = [
    ParamSpec::new("mass", "Mass", "kg", 0.1, 5.0, 1.0),
    ParamSpec::new("k", "Spring constant", "N/m", 0.5, 20.0, 4.0),
    ParamSpec::new("b", "Damping coefficient", "N*s/m", 0.0, 2.0, 0.3),
    ParamSpec::new("x0", "Initial position", "m", -2.0, 2.0, 1.0),
    ParamSpec::new("v0", "Initial velocity", "m/s", -5.0, 5.0, 0.0),
    ParamSpec::new("amplitude", "Forcing amplitude", "N", 0.0, 3.0, 1.0),
    ParamSpec::new("omega", "Forcing frequency", "rad/s", 0.0, 5.0, 1.5),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringMassParams {
    pub mass: Real,
    pub k: Real,
    pub b: Real,
    pub x0: Real,
    pub v0: Real,
    pub amplitude: Real,
    pub omega: Real,
}

impl Default for SpringMassParams {
    fn default() -> Self {
        Self {
            mass: 1.0,
            k: 4.0,
            b: 0.3,
            x0: 1.0,
            v0: 0.0,
            amplitude: 1.0,
            omega: 1.5,
        }
    }
}

impl ParameterSet for SpringMassParams {
    fn specs(&self) -> &'static [ParamSpec] {
        &SPRING_MASS_PARAMS
    }

    fn get(&self, name: &str) -> Option<Real> {
        match name {
            "mass" => Some(self.mass),
            "k" => Some(self.k),
            "b" => Some(self.b),
            "x0" => Some(self.x0),
            "v0" => Some(self.v0),
            "amplitude" => Some(self.amplitude),
            "omega" => Some(self.omega),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Real) -> CoreResult<()> {
        let slot = match name {
            "mass" => &mut self.mass,
            "k" => &mut self.k,
            "b" => &mut self.b,
            "x0" => &mut self.x0,
            "v0" => &mut self.v0,
            "amplitude" => &mut self.amplitude,
            "omega" => &mut self.omega,
            _ => {
                return Err(CoreError::UnknownParam {
                    name: name.to_string(),
                });
            }
        };
        *slot = value;
        Ok(())
    }
}

/// Spring-mass-damper. State: `[x, v]`.
#[derive(Clone, Debug)]
pub struct SpringMassDamper {
    params: SpringMassParams,
}

impl SpringMassDamper {
    pub fn new(params: SpringMassParams) -> SimResult<Self> {
        ensure_non_negative(params.mass, "mass")?;
        ensure_non_negative(params.k, "k")?;
        ensure_non_negative(params.b, "b")?;
        ensure_finite(params.x0, "x0")?;
        ensure_finite(params.v0, "v0")?;
        ensure_finite(params.amplitude, "amplitude")?;
        ensure_finite(params.omega, "omega")?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &SpringMassParams {
        &self.params
    }

    /// External force F(t).
    pub fn force(&self, t: Real) -> Real {
        self.params.amplitude * (self.params.omega * t).cos()
    }

    /// Kinetic plus spring potential energy (J).
    pub fn energy(&self, x: &StateVector) -> Real {
        0.5 * self.params.mass * x[1] * x[1] + 0.5 * self.params.k * x[0] * x[0]
    }

    pub fn readouts(&self, t: Real, x: &StateVector) -> Vec<Readout> {
        vec![
            Readout::new("position", x[0], "m"),
            Readout::new("velocity", x[1], "m/s"),
            Readout::new("force", self.force(t), "N"),
            Readout::new("energy", self.energy(x), "J"),
        ]
    }

    pub fn scene_layout(&self) -> Vec<(String, Update)> {
        let x0 = self.params.x0;
        vec![
            (
                "wall".to_string(),
                Update::new().at([WALL_X, 0.0, 0.0]).colored(Rgb::GRAY),
            ),
            (
                "spring".to_string(),
                Update::new()
                    .at([WALL_X + 0.1, 0.0, 0.0])
                    .scaled(x0 - WALL_X - 0.1)
                    .colored(Rgb::BLUE),
            ),
            (
                "mass".to_string(),
                Update::new().at([x0, 0.0, 0.0]).colored(Rgb::RED),
            ),
            (
                "equilibrium".to_string(),
                Update::new().at([0.0, -0.5, 0.0]).colored(Rgb::GREEN),
            ),
            ("label".to_string(), Update::new().at([0.0, 1.5, 0.0])),
        ]
    }

    pub fn scene_frame(&self, t: Real, x: &StateVector) -> Vec<(String, Update)> {
        let (pos, vel) = (x[0], x[1]);
        vec![
            ("mass".to_string(), Update::new().at([pos, 0.0, 0.0])),
            (
                "spring".to_string(),
                Update::new().scaled(pos - WALL_X - 0.1),
            ),
            (
                "label".to_string(),
                Update::new().text(format!(
                    "Position: {pos:.2} m\nVelocity: {vel:.2} m/s\nTime: {t:.2} s"
                )),
            ),
        ]
    }
}

impl TransientModel for SpringMassDamper {
    fn dim(&self) -> usize {
        2
    }

    fn initial_state(&self) -> StateVector {
        StateVector::from([self.params.x0, self.params.v0])
    }

    fn rhs(&self, t: Real, x: &StateVector) -> SimResult<StateVector> {
        x.expect_len(2)?;
        let p = &self.params;
        let (pos, vel) = (x[0], x[1]);
        let accel = guarded_div(self.force(t) - p.b * vel - p.k * pos, p.mass);
        Ok(StateVector::from([vel, accel]))
    }

    fn post_step(&self, _t: Real, _prev: &StateVector, _x: &mut StateVector) -> PostStep {
        PostStep::proceed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acceleration_at_rest() {
        let smd = SpringMassDamper::new(SpringMassParams::default()).unwrap();
        let dx = smd.rhs(0.0, &smd.initial_state()).unwrap();
        // F(0) = 1, k*x = 4 => a = -3
        assert_eq!(dx.as_slice(), &[0.0, -3.0]);
    }

    #[test]
    fn massless_body_does_not_accelerate() {
        let smd = SpringMassDamper::new(SpringMassParams {
            mass: 0.0,
            ..Default::default()
        })
        .unwrap();
        let dx = smd.rhs(0.0, &smd.initial_state()).unwrap();
        assert_eq!(dx[1], 0.0);
    }

    #[test]
    fn energy_of_initial_state() {
        let smd = SpringMassDamper::new(SpringMassParams::default()).unwrap();
        assert_eq!(smd.energy(&smd.initial_state()), 2.0);
    }

    #[test]
    fn rejects_negative_damping() {
        assert!(
            SpringMassDamper::new(SpringMassParams {
                b: -0.1,
                ..Default::default()
            })
            .is_err()
        );
    }
}
