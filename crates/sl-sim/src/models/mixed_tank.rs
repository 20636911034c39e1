//! Continuously stirred mixing tank (CSTR) with independent inflow and outflow.
//!
//! dC/dt = (Qin*Cin - Qout*C) / (A*h)
//! dh/dt = (Qin - Qout) / A

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use sl_core::{
    CoreError, CoreResult, ParamSpec, ParameterSet, Real, clamp_non_negative, ensure_non_negative,
    guarded_div,
};

use crate::error::{SimError, SimResult};
use crate::events::{PostStep, StopReason};
use crate::model::TransientModel;
use crate::scene::{Readout, Rgb, Update};
use crate::state::StateVector;

/// Concentration mapped to full red (g/L).
pub const CONCENTRATION_DISPLAY_MAX: Real = 20.0;

pub const MIXED_TANK_PARAMS: [ParamSpec; 7] = [
    ParamSpec::new("q_in", "Inflow rate", "m^3/s", 0.005, 0.1, 0.025),
    ParamSpec::new("q_out", "Outflow rate", "m^3/s", 0.005, 0.1, 0.015),
    ParamSpec::new("c_in", "Inlet concentration", "g/L", 0.0, 20.0, 8.0),
    ParamSpec::new("c0", "Initial concentration", "g/L", 0.0, 20.0, 0.0),
    ParamSpec::new("h0", "Initial level", "m", 0.1, 3.5, 0.5),
    ParamSpec::new("radius", "Tank radius", "m", 0.5, 3.0, 1.5),
    ParamSpec::new("tank_height", "Tank height", "m", 1.0, 10.0, 4.0),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixedTankParams {
    pub q_in: Real,
    pub q_out: Real,
    pub c_in: Real,
    pub c0: Real,
    pub h0: Real,
    pub radius: Real,
    pub tank_height: Real,
}

impl Default for MixedTankParams {
    fn default() -> Self {
        Self {
            q_in: 0.025,
            q_out: 0.015,
            c_in: 8.0,
            c0: 0.0,
            h0: 0.5,
            radius: 1.5,
            tank_height: 4.0,
        }
    }
}

impl ParameterSet for MixedTankParams {
    fn specs(&self) -> &'static [ParamSpec] {
        &MIXED_TANK_PARAMS
    }

    fn get(&self, name: &str) -> Option<Real> {
        match name {
            "q_in" => Some(self.q_in),
            "q_out" => Some(self.q_out),
            "c_in" => Some(self.c_in),
            "c0" => Some(self.c0),
            "h0" => Some(self.h0),
            "radius" => Some(self.radius),
            "tank_height" => Some(self.tank_height),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Real) -> CoreResult<()> {
        let slot = match name {
            "q_in" => &mut self.q_in,
            "q_out" => &mut self.q_out,
            "c_in" => &mut self.c_in,
            "c0" => &mut self.c0,
            "h0" => &mut self.h0,
            "radius" => &mut self.radius,
            "tank_height" => &mut self.tank_height,
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

/// Mixing tank. State: `[C, h]`.
#[derive(Clone, Debug)]
pub struct MixedTank {
    params: MixedTankParams,
}

impl MixedTank {
    pub fn new(params: MixedTankParams) -> SimResult<Self> {
        for (value, what) in [
            (params.q_in, "q_in"),
            (params.q_out, "q_out"),
            (params.c_in, "c_in"),
            (params.c0, "c0"),
            (params.h0, "h0"),
            (params.radius, "radius"),
            (params.tank_height, "tank_height"),
        ] {
            ensure_non_negative(value, what)?;
        }
        if params.h0 > params.tank_height {
            return Err(SimError::InvalidArg {
                what: "initial level exceeds tank height",
            });
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &MixedTankParams {
        &self.params
    }

    /// Cross-sectional area (m²).
    pub fn area(&self) -> Real {
        PI * self.params.radius * self.params.radius
    }

    pub fn readouts(&self, x: &StateVector) -> Vec<Readout> {
        vec![
            Readout::new("concentration", x[0], "g/L"),
            Readout::new("height", x[1], "m"),
            Readout::new("volume", self.area() * x[1], "m^3"),
        ]
    }

    pub fn scene_layout(&self) -> Vec<(String, Update)> {
        let p = &self.params;
        let color = Rgb::concentration(p.c0, CONCENTRATION_DISPLAY_MAX);
        vec![
            (
                "tank".to_string(),
                Update::new()
                    .at([0.0, 0.0, 0.0])
                    .scaled(p.tank_height)
                    .colored(Rgb::WHITE),
            ),
            (
                "liquid".to_string(),
                Update::new()
                    .at([0.0, 0.0, 0.0])
                    .scaled(p.h0)
                    .colored(color),
            ),
            (
                "inlet".to_string(),
                Update::new()
                    .at([-p.radius - 0.5, p.tank_height * 0.9, 0.0])
                    .colored(Rgb::BLUE),
            ),
            (
                "outlet".to_string(),
                Update::new()
                    .at([p.radius + 0.1, 0.0, 0.0])
                    .colored(Rgb::RED),
            ),
            (
                "indicator".to_string(),
                Update::new()
                    .at([p.radius + 1.0, p.tank_height / 2.0, 0.0])
                    .scaled(p.tank_height)
                    .colored(color),
            ),
            (
                "label".to_string(),
                Update::new().at([0.0, p.tank_height + 0.7, 0.0]),
            ),
        ]
    }

    pub fn scene_frame(&self, t: Real, x: &StateVector) -> Vec<(String, Update)> {
        let (c, h) = (x[0], x[1]);
        let color = Rgb::concentration(c, CONCENTRATION_DISPLAY_MAX);
        let status = if h <= 0.0 {
            "Tank empty.\n"
        } else if h >= self.params.tank_height {
            "Tank full.\n"
        } else {
            ""
        };
        vec![
            (
                "liquid".to_string(),
                Update::new().scaled(h).colored(color),
            ),
            ("indicator".to_string(), Update::new().colored(color)),
            (
                "label".to_string(),
                Update::new().text(format!(
                    "{status}t = {t:.1} s\nLevel: {h:.2} m\nC(t): {c:.2} g/L"
                )),
            ),
        ]
    }
}

impl TransientModel for MixedTank {
    fn dim(&self) -> usize {
        2
    }

    fn initial_state(&self) -> StateVector {
        StateVector::from([self.params.c0, self.params.h0])
    }

    fn rhs(&self, _t: Real, x: &StateVector) -> SimResult<StateVector> {
        x.expect_len(2)?;
        let p = &self.params;
        let (c, h) = (x[0], x[1]);
        let area = self.area();
        let dc = guarded_div(p.q_in * p.c_in - p.q_out * c, area * h);
        let dh = guarded_div(p.q_in - p.q_out, area);
        Ok(StateVector::from([dc, dh]))
    }

    fn post_step(&self, _t: Real, _prev: &StateVector, x: &mut StateVector) -> PostStep {
        clamp_non_negative(&mut x[0]);
        if x[1] <= 0.0 {
            x[1] = 0.0;
            return PostStep::stop(StopReason::Empty);
        }
        if x[1] >= self.params.tank_height {
            x[1] = self.params.tank_height;
            return PostStep::stop(StopReason::Full);
        }
        PostStep::proceed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivative_at_defaults() {
        let tank = MixedTank::new(MixedTankParams::default()).unwrap();
        let dx = tank.rhs(0.0, &tank.initial_state()).unwrap();
        let area = PI * 1.5 * 1.5;
        assert!((dx[0] - 0.025 * 8.0 / (area * 0.5)).abs() < 1e-12);
        assert!((dx[1] - 0.010 / area).abs() < 1e-12);
    }

    #[test]
    fn empty_tank_concentration_derivative_is_guarded() {
        let tank = MixedTank::new(MixedTankParams::default()).unwrap();
        let dx = tank.rhs(0.0, &StateVector::from([3.0, 0.0])).unwrap();
        assert_eq!(dx[0], 0.0);
        assert!(dx[1].is_finite());
    }

    #[test]
    fn stop_rules_clamp_exactly() {
        let tank = MixedTank::new(MixedTankParams::default()).unwrap();
        let prev = tank.initial_state();

        let mut over = StateVector::from([1.0, 4.0001]);
        assert_eq!(
            tank.post_step(0.0, &prev, &mut over).stop,
            Some(StopReason::Full)
        );
        assert_eq!(over[1], 4.0);

        let mut under = StateVector::from([-0.01, -0.2]);
        assert_eq!(
            tank.post_step(0.0, &prev, &mut under).stop,
            Some(StopReason::Empty)
        );
        assert_eq!(under.as_slice(), &[0.0, 0.0]);
    }

    #[test]
    fn initial_level_above_rim_is_rejected() {
        let params = MixedTankParams {
            h0: 5.0,
            tank_height: 4.0,
            ..Default::default()
        };
        assert!(matches!(
            MixedTank::new(params),
            Err(SimError::InvalidArg { .. })
        ));
    }
}
