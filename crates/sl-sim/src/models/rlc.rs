//! Series RLC circuit driven by V(t) = V0 * cos(w t).
//!
//! L*Q'' + R*Q' + Q/C = V(t), integrated as dQ/dt = I, dI/dt = (V - R*I - Q/C) / L.

use std::fmt;

use serde::{Deserialize, Serialize};
use sl_core::{
    CoreError, CoreResult, ParamSpec, ParameterSet, Real, Tolerances, ensure_finite,
    ensure_non_negative, guarded_div, nearly_equal,
};

use crate::error::SimResult;
use crate::events::PostStep;
use crate::model::TransientModel;
use crate::scene::{Readout, Rgb, Update};
use crate::state::StateVector;

const CIRCUIT_WIDTH: Real = 8.0;
const CIRCUIT_HEIGHT: Real = 4.0;

pub const RLC_PARAMS: [ParamSpec; 7] = [
    ParamSpec::new("r", "Resistance", "ohm", 0.1, 50.0, 10.0),
    ParamSpec::new("l", "Inductance", "H", 0.1, 5.0, 1.0),
    ParamSpec::new("c", "Capacitance", "F", 0.01, 1.0, 0.1),
    ParamSpec::new("q0", "Initial charge", "C", 0.0, 5.0, 1.0),
    ParamSpec::new("i0", "Initial current", "A", -2.0, 2.0, 0.0),
    ParamSpec::new("v0", "Source amplitude", "V", 0.0, 20.0, 5.0),
    ParamSpec::new("omega", "Source frequency", "rad/s", 0.0, 10.0, 2.0),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RlcParams {
    pub r: Real,
    pub l: Real,
    pub c: Real,
    pub q0: Real,
    pub i0: Real,
    pub v0: Real,
    pub omega: Real,
}

impl Default for RlcParams {
    fn default() -> Self {
        Self {
            r: 10.0,
            l: 1.0,
            c: 0.1,
            q0: 1.0,
            i0: 0.0,
            v0: 5.0,
            omega: 2.0,
        }
    }
}

impl ParameterSet for RlcParams {
    fn specs(&self) -> &'static [ParamSpec] {
        &RLC_PARAMS
    }

    fn get(&self, name: &str) -> Option<Real> {
        match name {
            "r" => Some(self.r),
            "l" => Some(self.l),
            "c" => Some(self.c),
            "q0" => Some(self.q0),
            "i0" => Some(self.i0),
            "v0" => Some(self.v0),
            "omega" => Some(self.omega),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Real) -> CoreResult<()> {
        let slot = match name {
            "r" => &mut self.r,
            "l" => &mut self.l,
            "c" => &mut self.c,
            "q0" => &mut self.q0,
            "i0" => &mut self.i0,
            "v0" => &mut self.v0,
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

/// Damping regime from the sign of (R/2L)² - 1/(LC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DampingRegime {
    Overdamped,
    CriticallyDamped,
    Underdamped,
}

impl DampingRegime {
    pub fn discriminant(r: Real, l: Real, c: Real) -> Real {
        guarded_div(r, 2.0 * l).powi(2) - guarded_div(1.0, l * c)
    }

    pub fn classify(r: Real, l: Real, c: Real) -> Self {
        let disc = Self::discriminant(r, l, c);
        if nearly_equal(disc, 0.0, Tolerances::default()) {
            DampingRegime::CriticallyDamped
        } else if disc > 0.0 {
            DampingRegime::Overdamped
        } else {
            DampingRegime::Underdamped
        }
    }

    pub fn is_oscillatory(self) -> bool {
        self == DampingRegime::Underdamped
    }
}

impl fmt::Display for DampingRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DampingRegime::Overdamped => "overdamped",
            DampingRegime::CriticallyDamped => "critically damped",
            DampingRegime::Underdamped => "underdamped (oscillatory)",
        };
        f.write_str(text)
    }
}

/// RLC circuit. State: `[Q, I]`.
#[derive(Clone, Debug)]
pub struct RlcCircuit {
    params: RlcParams,
    regime: DampingRegime,
}

impl RlcCircuit {
    pub fn new(params: RlcParams) -> SimResult<Self> {
        ensure_non_negative(params.r, "r")?;
        ensure_non_negative(params.l, "l")?;
        ensure_non_negative(params.c, "c")?;
        ensure_finite(params.q0, "q0")?;
        ensure_finite(params.i0, "i0")?;
        ensure_finite(params.v0, "v0")?;
        ensure_finite(params.omega, "omega")?;
        let regime = DampingRegime::classify(params.r, params.l, params.c);
        Ok(Self { params, regime })
    }

    pub fn params(&self) -> &RlcParams {
        &self.params
    }

    /// Regime classified once from the parameters of this run.
    pub fn regime(&self) -> DampingRegime {
        self.regime
    }

    /// Source voltage V(t).
    pub fn source_voltage(&self, t: Real) -> Real {
        self.params.v0 * (self.params.omega * t).cos()
    }

    /// Brightness of the charge marker, saturating at 2 A.
    pub fn current_intensity(i: Real) -> Real {
        (i.abs() / 2.0).min(1.0)
    }

    pub fn readouts(&self, t: Real, x: &StateVector) -> Vec<Readout> {
        vec![
            Readout::new("charge", x[0], "C"),
            Readout::new("current", x[1], "A"),
            Readout::new("voltage", self.source_voltage(t), "V"),
        ]
    }

    pub fn scene_layout(&self) -> Vec<(String, Update)> {
        let p = &self.params;
        let (w, h) = (CIRCUIT_WIDTH, CIRCUIT_HEIGHT);
        vec![
            (
                "source".to_string(),
                Update::new()
                    .at([-w / 2.0, 0.0, 0.0])
                    .scaled(h)
                    .colored(Rgb::ORANGE)
                    .text("V(t)"),
            ),
            (
                "resistor".to_string(),
                Update::new()
                    .at([0.0, h, 0.0])
                    .colored(Rgb::RED)
                    .text(format!("R={:.1} ohm", p.r)),
            ),
            (
                "inductor".to_string(),
                Update::new()
                    .at([w / 2.0 - 1.0, h, 0.0])
                    .colored(Rgb::BLUE)
                    .text(format!("L={:.1} H", p.l)),
            ),
            (
                "capacitor".to_string(),
                Update::new()
                    .at([w / 2.0, 0.75, 0.0])
                    .colored(Rgb::GREEN)
                    .text(format!("C={:.2} F", p.c)),
            ),
            (
                "charge".to_string(),
                Update::new().at([-w / 2.0, 0.0, 0.0]).colored(Rgb::YELLOW),
            ),
            (
                "regime".to_string(),
                Update::new()
                    .at([0.0, -3.5, 0.0])
                    .text(format!("Regime: {}", self.regime)),
            ),
            ("label".to_string(), Update::new().at([0.0, -2.0, 0.0])),
        ]
    }

    pub fn scene_frame(&self, t: Real, x: &StateVector) -> Vec<(String, Update)> {
        let (q, i) = (x[0], x[1]);
        let intensity = Self::current_intensity(i);
        vec![
            (
                "charge".to_string(),
                Update::new().colored(Rgb::new(1.0, 1.0 - intensity, 0.0)),
            ),
            (
                "label".to_string(),
                Update::new().text(format!(
                    "Charge: {q:.3} C\nCurrent: {i:.3} A\nVoltage: {:.3} V\nTime: {t:.2} s",
                    self.source_voltage(t)
                )),
            ),
        ]
    }
}

impl TransientModel for RlcCircuit {
    fn dim(&self) -> usize {
        2
    }

    fn initial_state(&self) -> StateVector {
        StateVector::from([self.params.q0, self.params.i0])
    }

    fn rhs(&self, t: Real, x: &StateVector) -> SimResult<StateVector> {
        x.expect_len(2)?;
        let p = &self.params;
        let (q, i) = (x[0], x[1]);
        let di = if p.c > 0.0 {
            guarded_div(self.source_voltage(t) - p.r * i - q / p.c, p.l)
        } else {
            0.0
        };
        Ok(StateVector::from([i, di]))
    }

    fn post_step(&self, _t: Real, _prev: &StateVector, _x: &mut StateVector) -> PostStep {
        PostStep::proceed()
    }
}
