//! Side-by-side draining tanks, one fluid per tank, each emptying through a
//! bottom orifice: dh/dt = -(A_orifice / A_tank) * Cd * sqrt(2 g h).
//!
//! Columns drain independently. A column that runs dry is clamped at zero and
//! reported once; the run ends when every column is empty. Orifice diameter
//! and initial height can be tuned while the rig is live.

use serde::{Deserialize, Serialize};
use sl_core::params::find_spec;
use sl_core::units::{circle_area, m, torricelli_speed};
use sl_core::{
    CoreError, CoreResult, ParamSpec, ParameterSet, Real, ensure_non_negative, guarded_div,
};
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::events::{PostStep, StepEvent, StopReason};
use crate::model::TransientModel;
use crate::scene::{Readout, Rgb, Update};
use crate::state::StateVector;

/// Horizontal spacing between rendered tanks (m).
const COLUMN_SPACING: Real = 2.0;

const PALETTE: [Rgb; 4] = [Rgb::CYAN, Rgb::ORANGE, Rgb::YELLOW, Rgb::GREEN];

/// Rendered tank height (m), sized to hold the tallest allowed fill.
const TANK_SHELL_HEIGHT: Real = MULTI_FLUID_PARAMS[2].max * 1.2;

pub const MULTI_FLUID_PARAMS: [ParamSpec; 4] = [
    ParamSpec::new("tank_diameter", "Tank diameter", "m", 0.2, 3.0, 1.0),
    ParamSpec::new("orifice_diameter", "Orifice diameter", "m", 0.005, 0.3, 0.05),
    ParamSpec::new("h0", "Initial height", "m", 0.1, 5.0, 2.0),
    ParamSpec::new("cd", "Discharge coefficient", "-", 0.3, 1.0, 0.61),
];

/// One fluid and the orifice it drains through.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FluidColumn {
    pub name: String,
    /// Discharge coefficient
    pub cd: Real,
    /// Orifice diameter (m)
    pub orifice_diameter: Real,
    /// Initial height (m)
    pub h0: Real,
}

impl FluidColumn {
    pub fn new(name: impl Into<String>, cd: Real) -> Self {
        Self {
            name: name.into(),
            cd,
            orifice_diameter: 0.05,
            h0: 2.0,
        }
    }

    fn get(&self, field: &str) -> Option<Real> {
        match field {
            "cd" => Some(self.cd),
            "orifice_diameter" => Some(self.orifice_diameter),
            "h0" => Some(self.h0),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Real) -> bool {
        match field {
            "cd" => self.cd = value,
            "orifice_diameter" => self.orifice_diameter = value,
            "h0" => self.h0 = value,
            _ => return false,
        }
        true
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiFluidParams {
    /// Diameter shared by every tank (m)
    pub tank_diameter: Real,
    pub columns: Vec<FluidColumn>,
}

impl Default for MultiFluidParams {
    fn default() -> Self {
        Self {
            tank_diameter: 1.0,
            columns: vec![
                FluidColumn::new("water", 0.61),
                FluidColumn::new("light_oil", 0.58),
                FluidColumn::new("glycerin", 0.50),
            ],
        }
    }
}

impl MultiFluidParams {
    /// Column addressed by name or by zero-based index.
    fn column_index(&self, key: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name == key)
            .or_else(|| key.parse::<usize>().ok().filter(|i| *i < self.columns.len()))
    }

    fn unknown(name: &str) -> CoreError {
        CoreError::UnknownParam {
            name: name.to_string(),
        }
    }
}

/// Parameter names are `tank_diameter` and `<column>.<field>`, where the
/// column is addressed by name or index.
impl ParameterSet for MultiFluidParams {
    fn specs(&self) -> &'static [ParamSpec] {
        &MULTI_FLUID_PARAMS
    }

    fn get(&self, name: &str) -> Option<Real> {
        if name == "tank_diameter" {
            return Some(self.tank_diameter);
        }
        let (column, field) = name.split_once('.')?;
        self.columns[self.column_index(column)?].get(field)
    }

    fn set(&mut self, name: &str, value: Real) -> CoreResult<()> {
        if name == "tank_diameter" {
            self.tank_diameter = value;
            return Ok(());
        }
        let (column, field) = name.split_once('.').ok_or_else(|| Self::unknown(name))?;
        let index = self
            .column_index(column)
            .ok_or_else(|| Self::unknown(name))?;
        if !self.columns[index].set(field, value) {
            return Err(Self::unknown(name));
        }
        Ok(())
    }

    fn names(&self) -> Vec<String> {
        let mut names = vec!["tank_diameter".to_string()];
        for column in &self.columns {
            for field in ["orifice_diameter", "h0", "cd"] {
                names.push(format!("{}.{}", column.name, field));
            }
        }
        names
    }

    fn spec_for(&self, name: &str) -> CoreResult<&'static ParamSpec> {
        let field = match name.split_once('.') {
            Some((column, field)) => {
                if self.column_index(column).is_none() {
                    return Err(Self::unknown(name));
                }
                field
            }
            None => name,
        };
        find_spec(&MULTI_FLUID_PARAMS, field)
    }
}

/// Live adjustment accepted while a multi-fluid run is in progress.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tuning {
    OrificeDiameter { column: usize, diameter: Real },
    InitialHeight { column: usize, height: Real },
}

impl Tuning {
    pub fn column(&self) -> usize {
        match self {
            Tuning::OrificeDiameter { column, .. } | Tuning::InitialHeight { column, .. } => {
                *column
            }
        }
    }

    /// Whether the tuned value only matters for the initial state.
    pub fn affects_initial_state(&self) -> bool {
        matches!(self, Tuning::InitialHeight { .. })
    }
}

/// Multi-fluid draining rig. State: one height per column.
#[derive(Clone, Debug)]
pub struct MultiFluidTanks {
    params: MultiFluidParams,
}

impl MultiFluidTanks {
    pub fn new(params: MultiFluidParams) -> SimResult<Self> {
        if params.columns.is_empty() {
            return Err(SimError::InvalidArg {
                what: "at least one fluid column is required",
            });
        }
        ensure_non_negative(params.tank_diameter, "tank_diameter")?;
        for (i, column) in params.columns.iter().enumerate() {
            if column.name.is_empty() || column.name.contains('.') {
                return Err(SimError::InvalidArg {
                    what: "fluid column names must be non-empty and contain no '.'",
                });
            }
            if params.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(SimError::InvalidArg {
                    what: "duplicate fluid column name",
                });
            }
            ensure_non_negative(column.cd, "cd")?;
            ensure_non_negative(column.orifice_diameter, "orifice_diameter")?;
            ensure_non_negative(column.h0, "h0")?;
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &MultiFluidParams {
        &self.params
    }

    pub fn columns(&self) -> &[FluidColumn] {
        &self.params.columns
    }

    /// Orifice-to-tank area ratio for one column.
    pub fn area_ratio(&self, column: &FluidColumn) -> Real {
        let orifice = circle_area(m(column.orifice_diameter));
        let tank = circle_area(m(self.params.tank_diameter));
        guarded_div(orifice.value, tank.value)
    }

    /// Apply a live adjustment. The value is range-checked first; on error
    /// nothing changes.
    pub fn tune(&mut self, tuning: &Tuning) -> SimResult<()> {
        let count = self.params.columns.len();
        let index = tuning.column();
        if index >= count {
            return Err(SimError::UnknownColumn { index, count });
        }
        let column = &mut self.params.columns[index];
        match *tuning {
            Tuning::OrificeDiameter { diameter, .. } => {
                column.orifice_diameter = find_spec(&MULTI_FLUID_PARAMS, "orifice_diameter")?
                    .check(diameter)?;
            }
            Tuning::InitialHeight { height, .. } => {
                column.h0 = find_spec(&MULTI_FLUID_PARAMS, "h0")?.check(height)?;
            }
        }
        debug!(column = index, ?tuning, "multi-fluid rig tuned");
        Ok(())
    }

    pub fn readouts(&self, x: &StateVector) -> Vec<Readout> {
        self.params
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| Readout::new(format!("{}.height", c.name), x[i], "m"))
            .collect()
    }

    pub fn scene_layout(&self) -> Vec<(String, Update)> {
        let mut layout = Vec::with_capacity(self.params.columns.len() * 3);
        for (i, column) in self.params.columns.iter().enumerate() {
            let x_pos = i as Real * COLUMN_SPACING;
            let color = PALETTE[i % PALETTE.len()];
            layout.push((
                format!("tank.{}", column.name),
                Update::new()
                    .at([x_pos, 0.0, 0.0])
                    .scaled(TANK_SHELL_HEIGHT)
                    .colored(Rgb::GRAY),
            ));
            layout.push((
                format!("liquid.{}", column.name),
                Update::new()
                    .at([x_pos, 0.0, 0.0])
                    .scaled(column.h0)
                    .colored(color),
            ));
            layout.push((
                format!("label.{}", column.name),
                Update::new().at([x_pos, -0.5, 0.0]),
            ));
        }
        layout
    }

    pub fn scene_frame(&self, _t: Real, x: &StateVector) -> Vec<(String, Update)> {
        let mut frame = Vec::with_capacity(self.params.columns.len() * 2);
        for (i, column) in self.params.columns.iter().enumerate() {
            let h = x[i];
            frame.push((format!("liquid.{}", column.name), Update::new().scaled(h)));
            let text = if h > 0.0 {
                format!("{}: {h:.2} m", column.name)
            } else {
                format!("{}: empty", column.name)
            };
            frame.push((format!("label.{}", column.name), Update::new().text(text)));
        }
        frame
    }
}

impl TransientModel for MultiFluidTanks {
    fn dim(&self) -> usize {
        self.params.columns.len()
    }

    fn initial_state(&self) -> StateVector {
        self.params.columns.iter().map(|c| c.h0).collect::<Vec<_>>().into()
    }

    fn rhs(&self, _t: Real, x: &StateVector) -> SimResult<StateVector> {
        x.expect_len(self.dim())?;
        Ok(self
            .params
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let outflow = torricelli_speed(m(x[i])).value;
                -self.area_ratio(column) * column.cd * outflow
            })
            .collect::<Vec<_>>()
            .into())
    }

    fn post_step(&self, _t: Real, prev: &StateVector, x: &mut StateVector) -> PostStep {
        let mut post = PostStep::proceed();
        for (i, column) in self.params.columns.iter().enumerate() {
            if x[i] <= 0.0 {
                x[i] = 0.0;
                if prev[i] > 0.0 {
                    post.events.push(StepEvent::ColumnDrained {
                        column: i,
                        name: column.name.clone(),
                    });
                }
            }
        }
        if x.iter().all(|h| *h <= 0.0) {
            post.stop = Some(StopReason::Empty);
        }
        post
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_core::units::constants::G0_MPS2;

    fn rig() -> MultiFluidTanks {
        MultiFluidTanks::new(MultiFluidParams::default()).unwrap()
    }

    #[test]
    fn derivative_matches_torricelli() {
        let rig = rig();
        let x = rig.initial_state();
        let dx = rig.rhs(0.0, &x).unwrap();
        let ratio = (0.05_f64 / 1.0).powi(2);
        let expected = -ratio * 0.61 * (2.0 * G0_MPS2 * 2.0).sqrt();
        assert!((dx[0] - expected).abs() < 1e-12);
        // Lower Cd drains slower.
        assert!(dx[2] > dx[0]);
    }

    #[test]
    fn zero_tank_diameter_gives_zero_derivative() {
        let mut params = MultiFluidParams::default();
        params.tank_diameter = 0.0;
        let rig = MultiFluidTanks::new(params).unwrap();
        let dx = rig.rhs(0.0, &rig.initial_state()).unwrap();
        assert!(dx.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn drained_event_fires_once_per_column() {
        let rig = rig();
        let prev = StateVector::from([1e-4, 1.0, 0.0]);
        let mut x = StateVector::from([-1e-5, 0.9, 0.0]);
        let post = rig.post_step(0.0, &prev, &mut x);
        assert_eq!(x[0], 0.0);
        assert_eq!(
            post.events,
            vec![StepEvent::ColumnDrained {
                column: 0,
                name: "water".to_string()
            }]
        );
        assert_eq!(post.stop, None);

        let mut all_empty = StateVector::from([0.0, -0.1, 0.0]);
        let post = rig.post_step(0.0, &x, &mut all_empty);
        assert_eq!(post.stop, Some(StopReason::Empty));
        assert_eq!(post.events.len(), 1);
    }

    #[test]
    fn parameter_names_address_columns() {
        let mut params = MultiFluidParams::default();
        assert_eq!(params.get("water.cd"), Some(0.61));
        assert_eq!(params.get("2.cd"), Some(0.50));
        params.set("light_oil.orifice_diameter", 0.1).unwrap();
        assert_eq!(params.columns[1].orifice_diameter, 0.1);
        assert!(params.set("mercury.cd", 0.6).is_err());
        assert!(params.set("water.viscosity", 0.6).is_err());
        assert!(params.spec_for("water.h0").is_ok());
        assert!(params.check_ranges().is_ok());
        assert_eq!(params.names().len(), 10);
    }

    #[test]
    fn tune_checks_range_and_column() {
        let mut rig = rig();
        rig.tune(&Tuning::OrificeDiameter {
            column: 1,
            diameter: 0.1,
        })
        .unwrap();
        assert_eq!(rig.columns()[1].orifice_diameter, 0.1);

        let err = rig
            .tune(&Tuning::InitialHeight {
                column: 7,
                height: 1.0,
            })
            .unwrap_err();
        assert_eq!(err, SimError::UnknownColumn { index: 7, count: 3 });

        assert!(
            rig.tune(&Tuning::OrificeDiameter {
                column: 0,
                diameter: 5.0
            })
            .is_err()
        );
        assert_eq!(rig.columns()[0].orifice_diameter, 0.05);
    }

    #[test]
    fn requires_a_column() {
        let params = MultiFluidParams {
            tank_diameter: 1.0,
            columns: Vec::new(),
        };
        assert!(MultiFluidTanks::new(params).is_err());
    }

    #[test]
    fn column_names_must_be_addressable() {
        let mut params = MultiFluidParams::default();
        params.columns[2].name = "water".to_string();
        assert_eq!(
            MultiFluidTanks::new(params).unwrap_err(),
            SimError::InvalidArg {
                what: "duplicate fluid column name"
            }
        );

        for bad in ["", "crude.oil"] {
            let mut params = MultiFluidParams::default();
            params.columns[1].name = bad.to_string();
            assert!(MultiFluidTanks::new(params).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn tank_shell_does_not_follow_fill_height() {
        let shell = |rig: &MultiFluidTanks| {
            rig.scene_layout()
                .into_iter()
                .find(|(name, _)| name == "tank.water")
                .map(|(_, update)| update.scale)
                .unwrap()
        };
        let mut rig = rig();
        let before = shell(&rig);
        rig.tune(&Tuning::InitialHeight {
            column: 0,
            height: 5.0,
        })
        .unwrap();
        assert_eq!(shell(&rig), before);

        let layout = rig.scene_layout();
        let liquid = layout
            .iter()
            .find(|(name, _)| name == "liquid.water")
            .map(|(_, update)| update.scale)
            .unwrap();
        assert!(liquid <= before);
    }
}
