//! Scenario validation.

use sl_core::{ParameterSet, Real};
use sl_sim::{Model, SimError};

use crate::schema::Scenario;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Scenario name must not be empty")]
    EmptyName,

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Model rejected: {0}")]
    Model(#[from] SimError),
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, value: Real) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive"))
    }
}

/// Check a migrated scenario: run options, declared parameter ranges, and
/// physical validity of the model.
pub fn validate_scenario(scenario: &Scenario) -> Result<(), ValidationError> {
    if scenario.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }
    if scenario.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if let Some(dt) = scenario.dt {
        return Err(invalid("dt", dt, "top-level dt belongs under run"));
    }

    let run = &scenario.run;
    if let Some(dt) = run.dt {
        positive("run.dt", dt)?;
    }
    if let Some(rate) = run.rate_hz {
        positive("run.rate_hz", rate)?;
    }
    if !run.t_end.is_finite() || run.t_end < 0.0 {
        return Err(invalid("run.t_end", run.t_end, "must be non-negative"));
    }
    if run.max_steps == 0 {
        return Err(invalid("run.max_steps", run.max_steps, "must be positive"));
    }
    if run.record_every == 0 {
        return Err(invalid(
            "run.record_every",
            run.record_every,
            "must be positive",
        ));
    }

    let params = scenario.model.parameters();
    for name in params.names() {
        let spec = params
            .spec_for(&name)
            .map_err(|e| invalid(&name, "?", &e.to_string()))?;
        let value = params.get(&name).unwrap_or(Real::NAN);
        if let Err(e) = spec.check(value) {
            return Err(invalid(&format!("model.{name}"), value, &e.to_string()));
        }
    }

    Model::from_params(scenario.model.clone())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_sim::{ModelKind, ModelParams};

    fn scenario(kind: ModelKind) -> Scenario {
        Scenario::new("test", ModelParams::defaults(kind))
    }

    #[test]
    fn defaults_validate() {
        for kind in ModelKind::ALL {
            validate_scenario(&scenario(kind)).unwrap();
        }
    }

    #[test]
    fn out_of_range_parameter_is_reported() {
        let mut s = scenario(ModelKind::SpringMass);
        s.model.parameters_mut().set("k", 100.0).unwrap();
        let err = validate_scenario(&s).unwrap_err();
        assert!(err.to_string().contains("model.k"), "{err}");
    }

    #[test]
    fn physically_inconsistent_model_is_reported() {
        let mut s = scenario(ModelKind::MixedTank);
        let params = s.model.parameters_mut();
        params.set("tank_height", 2.0).unwrap();
        params.set("h0", 3.0).unwrap();
        assert!(matches!(
            validate_scenario(&s),
            Err(ValidationError::Model(_))
        ));
    }

    #[test]
    fn duplicate_column_names_are_reported() {
        let mut s = scenario(ModelKind::MultiFluid);
        if let ModelParams::MultiFluid(params) = &mut s.model {
            params.columns[1].name = "water".to_string();
        }
        assert!(matches!(
            validate_scenario(&s),
            Err(ValidationError::Model(_))
        ));
    }

    #[test]
    fn bad_run_options_are_reported() {
        let mut s = scenario(ModelKind::Rlc);
        s.run.dt = Some(0.0);
        assert!(validate_scenario(&s).is_err());

        let mut s = scenario(ModelKind::Rlc);
        s.run.record_every = 0;
        assert!(validate_scenario(&s).is_err());

        let mut s = scenario(ModelKind::Rlc);
        s.version = 7;
        assert!(matches!(
            validate_scenario(&s),
            Err(ValidationError::UnsupportedVersion { version: 7 })
        ));
    }
}
