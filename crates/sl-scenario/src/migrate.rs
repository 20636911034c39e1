//! Scenario version migration.

use tracing::debug;

use crate::ScenarioError;
use crate::schema::Scenario;

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut scenario: Scenario) -> Result<Scenario, ScenarioError> {
    while scenario.version < LATEST_VERSION {
        scenario = migrate_one_version(scenario)?;
    }
    Ok(scenario)
}

fn migrate_one_version(scenario: Scenario) -> Result<Scenario, ScenarioError> {
    match scenario.version {
        0 => migrate_v0_to_v1(scenario),
        v => Err(ScenarioError::Migration {
            what: format!("No migration path from version {v}"),
        }),
    }
}

/// v0 kept `dt` next to the model; v1 moved it under `run`.
fn migrate_v0_to_v1(mut scenario: Scenario) -> Result<Scenario, ScenarioError> {
    if let Some(dt) = scenario.dt.take() {
        if scenario.run.dt.is_some() {
            return Err(ScenarioError::Migration {
                what: "dt given both at top level and under run".to_string(),
            });
        }
        scenario.run.dt = Some(dt);
    }
    debug!(name = %scenario.name, "migrated scenario v0 -> v1");
    scenario.version = 1;
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_sim::{ModelKind, ModelParams};

    fn v0(dt: Option<f64>) -> Scenario {
        let mut scenario = Scenario::new("old", ModelParams::defaults(ModelKind::SpringMass));
        scenario.version = 0;
        scenario.dt = dt;
        scenario
    }

    #[test]
    fn top_level_dt_moves_under_run() {
        let migrated = migrate_to_latest(v0(Some(0.02))).unwrap();
        assert_eq!(migrated.version, LATEST_VERSION);
        assert_eq!(migrated.dt, None);
        assert_eq!(migrated.run.dt, Some(0.02));
    }

    #[test]
    fn conflicting_dt_is_an_error() {
        let mut scenario = v0(Some(0.02));
        scenario.run.dt = Some(0.01);
        assert!(migrate_to_latest(scenario).is_err());
    }

    #[test]
    fn latest_is_untouched() {
        let scenario = Scenario::new("new", ModelParams::defaults(ModelKind::Rlc));
        assert_eq!(migrate_to_latest(scenario.clone()).unwrap(), scenario);
    }
}
