//! Built-in scenarios, one per demo, with the demo's own defaults.

use sl_core::Real;
use sl_sim::{ModelKind, ModelParams};

use crate::schema::{RunDef, Scenario};

/// Horizon long enough to show the demo's full behavior.
fn horizon(kind: ModelKind) -> Real {
    match kind {
        ModelKind::DrainingTank => 20.0,
        ModelKind::MultiFluid => 600.0,
        ModelKind::MixedTank => 600.0,
        ModelKind::Rlc => 10.0,
        ModelKind::SpringMass => 30.0,
    }
}

pub fn preset(kind: ModelKind) -> Scenario {
    let mut scenario = Scenario::new(kind.as_str().replace('_', "-"), ModelParams::defaults(kind));
    scenario.description = Some(kind.title().to_string());
    scenario.run = RunDef {
        t_end: horizon(kind),
        ..RunDef::default()
    };
    scenario
}

pub fn presets() -> Vec<Scenario> {
    ModelKind::ALL.into_iter().map(preset).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate_scenario;

    #[test]
    fn every_preset_validates() {
        let all = presets();
        assert_eq!(all.len(), ModelKind::ALL.len());
        for scenario in &all {
            validate_scenario(scenario).unwrap();
        }
        assert_eq!(all[0].name, "draining-tank");
    }
}
