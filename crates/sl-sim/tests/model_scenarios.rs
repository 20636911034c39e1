//! Reference runs for each demo: first-step values, stop rules and regimes.

use sl_sim::{
    DampingRegime, ModelKind, ModelParams, Phase, RlcParams, Session, StepEvent, StopReason,
    TickOutcome,
};

fn run_to_stop(session: &mut Session, limit: u64) -> StopReason {
    session.start().expect("start");
    for _ in 0..limit {
        if let TickOutcome::Stopped(reason) = session.tick().expect("tick") {
            return reason;
        }
    }
    panic!("no stop within {limit} ticks (t = {})", session.t());
}

#[test]
fn draining_tank_first_step_and_termination() {
    let mut session =
        Session::from_params(ModelParams::defaults(ModelKind::DrainingTank), 0.01).unwrap();
    session.start().unwrap();
    session.tick().unwrap();
    let expected = 2.0 - 0.4 * 2.0_f64.sqrt() * 0.01;
    assert!((session.state()[0] - expected).abs() < 1e-12);
    assert!((session.state()[0] - 1.99434).abs() < 1e-5);

    session.reset();
    let reason = run_to_stop(&mut session, 10_000);
    assert_eq!(reason, StopReason::Empty);
    assert_eq!(session.state()[0], 0.0);
    assert!(session.t() > 0.0);
    assert_eq!(session.phase(), Phase::Stopped(StopReason::Empty));
    // Analytic emptying time is 2*sqrt(h0)/k.
    let analytic = 2.0 * 2.0_f64.sqrt() / 0.4;
    assert!((session.t() - analytic).abs() < 0.1);
}

#[test]
fn mixed_tank_fills_to_the_rim() {
    let mut session =
        Session::from_params(ModelParams::defaults(ModelKind::MixedTank), 0.1).unwrap();
    session.start().unwrap();

    let mut last_h = session.state()[1];
    loop {
        match session.tick().unwrap() {
            TickOutcome::Advanced => {
                let h = session.state()[1];
                assert!(h > last_h, "height must rise: {h} after {last_h}");
                assert!(h < 4.0);
                last_h = h;
            }
            TickOutcome::Stopped(reason) => {
                assert_eq!(reason, StopReason::Full);
                break;
            }
            TickOutcome::Skipped => panic!("session stopped running"),
        }
        assert!(session.ticks() < 10_000);
    }
    assert_eq!(session.state()[1], 4.0);
    let c = session.state()[0];
    assert!(c > 0.0 && c < 8.0, "concentration {c} should approach the inlet value");
}

#[test]
fn rlc_without_resistance_oscillates() {
    let params = ModelParams::Rlc(RlcParams {
        r: 0.0,
        q0: 1.0,
        i0: 0.0,
        v0: 0.0,
        ..RlcParams::default()
    });
    let mut session = Session::with_default_dt(params).unwrap();
    assert_eq!(session.model().regime(), Some(DampingRegime::Underdamped));
    assert!(DampingRegime::Underdamped.is_oscillatory());

    session.start().unwrap();
    let mut min_q: f64 = 1.0;
    for _ in 0..1_000 {
        assert_eq!(session.tick().unwrap(), TickOutcome::Advanced);
        min_q = min_q.min(session.state()[0]);
    }
    assert!(min_q < 0.0, "charge never changed sign");
}

#[test]
fn spring_mass_runs_without_stop_rule() {
    let mut session =
        Session::with_default_dt(ModelParams::defaults(ModelKind::SpringMass)).unwrap();
    session.start().unwrap();
    for _ in 0..2_000 {
        assert_eq!(session.tick().unwrap(), TickOutcome::Advanced);
    }
    assert!(session.state().is_finite());
    assert!((session.t() - 20.0).abs() < 1e-9);
}

#[test]
fn multi_fluid_columns_drain_independently() {
    let mut session =
        Session::with_default_dt(ModelParams::defaults(ModelKind::MultiFluid)).unwrap();
    let reason = run_to_stop(&mut session, 200_000);
    assert_eq!(reason, StopReason::Empty);

    let drained: Vec<(usize, &str)> = session
        .events()
        .iter()
        .map(|record| match &record.event {
            StepEvent::ColumnDrained { column, name } => (*column, name.as_str()),
        })
        .collect();
    // Highest discharge coefficient empties first.
    assert_eq!(
        drained,
        vec![(0, "water"), (1, "light_oil"), (2, "glycerin")]
    );
    let times: Vec<f64> = session.events().iter().map(|r| r.t).collect();
    assert!(times[0] < times[1] && times[1] < times[2]);
    assert_eq!(times[2], session.t());
}
