use std::f64::consts::FRAC_PI_2;

use double_pendulum_sim::{integrate, PendulumModel, SimError, State};

fn nearly_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 + 1e-9 * b.abs()
}

fn assert_state(actual: &State, expected: &State) {
    for (a, b) in actual.iter().zip(expected) {
        assert!(nearly_equal(*a, *b), "got {actual:?}, expected {expected:?}");
    }
}

fn energy(model: &PendulumModel, s: &State) -> f64 {
    let (l1, l2, m1, m2, g) = (model.l1(), model.l2(), model.m1(), model.m2(), model.g());
    let [t1, t2, w1, w2] = *s;
    let kinetic = 0.5 * (m1 + m2) * l1 * l1 * w1 * w1
        + 0.5 * m2 * l2 * l2 * w2 * w2
        + m2 * l1 * l2 * w1 * w2 * (t1 - t2).cos();
    let potential = -(m1 + m2) * g * l1 * t1.cos() - m2 * g * l2 * t2.cos();
    kinetic + potential
}

#[test]
fn default_scenario_matches_recorded_trajectory() {
    let model = PendulumModel::new(2.0, 2.0, 1.0, 3.0).unwrap();
    let y0 = [FRAC_PI_2, FRAC_PI_2, 3.0, 0.0];
    let traj = integrate(&model, &y0, 25.0, 0.03, "rk4").unwrap();

    assert_eq!(traj.len(), 834);
    assert_eq!(traj.states().len(), 834);
    assert_eq!(traj.states()[0], y0);
    assert!(nearly_equal(traj.time()[833], 24.99));

    assert_state(
        &traj.states()[1],
        &[1.6582609682637897, 1.571236174299647, 2.8215481605453863, 0.042065221074063984],
    );
    assert_state(
        &traj.states()[10],
        &[2.182034374515022, 1.6753710881088648, 1.2721747144035616, 0.4842151986018429],
    );
    assert_state(
        &traj.states()[100],
        &[-1.400208235997031, -4.053074391873722, -2.8065582760554584, -4.432175170730487],
    );
    assert_state(
        &traj.states()[300],
        &[-1.6047596614151567, -8.043834381005501, 1.035399451612598, 1.7797463864191687],
    );
    assert_state(
        &traj.states()[500],
        &[0.8764869911464178, -3.695796062220224, 1.8033739234866897, 2.8070363720809905],
    );
    assert_state(
        &traj.states()[833],
        &[-0.7354471356195587, 26.554532660682415, -3.2020380562171957, 1.2134654387083335],
    );
}

#[test]
fn time_grid_is_uniform() {
    let model = PendulumModel::new(1.0, 1.5, 2.0, 0.5).unwrap();
    let traj = integrate(&model, &[0.4, -0.4, 0.0, 1.0], 2.0, 0.05, "rk4").unwrap();
    assert_eq!(traj.len(), 41);
    for (i, t) in traj.time().iter().enumerate() {
        assert_eq!(*t, i as f64 * 0.05);
    }
}

#[test]
fn small_angles_stay_near_equilibrium() {
    let model = PendulumModel::new(2.0, 2.0, 1.0, 3.0).unwrap();
    let traj = integrate(&model, &[0.01, 0.01, 0.0, 0.0], 1.0, 0.001, "rk4").unwrap();
    assert!(traj
        .states()
        .iter()
        .all(|s| s[0].abs() < 0.5 && s[1].abs() < 0.5));
}

#[test]
fn energy_is_conserved_for_fine_steps() {
    let model = PendulumModel::new(2.0, 2.0, 1.0, 3.0).unwrap();
    let traj = integrate(&model, &[FRAC_PI_2, FRAC_PI_2, 3.0, 0.0], 1.0, 0.001, "rk4").unwrap();
    let e0 = energy(&model, &traj.states()[0]);
    for s in traj.states() {
        let drift = (energy(&model, s) - e0).abs() / e0.abs();
        assert!(drift < 1e-8, "energy drift {drift}");
    }
}

#[test]
fn model_can_be_shared_across_threads() {
    let model = PendulumModel::new(1.0, 1.0, 1.0, 1.0).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|k| {
            std::thread::spawn(move || {
                integrate(&model, &[0.1 * k as f64, 0.0, 0.0, 0.0], 1.0, 0.01, "rk4").unwrap()
            })
        })
        .collect();
    let serial = integrate(&model, &[0.1 * 3.0, 0.0, 0.0, 0.0], 1.0, 0.01, "rk4").unwrap();
    let parallel: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(parallel[3], serial);
}

#[test]
fn invalid_inputs_are_rejected_before_integrating() {
    let model = PendulumModel::new(1.0, 1.0, 1.0, 1.0).unwrap();
    let y0 = [0.0; 4];
    assert!(matches!(
        integrate(&model, &y0, -1.0, 0.1, "rk4"),
        Err(SimError::InvalidArgument { .. })
    ));
    assert!(matches!(
        integrate(&model, &y0, 1.0, 0.1, "euler"),
        Err(SimError::UnsupportedMethod { .. })
    ));
    assert!(matches!(
        PendulumModel::new(-1.0, 1.0, 1.0, 1.0),
        Err(SimError::InvalidParameter { .. })
    ));
}
