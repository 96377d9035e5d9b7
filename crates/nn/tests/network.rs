//! End-to-end tests for networks built on a shared tape.
//!
//! These tests cover the network round trip:
//! - A seeded 2-3-1 network gives the same output and loss on every build
//! - Backward through the loss reaches every parameter with a finite gradient
//! - Analytical parameter gradients agree with central differences

use approx::assert_relative_eq;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tapegrad_engine::{Op, Tape};
use tapegrad_nn::{Activation, LayerConfig, Mlp, MlpConfig, NnError};

const INPUTS: [f64; 2] = [0.5, -1.5];
const TARGETS: [f64; 1] = [0.25];

fn round_trip_config(seed: u64) -> MlpConfig {
    MlpConfig::new(2, seed)
        .with_layer(3, Activation::Tanh)
        .with_layer(1, Activation::Linear)
}

// ============================================================================
// Round Trip
// ============================================================================

#[test]
fn round_trip_is_deterministic() {
    let config = round_trip_config(42);
    let mut results = Vec::new();

    for _ in 0..2 {
        let mut tape = Tape::new();
        let mlp = Mlp::from_config(&mut tape, &config).unwrap();
        let output = mlp.predict(&mut tape, &INPUTS).unwrap();
        let loss = mlp.loss(&mut tape, &INPUTS, &TARGETS).unwrap();
        results.push((output, tape.value(loss)));
    }

    assert_eq!(results[0], results[1]);

    let (output, loss) = &results[0];
    assert_eq!(output.len(), 1);
    assert_relative_eq!(*loss, (output[0] - TARGETS[0]).powi(2), epsilon = 1e-12);
}

#[test]
fn round_trip_gradients_reach_every_parameter() {
    let mut tape = Tape::new();
    let mlp = Mlp::from_config(&mut tape, &round_trip_config(42)).unwrap();

    let loss = mlp.loss(&mut tape, &INPUTS, &TARGETS).unwrap();
    tape.backward(loss);

    let params = mlp.params();
    assert_eq!(params.len(), 13);

    let reachable = tape.topological_order(loss);
    for &param in &params {
        assert_eq!(tape.op(param), Op::Leaf);
        assert!(reachable.contains(&param));
        assert!(tape.grad(param).is_finite());
    }

    // the output bias sees dL/dout directly
    let output = mlp.predict(&mut tape, &INPUTS).unwrap()[0];
    let bias = *params.last().unwrap();
    assert_relative_eq!(tape.grad(bias), 2.0 * (output - TARGETS[0]), epsilon = 1e-12);
}

#[test]
fn round_trip_matches_numerical_gradients() {
    let mut tape = Tape::new();
    let mlp = Mlp::from_config(&mut tape, &round_trip_config(42)).unwrap();

    let loss = mlp.loss(&mut tape, &INPUTS, &TARGETS).unwrap();
    tape.grad_check(loss, &mlp.params(), 1e-5, 1e-5).unwrap();
}

#[test]
fn loss_is_zero_at_target() {
    let mut tape = Tape::new();
    let mlp = Mlp::from_config(&mut tape, &round_trip_config(3)).unwrap();

    let target = mlp.predict(&mut tape, &INPUTS).unwrap();
    let loss = mlp.loss(&mut tape, &INPUTS, &target).unwrap();
    tape.backward(loss);

    assert_eq!(tape.value(loss), 0.0);
    assert!(mlp.gradients(&tape).iter().all(|&g| g == 0.0));
}

#[test]
fn deep_network_gradients_stay_finite() {
    let mut tape = Tape::new();
    let mut rng = StdRng::seed_from_u64(5);
    let layers: Vec<LayerConfig> = [
        (8, Activation::Relu),
        (8, Activation::Sigmoid),
        (8, Activation::Tanh),
        (2, Activation::Linear),
    ]
    .into_iter()
    .map(|(width, activation)| LayerConfig { width, activation })
    .collect();

    let mlp = Mlp::new(&mut tape, 4, &layers, &mut rng).unwrap();
    let loss = mlp
        .loss(&mut tape, &[1.0, -0.5, 0.25, 2.0], &[0.0, 1.0])
        .unwrap();
    tape.backward(loss);

    assert_eq!(mlp.parameter_count(), 8 * 5 + 8 * 9 + 8 * 9 + 2 * 9);
    assert!(mlp.gradients(&tape).iter().all(|g| g.is_finite()));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn width_errors_leave_no_partial_loss() {
    let mut tape = Tape::new();
    let mlp = Mlp::from_config(&mut tape, &round_trip_config(1)).unwrap();
    let before = tape.len();

    assert!(matches!(
        mlp.loss(&mut tape, &INPUTS, &[]),
        Err(NnError::TargetWidth { expected: 1, got: 0 })
    ));
    assert!(matches!(
        mlp.loss(&mut tape, &[1.0, 2.0, 3.0], &TARGETS),
        Err(NnError::InputWidth { expected: 2, got: 3 })
    ));
    assert_eq!(tape.len(), before);
}

#[test]
fn config_json_builds_same_network() {
    let config = round_trip_config(42);
    let parsed = MlpConfig::from_json(&config.to_json().unwrap()).unwrap();

    let mut first = Tape::new();
    let mut second = Tape::new();
    let a = Mlp::from_config(&mut first, &config).unwrap();
    let b = Mlp::from_config(&mut second, &parsed).unwrap();

    assert_eq!(
        a.predict(&mut first, &INPUTS).unwrap(),
        b.predict(&mut second, &INPUTS).unwrap()
    );
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_bounded_inputs_give_finite_gradients(
        seed in any::<u64>(),
        x0 in -3.0f64..3.0,
        x1 in -3.0f64..3.0,
        target in -3.0f64..3.0,
    ) {
        let mut tape = Tape::new();
        let mlp = Mlp::from_config(&mut tape, &round_trip_config(seed)).unwrap();

        let loss = mlp.loss(&mut tape, &[x0, x1], &[target]).unwrap();
        tape.backward(loss);

        prop_assert!(tape.value(loss) >= 0.0);
        prop_assert!(mlp.gradients(&tape).iter().all(|g| g.is_finite()));
    }
}
