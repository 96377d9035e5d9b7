//! A small multilayer perceptron on a scalar tape.
//!
//! Run with: cargo run -p tapegrad-nn --example mlp
//!
//! This example demonstrates:
//! - Building a seeded 2-3-1 network from a JSON configuration
//! - Running it on a batch of inputs
//! - Recording a squared-error loss and backpropagating into every parameter
//! - Checking the parameter gradients numerically

use tapegrad_engine::Tape;
use tapegrad_nn::{Mlp, MlpConfig, NnError};

const CONFIG: &str = r#"{
    "inputs": 2,
    "seed": 42,
    "layers": [
        { "width": 3, "activation": "tanh" },
        { "width": 1, "activation": "linear" }
    ]
}"#;

fn main() -> Result<(), NnError> {
    println!("=== Multilayer Perceptron ===\n");

    // -------------------------------------------------------------------------
    // 1. Build
    // -------------------------------------------------------------------------
    println!("1. Build from configuration");
    println!("---------------------------");
    println!();

    let config = MlpConfig::from_json(CONFIG)?;
    let mut tape = Tape::new();
    let mlp = Mlp::from_config(&mut tape, &config)?;

    println!("inputs: {}", mlp.input_width());
    for (i, layer) in mlp.layers().iter().enumerate() {
        let activation = layer.neurons()[0].activation();
        println!("layer {i}: {} neurons, {activation}", layer.output_width());
    }
    println!("parameters: {}", mlp.parameter_count());
    println!();

    // -------------------------------------------------------------------------
    // 2. Run
    // -------------------------------------------------------------------------
    println!("2. Run");
    println!("------");
    println!();

    let samples = [([2.0, 3.0], 1.0), ([3.0, -1.0], -1.0), ([0.5, 1.0], -1.0)];
    for (inputs, _) in &samples {
        let output = mlp.predict(&mut tape, inputs)?;
        println!("  {inputs:?} -> {:+.6}", output[0]);
    }
    println!();

    // -------------------------------------------------------------------------
    // 3. Loss and gradients
    // -------------------------------------------------------------------------
    println!("3. Loss over all samples");
    println!("------------------------");
    println!();

    let mut losses = Vec::with_capacity(samples.len());
    for (inputs, target) in &samples {
        losses.push(mlp.loss(&mut tape, inputs, &[*target])?);
    }
    let Some(total) = tape.sum(losses) else {
        return Ok(());
    };
    tape.backward(total);

    println!("loss = {:.6}", tape.value(total));
    println!();
    println!("Gradients:");
    for (param, grad) in mlp.params().iter().zip(mlp.gradients(&tape)) {
        println!("  node {:>3}  value {:+.6}  grad {:+.6}", param.index(), tape.value(*param), grad);
    }
    println!();

    // -------------------------------------------------------------------------
    // 4. Numerical check
    // -------------------------------------------------------------------------
    println!("4. Numerical gradient check");
    println!("---------------------------");
    println!();

    match tape.grad_check(total, &mlp.params(), 1e-5, 1e-5) {
        Ok(()) => println!("all {} parameter gradients agree", mlp.parameter_count()),
        Err(err) => println!("check failed: {err}"),
    }
    println!();
    println!("Tape holds {} nodes after {} runs.", tape.len(), samples.len() * 2);

    Ok(())
}
