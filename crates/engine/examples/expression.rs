//! Building, evaluating and differentiating a scalar expression.
//!
//! Run with: cargo run -p tapegrad-engine --example expression
//!
//! This example demonstrates:
//! - Building an expression on a tape from labeled leaves
//! - Forward evaluation after changing an input
//! - Backward pass and per-node gradients
//! - Gradient accumulation for a shared subexpression
//! - Numerical gradient checking

use tapegrad_engine::Tape;

fn main() {
    println!("=== Scalar Reverse-Mode Autodiff ===\n");

    // -------------------------------------------------------------------------
    // 1. out = tanh(a * b)
    // -------------------------------------------------------------------------
    println!("1. out = tanh(a * b)");
    println!("--------------------");
    println!();

    let mut tape = Tape::new();
    let a = tape.labeled(1.0, "a");
    let b = tape.labeled(2.0, "b");
    let ab = tape.mul(a, b);
    tape.set_label(ab, "ab");
    let out = tape.tanh(ab);
    tape.set_label(out, "out");

    tape.forward(out);
    tape.backward(out);

    println!("a = 1, b = 2");
    println!("out = tanh(2) = {:.6}", tape.value(out));
    println!();
    println!("Gradients:");
    println!("  a: {:.6}  (= b * (1 - tanh²(ab)))", tape.grad(a));
    println!("  b: {:.6}  (= a * (1 - tanh²(ab)))", tape.grad(b));
    println!();
    println!("Tape:");
    print!("{}", tape.render(out));
    println!();

    // -------------------------------------------------------------------------
    // 2. Re-evaluate after changing a leaf
    // -------------------------------------------------------------------------
    println!("2. Change a = -0.5 and re-run forward");
    println!("-------------------------------------");
    println!();

    tape.set_value(a, -0.5).expect("a is a leaf");
    tape.forward(out);
    tape.backward(out);

    println!("out = tanh(-1) = {:.6}", tape.value(out));
    println!("  grad a: {:.6}", tape.grad(a));
    println!("  grad b: {:.6}", tape.grad(b));
    println!();

    // -------------------------------------------------------------------------
    // 3. Shared subexpression (diamond)
    // -------------------------------------------------------------------------
    println!("3. Diamond: d = a + b, e = d * c, f = e + d");
    println!("-------------------------------------------");
    println!();

    let mut tape = Tape::new();
    let a = tape.labeled(1.0, "a");
    let b = tape.labeled(2.0, "b");
    let c = tape.labeled(3.0, "c");
    let d = tape.add(a, b);
    tape.set_label(d, "d");
    let e = tape.mul(d, c);
    tape.set_label(e, "e");
    let f = tape.add(e, d);
    tape.set_label(f, "f");

    tape.backward(f);

    for node in [f, e, d, c, a, b] {
        println!(
            "  {:<6} value = {:>5.1}   grad = {:>4.1}",
            tape.describe(node),
            tape.value(node),
            tape.grad(node)
        );
    }
    println!();
    println!("  d receives c = 3 through e and 1 directly from f: grad d = 4");
    println!();

    // -------------------------------------------------------------------------
    // 4. Numerical gradient verification
    // -------------------------------------------------------------------------
    println!("4. Numerical Gradient Verification");
    println!("----------------------------------");
    println!();

    let mut tape = Tape::new();
    let x = tape.labeled(0.7, "x");
    let y = tape.labeled(1.3, "y");
    let q = tape.div(x, y);
    let p = tape.pow(y, x);
    let s = tape.add(q, p);
    let out = tape.sigmoid(s);

    tape.backward(out);
    let analytical = tape.grad(x);
    let numerical = tape
        .numerical_gradient(out, x, 1e-6)
        .expect("x is a leaf");
    println!("  out = sigmoid(x / y + y ^ x), checking ∂out/∂x:");
    println!("  Analytical: {:.9}", analytical);
    println!("  Numerical:  {:.9}", numerical);
    println!();

    match tape.grad_check(out, &[x, y], 1e-6, 1e-6) {
        Ok(()) => println!("  Gradient check PASSED"),
        Err(e) => println!("  Gradient check FAILED: {}", e),
    }
}
