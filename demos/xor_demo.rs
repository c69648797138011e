use mlp_playground::{Activation, Engine, EngineConfig, Optimizer, datasets};

fn main() -> mlp_playground::Result<()> {
    let xor = datasets::xor();

    // 2 -> 8 -> 8 -> 1, tanh everywhere, full-batch Adam.
    let mut engine = Engine::with_seed(
        EngineConfig {
            layers: vec![2, 8, 8, 1],
            activation: Activation::Tanh,
            learning_rate: 0.1,
            batch_size: 4,
            optimizer: Optimizer::adam(),
        },
        0,
    )?;

    for step in 0..2_000 {
        let loss = engine.train_step(&xor)?;
        if step % 200 == 0 {
            println!("step={step} loss={loss:.5}");
        }
    }

    println!(
        "train_loss={:.5} accuracy={}",
        engine.evaluate(&xor)?,
        engine.evaluate_accuracy(&xor)?
    );
    for (x, _) in xor.iter() {
        println!("x={x:?} y={:?}", engine.predict(x)?[0]);
    }

    Ok(())
}
