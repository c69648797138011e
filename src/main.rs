use std::{env, process};

use log::info;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use mlp_playground::{Activation, DatasetKind, Engine, EngineConfig, Error, Result};

const DEFAULT_STEPS: usize = 500;
const DATASET_SIZE: usize = 200;
const TRAIN_FRACTION: f32 = 0.8;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage: [SEED=n] [ACTIVATION=tanh|relu] {} <xor|spiral|circles|gaussians> [steps] [config.json] [snapshot.json]",
            args[0]
        );
        process::exit(1);
    }

    if let Err(e) = run(&args[1..]) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let kind = DatasetKind::from_name(&args[0])?;
    let steps = match args.get(1) {
        Some(s) => s
            .parse::<usize>()
            .map_err(|e| Error::InvalidConfig(format!("steps {s:?}: {e}")))?,
        None => DEFAULT_STEPS,
    };
    let mut config = match args.get(2) {
        Some(path) => EngineConfig::load_json(path)?,
        None => EngineConfig::default(),
    };
    if let Ok(name) = env::var("ACTIVATION") {
        config.activation = Activation::from_name(&name)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown activation {name:?}")))?;
    }

    let mut rng = match env::var("SEED") {
        Ok(s) => StdRng::seed_from_u64(
            s.parse()
                .map_err(|e| Error::InvalidConfig(format!("SEED {s:?}: {e}")))?,
        ),
        Err(_) => StdRng::from_entropy(),
    };

    let full = kind.generate(DATASET_SIZE, &mut rng);
    let (train, test) = full.split(TRAIN_FRACTION, &mut rng)?;
    info!(
        "dataset {}: {} train / {} test samples",
        kind.name(),
        train.len(),
        test.len()
    );

    // Full-batch training, as the interactive demo does when a dataset is picked.
    config.batch_size = train.len();
    let mut engine = Engine::with_rng(config, StdRng::seed_from_u64(rng.next_u64()))?;

    let log_every = (steps / 10).max(1);
    for step in 0..steps {
        let loss = engine.train_step(&train)?;
        if (step + 1) % log_every == 0 {
            let test_loss = engine.evaluate(&test).ok();
            info!("step {step}: train_loss={loss:.5} test_loss={test_loss:?}");
        }
    }

    let state = engine.state(Some(&test));
    println!(
        "{} after {} steps: train_loss={:.5} test_loss={:?} test_acc={:?}",
        kind.name(),
        steps,
        engine.history().recent_mean(10).unwrap_or(f32::NAN),
        state.test_loss,
        state.test_acc
    );

    if let Some(path) = args.get(3) {
        std::fs::write(path, state.to_json_string_pretty()?)
            .map_err(|e| Error::InvalidData(format!("failed to write {path}: {e}")))?;
        info!("snapshot written to {path}");
    }

    Ok(())
}
