//! Toy 2D binary-classification datasets.
//!
//! Every generator produces 2-wide inputs and 1-wide targets labelled `0.0`/`1.0`,
//! so they fit the default `[2, ..., 1]` architecture and the binary accuracy
//! readout.

use std::f32::consts::PI;

use rand::Rng;

use crate::{Dataset, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Xor,
    Spiral,
    Circles,
    /// Three concentric noisy rings with alternating labels.
    Gaussians,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::Xor,
        DatasetKind::Spiral,
        DatasetKind::Circles,
        DatasetKind::Gaussians,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DatasetKind::Xor => "xor",
            DatasetKind::Spiral => "spiral",
            DatasetKind::Circles => "circles",
            DatasetKind::Gaussians => "gaussians",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown dataset {name:?}")))
    }

    /// Generate `n` samples (ignored for XOR, which is always the 4 corners).
    pub fn generate<R: Rng + ?Sized>(self, n: usize, rng: &mut R) -> Dataset {
        match self {
            DatasetKind::Xor => xor(),
            DatasetKind::Spiral => spiral(n),
            DatasetKind::Circles => circles(n, rng),
            DatasetKind::Gaussians => gaussians(n, rng),
        }
    }
}

/// The four XOR corners.
pub fn xor() -> Dataset {
    let inputs = vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0];
    let targets = vec![0.0, 1.0, 1.0, 0.0];
    from_points(inputs, targets)
}

/// Two interleaved arms, `ceil(n / 2)` points each, radius growing to 5.
pub fn spiral(n: usize) -> Dataset {
    let per_arm = n.div_ceil(2);
    let half = n as f32 / 2.0;
    let mut inputs = Vec::with_capacity(per_arm * 4);
    let mut targets = Vec::with_capacity(per_arm * 2);

    for arm in 0..2 {
        let offset = if arm == 0 { 0.0 } else { PI };
        for i in 0..per_arm {
            let frac = i as f32 / half;
            let r = frac * 5.0;
            let t = 1.75 * frac * PI + offset;
            inputs.extend_from_slice(&[t.sin() * r, t.cos() * r]);
            targets.push(arm as f32);
        }
    }

    from_points(inputs, targets)
}

/// An inner ring (radius ~0.5, class 0) and an outer ring (radius ~1.2, class 1).
pub fn circles<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Dataset {
    let mut inputs = Vec::with_capacity(n * 2);
    let mut targets = Vec::with_capacity(n);

    for i in 0..n {
        let inner = i < n / 2;
        let t = rng.gen_range(0.0..2.0 * PI);
        let base = if inner { 0.5 } else { 1.2 };
        let r = base + rng.gen_range(0.0..0.1);
        inputs.extend_from_slice(&[t.cos() * r, t.sin() * r]);
        targets.push(if inner { 0.0 } else { 1.0 });
    }

    from_points(inputs, targets)
}

/// Rings at radius 0, 0.8 and 1.6 (±0.1), labelled by ring parity.
pub fn gaussians<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Dataset {
    const CENTERS: [f32; 3] = [0.0, 0.8, 1.6];

    let mut inputs = Vec::with_capacity(n * 2);
    let mut targets = Vec::with_capacity(n);

    for i in 0..n {
        let ring = i % CENTERS.len();
        let r = CENTERS[ring] + rng.gen_range(-0.1..0.1);
        let t = rng.gen_range(0.0..2.0 * PI);
        inputs.extend_from_slice(&[t.cos() * r, t.sin() * r]);
        targets.push((ring % 2) as f32);
    }

    from_points(inputs, targets)
}

fn from_points(inputs: Vec<f32>, targets: Vec<f32>) -> Dataset {
    Dataset::from_flat(inputs, targets, 2, 1).expect("generated points are 2-wide with 1 label")
}
