//! Thompson sampling over per-arm Beta posteriors.

use policy_core::types::{ArmBelief, ArmId};
use rand::Rng;
use std::collections::BTreeMap;

/// Draw one Beta sample per arm and return the arm with the strictly
/// greatest sample. Ties keep the earlier arm in id order, since the best
/// only moves on strict improvement.
///
/// Returns `None` on an empty belief map; callers decide whether that is a
/// configuration error or warrants a fallback.
pub fn choose<R: Rng>(beliefs: &BTreeMap<ArmId, ArmBelief>, rng: &mut R) -> Option<ArmId> {
    let mut best_sample = f64::NEG_INFINITY;
    let mut best_arm = None;

    for (arm_id, belief) in beliefs {
        let sample = beta_sample(rng, belief.a, belief.b);
        if sample > best_sample {
            best_sample = sample;
            best_arm = Some(arm_id.clone());
        }
    }

    best_arm
}

/// Sample from Beta(alpha, beta) via the Gamma ratio:
/// `X ~ Gamma(alpha), Y ~ Gamma(beta)  =>  X / (X + Y) ~ Beta(alpha, beta)`.
pub fn beta_sample<R: Rng>(rng: &mut R, alpha: f64, beta: f64) -> f64 {
    // Shape parameters must be strictly positive; guard against snapshots
    // hand-edited out of range.
    let alpha = alpha.max(1e-9);
    let beta = beta.max(1e-9);

    let x = gamma_sample(rng, alpha);
    let y = gamma_sample(rng, beta);

    if x + y > 0.0 {
        x / (x + y)
    } else {
        0.5
    }
}

/// Sample from Gamma(shape, 1).
///
/// For shape >= 1 this uses the Marsaglia-Tsang method.
/// For shape < 1 it uses the Ahrens-Dieter boost.
fn gamma_sample<R: Rng>(rng: &mut R, shape: f64) -> f64 {
    if shape < 1.0 {
        // Boost: Gamma(a) = Gamma(a+1) * U^(1/a)
        let u: f64 = rng.gen();
        return gamma_sample(rng, shape + 1.0) * u.powf(1.0 / shape);
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();

    loop {
        // Box-Muller for a standard normal
        let u1: f64 = rng.gen::<f64>().max(1e-15);
        let u2: f64 = rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();

        let v = (1.0 + c * z).powi(3);
        if v <= 0.0 {
            continue;
        }

        let u: f64 = rng.gen();
        if u < 1.0 - 0.0331 * z.powi(4) || u.ln() < 0.5 * z * z + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }
}
