// src/rng.rs
//! Seeded Illustrative Perturbation
//!
//! # Design
//!
//! An unstable explicit scheme is sometimes shown with visible noise to make the
//! instability obvious on a chart. The noise here is:
//! 1. **Opt-in**: only applied when configured and the stability report says unstable
//! 2. **Reproducible**: same seed → bit-identical output
//! 3. **Multiplicative**: each value becomes `v · (1 + a·Z)`, Z ~ N(0,1)
//!
//! Draws are consumed in a fixed order (price curve rows, then time curve rows, columns
//! left to right) so the output never depends on scheduling.

use crate::config::PerturbationConfig;
use crate::curves::{PriceCurveSample, TimeCurveSample};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

pub fn seed_rng_from_u64(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn get_normal_draw<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}

pub struct Perturbation {
    rng: StdRng,
    amplitude: f64,
}

impl Perturbation {
    pub fn new(config: &PerturbationConfig) -> Self {
        Perturbation {
            rng: seed_rng_from_u64(config.seed),
            amplitude: config.amplitude,
        }
    }

    fn perturb(&mut self, value: &mut f64) {
        let z = get_normal_draw(&mut self.rng);
        *value *= 1.0 + self.amplitude * z;
    }

    pub fn apply(&mut self, price_curve: &mut [PriceCurveSample], time_curve: &mut [TimeCurveSample]) {
        for sample in price_curve.iter_mut() {
            self.perturb(&mut sample.value_at_initial);
            self.perturb(&mut sample.value_at_mid);
            self.perturb(&mut sample.value_at_maturity);
        }
        for sample in time_curve.iter_mut() {
            self.perturb(&mut sample.value_low_regime);
            self.perturb(&mut sample.value_medium_regime);
            self.perturb(&mut sample.value_high_regime);
        }
    }
}
