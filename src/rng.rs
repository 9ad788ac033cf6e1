//! Gaussian sampling for thermal momentum initialization.
//!
//! The subsystem only ever needs standard-normal deviates (callers scale by
//! `uth`/`ufl` themselves), so this module wraps any [`rand::RngCore`] with
//! a Box-Muller sampler rather than pulling in a full distribution crate.

use rand::RngCore;
use rand_pcg::Pcg32;

/// A standard-normal sampler over a borrowed or owned [`RngCore`].
///
/// Two values come out of every Box-Muller draw; the second is cached and
/// returned on the following call so we don't waste half the entropy.
pub struct GaussianRng<R> {
    rng: R,
    spare: Option<f64>,
}

impl<R: RngCore> GaussianRng<R> {
    /// Wrap `rng` for Gaussian sampling.
    pub const fn new(rng: R) -> Self {
        Self { rng, spare: None }
    }

    /// Draw one sample from the standard normal distribution.
    pub fn sample(&mut self) -> f64 {
        if let Some(value) = self.spare.take() {
            return value;
        }

        // Box-Muller transform (polar form avoided: we already have a
        // uniform RNG on [0, 1), so the basic form is simplest).
        let u1 = self.uniform_open();
        let u2 = self.uniform_open();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = std::f64::consts::TAU * u2;

        self.spare = Some(r * theta.sin());
        r * theta.cos()
    }

    /// Draw a uniform sample in `(0, 1]`, avoiding the `ln(0)` singularity.
    fn uniform_open(&mut self) -> f64 {
        // `next_u64` is 53+ bits; keep the top 53 for an f64 mantissa and
        // nudge away from zero.
        let bits = self.rng.next_u64() >> 11;
        (bits as f64 + 1.0) / (1u64 << 53) as f64
    }
}

impl GaussianRng<Pcg32> {
    /// Build a deterministic sampler from a literal seed. Used by the
    /// driver to make a run reproducible, and by this crate's own tests.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self::new(Pcg32::new(seed, 0xa02b_dbf7_bb3c_0a7))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reproducible_for_fixed_seed() {
        let mut a = GaussianRng::from_seed(42);
        let mut b = GaussianRng::from_seed(42);

        for _ in 0..16 {
            assert_eq!(a.sample(), b.sample());
        }
    }

    #[test]
    fn roughly_standard_normal() {
        let mut rng = GaussianRng::from_seed(7);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| rng.sample()).collect();
        let mean: f64 = samples.iter().sum::<f64>() / f64::from(n);
        let var: f64 =
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / f64::from(n - 1);

        assert!(mean.abs() < 0.05, "mean = {mean}");
        assert!((var - 1.0).abs() < 0.05, "var = {var}");
    }
}
