//! Random-variate sources consumed by simulation processes.
//!
//! The engine never samples on its own; processes draw from a
//! [`VariateSource`] kept in their world. Each run gets its own source so
//! replicates are statistically independent.

use super::errors::SimError;
use rand::distributions::{Bernoulli, Distribution};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Exp;
use std::collections::VecDeque;

pub trait VariateSource {
    /// Exponentially distributed value with the given mean
    fn exponential(&mut self, mean: f64) -> Result<f64, SimError>;

    /// `true` with the given probability
    fn bernoulli(&mut self, probability: f64) -> Result<bool, SimError>;
}

fn check_mean(mean: f64) -> Result<(), SimError> {
    if mean.is_finite() && mean > 0.0 {
        Ok(())
    } else {
        Err(SimError::Sampling(format!(
            "exponential mean must be finite and positive, got {}",
            mean
        )))
    }
}

/// Pseudo-random variates from a seeded `StdRng`
#[derive(Debug, Clone)]
pub struct SeededVariates {
    seed: u64,
    rng: StdRng,
}

impl SeededVariates {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl VariateSource for SeededVariates {
    fn exponential(&mut self, mean: f64) -> Result<f64, SimError> {
        check_mean(mean)?;
        let exp = Exp::new(1.0 / mean).map_err(|e| SimError::Sampling(e.to_string()))?;
        Ok(exp.sample(&mut self.rng))
    }

    fn bernoulli(&mut self, probability: f64) -> Result<bool, SimError> {
        let coin = Bernoulli::new(probability).map_err(|e| SimError::Sampling(e.to_string()))?;
        Ok(coin.sample(&mut self.rng))
    }
}

/// Every exponential draw returns its mean and every coin lands `true`
/// exactly when the probability is at least one half. Useful for checking
/// model timing by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicVariates;

impl VariateSource for DeterministicVariates {
    fn exponential(&mut self, mean: f64) -> Result<f64, SimError> {
        check_mean(mean)?;
        Ok(mean)
    }

    fn bernoulli(&mut self, probability: f64) -> Result<bool, SimError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(SimError::Sampling(format!(
                "probability must lie in [0, 1], got {}",
                probability
            )));
        }
        Ok(probability >= 0.5)
    }
}

/// Replays fixed sequences of draws. Running past the end of a sequence is
/// a sampling failure.
#[derive(Debug, Clone, Default)]
pub struct ScriptedVariates {
    exponentials: VecDeque<f64>,
    coins: VecDeque<bool>,
}

impl ScriptedVariates {
    pub fn new(
        exponentials: impl IntoIterator<Item = f64>,
        coins: impl IntoIterator<Item = bool>,
    ) -> Self {
        Self {
            exponentials: exponentials.into_iter().collect(),
            coins: coins.into_iter().collect(),
        }
    }
}

impl VariateSource for ScriptedVariates {
    fn exponential(&mut self, _mean: f64) -> Result<f64, SimError> {
        self.exponentials
            .pop_front()
            .ok_or_else(|| SimError::Sampling("scripted exponential draws exhausted".to_string()))
    }

    fn bernoulli(&mut self, _probability: f64) -> Result<bool, SimError> {
        self.coins
            .pop_front()
            .ok_or_else(|| SimError::Sampling("scripted coin draws exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = SeededVariates::new(7);
        let mut b = SeededVariates::new(7);
        for _ in 0..20 {
            assert_eq!(a.exponential(3.0).unwrap(), b.exponential(3.0).unwrap());
            assert_eq!(a.bernoulli(0.3).unwrap(), b.bernoulli(0.3).unwrap());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SeededVariates::new(1);
        let mut b = SeededVariates::new(2);
        let draws_a: Vec<f64> = (0..5).map(|_| a.exponential(1.0).unwrap()).collect();
        let draws_b: Vec<f64> = (0..5).map(|_| b.exponential(1.0).unwrap()).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn test_exponential_sample_mean_is_close() {
        let mut source = SeededVariates::new(42);
        let n = 20_000;
        let total: f64 = (0..n).map(|_| source.exponential(8.0).unwrap()).sum();
        let mean = total / n as f64;
        assert!((mean - 8.0).abs() < 0.3, "sample mean {} too far from 8", mean);
    }

    #[test]
    fn test_invalid_parameters_are_sampling_errors() {
        let mut source = SeededVariates::new(0);
        assert!(matches!(source.exponential(0.0), Err(SimError::Sampling(_))));
        assert!(matches!(source.exponential(-2.0), Err(SimError::Sampling(_))));
        assert!(matches!(source.bernoulli(1.5), Err(SimError::Sampling(_))));
        assert!(matches!(
            DeterministicVariates.bernoulli(-0.1),
            Err(SimError::Sampling(_))
        ));
    }

    #[test]
    fn test_scripted_runs_dry() {
        let mut source = ScriptedVariates::new([1.0, 2.0], [true]);
        assert_eq!(source.exponential(9.0).unwrap(), 1.0);
        assert_eq!(source.exponential(9.0).unwrap(), 2.0);
        assert!(source.bernoulli(0.0).unwrap());
        assert!(source.exponential(9.0).is_err());
        assert!(source.bernoulli(0.0).is_err());
    }
}
