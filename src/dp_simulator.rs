//! Differential privacy simulator: noise-addition cost, Laplace and Gaussian
//! mechanisms, and privacy-budget composition.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::clock::{floor_duration, SharedClock};
use crate::error::{Result, SimError};

const NOISE_SECS_PER_RECORD: f64 = 0.000_01;
const MIN_NOISE_SECS: f64 = 0.000_1;

pub const DEFAULT_DELTA: f64 = 1e-5;

/// Cumulative epsilon after `num_queries` queries at `epsilon` each
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrivacyBudget {
    pub epsilon: f64,
    pub num_queries: u32,
    pub basic_composition: f64,
    pub advanced_composition: f64,
}

fn check_epsilon(epsilon: f64) -> Result<()> {
    if epsilon.is_finite() && epsilon > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter(format!(
            "epsilon must be positive, got {}",
            epsilon
        )))
    }
}

fn check_sensitivity(sensitivity: f64) -> Result<()> {
    if sensitivity.is_finite() && sensitivity >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter(format!(
            "sensitivity must be non-negative, got {}",
            sensitivity
        )))
    }
}

/// Sum of per-query epsilons.
pub fn calculate_composition(epsilons: &[f64]) -> f64 {
    epsilons.iter().sum()
}

/// Advanced composition bound `epsilon * sqrt(n)`.
pub fn estimate_privacy_loss(epsilon: f64, num_queries: u32) -> f64 {
    epsilon * f64::from(num_queries).sqrt()
}

pub fn privacy_budget(epsilon: f64, num_queries: u32) -> PrivacyBudget {
    PrivacyBudget {
        epsilon,
        num_queries,
        basic_composition: epsilon * f64::from(num_queries),
        advanced_composition: estimate_privacy_loss(epsilon, num_queries),
    }
}

pub fn gaussian_sigma(sensitivity: f64, epsilon: f64, delta: f64) -> f64 {
    (2.0 * (1.25 / delta).ln()).sqrt() * sensitivity / epsilon
}

pub struct DpSimulator {
    rng: StdRng,
    clock: SharedClock,
}

impl DpSimulator {
    pub fn new(seed: u64, clock: SharedClock) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            clock,
        }
    }

    pub fn model_noise_time(&self, dataset_size: u64) -> Duration {
        floor_duration(NOISE_SECS_PER_RECORD * dataset_size as f64, MIN_NOISE_SECS)
    }

    /// Realizes the noise-addition delay and returns it.
    ///
    /// Cost depends on the record count only; `epsilon` calibrates the noise, not the work.
    pub fn add_noise(&mut self, dataset_size: u64, _epsilon: f64) -> Duration {
        let delay = self.model_noise_time(dataset_size);
        self.clock.advance(delay);
        delay
    }

    pub fn laplace_mechanism(&mut self, true_value: f64, sensitivity: f64, epsilon: f64) -> Result<f64> {
        check_epsilon(epsilon)?;
        check_sensitivity(sensitivity)?;

        let scale = sensitivity / epsilon;
        if scale == 0.0 {
            return Ok(true_value);
        }

        // Laplace(0, b) is an Exp(1/b) magnitude with a fair random sign
        let magnitude = Exp::new(1.0 / scale)
            .map_err(|e| SimError::InvalidParameter(format!("laplace scale {}: {}", scale, e)))?
            .sample(&mut self.rng);
        let noise = if self.rng.gen_bool(0.5) { magnitude } else { -magnitude };

        Ok(true_value + noise)
    }

    pub fn gaussian_mechanism(
        &mut self,
        true_value: f64,
        sensitivity: f64,
        epsilon: f64,
        delta: f64,
    ) -> Result<f64> {
        check_epsilon(epsilon)?;
        check_sensitivity(sensitivity)?;
        if !(delta > 0.0 && delta < 1.0) {
            return Err(SimError::InvalidParameter(format!(
                "delta must lie in (0, 1), got {}",
                delta
            )));
        }

        let sigma = gaussian_sigma(sensitivity, epsilon, delta);
        let noise = Normal::new(0.0, sigma)
            .map_err(|e| SimError::InvalidParameter(format!("gaussian sigma {}: {}", sigma, e)))?
            .sample(&mut self.rng);

        Ok(true_value + noise)
    }

    pub fn calculate_composition(&self, epsilons: &[f64]) -> f64 {
        calculate_composition(epsilons)
    }

    pub fn estimate_privacy_loss(&self, epsilon: f64, num_queries: u32) -> f64 {
        estimate_privacy_loss(epsilon, num_queries)
    }

    pub fn privacy_budget(&self, epsilon: f64, num_queries: u32) -> PrivacyBudget {
        privacy_budget(epsilon, num_queries)
    }
}
