//! On-chain Gas Cost Model
//!
//! Maps operation parameters to integer gas units using a fixed base schedule
//! (approximate Ethereum costs) plus a small amount of jitter where the real
//! cost varies between transactions.
//!
//! Cost functions:
//! - ZKP verification: flat pairing-check cost, independent of circuit size
//! - ABE policy verification: linear in attribute count
//! - Merkle verification: transaction base plus one hash per tree level
//! - Naive storage: one storage word per 32 bytes of data
//! - Composite proof: transaction + ZKP + ABE + Merkle root check

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Base costs in gas units
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasSchedule {
    pub transaction: u64,
    pub storage_word: u64,
    pub pairing: u64,
    pub hash: u64,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            transaction: 21_000,
            storage_word: 20_000,
            pairing: 100_000,
            hash: 30,
        }
    }
}

pub const ZKP_VERIFICATION_BASE: u64 = 250_000;
pub const ZKP_VERIFICATION_JITTER: i64 = 10_000;
pub const ABE_VERIFICATION_BASE: u64 = 50_000;
pub const ABE_COST_PER_ATTRIBUTE: u64 = 10_000;
pub const STORAGE_WORD_BYTES: u64 = 32;

/// Circuit size the composite estimate assumes for its ZKP component
pub const COMPOSITE_CIRCUIT_SIZE: u64 = 16_384;

/// Which components a composite proof carries
#[derive(Clone, Copy, Debug)]
pub struct CompositeGasParams {
    pub has_zkp: bool,
    pub has_abe: bool,
    pub num_attributes: u32,
    pub tree_depth: u32,
}

impl Default for CompositeGasParams {
    fn default() -> Self {
        Self {
            has_zkp: true,
            has_abe: true,
            num_attributes: 5,
            tree_depth: 10,
        }
    }
}

pub struct GasEstimator {
    schedule: GasSchedule,
    rng: StdRng,
}

impl GasEstimator {
    pub fn new(seed: u64) -> Self {
        Self::with_schedule(seed, GasSchedule::default())
    }

    pub fn with_schedule(seed: u64, schedule: GasSchedule) -> Self {
        Self {
            schedule,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn schedule(&self) -> &GasSchedule {
        &self.schedule
    }

    /// Pairing-based verification costs the same for every circuit size.
    pub fn estimate_zkp_verification(&mut self, _circuit_size: u64) -> u64 {
        let variance = self
            .rng
            .gen_range(-ZKP_VERIFICATION_JITTER..ZKP_VERIFICATION_JITTER);
        ZKP_VERIFICATION_BASE.saturating_add_signed(variance)
    }

    pub fn estimate_abe_verification(&self, num_attributes: u32) -> u64 {
        ABE_VERIFICATION_BASE + ABE_COST_PER_ATTRIBUTE * u64::from(num_attributes)
    }

    pub fn estimate_merkle_verification(&self, tree_depth: u32) -> u64 {
        self.schedule.transaction + u64::from(tree_depth) * self.schedule.hash
    }

    pub fn estimate_naive_storage(&self, dataset_size: u64) -> u64 {
        (dataset_size / STORAGE_WORD_BYTES).saturating_mul(self.schedule.storage_word)
    }

    pub fn estimate_composite_proof(&mut self, params: CompositeGasParams) -> u64 {
        let mut total_gas = self.schedule.transaction;

        if params.has_zkp {
            total_gas += self.estimate_zkp_verification(COMPOSITE_CIRCUIT_SIZE);
        }

        if params.has_abe {
            total_gas += self.estimate_abe_verification(params.num_attributes);
        }

        // Merkle root check
        total_gas + self.estimate_merkle_verification(params.tree_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zkp_verification_is_range_bounded() {
        let mut gas = GasEstimator::new(42);
        for circuit_size in [1u64, 1_024, 16_384, 1 << 24] {
            for _ in 0..200 {
                let cost = gas.estimate_zkp_verification(circuit_size);
                assert!(
                    (240_000..=260_000).contains(&cost),
                    "ZKP verification gas {} out of range for circuit {}",
                    cost,
                    circuit_size
                );
            }
        }
    }

    #[test]
    fn test_naive_storage_scales_linearly() {
        let gas = GasEstimator::new(1);
        assert_eq!(gas.estimate_naive_storage(3_200), 2_000_000);
        assert_eq!(gas.estimate_naive_storage(31), 0);
        assert_eq!(gas.estimate_naive_storage(64_000), 40_000_000);
    }

    #[test]
    fn test_abe_and_merkle_costs() {
        let gas = GasEstimator::new(1);
        assert_eq!(gas.estimate_abe_verification(0), 50_000);
        assert_eq!(gas.estimate_abe_verification(5), 100_000);
        assert_eq!(gas.estimate_merkle_verification(10), 21_300);
    }

    #[test]
    fn test_naive_storage_saturates() {
        let gas = GasEstimator::new(3);
        assert_eq!(gas.estimate_naive_storage(40_000_000_000_000_000), u64::MAX);
        assert_eq!(gas.estimate_naive_storage(u64::MAX), u64::MAX);
        assert_eq!(gas.estimate_naive_storage(3_200), 2_000_000);
    }

    #[test]
    fn test_composite_proof_composition() {
        let mut gas = GasEstimator::new(7);

        let without_zkp = gas.estimate_composite_proof(CompositeGasParams {
            has_zkp: false,
            ..CompositeGasParams::default()
        });
        assert_eq!(without_zkp, 21_000 + 100_000 + 21_300);

        let bare = gas.estimate_composite_proof(CompositeGasParams {
            has_zkp: false,
            has_abe: false,
            ..CompositeGasParams::default()
        });
        assert_eq!(bare, 21_000 + 21_300);

        let full = gas.estimate_composite_proof(CompositeGasParams::default());
        let zkp_part = full - without_zkp;
        assert!((240_000..=260_000).contains(&zkp_part));

        // Composite stays far below storing the data on-chain
        assert!(full < gas.estimate_naive_storage(10_000));
    }

    #[test]
    fn test_same_seed_same_draws() {
        let mut a = GasEstimator::new(99);
        let mut b = GasEstimator::new(99);
        let draws_a: Vec<u64> = (0..10).map(|_| a.estimate_zkp_verification(16_384)).collect();
        let draws_b: Vec<u64> = (0..10).map(|_| b.estimate_zkp_verification(16_384)).collect();
        assert_eq!(draws_a, draws_b);
    }
}
