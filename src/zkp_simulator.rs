//! Zero-Knowledge Proof Simulator
//!
//! Models Groth16-style proof generation and verification without executing any
//! cryptography. Proving time grows with circuit size and logarithmically with
//! the dataset; verification time and proof size are constant, reproducing the
//! succinctness of pairing-based SNARKs.
//!
//! Proof records are content-addressed: the digest is a SHA-256 over the proved
//! parameters, so identical parameters always yield the same digest.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::clock::{floor_duration, SharedClock};

pub const PROOF_SYSTEM: &str = "groth16";

/// Seconds per 1000 constraints before the dataset size factor is applied
const PROVE_SECS_PER_KILO_GATE: f64 = 0.001;
const PROVE_JITTER_STD: f64 = 0.1;
const MIN_PROVE_SECS: f64 = 0.001;

const VERIFY_MEAN_SECS: f64 = 0.03;
const VERIFY_JITTER_STD: f64 = 0.005;
const MIN_VERIFY_SECS: f64 = 0.01;

const PROOF_SIZE_BYTES: i64 = 192;
const PROOF_SIZE_JITTER: i64 = 10;

pub const PUBLIC_INPUT_COUNT: usize = 3;
const PUBLIC_INPUT_BOUND: u32 = 1 << 16;

/// Synthetic proof artifact
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Proof {
    pub proof_system: String,
    pub circuit_size: u64,
    pub dataset_size: u64,
    pub digest: String,
    pub public_inputs: [u32; PUBLIC_INPUT_COUNT],
}

/// Outcome of checking a proof against the parameters it claims to prove
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verification {
    Accepted,
    Forged,
}

impl Verification {
    pub fn is_accepted(self) -> bool {
        matches!(self, Verification::Accepted)
    }
}

/// Hex SHA-256 over `dataset_size:circuit_size`.
pub fn proof_digest(dataset_size: u64, circuit_size: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", dataset_size, circuit_size).as_bytes());
    hex::encode(hasher.finalize())
}

/// Proving time in seconds before flooring, for a given jitter draw.
pub fn proving_secs(dataset_size: u64, circuit_size: u64, jitter: f64) -> f64 {
    let base_time = PROVE_SECS_PER_KILO_GATE * circuit_size as f64 / 1000.0;
    let size_factor = (dataset_size as f64).log2() / 10.0;
    base_time * size_factor * (1.0 + jitter)
}

pub struct ZkpSimulator {
    rng: StdRng,
    clock: SharedClock,
}

impl ZkpSimulator {
    pub fn new(seed: u64, clock: SharedClock) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            clock,
        }
    }

    /// Draw a proving duration, floored at 1 ms.
    pub fn model_proving_time(&mut self, dataset_size: u64, circuit_size: u64) -> Duration {
        let jitter = PROVE_JITTER_STD * self.rng.sample::<f64, _>(StandardNormal);
        floor_duration(proving_secs(dataset_size, circuit_size, jitter), MIN_PROVE_SECS)
    }

    /// Draw a verification duration; independent of what was proved.
    pub fn model_verification_time(&mut self) -> Duration {
        let secs = VERIFY_MEAN_SECS + VERIFY_JITTER_STD * self.rng.sample::<f64, _>(StandardNormal);
        floor_duration(secs, MIN_VERIFY_SECS)
    }

    pub fn generate_proof(&mut self, dataset_size: u64, circuit_size: u64) -> Proof {
        let delay = self.model_proving_time(dataset_size, circuit_size);
        self.clock.advance(delay);

        let mut public_inputs = [0u32; PUBLIC_INPUT_COUNT];
        for input in public_inputs.iter_mut() {
            *input = self.rng.gen_range(0..PUBLIC_INPUT_BOUND);
        }

        Proof {
            proof_system: PROOF_SYSTEM.to_string(),
            circuit_size,
            dataset_size,
            digest: proof_digest(dataset_size, circuit_size),
            public_inputs,
        }
    }

    /// Checks the proof's digest against its claimed parameters.
    ///
    /// Honest proofs from [`generate_proof`](Self::generate_proof) are always accepted.
    pub fn verify_proof(&mut self, proof: &Proof) -> Verification {
        let delay = self.model_verification_time();
        self.clock.advance(delay);

        let expected = proof_digest(proof.dataset_size, proof.circuit_size);
        if proof.proof_system == PROOF_SYSTEM && proof.digest == expected {
            Verification::Accepted
        } else {
            Verification::Forged
        }
    }

    /// Constant proof size (~192 bytes) for every circuit.
    pub fn estimate_proof_size(&mut self, _circuit_size: u64) -> usize {
        let jitter = self.rng.gen_range(-PROOF_SIZE_JITTER..PROOF_SIZE_JITTER);
        (PROOF_SIZE_BYTES + jitter) as usize
    }
}
