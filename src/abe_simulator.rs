//! Attribute-Based Encryption Simulator
//!
//! Models CP-ABE encryption and decryption cost. Encryption is linear in the
//! number of policy attributes and logarithmic in the dataset size; decryption
//! is linear in the attribute count only. Ciphertexts carry a conjunctive
//! policy and an opaque payload sized at 1% of the dataset.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::StandardNormal;
use std::time::Duration;

use crate::clock::{floor_duration, SharedClock};

const ENCRYPT_SECS_PER_ATTRIBUTE: f64 = 0.0002;
const DECRYPT_SECS_PER_ATTRIBUTE: f64 = 0.0003;
const JITTER_STD: f64 = 0.1;
const MIN_SECS: f64 = 0.001;

/// Payload bytes per dataset record
const PAYLOAD_DIVISOR: u64 = 100;

pub const PLAINTEXT_MARKER: &[u8] = b"decrypted_data";

/// Synthetic ciphertext artifact
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ciphertext {
    pub policy: String,
    pub payload: Vec<u8>,
    pub num_attributes: u32,
}

impl Ciphertext {
    pub fn size_bytes(&self) -> usize {
        self.policy.len() + self.payload.len() + std::mem::size_of::<u32>()
    }
}

/// `attr_0 AND attr_1 AND ...`
pub fn conjunctive_policy(num_attributes: u32) -> String {
    (0..num_attributes)
        .map(|i| format!("attr_{}", i))
        .collect::<Vec<_>>()
        .join(" AND ")
}

pub fn encryption_secs(dataset_size: u64, num_attributes: u32, jitter: f64) -> f64 {
    let base_time = ENCRYPT_SECS_PER_ATTRIBUTE * f64::from(num_attributes);
    let size_factor = (dataset_size as f64).ln() / 10.0;
    base_time * size_factor * (1.0 + jitter)
}

pub fn decryption_secs(num_attributes: u32, jitter: f64) -> f64 {
    DECRYPT_SECS_PER_ATTRIBUTE * f64::from(num_attributes) * (1.0 + jitter)
}

pub struct AbeSimulator {
    rng: StdRng,
    clock: SharedClock,
}

impl AbeSimulator {
    pub fn new(seed: u64, clock: SharedClock) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            clock,
        }
    }

    fn jitter(&mut self) -> f64 {
        JITTER_STD * self.rng.sample::<f64, _>(StandardNormal)
    }

    pub fn model_encryption_time(&mut self, dataset_size: u64, num_attributes: u32) -> Duration {
        let jitter = self.jitter();
        floor_duration(encryption_secs(dataset_size, num_attributes, jitter), MIN_SECS)
    }

    pub fn model_decryption_time(&mut self, num_attributes: u32) -> Duration {
        let jitter = self.jitter();
        floor_duration(decryption_secs(num_attributes, jitter), MIN_SECS)
    }

    pub fn encrypt(&mut self, dataset_size: u64, num_attributes: u32) -> Ciphertext {
        let delay = self.model_encryption_time(dataset_size, num_attributes);
        self.clock.advance(delay);

        let mut payload = vec![0u8; (dataset_size / PAYLOAD_DIVISOR) as usize];
        self.rng.fill_bytes(&mut payload);

        Ciphertext {
            policy: conjunctive_policy(num_attributes),
            payload,
            num_attributes,
        }
    }

    /// Decryption content is not modeled; only its cost is.
    pub fn decrypt(&mut self, ciphertext: &Ciphertext) -> Vec<u8> {
        let delay = self.model_decryption_time(ciphertext.num_attributes);
        self.clock.advance(delay);
        PLAINTEXT_MARKER.to_vec()
    }
}
