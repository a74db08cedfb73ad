//! Experiment configuration loader and validator.
//! Parses the TOML document read once at startup and checks every sweep parameter.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::clock::ClockMode;

// ------------------------------------------------------------------------------------------------
// Main Configuration Structs
// ------------------------------------------------------------------------------------------------

/// Top-level experiment configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ExperimentConfig {
    pub simulation: SimulationConfig,
    pub output: OutputConfig,
    pub datasets: DatasetConfig,
    /// Named baselines, compared in the order given
    pub baselines: Vec<BaselineConfig>,
    pub privacy: PrivacyConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub compliance: ComplianceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    /// Seed every component generator is derived from.
    ///
    /// TOML integers are signed, so a config file can only express
    /// `0..=i64::MAX`; `--seed` accepts the full `u64` range.
    pub random_seed: u64,
    /// `wall` sleeps for modeled delays, `simulated` only advances virtual time
    #[serde(default)]
    pub clock: ClockMode,
}

/// Components that own a seeded generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStream {
    Zkp,
    Abe,
    Dp,
    Gas,
    Privacy,
    Compliance,
}

impl SimulationConfig {
    /// Seed for one component's generator.
    ///
    /// SplitMix64 over the experiment seed offset by the stream index. The
    /// finalizer is a bijection, so streams of one experiment never collide.
    pub fn stream_seed(&self, stream: SeedStream) -> u64 {
        let mut z = self
            .random_seed
            .wrapping_add((stream as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub results_dir: PathBuf,
    pub figures_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    /// Dataset sizes swept by the scalability and privacy stages, in order
    pub sizes: Vec<u64>,
}

/// Baseline strategies the composite pipeline is compared against
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BaselineKind {
    NaiveOnchain,
    ZkpOnly,
    AbeOnly,
    DpOnly,
    ManualOrchestration,
}

impl BaselineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaselineKind::NaiveOnchain => "naive_onchain",
            BaselineKind::ZkpOnly => "zkp_only",
            BaselineKind::AbeOnly => "abe_only",
            BaselineKind::DpOnly => "dp_only",
            BaselineKind::ManualOrchestration => "manual_orchestration",
        }
    }
}

impl fmt::Display for BaselineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BaselineConfig {
    pub name: BaselineKind,
    #[serde(default)]
    pub description: Option<String>,
}

/// Parameters of the k-anonymity model for one protection level.
///
/// `k = min(max(base + U[-jitter, jitter), 0), dataset_size / divisor)`
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct KLevelParams {
    pub base: i64,
    pub jitter: i64,
    pub divisor: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct KAnonymityModel {
    #[serde(default = "default_k_low")]
    pub low: KLevelParams,
    #[serde(default = "default_k_medium")]
    pub medium: KLevelParams,
    #[serde(default = "default_k_high")]
    pub high: KLevelParams,
}

impl Default for KAnonymityModel {
    fn default() -> Self {
        Self {
            low: default_k_low(),
            medium: default_k_medium(),
            high: default_k_high(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PrivacyConfig {
    /// Epsilons swept by the leakage and composition analyses
    pub epsilon_values: Vec<f64>,
    #[serde(default = "default_query_counts")]
    pub query_counts: Vec<u32>,
    /// Ceiling on composite leakage in bits
    #[serde(default = "default_leakage_cap")]
    pub leakage_cap: f64,
    /// Leakage attributed to the ZKP alone, in bits
    #[serde(default = "default_zkp_leakage_bits")]
    pub zkp_leakage_bits: f64,
    #[serde(default)]
    pub k_anonymity: KAnonymityModel,
    #[serde(default = "default_attack_attempts")]
    pub attack_attempts: u32,
    /// Per-attempt success probability of a forgery
    #[serde(default = "default_forgery_probability")]
    pub forgery_probability: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    #[serde(default = "default_trials_per_size")]
    pub trials_per_size: u32,
    #[serde(default = "default_circuit_size")]
    pub circuit_size: u64,
    #[serde(default = "default_num_attributes")]
    pub num_attributes: u32,
    #[serde(default = "default_epsilon")]
    pub dp_epsilon: f64,
    /// Dataset size used for baselines and the throughput test
    #[serde(default = "default_reference_dataset_size")]
    pub reference_dataset_size: u64,
    #[serde(default = "default_throughput_duration_secs")]
    pub throughput_duration_secs: f64,
    /// Wall-clock penalty of hand-orchestrated pipelines
    #[serde(default = "default_manual_slowdown")]
    pub manual_slowdown: f64,
    #[serde(default = "default_naive_nominal_secs")]
    pub naive_nominal_secs: f64,
    /// Minimal on-chain verification cost charged to the DP-only baseline
    #[serde(default = "default_dp_only_gas")]
    pub dp_only_gas: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            trials_per_size: default_trials_per_size(),
            circuit_size: default_circuit_size(),
            num_attributes: default_num_attributes(),
            dp_epsilon: default_epsilon(),
            reference_dataset_size: default_reference_dataset_size(),
            throughput_duration_secs: default_throughput_duration_secs(),
            manual_slowdown: default_manual_slowdown(),
            naive_nominal_secs: default_naive_nominal_secs(),
            dp_only_gas: default_dp_only_gas(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ComplianceConfig {
    #[serde(default = "default_num_evaluators")]
    pub num_evaluators: u32,
    #[serde(default = "default_num_policies")]
    pub num_policies: u32,
    #[serde(default = "default_policy_success_probability")]
    pub policy_success_probability: f64,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            num_evaluators: default_num_evaluators(),
            num_policies: default_num_policies(),
            policy_success_probability: default_policy_success_probability(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Defaults
// ------------------------------------------------------------------------------------------------

fn default_k_low() -> KLevelParams {
    KLevelParams { base: 10, jitter: 2, divisor: 10 }
}

fn default_k_medium() -> KLevelParams {
    KLevelParams { base: 100, jitter: 10, divisor: 5 }
}

fn default_k_high() -> KLevelParams {
    KLevelParams { base: 500, jitter: 50, divisor: 2 }
}

fn default_query_counts() -> Vec<u32> {
    vec![10, 50, 100, 200]
}

fn default_leakage_cap() -> f64 {
    0.1
}

fn default_zkp_leakage_bits() -> f64 {
    0.001
}

fn default_attack_attempts() -> u32 {
    10_000
}

fn default_forgery_probability() -> f64 {
    1e-6
}

fn default_trials_per_size() -> u32 {
    10
}

fn default_circuit_size() -> u64 {
    16_384
}

fn default_num_attributes() -> u32 {
    5
}

fn default_epsilon() -> f64 {
    1.0
}

fn default_reference_dataset_size() -> u64 {
    10_000
}

fn default_throughput_duration_secs() -> f64 {
    60.0
}

fn default_manual_slowdown() -> f64 {
    3.2
}

fn default_naive_nominal_secs() -> f64 {
    0.1
}

fn default_dp_only_gas() -> u64 {
    50_000
}

fn default_num_evaluators() -> u32 {
    15
}

fn default_num_policies() -> u32 {
    100
}

fn default_policy_success_probability() -> f64 {
    0.947
}

// ------------------------------------------------------------------------------------------------
// Error Types and Validation
// ------------------------------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

fn is_probability(p: f64) -> bool {
    (0.0..=1.0).contains(&p)
}

fn validate_k_level(name: &str, level: &KLevelParams) -> Result<(), ConfigError> {
    if level.divisor == 0 {
        return Err(invalid(format!("k-anonymity divisor for '{}' must be positive", name)));
    }
    if level.jitter < 0 {
        return Err(invalid(format!("k-anonymity jitter for '{}' must be non-negative", name)));
    }
    Ok(())
}

// ------------------------------------------------------------------------------------------------
// Configuration Implementation Methods
// ------------------------------------------------------------------------------------------------

impl ExperimentConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(path)?;
        Self::from_toml(&config_str)
    }

    pub fn from_toml(config_str: &str) -> Result<Self, ConfigError> {
        let config: ExperimentConfig = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.datasets.sizes.is_empty() {
            return Err(invalid("datasets.sizes must not be empty"));
        }
        if self.datasets.sizes.iter().any(|&size| size == 0) {
            return Err(invalid("dataset sizes must be positive"));
        }
        if self.baselines.is_empty() {
            return Err(invalid("at least one baseline must be configured"));
        }

        let privacy = &self.privacy;
        if privacy.epsilon_values.is_empty() {
            return Err(invalid("privacy.epsilon_values must not be empty"));
        }
        if privacy.epsilon_values.iter().any(|&e| !(e.is_finite() && e > 0.0)) {
            return Err(invalid("epsilon values must be positive"));
        }
        if !(privacy.leakage_cap.is_finite() && privacy.leakage_cap > 0.0) {
            return Err(invalid("privacy.leakage_cap must be positive"));
        }
        if !(privacy.zkp_leakage_bits.is_finite() && privacy.zkp_leakage_bits >= 0.0) {
            return Err(invalid("privacy.zkp_leakage_bits must be non-negative"));
        }
        if !is_probability(privacy.forgery_probability) {
            return Err(invalid("privacy.forgery_probability must lie in [0, 1]"));
        }
        if privacy.attack_attempts == 0 {
            return Err(invalid("privacy.attack_attempts must be positive"));
        }
        validate_k_level("low", &privacy.k_anonymity.low)?;
        validate_k_level("medium", &privacy.k_anonymity.medium)?;
        validate_k_level("high", &privacy.k_anonymity.high)?;

        let performance = &self.performance;
        if performance.trials_per_size == 0 {
            return Err(invalid("performance.trials_per_size must be positive"));
        }
        if performance.reference_dataset_size == 0 {
            return Err(invalid("performance.reference_dataset_size must be positive"));
        }
        if !(performance.throughput_duration_secs.is_finite() && performance.throughput_duration_secs > 0.0) {
            return Err(invalid("performance.throughput_duration_secs must be positive"));
        }
        if Duration::try_from_secs_f64(performance.throughput_duration_secs).is_err() {
            return Err(invalid("performance.throughput_duration_secs is too large"));
        }
        if !(performance.manual_slowdown.is_finite() && performance.manual_slowdown >= 1.0) {
            return Err(invalid("performance.manual_slowdown must be at least 1"));
        }
        if !(performance.naive_nominal_secs.is_finite() && performance.naive_nominal_secs >= 0.0) {
            return Err(invalid("performance.naive_nominal_secs must be non-negative"));
        }

        let compliance = &self.compliance;
        if compliance.num_evaluators == 0 || compliance.num_policies == 0 {
            return Err(invalid("compliance evaluator and policy counts must be positive"));
        }
        if !is_probability(compliance.policy_success_probability) {
            return Err(invalid("compliance.policy_success_probability must lie in [0, 1]"));
        }

        Ok(())
    }

    /// Shrinks the sweep to a few small sizes and short runs for smoke testing.
    pub fn apply_quick_test(&mut self) {
        self.datasets.sizes = vec![100, 1_000, 10_000];
        self.performance.trials_per_size = 2;
        self.performance.throughput_duration_secs = 5.0;
        self.privacy.attack_attempts = self.privacy.attack_attempts.min(1_000);
        self.simulation.clock = ClockMode::Simulated;
    }
}

#[cfg(test)]
pub(crate) const SAMPLE_CONFIG: &str = r#"
[simulation]
random_seed = 42
clock = "simulated"

[output]
results_dir = "results"
figures_dir = "figures"

[datasets]
sizes = [100, 1000, 10000]

[[baselines]]
name = "naive_onchain"

[[baselines]]
name = "zkp_only"

[[baselines]]
name = "abe_only"

[[baselines]]
name = "dp_only"

[[baselines]]
name = "manual_orchestration"
description = "Hand-sequenced primitives"

[privacy]
epsilon_values = [0.5, 1.0, 2.0]

[performance]
trials_per_size = 3
throughput_duration_secs = 2.0
"#;
