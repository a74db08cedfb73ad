#![warn(clippy::all)]

//! aibpb-sim: Composite Proof Pipeline Simulator
//!
//! Parametric simulation of a pipeline that combines a zero-knowledge proof,
//! attribute-based encryption and a differential-privacy noise step, with an
//! on-chain gas model. No cryptography is executed; every cost is drawn from a
//! seeded model and realized on a [`clock::Clock`].
//!
//! # Architecture
//!
//! - [`zkp_simulator`], [`abe_simulator`], [`dp_simulator`]: primitive cost models
//! - [`gas_estimator`]: on-chain verification and storage costs
//! - [`benchmark_runner`]: scalability, baselines and throughput
//! - [`privacy`]: leakage, k-anonymity, composition and attack resistance
//! - [`compliance`]: regulatory scores, explainability and policy satisfaction
//! - [`results`]: CSV/JSON artifacts under the results directory

// Infrastructure
pub mod clock;
pub mod config;
pub mod error;
pub mod progress;
pub mod results;

// Primitive models
pub mod abe_simulator;
pub mod dp_simulator;
pub mod gas_estimator;
pub mod zkp_simulator;

// Evaluation stages
pub mod benchmark_runner;
pub mod compliance;
pub mod metrics;
pub mod privacy;
pub mod report;

// Re-export main types and functions for public API
pub use clock::{Clock, ClockMode, SharedClock, SimulatedClock, WallClock};
pub use config::{ConfigError, ExperimentConfig};
pub use error::{Result, SimError};

pub use abe_simulator::{AbeSimulator, Ciphertext};
pub use dp_simulator::{DpSimulator, PrivacyBudget};
pub use gas_estimator::{CompositeGasParams, GasEstimator};
pub use zkp_simulator::{Proof, Verification, ZkpSimulator};

pub use benchmark_runner::PerformanceEvaluator;
pub use compliance::{ComplianceEvaluator, ComplianceSummary, Framework};
pub use metrics::{BaselineResult, CompositeMeasurement, PerformanceSummary, ThroughputResult};
pub use privacy::{PrivacyAnalyzer, PrivacySummary, ProtectionLevel};
pub use report::ExperimentReport;
pub use results::ResultsWriter;
