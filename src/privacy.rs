//! Privacy analysis: information leakage, k-anonymity, DP composition and
//! simulated forgery attacks.
//!
//! Leakage figures are analytic. k-anonymity and the attack simulation draw
//! from the analyzer's own generator, so a fixed seed and call order
//! reproduce every table.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Bernoulli, Distribution};
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;
use std::fmt;

use crate::clock::SharedClock;
use crate::config::{ExperimentConfig, KLevelParams, PrivacyConfig, SeedStream};
use crate::dp_simulator::{DpSimulator, PrivacyBudget};
use crate::error::{Result, SimError};
use crate::metrics::mean;
use crate::progress::sweep_bar;
use crate::results::{self, ResultsWriter};

/// Leakage in bits for one (dataset size, epsilon) pair
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeakageMeasurement {
    /// Full disclosure bound, `log2(dataset_size)`
    pub baseline: f64,
    pub zkp_only: f64,
    pub dp_only: f64,
    pub composite: f64,
    pub reduction_factor: f64,
    pub dataset_size: u64,
    pub epsilon: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtectionLevel {
    Low,
    Medium,
    High,
}

impl ProtectionLevel {
    pub const ALL: [ProtectionLevel; 3] = [ProtectionLevel::Low, ProtectionLevel::Medium, ProtectionLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtectionLevel::Low => "low",
            ProtectionLevel::Medium => "medium",
            ProtectionLevel::High => "high",
        }
    }
}

impl fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KAnonymityMeasurement {
    /// Unprotected release; every record is unique
    pub naive: u64,
    pub aibpb: u64,
    pub improvement: f64,
    pub dataset_size: u64,
    pub protection_level: ProtectionLevel,
    pub reidentification_risk: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackResistance {
    pub num_attempts: u32,
    pub successful_attacks: u32,
    pub attack_success_rate: f64,
    pub security_level: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrivacySummary {
    pub avg_leakage_reduction: f64,
    /// Mean k over the `high` protection level
    pub avg_k_anonymity: f64,
    pub attack_success_rate: f64,
    pub security_level: f64,
}

/// Re-identification probability for a k-anonymous release.
///
/// `k = 0` means nobody is hidden, so the risk is certain.
pub fn reidentification_risk(k: u64) -> f64 {
    if k == 0 {
        1.0
    } else {
        1.0 / k as f64
    }
}

pub struct PrivacyAnalyzer {
    settings: PrivacyConfig,
    dataset_sizes: Vec<u64>,
    rng: StdRng,
    dp_sim: DpSimulator,
    writer: ResultsWriter,
}

impl PrivacyAnalyzer {
    pub fn new(config: &ExperimentConfig, clock: SharedClock) -> Result<Self> {
        let sim = &config.simulation;
        Ok(Self {
            settings: config.privacy.clone(),
            dataset_sizes: config.datasets.sizes.clone(),
            rng: StdRng::seed_from_u64(sim.stream_seed(SeedStream::Privacy)),
            dp_sim: DpSimulator::new(sim.stream_seed(SeedStream::Dp), clock),
            writer: ResultsWriter::new(&config.output.results_dir)?,
        })
    }

    pub fn writer(&self) -> &ResultsWriter {
        &self.writer
    }

    pub fn measure_information_leakage(&self, dataset_size: u64, epsilon: f64) -> LeakageMeasurement {
        let baseline = (dataset_size as f64).log2();
        let zkp_only = self.settings.zkp_leakage_bits;
        let dp_only = epsilon / LN_2;
        let composite = (zkp_only + dp_only).min(self.settings.leakage_cap);

        LeakageMeasurement {
            baseline,
            zkp_only,
            dp_only,
            composite,
            reduction_factor: baseline / composite,
            dataset_size,
            epsilon,
        }
    }

    pub fn measure_k_anonymity(&mut self, dataset_size: u64, level: ProtectionLevel) -> KAnonymityMeasurement {
        let params = self.level_params(level);
        let k = self.draw_k(dataset_size, params);

        KAnonymityMeasurement {
            naive: 1,
            aibpb: k,
            improvement: k as f64,
            dataset_size,
            protection_level: level,
            reidentification_risk: self.measure_reidentification_risk(k),
        }
    }

    pub fn measure_reidentification_risk(&self, k: u64) -> f64 {
        reidentification_risk(k)
    }

    fn level_params(&self, level: ProtectionLevel) -> KLevelParams {
        let model = &self.settings.k_anonymity;
        match level {
            ProtectionLevel::Low => model.low,
            ProtectionLevel::Medium => model.medium,
            ProtectionLevel::High => model.high,
        }
    }

    /// `min(max(base + U[-jitter, jitter), 0), dataset_size / divisor)`
    fn draw_k(&mut self, dataset_size: u64, params: KLevelParams) -> u64 {
        let jitter = if params.jitter > 0 {
            self.rng.gen_range(-params.jitter..params.jitter)
        } else {
            0
        };
        let drawn = u64::try_from(params.base.saturating_add(jitter)).unwrap_or(0);
        drawn.min(dataset_size / params.divisor)
    }

    /// Basic vs advanced composition for every epsilon and query count
    pub fn analyze_dp_composition(&mut self) -> Result<Vec<PrivacyBudget>> {
        log::info!("Analyzing DP composition...");

        let mut budgets = Vec::new();
        for &epsilon in &self.settings.epsilon_values {
            for &num_queries in &self.settings.query_counts {
                budgets.push(self.dp_sim.privacy_budget(epsilon, num_queries));
            }
        }

        self.writer.write_csv(results::DP_COMPOSITION, &budgets)?;
        log::info!("DP composition analysis completed: {} budgets", budgets.len());
        Ok(budgets)
    }

    /// Simulated forgery attempts, each succeeding with the configured probability
    pub fn analyze_attack_resistance(&mut self) -> Result<AttackResistance> {
        log::info!("Analyzing attack resistance...");

        let forgery = Bernoulli::new(self.settings.forgery_probability)
            .map_err(|e| SimError::InvalidParameter(format!("forgery probability: {}", e)))?;
        let num_attempts = self.settings.attack_attempts;

        let bar = sweep_bar(u64::from(num_attempts), "attacks");
        let mut successful_attacks = 0u32;
        for _ in 0..num_attempts {
            if forgery.sample(&mut self.rng) {
                successful_attacks += 1;
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        let attack_success_rate = f64::from(successful_attacks) / f64::from(num_attempts);
        let result = AttackResistance {
            num_attempts,
            successful_attacks,
            attack_success_rate,
            security_level: 1.0 - attack_success_rate,
        };

        self.writer.write_json(results::ATTACK_RESISTANCE, &result)?;
        log::info!("Attack resistance: {:.4}%", result.security_level * 100.0);
        Ok(result)
    }

    fn run_leakage_sweep(&self) -> Result<Vec<LeakageMeasurement>> {
        log::info!("Analyzing information leakage...");

        let mut rows = Vec::with_capacity(self.dataset_sizes.len() * self.settings.epsilon_values.len());
        for &size in &self.dataset_sizes {
            for &epsilon in &self.settings.epsilon_values {
                rows.push(self.measure_information_leakage(size, epsilon));
            }
        }

        self.writer.write_csv(results::INFORMATION_LEAKAGE, &rows)?;
        Ok(rows)
    }

    fn run_k_anonymity_sweep(&mut self) -> Result<Vec<KAnonymityMeasurement>> {
        log::info!("Analyzing k-anonymity...");

        let sizes = self.dataset_sizes.clone();
        let mut rows = Vec::with_capacity(sizes.len() * ProtectionLevel::ALL.len());
        for size in sizes {
            for level in ProtectionLevel::ALL {
                let row = self.measure_k_anonymity(size, level);
                log::debug!("size {} level {}: k = {}", size, level, row.aibpb);
                rows.push(row);
            }
        }

        self.writer.write_csv(results::K_ANONYMITY, &rows)?;
        Ok(rows)
    }

    pub fn run_privacy_analysis(&mut self) -> Result<PrivacySummary> {
        log::info!("=== PRIVACY ANALYSIS ===");

        let leakage = self.run_leakage_sweep()?;
        let anonymity = self.run_k_anonymity_sweep()?;
        self.analyze_dp_composition()?;
        let attacks = self.analyze_attack_resistance()?;

        let summary = PrivacySummary {
            avg_leakage_reduction: mean(leakage.iter().map(|m| m.reduction_factor)).unwrap_or(0.0),
            avg_k_anonymity: mean(
                anonymity.iter()
                    .filter(|m| m.protection_level == ProtectionLevel::High)
                    .map(|m| m.aibpb as f64),
            )
            .unwrap_or(0.0),
            attack_success_rate: attacks.attack_success_rate,
            security_level: attacks.security_level,
        };

        self.writer.write_json(results::PRIVACY_SUMMARY, &summary)?;
        log::info!("Privacy analysis completed, results in {}", self.writer.results_dir().display());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimulatedClock;
    use crate::config::SAMPLE_CONFIG;
    use std::sync::Arc;

    fn analyzer(dir: &std::path::Path) -> PrivacyAnalyzer {
        let mut config = ExperimentConfig::from_toml(SAMPLE_CONFIG).unwrap();
        config.output.results_dir = dir.to_path_buf();
        PrivacyAnalyzer::new(&config, Arc::new(SimulatedClock::new())).unwrap()
    }

    #[test]
    fn test_leakage_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = analyzer(dir.path());

        let m = analyzer.measure_information_leakage(10_000, 1.0);
        assert!((m.dp_only - 1.442_695).abs() < 1e-5, "dp leakage should be 1/ln 2");
        assert_eq!(m.zkp_only, 0.001);
        assert_eq!(m.composite, 0.1);
        assert!((m.baseline - 13.287_712).abs() < 1e-5);
        assert!((m.reduction_factor - m.baseline / 0.1).abs() < 1e-9);

        // Below the cap the composite is the plain sum
        let small = analyzer.measure_information_leakage(1_000, 0.01);
        assert!((small.composite - (0.001 + 0.01 / LN_2)).abs() < 1e-12);
    }

    #[test]
    fn test_k_anonymity_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let mut analyzer = analyzer(dir.path());

        for _ in 0..50 {
            let high = analyzer.measure_k_anonymity(100_000, ProtectionLevel::High);
            assert!((450..550).contains(&high.aibpb), "k = {}", high.aibpb);
            assert_eq!(high.naive, 1);
            assert_eq!(high.improvement, high.aibpb as f64);

            let low = analyzer.measure_k_anonymity(100_000, ProtectionLevel::Low);
            assert!((8..12).contains(&low.aibpb));
        }

        // Capped by the dataset size
        assert_eq!(analyzer.measure_k_anonymity(100, ProtectionLevel::High).aibpb, 50);
        assert_eq!(analyzer.measure_k_anonymity(100, ProtectionLevel::Medium).aibpb, 20);
        assert_eq!(analyzer.measure_k_anonymity(5, ProtectionLevel::Low).aibpb, 0);
    }

    #[test]
    fn test_reidentification_risk() {
        assert_eq!(reidentification_risk(1), 1.0);
        assert_eq!(reidentification_risk(500), 0.002);
        assert_eq!(reidentification_risk(0), 1.0);

        let dir = tempfile::tempdir().unwrap();
        let mut analyzer = analyzer(dir.path());
        let m = analyzer.measure_k_anonymity(10_000, ProtectionLevel::Medium);
        assert_eq!(m.reidentification_risk, 1.0 / m.aibpb as f64);
    }

    #[test]
    fn test_dp_composition_grid() {
        let dir = tempfile::tempdir().unwrap();
        let mut analyzer = analyzer(dir.path());

        let budgets = analyzer.analyze_dp_composition().unwrap();
        assert_eq!(budgets.len(), 3 * 4);
        assert_eq!(budgets[0].epsilon, 0.5);
        assert_eq!(budgets[0].num_queries, 10);
        assert_eq!(budgets[3].num_queries, 200);
        assert!(budgets.iter().all(|b| b.advanced_composition <= b.basic_composition));

        let body = std::fs::read_to_string(dir.path().join(results::DP_COMPOSITION)).unwrap();
        assert!(body.starts_with("epsilon,num_queries,basic_composition,advanced_composition\n"));
    }

    #[test]
    fn test_attack_resistance() {
        let dir = tempfile::tempdir().unwrap();
        let mut analyzer = analyzer(dir.path());

        let result = analyzer.analyze_attack_resistance().unwrap();
        assert_eq!(result.num_attempts, 10_000);
        assert!(result.successful_attacks <= 2);
        assert!((result.security_level + result.attack_success_rate - 1.0).abs() < 1e-12);
        assert!(dir.path().join(results::ATTACK_RESISTANCE).exists());
    }

    #[test]
    fn test_run_privacy_analysis_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mut analyzer = analyzer(dir.path());

        let summary = analyzer.run_privacy_analysis().unwrap();
        assert!(summary.avg_leakage_reduction > 0.0);
        // 100 records caps high at 50; 1000 and 10000 draw from [450, 550)
        assert!(summary.avg_k_anonymity > 300.0 && summary.avg_k_anonymity < 400.0);

        let rows: Vec<KAnonymityMeasurement> = analyzer.writer().read_csv(results::K_ANONYMITY).unwrap();
        assert_eq!(rows.len(), 9);
        let levels: Vec<ProtectionLevel> = rows.iter().take(3).map(|r| r.protection_level).collect();
        assert_eq!(levels, ProtectionLevel::ALL.to_vec());

        let body = std::fs::read_to_string(dir.path().join(results::K_ANONYMITY)).unwrap();
        assert!(body.starts_with("naive,aibpb,improvement,dataset_size,protection_level,reidentification_risk\n"));
        assert!(body.contains(",low,"));

        let leakage = std::fs::read_to_string(dir.path().join(results::INFORMATION_LEAKAGE)).unwrap();
        assert!(leakage.starts_with("baseline,zkp_only,dp_only,composite,reduction_factor,dataset_size,epsilon\n"));
        assert_eq!(leakage.lines().count(), 1 + 9);
        assert!(dir.path().join(results::PRIVACY_SUMMARY).exists());
    }
}
