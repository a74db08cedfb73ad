// src/benchmark_runner.rs - Composite pipeline performance evaluation
//
// Drives the ZKP, ABE and DP simulators plus the gas model through the
// scalability sweep, the baseline comparison and the throughput test, and
// writes one artifact per stage once its table is complete.

use std::time::Duration;

use crate::abe_simulator::AbeSimulator;
use crate::clock::SharedClock;
use crate::config::{BaselineKind, ExperimentConfig, PerformanceConfig, SeedStream};
use crate::dp_simulator::DpSimulator;
use crate::error::{Result, SimError};
use crate::gas_estimator::GasEstimator;
use crate::metrics::*;
use crate::progress::{counter_spinner, sweep_bar};
use crate::results::{self, ResultsWriter};
use crate::zkp_simulator::ZkpSimulator;

/// Dataset size whose mean composite time is reported in the summary
pub const SUMMARY_DATASET_SIZE: u64 = 10_000;

pub struct PerformanceEvaluator {
    settings: PerformanceConfig,
    dataset_sizes: Vec<u64>,
    baselines: Vec<BaselineKind>,
    clock: SharedClock,
    zkp_sim: ZkpSimulator,
    abe_sim: AbeSimulator,
    dp_sim: DpSimulator,
    gas_est: GasEstimator,
    writer: ResultsWriter,
}

impl PerformanceEvaluator {
    /// Each simulator owns a generator on its own stream of `simulation.random_seed`.
    pub fn new(config: &ExperimentConfig, clock: SharedClock) -> Result<Self> {
        let sim = &config.simulation;
        Ok(Self {
            settings: config.performance.clone(),
            dataset_sizes: config.datasets.sizes.clone(),
            baselines: config.baselines.iter().map(|b| b.name).collect(),
            zkp_sim: ZkpSimulator::new(sim.stream_seed(SeedStream::Zkp), clock.clone()),
            abe_sim: AbeSimulator::new(sim.stream_seed(SeedStream::Abe), clock.clone()),
            dp_sim: DpSimulator::new(sim.stream_seed(SeedStream::Dp), clock.clone()),
            gas_est: GasEstimator::new(sim.stream_seed(SeedStream::Gas)),
            clock,
            writer: ResultsWriter::new(&config.output.results_dir)?,
        })
    }

    pub fn writer(&self) -> &ResultsWriter {
        &self.writer
    }

    /// Measure ZKP proof generation and verification
    pub fn measure_zkp_performance(&mut self, dataset_size: u64, circuit_size: u64) -> Result<ZkpMeasurement> {
        let start = self.clock.now();
        let proof = self.zkp_sim.generate_proof(dataset_size, circuit_size);
        let proof_time = self.clock.since(start);

        let start = self.clock.now();
        let verification = self.zkp_sim.verify_proof(&proof);
        let verify_time = self.clock.since(start);

        if !verification.is_accepted() {
            return Err(SimError::VerificationFailed { dataset_size });
        }

        Ok(ZkpMeasurement {
            proof_time,
            verify_time,
            gas: self.gas_est.estimate_zkp_verification(circuit_size),
            proof_size: self.zkp_sim.estimate_proof_size(circuit_size),
            verified: true,
        })
    }

    /// Measure ABE encryption and decryption
    pub fn measure_abe_performance(&mut self, dataset_size: u64, num_attributes: u32) -> AbeMeasurement {
        let start = self.clock.now();
        let ciphertext = self.abe_sim.encrypt(dataset_size, num_attributes);
        let encrypt_time = self.clock.since(start);

        let start = self.clock.now();
        let _plaintext = self.abe_sim.decrypt(&ciphertext);
        let decrypt_time = self.clock.since(start);

        AbeMeasurement {
            encrypt_time,
            decrypt_time,
            gas: self.gas_est.estimate_abe_verification(num_attributes),
            ciphertext_size: ciphertext.size_bytes(),
        }
    }

    /// One composite ZKP + ABE + DP measurement, tagged as trial 0
    pub fn measure_composite_performance(&mut self, dataset_size: u64) -> Result<CompositeMeasurement> {
        self.measure_composite_trial(dataset_size, 0)
    }

    fn measure_composite_trial(&mut self, dataset_size: u64, trial: u32) -> Result<CompositeMeasurement> {
        let start = self.clock.now();

        let zkp = self.measure_zkp_performance(dataset_size, self.settings.circuit_size)?;
        let abe = self.measure_abe_performance(dataset_size, self.settings.num_attributes);
        let dp_time = self.dp_sim.add_noise(dataset_size, self.settings.dp_epsilon);

        let total_time = self.clock.since(start);

        Ok(CompositeMeasurement {
            total_time: total_time.as_secs_f64(),
            zkp_time: zkp.proof_time.as_secs_f64(),
            abe_time: abe.encrypt_time.as_secs_f64(),
            dp_time: dp_time.as_secs_f64(),
            total_gas: zkp.gas + abe.gas,
            zkp_gas: zkp.gas,
            abe_gas: abe.gas,
            dataset_size,
            trial,
        })
    }

    /// Test performance across the configured dataset sizes
    pub fn run_scalability_test(&mut self) -> Result<Vec<CompositeMeasurement>> {
        log::info!("Running scalability tests...");

        let trials = self.settings.trials_per_size;
        let sizes = self.dataset_sizes.clone();
        let bar = sweep_bar(sizes.len() as u64 * u64::from(trials), "trials");

        let mut rows = Vec::with_capacity(bar.length().unwrap_or(0) as usize);
        for size in sizes {
            for trial in 0..trials {
                let measurement = self.measure_composite_trial(size, trial)?;
                log::debug!(
                    "size {} trial {}: {:.4}s, {} gas",
                    size, trial, measurement.total_time, measurement.total_gas
                );
                rows.push(measurement);
                bar.inc(1);
            }
        }
        bar.finish_and_clear();

        self.writer.write_csv(results::SCALABILITY_RESULTS, &rows)?;

        let summary = summarize_by_dataset_size(&rows);
        self.writer.write_csv(results::SCALABILITY_SUMMARY, &summary)?;
        log_scaling(&rows, &summary);

        log::info!("Scalability test completed: {} measurements", rows.len());
        Ok(rows)
    }

    /// Compare against the configured baseline approaches
    pub fn run_baseline_comparison(&mut self) -> Result<Vec<BaselineResult>> {
        log::info!("Running baseline comparisons...");

        let dataset_size = self.settings.reference_dataset_size;
        let baselines = self.baselines.clone();
        let bar = sweep_bar(baselines.len() as u64, "baselines");

        let mut rows = Vec::with_capacity(baselines.len());
        for baseline in baselines {
            let (time, gas) = self.measure_baseline(baseline, dataset_size)?;
            log::debug!("{}: {:.4}s, {} gas", baseline, time, gas);
            rows.push(BaselineResult {
                baseline: baseline.to_string(),
                time,
                gas,
                dataset_size,
            });
            bar.inc(1);
        }
        bar.finish_and_clear();

        self.writer.write_csv(results::BASELINE_COMPARISON, &rows)?;
        log::info!("Baseline comparison completed: {} baselines", rows.len());
        Ok(rows)
    }

    fn measure_baseline(&mut self, baseline: BaselineKind, dataset_size: u64) -> Result<(f64, u64)> {
        let measured = match baseline {
            BaselineKind::NaiveOnchain => {
                // No privacy, only the gas for storing the data
                (
                    self.settings.naive_nominal_secs,
                    self.gas_est.estimate_naive_storage(dataset_size),
                )
            }
            BaselineKind::ZkpOnly => {
                let zkp = self.measure_zkp_performance(dataset_size, self.settings.circuit_size)?;
                (zkp.proof_time.as_secs_f64(), zkp.gas)
            }
            BaselineKind::AbeOnly => {
                let abe = self.measure_abe_performance(dataset_size, self.settings.num_attributes);
                (abe.encrypt_time.as_secs_f64(), abe.gas)
            }
            BaselineKind::DpOnly => {
                let dp_time = self.dp_sim.add_noise(dataset_size, self.settings.dp_epsilon);
                (dp_time.as_secs_f64(), self.settings.dp_only_gas)
            }
            BaselineKind::ManualOrchestration => {
                let composite = self.measure_composite_performance(dataset_size)?;
                (
                    composite.total_time * self.settings.manual_slowdown,
                    composite.total_gas,
                )
            }
        };
        Ok(measured)
    }

    /// Count composite measurements completed within the configured window
    pub fn run_throughput_test(&mut self) -> Result<ThroughputResult> {
        log::info!("Measuring throughput...");

        let dataset_size = self.settings.reference_dataset_size;
        let window = Duration::try_from_secs_f64(self.settings.throughput_duration_secs).map_err(|e| {
            SimError::InvalidParameter(format!(
                "throughput window {}s: {}",
                self.settings.throughput_duration_secs, e
            ))
        })?;
        let spinner = counter_spinner("proofs");

        let start = self.clock.now();
        let mut num_proofs = 0u64;
        // Checked between iterations; may overshoot by one measurement
        while self.clock.since(start) < window {
            self.measure_composite_performance(dataset_size)?;
            num_proofs += 1;
            spinner.inc(1);
        }
        spinner.finish_and_clear();

        let result = ThroughputResult::new(self.clock.since(start), num_proofs);
        self.writer.write_json(results::THROUGHPUT_RESULTS, &result)?;

        log::info!("Throughput: {:.1} proofs/hour", result.throughput_per_hour);
        Ok(result)
    }

    /// Run all performance evaluations and write the summary
    pub fn run_all_evaluations(&mut self) -> Result<PerformanceSummary> {
        log::info!("=== PERFORMANCE EVALUATION ===");

        let scalability = self.run_scalability_test()?;
        self.run_baseline_comparison()?;
        let throughput = self.run_throughput_test()?;

        let summary = PerformanceSummary {
            avg_proof_time_10k: mean(
                scalability.iter()
                    .filter(|m| m.dataset_size == SUMMARY_DATASET_SIZE)
                    .map(|m| m.total_time),
            ),
            avg_gas_consumption: mean(scalability.iter().map(|m| m.total_gas as f64)).unwrap_or(0.0),
            throughput_per_hour: throughput.throughput_per_hour,
            improvement_vs_manual: self.settings.manual_slowdown,
        };

        self.writer.write_json(results::PERFORMANCE_SUMMARY, &summary)?;
        log::info!("Performance evaluation completed, results in {}", self.writer.results_dir().display());
        Ok(summary)
    }
}

/// Log how total time grows from the smallest to the largest dataset size.
fn log_scaling(rows: &[CompositeMeasurement], summary: &[ScalabilitySummary]) {
    let (Some(first), Some(last)) = (summary.first(), summary.last()) else {
        return;
    };
    if first.dataset_size == last.dataset_size || first.mean_total_time <= 0.0 {
        return;
    }

    let time_ratio = last.mean_total_time / first.mean_total_time;
    let size_ratio = last.dataset_size as f64 / first.dataset_size as f64;
    log::info!(
        "Scaling: {:.2}x time for {:.0}x dataset size (efficiency {:.4})",
        time_ratio, size_ratio, time_ratio / size_ratio
    );

    let groups = group_by(rows, |m| m.dataset_size);
    let sample = |size: u64| -> Vec<f64> {
        groups.get(&size)
            .map(|rows| rows.iter().map(|m| m.total_time).collect())
            .unwrap_or_default()
    };
    if let Some(t) = welch_t_statistic(&sample(first.dataset_size), &sample(last.dataset_size)) {
        log::debug!("Welch t between smallest and largest size: {:.2}", t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimulatedClock;
    use crate::config::SAMPLE_CONFIG;
    use std::sync::Arc;

    fn evaluator(dir: &std::path::Path) -> PerformanceEvaluator {
        let mut config = ExperimentConfig::from_toml(SAMPLE_CONFIG).unwrap();
        config.output.results_dir = dir.to_path_buf();
        PerformanceEvaluator::new(&config, Arc::new(SimulatedClock::new())).unwrap()
    }

    #[test]
    fn test_composite_measurement_composition() {
        let dir = tempfile::tempdir().unwrap();
        let mut eval = evaluator(dir.path());

        let m = eval.measure_composite_performance(10_000).unwrap();
        assert_eq!(m.dataset_size, 10_000);
        assert_eq!(m.trial, 0);
        assert_eq!(m.total_gas, m.zkp_gas + m.abe_gas);
        assert_eq!(m.abe_gas, 100_000);
        assert!((240_000..=260_000).contains(&m.zkp_gas));

        // Total covers prove + verify + encrypt + decrypt + noise
        assert!(m.total_time >= m.zkp_time + m.abe_time + m.dp_time);
        assert!(m.total_time > m.zkp_time + 0.01, "verification time must be included");
    }

    #[test]
    fn test_simulators_draw_independent_jitter() {
        use crate::abe_simulator::encryption_secs;
        use crate::zkp_simulator::proving_secs;

        let dir = tempfile::tempdir().unwrap();
        let mut eval = evaluator(dir.path());

        let zkp = eval.measure_zkp_performance(10_000, 16_384).unwrap();
        let abe = eval.measure_abe_performance(10_000, 5);

        let zkp_factor = zkp.proof_time.as_secs_f64() / proving_secs(10_000, 16_384, 0.0);
        let abe_factor = abe.encrypt_time.as_secs_f64() / encryption_secs(10_000, 5, 0.0);
        assert!(
            (zkp_factor - abe_factor).abs() > 1e-6,
            "ZKP and ABE replayed the same jitter: {} vs {}",
            zkp_factor,
            abe_factor
        );
    }

    #[test]
    fn test_throughput_rejects_unrepresentable_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut eval = evaluator(dir.path());
        eval.settings.throughput_duration_secs = 1e20;

        assert!(matches!(eval.run_throughput_test(), Err(SimError::InvalidParameter(_))));
    }

    #[test]
    fn test_scalability_rows_are_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let mut eval = evaluator(dir.path());

        let rows = eval.run_scalability_test().unwrap();
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[0].dataset_size, 100);
        assert_eq!(rows[8].dataset_size, 10_000);
        assert_eq!(rows.iter().map(|r| r.trial).collect::<Vec<_>>(), vec![0, 1, 2, 0, 1, 2, 0, 1, 2]);
        assert!(rows.iter().all(|r| r.total_time > 0.0));

        let written = std::fs::read_to_string(dir.path().join(results::SCALABILITY_RESULTS)).unwrap();
        assert!(written.starts_with(
            "total_time,zkp_time,abe_time,dp_time,total_gas,zkp_gas,abe_gas,dataset_size,trial\n"
        ));
        assert!(dir.path().join(results::SCALABILITY_SUMMARY).exists());
    }

    #[test]
    fn test_baseline_comparison() {
        let dir = tempfile::tempdir().unwrap();
        let mut eval = evaluator(dir.path());

        let rows = eval.run_baseline_comparison().unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.baseline.as_str()).collect();
        assert_eq!(names, vec!["naive_onchain", "zkp_only", "abe_only", "dp_only", "manual_orchestration"]);
        assert!(rows.iter().all(|r| r.dataset_size == 10_000));

        let naive = &rows[0];
        assert_eq!(naive.gas, (10_000 / 32) * 20_000);
        assert_eq!(naive.time, 0.1);
        assert_eq!(rows[2].gas, 100_000);
        assert_eq!(rows[3].gas, 50_000);

        // Naive storage is the most expensive option
        assert!(rows.iter().skip(1).all(|r| r.gas < naive.gas));
        // Manual orchestration is slower than any single primitive
        assert!(rows[4].time > rows[1].time);
    }

    #[test]
    fn test_throughput_window_is_respected() {
        let dir = tempfile::tempdir().unwrap();
        let mut eval = evaluator(dir.path());

        let result = eval.run_throughput_test().unwrap();
        assert!(result.num_proofs > 0);
        assert!(result.duration_seconds >= 2.0);
        let expected = result.num_proofs as f64 / result.duration_seconds * 3600.0;
        assert!((result.throughput_per_hour - expected).abs() < 1e-6);
        assert!(dir.path().join(results::THROUGHPUT_RESULTS).exists());
    }

    #[test]
    fn test_run_all_writes_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut eval = evaluator(dir.path());

        let summary = eval.run_all_evaluations().unwrap();
        assert!(summary.avg_proof_time_10k.is_some());
        assert_eq!(summary.improvement_vs_manual, 3.2);
        assert!(summary.avg_gas_consumption > 300_000.0);

        let back: PerformanceSummary = eval.writer().read_json(results::PERFORMANCE_SUMMARY).unwrap();
        assert_eq!(back.improvement_vs_manual, 3.2);
        assert!((back.avg_gas_consumption - summary.avg_gas_consumption).abs() < 1e-6);
    }
}
