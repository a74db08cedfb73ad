//! Performance Record Types and Aggregation
//!
//! One record type per performance artifact, with fixed fields whose order is
//! the column order of the written CSV. Times are seconds, gas is integer units.
//!
//! Core functionality includes:
//! - Per-trial composite measurements tagged with dataset size and trial index
//! - Baseline, throughput and summary records
//! - Explicit group-by-key aggregation with confidence intervals

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// ZKP prove + verify cost for one proof
#[derive(Clone, Debug, PartialEq)]
pub struct ZkpMeasurement {
    pub proof_time: Duration,
    pub verify_time: Duration,
    pub gas: u64,
    pub proof_size: usize,
    pub verified: bool,
}

/// ABE encrypt + decrypt cost for one ciphertext
#[derive(Clone, Debug, PartialEq)]
pub struct AbeMeasurement {
    pub encrypt_time: Duration,
    pub decrypt_time: Duration,
    pub gas: u64,
    pub ciphertext_size: usize,
}

/// One trial of the composite ZKP + ABE + DP pipeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompositeMeasurement {
    pub total_time: f64,
    pub zkp_time: f64,
    pub abe_time: f64,
    pub dp_time: f64,
    pub total_gas: u64,
    pub zkp_gas: u64,
    pub abe_gas: u64,
    pub dataset_size: u64,
    pub trial: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaselineResult {
    pub baseline: String,
    pub time: f64,
    pub gas: u64,
    pub dataset_size: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThroughputResult {
    pub duration_seconds: f64,
    pub num_proofs: u64,
    pub throughput_per_hour: f64,
}

impl ThroughputResult {
    pub fn new(elapsed: Duration, num_proofs: u64) -> Self {
        let duration_seconds = elapsed.as_secs_f64();
        let throughput_per_hour = if duration_seconds > 0.0 {
            num_proofs as f64 / duration_seconds * 3600.0
        } else {
            0.0
        };
        Self {
            duration_seconds,
            num_proofs,
            throughput_per_hour,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Mean composite time at 10K records; `None` when that size was not swept
    pub avg_proof_time_10k: Option<f64>,
    pub avg_gas_consumption: f64,
    pub throughput_per_hour: f64,
    pub improvement_vs_manual: f64,
}

/// Per-dataset-size statistics over the scalability trials
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalabilitySummary {
    pub dataset_size: u64,
    pub trials: usize,
    pub mean_total_time: f64,
    pub std_total_time: f64,
    pub min_total_time: f64,
    pub max_total_time: f64,
    pub ci95_low: Option<f64>,
    pub ci95_high: Option<f64>,
    pub mean_total_gas: f64,
}

/// Descriptive statistics for a sample
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleStatistics {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); zero for a single observation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SampleStatistics {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let count = samples.len();
        let mean = samples.iter().sum::<f64>() / count as f64;
        let std_dev = if count > 1 {
            let variance = samples.iter()
                .map(|x| (x - mean).powi(2))
                .sum::<f64>() / (count - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self { count, mean, std_dev, min, max })
    }

    /// 95% normal-approximation interval for the mean; needs at least 3 samples.
    pub fn confidence_interval(&self) -> Option<(f64, f64)> {
        if self.count < 3 {
            return None;
        }
        let margin = 1.96 * self.std_dev / (self.count as f64).sqrt();
        Some((self.mean - margin, self.mean + margin))
    }
}

/// Absolute Welch t statistic between two samples.
pub fn welch_t_statistic(a: &[f64], b: &[f64]) -> Option<f64> {
    let stats_a = SampleStatistics::from_samples(a)?;
    let stats_b = SampleStatistics::from_samples(b)?;
    if stats_a.count < 2 || stats_b.count < 2 {
        return None;
    }

    let se_a = stats_a.std_dev.powi(2) / stats_a.count as f64;
    let se_b = stats_b.std_dev.powi(2) / stats_b.count as f64;
    let denominator = (se_a + se_b).sqrt();
    if denominator == 0.0 {
        return None;
    }

    Some(((stats_a.mean - stats_b.mean) / denominator).abs())
}

/// Group rows by a key; groups come back in key order.
pub fn group_by<K, T, F>(rows: &[T], key: F) -> BTreeMap<K, Vec<&T>>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut groups: BTreeMap<K, Vec<&T>> = BTreeMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().push(row);
    }
    groups
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Aggregate scalability trials by dataset size.
pub fn summarize_by_dataset_size(measurements: &[CompositeMeasurement]) -> Vec<ScalabilitySummary> {
    group_by(measurements, |m| m.dataset_size)
        .into_iter()
        .filter_map(|(dataset_size, rows)| {
            let times: Vec<f64> = rows.iter().map(|m| m.total_time).collect();
            let stats = SampleStatistics::from_samples(&times)?;
            let interval = stats.confidence_interval();
            let mean_total_gas = mean(rows.iter().map(|m| m.total_gas as f64))?;

            Some(ScalabilitySummary {
                dataset_size,
                trials: stats.count,
                mean_total_time: stats.mean,
                std_total_time: stats.std_dev,
                min_total_time: stats.min,
                max_total_time: stats.max,
                ci95_low: interval.map(|(low, _)| low),
                ci95_high: interval.map(|(_, high)| high),
                mean_total_gas,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(dataset_size: u64, trial: u32, total_time: f64, total_gas: u64) -> CompositeMeasurement {
        CompositeMeasurement {
            total_time,
            zkp_time: 0.0,
            abe_time: 0.0,
            dp_time: 0.0,
            total_gas,
            zkp_gas: total_gas,
            abe_gas: 0,
            dataset_size,
            trial,
        }
    }

    #[test]
    fn test_sample_statistics() {
        let stats = SampleStatistics::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.count, 8);
        assert_eq!(stats.mean, 5.0);
        assert!((stats.std_dev - 2.138_089_935).abs() < 1e-6);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);

        let (low, high) = stats.confidence_interval().unwrap();
        assert!(low < 5.0 && high > 5.0);

        assert!(SampleStatistics::from_samples(&[]).is_none());
        let single = SampleStatistics::from_samples(&[1.5]).unwrap();
        assert_eq!(single.std_dev, 0.0);
        assert!(single.confidence_interval().is_none());
    }

    #[test]
    fn test_group_by_orders_keys() {
        let rows = vec![
            measurement(1_000, 0, 1.0, 10),
            measurement(100, 0, 0.5, 20),
            measurement(1_000, 1, 3.0, 30),
        ];
        let groups = group_by(&rows, |m| m.dataset_size);
        let keys: Vec<u64> = groups.keys().copied().collect();
        assert_eq!(keys, vec![100, 1_000]);
        assert_eq!(groups[&1_000].len(), 2);
    }

    #[test]
    fn test_summarize_by_dataset_size() {
        let rows = vec![
            measurement(100, 0, 1.0, 100),
            measurement(100, 1, 2.0, 200),
            measurement(100, 2, 3.0, 300),
            measurement(10, 0, 0.5, 50),
        ];
        let summary = summarize_by_dataset_size(&rows);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].dataset_size, 10);
        assert_eq!(summary[0].trials, 1);
        assert!(summary[0].ci95_low.is_none());

        assert_eq!(summary[1].mean_total_time, 2.0);
        assert_eq!(summary[1].mean_total_gas, 200.0);
        assert_eq!(summary[1].min_total_time, 1.0);
        assert_eq!(summary[1].max_total_time, 3.0);
        assert!(summary[1].ci95_low.is_some());
    }

    #[test]
    fn test_throughput_per_hour() {
        let result = ThroughputResult::new(Duration::from_secs(60), 30);
        assert_eq!(result.throughput_per_hour, 1_800.0);
        assert_eq!(ThroughputResult::new(Duration::ZERO, 0).throughput_per_hour, 0.0);
    }

    #[test]
    fn test_welch_t_statistic() {
        let a = [1.0, 1.1, 0.9, 1.0];
        let b = [3.0, 3.1, 2.9, 3.0];
        assert!(welch_t_statistic(&a, &b).unwrap() > 10.0);
        assert!(welch_t_statistic(&a, &[1.0]).is_none());
        assert!(welch_t_statistic(&[1.0, 1.0], &[1.0, 1.0]).is_none());
    }
}
