//! Typed CSV/JSON result artifacts under the configured results directory.
//!
//! Column names come from the serialized record fields, so a record type is the
//! schema of its file. Writes go to a temporary sibling first and are renamed
//! into place, so a file is only ever visible once its table is complete.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SimError};

pub const SCALABILITY_RESULTS: &str = "scalability_results.csv";
pub const SCALABILITY_SUMMARY: &str = "scalability_summary.csv";
pub const BASELINE_COMPARISON: &str = "baseline_comparison.csv";
pub const THROUGHPUT_RESULTS: &str = "throughput_results.json";
pub const PERFORMANCE_SUMMARY: &str = "performance_summary.json";

pub const INFORMATION_LEAKAGE: &str = "information_leakage.csv";
pub const K_ANONYMITY: &str = "k_anonymity.csv";
pub const DP_COMPOSITION: &str = "dp_composition.csv";
pub const ATTACK_RESISTANCE: &str = "attack_resistance.json";
pub const PRIVACY_SUMMARY: &str = "privacy_summary.json";

pub const COMPLIANCE_DETAILS: &str = "compliance_details.csv";
pub const FRAMEWORK_SCORES: &str = "framework_scores.csv";
pub const EXPLAINABILITY_SCORES: &str = "explainability_scores.json";
pub const POLICY_SATISFACTION: &str = "policy_satisfaction.json";
pub const COMPLIANCE_SUMMARY: &str = "compliance_summary.json";

pub const EXPERIMENT_REPORT: &str = "experiment_report.json";

#[derive(Clone, Debug)]
pub struct ResultsWriter {
    results_dir: PathBuf,
}

impl ResultsWriter {
    /// Creates the results directory if needed.
    pub fn new(results_dir: impl Into<PathBuf>) -> Result<Self> {
        let results_dir = results_dir.into();
        fs::create_dir_all(&results_dir).map_err(|e| SimError::io(&results_dir, e))?;
        Ok(Self { results_dir })
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.results_dir.join(file_name)
    }

    pub fn write_csv<T: Serialize>(&self, file_name: &str, rows: &[T]) -> Result<PathBuf> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer.serialize(row)?;
        }
        let bytes = writer.into_inner().map_err(|e| {
            let cause = e.error();
            SimError::io(self.path(file_name), std::io::Error::new(cause.kind(), cause.to_string()))
        })?;

        let path = self.commit(file_name, &bytes)?;
        log::debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(path)
    }

    pub fn write_json<T: Serialize>(&self, file_name: &str, value: &T) -> Result<PathBuf> {
        let body = serde_json::to_string_pretty(value)?;
        let path = self.commit(file_name, body.as_bytes())?;
        log::debug!("Wrote {}", path.display());
        Ok(path)
    }

    pub fn read_csv<T: DeserializeOwned>(&self, file_name: &str) -> Result<Vec<T>> {
        let path = self.path(file_name);
        let file = fs::File::open(&path).map_err(|e| SimError::io(&path, e))?;
        let mut reader = csv::Reader::from_reader(file);
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    }

    pub fn read_json<T: DeserializeOwned>(&self, file_name: &str) -> Result<T> {
        let path = self.path(file_name);
        let body = fs::read_to_string(&path).map_err(|e| SimError::io(&path, e))?;
        Ok(serde_json::from_str(&body)?)
    }

    fn commit(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(file_name);
        let staging = self.path(&format!(".{}.partial", file_name));
        fs::write(&staging, bytes).map_err(|e| SimError::io(&staging, e))?;
        fs::rename(&staging, &path).map_err(|e| SimError::io(&path, e))?;
        Ok(path)
    }
}
