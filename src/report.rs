//! Combined report over the stage summaries already on disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compliance::ComplianceSummary;
use crate::error::Result;
use crate::metrics::PerformanceSummary;
use crate::privacy::PrivacySummary;
use crate::results::{self, ResultsWriter};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub generated_at: DateTime<Utc>,
    pub random_seed: u64,
    pub performance: PerformanceSummary,
    pub privacy: PrivacySummary,
    pub compliance: ComplianceSummary,
}

impl ExperimentReport {
    /// Reads the three stage summaries; a missing one is an I/O error naming its path.
    pub fn collect(writer: &ResultsWriter, random_seed: u64) -> Result<Self> {
        Ok(Self {
            generated_at: Utc::now(),
            random_seed,
            performance: writer.read_json(results::PERFORMANCE_SUMMARY)?,
            privacy: writer.read_json(results::PRIVACY_SUMMARY)?,
            compliance: writer.read_json(results::COMPLIANCE_SUMMARY)?,
        })
    }

    pub fn write(&self, writer: &ResultsWriter) -> Result<()> {
        writer.write_json(results::EXPERIMENT_REPORT, self)?;
        Ok(())
    }

    pub fn print(&self) {
        println!("\n=== KEY METRICS ({}) ===", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));

        println!("Performance:");
        match self.performance.avg_proof_time_10k {
            Some(secs) => println!("  Avg proof time (10K records): {:.3}s", secs),
            None => println!("  Avg proof time (10K records): not measured"),
        }
        println!("  Avg gas consumption: {:.0}", self.performance.avg_gas_consumption);
        println!("  Throughput: {:.1} proofs/hour", self.performance.throughput_per_hour);
        println!("  Improvement vs manual: {:.1}x", self.performance.improvement_vs_manual);

        println!("Privacy:");
        println!("  Avg leakage reduction: {:.1}x", self.privacy.avg_leakage_reduction);
        println!("  Avg k-anonymity (high): {:.0}", self.privacy.avg_k_anonymity);
        println!("  Security level: {:.4}%", self.privacy.security_level * 100.0);

        println!("Compliance:");
        println!("  GDPR: {:.1}%", self.compliance.gdpr_score * 100.0);
        println!("  HIPAA: {:.1}%", self.compliance.hipaa_score * 100.0);
        println!("  CCPA: {:.1}%", self.compliance.ccpa_score * 100.0);
        println!("  Explainability: {:.2}/5.0", self.compliance.explainability_score);
        println!("  Policy satisfaction: {:.1}%", self.compliance.policy_satisfaction_rate * 100.0);
    }
}
