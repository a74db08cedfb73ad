// src/compliance.rs - Regulatory compliance, explainability and policy satisfaction
//
// Scores are stochastic: every requirement lands near full compliance with a
// small normal spread, clipped to a floor. Weights come from a fixed table per
// framework.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Bernoulli, Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{ComplianceConfig, ExperimentConfig, SeedStream};
use crate::error::{Result, SimError};
use crate::metrics::{group_by, mean};
use crate::results::{self, ResultsWriter};

const REQUIREMENT_BASE_SCORE: f64 = 0.95;
const REQUIREMENT_SCORE_STD: f64 = 0.03;
const REQUIREMENT_SCORE_FLOOR: f64 = 0.85;

const EXPLAINABILITY_MEAN: f64 = 4.2;
const EXPLAINABILITY_STD: f64 = 0.3;
const LIKERT_MIN: f64 = 1.0;
const LIKERT_MAX: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Framework {
    #[serde(rename = "GDPR")]
    Gdpr,
    #[serde(rename = "HIPAA")]
    Hipaa,
    #[serde(rename = "CCPA")]
    Ccpa,
}

impl Framework {
    /// Evaluation order
    pub const ALL: [Framework; 3] = [Framework::Gdpr, Framework::Hipaa, Framework::Ccpa];

    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Gdpr => "GDPR",
            Framework::Hipaa => "HIPAA",
            Framework::Ccpa => "CCPA",
        }
    }

    /// Requirement names and their weights
    pub fn requirements(&self) -> &'static [(&'static str, f64)] {
        match self {
            Framework::Gdpr => &[
                ("data_minimization", 1.0),
                ("purpose_limitation", 0.9),
                ("storage_limitation", 0.8),
                ("accuracy", 0.9),
                ("integrity_confidentiality", 1.0),
                ("accountability", 0.95),
                ("right_to_erasure", 0.85),
                ("data_portability", 0.7),
            ],
            Framework::Hipaa => &[
                ("access_control", 1.0),
                ("audit_controls", 0.95),
                ("integrity_controls", 0.9),
                ("transmission_security", 0.95),
                ("authentication", 0.9),
                ("encryption", 1.0),
                ("deidentification", 0.95),
            ],
            Framework::Ccpa => &[
                ("right_to_know", 0.9),
                ("right_to_delete", 0.85),
                ("right_to_opt_out", 0.95),
                ("non_discrimination", 0.8),
                ("disclosure_requirements", 0.9),
                ("data_security", 1.0),
            ],
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequirementScore {
    pub framework: Framework,
    pub requirement: String,
    pub weight: f64,
    pub score: f64,
    pub weighted_score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameworkScore {
    pub framework: String,
    pub total_weighted_score: f64,
    pub avg_score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExplainabilityScores {
    pub num_evaluators: u32,
    pub mean_score: f64,
    /// Population standard deviation
    pub std_score: f64,
    pub min_score: f64,
    pub max_score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicySatisfaction {
    pub num_policies: u32,
    pub satisfied: u32,
    pub satisfaction_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSummary {
    pub gdpr_score: f64,
    pub hipaa_score: f64,
    pub ccpa_score: f64,
    pub avg_compliance: f64,
    pub explainability_score: f64,
    pub policy_satisfaction_rate: f64,
}

/// Sum of weighted scores and mean raw score per framework, sorted by name.
pub fn framework_scores(rows: &[RequirementScore]) -> Vec<FrameworkScore> {
    group_by(rows, |r| r.framework.as_str())
        .into_iter()
        .map(|(name, group)| FrameworkScore {
            framework: name.to_string(),
            total_weighted_score: group.iter().map(|r| r.weighted_score).sum(),
            avg_score: mean(group.iter().map(|r| r.score)).unwrap_or(0.0),
        })
        .collect()
}

pub struct ComplianceEvaluator {
    settings: ComplianceConfig,
    rng: StdRng,
    writer: ResultsWriter,
}

impl ComplianceEvaluator {
    pub fn new(config: &ExperimentConfig) -> Result<Self> {
        Ok(Self {
            settings: config.compliance.clone(),
            rng: StdRng::seed_from_u64(config.simulation.stream_seed(SeedStream::Compliance)),
            writer: ResultsWriter::new(&config.output.results_dir)?,
        })
    }

    pub fn writer(&self) -> &ResultsWriter {
        &self.writer
    }

    fn sample_normal(&mut self, mean: f64, std_dev: f64) -> Result<f64> {
        let normal = Normal::new(mean, std_dev)
            .map_err(|e| SimError::InvalidParameter(format!("normal({}, {}): {}", mean, std_dev, e)))?;
        Ok(normal.sample(&mut self.rng))
    }

    /// Score in `[0.85, 1.0]` for one requirement
    pub fn evaluate_requirement(&mut self) -> Result<f64> {
        let score = self.sample_normal(REQUIREMENT_BASE_SCORE, REQUIREMENT_SCORE_STD)?;
        Ok(score.clamp(REQUIREMENT_SCORE_FLOOR, 1.0))
    }

    pub fn evaluate_framework(&mut self, framework: Framework) -> Result<Vec<RequirementScore>> {
        framework.requirements()
            .iter()
            .map(|&(requirement, weight)| {
                let score = self.evaluate_requirement()?;
                Ok(RequirementScore {
                    framework,
                    requirement: requirement.to_string(),
                    weight,
                    score,
                    weighted_score: score * weight,
                })
            })
            .collect()
    }

    /// Simulated expert ratings of compliance reports on a 1-5 scale
    pub fn measure_explainability(&mut self) -> Result<ExplainabilityScores> {
        log::info!("Measuring explainability...");

        let num_evaluators = self.settings.num_evaluators;
        let mut scores = Vec::with_capacity(num_evaluators as usize);
        for _ in 0..num_evaluators {
            let score = self.sample_normal(EXPLAINABILITY_MEAN, EXPLAINABILITY_STD)?;
            scores.push(score.clamp(LIKERT_MIN, LIKERT_MAX));
        }

        let mean_score = mean(scores.iter().copied()).unwrap_or(0.0);
        let variance = mean(scores.iter().map(|s| (s - mean_score).powi(2))).unwrap_or(0.0);
        let result = ExplainabilityScores {
            num_evaluators,
            mean_score,
            std_score: variance.sqrt(),
            min_score: scores.iter().copied().fold(f64::INFINITY, f64::min),
            max_score: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };

        self.writer.write_json(results::EXPLAINABILITY_SCORES, &result)?;
        log::info!("Explainability score: {:.2}/5.0", result.mean_score);
        Ok(result)
    }

    pub fn measure_policy_satisfaction(&mut self) -> Result<PolicySatisfaction> {
        log::info!("Measuring policy satisfaction...");

        let success = Bernoulli::new(self.settings.policy_success_probability)
            .map_err(|e| SimError::InvalidParameter(format!("policy success probability: {}", e)))?;
        let num_policies = self.settings.num_policies;
        let satisfied = (0..num_policies)
            .filter(|_| success.sample(&mut self.rng))
            .count() as u32;

        let result = PolicySatisfaction {
            num_policies,
            satisfied,
            satisfaction_rate: f64::from(satisfied) / f64::from(num_policies),
        };

        self.writer.write_json(results::POLICY_SATISFACTION, &result)?;
        log::info!("Policy satisfaction rate: {:.1}%", result.satisfaction_rate * 100.0);
        Ok(result)
    }

    pub fn run_compliance_evaluation(&mut self) -> Result<ComplianceSummary> {
        log::info!("=== COMPLIANCE EVALUATION ===");

        let mut details = Vec::new();
        for framework in Framework::ALL {
            log::info!("Evaluating {} compliance...", framework);
            details.extend(self.evaluate_framework(framework)?);
        }
        self.writer.write_csv(results::COMPLIANCE_DETAILS, &details)?;

        let scores = framework_scores(&details);
        self.writer.write_csv(results::FRAMEWORK_SCORES, &scores)?;

        let explainability = self.measure_explainability()?;
        let policies = self.measure_policy_satisfaction()?;

        let score_of = |framework: Framework| {
            scores.iter()
                .find(|s| s.framework == framework.as_str())
                .map(|s| s.avg_score)
                .unwrap_or(0.0)
        };
        let summary = ComplianceSummary {
            gdpr_score: score_of(Framework::Gdpr),
            hipaa_score: score_of(Framework::Hipaa),
            ccpa_score: score_of(Framework::Ccpa),
            avg_compliance: mean(scores.iter().map(|s| s.avg_score)).unwrap_or(0.0),
            explainability_score: explainability.mean_score,
            policy_satisfaction_rate: policies.satisfaction_rate,
        };

        self.writer.write_json(results::COMPLIANCE_SUMMARY, &summary)?;
        log::info!("Compliance evaluation completed, results in {}", self.writer.results_dir().display());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SAMPLE_CONFIG;

    fn evaluator(dir: &std::path::Path) -> ComplianceEvaluator {
        let mut config = ExperimentConfig::from_toml(SAMPLE_CONFIG).unwrap();
        config.output.results_dir = dir.to_path_buf();
        ComplianceEvaluator::new(&config).unwrap()
    }

    #[test]
    fn test_requirement_tables() {
        assert_eq!(Framework::Gdpr.requirements().len(), 8);
        assert_eq!(Framework::Hipaa.requirements().len(), 7);
        assert_eq!(Framework::Ccpa.requirements().len(), 6);
        for framework in Framework::ALL {
            assert!(framework.requirements().iter().all(|&(_, w)| w > 0.0 && w <= 1.0));
        }
    }

    #[test]
    fn test_requirement_scores_are_clipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut eval = evaluator(dir.path());

        for _ in 0..500 {
            let score = eval.evaluate_requirement().unwrap();
            assert!((0.85..=1.0).contains(&score), "score {} out of range", score);
        }

        let rows = eval.evaluate_framework(Framework::Hipaa).unwrap();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0].requirement, "access_control");
        for row in &rows {
            assert_eq!(row.framework, Framework::Hipaa);
            assert!((row.weighted_score - row.score * row.weight).abs() < 1e-12);
        }
    }

    #[test]
    fn test_framework_scores_sorted_by_name() {
        let row = |framework, score| RequirementScore {
            framework,
            requirement: "r".to_string(),
            weight: 0.5,
            score,
            weighted_score: score * 0.5,
        };
        let rows = vec![row(Framework::Gdpr, 0.9), row(Framework::Ccpa, 1.0), row(Framework::Gdpr, 0.95)];

        let scores = framework_scores(&rows);
        let names: Vec<&str> = scores.iter().map(|s| s.framework.as_str()).collect();
        assert_eq!(names, vec!["CCPA", "GDPR"]);
        assert!((scores[1].avg_score - 0.925).abs() < 1e-12);
        assert!((scores[1].total_weighted_score - 0.925).abs() < 1e-12);
    }

    #[test]
    fn test_explainability_scores() {
        let dir = tempfile::tempdir().unwrap();
        let mut eval = evaluator(dir.path());

        let result = eval.measure_explainability().unwrap();
        assert_eq!(result.num_evaluators, 15);
        assert!(result.min_score >= 1.0 && result.max_score <= 5.0);
        assert!(result.min_score <= result.mean_score && result.mean_score <= result.max_score);
        assert!(result.std_score >= 0.0);
    }

    #[test]
    fn test_run_compliance_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let mut eval = evaluator(dir.path());

        let summary = eval.run_compliance_evaluation().unwrap();
        for score in [summary.gdpr_score, summary.hipaa_score, summary.ccpa_score, summary.avg_compliance] {
            assert!((0.85..=1.0).contains(&score));
        }
        assert!(summary.policy_satisfaction_rate > 0.8);

        let details = std::fs::read_to_string(dir.path().join(results::COMPLIANCE_DETAILS)).unwrap();
        assert!(details.starts_with("framework,requirement,weight,score,weighted_score\n"));
        assert_eq!(details.lines().count(), 1 + 8 + 7 + 6);
        assert!(details.lines().nth(1).unwrap().starts_with("GDPR,data_minimization,"));

        let scores: Vec<FrameworkScore> = eval.writer().read_csv(results::FRAMEWORK_SCORES).unwrap();
        let names: Vec<&str> = scores.iter().map(|s| s.framework.as_str()).collect();
        assert_eq!(names, vec!["CCPA", "GDPR", "HIPAA"]);
    }
}
