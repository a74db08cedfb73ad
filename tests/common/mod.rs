use std::path::Path;

use aibpb_sim::ExperimentConfig;

/// Small simulated-clock experiment writing into `results_dir`.
///
/// The seed goes through TOML, so it must not exceed `i64::MAX`.
pub fn test_config(results_dir: &Path, seed: u64) -> ExperimentConfig {
    let toml = format!(
        r#"
[simulation]
random_seed = {seed}
clock = "simulated"

[output]
results_dir = "{results}"
figures_dir = "{results}/figures"

[datasets]
sizes = [100, 1000, 10000]

[[baselines]]
name = "naive_onchain"

[[baselines]]
name = "zkp_only"

[[baselines]]
name = "manual_orchestration"

[privacy]
epsilon_values = [0.5, 1.0, 2.0]
attack_attempts = 2000

[performance]
trials_per_size = 3
throughput_duration_secs = 1.0
"#,
        seed = seed,
        results = results_dir.display().to_string().replace('\\', "/"),
    );
    ExperimentConfig::from_toml(&toml).expect("test config must parse")
}
