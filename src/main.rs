//! AIBPB Experiment Runner
//!
//! Entry point for the composite-proof simulation suite. Loads the experiment
//! configuration once, then runs the performance, privacy and compliance
//! stages in order and combines their summaries into a report.
//!
//! A failing stage is logged and the remaining stages still run; artifacts of
//! completed stages are kept and the process exits non-zero.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use chrono::Local;
use clap::{Parser, ValueEnum};

use aibpb_sim::{
    ClockMode, ComplianceEvaluator, ExperimentConfig, ExperimentReport, PerformanceEvaluator,
    PrivacyAnalyzer, ResultsWriter, SharedClock, SimError,
};

#[derive(Parser)]
#[command(name = "aibpb-experiments")]
#[command(about = "Simulate composite ZKP + ABE + DP proof pipelines")]
struct Cli {
    /// Stage to run
    #[arg(value_enum, default_value_t = Stage::All)]
    stage: Stage,

    /// Experiment configuration file
    #[arg(short, long, default_value = "experiments/config.toml")]
    config: PathBuf,

    /// Override simulation.random_seed
    #[arg(long)]
    seed: Option<u64>,

    /// Small dataset sizes, two trials, short throughput window
    #[arg(long)]
    quick_test: bool,

    /// Advance virtual time instead of sleeping for modeled delays
    #[arg(long)]
    simulated_clock: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Stage {
    Performance,
    Privacy,
    Compliance,
    Report,
    All,
}

impl Stage {
    fn expand(self) -> Vec<Stage> {
        match self {
            Stage::All => vec![Stage::Performance, Stage::Privacy, Stage::Compliance, Stage::Report],
            stage => vec![stage],
        }
    }

    fn title(self) -> &'static str {
        match self {
            Stage::Performance => "Performance Evaluation",
            Stage::Privacy => "Privacy Analysis",
            Stage::Compliance => "Compliance Evaluation",
            Stage::Report => "Experiment Report",
            Stage::All => "All Stages",
        }
    }
}

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    let mut config = match ExperimentConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(seed) = cli.seed {
        config.simulation.random_seed = seed;
    }
    if cli.quick_test {
        log::info!("Quick test mode: reduced sizes and trials");
        config.apply_quick_test();
    }
    if cli.simulated_clock {
        config.simulation.clock = ClockMode::Simulated;
    }

    if let Err(e) = fs::create_dir_all(&config.output.figures_dir) {
        log::warn!("Could not create {}: {}", config.output.figures_dir.display(), e);
    }

    println!("AIBPB Simulation Framework");
    println!("==========================");
    println!("Starting experiments at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("Seed: {}, clock: {:?}", config.simulation.random_seed, config.simulation.clock);

    let clock = config.simulation.clock.build();
    let stages = cli.stage.expand();
    let started = Instant::now();

    let mut succeeded = 0;
    for (i, &stage) in stages.iter().enumerate() {
        println!("\n[Step {}/{}] {}", i + 1, stages.len(), stage.title());
        let stage_start = Instant::now();
        match run_stage(stage, &config, &clock) {
            Ok(()) => {
                succeeded += 1;
                log::info!("{} completed in {:.1}s", stage.title(), stage_start.elapsed().as_secs_f64());
            }
            Err(e) => log::error!("{} failed after {:.1}s: {}", stage.title(), stage_start.elapsed().as_secs_f64(), e),
        }
    }

    let elapsed = started.elapsed().as_secs();
    println!("\n=== EXECUTION SUMMARY ===");
    println!("Total execution time: {}h {}m {}s", elapsed / 3600, (elapsed % 3600) / 60, elapsed % 60);
    println!("Successful stages: {}/{}", succeeded, stages.len());
    println!("Results saved to: {}", config.output.results_dir.display());

    if succeeded == stages.len() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_stage(stage: Stage, config: &ExperimentConfig, clock: &SharedClock) -> Result<(), SimError> {
    match stage {
        Stage::Performance => {
            let summary = PerformanceEvaluator::new(config, clock.clone())?.run_all_evaluations()?;
            match summary.avg_proof_time_10k {
                Some(secs) => println!("  Avg proof time (10K records): {:.3}s", secs),
                None => println!("  Avg proof time (10K records): not swept"),
            }
            println!("  Avg gas consumption: {:.0}", summary.avg_gas_consumption);
            println!("  Throughput: {:.1} proofs/hour", summary.throughput_per_hour);
        }
        Stage::Privacy => {
            let summary = PrivacyAnalyzer::new(config, clock.clone())?.run_privacy_analysis()?;
            println!("  Avg leakage reduction: {:.1}x", summary.avg_leakage_reduction);
            println!("  Avg k-anonymity: {:.0}", summary.avg_k_anonymity);
            println!("  Security level: {:.4}%", summary.security_level * 100.0);
        }
        Stage::Compliance => {
            let summary = ComplianceEvaluator::new(config)?.run_compliance_evaluation()?;
            println!("  GDPR compliance: {:.1}%", summary.gdpr_score * 100.0);
            println!("  HIPAA compliance: {:.1}%", summary.hipaa_score * 100.0);
            println!("  CCPA compliance: {:.1}%", summary.ccpa_score * 100.0);
            println!("  Policy satisfaction: {:.1}%", summary.policy_satisfaction_rate * 100.0);
        }
        Stage::Report => {
            let writer = ResultsWriter::new(&config.output.results_dir)?;
            let report = ExperimentReport::collect(&writer, config.simulation.random_seed)?;
            report.write(&writer)?;
            report.print();
        }
        Stage::All => {
            for stage in Stage::All.expand() {
                run_stage(stage, config, clock)?;
            }
        }
    }
    Ok(())
}
