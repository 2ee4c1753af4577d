//! chanemu Scenario CLI
//!
//! Run seeded self-check scenarios against the shared-medium emulator.
//! `RUST_LOG` overrides the level chosen by `--verbose`.

use chanemu_core::{ChannelParams, MediumConfig};
use chanemu_env::EntropySource;
use chanemu_sim::scenarios::ScenarioId;
use chanemu_sim::{ScenarioResult, ScenarioRunner};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// chanemu scenario runner
#[derive(Parser, Debug)]
#[command(name = "chanemu-sim")]
#[command(about = "Run seeded self-check scenarios against the RF-medium emulator", long_about = None)]
struct Args {
    /// Master seed (0 = draw one from the OS)
    #[arg(short, long, default_value = "42")]
    seed: u64,
    
    /// Number of virtual radios
    #[arg(short, long, default_value = "4")]
    radios: usize,
    
    /// Scenario to run (tone_loopback, self_exclusion, reset_floor, gain_clamp, port_growth, threaded_duplex, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,
    
    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,
    
    /// Samples per read or write
    #[arg(short, long, default_value = "512")]
    block_len: usize,
    
    /// Medium config JSON whose channel replaces the default channel
    #[arg(short, long)]
    config: Option<String>,
    
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
    
    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,
}

fn fatal(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn load_channel(path: &str) -> Result<ChannelParams, String> {
    MediumConfig::from_json_file(path)
        .map(|config| config.channel)
        .map_err(|e| format!("{}: {}", path, e))
}

fn select_scenarios(name: &str) -> Result<Vec<ScenarioId>, String> {
    if name == "all" {
        return Ok(ScenarioId::all());
    }
    name.parse().map(|id| vec![id]).map_err(|e: String| {
        let known: Vec<_> = ScenarioId::all().iter().map(|s| s.name()).collect();
        format!("{} (known: {}, all)", e, known.join(", "))
    })
}

fn print_json(results: &[ScenarioResult]) {
    let failed = results.iter().filter(|r| !r.passed).count();
    let summary = serde_json::json!({
        "total": results.len(),
        "passed": results.len() - failed,
        "failed": failed,
        "results": results.iter().map(|r| {
            serde_json::json!({
                "scenario": r.scenario.name(),
                "seed": r.seed,
                "passed": r.passed,
                "stats": r.stats,
                "failure_reason": r.failure_reason,
            })
        }).collect::<Vec<_>>(),
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(text) => println!("{}", text),
        Err(e) => fatal(format!("failed to encode summary: {}", e)),
    }
}

fn log_summary(results: &[ScenarioResult]) {
    let failures: Vec<&ScenarioResult> = results.iter().filter(|r| !r.passed).collect();
    if failures.is_empty() {
        info!(runs = results.len(), "all scenario runs passed");
        return;
    }
    error!(failed = failures.len(), runs = results.len(), "scenario runs failed");
    for r in failures {
        error!(
            scenario = r.scenario.name(),
            seed = r.seed,
            reason = r.failure_reason.as_deref().unwrap_or("unknown"),
            "failed run"
        );
    }
}

fn main() {
    let args = Args::parse();
    
    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        fatal(format!("failed to set tracing subscriber: {}", e));
    }
    
    let scenarios = select_scenarios(&args.scenario).unwrap_or_else(|e| fatal(e));
    let channel = args
        .config
        .as_deref()
        .map(load_channel)
        .transpose()
        .unwrap_or_else(|e| fatal(e));
    
    let base_seed = if args.seed == 0 {
        chanemu_env::OsEntropy::new().seed()
    } else {
        args.seed
    };
    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_seed,
        seeds = args.seeds,
        radios = args.radios,
        "chanemu scenario run"
    );
    
    let mut results: Vec<ScenarioResult> = Vec::with_capacity(args.seeds * scenarios.len());
    for offset in 0..args.seeds as u64 {
        let seed = base_seed.wrapping_add(offset);
        let runner = ScenarioRunner::new(seed, args.radios)
            .with_block_len(args.block_len)
            .with_channel(channel.clone());
        
        for &scenario in &scenarios {
            let result = runner.run(scenario);
            if result.passed {
                info!(scenario = scenario.name(), seed, "passed");
            } else {
                error!(
                    scenario = scenario.name(),
                    seed,
                    reason = result.failure_reason.as_deref().unwrap_or("unknown"),
                    "failed"
                );
            }
            results.push(result);
        }
    }
    
    if args.json {
        print_json(&results);
    } else {
        log_summary(&results);
    }
    
    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
}
