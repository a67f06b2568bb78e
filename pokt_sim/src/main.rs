//! POKT Economic Simulator CLI
//!
//! Run Monte Carlo trials of a named experiment.

use clap::Parser;
use pokt_core::ParamSet;
use pokt_sim::exporter::write_exports;
use pokt_sim::{ExperimentId, TrialExport, TrialResult, TrialRunner};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// POKT network economic simulation CLI
#[derive(Parser, Debug)]
#[command(name = "pokt-sim")]
#[command(about = "Run Monte Carlo simulations of the POKT relay economy", long_about = None)]
struct Args {
    /// Experiment to run (test1, base)
    #[arg(short, long, default_value = "test1")]
    experiment: String,

    /// JSON parameter file replacing the experiment's preset
    #[arg(short, long)]
    params: Option<String>,

    /// Blocks per run (defaults to the experiment's setting)
    #[arg(short, long)]
    blocks: Option<u64>,

    /// Monte Carlo runs (defaults to the experiment's setting)
    #[arg(short, long)]
    runs: Option<usize>,

    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Draw from the thread RNG; runs are not reproducible
    #[arg(long, conflicts_with = "seed")]
    unseeded: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export per-block records of every run to a JSON file
    #[arg(long)]
    export: Option<String>,
}

fn load_params(path: &str) -> Result<ParamSet, String> {
    let json = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
    ParamSet::from_json_str(&json).map_err(|e| format!("{}: {}", path, e))
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let experiment: ExperimentId = args.experiment.parse().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("Available experiments: test1, base");
        std::process::exit(2);
    });

    let mut setup = experiment.setup();
    if let Some(blocks) = args.blocks {
        setup = setup.with_blocks(blocks);
    }
    if let Some(runs) = args.runs {
        setup = setup.with_runs(runs);
    }

    // Determine master seed
    let seed = if args.unseeded {
        0
    } else if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    // Configuration errors are fatal
    let mut runner = TrialRunner::new(&setup, seed).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    });
    if let Some(path) = &args.params {
        let params = load_params(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        });
        runner = runner.with_params(params);
    }
    if args.unseeded {
        runner = runner.with_unseeded(true);
    }

    if !args.json {
        info!("POKT Economic Simulator v0.1.0");
        info!("{}: {}", experiment.name(), experiment.description());
    }

    let results = runner.run();
    let failed: Vec<&TrialResult> = results.iter().filter(|r| !r.passed).collect();

    if let Some(path) = &args.export {
        let exports: Vec<TrialExport> = results.iter().map(|r| r.export.clone()).collect();
        match write_exports(&exports, path) {
            Ok(()) => info!("Exported {} runs to {}", exports.len(), path),
            Err(e) => error!("Failed to write export: {}", e),
        }
    }

    if args.json {
        // JSON output for CI parsing
        let summary = serde_json::json!({
            "experiment": experiment.name(),
            "seed": seed,
            "total": results.len(),
            "passed": results.len() - failed.len(),
            "failed": failed.len(),
            "results": results.iter().map(|r| {
                serde_json::json!({
                    "run": r.run,
                    "seed": r.seed,
                    "passed": r.passed,
                    "blocks": r.blocks,
                    "total_relays": r.metrics.total_relays,
                    "processed_relays": r.metrics.processed_relays,
                    "element_failures": r.metrics.element_failures,
                    "final_supply": r.metrics.final_supply,
                    "burned": r.metrics.burned,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to render summary: {}", e),
        }
    } else if failed.is_empty() {
        info!("All {} runs passed", results.len());
    } else {
        error!("{}/{} runs failed", failed.len(), results.len());
        for result in &failed {
            error!(
                "  - run={} seed={}: {}",
                result.run,
                result.seed,
                result.failure_reason.as_deref().unwrap_or("unknown")
            );
        }
    }

    // Exit with proper code for CI
    if !failed.is_empty() {
        std::process::exit(1);
    }
}
