//! Consensus Simulator CLI
//!
//! Run a single configured simulation or the canned consensus scenarios.

use clap::Parser;
use consensus_env::TopologyKind;
use consensus_sim::scenarios::ScenarioId;
use consensus_sim::{ScenarioResult, ScenarioRunner, SimConfig, SimExport, SimulationRun};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Consensus dynamics simulator
#[derive(Parser, Debug)]
#[command(name = "consensus-sim")]
#[command(about = "Deterministic consensus dynamics on agent networks", long_about = None)]
struct Args {
    /// Master seed for determinism
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of consecutive seeds to run (scenario mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Scenario to run (full_mesh, frozen_ring, star_bias, ..., all)
    #[arg(short = 'S', long)]
    scenario: Option<String>,

    /// Number of agents
    #[arg(short, long)]
    agents: Option<usize>,

    /// Topology (complete, ring, star, small_world)
    #[arg(short, long)]
    topology: Option<String>,

    /// Small-world lattice degree k
    #[arg(long)]
    degree: Option<usize>,

    /// Small-world rewiring probability p
    #[arg(long)]
    rewire: Option<f64>,

    /// Strategy (deGroot, stubborn, susceptible, diff_adaptive, variance_adaptive)
    #[arg(long)]
    strategy: Option<String>,

    /// Strategy parameter as key=value (repeatable), e.g. --param alpha=0.3
    #[arg(short, long = "param", value_parser = parse_param)]
    params: Vec<(String, f64)>,

    /// Lower bound of the initial state range
    #[arg(long, allow_negative_numbers = true)]
    min: Option<f64>,

    /// Upper bound of the initial state range
    #[arg(long, allow_negative_numbers = true)]
    max: Option<f64>,

    /// Round budget per run
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Dispersion tolerance for convergence
    #[arg(long)]
    tolerance: Option<f64>,

    /// Standard deviation of communication noise
    #[arg(long)]
    noise: Option<f64>,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<String>,

    /// Export the run's full history to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for scripting
    #[arg(long)]
    json: bool,
}

fn parse_param(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for '{}': {}", key, e))?;
    Ok((key.trim().to_string(), value))
}

/// Layers CLI flags over the config file (or defaults).
fn build_config(args: &Args) -> Result<SimConfig, String> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read config {}: {}", path, e))?;
            SimConfig::from_json(&text).map_err(|e| format!("invalid config {}: {}", path, e))?
        }
        None => SimConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(agents) = args.agents {
        config.agent_count = agents;
    }
    if let Some(kind) = &args.topology {
        config.topology.kind = kind.parse::<TopologyKind>().map_err(|e| e.to_string())?;
    }
    if let Some(k) = args.degree {
        config.topology.neighbor_degree = k;
    }
    if let Some(p) = args.rewire {
        config.topology.rewire_probability = p;
    }
    if let Some(strategy) = &args.strategy {
        config.strategy.kind = strategy.clone();
        config.strategy.params.clear();
    }
    for (key, value) in &args.params {
        config.strategy.params.insert(key.clone(), *value);
    }
    if let Some(min) = args.min {
        config.initial_state_range.0 = min;
    }
    if let Some(max) = args.max {
        config.initial_state_range.1 = max;
    }
    if let Some(max_rounds) = args.max_rounds {
        config.max_rounds = max_rounds;
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    if let Some(noise) = args.noise {
        config.noise_std = noise;
    }

    Ok(config)
}

/// Runs one configured simulation. Returns false on configuration errors.
fn run_single(args: &Args) -> bool {
    let config = match build_config(args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return false;
        }
    };

    let mut run = match SimulationRun::new(config) {
        Ok(run) => run,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return false;
        }
    };

    let summary = match run.run() {
        Ok(summary) => summary,
        Err(e) => {
            error!("Run aborted: {}", e);
            return false;
        }
    };

    if let Some(path) = &args.export {
        let export = SimExport::from_run("custom", &run, Some(&summary));
        if let Err(e) = export.write_to_file(path) {
            error!("Failed to write export: {:?}", e);
        } else {
            info!("Exported {} rounds to {}", export.rounds(), path);
        }
    }

    if args.json {
        let output = serde_json::json!({
            "config": run.config(),
            "summary": summary,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to serialise summary: {}", e),
        }
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!("  Outcome:            {}", summary.outcome);
        info!("  Rounds executed:    {}", summary.rounds_executed);
        info!("  Final dispersion:   {:.6e}", summary.final_dispersion);
        info!("  Consensus value:    {:.6}", summary.consensus_value);
        info!("  Initial average:    {:.6}", summary.initial_average);
        info!("  Bias:               {:+.6}", summary.bias);
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    true
}

/// Runs scenarios over consecutive seeds. Returns the number of failures.
fn run_scenarios(args: &Args, selection: &str) -> Result<usize, String> {
    if args.export.is_some() {
        return Err("--export only supports a single configured run, not scenarios".to_string());
    }

    let scenarios: Vec<ScenarioId> = if selection == "all" {
        ScenarioId::all()
    } else {
        vec![selection.parse().map_err(|e| {
            let names: Vec<_> = ScenarioId::all().iter().map(|s| s.name()).collect();
            format!("{}\nAvailable scenarios: {}, all", e, names.join(", "))
        })?]
    };

    let base_seed = args.seed.unwrap_or(42);
    let mut all_results: Vec<ScenarioResult> = Vec::new();

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let mut runner = ScenarioRunner::new(seed);
        if let Some(max_rounds) = args.max_rounds {
            runner = runner.with_max_rounds(max_rounds);
        }

        for scenario in &scenarios {
            let result = runner.run(*scenario);

            if !args.json {
                if result.passed {
                    info!("✓ {} (seed={}) PASSED", scenario.name(), seed);
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            all_results.push(result);
        }
    }

    let total = all_results.len();
    let failed_count = all_results.iter().filter(|r| !r.passed).count();

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": total - failed_count,
            "failed": failed_count,
            "results": all_results,
        });
        let text = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
        println!("{}", text);
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        if failed_count == 0 {
            info!("All {} scenario runs passed", total);
        } else {
            error!("{}/{} scenario runs failed", failed_count, total);
            for result in all_results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    Ok(failed_count)
}

fn main() {
    let args = Args::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if !args.json {
        info!("Consensus Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let ok = match args.scenario.as_deref() {
        Some(selection) => match run_scenarios(&args, selection) {
            Ok(failed) => failed == 0,
            Err(e) => {
                error!("{}", e);
                false
            }
        },
        None => run_single(&args),
    };

    // Exit with proper code for CI
    if !ok {
        std::process::exit(1);
    }
}
