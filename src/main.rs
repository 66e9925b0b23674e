use log::{error, info};
use std::path::Path;
use std::process::ExitCode;

use balance_sim::batch::{BatchReport, ReportEnvelope, Simulator};
use balance_sim::cli::{self, CliArgs, Command};
use balance_sim::experiment::SweepConfig;

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run with --help for usage");
            return ExitCode::from(2);
        }
    };

    if args.command == Command::Help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level()))
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(1)
        }
    }
}

fn run(args: &CliArgs) -> Result<(), String> {
    match &args.command {
        Command::Run => run_batches(args),
        Command::Trace { game } => run_trace(args, *game),
        Command::Sweep { config } => run_sweep(args, config),
        Command::Rules => dump_rules(args),
        Command::Help => {
            cli::print_help();
            Ok(())
        }
    }
}

fn simulator(args: &CliArgs) -> Result<Simulator, String> {
    let rules = args.load_rules()?;
    Simulator::new(rules, args.sim_config()).map_err(|e| format!("Invalid configuration: {}", e))
}

fn run_batches(args: &CliArgs) -> Result<(), String> {
    let sim = simulator(args)?;
    let roles = sim
        .rules()
        .lineup(args.players)
        .map_err(|e| e.to_string())?
        .to_vec();

    if !args.quiet {
        print!("{}", sim.rules());
    }

    let mut envelopes = Vec::new();
    for games in args.batch_sizes() {
        let result = sim.run_batch(games).map_err(|e| e.to_string())?;
        let report = BatchReport::from_results(&result, &roles);
        println!("\n{}", report);
        envelopes.push(ReportEnvelope::new(sim.rules(), args.seed, report));
    }

    if let Some(path) = &args.output {
        match envelopes.as_slice() {
            [single] => single.save_to_file(path)?,
            all => {
                let json = serde_json::to_string_pretty(all)
                    .map_err(|e| format!("Failed to serialize reports: {}", e))?;
                std::fs::write(path, json)
                    .map_err(|e| format!("Failed to write reports {}: {}", path.display(), e))?;
            }
        }
        info!("Report written to {}", path.display());
    }
    Ok(())
}

fn run_trace(args: &CliArgs, game: u64) -> Result<(), String> {
    let sim = simulator(args)?;
    let (outcome, trace) = sim.trace_match(game).map_err(|e| e.to_string())?;

    print!("{}", trace);
    println!("\nMatch {} (seed {}), {} rounds:", game, outcome.seed, outcome.rounds_played);
    for r in &outcome.results {
        let marker = if outcome.winner == Some(r.id) { "*" } else { " " };
        println!(
            " {} P{} {:<9} {:<14} score {:>3}  path {:<5}  {}",
            marker,
            r.id,
            r.role.name(),
            r.strategy.name(),
            r.score,
            r.tier,
            r.resources
        );
    }

    if let Some(path) = &args.output {
        trace.save_to_file(path)?;
        info!("Trace written to {}", path.display());
    }
    Ok(())
}

fn run_sweep(args: &CliArgs, config: &Path) -> Result<(), String> {
    let sweep = SweepConfig::load_from_file(config)?;
    let base_dir = config.parent().unwrap_or_else(|| Path::new("."));
    let rules = sweep.resolve_rules(base_dir)?;

    println!("Sweep: {}", sweep.name);
    if !sweep.description.is_empty() {
        println!("{}", sweep.description);
    }

    let results = sweep.run(&rules);
    for result in &results {
        println!("\n=== {} ({} ms) ===", result.name, result.duration_ms);
        match (&result.report, &result.error) {
            (Some(report), _) => println!("{}", report),
            (None, Some(e)) => println!("Failed: {}", e),
            (None, None) => println!("No report"),
        }
    }

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&results)
            .map_err(|e| format!("Failed to serialize sweep results: {}", e))?;
        std::fs::write(path, json)
            .map_err(|e| format!("Failed to write sweep results {}: {}", path.display(), e))?;
        info!("Sweep results written to {}", path.display());
    }

    let failed = results.iter().filter(|r| !r.success).count();
    if failed > 0 {
        return Err(format!("{} of {} regimes failed", failed, results.len()));
    }
    Ok(())
}

fn dump_rules(args: &CliArgs) -> Result<(), String> {
    let rules = args.load_rules()?;
    match &args.output {
        Some(path) => {
            rules.save_to_file(path)?;
            info!("Ruleset {} written to {}", rules.name, path.display());
        }
        None => print!("{}", rules.to_yaml()?),
    }
    Ok(())
}
