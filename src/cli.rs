//! Command-line interface for the balance simulator.

use lexopt::prelude::*;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::batch::{SimConfig, StrategyAssignment};
use crate::rules::Ruleset;
use crate::strategies::StrategyKind;

pub const DEFAULT_GAMES: usize = 1000;

/// Command-line arguments for the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub command: Command,
    pub players: usize,
    /// One batch per entry.
    pub games: Vec<usize>,
    pub seed: u64,
    pub rules_file: Option<PathBuf>,
    pub ruleset: String,
    pub strategies: Vec<StrategyKind>,
    pub threads: Option<usize>,
    pub output: Option<PathBuf>,
    pub verbose: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run,
    Trace { game: u64 },
    Sweep { config: PathBuf },
    Rules,
    Help,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            command: Command::Run,
            players: 4,
            games: Vec::new(),
            seed: 42,
            rules_file: None,
            ruleset: "standard".to_string(),
            strategies: Vec::new(),
            threads: None,
            output: None,
            verbose: false,
            quiet: false,
        }
    }
}

impl CliArgs {
    pub fn batch_sizes(&self) -> Vec<usize> {
        if self.games.is_empty() {
            vec![DEFAULT_GAMES]
        } else {
            self.games.clone()
        }
    }

    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            players: self.players,
            seed: self.seed,
            strategies: if self.strategies.is_empty() {
                StrategyAssignment::Random
            } else {
                StrategyAssignment::Fixed {
                    strategies: self.strategies.clone(),
                }
            },
            threads: self.threads,
        }
    }

    /// `--rules FILE` wins over `--ruleset NAME`.
    pub fn load_rules(&self) -> Result<Ruleset, String> {
        if let Some(path) = &self.rules_file {
            return Ruleset::load_from_file(path);
        }
        Ruleset::by_name(&self.ruleset).ok_or_else(|| {
            format!(
                "Unknown ruleset '{}' (built-ins: {})",
                self.ruleset,
                Ruleset::builtin_names().join(", ")
            )
        })
    }

    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

pub fn parse_args() -> Result<CliArgs, lexopt::Error> {
    parse(lexopt::Parser::from_env())
}

pub fn parse_from<I>(args: I) -> Result<CliArgs, lexopt::Error>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    parse(lexopt::Parser::from_args(args))
}

fn parse(mut args: lexopt::Parser) -> Result<CliArgs, lexopt::Error> {
    let mut cli_args = CliArgs::default();
    let mut subcommand: Option<String> = None;
    let mut positional: Vec<String> = Vec::new();

    while let Some(arg) = args.next()? {
        match arg {
            Value(val) => {
                let val_str = val.string()?;
                if subcommand.is_none() {
                    subcommand = Some(val_str);
                } else {
                    positional.push(val_str);
                }
            }
            Long("players") | Short('p') => {
                cli_args.players = args.value()?.parse()?;
            }
            Long("games") | Short('n') => {
                cli_args.games.push(args.value()?.parse()?);
            }
            Long("seed") => {
                cli_args.seed = args.value()?.parse()?;
            }
            Long("rules") => {
                cli_args.rules_file = Some(PathBuf::from(args.value()?));
            }
            Long("ruleset") => {
                cli_args.ruleset = args.value()?.string()?;
            }
            Long("strategy") | Short('s') => {
                let name = args.value()?.string()?;
                let kind = StrategyKind::from_name(&name)
                    .ok_or_else(|| lexopt::Error::from(format!("Unknown strategy '{}'", name)))?;
                cli_args.strategies.push(kind);
            }
            Long("threads") => {
                let threads: usize = args.value()?.parse()?;
                if threads == 0 {
                    return Err("--threads must be at least 1".into());
                }
                cli_args.threads = Some(threads);
            }
            Long("output") | Short('o') => {
                cli_args.output = Some(PathBuf::from(args.value()?));
            }
            Long("verbose") | Short('v') => cli_args.verbose = true,
            Long("quiet") | Short('q') => cli_args.quiet = true,
            Long("help") | Short('h') => {
                cli_args.command = Command::Help;
                return Ok(cli_args);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    cli_args.command = match subcommand.as_deref() {
        Some("run") | None => Command::Run,
        Some("trace") => {
            let game = match positional.first() {
                Some(index) => index
                    .parse()
                    .map_err(|_| lexopt::Error::from(format!("Invalid match index '{}'", index)))?,
                None => 0,
            };
            Command::Trace { game }
        }
        Some("sweep") => match positional.first() {
            Some(config) => Command::Sweep {
                config: PathBuf::from(config),
            },
            None => return Err("sweep command requires a configuration file".into()),
        },
        Some("rules") => Command::Rules,
        Some("help") => Command::Help,
        Some(cmd) => return Err(format!("Unknown command: {}", cmd).into()),
    };

    Ok(cli_args)
}

pub fn print_help() {
    println!("\nTabletop Balance Simulator\n");
    println!("USAGE:");
    println!("    balance-sim [COMMAND] [OPTIONS]\n");

    println!("COMMANDS:");
    println!("    run              Run Monte-Carlo batches and print the balance report (default)");
    println!("    trace [INDEX]    Play one match of the batch and print its journal");
    println!("    sweep CONFIG     Run every regime of a YAML sweep file");
    println!("    rules            Print the selected ruleset as YAML\n");

    println!("SIMULATION OPTIONS:");
    println!("    -p, --players <N>          Participants per match (default: 4)");
    println!("    -n, --games <N>            Matches per batch; repeat for several batches");
    println!("                               (default: {})", DEFAULT_GAMES);
    println!("    --seed <N>                 Base seed; match i uses seed + i (default: 42)");
    println!("    --rules <FILE>             Load a ruleset from YAML or JSON");
    println!(
        "    --ruleset <NAME>           Use a built-in ruleset: {}",
        Ruleset::builtin_names().join(", ")
    );
    println!("    -s, --strategy <NAME>      Strategy per seat, cycled (repeatable)");
    println!("                               Available: aggressive, conservative, balanced,");
    println!("                               random, opportunistic. Random per seat if omitted");
    println!("    --threads <N>              Worker threads for batches\n");

    println!("OUTPUT OPTIONS:");
    println!("    -o, --output <FILE>        Write the report (or trace, or ruleset) to a file");
    println!("    -v, --verbose              Debug logging");
    println!("    -q, --quiet                Warnings only, no ruleset summary");
    println!("    -h, --help                 Print help information\n");

    println!("EXAMPLES:");
    println!("    # Compare batch sizes for five players");
    println!("    balance-sim run -p 5 -n 100 -n 1000 -n 10000\n");

    println!("    # Aggressive against conservative seats, reproducibly");
    println!("    balance-sim run -s aggressive -s conservative --seed 7\n");

    println!("    # Follow match 12 of the batch step by step");
    println!("    balance-sim trace 12 -p 3 --seed 7\n");

    println!("    # Start a new fixture from the standard rules");
    println!("    balance-sim rules --ruleset standard -o rulesets/mine.yaml");
}
