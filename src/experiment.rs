//! Sweep files: several batches over one ruleset, each with its own
//! participant count, size and roster.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::batch::{BatchReport, SimConfig, Simulator, StrategyAssignment};
use crate::rules::Ruleset;
use crate::strategies::StrategyKind;

/// Configuration for a sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Built-in ruleset name; ignored when `rules_file` is set.
    #[serde(default)]
    pub ruleset: Option<String>,
    /// Relative paths resolve against the sweep file's directory.
    #[serde(default)]
    pub rules_file: Option<PathBuf>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Worker threads per batch.
    #[serde(default)]
    pub parallel: Option<usize>,
    pub regimes: Vec<Regime>,
}

fn default_seed() -> u64 {
    42
}

/// One batch of the sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Regime {
    #[serde(default)]
    pub name: Option<String>,
    pub players: usize,
    pub games: usize,
    /// Cycled by seat; random per seat when empty.
    #[serde(default)]
    pub strategies: Vec<StrategyKind>,
    /// Overrides the sweep seed.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Regime {
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}p x {}", self.players, self.games))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegimeResult {
    pub name: String,
    pub players: usize,
    pub games: usize,
    pub success: bool,
    pub error: Option<String>,
    pub report: Option<BatchReport>,
    pub duration_ms: u64,
}

impl SweepConfig {
    /// Load sweep configuration from YAML file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read sweep file: {}", e))?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, String> {
        serde_yaml::from_str(contents).map_err(|e| format!("Failed to parse YAML: {}", e))
    }

    pub fn resolve_rules(&self, base_dir: &Path) -> Result<Ruleset, String> {
        if let Some(file) = &self.rules_file {
            let path = if file.is_absolute() {
                file.clone()
            } else {
                base_dir.join(file)
            };
            return Ruleset::load_from_file(&path);
        }
        let name = self.ruleset.as_deref().unwrap_or("standard");
        Ruleset::by_name(name).ok_or_else(|| {
            format!(
                "Unknown ruleset '{}' (built-ins: {})",
                name,
                Ruleset::builtin_names().join(", ")
            )
        })
    }

    /// Runs every regime in order. A regime that fails validation is reported
    /// and the sweep moves on.
    pub fn run(&self, rules: &Ruleset) -> Vec<RegimeResult> {
        info!("Sweep {}: {} regimes", self.name, self.regimes.len());
        self.regimes
            .iter()
            .map(|regime| self.run_regime(rules, regime))
            .collect()
    }

    fn run_regime(&self, rules: &Ruleset, regime: &Regime) -> RegimeResult {
        let start = Instant::now();
        let strategies = if regime.strategies.is_empty() {
            StrategyAssignment::Random
        } else {
            StrategyAssignment::Fixed {
                strategies: regime.strategies.clone(),
            }
        };
        let config = SimConfig {
            players: regime.players,
            seed: regime.seed.unwrap_or(self.seed),
            strategies,
            threads: self.parallel,
        };

        let report = Simulator::new(rules.clone(), config).and_then(|sim| {
            let result = sim.run_batch(regime.games)?;
            let roles = sim.rules().lineup(regime.players)?;
            Ok(BatchReport::from_results(&result, roles))
        });

        let duration_ms = start.elapsed().as_millis() as u64;
        match report {
            Ok(report) => RegimeResult {
                name: regime.label(),
                players: regime.players,
                games: regime.games,
                success: true,
                error: None,
                report: Some(report),
                duration_ms,
            },
            Err(e) => {
                warn!("Regime {} failed: {}", regime.label(), e);
                RegimeResult {
                    name: regime.label(),
                    players: regime.players,
                    games: regime.games,
                    success: false,
                    error: Some(e.to_string()),
                    report: None,
                    duration_ms,
                }
            }
        }
    }
}
