//! Monte-Carlo batches and the statistics computed over them.

use chrono::{DateTime, Utc};
use log::{info, warn};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Instant;

use crate::core::ScoreLedger;
use crate::engine::{Match, MatchOutcome, Seat};
use crate::path::PathTier;
use crate::rules::{Metric, Role, RuleError, Ruleset};
use crate::strategies::StrategyKind;
use crate::trace::MatchTrace;

/// How strategies are handed out to seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyAssignment {
    /// Every seat draws a strategy uniformly at random each match.
    Random,
    /// Seat `i` plays `strategies[i % len]`.
    Fixed { strategies: Vec<StrategyKind> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub players: usize,
    pub seed: u64,
    pub strategies: StrategyAssignment,
    /// Worker threads for the batch; rayon's global pool when absent.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            players: 4,
            seed: 42,
            strategies: StrategyAssignment::Random,
            threads: None,
        }
    }
}

/// Append-only record of finished matches.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    players: usize,
    outcomes: Vec<MatchOutcome>,
}

impl BatchResult {
    pub fn new(players: usize) -> Self {
        Self {
            players,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: MatchOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn players(&self) -> usize {
        self.players
    }

    pub fn outcomes(&self) -> &[MatchOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

pub struct Simulator {
    rules: Ruleset,
    config: SimConfig,
}

impl Simulator {
    /// Validates everything up front so no match can fail later.
    pub fn new(rules: Ruleset, config: SimConfig) -> Result<Self, RuleError> {
        rules.validate_for(config.players)?;
        if let StrategyAssignment::Fixed { strategies } = &config.strategies {
            if strategies.is_empty() {
                return Err(RuleError::EmptyStrategyRoster);
            }
        }
        warn_unreachable_paths(&rules, config.players);
        Ok(Self { rules, config })
    }

    pub fn rules(&self) -> &Ruleset {
        &self.rules
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Roles from the lineup in shuffled seat order, strategies per the
    /// configured assignment.
    fn seats(&self, rng: &mut ChaCha8Rng) -> Result<Vec<Seat>, RuleError> {
        let mut roles = self.rules.lineup(self.config.players)?.to_vec();
        roles.shuffle(rng);
        let seats = roles
            .into_iter()
            .enumerate()
            .map(|(i, role)| {
                let strategy = match &self.config.strategies {
                    StrategyAssignment::Random => {
                        StrategyKind::ALL[rng.random_range(0..StrategyKind::ALL.len())]
                    }
                    StrategyAssignment::Fixed { strategies } => strategies[i % strategies.len()],
                };
                Seat { role, strategy }
            })
            .collect();
        Ok(seats)
    }

    fn prepare(&self, index: u64) -> Result<Match<'_>, RuleError> {
        let seed = self.config.seed.wrapping_add(index);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let seats = self.seats(&mut rng)?;
        Match::with_rng(&self.rules, &seats, seed, rng)
    }

    /// Plays match number `index` of the batch.
    pub fn run_match(&self, index: u64) -> Result<MatchOutcome, RuleError> {
        Ok(self.prepare(index)?.play())
    }

    pub fn trace_match(&self, index: u64) -> Result<(MatchOutcome, MatchTrace), RuleError> {
        Ok(self.prepare(index)?.play_traced())
    }

    /// Runs `games` independent matches. Results come back in index order,
    /// whatever the thread count.
    pub fn run_batch(&self, games: usize) -> Result<BatchResult, RuleError> {
        info!(
            "Running {} matches of {} with {} players (seed {})",
            games, self.rules.name, self.config.players, self.config.seed
        );
        let start = Instant::now();

        let play_all = || -> Result<Vec<MatchOutcome>, RuleError> {
            (0..games)
                .into_par_iter()
                .map(|i| self.run_match(i as u64))
                .collect()
        };

        let outcomes = match self.config.threads {
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(play_all)?,
                Err(e) => {
                    warn!(
                        "Could not build a {}-thread pool ({}), using the global pool",
                        threads, e
                    );
                    play_all()?
                }
            },
            None => play_all()?,
        };

        let mut result = BatchResult::new(self.config.players);
        for outcome in outcomes {
            result.push(outcome);
        }
        info!("Finished {} matches in {:.2?}", result.len(), start.elapsed());
        Ok(result)
    }
}

/// Distinct-participant thresholds that exceed the number of other seats
/// can never be met.
/// Full-path distinct thresholds that ask for more participants than the
/// others seated at `players`, as `(role, tally, at_least)`.
pub fn unreachable_paths(rules: &Ruleset, players: usize) -> Vec<(Role, String, u32)> {
    let Ok(lineup) = rules.lineup(players) else {
        return Vec::new();
    };
    let others = players.saturating_sub(1);
    let mut found = Vec::new();
    for def in rules.roles.iter().filter(|d| lineup.contains(&d.role)) {
        for t in &def.path.full {
            if let Metric::Distinct { name } = &t.metric {
                if t.at_least as usize > others {
                    found.push((def.role, name.clone(), t.at_least));
                }
            }
        }
    }
    found
}

fn warn_unreachable_paths(rules: &Ruleset, players: usize) {
    let others = players.saturating_sub(1);
    for (role, name, at_least) in unreachable_paths(rules, players) {
        warn!(
            "Full path of {} needs {} distinct {} but only {} other participants play",
            role, at_least, name, others
        );
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / whole as f64
}

pub fn gini_coefficient(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len() as f64;
    let total: f64 = sorted.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64 + 1.0) * v)
        .sum();
    2.0 * weighted / (n * total) - (n + 1.0) / n
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreStats {
    pub mean: f64,
    pub stdev: f64,
    pub min: u32,
    pub max: u32,
}

impl ScoreStats {
    fn from_scores(scores: &[u32]) -> Self {
        let values: Vec<f64> = scores.iter().map(|&s| f64::from(s)).collect();
        Self {
            mean: mean(&values),
            stdev: std_dev(&values),
            min: scores.iter().copied().min().unwrap_or(0),
            max: scores.iter().copied().max().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathRates {
    pub full: usize,
    pub small: usize,
    pub none: usize,
    pub full_rate: f64,
    pub small_rate: f64,
    pub none_rate: f64,
}

impl PathRates {
    fn from_tiers(tiers: &[PathTier]) -> Self {
        let count = |tier| tiers.iter().filter(|&&t| t == tier).count();
        let full = count(PathTier::Full);
        let small = count(PathTier::Small);
        let none = count(PathTier::None);
        Self {
            full,
            small,
            none,
            full_rate: percent(full, tiers.len()),
            small_rate: percent(small, tiers.len()),
            none_rate: percent(none, tiers.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleStats {
    pub role: Role,
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub score: ScoreStats,
    pub paths: PathRates,
    pub mean_ledger: ScoreLedger,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyStats {
    pub strategy: StrategyKind,
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub players: usize,
    pub games: usize,
    pub roles: Vec<RoleStats>,
    pub strategies: Vec<StrategyStats>,
    /// Mean absolute distance of role win rates from `100 / players`.
    pub balance_score: f64,
    pub mean_gini: f64,
    pub mean_rounds: f64,
}

impl BatchReport {
    /// `roles` fixes the row order; roles that never played still get a row.
    pub fn from_results(result: &BatchResult, roles: &[Role]) -> Self {
        let games = result.len();
        let mut ordered: Vec<Role> = Vec::new();
        for &role in roles {
            if !ordered.contains(&role) {
                ordered.push(role);
            }
        }

        let role_stats: Vec<RoleStats> = ordered
            .iter()
            .map(|&role| {
                let mut scores = Vec::new();
                let mut tiers = Vec::new();
                let mut ledger = ScoreLedger::default();
                let mut wins = 0;
                for outcome in result.outcomes() {
                    for r in outcome.results.iter().filter(|r| r.role == role) {
                        scores.push(r.score);
                        tiers.push(r.tier);
                        ledger.merge(&r.ledger);
                        if outcome.winner == Some(r.id) {
                            wins += 1;
                        }
                    }
                }
                RoleStats {
                    role,
                    games: scores.len(),
                    wins,
                    win_rate: percent(wins, scores.len()),
                    score: ScoreStats::from_scores(&scores),
                    paths: PathRates::from_tiers(&tiers),
                    mean_ledger: ledger.divided_by(scores.len()),
                }
            })
            .collect();

        let strategies = StrategyKind::ALL
            .iter()
            .filter_map(|&strategy| {
                let mut played = 0;
                let mut wins = 0;
                for outcome in result.outcomes() {
                    for r in outcome.results.iter().filter(|r| r.strategy == strategy) {
                        played += 1;
                        if outcome.winner == Some(r.id) {
                            wins += 1;
                        }
                    }
                }
                (played > 0).then(|| StrategyStats {
                    strategy,
                    games: played,
                    wins,
                    win_rate: percent(wins, played),
                })
            })
            .collect();

        let players = result.players();
        let balance_score = if games == 0 || players == 0 || role_stats.is_empty() {
            0.0
        } else {
            let target = 100.0 / players as f64;
            mean(
                &role_stats
                    .iter()
                    .map(|r| (r.win_rate - target).abs())
                    .collect::<Vec<_>>(),
            )
        };

        let ginis: Vec<f64> = result
            .outcomes()
            .iter()
            .map(|o| {
                let scores: Vec<f64> = o.results.iter().map(|r| f64::from(r.score)).collect();
                gini_coefficient(&scores)
            })
            .collect();
        let rounds: Vec<f64> = result
            .outcomes()
            .iter()
            .map(|o| f64::from(o.rounds_played))
            .collect();

        Self {
            players,
            games,
            roles: role_stats,
            strategies,
            balance_score,
            mean_gini: mean(&ginis),
            mean_rounds: mean(&rounds),
        }
    }

    pub fn role(&self, role: Role) -> Option<&RoleStats> {
        self.roles.iter().find(|r| r.role == role)
    }

    pub fn strategy(&self, strategy: StrategyKind) -> Option<&StrategyStats> {
        self.strategies.iter().find(|s| s.strategy == strategy)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Balance Report ({} players, {} games):", self.players, self.games)?;
        writeln!(f, "  Balance score: {:.2}", self.balance_score)?;
        writeln!(f, "  Mean score inequality (Gini): {:.3}", self.mean_gini)?;
        writeln!(f, "  Mean rounds played: {:.2}", self.mean_rounds)?;

        writeln!(f, "\nRoles:")?;
        writeln!(
            f,
            "  {:<10} {:>6} {:>6} {:>7} {:>7} {:>6} {:>4} {:>4} {:>6} {:>6} {:>6}",
            "role", "games", "wins", "win%", "mean", "sd", "min", "max", "full%", "small%", "none%"
        )?;
        for r in &self.roles {
            writeln!(
                f,
                concat!(
                    "  {:<10} {:>6} {:>6} {:>6.1}% {:>7.2} {:>6.2} {:>4} {:>4}",
                    " {:>5.1}% {:>5.1}% {:>5.1}%"
                ),
                r.role.name(),
                r.games,
                r.wins,
                r.win_rate,
                r.score.mean,
                r.score.stdev,
                r.score.min,
                r.score.max,
                r.paths.full_rate,
                r.paths.small_rate,
                r.paths.none_rate
            )?;
        }

        writeln!(f, "\nScore sources (mean per participant):")?;
        for r in &self.roles {
            writeln!(
                f,
                "  {:<10} mechanism {:>6.2}  event {:>6.2}  interaction {:>6.2}  path {:>6.2}",
                r.role.name(),
                r.mean_ledger.mechanism,
                r.mean_ledger.event,
                r.mean_ledger.interaction,
                r.mean_ledger.path_bonus
            )?;
        }

        if !self.strategies.is_empty() {
            writeln!(f, "\nStrategies:")?;
            for s in &self.strategies {
                writeln!(
                    f,
                    "  {:<14} {:>6} games {:>6} wins {:>6.1}%",
                    s.strategy.name(),
                    s.games,
                    s.wins,
                    s.win_rate
                )?;
            }
        }
        Ok(())
    }
}

/// What gets written to disk: the report plus when and how it was produced.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEnvelope {
    pub generated_at: DateTime<Utc>,
    pub ruleset: String,
    pub version: u32,
    pub seed: u64,
    pub report: BatchReport,
}

impl ReportEnvelope {
    pub fn new(rules: &Ruleset, seed: u64, report: BatchReport) -> Self {
        Self {
            generated_at: Utc::now(),
            ruleset: rules.name.clone(),
            version: rules.version,
            seed,
            report,
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize report: {}", e))?;
        std::fs::write(path, json)
            .map_err(|e| format!("Failed to write report {}: {}", path.display(), e))
    }
}
