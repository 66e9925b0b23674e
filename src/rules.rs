//! Rulesets: the immutable configuration every match is played under.
//!
//! A [`Ruleset`] is plain data. Role names, action costs, event cards and path
//! thresholds all live here so that rule variants are fixtures, not code.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::path::Path;

use crate::core::{Participant, ResourceDelta, Resources};
use crate::strategies::StrategyKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Merchant,
    Scholar,
    Priest,
    Noble,
    Farmer,
    Artisan,
    Soldier,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Merchant,
        Role::Scholar,
        Role::Priest,
        Role::Noble,
        Role::Farmer,
        Role::Artisan,
        Role::Soldier,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Role::Merchant => "merchant",
            Role::Scholar => "scholar",
            Role::Priest => "priest",
            Role::Noble => "noble",
            Role::Farmer => "farmer",
            Role::Artisan => "artisan",
            Role::Soldier => "soldier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Index into [`Ruleset::actions`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(pub usize);

/// What a path threshold measures on a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum Metric {
    Currency,
    Merit,
    Influence,
    Territory,
    Counter { name: String },
    Distinct { name: String },
}

impl Metric {
    pub fn measure(&self, participant: &Participant) -> u32 {
        match self {
            Metric::Currency => participant.resources.currency,
            Metric::Merit => participant.resources.merit,
            Metric::Influence => participant.resources.influence,
            Metric::Territory => participant.resources.territory,
            Metric::Counter { name } => participant.counter(name),
            Metric::Distinct { name } => {
                u32::try_from(participant.tally_len(name)).unwrap_or(u32::MAX)
            }
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Currency => write!(f, "currency"),
            Metric::Merit => write!(f, "merit"),
            Metric::Influence => write!(f, "influence"),
            Metric::Territory => write!(f, "territory"),
            Metric::Counter { name } => write!(f, "{}", name),
            Metric::Distinct { name } => write!(f, "distinct {}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threshold {
    #[serde(flatten)]
    pub metric: Metric,
    pub at_least: u32,
}

impl Threshold {
    pub fn new(metric: Metric, at_least: u32) -> Self {
        Self { metric, at_least }
    }

    pub fn counter(name: &str, at_least: u32) -> Self {
        Self::new(
            Metric::Counter {
                name: name.to_string(),
            },
            at_least,
        )
    }

    pub fn distinct(name: &str, at_least: u32) -> Self {
        Self::new(
            Metric::Distinct {
                name: name.to_string(),
            },
            at_least,
        )
    }

    pub fn met_by(&self, participant: &Participant) -> bool {
        self.metric.measure(participant) >= self.at_least
    }
}

/// True when every threshold of `small` is matched in `full` by a threshold
/// on the same metric that is at least as high.
pub fn at_least_as_strict(full: &[Threshold], small: &[Threshold]) -> bool {
    small.iter().all(|s| {
        full.iter()
            .any(|f| f.metric == s.metric && f.at_least >= s.at_least)
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathDef {
    pub small: Vec<Threshold>,
    pub full: Vec<Threshold>,
    pub small_bonus: u32,
    pub full_bonus: u32,
}

/// A role's path with rewards scaled for one participant count.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledPath {
    pub title: String,
    pub small: Vec<Threshold>,
    pub full: Vec<Threshold>,
    pub small_bonus: u32,
    pub full_bonus: u32,
    pub multiplier: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Production {
    pub base: Resources,
    pub per_territory: Resources,
}

impl Production {
    /// Passive yield for one round given current territory holdings.
    pub fn yield_for(&self, territory: u32) -> Resources {
        self.base.plus(&self.per_territory.scaled_by(territory))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleDef {
    pub role: Role,
    pub title: String,
    pub bonus: Resources,
    #[serde(default)]
    pub production: Production,
    /// Added to the ruleset's base action points every round.
    #[serde(default)]
    pub action_points: i32,
    pub path: PathDef,
    /// Preference per action name, read by path-seeking strategies.
    #[serde(default)]
    pub weights: BTreeMap<String, u32>,
}

impl RoleDef {
    pub fn weight(&self, action: &str) -> u32 {
        self.weights.get(action).copied().unwrap_or(0)
    }
}

/// Resources handed to another participant when an action is taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gift {
    pub amount: Resources,
    /// Tally on the giver that records each distinct recipient.
    #[serde(default)]
    pub tally: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    pub name: String,
    #[serde(default)]
    pub cost: Resources,
    #[serde(default)]
    pub gain: Resources,
    /// Progress counters incremented by one each time the action is taken.
    #[serde(default)]
    pub counters: Vec<String>,
    #[serde(default)]
    pub gift: Option<Gift>,
    #[serde(default)]
    pub capstone: bool,
    #[serde(default)]
    pub requires_small_path: bool,
}

impl ActionDef {
    /// Score value gained minus score value spent at the given effective cost.
    pub fn payoff(&self, cost: &Resources) -> f64 {
        self.gain.score_value() - cost.score_value()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTarget {
    #[default]
    Everyone,
    LowestMerit,
    LowestCurrency,
    HighestInfluence,
    MostTerritory,
}

/// Currency added to (or, when negative, removed from) action costs for the
/// round the card is drawn in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surcharge {
    /// Limits the surcharge to one action; all actions when absent.
    #[serde(default)]
    pub action: Option<String>,
    pub currency: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub name: String,
    pub copies: u32,
    #[serde(default)]
    pub target: EventTarget,
    #[serde(default)]
    pub accept: ResourceDelta,
    #[serde(default)]
    pub decline: ResourceDelta,
    #[serde(default)]
    pub surcharge: Option<Surcharge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Upkeep {
    /// Charged on rounds divisible by this; never when zero.
    pub every: u32,
    pub currency: u32,
    pub currency_per_territory: u32,
}

impl Upkeep {
    pub fn due(&self, round: u32) -> bool {
        self.every > 0 && round % self.every == 0
    }

    pub fn charge(&self, territory: u32) -> u32 {
        self.currency
            .saturating_add(self.currency_per_territory.saturating_mul(territory))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lineup {
    pub players: usize,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyActionPoints {
    pub strategy: StrategyKind,
    pub action_points: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    pub name: String,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub description: String,
    pub rounds: u32,
    pub base_action_points: u32,
    /// End the match right after the action phase in which any participant
    /// satisfies its full path.
    #[serde(default)]
    pub early_victory: bool,
    /// Currency the conservative strategy refuses to spend below.
    #[serde(default)]
    pub conservative_margin: u32,
    pub lineups: Vec<Lineup>,
    pub roles: Vec<RoleDef>,
    pub actions: Vec<ActionDef>,
    #[serde(default)]
    pub events: Vec<EventDef>,
    #[serde(default)]
    pub upkeep: Upkeep,
    #[serde(default)]
    pub strategy_action_points: Vec<StrategyActionPoints>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    NoRounds,
    NoLineups,
    UnsupportedPlayerCount { players: usize, supported: Vec<usize> },
    LineupSize { players: usize, roles: usize },
    MissingRole { players: usize, role: Role },
    DuplicateRole(Role),
    DuplicateAction(String),
    UnknownAction { context: String, action: String },
    PathNotMonotonic(Role),
    EmptyStrategyRoster,
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::NoRounds => write!(f, "Ruleset must play at least one round"),
            RuleError::NoLineups => write!(f, "Ruleset must define at least one lineup"),
            RuleError::UnsupportedPlayerCount { players, supported } => write!(
                f,
                "Unsupported participant count {} (supported: {:?})",
                players, supported
            ),
            RuleError::LineupSize { players, roles } => write!(
                f,
                "Lineup for {} players lists {} roles",
                players, roles
            ),
            RuleError::MissingRole { players, role } => write!(
                f,
                "Lineup for {} players uses role {} which has no entry",
                players, role
            ),
            RuleError::DuplicateRole(role) => write!(f, "Role {} is defined twice", role),
            RuleError::DuplicateAction(name) => write!(f, "Action {} is defined twice", name),
            RuleError::UnknownAction { context, action } => {
                write!(f, "{} refers to unknown action {}", context, action)
            }
            RuleError::PathNotMonotonic(role) => write!(
                f,
                "Full path of {} is not at least as strict as its small path",
                role
            ),
            RuleError::EmptyStrategyRoster => write!(f, "Strategy roster is empty"),
        }
    }
}

impl Error for RuleError {}

impl Ruleset {
    /// Participant counts with a lineup, ascending.
    pub fn supported_counts(&self) -> Vec<usize> {
        let mut counts: Vec<usize> = self.lineups.iter().map(|l| l.players).collect();
        counts.sort_unstable();
        counts.dedup();
        counts
    }

    pub fn lineup(&self, players: usize) -> Result<&[Role], RuleError> {
        self.lineups
            .iter()
            .find(|l| l.players == players)
            .map(|l| l.roles.as_slice())
            .ok_or_else(|| RuleError::UnsupportedPlayerCount {
                players,
                supported: self.supported_counts(),
            })
    }

    pub fn role(&self, role: Role) -> Option<&RoleDef> {
        self.roles.iter().find(|r| r.role == role)
    }

    pub fn action(&self, id: ActionId) -> &ActionDef {
        &self.actions[id.0]
    }

    pub fn action_id(&self, name: &str) -> Option<ActionId> {
        self.actions
            .iter()
            .position(|a| a.name == name)
            .map(ActionId)
    }

    /// 1.2 at the smallest supported count, 0.9 at the largest, 1.0 otherwise.
    pub fn bonus_multiplier(&self, players: usize) -> Decimal {
        let counts = self.supported_counts();
        match (counts.first(), counts.last()) {
            (Some(&min), Some(&max)) if min != max && players == min => dec!(1.2),
            (Some(&min), Some(&max)) if min != max && players == max => dec!(0.9),
            _ => Decimal::ONE,
        }
    }

    pub fn path_for(&self, role: Role, players: usize) -> Result<ScaledPath, RuleError> {
        let def = self
            .role(role)
            .ok_or(RuleError::MissingRole { players, role })?;
        let multiplier = self.bonus_multiplier(players);
        Ok(ScaledPath {
            title: def.title.clone(),
            small: def.path.small.clone(),
            full: def.path.full.clone(),
            small_bonus: scale_bonus(def.path.small_bonus, multiplier),
            full_bonus: scale_bonus(def.path.full_bonus, multiplier),
            multiplier,
        })
    }

    pub fn strategy_bonus(&self, strategy: StrategyKind) -> i32 {
        self.strategy_action_points
            .iter()
            .filter(|s| s.strategy == strategy)
            .map(|s| s.action_points)
            .sum()
    }

    /// Per-round budget: base plus role and strategy modifiers, never negative.
    pub fn action_points_for(&self, role: Role, strategy: StrategyKind) -> u32 {
        let role_bonus = self.role(role).map_or(0, |r| r.action_points);
        let total = i64::from(self.base_action_points)
            + i64::from(role_bonus)
            + i64::from(self.strategy_bonus(strategy));
        u32::try_from(total.max(0)).unwrap_or(u32::MAX)
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        if self.rounds == 0 {
            return Err(RuleError::NoRounds);
        }
        if self.lineups.is_empty() {
            return Err(RuleError::NoLineups);
        }

        for (i, def) in self.roles.iter().enumerate() {
            if self.roles[..i].iter().any(|r| r.role == def.role) {
                return Err(RuleError::DuplicateRole(def.role));
            }
            if !at_least_as_strict(&def.path.full, &def.path.small) {
                return Err(RuleError::PathNotMonotonic(def.role));
            }
        }

        for lineup in &self.lineups {
            if lineup.roles.len() != lineup.players {
                return Err(RuleError::LineupSize {
                    players: lineup.players,
                    roles: lineup.roles.len(),
                });
            }
            if let Some(&role) = lineup.roles.iter().find(|&&r| self.role(r).is_none()) {
                return Err(RuleError::MissingRole {
                    players: lineup.players,
                    role,
                });
            }
        }

        for (i, action) in self.actions.iter().enumerate() {
            if self.actions[..i].iter().any(|a| a.name == action.name) {
                return Err(RuleError::DuplicateAction(action.name.clone()));
            }
        }

        for def in &self.roles {
            if let Some(name) = def.weights.keys().find(|n| self.action_id(n).is_none()) {
                return Err(RuleError::UnknownAction {
                    context: format!("Weights of {}", def.role),
                    action: name.clone(),
                });
            }
        }

        for event in &self.events {
            if let Some(Surcharge {
                action: Some(name), ..
            }) = &event.surcharge
            {
                if self.action_id(name).is_none() {
                    return Err(RuleError::UnknownAction {
                        context: format!("Event {}", event.name),
                        action: name.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Validates the ruleset and that it can seat `players` participants.
    pub fn validate_for(&self, players: usize) -> Result<(), RuleError> {
        self.validate()?;
        self.lineup(players)?;
        Ok(())
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, String> {
        serde_yaml::from_str(contents).map_err(|e| format!("Failed to parse YAML: {}", e))
    }

    pub fn from_json_str(contents: &str) -> Result<Self, String> {
        serde_json::from_str(contents).map_err(|e| format!("Failed to parse JSON: {}", e))
    }

    pub fn to_yaml(&self) -> Result<String, String> {
        serde_yaml::to_string(self).map_err(|e| format!("Failed to serialize ruleset: {}", e))
    }

    /// Loads a YAML (`.yaml`/`.yml`) or JSON ruleset and validates it.
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read ruleset {}: {}", path.display(), e))?;
        let ruleset = if is_yaml(path) {
            Self::from_yaml_str(&contents)?
        } else {
            Self::from_json_str(&contents)?
        };
        ruleset
            .validate()
            .map_err(|e| format!("Invalid ruleset {}: {}", path.display(), e))?;
        Ok(ruleset)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        let contents = if is_yaml(path) {
            self.to_yaml()?
        } else {
            serde_json::to_string_pretty(self)
                .map_err(|e| format!("Failed to serialize ruleset: {}", e))?
        };
        std::fs::write(path, contents)
            .map_err(|e| format!("Failed to write ruleset {}: {}", path.display(), e))
    }

    pub fn builtin_names() -> &'static [&'static str] {
        &["standard", "blitz"]
    }

    pub fn by_name(name: &str) -> Option<Ruleset> {
        match name.to_lowercase().as_str() {
            "standard" => Some(Self::standard()),
            "blitz" => Some(Self::blitz()),
            _ => None,
        }
    }

    /// Seven roles, three to seven participants, eight rounds.
    pub fn standard() -> Ruleset {
        Ruleset {
            name: "standard".to_string(),
            version: 1,
            description: "Seven guild roles competing over eight seasons".to_string(),
            rounds: 8,
            base_action_points: 2,
            early_victory: false,
            conservative_margin: 4,
            lineups: standard_lineups(),
            roles: standard_roles(),
            actions: standard_actions(),
            events: standard_events(),
            upkeep: Upkeep {
                every: 2,
                currency: 0,
                currency_per_territory: 1,
            },
            strategy_action_points: Vec::new(),
        }
    }

    /// Short six-round variant with an extra action point and early victory.
    pub fn blitz() -> Ruleset {
        let mut ruleset = Self::standard();
        ruleset.name = "blitz".to_string();
        ruleset.description = "Six hurried seasons; the first full path ends the game".to_string();
        ruleset.rounds = 6;
        ruleset.base_action_points = 3;
        ruleset.early_victory = true;
        ruleset.upkeep = Upkeep {
            every: 2,
            currency: 1,
            currency_per_territory: 1,
        };
        ruleset
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn scale_bonus(bonus: u32, multiplier: Decimal) -> u32 {
    (Decimal::from(bonus) * multiplier)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(bonus)
}

fn standard_lineups() -> Vec<Lineup> {
    (3..=Role::ALL.len())
        .map(|players| Lineup {
            players,
            roles: Role::ALL[..players].to_vec(),
        })
        .collect()
}

fn weights(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
    pairs
        .iter()
        .map(|&(name, w)| (name.to_string(), w))
        .collect()
}

fn role_def(
    role: Role,
    title: &str,
    bonus: Resources,
    production: Production,
    path: PathDef,
    prefs: &[(&str, u32)],
) -> RoleDef {
    RoleDef {
        role,
        title: title.to_string(),
        bonus,
        production,
        action_points: 0,
        path,
        weights: weights(prefs),
    }
}

fn flat_income(currency: u32) -> Production {
    Production {
        base: Resources::new(currency, 0, 0, 0),
        per_territory: Resources::default(),
    }
}

fn standard_roles() -> Vec<RoleDef> {
    vec![
        role_def(
            Role::Merchant,
            "Merchant Prince",
            Resources::new(8, 0, 1, 0),
            Production {
                base: Resources::new(3, 0, 0, 0),
                per_territory: Resources::new(1, 0, 0, 0),
            },
            PathDef {
                small: vec![Threshold::counter("trades", 3)],
                full: vec![
                    Threshold::counter("trades", 6),
                    Threshold::new(Metric::Currency, 15),
                ],
                small_bonus: 6,
                full_bonus: 14,
            },
            &[("trade", 5), ("work", 3), ("claim_land", 1)],
        ),
        role_def(
            Role::Scholar,
            "Grand Sage",
            Resources::new(4, 2, 0, 0),
            Production {
                base: Resources::new(2, 0, 0, 0),
                per_territory: Resources::new(1, 0, 0, 0),
            },
            PathDef {
                small: vec![Threshold::counter("studies", 3)],
                full: vec![
                    Threshold::counter("studies", 6),
                    Threshold::new(Metric::Merit, 16),
                ],
                small_bonus: 6,
                full_bonus: 14,
            },
            &[("study", 5), ("work", 2), ("consecrate", 1)],
        ),
        role_def(
            Role::Priest,
            "High Patriarch",
            Resources::new(6, 1, 1, 0),
            flat_income(2),
            PathDef {
                small: vec![
                    Threshold::counter("times_donated", 2),
                    Threshold::distinct("beneficiaries", 2),
                ],
                full: vec![
                    Threshold::counter("times_donated", 4),
                    Threshold::distinct("beneficiaries", 2),
                    Threshold::counter("temples", 1),
                ],
                small_bonus: 7,
                full_bonus: 16,
            },
            &[
                ("donate", 5),
                ("build_temple", 4),
                ("consecrate", 3),
                ("work", 2),
            ],
        ),
        role_def(
            Role::Noble,
            "Chancellor",
            Resources::new(5, 0, 3, 0),
            Production {
                base: Resources::new(2, 0, 1, 0),
                per_territory: Resources::default(),
            },
            PathDef {
                small: vec![Threshold::new(Metric::Influence, 10)],
                full: vec![
                    Threshold::new(Metric::Influence, 20),
                    Threshold::counter("lobbies", 4),
                ],
                small_bonus: 6,
                full_bonus: 14,
            },
            &[("lobby", 5), ("consecrate", 2), ("work", 2)],
        ),
        role_def(
            Role::Farmer,
            "Landholder",
            Resources::new(6, 0, 0, 1),
            Production {
                base: Resources::new(2, 0, 0, 0),
                per_territory: Resources::new(2, 0, 0, 0),
            },
            PathDef {
                small: vec![Threshold::new(Metric::Territory, 3)],
                full: vec![
                    Threshold::new(Metric::Territory, 5),
                    Threshold::counter("claims", 3),
                ],
                small_bonus: 6,
                full_bonus: 14,
            },
            &[("claim_land", 5), ("work", 3)],
        ),
        role_def(
            Role::Artisan,
            "Master Builder",
            Resources::new(7, 1, 0, 0),
            flat_income(2),
            PathDef {
                small: vec![Threshold::counter("temples", 1)],
                full: vec![
                    Threshold::counter("temples", 2),
                    Threshold::new(Metric::Merit, 14),
                ],
                small_bonus: 6,
                full_bonus: 14,
            },
            &[("build_temple", 5), ("work", 3), ("study", 1)],
        ),
        role_def(
            Role::Soldier,
            "Warden of the Marches",
            Resources::new(5, 0, 1, 1),
            Production {
                base: Resources::new(2, 0, 0, 0),
                per_territory: Resources::new(0, 0, 1, 0),
            },
            PathDef {
                small: vec![Threshold::counter("claims", 2)],
                full: vec![
                    Threshold::counter("claims", 4),
                    Threshold::new(Metric::Influence, 6),
                ],
                small_bonus: 6,
                full_bonus: 14,
            },
            &[("claim_land", 5), ("lobby", 2), ("work", 2)],
        ),
    ]
}

fn action(name: &str, cost: Resources, gain: Resources, counters: &[&str]) -> ActionDef {
    ActionDef {
        name: name.to_string(),
        cost,
        gain,
        counters: counters.iter().map(|c| c.to_string()).collect(),
        gift: None,
        capstone: false,
        requires_small_path: false,
    }
}

fn standard_actions() -> Vec<ActionDef> {
    vec![
        action("work", Resources::default(), Resources::new(3, 0, 0, 0), &[]),
        action(
            "trade",
            Resources::new(3, 0, 0, 0),
            Resources::new(4, 0, 1, 0),
            &["trades"],
        ),
        action(
            "study",
            Resources::new(3, 0, 0, 0),
            Resources::new(0, 2, 0, 0),
            &["studies"],
        ),
        ActionDef {
            gift: Some(Gift {
                amount: Resources::new(3, 0, 0, 0),
                tally: Some("beneficiaries".to_string()),
            }),
            ..action(
                "donate",
                Resources::new(4, 0, 0, 0),
                Resources::new(0, 1, 1, 0),
                &["times_donated"],
            )
        },
        action(
            "lobby",
            Resources::new(2, 1, 0, 0),
            Resources::new(0, 0, 4, 0),
            &["lobbies"],
        ),
        action(
            "claim_land",
            Resources::new(5, 0, 1, 0),
            Resources::new(0, 0, 0, 1),
            &["claims"],
        ),
        ActionDef {
            capstone: true,
            ..action(
                "build_temple",
                Resources::new(10, 2, 0, 0),
                Resources::new(0, 6, 0, 0),
                &["temples"],
            )
        },
        ActionDef {
            requires_small_path: true,
            ..action(
                "consecrate",
                Resources::new(0, 0, 3, 0),
                Resources::new(0, 3, 0, 0),
                &["rites"],
            )
        },
    ]
}

fn event(
    name: &str,
    copies: u32,
    target: EventTarget,
    accept: ResourceDelta,
    decline: ResourceDelta,
) -> EventDef {
    EventDef {
        name: name.to_string(),
        copies,
        target,
        accept,
        decline,
        surcharge: None,
    }
}

fn delta(currency: i32, merit: i32, influence: i32, territory: i32) -> ResourceDelta {
    ResourceDelta {
        currency,
        merit,
        influence,
        territory,
    }
}

fn standard_events() -> Vec<EventDef> {
    vec![
        event(
            "Bountiful Harvest",
            2,
            EventTarget::Everyone,
            delta(3, 0, 0, 0),
            delta(0, 0, 1, 0),
        ),
        event(
            "Tax Levy",
            2,
            EventTarget::Everyone,
            delta(-3, 0, 0, 0),
            delta(0, 0, -2, 0),
        ),
        event(
            "Plague",
            1,
            EventTarget::Everyone,
            delta(-4, 2, 0, 0),
            delta(0, 0, -1, 0),
        ),
        event(
            "Royal Favor",
            1,
            EventTarget::LowestMerit,
            delta(0, 3, 0, 0),
            delta(4, 0, 0, 0),
        ),
        EventDef {
            surcharge: Some(Surcharge {
                action: Some("claim_land".to_string()),
                currency: 2,
            }),
            ..event(
                "Market Boom",
                2,
                EventTarget::Everyone,
                delta(2, 0, 0, 0),
                ResourceDelta::default(),
            )
        },
        EventDef {
            surcharge: Some(Surcharge {
                action: None,
                currency: -1,
            }),
            ..event(
                "Festival",
                1,
                EventTarget::Everyone,
                delta(-2, 0, 2, 0),
                ResourceDelta::default(),
            )
        },
        event(
            "Bandits",
            1,
            EventTarget::MostTerritory,
            delta(0, 0, 0, -1),
            delta(-5, 0, 0, 0),
        ),
        event(
            "Patronage",
            1,
            EventTarget::LowestCurrency,
            delta(5, 0, 0, 0),
            delta(0, 0, 2, 0),
        ),
    ]
}

fn conditions(thresholds: &[Threshold]) -> String {
    thresholds
        .iter()
        .map(|t| format!("{} >= {}", t.metric, t.at_least))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Ruleset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ruleset: {} (v{})", self.name, self.version)?;
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f, "\nParameters:")?;
        writeln!(f, "  Rounds: {}", self.rounds)?;
        writeln!(f, "  Base action points: {}", self.base_action_points)?;
        writeln!(f, "  Early victory: {}", self.early_victory)?;
        writeln!(f, "  Conservative margin: {} currency", self.conservative_margin)?;
        writeln!(
            f,
            "  Upkeep: every {} rounds, {} + {}/territory currency",
            self.upkeep.every, self.upkeep.currency, self.upkeep.currency_per_territory
        )?;
        writeln!(f, "  Supported counts: {:?}", self.supported_counts())?;

        writeln!(f, "\nRoles:")?;
        for def in &self.roles {
            writeln!(f, "\n  {} ({})", def.role, def.title)?;
            writeln!(f, "    Starting bonus: {}", def.bonus)?;
            writeln!(
                f,
                "    Production: {} + per territory {}",
                def.production.base, def.production.per_territory
            )?;
            writeln!(
                f,
                "    Small path (+{}): {}",
                def.path.small_bonus,
                conditions(&def.path.small)
            )?;
            writeln!(
                f,
                "    Full path (+{}): {}",
                def.path.full_bonus,
                conditions(&def.path.full)
            )?;
        }

        writeln!(f, "\nActions:")?;
        for action in &self.actions {
            writeln!(f, "  {}: pay {} -> gain {}", action.name, action.cost, action.gain)?;
        }

        writeln!(f, "\nEvents:")?;
        for event in &self.events {
            writeln!(f, "  {} x{} ({:?})", event.name, event.copies, event.target)?;
        }

        Ok(())
    }
}
