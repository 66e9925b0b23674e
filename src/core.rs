//! Participant state and the score-attribution ledger.
//!
//! Every mutation on a [`Participant`] returns the [`ScoreEntry`] it recorded,
//! so callers (and tests) can observe where points came from without
//! replaying a whole match.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::rules::Role;
use crate::strategies::StrategyKind;

/// The four resource counters every participant holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Currency,
    Merit,
    Influence,
    Territory,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Currency,
        Resource::Merit,
        Resource::Influence,
        Resource::Territory,
    ];

    /// Points a single unit is worth in the final score.
    pub fn weight(self) -> f64 {
        match self {
            Resource::Currency => 1.0 / 3.0,
            Resource::Merit => 2.0,
            Resource::Influence => 1.0,
            Resource::Territory => 2.0,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Currency => "currency",
            Resource::Merit => "merit",
            Resource::Influence => "influence",
            Resource::Territory => "territory",
        };
        write!(f, "{}", name)
    }
}

/// Non-negative holdings, also used for costs, gains and starting bonuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resources {
    pub currency: u32,
    pub merit: u32,
    pub influence: u32,
    pub territory: u32,
}

impl Resources {
    pub fn new(currency: u32, merit: u32, influence: u32, territory: u32) -> Self {
        Self {
            currency,
            merit,
            influence,
            territory,
        }
    }

    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Currency => self.currency,
            Resource::Merit => self.merit,
            Resource::Influence => self.influence,
            Resource::Territory => self.territory,
        }
    }

    fn slot_mut(&mut self, resource: Resource) -> &mut u32 {
        match resource {
            Resource::Currency => &mut self.currency,
            Resource::Merit => &mut self.merit,
            Resource::Influence => &mut self.influence,
            Resource::Territory => &mut self.territory,
        }
    }

    /// True when every counter is at least the matching counter of `cost`.
    pub fn covers(&self, cost: &Resources) -> bool {
        Resource::ALL
            .iter()
            .all(|&r| self.get(r) >= cost.get(r))
    }

    pub fn is_empty(&self) -> bool {
        Resource::ALL.iter().all(|&r| self.get(r) == 0)
    }

    /// Score value without integer truncation of currency.
    pub fn score_value(&self) -> f64 {
        Resource::ALL
            .iter()
            .map(|&r| self.get(r) as f64 * r.weight())
            .sum()
    }

    /// `merit×2 + influence + currency/3 + territory×2`, the fixed scoring
    /// formula shared by every ruleset.
    pub fn base_score(&self) -> u32 {
        self.merit
            .saturating_mul(2)
            .saturating_add(self.influence)
            .saturating_add(self.currency / 3)
            .saturating_add(self.territory.saturating_mul(2))
    }

    pub fn scaled_by(&self, count: u32) -> Resources {
        Resources {
            currency: self.currency.saturating_mul(count),
            merit: self.merit.saturating_mul(count),
            influence: self.influence.saturating_mul(count),
            territory: self.territory.saturating_mul(count),
        }
    }

    pub fn plus(&self, other: &Resources) -> Resources {
        Resources {
            currency: self.currency.saturating_add(other.currency),
            merit: self.merit.saturating_add(other.merit),
            influence: self.influence.saturating_add(other.influence),
            territory: self.territory.saturating_add(other.territory),
        }
    }
}

impl fmt::Display for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "currency {} merit {} influence {} territory {}",
            self.currency, self.merit, self.influence, self.territory
        )
    }
}

/// Signed change declared by an event option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceDelta {
    pub currency: i32,
    pub merit: i32,
    pub influence: i32,
    pub territory: i32,
}

impl ResourceDelta {
    pub fn get(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Currency => self.currency,
            Resource::Merit => self.merit,
            Resource::Influence => self.influence,
            Resource::Territory => self.territory,
        }
    }

    fn slot_mut(&mut self, resource: Resource) -> &mut i32 {
        match resource {
            Resource::Currency => &mut self.currency,
            Resource::Merit => &mut self.merit,
            Resource::Influence => &mut self.influence,
            Resource::Territory => &mut self.territory,
        }
    }

    pub fn is_zero(&self) -> bool {
        Resource::ALL.iter().all(|&r| self.get(r) == 0)
    }

    pub fn score_value(&self) -> f64 {
        Resource::ALL
            .iter()
            .map(|&r| self.get(r) as f64 * r.weight())
            .sum()
    }
}

/// Where a change in score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Mechanism,
    Event,
    Interaction,
    PathBonus,
}

impl ScoreSource {
    pub const ALL: [ScoreSource; 4] = [
        ScoreSource::Mechanism,
        ScoreSource::Event,
        ScoreSource::Interaction,
        ScoreSource::PathBonus,
    ];
}

/// A single attributed change in score points. Negative for deductions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreEntry {
    pub source: ScoreSource,
    pub points: f64,
}

impl ScoreEntry {
    pub fn new(source: ScoreSource, points: f64) -> Self {
        Self { source, points }
    }

    fn join(self, other: ScoreEntry) -> ScoreEntry {
        ScoreEntry {
            source: self.source,
            points: self.points + other.points,
        }
    }
}

/// Points per source. Sums to the participant's continuous score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreLedger {
    pub mechanism: f64,
    pub event: f64,
    pub interaction: f64,
    pub path_bonus: f64,
}

impl ScoreLedger {
    pub fn record(&mut self, entry: ScoreEntry) {
        *self.slot_mut(entry.source) += entry.points;
    }

    pub fn get(&self, source: ScoreSource) -> f64 {
        match source {
            ScoreSource::Mechanism => self.mechanism,
            ScoreSource::Event => self.event,
            ScoreSource::Interaction => self.interaction,
            ScoreSource::PathBonus => self.path_bonus,
        }
    }

    fn slot_mut(&mut self, source: ScoreSource) -> &mut f64 {
        match source {
            ScoreSource::Mechanism => &mut self.mechanism,
            ScoreSource::Event => &mut self.event,
            ScoreSource::Interaction => &mut self.interaction,
            ScoreSource::PathBonus => &mut self.path_bonus,
        }
    }

    pub fn total(&self) -> f64 {
        ScoreSource::ALL.iter().map(|&s| self.get(s)).sum()
    }

    /// Component-wise sum, used when averaging ledgers across matches.
    pub fn merge(&mut self, other: &ScoreLedger) {
        for source in ScoreSource::ALL {
            *self.slot_mut(source) += other.get(source);
        }
    }

    pub fn divided_by(&self, n: usize) -> ScoreLedger {
        if n == 0 {
            return ScoreLedger::default();
        }
        let n = n as f64;
        ScoreLedger {
            mechanism: self.mechanism / n,
            event: self.event / n,
            interaction: self.interaction / n,
            path_bonus: self.path_bonus / n,
        }
    }
}

/// One seat in a match: role, strategy, holdings and path progress.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: usize,
    pub role: Role,
    pub strategy: StrategyKind,
    pub resources: Resources,
    pub action_points: u32,
    /// Named integer progress counters, e.g. `times_donated`.
    pub counters: BTreeMap<String, u32>,
    /// Named sets of participant ids, e.g. `beneficiaries`.
    pub tallies: BTreeMap<String, BTreeSet<usize>>,
    pub small_path_latched: bool,
    pub ledger: ScoreLedger,
}

impl Participant {
    /// Creates a participant holding exactly its role's starting bonus.
    pub fn new(id: usize, role: Role, strategy: StrategyKind, bonus: &Resources) -> Self {
        let mut participant = Self {
            id,
            role,
            strategy,
            resources: Resources::default(),
            action_points: 0,
            counters: BTreeMap::new(),
            tallies: BTreeMap::new(),
            small_path_latched: false,
            ledger: ScoreLedger::default(),
        };
        participant.add_all(bonus, ScoreSource::Mechanism);
        participant
    }

    pub fn add(&mut self, resource: Resource, amount: u32, source: ScoreSource) -> ScoreEntry {
        let slot = self.resources.slot_mut(resource);
        let before = *slot;
        *slot = slot.saturating_add(amount);
        let gained = *slot - before;
        let entry = ScoreEntry::new(source, gained as f64 * resource.weight());
        self.ledger.record(entry);
        entry
    }

    /// Removes up to `amount`, flooring at zero. Only the realized loss is
    /// recorded.
    pub fn remove(&mut self, resource: Resource, amount: u32, source: ScoreSource) -> ScoreEntry {
        let slot = self.resources.slot_mut(resource);
        let taken = amount.min(*slot);
        *slot -= taken;
        let entry = ScoreEntry::new(source, -(taken as f64) * resource.weight());
        self.ledger.record(entry);
        entry
    }

    pub fn add_all(&mut self, gain: &Resources, source: ScoreSource) -> ScoreEntry {
        Resource::ALL
            .iter()
            .map(|&r| self.add(r, gain.get(r), source))
            .fold(ScoreEntry::new(source, 0.0), ScoreEntry::join)
    }

    pub fn can_afford(&self, cost: &Resources) -> bool {
        self.resources.covers(cost)
    }

    /// Deducts `cost` in full, or refuses and leaves the participant untouched.
    pub fn pay(&mut self, cost: &Resources) -> Option<ScoreEntry> {
        if !self.can_afford(cost) {
            return None;
        }
        let entry = Resource::ALL
            .iter()
            .map(|&r| self.remove(r, cost.get(r), ScoreSource::Mechanism))
            .fold(ScoreEntry::new(ScoreSource::Mechanism, 0.0), ScoreEntry::join);
        Some(entry)
    }

    /// Applies a signed delta, flooring each counter at zero immediately.
    pub fn apply_delta(&mut self, delta: &ResourceDelta, source: ScoreSource) -> ScoreEntry {
        let mut total = ScoreEntry::new(source, 0.0);
        for resource in Resource::ALL {
            let change = delta.get(resource);
            let entry = if change >= 0 {
                self.add(resource, change.unsigned_abs(), source)
            } else {
                self.remove(resource, change.unsigned_abs(), source)
            };
            total = total.join(entry);
        }
        total
    }

    /// The delta that [`Participant::apply_delta`] would actually realize.
    pub fn preview_delta(&self, delta: &ResourceDelta) -> ResourceDelta {
        let mut realized = *delta;
        for resource in Resource::ALL {
            let held = i64::from(self.resources.get(resource));
            let change = i64::from(delta.get(resource));
            if held + change < 0 {
                *realized.slot_mut(resource) = -(held as i32);
            }
        }
        realized
    }

    pub fn bump(&mut self, counter: &str) {
        *self.counters.entry(counter.to_string()).or_insert(0) += 1;
    }

    pub fn counter(&self, name: &str) -> u32 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn tally(&mut self, name: &str, id: usize) {
        self.tallies.entry(name.to_string()).or_default().insert(id);
    }

    pub fn tally_len(&self, name: &str) -> usize {
        self.tallies.get(name).map_or(0, BTreeSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merchant() -> Participant {
        Participant::new(
            0,
            Role::Merchant,
            StrategyKind::Balanced,
            &Resources::new(9, 1, 2, 0),
        )
    }

    #[test]
    fn test_starting_bonus_is_recorded_as_mechanism() {
        let p = merchant();
        assert_eq!(p.resources, Resources::new(9, 1, 2, 0));
        assert!((p.ledger.mechanism - 7.0).abs() < 1e-9);
        assert_eq!(p.ledger.event, 0.0);
    }

    #[test]
    fn test_add_returns_weighted_entry() {
        let mut p = merchant();
        let entry = p.add(Resource::Territory, 2, ScoreSource::Interaction);
        assert_eq!(entry.source, ScoreSource::Interaction);
        assert!((entry.points - 4.0).abs() < 1e-9);
        assert!((p.ledger.interaction - 4.0).abs() < 1e-9);
        assert_eq!(p.resources.territory, 2);
    }

    #[test]
    fn test_pay_refuses_unaffordable_cost() {
        let mut p = merchant();
        let before = p.clone();
        assert!(p.pay(&Resources::new(10, 0, 0, 0)).is_none());
        assert_eq!(p.resources, before.resources);
        assert_eq!(p.ledger, before.ledger);

        let entry = p.pay(&Resources::new(6, 1, 0, 0)).unwrap();
        assert!((entry.points + 4.0).abs() < 1e-9);
        assert_eq!(p.resources, Resources::new(3, 0, 2, 0));
    }

    #[test]
    fn test_delta_floors_at_zero() {
        let mut p = merchant();
        let delta = ResourceDelta {
            currency: -20,
            merit: 3,
            ..Default::default()
        };
        assert_eq!(
            p.preview_delta(&delta),
            ResourceDelta {
                currency: -9,
                merit: 3,
                ..Default::default()
            }
        );
        let entry = p.apply_delta(&delta, ScoreSource::Event);
        assert_eq!(p.resources.currency, 0);
        assert_eq!(p.resources.merit, 4);
        assert!((entry.points - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_ledger_tracks_continuous_score() {
        let mut p = merchant();
        p.add(Resource::Currency, 4, ScoreSource::Mechanism);
        p.remove(Resource::Influence, 1, ScoreSource::Event);
        p.add(Resource::Merit, 2, ScoreSource::Interaction);
        assert!((p.ledger.total() - p.resources.score_value()).abs() < 1e-9);
        assert!(p.ledger.total() - f64::from(p.resources.base_score()) < 1.0);
    }

    #[test]
    fn test_base_score_saturates() {
        let huge = Resources::new(u32::MAX, u32::MAX, u32::MAX, u32::MAX);
        assert_eq!(huge.base_score(), u32::MAX);
        assert_eq!(Resources::new(9, 1, 2, 3).base_score(), 3 + 2 + 2 + 6);
    }

    #[test]
    fn test_counters_and_tallies() {
        let mut p = merchant();
        p.bump("times_donated");
        p.bump("times_donated");
        p.tally("beneficiaries", 2);
        p.tally("beneficiaries", 2);
        p.tally("beneficiaries", 3);
        assert_eq!(p.counter("times_donated"), 2);
        assert_eq!(p.counter("unknown"), 0);
        assert_eq!(p.tally_len("beneficiaries"), 2);
        assert_eq!(p.tally_len("unknown"), 0);
    }
}
