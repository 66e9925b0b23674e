//! Decision-making for participants.
//!
//! A strategy is stateless: it looks at one participant and the visible match
//! state and either picks an affordable action or passes. Roles never appear
//! in strategy code; role preferences arrive only through the ruleset's
//! action weights.
//!
//! # Strategy Types
//!
//! - **Aggressive**: takes capstone actions first, otherwise the best net payoff
//! - **Conservative**: never spends currency below the ruleset's margin
//! - **Balanced**: follows the role's action weights, breaking ties by payoff
//! - **Random**: uniform over everything it can afford
//! - **Opportunistic**: hoards currency early, follows weights mid-game, and
//!   plays like Aggressive in the final third

use rand::Rng;
use rand::RngCore;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{Participant, Resource, ResourceDelta, Resources};
use crate::events::RoundModifiers;
use crate::rules::{ActionId, EventDef, Ruleset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Aggressive,
    Conservative,
    Balanced,
    Random,
    Opportunistic,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Aggressive,
        StrategyKind::Conservative,
        StrategyKind::Balanced,
        StrategyKind::Random,
        StrategyKind::Opportunistic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Aggressive => "aggressive",
            StrategyKind::Conservative => "conservative",
            StrategyKind::Balanced => "balanced",
            StrategyKind::Random => "random",
            StrategyKind::Opportunistic => "opportunistic",
        }
    }

    pub fn from_name(name: &str) -> Option<StrategyKind> {
        let name = name.to_lowercase();
        StrategyKind::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventChoice {
    Accept,
    Decline,
}

/// What a participant can see when it is its turn to act.
pub struct DecisionContext<'a> {
    pub rules: &'a Ruleset,
    pub participant: &'a Participant,
    pub others: Vec<&'a Participant>,
    /// 1-based.
    pub round: u32,
    pub rounds: u32,
    pub modifiers: &'a RoundModifiers,
}

/// An action the participant can take right now, at its effective cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvailableAction {
    pub id: ActionId,
    pub cost: Resources,
    pub payoff: f64,
}

/// Effective cost of `id` for `participant`, or `None` if the action cannot
/// be taken: unaffordable, no gift recipient, or gated behind the small path.
pub fn usable_cost(
    rules: &Ruleset,
    participant: &Participant,
    has_recipient: bool,
    modifiers: &RoundModifiers,
    id: ActionId,
) -> Option<Resources> {
    let action = rules.action(id);
    if action.requires_small_path && !participant.small_path_latched {
        return None;
    }
    if action.gift.is_some() && !has_recipient {
        return None;
    }
    let cost = modifiers.effective_cost(action);
    participant.can_afford(&cost).then_some(cost)
}

pub fn available_actions(ctx: &DecisionContext<'_>) -> Vec<AvailableAction> {
    let has_recipient = !ctx.others.is_empty();
    (0..ctx.rules.actions.len())
        .map(ActionId)
        .filter_map(|id| {
            let cost = usable_cost(ctx.rules, ctx.participant, has_recipient, ctx.modifiers, id)?;
            Some(AvailableAction {
                id,
                cost,
                payoff: ctx.rules.action(id).payoff(&cost),
            })
        })
        .collect()
}

/// Trait for participant decision-making strategies.
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn name(&self) -> &str {
        self.kind().name()
    }

    /// Picks the next action, or `None` to pass for the rest of the round.
    fn choose_action(&self, ctx: &DecisionContext<'_>, rng: &mut dyn RngCore) -> Option<ActionId>;

    /// Accepts when the accept option is worth at least as much as declining,
    /// counting only the change that flooring would actually allow.
    fn choose_option(
        &self,
        participant: &Participant,
        event: &EventDef,
        _rng: &mut dyn RngCore,
    ) -> EventChoice {
        prefer(
            participant.preview_delta(&event.accept).score_value(),
            participant.preview_delta(&event.decline).score_value(),
        )
    }
}

fn prefer(accept: f64, decline: f64) -> EventChoice {
    if accept >= decline {
        EventChoice::Accept
    } else {
        EventChoice::Decline
    }
}

/// First option with the highest payoff.
fn max_payoff<'a>(options: impl IntoIterator<Item = &'a AvailableAction>) -> Option<ActionId> {
    options
        .into_iter()
        .fold(None, |best: Option<&AvailableAction>, o| match best {
            Some(b) if b.payoff >= o.payoff => Some(b),
            _ => Some(o),
        })
        .map(|o| o.id)
}

fn aggressive_pick(ctx: &DecisionContext<'_>, options: &[AvailableAction]) -> Option<ActionId> {
    max_payoff(options.iter().filter(|o| ctx.rules.action(o.id).capstone))
        .or_else(|| max_payoff(options))
}

fn weighted_pick(ctx: &DecisionContext<'_>, options: &[AvailableAction]) -> Option<ActionId> {
    let role = ctx.rules.role(ctx.participant.role);
    let weight = |o: &AvailableAction| role.map_or(0, |r| r.weight(&ctx.rules.action(o.id).name));
    options
        .iter()
        .fold(None, |best: Option<&AvailableAction>, o| match best {
            Some(b) => {
                let (wb, wo) = (weight(b), weight(o));
                if wo > wb || (wo == wb && o.payoff > b.payoff) {
                    Some(o)
                } else {
                    Some(b)
                }
            }
            None => Some(o),
        })
        .map(|o| o.id)
}

pub struct AggressiveStrategy;

impl Strategy for AggressiveStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Aggressive
    }

    fn choose_action(&self, ctx: &DecisionContext<'_>, _rng: &mut dyn RngCore) -> Option<ActionId> {
        aggressive_pick(ctx, &available_actions(ctx))
    }
}

pub struct ConservativeStrategy;

impl ConservativeStrategy {
    /// Losses count double.
    fn guarded_value(delta: &ResourceDelta) -> f64 {
        Resource::ALL
            .iter()
            .map(|&r| {
                let change = f64::from(delta.get(r)) * r.weight();
                if change < 0.0 { change * 2.0 } else { change }
            })
            .sum()
    }
}

impl Strategy for ConservativeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Conservative
    }

    fn choose_action(&self, ctx: &DecisionContext<'_>, _rng: &mut dyn RngCore) -> Option<ActionId> {
        let currency = ctx.participant.resources.currency;
        let margin = ctx.rules.conservative_margin;
        let options = available_actions(ctx);
        max_payoff(
            options
                .iter()
                .filter(|o| o.cost.currency == 0 || currency - o.cost.currency >= margin),
        )
    }

    fn choose_option(
        &self,
        participant: &Participant,
        event: &EventDef,
        _rng: &mut dyn RngCore,
    ) -> EventChoice {
        prefer(
            Self::guarded_value(&participant.preview_delta(&event.accept)),
            Self::guarded_value(&participant.preview_delta(&event.decline)),
        )
    }
}

pub struct BalancedStrategy;

impl Strategy for BalancedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Balanced
    }

    fn choose_action(&self, ctx: &DecisionContext<'_>, _rng: &mut dyn RngCore) -> Option<ActionId> {
        weighted_pick(ctx, &available_actions(ctx))
    }
}

pub struct RandomStrategy;

impl Strategy for RandomStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Random
    }

    fn choose_action(&self, ctx: &DecisionContext<'_>, rng: &mut dyn RngCore) -> Option<ActionId> {
        available_actions(ctx).choose(rng).map(|o| o.id)
    }

    fn choose_option(
        &self,
        _participant: &Participant,
        _event: &EventDef,
        rng: &mut dyn RngCore,
    ) -> EventChoice {
        if rng.random_bool(0.5) {
            EventChoice::Accept
        } else {
            EventChoice::Decline
        }
    }
}

pub struct OpportunisticStrategy;

impl OpportunisticStrategy {
    fn currency_gain(ctx: &DecisionContext<'_>, option: &AvailableAction) -> i64 {
        i64::from(ctx.rules.action(option.id).gain.currency) - i64::from(option.cost.currency)
    }
}

impl Strategy for OpportunisticStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Opportunistic
    }

    fn choose_action(&self, ctx: &DecisionContext<'_>, _rng: &mut dyn RngCore) -> Option<ActionId> {
        let options = available_actions(ctx);
        if ctx.round * 3 <= ctx.rounds {
            options
                .iter()
                .fold(None, |best: Option<&AvailableAction>, o| match best {
                    Some(b) => {
                        let (gb, go) = (Self::currency_gain(ctx, b), Self::currency_gain(ctx, o));
                        if go > gb || (go == gb && o.payoff > b.payoff) {
                            Some(o)
                        } else {
                            Some(b)
                        }
                    }
                    None => Some(o),
                })
                .map(|o| o.id)
        } else if ctx.round * 3 > ctx.rounds * 2 {
            aggressive_pick(ctx, &options)
        } else {
            weighted_pick(ctx, &options)
        }
    }
}

pub fn create_strategy(kind: StrategyKind) -> Box<dyn Strategy> {
    match kind {
        StrategyKind::Aggressive => Box::new(AggressiveStrategy),
        StrategyKind::Conservative => Box::new(ConservativeStrategy),
        StrategyKind::Balanced => Box::new(BalancedStrategy),
        StrategyKind::Random => Box::new(RandomStrategy),
        StrategyKind::Opportunistic => Box::new(OpportunisticStrategy),
    }
}

pub fn create_strategy_by_name(name: &str) -> Option<Box<dyn Strategy>> {
    StrategyKind::from_name(name).map(create_strategy)
}
