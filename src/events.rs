//! The event deck and its resolution.

use log::debug;
use rand::RngCore;
use rand::seq::SliceRandom;
use std::cmp::Reverse;

use crate::core::{Participant, Resources, ScoreEntry, ScoreSource};
use crate::rules::{ActionDef, EventDef, EventTarget, Surcharge};
use crate::strategies::{EventChoice, Strategy};

/// Cost adjustments that last for one round only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundModifiers {
    surcharges: Vec<Surcharge>,
}

impl RoundModifiers {
    pub fn reset(&mut self) {
        self.surcharges.clear();
    }

    pub fn push(&mut self, surcharge: Surcharge) {
        self.surcharges.push(surcharge);
    }

    pub fn is_empty(&self) -> bool {
        self.surcharges.is_empty()
    }

    /// Net currency adjustment for `action` this round.
    pub fn currency_surcharge(&self, action: &str) -> i64 {
        self.surcharges
            .iter()
            .filter(|s| s.action.as_deref().is_none_or(|a| a == action))
            .map(|s| i64::from(s.currency))
            .sum()
    }

    /// The action's cost after surcharges, with currency floored at zero.
    pub fn effective_cost(&self, action: &ActionDef) -> Resources {
        let mut cost = action.cost;
        let currency = i64::from(cost.currency) + self.currency_surcharge(&action.name);
        cost.currency = u32::try_from(currency.max(0)).unwrap_or(u32::MAX);
        cost
    }
}

/// Indices into the event catalog, in draw order. Never reshuffled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDeck {
    cards: Vec<usize>,
}

impl EventDeck {
    pub fn draw(&mut self) -> Option<usize> {
        self.cards.pop()
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Expands every catalog entry by its copy count and shuffles the result.
pub fn build_deck(catalog: &[EventDef], rng: &mut dyn RngCore) -> EventDeck {
    let mut cards: Vec<usize> = catalog
        .iter()
        .enumerate()
        .flat_map(|(i, event)| std::iter::repeat_n(i, event.copies as usize))
        .collect();
    cards.shuffle(rng);
    EventDeck { cards }
}

/// Seats affected by a card. Single-target cards break ties by lowest id.
pub fn targets(target: EventTarget, participants: &[Participant]) -> Vec<usize> {
    let single = match target {
        EventTarget::Everyone => return (0..participants.len()).collect(),
        EventTarget::LowestMerit => participants
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| (p.resources.merit, p.id)),
        EventTarget::LowestCurrency => participants
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| (p.resources.currency, p.id)),
        EventTarget::HighestInfluence => participants
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| (Reverse(p.resources.influence), p.id)),
        EventTarget::MostTerritory => participants
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| (Reverse(p.resources.territory), p.id)),
    };
    single.map(|(seat, _)| vec![seat]).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventEffect {
    pub participant: usize,
    pub choice: EventChoice,
    pub entry: ScoreEntry,
}

/// Resolves one card: each affected participant's strategy picks an option
/// and the chosen delta is applied, floored at zero. A surcharge on the card
/// becomes a modifier for the rest of the round.
pub fn apply(
    event: &EventDef,
    participants: &mut [Participant],
    strategies: &[Box<dyn Strategy>],
    modifiers: &mut RoundModifiers,
    rng: &mut dyn RngCore,
) -> Vec<EventEffect> {
    let mut effects = Vec::new();
    for seat in targets(event.target, participants) {
        let participant = &mut participants[seat];
        let choice = strategies[seat].choose_option(participant, event, rng);
        let delta = match choice {
            EventChoice::Accept => &event.accept,
            EventChoice::Decline => &event.decline,
        };
        let entry = participant.apply_delta(delta, ScoreSource::Event);
        debug!(
            "{}: participant {} chose {:?} ({:+.2} points)",
            event.name, participant.id, choice, entry.points
        );
        effects.push(EventEffect {
            participant: participant.id,
            choice,
            entry,
        });
    }

    if let Some(surcharge) = &event.surcharge {
        modifiers.push(surcharge.clone());
    }

    effects
}
