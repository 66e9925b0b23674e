//! The turn engine: one match, Event → Production → Action → Settlement
//! for a fixed number of rounds.

use log::{debug, trace};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::core::{Participant, Resource, Resources, ScoreLedger, ScoreSource};
use crate::events::{self, EventDeck, RoundModifiers};
use crate::path::{self, PathTier};
use crate::rules::{ActionId, Role, RuleError, Ruleset, ScaledPath};
use crate::strategies::{DecisionContext, Strategy, StrategyKind, create_strategy, usable_cost};
use crate::trace::{MatchTrace, TraceKind};

/// Who sits where. Participant ids are seat indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seat {
    pub role: Role,
    pub strategy: StrategyKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantResult {
    pub id: usize,
    pub role: Role,
    pub strategy: StrategyKind,
    pub score: u32,
    pub tier: PathTier,
    pub resources: Resources,
    pub ledger: ScoreLedger,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome {
    pub seed: u64,
    pub rounds_played: u32,
    pub winner: Option<usize>,
    pub results: Vec<ParticipantResult>,
}

impl MatchOutcome {
    pub fn scores(&self) -> Vec<u32> {
        self.results.iter().map(|r| r.score).collect()
    }

    pub fn winning_result(&self) -> Option<&ParticipantResult> {
        self.winner.and_then(|id| self.results.iter().find(|r| r.id == id))
    }
}

/// Everything that changes during a match.
#[derive(Debug, Clone)]
pub struct MatchState {
    /// 1-based; 0 before the first round.
    pub round: u32,
    pub participants: Vec<Participant>,
    pub deck: EventDeck,
    pub modifiers: RoundModifiers,
}

pub struct Match<'a> {
    rules: &'a Ruleset,
    paths: Vec<ScaledPath>,
    strategies: Vec<Box<dyn Strategy>>,
    state: MatchState,
    rng: ChaCha8Rng,
    seed: u64,
    trace: Option<MatchTrace>,
}

impl<'a> Match<'a> {
    pub fn new(rules: &'a Ruleset, seats: &[Seat], seed: u64) -> Result<Self, RuleError> {
        Self::with_rng(rules, seats, seed, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Continues an existing stream, e.g. one already used to shuffle seats.
    pub fn with_rng(
        rules: &'a Ruleset,
        seats: &[Seat],
        seed: u64,
        mut rng: ChaCha8Rng,
    ) -> Result<Self, RuleError> {
        let players = seats.len();
        let mut participants = Vec::with_capacity(players);
        let mut paths = Vec::with_capacity(players);
        for (id, seat) in seats.iter().enumerate() {
            let def = rules.role(seat.role).ok_or(RuleError::MissingRole {
                players,
                role: seat.role,
            })?;
            participants.push(Participant::new(id, seat.role, seat.strategy, &def.bonus));
            paths.push(rules.path_for(seat.role, players)?);
        }

        let deck = events::build_deck(&rules.events, &mut rng);
        Ok(Self {
            rules,
            paths,
            strategies: seats.iter().map(|s| create_strategy(s.strategy)).collect(),
            state: MatchState {
                round: 0,
                participants,
                deck,
                modifiers: RoundModifiers::default(),
            },
            rng,
            seed,
            trace: None,
        })
    }

    pub fn traced(mut self) -> Self {
        self.trace = Some(MatchTrace::new());
        self
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn play(mut self) -> MatchOutcome {
        self.run()
    }

    pub fn play_traced(mut self) -> (MatchOutcome, MatchTrace) {
        if self.trace.is_none() {
            self.trace = Some(MatchTrace::new());
        }
        let outcome = self.run();
        (outcome, self.trace.unwrap_or_default())
    }

    fn run(&mut self) -> MatchOutcome {
        while self.state.round < self.rules.rounds {
            if self.play_round() {
                break;
            }
        }
        self.finish()
    }

    fn note(&mut self, participant: Option<usize>, kind: TraceKind) {
        if let Some(trace) = self.trace.as_mut() {
            trace.log(self.state.round, participant, kind);
        }
    }

    /// Plays the next round. Returns true when the match ended early.
    pub fn play_round(&mut self) -> bool {
        self.state.round += 1;
        self.state.modifiers.reset();
        trace!("Round {} begins", self.state.round);

        self.event_phase();
        self.production_phase();
        self.action_phase();

        if self.rules.early_victory {
            if let Some(id) = self.full_path_reached() {
                debug!("Participant {} reached a full path in round {}", id, self.state.round);
                self.note(Some(id), TraceKind::EarlyVictory);
                return true;
            }
        }

        self.settlement_phase();
        false
    }

    fn event_phase(&mut self) {
        let Some(index) = self.state.deck.draw() else {
            self.note(None, TraceKind::DeckExhausted);
            return;
        };
        let rules = self.rules;
        let event = &rules.events[index];
        self.note(
            None,
            TraceKind::CardDrawn {
                card: event.name.clone(),
                remaining: self.state.deck.remaining(),
            },
        );

        let effects = events::apply(
            event,
            &mut self.state.participants,
            &self.strategies,
            &mut self.state.modifiers,
            &mut self.rng,
        );
        for effect in effects {
            self.note(
                Some(effect.participant),
                TraceKind::EventResolved {
                    card: event.name.clone(),
                    choice: effect.choice,
                    points: effect.entry.points,
                },
            );
        }
    }

    fn production_phase(&mut self) {
        let rules = self.rules;
        for seat in 0..self.state.participants.len() {
            let participant = &mut self.state.participants[seat];
            let Some(def) = rules.role(participant.role) else {
                continue;
            };
            let amount = def.production.yield_for(participant.resources.territory);
            if amount.is_empty() {
                continue;
            }
            participant.add_all(&amount, ScoreSource::Mechanism);
            self.note(Some(seat), TraceKind::Produced { amount });
        }
    }

    fn action_phase(&mut self) {
        let n = self.state.participants.len();
        if n == 0 {
            return;
        }
        for p in &mut self.state.participants {
            p.action_points = self.rules.action_points_for(p.role, p.strategy);
        }

        let start = (self.state.round as usize - 1) % n;
        let order: Vec<usize> = (0..n).map(|i| (start + i) % n).collect();
        let mut active = vec![true; n];

        while active.iter().any(|&a| a) {
            for &seat in &order {
                if !active[seat] {
                    continue;
                }
                if self.state.participants[seat].action_points == 0 {
                    active[seat] = false;
                    continue;
                }

                let choice = {
                    let ctx = DecisionContext {
                        rules: self.rules,
                        participant: &self.state.participants[seat],
                        others: self
                            .state
                            .participants
                            .iter()
                            .filter(|p| p.id != seat)
                            .collect(),
                        round: self.state.round,
                        rounds: self.rules.rounds,
                        modifiers: &self.state.modifiers,
                    };
                    self.strategies[seat].choose_action(&ctx, &mut self.rng)
                };

                match choice {
                    Some(id) => {
                        self.state.participants[seat].action_points -= 1;
                        self.execute(seat, id);
                    }
                    None => {
                        let unused_points = self.state.participants[seat].action_points;
                        self.state.participants[seat].action_points = 0;
                        active[seat] = false;
                        self.note(Some(seat), TraceKind::Passed { unused_points });
                    }
                }
            }
        }
    }

    /// Applies an action if its preconditions still hold; otherwise nothing
    /// happens.
    fn execute(&mut self, seat: usize, id: ActionId) {
        let rules = self.rules;
        let action = rules.action(id);
        let recipient = action
            .gift
            .as_ref()
            .and_then(|_| gift_recipient(&self.state.participants, seat));
        let Some(cost) = usable_cost(
            rules,
            &self.state.participants[seat],
            recipient.is_some(),
            &self.state.modifiers,
            id,
        ) else {
            trace!("Participant {} could not take {}", seat, action.name);
            return;
        };

        let participant = &mut self.state.participants[seat];
        let Some(paid) = participant.pay(&cost) else {
            return;
        };
        let gained = participant.add_all(&action.gain, ScoreSource::Mechanism);
        for counter in &action.counters {
            participant.bump(counter);
        }
        if let (Some(gift), Some(to)) = (&action.gift, recipient) {
            if let Some(tally) = &gift.tally {
                participant.tally(tally, to);
            }
            self.state.participants[to].add_all(&gift.amount, ScoreSource::Interaction);
        }

        trace!("Participant {} took {}", seat, action.name);
        self.note(
            Some(seat),
            TraceKind::ActionTaken {
                action: action.name.clone(),
                points: paid.points + gained.points,
                recipient,
            },
        );
    }

    fn full_path_reached(&self) -> Option<usize> {
        self.state
            .participants
            .iter()
            .zip(&self.paths)
            .find(|(p, path)| path::condition_met(&path.full, p))
            .map(|(p, _)| p.id)
    }

    fn settlement_phase(&mut self) {
        let rules = self.rules;
        let upkeep = &rules.upkeep;
        if upkeep.due(self.state.round) {
            for seat in 0..self.state.participants.len() {
                let participant = &mut self.state.participants[seat];
                let charged = upkeep.charge(participant.resources.territory);
                if charged == 0 {
                    continue;
                }
                let entry = participant.remove(Resource::Currency, charged, ScoreSource::Mechanism);
                self.note(
                    Some(seat),
                    TraceKind::UpkeepPaid {
                        charged,
                        points: entry.points,
                    },
                );
            }
        }

        for seat in 0..self.state.participants.len() {
            let was_latched = self.state.participants[seat].small_path_latched;
            path::evaluate(&mut self.state.participants[seat], &self.paths[seat]);
            if !was_latched && self.state.participants[seat].small_path_latched {
                debug!(
                    "Participant {} reached the {} small path in round {}",
                    seat, self.paths[seat].title, self.state.round
                );
                let title = self.paths[seat].title.clone();
                self.note(Some(seat), TraceKind::SmallPathLatched { title });
            }
        }
    }

    fn finish(&mut self) -> MatchOutcome {
        let mut results = Vec::with_capacity(self.state.participants.len());
        for seat in 0..self.state.participants.len() {
            let participant = &mut self.state.participants[seat];
            let status = path::evaluate(participant, &self.paths[seat]);
            let score = path::award(participant, &status);
            results.push(ParticipantResult {
                id: participant.id,
                role: participant.role,
                strategy: participant.strategy,
                score,
                tier: status.tier,
                resources: participant.resources,
                ledger: participant.ledger,
            });
            self.note(
                Some(seat),
                TraceKind::FinalScore {
                    score,
                    tier: status.tier,
                },
            );
        }

        let winner = path::winner(results.iter().map(|r| (r.id, r.score)));
        debug!(
            "Match {} finished after {} rounds, winner {:?}",
            self.seed, self.state.round, winner
        );
        MatchOutcome {
            seed: self.seed,
            rounds_played: self.state.round,
            winner,
            results,
        }
    }
}

/// Poorest other participant, ties by lowest id.
fn gift_recipient(participants: &[Participant], giver: usize) -> Option<usize> {
    participants
        .iter()
        .filter(|p| p.id != giver)
        .min_by_key(|p| (p.resources.currency, p.id))
        .map(|p| p.id)
}

/// Seats the ruleset's lineup for `strategies.len()` players in order.
pub fn lineup_seats(rules: &Ruleset, strategies: &[StrategyKind]) -> Result<Vec<Seat>, RuleError> {
    let roles = rules.lineup(strategies.len())?;
    Ok(roles
        .iter()
        .zip(strategies)
        .map(|(&role, &strategy)| Seat { role, strategy })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seats(rules: &Ruleset, strategy: StrategyKind, players: usize) -> Vec<Seat> {
        lineup_seats(rules, &vec![strategy; players]).unwrap()
    }

    #[test]
    fn test_match_plays_all_rounds() {
        let rules = Ruleset::standard();
        let outcome = Match::new(&rules, &seats(&rules, StrategyKind::Balanced, 4), 9)
            .unwrap()
            .play();
        assert_eq!(outcome.rounds_played, rules.rounds);
        assert_eq!(outcome.results.len(), 4);
        let winner = outcome.winning_result().unwrap();
        assert!(outcome.results.iter().all(|r| r.score <= winner.score));
    }

    #[test]
    fn test_scores_follow_formula_and_ledger() {
        let rules = Ruleset::standard();
        let outcome = Match::new(&rules, &seats(&rules, StrategyKind::Random, 5), 31)
            .unwrap()
            .play();
        for r in &outcome.results {
            let bonus = r.score - r.resources.base_score();
            assert!((r.ledger.path_bonus - f64::from(bonus)).abs() < 1e-9);
            let continuous = r.resources.score_value() + f64::from(bonus);
            assert!((r.ledger.total() - continuous).abs() < 1e-6);
            if r.tier == PathTier::None {
                assert_eq!(bonus, 0);
            }
        }
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let rules = Ruleset::standard();
        let lineup = seats(&rules, StrategyKind::Random, 4);
        let a = Match::new(&rules, &lineup, 77).unwrap().play();
        let b = Match::new(&rules, &lineup, 77).unwrap().play();
        assert_eq!(a.winner, b.winner);
        assert_eq!(a.scores(), b.scores());
    }

    #[test]
    fn test_early_victory_cuts_match_short() {
        let mut rules = Ruleset::standard();
        rules.early_victory = true;
        // Merchant's full path becomes trivially satisfied.
        let merchant = rules.roles.iter_mut().find(|r| r.role == Role::Merchant).unwrap();
        merchant.path.small.clear();
        merchant.path.full.clear();

        let (outcome, journal) = Match::new(&rules, &seats(&rules, StrategyKind::Balanced, 3), 5)
            .unwrap()
            .play_traced();
        assert_eq!(outcome.rounds_played, 1);
        assert!(journal.events().iter().any(|e| e.kind == TraceKind::EarlyVictory));
        assert_eq!(outcome.results[0].tier, PathTier::Full);
    }

    #[test]
    fn test_gift_goes_to_poorest_other() {
        let rules = Ruleset::standard();
        let mut participants: Vec<Participant> = (0..3)
            .map(|id| {
                Participant::new(id, Role::Priest, StrategyKind::Balanced, &Resources::default())
            })
            .collect();
        participants[0].resources.currency = 1;
        participants[1].resources.currency = 4;
        participants[2].resources.currency = 1;
        assert_eq!(gift_recipient(&participants, 0), Some(2));
        assert_eq!(gift_recipient(&participants, 1), Some(0));
        assert_eq!(gift_recipient(&participants[..1], 0), None);
    }

    #[test]
    fn test_donation_moves_currency_as_interaction() {
        let mut rules = Ruleset::standard();
        rules.events.clear();
        rules.base_action_points = 1;
        let lineup = seats(&rules, StrategyKind::Balanced, 3);
        let mut game = Match::new(&rules, &lineup, 2).unwrap();
        game.play_round();

        let priest = &game.state().participants[2];
        assert_eq!(priest.counter("times_donated"), 1);
        assert_eq!(priest.tally_len("beneficiaries"), 1);
        let received: f64 = game
            .state()
            .participants
            .iter()
            .map(|p| p.ledger.interaction)
            .sum();
        assert!((received - 1.0).abs() < 1e-9);
    }
}
