//! Integration tests for participant strategies playing whole matches.

use std::collections::BTreeMap;

use balance_sim::engine::{Match, Seat, lineup_seats};
use balance_sim::rules::{Role, Ruleset};
use balance_sim::strategies::StrategyKind;
use balance_sim::trace::TraceKind;

const FRONTIER: &str = include_str!("../rulesets/frontier.yaml");

fn uniform(rules: &Ruleset, kind: StrategyKind, players: usize) -> Vec<Seat> {
    lineup_seats(rules, &vec![kind; players]).unwrap()
}

#[test]
fn test_every_strategy_finishes_every_table_size() {
    let rules = Ruleset::standard();
    for players in rules.supported_counts() {
        for kind in StrategyKind::ALL {
            let outcome = Match::new(&rules, &uniform(&rules, kind, players), 100 + players as u64)
                .unwrap()
                .play();
            assert_eq!(outcome.results.len(), players);
            assert_eq!(outcome.rounds_played, rules.rounds);
            assert!(outcome.winner.is_some(), "{} with {} players", kind, players);
            for r in &outcome.results {
                let bonus = r.score - r.resources.base_score();
                let continuous = r.resources.score_value() + f64::from(bonus);
                assert!((r.ledger.total() - continuous).abs() < 1e-6);
            }
        }
    }
}

#[test]
fn test_actions_never_exceed_budget() {
    let rules = Ruleset::from_yaml_str(FRONTIER).unwrap();
    let seats: Vec<Seat> = rules
        .lineup(5)
        .unwrap()
        .iter()
        .zip(StrategyKind::ALL)
        .map(|(&role, strategy)| Seat { role, strategy })
        .collect();

    let (_, trace) = Match::new(&rules, &seats, 17).unwrap().play_traced();

    let mut taken: BTreeMap<(u32, usize), u32> = BTreeMap::new();
    for event in trace.events() {
        if let (TraceKind::ActionTaken { .. }, Some(id)) = (&event.kind, event.participant) {
            *taken.entry((event.round, id)).or_insert(0) += 1;
        }
    }
    assert!(!taken.is_empty());
    for ((round, id), count) in taken {
        let seat = seats[id];
        let budget = rules.action_points_for(seat.role, seat.strategy);
        assert!(count <= budget, "P{} took {} actions in round {}", id, count, round);
    }
}

#[test]
fn test_balanced_merchant_trades() {
    let rules = Ruleset::standard();
    let (outcome, trace) = Match::new(&rules, &uniform(&rules, StrategyKind::Balanced, 3), 3)
        .unwrap()
        .play_traced();
    let merchant = outcome.results.iter().find(|r| r.role == Role::Merchant).unwrap();
    let trades = trace
        .for_participant(merchant.id)
        .filter(|e| matches!(&e.kind, TraceKind::ActionTaken { action, .. } if action == "trade"))
        .count();
    assert!(trades > 0);
}

#[test]
fn test_aggressive_spends_every_point() {
    // `work` is always available, so an aggressive seat never passes.
    let rules = Ruleset::standard();
    let (outcome, trace) = Match::new(&rules, &uniform(&rules, StrategyKind::Aggressive, 6), 21)
        .unwrap()
        .play_traced();
    assert!(!trace
        .events()
        .iter()
        .any(|e| matches!(e.kind, TraceKind::Passed { .. })));
    let taken = trace
        .events()
        .iter()
        .filter(|e| matches!(e.kind, TraceKind::ActionTaken { .. }))
        .count();
    let per_round: u32 = outcome
        .results
        .iter()
        .map(|r| rules.action_points_for(r.role, r.strategy))
        .sum();
    assert!(taken <= (per_round * outcome.rounds_played) as usize);
    assert!(taken > 0);
}

#[test]
fn test_random_strategy_is_reproducible() {
    let rules = Ruleset::standard();
    let seats = uniform(&rules, StrategyKind::Random, 5);
    let (a, trace_a) = Match::new(&rules, &seats, 555).unwrap().play_traced();
    let (b, trace_b) = Match::new(&rules, &seats, 555).unwrap().play_traced();
    assert_eq!(a.scores(), b.scores());
    let kinds_a: Vec<_> = trace_a.events().iter().map(|e| e.kind.clone()).collect();
    let kinds_b: Vec<_> = trace_b.events().iter().map(|e| e.kind.clone()).collect();
    assert_eq!(kinds_a, kinds_b);
}
