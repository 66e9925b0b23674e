#[cfg(test)]
mod tests {
    use super::super::core::{Participant, ResourceDelta, Resources};
    use super::super::events::*;
    use super::super::rules::{EventDef, EventTarget, Ruleset, Role, Surcharge};
    use super::super::strategies::{create_strategy, EventChoice, Strategy, StrategyKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn card(name: &str, copies: u32, target: EventTarget) -> EventDef {
        EventDef {
            name: name.to_string(),
            copies,
            target,
            accept: ResourceDelta {
                currency: -9,
                merit: 1,
                ..Default::default()
            },
            decline: ResourceDelta {
                influence: -1,
                ..Default::default()
            },
            surcharge: None,
        }
    }

    fn table(holdings: &[Resources]) -> Vec<Participant> {
        holdings
            .iter()
            .enumerate()
            .map(|(id, r)| {
                let mut p = Participant::new(
                    id,
                    Role::Merchant,
                    StrategyKind::Balanced,
                    &Resources::default(),
                );
                p.resources = *r;
                p
            })
            .collect()
    }

    fn balanced(n: usize) -> Vec<Box<dyn Strategy>> {
        (0..n).map(|_| create_strategy(StrategyKind::Balanced)).collect()
    }

    #[test]
    fn test_deck_expands_copies() {
        let catalog = vec![
            card("a", 3, EventTarget::Everyone),
            card("b", 0, EventTarget::Everyone),
            card("c", 2, EventTarget::Everyone),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut deck = build_deck(&catalog, &mut rng);
        assert_eq!(deck.remaining(), 5);

        let mut drawn = Vec::new();
        while let Some(i) = deck.draw() {
            drawn.push(i);
        }
        drawn.sort_unstable();
        assert_eq!(drawn, vec![0, 0, 0, 2, 2]);
        assert!(deck.is_empty());
        assert_eq!(deck.draw(), None);
    }

    #[test]
    fn test_zero_copy_catalog_builds_empty_deck() {
        let catalog = vec![card("a", 0, EventTarget::Everyone)];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(build_deck(&catalog, &mut rng).is_empty());
        assert!(build_deck(&[], &mut rng).is_empty());
    }

    #[test]
    fn test_deck_order_follows_seed() {
        let catalog = Ruleset::standard().events;
        let a = build_deck(&catalog, &mut ChaCha8Rng::seed_from_u64(42));
        let b = build_deck(&catalog, &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_targets_break_ties_by_lowest_id() {
        let players = table(&[
            Resources::new(5, 2, 3, 1),
            Resources::new(2, 1, 3, 2),
            Resources::new(2, 1, 1, 2),
        ]);
        assert_eq!(targets(EventTarget::Everyone, &players), vec![0, 1, 2]);
        assert_eq!(targets(EventTarget::LowestMerit, &players), vec![1]);
        assert_eq!(targets(EventTarget::LowestCurrency, &players), vec![1]);
        assert_eq!(targets(EventTarget::HighestInfluence, &players), vec![0]);
        assert_eq!(targets(EventTarget::MostTerritory, &players), vec![1]);
        assert!(targets(EventTarget::LowestMerit, &[]).is_empty());
    }

    #[test]
    fn test_apply_floors_and_records_event_source() {
        // Accept trades up to 3 points of currency for 2 of merit.
        let mut players = table(&[Resources::new(1, 0, 2, 0), Resources::new(9, 0, 0, 0)]);
        let strategies = balanced(2);
        let mut modifiers = RoundModifiers::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let effects = apply(
            &card("plague", 1, EventTarget::Everyone),
            &mut players,
            &strategies,
            &mut modifiers,
            &mut rng,
        );

        assert_eq!(effects.len(), 2);
        // Only one currency to lose, so accepting nets merit.
        assert_eq!(effects[0].choice, EventChoice::Accept);
        assert_eq!(players[0].resources, Resources::new(0, 1, 2, 0));
        // Accepting costs a net point; with no influence, declining is free.
        assert_eq!(effects[1].choice, EventChoice::Decline);
        assert_eq!(players[1].resources, Resources::new(9, 0, 0, 0));
        assert!((players[0].ledger.event - effects[0].entry.points).abs() < 1e-9);
        assert!(modifiers.is_empty());
    }

    #[test]
    fn test_surcharge_lasts_until_reset() {
        let rules = Ruleset::standard();
        let claim = &rules.actions[rules.action_id("claim_land").unwrap().0];
        let work = &rules.actions[rules.action_id("work").unwrap().0];

        let mut event = card("boom", 1, EventTarget::Everyone);
        event.surcharge = Some(Surcharge {
            action: Some("claim_land".to_string()),
            currency: 2,
        });
        let mut players = table(&[Resources::new(3, 0, 0, 0)]);
        let mut modifiers = RoundModifiers::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        apply(&event, &mut players, &balanced(1), &mut modifiers, &mut rng);

        assert_eq!(modifiers.effective_cost(claim).currency, claim.cost.currency + 2);
        assert_eq!(modifiers.effective_cost(work), work.cost);

        modifiers.push(Surcharge {
            action: None,
            currency: -5,
        });
        assert_eq!(modifiers.effective_cost(work).currency, 0);

        modifiers.reset();
        assert_eq!(modifiers.effective_cost(claim), claim.cost);
    }
}
