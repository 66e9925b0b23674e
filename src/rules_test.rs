#[cfg(test)]
mod tests {
    use super::super::rules::*;
    use super::super::strategies::StrategyKind;
    use rust_decimal_macros::dec;

    const FRONTIER: &str = include_str!("../rulesets/frontier.yaml");

    fn frontier() -> Ruleset {
        Ruleset::from_yaml_str(FRONTIER).unwrap()
    }

    #[test]
    fn test_builtins_validate() {
        for name in Ruleset::builtin_names() {
            let rules = Ruleset::by_name(name).unwrap();
            assert_eq!(&rules.name, name);
            assert!(rules.validate().is_ok(), "{}", name);
        }
        assert!(Ruleset::by_name("chess").is_none());
    }

    #[test]
    fn test_standard_lineups() {
        let rules = Ruleset::standard();
        assert_eq!(rules.supported_counts(), vec![3, 4, 5, 6, 7]);
        assert_eq!(
            rules.lineup(3).unwrap(),
            &[Role::Merchant, Role::Scholar, Role::Priest]
        );
        assert_eq!(rules.lineup(7).unwrap().len(), 7);
        assert_eq!(
            rules.lineup(2),
            Err(RuleError::UnsupportedPlayerCount {
                players: 2,
                supported: vec![3, 4, 5, 6, 7]
            })
        );
    }

    #[test]
    fn test_fixture_loads() {
        let rules = frontier();
        assert!(rules.validate().is_ok());
        assert_eq!(rules.version, 2);
        assert_eq!(rules.supported_counts(), vec![3, 4, 5]);
        assert_eq!(rules.role(Role::Soldier).unwrap().action_points, 1);
        assert_eq!(rules.events.iter().map(|e| e.copies).sum::<u32>(), 6);
        assert_eq!(rules.events[1].target, EventTarget::MostTerritory);
        assert!(rules.actions[rules.action_id("muster").unwrap().0].requires_small_path);
        assert_eq!(
            rules.role(Role::Priest).unwrap().path.full[0],
            Threshold::distinct("converts", 4)
        );
    }

    #[test]
    fn test_bonus_multiplier() {
        let rules = Ruleset::standard();
        assert_eq!(rules.bonus_multiplier(3), dec!(1.2));
        assert_eq!(rules.bonus_multiplier(5), dec!(1.0));
        assert_eq!(rules.bonus_multiplier(7), dec!(0.9));

        let mut single = Ruleset::standard();
        single.lineups.retain(|l| l.players == 4);
        assert_eq!(single.bonus_multiplier(4), dec!(1.0));
    }

    #[test]
    fn test_scaled_path_rounds_half_away_from_zero() {
        let rules = frontier();
        // 5 * 0.9 = 4.5, 12 * 0.9 = 10.8
        let path = rules.path_for(Role::Farmer, 5).unwrap();
        assert_eq!(path.small_bonus, 5);
        assert_eq!(path.full_bonus, 11);
        // 5 * 1.2 = 6, 12 * 1.2 = 14.4
        let path = rules.path_for(Role::Farmer, 3).unwrap();
        assert_eq!(path.small_bonus, 6);
        assert_eq!(path.full_bonus, 14);
        // Thresholds are never scaled.
        assert_eq!(path.small, rules.role(Role::Farmer).unwrap().path.small);

        let standard = Ruleset::standard();
        assert_eq!(standard.path_for(Role::Merchant, 7).unwrap().full_bonus, 13);
    }

    #[test]
    fn test_action_points() {
        let rules = frontier();
        assert_eq!(rules.action_points_for(Role::Farmer, StrategyKind::Balanced), 2);
        assert_eq!(rules.action_points_for(Role::Soldier, StrategyKind::Balanced), 3);
        assert_eq!(rules.action_points_for(Role::Soldier, StrategyKind::Opportunistic), 2);

        let mut stingy = frontier();
        stingy.base_action_points = 0;
        assert_eq!(stingy.action_points_for(Role::Farmer, StrategyKind::Opportunistic), 0);
    }

    #[test]
    fn test_upkeep_schedule() {
        let upkeep = frontier().upkeep;
        assert!(!upkeep.due(1));
        assert!(upkeep.due(3));
        assert!(upkeep.due(9));
        assert_eq!(upkeep.charge(4), 4);
        assert!(!Upkeep::default().due(4));
    }

    #[test]
    fn test_validation_errors() {
        let mut rules = Ruleset::standard();
        rules.rounds = 0;
        assert_eq!(rules.validate(), Err(RuleError::NoRounds));

        let mut rules = Ruleset::standard();
        rules.lineups.clear();
        assert_eq!(rules.validate(), Err(RuleError::NoLineups));

        let mut rules = Ruleset::standard();
        rules.lineups[0].roles.pop();
        assert_eq!(
            rules.validate(),
            Err(RuleError::LineupSize { players: 3, roles: 2 })
        );

        let mut rules = frontier();
        rules.roles.retain(|r| r.role != Role::Priest);
        assert_eq!(
            rules.validate(),
            Err(RuleError::MissingRole {
                players: 5,
                role: Role::Priest
            })
        );

        let mut rules = Ruleset::standard();
        let copy = rules.roles[0].clone();
        rules.roles.push(copy);
        assert_eq!(rules.validate(), Err(RuleError::DuplicateRole(Role::Merchant)));

        let mut rules = Ruleset::standard();
        let copy = rules.actions[1].clone();
        rules.actions.push(copy);
        assert_eq!(
            rules.validate(),
            Err(RuleError::DuplicateAction("trade".to_string()))
        );

        let mut rules = Ruleset::standard();
        rules.roles[0].weights.insert("juggle".to_string(), 3);
        assert!(matches!(
            rules.validate(),
            Err(RuleError::UnknownAction { action, .. }) if action == "juggle"
        ));

        let mut rules = Ruleset::standard();
        rules.events[0].surcharge = Some(Surcharge {
            action: Some("juggle".to_string()),
            currency: 1,
        });
        assert!(matches!(rules.validate(), Err(RuleError::UnknownAction { .. })));
    }

    #[test]
    fn test_full_path_must_be_stricter() {
        let mut rules = Ruleset::standard();
        let noble = rules.roles.iter_mut().find(|r| r.role == Role::Noble).unwrap();
        noble.path.full[0].at_least = 5;
        assert_eq!(rules.validate(), Err(RuleError::PathNotMonotonic(Role::Noble)));

        assert!(at_least_as_strict(&[], &[]));
        assert!(!at_least_as_strict(&[], &[Threshold::new(Metric::Merit, 1)]));
        assert!(at_least_as_strict(
            &[Threshold::counter("trades", 6), Threshold::new(Metric::Currency, 15)],
            &[Threshold::counter("trades", 3)]
        ));
        assert!(!at_least_as_strict(
            &[Threshold::counter("studies", 6)],
            &[Threshold::counter("trades", 3)]
        ));
    }

    #[test]
    fn test_yaml_and_json_files() {
        let rules = Ruleset::standard();
        let yaml = rules.to_yaml().unwrap();
        assert_eq!(Ruleset::from_yaml_str(&yaml).unwrap(), rules);

        let dir = std::env::temp_dir();
        let json_path = dir.join(format!("balance-sim-rules-{}.json", std::process::id()));
        rules.save_to_file(&json_path).unwrap();
        let loaded = Ruleset::load_from_file(&json_path).unwrap();
        std::fs::remove_file(&json_path).ok();
        assert_eq!(loaded, rules);

        let bad_path = dir.join(format!("balance-sim-bad-{}.yaml", std::process::id()));
        let mut bad = rules.clone();
        bad.rounds = 0;
        bad.save_to_file(&bad_path).unwrap();
        let err = Ruleset::load_from_file(&bad_path).unwrap_err();
        std::fs::remove_file(&bad_path).ok();
        assert!(err.contains("at least one round"));
    }

    #[test]
    fn test_ruleset_display() {
        let display = format!("{}", Ruleset::standard());
        assert!(display.contains("Ruleset: standard (v1)"));
        assert!(display.contains("merchant (Merchant Prince)"));
        assert!(display.contains("distinct beneficiaries >= 2"));
        assert!(display.contains("Full path (+14): trades >= 6, currency >= 15"));
        assert!(display.contains("Small path (+7): times_donated >= 2, distinct beneficiaries"));
        assert!(display.contains("Tax Levy x2"));
    }
}
