use proptest::prelude::*;
use rampart_core::AttackType;
use rampart_system_combat::{resolve_damage, resolve_heal, Defender, Strike};

fn attack_strategy() -> impl Strategy<Value = AttackType> {
    prop_oneof![
        Just(AttackType::Normal),
        Just(AttackType::Critical),
        Just(AttackType::True),
    ]
}

proptest! {
    #[test]
    fn resolution_is_idempotent(
        damage in 0u32..10_000,
        armor in 0u32..1_000,
        health in 0u32..10_000,
        attack in attack_strategy(),
    ) {
        let strike = Strike { damage, attack };
        let defender = Defender { armor, health };
        prop_assert_eq!(resolve_damage(strike, defender), resolve_damage(strike, defender));
    }

    #[test]
    fn armor_never_increases_damage(
        damage in 0u32..10_000,
        armor in 0u32..1_000,
        attack in attack_strategy(),
    ) {
        let strike = Strike { damage, attack };
        let bare = resolve_damage(strike, Defender { armor: 0, health: u32::MAX });
        let armored = resolve_damage(strike, Defender { armor, health: u32::MAX });
        prop_assert!(armored.amount <= bare.amount);
    }

    #[test]
    fn lethal_matches_remaining_health(
        damage in 0u32..500,
        armor in 0u32..200,
        health in 0u32..500,
        attack in attack_strategy(),
    ) {
        let outcome = resolve_damage(Strike { damage, attack }, Defender { armor, health });
        prop_assert_eq!(outcome.lethal, outcome.remaining == 0);
        prop_assert_eq!(outcome.remaining, health.saturating_sub(outcome.amount));
    }

    #[test]
    fn heals_never_exceed_max_health(
        max_health in 1u32..1_000,
        missing in 0u32..1_000,
        amount in 0u32..2_000,
    ) {
        let health = max_health.saturating_sub(missing);
        let outcome = resolve_heal(health, max_health, amount);
        prop_assert!(outcome.health <= max_health);
        prop_assert_eq!(outcome.health - health, outcome.restored);
    }
}
