#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure damage and healing rules shared by every entity kind.

use rampart_core::AttackType;

/// Multiplier applied to raw damage by critical attacks before armor.
pub const CRITICAL_MULTIPLIER: u32 = 2;

/// Armor value at which physical damage is halved.
const ARMOR_SCALE: u64 = 100;

/// Incoming attack as seen by the resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Strike {
    /// Raw damage before armor and critical scaling.
    pub damage: u32,
    /// Classification of the attack.
    pub attack: AttackType,
}

/// Defensive state of the entity being hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Defender {
    /// Armor rating.
    pub armor: u32,
    /// Current health.
    pub health: u32,
}

/// Result of resolving a strike against a defender.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageOutcome {
    /// Final damage after armor.
    pub amount: u32,
    /// Whether the strike was critical.
    pub critical: bool,
    /// Whether the defender's health reaches zero.
    pub lethal: bool,
    /// Defender health after the strike, saturating at zero.
    pub remaining: u32,
}

/// Result of restoring health.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealOutcome {
    /// Health after the heal.
    pub health: u32,
    /// Health actually restored after clamping.
    pub restored: u32,
}

/// Resolves a strike against a defender.
///
/// Physical damage is scaled by `100 / (100 + armor)` and rounded to the
/// nearest integer; critical strikes double the raw damage first. True damage
/// ignores armor.
#[must_use]
pub fn resolve_damage(strike: Strike, defender: Defender) -> DamageOutcome {
    let critical = strike.attack == AttackType::Critical;
    let amount = match strike.attack {
        AttackType::True => strike.damage,
        AttackType::Normal => mitigate(strike.damage, defender.armor),
        AttackType::Critical => mitigate(
            strike.damage.saturating_mul(CRITICAL_MULTIPLIER),
            defender.armor,
        ),
    };
    let remaining = defender.health.saturating_sub(amount);
    DamageOutcome {
        amount,
        critical,
        lethal: remaining == 0,
        remaining,
    }
}

/// Restores up to `amount` health without exceeding `max_health`.
#[must_use]
pub fn resolve_heal(health: u32, max_health: u32, amount: u32) -> HealOutcome {
    let healed = health.saturating_add(amount).min(max_health).max(health);
    HealOutcome {
        health: healed,
        restored: healed - health,
    }
}

fn mitigate(raw: u32, armor: u32) -> u32 {
    let divisor = ARMOR_SCALE + u64::from(armor);
    let scaled = (u64::from(raw) * ARMOR_SCALE + divisor / 2) / divisor;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strike(damage: u32, attack: AttackType) -> Strike {
        Strike { damage, attack }
    }

    #[test]
    fn unarmored_defender_takes_raw_damage() {
        let outcome = resolve_damage(
            strike(10, AttackType::Normal),
            Defender {
                armor: 0,
                health: 10,
            },
        );
        assert_eq!(outcome.amount, 10);
        assert!(outcome.lethal);
        assert!(!outcome.critical);
    }

    #[test]
    fn armor_reduces_physical_damage() {
        let outcome = resolve_damage(
            strike(30, AttackType::Normal),
            Defender {
                armor: 50,
                health: 100,
            },
        );
        assert_eq!(outcome.amount, 20);
        assert_eq!(outcome.remaining, 80);
        assert!(!outcome.lethal);
    }

    #[test]
    fn mitigated_damage_rounds_to_nearest() {
        let outcome = resolve_damage(
            strike(10, AttackType::Normal),
            Defender {
                armor: 20,
                health: 100,
            },
        );
        assert_eq!(outcome.amount, 8);
    }

    #[test]
    fn critical_doubles_before_armor() {
        let outcome = resolve_damage(
            strike(15, AttackType::Critical),
            Defender {
                armor: 50,
                health: 100,
            },
        );
        assert_eq!(outcome.amount, 20);
        assert!(outcome.critical);
    }

    #[test]
    fn true_damage_ignores_armor() {
        let outcome = resolve_damage(
            strike(25, AttackType::True),
            Defender {
                armor: 400,
                health: 20,
            },
        );
        assert_eq!(outcome.amount, 25);
        assert_eq!(outcome.remaining, 0);
        assert!(outcome.lethal);
    }

    #[test]
    fn heals_clamp_at_max_health() {
        assert_eq!(
            resolve_heal(90, 100, 25),
            HealOutcome {
                health: 100,
                restored: 10,
            }
        );
        assert_eq!(
            resolve_heal(100, 100, 5),
            HealOutcome {
                health: 100,
                restored: 0,
            }
        );
    }
}
