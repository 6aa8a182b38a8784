//! Status effects (bleed, poison, stun).
//!
//! Effects are ticked at the start of their owner's turn. Re-applying an
//! effect refreshes it: duration and magnitude each become the larger of
//! the old and new values. Nothing stacks additively.

use serde::{Deserialize, Serialize};

use crate::constants::{BLEED_TICK_RATIO, POISON_TICK_RATIO};

/// Status effect kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Bleed,
    Poison,
    Stun,
}

impl StatusKind {
    pub fn label(&self) -> &'static str {
        match self {
            StatusKind::Bleed => "bleed",
            StatusKind::Poison => "poison",
            StatusKind::Stun => "stun",
        }
    }

    /// Damage for one tick against an owner with `max_hp`
    pub fn tick_damage(&self, magnitude: f64, max_hp: i32) -> i32 {
        let ratio = match self {
            StatusKind::Bleed => BLEED_TICK_RATIO,
            StatusKind::Poison => POISON_TICK_RATIO,
            StatusKind::Stun => return 0,
        };
        (magnitude * max_hp as f64 * ratio).floor().max(0.0) as i32
    }
}

/// A single active effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub magnitude: f64,
    /// Turns remaining
    pub duration: i32,
}

impl StatusEffect {
    pub fn new(kind: StatusKind, magnitude: f64, duration: i32) -> Self {
        Self {
            kind,
            magnitude,
            duration,
        }
    }

    pub fn stun(duration: i32) -> Self {
        Self::new(StatusKind::Stun, 1.0, duration)
    }
}

/// What happened during one start-of-turn tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusTick {
    pub damage: i32,
    pub expired: Vec<StatusKind>,
    pub messages: Vec<String>,
    /// Owner reached 0 hp from damage over time
    pub defeated: bool,
}

/// Active effects on one combatant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    pub effects: Vec<StatusEffect>,
}

impl StatusEffects {
    /// Apply or refresh. A refresh never shortens the remaining duration.
    pub fn apply(&mut self, effect: StatusEffect) {
        if let Some(existing) = self.effects.iter_mut().find(|e| e.kind == effect.kind) {
            existing.duration = existing.duration.max(effect.duration);
            existing.magnitude = existing.magnitude.max(effect.magnitude);
        } else {
            self.effects.push(effect);
        }
    }

    pub fn has(&self, kind: StatusKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn get(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.kind == kind)
    }

    /// Checked by the caller after ticking, before letting the owner act
    pub fn is_stunned(&self) -> bool {
        self.has(StatusKind::Stun)
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    /// Start-of-turn processing. `hp` is mutated and clamped at 0.
    pub fn tick(&mut self, hp: &mut i32, max_hp: i32, owner: &str) -> StatusTick {
        let mut report = StatusTick::default();

        self.effects.retain(|effect| {
            if effect.duration <= 0 {
                report.expired.push(effect.kind);
                report
                    .messages
                    .push(format!("{owner}'s {} wore off.", effect.kind.label()));
                false
            } else {
                true
            }
        });

        for effect in &mut self.effects {
            let damage = effect.kind.tick_damage(effect.magnitude, max_hp);
            if damage > 0 && !report.defeated {
                *hp = (*hp - damage).max(0);
                report.damage += damage;
                report.messages.push(format!(
                    "{owner} takes {damage} {} damage.",
                    effect.kind.label()
                ));
                if *hp == 0 {
                    report.defeated = true;
                }
            }
            effect.duration -= 1;
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_extends_duration_and_keeps_max_magnitude() {
        let mut fx = StatusEffects::default();
        fx.apply(StatusEffect::new(StatusKind::Bleed, 3.0, 2));
        fx.apply(StatusEffect::new(StatusKind::Bleed, 1.0, 5));
        assert_eq!(fx.effects.len(), 1);
        let bleed = fx.get(StatusKind::Bleed).unwrap();
        assert_eq!(bleed.duration, 5);
        assert_eq!(bleed.magnitude, 3.0);
    }

    #[test]
    fn test_weaker_refresh_never_shortens() {
        let mut fx = StatusEffects::default();
        fx.apply(StatusEffect::new(StatusKind::Bleed, 3.0, 5));
        fx.apply(StatusEffect::new(StatusKind::Bleed, 1.0, 2));
        let bleed = fx.get(StatusKind::Bleed).unwrap();
        assert_eq!(bleed.duration, 5);
        assert_eq!(bleed.magnitude, 3.0);

        fx.apply(StatusEffect::stun(1));
        fx.apply(StatusEffect::stun(3));
        fx.apply(StatusEffect::stun(1));
        assert_eq!(fx.get(StatusKind::Stun).map(|e| e.duration), Some(3));
    }

    #[test]
    fn test_bleed_and_poison_tick_damage() {
        assert_eq!(StatusKind::Bleed.tick_damage(2.0, 200), 4);
        assert_eq!(StatusKind::Poison.tick_damage(2.0, 200), 2);
        assert_eq!(StatusKind::Poison.tick_damage(1.0, 150), 0);
        assert_eq!(StatusKind::Stun.tick_damage(9.0, 1000), 0);
    }

    #[test]
    fn test_tick_decrements_then_expires() {
        let mut fx = StatusEffects::default();
        fx.apply(StatusEffect::new(StatusKind::Bleed, 5.0, 2));
        let mut hp = 100;

        let first = fx.tick(&mut hp, 100, "Goblin");
        assert_eq!(first.damage, 5);
        assert_eq!(hp, 95);
        let second = fx.tick(&mut hp, 100, "Goblin");
        assert_eq!(second.damage, 5);
        let third = fx.tick(&mut hp, 100, "Goblin");
        assert_eq!(third.damage, 0);
        assert_eq!(third.expired, vec![StatusKind::Bleed]);
        assert!(fx.effects.is_empty());
        assert_eq!(hp, 90);
    }

    #[test]
    fn test_stun_skips_exactly_duration_turns() {
        let mut fx = StatusEffects::default();
        fx.apply(StatusEffect::stun(2));
        let mut hp = 10;
        let mut skipped = 0;
        for _ in 0..5 {
            fx.tick(&mut hp, 10, "Player");
            if fx.is_stunned() {
                skipped += 1;
            }
        }
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_dot_defeat_clamps_at_zero() {
        let mut fx = StatusEffects::default();
        fx.apply(StatusEffect::new(StatusKind::Bleed, 50.0, 3));
        let mut hp = 7;
        let tick = fx.tick(&mut hp, 100, "Bat");
        assert!(tick.defeated);
        assert_eq!(hp, 0);
    }
}
