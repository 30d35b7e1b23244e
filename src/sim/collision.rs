//! Collision classification and damage mapping
//!
//! The physics step reports touching pairs with their total impulse. This
//! module turns each pair into gameplay effects; it never touches entities.
//! The simulation queues the effects and applies them once the step returns.

use super::body::{BodyTag, CollisionCategory, EntityId};
use crate::consts::{BLOCK_BIRD_DAMAGE_IMPULSE, MIN_DAMAGE_IMPULSE, PIG_BIRD_IMPULSE_TIMES, PIG_GROUND_DAMPING};

/// One touching pair after a physics step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactReport {
    pub a: BodyTag,
    pub b: BodyTag,
    /// Magnitude of the total impulse applied over the contact
    pub impulse: f32,
}

/// A queued consequence of a collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionEffect {
    /// Bird touched the ground: damp it (unless bounce-exempt) and mark it collided
    BirdHitGround { bird: EntityId },
    /// Bird touched something solid
    BirdCollided { bird: EntityId },
    DamagePig { pig: EntityId, amount: u32 },
    ScalePigVelocity { pig: EntityId, factor: f32 },
    DamageBlock { block: EntityId, amount: u32 },
    /// Egg hit something: start exploding and stop
    EggBurst { egg: EntityId },
}

/// Damage points for an impulse: one point per `MIN_DAMAGE_IMPULSE`
#[inline]
pub fn damage_from_impulse(impulse: f32) -> u32 {
    (impulse / MIN_DAMAGE_IMPULSE).floor().max(0.0) as u32
}

/// Direct bird hits are amplified and always hurt at least one point
#[inline]
pub fn pig_bird_damage(impulse: f32) -> u32 {
    damage_from_impulse(impulse * PIG_BIRD_IMPULSE_TIMES).max(1)
}

/// Map one contact to zero or more effects
pub fn classify(report: &ContactReport, out: &mut Vec<CollisionEffect>) {
    use CollisionCategory::*;

    let impulse = report.impulse;
    // Rules are written for one ordering; try both
    for (first, second) in [(report.a, report.b), (report.b, report.a)] {
        match (first.category, second.category) {
            (Bird, Ground) => {
                out.push(CollisionEffect::BirdHitGround { bird: first.id });
                return;
            }
            (Pig, Bird) => {
                out.push(CollisionEffect::DamagePig {
                    pig: first.id,
                    amount: pig_bird_damage(impulse),
                });
                return;
            }
            (Pig, Ground) => {
                out.push(CollisionEffect::ScalePigVelocity {
                    pig: first.id,
                    factor: PIG_GROUND_DAMPING,
                });
                let amount = damage_from_impulse(impulse);
                if amount > 0 {
                    out.push(CollisionEffect::DamagePig { pig: first.id, amount });
                }
                return;
            }
            (Pig, Block) => {
                if impulse >= MIN_DAMAGE_IMPULSE {
                    out.push(CollisionEffect::DamagePig {
                        pig: first.id,
                        amount: damage_from_impulse(impulse),
                    });
                }
                return;
            }
            (Block, Bird) => {
                out.push(CollisionEffect::BirdCollided { bird: second.id });
                if impulse >= BLOCK_BIRD_DAMAGE_IMPULSE {
                    out.push(CollisionEffect::DamageBlock {
                        block: first.id,
                        amount: damage_from_impulse(impulse),
                    });
                }
                return;
            }
            (Block, Fragment) => {
                if impulse > MIN_DAMAGE_IMPULSE {
                    out.push(CollisionEffect::DamageBlock {
                        block: first.id,
                        amount: damage_from_impulse(impulse),
                    });
                }
                return;
            }
            (Pig, Fragment) => {
                if impulse > MIN_DAMAGE_IMPULSE {
                    out.push(CollisionEffect::DamagePig {
                        pig: first.id,
                        amount: damage_from_impulse(impulse),
                    });
                }
                return;
            }
            (Egg, Ground | Block | Pig) => {
                out.push(CollisionEffect::EggBurst { egg: first.id });
                return;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(category: CollisionCategory, id: u32) -> BodyTag {
        BodyTag::new(category, EntityId(id))
    }

    fn effects(a: BodyTag, b: BodyTag, impulse: f32) -> Vec<CollisionEffect> {
        let mut out = Vec::new();
        classify(&ContactReport { a, b, impulse }, &mut out);
        out
    }

    #[test]
    fn damage_is_floored_per_threshold() {
        assert_eq!(damage_from_impulse(299.9), 0);
        assert_eq!(damage_from_impulse(300.0), 1);
        assert_eq!(damage_from_impulse(1250.0), 4);
    }

    #[test]
    fn bird_ground_either_order() {
        let bird = tag(CollisionCategory::Bird, 4);
        let ground = tag(CollisionCategory::Ground, 0);
        let expected = vec![CollisionEffect::BirdHitGround { bird: EntityId(4) }];
        assert_eq!(effects(bird, ground, 10.0), expected);
        assert_eq!(effects(ground, bird, 10.0), expected);
    }

    #[test]
    fn pig_bird_is_amplified_with_floor() {
        let pig = tag(CollisionCategory::Pig, 1);
        let bird = tag(CollisionCategory::Bird, 2);
        assert_eq!(
            effects(bird, pig, 1.0),
            vec![CollisionEffect::DamagePig { pig: EntityId(1), amount: 1 }]
        );
        assert_eq!(
            effects(pig, bird, 300.0),
            vec![CollisionEffect::DamagePig { pig: EntityId(1), amount: 10 }]
        );
    }

    #[test]
    fn pig_ground_damps_and_damages() {
        let pig = tag(CollisionCategory::Pig, 1);
        let ground = tag(CollisionCategory::Ground, 0);
        assert_eq!(
            effects(pig, ground, 650.0),
            vec![
                CollisionEffect::ScalePigVelocity { pig: EntityId(1), factor: 0.8 },
                CollisionEffect::DamagePig { pig: EntityId(1), amount: 2 },
            ]
        );
        // Resting contact only damps
        assert_eq!(
            effects(pig, ground, 7.0),
            vec![CollisionEffect::ScalePigVelocity { pig: EntityId(1), factor: 0.8 }]
        );
    }

    #[test]
    fn small_bumps_do_not_damage() {
        let pig = tag(CollisionCategory::Pig, 1);
        let block = tag(CollisionCategory::Block, 2);
        let fragment = tag(CollisionCategory::Fragment, 3);
        for impulse in [0.5, 100.0, 299.0] {
            assert!(effects(pig, block, impulse).is_empty());
            assert!(effects(fragment, block, impulse).is_empty());
            assert!(effects(pig, fragment, impulse).is_empty());
        }
        // Fragments need strictly more than the threshold
        assert!(effects(fragment, block, 300.0).is_empty());
        assert_eq!(effects(block, pig, 300.0).len(), 1);
    }

    #[test]
    fn block_bird_marks_collided_and_needs_hard_hit() {
        let block = tag(CollisionCategory::Block, 7);
        let bird = tag(CollisionCategory::Bird, 8);
        assert_eq!(
            effects(bird, block, 1000.0),
            vec![CollisionEffect::BirdCollided { bird: EntityId(8) }]
        );
        assert_eq!(
            effects(block, bird, 1200.0),
            vec![
                CollisionEffect::BirdCollided { bird: EntityId(8) },
                CollisionEffect::DamageBlock { block: EntityId(7), amount: 4 },
            ]
        );
    }

    #[test]
    fn egg_bursts_on_ground_block_and_pig() {
        let egg = tag(CollisionCategory::Egg, 5);
        for other in [
            tag(CollisionCategory::Ground, 0),
            tag(CollisionCategory::Block, 1),
            tag(CollisionCategory::Pig, 2),
        ] {
            assert_eq!(
                effects(other, egg, 1.0),
                vec![CollisionEffect::EggBurst { egg: EntityId(5) }]
            );
        }
        assert!(effects(egg, tag(CollisionCategory::Bird, 9), 1.0).is_empty());
    }

    #[test]
    fn unhandled_pairs_are_ignored() {
        let block_a = tag(CollisionCategory::Block, 1);
        let block_b = tag(CollisionCategory::Block, 2);
        assert!(effects(block_a, block_b, 5000.0).is_empty());
    }
}
