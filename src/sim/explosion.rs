//! Explosion fragments
//!
//! A blast is a ring of small fast bodies. Each fragment is removed once it
//! has travelled its limit; the whole set is cleared a fixed time after the
//! first batch spawned into an empty set.

use std::f32::consts::TAU;

use glam::Vec2;

use super::body::{
    BodyDesc, BodyShape, BodyTag, CollisionCategory, EntityId, IdSource, PhysicsBinding,
    PhysicsWorld,
};
use crate::consts::{EXPLOSION_LIFETIME_MS, FRAGMENT_COUNT, FRAGMENT_IMPULSE_PER_MASS, FRAGMENT_RADIUS};

/// Parameters of one blast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blast {
    /// World position
    pub center: Vec2,
    pub radius: f32,
    /// Distance a fragment may fly before it is removed
    pub travel_limit: f32,
    pub fragment_mass: f32,
}

#[derive(Debug, Clone)]
pub struct Fragment {
    pub id: EntityId,
    /// Spawn point (world)
    pub origin: Vec2,
    /// Last synced position (world)
    pub position: Vec2,
    pub travel_limit: f32,
    binding: PhysicsBinding,
}

impl Fragment {
    pub fn travelled(&self) -> f32 {
        crate::distance(self.origin, self.position)
    }

    pub fn is_spent(&self) -> bool {
        self.travelled() >= self.travel_limit
    }

    pub fn binding(&self) -> PhysicsBinding {
        self.binding
    }
}

/// Spawn points and launch velocities for one blast.
///
/// Fragments sit evenly on a circle of `radius` around `center` and fly
/// straight outward.
pub fn ring(center: Vec2, radius: f32, mass: f32) -> impl Iterator<Item = (Vec2, Vec2)> {
    (0..FRAGMENT_COUNT).map(move |i| {
        let direction = Vec2::from_angle(i as f32 * TAU / FRAGMENT_COUNT as f32);
        let position = center + direction * radius;
        let impulse = crate::unit_vector(position - center) * FRAGMENT_IMPULSE_PER_MASS * mass;
        (position, impulse)
    })
}

/// Live fragments plus the batch timer
#[derive(Debug, Clone, Default)]
pub struct Explosions {
    fragments: Vec<Fragment>,
    started: Option<u64>,
}

impl Explosions {
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Create one blast's fragments in the world
    pub fn spawn(&mut self, world: &mut PhysicsWorld, ids: &mut IdSource, blast: Blast, now: u64) {
        if self.fragments.is_empty() {
            self.started = Some(now);
        }
        let mass = blast.fragment_mass;
        for (position, impulse) in ring(blast.center, blast.radius, mass) {
            let id = ids.next_id();
            let desc = BodyDesc::new(BodyShape::Ball { radius: FRAGMENT_RADIUS }, mass, position)
                .with_impulse(impulse)
                .with_gravity_scale(0.0);
            let binding = world.create_body(BodyTag::new(CollisionCategory::Fragment, id), &desc);
            self.fragments.push(Fragment {
                id,
                origin: position,
                position,
                travel_limit: blast.travel_limit,
                binding,
            });
        }
        log::debug!(
            "explosion at {} radius {} ({} fragments live)",
            blast.center,
            blast.radius,
            self.fragments.len()
        );
    }

    /// Sync positions, then drop spent fragments and expired batches.
    /// Returns how many were removed.
    pub fn prune(&mut self, world: &mut PhysicsWorld, now: u64) -> usize {
        for fragment in &mut self.fragments {
            fragment.position = world.position(fragment.binding);
        }

        let expired = self
            .started
            .is_some_and(|t| now.saturating_sub(t) > EXPLOSION_LIFETIME_MS);
        let before = self.fragments.len();
        self.fragments.retain(|fragment| {
            let keep = !expired && !fragment.is_spent();
            if !keep {
                world.remove(fragment.binding);
            }
            keep
        });
        if self.fragments.is_empty() {
            self.started = None;
        }
        before - self.fragments.len()
    }

    /// Remove everything from the world
    pub fn clear(&mut self, world: &mut PhysicsWorld) {
        for fragment in self.fragments.drain(..) {
            world.remove(fragment.binding);
        }
        self.started = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blast(x: f32, radius: f32, travel_limit: f32) -> Blast {
        Blast {
            center: Vec2::new(x, 300.0),
            radius,
            travel_limit,
            fragment_mass: 5.0,
        }
    }

    #[test]
    fn ring_is_evenly_spaced_and_outward() {
        let center = Vec2::new(500.0, 100.0);
        let shots: Vec<_> = ring(center, 18.0, 5.0).collect();
        assert_eq!(shots.len(), 12);
        for (position, impulse) in &shots {
            assert!((crate::distance(center, *position) - 18.0).abs() < 1e-3);
            assert!((impulse.length() - 4000.0).abs() < 1e-2);
            // Impulse points away from the center
            assert!(impulse.dot(*position - center) > 0.0);
        }
        // 30 degrees between neighbors
        let a = shots[0].0 - center;
        let b = shots[1].0 - center;
        assert!((a.angle_to(b) - TAU / 12.0).abs() < 1e-4);
    }

    #[test]
    fn fragments_expire_after_travel_limit() {
        let mut world = PhysicsWorld::new(700.0, 0.002);
        let mut ids = IdSource::default();
        let mut explosions = Explosions::default();
        explosions.spawn(&mut world, &mut ids, blast(600.0, 18.0, 60.0), 0);
        assert_eq!(explosions.fragments().len(), 12);
        assert_eq!(world.body_count(), 12);

        // 800 px/s for 50 ms is 40 px: still live
        for _ in 0..25 {
            world.step();
        }
        assert_eq!(explosions.prune(&mut world, 50), 0);

        // 100 ms is 80 px: past the limit
        for _ in 0..25 {
            world.step();
        }
        assert_eq!(explosions.prune(&mut world, 100), 12);
        assert!(explosions.is_empty());
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn whole_set_cleared_after_lifetime() {
        let mut world = PhysicsWorld::new(700.0, 0.002);
        let mut ids = IdSource::default();
        let mut explosions = Explosions::default();
        explosions.spawn(&mut world, &mut ids, blast(100.0, 10.0, 1e6), 0);
        // A second blast joins the running batch without resetting its clock
        explosions.spawn(&mut world, &mut ids, blast(300.0, 10.0, 1e6), 900);
        assert_eq!(explosions.prune(&mut world, 1000), 0);
        assert_eq!(explosions.prune(&mut world, 1001), 24);
        assert_eq!(world.body_count(), 0);
    }
}
