//! Scene generation for the demo.
//!
//! Builds a cluster of entities around a shared world origin so the
//! origin-relative point compression sees realistic input: positions a few
//! hundred units from the compression point, a mix of still and moving
//! entities, and object names that share long path-style prefixes.
//!
//! All randomness comes from a seeded ChaCha8 RNG; the same seed
//! reproduces the same scene and the same per-tick motion.

use bitwire_core::math::Point3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Number of class-group/class-type pairs the demo registry models.
pub const CLASS_COUNT: u32 = 40;

/// One replicated game object.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Registry id of the object's class
    pub class_id: u32,

    /// World position
    pub position: Point3,

    /// Velocity in units/second (zero for scenery)
    pub velocity: Point3,

    /// Facing direction, unit length
    pub facing: Point3,

    /// Path-style object name
    pub name: String,
}

/// A generated world plus the RNG that animates it.
pub struct Scene {
    /// Compression origin shared by writer and reader
    pub origin: Point3,

    /// Entities in snapshot order
    pub entities: Vec<Entity>,

    rng: ChaCha8Rng,
}

impl Scene {
    /// Generate a scene of `count` entities around a fixed origin.
    pub fn generate(seed: u64, count: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let origin = Point3::new(1024.0, 1024.0, 128.0);

        let teams = ["red", "blue"];
        let roles = ["keeper", "runner", "turret", "drone"];

        let entities = (0..count)
            .map(|i| {
                let position = origin
                    + Point3::new(
                        rng.gen_range(-400.0..400.0),
                        rng.gen_range(-400.0..400.0),
                        rng.gen_range(-40.0..40.0),
                    );

                // Roughly a third of the world stands still.
                let velocity = if rng.gen_bool(0.35) {
                    Point3::ZERO
                } else {
                    Point3::new(
                        rng.gen_range(-12.0..12.0),
                        rng.gen_range(-12.0..12.0),
                        rng.gen_range(-2.0..2.0),
                    )
                };

                let name = format!(
                    "arena/{}/{}{:03}",
                    teams[i % teams.len()],
                    roles[rng.gen_range(0..roles.len())],
                    i
                );

                Entity {
                    class_id: rng.gen_range(0..CLASS_COUNT),
                    position,
                    velocity,
                    facing: random_unit(&mut rng),
                    name,
                }
            })
            .collect();

        Self {
            origin,
            entities,
            rng,
        }
    }

    /// Advance the world one tick: integrate positions and occasionally
    /// turn a moving entity.
    pub fn tick(&mut self, dt: f32) {
        for entity in &mut self.entities {
            entity.position = entity.position + entity.velocity * dt;
            if entity.velocity.len() > 0.0 && self.rng.gen_bool(0.1) {
                entity.facing = random_unit(&mut self.rng);
            }
        }
    }
}

fn random_unit(rng: &mut ChaCha8Rng) -> Point3 {
    loop {
        let v = Point3::new(
            rng.gen_range(-1.0..1.0f32),
            rng.gen_range(-1.0..1.0f32),
            rng.gen_range(-1.0..1.0f32),
        );
        let len = v.len();
        if len > 1e-3 && len <= 1.0 {
            return v * (1.0 / len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_is_deterministic() {
        let a = Scene::generate(1234, 8);
        let b = Scene::generate(1234, 8);
        for (x, y) in a.entities.iter().zip(&b.entities) {
            assert_eq!(x.name, y.name);
            assert_eq!(x.position, y.position);
            assert_eq!(x.class_id, y.class_id);
        }
    }

    #[test]
    fn test_facing_is_unit_length() {
        let scene = Scene::generate(42, 16);
        for entity in &scene.entities {
            assert!((entity.facing.len() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_names_share_prefixes() {
        let scene = Scene::generate(7, 4);
        for entity in &scene.entities {
            assert!(entity.name.starts_with("arena/"));
            assert!(entity.name.len() <= 32);
        }
    }
}
