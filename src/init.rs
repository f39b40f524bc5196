//! Random initial particle distribution, grounded on the teacher's
//! `disc_init` pattern (rejection-sample a disc, extended here to a solid
//! sphere for 3 dimensions, with `flat` flattening it back to 2D).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::particle::Particle;
use crate::vector::Vec3;

/// Builds `config.particles` particles, each at `config.max_mass`, placed
/// uniformly at random within a sphere of radius `config.radius` (or the
/// z = 0 disc, if `config.flat`), with zero initial velocity.
pub fn random_particles(config: &Config) -> Vec<Particle> {
    let mut rng = seeded_rng(config.seed);

    (0..config.particles)
        .map(|_| {
            let pos = sample_in_sphere(&mut rng, config.radius, config.flat);
            Particle::new(pos, config.max_mass, Vec3::ZERO)
        })
        .collect()
}

fn seeded_rng(seed: u64) -> StdRng {
    if seed == 0 {
        StdRng::from_entropy()
    } else {
        StdRng::seed_from_u64(seed)
    }
}

/// Rejection-samples a point uniformly inside a sphere (or disc, if `flat`)
/// of the given radius by drawing from the bounding cube/square and
/// retrying on misses.
fn sample_in_sphere(rng: &mut StdRng, radius: f64, flat: bool) -> Vec3 {
    loop {
        let x = rng.gen_range(-radius..=radius);
        let y = rng.gen_range(-radius..=radius);
        let z = if flat { 0.0 } else { rng.gen_range(-radius..=radius) };
        let candidate = Vec3::new(x, y, z);
        if candidate.length_sq() <= radius * radius {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            steps: 1,
            particles: 200,
            max_mass: 3.0,
            radius: 50.0,
            theta: 0.5,
            dt: 0.01,
            threads: 1,
            seed: 42,
            delay: 0,
            optimize: false,
            flat: false,
            verbose: false,
            render: false,
            arena_bytes: 1 << 20,
        }
    }

    #[test]
    fn every_particle_gets_configured_mass() {
        let config = base_config();
        let particles = random_particles(&config);
        assert_eq!(particles.len(), 200);
        assert!(particles.iter().all(|p| p.mass == 3.0));
    }

    #[test]
    fn particles_stay_within_radius() {
        let config = base_config();
        let particles = random_particles(&config);
        assert!(particles.iter().all(|p| p.pos.length() <= config.radius + 1e-9));
    }

    #[test]
    fn flat_constrains_to_z_zero() {
        let mut config = base_config();
        config.flat = true;
        let particles = random_particles(&config);
        assert!(particles.iter().all(|p| p.pos.z == 0.0));
    }

    #[test]
    fn same_seed_is_deterministic() {
        let config = base_config();
        let a = random_particles(&config);
        let b = random_particles(&config);
        for (pa, pb) in a.iter().zip(b.iter()) {
            assert_eq!(pa.pos, pb.pos);
        }
    }
}
