//! Per-worker step body, run between the two barriers. Pure function over
//! whatever particle slice the caller hands it — the caller (coordinator)
//! decides whether that slice is a private mirror or (for worker 0) the
//! shared array itself.

use crate::arena::Arena;
use crate::particle::ParticleSlice;
use crate::particle::Particle;
use crate::tree::ParticleTree;

#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    pub id: usize,
    pub slice: ParticleSlice,
    pub theta: f64,
    pub dt: f64,
}

/// Runs the Barnes–Hut force evaluation and semi-implicit Euler integration
/// over `slice` (already positioned at this worker's owned range — indices
/// here are 0-based within the slice, not absolute array indices).
///
/// Returns `sqrt(max ||pos||^2)` over the slice, this worker's contribution
/// to the next step's bounding radius.
pub fn step(cfg: &WorkerConfig, tree: &ParticleTree, arena: &Arena, slice: &mut [Particle]) -> f64 {
    let mut max_dist_sq: f64 = 0.0;
    for p in slice.iter_mut() {
        let force = tree.force_on(arena, p.point_mass(), cfg.theta);
        p.vel += force * (cfg.dt / p.mass);
        p.pos += p.vel * cfg.dt;
        max_dist_sq = max_dist_sq.max(p.pos.length_sq());
    }
    max_dist_sq.sqrt()
}

/// Refreshes the non-owned portion of `mirror` (everything outside
/// `cfg.slice`) from `shared_snapshot`, called after barrier₂. Not used by
/// worker 0, which has no mirror.
pub fn refresh_mirror(cfg: &WorkerConfig, shared_snapshot: &[Particle], mirror: &mut [Particle]) {
    mirror[..cfg.slice.offset].copy_from_slice(&shared_snapshot[..cfg.slice.offset]);
    let end = cfg.slice.end();
    mirror[end..].copy_from_slice(&shared_snapshot[end..]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::octant::Octant;
    use crate::vector::Vec3;

    #[test]
    fn refresh_mirror_leaves_own_slice_untouched() {
        let cfg = WorkerConfig {
            id: 1,
            slice: ParticleSlice::new(2, 3),
            theta: 0.5,
            dt: 0.01,
        };
        let shared_snapshot: Vec<Particle> = (0..10)
            .map(|i| Particle::new(Vec3::new(i as f64, 0.0, 0.0), 1.0, Vec3::ZERO))
            .collect();
        let mut mirror = vec![Particle::new(Vec3::new(999.0, 0.0, 0.0), 1.0, Vec3::ZERO); 10];
        refresh_mirror(&cfg, &shared_snapshot, &mut mirror);

        assert_eq!(mirror[0].pos.x, 0.0);
        assert_eq!(mirror[2].pos.x, 999.0);
        assert_eq!(mirror[4].pos.x, 999.0);
        assert_eq!(mirror[5].pos.x, 5.0);
    }

    #[test]
    fn step_with_no_forces_holds_position_for_single_particle() {
        let mut arena = Arena::with_capacity(16 * std::mem::size_of::<Octant>()).unwrap();
        let particles = vec![Particle::new(Vec3::new(5.0, 0.0, 0.0), 1.0, Vec3::ZERO)];
        let tree = ParticleTree::build(&particles, 100.0, &mut arena).unwrap();
        let cfg = WorkerConfig {
            id: 0,
            slice: ParticleSlice::new(0, 1),
            theta: 0.5,
            dt: 0.01,
        };
        let mut slice = particles.clone();
        let radius = step(&cfg, &tree, &arena, &mut slice);
        assert_eq!(slice[0].pos, particles[0].pos);
        assert!((radius - 5.0).abs() < 1e-9);
    }
}
