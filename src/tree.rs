//! Octree build, center recomputation, and Barnes–Hut force evaluation.
//! Generalizes `insert_quadrant` / `center_of_mass` / `calc_force` from
//! `barnes-hut/phys.c` to three dimensions over the arena-backed [`Octant`]s.

use crate::arena::{Arena, Handle};
use crate::error::Error;
use crate::octant::{Cube, Octant};
use crate::particle::{Particle, PointMass};
use crate::vector::Vec3;

/// Newtonian gravitational constant, matching the original source's
/// hardcoded value rather than a more precise modern CODATA figure.
pub const G: f64 = 6.6726e-11;

/// Minimum pairwise distance used in `gforce`'s denominator, preventing
/// singular forces between near-coincident particles.
pub const D_MIN: f64 = 2.0;

/// Pairwise gravitational force exerted on `p0` by `p1`.
pub fn gforce(p0: PointMass, p1: PointMass) -> Vec3 {
    if p0.pos.approx_eq(p1.pos) {
        return Vec3::ZERO;
    }
    let delta = p1.pos - p0.pos;
    let d = delta.length().max(D_MIN);
    delta * (G * p0.mass * p1.mass / (d * d * d))
}

/// A handle to the root octant of one step's tree. The arena backing it is
/// rebuilt from scratch every step; handles from a prior build must never
/// be resolved against a post-reset arena.
pub struct ParticleTree {
    pub root: Handle,
    pub node_count: u32,
}

impl ParticleTree {
    /// Builds a fresh tree over `particles`, rooted at a cube of half-width
    /// `radius` centered on the origin. `arena` is assumed freshly reset.
    pub fn build(particles: &[Particle], radius: f64, arena: &mut Arena) -> Result<Self, Error> {
        assert!(!particles.is_empty());

        let cube = Cube::new(-radius, -radius, -radius, 2.0 * radius);
        let root = arena.alloc(Octant::new_leaf(particles[0].point_mass(), cube))?;

        for p in &particles[1..] {
            insert(arena, root, p.point_mass())?;
        }

        update_center(arena, root);

        Ok(Self {
            root,
            node_count: arena.len(),
        })
    }

    /// Accumulates the Barnes–Hut approximated force on `p` into `out`.
    pub fn force_on(&self, arena: &Arena, p: PointMass, theta: f64) -> Vec3 {
        force_accumulate(arena, self.root, p, theta)
    }
}

/// Inserts `p` into the subtree rooted at `node`, per the absorption /
/// promotion rule in the octree build design.
fn insert(arena: &mut Arena, node: Handle, p: PointMass) -> Result<(), Error> {
    let octant = *arena.get(node);

    if octant.is_leaf() {
        let half_exhausted = octant.cube.len / 2.0 <= crate::vector::EPS;
        if octant.center.pos.approx_eq(p.pos) || half_exhausted {
            arena.get_mut(node).center.mass += p.mass;
            return Ok(());
        }

        // Promote to internal: re-home the existing occupant first.
        let existing = octant.center;
        arena.get_mut(node).bodies = 2;
        insert_into_child(arena, node, existing)?;
        arena.get_mut(node).center.mass += p.mass;
        insert_into_child(arena, node, p)?;
        return Ok(());
    }

    arena.get_mut(node).center.mass += p.mass;
    arena.get_mut(node).bodies += 1;
    insert_into_child(arena, node, p)
}

fn insert_into_child(arena: &mut Arena, node: Handle, p: PointMass) -> Result<(), Error> {
    let octant = *arena.get(node);
    let (index, sub_cube) = octant.cube.child_for(p.pos);
    let child = octant.children[index];

    if child.is_none() {
        let leaf = arena.alloc(Octant::new_leaf(p, sub_cube))?;
        arena.get_mut(node).children[index] = leaf;
        Ok(())
    } else {
        insert(arena, child, p)
    }
}

/// Post-order recomputation of mass-weighted centroids. Returns the
/// subtree's mass-weighted position sum (`pos * mass`), so a caller one
/// level up can fold it into its own centroid without a second pass.
fn update_center(arena: &mut Arena, node: Handle) -> Vec3 {
    let octant = *arena.get(node);

    if octant.is_leaf() {
        return octant.center.pos * octant.center.mass;
    }

    let mut weighted_sum = Vec3::ZERO;
    for child in octant.children {
        if child.is_some() {
            weighted_sum += update_center(arena, child);
        }
    }

    let mass = arena.get(node).center.mass;
    let centroid = if mass != 0.0 {
        weighted_sum / mass
    } else {
        Vec3::ZERO
    };
    arena.get_mut(node).center.pos = centroid;
    weighted_sum
}

fn force_accumulate(arena: &Arena, node: Handle, p: PointMass, theta: f64) -> Vec3 {
    let octant = arena.get(node);

    if octant.is_leaf() {
        if octant.center.pos.approx_eq(p.pos) {
            return Vec3::ZERO;
        }
        return gforce(p, octant.center);
    }

    let d = p.pos.distance(octant.center.pos);
    if octant.cube.len / d < theta {
        return gforce(p, octant.center);
    }

    let mut total = Vec3::ZERO;
    for child in octant.children {
        if child.is_some() {
            total += force_accumulate(arena, child, p, theta);
        }
    }
    total
}
