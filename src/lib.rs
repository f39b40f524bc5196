//! Parallel Barnes-Hut n-body step engine: a spatial octree rebuilt each
//! step from a bump arena, approximated force evaluation under an
//! opening-angle criterion, and a fixed worker-thread pool synchronized by
//! a pair of barriers per step.

pub mod arena;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod init;
pub mod morton;
pub mod octant;
pub mod particle;
pub mod shared;
pub mod tree;
pub mod vector;
pub mod visualizer;
pub mod worker;

#[cfg(feature = "render")]
pub mod render;

pub use config::Config;
pub use error::Error;
pub use particle::Particle;
