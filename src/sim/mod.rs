//! Simulation core
//!
//! Everything that changes particle state lives here:
//! - Fixed timestep only
//! - Per-particle updates are independent and run in parallel
//! - Shared collections are append-only
//! - No rendering or threading policy (see `scheduler`)

pub mod collision;
pub mod particle;
pub mod spawn;
pub mod store;
pub mod tick;
pub mod wall;

pub use collision::{WorldBounds, reflect_velocity, segment_intersection};
pub use particle::Particle;
pub use spawn::{Batch, RandomSpawner};
pub use store::{AppendStore, FrameSnapshot, World};
pub use tick::{TickOutcome, tick};
pub use wall::Wall;
