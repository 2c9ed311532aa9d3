//! Fixed timestep simulation tick
//!
//! One tick copies the world, fans the per-particle update out over the worker
//! pool, waits for every worker, then writes the results back. Particles never
//! read each other, so workers share nothing but the read-only wall list.

use std::panic::{self, AssertUnwindSafe};

use rayon::ThreadPool;
use rayon::prelude::*;

use super::collision::WorldBounds;
use super::particle::Particle;
use super::store::World;
use super::wall::Wall;

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Particles in this tick's snapshot
    pub particles: usize,
    /// Particles whose update panicked and were left unchanged
    pub faults: usize,
}

/// Advance every particle in `world` by `dt` seconds on `pool`
///
/// Returns only after all workers are done, so the next tick's snapshot always
/// sees this tick's results.
pub fn tick(world: &World, pool: &ThreadPool, dt: f64) -> TickOutcome {
    let mut particles = world.particles.snapshot();
    let walls = world.walls.snapshot();
    let bounds = world.bounds();

    let faults = pool.install(|| update_particles(&mut particles, &walls, &bounds, dt));
    world.particles.write_back(&particles);

    log::trace!("tick: {} particles, {} walls", particles.len(), walls.len());
    TickOutcome {
        particles: particles.len(),
        faults,
    }
}

/// Parallel integrate + collide over a particle slice; returns the fault count
pub fn update_particles(
    particles: &mut [Particle],
    walls: &[Wall],
    bounds: &WorldBounds,
    dt: f64,
) -> usize {
    update_isolated(particles, |p| p.step(dt, bounds, walls))
}

/// Apply `step` to every particle in parallel, isolating panics
///
/// A particle whose step panics is restored to its state before the tick and
/// skipped; the rest of the slice is still updated.
pub fn update_isolated<F>(particles: &mut [Particle], step: F) -> usize
where
    F: Fn(&mut Particle) + Sync,
{
    particles
        .par_iter_mut()
        .enumerate()
        .map(|(index, particle)| {
            let before = *particle;
            match panic::catch_unwind(AssertUnwindSafe(|| step(particle))) {
                Ok(()) => 0,
                Err(payload) => {
                    *particle = before;
                    log::warn!(
                        "particle {index} update failed, skipped this tick: {}",
                        panic_message(payload.as_ref())
                    );
                    1
                }
            }
        })
        .sum()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec2;
    use rayon::ThreadPoolBuilder;

    const DT: f64 = 1.0 / 60.0;

    fn world() -> World {
        World::new(WorldBounds {
            width: 1280,
            height: 720,
            diameter: 5,
            buffer: 1,
        })
    }

    fn pool() -> ThreadPool {
        ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    #[test]
    fn test_tick_moves_every_particle() {
        let world = world();
        world.particles.extend(vec![
            Particle::new(100, 100, 0.0, 600.0),
            Particle::new(200, 200, 90.0, 600.0),
        ]);

        let outcome = tick(&world, &pool(), DT);
        assert_eq!(outcome, TickOutcome { particles: 2, faults: 0 });

        let snap = world.snapshot();
        assert_eq!(snap.particles[0].position(), IVec2::new(110, 100));
        assert_eq!(snap.particles[1].position(), IVec2::new(200, 210));
    }

    #[test]
    fn test_tick_applies_walls() {
        let world = world();
        world.particles.push(Particle::new(3, 360, 180.0, 300.0));
        world.walls.push(Wall::new(0, 0, 0, 720));
        // First tick advances to x=-2, boundary clamps to 1 and flips heading
        tick(&world, &pool(), DT);
        let p = world.snapshot().particles[0];
        assert!(p.position().x >= 1);
        assert!(p.angle() < 1e-6 || p.angle() > 360.0 - 1e-6);
    }

    #[test]
    fn test_huge_speed_is_clamped_not_faulted() {
        let world = world();
        world.particles.push(Particle::new(640, 360, 30.0, 1e12));
        let pool = pool();
        for _ in 0..3 {
            let outcome = tick(&world, &pool, DT);
            assert_eq!(outcome.faults, 0);
        }
        let p = world.snapshot().particles[0];
        assert!((0..=1275).contains(&p.position().x), "{:?}", p.position());
        assert!((0..=715).contains(&p.position().y), "{:?}", p.position());
    }

    #[test]
    fn test_empty_world_ticks() {
        let outcome = tick(&world(), &pool(), DT);
        assert_eq!(outcome.particles, 0);
    }

    #[test]
    fn test_panicking_particle_is_isolated() {
        let mut particles = vec![
            Particle::new(10, 10, 0.0, 60.0),
            Particle::new(20, 20, 0.0, 666.0),
            Particle::new(30, 30, 0.0, 60.0),
        ];
        let faults = pool().install(|| {
            update_isolated(&mut particles, |p| {
                if p.speed() == 666.0 {
                    panic!("bad particle");
                }
                p.advance(1.0);
            })
        });

        assert_eq!(faults, 1);
        assert_eq!(particles[0].position(), IVec2::new(70, 10));
        assert_eq!(particles[1].position(), IVec2::new(20, 20));
        assert_eq!(particles[2].position(), IVec2::new(90, 30));
    }
}
