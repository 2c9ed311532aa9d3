//! Shared particle and wall collections
//!
//! Both collections are append-only arenas behind a short critical section.
//! A tick copies the particle arena, updates the copy without holding the lock,
//! then writes the updated prefix back. Indices never move, so entries appended
//! while the tick was running are left untouched and picked up next tick.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::collision::WorldBounds;
use super::particle::Particle;
use super::wall::Wall;

/// Append-only collection yielding point-in-time copies
#[derive(Debug)]
pub struct AppendStore<T> {
    items: Mutex<Vec<T>>,
}

impl<T: Clone> AppendStore<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    // Every mutation is a single push, extend or slice copy, so a poisoned
    // vector is still consistent.
    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, item: T) {
        self.lock().push(item);
    }

    /// Append a batch; the whole batch becomes visible at once
    pub fn extend(&self, batch: Vec<T>) -> usize {
        let count = batch.len();
        if count > 0 {
            self.lock().extend(batch);
        }
        count
    }

    /// Copy of every entry appended so far
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().clone()
    }

    /// Overwrite the first `updated.len()` entries
    pub fn write_back(&self, updated: &[T]) {
        let mut items = self.lock();
        let n = updated.len().min(items.len());
        items[..n].clone_from_slice(&updated[..n]);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<T: Clone> Default for AppendStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable copy of the world used by one tick or one render pass
#[derive(Debug, Clone, Default)]
pub struct FrameSnapshot {
    pub particles: Vec<Particle>,
    pub walls: Vec<Wall>,
}

/// Particles and walls inside fixed bounds
#[derive(Debug)]
pub struct World {
    bounds: WorldBounds,
    pub(crate) particles: AppendStore<Particle>,
    pub(crate) walls: AppendStore<Wall>,
}

impl World {
    pub fn new(bounds: WorldBounds) -> Self {
        Self {
            bounds,
            particles: AppendStore::new(),
            walls: AppendStore::new(),
        }
    }

    #[inline]
    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            particles: self.particles.snapshot(),
            walls: self.walls.snapshot(),
        }
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_snapshot_is_a_copy() {
        let store = AppendStore::new();
        store.push(1);
        let snap = store.snapshot();
        store.push(2);
        assert_eq!(snap, vec![1]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_write_back_keeps_late_appends() {
        let store = AppendStore::new();
        store.extend(vec![1, 2]);
        let mut snap = store.snapshot();
        // Appended while the copy is being updated
        store.push(3);
        for v in &mut snap {
            *v *= 10;
        }
        store.write_back(&snap);
        assert_eq!(store.snapshot(), vec![10, 20, 3]);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let store: AppendStore<u8> = AppendStore::new();
        assert_eq!(store.extend(Vec::new()), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_appends_not_lost() {
        let store = Arc::new(AppendStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..250 {
                        store.push(t * 1000 + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 2000);
    }

    #[test]
    fn test_world_snapshot_contains_both_collections() {
        let world = World::new(WorldBounds {
            width: 100,
            height: 100,
            diameter: 5,
            buffer: 1,
        });
        world.particles.push(Particle::new(1, 2, 0.0, 1.0));
        world.walls.push(Wall::new(0, 0, 10, 10));
        let snap = world.snapshot();
        assert_eq!(snap.particles.len(), 1);
        assert_eq!(snap.walls.len(), 1);
        assert_eq!(world.particle_count(), 1);
        assert_eq!(world.wall_count(), 1);
    }
}
