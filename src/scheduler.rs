//! Fixed-rate simulation loop
//!
//! `Simulation` is the surface the presentation layer talks to: it injects
//! particles and walls, reads snapshots and frame rate, and starts or stops the
//! background loop. Each loop iteration runs exactly one tick and sends exactly
//! one frame-ready signal, then sleeps for whatever is left of the frame budget.
//! Overruns are never caught up or skipped; the loop just falls behind.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use glam::IVec2;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{Result, SimError};
use crate::renderer::{self, Camera, CameraInput, Frame};
use crate::settings::Settings;
use crate::sim::spawn::validate_point;
use crate::sim::{
    self, Batch, FrameSnapshot, Particle, RandomSpawner, TickOutcome, Wall, World, WorldBounds,
};
use crate::telemetry::FrameRateTracker;

/// Receives the "new frame available" notification after every tick
///
/// Called on the loop thread with the post-tick snapshot. Implementations
/// that render elsewhere should hand the snapshot off and return quickly.
///
/// A listener must not call [`Simulation::step`] or [`Simulation::start`]:
/// the tick that is signalling still holds the tick lock, so both would
/// deadlock. Calling [`Simulation::stop`] is allowed; the loop exits after the
/// current tick and is joined by the next `start` or `stop` from another thread.
pub trait FrameListener: Send + Sync {
    fn frame_ready(&self, tick: u64, snapshot: &FrameSnapshot);
}

impl<F> FrameListener for F
where
    F: Fn(u64, &FrameSnapshot) + Send + Sync,
{
    fn frame_ready(&self, tick: u64, snapshot: &FrameSnapshot) {
        self(tick, snapshot)
    }
}

/// Loop counters, readable from any thread
#[derive(Debug, Default)]
pub struct TickStats {
    ticks: AtomicU64,
    frames_signalled: AtomicU64,
    faults: AtomicU64,
    overruns: AtomicU64,
}

impl TickStats {
    /// Completed update fan-outs
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Frame-ready signals sent (always equal to `ticks` once a tick returns)
    pub fn frames_signalled(&self) -> u64 {
        self.frames_signalled.load(Ordering::Acquire)
    }

    /// Particle updates that panicked and were skipped
    pub fn faults(&self) -> u64 {
        self.faults.load(Ordering::Acquire)
    }

    /// Ticks that took longer than the frame budget
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default)]
struct ExplorerState {
    /// Last focus point; kept after leaving explorer mode
    camera: Option<Camera>,
    active: bool,
}

thread_local! {
    /// Set on simulation loop threads, which must never join themselves
    static ON_LOOP_THREAD: Cell<bool> = const { Cell::new(false) };
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the public handle and the loop thread
struct Shared {
    settings: Settings,
    world: World,
    pool: ThreadPool,
    running: AtomicBool,
    stats: TickStats,
    /// Achieved frame rate as `f64` bits
    fps_bits: AtomicU64,
    /// Serialises ticks between the loop and `Simulation::step`
    tick_lock: Mutex<()>,
    listener: RwLock<Option<Arc<dyn FrameListener>>>,
    explorer: Mutex<ExplorerState>,
    spawner: Mutex<RandomSpawner>,
}

impl Shared {
    fn run_tick(&self) -> TickOutcome {
        let _guard = lock(&self.tick_lock);
        let outcome = sim::tick(&self.world, &self.pool, self.settings.time_step);
        let tick = self.stats.ticks.fetch_add(1, Ordering::AcqRel) + 1;
        if outcome.faults > 0 {
            self.stats
                .faults
                .fetch_add(outcome.faults as u64, Ordering::AcqRel);
        }
        self.signal_frame(tick);
        outcome
    }

    fn signal_frame(&self, tick: u64) {
        let listener = self
            .listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(listener) = listener {
            let snapshot = self.world.snapshot();
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                listener.frame_ready(tick, &snapshot)
            }));
            if result.is_err() {
                log::warn!("frame listener panicked on tick {tick}");
            }
        }
        self.stats.frames_signalled.fetch_add(1, Ordering::AcqRel);
    }

    fn run_loop(&self) {
        ON_LOOP_THREAD.with(|flag| flag.set(true));
        let budget = self.settings.frame_budget();
        let mut tracker = FrameRateTracker::new(self.settings.fps_window());
        log::info!(
            "Simulation loop started: {} Hz, dt={:.4}s, {} workers",
            self.settings.target_fps,
            self.settings.time_step,
            self.pool.current_num_threads()
        );

        while self.running.load(Ordering::Acquire) {
            let started = Instant::now();
            self.run_tick();

            if let Some(fps) = tracker.record_frame(Instant::now()) {
                self.fps_bits.store(fps.to_bits(), Ordering::Release);
            }

            let elapsed = started.elapsed();
            match budget.checked_sub(elapsed) {
                Some(idle) if !idle.is_zero() => thread::sleep(idle),
                Some(_) => {}
                None => {
                    self.stats.overruns.fetch_add(1, Ordering::AcqRel);
                    log::debug!("tick overran budget: {elapsed:?} > {budget:?}");
                }
            }
        }

        log::info!("Simulation loop stopped after {} ticks", self.stats.ticks());
    }
}

/// Handle to a running or idle simulation
pub struct Simulation {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Simulation {
    /// Create an idle simulation; call `start` to begin ticking
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(settings.worker_count())
            .thread_name(|i| format!("particle-worker-{i}"))
            .build()?;

        let shared = Shared {
            world: World::new(settings.bounds()),
            pool,
            running: AtomicBool::new(false),
            stats: TickStats::default(),
            fps_bits: AtomicU64::new(0f64.to_bits()),
            tick_lock: Mutex::new(()),
            listener: RwLock::new(None),
            explorer: Mutex::new(ExplorerState::default()),
            spawner: Mutex::new(RandomSpawner::new(settings.seed)),
            settings,
        };

        Ok(Self {
            shared: Arc::new(shared),
            handle: Mutex::new(None),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.shared.settings
    }

    pub fn bounds(&self) -> WorldBounds {
        self.shared.world.bounds()
    }

    pub fn stats(&self) -> &TickStats {
        &self.shared.stats
    }

    // === Injection ===

    pub fn inject_particle(&self, x: i32, y: i32, angle: f64, speed: f64) -> Result<()> {
        self.inject_batch(&Batch::BetweenPoints {
            n: 1,
            start: IVec2::new(x, y),
            end: IVec2::new(x, y),
            angle,
            speed,
        })
        .map(|_| ())
    }

    /// `n` particles spread from `start` to `end`; `n == 0` adds nothing
    pub fn inject_particles_between_points(
        &self,
        n: usize,
        start: IVec2,
        end: IVec2,
        angle: f64,
        speed: f64,
    ) -> Result<usize> {
        self.inject_batch(&Batch::BetweenPoints {
            n,
            start,
            end,
            angle,
            speed,
        })
    }

    /// `n` particles at `point` with headings from `start_angle` to `end_angle`
    pub fn inject_particles_varying_angles(
        &self,
        n: usize,
        point: IVec2,
        start_angle: f64,
        end_angle: f64,
        speed: f64,
    ) -> Result<usize> {
        self.inject_batch(&Batch::VaryingAngles {
            n,
            point,
            start_angle,
            end_angle,
            speed,
        })
    }

    /// `n` particles at `point` with speeds from `start_speed` to `end_speed`
    pub fn inject_particles_varying_speeds(
        &self,
        n: usize,
        point: IVec2,
        angle: f64,
        start_speed: f64,
        end_speed: f64,
    ) -> Result<usize> {
        self.inject_batch(&Batch::VaryingSpeeds {
            n,
            point,
            angle,
            start_speed,
            end_speed,
        })
    }

    /// Validate and append a batch; all of it becomes visible at once
    pub fn inject_batch(&self, batch: &Batch) -> Result<usize> {
        batch.validate(&self.bounds())?;
        let particles: Vec<Particle> = batch.particles();
        let count = self.shared.world.particles.extend(particles);
        log::debug!("Injected {count} particles ({} total)", self.particle_count());
        Ok(count)
    }

    pub fn inject_wall(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> Result<()> {
        let bounds = self.bounds();
        validate_point(&bounds, IVec2::new(x1, y1))?;
        validate_point(&bounds, IVec2::new(x2, y2))?;
        self.shared.world.walls.push(Wall::new(x1, y1, x2, y2));
        log::debug!("Injected wall ({x1}, {y1}) -> ({x2}, {y2})");
        Ok(())
    }

    pub fn inject_random_particles_between_points(&self) -> Result<usize> {
        let batch = lock(&self.shared.spawner).between_points(&self.bounds());
        self.inject_batch(&batch)
    }

    pub fn inject_random_particles_varying_angles(&self) -> Result<usize> {
        let batch = lock(&self.shared.spawner).varying_angles(&self.bounds());
        self.inject_batch(&batch)
    }

    pub fn inject_random_particles_varying_speeds(&self) -> Result<usize> {
        let batch = lock(&self.shared.spawner).varying_speeds(&self.bounds());
        self.inject_batch(&batch)
    }

    pub fn inject_random_wall(&self) -> Result<Wall> {
        let wall = lock(&self.shared.spawner).wall(&self.bounds());
        let (start, end) = (wall.start(), wall.end());
        self.inject_wall(start.x, start.y, end.x, end.y)?;
        Ok(wall)
    }

    // === Readback ===

    pub fn frame_snapshot(&self) -> FrameSnapshot {
        self.shared.world.snapshot()
    }

    /// Render the current state, through the explorer camera when it is active
    pub fn render_frame(&self) -> Frame {
        let snapshot = self.frame_snapshot();
        let camera = self.explorer_camera();
        renderer::render(&snapshot, &self.bounds(), camera.as_ref())
    }

    /// Most recent measured ticks per second (0 before the first window closes)
    pub fn achieved_frame_rate(&self) -> f64 {
        f64::from_bits(self.shared.fps_bits.load(Ordering::Acquire))
    }

    pub fn particle_count(&self) -> usize {
        self.shared.world.particle_count()
    }

    pub fn wall_count(&self) -> usize {
        self.shared.world.wall_count()
    }

    // === Explorer mode ===

    pub fn enter_explorer_mode(&self, x: i32, y: i32) -> Result<()> {
        validate_point(&self.bounds(), IVec2::new(x, y))?;
        let mut explorer = lock(&self.shared.explorer);
        explorer.camera = Some(Camera::new(x, y));
        explorer.active = true;
        Ok(())
    }

    /// Re-enter at the last focus point; false if there never was one
    pub fn enter_explorer_mode_at_last_position(&self) -> bool {
        let mut explorer = lock(&self.shared.explorer);
        explorer.active = explorer.camera.is_some();
        explorer.active
    }

    pub fn exit_explorer_mode(&self) {
        lock(&self.shared.explorer).active = false;
    }

    /// Active camera, if explorer mode is on
    pub fn explorer_camera(&self) -> Option<Camera> {
        let explorer = lock(&self.shared.explorer);
        explorer.camera.filter(|_| explorer.active)
    }

    /// Move the explorer focus; ignored outside explorer mode
    pub fn apply_camera_input(&self, input: &CameraInput) {
        let bounds = self.bounds();
        let mut explorer = lock(&self.shared.explorer);
        if !explorer.active {
            return;
        }
        if let Some(camera) = explorer.camera.as_mut() {
            camera.apply_input(input, &bounds);
        }
    }

    pub fn camera_position_label(&self) -> String {
        match lock(&self.shared.explorer).camera {
            Some(camera) => camera.label(),
            None => "(Not in explorer mode)".to_string(),
        }
    }

    // === Loop control ===

    pub fn set_frame_listener(&self, listener: impl FrameListener + 'static) {
        *self
            .shared
            .listener
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(listener));
    }

    pub fn clear_frame_listener(&self) {
        *self
            .shared
            .listener
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Run one tick on the calling thread, then signal the frame
    pub fn step(&self) -> TickOutcome {
        self.shared.run_tick()
    }

    /// Begin ticking on a background thread
    pub fn start(&self) -> Result<()> {
        let mut handle = lock(&self.handle);
        if self.shared.running.load(Ordering::Acquire) {
            return Err(SimError::AlreadyRunning);
        }
        // A loop stopped from its own thread has not been joined yet
        if let Some(old) = handle.take() {
            if old.join().is_err() {
                log::error!("simulation loop thread panicked");
            }
        }
        self.shared.running.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("particle-sim-loop".into())
            .spawn(move || shared.run_loop());
        match spawned {
            Ok(join) => {
                *handle = Some(join);
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                Err(e.into())
            }
        }
    }

    /// Ask the loop to finish its current tick and exit, then wait for it
    ///
    /// From the loop thread itself (a frame listener) this only signals; the
    /// join happens on the next `start` or `stop`.
    pub fn stop(&self) {
        if ON_LOOP_THREAD.with(Cell::get) {
            self.shared.running.store(false, Ordering::Release);
            return;
        }
        let mut handle = lock(&self.handle);
        self.shared.running.store(false, Ordering::Release);
        if let Some(join) = handle.take() {
            if join.join().is_err() {
                log::error!("simulation loop thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.stop();
    }
}
