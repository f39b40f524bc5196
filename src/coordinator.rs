//! Spawns the fixed worker pool, drives the two-barrier step loop, and
//! aggregates radius + timing. Worker id 0 runs inline on the calling
//! thread and doubles as the build/aggregation/IO coordinator, mirroring
//! `main.c`'s thread 0 in the original source. Worker threads are spawned
//! fallibly, so an OS thread-creation failure surfaces as
//! [`Error::ThreadSpawnFailed`] instead of panicking the whole process.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::arena::Arena;
use crate::config::Config;
use crate::error::Error;
use crate::morton::sort_by_morton;
use crate::particle::{partition_slices, Particle};
use crate::shared::Shared;
use crate::tree::ParticleTree;
use crate::visualizer::Visualizer;
use crate::worker::{self, WorkerConfig};

/// Sentinel values for the global control flag. Any other value is a
/// positive process exit code from a fatal [`Error`].
const FLAG_NONE: i32 = 0;
const FLAG_STOP: i32 = -1;

/// Sentinel values for the startup gate workers spin on before their first
/// barrier rendezvous. Distinct from `control_flag`, which only ever means
/// anything once every thread has actually joined the barrier protocol.
const GATE_PENDING: i32 = 0;
const GATE_GO: i32 = 1;
const GATE_ABORT: i32 = 2;

struct TreeState {
    arena: Arena,
    tree: Option<ParticleTree>,
}

/// Runs the full simulation: `config.steps` steps (or until externally
/// stopped, if `config.steps == 0`) over `particles`, reporting per-step
/// timing and feeding `visualizer` once per completed step. Returns the
/// final particle state on success.
pub fn run(
    config: &Config,
    particles: Vec<Particle>,
    visualizer: &mut dyn Visualizer,
) -> Result<Vec<Particle>, Error> {
    let n = particles.len();
    let slices = partition_slices(n, config.threads);

    let shared_particles = Shared::new(particles);
    let arena = Arena::with_capacity(config.arena_bytes)?;
    let shared_tree = Shared::new(TreeState { arena, tree: None });
    let barrier = Barrier::new(config.threads);
    let control_flag = AtomicI32::new(FLAG_NONE);
    let startup_gate = AtomicI32::new(GATE_PENDING);
    let stop_requested = Arc::new(AtomicBool::new(false));
    let radii: Vec<AtomicU64> = (0..config.threads)
        .map(|_| AtomicU64::new(config.radius.to_bits()))
        .collect();

    {
        let stop_flag = Arc::clone(&stop_requested);
        let result = ctrlc::set_handler(move || {
            stop_flag.store(true, Ordering::Release);
        });
        if let Err(e) = result {
            warn!("failed to install signal handler: {e}");
        }
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if !config.verbose {
        writeln!(out, "step,build,simulate").ok();
    }

    let outcome = std::thread::scope(|scope| {
        let mut spawn_error = None;

        for id in 1..config.threads {
            let worker_cfg = WorkerConfig {
                id,
                slice: slices[id],
                theta: config.theta,
                dt: config.dt,
            };
            let shared_particles = &shared_particles;
            let shared_tree = &shared_tree;
            let barrier = &barrier;
            let control_flag = &control_flag;
            let startup_gate = &startup_gate;
            let radii = &radii;
            let spawned = std::thread::Builder::new().spawn_scoped(scope, move || {
                worker_thread_loop(
                    worker_cfg,
                    shared_particles,
                    shared_tree,
                    barrier,
                    control_flag,
                    startup_gate,
                    radii,
                );
            });
            if let Err(e) = spawned {
                spawn_error = Some(e);
                break;
            }
        }

        // Already-spawned workers are spinning on `startup_gate`, not yet
        // blocked in `barrier.wait()`, so releasing them here (either way)
        // can never deadlock `scope`'s implicit join below.
        if let Some(e) = spawn_error {
            startup_gate.store(GATE_ABORT, Ordering::Release);
            return Err(Error::ThreadSpawnFailed(e));
        }
        startup_gate.store(GATE_GO, Ordering::Release);

        coordinator_loop(
            config,
            slices[0],
            &shared_particles,
            &shared_tree,
            &barrier,
            &control_flag,
            &radii,
            stop_requested.as_ref(),
            visualizer,
            &mut out,
        )
    });

    outcome?;
    Ok(shared_particles.into_inner())
}

#[allow(clippy::too_many_arguments)]
fn coordinator_loop(
    config: &Config,
    my_slice: crate::particle::ParticleSlice,
    shared_particles: &Shared<Vec<Particle>>,
    shared_tree: &Shared<TreeState>,
    barrier: &Barrier,
    control_flag: &AtomicI32,
    radii: &[AtomicU64],
    stop_requested: &AtomicBool,
    visualizer: &mut dyn Visualizer,
    out: &mut impl Write,
) -> Result<(), Error> {
    let coord_cfg = WorkerConfig {
        id: 0,
        slice: my_slice,
        theta: config.theta,
        dt: config.dt,
    };

    let mut step_index: u64 = 0;

    loop {
        let build_start = Instant::now();
        let build_result = build_step(config, step_index, shared_particles, shared_tree, radii);
        let build_us = build_start.elapsed().as_micros();

        if let Err(e) = build_result {
            control_flag.store(e.exit_code().max(1), Ordering::Release);
            barrier.wait();
            return Err(e);
        }

        barrier.wait();

        let sim_start = Instant::now();
        {
            // SAFETY: build completed before barrier1, no worker writes
            // until after barrier2; worker 0's slice is disjoint from every
            // other worker's slice.
            let tree_state = unsafe { shared_tree.get() };
            let tree = tree_state.tree.as_ref().expect("tree built before barrier1");
            let my_range = unsafe { shared_particles.slice_mut(coord_cfg.slice.range()) };
            let radius = worker::step(&coord_cfg, tree, &tree_state.arena, my_range);
            radii[0].store(radius.to_bits(), Ordering::Relaxed);
        }
        let simulate_us = sim_start.elapsed().as_micros();

        barrier.wait();

        let max_radius = radii
            .iter()
            .map(|a| f64::from_bits(a.load(Ordering::Relaxed)))
            .fold(0.0_f64, f64::max);
        for a in radii {
            a.store(max_radius.to_bits(), Ordering::Relaxed);
        }

        emit_timing(config, out, step_index, build_us, simulate_us, shared_tree, max_radius);

        let shutdown_requested = {
            // SAFETY: no worker writes the shared array outside the
            // simulate phase; we are between barrier2 and the next build.
            let snapshot = unsafe { shared_particles.get() };
            visualizer.present(snapshot, max_radius)
        };

        if config.delay > 0 {
            std::thread::sleep(Duration::from_millis(config.delay));
        }

        step_index += 1;

        let steps_exhausted = config.steps != 0 && step_index >= config.steps;
        let externally_stopped = stop_requested.load(Ordering::Acquire);

        if shutdown_requested {
            control_flag.store(Error::RenderError("visualizer closed".into()).exit_code().max(1), Ordering::Release);
            barrier.wait();
            return Err(Error::RenderError("visualizer closed".into()));
        }

        if steps_exhausted || externally_stopped {
            control_flag.store(FLAG_STOP, Ordering::Release);
            barrier.wait();
            return Ok(());
        }
    }
}

fn build_step(
    config: &Config,
    step_index: u64,
    shared_particles: &Shared<Vec<Particle>>,
    shared_tree: &Shared<TreeState>,
    radii: &[AtomicU64],
) -> Result<(), Error> {
    if config.optimize && step_index > 0 && step_index % 10 == 0 {
        // SAFETY: only the coordinator runs build, and it runs strictly
        // between barrier2 of the previous step and barrier1 of this one,
        // while every worker is parked.
        let particles = unsafe { shared_particles.get_mut() };
        sort_by_morton(particles);
    }

    let radius = f64::from_bits(radii[0].load(Ordering::Relaxed));

    // SAFETY: see above; exclusive access to the tree state is guaranteed
    // by barrier discipline, not by this call site.
    let state = unsafe { shared_tree.get_mut() };
    state.arena.reset();
    let particles = unsafe { shared_particles.get() };
    state.tree = Some(ParticleTree::build(particles, radius, &mut state.arena)?);
    Ok(())
}

fn worker_thread_loop(
    cfg: WorkerConfig,
    shared_particles: &Shared<Vec<Particle>>,
    shared_tree: &Shared<TreeState>,
    barrier: &Barrier,
    control_flag: &AtomicI32,
    startup_gate: &AtomicI32,
    radii: &[AtomicU64],
) {
    // Wait for every worker to have spawned successfully before touching the
    // barrier at all. The barrier's party count is fixed at `config.threads`
    // and can never be satisfied if a later spawn failed, so this thread must
    // be able to bail out here, before its first `barrier.wait()`, rather
    // than discovering the abort only after it is already blocked inside one.
    loop {
        match startup_gate.load(Ordering::Acquire) {
            GATE_GO => break,
            GATE_ABORT => return,
            _ => std::thread::yield_now(),
        }
    }

    // SAFETY: taken once, before this worker ever participates in a
    // barrier; the shared array is stable until the first barrier1.
    let mut mirror: Vec<Particle> = unsafe { shared_particles.get() }.clone();

    loop {
        barrier.wait();

        if control_flag.load(Ordering::Acquire) != FLAG_NONE {
            return;
        }

        {
            // SAFETY: tree is fully built and read-only for the duration
            // between barrier1 and barrier2.
            let tree_state = unsafe { shared_tree.get() };
            let tree = tree_state.tree.as_ref().expect("tree built before barrier1");
            let slice = &mut mirror[cfg.slice.range()];
            let radius = worker::step(&cfg, tree, &tree_state.arena, slice);
            radii[cfg.id].store(radius.to_bits(), Ordering::Relaxed);
        }

        // SAFETY: this worker's slice is disjoint from every other
        // worker's, so concurrent writers never touch the same elements.
        unsafe { shared_particles.slice_mut(cfg.slice.range()) }
            .copy_from_slice(&mirror[cfg.slice.range()]);

        barrier.wait();

        // SAFETY: no worker writes the shared array between barrier2 and
        // the next build's reset/rebuild.
        let snapshot = unsafe { shared_particles.get() };
        worker::refresh_mirror(&cfg, snapshot, &mut mirror);
    }
}

fn emit_timing(
    config: &Config,
    out: &mut impl Write,
    step_index: u64,
    build_us: u128,
    simulate_us: u128,
    shared_tree: &Shared<TreeState>,
    radius: f64,
) {
    if config.verbose {
        // SAFETY: read-only access to the tree after the step has fully
        // completed; no worker mutates it until the next build.
        let node_count = unsafe { shared_tree.get() }.tree.as_ref().map(|t| t.node_count).unwrap_or(0);
        info!(
            "step {step_index}: build={build_us}us simulate={simulate_us}us nodes={node_count} radius={radius:.3}"
        );
    } else {
        writeln!(out, "{step_index},{build_us},{simulate_us}").ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vec3;
    use crate::visualizer::NullVisualizer;

    fn test_config(threads: usize, steps: u64) -> Config {
        Config {
            steps,
            particles: 16,
            max_mass: 1.0,
            radius: 100.0,
            theta: 0.5,
            dt: 0.001,
            threads,
            seed: 7,
            delay: 0,
            optimize: false,
            flat: false,
            verbose: false,
            render: false,
            arena_bytes: 1 << 20,
        }
    }

    fn particles(n: usize) -> Vec<Particle> {
        (0..n)
            .map(|i| {
                let f = i as f64;
                Particle::new(Vec3::new(f, -f, f * 0.5), 1e3, Vec3::ZERO)
            })
            .collect()
    }

    #[test]
    fn single_threaded_run_completes() {
        let config = test_config(1, 3);
        let mut visualizer = NullVisualizer;
        let result = run(&config, particles(config.particles), &mut visualizer).unwrap();
        assert_eq!(result.len(), config.particles);
    }

    #[test]
    fn multithreaded_run_completes() {
        let config = test_config(4, 3);
        let mut visualizer = NullVisualizer;
        let result = run(&config, particles(config.particles), &mut visualizer).unwrap();
        assert_eq!(result.len(), config.particles);
    }

    struct CountingVisualizer {
        calls: usize,
    }

    impl Visualizer for CountingVisualizer {
        fn present(&mut self, _particles: &[Particle], _radius: f64) -> bool {
            self.calls += 1;
            false
        }
    }

    #[test]
    fn visualizer_is_called_once_per_step() {
        let config = test_config(2, 5);
        let mut visualizer = CountingVisualizer { calls: 0 };
        run(&config, particles(config.particles), &mut visualizer).unwrap();
        assert_eq!(visualizer.calls, 5);
    }
}
