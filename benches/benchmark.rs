use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use barnes_hut_step::arena::Arena;
use barnes_hut_step::octant::Octant;
use barnes_hut_step::particle::Particle;
use barnes_hut_step::tree::ParticleTree;
use barnes_hut_step::vector::Vec3;

#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

fn uniform_particles(n: usize) -> Vec<Particle> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(1);
    (0..n)
        .map(|_| {
            let pos = Vec3::new(
                rng.gen_range(-1000.0..1000.0),
                rng.gen_range(-1000.0..1000.0),
                rng.gen_range(-1000.0..1000.0),
            );
            Particle::new(pos, 1.0, Vec3::ZERO)
        })
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    static KB: usize = 8192;

    let mut build_group = c.benchmark_group("tree_build");
    for size in [KB, KB * 2, KB * 4, KB * 8, KB * 16].iter() {
        build_group.throughput(Throughput::Elements(*size as u64));
        build_group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let particles = uniform_particles(size);
            let mut arena = Arena::with_capacity((size + 1) * 4 * std::mem::size_of::<Octant>()).unwrap();
            b.iter(|| {
                arena.reset();
                ParticleTree::build(&particles, 1000.0, &mut arena).unwrap();
            });
        });
    }
    build_group.finish();

    let mut force_group = c.benchmark_group("force_evaluation");
    for size in [KB, KB * 2, KB * 4, KB * 8, KB * 16].iter() {
        force_group.throughput(Throughput::Elements(*size as u64));
        force_group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let particles = uniform_particles(size);
            let mut arena = Arena::with_capacity((size + 1) * 4 * std::mem::size_of::<Octant>()).unwrap();
            let tree = ParticleTree::build(&particles, 1000.0, &mut arena).unwrap();
            b.iter(|| {
                for p in &particles {
                    tree.force_on(&arena, p.point_mass(), 0.75);
                }
            });
        });
    }
    force_group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
