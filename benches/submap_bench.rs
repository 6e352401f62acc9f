//! Submap Benchmark

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustsubmap::test_data::generate_sphere;
use rustsubmap::{RegistrationPointType, Submap, TsdfLayer, SE3};

fn sphere_layer() -> TsdfLayer {
    generate_sphere(0.05, 16, Vec3::splat(1.0), 0.6, 0.2)
}

fn sphere_submap() -> Submap {
    Submap::from_tsdf_layer(SE3::identity(), 0, sphere_layer()).unwrap()
}

fn bench_finish(c: &mut Criterion) {
    let mut submap = sphere_submap();

    c.bench_function("submap_finish_sphere", |b| {
        b.iter(|| black_box(submap.finish()))
    });
}

fn bench_transform(c: &mut Criterion) {
    let layer = sphere_layer();
    let t_new_old = SE3::from_axis_angle(Vec3::new(0.0, 0.0, 0.1), Vec3::new(0.02, 0.0, 0.0));

    // Fresh submap per iteration, repeated transforms would drift the field
    c.bench_function("submap_transform_sphere", |b| {
        b.iter_batched(
            || Submap::from_tsdf_layer(SE3::identity(), 0, layer.clone()).unwrap(),
            |mut submap| black_box(submap.transform(&t_new_old)),
            BatchSize::LargeInput,
        )
    });
}

fn bench_sampling(c: &mut Criterion) {
    let mut submap = sphere_submap();
    if submap.finish().is_err() {
        return;
    }
    let Ok(points) = submap.registration_points(RegistrationPointType::Voxels) else {
        return;
    };
    let mut rng = StdRng::seed_from_u64(7);

    c.bench_function("sampler_draw_1000", |b| {
        b.iter(|| black_box(points.sample_n(1000, &mut rng)))
    });
}

fn bench_overlap(c: &mut Criterion) {
    let a = sphere_submap();
    let mut b_submap = sphere_submap();
    b_submap.set_pose(SE3::from_translation(Vec3::new(1.0, 0.0, 0.0)));

    // Boxes are measured on first use, later tests hit the cache
    c.bench_function("submap_overlap", |b| {
        b.iter(|| black_box(a.overlaps_with(&b_submap)))
    });
}

criterion_group!(benches, bench_finish, bench_transform, bench_sampling, bench_overlap);
criterion_main!(benches);
