use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use voxmesh::formats::{from_vxi, to_vxi};
use voxmesh::{mesh_grid, MeshConfig, Palette, Rgb, VoxelGrid};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn bench_palette() -> Palette {
    Palette::from_colors((0..=255).map(|i| Rgb::new(i, i.wrapping_mul(7), 255 - i)).collect())
}

fn make_grid_solid(size: u32) -> VoxelGrid {
    let mut grid = VoxelGrid::new((size, size, size), bench_palette());
    for x in 0..size as i32 {
        for y in 0..size as i32 {
            for z in 0..size as i32 {
                grid.set(x, y, z, ((x + y + z) % 8) as u8);
            }
        }
    }
    grid
}

fn make_grid_sparse(size: u32, fill: f64) -> VoxelGrid {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut grid = VoxelGrid::new((size, size, size), bench_palette());
    for x in 0..size as i32 {
        for y in 0..size as i32 {
            for z in 0..size as i32 {
                if rng.gen_bool(fill) {
                    grid.set(x, y, z, rng.gen_range(0..16));
                }
            }
        }
    }
    grid
}

// ── Benchmarks ───────────────────────────────────────────────────────────────

fn bench_mesh_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("mesh_grid");
    group.measurement_time(Duration::from_secs(3));

    for &size in &[16, 32] {
        let solid = make_grid_solid(size);
        group.bench_function(&format!("{}_solid", size), |b| {
            b.iter(|| {
                let mesh = mesh_grid(&solid, None, &MeshConfig::default()).unwrap();
                black_box(mesh);
            });
        });

        let sparse = make_grid_sparse(size, 0.3);
        group.bench_function(&format!("{}_sparse", size), |b| {
            b.iter(|| {
                let mesh = mesh_grid(&sparse, None, &MeshConfig::default()).unwrap();
                black_box(mesh);
            });
        });
    }
    group.finish();
}

fn bench_vxi_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("vxi");
    group.measurement_time(Duration::from_secs(3));

    let grid = make_grid_sparse(32, 0.3);
    let bytes = to_vxi(&grid);

    group.bench_function("decode_32", |b| {
        b.iter(|| {
            let grid = from_vxi(black_box(&bytes)).unwrap();
            black_box(grid);
        });
    });

    group.bench_function("encode_32", |b| {
        b.iter(|| {
            let bytes = to_vxi(black_box(&grid));
            black_box(bytes);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_mesh_grid, bench_vxi_round_trip);
criterion_main!(benches);
