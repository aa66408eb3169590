use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use raster::Raster;
use relief::{stl, MeshConfig, Relief};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// A 1201 x 1201 raster, the size of a 3-arcsecond SRTM tile.
fn synthetic_tile() -> Raster {
    const DIM: usize = 1201;
    #[allow(clippy::cast_precision_loss)]
    let samples = (0..DIM * DIM)
        .map(|i| {
            let (r, c) = ((i / DIM) as f64, (i % DIM) as f64);
            1000.0 + 400.0 * (r / 97.0).sin() * (c / 61.0).cos() + 0.3 * (r + c)
        })
        .collect();
    Raster::new(samples, DIM, DIM, (90.0, 90.0)).unwrap()
}

fn terrain_mesh(c: &mut Criterion) {
    let mut group = c.benchmark_group("Terrain Mesh");
    group.sample_size(10);

    let raster = synthetic_tile();

    for downsample in [8, 4, 2] {
        let config = MeshConfig {
            downsample,
            ..MeshConfig::default()
        };
        group.bench_with_input(
            BenchmarkId::new("prepare+mesh", downsample),
            &(&raster, config),
            |b, (raster, config)| b.iter(|| Relief::new(raster, *config).unwrap().mesh().unwrap()),
        );
    }

    let mesh = Relief::new(&raster, MeshConfig::default())
        .unwrap()
        .mesh()
        .unwrap();
    group.bench_with_input("stl", &mesh, |b, mesh| {
        b.iter(|| {
            let mut buf = Vec::with_capacity(84 + 50 * mesh.len());
            stl::write(mesh.triangles(), &mut buf).unwrap();
            buf
        })
    });
}

criterion_group!(benches, terrain_mesh);
criterion_main!(benches);
