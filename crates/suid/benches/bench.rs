use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use suid::{
    AllocatorTransport, BlockLayout, ConfigUpdate, Dispenser, FetchResponse, MemoryStore, Result,
    Suid, decode_base36, encode_base36,
};
use tokio::runtime::Builder;

// Identifiers issued per benchmark iteration.
const TOTAL_IDS: usize = 4096;

/// Never reached: the pool is seeded and no server is configured.
struct Offline;

impl AllocatorTransport for Offline {
    async fn request_blocks(&self, _server: &str, _blocks: usize) -> Result<FetchResponse> {
        Ok(FetchResponse::failed(404, None))
    }
}

fn bench_base36(c: &mut Criterion) {
    let mut group = c.benchmark_group("base36");
    group.throughput(Throughput::Elements(1));

    group.bench_function("encode/max", |b| {
        b.iter(|| black_box(encode_base36(black_box(u64::MAX))));
    });
    group.bench_function("encode/typical", |b| {
        b.iter(|| black_box(encode_base36(black_box(1_903_154))));
    });
    group.bench_function("decode/max", |b| {
        b.iter(|| black_box(decode_base36(black_box("3w5e11264sgsf"))));
    });
    group.bench_function("decode/typical", |b| {
        b.iter(|| black_box(decode_base36(black_box("14she"))));
    });

    group.finish();
}

fn bench_dispenser(c: &mut Criterion) {
    let runtime = Builder::new_current_thread().enable_all().build().unwrap();
    let _guard = runtime.enter();

    let layout = BlockLayout::default();
    let blocks = TOTAL_IDS as u64 / layout.capacity();
    let seed: Vec<Suid> = (0..blocks)
        .map(|n| Suid::from_raw(n * layout.capacity() * layout.shard_size()))
        .collect();

    let mut group = c.benchmark_group("dispenser");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("memory/elems/{TOTAL_IDS}"), |b| {
        b.iter_batched(
            || {
                Dispenser::builder(MemoryStore::new(), Offline)
                    .layout(layout)
                    .config(ConfigUpdate::default().with_seed(seed.clone()))
                    .build()
                    .unwrap()
            },
            |dispenser| {
                for _ in 0..TOTAL_IDS {
                    black_box(dispenser.next().unwrap());
                }
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_base36, bench_dispenser);
criterion_main!(benches);
