//! Benchmarks for the hit path and for eviction churn.

use clockpool::{BufferManager, MemoryStore, PageId, PageStore};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn pool_with_pages(pool_size: usize, pages: u32) -> (BufferManager<MemoryStore>, clockpool::FileId) {
    let mut store = MemoryStore::new("bench");
    for _ in 0..pages {
        store.allocate_page().unwrap();
    }
    let bpm = BufferManager::new(pool_size);
    let file = bpm.add_file(store);
    (bpm, file)
}

fn bench_hits(c: &mut Criterion) {
    let (bpm, file) = pool_with_pages(64, 64);
    for n in 0..64 {
        bpm.read_page(file, PageId::new(n)).unwrap();
    }

    c.bench_function("read_page_hit", |b| {
        let mut n = 0u32;
        b.iter(|| {
            let handle = bpm.read_page(file, PageId::new(n % 64)).unwrap();
            black_box(handle.read().as_slice()[0]);
            n = n.wrapping_add(1);
        })
    });
}

fn bench_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_page_evict");

    for pool_size in [8usize, 64, 512] {
        let (bpm, file) = pool_with_pages(pool_size, (pool_size * 4) as u32);
        let pages = (pool_size * 4) as u32;

        group.bench_with_input(BenchmarkId::from_parameter(pool_size), &pool_size, |b, _| {
            let mut n = 0u32;
            b.iter(|| {
                let handle = bpm.read_page(file, PageId::new(n % pages)).unwrap();
                if n % 3 == 0 {
                    handle.write().as_mut_slice()[0] = n as u8;
                }
                n = n.wrapping_add(1);
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_hits, bench_eviction);
criterion_main!(benches);
