use criterion::{criterion_group, criterion_main, Criterion, BenchmarkId};
use rand::prelude::*;

use std::sync::Arc;
use tarimdb::storage::buffer::{BufferPoolInstance, ParallelBufferPoolManager};
use tarimdb::storage::disk::DiskManager;

// Create temporary db for testing
fn create_test_buffer_pool(pool_size: usize) -> Arc<BufferPoolInstance> {
    let temp_file = tempfile::NamedTempFile::new().unwrap();
    let disk_manager = Arc::new(DiskManager::new(temp_file.path()).unwrap());
    let buffer_pool = Arc::new(BufferPoolInstance::new(pool_size, disk_manager));

    // Keep the temp file alive
    std::mem::forget(temp_file);

    buffer_pool
}

fn create_test_parallel_pool(num_instances: usize, pool_size: usize) -> Arc<ParallelBufferPoolManager> {
    let temp_file = tempfile::NamedTempFile::new().unwrap();
    let disk_manager = Arc::new(DiskManager::new(temp_file.path()).unwrap());
    let pool = Arc::new(ParallelBufferPoolManager::new(
        num_instances,
        pool_size,
        disk_manager,
        None,
    ));

    // Keep the temp file alive
    std::mem::forget(temp_file);

    pool
}

// Generate test data of specified size
fn generate_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

fn buffer_pool_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("BufferPool");

    // Test with different buffer pool sizes
    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("sequential_access", size), size, |b, &size| {
            let buffer_pool = create_test_buffer_pool(size as usize);

            // Create some pages first
            let mut page_ids = Vec::new();
            for _ in 0..size {
                let (page, page_id) = buffer_pool.new_page().unwrap();

                // Add some data
                {
                    let mut page_guard = page.write();
                    let data = generate_test_data(100);
                    page_guard.data[..data.len()].copy_from_slice(&data);
                }

                buffer_pool.unpin_page(page_id, true);
                page_ids.push(page_id);
            }

            // Benchmark sequential access pattern
            b.iter(|| {
                for &page_id in &page_ids {
                    let page = buffer_pool.fetch_page(page_id).unwrap();

                    // Read something from the page
                    {
                        let _page_guard = page.read();
                        // Just access the page to ensure it's loaded
                    }

                    buffer_pool.unpin_page(page_id, false);
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("random_access", size), size, |b, &size| {
            let buffer_pool = create_test_buffer_pool(size as usize);

            // Create some pages first
            let mut page_ids = Vec::new();
            for _ in 0..size {
                let (page, page_id) = buffer_pool.new_page().unwrap();

                // Add some data
                {
                    let mut page_guard = page.write();
                    let data = generate_test_data(100);
                    page_guard.data[..data.len()].copy_from_slice(&data);
                }

                buffer_pool.unpin_page(page_id, true);
                page_ids.push(page_id);
            }

            // Create random access pattern
            let mut rng = rand::thread_rng();
            let random_indices: Vec<usize> = (0..size as usize)
                .map(|_| rng.gen_range(0..size as usize))
                .collect();

            // Benchmark random access pattern
            b.iter(|| {
                for &idx in &random_indices {
                    let page_id = page_ids[idx];
                    let page = buffer_pool.fetch_page(page_id).unwrap();

                    // Read something from the page
                    {
                        let _page_guard = page.read();
                        // Just access the page to ensure it's loaded
                    }

                    buffer_pool.unpin_page(page_id, false);
                }
            });
        });
    }

    group.finish();
}

fn parallel_pool_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("ParallelBufferPool");

    for num_instances in [1usize, 2, 4].iter() {
        group.bench_with_input(
            BenchmarkId::new("sharded_random_access", num_instances),
            num_instances,
            |b, &num_instances| {
                let pool = create_test_parallel_pool(num_instances, 100);

                let mut page_ids = Vec::new();
                for _ in 0..(num_instances * 100) {
                    let (_, page_id) = pool.new_page().unwrap();
                    pool.unpin_page(page_id, true);
                    page_ids.push(page_id);
                }

                let mut rng = rand::thread_rng();
                let random_indices: Vec<usize> = (0..page_ids.len())
                    .map(|_| rng.gen_range(0..page_ids.len()))
                    .collect();

                b.iter(|| {
                    for &idx in &random_indices {
                        let page_id = page_ids[idx];
                        let page = pool.fetch_page(page_id).unwrap();
                        {
                            let _page_guard = page.read();
                        }
                        pool.unpin_page(page_id, false);
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, buffer_pool_benchmark, parallel_pool_benchmark);
criterion_main!(benches);
