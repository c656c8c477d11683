//! Allocate, write through the handle, free, and watch fragmentation get
//! blocked by a non-contiguous request — scenario 4 from the behavioural
//! spec, run by hand instead of as a test.

use chunkpool::ChunkPool;

fn main() {
    let pool = ChunkPool::new(/* chunk_size */ 64, /* chunk_count */ 16).unwrap();
    println!(
        "pool: {} chunks x {} bytes = {}",
        pool.chunk_count(),
        pool.chunk_size(),
        chunkpool::utils::format_bytes(pool.pool_size())
    );

    let a = pool.alloc(64).unwrap();
    let b = pool.alloc(64).unwrap();
    let c = pool.alloc(64).unwrap();
    let d = pool.alloc(64).unwrap();
    println!("used after four single-chunk allocs: {}", pool.used_chunks());

    pool.free(a).unwrap();
    pool.free(c).unwrap();
    println!(
        "free_chunks={} but largest_free_run={} — fragmented",
        pool.free_chunks(),
        pool.largest_free_run()
    );

    match pool.alloc(128) {
        Ok(_) => unreachable!("two isolated single-chunk gaps cannot satisfy a two-chunk request"),
        Err(e) => println!("alloc(128) correctly failed: {e}"),
    }

    let refit = pool.alloc(64).unwrap();
    println!("alloc(64) landed back in one of the freed slots: chunk {}", refit.chunk_index());

    pool.free(b).unwrap();
    pool.free(d).unwrap();
    pool.free(refit).unwrap();
}
