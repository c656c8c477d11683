//! Producing the three dump formats the original implementation's test
//! harness relied on: raw bytes, the chunk map, and the detailed debug
//! listing. Requires the `diagnostics` feature.

use chunkpool::diagnostics::{dump_chunk_map, dump_detailed_debug, dump_raw};
use chunkpool::ChunkPool;

fn main() {
    let pool = ChunkPool::new(4, 6).unwrap();
    let a = pool.alloc(4).unwrap();
    let b = pool.alloc(9).unwrap();

    let mut raw = Vec::new();
    dump_raw(&pool, "pool-after-two-allocs", &mut raw).unwrap();
    println!("--- raw dump ({} bytes) ---", raw.len());

    let mut chunk_map = Vec::new();
    dump_chunk_map(&pool, &mut chunk_map).unwrap();
    println!("--- chunk map ---\n{}", String::from_utf8_lossy(&chunk_map));

    let mut debug = Vec::new();
    dump_detailed_debug(&pool, &mut debug).unwrap();
    println!("--- detailed debug ---\n{}", String::from_utf8_lossy(&debug));

    pool.free(a).unwrap();
    pool.free(b).unwrap();
}
