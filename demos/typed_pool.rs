//! Using `TypedHandle<T>` to get construction/destruction and indexing on
//! top of the untyped pool, without the pool itself knowing about `T`.

use chunkpool::typed::TypedHandle;
use chunkpool::ChunkPool;

#[derive(Default, Debug)]
struct Particle {
    x: f32,
    y: f32,
    alive: bool,
}

fn main() {
    let pool = ChunkPool::new(32, 64).unwrap();

    let mut particles = TypedHandle::<Particle>::new(&pool, 4).unwrap();
    for i in 0..particles.len() {
        particles[i].x = i as f32;
        particles[i].alive = true;
    }

    for i in 0..particles.len() {
        println!("particle {i}: {:?}", particles[i]);
    }

    particles.free().unwrap();
    assert_eq!(pool.used_chunks(), 0);
}
