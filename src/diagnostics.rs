//! Diagnostic dump operations (§6), gated behind the `diagnostics` feature.
//!
//! These are test-harness collaborators, not part of the allocator's hot
//! path: each dump locks the pool for the duration of the write (§4.5,
//! "Dump operations lock").

use std::io::{self, Write};

use crate::pool::ChunkPool;

/// Writes the entire raw buffer to `out`, prefixed by `label` on its own
/// line. Grounded in the original implementation's `DumpMemoryToFile`.
///
/// The buffer itself is arbitrary bytes, not text, so only the label line
/// — the "already-formatted string" spec.md §1/§4.5 describes — reaches
/// [`crate::PoolConfig::diagnostic_sink`] when one is configured.
pub fn dump_raw(pool: &ChunkPool, label: &str, out: &mut dyn Write) -> io::Result<()> {
    let guard = pool.lock_engine();
    let engine = guard.borrow();
    writeln!(out, "{label}")?;
    out.write_all(engine.buffer().as_slice())?;
    writeln!(out)?;
    if let Some(sink) = &engine.config().diagnostic_sink {
        sink(label);
    }
    Ok(())
}

/// Writes each chunk's bytes separated by `|`. A used slot's head chunk is
/// prefixed with `|<N-` (`N` = the slot's `used_chunks`) and its tail
/// chunk is suffixed with `>|`, regardless of slot length — including
/// single-chunk slots, per the Open Question (a) decision recorded in
/// DESIGN.md. Grounded in `DumpChunksToFile`.
///
/// Chunk bytes are not guaranteed to be valid UTF-8, so the text handed to
/// [`crate::PoolConfig::diagnostic_sink`] lossily replaces any that aren't
/// (`out` still receives the exact bytes, untouched).
pub fn dump_chunk_map(pool: &ChunkPool, out: &mut dyn Write) -> io::Result<()> {
    let guard = pool.lock_engine();
    let engine = guard.borrow();
    let table = engine.table();
    let buffer = engine.buffer();
    let chunk_size = engine.chunk_size();
    let sink = engine.config().diagnostic_sink.clone();
    let mut rendered: Vec<u8> = Vec::new();

    let mut i = 0u32;
    while i < table.len() {
        let record = table.get(i);
        if record.is_used_head() {
            let len = record.used_chunks;
            write!(rendered, "|<{len}-")?;
            for offset in 0..len {
                let chunk_index = i + offset;
                let start = chunk_index as usize * chunk_size;
                rendered.extend_from_slice(&buffer.as_slice()[start..start + chunk_size]);
                if offset + 1 == len {
                    write!(rendered, ">|")?;
                } else {
                    write!(rendered, "|")?;
                }
            }
            i += len;
        } else {
            let start = i as usize * chunk_size;
            rendered.extend_from_slice(&buffer.as_slice()[start..start + chunk_size]);
            write!(rendered, "|")?;
            i += 1;
        }
    }
    writeln!(rendered)?;

    out.write_all(&rendered)?;
    if let Some(sink) = sink {
        sink(&String::from_utf8_lossy(&rendered));
    }
    Ok(())
}

/// One line per chunk: `chunk index, used, free_run, used_chunks`, with a
/// trailing `<-- free slot head` tag on chunks named in the free-slot
/// index. Grounded in `DumpDetailedDebugChunksToFile`.
pub fn dump_detailed_debug(pool: &ChunkPool, out: &mut dyn Write) -> io::Result<()> {
    let guard = pool.lock_engine();
    let engine = guard.borrow();
    let table = engine.table();
    let free_list = engine.free_list();
    let mut rendered = String::new();

    use std::fmt::Write as _;
    for i in 0..table.len() {
        let record = table.get(i);
        write!(
            rendered,
            "chunk {}, used={}, free_run={}, used_chunks={}",
            record.index, record.used, record.free_run, record.used_chunks
        )
        .expect("writing to a String never fails");
        if free_list.contains(i) {
            rendered.push_str(" <-- free slot head");
        }
        rendered.push('\n');
    }

    out.write_all(rendered.as_bytes())?;
    if let Some(sink) = &engine.config().diagnostic_sink {
        sink(&rendered);
    }
    Ok(())
}
