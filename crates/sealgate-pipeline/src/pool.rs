//! Reusable read buffers
//!
//! Decrypted content is read through a small shared pool of scratch chunks
//! so repeated screenings do not reallocate their read buffers.

use std::mem;
use std::sync::{Mutex, MutexGuard};

pub const CHUNK_SIZE: usize = 8 * 1024;

/// Pool of fixed-size scratch buffers shared across screenings
#[derive(Debug, Default)]
pub struct ChunkPool {
    chunks: Mutex<Vec<Vec<u8>>>,
}

impl ChunkPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn chunks(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        // A panicked leaseholder only forfeits its buffer; the pool stays usable.
        self.chunks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Borrow a chunk; it returns to the pool when the lease drops.
    pub fn lease(&self) -> ChunkLease<'_> {
        let chunk = self
            .chunks()
            .pop()
            .unwrap_or_else(|| vec![0u8; CHUNK_SIZE]);
        ChunkLease { pool: self, chunk }
    }

    fn give_back(&self, chunk: Vec<u8>) {
        self.chunks().push(chunk);
    }

    #[cfg(test)]
    fn idle(&self) -> usize {
        self.chunks().len()
    }
}

/// A pooled chunk, handed back on drop
pub struct ChunkLease<'a> {
    pool: &'a ChunkPool,
    chunk: Vec<u8>,
}

impl AsMut<[u8]> for ChunkLease<'_> {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.chunk
    }
}

impl Drop for ChunkLease<'_> {
    fn drop(&mut self) {
        self.pool.give_back(mem::take(&mut self.chunk));
    }
}
