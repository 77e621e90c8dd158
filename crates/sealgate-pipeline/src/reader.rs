//! Decrypted-content reader
//!
//! Drains a protection view's decrypted stream into memory. Streams that
//! advertise their length get a single exact read; unsized streams are
//! drained through the chunk pool.

use crate::pool::ChunkPool;
use sealgate_engine::{EngineResult, ProtectionHandle};
use std::time::Instant;
use tokio::io::AsyncReadExt;

/// Read the full decrypted payload behind `view`.
pub async fn read_decrypted(
    view: &dyn ProtectionHandle,
    pool: &ChunkPool,
) -> EngineResult<Vec<u8>> {
    let started = Instant::now();
    let content = view.decrypted_content().await?;
    let mut reader = content.reader;

    let decrypted = match content.len {
        Some(len) => {
            let mut buffer = vec![0u8; len as usize];
            reader.read_exact(&mut buffer).await?;
            buffer
        }
        None => {
            let mut accumulated = Vec::new();
            let mut lease = pool.lease();
            loop {
                let read = reader.read(lease.as_mut()).await?;
                if read == 0 {
                    break;
                }
                accumulated.extend_from_slice(&lease.as_mut()[..read]);
            }
            accumulated
        }
    };

    tracing::debug!(
        decrypted_len = decrypted.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "Decrypted content read"
    );
    Ok(decrypted)
}
