//! Content sniffing
//!
//! Checks that the leading bytes of an upload match a signature registered
//! for its claimed extension. Only the first [`MAX_HEADER_SIZE`] bytes are
//! consulted; a signature that does not fit in the bytes actually available
//! is skipped rather than matched against padding.

use crate::headers::{all_entries, entries_for, FileHeaderEntry};
use sealgate_core::models::FileUpload;
use std::io::SeekFrom;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

/// Longest prefix the sniffer will ever inspect.
pub const MAX_HEADER_SIZE: usize = 16;

fn entry_matches(window: &[u8], entry: &FileHeaderEntry) -> bool {
    entry.segments.iter().all(|segment| {
        let end = segment.offset + segment.bytes.len();
        window.len() >= end && &window[segment.offset..end] == segment.bytes
    })
}

/// True when `bytes` start with a signature registered for `extension`.
///
/// Fails closed: empty content, an empty extension, and extensions without
/// a registered signature all answer false.
pub fn matches_bytes(bytes: &[u8], extension: &str) -> bool {
    if bytes.is_empty() || extension.is_empty() {
        return false;
    }
    let Some(entries) = entries_for(extension) else {
        return false;
    };
    let window = &bytes[..bytes.len().min(MAX_HEADER_SIZE)];
    entries.iter().any(|entry| entry_matches(window, entry))
}

/// Stream form of [`matches_bytes`]: reads the leading bytes, then restores
/// the stream position it was called with.
pub async fn matches_stream<S>(stream: &mut S, extension: &str) -> std::io::Result<bool>
where
    S: AsyncRead + AsyncSeek + Unpin,
{
    if extension.is_empty() || entries_for(extension).is_none() {
        return Ok(false);
    }
    let position = stream.stream_position().await?;
    stream.seek(SeekFrom::Start(0)).await?;
    let mut window = [0u8; MAX_HEADER_SIZE];
    let mut filled = 0;
    while filled < MAX_HEADER_SIZE {
        let read = stream.read(&mut window[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    stream.seek(SeekFrom::Start(position)).await?;
    Ok(matches_bytes(&window[..filled], extension))
}

/// Sniff an upload against its own claimed extension.
pub fn matches_upload(upload: &FileUpload) -> bool {
    matches_bytes(&upload.bytes, &upload.extension())
}

/// Best-effort media type from the registered signatures, in table order.
pub fn detect_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.is_empty() {
        return None;
    }
    let window = &bytes[..bytes.len().min(MAX_HEADER_SIZE)];
    all_entries()
        .find(|entry| entry_matches(window, entry))
        .map(|entry| entry.mime_type)
}
