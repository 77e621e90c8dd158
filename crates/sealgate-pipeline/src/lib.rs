//! Sealgate Pipeline Library
//!
//! Screening pipeline for uploads that may arrive wrapped in an
//! information-protection envelope: discovery, policy checks, content
//! sniffing and unprotected republishing.

pub mod headers;
pub mod pipeline;
pub mod pool;
pub mod reader;
mod republish;
pub mod sniff;

pub use pipeline::{ScreenOptions, UploadScreener};
