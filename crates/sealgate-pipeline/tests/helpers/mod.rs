//! Test helpers: fixture payloads and an instrumented engine wrapper.
//!
//! Run from workspace root: `cargo test -p sealgate-pipeline --test screening_test`
//! or `cargo test -p sealgate-pipeline`.

pub mod fixtures;
pub mod probe;

use sealgate_core::ScreenerConfig;
use sealgate_engine::{MemoryEngine, ProtectionEngine};
use sealgate_pipeline::UploadScreener;
use std::sync::Arc;

pub const TEST_KEY: [u8; 32] = [11u8; 32];

/// Fully-granted engine all tests start from.
pub fn test_engine() -> MemoryEngine {
    MemoryEngine::new(&TEST_KEY).unwrap()
}

pub fn screener<E>(engine: E) -> UploadScreener
where
    E: ProtectionEngine + 'static,
{
    UploadScreener::new(Arc::new(engine), ScreenerConfig::default())
}

pub fn screener_with_config<E>(engine: E, config: ScreenerConfig) -> UploadScreener
where
    E: ProtectionEngine + 'static,
{
    UploadScreener::new(Arc::new(engine), config)
}
