//! Sealgate Engine Library
//!
//! Capability traits for information-protection engines, plus an in-process
//! AES-GCM implementation used in development and tests.

pub mod memory;
pub mod traits;

pub use memory::MemoryEngine;
pub use traits::{
    rights, CommitTarget, DecryptedContent, EngineError, EngineResult, FileHandle,
    LabelingOptions, ProtectionEngine, ProtectionHandle, ProtectionScheme, ProtectionSettings,
};
