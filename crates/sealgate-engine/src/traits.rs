//! Protection engine abstraction
//!
//! This module defines the capability set the screening pipeline needs from
//! an information-protection engine: open a per-file handle, inspect its
//! protection and label, decrypt, relabel, commit, dispose. Any conforming
//! implementation can stand in for the real engine, including test fakes.

use async_trait::async_trait;
use sealgate_core::models::{AssignmentMethod, ContentLabel, Label};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Permission names understood by [`ProtectionHandle::access_check`]
pub mod rights {
    /// Read the protected content.
    pub const VIEW: &str = "View";
    /// Modify the protected content.
    pub const EDIT: &str = "Edit";
    /// Copy content out of the protection envelope.
    pub const EXTRACT: &str = "Extract";
}

/// Engine operation errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("No read permission: {0}")]
    NoPermission(String),

    #[error("Protection not supported: {0}")]
    Unsupported(String),

    #[error("Downgrade justification required: {0}")]
    JustificationRequired(String),

    #[error("Privileged assignment required: {0}")]
    PrivilegedRequired(String),

    #[error("Labeling failed: {0}")]
    LabelingFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Commit failed: {0}")]
    CommitFailed(String),

    #[error("Envelope error: {0}")]
    Envelope(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// How a file's protection is keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionScheme {
    /// Driven by a predefined policy template.
    TemplateBased,
    /// Ad hoc protection defined by the publisher.
    Custom,
}

/// Options for a label assignment
#[derive(Debug, Clone)]
pub struct LabelingOptions {
    pub assignment_method: AssignmentMethod,
    pub downgrade_justified: bool,
    pub justification_message: String,
}

/// Protection settings applied alongside a label assignment.
/// Carries no knobs yet; keeps the `set_label` call shape stable.
#[derive(Debug, Clone, Default)]
pub struct ProtectionSettings;

/// Decrypted content handed out by a protection handle
///
/// `len` is present when the source knows its exact size up front; the reader
/// then yields exactly that many bytes.
pub struct DecryptedContent {
    pub len: Option<u64>,
    pub reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
}

impl fmt::Debug for DecryptedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptedContent")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Destination for a commit
pub enum CommitTarget<'a> {
    Buffer(&'a mut Vec<u8>),
    Path(&'a Path),
}

/// Protection engine abstraction
///
/// Opens protection-aware handles over raw content and exposes the label
/// catalog used when republishing.
#[async_trait]
pub trait ProtectionEngine: Send + Sync {
    /// Open a per-file handle over `content`.
    ///
    /// Fails with `AccessDenied`/`NoPermission` when the caller may not read
    /// the protected content and with `Unsupported` for protection formats
    /// the engine does not understand.
    async fn open(
        &self,
        content: &[u8],
        name: &str,
        audit_discovery: bool,
    ) -> EngineResult<Box<dyn FileHandle>>;

    /// Label applied to republished files when one is configured.
    fn default_label(&self) -> Option<Label>;

    /// The engine's label catalog.
    fn labels(&self) -> Vec<Label>;
}

/// Per-file session with the engine
///
/// Exactly one handle per file per direction; must be disposed exactly once.
#[async_trait]
pub trait FileHandle: Send + Sync {
    /// Classification label currently on the file, if any.
    fn label(&self) -> Option<ContentLabel>;

    /// Protection state; `None` means the file is unprotected.
    fn protection(&self) -> Option<&dyn ProtectionHandle>;

    /// Stage a label assignment on the handle.
    fn set_label(
        &mut self,
        label: &Label,
        options: &LabelingOptions,
        settings: &ProtectionSettings,
    ) -> EngineResult<()>;

    /// Write the handle's current state to `target`. Returns `false` when the
    /// engine declines the commit without a hard failure.
    async fn commit(&mut self, target: CommitTarget<'_>) -> EngineResult<bool>;

    /// Release the session.
    async fn dispose(&mut self) -> EngineResult<()>;
}

impl fmt::Debug for dyn FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle").finish_non_exhaustive()
    }
}

/// Read-side view of a file's protection
#[async_trait]
pub trait ProtectionHandle: Send + Sync {
    fn scheme(&self) -> ProtectionScheme;

    /// Whether the caller holds the named permission (see [`rights`]).
    fn access_check(&self, capability: &str) -> bool;

    /// Decrypt the protected payload.
    async fn decrypted_content(&self) -> EngineResult<DecryptedContent>;
}
