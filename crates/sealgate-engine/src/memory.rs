//! In-process protection engine
//!
//! `MemoryEngine` implements the engine capability set over a sealed-envelope
//! format: a plaintext header carrying label and scheme metadata, followed by
//! an AES-256-GCM payload. It backs local development and the test suites;
//! `seal` produces protected inputs without a real protection service.
//!
//! An engine value represents one caller session: access checks answer for
//! the session's granted rights, and sealed content is only readable by
//! engines sharing the same key.

use crate::traits::{
    rights, CommitTarget, DecryptedContent, EngineError, EngineResult, FileHandle,
    LabelingOptions, ProtectionEngine, ProtectionHandle, ProtectionScheme, ProtectionSettings,
};
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use sealgate_core::content_fingerprint;
use sealgate_core::models::{AssignmentMethod, ContentLabel, Label};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::io::Cursor;
use uuid::Uuid;

const ENVELOPE_MAGIC: &[u8] = b"SGSEAL";
const ENVELOPE_VERSION: &[u8] = b"01";
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Plaintext metadata prefix of a sealed envelope
#[derive(Debug, Serialize, Deserialize)]
struct EnvelopeHeader {
    label: Label,
    assignment_method: AssignmentMethod,
    assigned_at: Option<DateTime<Utc>>,
    scheme: ProtectionScheme,
}

/// In-process protection engine bound to one caller session
#[derive(Clone)]
pub struct MemoryEngine {
    cipher: Aes256Gcm,
    catalog: Vec<Label>,
    default_label: Option<Label>,
    granted_rights: Vec<String>,
}

impl fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("catalog", &self.catalog)
            .field("default_label", &self.default_label)
            .field("granted_rights", &self.granted_rights)
            .finish_non_exhaustive()
    }
}

impl MemoryEngine {
    /// Create an engine from a raw 32-byte key, with the stock catalog and
    /// every right granted.
    pub fn new(key_bytes: &[u8]) -> EngineResult<Self> {
        if key_bytes.len() != KEY_LEN {
            return Err(EngineError::ConfigError(
                "Engine key must be 32 bytes (256 bits)".to_string(),
            ));
        }
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        Ok(MemoryEngine {
            cipher: Aes256Gcm::new(key),
            catalog: Self::default_catalog(),
            default_label: None,
            granted_rights: vec![
                rights::VIEW.to_string(),
                rights::EDIT.to_string(),
                rights::EXTRACT.to_string(),
            ],
        })
    }

    /// Create an engine from `SEALGATE_ENGINE_KEY`, a base64-encoded
    /// 32-byte key.
    pub fn from_env() -> EngineResult<Self> {
        let key_str = env::var("SEALGATE_ENGINE_KEY").map_err(|_| {
            EngineError::ConfigError(
                "SEALGATE_ENGINE_KEY environment variable not set".to_string(),
            )
        })?;
        let key_bytes = general_purpose::STANDARD
            .decode(&key_str)
            .map_err(|e| EngineError::ConfigError(format!("Failed to decode engine key: {}", e)))?;
        Self::new(&key_bytes)
    }

    pub fn with_catalog(mut self, catalog: Vec<Label>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_default_label(mut self, label: Label) -> Self {
        self.default_label = Some(label);
        self
    }

    /// Replace the session's granted rights.
    pub fn with_rights(mut self, granted: &[&str]) -> Self {
        self.granted_rights = granted.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Stock four-level catalog, lowest sensitivity first.
    pub fn default_catalog() -> Vec<Label> {
        [
            ("Public", 0),
            ("General", 1),
            ("Confidential", 2),
            ("Highly Confidential", 3),
        ]
        .into_iter()
        .map(|(name, sensitivity)| Label {
            id: Uuid::new_v4(),
            name: name.to_string(),
            sensitivity,
        })
        .collect()
    }

    /// Seal `plaintext` into a protected envelope carrying `label`.
    pub fn seal(
        &self,
        plaintext: &[u8],
        label: &Label,
        scheme: ProtectionScheme,
    ) -> EngineResult<Vec<u8>> {
        if !self.catalog.iter().any(|l| l.id == label.id) {
            return Err(EngineError::LabelingFailed(format!(
                "Label {} is not in the catalog",
                label.name
            )));
        }
        let header = EnvelopeHeader {
            label: label.clone(),
            assignment_method: AssignmentMethod::Standard,
            assigned_at: Some(Utc::now()),
            scheme,
        };
        seal_envelope(&self.cipher, plaintext, &header)
    }

    fn granted(&self, capability: &str) -> bool {
        self.granted_rights
            .iter()
            .any(|r| r.eq_ignore_ascii_case(capability))
    }

    /// Split `bytes` into envelope parts. `None` means the input carries no
    /// envelope at all and is treated as unprotected.
    fn parse_envelope(
        &self,
        bytes: &[u8],
    ) -> EngineResult<Option<(EnvelopeHeader, Vec<u8>, Vec<u8>)>> {
        if bytes.len() < ENVELOPE_MAGIC.len() || &bytes[..ENVELOPE_MAGIC.len()] != ENVELOPE_MAGIC {
            return Ok(None);
        }
        let rest = &bytes[ENVELOPE_MAGIC.len()..];
        if rest.len() < ENVELOPE_VERSION.len() {
            return Err(EngineError::Envelope("Truncated envelope".to_string()));
        }
        let (version, rest) = rest.split_at(ENVELOPE_VERSION.len());
        if version != ENVELOPE_VERSION {
            return Err(EngineError::Unsupported(format!(
                "Envelope version {} is not supported",
                String::from_utf8_lossy(version)
            )));
        }
        if rest.len() < 4 {
            return Err(EngineError::Envelope("Truncated envelope".to_string()));
        }
        let (len_bytes, rest) = rest.split_at(4);
        let mut len_arr = [0u8; 4];
        len_arr.copy_from_slice(len_bytes);
        let header_len = u32::from_le_bytes(len_arr) as usize;
        if rest.len() < header_len + NONCE_LEN {
            return Err(EngineError::Envelope("Truncated envelope".to_string()));
        }
        let (header_json, rest) = rest.split_at(header_len);
        let header: EnvelopeHeader = serde_json::from_slice(header_json)
            .map_err(|e| EngineError::Envelope(format!("Malformed envelope header: {}", e)))?;
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
        Ok(Some((header, nonce.to_vec(), ciphertext.to_vec())))
    }
}

fn seal_envelope(
    cipher: &Aes256Gcm,
    plaintext: &[u8],
    header: &EnvelopeHeader,
) -> EngineResult<Vec<u8>> {
    let header_json = serde_json::to_vec(header)
        .map_err(|e| EngineError::Envelope(format!("Failed to encode envelope header: {}", e)))?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| EngineError::Envelope(format!("Seal failed: {}", e)))?;

    let mut sealed = Vec::with_capacity(
        ENVELOPE_MAGIC.len()
            + ENVELOPE_VERSION.len()
            + 4
            + header_json.len()
            + NONCE_LEN
            + ciphertext.len(),
    );
    sealed.extend_from_slice(ENVELOPE_MAGIC);
    sealed.extend_from_slice(ENVELOPE_VERSION);
    sealed.extend_from_slice(&(header_json.len() as u32).to_le_bytes());
    sealed.extend_from_slice(&header_json);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

#[async_trait]
impl ProtectionEngine for MemoryEngine {
    async fn open(
        &self,
        content: &[u8],
        name: &str,
        audit_discovery: bool,
    ) -> EngineResult<Box<dyn FileHandle>> {
        if audit_discovery {
            tracing::debug!(
                file = %name,
                fingerprint = %content_fingerprint(content),
                "Discovery audit recorded"
            );
        }
        match self.parse_envelope(content)? {
            None => Ok(Box::new(MemoryFileHandle {
                name: name.to_string(),
                catalog: self.catalog.clone(),
                label: None,
                content: HandleContent::Plain(content.to_vec()),
                disposed: false,
            })),
            Some((header, nonce, ciphertext)) => {
                if !self.granted(rights::VIEW) {
                    return Err(EngineError::NoPermission(format!(
                        "Caller may not read {}",
                        name
                    )));
                }
                let label = ContentLabel {
                    label: header.label,
                    assignment_method: header.assignment_method,
                    assigned_at: header.assigned_at,
                };
                Ok(Box::new(MemoryFileHandle {
                    name: name.to_string(),
                    catalog: self.catalog.clone(),
                    label: Some(label),
                    content: HandleContent::Sealed(MemoryProtection {
                        scheme: header.scheme,
                        granted: self.granted_rights.clone(),
                        cipher: self.cipher.clone(),
                        nonce,
                        ciphertext,
                    }),
                    disposed: false,
                }))
            }
        }
    }

    fn default_label(&self) -> Option<Label> {
        self.default_label.clone()
    }

    fn labels(&self) -> Vec<Label> {
        self.catalog.clone()
    }
}

enum HandleContent {
    Plain(Vec<u8>),
    Sealed(MemoryProtection),
}

/// Per-file session produced by [`MemoryEngine::open`]
pub struct MemoryFileHandle {
    name: String,
    catalog: Vec<Label>,
    label: Option<ContentLabel>,
    content: HandleContent,
    disposed: bool,
}

#[async_trait]
impl FileHandle for MemoryFileHandle {
    fn label(&self) -> Option<ContentLabel> {
        self.label.clone()
    }

    fn protection(&self) -> Option<&dyn ProtectionHandle> {
        match &self.content {
            HandleContent::Sealed(protection) => Some(protection),
            HandleContent::Plain(_) => None,
        }
    }

    fn set_label(
        &mut self,
        label: &Label,
        options: &LabelingOptions,
        _settings: &ProtectionSettings,
    ) -> EngineResult<()> {
        if self.disposed {
            return Err(EngineError::LabelingFailed("Handle is disposed".to_string()));
        }
        if !self.catalog.iter().any(|l| l.id == label.id) {
            return Err(EngineError::LabelingFailed(format!(
                "Label {} is not in the catalog",
                label.name
            )));
        }
        if let Some(current) = &self.label {
            if label.sensitivity < current.label.sensitivity {
                if options.assignment_method != AssignmentMethod::Privileged {
                    return Err(EngineError::PrivilegedRequired(format!(
                        "Downgrade from {} to {}",
                        current.label.name, label.name
                    )));
                }
                if !options.downgrade_justified || options.justification_message.trim().is_empty() {
                    return Err(EngineError::JustificationRequired(format!(
                        "Downgrade from {} to {}",
                        current.label.name, label.name
                    )));
                }
                tracing::debug!(
                    file = %self.name,
                    from = %current.label.name,
                    to = %label.name,
                    justification = %options.justification_message,
                    "Label downgrade justified"
                );
            }
        }
        self.label = Some(ContentLabel {
            label: label.clone(),
            assignment_method: options.assignment_method,
            assigned_at: Some(Utc::now()),
        });
        Ok(())
    }

    async fn commit(&mut self, target: CommitTarget<'_>) -> EngineResult<bool> {
        if self.disposed {
            return Err(EngineError::CommitFailed("Handle is disposed".to_string()));
        }
        let published = match &self.content {
            // A plain handle publishes its bytes as-is; the label stays on
            // the handle, nothing is embedded in the content.
            HandleContent::Plain(plaintext) => plaintext.clone(),
            HandleContent::Sealed(protection) => {
                let label = self.label.as_ref().ok_or_else(|| {
                    EngineError::CommitFailed("Protected handle has no label".to_string())
                })?;
                protection.reseal(label)?
            }
        };
        match target {
            CommitTarget::Buffer(buffer) => {
                buffer.clear();
                buffer.extend_from_slice(&published);
            }
            CommitTarget::Path(path) => {
                tokio::fs::write(path, &published).await?;
            }
        }
        tracing::debug!(file = %self.name, size = published.len(), "Commit complete");
        Ok(true)
    }

    async fn dispose(&mut self) -> EngineResult<()> {
        if !self.disposed {
            self.disposed = true;
            tracing::debug!(file = %self.name, "Handle disposed");
        }
        Ok(())
    }
}

/// Read-side protection view of a sealed handle
pub struct MemoryProtection {
    scheme: ProtectionScheme,
    granted: Vec<String>,
    cipher: Aes256Gcm,
    nonce: Vec<u8>,
    ciphertext: Vec<u8>,
}

impl MemoryProtection {
    fn decrypt(&self) -> EngineResult<Vec<u8>> {
        self.cipher
            .decrypt(Nonce::from_slice(&self.nonce), self.ciphertext.as_slice())
            .map_err(|e| EngineError::DecryptionFailed(e.to_string()))
    }

    /// Fresh envelope over the same payload under `label`.
    fn reseal(&self, label: &ContentLabel) -> EngineResult<Vec<u8>> {
        let plaintext = self.decrypt()?;
        let header = EnvelopeHeader {
            label: label.label.clone(),
            assignment_method: label.assignment_method,
            assigned_at: label.assigned_at,
            scheme: self.scheme,
        };
        seal_envelope(&self.cipher, &plaintext, &header)
    }
}

#[async_trait]
impl ProtectionHandle for MemoryProtection {
    fn scheme(&self) -> ProtectionScheme {
        self.scheme
    }

    fn access_check(&self, capability: &str) -> bool {
        self.granted
            .iter()
            .any(|r| r.eq_ignore_ascii_case(capability))
    }

    async fn decrypted_content(&self) -> EngineResult<DecryptedContent> {
        let plaintext = self.decrypt()?;
        Ok(DecryptedContent {
            len: Some(plaintext.len() as u64),
            reader: Box::pin(Cursor::new(plaintext)),
        })
    }
}
