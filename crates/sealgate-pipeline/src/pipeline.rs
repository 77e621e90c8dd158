//! Upload screening pipeline
//!
//! Orchestrates one screening pass: protection discovery through the engine,
//! policy evaluation, content sniffing before or after decryption, and the
//! optional unprotected republish. Engine handles and spill files opened
//! along the way are always released, whatever path the pass takes.

use crate::pool::ChunkPool;
use crate::reader::read_decrypted;
use crate::republish::republish_unprotected;
use crate::sniff;
use sealgate_core::models::{
    ContentLabel, FileUpload, InvalidReason, RepublishOutcome, ScreeningReport, SensitivityLevel,
};
use sealgate_core::{content_fingerprint, PipelineError, ScreenerConfig};
use sealgate_engine::{
    rights, EngineError, FileHandle, ProtectionEngine, ProtectionScheme,
};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-call knobs for one screening pass
#[derive(Debug, Clone, Default)]
pub struct ScreenOptions {
    /// Publish an unprotected copy when a protected upload passes every check.
    pub republish: bool,
    /// Reject protected uploads labeled above this sensitivity.
    pub max_sensitivity: Option<SensitivityLevel>,
    /// Require edit and extract rights on protected uploads.
    pub require_edit_rights: bool,
    /// Reject uploads that carry no protection at all.
    pub require_protected: bool,
}

/// Screens uploads against protection policy and content signatures
pub struct UploadScreener {
    engine: Arc<dyn ProtectionEngine>,
    config: ScreenerConfig,
    pool: ChunkPool,
}

impl UploadScreener {
    pub fn new(engine: Arc<dyn ProtectionEngine>, config: ScreenerConfig) -> Self {
        UploadScreener {
            engine,
            config,
            pool: ChunkPool::new(),
        }
    }

    /// Screen an upload with the service defaults: protected pdfs are
    /// republished unprotected, and the configured sensitivity cap applies.
    pub async fn screen_upload(
        &self,
        upload: &FileUpload,
    ) -> Result<ScreeningReport, PipelineError> {
        let options = ScreenOptions {
            republish: upload.is_pdf(),
            max_sensitivity: self.config.max_sensitivity,
            ..ScreenOptions::default()
        };
        self.screen(
            &upload.bytes,
            upload.base_name(),
            &upload.extension(),
            &options,
        )
        .await
    }

    pub async fn screen(
        &self,
        bytes: &[u8],
        file_name: &str,
        extension: &str,
        options: &ScreenOptions,
    ) -> Result<ScreeningReport, PipelineError> {
        self.screen_with_cancel(bytes, file_name, extension, options, &CancellationToken::new())
            .await
    }

    /// Screen an upload, abandoning work as soon as `cancel` fires. Cleanup
    /// of engine handles and spill files still runs after cancellation.
    pub async fn screen_with_cancel(
        &self,
        bytes: &[u8],
        file_name: &str,
        extension: &str,
        options: &ScreenOptions,
        cancel: &CancellationToken,
    ) -> Result<ScreeningReport, PipelineError> {
        if file_name.is_empty() {
            return Err(PipelineError::InvalidArgument(
                "file name is empty".to_string(),
            ));
        }
        if extension.is_empty() {
            return Err(PipelineError::InvalidArgument(
                "file extension is empty".to_string(),
            ));
        }

        let original = bytes.to_vec();
        tracing::debug!(
            file = %file_name,
            size = original.len(),
            fingerprint = %content_fingerprint(&original),
            "Screening upload"
        );

        let mut scope = CleanupScope::default();
        let outcome = self
            .drive(&original, file_name, extension, options, cancel, &mut scope)
            .await;
        scope.release().await;

        match outcome {
            Ok(screened) => Ok(ScreeningReport {
                file_name: file_name.to_string(),
                original_bytes: original,
                is_valid: screened.reasons.is_empty(),
                was_protected: screened.was_protected,
                decrypted_bytes: screened.decrypted,
                content_label: screened.content_label,
                reasons: screened.reasons,
                republish: screened.republish,
            }),
            Err(DriveFailure::Cancelled) => {
                tracing::debug!(file = %file_name, "Screening cancelled");
                Err(PipelineError::Cancelled)
            }
            Err(DriveFailure::Engine(err)) => Ok(recover(file_name, original, err)),
        }
    }

    async fn drive(
        &self,
        original: &[u8],
        file_name: &str,
        extension: &str,
        options: &ScreenOptions,
        cancel: &CancellationToken,
        scope: &mut CleanupScope,
    ) -> Result<Screened, DriveFailure> {
        let mut reasons = Vec::new();

        if !self.config.extension_allowed(extension) {
            tracing::debug!(
                file = %file_name,
                extension = %extension,
                "Extension not in the allow list"
            );
            reasons.push(InvalidReason::FileType);
        }

        let opened = checked(cancel, self.engine.open(original, file_name, true)).await??;
        let handle = scope.primary.insert(opened);
        tracing::debug!(file = %file_name, "Protection handle created");

        let content_label = handle.label();
        let was_protected = handle.protection().is_some();

        let (policy_reasons, decrypted) = self
            .evaluate(
                handle.as_ref(),
                content_label.as_ref(),
                original,
                extension,
                options,
                cancel,
            )
            .await?;
        reasons.extend(policy_reasons);

        let mut republish = None;
        if options.republish && reasons.is_empty() && was_protected {
            if let Some(payload) = &decrypted {
                republish = republish_unprotected(
                    self.engine.as_ref(),
                    &self.config,
                    payload,
                    extension,
                    &mut scope.republish,
                    &mut scope.temp_file,
                    cancel,
                )
                .await?;
            }
        }

        Ok(Screened {
            was_protected,
            content_label,
            decrypted,
            reasons,
            republish,
        })
    }

    /// Policy checks for one opened handle. Decryption only happens when
    /// every check on the protected branch passed.
    async fn evaluate(
        &self,
        handle: &dyn FileHandle,
        content_label: Option<&ContentLabel>,
        original: &[u8],
        extension: &str,
        options: &ScreenOptions,
        cancel: &CancellationToken,
    ) -> Result<(Vec<InvalidReason>, Option<Vec<u8>>), DriveFailure> {
        let mut reasons = Vec::new();

        let Some(view) = handle.protection() else {
            // Nothing to decrypt; sniff the upload bytes as they came in.
            if options.require_protected {
                reasons.push(InvalidReason::AlreadyUnprotected);
            }
            if !sniff::matches_bytes(original, extension) {
                tracing::debug!(
                    extension = %extension,
                    detected = sniff::detect_mime(original).unwrap_or("unknown"),
                    "Content does not match the claimed extension"
                );
                reasons.push(InvalidReason::ContentType);
            }
            return Ok((reasons, None));
        };

        if view.scheme() != ProtectionScheme::TemplateBased {
            reasons.push(InvalidReason::ProtectionType);
        }
        if let Some(max) = options.max_sensitivity {
            match content_label {
                Some(label) if label.sensitivity() > max.value() => {
                    reasons.push(InvalidReason::SensitivityLevel);
                }
                Some(_) => {}
                None => {
                    tracing::debug!("Protected upload carries no label; sensitivity cap skipped");
                }
            }
        }
        if options.require_edit_rights {
            if !view.access_check(rights::EDIT) {
                reasons.push(InvalidReason::NotEditor);
            }
            if !view.access_check(rights::EXTRACT) {
                reasons.push(InvalidReason::NotExtractor);
            }
        }

        if !reasons.is_empty() {
            return Ok((reasons, None));
        }

        let decrypted = checked(cancel, read_decrypted(view, &self.pool)).await??;
        if !sniff::matches_bytes(&decrypted, extension) {
            tracing::debug!(
                extension = %extension,
                detected = sniff::detect_mime(&decrypted).unwrap_or("unknown"),
                "Decrypted content does not match the claimed extension"
            );
            reasons.push(InvalidReason::ContentType);
        }
        Ok((reasons, Some(decrypted)))
    }
}

/// What one drive pass established before the report is assembled
struct Screened {
    was_protected: bool,
    content_label: Option<ContentLabel>,
    decrypted: Option<Vec<u8>>,
    reasons: Vec<InvalidReason>,
    republish: Option<RepublishOutcome>,
}

/// Map an engine failure to the recovered single-reason report.
fn recover(file_name: &str, original: Vec<u8>, err: EngineError) -> ScreeningReport {
    let reason = match &err {
        EngineError::AccessDenied(_) | EngineError::NoPermission(_) => {
            tracing::warn!(file = %file_name, error = %err, "Access denied by the protection service");
            InvalidReason::AccessDenied
        }
        EngineError::Unsupported(_) => {
            tracing::warn!(file = %file_name, error = %err, "Protection scheme is not supported");
            InvalidReason::ProtectionNotSupported
        }
        _ => {
            tracing::error!(file = %file_name, error = %err, "Screening failed");
            InvalidReason::Unknown
        }
    };
    ScreeningReport::rejected(file_name, original, vec![reason])
}

#[derive(Debug)]
pub(crate) enum DriveFailure {
    Engine(EngineError),
    Cancelled,
}

impl From<EngineError> for DriveFailure {
    fn from(err: EngineError) -> Self {
        DriveFailure::Engine(err)
    }
}

impl From<std::io::Error> for DriveFailure {
    fn from(err: std::io::Error) -> Self {
        DriveFailure::Engine(EngineError::IoError(err))
    }
}

/// Race `future` against the cancellation token. A token cancelled before
/// the call wins over a future that is already ready.
pub(crate) async fn checked<F, T>(cancel: &CancellationToken, future: F) -> Result<T, DriveFailure>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DriveFailure::Cancelled),
        output = future => Ok(output),
    }
}

/// Engine handles and spill files to release when a screening pass ends
#[derive(Default)]
pub(crate) struct CleanupScope {
    pub(crate) primary: Option<Box<dyn FileHandle>>,
    pub(crate) republish: Option<Box<dyn FileHandle>>,
    pub(crate) temp_file: Option<PathBuf>,
}

impl CleanupScope {
    /// Dispose handles and remove spill files. Failures are logged and
    /// swallowed; cleanup runs to the end regardless.
    pub(crate) async fn release(mut self) {
        tracing::debug!("Start cleanup");
        if let Some(mut handle) = self.primary.take() {
            if let Err(err) = handle.dispose().await {
                tracing::debug!(error = %err, "Failed to dispose the primary handle");
            }
        }
        if let Some(mut handle) = self.republish.take() {
            if let Err(err) = handle.dispose().await {
                tracing::debug!(error = %err, "Failed to dispose the republish handle");
            }
        }
        if let Some(path) = self.temp_file.take() {
            if let Err(err) = tokio::fs::remove_file(&path).await {
                tracing::debug!(path = %path.display(), error = %err, "Failed to remove the spill file");
            }
        }
        tracing::debug!("Finish cleanup");
    }
}
