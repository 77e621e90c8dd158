//! Unprotected republishing
//!
//! Opens a second engine session over the decrypted payload, labels it for
//! public release and commits it. Payloads above the configured spill size
//! commit through a temp file instead of an in-memory buffer.

use crate::pipeline::{checked, DriveFailure};
use sealgate_core::models::{AssignmentMethod, RepublishOutcome};
use sealgate_core::ScreenerConfig;
use sealgate_engine::{
    CommitTarget, EngineError, FileHandle, LabelingOptions, ProtectionEngine, ProtectionSettings,
};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Republish `decrypted` under the engine's public label.
///
/// The opened handle and any spill path land in the caller's slots so they
/// are released with the rest of the screening pass. `Ok(None)` means the
/// engine declined the commit.
pub(crate) async fn republish_unprotected(
    engine: &dyn ProtectionEngine,
    config: &ScreenerConfig,
    decrypted: &[u8],
    extension: &str,
    republish_slot: &mut Option<Box<dyn FileHandle>>,
    temp_slot: &mut Option<PathBuf>,
    cancel: &CancellationToken,
) -> Result<Option<RepublishOutcome>, DriveFailure> {
    let artifact = format!("{}{}", Uuid::new_v4(), extension);
    let opened = checked(cancel, engine.open(decrypted, &artifact, false)).await??;
    let handle = republish_slot.insert(opened);

    let target = match engine.default_label() {
        Some(label) => label,
        None => engine
            .labels()
            .into_iter()
            .min_by_key(|label| label.sensitivity)
            .ok_or_else(|| EngineError::LabelingFailed("No public label available".to_string()))?,
    };
    let options = LabelingOptions {
        assignment_method: AssignmentMethod::Privileged,
        downgrade_justified: true,
        justification_message: config.justification_message.clone(),
    };

    if let Err(err) = handle.set_label(&target, &options, &ProtectionSettings) {
        match err {
            // The first labeling call sometimes fails even with the
            // justification supplied; retry once with the same options.
            EngineError::JustificationRequired(_) | EngineError::PrivilegedRequired(_) => {
                tracing::debug!(file = %artifact, error = %err, "Retrying the labeling call");
                handle.set_label(&target, &options, &ProtectionSettings)?;
            }
            other => return Err(other.into()),
        }
    }
    tracing::debug!(file = %artifact, label = %target.name, "Unprotected label applied");

    let committed;
    let mut published = Vec::new();
    if decrypted.len() as u64 > config.republish_spill_bytes() {
        // Record the spill path before the commit so an interrupted write
        // still gets removed.
        let path = temp_slot.insert(config.temp_dir.join(&artifact));
        committed = checked(cancel, handle.commit(CommitTarget::Path(path.as_path()))).await??;
        if committed {
            published = checked(cancel, tokio::fs::read(path.as_path())).await??;
        }
    } else {
        committed = checked(cancel, handle.commit(CommitTarget::Buffer(&mut published))).await??;
    }

    if !committed {
        tracing::warn!(file = %artifact, "Engine declined the republish commit");
        return Ok(None);
    }

    tracing::debug!(
        file = %artifact,
        size = published.len(),
        "Republished without protection"
    );
    Ok(Some(RepublishOutcome::committed(published)))
}
