use super::label::ContentLabel;
use super::reason::{InvalidReason, ValidationRejection};

/// Unprotected artifact produced by a successful republish commit
#[derive(Debug, Clone)]
pub struct RepublishOutcome {
    pub bytes: Vec<u8>,
    pub success: bool,
}

impl RepublishOutcome {
    pub fn committed(bytes: Vec<u8>) -> Self {
        RepublishOutcome {
            bytes,
            success: true,
        }
    }
}

/// Final artifact of one screening pass
///
/// Built exactly once per invocation and immutable afterwards. Validity is
/// defined as "no reasons accumulated"; `rejected` constructs the recovered
/// form used when screening aborts before any file state is established.
#[derive(Debug, Clone)]
pub struct ScreeningReport {
    pub file_name: String,
    pub original_bytes: Vec<u8>,
    pub is_valid: bool,
    pub was_protected: bool,
    pub decrypted_bytes: Option<Vec<u8>>,
    pub content_label: Option<ContentLabel>,
    pub reasons: Vec<InvalidReason>,
    pub republish: Option<RepublishOutcome>,
}

impl ScreeningReport {
    /// Report for a screening recovered from an engine failure: no protection
    /// state, no label, just the mapped reasons.
    pub fn rejected(
        file_name: impl Into<String>,
        original_bytes: Vec<u8>,
        reasons: Vec<InvalidReason>,
    ) -> Self {
        ScreeningReport {
            file_name: file_name.into(),
            original_bytes,
            is_valid: false,
            was_protected: false,
            decrypted_bytes: None,
            content_label: None,
            reasons,
            republish: None,
        }
    }

    /// Rejection summary for invalid reports, `None` when the file passed.
    pub fn rejection(&self) -> Option<ValidationRejection> {
        if self.is_valid {
            None
        } else {
            Some(ValidationRejection::new(&self.file_name, &self.reasons))
        }
    }
}
