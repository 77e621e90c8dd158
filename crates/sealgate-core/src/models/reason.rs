use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Why a screened file was rejected
///
/// A file can accumulate several reasons in one pass; a file with none is
/// valid. `ContentType` is the post-decryption content check, `FileType` the
/// pre-engine extension allowlist check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    Unknown,
    FileType,
    ProtectionType,
    SensitivityLevel,
    AccessDenied,
    NotEditor,
    NotExtractor,
    AlreadyUnprotected,
    ProtectionNotSupported,
    ContentType,
}

impl Display for InvalidReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            InvalidReason::Unknown => "unknown",
            InvalidReason::FileType => "file_type",
            InvalidReason::ProtectionType => "protection_type",
            InvalidReason::SensitivityLevel => "sensitivity_level",
            InvalidReason::AccessDenied => "access_denied",
            InvalidReason::NotEditor => "not_editor",
            InvalidReason::NotExtractor => "not_extractor",
            InvalidReason::AlreadyUnprotected => "already_unprotected",
            InvalidReason::ProtectionNotSupported => "protection_not_supported",
            InvalidReason::ContentType => "content_type",
        };
        write!(f, "{}", name)
    }
}

/// Serializable rejection summary for an invalid screening report
///
/// Shaped for callers that turn a failed screening into a structured
/// response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRejection {
    pub file_name: String,
    pub message: String,
    pub reasons: Vec<String>,
}

impl ValidationRejection {
    pub const BASE_MESSAGE: &'static str = "File failed protection screening";

    pub fn new(file_name: impl Into<String>, reasons: &[InvalidReason]) -> Self {
        ValidationRejection {
            file_name: file_name.into(),
            message: Self::BASE_MESSAGE.to_string(),
            reasons: reasons.iter().map(|r| r.to_string()).collect(),
        }
    }
}
