//! Sealgate Core Library
//!
//! This crate provides the shared domain types for the protected-file
//! screening pipeline: upload and label models, rejection reasons, screening
//! reports, configuration, and telemetry bootstrap.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod models;
pub mod telemetry;

// Re-export commonly used types
pub use config::ScreenerConfig;
pub use error::PipelineError;
pub use fingerprint::content_fingerprint;
pub use models::{
    AssignmentMethod, ContentLabel, FileUpload, InvalidReason, Label, RepublishOutcome,
    ScreeningReport, SensitivityLevel, ValidationRejection,
};
pub use telemetry::{init_telemetry, shutdown_telemetry};
