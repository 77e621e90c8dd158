//! Data models for the screening pipeline
//!
//! Labels and sensitivity taxonomy, rejection reasons, the screening report,
//! and the uploaded-file wrapper.

mod label;
mod reason;
mod report;
mod upload;

// Re-export all models for convenient imports
pub use label::*;
pub use reason::*;
pub use report::*;
pub use upload::*;
