//! Configuration module
//!
//! Runtime settings for the upload screener, loaded from the environment with
//! defaulted parses. Malformed values are never fatal: the best-effort parse
//! helpers log the bad value and fall back to the default.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::models::SensitivityLevel;

const DEFAULT_REPUBLISH_SPILL_MB: u64 = 100;
const DEFAULT_JUSTIFICATION_MESSAGE: &str = "Pdfs require a version that is Unclassified";

/// Runtime settings for the upload screener
#[derive(Clone, Debug)]
pub struct ScreenerConfig {
    /// Highest label sensitivity accepted on protected uploads.
    /// `None` disables the sensitivity check.
    pub max_sensitivity: Option<SensitivityLevel>,
    /// Claimed extensions accepted for screening (lower-cased, leading dot).
    /// Empty list disables the allowlist check.
    pub allowed_extensions: Vec<String>,
    /// Republished payloads above this many megabytes commit through a temp
    /// file instead of an in-memory buffer.
    pub republish_spill_mb: u64,
    /// Justification recorded when downgrading a republished file to the
    /// public label.
    pub justification_message: String,
    /// Directory for republish spill files.
    pub temp_dir: PathBuf,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        ScreenerConfig {
            max_sensitivity: Some(SensitivityLevel::Medium),
            allowed_extensions: Vec::new(),
            republish_spill_mb: DEFAULT_REPUBLISH_SPILL_MB,
            justification_message: DEFAULT_JUSTIFICATION_MESSAGE.to_string(),
            temp_dir: env::temp_dir(),
        }
    }
}

impl ScreenerConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = ScreenerConfig::default();

        // "none" disables the sensitivity ceiling entirely.
        let max_sensitivity = match env::var("SEALGATE_MAX_SENSITIVITY") {
            Ok(raw) if raw.eq_ignore_ascii_case("none") => None,
            Ok(raw) => match raw.parse::<SensitivityLevel>() {
                Ok(level) => Some(level),
                Err(e) => {
                    tracing::warn!(
                        key = "SEALGATE_MAX_SENSITIVITY",
                        value = %raw,
                        error = %e,
                        "Ignoring malformed configuration value"
                    );
                    defaults.max_sensitivity
                }
            },
            Err(_) => defaults.max_sensitivity,
        };

        let allowed_extensions = env::var("SEALGATE_ALLOWED_EXTENSIONS")
            .unwrap_or_default()
            .split(',')
            .map(normalize_extension)
            .filter(|e| !e.is_empty())
            .collect();

        let config = ScreenerConfig {
            max_sensitivity,
            allowed_extensions,
            republish_spill_mb: parse_env_or(
                "SEALGATE_REPUBLISH_SPILL_MB",
                defaults.republish_spill_mb,
            ),
            justification_message: env::var("SEALGATE_JUSTIFICATION_MESSAGE")
                .unwrap_or(defaults.justification_message),
            temp_dir: env::var("SEALGATE_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.republish_spill_mb == 0 {
            return Err(anyhow::anyhow!(
                "SEALGATE_REPUBLISH_SPILL_MB must be at least 1"
            ));
        }
        if self.justification_message.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "SEALGATE_JUSTIFICATION_MESSAGE must not be blank"
            ));
        }
        Ok(())
    }

    /// Spill threshold in bytes. Payloads of exactly this size still commit
    /// in memory; the temp-file path starts one byte above it.
    pub fn republish_spill_bytes(&self) -> u64 {
        self.republish_spill_mb * 1024 * 1024
    }

    /// True when `extension` passes the allowlist. An empty allowlist admits
    /// every extension.
    pub fn extension_allowed(&self, extension: &str) -> bool {
        if self.allowed_extensions.is_empty() {
            return true;
        }
        let normalized = normalize_extension(extension);
        self.allowed_extensions.contains(&normalized)
    }
}

/// Parse an environment variable, logging and keeping `default` when the
/// value is present but malformed. Absent values fall back silently.
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    key = key,
                    value = %raw,
                    error = %e,
                    "Ignoring malformed configuration value"
                );
                default
            }
        },
        Err(_) => default,
    }
}

fn normalize_extension(raw: &str) -> String {
    let trimmed = raw.trim().to_lowercase();
    if trimmed.is_empty() || trimmed == "." {
        return String::new();
    }
    if trimmed.starts_with('.') {
        trimmed
    } else {
        format!(".{}", trimmed)
    }
}
