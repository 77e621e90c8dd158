use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// Ordinal sensitivity taxonomy for classification labels
///
/// Ordering follows the numeric value: `Unclassified < Low < Medium < High`.
/// Catalog labels carry the raw numeric sensitivity; this enum is the policy
/// vocabulary used in configuration and screening thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityLevel {
    Unclassified = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

impl SensitivityLevel {
    /// Numeric value as published by label catalogs.
    pub fn value(self) -> i32 {
        self as i32
    }
}

impl FromStr for SensitivityLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unclassified" => Ok(SensitivityLevel::Unclassified),
            "low" => Ok(SensitivityLevel::Low),
            "medium" => Ok(SensitivityLevel::Medium),
            "high" => Ok(SensitivityLevel::High),
            _ => Err(anyhow::anyhow!("Invalid sensitivity level: {}", s)),
        }
    }
}

impl Display for SensitivityLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SensitivityLevel::Unclassified => write!(f, "unclassified"),
            SensitivityLevel::Low => write!(f, "low"),
            SensitivityLevel::Medium => write!(f, "medium"),
            SensitivityLevel::High => write!(f, "high"),
        }
    }
}

/// A classification label from an engine's catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: Uuid,
    pub name: String,
    /// Raw ordinal sensitivity; compared against `SensitivityLevel::value()`.
    pub sensitivity: i32,
}

/// How a label ended up on a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentMethod {
    Standard,
    Privileged,
    Auto,
}

/// Classification metadata attached to a file, as reported by its handle
///
/// Read-only from the pipeline's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentLabel {
    pub label: Label,
    pub assignment_method: AssignmentMethod,
    pub assigned_at: Option<DateTime<Utc>>,
}

impl ContentLabel {
    pub fn sensitivity(&self) -> i32 {
        self.label.sensitivity
    }
}
