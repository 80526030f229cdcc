//! Health assessment data models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall health grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthCategory {
    Critical,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl HealthCategory {
    /// Grade a clamped score: 90 / 75 / 60 / 40 band boundaries
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Self::Excellent,
            75..=89 => Self::Good,
            60..=74 => Self::Fair,
            40..=59 => Self::Poor,
            _ => Self::Critical,
        }
    }
}

impl fmt::Display for HealthCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Critical => "Critical",
            Self::Poor => "Poor",
            Self::Fair => "Fair",
            Self::Good => "Good",
            Self::Excellent => "Excellent",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Part of the network a warning refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Interface,
    Wifi,
    Latency,
    Speed,
    Bandwidth,
    Dns,
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Interface => "interface",
            Self::Wifi => "wifi",
            Self::Latency => "latency",
            Self::Speed => "speed",
            Self::Bandwidth => "bandwidth",
            Self::Dns => "dns",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthWarning {
    pub severity: Severity,
    pub area: Area,
    pub message: String,
}

/// Points taken off the score and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    pub area: Area,
    pub points: u8,
    pub reason: String,
}

/// Graded verdict over one interface record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthAssessment {
    pub score: u8,
    pub category: HealthCategory,
    pub warnings: Vec<HealthWarning>,
    pub recommendations: Vec<String>,
    pub deductions: Vec<Deduction>,
}

impl HealthAssessment {
    pub fn has_critical(&self) -> bool {
        self.warnings.iter().any(|w| w.severity == Severity::Critical)
    }

    pub fn warnings_in(&self, area: Area) -> impl Iterator<Item = &HealthWarning> {
        self.warnings.iter().filter(move |w| w.area == area)
    }

    /// Sum of all deductions before clamping
    pub fn total_deducted(&self) -> u32 {
        self.deductions.iter().map(|d| d.points as u32).sum()
    }
}
