//! EMIS downloads and their category remap.
//!
//! Downloads were first filed as `report_form` or `resource`. The current set is
//! `reports`, `forms` and `downloads`. The forward remap is total over the old
//! set; the inverse cannot recover a predecessor for `forms`, so rolling the remap
//! back leaves those rows as they are.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CampusError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmisCategory {
    Reports,
    Forms,
    #[default]
    Downloads,
}

impl EmisCategory {
    pub const ALL: [EmisCategory; 3] = [
        EmisCategory::Reports,
        EmisCategory::Forms,
        EmisCategory::Downloads,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmisCategory::Reports => "reports",
            EmisCategory::Forms => "forms",
            EmisCategory::Downloads => "downloads",
        }
    }
}

impl fmt::Display for EmisCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmisCategory {
    type Err = CampusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmisCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| CampusError::Validation(format!("Unknown EMIS category: {}", s)))
    }
}

/// Categories used before the remap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyEmisCategory {
    ReportForm,
    Resource,
}

impl LegacyEmisCategory {
    pub const ALL: [LegacyEmisCategory; 2] =
        [LegacyEmisCategory::ReportForm, LegacyEmisCategory::Resource];

    pub fn as_str(self) -> &'static str {
        match self {
            LegacyEmisCategory::ReportForm => "report_form",
            LegacyEmisCategory::Resource => "resource",
        }
    }
}

impl From<LegacyEmisCategory> for EmisCategory {
    fn from(legacy: LegacyEmisCategory) -> Self {
        match legacy {
            LegacyEmisCategory::ReportForm => EmisCategory::Reports,
            LegacyEmisCategory::Resource => EmisCategory::Downloads,
        }
    }
}

impl EmisCategory {
    /// Predecessor of this category, if it had one.
    pub fn legacy(self) -> Option<LegacyEmisCategory> {
        match self {
            EmisCategory::Reports => Some(LegacyEmisCategory::ReportForm),
            EmisCategory::Downloads => Some(LegacyEmisCategory::Resource),
            EmisCategory::Forms => None,
        }
    }
}

/// Forward remap of a stored category value. Values outside the legacy set pass
/// through untouched.
pub fn remap_forward(stored: &str) -> &str {
    LegacyEmisCategory::ALL
        .into_iter()
        .find(|legacy| legacy.as_str() == stored)
        .map(|legacy| EmisCategory::from(legacy).as_str())
        .unwrap_or(stored)
}

/// Best-effort inverse of [`remap_forward`]; `forms` and unknown values pass
/// through untouched.
pub fn remap_backward(stored: &str) -> &str {
    stored
        .parse::<EmisCategory>()
        .ok()
        .and_then(EmisCategory::legacy)
        .map(LegacyEmisCategory::as_str)
        .unwrap_or(stored)
}

/// `(from, to)` pairs applied by the forward remap.
pub fn forward_pairs() -> Vec<(&'static str, &'static str)> {
    LegacyEmisCategory::ALL
        .into_iter()
        .map(|legacy| (legacy.as_str(), EmisCategory::from(legacy).as_str()))
        .collect()
}

/// `(from, to)` pairs applied when rolling the remap back.
pub fn backward_pairs() -> Vec<(&'static str, &'static str)> {
    EmisCategory::ALL
        .into_iter()
        .filter_map(|category| {
            category
                .legacy()
                .map(|legacy| (category.as_str(), legacy.as_str()))
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmisDownload {
    pub id: Uuid,
    pub title: String,
    pub file_url: String,
    pub category: EmisCategory,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmisDownloadRequest {
    pub title: String,
    pub file_url: String,
    #[serde(default)]
    pub category: EmisCategory,
}
