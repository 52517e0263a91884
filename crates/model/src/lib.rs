//! Core domain model for claimlens claims review.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `ClaimRecord`: a health-insurance claim with its fraud-risk fields
//! - `ScoreCategory`: coarse LOW/MEDIUM/HIGH risk buckets
//! - `FilterState`: the reviewer's current search criteria
//! - `Page`: the paginated envelope returned by the claims API

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Coarse fraud-risk bucket, derived from fixed sub-ranges of the 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScoreCategory {
    /// Scores 0-25
    Low,
    /// Scores 26-75
    Medium,
    /// Scores 76-100
    High,
}

impl ScoreCategory {
    /// Fixed `(min, max)` score range covered by this category.
    pub fn score_range(self) -> (f64, f64) {
        match self {
            Self::Low => (0.0, 25.0),
            Self::Medium => (26.0, 75.0),
            Self::High => (76.0, 100.0),
        }
    }

    /// Bucket a raw fraud score.
    pub fn from_score(score: f64) -> Self {
        if score >= 76.0 {
            Self::High
        } else if score >= 26.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Wire form, as the API spells it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown score category: {0}")]
pub struct ParseScoreCategoryError(String);

impl FromStr for ScoreCategory {
    type Err = ParseScoreCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            _ => Err(ParseScoreCategoryError(s.to_string())),
        }
    }
}

/// Patient sex as recorded on the claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::M => "M",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown gender: {0}")]
pub struct ParseGenderError(String);

impl FromStr for Gender {
    type Err = ParseGenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "M" | "MALE" => Ok(Self::M),
            "F" | "FEMALE" => Ok(Self::F),
            _ => Err(ParseGenderError(s.to_string())),
        }
    }
}

/// A rejected filter mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The score bounds are pinned by the selected category.
    #[error("score bounds are fixed by the selected category")]
    ScoreRangeLocked,
}

/// The reviewer's current search criteria.
///
/// All fields start unset. The score trio is kept private: selecting a
/// `ScoreCategory` pins `min_score`/`max_score` to its fixed range, and the
/// bound setters refuse manual edits while the pin holds. Clearing the
/// category unsets all three fields in one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    /// Substring match on the patient registration number.
    pub patient_id: Option<String>,
    pub gender: Option<Gender>,
    /// Substring match on the diagnosis text. A non-empty ad-hoc search
    /// query supersedes this field at query-building time.
    pub diagnosis: Option<String>,
    min_score: Option<f64>,
    max_score: Option<f64>,
    score_category: Option<ScoreCategory>,
    /// Lower bound on the encounter date (ISO format).
    pub start_date: Option<String>,
    /// Upper bound on the encounter date (ISO format).
    pub end_date: Option<String>,
}

impl FilterState {
    pub fn min_score(&self) -> Option<f64> {
        self.min_score
    }

    pub fn max_score(&self) -> Option<f64> {
        self.max_score
    }

    pub fn score_category(&self) -> Option<ScoreCategory> {
        self.score_category
    }

    /// Select or clear the category bucket.
    ///
    /// Selecting pins the score bounds to the category's fixed range;
    /// clearing unsets category and both bounds. All three fields move
    /// together, never leaving the bounds out of sync with the category.
    pub fn set_score_category(&mut self, category: Option<ScoreCategory>) {
        match category {
            Some(c) => {
                let (min, max) = c.score_range();
                self.min_score = Some(min);
                self.max_score = Some(max);
                self.score_category = Some(c);
            }
            None => {
                self.min_score = None;
                self.max_score = None;
                self.score_category = None;
            }
        }
    }

    /// Set the lower score bound. Refused while a category pins the range.
    pub fn set_min_score(&mut self, value: Option<f64>) -> Result<(), FilterError> {
        if self.score_category.is_some() {
            return Err(FilterError::ScoreRangeLocked);
        }
        self.min_score = value;
        Ok(())
    }

    /// Set the upper score bound. Refused while a category pins the range.
    pub fn set_max_score(&mut self, value: Option<f64>) -> Result<(), FilterError> {
        if self.score_category.is_some() {
            return Err(FilterError::ScoreRangeLocked);
        }
        self.max_score = value;
        Ok(())
    }

    /// True when no criterion is active.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One bounded slice of a server-side result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Records on this page, at most `size` of them.
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    /// Requested page size.
    pub size: u32,
    /// 0-based index of this page.
    pub number: u32,
}

impl<T> Page<T> {
    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    /// Whether a further page exists according to the server's totals.
    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// A single health-insurance billing record with its fraud-risk fields.
///
/// This is the record shape returned by `GET /api/v1/claims`. Nullable
/// columns come through as `None`; no validation happens beyond decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    pub id: String,

    /// Registration number of the insured patient.
    pub patient_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,

    /// Encounter date (ISO format)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter_date: Option<String>,

    /// Discharge date (ISO format)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharge_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_billed: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraud_type: Option<String>,

    /// Assigned fraud score in [0, 100], if the claim has been scored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraud_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_category: Option<ScoreCategory>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_reasons: Option<String>,
}

impl ClaimRecord {
    /// Create a minimal record for testing.
    pub fn new(id: impl Into<String>, patient_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            patient_id: patient_id.into(),
            age: None,
            gender: None,
            encounter_date: None,
            discharge_date: None,
            amount_billed: None,
            diagnosis: None,
            fraud_type: None,
            fraud_score: None,
            score_category: None,
            score_reasons: None,
        }
    }

    /// Risk bucket for display: the assigned category, or one derived from
    /// the raw score when the server sent none.
    pub fn risk_category(&self) -> Option<ScoreCategory> {
        self.score_category
            .or_else(|| self.fraud_score.map(ScoreCategory::from_score))
    }
}

/// Dashboard headline metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub total_claims: u64,
    pub average_amount: f64,
    pub high_risk_count: u64,
    pub high_risk_percent: f64,
    pub low_count: u64,
    pub medium_count: u64,
    pub high_count: u64,
}

/// One date bucket of aggregated chart data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    /// Bucket date (ISO format)
    pub date: String,
    pub count: u64,
    pub average_score: f64,
    pub total_amount: f64,
    pub low_count: u64,
    pub medium_count: u64,
    pub high_count: u64,
}

/// Weights and thresholds of the server-side fraud scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    pub zero_amount_weight: f64,
    pub ratio_high_threshold: f64,
    pub ratio_high_weight: f64,
    pub ratio_med_threshold: f64,
    pub ratio_med_weight: f64,
    pub infertility_weight: f64,
    pub cyesis_weight: f64,
    pub dental_weight: f64,
    pub osteo_weight: f64,
    pub pediatric_htn_weight: f64,
    pub missing_encounter_weight: f64,
    pub discharge_before_encounter_weight: f64,
    /// Upper score bound of the LOW bucket.
    pub low_max: f64,
    /// Upper score bound of the MEDIUM bucket.
    pub medium_max: f64,
}

/// Outcome of a CSV ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub total: u64,
    pub inserted: u64,
    pub skipped: u64,
}
