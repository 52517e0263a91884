//! Query derivation for the claims search API.
//!
//! Converts the abstract `FilterState` into the HTTP query parameters of
//! `GET /api/v1/claims`. The omission and precedence rules live here, in one
//! pure derivation, rather than scattered across the call sites.

use claimlens_model::FilterState;
use thiserror::Error;

/// Sort directive sent with every claims query.
pub const SORT_FRAUD_SCORE_DESC: &str = "fraudScore,desc";

/// Page sizes the result table offers.
pub const PAGE_SIZES: [u32; 5] = [10, 15, 25, 50, 100];

/// Page size used until the reviewer picks another.
pub const DEFAULT_PAGE_SIZE: u32 = 15;

/// A rejected query parameter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Page size outside the offered set.
    #[error("unsupported page size: {0}")]
    InvalidPageSize(u32),
}

/// True when `size` is one of the offered page sizes.
pub fn is_offered_page_size(size: u32) -> bool {
    PAGE_SIZES.contains(&size)
}

/// A fully derived claims search request.
///
/// Everything the server needs to produce one page: pagination, the fixed
/// sort, the filter panel state, and the ad-hoc search text (empty = none).
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimsQuery {
    pub filters: FilterState,
    pub search: String,
    /// 0-based page index.
    pub page: u32,
    pub size: u32,
}

impl Default for ClaimsQuery {
    fn default() -> Self {
        Self {
            filters: FilterState::default(),
            search: String::new(),
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ClaimsQuery {
    pub fn new(filters: FilterState, search: impl Into<String>, page: u32, size: u32) -> Self {
        Self {
            filters,
            search: search.into(),
            page,
            size,
        }
    }

    /// Serialize to query parameters.
    ///
    /// `page`, `size` and the sort directive are always present; optional
    /// fields are emitted only when set, never as empty values. A non-empty
    /// search is sent as the diagnosis filter and the filter panel's own
    /// diagnosis field is ignored for that request; the two are never merged.
    /// Score and date ranges pass through unvalidated; a malformed range is
    /// the server's to answer (usually with an empty page).
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("size".to_string(), self.size.to_string()),
            ("sort".to_string(), SORT_FRAUD_SCORE_DESC.to_string()),
        ];

        if let Some(patient_id) = non_empty(self.filters.patient_id.as_deref()) {
            params.push(("patientId".to_string(), patient_id.to_string()));
        }
        if let Some(gender) = self.filters.gender {
            params.push(("gender".to_string(), gender.as_str().to_string()));
        }
        if !self.search.is_empty() {
            params.push(("diagnosis".to_string(), self.search.clone()));
        } else if let Some(diagnosis) = non_empty(self.filters.diagnosis.as_deref()) {
            params.push(("diagnosis".to_string(), diagnosis.to_string()));
        }
        if let Some(min) = self.filters.min_score() {
            params.push(("minScore".to_string(), min.to_string()));
        }
        if let Some(max) = self.filters.max_score() {
            params.push(("maxScore".to_string(), max.to_string()));
        }
        if let Some(start) = non_empty(self.filters.start_date.as_deref()) {
            params.push(("startDate".to_string(), start.to_string()));
        }
        if let Some(end) = non_empty(self.filters.end_date.as_deref()) {
            params.push(("endDate".to_string(), end.to_string()));
        }

        params
    }

    /// Flat `k=v&k=v` rendering for logs and tests. The HTTP client encodes
    /// the real request itself.
    pub fn query_string(&self) -> String {
        self.params()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
