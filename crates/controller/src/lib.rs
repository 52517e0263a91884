//! Claims query controller.
//!
//! Owns the reviewer's filter state, derives the search query, requests
//! pages and keeps pagination consistent with the server's reported totals.
//! Every state change resets the page index, and every fetch is tagged with
//! the exact query it was built from, so a late-resolving response for an
//! older state can never overwrite a newer one.

use claimlens_backend_rest::{BackendError, ClaimsBackend};
use claimlens_model::{ClaimRecord, FilterError, FilterState, Gender, Page, ScoreCategory};
use claimlens_query::{is_offered_page_size, ClaimsQuery, QueryError, DEFAULT_PAGE_SIZE};

/// Where the controller is in its fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Fetching,
}

/// An issued fetch, tagged with the query it was built from.
///
/// `finish_fetch` compares the tag against the current state and drops the
/// completion when they no longer match.
#[derive(Debug, Clone)]
pub struct PendingFetch {
    query: ClaimsQuery,
}

impl PendingFetch {
    pub fn query(&self) -> &ClaimsQuery {
        &self.query
    }
}

/// Translates reviewer filter intent into bounded queries against the
/// claims API and exposes pagination derived from the last fetched page.
pub struct ClaimsQueryController<B> {
    backend: B,
    filters: FilterState,
    search: String,
    page_index: u32,
    page_size: u32,
    page: Option<Page<ClaimRecord>>,
    error: Option<BackendError>,
    phase: FetchPhase,
}

impl<B> ClaimsQueryController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            filters: FilterState::default(),
            search: String::new(),
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
            page: None,
            error: None,
            phase: FetchPhase::Idle,
        }
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The last fetched page. `None` before the first fetch and after a
    /// failed one.
    pub fn page(&self) -> Option<&Page<ClaimRecord>> {
        self.page.as_ref()
    }

    /// The stored failure, until the next successful fetch replaces it.
    pub fn error(&self) -> Option<&BackendError> {
        self.error.as_ref()
    }

    pub fn phase(&self) -> FetchPhase {
        self.phase
    }

    /// Set the patient-ID filter. Empty input clears it.
    pub fn set_patient_id(&mut self, value: &str) {
        self.filters.patient_id = non_empty(value);
        self.page_index = 0;
    }

    pub fn set_gender(&mut self, value: Option<Gender>) {
        self.filters.gender = value;
        self.page_index = 0;
    }

    /// Set the diagnosis filter. Empty input clears it. A non-empty search
    /// text supersedes this field at query time.
    pub fn set_diagnosis(&mut self, value: &str) {
        self.filters.diagnosis = non_empty(value);
        self.page_index = 0;
    }

    /// Set the lower score bound. Refused while a category pins the range.
    pub fn set_min_score(&mut self, value: Option<f64>) -> Result<(), FilterError> {
        self.filters.set_min_score(value)?;
        self.page_index = 0;
        Ok(())
    }

    /// Set the upper score bound. Refused while a category pins the range.
    pub fn set_max_score(&mut self, value: Option<f64>) -> Result<(), FilterError> {
        self.filters.set_max_score(value)?;
        self.page_index = 0;
        Ok(())
    }

    /// Select or clear the risk category. Category and both score bounds
    /// move together in one update.
    pub fn set_score_category(&mut self, category: Option<ScoreCategory>) {
        self.filters.set_score_category(category);
        self.page_index = 0;
    }

    pub fn set_start_date(&mut self, value: &str) {
        self.filters.start_date = non_empty(value);
        self.page_index = 0;
    }

    pub fn set_end_date(&mut self, value: &str) {
        self.filters.end_date = non_empty(value);
        self.page_index = 0;
    }

    /// Set the ad-hoc search text.
    pub fn set_search(&mut self, value: &str) {
        self.search = value.to_string();
        self.page_index = 0;
    }

    /// Reset every filter and the search text in one update.
    pub fn clear(&mut self) {
        self.filters = FilterState::default();
        self.search.clear();
        self.page_index = 0;
    }

    /// Switch to one of the offered page sizes. The current offset loses
    /// its meaning under a new size, so the index returns to 0.
    pub fn set_page_size(&mut self, size: u32) -> Result<(), QueryError> {
        if !is_offered_page_size(size) {
            return Err(QueryError::InvalidPageSize(size));
        }
        self.page_size = size;
        self.page_index = 0;
        Ok(())
    }

    /// Whether an earlier page exists.
    pub fn can_go_prev(&self) -> bool {
        self.page_index > 0
    }

    /// Whether a later page exists, judged by the last fetched totals.
    /// Totals can change between fetches, so this never extrapolates from
    /// a local count.
    pub fn can_go_next(&self) -> bool {
        self.page.as_ref().is_some_and(Page::has_next)
    }

    /// Advance one page. No-op on the last page of the fetched totals.
    pub fn next_page(&mut self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        self.page_index += 1;
        true
    }

    /// Step back one page. No-op at the first page.
    pub fn prev_page(&mut self) -> bool {
        if self.page_index == 0 {
            return false;
        }
        self.page_index -= 1;
        true
    }

    /// Jump to the first page. No-op when already there.
    pub fn first_page(&mut self) -> bool {
        if self.page_index == 0 {
            return false;
        }
        self.page_index = 0;
        true
    }

    /// The derived request for the current state.
    pub fn current_query(&self) -> ClaimsQuery {
        ClaimsQuery::new(
            self.filters.clone(),
            self.search.clone(),
            self.page_index,
            self.page_size,
        )
    }

    /// Start a fetch for the current state.
    ///
    /// Hand the returned tag back to `finish_fetch` with the backend's
    /// answer. Any state change in between invalidates the tag.
    pub fn begin_fetch(&mut self) -> PendingFetch {
        self.phase = FetchPhase::Fetching;
        PendingFetch {
            query: self.current_query(),
        }
    }

    /// Apply a completed fetch.
    ///
    /// Returns `false` when the response was stale, i.e. built from state
    /// that has since changed; a stale completion is dropped without
    /// touching the displayed result or the phase, since the response for
    /// the current state is still outstanding.
    pub fn finish_fetch(
        &mut self,
        pending: PendingFetch,
        result: Result<Page<ClaimRecord>, BackendError>,
    ) -> bool {
        if pending.query != self.current_query() {
            tracing::debug!("Discarding stale claims response");
            return false;
        }

        self.phase = FetchPhase::Idle;
        match result {
            Ok(page) => {
                self.page = Some(page);
                self.error = None;
            }
            Err(err) => {
                // No last-good retention: a failure clears the table until
                // the next successful fetch.
                self.page = None;
                self.error = Some(err);
            }
        }
        true
    }
}

impl<B: ClaimsBackend> ClaimsQueryController<B> {
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Fetch the page for the current state and apply the outcome. Failures
    /// are stored, never returned; the next state change re-attempts.
    pub async fn refresh(&mut self) {
        let pending = self.begin_fetch();
        let result = self.backend.search(pending.query()).await;
        self.finish_fetch(pending, result);
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Replays scripted responses and records the queries it saw.
    struct ScriptedBackend {
        responses: Mutex<Vec<Result<Page<ClaimRecord>, BackendError>>>,
        seen: Mutex<Vec<ClaimsQuery>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<Page<ClaimRecord>, BackendError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl ClaimsBackend for ScriptedBackend {
        async fn search(&self, query: &ClaimsQuery) -> Result<Page<ClaimRecord>, BackendError> {
            self.seen.lock().unwrap().push(query.clone());
            self.responses.lock().unwrap().remove(0)
        }

        async fn health_check(&self) -> Result<(), BackendError> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn controller() -> ClaimsQueryController<ScriptedBackend> {
        ClaimsQueryController::new(ScriptedBackend::new(Vec::new()))
    }

    fn page_of(number: u32, total_pages: u32) -> Page<ClaimRecord> {
        Page {
            content: vec![ClaimRecord::new("c-1", "NHIS-0001")],
            total_elements: u64::from(total_pages) * 15,
            total_pages,
            size: 15,
            number,
        }
    }

    fn load_page(ctl: &mut ClaimsQueryController<ScriptedBackend>, number: u32, total: u32) {
        let pending = ctl.begin_fetch();
        assert!(ctl.finish_fetch(pending, Ok(page_of(number, total))));
    }

    #[test]
    fn test_filter_mutation_resets_page_index() {
        let mut ctl = controller();
        load_page(&mut ctl, 0, 5);
        ctl.next_page();
        ctl.next_page();
        assert_eq!(ctl.page_index(), 2);

        ctl.set_patient_id("NHIS-7");
        assert_eq!(ctl.page_index(), 0);

        load_page(&mut ctl, 0, 5);
        ctl.next_page();
        ctl.set_search("diabetes");
        assert_eq!(ctl.page_index(), 0);

        load_page(&mut ctl, 0, 5);
        ctl.next_page();
        ctl.set_score_category(Some(ScoreCategory::High));
        assert_eq!(ctl.page_index(), 0);
    }

    #[test]
    fn test_page_size_policy() {
        let mut ctl = controller();
        load_page(&mut ctl, 0, 5);
        ctl.next_page();

        assert_eq!(ctl.set_page_size(20), Err(QueryError::InvalidPageSize(20)));
        assert_eq!(ctl.page_size(), 15);
        assert_eq!(ctl.page_index(), 1);

        ctl.set_page_size(50).unwrap();
        assert_eq!(ctl.page_index(), 0);
        assert_eq!(ctl.current_query().size, 50);
    }

    #[test]
    fn test_pagination_no_ops_at_bounds() {
        let mut ctl = controller();
        // Nothing fetched yet: no forward navigation.
        assert!(!ctl.next_page());
        assert!(!ctl.prev_page());
        assert!(!ctl.first_page());

        load_page(&mut ctl, 2, 3);
        // Last page according to the fetched totals.
        assert!(!ctl.can_go_next());
        assert!(!ctl.next_page());
        assert_eq!(ctl.page_index(), 0);
    }

    #[test]
    fn test_pagination_follows_fetched_totals() {
        let mut ctl = controller();
        load_page(&mut ctl, 0, 3);
        assert!(ctl.can_go_next());
        assert!(!ctl.can_go_prev());

        assert!(ctl.next_page());
        assert_eq!(ctl.page_index(), 1);
        assert!(ctl.can_go_prev());

        assert!(ctl.prev_page());
        assert_eq!(ctl.page_index(), 0);

        assert!(ctl.next_page());
        assert!(ctl.first_page());
        assert_eq!(ctl.page_index(), 0);
    }

    #[test]
    fn test_score_bounds_locked_by_category() {
        let mut ctl = controller();
        ctl.set_score_category(Some(ScoreCategory::Medium));
        assert_eq!(
            ctl.set_min_score(Some(5.0)),
            Err(FilterError::ScoreRangeLocked)
        );
        assert_eq!(ctl.filters().min_score(), Some(26.0));
        assert_eq!(ctl.filters().max_score(), Some(75.0));

        ctl.set_score_category(None);
        ctl.set_min_score(Some(5.0)).unwrap();
        assert_eq!(ctl.filters().min_score(), Some(5.0));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut ctl = controller();
        ctl.set_patient_id("NHIS-7");
        ctl.set_search("diabetes");
        ctl.set_score_category(Some(ScoreCategory::High));
        load_page(&mut ctl, 0, 5);
        ctl.next_page();

        ctl.clear();
        assert!(ctl.filters().is_empty());
        assert_eq!(ctl.search(), "");
        assert_eq!(ctl.page_index(), 0);
        assert_eq!(
            ctl.current_query().query_string(),
            "page=0&size=15&sort=fraudScore,desc"
        );
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut ctl = controller();
        let pending = ctl.begin_fetch();

        // The state moves on before the response lands.
        ctl.set_diagnosis("malaria");

        assert!(!ctl.finish_fetch(pending, Ok(page_of(0, 4))));
        assert!(ctl.page().is_none());
        assert_eq!(ctl.phase(), FetchPhase::Fetching);
    }

    #[test]
    fn test_last_issued_query_wins() {
        let mut ctl = controller();

        let first = ctl.begin_fetch();
        ctl.set_search("diabetes");
        let second = ctl.begin_fetch();

        // Completions arrive out of issue order.
        assert!(ctl.finish_fetch(second, Ok(page_of(0, 2))));
        assert!(!ctl.finish_fetch(first, Ok(page_of(0, 9))));

        assert_eq!(ctl.page().unwrap().total_pages, 2);
        assert_eq!(ctl.phase(), FetchPhase::Idle);
    }

    #[test]
    fn test_failure_clears_last_good_page() {
        let mut ctl = controller();
        load_page(&mut ctl, 0, 2);
        assert!(ctl.page().is_some());

        let pending = ctl.begin_fetch();
        let failure = BackendError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert!(ctl.finish_fetch(pending, Err(failure)));

        assert!(ctl.page().is_none());
        match ctl.error() {
            Some(BackendError::Status { status, body }) => {
                assert_eq!(*status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected stored status error, got {:?}", other),
        }
    }

    #[test]
    fn test_success_clears_stored_error() {
        let mut ctl = controller();
        let pending = ctl.begin_fetch();
        ctl.finish_fetch(pending, Err(BackendError::Unavailable));
        assert!(ctl.error().is_some());

        load_page(&mut ctl, 0, 1);
        assert!(ctl.error().is_none());
        assert!(ctl.page().is_some());
    }

    #[tokio::test]
    async fn test_refresh_round_trip() {
        let backend = ScriptedBackend::new(vec![Ok(page_of(0, 2))]);
        let mut ctl = ClaimsQueryController::new(backend);
        ctl.set_score_category(Some(ScoreCategory::High));

        ctl.refresh().await;

        assert_eq!(ctl.phase(), FetchPhase::Idle);
        assert_eq!(ctl.page().unwrap().total_pages, 2);

        let seen = ctl.backend().seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].query_string(),
            "page=0&size=15&sort=fraudScore,desc&minScore=76&maxScore=100"
        );
    }

    #[tokio::test]
    async fn test_refresh_stores_failure() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::Status {
                status: 404,
                body: "not found".to_string(),
            }),
            Ok(page_of(0, 1)),
        ]);
        let mut ctl = ClaimsQueryController::new(backend);

        ctl.refresh().await;
        assert!(ctl.page().is_none());
        assert!(ctl.error().is_some());

        // The next state change re-attempts and recovers.
        ctl.set_patient_id("NHIS-1");
        ctl.refresh().await;
        assert!(ctl.error().is_none());
        assert!(ctl.page().is_some());
    }
}
