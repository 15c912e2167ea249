use crate::repository::RepositoryError;
use crate::student::{ListPage, StudentRecord};
use log::{debug, warn};

/// Fixed page size for the list view.
pub const PAGE_SIZE: u32 = 10;

/// Assumed record count when the server omits `total`. Carried from the
/// original deployment; known to be imprecise for real datasets.
pub const FALLBACK_TOTAL: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    FirstName,
    StudentId,
    Hometown,
}

impl FilterField {
    pub fn as_param(&self) -> &'static str {
        match self {
            FilterField::FirstName => "first_name",
            FilterField::StudentId => "student_id",
            FilterField::Hometown => "hometown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilterField::FirstName => "Name",
            FilterField::StudentId => "ID",
            FilterField::Hometown => "Hometown",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            FilterField::FirstName => FilterField::StudentId,
            FilterField::StudentId => FilterField::Hometown,
            FilterField::Hometown => FilterField::FirstName,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    StudentId,
    MathScore,
}

impl SortField {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortField::StudentId => "student_id",
            SortField::MathScore => "math_score",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortField::StudentId => "ID",
            SortField::MathScore => "Math",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            SortField::StudentId => SortField::MathScore,
            SortField::MathScore => SortField::StudentId,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn is_ascending(&self) -> bool {
        matches!(self, SortDirection::Asc)
    }

    pub fn toggled(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Filter/sort/pagination parameters for the list view.
///
/// Mutated only by explicit user actions (search, apply-sort, page
/// navigation); every mutation that should hit the server goes through
/// [`ListQueryController`].
#[derive(Debug, Clone)]
pub struct QueryState {
    pub page: u32,
    pub page_size: u32,
    pub filter_field: FilterField,
    pub keyword: String,
    pub sort_field: SortField,
    pub direction: SortDirection,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: PAGE_SIZE,
            filter_field: FilterField::FirstName,
            keyword: String::new(),
            sort_field: SortField::StudentId,
            direction: SortDirection::Asc,
        }
    }
}

/// A fully assembled list fetch, ready to be issued.
///
/// `seq` is a monotonically increasing token; any response carrying a
/// sequence number older than the latest issued one is discarded on
/// arrival, so a slow early response can never overwrite a later page.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub seq: u64,
    pub params: Vec<(&'static str, String)>,
}

/// Owns the list view's query parameters and keeps the displayed page
/// consistent with server responses.
#[derive(Debug, Default)]
pub struct ListQueryController {
    pub state: QueryState,
    pub records: Vec<StudentRecord>,
    pub total_pages: u32,
    pub loading: bool,
    latest_seq: u64,
}

impl ListQueryController {
    pub fn new() -> Self {
        Self {
            state: QueryState::default(),
            records: Vec::new(),
            total_pages: 1,
            loading: false,
            latest_seq: 0,
        }
    }

    /// Clamp the requested page to `[1, total_pages]` and fetch it with
    /// the current filter/sort.
    pub fn set_page(&mut self, page: i64) -> ListRequest {
        let clamped = page.clamp(1, self.total_pages.max(1) as i64) as u32;
        self.state.page = clamped;
        self.build_request()
    }

    /// Stage a filter change. Takes effect on the next `refresh()`.
    pub fn set_filter(&mut self, field: FilterField, keyword: impl Into<String>) {
        self.state.filter_field = field;
        self.state.keyword = keyword.into();
    }

    /// Stage a sort change. Takes effect on the next `refresh()`.
    pub fn set_sort(&mut self, field: SortField, direction: SortDirection) {
        self.state.sort_field = field;
        self.state.direction = direction;
    }

    /// Apply staged filter/sort: reset to page 1 and fetch, so a narrowed
    /// result set never leaves the view on a page beyond its bounds.
    pub fn refresh(&mut self) -> ListRequest {
        self.state.page = 1;
        self.build_request()
    }

    /// Re-fetch the current page without touching any parameters. Used
    /// after a successful create/update/delete.
    pub fn refetch_current(&mut self) -> ListRequest {
        self.build_request()
    }

    fn build_request(&mut self) -> ListRequest {
        self.latest_seq += 1;
        self.loading = true;

        let mut params: Vec<(&'static str, String)> = vec![
            ("page", self.state.page.to_string()),
            ("page_size", self.state.page_size.to_string()),
        ];

        // The server distinguishes "no filter" from "empty-string filter":
        // omit the filter pair entirely unless the keyword has content.
        if !self.state.keyword.trim().is_empty() {
            params.push(("filter_field", self.state.filter_field.as_param().to_string()));
            params.push(("filter_value", self.state.keyword.clone()));
        }

        params.push(("sort_field", self.state.sort_field.as_param().to_string()));
        params.push(("ascending", self.state.direction.is_ascending().to_string()));

        ListRequest {
            seq: self.latest_seq,
            params,
        }
    }

    /// Apply a completed list fetch. Responses for anything but the most
    /// recently issued request are stale and dropped. A failed fetch is
    /// treated as an empty result set, never as a crash.
    pub fn apply_response(&mut self, seq: u64, outcome: Result<ListPage, RepositoryError>) {
        if seq != self.latest_seq {
            debug!("discarding stale list response (seq {} < {})", seq, self.latest_seq);
            return;
        }

        self.loading = false;

        match outcome {
            Ok(page) => {
                let total = page.total.unwrap_or_else(|| {
                    debug!("server omitted total; assuming {} records", FALLBACK_TOTAL);
                    FALLBACK_TOTAL
                });
                let page_size = self.state.page_size.max(1) as i64;
                self.total_pages = ((total.max(0) + page_size - 1) / page_size).max(1) as u32;
                self.records = page.data;
            }
            Err(err) => {
                warn!("list fetch failed, showing empty result set: {}", err);
                self.records.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::student::StudentRecord;

    fn student(id: &str, math: f64) -> StudentRecord {
        StudentRecord {
            student_id: id.to_string(),
            first_name: "Test".to_string(),
            last_name: "Student".to_string(),
            email: "test@example.com".to_string(),
            dob: "2003-01-01".to_string(),
            hometown: "Hanoi".to_string(),
            math_score: math,
            literature_score: 5.0,
            english_score: 6.0,
        }
    }

    fn page_of(total: Option<i64>, records: Vec<StudentRecord>) -> ListPage {
        ListPage {
            data: records,
            total,
        }
    }

    fn param<'a>(request: &'a ListRequest, key: &str) -> Option<&'a str> {
        request
            .params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_empty_keyword_omits_filter_params() {
        let mut controller = ListQueryController::new();
        controller.set_filter(FilterField::Hometown, "");
        let request = controller.refresh();

        assert_eq!(param(&request, "filter_field"), None);
        assert_eq!(param(&request, "filter_value"), None);
        assert_eq!(param(&request, "page"), Some("1"));
        assert_eq!(param(&request, "page_size"), Some("10"));
    }

    #[test]
    fn test_whitespace_keyword_omits_filter_params() {
        let mut controller = ListQueryController::new();
        controller.set_filter(FilterField::FirstName, "   \t ");
        let request = controller.refresh();

        assert_eq!(param(&request, "filter_field"), None);
        assert_eq!(param(&request, "filter_value"), None);
    }

    #[test]
    fn test_keyword_sends_filter_params() {
        let mut controller = ListQueryController::new();
        controller.set_filter(FilterField::Hometown, "Hue");
        let request = controller.refresh();

        assert_eq!(param(&request, "filter_field"), Some("hometown"));
        assert_eq!(param(&request, "filter_value"), Some("Hue"));
    }

    #[test]
    fn test_sort_params_always_sent() {
        let mut controller = ListQueryController::new();
        controller.set_sort(SortField::MathScore, SortDirection::Desc);
        let request = controller.refresh();

        assert_eq!(param(&request, "sort_field"), Some("math_score"));
        assert_eq!(param(&request, "ascending"), Some("false"));
    }

    #[test]
    fn test_total_95_gives_10_pages_and_clamps_page_11() {
        let mut controller = ListQueryController::new();
        let request = controller.refresh();
        controller.apply_response(request.seq, Ok(page_of(Some(95), vec![student("S1", 7.0)])));
        assert_eq!(controller.total_pages, 10);

        let request = controller.set_page(11);
        assert_eq!(controller.state.page, 10);
        assert_eq!(param(&request, "page"), Some("10"));
    }

    #[test]
    fn test_set_page_clamps_low_and_negative() {
        let mut controller = ListQueryController::new();
        let request = controller.refresh();
        controller.apply_response(request.seq, Ok(page_of(Some(30), vec![])));

        controller.set_page(0);
        assert_eq!(controller.state.page, 1);
        controller.set_page(-7);
        assert_eq!(controller.state.page, 1);
        controller.set_page(2);
        assert_eq!(controller.state.page, 2);
    }

    #[test]
    fn test_refresh_resets_to_page_1() {
        let mut controller = ListQueryController::new();
        let request = controller.refresh();
        controller.apply_response(request.seq, Ok(page_of(Some(95), vec![])));
        controller.set_page(7);

        let request = controller.refresh();
        assert_eq!(controller.state.page, 1);
        assert_eq!(param(&request, "page"), Some("1"));
    }

    #[test]
    fn test_missing_total_falls_back_to_default() {
        let mut controller = ListQueryController::new();
        let request = controller.refresh();
        controller.apply_response(request.seq, Ok(page_of(None, vec![])));
        // 100 assumed records at page size 10
        assert_eq!(controller.total_pages, 10);
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut controller = ListQueryController::new();
        let first = controller.set_page(1);
        let second = controller.set_page(2);

        // Second response lands first
        controller.apply_response(second.seq, Ok(page_of(Some(95), vec![student("S11", 8.0)])));
        // First response arrives late and must be ignored
        controller.apply_response(first.seq, Ok(page_of(Some(95), vec![student("S1", 7.0)])));

        assert_eq!(controller.records.len(), 1);
        assert_eq!(controller.records[0].student_id, "S11");
        assert!(!controller.loading);
    }

    #[test]
    fn test_failed_fetch_shows_empty_result_set() {
        let mut controller = ListQueryController::new();
        let request = controller.refresh();
        controller.apply_response(request.seq, Ok(page_of(Some(20), vec![student("S1", 7.0)])));
        assert_eq!(controller.records.len(), 1);

        let request = controller.refetch_current();
        controller.apply_response(
            request.seq,
            Err(RepositoryError::Network("connection refused".to_string())),
        );
        assert!(controller.records.is_empty());
        assert!(!controller.loading);
    }

    #[test]
    fn test_loading_flag_tracks_in_flight_fetch() {
        let mut controller = ListQueryController::new();
        assert!(!controller.loading);
        let request = controller.refresh();
        assert!(controller.loading);
        controller.apply_response(request.seq, Ok(page_of(Some(10), vec![])));
        assert!(!controller.loading);
    }
}
