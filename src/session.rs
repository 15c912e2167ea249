use crate::analytics::{AnalyticsViewModel, ScoreDistribution};
use crate::form::{FormMode, RecordFormController};
use crate::query::{FilterField, ListQueryController, ListRequest, SortDirection, SortField};
use crate::repository::RepositoryError;
use crate::student::{ListPage, StudentRecord};
use log::error;

/// Which write operation a completed mutation belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

/// Everything that can happen to the session: user intents plus completed
/// network requests re-entering the loop.
#[derive(Debug)]
pub enum Action {
    Search { field: FilterField, keyword: String },
    ApplySort { field: SortField, direction: SortDirection },
    GoToPage(i64),
    NextPage,
    PrevPage,
    OpenCreate,
    OpenEdit(StudentRecord),
    CancelForm,
    SubmitForm,
    RequestDelete(String),
    ConfirmDelete,
    DeclineDelete,
    OpenAnalytics,
    CloseAnalytics,
    DismissNotice,
    ListArrived { seq: u64, outcome: Result<ListPage, RepositoryError> },
    AnalysisArrived(Result<ScoreDistribution, RepositoryError>),
    MutationDone { kind: MutationKind, outcome: Result<(), RepositoryError> },
}

/// Network calls the shell must issue on the session's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchList(ListRequest),
    FetchAnalysis,
    Create(StudentRecord),
    Update(StudentRecord),
    Delete(String),
}

/// The one explicitly owned state object behind the admin console.
///
/// `handle` is the only mutation path: a pure transition from (state,
/// action) to new state plus the side-effect requests to issue. The shell
/// never touches the controllers directly, which keeps every flow in this
/// file deterministic under test.
#[derive(Debug, Default)]
pub struct Session {
    pub list: ListQueryController,
    pub form: RecordFormController,
    pub analytics: AnalyticsViewModel,
    pub pending_delete: Option<String>,
    pub notice: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            list: ListQueryController::new(),
            form: RecordFormController::new(),
            analytics: AnalyticsViewModel::default(),
            pending_delete: None,
            notice: None,
        }
    }

    /// Initial fetch of page 1 with default filter/sort.
    pub fn start(&mut self) -> Vec<Effect> {
        vec![Effect::FetchList(self.list.refetch_current())]
    }

    pub fn handle(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Search { field, keyword } => {
                self.list.set_filter(field, keyword);
                vec![Effect::FetchList(self.list.refresh())]
            }
            Action::ApplySort { field, direction } => {
                self.list.set_sort(field, direction);
                vec![Effect::FetchList(self.list.refresh())]
            }
            Action::GoToPage(page) => {
                vec![Effect::FetchList(self.list.set_page(page))]
            }
            Action::NextPage => {
                let page = self.list.state.page as i64 + 1;
                vec![Effect::FetchList(self.list.set_page(page))]
            }
            Action::PrevPage => {
                let page = self.list.state.page as i64 - 1;
                vec![Effect::FetchList(self.list.set_page(page))]
            }
            Action::OpenCreate => {
                self.form.open_create();
                Vec::new()
            }
            Action::OpenEdit(record) => {
                self.form.open_edit(&record);
                Vec::new()
            }
            Action::CancelForm => {
                self.form.cancel();
                Vec::new()
            }
            Action::SubmitForm => match self.form.submit() {
                Ok((FormMode::Create, record)) => vec![Effect::Create(record)],
                Ok((FormMode::Edit, record)) => vec![Effect::Update(record)],
                Err(err) => {
                    // draft stays in place for correction
                    self.notice = Some(err.to_string());
                    Vec::new()
                }
            },
            Action::RequestDelete(student_id) => {
                self.pending_delete = Some(student_id);
                Vec::new()
            }
            Action::ConfirmDelete => match self.pending_delete.take() {
                Some(student_id) => vec![Effect::Delete(student_id)],
                None => Vec::new(),
            },
            Action::DeclineDelete => {
                self.pending_delete = None;
                Vec::new()
            }
            Action::OpenAnalytics => {
                vec![Effect::FetchAnalysis]
            }
            Action::CloseAnalytics => {
                self.analytics.open = false;
                Vec::new()
            }
            Action::DismissNotice => {
                self.notice = None;
                Vec::new()
            }
            Action::ListArrived { seq, outcome } => {
                self.list.apply_response(seq, outcome);
                Vec::new()
            }
            Action::AnalysisArrived(outcome) => {
                match outcome {
                    Ok(distribution) => {
                        self.analytics.distribution = Some(distribution);
                        self.analytics.open = true;
                    }
                    Err(RepositoryError::EmptyData) => {
                        self.notice = Some("Analysis data is empty.".to_string());
                    }
                    Err(err) => {
                        error!("analysis fetch failed: {}", err);
                        self.notice = Some("Could not load analytics.".to_string());
                    }
                }
                Vec::new()
            }
            Action::MutationDone { kind, outcome } => match outcome {
                Ok(()) => {
                    if kind != MutationKind::Delete {
                        self.form.complete();
                    }
                    // show the page that was active before the form opened
                    vec![Effect::FetchList(self.list.refetch_current())]
                }
                Err(err) => {
                    error!("{:?} failed: {}", kind, err);
                    self.notice = Some(match kind {
                        MutationKind::Delete => "Delete failed.".to_string(),
                        _ => {
                            "Action failed. Check for duplicate IDs or invalid data.".to_string()
                        }
                    });
                    Vec::new()
                }
            },
        }
    }
}
