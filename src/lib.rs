// Rollcall - Student Records Admin Console
// Core library: query/state sync, form lifecycle, repository client

pub mod analytics;
pub mod config;
pub mod form;
pub mod query;
pub mod repository;
pub mod session;
pub mod student;

// TUI shell, only with the `tui` feature (on by default)
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use analytics::{
    AnalysisPayload, AnalysisRow, AnalyticsViewModel, BucketRow, ScoreDistribution, SubjectStats,
};
pub use config::Config;
pub use form::{FormDraft, FormField, FormMode, RecordFormController, ValidationError};
pub use query::{
    FilterField, ListQueryController, ListRequest, QueryState, SortDirection, SortField,
    FALLBACK_TOTAL, PAGE_SIZE,
};
pub use repository::{RepositoryError, StudentRepository};
pub use session::{Action, Effect, MutationKind, Session};
pub use student::{ListPage, StudentRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
