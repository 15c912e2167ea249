use crate::student::StudentRecord;
use chrono::NaiveDate;
use thiserror::Error;

/// Client-side field check failure. Blocks submission before any network
/// call; the draft is preserved so the user can correct it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("email address is not valid")]
    InvalidEmail,

    #[error("date of birth must be YYYY-MM-DD")]
    InvalidDate,

    #[error("{0} must be a number")]
    InvalidScore(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// The editable fields, in display order. In Edit mode the identifier is
/// locked and skipped by field navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    StudentId,
    FirstName,
    LastName,
    Email,
    Hometown,
    Dob,
    MathScore,
    LiteratureScore,
    EnglishScore,
}

impl FormField {
    pub const ALL: [FormField; 9] = [
        FormField::StudentId,
        FormField::FirstName,
        FormField::LastName,
        FormField::Email,
        FormField::Hometown,
        FormField::Dob,
        FormField::MathScore,
        FormField::LiteratureScore,
        FormField::EnglishScore,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::StudentId => "Student ID",
            FormField::FirstName => "First Name",
            FormField::LastName => "Last Name",
            FormField::Email => "Email",
            FormField::Hometown => "Hometown",
            FormField::Dob => "Date of Birth",
            FormField::MathScore => "Math",
            FormField::LiteratureScore => "Literature",
            FormField::EnglishScore => "English",
        }
    }
}

/// Mutable staging copy of a record. All fields hold raw text while the
/// form is open; parsing happens once, at submit. Discarded on cancel or
/// successful submit, never partially persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDraft {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub hometown: String,
    pub dob: String,
    pub math_score: String,
    pub literature_score: String,
    pub english_score: String,
}

impl FormDraft {
    /// Blank template for Create mode, with the placeholder date of birth
    /// and zeroed scores.
    pub fn template() -> Self {
        Self {
            student_id: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            hometown: String::new(),
            dob: "2003-01-01".to_string(),
            math_score: "0".to_string(),
            literature_score: "0".to_string(),
            english_score: "0".to_string(),
        }
    }

    /// Pre-filled draft for Edit mode.
    pub fn from_record(record: &StudentRecord) -> Self {
        Self {
            student_id: record.student_id.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            hometown: record.hometown.clone(),
            dob: record.dob.clone(),
            math_score: format_score(record.math_score),
            literature_score: format_score(record.literature_score),
            english_score: format_score(record.english_score),
        }
    }

    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::StudentId => &self.student_id,
            FormField::FirstName => &self.first_name,
            FormField::LastName => &self.last_name,
            FormField::Email => &self.email,
            FormField::Hometown => &self.hometown,
            FormField::Dob => &self.dob,
            FormField::MathScore => &self.math_score,
            FormField::LiteratureScore => &self.literature_score,
            FormField::EnglishScore => &self.english_score,
        }
    }

    pub fn field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::StudentId => &mut self.student_id,
            FormField::FirstName => &mut self.first_name,
            FormField::LastName => &mut self.last_name,
            FormField::Email => &mut self.email,
            FormField::Hometown => &mut self.hometown,
            FormField::Dob => &mut self.dob,
            FormField::MathScore => &mut self.math_score,
            FormField::LiteratureScore => &mut self.literature_score,
            FormField::EnglishScore => &mut self.english_score,
        }
    }

    /// Validate and convert to a full record for submission.
    fn to_record(&self) -> Result<StudentRecord, ValidationError> {
        require(&self.student_id, "student id")?;
        require(&self.first_name, "first name")?;
        require(&self.last_name, "last name")?;
        require(&self.email, "email")?;
        require(&self.hometown, "hometown")?;
        require(&self.dob, "date of birth")?;

        if !valid_email(self.email.trim()) {
            return Err(ValidationError::InvalidEmail);
        }
        if NaiveDate::parse_from_str(self.dob.trim(), "%Y-%m-%d").is_err() {
            return Err(ValidationError::InvalidDate);
        }

        Ok(StudentRecord {
            student_id: self.student_id.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            hometown: self.hometown.trim().to_string(),
            dob: self.dob.trim().to_string(),
            math_score: parse_score(&self.math_score, "math score")?,
            literature_score: parse_score(&self.literature_score, "literature score")?,
            english_score: parse_score(&self.english_score, "english score")?,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
enum FormState {
    Idle,
    Open { mode: FormMode, draft: FormDraft },
}

/// Create/edit form lifecycle.
///
/// Two open modes: Create (blank draft, identifier editable) and Edit
/// (draft pre-filled from a row, identifier locked). The draft survives
/// failed submits and is only discarded on cancel or confirmed success.
#[derive(Debug)]
pub struct RecordFormController {
    state: FormState,
}

impl Default for RecordFormController {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordFormController {
    pub fn new() -> Self {
        Self {
            state: FormState::Idle,
        }
    }

    pub fn open_create(&mut self) {
        self.state = FormState::Open {
            mode: FormMode::Create,
            draft: FormDraft::template(),
        };
    }

    pub fn open_edit(&mut self, record: &StudentRecord) {
        self.state = FormState::Open {
            mode: FormMode::Edit,
            draft: FormDraft::from_record(record),
        };
    }

    /// Discard the draft without submitting.
    pub fn cancel(&mut self) {
        self.state = FormState::Idle;
    }

    /// Discard the draft after the server confirmed the submission.
    pub fn complete(&mut self) {
        self.state = FormState::Idle;
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, FormState::Open { .. })
    }

    pub fn mode(&self) -> Option<FormMode> {
        match &self.state {
            FormState::Open { mode, .. } => Some(*mode),
            FormState::Idle => None,
        }
    }

    pub fn draft(&self) -> Option<&FormDraft> {
        match &self.state {
            FormState::Open { draft, .. } => Some(draft),
            FormState::Idle => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut FormDraft> {
        match &mut self.state {
            FormState::Open { draft, .. } => Some(draft),
            FormState::Idle => None,
        }
    }

    /// Validate the draft and produce the record to send. The form stays
    /// open and the draft untouched; `complete()` closes it once the
    /// server accepts.
    pub fn submit(&self) -> Result<(FormMode, StudentRecord), ValidationError> {
        match &self.state {
            FormState::Open { mode, draft } => Ok((*mode, draft.to_record()?)),
            FormState::Idle => Err(ValidationError::MissingField("form")),
        }
    }
}

fn require(value: &str, name: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(name))
    } else {
        Ok(())
    }
}

/// Basic address shape: one `@`, non-empty local part, dotted domain.
fn valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

/// Score inputs accept fractional values and default to zero when unset.
fn parse_score(input: &str, name: &'static str) -> Result<f64, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidScore(name))
}

fn format_score(score: f64) -> String {
    if score == score.trunc() {
        format!("{}", score as i64)
    } else {
        format!("{}", score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, math: f64) -> StudentRecord {
        StudentRecord {
            student_id: id.to_string(),
            first_name: "Binh".to_string(),
            last_name: "Tran".to_string(),
            email: "binh@example.com".to_string(),
            dob: "2003-04-20".to_string(),
            hometown: "Da Nang".to_string(),
            math_score: math,
            literature_score: 6.5,
            english_score: 8.0,
        }
    }

    #[test]
    fn test_create_opens_with_template_defaults() {
        let mut form = RecordFormController::new();
        form.open_create();

        let draft = form.draft().unwrap();
        assert_eq!(draft.student_id, "");
        assert_eq!(draft.dob, "2003-01-01");
        assert_eq!(draft.math_score, "0");
        assert_eq!(form.mode(), Some(FormMode::Create));
    }

    #[test]
    fn test_edit_prefills_draft_from_row() {
        let mut form = RecordFormController::new();
        form.open_edit(&record("S1", 7.5));

        let draft = form.draft().unwrap();
        assert_eq!(draft.student_id, "S1");
        assert_eq!(draft.math_score, "7.5");
        assert_eq!(draft.literature_score, "6.5");
        assert_eq!(form.mode(), Some(FormMode::Edit));
    }

    #[test]
    fn test_cancel_discards_draft() {
        let mut form = RecordFormController::new();
        form.open_edit(&record("S1", 7.5));
        form.draft_mut().unwrap().math_score = "9.9".to_string();

        form.cancel();
        assert!(!form.is_open());
        assert!(form.draft().is_none());
    }

    #[test]
    fn test_bad_email_rejected_and_draft_preserved() {
        let mut form = RecordFormController::new();
        form.open_create();
        {
            let draft = form.draft_mut().unwrap();
            draft.student_id = "S100".to_string();
            draft.first_name = "An".to_string();
            draft.last_name = "Le".to_string();
            draft.email = "bad-email".to_string();
            draft.hometown = "Hue".to_string();
        }

        assert_eq!(form.submit(), Err(ValidationError::InvalidEmail));
        // still open, nothing discarded
        assert!(form.is_open());
        assert_eq!(form.draft().unwrap().student_id, "S100");
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let mut form = RecordFormController::new();
        form.open_create();
        form.draft_mut().unwrap().student_id = "S100".to_string();

        assert_eq!(
            form.submit(),
            Err(ValidationError::MissingField("first name"))
        );
    }

    #[test]
    fn test_invalid_date_rejected() {
        let mut form = RecordFormController::new();
        form.open_edit(&record("S1", 7.0));
        form.draft_mut().unwrap().dob = "20-13-2003".to_string();

        assert_eq!(form.submit(), Err(ValidationError::InvalidDate));
    }

    #[test]
    fn test_empty_scores_default_to_zero() {
        let mut form = RecordFormController::new();
        form.open_edit(&record("S1", 7.0));
        {
            let draft = form.draft_mut().unwrap();
            draft.math_score = "".to_string();
            draft.literature_score = "  ".to_string();
        }

        let (_, submitted) = form.submit().unwrap();
        assert_eq!(submitted.math_score, 0.0);
        assert_eq!(submitted.literature_score, 0.0);
        assert_eq!(submitted.english_score, 8.0);
    }

    #[test]
    fn test_fractional_scores_accepted() {
        let mut form = RecordFormController::new();
        form.open_edit(&record("S1", 7.0));
        form.draft_mut().unwrap().math_score = "8.5".to_string();

        let (mode, submitted) = form.submit().unwrap();
        assert_eq!(mode, FormMode::Edit);
        assert_eq!(submitted.math_score, 8.5);
    }

    #[test]
    fn test_non_numeric_score_rejected() {
        let mut form = RecordFormController::new();
        form.open_edit(&record("S1", 7.0));
        form.draft_mut().unwrap().english_score = "ten".to_string();

        assert_eq!(
            form.submit(),
            Err(ValidationError::InvalidScore("english score"))
        );
    }

    #[test]
    fn test_submit_keeps_identifier_as_match_key() {
        let mut form = RecordFormController::new();
        form.open_edit(&record("S1", 7.5));
        form.draft_mut().unwrap().hometown = "Hoi An".to_string();

        let (_, submitted) = form.submit().unwrap();
        // full-record replace: every field present, id untouched
        assert_eq!(submitted.student_id, "S1");
        assert_eq!(submitted.hometown, "Hoi An");
        assert_eq!(submitted.math_score, 7.5);
    }
}
