use serde::{Deserialize, Serialize};

/// Student record as exchanged with the API.
///
/// Field names match the wire format exactly. `student_id` is the unique,
/// immutable key; uniqueness is enforced server-side, the client never
/// re-derives it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StudentRecord {
    pub student_id: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub email: String,

    /// Date of birth, `YYYY-MM-DD`.
    #[serde(default)]
    pub dob: String,

    #[serde(default)]
    pub hometown: String,

    #[serde(default)]
    pub math_score: f64,

    #[serde(default)]
    pub literature_score: f64,

    #[serde(default)]
    pub english_score: f64,
}

impl StudentRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }
}

/// One page of list results, normalized from the wire shape.
///
/// `total` is optional: some deployments omit the count, in which case the
/// query controller falls back to a fixed estimate.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ListPage {
    #[serde(default)]
    pub data: Vec<StudentRecord>,

    #[serde(default)]
    pub total: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deserializes_wire_shape() {
        let json = r#"{
            "student_id": "S1",
            "first_name": "An",
            "last_name": "Nguyen",
            "email": "an@example.com",
            "dob": "2003-05-12",
            "hometown": "Hue",
            "math_score": 7.5,
            "literature_score": 6.0,
            "english_score": 8.0
        }"#;

        let record: StudentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.student_id, "S1");
        assert_eq!(record.math_score, 7.5);
        assert_eq!(record.full_name(), "Nguyen An");
    }

    #[test]
    fn test_list_page_tolerates_missing_total() {
        let json = r#"{"data": []}"#;
        let page: ListPage = serde_json::from_str(json).unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total, None);
    }
}
