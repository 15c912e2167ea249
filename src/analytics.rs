use serde::Deserialize;

/// Per-subject statistics as reported by the analysis endpoint.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct SubjectStats {
    #[serde(default)]
    pub excellent_percentage: f64,

    #[serde(default)]
    pub average_percentage: f64,

    #[serde(default)]
    pub poor_percentage: f64,

    #[serde(default)]
    pub max_point: f64,

    #[serde(default)]
    pub min_point: f64,
}

/// One row of the analysis payload. The backend may not report literature
/// yet, so that subject is optional on the wire.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisRow {
    #[serde(default)]
    pub math: SubjectStats,

    #[serde(default)]
    pub literature: Option<SubjectStats>,

    #[serde(default)]
    pub english: SubjectStats,
}

/// Wire shape of `GET /students/analysis/points`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AnalysisPayload {
    #[serde(default)]
    pub data: Vec<AnalysisRow>,
}

/// Score distribution across the three subjects. Derived and read-only;
/// values keep full precision, rounding happens only when display rows
/// are produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreDistribution {
    pub math: SubjectStats,
    pub literature: SubjectStats,
    pub english: SubjectStats,
}

impl ScoreDistribution {
    /// Reshape a payload row. An absent literature subject becomes an
    /// all-zero record rather than failing the load.
    pub fn from_row(row: &AnalysisRow) -> Self {
        Self {
            math: row.math.clone(),
            literature: row.literature.clone().unwrap_or_default(),
            english: row.english.clone(),
        }
    }

    /// Category rows for the distribution table, percentages rounded to
    /// one decimal place for display.
    pub fn bucket_rows(&self) -> Vec<BucketRow> {
        vec![
            BucketRow {
                label: "Excellent",
                math: round1(self.math.excellent_percentage),
                literature: round1(self.literature.excellent_percentage),
                english: round1(self.english.excellent_percentage),
            },
            BucketRow {
                label: "Average",
                math: round1(self.math.average_percentage),
                literature: round1(self.literature.average_percentage),
                english: round1(self.english.average_percentage),
            },
            BucketRow {
                label: "Poor",
                math: round1(self.math.poor_percentage),
                literature: round1(self.literature.poor_percentage),
                english: round1(self.english.poor_percentage),
            },
        ]
    }

    /// (max, min) observed score per subject, in math/literature/english
    /// order with a display label.
    pub fn summary_rows(&self) -> Vec<(&'static str, f64, f64)> {
        vec![
            ("Math", self.math.max_point, self.math.min_point),
            ("Literature", self.literature.max_point, self.literature.min_point),
            ("English", self.english.max_point, self.english.min_point),
        ]
    }
}

/// One display row: a category with one percentage per subject.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRow {
    pub label: &'static str,
    pub math: f64,
    pub literature: f64,
    pub english: f64,
}

/// Holds the last successfully loaded distribution and whether the
/// analytics overlay is showing. The overlay opens only on a successful
/// load; failures surface as a notice instead.
#[derive(Debug, Default)]
pub struct AnalyticsViewModel {
    pub distribution: Option<ScoreDistribution>,
    pub open: bool,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(excellent: f64, average: f64, poor: f64, max: f64, min: f64) -> SubjectStats {
        SubjectStats {
            excellent_percentage: excellent,
            average_percentage: average,
            poor_percentage: poor,
            max_point: max,
            min_point: min,
        }
    }

    #[test]
    fn test_missing_literature_becomes_all_zero() {
        let row = AnalysisRow {
            math: stats(33.3333, 50.0, 16.6667, 9.5, 2.0),
            literature: None,
            english: stats(20.0, 60.0, 20.0, 10.0, 1.5),
        };

        let distribution = ScoreDistribution::from_row(&row);
        assert_eq!(distribution.literature, SubjectStats::default());

        let rows = distribution.bucket_rows();
        assert_eq!(rows[0].literature, 0.0);
        assert_eq!(rows[1].literature, 0.0);
        assert_eq!(rows[2].literature, 0.0);

        let summary = distribution.summary_rows();
        assert_eq!(summary[1], ("Literature", 0.0, 0.0));
    }

    #[test]
    fn test_display_rounding_is_one_decimal() {
        let row = AnalysisRow {
            math: stats(33.3333, 48.276, 18.3907, 9.5, 2.0),
            literature: Some(stats(12.25, 70.05, 17.7, 8.0, 3.0)),
            english: stats(0.0, 100.0, 0.0, 7.0, 7.0),
        };

        let distribution = ScoreDistribution::from_row(&row);
        let rows = distribution.bucket_rows();

        assert_eq!(rows[0].math, 33.3);
        assert_eq!(rows[1].math, 48.3);
        assert_eq!(rows[2].math, 18.4);
        // stored values keep full precision
        assert_eq!(distribution.math.excellent_percentage, 33.3333);
    }

    #[test]
    fn test_payload_deserializes_without_literature() {
        let json = r#"{"data": [{
            "math": {"excellent_percentage": 30.0, "average_percentage": 50.0,
                     "poor_percentage": 20.0, "max_point": 10.0, "min_point": 1.0},
            "english": {"excellent_percentage": 25.0, "average_percentage": 55.0,
                        "poor_percentage": 20.0, "max_point": 9.0, "min_point": 2.0}
        }]}"#;

        let payload: AnalysisPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.data.len(), 1);
        assert!(payload.data[0].literature.is_none());
        assert_eq!(payload.data[0].math.excellent_percentage, 30.0);
    }
}
