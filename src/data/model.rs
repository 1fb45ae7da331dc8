use std::collections::BTreeSet;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Schema – named column classification
// ---------------------------------------------------------------------------

/// Required, named columns of the input file.
pub const COL_CODE: &str = "Course Code";
pub const COL_SUBJECT: &str = "Subject";
pub const COL_TYPE: &str = "Type";
pub const COL_GRADE: &str = "Grade";
pub const COL_LESSONS: &str = "Lessons";

const REQUIRED_COLUMNS: [&str; 5] = [COL_CODE, COL_SUBJECT, COL_TYPE, COL_GRADE, COL_LESSONS];

/// Errors raised while classifying headers or assembling the dataset.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("no academic-year columns found (headers like '2011-2012')")]
    NoYearColumns,
    #[error("duplicate course code '{0}'")]
    DuplicateCode(String),
    #[error("row {row}: expected {expected} enrollment values, got {got}")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },
}

/// The classified column layout of a loaded file.
///
/// Columns are identified by *name*, never by position: the five required
/// columns above, any header matching a year-like pattern as an enrollment
/// column, and everything else as extra metadata kept only for display.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Full header row, in file order.
    pub columns: Vec<String>,
    /// Headers of unclassified metadata columns, in file order.
    pub extra_columns: Vec<String>,
    /// Academic-year headers, in file order.
    pub year_labels: Vec<String>,
}

impl Schema {
    /// Classify a header row.
    pub fn classify(headers: &[String]) -> Result<Self, SchemaError> {
        for required in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == required) {
                return Err(SchemaError::MissingColumn(required));
            }
        }

        let mut extra_columns = Vec::new();
        let mut year_labels = Vec::new();
        for header in headers {
            if REQUIRED_COLUMNS.contains(&header.as_str()) {
                continue;
            }
            if is_year_label(header) {
                year_labels.push(header.clone());
            } else {
                extra_columns.push(header.clone());
            }
        }

        if year_labels.is_empty() {
            return Err(SchemaError::NoYearColumns);
        }

        Ok(Schema {
            columns: headers.to_vec(),
            extra_columns,
            year_labels,
        })
    }
}

/// Whether a header names an academic year: `2014`, `2014-2015`, `2014/15`…
/// Anything starting with four digits in a plausible year range qualifies.
pub fn is_year_label(header: &str) -> bool {
    let digits: String = header.chars().take(4).collect();
    if digits.len() < 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let rest = &header[4..];
    if !rest.is_empty() && !rest.starts_with(['-', '/']) {
        return false;
    }
    matches!(digits.parse::<u32>(), Ok(y) if (1900..2200).contains(&y))
}

// ---------------------------------------------------------------------------
// CourseRecord – one row of the source table
// ---------------------------------------------------------------------------

/// A single course offering (one row of the source table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRecord {
    /// Unique course code, e.g. `MCR3U`.
    pub code: String,
    pub subject: String,
    /// The "Type" column (course delivery/category).
    pub kind: String,
    /// Grade kept as text: the source data mixes numerals and labels.
    pub grade: String,
    pub lessons: u32,
    /// Unclassified metadata cells, aligned with `Schema::extra_columns`.
    pub extra: Vec<String>,
    /// Per-year enrollment, aligned with `Schema::year_labels`.
    /// `None` is a genuinely missing value, never zero.
    pub enrollment: Vec<Option<u32>>,
}

// ---------------------------------------------------------------------------
// CourseDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset. Immutable once built: every derived view is
/// recomputed from it, nothing writes back.
#[derive(Debug, Clone)]
pub struct CourseDataset {
    /// All courses, in file order.
    pub records: Vec<CourseRecord>,
    pub schema: Schema,
    /// Distinct grade values, sorted.
    pub grades: Vec<String>,
}

impl CourseDataset {
    /// Assemble a dataset, enforcing code uniqueness and rectangular
    /// enrollment rows.
    pub fn from_records(schema: Schema, records: Vec<CourseRecord>) -> Result<Self, SchemaError> {
        let n_years = schema.year_labels.len();
        let mut seen = BTreeSet::new();
        for (row, rec) in records.iter().enumerate() {
            if !seen.insert(rec.code.as_str()) {
                return Err(SchemaError::DuplicateCode(rec.code.clone()));
            }
            if rec.enrollment.len() != n_years {
                return Err(SchemaError::RaggedRow {
                    row,
                    expected: n_years,
                    got: rec.enrollment.len(),
                });
            }
        }

        let grades: Vec<String> = records
            .iter()
            .map(|r| r.grade.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(CourseDataset {
            records,
            schema,
            grades,
        })
    }

    /// Number of courses.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, grade: &str, enrollment: Vec<Option<u32>>) -> CourseRecord {
        CourseRecord {
            code: code.to_string(),
            subject: "Math".to_string(),
            kind: "Core".to_string(),
            grade: grade.to_string(),
            lessons: 20,
            extra: Vec::new(),
            enrollment,
        }
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn classify_splits_year_and_extra_columns() {
        let schema = Schema::classify(&headers(&[
            "Course Code",
            "Subject",
            "Type",
            "Grade",
            "Lessons",
            "Language",
            "Provider",
            "2011-2012",
            "2012-2013",
        ]))
        .unwrap();

        assert_eq!(schema.extra_columns, vec!["Language", "Provider"]);
        assert_eq!(schema.year_labels, vec!["2011-2012", "2012-2013"]);
    }

    #[test]
    fn classify_requires_named_columns() {
        let err = Schema::classify(&headers(&["Course Code", "Subject", "2011-2012"]))
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn(_)));
    }

    #[test]
    fn classify_requires_year_columns() {
        let err = Schema::classify(&headers(&[
            "Course Code",
            "Subject",
            "Type",
            "Grade",
            "Lessons",
        ]))
        .unwrap_err();
        assert!(matches!(err, SchemaError::NoYearColumns));
    }

    #[test]
    fn year_label_pattern() {
        assert!(is_year_label("2011-2012"));
        assert!(is_year_label("2011/12"));
        assert!(is_year_label("2014"));
        assert!(!is_year_label("Lessons"));
        assert!(!is_year_label("20x1"));
        assert!(!is_year_label("2011ish"));
        assert!(!is_year_label("0042"));
    }

    #[test]
    fn duplicate_code_is_rejected() {
        let schema = Schema::classify(&headers(&[
            "Course Code",
            "Subject",
            "Type",
            "Grade",
            "Lessons",
            "2011-2012",
        ]))
        .unwrap();
        let err = CourseDataset::from_records(
            schema,
            vec![
                record("ENG1D", "9", vec![Some(10)]),
                record("ENG1D", "10", vec![Some(12)]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateCode(code) if code == "ENG1D"));
    }

    #[test]
    fn ragged_enrollment_is_rejected() {
        let schema = Schema::classify(&headers(&[
            "Course Code",
            "Subject",
            "Type",
            "Grade",
            "Lessons",
            "2011-2012",
            "2012-2013",
        ]))
        .unwrap();
        let err =
            CourseDataset::from_records(schema, vec![record("ENG1D", "9", vec![Some(10)])])
                .unwrap_err();
        assert!(matches!(err, SchemaError::RaggedRow { row: 0, .. }));
    }

    #[test]
    fn grades_are_distinct_and_sorted() {
        let schema = Schema::classify(&headers(&[
            "Course Code",
            "Subject",
            "Type",
            "Grade",
            "Lessons",
            "2011-2012",
        ]))
        .unwrap();
        let ds = CourseDataset::from_records(
            schema,
            vec![
                record("A1", "9", vec![None]),
                record("B2", "12", vec![None]),
                record("C3", "9", vec![None]),
            ],
        )
        .unwrap();
        assert_eq!(ds.grades, vec!["12", "9"]);
    }
}
