use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{
    COL_CODE, COL_GRADE, COL_LESSONS, COL_SUBJECT, COL_TYPE, CourseDataset, CourseRecord, Schema,
};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a course dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – header row with the named columns plus academic-year columns
/// * `.json` – records-oriented array (the default `df.to_json(orient='records')`)
pub fn load_file(path: &Path) -> Result<CourseDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            load_csv(file)
        }
        "json" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            load_json(&text)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: a header row naming every column.  The five course columns are
/// matched by name, year columns by their year-like headers; cell values in
/// year columns may be empty (missing enrollment).
pub fn load_csv<R: Read>(input: R) -> Result<CourseDataset> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let schema = Schema::classify(&headers).context("classifying CSV columns")?;

    let index_of = |name: &str| -> usize {
        // Schema::classify guarantees the required columns exist.
        headers.iter().position(|h| h == name).unwrap_or(0)
    };
    let code_idx = index_of(COL_CODE);
    let subject_idx = index_of(COL_SUBJECT);
    let kind_idx = index_of(COL_TYPE);
    let grade_idx = index_of(COL_GRADE);
    let lessons_idx = index_of(COL_LESSONS);

    let extra_idx: Vec<usize> = schema.extra_columns.iter().map(|c| index_of(c)).collect();
    let year_idx: Vec<usize> = schema.year_labels.iter().map(|c| index_of(c)).collect();

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim();

        let lessons: u32 = cell(lessons_idx)
            .parse()
            .with_context(|| format!("CSV row {row_no}: '{}' is not a lesson count", cell(lessons_idx)))?;

        let enrollment = year_idx
            .iter()
            .map(|&idx| parse_enrollment(cell(idx), row_no, &headers[idx]))
            .collect::<Result<Vec<_>>>()?;

        records.push(CourseRecord {
            code: cell(code_idx).to_string(),
            subject: cell(subject_idx).to_string(),
            kind: cell(kind_idx).to_string(),
            grade: cell(grade_idx).to_string(),
            lessons,
            extra: extra_idx.iter().map(|&idx| cell(idx).to_string()).collect(),
            enrollment,
        });
    }

    CourseDataset::from_records(schema, records).context("assembling dataset")
}

/// Empty cells and `NA` markers are missing values, never zero.
fn parse_enrollment(s: &str, row: usize, col: &str) -> Result<Option<u32>> {
    if s.is_empty() || s.eq_ignore_ascii_case("na") || s.eq_ignore_ascii_case("n/a") {
        return Ok(None);
    }
    s.parse::<u32>()
        .map(Some)
        .with_context(|| format!("CSV row {row}, column '{col}': '{s}' is not an enrollment count"))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// One record of the records-oriented JSON form.  The year columns and any
/// extra metadata land in the flattened map.
#[derive(Debug, Deserialize)]
struct RawCourse {
    #[serde(rename = "Course Code")]
    code: String,
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Grade")]
    grade: JsonValue,
    #[serde(rename = "Lessons")]
    lessons: u32,
    #[serde(flatten)]
    rest: BTreeMap<String, JsonValue>,
}

/// Expected JSON schema:
///
/// ```json
/// [
///   {
///     "Course Code": "MCR3U",
///     "Subject": "Math",
///     "Type": "Core",
///     "Grade": "11",
///     "Lessons": 20,
///     "2011-2012": 1043,
///     "2012-2013": null
///   },
///   ...
/// ]
/// ```
pub fn load_json(text: &str) -> Result<CourseDataset> {
    let raw: Vec<RawCourse> = serde_json::from_str(text).context("parsing JSON records")?;

    let first = match raw.first() {
        Some(first) => first,
        None => bail!("JSON dataset contains no records"),
    };

    // Header order: the named columns first, then the flattened keys of the
    // first record (BTreeMap order, so year labels come out chronological).
    let mut headers: Vec<String> = [COL_CODE, COL_SUBJECT, COL_TYPE, COL_GRADE, COL_LESSONS]
        .iter()
        .map(|s| s.to_string())
        .collect();
    headers.extend(first.rest.keys().cloned());

    let schema = Schema::classify(&headers).context("classifying JSON columns")?;

    let mut records = Vec::with_capacity(raw.len());
    for (row_no, rec) in raw.into_iter().enumerate() {
        let enrollment = schema
            .year_labels
            .iter()
            .map(|label| json_enrollment(rec.rest.get(label), row_no, label))
            .collect::<Result<Vec<_>>>()?;

        let extra = schema
            .extra_columns
            .iter()
            .map(|label| match rec.rest.get(label) {
                Some(JsonValue::String(s)) => s.clone(),
                Some(JsonValue::Null) | None => String::new(),
                Some(other) => other.to_string(),
            })
            .collect();

        records.push(CourseRecord {
            code: rec.code,
            subject: rec.subject,
            kind: rec.kind,
            grade: json_grade(&rec.grade),
            lessons: rec.lessons,
            extra,
            enrollment,
        });
    }

    CourseDataset::from_records(schema, records).context("assembling dataset")
}

/// Grades appear both as strings and bare numbers in exported JSON.
fn json_grade(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_enrollment(val: Option<&JsonValue>, row: usize, col: &str) -> Result<Option<u32>> {
    match val {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => {
            let v = n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .with_context(|| {
                    format!("Row {row}, '{col}': {n} is not a valid enrollment count")
                })?;
            Ok(Some(v))
        }
        Some(other) => bail!("Row {row}, '{col}': unexpected value {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
Course Code,Subject,Type,Grade,Lessons,Language,Provider,2011-2012,2012-2013,2013-2014
MCR3U,Math,Core,11,20,English,ILC,1043,1102,998
SBI4U,Science,Core,12,18,English,ILC,50,,60
AVI2O,Arts,Elective,10,15,English,ILC,,,
";

    #[test]
    fn csv_round_trip() {
        let ds = load_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.schema.year_labels.len(), 3);
        assert_eq!(ds.schema.extra_columns, vec!["Language", "Provider"]);

        let sbi = &ds.records[1];
        assert_eq!(sbi.code, "SBI4U");
        assert_eq!(sbi.lessons, 18);
        assert_eq!(sbi.enrollment, vec![Some(50), None, Some(60)]);

        let avi = &ds.records[2];
        assert_eq!(avi.enrollment, vec![None, None, None]);
    }

    #[test]
    fn csv_missing_required_column_fails() {
        let csv = "Course Code,Subject,Grade,Lessons,2011-2012\nA,B,9,10,5\n";
        assert!(load_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn csv_bad_lesson_count_fails() {
        let csv = "\
Course Code,Subject,Type,Grade,Lessons,2011-2012
MCR3U,Math,Core,11,many,5
";
        assert!(load_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn csv_duplicate_code_fails() {
        let csv = "\
Course Code,Subject,Type,Grade,Lessons,2011-2012
MCR3U,Math,Core,11,20,5
MCR3U,Math,Core,11,20,6
";
        assert!(load_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn json_round_trip() {
        let json = r#"[
            {"Course Code":"MCR3U","Subject":"Math","Type":"Core","Grade":11,
             "Lessons":20,"2011-2012":1043,"2012-2013":null},
            {"Course Code":"SBI4U","Subject":"Science","Type":"Core","Grade":"12",
             "Lessons":18,"2011-2012":50,"2012-2013":60}
        ]"#;
        let ds = load_json(json).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].grade, "11");
        assert_eq!(ds.records[0].enrollment, vec![Some(1043), None]);
        assert_eq!(ds.records[1].grade, "12");
        assert_eq!(ds.records[1].enrollment, vec![Some(50), Some(60)]);
    }

    #[test]
    fn json_empty_dataset_fails() {
        assert!(load_json("[]").is_err());
    }
}
