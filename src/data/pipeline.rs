use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use super::model::{CourseDataset, Schema};

// ---------------------------------------------------------------------------
// Row filter
// ---------------------------------------------------------------------------

/// Return indices of courses whose grade is in `selected`, in file order.
///
/// An empty selection means "no filter" (everything is visible), matching
/// the multiselect widget: nothing ticked shows all rows, not none.
/// Unknown grade values simply match zero rows.
pub fn filter_by_grades(dataset: &CourseDataset, selected: &BTreeSet<String>) -> Vec<usize> {
    if selected.is_empty() {
        return (0..dataset.len()).collect();
    }
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| selected.contains(&rec.grade))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// One group of the bar-chart aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKindCount {
    pub subject: String,
    pub kind: String,
    pub count: usize,
}

/// One group of the pie-chart aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectCount {
    pub subject: String,
    pub count: usize,
}

/// Count occurrences of each key, in first-seen order.
fn discovery_counts<K, I>(keys: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    I: Iterator<Item = K>,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, usize)> = Vec::new();
    for key in keys {
        match slots.get(&key) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                slots.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }
    counts
}

/// Group the filtered courses by (subject, kind) and count each group,
/// sorted by count descending.  Ties keep group-discovery order (the sort
/// is stable), which is a display requirement for the bar chart.
pub fn count_by_subject_kind(
    dataset: &CourseDataset,
    indices: &[usize],
) -> Vec<SubjectKindCount> {
    let mut counts: Vec<SubjectKindCount> = discovery_counts(
        indices
            .iter()
            .map(|&i| {
                let rec = &dataset.records[i];
                (rec.subject.clone(), rec.kind.clone())
            }),
    )
    .into_iter()
    .map(|((subject, kind), count)| SubjectKindCount {
        subject,
        kind,
        count,
    })
    .collect();

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Group the filtered courses by subject alone, in discovery order.
pub fn count_by_subject(dataset: &CourseDataset, indices: &[usize]) -> Vec<SubjectCount> {
    discovery_counts(indices.iter().map(|&i| dataset.records[i].subject.clone()))
        .into_iter()
        .map(|(subject, count)| SubjectCount { subject, count })
        .collect()
}

// ---------------------------------------------------------------------------
// Column slicer
// ---------------------------------------------------------------------------

/// The key column plus every year column of one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSlice {
    pub code: String,
    /// Aligned with `Schema::year_labels`.
    pub values: Vec<Option<u32>>,
}

/// Select the year columns of the course `code` within the filtered view.
/// `None` when the code matches no visible row; the caller shows a
/// "no data available" placeholder instead of a chart.
pub fn slice_year_columns(
    dataset: &CourseDataset,
    indices: &[usize],
    code: &str,
) -> Option<YearSlice> {
    indices
        .iter()
        .map(|&i| &dataset.records[i])
        .find(|rec| rec.code == code)
        .map(|rec| YearSlice {
            code: rec.code.clone(),
            values: rec.enrollment.clone(),
        })
}

// ---------------------------------------------------------------------------
// Reshaper
// ---------------------------------------------------------------------------

/// Long-form enrollment history of one course: one point per year column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentSeries {
    pub code: String,
    /// `(year label, enrollment)` in schema column order; `None` stays a
    /// gap, it is never plotted as zero.
    pub points: Vec<(String, Option<u32>)>,
}

/// Wide-to-long pivot: N year columns become N (year, value) pairs sharing
/// the slice's course code.
pub fn melt(schema: &Schema, slice: &YearSlice) -> EnrollmentSeries {
    EnrollmentSeries {
        code: slice.code.clone(),
        points: schema
            .year_labels
            .iter()
            .cloned()
            .zip(slice.values.iter().copied())
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Box-plot summaries
// ---------------------------------------------------------------------------

/// Five-number summary of a lesson-count distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct FiveNumber {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Linearly interpolated quantile of a sorted, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

/// Per-subject five-number summaries of lesson counts, subjects in
/// discovery order.  Feeds the box plot.
pub fn lesson_summaries(dataset: &CourseDataset, indices: &[usize]) -> Vec<(String, FiveNumber)> {
    let grouped: Vec<(String, Vec<f64>)> = {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
        for &i in indices {
            let rec = &dataset.records[i];
            let slot = *slots.entry(rec.subject.clone()).or_insert_with(|| {
                groups.push((rec.subject.clone(), Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(rec.lessons as f64);
        }
        groups
    };

    grouped
        .into_iter()
        .map(|(subject, mut lessons)| {
            lessons.sort_by(f64::total_cmp);
            let summary = FiveNumber {
                min: lessons[0],
                q1: quantile(&lessons, 0.25),
                median: quantile(&lessons, 0.5),
                q3: quantile(&lessons, 0.75),
                max: lessons[lessons.len() - 1],
            };
            (subject, summary)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sunburst hierarchy
// ---------------------------------------------------------------------------

/// Inner node of the kind → subject → course tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectNode {
    pub name: String,
    pub lessons: u64,
    /// `(course code, lessons)` leaves in discovery order.
    pub courses: Vec<(String, u32)>,
}

/// Root node of the sunburst tree, one per course kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindNode {
    pub name: String,
    pub lessons: u64,
    pub subjects: Vec<SubjectNode>,
}

/// Build the kind → subject → course hierarchy weighted by lesson count.
/// All levels keep discovery order; zero-lesson courses stay in the tree
/// (they render as zero-width arcs).
pub fn lesson_hierarchy(dataset: &CourseDataset, indices: &[usize]) -> Vec<KindNode> {
    let mut kinds: Vec<KindNode> = Vec::new();
    for &i in indices {
        let rec = &dataset.records[i];
        let kind_slot = match kinds.iter().position(|k| k.name == rec.kind) {
            Some(slot) => slot,
            None => {
                kinds.push(KindNode {
                    name: rec.kind.clone(),
                    lessons: 0,
                    subjects: Vec::new(),
                });
                kinds.len() - 1
            }
        };
        let kind = &mut kinds[kind_slot];
        kind.lessons += u64::from(rec.lessons);

        let subject_slot = match kind.subjects.iter().position(|s| s.name == rec.subject) {
            Some(slot) => slot,
            None => {
                kind.subjects.push(SubjectNode {
                    name: rec.subject.clone(),
                    lessons: 0,
                    courses: Vec::new(),
                });
                kind.subjects.len() - 1
            }
        };
        let subject = &mut kind.subjects[subject_slot];
        subject.lessons += u64::from(rec.lessons);
        subject.courses.push((rec.code.clone(), rec.lessons));
    }
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CourseDataset, CourseRecord, Schema};

    fn record(
        code: &str,
        subject: &str,
        kind: &str,
        grade: &str,
        lessons: u32,
        enrollment: Vec<Option<u32>>,
    ) -> CourseRecord {
        CourseRecord {
            code: code.to_string(),
            subject: subject.to_string(),
            kind: kind.to_string(),
            grade: grade.to_string(),
            lessons,
            extra: Vec::new(),
            enrollment,
        }
    }

    /// The two-course dataset from the worked scenario: C1/Math/Core/9 with
    /// full history, C2/Sci/Core/10 with a missing middle year.
    fn scenario_dataset() -> CourseDataset {
        let headers: Vec<String> = [
            "Course Code",
            "Subject",
            "Type",
            "Grade",
            "Lessons",
            "2011-2012",
            "2012-2013",
            "2013-2014",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let schema = Schema::classify(&headers).unwrap();
        CourseDataset::from_records(
            schema,
            vec![
                record("C1", "Math", "Core", "9", 10, vec![Some(100), Some(105), Some(110)]),
                record("C2", "Sci", "Core", "10", 8, vec![Some(50), None, Some(60)]),
            ],
        )
        .unwrap()
    }

    fn grades(vals: &[&str]) -> BTreeSet<String> {
        vals.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_selection_is_identity() {
        let ds = scenario_dataset();
        assert_eq!(filter_by_grades(&ds, &BTreeSet::new()), vec![0, 1]);
    }

    #[test]
    fn filter_keeps_matching_rows_in_order() {
        let ds = scenario_dataset();
        assert_eq!(filter_by_grades(&ds, &grades(&["10"])), vec![1]);
        assert_eq!(filter_by_grades(&ds, &grades(&["9", "10"])), vec![0, 1]);
        for &i in &filter_by_grades(&ds, &grades(&["9"])) {
            assert_eq!(ds.records[i].grade, "9");
        }
    }

    #[test]
    fn unknown_grade_matches_nothing() {
        let ds = scenario_dataset();
        let indices = filter_by_grades(&ds, &grades(&["13"]));
        assert!(indices.is_empty());
        assert!(count_by_subject_kind(&ds, &indices).is_empty());
        assert!(count_by_subject(&ds, &indices).is_empty());
        assert_eq!(slice_year_columns(&ds, &indices, "C2"), None);
    }

    #[test]
    fn scenario_aggregate_ties_keep_discovery_order() {
        let ds = scenario_dataset();
        let indices = filter_by_grades(&ds, &BTreeSet::new());
        let counts = count_by_subject_kind(&ds, &indices);
        assert_eq!(
            counts,
            vec![
                SubjectKindCount {
                    subject: "Math".to_string(),
                    kind: "Core".to_string(),
                    count: 1
                },
                SubjectKindCount {
                    subject: "Sci".to_string(),
                    kind: "Core".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn aggregate_counts_sum_and_sort() {
        let headers: Vec<String> = ["Course Code", "Subject", "Type", "Grade", "Lessons", "2014"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let schema = Schema::classify(&headers).unwrap();
        let ds = CourseDataset::from_records(
            schema,
            vec![
                record("A1", "Math", "Core", "9", 10, vec![None]),
                record("A2", "Arts", "Elective", "9", 10, vec![None]),
                record("A3", "Math", "Core", "10", 10, vec![None]),
                record("A4", "Math", "Elective", "11", 10, vec![None]),
                record("A5", "Arts", "Elective", "9", 10, vec![None]),
                record("A6", "Math", "Core", "12", 10, vec![None]),
            ],
        )
        .unwrap();

        let indices = filter_by_grades(&ds, &BTreeSet::new());
        let counts = count_by_subject_kind(&ds, &indices);

        let total: usize = counts.iter().map(|c| c.count).sum();
        assert_eq!(total, indices.len());
        for pair in counts.windows(2) {
            assert!(pair[0].count >= pair[1].count);
        }
        assert_eq!(counts[0].subject, "Math");
        assert_eq!(counts[0].kind, "Core");
        assert_eq!(counts[0].count, 3);

        let by_subject = count_by_subject(&ds, &indices);
        let total: usize = by_subject.iter().map(|c| c.count).sum();
        assert_eq!(total, indices.len());
        assert_eq!(by_subject[0].subject, "Math");
        assert_eq!(by_subject[0].count, 4);
    }

    #[test]
    fn scenario_melt_preserves_missing_values() {
        let ds = scenario_dataset();
        let indices = filter_by_grades(&ds, &BTreeSet::new());
        let slice = slice_year_columns(&ds, &indices, "C2").unwrap();
        let series = melt(&ds.schema, &slice);

        assert_eq!(series.code, "C2");
        assert_eq!(series.points.len(), ds.schema.year_labels.len());
        assert_eq!(
            series.points,
            vec![
                ("2011-2012".to_string(), Some(50)),
                ("2012-2013".to_string(), None),
                ("2013-2014".to_string(), Some(60)),
            ]
        );
    }

    #[test]
    fn slice_respects_filtered_view() {
        let ds = scenario_dataset();
        // C1 is grade 9; filtering to grade 10 must hide it from the slicer.
        let indices = filter_by_grades(&ds, &grades(&["10"]));
        assert_eq!(slice_year_columns(&ds, &indices, "C1"), None);
        assert!(slice_year_columns(&ds, &indices, "C2").is_some());
    }

    #[test]
    fn pipeline_is_idempotent() {
        let ds = scenario_dataset();
        let run = || {
            let indices = filter_by_grades(&ds, &grades(&["9", "10"]));
            let bar = count_by_subject_kind(&ds, &indices);
            let pie = count_by_subject(&ds, &indices);
            let series = slice_year_columns(&ds, &indices, "C1")
                .map(|slice| melt(&ds.schema, &slice));
            (indices, bar, pie, series)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn five_number_summary() {
        let headers: Vec<String> = ["Course Code", "Subject", "Type", "Grade", "Lessons", "2014"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let schema = Schema::classify(&headers).unwrap();
        let ds = CourseDataset::from_records(
            schema,
            vec![
                record("A1", "Math", "Core", "9", 10, vec![None]),
                record("A2", "Math", "Core", "9", 20, vec![None]),
                record("A3", "Math", "Core", "9", 30, vec![None]),
                record("A4", "Math", "Core", "9", 40, vec![None]),
                record("A5", "Sci", "Core", "9", 12, vec![None]),
            ],
        )
        .unwrap();

        let indices = filter_by_grades(&ds, &BTreeSet::new());
        let summaries = lesson_summaries(&ds, &indices);
        assert_eq!(summaries.len(), 2);

        let (subject, math) = &summaries[0];
        assert_eq!(subject, "Math");
        assert_eq!(math.min, 10.0);
        assert_eq!(math.q1, 17.5);
        assert_eq!(math.median, 25.0);
        assert_eq!(math.q3, 32.5);
        assert_eq!(math.max, 40.0);

        let (subject, sci) = &summaries[1];
        assert_eq!(subject, "Sci");
        assert_eq!(sci.min, 12.0);
        assert_eq!(sci.median, 12.0);
        assert_eq!(sci.max, 12.0);
    }

    #[test]
    fn hierarchy_weights_roll_up() {
        let ds = scenario_dataset();
        let indices = filter_by_grades(&ds, &BTreeSet::new());
        let kinds = lesson_hierarchy(&ds, &indices);

        assert_eq!(kinds.len(), 1);
        let core = &kinds[0];
        assert_eq!(core.name, "Core");
        assert_eq!(core.lessons, 18);
        assert_eq!(core.subjects.len(), 2);
        assert_eq!(core.subjects[0].name, "Math");
        assert_eq!(core.subjects[0].courses, vec![("C1".to_string(), 10)]);
        let subject_total: u64 = core.subjects.iter().map(|s| s.lessons).sum();
        assert_eq!(subject_total, core.lessons);
    }
}
