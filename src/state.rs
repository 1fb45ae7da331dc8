use std::collections::BTreeSet;

use crate::color::ColorMap;
use crate::data::model::CourseDataset;
use crate::data::pipeline::{
    self, EnrollmentSeries, FiveNumber, KindNode, SubjectCount, SubjectKindCount,
};

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// Everything the charts read, rebuilt from scratch on each selection
/// change.  Pure functions of the dataset and the selection.
#[derive(Debug, Clone, Default)]
pub struct DerivedViews {
    pub subject_kind_counts: Vec<SubjectKindCount>,
    pub subject_counts: Vec<SubjectCount>,
    pub lesson_summaries: Vec<(String, FiveNumber)>,
    pub hierarchy: Vec<KindNode>,
    /// Enrollment history of the selected course; `None` when no visible
    /// course is selected (the line section shows a placeholder).
    pub series: Option<EnrollmentSeries>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset, never mutated after construction.
    pub dataset: CourseDataset,

    /// Grade multiselect; empty means "show all".
    pub selected_grades: BTreeSet<String>,

    /// Course code driving the enrollment line; always a member of the
    /// filtered view (or None when the view is empty).
    pub selected_course: Option<String>,

    /// Indices of courses passing the grade filter (cached).
    pub visible_indices: Vec<usize>,

    /// Chart inputs for the current selection.
    pub views: DerivedViews,

    /// Stable per-category colours, built from the full dataset so a
    /// category keeps its hue regardless of the filter.
    pub kind_colors: ColorMap,
    pub subject_colors: ColorMap,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(dataset: CourseDataset) -> Self {
        let mut state = AppState {
            kind_colors: category_colors(&dataset, |i| dataset.records[i].kind.as_str()),
            subject_colors: category_colors(&dataset, |i| dataset.records[i].subject.as_str()),
            dataset,
            selected_grades: BTreeSet::new(),
            selected_course: None,
            visible_indices: Vec::new(),
            views: DerivedViews::default(),
            status_message: None,
        };
        state.refilter();
        state
    }

    /// Replace the dataset (File → Open) and reset the selection.
    pub fn set_dataset(&mut self, dataset: CourseDataset) {
        *self = AppState::new(dataset);
    }

    /// Toggle a single grade in the multiselect.
    pub fn toggle_grade(&mut self, grade: &str) {
        if !self.selected_grades.remove(grade) {
            self.selected_grades.insert(grade.to_string());
        }
        self.refilter();
    }

    /// Tick every grade.  Equivalent to no filter, but keeps the
    /// checkboxes visibly checked.
    pub fn select_all_grades(&mut self) {
        self.selected_grades = self.dataset.grades.iter().cloned().collect();
        self.refilter();
    }

    /// Clear the multiselect; an empty selection shows all rows.
    pub fn select_no_grades(&mut self) {
        self.selected_grades.clear();
        self.refilter();
    }

    pub fn set_selected_course(&mut self, code: String) {
        self.selected_course = Some(code);
        self.recompute_views();
    }

    /// Course codes available in the course selector, in file order.
    pub fn visible_codes(&self) -> Vec<&str> {
        self.visible_indices
            .iter()
            .map(|&i| self.dataset.records[i].code.as_str())
            .collect()
    }

    /// Recompute the filtered view, re-validate the course selection
    /// against it, and rebuild every derived view.
    pub fn refilter(&mut self) {
        self.visible_indices = pipeline::filter_by_grades(&self.dataset, &self.selected_grades);

        let still_visible = self.selected_course.as_deref().is_some_and(|code| {
            self.visible_indices
                .iter()
                .any(|&i| self.dataset.records[i].code == code)
        });
        if !still_visible {
            self.selected_course = self
                .visible_indices
                .first()
                .map(|&i| self.dataset.records[i].code.clone());
        }

        self.recompute_views();
    }

    fn recompute_views(&mut self) {
        let ds = &self.dataset;
        let indices = &self.visible_indices;
        self.views = DerivedViews {
            subject_kind_counts: pipeline::count_by_subject_kind(ds, indices),
            subject_counts: pipeline::count_by_subject(ds, indices),
            lesson_summaries: pipeline::lesson_summaries(ds, indices),
            hierarchy: pipeline::lesson_hierarchy(ds, indices),
            series: self.selected_course.as_deref().and_then(|code| {
                pipeline::slice_year_columns(ds, indices, code)
                    .map(|slice| pipeline::melt(&ds.schema, &slice))
            }),
        };
    }
}

/// Distinct values of one categorical column, in file order, mapped to hues.
fn category_colors<'a>(
    dataset: &'a CourseDataset,
    field: impl Fn(usize) -> &'a str,
) -> ColorMap {
    let mut seen = Vec::new();
    for i in 0..dataset.len() {
        let value = field(i);
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    ColorMap::new(seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_csv;

    const SAMPLE_CSV: &str = "\
Course Code,Subject,Type,Grade,Lessons,2011-2012,2012-2013
MCR3U,Math,Core,11,20,1043,1102
SBI4U,Science,Core,12,18,50,60
AVI2O,Arts,Elective,10,15,,30
";

    fn state() -> AppState {
        AppState::new(load_csv(SAMPLE_CSV.as_bytes()).unwrap())
    }

    #[test]
    fn fresh_state_shows_everything() {
        let state = state();
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.selected_course.as_deref(), Some("MCR3U"));
        assert_eq!(state.views.subject_kind_counts.len(), 3);
    }

    #[test]
    fn course_selection_follows_the_filter() {
        let mut state = state();
        state.toggle_grade("12");
        assert_eq!(state.visible_codes(), vec!["SBI4U"]);
        // MCR3U fell out of view, so the selection snaps to a visible code.
        assert_eq!(state.selected_course.as_deref(), Some("SBI4U"));
        assert_eq!(
            state.views.series.as_ref().map(|s| s.code.as_str()),
            Some("SBI4U")
        );
    }

    #[test]
    fn toggling_back_restores_the_full_view() {
        let mut state = state();
        state.toggle_grade("12");
        state.toggle_grade("12");
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn unknown_grade_empties_every_view() {
        let mut state = state();
        state.toggle_grade("12");
        state.toggle_grade("13");
        state.toggle_grade("12");
        assert!(state.visible_indices.is_empty());
        assert!(state.views.subject_kind_counts.is_empty());
        assert!(state.views.subject_counts.is_empty());
        assert!(state.views.hierarchy.is_empty());
        assert_eq!(state.selected_course, None);
        assert!(state.views.series.is_none());
    }

    #[test]
    fn all_grades_equals_no_filter() {
        let mut state = state();
        state.select_all_grades();
        let all = state.visible_indices.clone();
        state.select_no_grades();
        assert_eq!(all, state.visible_indices);
    }
}
