use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::data::model::{
    COL_CODE, COL_GRADE, COL_LESSONS, COL_SUBJECT, COL_TYPE, CourseDataset, CourseRecord,
};

// ---------------------------------------------------------------------------
// Raw source table
// ---------------------------------------------------------------------------

/// Render the full dataset as a table, one column per schema column, in
/// file order.  Always shows every row: the table section is the raw
/// source view, it does not follow the grade filter.
pub fn dataset_table(ui: &mut Ui, dataset: &CourseDataset) {
    let columns = &dataset.schema.columns;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .vscroll(true)
        .min_scrolled_height(120.0)
        .max_scroll_height(360.0)
        .columns(Column::auto().at_least(60.0), columns.len())
        .header(20.0, |mut header| {
            for name in columns {
                header.col(|ui: &mut Ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, dataset.len(), |mut row| {
                let rec = &dataset.records[row.index()];
                for name in columns {
                    row.col(|ui: &mut Ui| {
                        ui.label(cell_text(dataset, rec, name));
                    });
                }
            });
        });
}

/// Text for one cell, resolved by column name against the schema.
fn cell_text(dataset: &CourseDataset, rec: &CourseRecord, column: &str) -> String {
    match column {
        COL_CODE => rec.code.clone(),
        COL_SUBJECT => rec.subject.clone(),
        COL_TYPE => rec.kind.clone(),
        COL_GRADE => rec.grade.clone(),
        COL_LESSONS => rec.lessons.to_string(),
        other => {
            if let Some(i) = dataset
                .schema
                .extra_columns
                .iter()
                .position(|c| c == other)
            {
                rec.extra.get(i).cloned().unwrap_or_default()
            } else if let Some(i) = dataset
                .schema
                .year_labels
                .iter()
                .position(|c| c == other)
            {
                match rec.enrollment.get(i) {
                    Some(Some(v)) => v.to_string(),
                    // Missing enrollment stays visibly missing.
                    _ => "–".to_string(),
                }
            } else {
                String::new()
            }
        }
    }
}
