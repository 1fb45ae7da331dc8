use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – selection widgets
// ---------------------------------------------------------------------------

/// Render the left selection panel: the grade multiselect and the
/// course-code selector.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Selections");
    ui.separator();

    let grades = state.dataset.grades.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Grade multiselect ----
            let n_selected = state.selected_grades.len();
            let header_text = format!("Grade  ({n_selected}/{})", grades.len());

            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("grade_filter")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.label("Nothing ticked shows every course.");

                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_grades();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_grades();
                        }
                    });

                    for grade in &grades {
                        let mut checked = state.selected_grades.contains(grade);
                        if ui.checkbox(&mut checked, grade).changed() {
                            state.toggle_grade(grade);
                        }
                    }
                });

            ui.separator();

            // ---- Course-code selector (constrained to the filtered view) ----
            ui.strong("Course code");
            let codes: Vec<String> = state
                .visible_codes()
                .into_iter()
                .map(str::to_string)
                .collect();
            let current = state.selected_course.clone().unwrap_or_default();

            if codes.is_empty() {
                ui.label("No courses match the current selection.");
            } else {
                egui::ComboBox::from_id_salt("course_code")
                    .selected_text(&current)
                    .show_ui(ui, |ui: &mut Ui| {
                        for code in &codes {
                            if ui.selectable_label(current == *code, code).clicked() {
                                state.set_selected_course(code.clone());
                            }
                        }
                    });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} courses loaded, {} visible",
            state.dataset.len(),
            state.visible_indices.len()
        ));

        ui.separator();

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open course data")
        .add_filter("Supported files", &["csv", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} courses across {} academic years",
                    dataset.len(),
                    dataset.schema.year_labels.len()
                );
                state.set_dataset(dataset);
            }
            Err(e) => {
                // Keep the current dataset; a failed open only surfaces a message.
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
