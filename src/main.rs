mod app;
mod color;
mod data;
mod state;
mod ui;

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use app::CourseDashApp;
use eframe::egui;

/// The dataset the dashboard starts from, looked up in the working
/// directory.  `generate_sample` writes a matching file.
const DATA_FILE: &str = "course_data.csv";

fn main() -> Result<()> {
    env_logger::init();

    // Startup load is fatal: the dashboard has nothing to show without data.
    let dataset = data::loader::load_file(Path::new(DATA_FILE))
        .with_context(|| format!("loading startup dataset '{DATA_FILE}'"))?;
    log::info!(
        "Loaded {} courses across {} academic years",
        dataset.len(),
        dataset.schema.year_labels.len()
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "CourseDash – Course Catalog",
        options,
        Box::new(move |_cc| Ok(Box::new(CourseDashApp::new(dataset)))),
    )
    .map_err(|e| anyhow!("running event loop: {e}"))
}
