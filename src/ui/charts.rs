use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, TAU};

use eframe::egui::{
    Color32, Painter, Pos2, RichText, ScrollArea, Sense, Shape, Stroke, Ui, Vec2,
};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints, Points};

use crate::state::AppState;
use crate::ui::table;

const CHART_HEIGHT: f32 = 280.0;

// ---------------------------------------------------------------------------
// Central panel – the chart page
// ---------------------------------------------------------------------------

/// Render the full chart page: distributions, the course-specific line, and
/// the raw source table.
pub fn central_panel(ui: &mut Ui, state: &AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .id_salt("chart_page")
        .show(ui, |ui: &mut Ui| {
            ui.vertical_centered(|ui: &mut Ui| ui.heading("General Distributions"));
            ui.separator();

            subheader(ui, "Course Distribution by Subject and Type");
            bar_chart(ui, state);

            subheader(ui, "Course Distribution by Subject");
            pie_chart(ui, state);

            subheader(ui, "Lessons per Course by Subject");
            box_plot(ui, state);

            subheader(ui, "Lessons by Type, Subject and Course");
            sunburst(ui, state);

            ui.add_space(12.0);
            ui.vertical_centered(|ui: &mut Ui| ui.heading("Course Specific Information"));
            ui.separator();

            subheader(ui, "Enrollment per Academic Year");
            enrollment_line(ui, state);

            ui.add_space(12.0);
            ui.vertical_centered(|ui: &mut Ui| ui.heading("Source Table"));
            ui.separator();
            table::dataset_table(ui, &state.dataset);
        });
}

fn subheader(ui: &mut Ui, text: &str) {
    ui.add_space(8.0);
    ui.strong(text);
    ui.add_space(4.0);
}

fn no_data(ui: &mut Ui, message: &str) {
    ui.label(RichText::new(message).italics());
}

// ---------------------------------------------------------------------------
// Bar chart: subject × kind counts, stacked, count-descending
// ---------------------------------------------------------------------------

fn bar_chart(ui: &mut Ui, state: &AppState) {
    let counts = &state.views.subject_kind_counts;
    if counts.is_empty() {
        no_data(ui, "No data available for the current selection.");
        return;
    }

    // Subjects on the x axis, ordered by total count descending.
    let mut subject_totals: Vec<(String, usize)> = Vec::new();
    for c in counts {
        match subject_totals.iter_mut().find(|(s, _)| *s == c.subject) {
            Some((_, total)) => *total += c.count,
            None => subject_totals.push((c.subject.clone(), c.count)),
        }
    }
    subject_totals.sort_by(|a, b| b.1.cmp(&a.1));

    let subject_pos: HashMap<&str, usize> = subject_totals
        .iter()
        .enumerate()
        .map(|(i, (s, _))| (s.as_str(), i))
        .collect();

    // One stacked layer per kind, in discovery order.
    let mut kinds: Vec<&str> = Vec::new();
    for c in counts {
        if !kinds.contains(&c.kind.as_str()) {
            kinds.push(&c.kind);
        }
    }

    let mut charts: Vec<BarChart> = Vec::new();
    for kind in kinds {
        let bars: Vec<Bar> = counts
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| Bar::new(subject_pos[c.subject.as_str()] as f64, c.count as f64).width(0.6))
            .collect();

        let mut chart = BarChart::new(bars)
            .name(kind)
            .color(state.kind_colors.color_for(kind));
        {
            let below: Vec<&BarChart> = charts.iter().collect();
            chart = chart.stack_on(&below);
        }
        charts.push(chart);
    }

    let labels: Vec<String> = subject_totals.into_iter().map(|(s, _)| s).collect();
    Plot::new("subject_kind_bar")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .y_axis_label("Count")
        .x_axis_formatter(move |mark, _range| axis_label(&labels, mark.value))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

/// Label integer positions with category names, leave the rest blank.
fn axis_label(labels: &[String], value: f64) -> String {
    let i = value.round();
    if (value - i).abs() > 0.05 || i < 0.0 {
        return String::new();
    }
    labels.get(i as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Pie chart: subject share of the filtered courses
// ---------------------------------------------------------------------------

fn pie_chart(ui: &mut Ui, state: &AppState) {
    let counts = &state.views.subject_counts;
    let total: usize = counts.iter().map(|c| c.count).sum();
    if total == 0 {
        no_data(ui, "No data available for the current selection.");
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        let (response, painter) = ui.allocate_painter(Vec2::splat(240.0), Sense::hover());
        let rect = response.rect;
        let center = rect.center();
        let radius = rect.width().min(rect.height()) * 0.5 - 4.0;

        // Wedges start at 12 o'clock and run clockwise.
        let mut angle = -FRAC_PI_2;
        for c in counts {
            let sweep = TAU * c.count as f64 / total as f64;
            wedge(
                &painter,
                center,
                radius,
                angle,
                angle + sweep,
                state.subject_colors.color_for(&c.subject),
            );
            angle += sweep;
        }

        ui.vertical(|ui: &mut Ui| {
            for c in counts {
                let pct = 100.0 * c.count as f64 / total as f64;
                ui.colored_label(
                    state.subject_colors.color_for(&c.subject),
                    format!("{}  –  {pct:.1}%", c.subject),
                );
            }
        });
    });
}

fn polar(center: Pos2, radius: f32, angle: f64) -> Pos2 {
    center + Vec2::new(angle.cos() as f32, angle.sin() as f32) * radius
}

/// Filled circular sector drawn as a fan of short arc segments.
fn wedge(painter: &Painter, center: Pos2, radius: f32, a0: f64, a1: f64, color: Color32) {
    let steps = (((a1 - a0) / 0.05).ceil() as usize).max(2);
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for k in 0..=steps {
        let a = a0 + (a1 - a0) * k as f64 / steps as f64;
        points.push(polar(center, radius, a));
    }
    painter.add(Shape::convex_polygon(points, color, Stroke::NONE));
}

/// Filled annular sector, tessellated into convex quads so the painter
/// never sees a concave polygon.
fn annular_sector(
    painter: &Painter,
    center: Pos2,
    r_in: f32,
    r_out: f32,
    a0: f64,
    a1: f64,
    color: Color32,
) {
    let steps = (((a1 - a0) / 0.05).ceil() as usize).max(1);
    for k in 0..steps {
        let b0 = a0 + (a1 - a0) * k as f64 / steps as f64;
        let b1 = a0 + (a1 - a0) * (k + 1) as f64 / steps as f64;
        let quad = vec![
            polar(center, r_in, b0),
            polar(center, r_out, b0),
            polar(center, r_out, b1),
            polar(center, r_in, b1),
        ];
        painter.add(Shape::convex_polygon(quad, color, Stroke::NONE));
    }
}

fn lighten(color: Color32, t: f32) -> Color32 {
    let blend = |c: u8| (c as f32 + (255.0 - c as f32) * t) as u8;
    Color32::from_rgb(blend(color.r()), blend(color.g()), blend(color.b()))
}

// ---------------------------------------------------------------------------
// Sunburst: kind → subject → course, weighted by lesson count
// ---------------------------------------------------------------------------

fn sunburst(ui: &mut Ui, state: &AppState) {
    let kinds = &state.views.hierarchy;
    let total: u64 = kinds.iter().map(|k| k.lessons).sum();
    if total == 0 {
        no_data(ui, "No data available for the current selection.");
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        let (response, painter) = ui.allocate_painter(Vec2::splat(320.0), Sense::hover());
        let rect = response.rect;
        let center = rect.center();
        let radius = rect.width().min(rect.height()) * 0.5 - 4.0;
        let (r1, r2) = (radius / 3.0, radius * 2.0 / 3.0);

        let mut kind_start = -FRAC_PI_2;
        for kind in kinds {
            let kind_sweep = TAU * kind.lessons as f64 / total as f64;
            let kind_color = state.kind_colors.color_for(&kind.name);
            wedge(&painter, center, r1, kind_start, kind_start + kind_sweep, kind_color);

            let mut subject_start = kind_start;
            for subject in &kind.subjects {
                let subject_sweep = TAU * subject.lessons as f64 / total as f64;
                let subject_color = state.subject_colors.color_for(&subject.name);
                annular_sector(
                    &painter,
                    center,
                    r1,
                    r2,
                    subject_start,
                    subject_start + subject_sweep,
                    subject_color,
                );

                let mut course_start = subject_start;
                for &(_, lessons) in &subject.courses {
                    let course_sweep = TAU * u64::from(lessons) as f64 / total as f64;
                    annular_sector(
                        &painter,
                        center,
                        r2,
                        radius,
                        course_start,
                        course_start + course_sweep,
                        lighten(subject_color, 0.45),
                    );
                    course_start += course_sweep;
                }
                subject_start += subject_sweep;
            }
            kind_start += kind_sweep;
        }

        ui.vertical(|ui: &mut Ui| {
            ui.label("Inner ring: type.  Middle: subject.  Outer: course.");
            for kind in kinds {
                ui.colored_label(
                    state.kind_colors.color_for(&kind.name),
                    format!("{}  –  {} lessons", kind.name, kind.lessons),
                );
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Box plot: lessons per course, grouped by subject
// ---------------------------------------------------------------------------

fn box_plot(ui: &mut Ui, state: &AppState) {
    let summaries = &state.views.lesson_summaries;
    if summaries.is_empty() {
        no_data(ui, "No data available for the current selection.");
        return;
    }

    let mut plots: Vec<BoxPlot> = Vec::new();
    for (i, (subject, s)) in summaries.iter().enumerate() {
        let color = state.subject_colors.color_for(subject);
        let elem = BoxElem::new(i as f64, BoxSpread::new(s.min, s.q1, s.median, s.q3, s.max))
            .name(subject)
            .fill(lighten(color, 0.6))
            .stroke(Stroke::new(1.5, color));
        plots.push(BoxPlot::new(vec![elem]).name(subject));
    }

    let labels: Vec<String> = summaries.iter().map(|(s, _)| s.clone()).collect();
    Plot::new("lessons_box")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .y_axis_label("Lessons")
        .x_axis_formatter(move |mark, _range| axis_label(&labels, mark.value))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for plot in plots {
                plot_ui.box_plot(plot);
            }
        });
}

// ---------------------------------------------------------------------------
// Line chart: enrollment per academic year for the selected course
// ---------------------------------------------------------------------------

fn enrollment_line(ui: &mut Ui, state: &AppState) {
    let series = match &state.views.series {
        Some(series) => series,
        None => {
            no_data(ui, "No data available for the selected course code.");
            return;
        }
    };

    // Missing years break the line into separate runs: gaps, never zeros.
    let mut runs: Vec<Vec<[f64; 2]>> = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    for (i, (_, value)) in series.points.iter().enumerate() {
        match value {
            Some(v) => current.push([i as f64, f64::from(*v)]),
            None => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    if runs.is_empty() {
        no_data(ui, "No data available for the selected course code.");
        return;
    }

    let color = Color32::LIGHT_BLUE;
    let code = series.code.clone();
    let labels: Vec<String> = series.points.iter().map(|(year, _)| year.clone()).collect();

    Plot::new("enrollment_line")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .y_axis_label("Enrollment")
        .x_axis_formatter(move |mark, _range| axis_label(&labels, mark.value))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for run in runs {
                if run.len() == 1 {
                    // Isolated year: a line would be invisible, draw a marker.
                    plot_ui.points(Points::new(run).radius(3.0).color(color).name(&code));
                } else {
                    plot_ui.line(
                        Line::new(PlotPoints::new(run))
                            .color(color)
                            .width(1.5)
                            .name(&code),
                    );
                }
            }
        });
}
