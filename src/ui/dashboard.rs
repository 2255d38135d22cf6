use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::plot;
use crate::view::{Metric, ORDERS_BY_STATUS};

// ---------------------------------------------------------------------------
// Central panel – KPIs and charts
// ---------------------------------------------------------------------------

/// Render the dashboard for the latest view model.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(view) = &state.view else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open an order export to begin  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.label(RichText::new(&view.title).size(28.0).strong());
            ui.add_space(8.0);

            ui.heading("Key Performance Indicators");
            metric_tile(ui, &view.headline);
            ui.columns(view.secondary.len(), |cols: &mut [Ui]| {
                for (col, metric) in cols.iter_mut().zip(&view.secondary) {
                    metric_tile(col, metric);
                }
            });
            ui.add_space(12.0);

            for chart in &view.line_charts {
                ui.heading(chart.title);
                plot::line_chart(ui, chart, view.granularity);
                ui.add_space(12.0);
            }

            for chart in &view.bar_charts {
                let colors = if chart.title == ORDERS_BY_STATUS {
                    &state.status_colors
                } else {
                    &state.category_colors
                };
                ui.heading(chart.title);
                plot::bar_chart(ui, chart, colors);
                ui.add_space(12.0);
            }
        });
}

fn metric_tile(ui: &mut Ui, metric: &Metric) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_min_width(ui.available_width());
        ui.label(RichText::new(metric.label).weak());
        ui.label(RichText::new(&metric.value).size(24.0).strong());
    });
}
