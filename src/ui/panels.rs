use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::filter::Granularity;
use crate::state::AppState;
use crate::view::write_summary;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Options");
    ui.separator();

    // Clone what we need so we can mutate state inside the widgets.
    let (Some(dataset), Some(selection)) = (state.dataset.clone(), state.selection.clone()) else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Date range ----
            ui.strong("Select Purchase Date Range");
            match dataset.year_range() {
                Some(years) => {
                    let mut start = selection.start;
                    let mut end = selection.end;
                    let mut dates_changed = false;
                    egui::Grid::new("date_range").num_columns(2).show(ui, |ui: &mut Ui| {
                        ui.label("From");
                        dates_changed |= ui
                            .add(
                                DatePickerButton::new(&mut start)
                                    .id_salt("start_date")
                                    .start_end_years(years.clone()),
                            )
                            .changed();
                        ui.end_row();
                        ui.label("To");
                        dates_changed |= ui
                            .add(
                                DatePickerButton::new(&mut end)
                                    .id_salt("end_date")
                                    .start_end_years(years.clone()),
                            )
                            .changed();
                        ui.end_row();
                    });
                    if dates_changed {
                        state.set_date_range(start, end);
                    }
                }
                None => {
                    ui.label(RichText::new("No purchase dates in this file.").weak());
                }
            }
            ui.separator();

            // ---- Granularity ----
            ui.strong("Select Daily or Monthly View");
            egui::ComboBox::from_id_salt("granularity")
                .selected_text(selection.granularity.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for g in Granularity::ALL {
                        if ui
                            .selectable_label(selection.granularity == g, g.to_string())
                            .clicked()
                        {
                            state.set_granularity(g);
                        }
                    }
                });
            ui.separator();

            // ---- Status / category multi-selects ----
            let n_status = selection.statuses.len();
            egui::CollapsingHeader::new(
                RichText::new(format!("Order Status  ({n_status} selected)")).strong(),
            )
            .id_salt("status_filter")
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                for status in &dataset.statuses {
                    let mut checked = selection.statuses.contains(status);
                    let text = RichText::new(status).color(state.status_colors.color_for(status));
                    if ui.checkbox(&mut checked, text).changed() {
                        state.toggle_status(status);
                    }
                }
            });

            let n_category = selection.categories.len();
            egui::CollapsingHeader::new(
                RichText::new(format!("Product Categories  ({n_category} selected)")).strong(),
            )
            .id_salt("category_filter")
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                for category in &dataset.categories {
                    let mut checked = selection.categories.contains(category);
                    let text =
                        RichText::new(category).color(state.category_colors.color_for(category));
                    if ui.checkbox(&mut checked, text).changed() {
                        state.toggle_category(category);
                    }
                }
            });

            ui.add_space(4.0);
            ui.label(RichText::new("Nothing selected shows everything.").small().weak());
            if ui.small_button("Clear").clicked() {
                state.clear_filters();
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
            let can_export = state.view.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export summary…"))
                .clicked()
            {
                export_summary_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(view)) = (&state.dataset, &state.view) {
            ui.label(format!(
                "{} rows loaded, {} matching",
                ds.len(),
                view.row_count
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open order export")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.load_path(&path) {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

pub fn export_summary_dialog(state: &mut AppState) {
    let Some(view) = &state.view else {
        return;
    };
    let file = rfd::FileDialog::new()
        .set_title("Export dashboard summary")
        .set_file_name("dashboard_summary.json")
        .add_filter("JSON", &["json"])
        .save_file();

    if let Some(path) = file {
        match write_summary(view, &path) {
            Ok(()) => {
                log::info!("Exported dashboard summary to {}", path.display());
                state.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to export summary: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
