use std::path::Path;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AppState, Dimension, FilterEdit};

/// Optional logo shown above the filters.
const LOGO_PATH: &str = "assets/logo.png";

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.vertical_centered(|ui: &mut Ui| {
        if Path::new(LOGO_PATH).exists() {
            ui.add(
                egui::Image::new(format!("file://{LOGO_PATH}"))
                    .max_width(ui.available_width() * 0.8)
                    .max_height(120.0),
            );
        } else {
            ui.label(RichText::new(format!("No logo at {LOGO_PATH}")).weak());
        }
    });
    ui.add_space(4.0);

    ui.heading("Filters");
    ui.separator();

    if state.table.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    // Collect edits first and apply them once the widgets are drawn.
    let mut edits = Vec::new();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for dim in Dimension::ALL {
                let options = state.options(dim);
                let n_selected = options
                    .iter()
                    .filter(|v| state.is_selected(dim, v))
                    .count();
                let header_text = format!("{}  ({n_selected}/{})", dim.title(), options.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(dim.title())
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                edits.push(FilterEdit::SelectAll(dim));
                            }
                            if ui.small_button("None").clicked() {
                                edits.push(FilterEdit::SelectNone(dim));
                            }
                        });

                        for value in &options {
                            let mut checked = state.is_selected(dim, value);
                            if ui.checkbox(&mut checked, value.as_str()).changed() {
                                edits.push(FilterEdit::Toggle(dim, value.clone()));
                            }
                        }
                    });
            }
        });

    if !edits.is_empty() {
        for edit in edits {
            state.apply_edit(edit);
        }
        log::debug!("Selection changed, {} customers visible", state.visible_count);
    }
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
            let can_export = state.table.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export views…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{} customers loaded, {} visible",
                table.len(),
                state.visible_count
            ));
            let incomplete = table.incomplete_count();
            if incomplete > 0 {
                ui.label(
                    RichText::new(format!("{incomplete} with missing fields"))
                        .color(Color32::YELLOW),
                );
            }
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
        .set_title("Open campaign data")
        .add_filter("Supported files", &["csv", "tsv", "txt", "json", "parquet", "pq"])
        .add_filter("CSV / TSV", &["csv", "tsv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}

fn export_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export aggregate views")
        .add_filter("JSON", &["json"])
        .set_file_name("views.json")
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_views(&path) {
            log::error!("Export failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
