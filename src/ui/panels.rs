use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – window configuration
// ---------------------------------------------------------------------------

/// Render the configuration panel.  Any change rebuilds the window; invalid
/// combinations surface in the status line rather than blocking the edit.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Window");
    ui.separator();

    let Some(table) = state.table.clone() else {
        ui.label("No series loaded.");
        return;
    };
    let columns: Vec<String> = table.schema.names().to_vec();

    let mut changed = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Geometry ----
            egui::Grid::new("geometry_grid").num_columns(2).show(ui, |ui: &mut Ui| {
                ui.label("Input width");
                changed |= ui
                    .add(egui::DragValue::new(&mut state.params.input_width).range(1..=512))
                    .changed();
                ui.end_row();

                ui.label("Label width");
                changed |= ui
                    .add(egui::DragValue::new(&mut state.params.label_width).range(1..=512))
                    .changed();
                ui.end_row();

                ui.label("Shift");
                changed |= ui
                    .add(egui::DragValue::new(&mut state.params.shift).range(0..=512))
                    .changed();
                ui.end_row();

                ui.label("Batch size");
                changed |= ui
                    .add(egui::DragValue::new(&mut state.params.batch_size).range(1..=1024))
                    .changed();
                ui.end_row();
            });

            ui.label(format!(
                "Total window size: {}",
                state.params.input_width + state.params.shift
            ));
            ui.separator();

            // ---- Shuffle seed ----
            let mut seeded = state.params.seed.is_some();
            if ui.checkbox(&mut seeded, "Fixed shuffle seed").changed() {
                state.params.seed = seeded.then_some(42);
                changed = true;
            }
            if let Some(seed) = &mut state.params.seed {
                changed |= ui.add(egui::DragValue::new(seed)).changed();
            }
            ui.separator();

            // ---- Train/test split ----
            ui.strong("Train fraction");
            changed |= ui
                .add(egui::Slider::new(&mut state.train_fraction, 0.5..=0.95))
                .changed();
            ui.separator();

            // ---- Label columns ----
            ui.strong("Label columns");
            ui.label(RichText::new("none checked = all features").weak());
            for col in &columns {
                let mut checked = state
                    .params
                    .label_columns
                    .as_ref()
                    .is_some_and(|l| l.iter().any(|c| c == col));
                if ui.checkbox(&mut checked, col).changed() {
                    state.toggle_label_column(col);
                }
            }
            ui.separator();

            // ---- Plot options ----
            ui.strong("Plot column");
            egui::ComboBox::from_id_salt("plot_column")
                .selected_text(&state.plot_column)
                .show_ui(ui, |ui: &mut Ui| {
                    for col in &columns {
                        if ui
                            .selectable_label(state.plot_column == *col, col)
                            .clicked()
                        {
                            state.plot_column = col.clone();
                        }
                    }
                });

            ui.horizontal(|ui: &mut Ui| {
                ui.label("Max subplots");
                ui.add(egui::DragValue::new(&mut state.max_subplots).range(1..=8));
            });
            ui.checkbox(&mut state.overlay_baseline, "Overlay baseline predictions");
        });

    if changed {
        state.rebuild();
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
        });

        ui.separator();

        if let (Some(table), Some(name)) = (&state.table, &state.source_name) {
            ui.label(format!(
                "{name}: {} rows × {} features",
                table.num_rows(),
                table.num_features()
            ));
        }

        if let Some(window) = &state.window {
            ui.separator();
            if let Ok(pass) = window.train() {
                ui.label(format!("{} training windows", pass.num_windows()));
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open time series")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(table) => {
                log::info!(
                    "Loaded {} rows with columns {}",
                    table.num_rows(),
                    table.schema
                );
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                state.set_table(table, name);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
