use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, MarkerShape, Plot, PlotPoints, Points};

use crate::state::AppState;
use crate::window::{Predictor, SlidingWindow};

// Marker colours matching the usual input/label/prediction convention.
const LABEL_COLOR: Color32 = Color32::from_rgb(0x2c, 0xa0, 0x2c);
const PREDICTION_COLOR: Color32 = Color32::from_rgb(0xff, 0x7f, 0x0e);

// ---------------------------------------------------------------------------
// Example-batch plot (central panel)
// ---------------------------------------------------------------------------

/// Render the diagnostic plot in the central panel.
pub fn central_panel(ui: &mut Ui, state: &AppState) {
    let Some(window) = &state.window else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading(match state.table {
                Some(_) => "Fix the window configuration to see example batches",
                None => "Open a time series to inspect windows  (File → Open…)",
            });
        });
        return;
    };

    let baseline = state.baseline(window);
    let trace_color = state
        .color_map
        .as_ref()
        .map(|cm| cm.color_for(&state.plot_column))
        .unwrap_or(Color32::LIGHT_BLUE);

    example_plot(
        ui,
        window,
        baseline.as_ref().map(|b| b as &dyn Predictor),
        &state.plot_column,
        state.max_subplots,
        trace_color,
    );
}

/// Draw up to `min(max_subplots, batch)` rows of the window's memoized
/// example batch, stacked vertically.
///
/// Every subplot shows the input trace of `plot_col`.  Label markers — and
/// prediction markers when a model is given — appear only when `plot_col`
/// is one of the prediction targets; otherwise they are skipped without
/// comment, matching the plot's diagnostic role.
pub fn example_plot(
    ui: &mut Ui,
    window: &SlidingWindow,
    model: Option<&dyn Predictor>,
    plot_col: &str,
    max_subplots: usize,
    trace_color: Color32,
) {
    let Some(col_index) = window.schema().position(plot_col) else {
        ui.label(format!("Column '{plot_col}' is not in the schema"));
        return;
    };

    let (inputs, labels) = match window.example() {
        Ok(batch) => batch,
        Err(e) => {
            ui.label(format!("No example batch: {e}"));
            return;
        }
    };

    // One prediction pass over the cached inputs covers every subplot.
    let predictions = model.map(|m| m.predict(inputs));
    let label_channel = window.label_channel(plot_col);

    let max_n = max_subplots.min(inputs.shape()[0]);
    let subplot_height = (ui.available_height() / max_n as f32 - 8.0).max(80.0);

    for n in 0..max_n {
        let mut plot = Plot::new(format!("example_plot_{n}"))
            .height(subplot_height)
            .y_axis_label(format!("{plot_col} [normed]"))
            .allow_scroll(false);
        if n == 0 {
            plot = plot.legend(Legend::default());
        }
        if n + 1 == max_n {
            plot = plot.x_axis_label("Time step");
        }

        plot.show(ui, |plot_ui| {
            let input_points: PlotPoints = window
                .input_indices()
                .map(|t| [t as f64, inputs[[n, t, col_index]] as f64])
                .collect();
            plot_ui.line(
                Line::new(input_points)
                    .name("Inputs")
                    .color(trace_color)
                    .width(1.5),
            );

            let Some(channel) = label_channel else {
                return;
            };

            let label_points: PlotPoints = window
                .label_indices()
                .enumerate()
                .map(|(i, t)| [t as f64, labels[[n, i, channel]] as f64])
                .collect();
            plot_ui.points(
                Points::new(label_points)
                    .name("Labels")
                    .color(LABEL_COLOR)
                    .shape(MarkerShape::Circle)
                    .radius(5.0),
            );

            if let Some(preds) = &predictions {
                let pred_points: PlotPoints = window
                    .label_indices()
                    .enumerate()
                    .map(|(i, t)| [t as f64, preds[[n, i, channel]] as f64])
                    .collect();
                plot_ui.points(
                    Points::new(pred_points)
                        .name("Predictions")
                        .color(PREDICTION_COLOR)
                        .shape(MarkerShape::Cross)
                        .radius(5.0),
                );
            }
        });
    }
}
