use std::sync::Arc;

use ndarray::Array3;

use crate::color::ColorMap;
use crate::data::model::Table;
use crate::window::{Predictor, SlidingWindow, WindowParams};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full inspector state, independent of rendering.
pub struct AppState {
    /// The loaded source series (None until the user opens a file).
    pub table: Option<Arc<Table>>,

    /// Display name of the loaded file.
    pub source_name: Option<String>,

    /// Leading fraction of rows used as the training table; the rest is test.
    pub train_fraction: f32,

    /// Window geometry and dataset options being edited in the side panel.
    pub params: WindowParams,

    /// Window built from `table` + `params` (None while unbuildable).
    pub window: Option<SlidingWindow>,

    /// Column drawn in the example plot.
    pub plot_column: String,

    pub max_subplots: usize,

    /// Overlay last-value baseline predictions on the plot.
    pub overlay_baseline: bool,

    /// Column → trace colour.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            table: None,
            source_name: None,
            train_fraction: 0.8,
            params: WindowParams::default(),
            window: None,
            plot_column: String::new(),
            max_subplots: 3,
            overlay_baseline: false,
            color_map: None,
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded table, pick defaults, and build the window.
    pub fn set_table(&mut self, table: Table, name: String) {
        let columns = table.schema.names();
        self.plot_column = if columns.iter().any(|c| c == "Mid") {
            "Mid".to_string()
        } else {
            columns.first().cloned().unwrap_or_default()
        };
        self.color_map = Some(ColorMap::new(columns));

        // Drop label columns that the new schema doesn't carry.
        if let Some(labels) = &mut self.params.label_columns {
            labels.retain(|l| columns.contains(l));
            if labels.is_empty() {
                self.params.label_columns = None;
            }
        }

        self.table = Some(Arc::new(table));
        self.source_name = Some(name);
        self.rebuild();
    }

    /// Rebuild the window from the current table, split, and parameters.
    /// Construction errors land in the status line instead of panicking.
    pub fn rebuild(&mut self) {
        let Some(table) = &self.table else {
            return;
        };

        let split_row = (table.num_rows() as f32 * self.train_fraction) as usize;
        let train = Arc::new(table.slice_rows(0, split_row));
        let test = Arc::new(table.slice_rows(split_row, table.num_rows()));

        match SlidingWindow::new(self.params.clone(), train, test) {
            Ok(window) => {
                self.window = Some(window);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Cannot build window: {e}");
                self.window = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Toggle a column in the label set, preserving click order.
    pub fn toggle_label_column(&mut self, column: &str) {
        let labels = self.params.label_columns.get_or_insert_with(Vec::new);
        if let Some(pos) = labels.iter().position(|l| l == column) {
            labels.remove(pos);
        } else {
            labels.push(column.to_string());
        }
        if self
            .params
            .label_columns
            .as_ref()
            .is_some_and(|l| l.is_empty())
        {
            self.params.label_columns = None;
        }
        self.rebuild();
    }

    /// The baseline predictor for the current window, when the overlay is on.
    pub fn baseline(&self, window: &SlidingWindow) -> Option<LastValueBaseline> {
        self.overlay_baseline.then(|| LastValueBaseline {
            label_width: window.label_width(),
            features: window.label_channel_features(),
        })
    }
}

// ---------------------------------------------------------------------------
// Last-value baseline – the inspector's built-in plot collaborator
// ---------------------------------------------------------------------------

/// Repeats the final input value of each label column across the label
/// window.  Exists so the prediction overlay can be exercised without a
/// trained model; it is not a forecast worth acting on.
pub struct LastValueBaseline {
    pub label_width: usize,
    /// Source feature position of each label channel.
    pub features: Vec<usize>,
}

impl Predictor for LastValueBaseline {
    fn predict(&self, inputs: &Array3<f32>) -> Array3<f32> {
        let batch = inputs.shape()[0];
        let last = inputs.shape()[1] - 1;
        let mut out = Array3::zeros((batch, self.label_width, self.features.len()));
        for n in 0..batch {
            for (c, &feature) in self.features.iter().enumerate() {
                let value = inputs[[n, last, feature]];
                for t in 0..self.label_width {
                    out[[n, t, c]] = value;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn baseline_repeats_last_input_per_channel() {
        let mut inputs = Array3::zeros((2, 4, 3));
        inputs[[0, 3, 2]] = 7.0;
        inputs[[1, 3, 0]] = -1.0;

        let baseline = LastValueBaseline {
            label_width: 2,
            features: vec![2, 0],
        };
        let out = baseline.predict(&inputs);
        assert_eq!(out.shape(), &[2, 2, 2]);
        assert_eq!(out[[0, 0, 0]], 7.0);
        assert_eq!(out[[0, 1, 0]], 7.0);
        assert_eq!(out[[1, 0, 1]], -1.0);
    }

    #[test]
    fn toggle_label_column_preserves_click_order() {
        let mut state = AppState::default();
        state.toggle_label_column("Close");
        state.toggle_label_column("Open");
        assert_eq!(
            state.params.label_columns.as_deref(),
            Some(&["Close".to_string(), "Open".to_string()][..])
        );
        state.toggle_label_column("Close");
        assert_eq!(
            state.params.label_columns.as_deref(),
            Some(&["Open".to_string()][..])
        );
        state.toggle_label_column("Open");
        assert_eq!(state.params.label_columns, None);
    }
}
