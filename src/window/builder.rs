use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use ndarray::{s, Array3, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

use crate::data::model::{Schema, Table};

use super::dataset::WindowedBatches;
use super::error::WindowError;

/// Default number of windows per produced batch.
pub const DEFAULT_BATCH_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// WindowParams – the user-facing configuration
// ---------------------------------------------------------------------------

/// Window geometry and dataset options.
///
/// `input_width` rows of every window feed the model, the final
/// `label_width` rows are the prediction targets, and `shift` is the offset
/// between the end of the inputs and the end of the labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowParams {
    pub input_width: usize,
    pub label_width: usize,
    pub shift: usize,
    /// Columns treated as prediction targets, in output-channel order.
    /// `None` keeps every feature channel in the labels.
    pub label_columns: Option<Vec<String>>,
    pub batch_size: usize,
    /// Fixed shuffle seed.  `None` draws a fresh order from the thread RNG
    /// on every pass, so batches (and the cached example) are not
    /// reproducible across runs.
    pub seed: Option<u64>,
}

impl Default for WindowParams {
    fn default() -> Self {
        WindowParams {
            input_width: 24,
            label_width: 1,
            shift: 1,
            label_columns: None,
            batch_size: DEFAULT_BATCH_SIZE,
            seed: None,
        }
    }
}

impl WindowParams {
    pub fn new(input_width: usize, label_width: usize, shift: usize) -> Self {
        WindowParams {
            input_width,
            label_width,
            shift,
            ..Default::default()
        }
    }

    pub fn with_label_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.label_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

// ---------------------------------------------------------------------------
// Splitter – the index arithmetic shared with the batch iterator
// ---------------------------------------------------------------------------

/// Resolved slice geometry: where inputs and labels live inside a window,
/// and which feature channels survive into the labels.
#[derive(Debug, Clone)]
pub(crate) struct Splitter {
    pub total_window_size: usize,
    pub input_width: usize,
    pub label_start: usize,
    /// Feature positions of the label columns, in label-column order.
    /// `None` passes every channel through.
    pub label_channels: Option<Vec<usize>>,
}

impl Splitter {
    /// Split a (batch, time, feature) stack of windows into inputs and
    /// labels.  The time axis must span exactly one full window.
    pub fn split(&self, windows: ArrayView3<'_, f32>) -> (Array3<f32>, Array3<f32>) {
        assert_eq!(
            windows.shape()[1],
            self.total_window_size,
            "window batch time axis must equal the total window size"
        );

        let inputs = windows.slice(s![.., ..self.input_width, ..]).to_owned();
        let label_rows = windows.slice(s![.., self.label_start.., ..]);
        let labels = match &self.label_channels {
            Some(channels) => label_rows.select(Axis(2), channels),
            None => label_rows.to_owned(),
        };
        (inputs, labels)
    }
}

// ---------------------------------------------------------------------------
// Predictor – the model collaborator for plotting
// ---------------------------------------------------------------------------

/// A prediction source for the diagnostic plot: maps an input batch of
/// shape (batch, input_width, features) to predictions of shape
/// (batch, label_width, label channels), aligned index-for-index with the
/// labels.
pub trait Predictor {
    fn predict(&self, inputs: &Array3<f32>) -> Array3<f32>;
}

impl<F> Predictor for F
where
    F: Fn(&Array3<f32>) -> Array3<f32>,
{
    fn predict(&self, inputs: &Array3<f32>) -> Array3<f32> {
        self(inputs)
    }
}

// ---------------------------------------------------------------------------
// SlidingWindow – configuration + dataset builder
// ---------------------------------------------------------------------------

/// Sliding-window dataset builder over a pair of train/test tables.
///
/// Immutable after construction apart from the one-time example cache.
/// Holds `Arc` clones of the tables, never copies of the data.
///
/// The example cache is not synchronised (`OnceCell`); use from a single
/// thread or wrap externally.
#[derive(Debug)]
pub struct SlidingWindow {
    params: WindowParams,
    total_window_size: usize,
    label_start: usize,
    splitter: Splitter,
    /// Channel index *within the labels* for each label column.
    label_positions: BTreeMap<String, usize>,
    schema: Schema,
    train_table: Arc<Table>,
    test_table: Arc<Table>,
    example: OnceCell<(Array3<f32>, Array3<f32>)>,
}

impl SlidingWindow {
    /// Validate the configuration against the tables and build the window.
    ///
    /// Fails with [`WindowError::Configuration`] when a width is zero or the
    /// label window does not fit, [`WindowError::SchemaMismatch`] when the
    /// tables disagree on columns, and [`WindowError::LabelColumnNotFound`]
    /// when a label column is absent from the schema.
    pub fn new(
        params: WindowParams,
        train_table: Arc<Table>,
        test_table: Arc<Table>,
    ) -> Result<Self, WindowError> {
        let configuration = |reason: &'static str| WindowError::Configuration {
            input_width: params.input_width,
            label_width: params.label_width,
            shift: params.shift,
            reason,
        };

        if params.input_width == 0 {
            return Err(configuration("input_width must be positive"));
        }
        if params.label_width == 0 {
            return Err(configuration("label_width must be positive"));
        }
        if params.batch_size == 0 {
            return Err(configuration("batch_size must be positive"));
        }

        let total_window_size = params.input_width + params.shift;
        if params.label_width > total_window_size {
            return Err(configuration(
                "label window does not fit: label_width > input_width + shift",
            ));
        }
        let label_start = total_window_size - params.label_width;

        if train_table.schema != test_table.schema {
            return Err(WindowError::SchemaMismatch {
                train: train_table.schema.to_string(),
                test: test_table.schema.to_string(),
            });
        }
        let schema = train_table.schema.clone();

        let mut label_positions = BTreeMap::new();
        let label_channels = match &params.label_columns {
            Some(columns) => {
                let mut channels = Vec::with_capacity(columns.len());
                for (i, name) in columns.iter().enumerate() {
                    let pos = schema.position(name).ok_or_else(|| {
                        WindowError::LabelColumnNotFound {
                            column: name.clone(),
                            schema: schema.to_string(),
                        }
                    })?;
                    channels.push(pos);
                    label_positions.insert(name.clone(), i);
                }
                Some(channels)
            }
            None => None,
        };

        let splitter = Splitter {
            total_window_size,
            input_width: params.input_width,
            label_start,
            label_channels,
        };

        Ok(SlidingWindow {
            params,
            total_window_size,
            label_start,
            splitter,
            label_positions,
            schema,
            train_table,
            test_table,
            example: OnceCell::new(),
        })
    }

    // -- Geometry accessors --

    pub fn input_width(&self) -> usize {
        self.params.input_width
    }

    pub fn label_width(&self) -> usize {
        self.params.label_width
    }

    pub fn shift(&self) -> usize {
        self.params.shift
    }

    pub fn total_window_size(&self) -> usize {
        self.total_window_size
    }

    /// Time-step positions of the inputs within a window.
    pub fn input_indices(&self) -> Range<usize> {
        0..self.params.input_width
    }

    /// Time-step positions of the labels within a window.
    pub fn label_indices(&self) -> Range<usize> {
        self.label_start..self.total_window_size
    }

    pub fn params(&self) -> &WindowParams {
        &self.params
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn label_columns(&self) -> Option<&[String]> {
        self.params.label_columns.as_deref()
    }

    /// Source feature position of each label channel, in channel order.
    /// Without a label-column set the labels carry every feature.
    pub fn label_channel_features(&self) -> Vec<usize> {
        match &self.splitter.label_channels {
            Some(channels) => channels.clone(),
            None => (0..self.schema.len()).collect(),
        }
    }

    /// Label channel carrying the given column, or `None` when the column is
    /// not a prediction target.  Without a label-column set every feature is
    /// a target, so this is the plain schema position.
    pub fn label_channel(&self, column: &str) -> Option<usize> {
        match self.params.label_columns {
            Some(_) => self.label_positions.get(column).copied(),
            None => self.schema.position(column),
        }
    }

    // -- Dataset construction --

    /// Split a (batch, total_window_size, feature) stack into
    /// `(inputs, labels)`.  Pure; inputs keep every channel over the input
    /// rows, labels keep the configured label channels over the label rows.
    pub fn split_window(&self, windows: ArrayView3<'_, f32>) -> (Array3<f32>, Array3<f32>) {
        self.splitter.split(windows)
    }

    /// Build a shuffled, batched pass over every stride-1 window of a table.
    ///
    /// Each call re-derives the windows and draws a fresh shuffle order, so
    /// the returned iterator is restartable by calling again.  A table
    /// shorter than one window fails with [`WindowError::EmptySource`].
    pub fn make_dataset(&self, table: &Arc<Table>) -> Result<WindowedBatches, WindowError> {
        if table.num_rows() < self.total_window_size {
            return Err(WindowError::EmptySource {
                rows: table.num_rows(),
                needed: self.total_window_size,
            });
        }
        Ok(WindowedBatches::new(
            Arc::clone(table),
            self.splitter.clone(),
            self.params.batch_size,
            self.params.seed,
        ))
    }

    /// A fresh pass over the training table (new shuffle per call).
    pub fn train(&self) -> Result<WindowedBatches, WindowError> {
        self.make_dataset(&self.train_table)
    }

    /// A fresh pass over the test table (new shuffle per call).
    pub fn test(&self) -> Result<WindowedBatches, WindowError> {
        self.make_dataset(&self.test_table)
    }

    /// One memoized `(inputs, labels)` batch from the training set, used by
    /// the diagnostic plot.  The first access pulls a batch from [`train`];
    /// every later access returns the cached pair without touching the
    /// dataset again.  Without a fixed seed the cached batch depends on the
    /// first shuffle.
    ///
    /// [`train`]: SlidingWindow::train
    pub fn example(&self) -> Result<&(Array3<f32>, Array3<f32>), WindowError> {
        if let Some(cached) = self.example.get() {
            return Ok(cached);
        }
        let batch = self
            .train()?
            .next()
            .ok_or(WindowError::EmptySource {
                rows: self.train_table.num_rows(),
                needed: self.total_window_size,
            })?;
        Ok(self.example.get_or_init(|| batch))
    }
}

impl fmt::Display for SlidingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total window size: {}", self.total_window_size)?;
        writeln!(f, "Input indices: {:?}", self.input_indices())?;
        writeln!(f, "Label indices: {:?}", self.label_indices())?;
        write!(
            f,
            "Label column name(s): {}",
            match self.label_columns() {
                Some(cols) => cols.join(", "),
                None => "all".to_string(),
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Table;
    use ndarray::Array3;

    /// 100-row table with columns Open/Mid/Close where
    /// `value = 1000 * column + row`, so any cell identifies its origin.
    fn table(rows: usize) -> Arc<Table> {
        Arc::new(Table::from_columns(
            ["Open", "Mid", "Close"]
                .iter()
                .enumerate()
                .map(|(c, name)| {
                    (
                        name.to_string(),
                        (0..rows).map(|r| (1000 * c + r) as f32).collect(),
                    )
                })
                .collect(),
        ))
    }

    fn window(params: WindowParams) -> Result<SlidingWindow, WindowError> {
        SlidingWindow::new(params, table(100), table(50))
    }

    #[test]
    fn derived_geometry_matches_widths() {
        let w = window(WindowParams::new(24, 1, 1).with_label_columns(["Mid"])).unwrap();
        assert_eq!(w.total_window_size(), 25);
        assert_eq!(w.input_indices(), 0..24);
        assert_eq!(w.label_indices(), 24..25);
        assert_eq!(w.input_indices().len(), w.input_width());
        assert_eq!(w.label_indices().len(), w.label_width());
    }

    #[test]
    fn wide_label_window_geometry() {
        // Label window spanning the whole window: label_start = 0.
        let w = window(WindowParams::new(6, 8, 2)).unwrap();
        assert_eq!(w.total_window_size(), 8);
        assert_eq!(w.label_indices(), 0..8);
    }

    #[test]
    fn oversized_label_width_is_a_configuration_error() {
        let err = window(WindowParams::new(4, 10, 2)).unwrap_err();
        assert!(matches!(err, WindowError::Configuration { .. }));
    }

    #[test]
    fn zero_widths_are_configuration_errors() {
        assert!(matches!(
            window(WindowParams::new(0, 1, 1)),
            Err(WindowError::Configuration { .. })
        ));
        assert!(matches!(
            window(WindowParams::new(24, 0, 1)),
            Err(WindowError::Configuration { .. })
        ));
        assert!(matches!(
            window(WindowParams::new(24, 1, 1).with_batch_size(0)),
            Err(WindowError::Configuration { .. })
        ));
    }

    #[test]
    fn missing_label_column_is_reported_by_name() {
        let err = window(WindowParams::new(24, 1, 1).with_label_columns(["Volume"])).unwrap_err();
        match err {
            WindowError::LabelColumnNotFound { column, .. } => assert_eq!(column, "Volume"),
            other => panic!("expected LabelColumnNotFound, got {other}"),
        }
    }

    #[test]
    fn mismatched_test_schema_is_rejected() {
        let test = Arc::new(Table::from_columns(vec![
            ("Open".to_string(), vec![0.0; 50]),
            ("Mid".to_string(), vec![0.0; 50]),
        ]));
        let err = SlidingWindow::new(WindowParams::new(24, 1, 1), table(100), test).unwrap_err();
        assert!(matches!(err, WindowError::SchemaMismatch { .. }));
    }

    #[test]
    fn split_window_selects_label_channels_in_given_order() {
        // Ask for labels in reverse table order to check ordering is ours.
        let w = window(WindowParams::new(4, 2, 2).with_label_columns(["Close", "Open"])).unwrap();

        // One window of 6 rows, 3 features, value = 1000 * feature + row.
        let mut windows = Array3::zeros((1, 6, 3));
        for t in 0..6 {
            for c in 0..3 {
                windows[[0, t, c]] = (1000 * c + t) as f32;
            }
        }

        let (inputs, labels) = w.split_window(windows.view());
        assert_eq!(inputs.shape(), &[1, 4, 3]);
        assert_eq!(labels.shape(), &[1, 2, 2]);
        // Label rows are 4 and 5; channel 0 is Close (feature 2), channel 1
        // is Open (feature 0).
        assert_eq!(labels[[0, 0, 0]], 2004.0);
        assert_eq!(labels[[0, 1, 0]], 2005.0);
        assert_eq!(labels[[0, 0, 1]], 4.0);
        assert_eq!(labels[[0, 1, 1]], 5.0);
    }

    #[test]
    fn split_window_without_label_columns_keeps_every_channel() {
        let w = window(WindowParams::new(4, 1, 1)).unwrap();
        let windows = Array3::zeros((2, 5, 3));
        let (inputs, labels) = w.split_window(windows.view());
        assert_eq!(inputs.shape(), &[2, 4, 3]);
        assert_eq!(labels.shape(), &[2, 1, 3]);
    }

    #[test]
    fn label_channel_resolution() {
        let w = window(WindowParams::new(24, 1, 1).with_label_columns(["Mid"])).unwrap();
        assert_eq!(w.label_channel("Mid"), Some(0));
        // Not a prediction target: the plot silently skips markers for it.
        assert_eq!(w.label_channel("Open"), None);

        let all = window(WindowParams::new(24, 1, 1)).unwrap();
        assert_eq!(all.label_channel("Close"), Some(2));
    }

    #[test]
    fn batch_shapes_match_the_concrete_scenario() {
        // 100 rows, (24, 1, 1), labels = ['Mid'] → windows of 25 rows,
        // inputs (≤32, 24, 3), labels (≤32, 1, 1).
        let w = window(WindowParams::new(24, 1, 1).with_label_columns(["Mid"])).unwrap();
        for (inputs, labels) in w.train().unwrap() {
            assert!(inputs.shape()[0] <= 32);
            assert_eq!(inputs.shape()[0], labels.shape()[0]);
            assert_eq!(&inputs.shape()[1..], &[24, 3]);
            assert_eq!(&labels.shape()[1..], &[1, 1]);
        }
    }

    #[test]
    fn example_is_memoized() {
        let w = window(WindowParams::new(24, 1, 1).with_label_columns(["Mid"])).unwrap();
        let first = {
            let (inputs, labels) = w.example().unwrap();
            (inputs.clone(), labels.clone())
        };
        // No seed is set, so a fresh pull would almost surely differ; the
        // cache must return the identical batch regardless.
        let (inputs, labels) = w.example().unwrap();
        assert_eq!(inputs, &first.0);
        assert_eq!(labels, &first.1);
    }

    #[test]
    fn undersized_train_table_fails_loudly() {
        let w = SlidingWindow::new(WindowParams::new(24, 1, 1), table(10), table(10)).unwrap();
        match w.train() {
            Err(WindowError::EmptySource { rows, needed }) => {
                assert_eq!(rows, 10);
                assert_eq!(needed, 25);
            }
            other => panic!("expected EmptySource, got {:?}", other.map(|_| ())),
        }
        assert!(w.example().is_err());
    }

    #[test]
    fn display_summarises_the_geometry() {
        let w = window(WindowParams::new(24, 1, 1).with_label_columns(["Mid"])).unwrap();
        let repr = w.to_string();
        assert!(repr.contains("Total window size: 25"));
        assert!(repr.contains("Label column name(s): Mid"));
    }
}
