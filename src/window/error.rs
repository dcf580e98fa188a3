use thiserror::Error;

/// Errors raised by window construction and dataset building.
///
/// Everything fails at first use: widths and label columns are checked when
/// the window is constructed, table length when a dataset is built.  None of
/// these conditions is transient, so nothing is retried.
#[derive(Debug, Error)]
pub enum WindowError {
    /// Invalid width/shift combination.
    #[error(
        "invalid window configuration: input_width={input_width}, \
         label_width={label_width}, shift={shift} ({reason})"
    )]
    Configuration {
        input_width: usize,
        label_width: usize,
        shift: usize,
        reason: &'static str,
    },

    /// A requested label column is absent from the table schema.
    #[error("label column '{column}' not found in schema {schema}")]
    LabelColumnNotFound { column: String, schema: String },

    /// The source table is shorter than one full window.
    #[error("source table has {rows} rows, need at least {needed} for one window")]
    EmptySource { rows: usize, needed: usize },

    /// Train and test tables disagree on columns.
    #[error("test table schema {test} does not match train schema {train}")]
    SchemaMismatch { train: String, test: String },
}
