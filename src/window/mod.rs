/// Window layer: sliding-window dataset construction.
///
/// A [`SlidingWindow`] fixes the window geometry once — input width, label
/// width, shift — and builds shuffled, batched `(inputs, labels)` passes
/// over its train/test tables:
///
/// ```text
///   Table (rows × features)
///        │  stride-1 windows of input_width + shift rows
///        ▼
///   shuffled starts ── batches of ≤ batch_size windows
///        │
///        ▼
///   split: inputs  = (batch, input_width, features)
///          labels  = (batch, label_width, label columns)
/// ```
mod dataset;
mod error;
mod builder;

pub use dataset::WindowedBatches;
pub use error::WindowError;
pub use builder::{Predictor, SlidingWindow, WindowParams, DEFAULT_BATCH_SIZE};
