//! Sliding-window dataset builder for sequence models.
//!
//! The [`window`] module turns a tabular time series into shuffled, batched
//! `(inputs, labels)` tensor pairs; [`data`] supplies the tables; the
//! remaining modules are the egui inspector around the diagnostic plot.

pub mod app;
pub mod color;
pub mod data;
pub mod state;
pub mod ui;
pub mod window;

pub use data::model::{Schema, Table};
pub use window::{Predictor, SlidingWindow, WindowError, WindowParams};
