/// Data layer: source tables and loading.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  Array2<f32> rows × named feature columns, Schema
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  window   │  slide, shuffle, batch → (inputs, labels)
///   └──────────┘
/// ```
pub mod loader;
pub mod model;
