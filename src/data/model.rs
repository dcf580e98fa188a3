use std::collections::BTreeMap;
use std::fmt;

use ndarray::{s, Array2, ArrayView1};

// ---------------------------------------------------------------------------
// Schema – ordered column names with a name → index map
// ---------------------------------------------------------------------------

/// Column schema of a source table: the ordered list of feature names plus a
/// name→position map built once at construction. Window configurations and
/// the plot layer resolve column names through this instead of scanning the
/// name list on every lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    names: Vec<String>,
    index: BTreeMap<String, usize>,
}

impl Schema {
    /// Build a schema from an ordered list of column names.
    pub fn new(names: Vec<String>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Schema { names, index }
    }

    /// Position of a column in the table's feature ordering.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Ordered column names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Table – a 2-D numeric time series (rows = time steps, columns = features)
// ---------------------------------------------------------------------------

/// A homogeneous numeric table: one row per time step, one column per named
/// feature. Backs every windowing operation; the window layer only ever
/// reads it.
#[derive(Debug, Clone)]
pub struct Table {
    pub schema: Schema,
    /// Shape (rows, features); `values.ncols() == schema.len()`.
    pub values: Array2<f32>,
}

impl Table {
    /// Build a table from an ordered column list and a (rows, features)
    /// array. Panics if the array width disagrees with the column count;
    /// loaders construct both from the same source, so a mismatch is a bug.
    pub fn new(columns: Vec<String>, values: Array2<f32>) -> Self {
        assert_eq!(
            columns.len(),
            values.ncols(),
            "column list and value array width disagree"
        );
        Table {
            schema: Schema::new(columns),
            values,
        }
    }

    /// Build a table column-wise; all columns must have equal length.
    pub fn from_columns(columns: Vec<(String, Vec<f32>)>) -> Self {
        let rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut values = Array2::zeros((rows, columns.len()));
        let mut names = Vec::with_capacity(columns.len());
        for (i, (name, col)) in columns.into_iter().enumerate() {
            assert_eq!(col.len(), rows, "column '{name}' has a different length");
            for (r, v) in col.into_iter().enumerate() {
                values[[r, i]] = v;
            }
            names.push(name);
        }
        Table::new(names, values)
    }

    /// Number of time steps.
    pub fn num_rows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of feature columns.
    pub fn num_features(&self) -> usize {
        self.values.ncols()
    }

    /// One feature column as a view.
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f32>> {
        let idx = self.schema.position(name)?;
        Some(self.values.column(idx))
    }

    /// A new table holding rows `[start, end)` of this one, same schema.
    /// Used by the inspector to split one series into train/test portions.
    pub fn slice_rows(&self, start: usize, end: usize) -> Table {
        let end = end.min(self.num_rows());
        let start = start.min(end);
        Table {
            schema: self.schema.clone(),
            values: self.values.slice(s![start..end, ..]).to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_positions_follow_column_order() {
        let schema = Schema::new(vec!["Open".into(), "Mid".into(), "Close".into()]);
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.position("Open"), Some(0));
        assert_eq!(schema.position("Mid"), Some(1));
        assert_eq!(schema.position("Close"), Some(2));
        assert_eq!(schema.position("Volume"), None);
    }

    #[test]
    fn from_columns_builds_row_major_values() {
        let table = Table::from_columns(vec![
            ("a".into(), vec![1.0, 2.0, 3.0]),
            ("b".into(), vec![4.0, 5.0, 6.0]),
        ]);
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.num_features(), 2);
        assert_eq!(table.values[[0, 0]], 1.0);
        assert_eq!(table.values[[0, 1]], 4.0);
        assert_eq!(table.values[[2, 1]], 6.0);
    }

    #[test]
    fn slice_rows_keeps_schema_and_clamps() {
        let table = Table::from_columns(vec![("a".into(), (0..10).map(|i| i as f32).collect())]);
        let head = table.slice_rows(0, 4);
        assert_eq!(head.num_rows(), 4);
        assert_eq!(head.schema, table.schema);
        let tail = table.slice_rows(8, 100);
        assert_eq!(tail.num_rows(), 2);
        assert_eq!(tail.values[[0, 0]], 8.0);
    }
}
