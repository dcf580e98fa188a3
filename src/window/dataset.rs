use std::sync::Arc;

use ndarray::{s, Array3};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::model::Table;

use super::builder::Splitter;

// ---------------------------------------------------------------------------
// WindowedBatches – one shuffled, batched pass over a table
// ---------------------------------------------------------------------------

/// A single shuffled pass over every stride-1 window of a table, grouped
/// into `(inputs, labels)` batches.
///
/// Window `i` covers rows `[i, i + total_window_size)`; every valid start is
/// visited exactly once per pass.  The iterator is lazy: window tensors are
/// assembled when a batch is pulled, nothing is precomputed beyond the
/// shuffled start order.  Restart by asking the owning window for a new
/// pass, which re-derives the windows and reshuffles.
pub struct WindowedBatches {
    table: Arc<Table>,
    splitter: Splitter,
    batch_size: usize,
    /// Window start rows in shuffled draw order.
    order: Vec<usize>,
    cursor: usize,
}

impl WindowedBatches {
    /// Callers guarantee `table.num_rows() >= total_window_size`.
    pub(crate) fn new(
        table: Arc<Table>,
        splitter: Splitter,
        batch_size: usize,
        seed: Option<u64>,
    ) -> Self {
        let num_windows = table.num_rows() + 1 - splitter.total_window_size;
        let mut order: Vec<usize> = (0..num_windows).collect();
        match seed {
            Some(seed) => order.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => order.shuffle(&mut rand::thread_rng()),
        }
        WindowedBatches {
            table,
            splitter,
            batch_size,
            order,
            cursor: 0,
        }
    }

    /// Windows in this pass.
    pub fn num_windows(&self) -> usize {
        self.order.len()
    }

    /// Batches in this pass (the last one may be short).
    pub fn num_batches(&self) -> usize {
        self.order.len().div_ceil(self.batch_size)
    }
}

impl Iterator for WindowedBatches {
    type Item = (Array3<f32>, Array3<f32>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let starts = &self.order[self.cursor..end];
        self.cursor = end;

        let total = self.splitter.total_window_size;
        let mut windows =
            Array3::zeros((starts.len(), total, self.table.num_features()));
        for (i, &start) in starts.iter().enumerate() {
            windows
                .slice_mut(s![i, .., ..])
                .assign(&self.table.values.slice(s![start..start + total, ..]));
        }

        Some(self.splitter.split(windows.view()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.order.len() - self.cursor).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::builder::{SlidingWindow, WindowParams};

    /// Single-column table where `value = row`, so every window cell names
    /// its source row.
    fn ramp(rows: usize) -> Arc<Table> {
        Arc::new(Table::from_columns(vec![(
            "Mid".to_string(),
            (0..rows).map(|r| r as f32).collect(),
        )]))
    }

    fn window(rows: usize, params: WindowParams) -> SlidingWindow {
        SlidingWindow::new(params, ramp(rows), ramp(rows)).unwrap()
    }

    #[test]
    fn pass_covers_every_window_exactly_once() {
        // 100 rows, window of 25 → 76 starts; 32-window batches → 3 batches.
        let w = window(100, WindowParams::new(24, 1, 1));
        let pass = w.train().unwrap();
        assert_eq!(pass.num_windows(), 76);
        assert_eq!(pass.num_batches(), 3);

        let mut starts = Vec::new();
        let mut batch_sizes = Vec::new();
        for (inputs, _) in pass {
            batch_sizes.push(inputs.shape()[0]);
            for n in 0..inputs.shape()[0] {
                // First input cell is the window's start row.
                starts.push(inputs[[n, 0, 0]] as usize);
            }
        }
        assert_eq!(batch_sizes, vec![32, 32, 12]);
        starts.sort_unstable();
        assert_eq!(starts, (0..76).collect::<Vec<_>>());
    }

    #[test]
    fn windows_are_contiguous_and_labels_aligned() {
        let w = window(60, WindowParams::new(8, 2, 3).with_seed(7));
        for (inputs, labels) in w.train().unwrap() {
            for n in 0..inputs.shape()[0] {
                let start = inputs[[n, 0, 0]];
                for t in 0..8 {
                    assert_eq!(inputs[[n, t, 0]], start + t as f32);
                }
                // total = 11, label_start = 9: labels are rows start+9, start+10.
                assert_eq!(labels[[n, 0, 0]], start + 9.0);
                assert_eq!(labels[[n, 1, 0]], start + 10.0);
            }
        }
    }

    #[test]
    fn fixed_seed_reproduces_the_pass() {
        let w = window(100, WindowParams::new(24, 1, 1).with_seed(42));
        let a: Vec<_> = w.train().unwrap().collect();
        let b: Vec<_> = w.train().unwrap().collect();
        assert_eq!(a.len(), b.len());
        for ((ia, la), (ib, lb)) in a.iter().zip(&b) {
            assert_eq!(ia, ib);
            assert_eq!(la, lb);
        }
    }

    #[test]
    fn table_of_exactly_one_window_yields_one_batch() {
        let w = window(25, WindowParams::new(24, 1, 1));
        let batches: Vec<_> = w.train().unwrap().collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].0.shape(), &[1, 24, 1]);
        assert_eq!(batches[0].1.shape(), &[1, 1, 1]);
    }

    #[test]
    fn size_hint_tracks_remaining_batches() {
        let w = window(100, WindowParams::new(24, 1, 1));
        let mut pass = w.train().unwrap();
        assert_eq!(pass.size_hint(), (3, Some(3)));
        pass.next();
        assert_eq!(pass.size_hint(), (2, Some(2)));
        pass.by_ref().for_each(drop);
        assert_eq!(pass.size_hint(), (0, Some(0)));
    }
}
