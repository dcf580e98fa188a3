/// UI layer: configuration panels and the example-batch plot.
pub mod panels;
pub mod plot;
