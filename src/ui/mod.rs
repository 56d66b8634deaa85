// UI module for rendering failure output.
// Turns aggregated failure data into the heatmap artifact.

mod heatmap;

pub use heatmap::write_heatmap;
