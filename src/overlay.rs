//! Per-frame annotation: elapsed-time caption and a series plot synced to playback time.

pub mod composite;
pub mod compositor;
pub mod plot;
pub mod series;
pub mod svg_raster;
pub mod text;
