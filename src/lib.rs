#![forbid(unsafe_code)]
//! Offline screenshots and annotated videos of a physics simulation.
//!
//! A run has two passes. [`record`] steps the simulation and keeps a [`SimulationState`] every
//! `1/fps` simulated seconds. [`render_to_video`] then replays each state through a
//! [`Rasterizer`], draws the elapsed-time caption and the series plot, holds the last frame for
//! two seconds and streams everything into a [`FrameSink`].

pub mod config;
pub mod encode;
pub mod foundation;
pub mod overlay;
pub mod pipeline;
pub mod render;
pub mod sample;
pub mod sim;

pub use config::ReelConfig;
pub use encode::{
    assemble::{AssembleStats, PAUSE_SECS, assemble, check_sequence, pause_frames},
    ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir, is_ffmpeg_on_path},
    png::save_png,
    sink::{FrameSink, InMemorySink, SinkConfig},
};
pub use foundation::core::{Canvas, Fps, FrameIndex, Point};
pub use foundation::error::{ReelError, ReelResult};
pub use overlay::{
    compositor::{Compositor, OverlayOpts},
    plot::{PlotImage, SeriesPlot},
    series::{AxisLimits, OverlaySeries},
    svg_raster::{OverlayImage, SvgRasterizer},
    text::{TimeOverlay, elapsed_label},
};
pub use pipeline::{
    ProbeAxis, RecordOpts, Recording, SeriesProbe, advance, record, render_frames, render_to_video,
};
pub use render::{
    backend::{Frame, RawFrame, Rasterizer, RowOrder},
    cpu::CpuRasterizer,
    replay::ReplayRenderer,
    scratch_pool::{ScratchPool, ScratchPoolOpts, ScratchPoolStats},
};
pub use sample::{StateBuffer, StateSampler, should_capture};
pub use sim::{data::SimData, model::ArmModel, state::SimulationState};
