use crate::{
    encode::{
        assemble::{AssembleStats, assemble},
        sink::FrameSink,
    },
    foundation::core::Fps,
    foundation::error::{ReelError, ReelResult},
    overlay::{
        compositor::{Compositor, OverlayOpts},
        series::OverlaySeries,
    },
    render::{
        backend::{Frame, Rasterizer},
        replay::ReplayRenderer,
    },
    sample::{StateBuffer, StateSampler},
    sim::{data::SimData, model::ArmModel},
};

/// World axis read from a probed body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeAxis {
    X,
    Y,
}

/// Records one series point per captured state: the tip position of `body` along `axis`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SeriesProbe {
    pub body: String,
    pub axis: ProbeAxis,
}

/// Options for [`record`].
#[derive(Clone, Debug)]
pub struct RecordOpts {
    pub fps: Fps,
    /// Simulated seconds to record, measured from the current simulation time.
    pub duration: f64,
    pub probe: Option<SeriesProbe>,
}

/// Result of the simulation pass.
#[derive(Clone, Debug)]
pub struct Recording {
    pub states: StateBuffer,
    /// Present only when a probe was configured and at least one state was captured.
    pub series: Option<OverlaySeries>,
}

fn check_duration(duration: f64) -> ReelResult<()> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(ReelError::configuration(format!(
            "duration must be finite and > 0, got {duration}"
        )));
    }
    Ok(())
}

/// Step the simulation for `duration` seconds without sampling. Returns the number of steps.
pub fn advance(model: &ArmModel, data: &mut SimData, duration: f64) -> ReelResult<u64> {
    check_duration(duration)?;
    let start = data.time();
    let mut steps = 0u64;
    while data.time() - start < duration {
        data.step(model)?;
        steps += 1;
    }
    data.forward(model);
    Ok(steps)
}

/// Simulation pass: step `data` until `duration` has elapsed, sampling states at `opts.fps`.
///
/// Sampling itself never fails; errors come from option validation or a diverging simulation.
#[tracing::instrument(skip(model, data, opts), fields(model = %model.name, fps = opts.fps.get(), duration = opts.duration))]
pub fn record(model: &ArmModel, data: &mut SimData, opts: &RecordOpts) -> ReelResult<Recording> {
    check_duration(opts.duration)?;
    let probe = opts.probe.as_ref().and_then(|p| match model.link_index(&p.body) {
        Some(idx) => Some((idx, p.axis)),
        None => {
            tracing::warn!(
                body = %p.body,
                model = %model.name,
                "unknown probe body; recording without an overlay series"
            );
            None
        }
    });

    let mut sampler = StateSampler::new(opts.fps, data.time());
    let mut times = Vec::new();
    let mut values = Vec::new();
    let mut steps = 0u64;

    while sampler.elapsed(data.time()) < opts.duration {
        data.step(model)?;
        steps += 1;
        let now = data.time();
        if !sampler.observe(now, |i| data.capture_state(i)) {
            continue;
        }
        if let Some((idx, axis)) = probe {
            data.forward(model);
            let (_, tip) = data.link_xpos[idx];
            times.push(now);
            values.push(match axis {
                ProbeAxis::X => tip.x,
                ProbeAxis::Y => tip.y,
            });
        }
    }
    data.forward(model);

    let states = sampler.finish();
    tracing::info!(steps, states = states.len(), end_time = data.time(), "simulation recorded");

    let series = if probe.is_some() && !times.is_empty() {
        Some(OverlaySeries::new(times, values)?)
    } else {
        None
    };
    Ok(Recording { states, series })
}

/// Render pass: replay every state through `camera`, then composite overlays.
///
/// Fails with [`ReelError::Configuration`] before rendering anything if `camera` is unknown.
pub fn render_frames<'m>(
    model: &'m ArmModel,
    states: &StateBuffer,
    rasterizer: Box<dyn Rasterizer + 'm>,
    camera: &str,
    compositor: &Compositor<'_>,
) -> ReelResult<Vec<Frame>> {
    let mut renderer = ReplayRenderer::new(model, rasterizer, camera)?;
    let frames = renderer.render_all(states)?;
    let stats = renderer.pool_stats();
    tracing::debug!(
        allocated = stats.allocated,
        leases = stats.leases,
        "scratch pool usage"
    );
    compositor.composite_all(frames)
}

/// Everything after the simulation pass: replay, overlays, trailing pause and encoding.
#[tracing::instrument(skip_all, fields(camera = camera, states = recording.states.len(), target = %sink.target()))]
pub fn render_to_video<'m>(
    model: &'m ArmModel,
    recording: &Recording,
    rasterizer: Box<dyn Rasterizer + 'm>,
    camera: &str,
    overlay: &OverlayOpts,
    fps: Fps,
    sink: &mut dyn FrameSink,
) -> ReelResult<AssembleStats> {
    let compositor = Compositor::new(overlay, recording.series.as_ref())?;
    let frames = render_frames(model, &recording.states, rasterizer, camera, &compositor)?;
    assemble(&frames, fps, sink)
}
