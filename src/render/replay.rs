use crate::{
    foundation::error::{ReelError, ReelResult},
    render::{
        backend::{Frame, RawFrame, Rasterizer},
        scratch_pool::{ScratchPool, ScratchPoolOpts, ScratchPoolStats},
    },
    sample::StateBuffer,
    sim::{model::ArmModel, state::SimulationState},
};

/// Turns stored snapshots back into pixels without re-integrating.
///
/// Each call leases a fresh scratch context, loads the snapshot, resolves link placement, and
/// rasterizes through the configured camera. The model is shared read-only by every call.
pub struct ReplayRenderer<'m> {
    model: &'m ArmModel,
    rasterizer: Box<dyn Rasterizer + 'm>,
    camera: String,
    pool: ScratchPool,
    calls: u64,
}

impl<'m> ReplayRenderer<'m> {
    /// Fails with [`ReelError::Configuration`] when `camera` is not offered by `rasterizer`, before
    /// anything is rendered.
    pub fn new(
        model: &'m ArmModel,
        rasterizer: Box<dyn Rasterizer + 'm>,
        camera: impl Into<String>,
    ) -> ReelResult<Self> {
        let camera = camera.into();
        let cameras = rasterizer.cameras();
        if !cameras.iter().any(|c| *c == camera) {
            return Err(ReelError::configuration(format!(
                "unknown camera '{camera}' (available: {})",
                if cameras.is_empty() {
                    "none".to_string()
                } else {
                    cameras.join(", ")
                }
            )));
        }
        Ok(Self {
            model,
            rasterizer,
            camera,
            pool: ScratchPool::new(ScratchPoolOpts::default()),
            calls: 0,
        })
    }

    pub fn camera(&self) -> &str {
        &self.camera
    }

    pub fn pool_stats(&self) -> ScratchPoolStats {
        self.pool.stats()
    }

    /// Replay one snapshot into the rasterizer's native buffer.
    pub fn render_raw(&mut self, state: &SimulationState) -> ReelResult<RawFrame> {
        let call_index = self.calls;
        self.calls += 1;

        let mut lease = self.pool.borrow(self.model, call_index);
        let out = (|| {
            let scratch = lease.data_mut();
            scratch.load_state(self.model, state)?;
            scratch.forward(self.model);
            debug_assert_eq!(scratch.time(), state.time());
            self.rasterizer
                .render(self.model, lease.data(), &self.camera)
        })();
        self.pool.release(lease);
        out
    }

    /// Replay one snapshot and canonicalize it into a top-down [`Frame`].
    pub fn render_state(&mut self, state: &SimulationState) -> ReelResult<Frame> {
        let raw = self.render_raw(state)?;
        Frame::from_raw(raw, state.time())
    }

    /// Replay a whole buffer in order. The first failure aborts the rest of the sequence.
    #[tracing::instrument(skip_all, fields(camera = %self.camera, states = states.len()))]
    pub fn render_all(&mut self, states: &StateBuffer) -> ReelResult<Vec<Frame>> {
        let mut frames = Vec::with_capacity(states.len());
        let last = states.len().saturating_sub(1);
        for (i, state) in states.iter().enumerate() {
            if i == 0 {
                tracing::info!(
                    time = state.time(),
                    frames = states.len(),
                    "replaying first stored state"
                );
            }
            if i == last {
                tracing::info!(time = state.time(), "replaying last stored state");
            }
            let frame = self.render_state(state).map_err(|e| {
                tracing::error!(index = i, error = %e, "replay failed; aborting sequence");
                e
            })?;
            frames.push(frame);
        }
        Ok(frames)
    }
}
