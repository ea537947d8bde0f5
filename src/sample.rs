//! Decimation of a finely stepped simulation down to an output frame rate.

use crate::{foundation::core::Fps, sim::state::SimulationState};

/// Capture decision after a simulation step: `floor(elapsed * fps) > captured`.
///
/// Pure; callable from any stepping loop.
pub fn should_capture(elapsed: f64, fps: Fps, captured: u64) -> bool {
    if !elapsed.is_finite() || elapsed < 0.0 {
        return false;
    }
    fps.secs_to_frames_floor(elapsed) > captured
}

/// Snapshots in capture order, which is also simulated-time order.
#[derive(Clone, Debug, Default)]
pub struct StateBuffer {
    states: Vec<SimulationState>,
}

impl StateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn as_slice(&self) -> &[SimulationState] {
        &self.states
    }

    pub fn first(&self) -> Option<&SimulationState> {
        self.states.first()
    }

    pub fn last(&self) -> Option<&SimulationState> {
        self.states.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SimulationState> {
        self.states.iter()
    }

    fn push(&mut self, state: SimulationState) {
        debug_assert!(
            self.states
                .last()
                .is_none_or(|prev| prev.time() < state.time()),
            "state buffer must be strictly increasing in time"
        );
        self.states.push(state);
    }
}

impl<'a> IntoIterator for &'a StateBuffer {
    type Item = &'a SimulationState;
    type IntoIter = std::slice::Iter<'a, SimulationState>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.iter()
    }
}

/// Owns the capture counter for one run and the buffer it fills.
#[derive(Debug)]
pub struct StateSampler {
    fps: Fps,
    start_time: f64,
    buffer: StateBuffer,
}

impl StateSampler {
    /// Start sampling a run whose clock currently reads `start_time`.
    pub fn new(fps: Fps, start_time: f64) -> Self {
        Self {
            fps,
            start_time,
            buffer: StateBuffer::new(),
        }
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn captured(&self) -> u64 {
        self.buffer.len() as u64
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.start_time
    }

    /// Call once after every simulation step.
    ///
    /// `capture` is invoked with the next capture index only when a snapshot is due, so at most
    /// one snapshot is taken per step. Returns whether a snapshot was taken.
    pub fn observe(&mut self, now: f64, capture: impl FnOnce(u64) -> SimulationState) -> bool {
        let captured = self.captured();
        if !should_capture(self.elapsed(now), self.fps, captured) {
            return false;
        }
        self.buffer.push(capture(captured));
        true
    }

    pub fn buffer(&self) -> &StateBuffer {
        &self.buffer
    }

    pub fn finish(self) -> StateBuffer {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fps(n: u32) -> Fps {
        Fps::new(n).unwrap()
    }

    #[test]
    fn predicate_fires_on_frame_boundaries() {
        assert!(!should_capture(0.0, fps(60), 0));
        assert!(!should_capture(0.016, fps(60), 0));
        assert!(should_capture(0.017, fps(60), 0));
        assert!(!should_capture(0.017, fps(60), 1));
        assert!(should_capture(1.0, fps(60), 59));
    }

    #[test]
    fn predicate_ignores_negative_and_nan_elapsed() {
        assert!(!should_capture(-1.0, fps(30), 0));
        assert!(!should_capture(f64::NAN, fps(30), 0));
    }

    #[test]
    fn observe_captures_at_most_once_per_call() {
        let mut s = StateSampler::new(fps(10), 0.0);
        // Far past several frame boundaries: still a single capture.
        assert!(s.observe(0.55, |i| SimulationState::new(i, vec![0.55])));
        assert_eq!(s.captured(), 1);
        assert!(s.observe(0.56, |i| SimulationState::new(i, vec![0.56])));
        assert_eq!(s.captured(), 2);
    }

    #[test]
    fn observe_skips_without_calling_capture() {
        let mut s = StateSampler::new(fps(10), 0.0);
        let took = s.observe(0.05, |_| panic!("capture must not run"));
        assert!(!took);
        assert!(s.buffer().is_empty());
    }

    #[test]
    fn elapsed_is_relative_to_start() {
        let mut s = StateSampler::new(fps(10), 4.0);
        assert!(!s.observe(4.05, |i| SimulationState::new(i, vec![4.05])));
        assert!(s.observe(4.15, |i| SimulationState::new(i, vec![4.15])));
        let buf = s.finish();
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.first().unwrap().capture_index(), 0);
    }
}
