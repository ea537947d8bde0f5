use std::cmp::Ordering;

/// Immutable snapshot of everything the integrator needs at one simulated instant.
///
/// The layout is a flat `[time, qpos.., qvel..]` vector sized by
/// [`ArmModel::state_size`](crate::ArmModel::state_size). Two snapshots are the same snapshot when
/// they were captured at the same position in a run, regardless of their values.
#[derive(Clone, Debug)]
pub struct SimulationState {
    capture_index: u64,
    values: Box<[f64]>,
}

impl SimulationState {
    pub fn new(capture_index: u64, values: impl Into<Box<[f64]>>) -> Self {
        Self {
            capture_index,
            values: values.into(),
        }
    }

    pub fn capture_index(&self) -> u64 {
        self.capture_index
    }

    /// Simulated time of the snapshot, or NaN for an empty (malformed) state.
    pub fn time(&self) -> f64 {
        self.values.first().copied().unwrap_or(f64::NAN)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialEq for SimulationState {
    fn eq(&self, other: &Self) -> bool {
        self.capture_index == other.capture_index
    }
}

impl Eq for SimulationState {}

impl PartialOrd for SimulationState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimulationState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.capture_index.cmp(&other.capture_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_capture_order() {
        let a = SimulationState::new(3, vec![0.5, 1.0, 0.0]);
        let b = SimulationState::new(3, vec![9.0, 9.0, 9.0]);
        let c = SimulationState::new(4, vec![0.5, 1.0, 0.0]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a < c);
    }

    #[test]
    fn time_is_first_value() {
        assert_eq!(SimulationState::new(0, vec![0.25, 1.0]).time(), 0.25);
        assert!(SimulationState::new(0, Vec::new()).time().is_nan());
    }
}
