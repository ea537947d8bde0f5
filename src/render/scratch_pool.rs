use crate::sim::{data::SimData, model::ArmModel};

/// Pool configuration for replay scratch contexts.
#[derive(Debug, Clone, Copy)]
pub struct ScratchPoolOpts {
    /// Maximum number of idle contexts kept for reuse.
    pub max_retained: usize,
}

impl Default for ScratchPoolOpts {
    fn default() -> Self {
        // Replay is sequential, so one context is enough; a little slack for callers that hold
        // a lease while starting the next call.
        Self { max_retained: 2 }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScratchPoolStats {
    pub retained: usize,
    pub allocated: u64,
    pub leases: u64,
    pub dropped_on_release: u64,
}

/// A scratch context exclusively owned by one replay call.
#[derive(Debug)]
pub struct ScratchLease {
    call_index: u64,
    data: SimData,
}

impl ScratchLease {
    pub fn call_index(&self) -> u64 {
        self.call_index
    }

    pub fn data(&self) -> &SimData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut SimData {
        &mut self.data
    }
}

/// Bounded pool of [`SimData`] contexts used by replay rendering.
///
/// Every lease is reset to the model's rest state before it is handed out, so nothing loaded
/// for one call is visible to the next.
#[derive(Debug)]
pub struct ScratchPool {
    opts: ScratchPoolOpts,
    stats: ScratchPoolStats,
    free: Vec<SimData>,
}

impl ScratchPool {
    pub fn new(opts: ScratchPoolOpts) -> Self {
        Self {
            opts,
            stats: ScratchPoolStats::default(),
            free: Vec::new(),
        }
    }

    pub fn stats(&self) -> ScratchPoolStats {
        self.stats.clone()
    }

    pub fn borrow(&mut self, model: &ArmModel, call_index: u64) -> ScratchLease {
        self.stats.leases = self.stats.leases.saturating_add(1);
        let data = match self.free.pop() {
            Some(mut d) => {
                self.stats.retained = self.stats.retained.saturating_sub(1);
                d.reset(model);
                d
            }
            None => {
                self.stats.allocated = self.stats.allocated.saturating_add(1);
                SimData::new(model)
            }
        };
        ScratchLease { call_index, data }
    }

    pub fn release(&mut self, lease: ScratchLease) {
        if self.free.len() >= self.opts.max_retained {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }
        self.free.push(lease.data);
        self.stats.retained = self.stats.retained.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ArmModel {
        ArmModel::from_json_str(
            r#"{ "name": "p", "timestep": 0.01,
                 "links": [{ "name": "a", "length": 1.0, "mass": 1.0 }] }"#,
        )
        .unwrap()
    }

    #[test]
    fn reuses_released_context() {
        let m = model();
        let mut p = ScratchPool::new(ScratchPoolOpts::default());
        let a = p.borrow(&m, 0);
        p.release(a);
        let b = p.borrow(&m, 1);
        assert_eq!(b.call_index(), 1);
        let st = p.stats();
        assert_eq!(st.allocated, 1);
        assert_eq!(st.leases, 2);
        assert_eq!(st.retained, 0);
    }

    #[test]
    fn lease_is_reset_before_reuse() {
        let m = model();
        let mut p = ScratchPool::new(ScratchPoolOpts::default());
        let mut a = p.borrow(&m, 0);
        a.data_mut().qpos[0] = 1.0;
        a.data_mut().qvel[0] = 2.0;
        p.release(a);

        let b = p.borrow(&m, 1);
        assert_eq!(b.data().qpos, vec![0.0]);
        assert_eq!(b.data().qvel, vec![0.0]);
        assert_eq!(b.data().time(), 0.0);
    }

    #[test]
    fn honors_retention_cap() {
        let m = model();
        let mut p = ScratchPool::new(ScratchPoolOpts { max_retained: 1 });
        let a = p.borrow(&m, 0);
        let b = p.borrow(&m, 1);
        p.release(a);
        p.release(b);
        let st = p.stats();
        assert_eq!(st.retained, 1);
        assert_eq!(st.dropped_on_release, 1);
    }
}
