use crate::{
    foundation::core::Point,
    foundation::error::{ReelError, ReelResult},
    sim::{model::ArmModel, state::SimulationState},
};

/// Mutable simulation context for one [`ArmModel`]: the live integration state plus the derived
/// link placement computed by [`SimData::forward`].
#[derive(Clone, Debug)]
pub struct SimData {
    timestep: f64,
    time_origin: f64,
    steps: u64,
    pub qpos: Vec<f64>,
    pub qvel: Vec<f64>,
    /// World `(start, end)` of every link, valid after [`SimData::forward`].
    pub link_xpos: Vec<(Point, Point)>,
}

impl SimData {
    pub fn new(model: &ArmModel) -> Self {
        let nq = model.nq();
        Self {
            timestep: model.timestep,
            time_origin: 0.0,
            steps: 0,
            qpos: vec![0.0; nq],
            qvel: vec![0.0; nq],
            link_xpos: vec![(Point::ORIGIN, Point::ORIGIN); nq],
        }
    }

    /// Return to the model's rest pose at `t = 0`.
    pub fn reset(&mut self, model: &ArmModel) {
        let nq = model.nq();
        self.timestep = model.timestep;
        self.time_origin = 0.0;
        self.steps = 0;
        self.qpos.clear();
        self.qpos.resize(nq, 0.0);
        self.qvel.clear();
        self.qvel.resize(nq, 0.0);
        self.link_xpos.clear();
        self.link_xpos.resize(nq, (Point::ORIGIN, Point::ORIGIN));
    }

    pub fn reset_keyframe(&mut self, model: &ArmModel, name: &str) -> ReelResult<()> {
        let key = model
            .keyframe(name)
            .ok_or_else(|| ReelError::configuration(format!("unknown keyframe '{name}'")))?;
        self.reset(model);
        self.qpos.copy_from_slice(&key.qpos);
        if !key.qvel.is_empty() {
            self.qvel.copy_from_slice(&key.qvel);
        }
        Ok(())
    }

    /// Simulated time in seconds.
    ///
    /// Derived from a step counter rather than accumulated, so long runs do not drift.
    pub fn time(&self) -> f64 {
        self.time_origin + (self.steps as f64) * self.timestep
    }

    /// Advance one timestep with semi-implicit Euler.
    ///
    /// Each hinge is driven by the gravity torque on its own link about the joint and by viscous
    /// joint damping.
    pub fn step(&mut self, model: &ArmModel) -> ReelResult<()> {
        let dt = model.timestep;
        let mut abs_angle = 0.0;
        for (i, link) in model.links.iter().enumerate() {
            abs_angle += self.qpos[i];
            let inertia = link.mass * link.length * link.length / 3.0;
            let gravity_acc = -(3.0 * model.gravity / (2.0 * link.length)) * abs_angle.cos();
            let damping_acc = -(link.damping / inertia) * self.qvel[i];
            self.qvel[i] += dt * (gravity_acc + damping_acc);
        }
        for (q, v) in self.qpos.iter_mut().zip(&self.qvel) {
            *q += dt * v;
        }
        self.steps += 1;

        if self.qpos.iter().chain(&self.qvel).any(|v| !v.is_finite()) {
            return Err(ReelError::state(format!(
                "simulation diverged at t={:.6}",
                self.time()
            )));
        }
        Ok(())
    }

    /// Resolve link placement from joint positions. Does not touch time or velocities.
    pub fn forward(&mut self, model: &ArmModel) {
        let mut start = Point::new(model.base[0], model.base[1]);
        let mut abs_angle = 0.0;
        self.link_xpos.clear();
        for (link, q) in model.links.iter().zip(&self.qpos) {
            abs_angle += q;
            let end = Point::new(
                start.x + link.length * abs_angle.cos(),
                start.y + link.length * abs_angle.sin(),
            );
            self.link_xpos.push((start, end));
            start = end;
        }
    }

    /// World position of the tip of link `name`, from the last [`SimData::forward`].
    pub fn body_position(&self, model: &ArmModel, name: &str) -> Option<Point> {
        let i = model.link_index(name)?;
        self.link_xpos.get(i).map(|&(_, end)| end)
    }

    pub fn capture_state(&self, capture_index: u64) -> SimulationState {
        let mut values = Vec::with_capacity(1 + self.qpos.len() + self.qvel.len());
        values.push(self.time());
        values.extend_from_slice(&self.qpos);
        values.extend_from_slice(&self.qvel);
        SimulationState::new(capture_index, values)
    }

    /// Overwrite the integration state from a snapshot.
    ///
    /// Only copies values; call [`SimData::forward`] afterwards to place the links. Never steps.
    pub fn load_state(&mut self, model: &ArmModel, state: &SimulationState) -> ReelResult<()> {
        let expected = model.state_size();
        if state.len() != expected {
            return Err(ReelError::state(format!(
                "state #{} has {} values, model '{}' expects {expected}",
                state.capture_index(),
                state.len(),
                model.name
            )));
        }
        if let Some(bad) = state.values().iter().position(|v| !v.is_finite()) {
            return Err(ReelError::state(format!(
                "state #{} has a non-finite value at slot {bad}",
                state.capture_index()
            )));
        }

        let nq = model.nq();
        let values = state.values();
        self.timestep = model.timestep;
        self.time_origin = values[0];
        self.steps = 0;
        self.qpos.clear();
        self.qpos.extend_from_slice(&values[1..1 + nq]);
        self.qvel.clear();
        self.qvel.extend_from_slice(&values[1 + nq..]);
        Ok(())
    }
}
