//! Built-in planar arm simulation.
//!
//! The frame pipeline only needs four things from a simulation: step it, read its clock, capture
//! a snapshot, and load a snapshot back into a scratch context followed by forward kinematics.

pub mod data;
pub mod model;
pub mod state;
