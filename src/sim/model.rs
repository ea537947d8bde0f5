use std::{collections::BTreeSet, path::Path};

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};

/// Static description of a planar articulated arm: a chain of rigid links joined by hinges.
///
/// Joint `i` rotates link `i` relative to link `i - 1` (the first link is relative to the world
/// +x axis). Gravity acts along world -y.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ArmModel {
    pub name: String,
    /// Internal integration timestep in seconds.
    pub timestep: f64,
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    /// World position of the first joint.
    #[serde(default)]
    pub base: [f64; 2],
    pub links: Vec<Link>,
    #[serde(default)]
    pub cameras: Vec<Camera>,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

fn default_gravity() -> f64 {
    9.81
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Link {
    pub name: String,
    pub length: f64,
    pub mass: f64,
    #[serde(default)]
    pub damping: f64,
    /// Drawn thickness in meters.
    #[serde(default = "default_link_width")]
    pub width: f64,
    #[serde(default = "default_link_color")]
    pub color: [u8; 4],
}

fn default_link_width() -> f64 {
    0.05
}

fn default_link_color() -> [u8; 4] {
    [214, 120, 64, 255]
}

/// Orthographic camera looking down world -z.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Camera {
    pub name: String,
    /// World point that maps to the frame center.
    pub center: [f64; 2],
    pub pixels_per_meter: f64,
    #[serde(default = "default_background")]
    pub background: [u8; 4],
}

fn default_background() -> [u8; 4] {
    [24, 26, 33, 255]
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    pub name: String,
    pub qpos: Vec<f64>,
    #[serde(default)]
    pub qvel: Vec<f64>,
}

impl ArmModel {
    pub fn from_json_str(s: &str) -> ReelResult<Self> {
        let model: Self = serde_json::from_str(s).context("parse model JSON")?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read model '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Number of joint coordinates (one hinge per link).
    pub fn nq(&self) -> usize {
        self.links.len()
    }

    /// Length of a flat [`SimulationState`](crate::SimulationState) for this model:
    /// `[time, qpos.., qvel..]`.
    pub fn state_size(&self) -> usize {
        1 + 2 * self.nq()
    }

    pub fn camera(&self, name: &str) -> Option<&Camera> {
        self.cameras.iter().find(|c| c.name == name)
    }

    pub fn keyframe(&self, name: &str) -> Option<&Keyframe> {
        self.keyframes.iter().find(|k| k.name == name)
    }

    pub fn link_index(&self, name: &str) -> Option<usize> {
        self.links.iter().position(|l| l.name == name)
    }

    pub fn validate(&self) -> ReelResult<()> {
        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(ReelError::validation("model timestep must be finite and > 0"));
        }
        if !self.gravity.is_finite() {
            return Err(ReelError::validation("model gravity must be finite"));
        }
        if self.links.is_empty() {
            return Err(ReelError::validation("model must have at least one link"));
        }

        let mut names = BTreeSet::new();
        for l in &self.links {
            if !names.insert(l.name.as_str()) {
                return Err(ReelError::validation(format!(
                    "duplicate link name '{}'",
                    l.name
                )));
            }
            if !(l.length.is_finite() && l.length > 0.0) {
                return Err(ReelError::validation(format!(
                    "link '{}' length must be > 0",
                    l.name
                )));
            }
            if !(l.mass.is_finite() && l.mass > 0.0) {
                return Err(ReelError::validation(format!(
                    "link '{}' mass must be > 0",
                    l.name
                )));
            }
            if !(l.damping.is_finite() && l.damping >= 0.0) {
                return Err(ReelError::validation(format!(
                    "link '{}' damping must be >= 0",
                    l.name
                )));
            }
        }

        let mut cams = BTreeSet::new();
        for c in &self.cameras {
            if !cams.insert(c.name.as_str()) {
                return Err(ReelError::validation(format!(
                    "duplicate camera name '{}'",
                    c.name
                )));
            }
            if !(c.pixels_per_meter.is_finite() && c.pixels_per_meter > 0.0) {
                return Err(ReelError::validation(format!(
                    "camera '{}' pixels_per_meter must be > 0",
                    c.name
                )));
            }
        }

        for k in &self.keyframes {
            if k.qpos.len() != self.nq() {
                return Err(ReelError::validation(format!(
                    "keyframe '{}' has {} qpos values, model has {} joints",
                    k.name,
                    k.qpos.len(),
                    self.nq()
                )));
            }
            if !k.qvel.is_empty() && k.qvel.len() != self.nq() {
                return Err(ReelError::validation(format!(
                    "keyframe '{}' has {} qvel values, model has {} joints",
                    k.name,
                    k.qvel.len(),
                    self.nq()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_LINK: &str = r#"{
        "name": "two_link",
        "timestep": 0.002,
        "links": [
            { "name": "upper", "length": 0.5, "mass": 1.0 },
            { "name": "hand", "length": 0.3, "mass": 0.5, "damping": 0.1 }
        ],
        "cameras": [{ "name": "front_facing", "center": [0.0, 0.0], "pixels_per_meter": 50.0 }],
        "keyframes": [{ "name": "salute", "qpos": [1.2, 0.4] }]
    }"#;

    #[test]
    fn parses_with_defaults() {
        let m = ArmModel::from_json_str(TWO_LINK).unwrap();
        assert_eq!(m.nq(), 2);
        assert_eq!(m.state_size(), 5);
        assert_eq!(m.gravity, 9.81);
        assert_eq!(m.link_index("hand"), Some(1));
        assert!(m.camera("front_facing").is_some());
        assert!(m.keyframe("salute").unwrap().qvel.is_empty());
    }

    #[test]
    fn rejects_keyframe_size_mismatch() {
        let bad = TWO_LINK.replace("[1.2, 0.4]", "[1.2]");
        let err = ArmModel::from_json_str(&bad).unwrap_err();
        assert!(err.to_string().contains("keyframe 'salute'"));
    }

    #[test]
    fn rejects_non_positive_timestep() {
        let bad = TWO_LINK.replace("0.002", "0.0");
        assert!(ArmModel::from_json_str(&bad).is_err());
    }

    #[test]
    fn rejects_duplicate_links() {
        let bad = TWO_LINK.replace("\"upper\"", "\"hand\"");
        assert!(ArmModel::from_json_str(&bad).is_err());
    }
}
