use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    foundation::core::{Canvas, Fps},
    foundation::error::{ReelError, ReelResult},
    overlay::compositor::OverlayOpts,
    pipeline::{ProbeAxis, SeriesProbe},
};

/// Run settings, loaded from JSON. Every field has a default, so `{}` is a valid config.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    /// Output file stem. Falls back to the model name.
    pub name: Option<String>,
    pub fps: u32,
    /// Simulated seconds per run.
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub camera: String,
    /// Keyframe to reset to before simulating; the model's rest pose when absent.
    pub keyframe: Option<String>,
    pub video_dir: PathBuf,
    pub screenshot_dir: PathBuf,
    pub overlay: OverlayOpts,
    pub probe: Option<SeriesProbe>,
    /// Externally supplied series JSON (`{"times": [..], "values": [..]}`); replaces the probe.
    pub series_path: Option<PathBuf>,
    /// Background used when flattening alpha for video output (straight RGBA8).
    pub video_background: [u8; 4],
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            name: None,
            fps: 60,
            duration: 1.0,
            width: 640,
            height: 480,
            camera: "front_facing".to_string(),
            keyframe: None,
            video_dir: PathBuf::from("videos"),
            screenshot_dir: PathBuf::from("screenshots"),
            overlay: OverlayOpts::default(),
            probe: Some(SeriesProbe {
                body: "hand".to_string(),
                axis: ProbeAxis::Y,
            }),
            series_path: None,
            video_background: [0, 0, 0, 255],
        }
    }
}

impl ReelConfig {
    pub fn from_json_str(s: &str) -> ReelResult<Self> {
        let cfg: Self = serde_json::from_str(s).context("parse config JSON")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    pub fn validate(&self) -> ReelResult<()> {
        self.fps()?;
        self.canvas()?;
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(ReelError::configuration(format!(
                "width/height must be even for yuv420p video, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(ReelError::configuration(format!(
                "duration must be finite and > 0, got {}",
                self.duration
            )));
        }
        if self.camera.is_empty() {
            return Err(ReelError::configuration("camera name must not be empty"));
        }
        let o = &self.overlay;
        if o.plot && (o.plot_width == 0 || o.plot_height == 0) {
            return Err(ReelError::configuration(
                "overlay plot_width/plot_height must be non-zero",
            ));
        }
        if o.time_text && !(o.font_size.is_finite() && o.font_size > 0.0) {
            return Err(ReelError::configuration(
                "overlay font_size must be finite and > 0",
            ));
        }
        Ok(())
    }

    pub fn fps(&self) -> ReelResult<Fps> {
        Fps::new(self.fps).map_err(|e| ReelError::configuration(e.to_string()))
    }

    pub fn canvas(&self) -> ReelResult<Canvas> {
        Canvas::new(self.width, self.height).map_err(|e| ReelError::configuration(e.to_string()))
    }

    /// Output stem: the configured name, or `fallback` (usually the model name).
    pub fn stem<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(fallback)
    }

    /// `<video_dir>/<stem>.mp4`
    pub fn video_path(&self, stem: &str) -> PathBuf {
        self.video_dir.join(format!("{stem}.mp4"))
    }

    /// `<screenshot_dir>/<stem>.png`
    pub fn screenshot_path(&self, stem: &str) -> PathBuf {
        self.screenshot_dir.join(format!("{stem}.png"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg = ReelConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg.fps, 60);
        assert_eq!(cfg.camera, "front_facing");
        assert_eq!(cfg.video_path("arm"), PathBuf::from("videos").join("arm.mp4"));
        assert_eq!(
            cfg.screenshot_path("arm_initial"),
            PathBuf::from("screenshots").join("arm_initial.png")
        );
        assert_eq!(cfg.stem("model"), "model");
    }

    #[test]
    fn partial_overlay_section_keeps_other_defaults() {
        let cfg = ReelConfig::from_json_str(
            r#"{ "fps": 30, "name": "demo", "overlay": { "plot": false }, "probe": { "body": "forearm", "axis": "x" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.fps().unwrap().get(), 30);
        assert!(!cfg.overlay.plot);
        assert!(cfg.overlay.time_text);
        assert_eq!(cfg.overlay.padding, 20);
        assert_eq!(cfg.stem("model"), "demo");
        assert_eq!(
            cfg.probe,
            Some(SeriesProbe {
                body: "forearm".to_string(),
                axis: ProbeAxis::X
            })
        );
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        for json in [
            r#"{ "fps": 0 }"#,
            r#"{ "width": 641 }"#,
            r#"{ "height": 0 }"#,
            r#"{ "duration": -1.0 }"#,
            r#"{ "camera": "" }"#,
            r#"{ "overlay": { "plot_width": 0 } }"#,
        ] {
            let err = ReelConfig::from_json_str(json).unwrap_err();
            assert!(
                matches!(err, ReelError::Configuration(_)),
                "{json}: {err:?}"
            );
        }
    }
}
