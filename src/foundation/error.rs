pub type ReelResult<T> = Result<T, ReelError>;

#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("state error: {0}")]
    State(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("encoding error ({target}, {frames} frames): {message}")]
    Encoding {
        target: String,
        frames: usize,
        message: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    pub fn encoding(target: impl Into<String>, frames: usize, msg: impl Into<String>) -> Self {
        Self::Encoding {
            target: target.into(),
            frames,
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ReelError::configuration("x")
                .to_string()
                .contains("configuration error:")
        );
        assert!(
            ReelError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(ReelError::state("x").to_string().contains("state error:"));
        assert!(ReelError::render("x").to_string().contains("render error:"));
        assert!(
            ReelError::shape_mismatch("x")
                .to_string()
                .contains("shape mismatch:")
        );
    }

    #[test]
    fn encoding_error_carries_target_and_frame_count() {
        let err = ReelError::encoding("videos/out.mp4", 180, "ffmpeg exited with status 1");
        let msg = err.to_string();
        assert!(msg.contains("videos/out.mp4"));
        assert!(msg.contains("180 frames"));
        assert!(msg.contains("ffmpeg exited"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ReelError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
