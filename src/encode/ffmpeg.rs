use std::{
    io::Read as _,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    encode::sink::{FrameSink, SinkConfig},
    foundation::core::FrameIndex,
    foundation::error::{ReelError, ReelResult},
    foundation::math::mul_div255_u16,
    render::backend::Frame,
};

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    pub out_path: PathBuf,
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Sink that spawns the system `ffmpeg` and streams raw RGBA frames to its stdin (H.264, yuv420p).
///
/// The system binary is used instead of FFmpeg bindings to avoid native dev header requirements.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    frames_written: usize,
    /// Set once `ffmpeg` has been spawned for `out_path`; only then is the file ours to remove.
    owns_output: bool,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
            frames_written: 0,
            owns_output: false,
        }
    }

    /// Runtime failure of the encoder process, as opposed to a rejected argument.
    fn encoder_error(&self, msg: impl Into<String>) -> ReelError {
        ReelError::encoding(self.target(), self.frames_written, msg)
    }
}

impl FrameSink for FfmpegSink {
    fn target(&self) -> String {
        self.opts.out_path.display().to_string()
    }

    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        self.frames_written = 0;
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ReelError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(ReelError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(self.encoder_error(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if self.opts.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        // `ffmpeg` does not understand premultiplied alpha, so frames are flattened to opaque
        // RGBA before they are written (push_frame).
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.get().to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&self.opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            self.encoder_error(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        self.owns_output = true;

        let (Some(stdin), Some(mut stderr)) = (child.stdin.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(self.encoder_error("failed to open ffmpeg stdio pipes"));
        };
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        tracing::debug!(out = %self.opts.out_path.display(), "spawned ffmpeg");
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> ReelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelError::validation("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(ReelError::validation(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ReelError::shape_mismatch(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(ReelError::shape_mismatch(
                "frame.data size mismatch with width*height*4",
            ));
        }

        flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, &frame.data, self.opts.bg_rgba);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::validation("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        if let Err(e) = stdin.write_all(&self.scratch) {
            return Err(self.encoder_error(format!("failed to write frame to ffmpeg stdin: {e}")));
        }
        self.frames_written += 1;
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| ReelError::validation("ffmpeg sink not started"))?;

        let status = child
            .wait()
            .map_err(|e| self.encoder_error(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => match handle.join() {
                Ok(Ok(bytes)) => bytes,
                Ok(Err(e)) => {
                    return Err(self.encoder_error(format!("ffmpeg stderr read failed: {e}")));
                }
                Err(_) => return Err(self.encoder_error("ffmpeg stderr drain thread panicked")),
            },
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(self.encoder_error(format!(
                "ffmpeg exited with status {status}: {}",
                stderr.trim()
            )));
        }
        self.cfg = None;
        self.owns_output = false;
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        self.cfg = None;
        if std::mem::take(&mut self.owns_output) && self.opts.out_path.exists() {
            match std::fs::remove_file(&self.opts.out_path) {
                Ok(()) => tracing::warn!(
                    out = %self.opts.out_path.display(),
                    "removed partial video after encoder failure"
                ),
                Err(e) => tracing::warn!(
                    out = %self.opts.out_path.display(),
                    error = %e,
                    "could not remove partial video"
                ),
            }
        }
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

fn flatten_premul_over_bg_to_opaque_rgba8(dst: &mut [u8], src: &[u8], bg_rgba: [u8; 4]) {
    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for i in 0..3 {
            d[i] = (u16::from(s[i]) + mul_div255_u16(bg[i], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Fps;

    #[test]
    fn flatten_premul_over_black_produces_expected_rgb() {
        let src = vec![128u8, 0, 0, 128];
        let mut dst = vec![0u8; 4];
        flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [0, 0, 0, 255]);
        assert_eq!(dst, vec![128, 0, 0, 255]);
    }

    #[test]
    fn flatten_transparent_shows_background() {
        let src = vec![0u8, 0, 0, 0];
        let mut dst = vec![0u8; 4];
        flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]);
        assert_eq!(dst, vec![10, 20, 30, 255]);
    }

    #[test]
    fn begin_rejects_odd_dimensions_before_spawning() {
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("target/never_written.mp4"));
        let err = sink
            .begin(SinkConfig {
                width: 11,
                height: 10,
                fps: Fps::new(30).unwrap(),
            })
            .unwrap_err();
        assert!(err.to_string().contains("even"));
    }

    fn existing_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("simreel_ffmpeg_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, b"previous video").unwrap();
        path
    }

    #[test]
    fn refused_overwrite_leaves_existing_file_alone() {
        let path = existing_file("keep.mp4");
        let mut sink = FfmpegSink::new(FfmpegSinkOpts {
            overwrite: false,
            ..FfmpegSinkOpts::new(&path)
        });
        let err = sink
            .begin(SinkConfig {
                width: 4,
                height: 4,
                fps: Fps::new(30).unwrap(),
            })
            .unwrap_err();
        assert!(matches!(err, ReelError::Validation(_)));
        sink.abort();
        drop(sink);
        assert_eq!(std::fs::read(&path).unwrap(), b"previous video");
    }

    #[test]
    fn failed_begin_never_removes_previous_output() {
        let path = existing_file("odd.mp4");
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&path));
        assert!(
            sink.begin(SinkConfig {
                width: 5,
                height: 4,
                fps: Fps::new(30).unwrap(),
            })
            .is_err()
        );
        sink.abort();
        drop(sink);
        assert_eq!(std::fs::read(&path).unwrap(), b"previous video");
    }

    #[test]
    fn push_before_begin_is_an_error() {
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("target/never_written.mp4"));
        let f = Frame::solid(2, 2, [0, 0, 0, 255], 0.0);
        assert!(sink.push_frame(FrameIndex(0), &f).is_err());
        assert_eq!(sink.target(), "target/never_written.mp4");
    }
}
