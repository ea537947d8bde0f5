use crate::{
    encode::sink::{FrameSink, SinkConfig},
    foundation::core::{Fps, FrameIndex},
    foundation::error::{ReelError, ReelResult},
    render::backend::Frame,
};

/// Seconds the final frame is held at the end of every video.
pub const PAUSE_SECS: u32 = 2;

/// Counts reported by [`assemble`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssembleStats {
    pub frames_in: usize,
    pub pause_frames: usize,
    pub frames_out: usize,
}

/// Number of repeated tail frames appended at `fps`.
pub fn pause_frames(fps: Fps) -> usize {
    (PAUSE_SECS * fps.get()) as usize
}

/// Check that `frames` is non-empty and every frame shares the first frame's shape.
pub fn check_sequence(frames: &[Frame]) -> ReelResult<(u32, u32)> {
    let first = frames
        .first()
        .ok_or_else(|| ReelError::validation("cannot assemble a video from zero frames"))?;
    if let Some((i, f)) = frames
        .iter()
        .enumerate()
        .find(|(_, f)| !f.same_shape(first))
    {
        return Err(ReelError::shape_mismatch(format!(
            "frame {i} is {}x{} ({} bytes), expected {}x{} ({} bytes)",
            f.width,
            f.height,
            f.data.len(),
            first.width,
            first.height,
            first.data.len()
        )));
    }
    Ok((first.width, first.height))
}

/// Stream `frames` followed by a two-second hold of the last frame into `sink`.
///
/// The sequence is validated before the sink is touched. Any sink failure aborts the sink and is
/// reported as [`ReelError::Encoding`] carrying the sink target and the number of frames pushed.
#[tracing::instrument(skip(frames, sink), fields(frames = frames.len(), fps = fps.get()))]
pub fn assemble(frames: &[Frame], fps: Fps, sink: &mut dyn FrameSink) -> ReelResult<AssembleStats> {
    let (width, height) = check_sequence(frames)?;
    let pause = pause_frames(fps);
    let target = sink.target();

    let mut pushed = 0usize;
    let result = (|| {
        sink.begin(SinkConfig { width, height, fps })?;
        let last = &frames[frames.len() - 1];
        let tail = std::iter::repeat_n(last, pause);
        for frame in frames.iter().chain(tail) {
            sink.push_frame(FrameIndex(pushed as u64), frame)?;
            pushed += 1;
        }
        sink.end()
    })();

    if let Err(e) = result {
        sink.abort();
        let message = match e {
            ReelError::Encoding { message, .. } => message,
            other => other.to_string(),
        };
        return Err(ReelError::encoding(target, pushed, message));
    }

    let stats = AssembleStats {
        frames_in: frames.len(),
        pause_frames: pause,
        frames_out: pushed,
    };
    tracing::info!(
        target_path = %target,
        frames_in = stats.frames_in,
        frames_out = stats.frames_out,
        "video assembled"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::sink::InMemorySink;

    fn frames(n: usize) -> Vec<Frame> {
        (0..n)
            .map(|i| Frame::solid(4, 4, [i as u8, 0, 0, 255], i as f64 / 10.0))
            .collect()
    }

    #[test]
    fn appends_two_seconds_of_last_frame() {
        let fps = Fps::new(10).unwrap();
        let input = frames(3);
        let mut sink = InMemorySink::new();
        let stats = assemble(&input, fps, &mut sink).unwrap();

        assert_eq!(
            stats,
            AssembleStats {
                frames_in: 3,
                pause_frames: 20,
                frames_out: 23
            }
        );
        assert!(sink.is_finished());
        assert_eq!(sink.frames().len(), 23);
        for (i, (idx, f)) in sink.frames().iter().enumerate() {
            assert_eq!(idx.0, i as u64);
            if i >= 2 {
                assert_eq!(f, &input[2]);
            }
        }
    }

    #[test]
    fn empty_sequence_is_rejected_before_sink() {
        let mut sink = InMemorySink::new();
        let err = assemble(&[], Fps::new(30).unwrap(), &mut sink).unwrap_err();
        assert!(matches!(err, ReelError::Validation(_)));
        assert!(sink.config().is_none());
    }

    #[test]
    fn mixed_shapes_are_rejected_before_sink() {
        let mut input = frames(2);
        input.push(Frame::solid(4, 2, [0, 0, 0, 255], 0.3));
        let mut sink = InMemorySink::new();
        let err = assemble(&input, Fps::new(30).unwrap(), &mut sink).unwrap_err();
        assert!(matches!(err, ReelError::ShapeMismatch(_)));
        assert!(sink.config().is_none());
    }

    struct FailingSink {
        fail_at: u64,
        aborted: bool,
    }

    impl FrameSink for FailingSink {
        fn target(&self) -> String {
            "videos/broken.mp4".to_string()
        }
        fn begin(&mut self, _cfg: SinkConfig) -> ReelResult<()> {
            Ok(())
        }
        fn push_frame(&mut self, idx: FrameIndex, _frame: &Frame) -> ReelResult<()> {
            if idx.0 == self.fail_at {
                return Err(ReelError::validation("pipe closed"));
            }
            Ok(())
        }
        fn end(&mut self) -> ReelResult<()> {
            Ok(())
        }
        fn abort(&mut self) {
            self.aborted = true;
        }
    }

    #[test]
    fn sink_failure_becomes_encoding_error_with_context() {
        let mut sink = FailingSink {
            fail_at: 5,
            aborted: false,
        };
        let err = assemble(&frames(3), Fps::new(10).unwrap(), &mut sink).unwrap_err();
        match err {
            ReelError::Encoding {
                target,
                frames,
                message,
            } => {
                assert_eq!(target, "videos/broken.mp4");
                assert_eq!(frames, 5);
                assert!(message.contains("pipe closed"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(sink.aborted);
    }

    struct ExitFailureSink;

    impl FrameSink for ExitFailureSink {
        fn target(&self) -> String {
            "videos/exit.mp4".to_string()
        }
        fn begin(&mut self, _cfg: SinkConfig) -> ReelResult<()> {
            Ok(())
        }
        fn push_frame(&mut self, _idx: FrameIndex, _frame: &Frame) -> ReelResult<()> {
            Ok(())
        }
        fn end(&mut self) -> ReelResult<()> {
            Err(ReelError::encoding(
                self.target(),
                23,
                "ffmpeg exited with status 1",
            ))
        }
    }

    #[test]
    fn encoder_runtime_errors_are_not_wrapped_twice() {
        let err = assemble(&frames(3), Fps::new(10).unwrap(), &mut ExitFailureSink).unwrap_err();
        assert_eq!(
            err.to_string(),
            "encoding error (videos/exit.mp4, 23 frames): ffmpeg exited with status 1"
        );
    }
}
