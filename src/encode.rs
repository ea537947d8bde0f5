//! Frame output: the sink contract, the `ffmpeg` MP4 encoder, PNG screenshots, and the video
//! assembler that appends the trailing pause.

pub mod assemble;
pub mod ffmpeg;
pub mod png;
pub mod sink;
