use std::path::Path;

use anyhow::Context as _;

use crate::{
    encode::ffmpeg::ensure_parent_dir, foundation::error::ReelResult, render::backend::Frame,
};

/// Un-premultiply and write a canonical frame as a straight-alpha PNG.
pub fn save_png(frame: &Frame, path: impl AsRef<Path>) -> ReelResult<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let straight = unpremultiply(&frame.data);
    image::save_buffer_with_format(
        path,
        &straight,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    tracing::info!(path = %path.display(), t = frame.time, "saved screenshot");
    Ok(())
}

fn unpremultiply(premul: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(premul.len());
    for px in premul.chunks_exact(4) {
        let a = px[3];
        match a {
            0 => out.extend_from_slice(&[0, 0, 0, 0]),
            255 => out.extend_from_slice(px),
            _ => {
                let a16 = u16::from(a);
                for &c in &px[..3] {
                    let v = (u16::from(c) * 255 + a16 / 2) / a16;
                    out.push(v.min(255) as u8);
                }
                out.push(a);
            }
        }
    }
    out
}
