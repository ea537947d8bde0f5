use crate::{
    foundation::math::mul_div255_u8,
    overlay::svg_raster::OverlayImage,
    render::backend::Frame,
};

pub type PremulRgba8 = [u8; 4];

pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

/// Top-left placement of a `w x h` overlay in the bottom-right corner of `frame`, `pad` pixels
/// from both edges. May be negative when the overlay is larger than the frame.
pub fn bottom_right_origin(frame: &Frame, w: u32, h: u32, pad: u32) -> (i64, i64) {
    (
        i64::from(frame.width) - i64::from(w) - i64::from(pad),
        i64::from(frame.height) - i64::from(h) - i64::from(pad),
    )
}

/// Composite `src` over `dst` with its top-left corner at `(x0, y0)`.
///
/// The destination rectangle is clamped to the frame; source rows and columns that would land
/// outside are skipped, so oversized or off-frame overlays are silently truncated. Frame shape is
/// never changed.
pub fn blit_over(dst: &mut Frame, src: &OverlayImage, x0: i64, y0: i64) {
    let fw = i64::from(dst.width);
    let fh = i64::from(dst.height);
    let dx_start = x0.max(0);
    let dy_start = y0.max(0);
    let dx_end = (x0 + i64::from(src.width)).min(fw);
    let dy_end = (y0 + i64::from(src.height)).min(fh);
    if dx_start >= dx_end || dy_start >= dy_end {
        return;
    }
    if src.data.len() != (src.width as usize) * (src.height as usize) * 4 {
        tracing::warn!(
            width = src.width,
            height = src.height,
            len = src.data.len(),
            "overlay image byte length mismatch; skipping blit"
        );
        return;
    }

    let dst_stride = dst.width as usize * 4;
    let src_stride = src.width as usize * 4;
    for dy in dy_start..dy_end {
        let sy = (dy - y0) as usize;
        let d_row = dy as usize * dst_stride;
        let s_row = sy * src_stride;
        for dx in dx_start..dx_end {
            let sx = (dx - x0) as usize;
            let di = d_row + dx as usize * 4;
            let si = s_row + sx * 4;
            let d = [
                dst.data[di],
                dst.data[di + 1],
                dst.data[di + 2],
                dst.data[di + 3],
            ];
            let s = [
                src.data[si],
                src.data[si + 1],
                src.data[si + 2],
                src.data[si + 3],
            ];
            dst.data[di..di + 4].copy_from_slice(&over(d, s));
        }
    }
}
