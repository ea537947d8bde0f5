use crate::{
    foundation::core::Canvas,
    foundation::error::{ReelError, ReelResult},
    sim::{data::SimData, model::ArmModel},
};

/// Row order of a rasterizer's native pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowOrder {
    /// First row is the top of the image.
    TopDown,
    /// First row is the bottom of the image (GL-style readback).
    BottomUp,
}

/// A rasterizer's output before canonicalization.
#[derive(Clone, Debug)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, tightly packed, in `row_order`.
    pub data: Vec<u8>,
    pub row_order: RowOrder,
}

/// A rendered frame as premultiplied RGBA8 pixels, rows top-down.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8 bytes, tightly packed, row-major, first row at the top.
    pub data: Vec<u8>,
    /// Simulated time this frame shows.
    pub time: f64,
}

impl Frame {
    /// Canonicalize a raster to top-down row order. This is the only place rows are flipped.
    pub fn from_raw(raw: RawFrame, time: f64) -> ReelResult<Self> {
        let RawFrame {
            width,
            height,
            mut data,
            row_order,
        } = raw;
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(ReelError::render(format!(
                "raster byte length {} does not match {width}x{height} rgba8 ({expected})",
                data.len()
            )));
        }
        if row_order == RowOrder::BottomUp {
            flip_rows_in_place(&mut data, width as usize * 4);
        }
        Ok(Self {
            width,
            height,
            data,
            time,
        })
    }

    /// Uniformly filled frame; mostly useful for tests and placeholders.
    pub fn solid(width: u32, height: u32, premul_rgba: [u8; 4], time: f64) -> Self {
        Self {
            width,
            height,
            data: premul_rgba.repeat((width as usize) * (height as usize)),
            time,
        }
    }

    pub fn same_shape(&self, other: &Frame) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.data.len() == other.data.len()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }
}

fn flip_rows_in_place(data: &mut [u8], stride: usize) {
    if stride == 0 {
        return;
    }
    let rows = data.len() / stride;
    for top in 0..rows / 2 {
        let bottom = rows - 1 - top;
        let (head, tail) = data.split_at_mut(bottom * stride);
        head[top * stride..(top + 1) * stride].swap_with_slice(&mut tail[..stride]);
    }
}

/// Turns a posed scene into pixels.
///
/// Implementations render at a fixed resolution and must be pure with respect to `scene`: the
/// same scene and camera always yield the same bytes.
pub trait Rasterizer {
    fn canvas(&self) -> Canvas;

    /// Names accepted by [`Rasterizer::render`].
    fn cameras(&self) -> Vec<String>;

    fn render(&mut self, model: &ArmModel, scene: &SimData, camera: &str)
    -> ReelResult<RawFrame>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(order: RowOrder) -> RawFrame {
        // 1x3 image: rows red, green, blue in memory order.
        RawFrame {
            width: 1,
            height: 3,
            data: vec![255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255],
            row_order: order,
        }
    }

    #[test]
    fn bottom_up_rasters_are_flipped_once() {
        let f = Frame::from_raw(raw(RowOrder::BottomUp), 0.0).unwrap();
        assert_eq!(f.pixel(0, 0), Some([0, 0, 255, 255]));
        assert_eq!(f.pixel(0, 1), Some([0, 255, 0, 255]));
        assert_eq!(f.pixel(0, 2), Some([255, 0, 0, 255]));
    }

    #[test]
    fn top_down_rasters_pass_through() {
        let r = raw(RowOrder::TopDown);
        let bytes = r.data.clone();
        let f = Frame::from_raw(r, 1.5).unwrap();
        assert_eq!(f.data, bytes);
        assert_eq!(f.time, 1.5);
    }

    #[test]
    fn from_raw_rejects_bad_length() {
        let mut r = raw(RowOrder::TopDown);
        r.data.pop();
        assert!(matches!(
            Frame::from_raw(r, 0.0),
            Err(ReelError::Render(_))
        ));
    }

    #[test]
    fn pixel_out_of_bounds_is_none() {
        let f = Frame::solid(2, 2, [1, 2, 3, 255], 0.0);
        assert_eq!(f.pixel(1, 1), Some([1, 2, 3, 255]));
        assert_eq!(f.pixel(2, 0), None);
    }
}
