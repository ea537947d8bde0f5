use vello_cpu::kurbo::Shape as _;

use crate::{
    foundation::core::{Affine, Canvas, Point},
    foundation::error::{ReelError, ReelResult},
    render::backend::{RawFrame, Rasterizer, RowOrder},
    sim::{
        data::SimData,
        model::{ArmModel, Camera},
    },
};

const GROUND_RGBA: [u8; 4] = [88, 92, 104, 255];
const JOINT_RGBA: [u8; 4] = [236, 236, 240, 255];
const TIP_RGBA: [u8; 4] = [250, 204, 72, 255];

/// CPU rasterizer for [`ArmModel`] scenes, powered by `vello_cpu`.
///
/// Cameras are orthographic and world +y maps to increasing row index, so the native buffer is
/// [`RowOrder::BottomUp`].
pub struct CpuRasterizer {
    canvas: Canvas,
    cameras: Vec<Camera>,
    ctx: Option<vello_cpu::RenderContext>,
    pixmap: vello_cpu::Pixmap,
}

impl CpuRasterizer {
    pub fn new(model: &ArmModel, canvas: Canvas) -> ReelResult<Self> {
        let (w, h) = canvas_u16(canvas)?;
        Ok(Self {
            canvas,
            cameras: model.cameras.clone(),
            ctx: None,
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    fn with_ctx_mut<R>(
        &mut self,
        f: impl FnOnce(&mut vello_cpu::RenderContext) -> ReelResult<R>,
    ) -> ReelResult<R> {
        let (width, height) = canvas_u16(self.canvas)?;
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(&mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }
}

impl Rasterizer for CpuRasterizer {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn cameras(&self) -> Vec<String> {
        self.cameras.iter().map(|c| c.name.clone()).collect()
    }

    fn render(
        &mut self,
        model: &ArmModel,
        scene: &SimData,
        camera: &str,
    ) -> ReelResult<RawFrame> {
        let cam = self
            .cameras
            .iter()
            .find(|c| c.name == camera)
            .cloned()
            .ok_or_else(|| ReelError::render(format!("unknown camera '{camera}'")))?;
        if scene.link_xpos.len() != model.links.len() {
            return Err(ReelError::render(
                "scene has not been posed for this model (run forward kinematics first)",
            ));
        }

        let canvas = self.canvas;
        let world_to_px = world_to_pixel(&cam, canvas);
        let mut pixmap = std::mem::replace(&mut self.pixmap, vello_cpu::Pixmap::new(1, 1));
        let drawn = self.with_ctx_mut(|ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

            fill_rgba(ctx, cam.background);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(canvas.width),
                f64::from(canvas.height),
            ));

            // Ground plane: a band just below world y = 0.
            let ground_y = world_to_px * Point::new(0.0, 0.0);
            fill_rgba(ctx, GROUND_RGBA);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                ground_y.y - 3.0,
                f64::from(canvas.width),
                ground_y.y,
            ));

            let scale = cam.pixels_per_meter;
            for (link, &(start, end)) in model.links.iter().zip(&scene.link_xpos) {
                let a = world_to_px * start;
                let b = world_to_px * end;
                fill_rgba(ctx, link.color);
                ctx.fill_path(&segment_path(a, b, 0.5 * link.width * scale));

                fill_rgba(ctx, JOINT_RGBA);
                ctx.fill_path(&circle_path(a, 0.7 * link.width * scale));
            }
            if let Some(&(_, tip)) = scene.link_xpos.last() {
                let r = model.links.last().map_or(0.03, |l| l.width) * scale * 0.6;
                fill_rgba(ctx, TIP_RGBA);
                ctx.fill_path(&circle_path(world_to_px * tip, r));
            }

            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            Ok(pixmap.data_as_u8_slice().to_vec())
        });
        self.pixmap = pixmap;

        Ok(RawFrame {
            width: canvas.width,
            height: canvas.height,
            data: drawn?,
            row_order: RowOrder::BottomUp,
        })
    }
}

/// Orthographic world -> pixel mapping without a y flip: world up is increasing row index.
fn world_to_pixel(cam: &Camera, canvas: Canvas) -> Affine {
    let s = cam.pixels_per_meter;
    let [cx, cy] = cam.center;
    Affine::new([
        s,
        0.0,
        0.0,
        s,
        0.5 * f64::from(canvas.width) - s * cx,
        0.5 * f64::from(canvas.height) - s * cy,
    ])
}

fn canvas_u16(canvas: Canvas) -> ReelResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| ReelError::render("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| ReelError::render("canvas height exceeds u16"))?;
    Ok((w, h))
}

fn fill_rgba(ctx: &mut vello_cpu::RenderContext, [r, g, b, a]: [u8; 4]) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

/// Thick line segment as a closed quad, in pixel space.
fn segment_path(a: Point, b: Point, half_width: f64) -> vello_cpu::kurbo::BezPath {
    let d = b - a;
    let len = d.hypot();
    let n = if len > 1e-9 {
        kurbo::Vec2::new(-d.y / len, d.x / len) * half_width.max(0.5)
    } else {
        kurbo::Vec2::new(0.0, half_width.max(0.5))
    };

    let mut p = vello_cpu::kurbo::BezPath::new();
    p.move_to(point_to_cpu(a + n));
    p.line_to(point_to_cpu(b + n));
    p.line_to(point_to_cpu(b - n));
    p.line_to(point_to_cpu(a - n));
    p.close_path();
    p
}

fn circle_path(c: Point, r: f64) -> vello_cpu::kurbo::BezPath {
    let circle = vello_cpu::kurbo::Circle::new(point_to_cpu(c), r.max(0.5));
    let mut p = vello_cpu::kurbo::BezPath::new();
    for el in circle.path_elements(0.1) {
        p.push(el);
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_origin_maps_to_canvas_center_offset_by_camera() {
        let cam = Camera {
            name: "c".to_string(),
            center: [1.0, 2.0],
            pixels_per_meter: 10.0,
            background: [0, 0, 0, 255],
        };
        let xf = world_to_pixel(&cam, Canvas::new(100, 50).unwrap());
        let p = xf * Point::new(1.0, 2.0);
        assert_eq!((p.x, p.y), (50.0, 25.0));
        // Up in the world is a larger row index in the native buffer.
        let up = xf * Point::new(1.0, 3.0);
        assert!(up.y > p.y);
    }

    #[test]
    fn segment_path_is_closed_quad() {
        let p = segment_path(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 2.0);
        assert_eq!(p.elements().len(), 5);
    }
}
