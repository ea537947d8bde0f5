use std::fmt::Write as _;

use crate::{
    foundation::error::ReelResult,
    overlay::svg_raster::{OverlayImage, SvgRasterizer, escape_xml},
};

/// `"ELAPSED TIME: 1.234s"`.
pub fn elapsed_label(t: f64) -> String {
    format!("ELAPSED TIME: {t:.3}s")
}

/// Elapsed-time caption drawn in the top-left corner.
#[derive(Clone, Debug)]
pub struct TimeOverlay {
    pub font_size: f32,
    pub fill: [u8; 3],
}

impl Default for TimeOverlay {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            fill: [255, 255, 255],
        }
    }
}

impl TimeOverlay {
    /// Size of the caption image. Wide enough for any label at this font size.
    pub fn image_size(&self) -> (u32, u32) {
        let h = (self.font_size * 1.6).ceil().max(1.0) as u32;
        let w = (self.font_size * 16.0).ceil().max(1.0) as u32;
        (w, h)
    }

    pub fn to_svg(&self, t: f64) -> String {
        let (w, h) = self.image_size();
        let [r, g, b] = self.fill;
        let mut svg = String::with_capacity(320);
        let _ = write!(
            svg,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"##
        );
        let _ = write!(
            svg,
            r##"<text x="2" y="{:.1}" font-family="monospace, sans-serif" font-size="{}" font-weight="bold" fill="rgb({r},{g},{b})" stroke="#000000" stroke-width="{:.2}" paint-order="stroke">{}</text>"##,
            f64::from(self.font_size) * 1.15,
            self.font_size,
            f64::from(self.font_size) / 8.0,
            escape_xml(&elapsed_label(t))
        );
        svg.push_str("</svg>");
        svg
    }

    pub fn render(&self, raster: &SvgRasterizer, t: f64) -> ReelResult<OverlayImage> {
        let (w, h) = self.image_size();
        raster.rasterize(&self.to_svg(t), w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_uses_three_decimals() {
        assert_eq!(elapsed_label(0.0), "ELAPSED TIME: 0.000s");
        assert_eq!(elapsed_label(1.23456), "ELAPSED TIME: 1.235s");
        assert_eq!(elapsed_label(10.0), "ELAPSED TIME: 10.000s");
    }

    #[test]
    fn svg_embeds_label() {
        let svg = TimeOverlay::default().to_svg(0.5);
        assert!(svg.contains("ELAPSED TIME: 0.500s"));
    }

    #[test]
    fn render_has_stable_size_without_fonts() {
        let o = TimeOverlay {
            font_size: 10.0,
            ..TimeOverlay::default()
        };
        let img = o.render(&SvgRasterizer::without_fonts(), 3.0).unwrap();
        assert_eq!((img.width, img.height), o.image_size());
        assert_eq!(img.width, 160);
    }
}
