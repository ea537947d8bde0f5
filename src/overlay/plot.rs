use std::fmt::Write as _;

use crate::{
    foundation::error::{ReelError, ReelResult},
    overlay::{
        series::{AxisLimits, OverlaySeries},
        svg_raster::{OverlayImage, SvgRasterizer, escape_xml},
    },
};

/// A rendered chart; same pixel layout as any other overlay image.
pub type PlotImage = OverlayImage;

/// Inner margin between the plot border and the drawing area, in pixels.
const PLOT_INSET: f64 = 10.0;

/// Line chart of one [`OverlaySeries`] with a window fixed for the whole run.
///
/// Limits are computed once from the full series at construction; each render only decides how
/// much of the curve is visible.
#[derive(Clone, Debug)]
pub struct SeriesPlot<'s> {
    series: &'s OverlaySeries,
    limits: AxisLimits,
    width: u32,
    height: u32,
    label: Option<String>,
}

impl<'s> SeriesPlot<'s> {
    /// `None` when the series is empty: there is nothing to plot.
    pub fn new(series: &'s OverlaySeries, width: u32, height: u32) -> ReelResult<Option<Self>> {
        if width == 0 || height == 0 {
            return Err(ReelError::configuration("plot width/height must be non-zero"));
        }
        let Some(limits) = series.limits() else {
            return Ok(None);
        };
        Ok(Some(Self {
            series,
            limits,
            width,
            height,
            label: None,
        }))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn limits(&self) -> AxisLimits {
        self.limits
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixel coordinates (top-down) of every sample with `time <= cutoff`.
    pub fn polyline(&self, cutoff: f64) -> Vec<(f64, f64)> {
        let n = self.series.visible_len(cutoff);
        let l = self.limits;
        let w = f64::from(self.width) - 2.0 * PLOT_INSET;
        let h = f64::from(self.height) - 2.0 * PLOT_INSET;
        self.series.times()[..n]
            .iter()
            .zip(&self.series.values()[..n])
            .map(|(&t, &v)| {
                let x = PLOT_INSET + (t - l.x_min) / (l.x_max - l.x_min) * w;
                let y = PLOT_INSET + (1.0 - (v - l.y_min) / (l.y_max - l.y_min)) * h;
                (x, y)
            })
            .collect()
    }

    pub fn to_svg(&self, cutoff: f64) -> String {
        let (w, h) = (self.width, self.height);
        let mut svg = String::with_capacity(256 + 24 * self.series.visible_len(cutoff));
        let _ = write!(
            svg,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"##
        );
        let _ = write!(
            svg,
            r##"<rect x="0.5" y="0.5" width="{}" height="{}" fill="#ffffff" fill-opacity="0.85" stroke="#3c3f48" stroke-width="1"/>"##,
            f64::from(w) - 1.0,
            f64::from(h) - 1.0
        );

        // Zero line, when zero is inside the window.
        let l = self.limits;
        if l.y_min < 0.0 && l.y_max > 0.0 {
            let y0 = PLOT_INSET
                + (1.0 - (0.0 - l.y_min) / (l.y_max - l.y_min))
                    * (f64::from(h) - 2.0 * PLOT_INSET);
            let _ = write!(
                svg,
                r##"<line x1="{PLOT_INSET}" y1="{y0:.2}" x2="{:.2}" y2="{y0:.2}" stroke="#b0b4bf" stroke-width="1" stroke-dasharray="3 3"/>"##,
                f64::from(w) - PLOT_INSET
            );
        }

        let points = self.polyline(cutoff);
        match points.as_slice() {
            [] => {}
            [(x, y)] => {
                let _ = write!(
                    svg,
                    r##"<circle cx="{x:.2}" cy="{y:.2}" r="2" fill="#1f6fd1"/>"##
                );
            }
            pts => {
                svg.push_str(
                    r##"<polyline fill="none" stroke="#1f6fd1" stroke-width="2" stroke-linejoin="round" points=""##,
                );
                for (i, (x, y)) in pts.iter().enumerate() {
                    if i > 0 {
                        svg.push(' ');
                    }
                    let _ = write!(svg, "{x:.2},{y:.2}");
                }
                svg.push_str(r#""/>"#);
            }
        }

        if let Some(label) = &self.label {
            let _ = write!(
                svg,
                r##"<text x="{PLOT_INSET}" y="{:.1}" font-family="sans-serif" font-size="12" fill="#3c3f48">{}</text>"##,
                PLOT_INSET + 10.0,
                escape_xml(label)
            );
        }
        svg.push_str("</svg>");
        svg
    }

    pub fn render(&self, raster: &SvgRasterizer, cutoff: f64) -> ReelResult<PlotImage> {
        raster.rasterize(&self.to_svg(cutoff), self.width, self.height)
    }
}
