use crate::{
    foundation::error::ReelResult,
    overlay::{
        composite::{blit_over, bottom_right_origin},
        plot::SeriesPlot,
        series::OverlaySeries,
        svg_raster::SvgRasterizer,
        text::TimeOverlay,
    },
    render::backend::Frame,
};

/// Which overlays to draw and where.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OverlayOpts {
    pub time_text: bool,
    pub plot: bool,
    /// Distance of both overlays from the frame edges, in pixels.
    pub padding: u32,
    pub plot_width: u32,
    pub plot_height: u32,
    pub font_size: f32,
    pub plot_label: Option<String>,
}

impl Default for OverlayOpts {
    fn default() -> Self {
        Self {
            time_text: true,
            plot: true,
            padding: 20,
            plot_width: 480,
            plot_height: 270,
            font_size: 28.0,
            plot_label: None,
        }
    }
}

/// Annotates canonical frames with the elapsed-time caption and the series plot.
///
/// Without an [`OverlaySeries`] the compositor is a pass-through.
pub struct Compositor<'s> {
    padding: u32,
    text: Option<TimeOverlay>,
    plot: Option<SeriesPlot<'s>>,
    raster: Option<SvgRasterizer>,
}

impl<'s> Compositor<'s> {
    pub fn passthrough() -> Self {
        Self {
            padding: 0,
            text: None,
            plot: None,
            raster: None,
        }
    }

    pub fn new(opts: &OverlayOpts, series: Option<&'s OverlaySeries>) -> ReelResult<Self> {
        Self::with_rasterizer(opts, series, SvgRasterizer::new)
    }

    /// Like [`Compositor::new`], with control over how the SVG rasterizer (and its fonts) is
    /// created. Only called when at least one overlay is active.
    pub fn with_rasterizer(
        opts: &OverlayOpts,
        series: Option<&'s OverlaySeries>,
        make_raster: impl FnOnce() -> SvgRasterizer,
    ) -> ReelResult<Self> {
        let Some(series) = series else {
            tracing::info!("no overlay series supplied; frames pass through unmodified");
            return Ok(Self::passthrough());
        };

        let text = opts.time_text.then(|| TimeOverlay {
            font_size: opts.font_size,
            ..TimeOverlay::default()
        });
        let plot = if opts.plot {
            let plot = SeriesPlot::new(series, opts.plot_width, opts.plot_height)?;
            if plot.is_none() {
                tracing::warn!("overlay series is empty; plot overlay disabled");
            }
            match (plot, &opts.plot_label) {
                (Some(p), Some(label)) => Some(p.with_label(label.clone())),
                (p, _) => p,
            }
        } else {
            None
        };

        if let Some(p) = &plot {
            let l = p.limits();
            tracing::debug!(
                x_min = l.x_min,
                x_max = l.x_max,
                y_min = l.y_min,
                y_max = l.y_max,
                "plot axis limits fixed for run"
            );
        }

        let raster = (text.is_some() || plot.is_some()).then(make_raster);
        Ok(Self {
            padding: opts.padding,
            text,
            plot,
            raster,
        })
    }

    pub fn is_passthrough(&self) -> bool {
        self.text.is_none() && self.plot.is_none()
    }

    pub fn plot(&self) -> Option<&SeriesPlot<'s>> {
        self.plot.as_ref()
    }

    /// Draw the time caption, then the plot, at the frame's simulated time.
    pub fn composite(&self, mut frame: Frame) -> ReelResult<Frame> {
        let Some(raster) = &self.raster else {
            return Ok(frame);
        };
        let pad = i64::from(self.padding);

        if let Some(text) = &self.text {
            let img = text.render(raster, frame.time)?;
            blit_over(&mut frame, &img, pad, pad);
        }
        if let Some(plot) = &self.plot {
            let img = plot.render(raster, frame.time)?;
            let (x0, y0) = bottom_right_origin(&frame, img.width, img.height, self.padding);
            blit_over(&mut frame, &img, x0, y0);
        }
        Ok(frame)
    }

    pub fn composite_all(&self, frames: Vec<Frame>) -> ReelResult<Vec<Frame>> {
        if self.is_passthrough() {
            return Ok(frames);
        }
        frames.into_iter().map(|f| self.composite(f)).collect()
    }
}
