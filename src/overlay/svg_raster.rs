use crate::foundation::error::{ReelError, ReelResult};

/// A premultiplied RGBA8 image drawn on top of a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayImage {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, rows top-down.
    pub data: Vec<u8>,
}

/// Parses and rasterizes generated SVG documents.
///
/// Holds the font database so system fonts are scanned once per compositor rather than once
/// per frame.
pub struct SvgRasterizer {
    opts: usvg::Options<'static>,
}

impl SvgRasterizer {
    pub fn new() -> Self {
        let mut opts = usvg::Options::default();
        opts.fontdb_mut().load_system_fonts();
        tracing::debug!(faces = opts.fontdb.len(), "loaded system fonts for overlays");
        Self { opts }
    }

    /// Rasterizer with an empty font database. Text is silently dropped.
    pub fn without_fonts() -> Self {
        Self {
            opts: usvg::Options::default(),
        }
    }

    pub fn parse(&self, svg: &str) -> ReelResult<usvg::Tree> {
        usvg::Tree::from_str(svg, &self.opts)
            .map_err(|e| ReelError::render(format!("generated overlay svg is invalid: {e}")))
    }

    pub fn rasterize(&self, svg: &str, width: u32, height: u32) -> ReelResult<OverlayImage> {
        let tree = self.parse(svg)?;
        let data = rasterize_svg_to_premul_rgba8(&tree, width, height)?;
        Ok(OverlayImage {
            width,
            height,
            data,
        })
    }
}

impl Default for SvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

pub fn rasterize_svg_to_premul_rgba8(
    tree: &usvg::Tree,
    width: u32,
    height: u32,
) -> ReelResult<Vec<u8>> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ReelError::render("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.data().to_vec())
}

/// Escape text for use inside SVG character data and attribute values.
pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
