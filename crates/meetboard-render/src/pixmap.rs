//! Software RGBA raster surface.

use crate::renderer::{Composite, RasterSurface, RenderResult, StrokePaint};
use kurbo::{BezPath, PathEl, Point};

/// Flattening tolerance for curve-to-line conversion, in pixels.
const FLATTEN_TOLERANCE: f64 = 0.25;

/// An owned RGBA8 pixel buffer implementing [`RasterSurface`].
///
/// Paths are flattened with kurbo and rasterized by stamping antialiased
/// round discs along each segment, which yields the round caps and joins
/// the board expects. A full-path coverage mask is built first so uniform
/// opacity (the highlighter) does not double-darken at self-overlaps.
#[derive(Debug, Clone)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Pixmap {
    /// Create a transparent pixmap. Zero dimensions are allowed and make
    /// every paint operation a no-op.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; buffer_len(width, height)],
        }
    }

    /// Raw RGBA8 pixels, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Straight-alpha RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    fn composite_coverage(&mut self, coverage: &[f32], paint: &StrokePaint) {
        let alpha_scale = (paint.opacity * f64::from(paint.color.a) / 255.0).clamp(0.0, 1.0);
        for (i, &cov) in coverage.iter().enumerate() {
            if cov <= 0.0 {
                continue;
            }
            let sa = f64::from(cov) * alpha_scale;
            let px = &mut self.data[i * 4..i * 4 + 4];
            let da = f64::from(px[3]) / 255.0;
            match paint.composite {
                Composite::SourceOver => {
                    let out_a = sa + da * (1.0 - sa);
                    if out_a > 0.0 {
                        for (c, src) in [paint.color.r, paint.color.g, paint.color.b]
                            .into_iter()
                            .enumerate()
                        {
                            let dst = f64::from(px[c]);
                            let blended =
                                (f64::from(src) * sa + dst * da * (1.0 - sa)) / out_a;
                            px[c] = blended.round().clamp(0.0, 255.0) as u8;
                        }
                    }
                    px[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
                }
                Composite::DestinationOut => {
                    px[3] = (da * (1.0 - sa) * 255.0).round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }
}

/// Byte length of an RGBA8 buffer, in `usize` so large surfaces do not
/// overflow 32-bit pixel arithmetic.
fn buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// Max-combine an antialiased disc into the coverage mask.
fn stamp_disc(coverage: &mut [f32], width: u32, height: u32, center: Point, radius: f64) {
    let x0 = (center.x - radius - 1.0).floor().max(0.0) as u32;
    let y0 = (center.y - radius - 1.0).floor().max(0.0) as u32;
    let x1 = ((center.x + radius + 1.0).ceil() as i64).clamp(0, i64::from(width)) as u32;
    let y1 = ((center.y + radius + 1.0).ceil() as i64).clamp(0, i64::from(height)) as u32;

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = f64::from(x) + 0.5 - center.x;
            let dy = f64::from(y) + 0.5 - center.y;
            let dist = (dx * dx + dy * dy).sqrt();
            let alpha = (radius + 0.5 - dist).clamp(0.0, 1.0) as f32;
            if alpha > 0.0 {
                let i = y as usize * width as usize + x as usize;
                coverage[i] = coverage[i].max(alpha);
            }
        }
    }
}

fn stamp_segment(
    coverage: &mut [f32],
    width: u32,
    height: u32,
    from: Point,
    to: Point,
    radius: f64,
) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length = (dx * dx + dy * dy).sqrt();
    let step = (radius * 0.5).max(0.25);
    let count = (length / step).ceil() as usize;

    for i in 0..=count {
        let t = if count == 0 { 0.0 } else { i as f64 / count as f64 };
        let p = Point::new(from.x + dx * t, from.y + dy * t);
        stamp_disc(coverage, width, height, p, radius);
    }
}

impl RasterSurface for Pixmap {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.data.fill(0);
    }

    fn stroke_path(&mut self, path: &BezPath, paint: &StrokePaint) {
        if self.width == 0 || self.height == 0 || paint.width <= 0.0 {
            return;
        }

        let (w, h) = (self.width, self.height);
        let radius = paint.width / 2.0;
        let mut coverage = vec![0f32; w as usize * h as usize];
        let mut last: Option<Point> = None;

        kurbo::flatten(path.elements().iter().copied(), FLATTEN_TOLERANCE, |el| {
            match el {
                PathEl::MoveTo(p) => {
                    stamp_disc(&mut coverage, w, h, p, radius);
                    last = Some(p);
                }
                PathEl::LineTo(p) => {
                    if let Some(prev) = last {
                        stamp_segment(&mut coverage, w, h, prev, p, radius);
                    }
                    last = Some(p);
                }
                PathEl::ClosePath => {}
                // flatten only emits moves, lines, and closes
                _ => {}
            }
        });

        self.composite_coverage(&coverage, paint);
    }

    fn encode_png(&self) -> RenderResult<Vec<u8>> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.data)?;
        }
        Ok(out)
    }
}
