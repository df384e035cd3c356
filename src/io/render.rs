use crate::types::{Artifact, Palette, ProductKind, RenderedImage, TerrainError, TerrainResult};
use image::{ImageOutputFormat, Rgba, RgbaImage};
use ndarray::ArrayView2;
use std::io::Cursor;

/// Turns a numeric matrix into an encoded image
pub trait VisualizationRenderer {
    fn render(&self, matrix: ArrayView2<'_, f64>, palette: Palette, title: &str) -> TerrainResult<Vec<u8>>;
}

/// Render one product with the palette it is always shown with
pub fn render_product(
    renderer: &dyn VisualizationRenderer,
    product: ProductKind,
    matrix: ArrayView2<'_, f64>,
) -> TerrainResult<RenderedImage> {
    let bytes = renderer.render(matrix, product.palette(), product.title())?;
    Ok(RenderedImage {
        product,
        artifact: Artifact::new(format!("{}.png", product.title()), "image/png", bytes),
    })
}

/// Colour stops as (position, rgb)
type Stops = &'static [(f64, [u8; 3])];

const GRAYSCALE: Stops = &[(0.0, [0, 0, 0]), (1.0, [255, 255, 255])];

const VIRIDIS: Stops = &[
    (0.0, [68, 1, 84]),
    (0.125, [71, 44, 122]),
    (0.25, [59, 81, 139]),
    (0.375, [44, 113, 142]),
    (0.5, [33, 144, 141]),
    (0.625, [39, 173, 129]),
    (0.75, [92, 200, 99]),
    (0.875, [170, 220, 50]),
    (1.0, [253, 231, 37]),
];

// Both ends share a colour so 0° and 360° look the same
const TWILIGHT: Stops = &[
    (0.0, [226, 217, 226]),
    (0.125, [155, 176, 200]),
    (0.25, [96, 122, 183]),
    (0.375, [87, 63, 148]),
    (0.5, [47, 20, 54]),
    (0.625, [120, 38, 81]),
    (0.75, [180, 90, 80]),
    (0.875, [210, 165, 150]),
    (1.0, [226, 217, 226]),
];

fn stops(palette: Palette) -> Stops {
    match palette {
        Palette::Grayscale => GRAYSCALE,
        Palette::Viridis => VIRIDIS,
        Palette::Twilight => TWILIGHT,
    }
}

/// Colour at `t` in [0, 1], linearly interpolated between stops
pub fn palette_color(palette: Palette, t: f64) -> [u8; 3] {
    let stops = stops(palette);
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

    for pair in stops.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let f = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            let mut rgb = [0u8; 3];
            for k in 0..3 {
                let v = c0[k] as f64 + f * (c1[k] as f64 - c0[k] as f64);
                rgb[k] = v.round().clamp(0.0, 255.0) as u8;
            }
            return rgb;
        }
    }
    stops[stops.len() - 1].1
}

/// Min–max stretched palette rendering to PNG
///
/// Non-finite cells are left transparent.
#[derive(Debug, Clone, Default)]
pub struct PngPaletteRenderer;

impl PngPaletteRenderer {
    pub fn new() -> Self {
        Self
    }

    fn finite_range(matrix: &ArrayView2<'_, f64>) -> Option<(f64, f64)> {
        matrix
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

impl VisualizationRenderer for PngPaletteRenderer {
    fn render(&self, matrix: ArrayView2<'_, f64>, palette: Palette, title: &str) -> TerrainResult<Vec<u8>> {
        let (rows, cols) = matrix.dim();
        log::debug!("Rendering {} ({}x{}) with {} palette", title, rows, cols, palette);

        if rows == 0 || cols == 0 {
            return Err(TerrainError::Export(format!("Cannot render empty image for {}", title)));
        }

        let (lo, hi) = Self::finite_range(&matrix).unwrap_or((0.0, 0.0));
        let span = hi - lo;

        let mut img = RgbaImage::new(cols as u32, rows as u32);
        for ((row, col), &value) in matrix.indexed_iter() {
            let pixel = if value.is_finite() {
                let t = if span > 0.0 { (value - lo) / span } else { 0.0 };
                let [r, g, b] = palette_color(palette, t);
                Rgba([r, g, b, 255])
            } else {
                Rgba([0, 0, 0, 0])
            };
            img.put_pixel(col as u32, row as u32, pixel);
        }

        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .map_err(|e| TerrainError::Export(format!("PNG encoding failed for {}: {}", title, e)))?;
        Ok(bytes)
    }
}
