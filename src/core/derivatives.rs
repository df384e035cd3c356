use crate::core::gradient::compute_gradients;
use crate::types::{DerivedRasterSet, ElevationGrid, TerrainResult};
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Illumination geometry for hillshading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IlluminationParams {
    /// Light source azimuth in degrees (clockwise from north)
    pub azimuth: f64,
    /// Light source altitude in degrees above the horizon
    pub altitude: f64,
}

impl Default for IlluminationParams {
    fn default() -> Self {
        Self {
            azimuth: 315.0, // NW illumination
            altitude: 45.0,
        }
    }
}

/// Slope, aspect and hillshade from an elevation grid
#[derive(Debug, Clone)]
pub struct TerrainDerivativeEngine {
    params: IlluminationParams,
}

impl TerrainDerivativeEngine {
    /// Create a new engine with the given light source
    pub fn new(params: IlluminationParams) -> Self {
        Self { params }
    }

    /// Create an engine lit from 315° azimuth, 45° altitude
    pub fn standard() -> Self {
        Self::new(IlluminationParams::default())
    }

    pub fn params(&self) -> &IlluminationParams {
        &self.params
    }

    /// Compute slope (degrees), aspect (degrees) and hillshade (0-255)
    ///
    /// Nodata cells are not masked: the sentinel enters the gradient like any
    /// other elevation and its neighbours inherit whatever that produces.
    pub fn compute_derivatives(&self, grid: &ElevationGrid) -> TerrainResult<DerivedRasterSet> {
        let (rows, cols) = grid.dim();
        log::info!("Computing terrain derivatives for {}x{} grid", rows, cols);
        log::debug!(
            "Illumination: azimuth {}°, altitude {}°",
            self.params.azimuth,
            self.params.altitude
        );

        let nodata_cells = grid.nodata_count();
        if nodata_cells > 0 {
            log::warn!(
                "{} nodata cells ({:?}) are not masked and will distort nearby derivatives",
                nodata_cells,
                grid.nodata()
            );
        }

        let gradients = compute_gradients(grid.data())?;

        let slope_rad = map_cells(&gradients.row, &gradients.col, |&r, &c| slope_radians(r, c));
        let aspect_rad = map_cells(&gradients.row, &gradients.col, |&r, &c| aspect_radians(r, c));

        let azimuth_rad = self.params.azimuth.to_radians();
        let altitude_rad = self.params.altitude.to_radians();
        let hillshade = map_cells(&slope_rad, &aspect_rad, |&s, &a| {
            quantize_hillshade(shade(s, a, azimuth_rad, altitude_rad))
        });

        let slope_deg = slope_rad.mapv(slope_degrees);
        let aspect_deg = aspect_rad.mapv(aspect_degrees);

        log::debug!("Terrain derivatives completed");
        DerivedRasterSet::new(slope_deg, aspect_deg, hillshade)
    }
}

impl Default for TerrainDerivativeEngine {
    fn default() -> Self {
        Self::standard()
    }
}

/// Compute derivatives with the standard illumination
pub fn compute_derivatives(grid: &ElevationGrid) -> TerrainResult<DerivedRasterSet> {
    TerrainDerivativeEngine::standard().compute_derivatives(grid)
}

/// π/2 − atan(|∇z|): π/2 on flat ground, falling towards 0 as the gradient grows
pub fn slope_radians(row_grad: f64, col_grad: f64) -> f64 {
    FRAC_PI_2 - row_grad.hypot(col_grad).atan()
}

pub fn aspect_radians(row_grad: f64, col_grad: f64) -> f64 {
    (-row_grad).atan2(col_grad)
}

/// Illumination in [-1, 1] for one cell; all angles in radians
pub fn shade(slope_rad: f64, aspect_rad: f64, azimuth_rad: f64, altitude_rad: f64) -> f64 {
    altitude_rad.sin() * slope_rad.sin()
        + altitude_rad.cos() * slope_rad.cos() * (azimuth_rad - aspect_rad).cos()
}

/// Scale [-1, 1] to [0, 255], rounding half away from zero.
///
/// Non-finite input (propagated nodata) yields 0.
pub fn quantize_hillshade(raw: f64) -> u8 {
    let scaled = (255.0 * (raw + 1.0) / 2.0).round();
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(0.0, 255.0) as u8
}

/// Kept as acos(sin(x)) rather than 90° − x
pub fn slope_degrees(slope_rad: f64) -> f64 {
    slope_rad.sin().acos().to_degrees()
}

/// Degrees wrapped into [0, 360)
pub fn aspect_degrees(aspect_rad: f64) -> f64 {
    let wrapped = aspect_rad.to_degrees().rem_euclid(360.0);
    // rem_euclid of a tiny negative rounds up to exactly 360
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(not(feature = "parallel"))]
fn map_cells<A, B, O, F>(a: &Array2<A>, b: &Array2<B>, f: F) -> Array2<O>
where
    F: Fn(&A, &B) -> O + Sync + Send,
    A: Sync,
    B: Sync,
    O: Send,
{
    Zip::from(a).and(b).map_collect(f)
}

#[cfg(feature = "parallel")]
fn map_cells<A, B, O, F>(a: &Array2<A>, b: &Array2<B>, f: F) -> Array2<O>
where
    F: Fn(&A, &B) -> O + Sync + Send,
    A: Sync,
    B: Sync,
    O: Send,
{
    Zip::from(a).and(b).par_map_collect(f)
}
