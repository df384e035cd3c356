//! hillside: terrain derivatives from elevation rasters
//!
//! Turns a DEM into slope, aspect and hillshade grids, writes them back out as
//! georeferenced GeoTIFFs aligned with the source, and renders palette images
//! for display and reporting.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    Artifact, DerivedRasterSet, ElevationGrid, GeoTransform, NumericType, Palette, ProductKind,
    RasterData, RenderedImage, TerrainError, TerrainResult,
};

pub use crate::core::{compute_derivatives, run_analysis, IlluminationParams, TerrainDerivativeEngine};
pub use crate::io::{write_single_band_raster, DemReader, Destination, RasterExporter};

#[cfg(feature = "python")]
mod python {
    use crate::core::{IlluminationParams, TerrainDerivativeEngine};
    use crate::io::{Destination, RasterExporter};
    use crate::types::{ElevationGrid, GeoTransform, RasterData};
    use numpy::{PyReadonlyArray2, ToPyArray};
    use pyo3::exceptions::{PyIOError, PyValueError};
    use pyo3::prelude::*;
    use pyo3::types::PyDict;
    use std::path::PathBuf;

    fn engine(azimuth: f64, altitude: f64) -> TerrainDerivativeEngine {
        TerrainDerivativeEngine::new(IlluminationParams { azimuth, altitude })
    }

    /// Slope, aspect (degrees) and hillshade (uint8) from a 2-D elevation array
    #[pyfunction]
    #[pyo3(signature = (elevation, azimuth=315.0, altitude=45.0))]
    fn compute_terrain_derivatives(
        py: Python,
        elevation: PyReadonlyArray2<f64>,
        azimuth: f64,
        altitude: f64,
    ) -> PyResult<PyObject> {
        let grid = ElevationGrid::new(elevation.as_array().to_owned(), GeoTransform::default(), "", None);
        let derived = engine(azimuth, altitude)
            .compute_derivatives(&grid)
            .map_err(|e| PyValueError::new_err(format!("{}", e)))?;

        let result = PyDict::new(py);
        result.set_item("slope", derived.slope().to_pyarray(py))?;
        result.set_item("aspect", derived.aspect().to_pyarray(py))?;
        result.set_item("hillshade", derived.hillshade().to_pyarray(py))?;
        Ok(result.into())
    }

    /// Compute the hillshade of `elevation` and write it as a GeoTIFF
    #[pyfunction]
    #[pyo3(signature = (elevation, geo_transform, crs, output_path, azimuth=315.0, altitude=45.0))]
    fn export_hillshade(
        elevation: PyReadonlyArray2<f64>,
        geo_transform: [f64; 6],
        crs: String,
        output_path: String,
        azimuth: f64,
        altitude: f64,
    ) -> PyResult<()> {
        let gt = GeoTransform::from_gdal(&geo_transform);
        let grid = ElevationGrid::new(elevation.as_array().to_owned(), gt, crs, None);
        let derived = engine(azimuth, altitude)
            .compute_derivatives(&grid)
            .map_err(|e| PyValueError::new_err(format!("{}", e)))?;

        RasterExporter::standard()
            .write_single_band_raster(
                RasterData::UInt8(derived.hillshade().view()),
                grid.geo_transform(),
                grid.crs(),
                &Destination::Path(PathBuf::from(output_path)),
            )
            .map_err(|e| PyIOError::new_err(format!("{}", e)))
    }

    /// Python module definition
    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(compute_terrain_derivatives, m)?)?;
        m.add_function(wrap_pyfunction!(export_hillshade, m)?)?;
        Ok(())
    }
}
