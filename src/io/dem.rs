use crate::io::vsimem::VsiMemFile;
use crate::types::{ElevationGrid, GeoTransform, TerrainError, TerrainResult};
use gdal::Dataset;
use ndarray::Array2;
use std::path::Path;

/// Digital Elevation Model reader
pub struct DemReader;

impl DemReader {
    /// Read band 1 of a DEM file
    pub fn read_dem<P: AsRef<Path>>(dem_path: P) -> TerrainResult<ElevationGrid> {
        log::info!("Reading DEM from: {}", dem_path.as_ref().display());

        let dataset = Dataset::open(dem_path.as_ref()).map_err(|e| {
            TerrainError::Format(format!("Cannot open {}: {}", dem_path.as_ref().display(), e))
        })?;

        Self::read_dataset(&dataset)
    }

    /// Read a DEM from an uploaded byte buffer without touching the disk
    ///
    /// `name` is only used to build the in-memory path; its extension helps
    /// GDAL pick a driver.
    pub fn read_dem_from_bytes(name: &str, bytes: Vec<u8>) -> TerrainResult<ElevationGrid> {
        log::info!("Reading DEM from {} in-memory bytes ({})", bytes.len(), name);

        let (stem, extension) = split_name(name);
        let mem_file = VsiMemFile::from_bytes(stem, extension, bytes)?;

        let dataset = Dataset::open(mem_file.path())
            .map_err(|e| TerrainError::Format(format!("Cannot decode {}: {}", name, e)))?;
        let grid = Self::read_dataset(&dataset);

        // The dataset must close before its backing buffer is unlinked
        drop(dataset);
        drop(mem_file);
        grid
    }

    fn read_dataset(dataset: &Dataset) -> TerrainResult<ElevationGrid> {
        let (width, height) = dataset.raster_size();
        log::debug!("DEM size: {}x{}, bands: {}", width, height, dataset.raster_count());

        if dataset.raster_count() < 1 {
            return Err(TerrainError::Format("Raster has no bands".to_string()));
        }

        // Ungeoreferenced rasters report an error here; fall back to identity
        let geo_transform = match dataset.geo_transform() {
            Ok(gt) => GeoTransform::from_gdal(&gt),
            Err(e) => {
                log::warn!("No geotransform ({}), using pixel coordinates", e);
                GeoTransform::default()
            }
        };
        log::debug!("DEM geotransform: {:?}", geo_transform);

        let crs = dataset.projection();
        if crs.is_empty() {
            log::warn!("DEM has no coordinate reference");
        }

        let rasterband = dataset
            .rasterband(1)
            .map_err(|e| TerrainError::Format(format!("Cannot access band 1: {}", e)))?;
        let nodata = rasterband.no_data_value();

        let band_data = rasterband
            .read_as::<f64>((0, 0), (width, height), (width, height), None)
            .map_err(|e| TerrainError::Format(format!("Cannot read elevation samples: {}", e)))?;

        let elevation = Array2::from_shape_vec((height, width), band_data.data)
            .map_err(|e| TerrainError::Dimension(format!("Failed to reshape DEM data: {}", e)))?;

        Ok(ElevationGrid::new(elevation, geo_transform, crs, nodata))
    }
}

fn split_name(name: &str) -> (&str, &str) {
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some(ext) => (&name[..name.len() - ext.len() - 1], ext),
        None => (name, "tif"),
    }
}
