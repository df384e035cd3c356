use crate::io::vsimem::VsiMemFile;
use crate::types::{GeoTransform, RasterData, TerrainError, TerrainResult};
use gdal::raster::{Buffer, GdalType};
use gdal::{Dataset, DriverManager};
use gdal::spatial_ref::SpatialRef;
use ndarray::ArrayView2;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where an exported raster goes
#[derive(Debug, Clone)]
pub enum Destination {
    /// A GeoTIFF on disk
    Path(PathBuf),
    /// A GDAL path, e.g. a reserved `/vsimem/` file
    Gdal(String),
}

impl Destination {
    fn as_path(&self) -> &Path {
        match self {
            Destination::Path(p) => p.as_path(),
            Destination::Gdal(s) => Path::new(s),
        }
    }
}

/// Band-level options for an exported raster
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Nodata value recorded on the band, if any
    pub nodata: Option<f64>,
}

/// Single-band GeoTIFF writer
pub struct RasterExporter {
    options: ExportOptions,
}

impl RasterExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn standard() -> Self {
        Self::new(ExportOptions::default())
    }

    /// Write `data` as band 1 of a new GeoTIFF carrying `geo_transform` and `crs`
    ///
    /// An empty `crs` writes no projection. Any failure is an `Export` error.
    pub fn write_single_band_raster(
        &self,
        data: RasterData<'_>,
        geo_transform: &GeoTransform,
        crs: &str,
        destination: &Destination,
    ) -> TerrainResult<()> {
        let (height, width) = data.dim();
        log::info!(
            "Writing {}x{} {} raster to {}",
            width,
            height,
            data.numeric_type(),
            destination.as_path().display()
        );

        let result = match data {
            RasterData::UInt8(view) => self.write_band(view, geo_transform, crs, destination),
            RasterData::Float32(view) => self.write_band(view, geo_transform, crs, destination),
            RasterData::Float64(view) => self.write_band(view, geo_transform, crs, destination),
        };

        result.map_err(|e| match e {
            TerrainError::Export(_) => e,
            other => TerrainError::Export(format!(
                "Failed to write {}: {}",
                destination.as_path().display(),
                other
            )),
        })
    }

    /// Write a GeoTIFF into memory and return its bytes
    pub fn to_geotiff_bytes(
        &self,
        data: RasterData<'_>,
        geo_transform: &GeoTransform,
        crs: &str,
    ) -> TerrainResult<Vec<u8>> {
        let mem_file = VsiMemFile::reserve("export", "tif")?;
        let destination = Destination::Gdal(mem_file.path().to_string());

        self.write_single_band_raster(data, geo_transform, crs, &destination)?;

        mem_file
            .read_all()
            .map_err(|e| TerrainError::Export(format!("Cannot collect exported bytes: {}", e)))
    }

    fn write_band<T: GdalType + Copy>(
        &self,
        matrix: ArrayView2<'_, T>,
        geo_transform: &GeoTransform,
        crs: &str,
        destination: &Destination,
    ) -> TerrainResult<()> {
        let (height, width) = matrix.dim();
        if height == 0 || width == 0 {
            return Err(TerrainError::Dimension(format!(
                "Cannot export an empty {}x{} raster",
                height, width
            )));
        }

        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let mut dataset: Dataset = driver.create_with_band_type::<T, _>(
            destination.as_path(),
            width as isize,
            height as isize,
            1,
        )?;

        dataset.set_geo_transform(&geo_transform.to_gdal())?;

        if !crs.is_empty() {
            dataset.set_projection(&projection_wkt(crs)?)?;
        }

        let mut rasterband = dataset.rasterband(1)?;
        // iter() walks logical row-major order regardless of the view's strides
        let flat_data: Vec<T> = matrix.iter().copied().collect();
        let buffer = Buffer::new((width, height), flat_data);
        rasterband.write((0, 0), (width, height), &buffer)?;

        if let Some(nodata) = self.options.nodata {
            rasterband.set_no_data_value(Some(nodata))?;
        }

        // Dropping the dataset flushes it to the destination
        drop(rasterband);
        drop(dataset);

        log::debug!("Raster written: {}", destination.as_path().display());
        Ok(())
    }
}

impl Default for RasterExporter {
    fn default() -> Self {
        Self::standard()
    }
}

/// GDAL datasets take WKT; other definitions ("EPSG:32633", PROJ strings)
/// are converted first. WKT passes through untouched.
fn projection_wkt(crs: &str) -> TerrainResult<String> {
    let wkt_head = Regex::new(r"^\s*[A-Z][A-Z0-9_]*\s*\[")
        .map_err(|e| TerrainError::Export(format!("Regex error: {}", e)))?;

    if wkt_head.is_match(crs) {
        return Ok(crs.to_string());
    }
    log::debug!("Converting CRS definition {} to WKT", crs);
    Ok(SpatialRef::from_definition(crs)?.to_wkt()?)
}

/// Write a single-band raster with default options
pub fn write_single_band_raster(
    data: RasterData<'_>,
    geo_transform: &GeoTransform,
    crs: &str,
    destination: &Destination,
) -> TerrainResult<()> {
    RasterExporter::standard().write_single_band_raster(data, geo_transform, crs, destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::dem::DemReader;
    use ndarray::{array, Array2};

    #[test]
    fn test_unwritable_destination_is_export_error() {
        let data = Array2::<u8>::zeros((2, 2));
        let destination = Destination::Path(PathBuf::from("/nonexistent/dir/out.tif"));
        let result = write_single_band_raster(
            RasterData::UInt8(data.view()),
            &GeoTransform::default(),
            "",
            &destination,
        );
        assert!(matches!(result, Err(TerrainError::Export(_))));
    }

    #[test]
    fn test_empty_matrix_is_rejected() {
        let data = Array2::<f32>::zeros((0, 3));
        let result = RasterExporter::standard().to_geotiff_bytes(
            RasterData::Float32(data.view()),
            &GeoTransform::default(),
            "",
        );
        assert!(matches!(result, Err(TerrainError::Export(_))));
    }

    #[test]
    fn test_bytes_are_a_readable_geotiff() {
        let data = array![[1.5f32, 2.5, 3.5], [4.5, 5.5, 6.5]];
        let gt = GeoTransform::from_origin(500_000.0, 4_100_000.0, 30.0, 30.0);
        let exporter = RasterExporter::new(ExportOptions { nodata: Some(-1.0) });

        let bytes = exporter
            .to_geotiff_bytes(RasterData::Float32(data.view()), &gt, "")
            .unwrap();
        assert_eq!(&bytes[..2], b"II");

        let grid = DemReader::read_dem_from_bytes("roundtrip.tif", bytes).unwrap();
        assert_eq!(grid.dim(), (2, 3));
        assert_eq!(grid.geo_transform(), &gt);
        assert_eq!(grid.nodata(), Some(-1.0));
        assert_eq!(grid.data()[[1, 2]], 6.5);
    }

    #[test]
    fn test_epsg_definition_is_converted() {
        assert!(projection_wkt("EPSG:4326").unwrap().contains("WGS 84"));

        let wkt = "GEOGCS[\"WGS 84\"]";
        assert_eq!(projection_wkt(wkt).unwrap(), wkt);

        let data = Array2::<u8>::from_elem((2, 2), 7);
        let bytes = RasterExporter::standard()
            .to_geotiff_bytes(
                RasterData::UInt8(data.view()),
                &GeoTransform::from_origin(103.8, 1.3, 0.001, 0.001),
                "EPSG:4326",
            )
            .unwrap();
        let grid = DemReader::read_dem_from_bytes("wgs84.tif", bytes).unwrap();
        assert!(grid.crs().contains("WGS 84"));
    }

    #[test]
    fn test_transposed_view_is_written_in_logical_order() {
        let data = array![[1u8, 2], [3, 4], [5, 6]];
        let transposed = data.t();

        let bytes = RasterExporter::standard()
            .to_geotiff_bytes(RasterData::UInt8(transposed), &GeoTransform::default(), "")
            .unwrap();
        let grid = DemReader::read_dem_from_bytes("t.tif", bytes).unwrap();

        assert_eq!(grid.dim(), (2, 3));
        assert_eq!(grid.data()[[0, 1]], 3.0);
        assert_eq!(grid.data()[[1, 0]], 2.0);
    }
}
