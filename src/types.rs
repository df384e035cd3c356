use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Elevation samples (rows x cols)
pub type ElevationData = Array2<f64>;

/// Geospatial transformation parameters (GDAL coefficient order)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform from an origin and a square-or-not pixel size.
    ///
    /// `pixel_height` is passed as a positive size and stored negated, like
    /// `rasterio.transform.from_origin`.
    pub fn from_origin(top_left_x: f64, top_left_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            top_left_x,
            pixel_width,
            rotation_x: 0.0,
            top_left_y,
            rotation_y: 0.0,
            pixel_height: -pixel_height,
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    pub fn from_gdal(gt: &[f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    /// Map a (row, col) pixel corner to georeferenced (x, y)
    pub fn pixel_to_geo(&self, row: f64, col: f64) -> (f64, f64) {
        let x = self.top_left_x + col * self.pixel_width + row * self.rotation_x;
        let y = self.top_left_y + col * self.rotation_y + row * self.pixel_height;
        (x, y)
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        // GDAL's identity transform for ungeoreferenced rasters
        Self::from_gdal(&[0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }
}

/// A single-band elevation raster held in memory for one analysis pass.
///
/// Fields are private: once built, a grid is only read.
#[derive(Debug, Clone)]
pub struct ElevationGrid {
    data: ElevationData,
    geo_transform: GeoTransform,
    crs: String,
    nodata: Option<f64>,
}

impl ElevationGrid {
    pub fn new(data: ElevationData, geo_transform: GeoTransform, crs: impl Into<String>, nodata: Option<f64>) -> Self {
        Self {
            data,
            geo_transform,
            crs: crs.into(),
            nodata,
        }
    }

    /// Build a grid from row-major samples
    pub fn from_shape_vec(
        (rows, cols): (usize, usize),
        samples: Vec<f64>,
        geo_transform: GeoTransform,
        crs: impl Into<String>,
        nodata: Option<f64>,
    ) -> TerrainResult<Self> {
        let data = Array2::from_shape_vec((rows, cols), samples).map_err(|e| {
            TerrainError::Dimension(format!("Cannot shape samples into {}x{} grid: {}", rows, cols, e))
        })?;
        Ok(Self::new(data, geo_transform, crs, nodata))
    }

    pub fn data(&self) -> &ElevationData {
        &self.data
    }

    /// (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn geo_transform(&self) -> &GeoTransform {
        &self.geo_transform
    }

    /// Coordinate reference as read from the source (usually WKT)
    pub fn crs(&self) -> &str {
        &self.crs
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// Number of cells equal to the nodata sentinel (NaN sentinels match NaN cells)
    pub fn nodata_count(&self) -> usize {
        match self.nodata {
            Some(nd) if nd.is_nan() => self.data.iter().filter(|v| v.is_nan()).count(),
            Some(nd) => self.data.iter().filter(|&&v| v == nd).count(),
            None => 0,
        }
    }
}

/// Slope, aspect and hillshade computed from one elevation grid
#[derive(Debug, Clone)]
pub struct DerivedRasterSet {
    slope: Array2<f64>,
    aspect: Array2<f64>,
    hillshade: Array2<u8>,
}

impl DerivedRasterSet {
    /// All three matrices must share one shape
    pub fn new(slope: Array2<f64>, aspect: Array2<f64>, hillshade: Array2<u8>) -> TerrainResult<Self> {
        if slope.dim() != aspect.dim() || slope.dim() != hillshade.dim() {
            return Err(TerrainError::Dimension(format!(
                "Derived rasters disagree in shape: slope {:?}, aspect {:?}, hillshade {:?}",
                slope.dim(),
                aspect.dim(),
                hillshade.dim()
            )));
        }
        Ok(Self { slope, aspect, hillshade })
    }

    /// Slope in degrees
    pub fn slope(&self) -> &Array2<f64> {
        &self.slope
    }

    /// Aspect in degrees, [0, 360)
    pub fn aspect(&self) -> &Array2<f64> {
        &self.aspect
    }

    /// 8-bit illumination intensity
    pub fn hillshade(&self) -> &Array2<u8> {
        &self.hillshade
    }

    pub fn dim(&self) -> (usize, usize) {
        self.hillshade.dim()
    }
}

/// Pixel type of an exported band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumericType {
    UInt8,
    Float32,
    Float64,
}

impl std::fmt::Display for NumericType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericType::UInt8 => write!(f, "Byte"),
            NumericType::Float32 => write!(f, "Float32"),
            NumericType::Float64 => write!(f, "Float64"),
        }
    }
}

/// A matrix paired with the numeric type it is written as
#[derive(Debug, Clone, Copy)]
pub enum RasterData<'a> {
    UInt8(ArrayView2<'a, u8>),
    Float32(ArrayView2<'a, f32>),
    Float64(ArrayView2<'a, f64>),
}

impl<'a> RasterData<'a> {
    pub fn numeric_type(&self) -> NumericType {
        match self {
            RasterData::UInt8(_) => NumericType::UInt8,
            RasterData::Float32(_) => NumericType::Float32,
            RasterData::Float64(_) => NumericType::Float64,
        }
    }

    /// (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        match self {
            RasterData::UInt8(a) => a.dim(),
            RasterData::Float32(a) => a.dim(),
            RasterData::Float64(a) => a.dim(),
        }
    }
}

/// Named colour palettes requested from the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Palette {
    /// Black to white
    Grayscale,
    /// Sequential, low to high
    Viridis,
    /// Cyclic, wraps at both ends
    Twilight,
}

impl std::fmt::Display for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Palette::Grayscale => write!(f, "gray"),
            Palette::Viridis => write!(f, "viridis"),
            Palette::Twilight => write!(f, "twilight"),
        }
    }
}

/// Raster products a pass can render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductKind {
    Hillshade,
    Slope,
    Aspect,
    /// A slope raster supplied by the caller rather than derived
    PrecomputedSlope,
}

impl ProductKind {
    pub fn title(&self) -> &'static str {
        match self {
            ProductKind::Hillshade => "Hillshade",
            ProductKind::Slope => "Slope (degrees)",
            ProductKind::Aspect => "Aspect (degrees)",
            ProductKind::PrecomputedSlope => "Precomputed Slope (degrees)",
        }
    }

    pub fn palette(&self) -> Palette {
        match self {
            ProductKind::Hillshade => Palette::Grayscale,
            ProductKind::Slope | ProductKind::PrecomputedSlope => Palette::Viridis,
            ProductKind::Aspect => Palette::Twilight,
        }
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// A downloadable byte stream with a descriptive name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(file_name: impl Into<String>, mime_type: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type,
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// An image produced by the renderer for one product
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub product: ProductKind,
    pub artifact: Artifact,
}

/// Error types for terrain processing
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster format: {0}")]
    Format(String),

    #[error("Dimension error: {0}")]
    Dimension(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for terrain operations
pub type TerrainResult<T> = Result<T, TerrainError>;
