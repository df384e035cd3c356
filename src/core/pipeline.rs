use crate::core::derivatives::{IlluminationParams, TerrainDerivativeEngine};
use crate::io::dem::DemReader;
use crate::io::export::RasterExporter;
use crate::io::preview::PreviewCapability;
use crate::io::render::{render_product, VisualizationRenderer};
use crate::io::report::{assemble_report, ReportAssembler, REPORT_FILE_NAME};
use crate::types::{
    Artifact, DerivedRasterSet, ElevationGrid, ProductKind, RasterData, RenderedImage, TerrainError,
    TerrainResult,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name of the exported hillshade GeoTIFF
pub const HILLSHADE_FILE_NAME: &str = "hillshade.tif";

/// Where a raster input comes from
#[derive(Debug, Clone)]
pub enum RasterSource {
    Path(PathBuf),
    /// An upload held in memory; `name` should carry the file extension
    Bytes { name: String, data: Vec<u8> },
}

impl RasterSource {
    fn load(self) -> TerrainResult<ElevationGrid> {
        match self {
            RasterSource::Path(path) => DemReader::read_dem(path),
            RasterSource::Bytes { name, data } => DemReader::read_dem_from_bytes(&name, data),
        }
    }
}

/// Rasters supplied for one analysis pass
#[derive(Debug, Clone, Default)]
pub struct AnalysisInputs {
    pub dem: Option<RasterSource>,
    /// A slope raster computed elsewhere, displayed as-is
    pub precomputed_slope: Option<RasterSource>,
}

/// Per-pass switches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub illumination: IlluminationParams,
    /// Offer the DEM to the tiled preview, if one is installed
    pub show_dem: bool,
    pub show_precomputed_slope: bool,
    /// Render hillshade, slope and aspect images
    pub render_products: bool,
    pub export_hillshade: bool,
    /// Products to paginate into a report, in page order; `None` skips the report
    pub report_products: Option<Vec<ProductKind>>,
    pub report_file_name: String,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            illumination: IlluminationParams::default(),
            show_dem: true,
            show_precomputed_slope: false,
            render_products: true,
            export_hillshade: true,
            report_products: None,
            report_file_name: REPORT_FILE_NAME.to_string(),
        }
    }
}

/// Collaborators a pass draws on
pub struct Collaborators<'a> {
    pub renderer: &'a dyn VisualizationRenderer,
    pub report: Option<&'a dyn ReportAssembler>,
    pub preview: &'a PreviewCapability,
}

/// The artifact a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    DemPreview,
    Dem,
    PrecomputedSlope,
    Derivatives,
    Image(ProductKind),
    HillshadeGeoTiff,
    Report,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::DemPreview => write!(f, "DEM preview"),
            ArtifactKind::Dem => write!(f, "DEM"),
            ArtifactKind::PrecomputedSlope => write!(f, "precomputed slope raster"),
            ArtifactKind::Derivatives => write!(f, "terrain derivatives"),
            ArtifactKind::Image(product) => write!(f, "{} image", product),
            ArtifactKind::HillshadeGeoTiff => write!(f, "hillshade GeoTIFF"),
            ArtifactKind::Report => write!(f, "report"),
        }
    }
}

/// A non-fatal failure tied to the artifact it prevented
#[derive(Debug)]
pub struct ArtifactWarning {
    pub artifact: ArtifactKind,
    pub error: TerrainError,
}

/// Everything one pass produced
#[derive(Debug)]
pub struct AnalysisOutputs {
    pub derived: Option<DerivedRasterSet>,
    pub images: Vec<RenderedImage>,
    pub hillshade_geotiff: Option<Artifact>,
    pub report: Option<Artifact>,
    pub warnings: Vec<ArtifactWarning>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl AnalysisOutputs {
    pub fn image(&self, product: ProductKind) -> Option<&RenderedImage> {
        self.images.iter().find(|img| img.product == product)
    }

    pub fn warning_for(&self, artifact: ArtifactKind) -> Option<&ArtifactWarning> {
        self.warnings.iter().find(|w| w.artifact == artifact)
    }
}

struct PassState {
    images: Vec<RenderedImage>,
    warnings: Vec<ArtifactWarning>,
}

impl PassState {
    /// Keep the value, or record the failure against `artifact`
    fn settle<T>(&mut self, artifact: ArtifactKind, result: TerrainResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                log::warn!("{} failed: {}", artifact, error);
                self.warnings.push(ArtifactWarning { artifact, error });
                None
            }
        }
    }

    fn render(&mut self, collab: &Collaborators<'_>, product: ProductKind, matrix: ndarray::ArrayView2<'_, f64>) {
        let rendered = render_product(collab.renderer, product, matrix);
        if let Some(image) = self.settle(ArtifactKind::Image(product), rendered) {
            self.images.push(image);
        }
    }
}

/// Run one analysis pass: load, derive, render, export, report
///
/// Never fails as a whole. Each failure is recorded against the artifact it
/// affects and every independent artifact is still produced.
pub fn run_analysis(inputs: AnalysisInputs, options: &AnalysisOptions, collab: &Collaborators<'_>) -> AnalysisOutputs {
    let started_at = Utc::now();
    log::info!("Starting analysis pass");

    let mut state = PassState {
        images: Vec::new(),
        warnings: Vec::new(),
    };

    if options.show_precomputed_slope {
        if let Some(source) = inputs.precomputed_slope {
            if let Some(slope) = state.settle(ArtifactKind::PrecomputedSlope, source.load()) {
                state.render(collab, ProductKind::PrecomputedSlope, slope.data().view());
            }
        }
    }

    let mut derived = None;
    let mut hillshade_geotiff = None;

    let grid = match inputs.dem {
        Some(source) => state.settle(ArtifactKind::Dem, source.load()),
        None => None,
    };

    if let Some(grid) = grid {
        if options.show_dem {
            let shown = collab.preview.backend().add_raster(&grid, "DEM Raster");
            state.settle(ArtifactKind::DemPreview, shown);
        }

        let engine = TerrainDerivativeEngine::new(options.illumination);
        derived = state.settle(ArtifactKind::Derivatives, engine.compute_derivatives(&grid));

        if let Some(set) = &derived {
            if options.render_products {
                let hillshade = set.hillshade().mapv(f64::from);
                state.render(collab, ProductKind::Hillshade, hillshade.view());
                state.render(collab, ProductKind::Slope, set.slope().view());
                state.render(collab, ProductKind::Aspect, set.aspect().view());
            }

            if options.export_hillshade {
                let written = RasterExporter::standard().to_geotiff_bytes(
                    RasterData::UInt8(set.hillshade().view()),
                    grid.geo_transform(),
                    grid.crs(),
                );
                hillshade_geotiff = state
                    .settle(ArtifactKind::HillshadeGeoTiff, written)
                    .map(|bytes| Artifact::new(HILLSHADE_FILE_NAME, "image/tiff", bytes));
            }
        }
    }

    let report = match (&options.report_products, collab.report) {
        (Some(requested), Some(assembler)) => {
            let assembled = assemble_report(assembler, &state.images, requested).map(|mut artifact| {
                artifact.file_name = options.report_file_name.clone();
                artifact
            });
            state.settle(ArtifactKind::Report, assembled)
        }
        (Some(_), None) => state.settle(
            ArtifactKind::Report,
            Err::<Artifact, _>(TerrainError::Report("No report assembler configured".to_string())),
        ),
        (None, _) => None,
    };

    let finished_at = Utc::now();
    log::info!(
        "Analysis pass finished in {} ms: {} images, {} warnings",
        (finished_at - started_at).num_milliseconds(),
        state.images.len(),
        state.warnings.len()
    );

    AnalysisOutputs {
        derived,
        images: state.images,
        hillshade_geotiff,
        report,
        warnings: state.warnings,
        started_at,
        finished_at,
    }
}
