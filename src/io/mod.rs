//! Raster I/O and the collaborators around the engine

pub mod vsimem;
pub mod dem;
pub mod export;
pub mod render;
pub mod report;
pub mod preview;

pub use dem::DemReader;
pub use export::{write_single_band_raster, Destination, ExportOptions, RasterExporter};
pub use render::{PngPaletteRenderer, VisualizationRenderer};
pub use report::ReportAssembler;
pub use preview::{NoopPreview, PreviewCapability, TilePreview};
