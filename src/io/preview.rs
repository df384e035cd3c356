use crate::types::{ElevationGrid, TerrainResult};

/// Optional tiled map preview of a raster layer
pub trait TilePreview {
    fn add_raster(&self, grid: &ElevationGrid, layer_name: &str) -> TerrainResult<()>;
}

/// Whether a tiled preview backend is installed
///
/// Decided once by the host; the analysis never probes for a backend.
pub enum PreviewCapability {
    Available(Box<dyn TilePreview>),
    Unavailable,
}

impl PreviewCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, PreviewCapability::Available(_))
    }

    /// The backend, or the no-op stand-in
    pub fn backend(&self) -> &dyn TilePreview {
        match self {
            PreviewCapability::Available(preview) => preview.as_ref(),
            PreviewCapability::Unavailable => &NoopPreview,
        }
    }
}

impl Default for PreviewCapability {
    fn default() -> Self {
        PreviewCapability::Unavailable
    }
}

impl std::fmt::Debug for PreviewCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreviewCapability::Available(_) => write!(f, "PreviewCapability::Available"),
            PreviewCapability::Unavailable => write!(f, "PreviewCapability::Unavailable"),
        }
    }
}

/// Stand-in used when no preview backend is installed
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPreview;

impl TilePreview for NoopPreview {
    fn add_raster(&self, _grid: &ElevationGrid, layer_name: &str) -> TerrainResult<()> {
        log::info!("Tiled preview not installed, skipping layer {}", layer_name);
        Ok(())
    }
}
