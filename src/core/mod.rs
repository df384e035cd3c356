//! Terrain derivative computation

pub mod gradient;
pub mod derivatives;
pub mod pipeline;

// Re-export main types
pub use gradient::{compute_gradients, Gradients};
pub use derivatives::{compute_derivatives, IlluminationParams, TerrainDerivativeEngine};
pub use pipeline::{
    run_analysis, AnalysisInputs, AnalysisOptions, AnalysisOutputs, ArtifactKind, ArtifactWarning,
    Collaborators, RasterSource,
};
