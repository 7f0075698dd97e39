pub mod builder;
pub mod classifier;
pub mod normalizer;
pub mod reconciler;
pub mod report;
pub mod similarity;
pub mod walker;

pub use reconciler::{ReconcileConfig, ReconcileError, ReconcilerService};
pub use similarity::{SimilarityKind, SimilarityScorer};
pub use walker::{Extraction, TableWalker};
