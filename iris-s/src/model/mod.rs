pub mod knn;
pub mod lifecycle;

// Re-export main components
pub use knn::{KnnModel, ModelLoadError};
pub use lifecycle::{ModelManager, ModelState, ModelStatus, ModelStatusKind};
