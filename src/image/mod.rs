pub mod loader;
pub mod overlay;
pub mod postprocessing;
pub mod preprocessing;
pub mod transforms;

pub use loader::ImageLoader;
pub use overlay::Annotator;
pub use postprocessing::{AnnotationReport, ModelInfo, ResultFormatter};
pub use preprocessing::{BlobSpec, ImagePreprocessor};
pub use transforms::ImageTransforms;
