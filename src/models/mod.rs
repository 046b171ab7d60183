pub mod classifier;
pub mod detector;
pub mod manager;
pub mod session;

pub use classifier::Classifier;
pub use detector::FaceDetector;
pub use manager::{ModelManager, ModelStats};
pub use session::{InferenceModel, OnnxModel};
