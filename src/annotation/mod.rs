pub mod pipeline;
pub mod types;

pub use pipeline::AnnotationPipeline;
pub use types::{
    AnnotateOptions, AnnotationResult, BoundingBox, ClassificationResult, Crop, CropRegion,
    FaceAnnotation, AGE_LABELS, GENDER_LABELS,
};
