pub mod annotation;
pub mod config;
pub mod image;
pub mod models;
pub mod utils;
pub mod web;

// 重新导出主要类型
pub use annotation::{AnnotationPipeline, AnnotationResult};
pub use config::Config;
pub use utils::error::AnnotateError;

pub type Result<T> = std::result::Result<T, AnnotateError>;
