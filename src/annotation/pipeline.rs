use crate::{
    annotation::{AnnotationResult, FaceAnnotation},
    config::{validate_threshold, PipelineConfig},
    image::{Annotator, ImageLoader, ImageTransforms, ModelInfo},
    models::{Classifier, FaceDetector, ModelManager},
    Result,
};
use image::{DynamicImage, RgbImage};
use std::sync::Arc;
use std::time::Instant;

/// 年龄/性别标注流水线
///
/// 持有三个只读模型句柄，构造一次后可在多个请求间共享。
pub struct AnnotationPipeline {
    detector: Arc<FaceDetector>,
    gender: Arc<Classifier>,
    age: Arc<Classifier>,
    annotator: Annotator,
    confidence_threshold: f32,
    padding: u32,
}

impl AnnotationPipeline {
    pub fn new(
        detector: Arc<FaceDetector>,
        gender: Arc<Classifier>,
        age: Arc<Classifier>,
        annotator: Annotator,
        config: &PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            detector,
            gender,
            age,
            annotator,
            confidence_threshold: config.confidence_threshold,
            padding: config.padding,
        })
    }

    pub fn from_manager(manager: &ModelManager) -> Result<Self> {
        let config = &manager.config().pipeline_config;
        let annotator = Annotator::load(config.font_path.as_deref(), config.label_scale);

        Self::new(
            manager.detector(),
            manager.gender_classifier(),
            manager.age_classifier(),
            annotator,
            config,
        )
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn has_label_font(&self) -> bool {
        self.annotator.has_font()
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            detector: self.detector.model_name().to_string(),
            gender_classifier: self.gender.model_name().to_string(),
            age_classifier: self.age.model_name().to_string(),
        }
    }

    /// 先归一化通道，再标注
    pub fn annotate_dynamic(&self, image: DynamicImage) -> Result<AnnotationResult> {
        let rgb = ImageLoader::normalize(image)?;
        self.annotate(&rgb)
    }

    /// 使用默认阈值标注
    pub fn annotate(&self, image: &RgbImage) -> Result<AnnotationResult> {
        self.annotate_with_threshold(image, self.confidence_threshold)
    }

    /// 检测、裁剪、分类并绘制；任一步失败则整个调用失败，不返回部分结果
    pub fn annotate_with_threshold(
        &self,
        image: &RgbImage,
        confidence_threshold: f32,
    ) -> Result<AnnotationResult> {
        validate_threshold(confidence_threshold)?;
        let start_time = Instant::now();

        let boxes = self.detector.detect(image, confidence_threshold)?;
        if boxes.is_empty() {
            tracing::debug!("No face detected");
            return Ok(AnnotationResult::empty(image.clone()));
        }

        let mut canvas = image.clone();
        let mut faces = Vec::with_capacity(boxes.len());

        for (i, bbox) in boxes.into_iter().enumerate() {
            // 从原图裁剪，不受已绘制的框影响
            let crop = ImageTransforms::crop_face(image, &bbox, self.padding);
            let gender = self.gender.classify(&crop)?;
            let age = self.age.classify(&crop)?;

            tracing::debug!(
                "Face {}: {:?} gender={} ({:.2}%) age={} ({:.2}%)",
                i,
                crop.region,
                gender.label,
                gender.confidence,
                age.label,
                age.confidence
            );

            let face = FaceAnnotation {
                bounding_box: bbox,
                gender,
                age,
            };
            self.annotator.draw_face(&mut canvas, &face);
            faces.push(face);
        }

        tracing::info!(
            "Annotation completed: faces={}, time={:.3}s",
            faces.len(),
            start_time.elapsed().as_secs_f32()
        );

        Ok(AnnotationResult {
            image: canvas,
            faces,
        })
    }
}
