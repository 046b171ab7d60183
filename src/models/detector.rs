use crate::annotation::BoundingBox;
use crate::config::validate_threshold;
use crate::image::preprocessing::{BlobSpec, ImagePreprocessor};
use crate::models::session::InferenceModel;
use crate::utils::error::AnnotateError;
use crate::Result;
use image::RgbImage;
use ndarray::ArrayViewD;
use std::sync::Arc;

/// 每行检测结果的字段数: [image_id, class_id, score, x1, y1, x2, y2]
const DETECTION_FIELDS: usize = 7;

/// SSD 人脸检测器适配层
pub struct FaceDetector {
    model: Arc<dyn InferenceModel>,
    blob_spec: BlobSpec,
}

impl FaceDetector {
    pub fn new(model: Arc<dyn InferenceModel>) -> Self {
        Self {
            model,
            blob_spec: BlobSpec::detector(),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// 人脸检测推理，返回置信度高于阈值的人脸框（按检测器输出顺序）
    pub fn detect(&self, image: &RgbImage, confidence_threshold: f32) -> Result<Vec<BoundingBox>> {
        validate_threshold(confidence_threshold)?;

        if image.width() == 0 || image.height() == 0 {
            return Err(AnnotateError::UnsupportedImage(
                "Image has zero width or height".to_string(),
            ));
        }

        let blob = ImagePreprocessor::blob_from_image(image, &self.blob_spec);
        let prediction = self.model.forward(blob)?;

        let boxes = Self::postprocess(
            &prediction.view(),
            image.width(),
            image.height(),
            confidence_threshold,
        )?;

        tracing::debug!(
            "Detected {} faces above threshold {}",
            boxes.len(),
            confidence_threshold
        );
        Ok(boxes)
    }

    /// 后处理：解析 [1, 1, N, 7] 检测张量
    fn postprocess(
        prediction: &ArrayViewD<f32>,
        width: u32,
        height: u32,
        confidence_threshold: f32,
    ) -> Result<Vec<BoundingBox>> {
        let shape = prediction.shape();
        if shape.len() != 4 || shape[0] < 1 || shape[1] < 1 || shape[3] != DETECTION_FIELDS {
            return Err(AnnotateError::ModelUnavailable(format!(
                "Unsupported detection output shape: {:?}, expected [1, 1, N, 7]",
                shape
            )));
        }

        let max_x = width as i32 - 1;
        let max_y = height as i32 - 1;
        let mut boxes = Vec::new();

        for i in 0..shape[2] {
            let score = prediction[[0, 0, i, 2]];
            if !(score > confidence_threshold) {
                continue;
            }

            let scale = |v: f32, dim: u32| (v * dim as f32) as i32;
            let bbox = BoundingBox {
                x1: scale(prediction[[0, 0, i, 3]], width).clamp(0, max_x),
                y1: scale(prediction[[0, 0, i, 4]], height).clamp(0, max_y),
                x2: scale(prediction[[0, 0, i, 5]], width).clamp(0, max_x),
                y2: scale(prediction[[0, 0, i, 6]], height).clamp(0, max_y),
                score,
            };

            if bbox.x1 >= bbox.x2 || bbox.y1 >= bbox.y2 {
                tracing::debug!("Dropping degenerate detection {}: {:?}", i, bbox);
                continue;
            }

            boxes.push(bbox);
        }

        Ok(boxes)
    }
}
