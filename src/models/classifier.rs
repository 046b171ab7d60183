use crate::annotation::{ClassificationResult, Crop, AGE_LABELS, GENDER_LABELS};
use crate::image::preprocessing::{BlobSpec, ImagePreprocessor, CLASSIFIER_MEAN};
use crate::models::session::InferenceModel;
use crate::utils::error::AnnotateError;
use crate::Result;
use std::sync::Arc;

/// 人脸属性分类器（年龄、性别共用同一套预处理）
pub struct Classifier {
    model: Arc<dyn InferenceModel>,
    labels: Vec<String>,
    blob_spec: BlobSpec,
}

impl Classifier {
    pub fn new(model: Arc<dyn InferenceModel>, labels: &[&str], mean_values: [f32; 3]) -> Self {
        Self {
            model,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            blob_spec: BlobSpec {
                mean: mean_values,
                ..BlobSpec::classifier()
            },
        }
    }

    pub fn gender(model: Arc<dyn InferenceModel>) -> Self {
        Self::new(model, &GENDER_LABELS, CLASSIFIER_MEAN)
    }

    pub fn age(model: Arc<dyn InferenceModel>) -> Self {
        Self::new(model, &AGE_LABELS, CLASSIFIER_MEAN)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// 对单个人脸裁剪做分类
    pub fn classify(&self, crop: &Crop) -> Result<ClassificationResult> {
        if crop.is_empty() {
            let region = crop.region;
            return Err(AnnotateError::InvalidCrop {
                left: region.left,
                top: region.top,
                right: region.right,
                bottom: region.bottom,
            });
        }

        let blob = ImagePreprocessor::blob_from_image(&crop.pixels, &self.blob_spec);
        let predictions = self.model.forward(blob)?;

        let probabilities: Vec<f32> = predictions.iter().copied().collect();
        Self::select_label(&self.labels, &probabilities)
    }

    /// 取最大概率的类别，概率相同时取最前面的
    pub fn select_label(labels: &[String], probabilities: &[f32]) -> Result<ClassificationResult> {
        if probabilities.len() != labels.len() || labels.is_empty() {
            return Err(AnnotateError::LabelMismatch {
                expected: labels.len(),
                actual: probabilities.len(),
            });
        }

        let mut max_idx = 0;
        let mut max_prob = probabilities[0];
        for (i, &prob) in probabilities.iter().enumerate().skip(1) {
            if prob > max_prob || (max_prob.is_nan() && !prob.is_nan()) {
                max_prob = prob;
                max_idx = i;
            }
        }

        Ok(ClassificationResult {
            label: labels[max_idx].clone(),
            confidence: max_prob * 100.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::CropRegion;
    use image::RgbImage;
    use ndarray::{Array4, ArrayD, IxDyn};

    struct FixedScores(Vec<f32>);

    impl InferenceModel for FixedScores {
        fn name(&self) -> &str {
            "fixed"
        }

        fn forward(&self, input: Array4<f32>) -> Result<ArrayD<f32>> {
            assert_eq!(input.shape(), &[1, 3, 227, 227]);
            Ok(ArrayD::from_shape_vec(IxDyn(&[1, self.0.len()]), self.0.clone()).unwrap())
        }
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn crop(width: u32, height: u32) -> Crop {
        Crop {
            region: CropRegion {
                left: 0,
                top: 0,
                right: width as i32,
                bottom: height as i32,
            },
            pixels: RgbImage::new(width, height),
        }
    }

    #[test]
    fn argmax_reports_percentage() {
        let result = Classifier::select_label(&labels(&["a", "b", "c"]), &[0.1, 0.7, 0.2]).unwrap();
        assert_eq!(result.label, "b");
        assert!((result.confidence - 70.0).abs() < 1e-3);
        assert_eq!(format!("{:.2}", result.confidence), "70.00");
    }

    #[test]
    fn ties_keep_first_index() {
        let result = Classifier::select_label(&labels(&["a", "b", "c"]), &[0.4, 0.4, 0.2]).unwrap();
        assert_eq!(result.label, "a");
    }

    #[test]
    fn nan_never_wins() {
        let result =
            Classifier::select_label(&labels(&["a", "b"]), &[f32::NAN, 0.3]).unwrap();
        assert_eq!(result.label, "b");
    }

    #[test]
    fn shape_mismatch_is_label_mismatch() {
        let classifier = Classifier::gender(Arc::new(FixedScores(vec![0.1; 8])));
        match classifier.classify(&crop(10, 10)) {
            Err(AnnotateError::LabelMismatch { expected, actual }) => {
                assert_eq!((expected, actual), (2, 8));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_crop_is_invalid() {
        let classifier = Classifier::age(Arc::new(FixedScores(vec![0.125; 8])));
        let empty = Crop {
            region: CropRegion { left: 4, top: 0, right: 4, bottom: 4 },
            pixels: RgbImage::new(0, 0),
        };
        assert!(matches!(
            classifier.classify(&empty),
            Err(AnnotateError::InvalidCrop { left: 4, right: 4, .. })
        ));
    }

    #[test]
    fn classifies_age_bracket() {
        let mut scores = vec![0.01; 8];
        scores[4] = 0.93;
        let classifier = Classifier::age(Arc::new(FixedScores(scores)));

        let result = classifier.classify(&crop(30, 40)).unwrap();
        assert_eq!(result.label, "~25-30");
        assert!((result.confidence - 93.0).abs() < 1e-3);
    }
}
