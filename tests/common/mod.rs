#![allow(dead_code)]

use ndarray::{Array4, ArrayD, IxDyn};
use onnx_age_gender::{
    annotation::AnnotationPipeline,
    config::PipelineConfig,
    image::Annotator,
    models::{Classifier, FaceDetector, InferenceModel},
    AnnotateError, Result,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 返回固定输出的内存模型，记录调用次数
pub struct StubModel {
    name: String,
    output: Option<ArrayD<f32>>,
    calls: AtomicUsize,
}

impl StubModel {
    pub fn detections(rows: &[[f32; 7]]) -> Arc<Self> {
        let data: Vec<f32> = rows.iter().flatten().copied().collect();
        let output = ArrayD::from_shape_vec(IxDyn(&[1, 1, rows.len(), 7]), data).unwrap();
        Arc::new(Self::new("stub-face", Some(output)))
    }

    pub fn scores(name: &str, scores: &[f32]) -> Arc<Self> {
        let output = ArrayD::from_shape_vec(IxDyn(&[1, scores.len()]), scores.to_vec()).unwrap();
        Arc::new(Self::new(name, Some(output)))
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self::new(name, None))
    }

    fn new(name: &str, output: Option<ArrayD<f32>>) -> Self {
        Self {
            name: name.to_string(),
            output,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InferenceModel for StubModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, _input: Array4<f32>) -> Result<ArrayD<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.output
            .clone()
            .ok_or_else(|| AnnotateError::ModelUnavailable(format!("{} is offline", self.name)))
    }
}

/// 性别: Female 0.8；年龄: ~25-30 0.6
pub fn gender_scores() -> Arc<StubModel> {
    StubModel::scores("stub-gender", &[0.2, 0.8])
}

pub fn age_scores() -> Arc<StubModel> {
    StubModel::scores(
        "stub-age",
        &[0.05, 0.05, 0.05, 0.05, 0.6, 0.1, 0.05, 0.05],
    )
}

pub fn pipeline(
    face: Arc<StubModel>,
    gender: Arc<StubModel>,
    age: Arc<StubModel>,
) -> AnnotationPipeline {
    AnnotationPipeline::new(
        Arc::new(FaceDetector::new(face)),
        Arc::new(Classifier::gender(gender)),
        Arc::new(Classifier::age(age)),
        Annotator::new(None, 24.0),
        &PipelineConfig::default(),
    )
    .unwrap()
}
