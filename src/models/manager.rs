use crate::models::{Classifier, FaceDetector, InferenceModel, OnnxModel};
use crate::Config;
use crate::Result;
use std::sync::Arc;

/// 模型管理器：启动时加载一次三个模型，之后只读共享
pub struct ModelManager {
    detector: Arc<FaceDetector>,
    gender: Arc<Classifier>,
    age: Arc<Classifier>,
    config: Config,
}

impl ModelManager {
    /// 从模型目录加载全部模型，任一失败即返回 ModelUnavailable
    pub fn load(config: Config) -> Result<Self> {
        tracing::info!("Initializing model manager...");

        let onnx = &config.onnx_config;
        let face_model = OnnxModel::load("face", &config.face_model_path(), onnx)?;
        let gender_model = OnnxModel::load("gender", &config.gender_model_path(), onnx)?;
        let age_model = OnnxModel::load("age", &config.age_model_path(), onnx)?;

        let manager = Self::from_models(
            Arc::new(face_model),
            Arc::new(gender_model),
            Arc::new(age_model),
            config,
        );

        tracing::info!("Model manager initialized successfully");
        Ok(manager)
    }

    /// 用任意推理后端组装（测试中使用内存模型）
    pub fn from_models(
        face_model: Arc<dyn InferenceModel>,
        gender_model: Arc<dyn InferenceModel>,
        age_model: Arc<dyn InferenceModel>,
        config: Config,
    ) -> Self {
        Self {
            detector: Arc::new(FaceDetector::new(face_model)),
            gender: Arc::new(Classifier::gender(gender_model)),
            age: Arc::new(Classifier::age(age_model)),
            config,
        }
    }

    pub fn detector(&self) -> Arc<FaceDetector> {
        Arc::clone(&self.detector)
    }

    pub fn gender_classifier(&self) -> Arc<Classifier> {
        Arc::clone(&self.gender)
    }

    pub fn age_classifier(&self) -> Arc<Classifier> {
        Arc::clone(&self.age)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 获取模型统计信息
    pub fn stats(&self) -> ModelStats {
        ModelStats {
            detector: self.detector.model_name().to_string(),
            gender_classifier: self.gender.model_name().to_string(),
            age_classifier: self.age.model_name().to_string(),
            gender_labels: self.gender.labels().to_vec(),
            age_labels: self.age.labels().to_vec(),
            intra_threads: self.config.onnx_config.intra_threads,
            optimization_level: self.config.onnx_config.optimization_level,
            confidence_threshold: self.config.pipeline_config.confidence_threshold,
            padding: self.config.pipeline_config.padding,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub detector: String,
    pub gender_classifier: String,
    pub age_classifier: String,
    pub gender_labels: Vec<String>,
    pub age_labels: Vec<String>,
    pub intra_threads: usize,
    pub optimization_level: i32,
    pub confidence_threshold: f32,
    pub padding: u32,
}
