use crate::config::OnnxConfig;
use crate::utils::error::AnnotateError;
use crate::Result;
use ndarray::{Array4, ArrayD};
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// 推理后端：输入 NCHW blob，输出原始张量
///
/// 调用是 (模型, 输入) 的纯函数，实现方需要自己保证并发安全。
pub trait InferenceModel: Send + Sync {
    fn name(&self) -> &str;

    fn forward(&self, input: Array4<f32>) -> Result<ArrayD<f32>>;
}

/// 基于 ONNX Runtime 的模型句柄
pub struct OnnxModel {
    name: String,
    session: Arc<Mutex<Session>>,
    input_name: String,  // 动态发现的输入名称
    output_name: String, // 动态发现的输出名称
}

impl OnnxModel {
    pub fn load(name: &str, model_path: &Path, onnx_config: &OnnxConfig) -> Result<Self> {
        if !model_path.exists() {
            return Err(AnnotateError::ModelUnavailable(format!(
                "{} model not found: {}",
                name,
                model_path.display()
            )));
        }

        tracing::info!("Loading {} model from: {}", name, model_path.display());

        let session = Session::builder()
            .map_err(AnnotateError::model)?
            .with_optimization_level(optimization_level(onnx_config.optimization_level))
            .map_err(AnnotateError::model)?
            .with_intra_threads(onnx_config.intra_threads)
            .map_err(AnnotateError::model)?
            .commit_from_file(model_path)
            .map_err(AnnotateError::model)?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(AnnotateError::ModelUnavailable(format!(
                    "{} model has no inputs",
                    name
                )))
            }
        };

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(AnnotateError::ModelUnavailable(format!(
                    "{} model has no outputs",
                    name
                )))
            }
        };

        tracing::info!(
            "{} model io: input='{}', output='{}'",
            name,
            input_name,
            output_name
        );
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("{} output[{}]: '{}'", name, i, output.name);
        }

        Ok(Self {
            name: name.to_string(),
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_name,
        })
    }
}

impl InferenceModel for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: Array4<f32>) -> Result<ArrayD<f32>> {
        let input_tensor = Tensor::from_array(input).map_err(AnnotateError::model)?;

        // 每个会话同一时刻只跑一次前向推理，锁内提取数据避免生命周期冲突
        let prediction = {
            let mut session = self.session.lock();
            let outputs = session
                .run(inputs![self.input_name.as_str() => input_tensor])
                .map_err(AnnotateError::model)?;

            let output = match outputs.get(self.output_name.as_str()) {
                Some(output) => output,
                None => {
                    return Err(AnnotateError::ModelUnavailable(format!(
                        "{} output '{}' not found",
                        self.name, self.output_name
                    )))
                }
            };
            let array = output
                .try_extract_array::<f32>()
                .map_err(AnnotateError::model)?
                .into_owned();
            array
        };

        Ok(prediction)
    }
}

fn optimization_level(level: i32) -> GraphOptimizationLevel {
    match level {
        i32::MIN..=0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}
