use crate::utils::error::AnnotateError;
use crate::Result;
use std::path::PathBuf;

/// 默认人脸检测置信度阈值
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// 人脸框四周的默认裁剪边距（像素）
pub const DEFAULT_PADDING: u32 = 20;

/// 标签文字默认像素高度
pub const DEFAULT_LABEL_SCALE: f32 = 24.0;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件目录
    pub models_dir: PathBuf,

    /// 工作线程数量
    pub workers: usize,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,

    /// 标注流水线配置
    pub pipeline_config: PipelineConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,

    /// 最大并发请求数
    pub max_connections: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 检测置信度阈值，取值 (0, 1]
    pub confidence_threshold: f32,

    /// 裁剪边距（像素）
    pub padding: u32,

    /// 标签字体文件，未设置时尝试系统字体
    pub font_path: Option<PathBuf>,

    /// 标签文字像素高度
    pub label_scale: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            padding: DEFAULT_PADDING,
            font_path: None,
            label_scale: DEFAULT_LABEL_SCALE,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.confidence_threshold)
            .map_err(|e| AnnotateError::Config(e.to_string()))?;

        if !(self.label_scale > 0.0) {
            return Err(AnnotateError::Config(format!(
                "Label scale must be positive, got {}",
                self.label_scale
            )));
        }

        Ok(())
    }
}

/// 阈值必须落在 (0, 1]
pub fn validate_threshold(threshold: f32) -> Result<()> {
    if threshold > 0.0 && threshold <= 1.0 {
        Ok(())
    } else {
        Err(AnnotateError::InvalidInput(format!(
            "Confidence threshold must be in (0, 1], got {}",
            threshold
        )))
    }
}

impl Config {
    pub fn new(
        bind_addr: String,
        models_dir: String,
        workers: Option<usize>,
        dev_mode: bool,
        pipeline_config: PipelineConfig,
    ) -> Result<Self> {
        pipeline_config.validate()?;

        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores);
        if workers == 0 {
            return Err(AnnotateError::Config(
                "Worker count must be at least 1".to_string(),
            ));
        }

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_request_size: 50 * 1024 * 1024, // 50MB
            max_connections: if dev_mode { 10 } else { 1000 },
        };

        Ok(Self {
            bind_addr,
            models_dir: PathBuf::from(models_dir),
            workers,
            dev_mode,
            onnx_config,
            server_config,
            pipeline_config,
        })
    }

    /// 获取人脸检测模型路径
    pub fn face_model_path(&self) -> PathBuf {
        self.models_dir.join("face/opencv_face_detector.onnx")
    }

    /// 获取年龄分类模型路径
    pub fn age_model_path(&self) -> PathBuf {
        self.models_dir.join("age/age_net.onnx")
    }

    /// 获取性别分类模型路径
    pub fn gender_model_path(&self) -> PathBuf {
        self.models_dir.join("gender/gender_net.onnx")
    }
}
