use crate::{
    annotation::AnnotateOptions,
    image::{AnnotationReport, ImageLoader, ResultFormatter},
    utils::error::AnnotateError,
    web::{
        extractors::{RequestId, ValidatedJson},
        AppState,
    },
    Result,
};
use axum::{
    extract::{multipart::Field, Multipart, State},
    response::Json,
};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// JSON请求体（base64模式）
#[derive(Debug, Deserialize)]
pub struct AnnotateJsonRequest {
    /// Base64编码的图像数据
    pub image: String,

    /// 覆盖默认检测阈值
    #[serde(default)]
    pub confidence_threshold: Option<f32>,

    /// 是否返回标注后的图像
    #[serde(default)]
    pub include_image: Option<bool>,
}

/// JSON响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub timestamp: String,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }
}

/// JSON base64上传处理器
pub async fn annotate_json_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<AnnotateJsonRequest>,
) -> Result<Json<ApiResponse<AnnotationReport>>> {
    tracing::info!(
        "Processing JSON annotate request: request_id={}, threshold={:?}",
        request_id,
        request.confidence_threshold
    );

    let options = AnnotateOptions {
        confidence_threshold: request.confidence_threshold,
        include_image: request.include_image,
    };
    let encoded = request.image;

    let report = run_pipeline(&state, options, move || ImageLoader::from_base64(&encoded)).await?;

    tracing::info!(
        "JSON annotate completed: request_id={}, faces={}, time={:.3}s",
        request_id,
        report.face_count,
        report.processing_time
    );

    Ok(Json(ApiResponse::success(report, request_id)))
}

/// Multipart文件上传处理器
pub async fn annotate_upload_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<AnnotationReport>>> {
    tracing::info!("Processing multipart annotate request: request_id={}", request_id);

    let mut image_data: Option<axum::body::Bytes> = None;
    let mut options = AnnotateOptions::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AnnotateError::InvalidInput(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or("unknown").to_string();

        match field_name.as_str() {
            "file" => {
                if let Some(content_type) = field.content_type() {
                    if !content_type.starts_with("image/") {
                        return Err(AnnotateError::UnsupportedFormat(content_type.to_string()));
                    }
                }

                let data = field.bytes().await.map_err(|e| {
                    AnnotateError::InvalidInput(format!("Failed to read file data: {}", e))
                })?;

                if data.is_empty() {
                    return Err(AnnotateError::InvalidInput("Empty file".to_string()));
                }

                tracing::debug!("Received file: {} bytes", data.len());
                image_data = Some(data);
            }
            "confidence_threshold" => {
                let value = read_text(field).await?;
                if !value.trim().is_empty() {
                    let threshold = value.trim().parse::<f32>().map_err(|_| {
                        AnnotateError::InvalidInput(format!(
                            "Invalid confidence_threshold: {}",
                            value
                        ))
                    })?;
                    options.confidence_threshold = Some(threshold);
                }
            }
            "include_image" => {
                let value = read_text(field).await?;
                options.include_image = Some(parse_flag(&value).ok_or_else(|| {
                    AnnotateError::InvalidInput(format!("Invalid include_image: {}", value))
                })?);
            }
            _ => {
                tracing::debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let image_data =
        image_data.ok_or_else(|| AnnotateError::InvalidInput("No image file provided".to_string()))?;

    let report = run_pipeline(&state, options, move || ImageLoader::from_bytes(&image_data)).await?;

    tracing::info!(
        "Upload annotate completed: request_id={}, faces={}, time={:.3}s",
        request_id,
        report.face_count,
        report.processing_time
    );

    Ok(Json(ApiResponse::success(report, request_id)))
}

async fn read_text(field: Field<'_>) -> Result<String> {
    let name = field.name().unwrap_or("unknown").to_string();
    field
        .text()
        .await
        .map_err(|e| AnnotateError::InvalidInput(format!("Failed to read field {}: {}", name, e)))
}

/// 表单布尔值：true/false/1/0，其余视为非法
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// 解码和推理都在阻塞线程池上运行，避免占用异步工作线程
async fn run_pipeline<F>(
    state: &AppState,
    options: AnnotateOptions,
    decode: F,
) -> Result<AnnotationReport>
where
    F: FnOnce() -> Result<DynamicImage> + Send + 'static,
{
    let pipeline = state.pipeline.clone();
    let threshold = options
        .confidence_threshold
        .unwrap_or_else(|| pipeline.confidence_threshold());
    let include_image = options.include_image.unwrap_or(true);

    tokio::task::spawn_blocking(move || {
        let start_time = Instant::now();
        let rgb = ImageLoader::prepare(decode()?)?;
        let result = pipeline.annotate_with_threshold(&rgb, threshold)?;

        ResultFormatter::build_report(
            &result,
            start_time.elapsed(),
            include_image,
            Some(pipeline.model_info()),
        )
    })
    .await
    .map_err(|e| AnnotateError::Internal(format!("Annotation task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_flags_are_strict() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("FALSE"), Some(false));
        assert_eq!(parse_flag("no"), None);
        assert_eq!(parse_flag(""), None);
    }
}
