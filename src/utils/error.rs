use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Invalid crop region: left={left}, top={top}, right={right}, bottom={bottom}")]
    InvalidCrop {
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
    },

    #[error("Label mismatch: model produced {actual} scores for {expected} labels")]
    LabelMismatch { expected: usize, actual: usize },

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Server busy: at most {0} concurrent requests")]
    ServerBusy(usize),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AnnotateError {
    /// 把推理运行时的任意错误归为模型不可用
    pub fn model<E: std::fmt::Display>(err: E) -> Self {
        AnnotateError::ModelUnavailable(err.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AnnotateError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AnnotateError::InvalidCrop { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AnnotateError::UnsupportedImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AnnotateError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            AnnotateError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AnnotateError::Base64(_) => StatusCode::BAD_REQUEST,
            AnnotateError::Json(_) => StatusCode::BAD_REQUEST,
            AnnotateError::ImageDecode(_) => StatusCode::BAD_REQUEST,
            AnnotateError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AnnotateError::ServerBusy(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AnnotateError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            AnnotateError::InvalidCrop { .. } => "INVALID_CROP",
            AnnotateError::LabelMismatch { .. } => "LABEL_MISMATCH",
            AnnotateError::UnsupportedImage(_) => "UNSUPPORTED_IMAGE",
            AnnotateError::InvalidInput(_) => "INVALID_INPUT",
            AnnotateError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            AnnotateError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            AnnotateError::Config(_) => "CONFIG_ERROR",
            AnnotateError::Io(_) => "IO_ERROR",
            AnnotateError::Json(_) => "JSON_ERROR",
            AnnotateError::Base64(_) => "BASE64_DECODE_ERROR",
            AnnotateError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            AnnotateError::ServerBusy(_) => "SERVER_BUSY",
            AnnotateError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AnnotateError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = serde_json::json!({
            "success": false,
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        tracing::error!("Request failed: {} ({})", self, status);

        (status, axum::Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_failures_have_distinct_codes() {
        let errors = [
            AnnotateError::ModelUnavailable("missing".into()),
            AnnotateError::InvalidCrop { left: 0, top: 0, right: 0, bottom: 0 },
            AnnotateError::LabelMismatch { expected: 2, actual: 8 },
            AnnotateError::UnsupportedImage("2 channels".into()),
        ];
        let codes: Vec<_> = errors.iter().map(|e| e.error_code()).collect();
        assert_eq!(
            codes,
            ["MODEL_UNAVAILABLE", "INVALID_CROP", "LABEL_MISMATCH", "UNSUPPORTED_IMAGE"]
        );
    }

    #[test]
    fn model_errors_map_to_service_unavailable() {
        let err = AnnotateError::model("session failed");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "Model unavailable: session failed");
    }
}
