use crate::annotation::{AnnotationResult, FaceAnnotation};
use crate::Result;
use base64::Engine;
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::Duration;

/// 完整的标注结果（可序列化）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationReport {
    /// 处理耗时（秒）
    pub processing_time: f32,
    /// 检测到的人脸数量
    pub face_count: usize,
    /// 每张人脸的结果，按检测顺序
    pub faces: Vec<FaceAnnotation>,
    /// 标注后的 PNG 图像（base64）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// 模型信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
}

/// 模型信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub detector: String,
    pub gender_classifier: String,
    pub age_classifier: String,
}

/// 结果格式化器
pub struct ResultFormatter;

impl ResultFormatter {
    pub fn build_report(
        result: &AnnotationResult,
        elapsed: Duration,
        include_image: bool,
        model_info: Option<ModelInfo>,
    ) -> Result<AnnotationReport> {
        let image = if include_image {
            Some(Self::encode_base64_png(&result.image)?)
        } else {
            None
        };

        Ok(AnnotationReport {
            processing_time: elapsed.as_secs_f32(),
            face_count: result.faces.len(),
            faces: result.faces.clone(),
            image,
            model_info,
        })
    }

    /// 编码为 PNG 字节
    pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }

    pub fn encode_base64_png(image: &RgbImage) -> Result<String> {
        let png = Self::encode_png(image)?;
        Ok(base64::engine::general_purpose::STANDARD.encode(png))
    }

    /// 格式化为纯文本输出
    pub fn format_plain_text(faces: &[FaceAnnotation]) -> String {
        if faces.is_empty() {
            return "No face detected".to_string();
        }

        faces
            .iter()
            .map(|face| {
                format!(
                    "Gender: {}  Confidence: {:.2}%\nAge: {}  Confidence: {:.2}%",
                    face.gender.label, face.gender.confidence, face.age.label, face.age.confidence
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 格式化为CSV格式
    pub fn format_csv(faces: &[FaceAnnotation]) -> String {
        let mut csv =
            String::from("index,x1,y1,x2,y2,gender,gender_confidence,age,age_confidence\n");

        for (i, face) in faces.iter().enumerate() {
            let bbox = &face.bounding_box;
            csv.push_str(&format!(
                "{},{},{},{},{},\"{}\",{:.2},\"{}\",{:.2}\n",
                i,
                bbox.x1,
                bbox.y1,
                bbox.x2,
                bbox.y2,
                face.gender.label.replace('"', "\"\""),
                face.gender.confidence,
                face.age.label.replace('"', "\"\""),
                face.age.confidence
            ));
        }

        csv
    }

    pub fn format_json(report: &AnnotationReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}
