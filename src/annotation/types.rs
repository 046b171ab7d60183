use image::RgbImage;
use serde::{Deserialize, Serialize};

/// 性别标签，顺序与模型输出一致
pub const GENDER_LABELS: [&str; 2] = ["Male", "Female"];

/// 年龄段标签，顺序与模型输出一致
pub const AGE_LABELS: [&str; 8] = [
    "~1-2", "~3-5", "~6-14", "~16-22", "~25-30", "~32-40", "~45-50", "Above 60",
];

/// 人脸框（像素坐标，x1<x2, y1<y2）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    /// 检测器给出的置信度 (0.0 - 1.0)
    pub score: f32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2, score: 1.0 }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// 是否为合法框并完全位于 width x height 图像内
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.x1 >= 0
            && self.y1 >= 0
            && self.x1 < self.x2
            && self.y1 < self.y2
            && (self.x2 as i64) < width as i64
            && (self.y2 as i64) < height as i64
    }
}

/// 裁剪区域，右/下边界不包含
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRegion {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl CropRegion {
    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// 从原图裁出的人脸区域，仅在一次标注调用内存在
#[derive(Debug, Clone)]
pub struct Crop {
    pub region: CropRegion,
    pub pixels: RgbImage,
}

impl Crop {
    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }
}

/// 单个分类器的预测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    /// 百分比置信度 [0, 100]
    pub confidence: f32,
}

/// 一张人脸的完整标注
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceAnnotation {
    pub bounding_box: BoundingBox,
    pub gender: ClassificationResult,
    pub age: ClassificationResult,
}

impl FaceAnnotation {
    /// 绘制在框上方的文字，形如 "Male,~25-30"
    pub fn label(&self) -> String {
        format!("{},{}", self.gender.label, self.age.label)
    }
}

/// 标注流水线输出：绘制后的图像和按检测顺序排列的结果
#[derive(Debug, Clone)]
pub struct AnnotationResult {
    pub image: RgbImage,
    pub faces: Vec<FaceAnnotation>,
}

impl AnnotationResult {
    /// 未检测到人脸：原图原样返回
    pub fn empty(image: RgbImage) -> Self {
        Self { image, faces: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

/// 单次请求可覆盖的选项
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotateOptions {
    /// 覆盖默认检测阈值
    #[serde(default)]
    pub confidence_threshold: Option<f32>,

    /// 是否在响应中附带标注后的图像
    #[serde(default)]
    pub include_image: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_bounds_check() {
        assert!(BoundingBox::new(0, 0, 99, 99).is_within(100, 100));
        assert!(!BoundingBox::new(0, 0, 100, 50).is_within(100, 100));
        assert!(!BoundingBox::new(10, 10, 10, 20).is_within(100, 100));
        assert!(!BoundingBox::new(-1, 0, 10, 10).is_within(100, 100));
    }

    #[test]
    fn label_joins_gender_and_age() {
        let face = FaceAnnotation {
            bounding_box: BoundingBox::new(1, 2, 3, 4),
            gender: ClassificationResult { label: "Female".into(), confidence: 90.0 },
            age: ClassificationResult { label: "~25-30".into(), confidence: 55.0 },
        };
        assert_eq!(face.label(), "Female,~25-30");
    }

    #[test]
    fn collapsed_region_is_empty() {
        let region = CropRegion { left: 10, top: 0, right: 4, bottom: 4 };
        assert!(region.is_empty());
        assert_eq!(region.width(), 0);
    }
}
