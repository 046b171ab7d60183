use crate::annotation::{BoundingBox, Crop, CropRegion};
use image::RgbImage;

/// 图像变换工具集
pub struct ImageTransforms;

impl ImageTransforms {
    /// 计算加边距并裁剪到图像范围内的区域
    ///
    /// 右/下边界最多到 `width - 1` / `height - 1`，区域为 `[left, right) x [top, bottom)`。
    pub fn padded_region(width: u32, height: u32, bbox: &BoundingBox, padding: u32) -> CropRegion {
        let padding = padding.min(i32::MAX as u32) as i32;
        let max_x = (width as i64 - 1).clamp(0, i32::MAX as i64) as i32;
        let max_y = (height as i64 - 1).clamp(0, i32::MAX as i64) as i32;

        CropRegion {
            left: bbox.x1.saturating_sub(padding).max(0),
            top: bbox.y1.saturating_sub(padding).max(0),
            right: bbox.x2.saturating_add(padding).min(max_x),
            bottom: bbox.y2.saturating_add(padding).min(max_y),
        }
    }

    /// 裁剪人脸区域，区域退化时返回空 Crop
    pub fn crop_face(image: &RgbImage, bbox: &BoundingBox, padding: u32) -> Crop {
        let region = Self::padded_region(image.width(), image.height(), bbox, padding);

        let pixels = if region.is_empty() {
            RgbImage::new(0, 0)
        } else {
            image::imageops::crop_imm(
                image,
                region.left as u32,
                region.top as u32,
                region.width(),
                region.height(),
            )
            .to_image()
        };

        Crop { region, pixels }
    }
}
