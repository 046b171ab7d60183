use image::{imageops::FilterType, RgbImage};
use ndarray::Array4;

/// 人脸检测器输入尺寸
pub const DETECTOR_INPUT_SIZE: (u32, u32) = (300, 300);

/// 人脸检测器均值（按输出通道顺序）
pub const DETECTOR_MEAN: [f32; 3] = [104.0, 117.0, 123.0];

/// 年龄/性别分类器输入尺寸
pub const CLASSIFIER_INPUT_SIZE: (u32, u32) = (227, 227);

/// 年龄/性别分类器共用的均值
pub const CLASSIFIER_MEAN: [f32; 3] = [78.4263377603, 87.7689143744, 114.895847746];

/// blob 构造参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlobSpec {
    /// (width, height)
    pub size: (u32, u32),
    pub mean: [f32; 3],
    pub scale: f32,
    /// 交换第一和第三通道 (RGB <-> BGR)
    pub swap_rb: bool,
}

impl BlobSpec {
    pub const fn detector() -> Self {
        Self {
            size: DETECTOR_INPUT_SIZE,
            mean: DETECTOR_MEAN,
            scale: 1.0,
            swap_rb: true,
        }
    }

    pub const fn classifier() -> Self {
        Self {
            size: CLASSIFIER_INPUT_SIZE,
            mean: CLASSIFIER_MEAN,
            scale: 1.0,
            swap_rb: false,
        }
    }
}

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// 把 RGB 图像转换为 1xCxHxW 的 blob：直接缩放（不保持宽高比），减均值，乘比例
    pub fn blob_from_image(image: &RgbImage, spec: &BlobSpec) -> Array4<f32> {
        let (target_w, target_h) = spec.size;

        let resized;
        let source = if image.dimensions() == spec.size {
            image
        } else {
            resized = image::imageops::resize(image, target_w, target_h, FilterType::Triangle);
            &resized
        };

        let mut blob = Array4::<f32>::zeros((1, 3, target_h as usize, target_w as usize));

        for (x, y, pixel) in source.enumerate_pixels() {
            for c in 0..3 {
                let src_c = if spec.swap_rb { 2 - c } else { c };
                blob[[0, c, y as usize, x as usize]] =
                    (pixel[src_c] as f32 - spec.mean[c]) * spec.scale;
            }
        }

        blob
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn classifier_blob_has_fixed_shape_and_subtracts_mean() {
        let image = RgbImage::from_pixel(40, 60, Rgb([100, 100, 100]));
        let blob = ImagePreprocessor::blob_from_image(&image, &BlobSpec::classifier());

        assert_eq!(blob.shape(), &[1, 3, 227, 227]);
        let expected = 100.0 - CLASSIFIER_MEAN[2];
        assert!((blob[[0, 2, 100, 100]] - expected).abs() < 1e-3);
    }

    #[test]
    fn detector_blob_swaps_red_and_blue() {
        let image = RgbImage::from_pixel(300, 300, Rgb([200, 150, 50]));
        let blob = ImagePreprocessor::blob_from_image(&image, &BlobSpec::detector());

        assert_eq!(blob.shape(), &[1, 3, 300, 300]);
        // 通道0取自蓝色
        assert_eq!(blob[[0, 0, 0, 0]], 50.0 - 104.0);
        assert_eq!(blob[[0, 1, 0, 0]], 150.0 - 117.0);
        assert_eq!(blob[[0, 2, 0, 0]], 200.0 - 123.0);
    }
}
