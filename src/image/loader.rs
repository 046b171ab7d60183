use crate::utils::error::AnnotateError;
use crate::Result;
use base64::Engine;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use std::path::Path;

/// 上传文件大小上限
pub const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;

pub struct ImageLoader;

impl ImageLoader {
    /// 从base64字符串加载图像
    pub fn from_base64(base64_data: &str) -> Result<DynamicImage> {
        // 移除可能的数据URL前缀 (data:image/xxx;base64,)
        let base64_clean = match base64_data.strip_prefix("data:") {
            Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
            None => base64_data,
        };

        let image_bytes = base64::engine::general_purpose::STANDARD.decode(base64_clean.trim())?;

        Self::from_bytes(&image_bytes)
    }

    /// 从字节流加载图像
    pub fn from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AnnotateError::FileTooLarge(bytes.len(), MAX_IMAGE_BYTES));
        }

        if let Some(format) = Self::detect_format(bytes) {
            if !Self::is_supported_format(format) {
                return Err(AnnotateError::UnsupportedFormat(format!("{:?}", format)));
            }
        }

        Ok(image::load_from_memory(bytes)?)
    }

    /// 从文件路径加载图像
    pub fn from_path(path: &Path) -> Result<DynamicImage> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像格式是否支持
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(
            format,
            ImageFormat::Png
                | ImageFormat::Jpeg
                | ImageFormat::Bmp
                | ImageFormat::Tiff
                | ImageFormat::WebP
                | ImageFormat::Gif
        )
    }

    /// 验证图像尺寸
    pub fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();

        if width < 16 || height < 16 {
            return Err(AnnotateError::InvalidInput(format!(
                "Image too small: {}x{}, minimum 16x16",
                width, height
            )));
        }

        if width > 8192 || height > 8192 {
            return Err(AnnotateError::InvalidInput(format!(
                "Image too large: {}x{}, maximum 8192x8192",
                width, height
            )));
        }

        Ok(())
    }

    /// 统一为3通道：灰度复制到三个通道，RGBA丢弃alpha
    pub fn normalize(image: DynamicImage) -> Result<RgbImage> {
        match image.color().channel_count() {
            3 => Ok(image.into_rgb8()),
            1 | 4 => Ok(image.to_rgb8()),
            n => Err(AnnotateError::UnsupportedImage(format!(
                "Unsupported channel count {} ({:?}), expected 1, 3 or 4",
                n,
                image.color()
            ))),
        }
    }

    /// 对已解码的交错像素缓冲做同样的通道归一化
    pub fn normalize_buffer(width: u32, height: u32, channels: u8, data: &[u8]) -> Result<RgbImage> {
        if !matches!(channels, 1 | 3 | 4) {
            return Err(AnnotateError::UnsupportedImage(format!(
                "Unsupported channel count {}, expected 1, 3 or 4",
                channels
            )));
        }

        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(AnnotateError::UnsupportedImage(format!(
                "Pixel buffer has {} bytes, expected {} for {}x{}x{}",
                data.len(),
                expected,
                width,
                height,
                channels
            )));
        }

        let channels = channels as usize;
        let mut rgb = RgbImage::new(width, height);
        for (pixel, chunk) in rgb.pixels_mut().zip(data.chunks_exact(channels)) {
            *pixel = match channels {
                1 => Rgb([chunk[0], chunk[0], chunk[0]]),
                _ => Rgb([chunk[0], chunk[1], chunk[2]]),
            };
        }

        Ok(rgb)
    }

    /// 解码后的完整入口：校验尺寸并归一化通道
    pub fn prepare(image: DynamicImage) -> Result<RgbImage> {
        Self::validate_dimensions(&image)?;
        Self::normalize(image)
    }
}
