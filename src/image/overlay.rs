use crate::annotation::FaceAnnotation;
use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};

/// 人脸框颜色
pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// 标签文字颜色
pub const TEXT_COLOR: Rgb<u8> = Rgb([0, 255, 255]);

/// 标签基线距框顶的距离
const LABEL_OFFSET: i32 = 10;

const SYSTEM_FONTS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
];

/// 在图像上绘制人脸框和标签
pub struct Annotator {
    font: Option<FontVec>,
    label_scale: f32,
}

impl Annotator {
    pub fn new(font: Option<FontVec>, label_scale: f32) -> Self {
        Self { font, label_scale }
    }

    /// 加载配置的字体，找不到时退回系统字体；都不可用时只画框
    pub fn load(font_path: Option<&Path>, label_scale: f32) -> Self {
        let candidates: Vec<PathBuf> = font_path
            .map(Path::to_path_buf)
            .into_iter()
            .chain(SYSTEM_FONTS.iter().map(|p| PathBuf::from(*p)))
            .collect();

        let font = candidates.iter().find_map(|path| {
            let bytes = match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    if Some(path.as_path()) == font_path {
                        tracing::warn!("Cannot read font {}: {}, trying system fonts", path.display(), e);
                    }
                    return None;
                }
            };
            match FontVec::try_from_vec(bytes) {
                Ok(font) => {
                    tracing::info!("Loaded label font from: {}", path.display());
                    Some(font)
                }
                Err(e) => {
                    tracing::warn!("Invalid font file {}: {}", path.display(), e);
                    None
                }
            }
        });

        if font.is_none() {
            tracing::warn!("No label font available, drawing face boxes without text");
        }

        Self::new(font, label_scale)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// 框线宽随图像高度变化
    pub fn line_thickness(image_height: u32) -> u32 {
        ((image_height as f32 / 150.0).round() as u32).max(1)
    }

    /// 在同一张图上叠加绘制一张人脸的框和 "{gender},{age}" 标签
    pub fn draw_face(&self, image: &mut RgbImage, face: &FaceAnnotation) {
        let bbox = &face.bounding_box;
        let thickness = Self::line_thickness(image.height()) as i32;

        for inset in 0..thickness {
            let width = bbox.width() - 2 * inset;
            let height = bbox.height() - 2 * inset;
            if width <= 0 || height <= 0 {
                break;
            }
            let rect = Rect::at(bbox.x1 + inset, bbox.y1 + inset).of_size(width as u32, height as u32);
            draw_hollow_rect_mut(image, rect, BOX_COLOR);
        }

        if let Some(font) = &self.font {
            // 基线在 y1 - 10，draw_text_mut 的 y 是文字顶部
            let top = bbox.y1 - LABEL_OFFSET - self.label_scale.round() as i32;
            draw_text_mut(
                image,
                TEXT_COLOR,
                bbox.x1,
                top,
                PxScale::from(self.label_scale),
                font,
                &face.label(),
            );
        }
    }
}
