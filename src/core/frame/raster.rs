//! 光栅解码能力接口
//!
//! 相似度计算和稳定门只依赖 [`RasterBackend`]，默认实现 [`ImageBackend`]
//! 基于 `image` crate，可替换为其他图像后端。

use super::error::FrameError;
use super::snapshot::{luma, FrameSnapshot};
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};

pub trait RasterBackend: Send + Sync {
    /// 将编码后的图像（PNG/JPEG/BMP 等）解码为 RGB 快照，丢弃 alpha
    fn decode(&self, bytes: &[u8]) -> Result<FrameSnapshot, FrameError>;

    /// 重采样到指定尺寸，保持通道数不变
    fn resize(
        &self,
        frame: &FrameSnapshot,
        width: u32,
        height: u32,
    ) -> Result<FrameSnapshot, FrameError>;

    /// 转为单通道亮度图
    fn to_grayscale(&self, frame: &FrameSnapshot) -> Result<FrameSnapshot, FrameError>;
}

#[derive(Debug, Clone, Copy)]
pub struct ImageBackend {
    filter: FilterType,
}

impl ImageBackend {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }
}

impl Default for ImageBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterBackend for ImageBackend {
    fn decode(&self, bytes: &[u8]) -> Result<FrameSnapshot, FrameError> {
        if bytes.is_empty() {
            return Err(FrameError::EmptyBuffer);
        }

        let rgb = image::load_from_memory(bytes)?.into_rgb8();
        let (width, height) = rgb.dimensions();
        FrameSnapshot::new(width, height, FrameSnapshot::RGB, rgb.into_raw())
    }

    fn resize(
        &self,
        frame: &FrameSnapshot,
        width: u32,
        height: u32,
    ) -> Result<FrameSnapshot, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::InvalidDimensions { width, height });
        }
        if frame.dimensions() == (width, height) {
            return Ok(frame.clone());
        }

        let (src_w, src_h) = frame.dimensions();
        let size_error = || FrameError::BufferSize {
            expected: frame.pixel_count() * frame.channels() as usize,
            got: frame.pixels().len(),
        };

        let pixels = match frame.channels() {
            FrameSnapshot::RGB => {
                let img = RgbImage::from_raw(src_w, src_h, frame.pixels().to_vec())
                    .ok_or_else(size_error)?;
                imageops::resize(&img, width, height, self.filter).into_raw()
            }
            FrameSnapshot::LUMA => {
                let img = GrayImage::from_raw(src_w, src_h, frame.pixels().to_vec())
                    .ok_or_else(size_error)?;
                imageops::resize(&img, width, height, self.filter).into_raw()
            }
            other => return Err(FrameError::UnsupportedChannels(other)),
        };

        FrameSnapshot::new(width, height, frame.channels(), pixels)
    }

    fn to_grayscale(&self, frame: &FrameSnapshot) -> Result<FrameSnapshot, FrameError> {
        match frame.channels() {
            FrameSnapshot::LUMA => Ok(frame.clone()),
            FrameSnapshot::RGB => {
                let gray: Vec<u8> = frame
                    .pixels()
                    .chunks_exact(3)
                    .map(|rgb| luma(rgb[0], rgb[1], rgb[2]))
                    .collect();
                FrameSnapshot::new(frame.width(), frame.height(), FrameSnapshot::LUMA, gray)
            }
            other => Err(FrameError::UnsupportedChannels(other)),
        }
    }
}
