use super::error::FrameError;

/// 解码后的帧快照（拥有像素数据）
///
/// `pixels` 按行存储，每个像素 `channels` 字节：3 为 RGB，1 为亮度。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSnapshot {
    width: u32,
    height: u32,
    channels: u8,
    pixels: Vec<u8>,
}

impl FrameSnapshot {
    pub const RGB: u8 = 3;
    pub const LUMA: u8 = 1;

    pub fn new(
        width: u32,
        height: u32,
        channels: u8,
        pixels: Vec<u8>,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize * channels as usize;
        if channels == 0 || pixels.len() != expected {
            return Err(FrameError::BufferSize {
                expected,
                got: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_grayscale(&self) -> bool {
        self.channels == Self::LUMA
    }
}

/// BT.601 整数亮度，与 RGB 输入一一确定
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}
