use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Frame buffer is empty")]
    EmptyBuffer,
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Pixel buffer size mismatch: expected {expected}, got {got}")]
    BufferSize { expected: usize, got: usize },
    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(u8),
    #[error("Channel count mismatch: {left} vs {right}")]
    ChannelMismatch { left: u8, right: u8 },
    #[error("Invalid gate configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Configuration parse error: {0}")]
    Config(#[from] serde_json::Error),
}
