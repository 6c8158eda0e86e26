//! 截屏 OCR/翻译流水线的两个基础组件：
//!
//! - [`FrameStabilityGate`]：画面稳定若干帧后才放行一次昂贵的识别
//! - [`BoundedCache`]：双缓冲淘汰的定容缓存，用于记忆化识别/翻译结果

pub mod api;
pub mod core;

pub use crate::api::{CaptureSession, SessionStats};
pub use crate::core::cache::{BoundedCache, CacheConfig, CacheError, SharedBoundedCache};
pub use crate::core::frame::{
    FrameError, FrameSnapshot, FrameStabilityGate, GateConfiguration, ImageBackend, RasterBackend,
    SimilarityMetric,
};
