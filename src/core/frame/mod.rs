//! 帧稳定门 - 决定截屏帧是否值得送入 OCR/翻译
//!
//! 1. 解码 - 通过 [`RasterBackend`] 把编码帧转为快照
//! 2. 相似度 - 与上一帧做逐像素平均绝对差
//! 3. 稳定计数 - 连续稳定若干帧后放行一次

pub mod config;
pub mod error;
pub mod gate;
pub mod raster;
pub mod similarity;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::GateConfiguration;
pub use error::FrameError;
pub use gate::FrameStabilityGate;
pub use raster::{ImageBackend, RasterBackend};
pub use similarity::SimilarityMetric;
pub use snapshot::FrameSnapshot;
