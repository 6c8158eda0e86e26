//! 像素级相似度
//!
//! `similarity = 1 - mean_abs_diff / 255`，结果落在 [0, 1]。
//! 尺寸不一致时把第二张图重采样到参考图尺寸。

use super::error::FrameError;
use super::raster::{ImageBackend, RasterBackend};
use super::snapshot::FrameSnapshot;
use rayon::prelude::*;
use std::borrow::Cow;

/// 8-bit 通道的最大差值
const MAX_CHANNEL_DIFF: f64 = 255.0;

/// 并行求和的分块大小（字节）
const DIFF_CHUNK: usize = 64 * 1024;

pub struct SimilarityMetric<B: RasterBackend = ImageBackend> {
    backend: B,
    use_grayscale: bool,
}

impl SimilarityMetric<ImageBackend> {
    pub fn new(use_grayscale: bool) -> Self {
        Self::with_backend(ImageBackend::new(), use_grayscale)
    }
}

impl<B: RasterBackend> SimilarityMetric<B> {
    pub fn with_backend(backend: B, use_grayscale: bool) -> Self {
        Self {
            backend,
            use_grayscale,
        }
    }

    /// 解码并按配置转换颜色空间，得到可直接比较的快照
    pub fn decode(&self, bytes: &[u8]) -> Result<FrameSnapshot, FrameError> {
        let frame = self.backend.decode(bytes)?;
        self.prepare(frame)
    }

    pub fn prepare(&self, frame: FrameSnapshot) -> Result<FrameSnapshot, FrameError> {
        if self.use_grayscale && !frame.is_grayscale() {
            self.backend.to_grayscale(&frame)
        } else {
            Ok(frame)
        }
    }

    /// 比较两张任意快照（先按配置转换）
    pub fn similarity(
        &self,
        reference: &FrameSnapshot,
        candidate: &FrameSnapshot,
    ) -> Result<f64, FrameError> {
        let reference = self.prepare(reference.clone())?;
        let candidate = self.prepare(candidate.clone())?;
        self.compare_prepared(&reference, &candidate)
    }

    /// 比较两张已经 `prepare` 过的快照
    pub fn compare_prepared(
        &self,
        reference: &FrameSnapshot,
        candidate: &FrameSnapshot,
    ) -> Result<f64, FrameError> {
        if reference.channels() != candidate.channels() {
            return Err(FrameError::ChannelMismatch {
                left: reference.channels(),
                right: candidate.channels(),
            });
        }

        let candidate = if candidate.dimensions() != reference.dimensions() {
            let (w, h) = reference.dimensions();
            log::debug!(
                "Resampling frame {:?} -> {:?} for comparison",
                candidate.dimensions(),
                (w, h)
            );
            Cow::Owned(self.backend.resize(candidate, w, h)?)
        } else {
            Cow::Borrowed(candidate)
        };

        let mad = mean_abs_diff(reference.pixels(), candidate.pixels());
        Ok((1.0 - mad / MAX_CHANNEL_DIFF).max(0.0))
    }
}

fn mean_abs_diff(a: &[u8], b: &[u8]) -> f64 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }

    let total: u64 = a[..len]
        .par_chunks(DIFF_CHUNK)
        .zip(b[..len].par_chunks(DIFF_CHUNK))
        .map(|(ca, cb)| {
            ca.iter()
                .zip(cb)
                .map(|(&x, &y)| x.abs_diff(y) as u64)
                .sum::<u64>()
        })
        .sum();

    total as f64 / len as f64
}
