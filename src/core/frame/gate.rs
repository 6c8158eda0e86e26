//! 帧稳定门
//!
//! 状态机只有两个状态：
//! - `Empty`：没有基准帧，首个可解码帧只作为基准，返回 `false`
//! - `Tracking`：与上一帧比较，连续稳定帧数达到要求时返回 `true` 并清零计数
//!
//! 任何内部失败（空缓冲、解码失败、无法比较）都降级为 `true`。

use super::config::GateConfiguration;
use super::error::FrameError;
use super::raster::{ImageBackend, RasterBackend};
use super::similarity::SimilarityMetric;
use super::snapshot::FrameSnapshot;
use log::{debug, info, warn};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct GateState {
    previous_snapshot: Option<FrameSnapshot>,
    stable_count: u32,
}

impl GateState {
    fn clear(&mut self) {
        self.previous_snapshot = None;
        self.stable_count = 0;
    }
}

pub struct FrameStabilityGate<B: RasterBackend = ImageBackend> {
    config: GateConfiguration,
    metric: SimilarityMetric<B>,
    state: Mutex<GateState>,
}

impl FrameStabilityGate<ImageBackend> {
    pub fn new(config: GateConfiguration) -> Result<Self, FrameError> {
        Self::with_backend(config, ImageBackend::new())
    }
}

impl<B: RasterBackend> FrameStabilityGate<B> {
    pub fn with_backend(config: GateConfiguration, backend: B) -> Result<Self, FrameError> {
        config.validate()?;
        info!(
            "FrameStabilityGate: created (enabled={}, threshold={}, stable={}, grayscale={})",
            config.enabled,
            config.similarity_threshold,
            config.stable_frames_required,
            config.use_grayscale
        );

        Ok(Self {
            metric: SimilarityMetric::with_backend(backend, config.use_grayscale),
            config,
            state: Mutex::new(GateState::default()),
        })
    }

    pub fn config(&self) -> &GateConfiguration {
        &self.config
    }

    /// 是否需要对当前帧执行 OCR/翻译
    ///
    /// 空缓冲视为“无法读取”，直接放行且不改变状态。
    pub fn should_process(&self, frame_bytes: &[u8]) -> bool {
        if !self.config.enabled {
            return true;
        }
        if frame_bytes.is_empty() {
            debug!("Empty frame buffer, passing through");
            return true;
        }

        // 解码不涉及共享状态，放在锁外
        let current = match self.metric.decode(frame_bytes) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Frame decode failed, processing anyway: {}", e);
                return true;
            }
        };

        let mut guard = self.lock_state();
        let state = &mut *guard;

        let Some(previous) = state.previous_snapshot.take() else {
            debug!("Baseline frame captured {:?}", current.dimensions());
            state.previous_snapshot = Some(current);
            state.stable_count = 0;
            return false;
        };

        let similarity = match self.metric.compare_prepared(&previous, &current) {
            Ok(similarity) => similarity,
            Err(e) => {
                warn!("Frame comparison failed, processing anyway: {}", e);
                state.previous_snapshot = Some(previous);
                return true;
            }
        };

        if similarity >= self.config.similarity_threshold {
            state.stable_count += 1;
        } else {
            state.stable_count = 0;
        }

        // 基准始终前移到最新帧，旧快照在此释放
        drop(previous);
        state.previous_snapshot = Some(current);

        if state.stable_count >= self.config.stable_frames_required {
            debug!(
                "Frame stable for {} frames (similarity {:.4}), firing",
                state.stable_count, similarity
            );
            state.stable_count = 0;
            return true;
        }

        false
    }

    /// 丢弃基准帧并清零计数，开始/停止采集时调用
    pub fn reset(&self) {
        self.lock_state().clear();
        debug!("FrameStabilityGate: reset");
    }

    pub fn is_tracking(&self) -> bool {
        self.lock_state().previous_snapshot.is_some()
    }

    pub fn stable_count(&self) -> u32 {
        self.lock_state().stable_count
    }

    fn lock_state(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<B: RasterBackend> Drop for FrameStabilityGate<B> {
    fn drop(&mut self) {
        self.lock_state().clear();
        debug!("FrameStabilityGate: released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame::test_support::solid_png;
    use std::sync::Arc;
    use std::thread;

    /// decode/灰度正常，resize 总是失败
    struct NoResizeBackend(ImageBackend);

    impl RasterBackend for NoResizeBackend {
        fn decode(&self, bytes: &[u8]) -> Result<FrameSnapshot, FrameError> {
            self.0.decode(bytes)
        }

        fn resize(
            &self,
            _frame: &FrameSnapshot,
            width: u32,
            height: u32,
        ) -> Result<FrameSnapshot, FrameError> {
            Err(FrameError::InvalidDimensions { width, height })
        }

        fn to_grayscale(&self, frame: &FrameSnapshot) -> Result<FrameSnapshot, FrameError> {
            self.0.to_grayscale(frame)
        }
    }

    fn gate(threshold: f64, stable_frames: u32) -> FrameStabilityGate {
        FrameStabilityGate::new(GateConfiguration {
            enabled: true,
            similarity_threshold: threshold,
            stable_frames_required: stable_frames,
            use_grayscale: true,
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = FrameStabilityGate::new(GateConfiguration {
            stable_frames_required: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(FrameError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_disabled_passes_through() {
        let gate = FrameStabilityGate::new(GateConfiguration::disabled()).unwrap();
        let frame = solid_png(16, 16, [0, 0, 0, 255]);

        for _ in 0..5 {
            assert!(gate.should_process(&frame));
        }
        assert!(gate.should_process(b"garbage"));
        assert!(!gate.is_tracking());
        assert_eq!(gate.stable_count(), 0);
    }

    #[test]
    fn test_first_frame_never_fires() {
        let gate = gate(0.9, 1);
        assert!(!gate.should_process(&solid_png(8, 8, [1, 2, 3, 255])));
        assert!(gate.is_tracking());
    }

    #[test]
    fn test_empty_buffer_passes_without_state_change() {
        let gate = gate(0.9, 2);
        assert!(gate.should_process(&[]));
        assert!(!gate.is_tracking());

        let frame = solid_png(8, 8, [50, 50, 50, 255]);
        assert!(!gate.should_process(&frame));
        assert!(!gate.should_process(&frame));
        assert_eq!(gate.stable_count(), 1);

        assert!(gate.should_process(&[]));
        assert_eq!(gate.stable_count(), 1);
    }

    #[test]
    fn test_repeated_frame_fires_after_n() {
        for n in [2u32, 3, 5] {
            let gate = gate(0.95, n);
            let frame = solid_png(24, 24, [120, 30, 200, 255]);

            // 第 1 次是基准，第 2..=n 次计数
            for call in 1..=n {
                assert!(!gate.should_process(&frame), "call {} of n={}", call, n);
            }
            assert!(gate.should_process(&frame), "call n+1 of n={}", n);
            // 触发后计数清零
            assert!(!gate.should_process(&frame));
            assert_eq!(gate.stable_count(), 1);
        }
    }

    #[test]
    fn test_continuous_stability_refires_every_n() {
        let gate = gate(0.95, 2);
        let frame = solid_png(8, 8, [9, 9, 9, 255]);

        let fired: Vec<bool> = (0..7).map(|_| gate.should_process(&frame)).collect();
        assert_eq!(fired, vec![false, false, true, false, true, false, true]);
    }

    #[test]
    fn test_content_change_resets_counter() {
        let gate = gate(0.95, 2);
        let a = solid_png(16, 16, [0, 0, 0, 255]);
        let b = solid_png(16, 16, [255, 255, 255, 255]);

        assert!(!gate.should_process(&a));
        assert!(!gate.should_process(&a));
        assert_eq!(gate.stable_count(), 1);

        assert!(!gate.should_process(&b));
        assert_eq!(gate.stable_count(), 0);

        assert!(!gate.should_process(&b));
        assert!(gate.should_process(&b));
    }

    #[test]
    fn test_near_identical_red_frames() {
        let gate = gate(0.5, 2);
        let red = solid_png(32, 32, [255, 0, 0, 255]);
        let darker_red = solid_png(32, 32, [250, 5, 0, 255]);

        assert!(!gate.should_process(&red));
        assert!(!gate.should_process(&darker_red));
        assert!(gate.should_process(&darker_red));
    }

    #[test]
    fn test_decode_failure_preserves_state() {
        let gate = gate(0.95, 2);
        let frame = solid_png(8, 8, [70, 80, 90, 255]);

        assert!(!gate.should_process(&frame));
        assert!(!gate.should_process(&frame));
        assert_eq!(gate.stable_count(), 1);

        assert!(gate.should_process(b"\x89PNG broken"));
        assert!(gate.is_tracking());
        assert_eq!(gate.stable_count(), 1);

        // 计数从中断处继续
        assert!(gate.should_process(&frame));
    }

    #[test]
    fn test_comparison_failure_preserves_state() {
        let config = GateConfiguration {
            similarity_threshold: 0.95,
            stable_frames_required: 3,
            ..Default::default()
        };
        let gate = FrameStabilityGate::with_backend(config, NoResizeBackend(ImageBackend::new()))
            .unwrap();
        let frame = solid_png(16, 16, [40, 40, 40, 255]);
        let wider = solid_png(20, 16, [40, 40, 40, 255]);

        assert!(!gate.should_process(&frame));
        assert!(!gate.should_process(&frame));
        assert_eq!(gate.stable_count(), 1);

        // 尺寸不同需要重采样，重采样失败 -> 放行，状态不变
        assert!(gate.should_process(&wider));
        assert!(gate.is_tracking());
        assert_eq!(gate.stable_count(), 1);

        // 基准仍是 16x16 帧，计数从中断处继续
        assert!(!gate.should_process(&frame));
        assert_eq!(gate.stable_count(), 2);
        assert!(gate.should_process(&frame));
        assert_eq!(gate.stable_count(), 0);
    }

    #[test]
    fn test_decode_failure_on_empty_gate() {
        let gate = gate(0.95, 2);
        assert!(gate.should_process(b"not an image"));
        assert!(!gate.is_tracking());
    }

    #[test]
    fn test_reset_restores_first_call_behavior() {
        let gate = gate(0.95, 1);
        let frame = solid_png(8, 8, [1, 1, 1, 255]);

        assert!(!gate.should_process(&frame));
        assert!(gate.should_process(&frame));

        gate.reset();
        assert!(!gate.is_tracking());
        assert_eq!(gate.stable_count(), 0);
        assert!(!gate.should_process(&frame));
        assert!(gate.should_process(&frame));
    }

    #[test]
    fn test_resized_capture_still_compared() {
        let gate = gate(0.95, 1);
        assert!(!gate.should_process(&solid_png(40, 30, [100, 100, 100, 255])));
        assert!(gate.should_process(&solid_png(42, 30, [100, 100, 100, 255])));
    }

    #[test]
    fn test_color_comparison_mode() {
        let gate = FrameStabilityGate::new(GateConfiguration {
            use_grayscale: false,
            similarity_threshold: 0.99,
            stable_frames_required: 1,
            ..Default::default()
        })
        .unwrap();

        assert!(!gate.should_process(&solid_png(8, 8, [0, 0, 255, 255])));
        assert!(!gate.should_process(&solid_png(8, 8, [255, 0, 0, 255])));
        assert!(gate.should_process(&solid_png(8, 8, [255, 0, 0, 255])));
    }

    #[test]
    fn test_concurrent_callers_serialized() {
        let gate = Arc::new(gate(0.95, 1));
        let frame = Arc::new(solid_png(16, 16, [33, 66, 99, 255]));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let frame = Arc::clone(&frame);
                thread::spawn(move || (0..25).filter(|_| gate.should_process(&frame)).count())
            })
            .collect();

        let fired: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        // 100 次调用：1 次基准，其余每次都稳定且 n=1，全部触发
        assert_eq!(fired, 99);
    }
}
