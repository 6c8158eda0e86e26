//! 采集会话 - 编排层使用的稳定门入口

use crate::core::frame::{FrameError, FrameStabilityGate, GateConfiguration};
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// 会话统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub observed_frames: u64,
    pub fired_frames: u64,
    pub skipped_frames: u64,
}

/// 采集会话 - 开始/停止时重置稳定门，避免旧基准跨会话泄漏
///
/// 未启动的会话不处理任何帧。
pub struct CaptureSession {
    gate: FrameStabilityGate,
    active: AtomicBool,
    stats: Mutex<SessionStats>,
}

impl CaptureSession {
    pub fn new(config: GateConfiguration) -> Result<Self, FrameError> {
        let gate = FrameStabilityGate::new(config)?;
        info!("🎬 CaptureSession: created");
        Ok(Self {
            gate,
            active: AtomicBool::new(false),
            stats: Mutex::new(SessionStats::default()),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, FrameError> {
        Self::new(GateConfiguration::from_json(json)?)
    }

    pub fn start(&self) {
        self.gate.reset();
        self.active.store(true, Ordering::SeqCst);
        info!("▶️ CaptureSession: started");
    }

    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.gate.reset();
        info!("⏹️ CaptureSession: stopped");
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// 当前帧是否需要 OCR/翻译
    pub fn should_process(&self, frame_bytes: &[u8]) -> bool {
        if !self.is_active() {
            return false;
        }

        let fire = self.gate.should_process(frame_bytes);

        let mut stats = self.lock_stats();
        stats.observed_frames += 1;
        if fire {
            stats.fired_frames += 1;
        } else {
            stats.skipped_frames += 1;
        }

        fire
    }

    pub fn gate(&self) -> &FrameStabilityGate {
        &self.gate
    }

    pub fn stats(&self) -> SessionStats {
        *self.lock_stats()
    }

    pub fn reset_stats(&self) {
        *self.lock_stats() = SessionStats::default();
    }

    fn lock_stats(&self) -> MutexGuard<'_, SessionStats> {
        self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        info!("🗑️ CaptureSession: released");
    }
}
