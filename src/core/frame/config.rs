use super::error::FrameError;
use serde::{Deserialize, Serialize};

/// 稳定门配置，构造后不可变；修改配置需新建 gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfiguration {
    /// 关闭时所有帧直接放行
    pub enabled: bool,
    /// 相邻帧相似度 >= 该值视为稳定帧
    pub similarity_threshold: f64,
    /// 连续多少个稳定帧后触发处理
    pub stable_frames_required: u32,
    /// 比较前先转灰度
    pub use_grayscale: bool,
}

impl Default for GateConfiguration {
    fn default() -> Self {
        Self {
            enabled: true,
            similarity_threshold: 0.98,
            stable_frames_required: 3,
            use_grayscale: true,
        }
    }
}

impl GateConfiguration {
    /// 字幕、游戏对话框等静态文字：要求几乎完全一致，但等待时间短
    pub fn for_static_text() -> Self {
        Self {
            enabled: true,
            similarity_threshold: 0.99,
            stable_frames_required: 2,
            use_grayscale: true,
        }
    }

    /// 背景有动画的画面：放宽阈值，多等几帧
    pub fn for_animated_content() -> Self {
        Self {
            enabled: true,
            similarity_threshold: 0.95,
            stable_frames_required: 4,
            use_grayscale: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, FrameError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FrameError> {
        let threshold = self.similarity_threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(FrameError::InvalidConfiguration(format!(
                "similarity_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if self.stable_frames_required == 0 {
            return Err(FrameError::InvalidConfiguration(
                "stable_frames_required must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
