use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 每只手的关键点数量
pub const LANDMARKS_PER_HAND: usize = 21;

/// 单手特征维度（21 × 3）
pub const HAND_FEATURES: usize = LANDMARKS_PER_HAND * 3;

/// 特征向量总维度（两只手）
pub const FEATURE_LEN: usize = HAND_FEATURES * 2;

/// 单个关键点：归一化图像坐标 + 相对深度
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl LandmarkPoint {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// 左右手标记（尽力而为）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

/// 检测器输出的一只手，点数由类型保证为 21
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandDetection {
    pub landmarks: [LandmarkPoint; LANDMARKS_PER_HAND],
    pub handedness: Handedness,
}

impl HandDetection {
    pub fn new(landmarks: [LandmarkPoint; LANDMARKS_PER_HAND], handedness: Handedness) -> Self {
        Self { landmarks, handedness }
    }

    /// 按 x, y, z 顺序展开为 63 个数值
    pub fn flatten(&self) -> impl Iterator<Item = f32> + '_ {
        self.landmarks.iter().flat_map(|p| [p.x, p.y, p.z])
    }
}

/// 固定长度 126 的特征向量
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector([f32; FEATURE_LEN]);

impl FeatureVector {
    pub fn zeroed() -> Self {
        Self([0.0; FEATURE_LEN])
    }

    pub(crate) fn from_array(values: [f32; FEATURE_LEN]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        FEATURE_LEN
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// 识别资源生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

/// 一次预测的结果
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutcome {
    pub detected: bool,
    pub label: Option<String>,
    pub confidence: f32,
    pub hands: Vec<HandDetection>,
    pub processing_time: Duration,
}

impl PredictionOutcome {
    /// 未检测到手：不调用分类器，置信度为 0
    pub fn no_hands(processing_time: Duration) -> Self {
        Self {
            detected: false,
            label: None,
            confidence: 0.0,
            hands: Vec::new(),
            processing_time,
        }
    }

    /// 按阈值规则构造：只有 confidence > threshold 才保留标签
    pub fn classified(
        label: String,
        confidence: f32,
        threshold: f32,
        hands: Vec<HandDetection>,
        processing_time: Duration,
    ) -> Self {
        let detected = confidence > threshold;
        Self {
            detected,
            label: detected.then_some(label),
            confidence,
            hands,
            processing_time,
        }
    }

    pub fn message(&self) -> &'static str {
        if self.detected {
            "Recognition succeeded"
        } else if self.hands.is_empty() {
            "No gesture detected"
        } else {
            "Confidence too low"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_suppresses_label() {
        let outcome = PredictionOutcome::classified(
            "hello".into(),
            0.42,
            0.5,
            Vec::new(),
            Duration::ZERO,
        );
        assert!(!outcome.detected);
        assert_eq!(outcome.label, None);
        assert!((outcome.confidence - 0.42).abs() < f32::EPSILON);
    }

    #[test]
    fn threshold_is_strict() {
        let at = PredictionOutcome::classified("a".into(), 0.5, 0.5, Vec::new(), Duration::ZERO);
        assert!(!at.detected);

        let above = PredictionOutcome::classified("a".into(), 0.51, 0.5, Vec::new(), Duration::ZERO);
        assert!(above.detected);
        assert_eq!(above.label.as_deref(), Some("a"));
    }
}
