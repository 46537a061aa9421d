use super::types::{FeatureVector, HandDetection, FEATURE_LEN, HAND_FEATURES};

/// 将检测到的手部关键点拼接为 126 维特征向量
///
/// - 0 只手：返回 `None`，调用方视为"无可分类内容"
/// - 1 只手：63 个值 + 63 个零
/// - 2 只手：按检测器报告的顺序拼接，不按左右手重排
///
/// 多于两只手时只取前两只，保证长度恒为 126。
pub fn normalize(hands: &[HandDetection]) -> Option<FeatureVector> {
    if hands.is_empty() {
        return None;
    }

    let mut values = [0.0f32; FEATURE_LEN];
    let flattened = hands
        .iter()
        .take(FEATURE_LEN / HAND_FEATURES)
        .flat_map(|hand| hand.flatten());
    for (slot, value) in values.iter_mut().zip(flattened) {
        *slot = value;
    }

    Some(FeatureVector::from_array(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::types::{Handedness, LandmarkPoint, LANDMARKS_PER_HAND};

    fn hand(seed: f32, handedness: Handedness) -> HandDetection {
        let mut points = [LandmarkPoint::new(0.0, 0.0, 0.0); LANDMARKS_PER_HAND];
        for (i, p) in points.iter_mut().enumerate() {
            let base = seed + i as f32;
            *p = LandmarkPoint::new(base, base + 0.25, base + 0.5);
        }
        HandDetection::new(points, handedness)
    }

    #[test]
    fn no_hands_yields_none() {
        assert!(normalize(&[]).is_none());
    }

    #[test]
    fn single_hand_is_zero_padded() {
        let features = normalize(&[hand(1.0, Handedness::Right)]).unwrap();
        let values = features.as_slice();
        assert_eq!(values.len(), 126);
        assert_eq!(&values[..3], &[1.0, 1.25, 1.5]);
        assert_eq!(values[62], 21.5);
        assert!(values[63..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn two_hands_keep_detection_order() {
        let first = hand(100.0, Handedness::Right);
        let second = hand(200.0, Handedness::Left);
        let features = normalize(&[first, second]).unwrap();
        let values = features.as_slice();
        assert_eq!(values[0], 100.0);
        assert_eq!(values[63], 200.0);
        assert_eq!(values[125], 220.5);
    }

    #[test]
    fn extra_hands_are_truncated() {
        let hands = [
            hand(1.0, Handedness::Left),
            hand(2.0, Handedness::Right),
            hand(3.0, Handedness::Left),
        ];
        let features = normalize(&hands).unwrap();
        assert_eq!(features.len(), 126);
        assert_eq!(features.as_slice()[63], 2.0);
    }
}
