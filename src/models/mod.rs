pub mod classifier;
pub mod labels;
pub mod landmark;
pub mod loader;

pub use classifier::OnnxGestureClassifier;
pub use labels::load_labels;
pub use landmark::OnnxHandDetector;
pub use loader::OnnxModelLoader;

use crate::recognition::{FeatureVector, HandDetection};
use crate::utils::error::InitError;
use crate::Result;
use image::RgbImage;
use std::path::Path;

/// 手部关键点检测器（外部黑盒）
///
/// 实现必须在边界处把内部表示转换为 [`HandDetection`]，下游不依赖检测器的数据结构。
pub trait HandDetector: Send {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<HandDetection>>;

    /// 每帧最多报告的手数
    fn max_hands(&self) -> usize {
        2
    }
}

/// 手势分类器（外部黑盒）：特征向量 -> 各类别概率
pub trait GestureClassifier: Send {
    fn classify(&mut self, features: &FeatureVector) -> Result<Vec<f32>>;
}

/// 初始化时获取检测器与分类器句柄
pub trait ModelLoader: Send {
    fn load_detector(&self) -> std::result::Result<Box<dyn HandDetector>, InitError>;

    fn load_classifier(
        &self,
        model_path: &Path,
    ) -> std::result::Result<Box<dyn GestureClassifier>, InitError>;
}
