use super::features::normalize;
use super::types::{HandDetection, PredictionOutcome, ResourceState};
use crate::image::overlay::draw_overlay;
use crate::models::{load_labels, GestureClassifier, HandDetector, ModelLoader};
use crate::recognition::FeatureVector;
use crate::utils::error::{InitError, SignError};
use crate::Result;
use image::RgbImage;
use parking_lot::RwLock;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// 可在锁外读取的生命周期状态
#[derive(Debug, Clone)]
pub struct StateCell(Arc<RwLock<ResourceState>>);

impl StateCell {
    fn new() -> Self {
        Self(Arc::new(RwLock::new(ResourceState::Uninitialized)))
    }

    pub fn get(&self) -> ResourceState {
        *self.0.read()
    }

    fn set(&self, state: ResourceState) {
        let mut current = self.0.write();
        if *current != state {
            tracing::info!("Recognition resource: {:?} -> {:?}", *current, state);
            *current = state;
        }
    }
}

/// 初始化成功后的模型摘要
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub num_classes: usize,
    pub classes: Vec<String>,
}

/// 模型信息（/api/info）
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub state: ResourceState,
    pub model_loaded: bool,
    pub labels_loaded: bool,
    pub model_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub num_classes: usize,
    pub classes: Vec<String>,
    pub acceptance_threshold: f32,
    /// 由已加载的检测器决定，未加载时为空
    pub max_num_hands: Option<usize>,
}

/// 识别资源：持有检测器与分类器句柄，单一 `predict` 入口
///
/// 本类型自身不做并发保护，所有访问都必须经过 [`ResourceGuard`](super::ResourceGuard)。
pub struct RecognitionResource {
    loader: Box<dyn ModelLoader>,
    detector: Option<Box<dyn HandDetector>>,
    classifier: Option<Box<dyn GestureClassifier>>,
    labels: Vec<String>,
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    acceptance_threshold: f32,
    state: StateCell,
}

impl RecognitionResource {
    pub fn new(loader: Box<dyn ModelLoader>, acceptance_threshold: f32) -> Self {
        Self {
            loader,
            detector: None,
            classifier: None,
            labels: Vec::new(),
            model_path: None,
            labels_path: None,
            acceptance_threshold,
            state: StateCell::new(),
        }
    }

    pub fn state(&self) -> ResourceState {
        self.state.get()
    }

    pub(crate) fn state_cell(&self) -> StateCell {
        self.state.clone()
    }

    /// 检测器与分类器均已加载
    pub fn is_ready(&self) -> bool {
        self.state.get() == ResourceState::Ready
            && self.detector.is_some()
            && self.classifier.is_some()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// 加载标签、分类器和检测器；已 Ready 时直接返回成功，不重复加载
    pub fn initialize(
        &mut self,
        model_path: &Path,
        labels_path: &Path,
    ) -> std::result::Result<ModelSummary, InitError> {
        if self.is_ready() {
            tracing::debug!("Recognition resource already initialized");
            return Ok(self.summary());
        }

        self.state.set(ResourceState::Loading);

        match self.load(model_path, labels_path) {
            Ok(()) => {
                self.model_path = Some(model_path.to_path_buf());
                self.labels_path = Some(labels_path.to_path_buf());
                self.state.set(ResourceState::Ready);
                tracing::info!(
                    "Recognition resource ready: {} classes {:?}",
                    self.labels.len(),
                    self.labels
                );
                Ok(self.summary())
            }
            Err(e) => {
                self.detector = None;
                self.classifier = None;
                self.labels.clear();
                self.state.set(ResourceState::Failed);
                tracing::error!("Recognition resource failed to initialize: {}", e);
                Err(e)
            }
        }
    }

    fn load(&mut self, model_path: &Path, labels_path: &Path) -> std::result::Result<(), InitError> {
        if !model_path.exists() {
            return Err(InitError::MissingModel(model_path.to_path_buf()));
        }
        let labels = load_labels(labels_path)?;

        let mut classifier = self.loader.load_classifier(model_path)?;

        // 用零向量试算一次，确认输出维度与标签数一致
        let sample = classifier
            .classify(&FeatureVector::zeroed())
            .map_err(|e| InitError::LoadFailure(format!("classifier self-check failed: {}", e)))?;
        if sample.len() != labels.len() {
            return Err(InitError::LoadFailure(format!(
                "classifier produces {} classes but label manifest lists {}",
                sample.len(),
                labels.len()
            )));
        }

        let detector = self.loader.load_detector()?;

        self.labels = labels;
        self.classifier = Some(classifier);
        self.detector = Some(detector);
        Ok(())
    }

    /// 释放句柄并回到 Uninitialized
    pub fn reset(&mut self) {
        self.detector = None;
        self.classifier = None;
        self.labels.clear();
        self.model_path = None;
        self.labels_path = None;
        self.state.set(ResourceState::Uninitialized);
    }

    /// 检测 -> 特征 -> 分类 -> 阈值
    pub fn predict(&mut self, image: &RgbImage) -> Result<PredictionOutcome> {
        if !self.is_ready() {
            return Err(SignError::NotReady);
        }
        let (Some(detector), Some(classifier)) = (self.detector.as_mut(), self.classifier.as_mut())
        else {
            return Err(SignError::NotReady);
        };

        let start = Instant::now();
        let hands = detector.detect(image)?;

        let Some(features) = normalize(&hands) else {
            return Ok(PredictionOutcome::no_hands(start.elapsed()));
        };

        let probabilities = classifier.classify(&features)?;
        let (index, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, p)| match best {
                Some((_, best_p)) if best_p >= p => best,
                _ => Some((i, p)),
            })
            .ok_or_else(|| SignError::Inference("Classifier returned no scores".to_string()))?;

        let label = self.labels.get(index).cloned().ok_or_else(|| {
            SignError::Inference(format!(
                "Class index {} outside label set of {}",
                index,
                self.labels.len()
            ))
        })?;

        let outcome = PredictionOutcome::classified(
            label,
            confidence,
            self.acceptance_threshold,
            hands,
            start.elapsed(),
        );

        tracing::debug!(
            "Prediction: {:?} (confidence {:.4}, hands {})",
            outcome.label,
            outcome.confidence,
            outcome.hands.len()
        );

        Ok(outcome)
    }

    /// 在图像副本上绘制关键点，不影响分类结果
    pub fn draw_overlay(&self, image: &RgbImage, hands: &[HandDetection]) -> RgbImage {
        draw_overlay(image, hands)
    }

    fn summary(&self) -> ModelSummary {
        ModelSummary {
            num_classes: self.labels.len(),
            classes: self.labels.clone(),
        }
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            state: self.state(),
            model_loaded: self.classifier.is_some(),
            labels_loaded: !self.labels.is_empty(),
            model_path: self.model_path.clone(),
            labels_path: self.labels_path.clone(),
            num_classes: self.labels.len(),
            classes: self.labels.clone(),
            acceptance_threshold: self.acceptance_threshold,
            max_num_hands: self.detector.as_ref().map(|d| d.max_hands()),
        }
    }
}
