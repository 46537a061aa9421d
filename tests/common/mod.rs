//! 集成测试共用的桩实现与夹具

#![allow(dead_code)]

use base64::Engine;
use image::{ImageFormat, RgbImage};
use parking_lot::Mutex;
use signlink::history::HistoryLedger;
use signlink::models::{GestureClassifier, HandDetector, ModelLoader};
use signlink::quiz::{MemoryQuizStore, QuizVerifier};
use signlink::recognition::{
    FeatureVector, HandDetection, Handedness, LandmarkPoint, RecognitionResource,
    RecognitionService, ResourceGuard,
};
use signlink::utils::error::InitError;
use signlink::web::AppState;
use signlink::Config;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const LABELS: [&str; 3] = ["hello", "thanks", "me"];

/// 桩检测器、分类器与加载器共享的开关和计数器
#[derive(Clone)]
pub struct Stubs {
    hands: Arc<Mutex<usize>>,
    probabilities: Arc<Mutex<Vec<f32>>>,
    delay: Arc<Mutex<Duration>>,
    detect_calls: Arc<AtomicUsize>,
    classify_calls: Arc<AtomicUsize>,
    loads: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Stubs {
    /// 默认一只手，高置信度识别为 "hello"
    pub fn new() -> Self {
        Self {
            hands: Arc::new(Mutex::new(1)),
            probabilities: Arc::new(Mutex::new(vec![0.9, 0.06, 0.04])),
            delay: Arc::new(Mutex::new(Duration::ZERO)),
            detect_calls: Arc::new(AtomicUsize::new(0)),
            classify_calls: Arc::new(AtomicUsize::new(0)),
            loads: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_hands(&self, count: usize) {
        *self.hands.lock() = count;
    }

    pub fn set_probabilities(&self, probabilities: Vec<f32>) {
        *self.probabilities.lock() = probabilities;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn detect_calls(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }

    /// 包含初始化时的零向量自检调用
    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn loader(&self) -> Box<dyn ModelLoader> {
        Box::new(StubLoader {
            stubs: self.clone(),
        })
    }

    pub fn resource(&self) -> RecognitionResource {
        RecognitionResource::new(self.loader(), 0.5)
    }
}

impl Default for Stubs {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StubDetector {
    stubs: Stubs,
}

impl HandDetector for StubDetector {
    fn detect(&mut self, _image: &RgbImage) -> signlink::Result<Vec<HandDetection>> {
        let stubs = &self.stubs;
        stubs.detect_calls.fetch_add(1, Ordering::SeqCst);

        let current = stubs.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stubs.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *stubs.delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        stubs.in_flight.fetch_sub(1, Ordering::SeqCst);

        let count = *stubs.hands.lock();
        Ok((0..count).map(hand).collect())
    }

    fn max_hands(&self) -> usize {
        2
    }
}

pub struct StubClassifier {
    stubs: Stubs,
}

impl GestureClassifier for StubClassifier {
    fn classify(&mut self, _features: &FeatureVector) -> signlink::Result<Vec<f32>> {
        self.stubs.classify_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.stubs.probabilities.lock().clone())
    }
}

pub struct StubLoader {
    stubs: Stubs,
}

impl ModelLoader for StubLoader {
    fn load_detector(&self) -> Result<Box<dyn HandDetector>, InitError> {
        Ok(Box::new(StubDetector {
            stubs: self.stubs.clone(),
        }))
    }

    fn load_classifier(&self, _model_path: &Path) -> Result<Box<dyn GestureClassifier>, InitError> {
        self.stubs.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubClassifier {
            stubs: self.stubs.clone(),
        }))
    }
}

/// 关键点沿对角线分布的手，`offset` 控制横向平移
pub fn hand(offset: usize) -> HandDetection {
    let shift = offset as f32 * 0.2;
    let landmarks = std::array::from_fn(|i| {
        let t = i as f32 / 20.0;
        LandmarkPoint::new((0.2 + shift + t * 0.3).min(1.0), 0.2 + t * 0.6, -0.01 * t)
    });
    let handedness = if offset == 0 {
        Handedness::Right
    } else {
        Handedness::Left
    };
    HandDetection::new(landmarks, handedness)
}

/// 含占位模型文件与标签清单的模型目录
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        std::fs::write(fixture.model_path(), b"stub model").unwrap();
        let labels = serde_json::json!({ "classes": LABELS });
        std::fs::write(fixture.labels_path(), labels.to_string()).unwrap();
        fixture
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.path().join("sign_language_model.onnx")
    }

    pub fn labels_path(&self) -> PathBuf {
        self.dir.path().join("sign_language_labels.json")
    }

    pub fn config(&self) -> Config {
        Config::new(
            "127.0.0.1:0".to_string(),
            self.dir.path().to_string_lossy().into_owned(),
            Some(1),
            false,
        )
        .unwrap()
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// 接入桩实现的应用状态，`ready` 为真时完成初始化
pub async fn app_state(stubs: &Stubs, fixture: &Fixture, ready: bool) -> AppState {
    let config = fixture.config();
    let guard = ResourceGuard::new(stubs.resource());
    if ready {
        guard
            .initialize(config.model_path(), config.labels_path())
            .await
            .unwrap();
    }

    let history = Arc::new(HistoryLedger::new(config.recognition_config.history_capacity));
    let recognition = RecognitionService::new(guard, history);
    let quiz = QuizVerifier::new(Arc::new(MemoryQuizStore::with_default_questions()));

    AppState::new(config, recognition, quiz)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, image::Rgb([120, 90, 60]));
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// 标准 base64 编码的小尺寸有效帧
pub fn frame_base64() -> String {
    base64::engine::general_purpose::STANDARD.encode(png_bytes(32, 32))
}
