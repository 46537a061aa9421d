use anyhow::Result;
use std::path::PathBuf;

/// 置信度接受阈值：严格大于该值才视为检测到手势
pub const ACCEPTANCE_THRESHOLD: f32 = 0.5;

/// 历史记录容量
pub const HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件目录
    pub models_dir: PathBuf,

    /// 工作线程数量
    pub workers: usize,

    /// 开发模式
    pub dev_mode: bool,

    /// 模型文件路径覆盖（SIGNLANG_MODEL_PATH）
    pub model_path_override: Option<PathBuf>,

    /// 标签文件路径覆盖（SIGNLANG_LABELS_PATH）
    pub labels_path_override: Option<PathBuf>,

    /// 手部关键点模型路径覆盖
    pub landmark_model_path_override: Option<PathBuf>,

    /// 题库种子文件
    pub questions_path: Option<PathBuf>,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,

    /// 识别配置
    pub recognition_config: RecognitionConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,

    /// 单次批量识别的最大图像数
    pub max_batch_size: usize,
}

#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    /// 分类置信度接受阈值
    pub acceptance_threshold: f32,

    /// 历史记录容量
    pub history_capacity: usize,

    /// 手部存在判定阈值
    pub min_detection_confidence: f32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: ACCEPTANCE_THRESHOLD,
            history_capacity: HISTORY_CAPACITY,
            min_detection_confidence: 0.5,
        }
    }
}

impl Config {
    pub fn new(
        bind_addr: String,
        models_dir: String,
        workers: Option<usize>,
        dev_mode: bool,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores);
        anyhow::ensure!(workers > 0, "worker count must be positive");

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_request_size: 50 * 1024 * 1024, // 50MB
            max_batch_size: 32,
        };

        Ok(Self {
            bind_addr,
            models_dir: PathBuf::from(models_dir),
            workers,
            dev_mode,
            model_path_override: None,
            labels_path_override: None,
            landmark_model_path_override: None,
            questions_path: None,
            onnx_config,
            server_config,
            recognition_config: RecognitionConfig::default(),
        })
    }

    pub fn with_model_path(mut self, path: Option<String>) -> Self {
        self.model_path_override = path.map(PathBuf::from);
        self
    }

    pub fn with_labels_path(mut self, path: Option<String>) -> Self {
        self.labels_path_override = path.map(PathBuf::from);
        self
    }

    pub fn with_landmark_model_path(mut self, path: Option<String>) -> Self {
        self.landmark_model_path_override = path.map(PathBuf::from);
        self
    }

    pub fn with_questions_path(mut self, path: Option<String>) -> Self {
        self.questions_path = path.map(PathBuf::from);
        self
    }

    /// 获取手语分类模型路径
    pub fn model_path(&self) -> PathBuf {
        self.model_path_override
            .clone()
            .unwrap_or_else(|| self.models_dir.join("sign_language_model.onnx"))
    }

    /// 获取标签文件路径
    pub fn labels_path(&self) -> PathBuf {
        self.labels_path_override
            .clone()
            .unwrap_or_else(|| self.models_dir.join("sign_language_labels.json"))
    }

    /// 获取手部关键点模型路径
    pub fn landmark_model_path(&self) -> PathBuf {
        self.landmark_model_path_override
            .clone()
            .unwrap_or_else(|| self.models_dir.join("hand_landmark.onnx"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_resolve_against_models_dir() {
        let config = Config::new("127.0.0.1:0".into(), "/opt/models".into(), Some(2), false).unwrap();
        assert_eq!(config.model_path(), PathBuf::from("/opt/models/sign_language_model.onnx"));
        assert_eq!(config.labels_path(), PathBuf::from("/opt/models/sign_language_labels.json"));
        assert_eq!(config.landmark_model_path(), PathBuf::from("/opt/models/hand_landmark.onnx"));
        assert_eq!(config.workers, 2);
    }

    #[test]
    fn overrides_win_over_models_dir() {
        let config = Config::new("127.0.0.1:0".into(), "models".into(), None, true)
            .unwrap()
            .with_model_path(Some("/tmp/m.onnx".into()))
            .with_labels_path(Some("/tmp/l.json".into()));
        assert_eq!(config.model_path(), PathBuf::from("/tmp/m.onnx"));
        assert_eq!(config.labels_path(), PathBuf::from("/tmp/l.json"));
        assert_eq!(config.server_config.request_timeout, 300);
    }

    #[test]
    fn recognition_defaults_are_fixed() {
        let defaults = RecognitionConfig::default();
        assert_eq!(defaults.acceptance_threshold, 0.5);
        assert_eq!(defaults.history_capacity, 100);
        assert_eq!(defaults.min_detection_confidence, 0.5);
    }
}
