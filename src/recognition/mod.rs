pub mod features;
pub mod guard;
pub mod resource;
pub mod service;
pub mod types;

pub use features::normalize;
pub use guard::ResourceGuard;
pub use resource::{ModelInfo, ModelSummary, RecognitionResource};
pub use service::{RecognitionReport, RecognitionService, ServiceStats, StatsSnapshot};
pub use types::{
    FeatureVector, HandDetection, Handedness, LandmarkPoint, PredictionOutcome, ResourceState,
    FEATURE_LEN, HAND_FEATURES, LANDMARKS_PER_HAND,
};
