use super::GestureClassifier;
use crate::config::OnnxConfig;
use crate::recognition::{FeatureVector, FEATURE_LEN};
use crate::utils::error::{InitError, SignError};
use crate::Result;
use ndarray::Array2;
use ort::{inputs, session::Session, value::Tensor};
use std::path::Path;

/// 基于 ONNX Runtime 的手势分类器，输入 `[1, 126]`，输出各类别概率
pub struct OnnxGestureClassifier {
    session: Session,
    input_name: String,
    output_name: String, // 动态发现的输出名称
}

impl OnnxGestureClassifier {
    pub fn new(model_path: &Path, onnx_config: &OnnxConfig) -> std::result::Result<Self, InitError> {
        if !model_path.exists() {
            return Err(InitError::MissingModel(model_path.to_path_buf()));
        }

        tracing::info!("Loading gesture classifier from: {}", model_path.display());

        let session = super::loader::build_session(model_path, onnx_config)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| InitError::LoadFailure("Gesture classifier has no inputs".to_string()))?;

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| InitError::LoadFailure("Gesture classifier has no outputs".to_string()))?;

        tracing::info!(
            "Gesture classifier input: '{}', output: '{}'",
            input_name,
            output_name
        );

        Ok(Self {
            session,
            input_name,
            output_name,
        })
    }
}

impl GestureClassifier for OnnxGestureClassifier {
    fn classify(&mut self, features: &FeatureVector) -> Result<Vec<f32>> {
        let input = Array2::from_shape_vec((1, FEATURE_LEN), features.as_slice().to_vec())
            .map_err(|e| SignError::Inference(format!("Invalid feature shape: {}", e)))?;
        let input_tensor = Tensor::from_array(input)?;

        let scores: Vec<f32> = {
            let outputs = self
                .session
                .run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(self.output_name.as_str()) {
                Some(output) => output.try_extract_array::<f32>()?.iter().copied().collect(),
                None => {
                    let available: Vec<String> = outputs.keys().map(|s| s.to_string()).collect();
                    return Err(SignError::Inference(format!(
                        "Classifier output '{}' not found. Available outputs: {:?}",
                        self.output_name, available
                    )));
                }
            }
        };

        if scores.is_empty() {
            return Err(SignError::Inference("Classifier returned no scores".to_string()));
        }

        Ok(into_distribution(scores))
    }
}

/// 若输出已是概率分布则原样返回，否则做 softmax
pub(crate) fn into_distribution(scores: Vec<f32>) -> Vec<f32> {
    let in_range = scores.iter().all(|s| (0.0..=1.0).contains(s));
    let sum: f32 = scores.iter().sum();
    if in_range && (sum - 1.0).abs() < 1e-3 {
        return scores;
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
