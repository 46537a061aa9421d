use super::HandDetector;
use crate::config::OnnxConfig;
use crate::recognition::{HandDetection, Handedness, LandmarkPoint, LANDMARKS_PER_HAND};
use crate::utils::error::{InitError, SignError};
use crate::Result;
use image::{imageops::FilterType, RgbImage};
use ndarray::Array4;
use ort::{inputs, session::Session, value::Tensor};
use std::path::Path;

/// 关键点模型输入边长（NHWC, 224×224×3, 0~1）
const INPUT_SIZE: u32 = 224;

/// 单手关键点 ONNX 模型适配器
///
/// 输出依次为：关键点 `[1, 63]`（输入像素坐标）、存在置信度 `[1, 1]`、左右手 `[1, 1]`。
/// 整帧 letterbox 后推理，因此每帧最多报告一只手。
pub struct OnnxHandDetector {
    session: Session,
    input_name: String,
    output_names: Vec<String>,
    presence_threshold: f32,
}

/// letterbox 变换参数，用于把模型坐标映射回原图归一化坐标
#[derive(Debug, Clone, Copy, PartialEq)]
struct Letterbox {
    scaled_w: f32,
    scaled_h: f32,
    pad_x: f32,
    pad_y: f32,
}

impl OnnxHandDetector {
    pub fn new(
        model_path: &Path,
        onnx_config: &OnnxConfig,
        presence_threshold: f32,
    ) -> std::result::Result<Self, InitError> {
        if !model_path.exists() {
            return Err(InitError::MissingModel(model_path.to_path_buf()));
        }

        tracing::info!("Loading hand landmark model from: {}", model_path.display());

        let session = super::loader::build_session(model_path, onnx_config)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| InitError::LoadFailure("Hand landmark model has no inputs".to_string()))?;

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        if output_names.len() < 3 {
            return Err(InitError::LoadFailure(format!(
                "Hand landmark model needs 3 outputs, found {}",
                output_names.len()
            )));
        }

        for (i, name) in output_names.iter().enumerate() {
            tracing::debug!("Hand landmark output[{}]: '{}'", i, name);
        }

        Ok(Self {
            session,
            input_name,
            output_names,
            presence_threshold,
        })
    }

    /// 保持宽高比缩放到 224×224，空白处填黑
    fn preprocess(image: &RgbImage) -> (Array4<f32>, Letterbox) {
        let (w, h) = image.dimensions();
        let scale = (INPUT_SIZE as f32 / w as f32).min(INPUT_SIZE as f32 / h as f32);
        let new_w = ((w as f32 * scale) as u32).clamp(1, INPUT_SIZE);
        let new_h = ((h as f32 * scale) as u32).clamp(1, INPUT_SIZE);
        let resized = image::imageops::resize(image, new_w, new_h, FilterType::Triangle);

        let pad_x = (INPUT_SIZE - new_w) / 2;
        let pad_y = (INPUT_SIZE - new_h) / 2;

        let size = INPUT_SIZE as usize;
        let mut input = Array4::<f32>::zeros((1, size, size, 3));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (row, col) = ((y + pad_y) as usize, (x + pad_x) as usize);
            for c in 0..3 {
                input[[0, row, col, c]] = pixel[c] as f32 / 255.0;
            }
        }

        let letterbox = Letterbox {
            scaled_w: new_w as f32,
            scaled_h: new_h as f32,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
        };
        (input, letterbox)
    }

    fn extract(&mut self, input: Array4<f32>) -> Result<(Vec<f32>, f32, f32)> {
        let input_tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(inputs![self.input_name.as_str() => input_tensor])?;

        let mut tensors = Vec::with_capacity(3);
        for name in self.output_names.iter().take(3) {
            let output = outputs.get(name.as_str()).ok_or_else(|| {
                SignError::Inference(format!("Hand landmark output '{}' not found", name))
            })?;
            let values: Vec<f32> = output.try_extract_array::<f32>()?.iter().copied().collect();
            tensors.push(values);
        }

        let handedness = tensors.pop().and_then(|v| v.first().copied()).unwrap_or(1.0);
        let presence = tensors.pop().and_then(|v| v.first().copied()).unwrap_or(0.0);
        let landmarks = tensors.pop().unwrap_or_default();

        Ok((landmarks, presence, handedness))
    }
}

/// 把模型输出的像素坐标转换为原图归一化坐标
fn to_detection(raw: &[f32], letterbox: Letterbox, handedness_score: f32) -> Result<HandDetection> {
    if raw.len() < LANDMARKS_PER_HAND * 3 {
        return Err(SignError::Inference(format!(
            "Expected {} landmark values, got {}",
            LANDMARKS_PER_HAND * 3,
            raw.len()
        )));
    }

    let mut points = [LandmarkPoint::new(0.0, 0.0, 0.0); LANDMARKS_PER_HAND];
    for (point, chunk) in points.iter_mut().zip(raw.chunks_exact(3)) {
        *point = LandmarkPoint::new(
            (chunk[0] - letterbox.pad_x) / letterbox.scaled_w,
            (chunk[1] - letterbox.pad_y) / letterbox.scaled_h,
            chunk[2] / letterbox.scaled_w,
        );
    }

    let handedness = if handedness_score > 0.5 {
        Handedness::Right
    } else {
        Handedness::Left
    };

    Ok(HandDetection::new(points, handedness))
}

impl HandDetector for OnnxHandDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<HandDetection>> {
        let (input, letterbox) = Self::preprocess(image);
        let (landmarks, presence, handedness) = self.extract(input)?;

        if presence <= self.presence_threshold {
            tracing::debug!("No hand present (score {:.3})", presence);
            return Ok(Vec::new());
        }

        Ok(vec![to_detection(&landmarks, letterbox, handedness)?])
    }

    fn max_hands(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letterbox_pads_the_short_side() {
        let image = RgbImage::new(448, 224);
        let (input, letterbox) = OnnxHandDetector::preprocess(&image);
        assert_eq!(input.shape(), &[1, 224, 224, 3]);
        assert_eq!(letterbox.scaled_w, 224.0);
        assert_eq!(letterbox.scaled_h, 112.0);
        assert_eq!(letterbox.pad_x, 0.0);
        assert_eq!(letterbox.pad_y, 56.0);
    }

    #[test]
    fn landmarks_map_back_to_normalized_coordinates() {
        let letterbox = Letterbox {
            scaled_w: 224.0,
            scaled_h: 112.0,
            pad_x: 0.0,
            pad_y: 56.0,
        };
        let mut raw = vec![0.0; 63];
        raw[0] = 112.0;
        raw[1] = 112.0;
        raw[2] = 22.4;

        let hand = to_detection(&raw, letterbox, 0.9).unwrap();
        let tip = hand.landmarks[0];
        assert_eq!((tip.x, tip.y), (0.5, 0.5));
        assert!((tip.z - 0.1).abs() < 1e-6);
        assert_eq!(hand.handedness, Handedness::Right);
    }

    #[test]
    fn short_output_is_an_inference_error() {
        let letterbox = Letterbox {
            scaled_w: 224.0,
            scaled_h: 224.0,
            pad_x: 0.0,
            pad_y: 0.0,
        };
        assert!(to_detection(&[0.0; 10], letterbox, 0.0).is_err());
    }
}
