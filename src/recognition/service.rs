use super::guard::ResourceGuard;
use super::types::PredictionOutcome;
use crate::history::HistoryLedger;
use crate::image::{encode_data_url, ImageLoader};
use crate::Result;
use chrono::{DateTime, Utc};
use image::RgbImage;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// 一次识别的完整结果
#[derive(Debug, Clone)]
pub struct RecognitionReport {
    pub outcome: PredictionOutcome,
    /// `data:image/jpeg;base64,...`，仅在请求可视化时生成
    pub annotated_image: Option<String>,
}

/// 识别统计
pub struct ServiceStats {
    translation_count: AtomicU64,
    started_at: Mutex<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub translation_count: u64,
    pub uptime_seconds: f64,
    pub average_translations_per_minute: f64,
    pub started_at: DateTime<Utc>,
}

impl ServiceStats {
    fn new() -> Self {
        Self {
            translation_count: AtomicU64::new(0),
            started_at: Mutex::new(Utc::now()),
        }
    }

    fn record(&self) {
        self.translation_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let started_at = *self.started_at.lock();
        let uptime_seconds = (Utc::now() - started_at).num_milliseconds().max(0) as f64 / 1000.0;
        let translation_count = self.translation_count.load(Ordering::Relaxed);
        let average_translations_per_minute = if uptime_seconds > 0.0 {
            translation_count as f64 / (uptime_seconds / 60.0)
        } else {
            0.0
        };

        StatsSnapshot {
            translation_count,
            uptime_seconds,
            average_translations_per_minute,
            started_at,
        }
    }

    pub fn reset(&self) {
        self.translation_count.store(0, Ordering::Relaxed);
        *self.started_at.lock() = Utc::now();
        tracing::info!("Recognition statistics reset");
    }
}

/// 三种传输共用的识别入口
///
/// 解码在调用方任务中完成，预测和绘制在 [`ResourceGuard`] 内串行执行，
/// 检测成功的标签按完成顺序写入历史记录。
#[derive(Clone)]
pub struct RecognitionService {
    guard: ResourceGuard,
    history: Arc<HistoryLedger>,
    stats: Arc<ServiceStats>,
}

impl RecognitionService {
    pub fn new(guard: ResourceGuard, history: Arc<HistoryLedger>) -> Self {
        Self {
            guard,
            history,
            stats: Arc::new(ServiceStats::new()),
        }
    }

    pub fn guard(&self) -> &ResourceGuard {
        &self.guard
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    pub fn stats(&self) -> &ServiceStats {
        &self.stats
    }

    /// base64 / data URL 输入
    pub async fn recognize_base64(&self, data: &str, visualize: bool) -> Result<RecognitionReport> {
        self.guard.ensure_ready()?;
        let image = ImageLoader::from_base64(data)?;
        self.recognize_image(image, visualize).await
    }

    /// 原始编码字节输入（multipart 上传）
    pub async fn recognize_bytes(&self, bytes: &[u8], visualize: bool) -> Result<RecognitionReport> {
        self.guard.ensure_ready()?;
        let image = ImageLoader::from_bytes(bytes)?;
        self.recognize_image(image, visualize).await
    }

    /// 统计与历史在守卫内记录，调用方中途放弃时结果仍会入账
    pub async fn recognize_image(&self, image: RgbImage, visualize: bool) -> Result<RecognitionReport> {
        let history = Arc::clone(&self.history);
        let stats = Arc::clone(&self.stats);

        let (outcome, annotated) = self
            .guard
            .run(move |resource| -> Result<_> {
                let outcome = resource.predict(&image)?;
                stats.record();
                if let (true, Some(label)) = (outcome.detected, outcome.label.as_ref()) {
                    history.append(label.clone());
                }
                let annotated = visualize.then(|| resource.draw_overlay(&image, &outcome.hands));
                Ok((outcome, annotated))
            })
            .await??;

        tracing::info!(
            "Recognition completed: label={:?}, confidence={:.2}%, hands={}, time={:.1}ms",
            outcome.label,
            outcome.confidence * 100.0,
            outcome.hands.len(),
            outcome.processing_time.as_secs_f64() * 1000.0
        );

        let annotated_image = annotated.as_ref().map(encode_data_url).transpose()?;

        Ok(RecognitionReport {
            outcome,
            annotated_image,
        })
    }

    /// 按输入顺序逐张识别；单张失败不影响其余元素
    pub async fn recognize_batch(
        &self,
        images: &[String],
        visualize: bool,
    ) -> Result<Vec<Result<RecognitionReport>>> {
        self.guard.ensure_ready()?;

        let mut results = Vec::with_capacity(images.len());
        for (i, data) in images.iter().enumerate() {
            let result = self.recognize_base64(data, visualize).await;
            if let Err(e) = &result {
                tracing::warn!("Batch element {} failed: {}", i, e);
            }
            results.push(result);
        }

        Ok(results)
    }
}
