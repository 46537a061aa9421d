use super::resource::{ModelInfo, ModelSummary, RecognitionResource, StateCell};
use super::types::ResourceState;
use crate::utils::error::SignError;
use crate::Result;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

/// 识别资源的互斥门
///
/// 同一时刻最多只有一个 predict/draw/init 调用持有资源。不排队、不分优先级，
/// 调用方在阻塞线程池中等待锁；锁随 guard 析构释放，错误路径和 panic 同样会释放。
/// 生命周期状态单独存放，就绪检查不必等待正在进行的推理。
#[derive(Clone)]
pub struct ResourceGuard {
    resource: Arc<Mutex<RecognitionResource>>,
    state: StateCell,
}

impl ResourceGuard {
    pub fn new(resource: RecognitionResource) -> Self {
        let state = resource.state_cell();
        Self {
            resource: Arc::new(Mutex::new(resource)),
            state,
        }
    }

    pub fn state(&self) -> ResourceState {
        self.state.get()
    }

    pub fn is_ready(&self) -> bool {
        self.state.get() == ResourceState::Ready
    }

    /// 不等待资源，未就绪时立即返回 `NotReady`
    pub fn ensure_ready(&self) -> Result<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(SignError::NotReady)
        }
    }

    /// 在阻塞线程池中持有资源执行闭包，避免占用异步工作线程
    pub async fn run<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut RecognitionResource) -> R + Send + 'static,
        R: Send + 'static,
    {
        let resource = Arc::clone(&self.resource);
        tokio::task::spawn_blocking(move || {
            let mut resource = resource.lock();
            f(&mut resource)
        })
        .await
        .map_err(|e| SignError::Internal(format!("Recognition task failed: {}", e)))
    }

    pub async fn initialize(
        &self,
        model_path: PathBuf,
        labels_path: PathBuf,
    ) -> Result<ModelSummary> {
        let summary = self
            .run(move |resource| resource.initialize(&model_path, &labels_path))
            .await??;
        Ok(summary)
    }

    pub async fn reset(&self) -> Result<()> {
        self.run(|resource| resource.reset()).await
    }

    pub async fn model_info(&self) -> Result<ModelInfo> {
        self.run(|resource| resource.model_info()).await
    }
}
