use crate::corrections::CorrectionStore;
use crate::metrics::ApiMetrics;
use crate::pool::WorkerPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<WorkerPool>,
    pub metrics: ApiMetrics,
    pub corrections: Arc<CorrectionStore>,
    pub model_path: String,
}

impl AppState {
    pub fn new(
        pool: WorkerPool,
        metrics: ApiMetrics,
        corrections: CorrectionStore,
        model_path: String,
    ) -> Self {
        Self {
            pool: Arc::new(pool),
            metrics,
            corrections: Arc::new(corrections),
            model_path,
        }
    }

    /// Every worker loads its model before the pool exists, so a live pool
    /// means the model is loaded.
    pub fn model_loaded(&self) -> bool {
        self.pool.size() > 0
    }
}
