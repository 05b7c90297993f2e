// Shared handler state

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use greenearth_core::application::{ChatService, PredictionService};

/// Immutable services shared by every request
#[derive(Clone)]
pub struct ApiState {
    pub predictions: Arc<PredictionService>,
    pub chat: Arc<ChatService>,
    /// Directory the regression script writes its plots into
    pub plots_dir: Arc<PathBuf>,
    pub started_at: Instant,
}

impl ApiState {
    pub fn new(
        predictions: Arc<PredictionService>,
        chat: Arc<ChatService>,
        plots_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            predictions,
            chat,
            plots_dir: Arc::new(plots_dir.into()),
            started_at: Instant::now(),
        }
    }
}
