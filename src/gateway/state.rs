use std::sync::Arc;

use crate::transfer::TransferOrchestrator;

/// Gateway application state (shared across requests)
#[derive(Clone)]
pub struct AppState {
    /// Saga entry point; holds no per-request state
    pub orchestrator: Arc<TransferOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<TransferOrchestrator>) -> Self {
        Self { orchestrator }
    }
}
