// ABOUTME: Shared application state handed to every API handler
// ABOUTME: Wraps the workflow manager around the storage chosen at startup

use escrowdesk_storage::EscrowStorage;
use std::sync::Arc;

use crate::manager::EscrowManager;

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub manager: EscrowManager,
}

impl AppState {
    pub fn new(storage: Arc<dyn EscrowStorage>) -> Self {
        Self {
            manager: EscrowManager::new(storage),
        }
    }
}
