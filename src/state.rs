use std::sync::Arc;

use crate::cache::AnalyticsCache;
use crate::live::LiveBus;
use crate::store::Store;

/// Data shared by every request handler and relay task.
///
/// The storage backend, the live-update bus and the analytics cache are the
/// only process-wide resources; handlers reach them through this handle.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub bus: Arc<LiveBus>,
    pub cache: Arc<AnalyticsCache>,
}

/// Convenience type for the state as axum sees it.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        bus: Arc<LiveBus>,
        cache: Arc<AnalyticsCache>,
    ) -> SharedState {
        Arc::new(AppState { store, bus, cache })
    }
}
