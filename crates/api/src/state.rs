use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared state handed to every handler via `State<AppState>`.
///
/// Cheap to clone: the pool is reference counted and the rest sits behind
/// `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: unicorr_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Handlers publish here after a committed state change.
    pub event_bus: Arc<unicorr_events::EventBus>,
}
