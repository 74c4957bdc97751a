// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::snapshot_store::SnapshotStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dashboard_service: Arc<DashboardService>,
    pub current_store: Arc<SnapshotStore>,
}
