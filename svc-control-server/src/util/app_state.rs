use std::sync::Arc;

use crate::config::AppConfig;
use crate::control::commands::CommandDispatcher;
use crate::control::history::HealthHistory;
use crate::control::publisher::Publisher;
use crate::control::reconciler::StatusReconciler;
use crate::db::Store;
use crate::models::catalog::ServiceCatalog;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<ServiceCatalog>,
    pub store: Store,
    pub config: Arc<AppConfig>,
    pub reconciler: Arc<StatusReconciler>,
    pub history: Arc<HealthHistory>,
    pub commands: Arc<CommandDispatcher>,
    pub publisher: Publisher,
}
