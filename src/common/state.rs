use std::sync::{Arc, RwLock};

use crate::alert::{AlertManager, AlertPolicy};
use crate::common::health::PipelineHealth;
use crate::config::Config;
use crate::provider::ProviderClient;
use crate::scoring::{ModelRegistry, RiskScorer};
use crate::store::MonitorStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MonitorStore>,
    pub config: Arc<Config>,
    pub providers: Arc<Vec<ProviderClient>>,
    pub models: Arc<ModelRegistry>,
    pub scorer: Arc<RiskScorer>,
    pub alerts: Arc<AlertManager>,
    pub health: Arc<RwLock<PipelineHealth>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config, providers: Vec<ProviderClient>, models: ModelRegistry) -> Self {
        let store = Arc::new(MonitorStore::new());
        let models = Arc::new(models);
        let scorer = Arc::new(RiskScorer::new(store.clone(), models.clone(), &config));
        let alerts = Arc::new(AlertManager::new(
            store.clone(),
            AlertPolicy::from_config(&config),
        ));

        Self {
            store,
            config: Arc::new(config),
            providers: Arc::new(providers),
            models,
            scorer,
            alerts,
            health: Arc::new(RwLock::new(PipelineHealth::new())),
        }
    }
}
