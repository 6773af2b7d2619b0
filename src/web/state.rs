use crate::{Config, integrations::Services, model::ModelManager};

#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
    services: Services,
    config: &'static Config,
}

impl AppState {
    pub fn new(mm: ModelManager, services: Services, config: &'static Config) -> Self {
        Self {
            mm,
            services,
            config,
        }
    }

    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn config(&self) -> &'static Config {
        self.config
    }
}
