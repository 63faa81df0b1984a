use std::sync::Arc;

use crate::{
    config::Config,
    database::{DocumentStore, init_store},
    error::AppError,
};

pub struct State {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
}

impl State {
    pub async fn new() -> Result<Arc<Self>, AppError> {
        let config = Config::load()?;

        let store = init_store(&config).await?;

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn DocumentStore>) -> Arc<Self> {
        Arc::new(Self { config, store })
    }
}
