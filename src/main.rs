use std::sync::Arc;

use anyhow::{Error, Result};
use notification_service::{
    api::{AppState, run_api_server},
    broadcast::ConnectionRegistry,
    clients::{NotificationStore, PushGateway, RecipientResolver, database::DatabaseClient, fcm::FcmClient},
    config::Config,
    dispatch::Dispatcher,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;

    let database = Arc::new(DatabaseClient::connect(&config.database_url).await?);
    let store: Arc<dyn NotificationStore> = database.clone();
    let resolver: Arc<dyn RecipientResolver> = database;
    let gateway: Arc<dyn PushGateway> = Arc::new(FcmClient::new(&config));

    let dispatcher = Dispatcher::new(resolver, store.clone(), gateway.clone())
        .with_batch_size(config.dispatch_batch_size);
    let registry = Arc::new(ConnectionRegistry::new(store.clone()));

    let state = Arc::new(AppState {
        dispatcher,
        store,
        gateway,
        registry,
    });

    run_api_server(config, state).await
}
