use log::*;
use migration::{Migrator, MigratorTrait};
use service::{config::Config, logging::Logger};
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Starting medrecord in {} mode", config.runtime_env);

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = Migrator::up(db.as_ref(), None).await {
        error!("Failed to apply database migrations: {e}");
        process::exit(1);
    }

    let store = match web::session::postgres_store(&db).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open the session store: {e}");
            process::exit(1);
        }
    };

    let deletion_task = web::session::spawn_expired_deletion(
        store.clone(),
        Duration::from_secs(config.session_cleanup_interval_seconds),
    );

    let app_state = web::AppState::new(service::AppState::new(config, &db));

    if let Err(e) = web::init_server(app_state, store).await {
        error!("Server stopped unexpectedly: {e}");
        deletion_task.abort();
        process::exit(1);
    }

    deletion_task.abort();
}
