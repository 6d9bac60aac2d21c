use domain::{user::Backend, UserDirectory};
use form::Validator;
use log::*;
use sea_orm::DatabaseConnection;
use service::config::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_sessions::SessionStore;

mod controller;
mod error;
mod extractors;
pub mod flash;
pub mod form;
mod middleware;
mod params;
mod router;
pub mod session;
mod view;

pub use error::{Error, Result};

/// Everything a handler or middleware needs, shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub service_state: service::AppState,
    pub backend: Backend,
    pub validator: Arc<Validator>,
}

impl AppState {
    pub fn new(service_state: service::AppState) -> Self {
        let backend = Backend::new(&service_state.database_connection);
        Self {
            service_state,
            backend,
            validator: Arc::new(Validator::new()),
        }
    }

    /// Replaces the record-store backed user lookup used by identity resolution.
    pub fn with_user_directory(mut self, users: Arc<dyn UserDirectory>) -> Self {
        self.backend = self.backend.with_directory(users);
        self
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.service_state.db_conn_ref()
    }

    pub fn config(&self) -> &Config {
        &self.service_state.config
    }
}

pub async fn init_server<S>(app_state: AppState, store: S) -> std::io::Result<()>
where
    S: SessionStore + Clone,
{
    let server_url = format!(
        "{}:{}",
        app_state.config().interface.as_deref().unwrap_or("127.0.0.1"),
        app_state.config().port
    );

    info!("Server starting... listening for connections on http://{server_url}");

    let listener = TcpListener::bind(&server_url).await?;
    let app = router::define_routes(app_state, store);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
