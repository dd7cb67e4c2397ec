use std::future::Future;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, put};
use axum::Router;
use tracing::info;

use crate::api::handlers::{
    handle_create, handle_delete, handle_download, handle_health, handle_list, handle_not_found,
    handle_update, log_request, AppState,
};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::task::{TaskService, TaskStore};

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/tasks", get(handle_list).post(handle_create))
        .route("/tasks/:id", put(handle_update).delete(handle_delete))
        .route("/tasks/:id/download", get(handle_download))
        .fallback(handle_not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Serves `app` on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::Server::from_tcp(listener)
        .map_err(|err| ServerError::Bind(err.to_string()))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| ServerError::Serve(err.to_string()))
}

pub struct TaskServer {
    pub config: ServerConfig,
    pub state: AppState,
}

impl TaskServer {
    /// Opens the configured store (file-backed when `data_file` is set).
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let store = match &config.data_file {
            Some(path) => TaskStore::open(path.clone())?,
            None => TaskStore::in_memory(),
        };
        Ok(Self::with_store(config, Arc::new(store)))
    }

    pub fn with_store(config: ServerConfig, store: Arc<TaskStore>) -> Self {
        let state = AppState {
            service: TaskService::new(store),
        };
        Self { config, state }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone(), self.config.max_upload_bytes)
    }

    pub async fn start(&self) -> Result<(), ServerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener =
            TcpListener::bind(addr).map_err(|err| ServerError::Bind(format!("{}: {}", addr, err)))?;
        info!(addr = %addr, "task tracker listening");
        serve(listener, self.router(), shutdown_signal()).await
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
