// Axum web server for the todo list

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::app::storage::Storage;
use crate::app::views;
use crate::config::Settings;

// Shared application state, built once at startup
pub struct AppState {
    pub storage: Mutex<Storage>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(storage: Storage) -> SharedState {
        Arc::new(AppState {
            storage: Mutex::new(storage),
        })
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(views::list))
        .route("/new", get(views::create_form).post(views::create))
        .route("/:id/edit", get(views::edit_form).post(views::edit))
        .route("/:id/delete", get(views::confirm_delete).post(views::delete))
        .route("/:id/toggle", post(views::toggle))
        .route("/health", get(views::health))
        .fallback(views::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Serve the todo list until Ctrl-C
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let storage = Storage::open(&settings.database)
        .with_context(|| format!("open database {}", settings.database.display()))?;
    let app = router(AppState::new(storage));

    let listener = tokio::net::TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("bind {}", settings.bind))?;
    tracing::info!("serving todo list on http://{}", settings.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutting down");
}
