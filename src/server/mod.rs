use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::storage::SqliteStore;

pub mod auth;
pub mod envelope;
pub mod routes;

#[cfg(test)]
mod tests;

/// Server state. The store is opened by the caller and injected here.
pub struct AppState {
    pub store: Mutex<SqliteStore>,
}

impl AppState {
    pub fn new(store: SqliteStore) -> Self {
        Self { store: Mutex::new(store) }
    }

    /// Take the store back out for an orderly close
    pub fn into_store(self) -> SqliteStore {
        self.store.into_inner()
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route(
            "/settings/change-password",
            patch(auth::change_password).route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::authenticate_user,
            )),
        );

    Router::new()
        .route("/langs", get(routes::get_langs).post(routes::create_lang))
        .route(
            "/langs/{name}",
            get(routes::get_lang)
                .patch(routes::update_lang)
                .delete(routes::delete_lang),
        )
        .nest("/auth", auth_routes)
        .fallback(routes::not_found)
        .method_not_allowed_fallback(routes::method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until Ctrl-C, then close the store.
pub async fn start_server(addr: SocketAddr, store: SqliteStore) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(store));
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Starting server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match Arc::try_unwrap(state) {
        Ok(state) => {
            state.into_store().close()?;
            tracing::info!("Store closed");
        }
        Err(_) => tracing::warn!("Store still referenced at shutdown; dropping without close"),
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
