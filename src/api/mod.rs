mod handlers;
mod middleware;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::MementoConfig;
use crate::db::Database;
use crate::memento::NegotiationResponder;
use crate::store::WikiRevisionStore;

pub use handlers::CreatedPage;
pub use middleware::auth_middleware;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: WikiRevisionStore,
    pub responder: NegotiationResponder,
    pub config: Arc<MementoConfig>,
}

impl AppState {
    pub fn new(db: Database, config: MementoConfig) -> Self {
        Self {
            store: WikiRevisionStore::from_config(db, &config),
            responder: NegotiationResponder::new(config.mode),
            config: Arc::new(config),
        }
    }

    pub fn db(&self) -> &Database {
        self.store.database()
    }
}

pub fn create_router(db: Database, config: MementoConfig) -> Router {
    let state = AppState::new(db, config);

    let api = Router::new()
        // Pages
        .route("/pages", get(handlers::list_pages))
        .route("/pages", post(handlers::create_page))
        .route("/pages/{title}", get(handlers::get_page))
        .route("/pages/{title}/revisions", get(handlers::list_revisions))
        .route("/pages/{title}/revisions", post(handlers::add_revision))
        // Health
        .route("/health", get(handlers::health))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        // Original Resources and their Mementos
        .route("/wiki/{title}", get(handlers::view_page))
        // TimeGate
        .route("/timegate", get(handlers::timegate_welcome))
        .route("/timegate/", get(handlers::timegate_welcome))
        .route("/timegate/{title}", get(handlers::timegate))
        // TimeMap
        .route("/timemap/{title}", get(handlers::timemap))
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
