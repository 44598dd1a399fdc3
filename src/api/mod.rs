mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::corpus::IMAGE_ROUTE;
use crate::session::SessionService;

pub type AppState = Arc<SessionService>;

/// Directories served next to the API.
#[derive(Debug, Clone)]
pub struct StaticDirs {
    pub images: PathBuf,
    /// Served for every path not matched by the API or the images.
    pub frontend: Option<PathBuf>,
}

pub fn create_router(sessions: AppState, files: Option<StaticDirs>) -> Router {
    let api = Router::new()
        // Catalog
        .route("/attitudes", get(handlers::list_attitudes))
        .route("/attitudes/{attitude}", get(handlers::get_attitude))
        // Sessions
        .route("/next-image/{attitude}", get(handlers::next_image))
        .route("/progress/{attitude}", get(handlers::session_status))
        .route("/feedback", post(handlers::record_feedback))
        // Health
        .route("/health", get(handlers::health));

    let mut router = Router::new().nest("/api", api);

    if let Some(files) = files {
        router = router.nest_service(IMAGE_ROUTE, ServeDir::new(&files.images));
        if let Some(frontend) = &files.frontend {
            router = router.fallback_service(
                ServeDir::new(frontend).append_index_html_on_directories(true),
            );
        }
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(sessions)
}
