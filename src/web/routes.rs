use axum::{routing::get, Router};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};

/// Create the router serving the control page
///
/// Requests are handled one at a time.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index).post(handlers::submit))
        .fallback(handlers::redirect_home)
        .with_state(state)
        .layer(GlobalConcurrencyLimitLayer::new(1))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn test_router_creation() {
        let _router = create_router(AppState {
            registry: Registry::new(),
            title: "panel".to_string(),
        });
    }
}
