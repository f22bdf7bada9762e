use axum::{middleware::from_fn_with_state, routing::get, Router};
use crate::handlers::report::universal_report;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/reports/universal", get(universal_report))
        .route_layer(from_fn_with_state(state, require_auth))
}
