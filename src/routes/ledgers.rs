use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use crate::handlers::ledger;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/ledgers", post(ledger::create_ledger))
        .route("/ledgers/bulk", post(ledger::bulk_create_ledgers))
        .route(
            "/ledgers/{id}",
            get(ledger::get_ledger)
                .patch(ledger::update_ledger)
                .delete(ledger::delete_ledger),
        )
        .route_layer(from_fn_with_state(state, require_auth))
}
