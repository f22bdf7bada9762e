pub mod ledgers;
pub mod reports;

use axum::Router;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(reports::routes(state.clone()))
        .merge(ledgers::routes(state))
}
