use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;

use crate::dtos::report::ReportQuery;
use crate::dtos::ApiResponse;
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::reports::{self, assembler::ReportData};
use crate::state::AppState;
use crate::store::PgLedgerStore;

// GET /reports/universal
pub async fn universal_report(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ApiResponse<ReportData>>, AppError> {
    let store = PgLedgerStore::new(db_pool);

    let report = reports::generate_report(&store, &query, Utc::now())
        .await
        .inspect_err(|e| tracing::warn!(user = %auth.username, code = e.code(), error = %e, "Report request rejected"))?;

    tracing::info!(user_id = auth.user_id, role = %auth.role, duration = ?query.duration, "Generated universal report");
    Ok(Json(ApiResponse::success("Report generated successfully", report)))
}
