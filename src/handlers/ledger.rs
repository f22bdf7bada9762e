use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dtos::ledger::{BulkCreateLedgerRequest, CreateLedgerRequest, UpdateLedgerRequest};
use crate::dtos::ApiResponse;
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::ledger::{LedgerDraft, LedgerView};
use crate::state::AppState;
use crate::store::{LedgerStore, PgLedgerStore};
use crate::validation::ledger::LedgerValidator;
use crate::validation::ValidationError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreated {
    pub created_count: usize,
    pub entries: Vec<LedgerView>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: i64,
}

async fn load_view<S>(store: &S, id: i64) -> Result<LedgerView, AppError>
where
    S: LedgerStore + ?Sized,
{
    store
        .find_joined_ledger(id)
        .await?
        .map(LedgerView::from)
        .ok_or_else(|| ValidationError::LedgerNotFound(id).into())
}

pub async fn create_entry<S>(store: &S, request: CreateLedgerRequest, now: DateTime<Utc>) -> Result<LedgerView, AppError>
where
    S: LedgerStore + ?Sized,
{
    let draft = request.into_draft(now);
    LedgerValidator::new(store).validate_new(&draft).await?;

    let id = store.insert_ledger(&draft).await?;
    load_view(store, id).await
}

/// All-or-nothing: every entry is validated before the single insert runs.
pub async fn create_entries<S>(
    store: &S,
    request: BulkCreateLedgerRequest,
    now: DateTime<Utc>,
) -> Result<BulkCreated, AppError>
where
    S: LedgerStore + ?Sized,
{
    let drafts: Vec<LedgerDraft> = request.entries.into_iter().map(|e| e.into_draft(now)).collect();
    LedgerValidator::new(store).validate_batch(&drafts).await?;

    let ids = store.insert_ledgers(&drafts).await?;
    let mut entries = Vec::with_capacity(ids.len());
    for id in ids {
        entries.push(load_view(store, id).await?);
    }

    Ok(BulkCreated { created_count: entries.len(), entries })
}

pub async fn update_entry<S>(store: &S, id: i64, patch: &UpdateLedgerRequest) -> Result<LedgerView, AppError>
where
    S: LedgerStore + ?Sized,
{
    let existing = store
        .find_ledger(id)
        .await?
        .ok_or(ValidationError::LedgerNotFound(id))?;

    let effective = LedgerValidator::new(store).validate_update(&existing, patch).await?;

    if !store.update_ledger(id, &effective).await? {
        return Err(ValidationError::LedgerNotFound(id).into());
    }
    load_view(store, id).await
}

pub async fn delete_entry<S>(store: &S, id: i64) -> Result<(), AppError>
where
    S: LedgerStore + ?Sized,
{
    if store.delete_ledger(id).await? {
        Ok(())
    } else {
        Err(ValidationError::LedgerNotFound(id).into())
    }
}

// POST /ledgers
pub async fn create_ledger(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateLedgerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LedgerView>>), AppError> {
    let store = PgLedgerStore::new(db_pool);
    let view = create_entry(&store, req, Utc::now()).await?;

    tracing::info!(user = %auth.username, id = view.record.id, "Ledger entry created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Ledger entry created successfully", view)),
    ))
}

// POST /ledgers/bulk
pub async fn bulk_create_ledgers(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<BulkCreateLedgerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BulkCreated>>), AppError> {
    let store = PgLedgerStore::new(db_pool);
    let submitted = req.entries.len();
    let created = create_entries(&store, req, Utc::now())
        .await
        .inspect_err(|e| tracing::warn!(user = %auth.username, submitted, code = e.code(), "Bulk ledger creation rejected"))?;

    tracing::info!(user = %auth.username, count = created.created_count, "Ledger entries created");
    let message = format!("{} ledger entries created successfully", created.created_count);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(message, created))))
}

// GET /ledgers/{id}
pub async fn get_ledger(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<LedgerView>>, AppError> {
    let store = PgLedgerStore::new(db_pool);
    let view = load_view(&store, id).await?;
    Ok(Json(ApiResponse::success("Ledger entry retrieved successfully", view)))
}

// PATCH /ledgers/{id}
pub async fn update_ledger(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(patch): Json<UpdateLedgerRequest>,
) -> Result<Json<ApiResponse<LedgerView>>, AppError> {
    let store = PgLedgerStore::new(db_pool);
    let view = update_entry(&store, id, &patch).await?;

    tracing::info!(user = %auth.username, id, "Ledger entry updated");
    Ok(Json(ApiResponse::success("Ledger entry updated successfully", view)))
}

// DELETE /ledgers/{id}
pub async fn delete_ledger(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    let store = PgLedgerStore::new(db_pool);
    delete_entry(&store, id).await?;

    tracing::info!(user = %auth.username, id, "Ledger entry deleted");
    Ok(Json(ApiResponse::success("Ledger entry deleted successfully", Deleted { id })))
}
