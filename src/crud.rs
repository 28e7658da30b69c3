use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::instrument;
use uuid::Uuid;

use crate::audit::UserStamp;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{self, ListFilter, Resource};

#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WhereQuery {
    #[serde(rename = "where")]
    pub where_: Option<String>,
}

/// Standard collection routes for one entity. The audit stamp arrives as a
/// request extension when the router sits behind `require_auth`; without it
/// mutations go through unstamped (the open material-categories collection).
pub fn router<R: Resource>(base: &str) -> Router<AppState> {
    Router::new()
        .route(
            base,
            get(find::<R>).post(create::<R>).patch(update_all::<R>),
        )
        .route(&format!("{base}/count"), get(count::<R>))
        .route(&format!("{base}/pagination"), get(pagination::<R>))
        .route(
            &format!("{base}/:id"),
            get(find_by_id::<R>)
                .patch(update_by_id::<R>)
                .put(replace_by_id::<R>)
                .delete(delete_by_id::<R>),
        )
}

fn stamp_ref(stamp: &Option<Extension<UserStamp>>) -> Option<&UserStamp> {
    stamp.as_ref().map(|Extension(s)| s)
}

#[instrument(skip_all, fields(table = R::TABLE))]
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    stamp: Option<Extension<UserStamp>>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<R::Row>, ApiError> {
    let row = store::insert::<R>(&state.db, &body, stamp_ref(&stamp)).await?;
    Ok(Json(row))
}

#[instrument(skip_all, fields(table = R::TABLE))]
pub async fn find<R: Resource>(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let filter = ListFilter::from_query(query.filter.as_deref())?;
    let rows = store::find::<R>(&state.db, &filter).await?;
    Ok(Json(store::project(&rows, filter.fields.as_ref())?))
}

#[instrument(skip_all, fields(table = R::TABLE))]
pub async fn count<R: Resource>(
    State(state): State<AppState>,
    Query(query): Query<WhereQuery>,
) -> Result<Json<Value>, ApiError> {
    let where_ = store::parse_where(query.where_.as_deref())?;
    let count = store::count::<R>(&state.db, where_.as_ref()).await?;
    Ok(Json(json!({ "count": count })))
}

/// List plus a total count computed from the filter's `where` alone, so the
/// page window never shrinks the reported total.
#[instrument(skip_all, fields(table = R::TABLE))]
pub async fn pagination<R: Resource>(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = ListFilter::from_query(query.filter.as_deref())?;
    let rows = store::find::<R>(&state.db, &filter).await?;
    let total = store::count::<R>(&state.db, filter.where_.as_ref()).await?;
    Ok(Json(json!({
        "records": store::project(&rows, filter.fields.as_ref())?,
        "totalCount": total,
    })))
}

#[instrument(skip_all, fields(table = R::TABLE))]
pub async fn update_all<R: Resource>(
    State(state): State<AppState>,
    stamp: Option<Extension<UserStamp>>,
    Query(query): Query<WhereQuery>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    let where_ = store::parse_where(query.where_.as_deref())?;
    let count =
        store::update_all::<R>(&state.db, where_.as_ref(), &body, stamp_ref(&stamp)).await?;
    Ok(Json(json!({ "count": count })))
}

#[instrument(skip_all, fields(table = R::TABLE, %id))]
pub async fn find_by_id<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = ListFilter::from_query(query.filter.as_deref())?;
    let row = store::find_by_id::<R>(&state.db, id)
        .await?
        .ok_or_else(|| not_found::<R>(id))?;
    let mut projected = store::project(&[row], filter.fields.as_ref())?;
    Ok(Json(projected.remove(0)))
}

#[instrument(skip_all, fields(table = R::TABLE, %id))]
pub async fn update_by_id<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    stamp: Option<Extension<UserStamp>>,
    Json(body): Json<Map<String, Value>>,
) -> Result<StatusCode, ApiError> {
    let found = store::update_by_id::<R>(&state.db, id, &body, stamp_ref(&stamp)).await?;
    if !found {
        return Err(not_found::<R>(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all, fields(table = R::TABLE, %id))]
pub async fn replace_by_id<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    stamp: Option<Extension<UserStamp>>,
    Json(body): Json<Map<String, Value>>,
) -> Result<StatusCode, ApiError> {
    let found = store::replace_by_id::<R>(&state.db, id, &body, stamp_ref(&stamp)).await?;
    if !found {
        return Err(not_found::<R>(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all, fields(table = R::TABLE, %id))]
pub async fn delete_by_id<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let found = store::delete_by_id::<R>(&state.db, id).await?;
    if !found {
        return Err(not_found::<R>(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn not_found<R: Resource>(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Entity not found: {} with id {id}", R::TABLE))
}
