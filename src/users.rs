use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Map};
use tracing::{info, instrument, warn};

use crate::{
    audit::UserStamp,
    auth::{
        handlers::is_valid_email,
        password::hash_password,
        repo::User,
    },
    crud,
    error::ApiError,
    state::AppState,
    store::{self, optional, required, ColKind, Column, Resource},
};

/// Admin collection over the users table. The OTP pair is pipeline-owned
/// and not reachable through this surface.
impl Resource for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [Column] = &[
        required("role", "role", ColKind::Text),
        required("displayName", "display_name", ColKind::Text),
        required("email", "email", ColKind::Text),
        optional("password", "password", ColKind::Text),
        optional("imageUrl", "image_url", ColKind::Text),
    ];
    type Row = User;
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(crud::find::<User>)
                .post(create_user)
                .patch(crud::update_all::<User>),
        )
        .route("/users/count", get(crud::count::<User>))
        .route("/users/pagination", get(crud::pagination::<User>))
        .route(
            "/users/:id",
            get(crud::find_by_id::<User>)
                .patch(crud::update_by_id::<User>)
                .put(crud::replace_by_id::<User>)
                .delete(crud::delete_by_id::<User>),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserRequest {
    role: String,
    display_name: String,
    email: String,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    status: Option<i32>,
}

/// Like the generic create, plus the auth-flavored extras: duplicate-email
/// check and password hashing.
#[instrument(skip(state, stamp, payload))]
async fn create_user(
    State(state): State<AppState>,
    Extension(stamp): Extension<UserStamp>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<User>, ApiError> {
    if !is_valid_email(&payload.email) {
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if User::find_by_email(&state.db, &payload.email)
        .await?
        .is_some()
    {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict(format!(
            "User with email {} already exists",
            payload.email
        )));
    }

    let mut body = Map::new();
    body.insert("role".into(), json!(payload.role));
    body.insert("displayName".into(), json!(payload.display_name));
    body.insert("email".into(), json!(payload.email));
    if let Some(plain) = payload.password.as_deref() {
        if !plain.is_empty() {
            body.insert("password".into(), json!(hash_password(plain)?));
        }
    }
    if let Some(url) = &payload.image_url {
        body.insert("imageUrl".into(), json!(url));
    }
    if let Some(status) = payload.status {
        body.insert("status".into(), json!(status));
    }

    let user = store::insert::<User>(&state.db, &body, Some(&stamp)).await?;
    info!(user_id = %user.id, "user created by admin");
    Ok(Json(user))
}
