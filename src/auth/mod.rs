use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod google;
pub mod handlers;
pub mod jwt;
pub mod otp;
pub mod password;
pub mod repo;
pub mod session;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::login))
        .route("/auth/login-with-third", post(handlers::login_with_third))
        .route("/auth/verify", get(handlers::verify))
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/edit-profile", post(handlers::edit_profile))
        .route("/auth/forgot", post(handlers::forgot))
        .route("/auth/reset", post(handlers::reset))
        .route("/auth/delete-account", delete(handlers::delete_account))
}
