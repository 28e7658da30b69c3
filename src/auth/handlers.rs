use axum::{
    extract::{FromRef, State},
    Json,
};
use base64ct::{Base64, Encoding};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use super::{
    dto::{
        AuthResponse, EditProfileRequest, ForgotRequest, LoginRequest, MessageResponse,
        ResetRequest, SignupRequest, ThirdPartyAuthResponse, ThirdPartyLoginRequest,
    },
    jwt::JwtKeys,
    otp,
    password::{hash_password, verify_password},
    repo::{NewUser, ProfileChanges, User},
    session::CurrentUser,
};
use crate::{audit::UserStamp, error::ApiError, state::AppState};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn stamp_json(user: &User) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(UserStamp::from(user)).map_err(|e| ApiError::Internal(e.into()))
}

/// Placeholder secret for accounts created through the third-party path;
/// those accounts are expected to keep authenticating externally.
fn synthesized_password(email: &str, id_token: &str) -> String {
    let mut encoded = Base64::encode_string(format!("{email}%{id_token}").as_bytes());
    encoded.truncate(100);
    encoded
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let mut user = User::find_active_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let password_ok = if payload.generated_password {
        user.password.as_deref() == Some(payload.password.as_str())
    } else {
        match user.password.as_deref() {
            Some(hash) => verify_password(&payload.password, hash)?,
            None => false,
        }
    };

    if !password_ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::NotFound("Password not match".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email, &user.display_name)?;
    user.token = Some(token.clone());

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user_data: user,
    }))
}

#[instrument(skip(state, payload))]
pub async fn login_with_third(
    State(state): State<AppState>,
    Json(payload): Json<ThirdPartyLoginRequest>,
) -> Result<Json<ThirdPartyAuthResponse>, ApiError> {
    if payload.kind != "GOOGLE" {
        return Err(ApiError::BadRequest(
            "Unsupported authentication type".into(),
        ));
    }

    let profile = state.google.verify(&payload.id_token).await.map_err(|e| {
        error!(error = %e, "third-party verification failed");
        ApiError::ExpectationFailed(format!("Error verifying token : {e}"))
    })?;

    let email = profile
        .email
        .clone()
        .ok_or_else(|| ApiError::NotFound("Token does not have any data".into()))?;

    // A login call doubles as first-time account provisioning.
    let mut user = match User::find_by_email(&state.db, &email).await? {
        Some(existing) => existing,
        None => {
            let password = synthesized_password(&email, &payload.id_token);
            let created = User::create(
                &state.db,
                NewUser {
                    role: "member",
                    display_name: profile.name.as_deref().unwrap_or(&email),
                    email: &email,
                    password: Some(&password),
                    image_url: profile.picture.as_deref(),
                    status: 1,
                },
            )
            .await?;
            info!(user_id = %created.id, email = %created.email, "account created via third-party login");
            created
        }
    };

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email, &user.display_name)?;
    user.token = Some(token.clone());

    Ok(Json(ThirdPartyAuthResponse {
        token,
        user_data: user,
        token_third: None,
    }))
}

#[instrument(skip(state, current))]
pub async fn verify(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<AuthResponse>, ApiError> {
    let CurrentUser(mut user) = current;
    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email, &user.display_name)?;
    user.token = Some(token.clone());
    Ok(Json(AuthResponse {
        token,
        user_data: user,
    }))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<User>, ApiError> {
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    // Duplicate check runs against every row, soft-deleted included.
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

    // Empty or missing password is allowed: a passwordless account meant for
    // third-party login only.
    let password = match payload.password.as_deref() {
        Some(plain) if !plain.is_empty() => Some(hash_password(plain)?),
        _ => None,
    };

    let user = User::create(
        &state.db,
        NewUser {
            role: payload.role.as_deref().unwrap_or("member"),
            display_name: &payload.display_name,
            email: &payload.email,
            password: password.as_deref(),
            image_url: payload.image_url.as_deref(),
            status: 1,
        },
    )
    .await?;

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok(Json(user))
}

#[instrument(skip(state, current, payload))]
pub async fn edit_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(mut payload): Json<EditProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let CurrentUser(user) = current;

    if let Some(email) = payload.email.as_deref() {
        if email != user.email {
            if !is_valid_email(email) {
                return Err(ApiError::BadRequest("Invalid email".into()));
            }
            if User::email_taken_by_other(&state.db, email, user.id).await? {
                return Err(ApiError::Conflict(format!(
                    "User with email {email} already exists"
                )));
            }
        }
    }

    let password = match payload.password.as_deref() {
        Some(plain) if !plain.is_empty() => Some(hash_password(plain)?),
        _ => None,
    };

    // An empty imageUrl means "keep the current picture".
    if payload.image_url.as_deref() == Some("") {
        payload.image_url = None;
    }

    let stamp = stamp_json(&user)?;
    let updated = User::update_profile(
        &state.db,
        user.id,
        ProfileChanges {
            role: payload.role.as_deref(),
            display_name: payload.display_name.as_deref(),
            email: payload.email.as_deref(),
            password: password.as_deref(),
            image_url: payload.image_url.as_deref(),
        },
        &stamp,
    )
    .await?;

    info!(user_id = %updated.id, "profile updated");
    Ok(Json(updated))
}

#[instrument(skip(state, payload))]
pub async fn forgot(
    State(state): State<AppState>,
    Json(payload): Json<ForgotRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = User::find_active_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "User with email {} does not exist.",
                payload.email
            ))
        })?;

    let (code, expiry) = otp::issue();
    User::set_otp(&state.db, user.id, &code, expiry).await?;

    // The OTP is already persisted at this point; a delivery failure is not
    // rolled back, and the next forgot call overwrites the code.
    if let Err(e) = state
        .mailer
        .send(
            &user.email,
            "[TRADEHUB] Forgot Password",
            &format!(
                "This is your OTP for resetting your password: {code}. It will expire in 3 hours."
            ),
        )
        .await
    {
        error!(error = %e, user_id = %user.id, "failed to send OTP email");
        return Err(ApiError::InternalServerError(
            "Failed to send OTP email.".into(),
        ));
    }

    info!(user_id = %user.id, "reset OTP issued");
    Ok(Json(MessageResponse {
        message: "SUCCESS".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let hashed = hash_password(&payload.password)?;
    let user = User::consume_otp(&state.db, &payload.otp, &hashed)
        .await?
        .ok_or_else(|| ApiError::NotFound("OTP is not valid or has expired.".into()))?;

    info!(user_id = %user.id, "password reset");
    Ok(Json(MessageResponse {
        message: "Password reset successful.".into(),
    }))
}

#[instrument(skip(state, current))]
pub async fn delete_account(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let CurrentUser(user) = current;
    let stamp = stamp_json(&user)?;
    User::soft_delete(&state.db, user.id, &stamp).await?;

    info!(user_id = %user.id, "account soft-deleted");
    Ok(Json(MessageResponse {
        message: "SUCCESS".into(),
    }))
}
