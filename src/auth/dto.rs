use serde::{Deserialize, Serialize};

use super::repo::User;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// System-provisioned accounts present their stored secret verbatim.
    #[serde(default)]
    pub generated_password: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThirdPartyLoginRequest {
    pub id_token: String,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub role: Option<String>,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProfileRequest {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub otp: String,
    pub password: String,
}

/// Response for login-type operations; `user_data.token` carries the same
/// token for clients reading it off the user record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user_data: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThirdPartyAuthResponse {
    pub token: String,
    pub user_data: User,
    #[serde(rename = "token_third")]
    pub token_third: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            role: "member".into(),
            display_name: "Alice Example".into(),
            email: "alice@example.com".into(),
            password: Some("hash".into()),
            image_url: None,
            status: Some(1),
            otp: None,
            otp_expired: None,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
            status_deleted: 0,
            deleted_at: None,
            user_created: None,
            user_updated: None,
            user_deleted: None,
            token: Some("jwt".into()),
        }
    }

    #[test]
    fn auth_response_uses_user_data_key() {
        let json = serde_json::to_value(AuthResponse {
            token: "jwt".into(),
            user_data: user(),
        })
        .unwrap();
        assert_eq!(json["token"], "jwt");
        assert_eq!(json["userData"]["email"], "alice@example.com");
        assert!(json["userData"].get("password").is_none());
    }

    #[test]
    fn third_party_response_keeps_snake_cased_third_token() {
        let json = serde_json::to_value(ThirdPartyAuthResponse {
            token: "jwt".into(),
            user_data: user(),
            token_third: None,
        })
        .unwrap();
        assert!(json.get("token_third").is_some());
        assert!(json.get("tokenThird").is_none());
    }

    #[test]
    fn login_request_defaults_generated_password_off() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email": "a@x.com", "password": "p1"}"#).unwrap();
        assert!(!req.generated_password);
    }

    #[test]
    fn third_party_request_reads_type_key() {
        let req: ThirdPartyLoginRequest =
            serde_json::from_str(r#"{"idToken": "t", "type": "GOOGLE"}"#).unwrap();
        assert_eq!(req.kind, "GOOGLE");
        assert!(req.redirect_uri.is_none());
    }
}
