use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo::User;

/// Denormalized snapshot of the acting user, attached to records on
/// create/update/delete. A value copy, not a live reference: later profile
/// edits do not rewrite history. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStamp {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<&User> for UserStamp {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            image_url: user.image_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            role: "admin".into(),
            display_name: "Jane Ops".into(),
            email: "jane@example.com".into(),
            password: Some("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$hash".into()),
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
            token: None,
        }
    }

    #[test]
    fn stamp_is_a_reduced_copy() {
        let user = sample_user();
        let stamp = UserStamp::from(&user);
        let json = serde_json::to_value(&stamp).unwrap();
        assert_eq!(json["email"], "jane@example.com");
        assert_eq!(json["displayName"], "Jane Ops");
        assert!(json.get("password").is_none());
        assert!(json.get("otp").is_none());
    }

    #[test]
    fn stamp_omits_missing_image_url() {
        let user = sample_user();
        let json = serde_json::to_value(UserStamp::from(&user)).unwrap();
        assert!(json.get("imageUrl").is_none());
    }

    #[test]
    fn stamp_survives_later_profile_edits() {
        let mut user = sample_user();
        let stamp = UserStamp::from(&user);
        user.display_name = "Renamed".into();
        assert_eq!(stamp.display_name, "Jane Ops");
    }
}
