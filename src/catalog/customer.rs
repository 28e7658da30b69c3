use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::{optional, required, ColKind, Column, Resource};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub phone_number: String,
    /// Person in charge on the customer's side.
    pub pic: String,
    pub tax_number: Option<String>,
    pub address: String,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    pub status_deleted: i32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
    pub user_created: Option<Value>,
    pub user_updated: Option<Value>,
    pub user_deleted: Option<Value>,
}

impl Resource for Customer {
    const TABLE: &'static str = "customers";
    const COLUMNS: &'static [Column] = &[
        required("name", "name", ColKind::Text),
        required("code", "code", ColKind::Text),
        required("phoneNumber", "phone_number", ColKind::Text),
        required("pic", "pic", ColKind::Text),
        optional("taxNumber", "tax_number", ColKind::Text),
        required("address", "address", ColKind::Text),
        optional("email", "email", ColKind::Text),
        optional("imageUrl", "image_url", ColKind::Text),
    ];
    type Row = Customer;
}
