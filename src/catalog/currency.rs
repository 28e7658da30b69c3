use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::{required, ColKind, Column, Resource};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub id: Uuid,
    pub name: String,
    pub initial: String,
    pub code: String,
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

impl Resource for Currency {
    const TABLE: &'static str = "currencies";
    const COLUMNS: &'static [Column] = &[
        required("name", "name", ColKind::Text),
        required("initial", "initial", ColKind::Text),
        required("code", "code", ColKind::Text),
    ];
    type Row = Currency;
}
