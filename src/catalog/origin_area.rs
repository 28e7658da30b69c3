use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::{required, ColKind, Column, Resource};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OriginArea {
    pub id: Uuid,
    /// Embedded country snapshot, not a foreign key.
    pub country: Value,
    pub name: String,
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

impl Resource for OriginArea {
    const TABLE: &'static str = "origin_areas";
    const COLUMNS: &'static [Column] = &[
        required("country", "country", ColKind::Json),
        required("name", "name", ColKind::Text),
        required("code", "code", ColKind::Text),
    ];
    type Row = OriginArea;
}
