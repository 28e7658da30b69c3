use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::{optional, required, ColKind, Column, Resource};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MaterialCategory {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
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

impl Resource for MaterialCategory {
    const TABLE: &'static str = "material_categories";
    const COLUMNS: &'static [Column] = &[
        required("name", "name", ColKind::Text),
        optional("code", "code", ColKind::Text),
        optional("description", "description", ColKind::Text),
    ];
    type Row = MaterialCategory;
}
