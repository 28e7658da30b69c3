use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::{optional, required, ColKind, Column, Resource};

/// Harmonized System tariff line: duty/tax percentages and permit flags
/// as maintained by the import desk.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Hscode {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub bm: Option<f64>,
    pub ppn: Option<f64>,
    pub pph: Option<f64>,
    pub lartas: Option<f64>,
    pub spi_permit: Option<f64>,
    pub sni: Option<f64>,
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

impl Resource for Hscode {
    const TABLE: &'static str = "hscodes";
    const COLUMNS: &'static [Column] = &[
        required("code", "code", ColKind::Text),
        required("name", "name", ColKind::Text),
        optional("description", "description", ColKind::Text),
        optional("bm", "bm", ColKind::Float),
        optional("ppn", "ppn", ColKind::Float),
        optional("pph", "pph", ColKind::Float),
        optional("lartas", "lartas", ColKind::Float),
        optional("spiPermit", "spi_permit", ColKind::Float),
        optional("sni", "sni", ColKind::Float),
    ];
    type Row = Hscode;
}
