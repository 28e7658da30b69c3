use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::{optional, required, ColKind, Column, Resource};

/// Supplier master record. Country, origin area and bank accounts are
/// embedded value snapshots, matching how the trading desk captures them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub country: Value,
    pub origin_area: Value,
    pub initial: Option<String>,
    pub code: String,
    pub phone_number: String,
    pub alias: Option<String>,
    pub pic: String,
    pub tax_number: Option<String>,
    pub address: String,
    pub email: Option<String>,
    pub image_url: Option<String>,
    /// Array of {name, accountNumber, accountName, swiftCode}.
    pub bank_account: Option<Value>,
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

impl Resource for Supplier {
    const TABLE: &'static str = "suppliers";
    const COLUMNS: &'static [Column] = &[
        required("name", "name", ColKind::Text),
        required("country", "country", ColKind::Json),
        required("originArea", "origin_area", ColKind::Json),
        optional("initial", "initial", ColKind::Text),
        required("code", "code", ColKind::Text),
        required("phoneNumber", "phone_number", ColKind::Text),
        optional("alias", "alias", ColKind::Text),
        required("pic", "pic", ColKind::Text),
        optional("taxNumber", "tax_number", ColKind::Text),
        required("address", "address", ColKind::Text),
        optional("email", "email", ColKind::Text),
        optional("imageUrl", "image_url", ColKind::Text),
        optional("bankAccount", "bank_account", ColKind::Json),
    ];
    type Row = Supplier;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape_keeps_embedded_snapshots() {
        let supplier = Supplier {
            id: Uuid::new_v4(),
            name: "Acme Trading".into(),
            country: json!({"name": "Indonesia", "code": "ID"}),
            origin_area: json!({"name": "North", "code": "N"}),
            initial: None,
            code: "SUP-001".into(),
            phone_number: "+62 21 000".into(),
            alias: None,
            pic: "Budi".into(),
            tax_number: None,
            address: "Jl. Industri 1".into(),
            email: None,
            image_url: None,
            bank_account: Some(json!([{
                "name": "BCA",
                "accountNumber": "123",
                "accountName": "Acme",
                "swiftCode": "CENAIDJA",
            }])),
            status: Some(1),
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
            status_deleted: 0,
            deleted_at: None,
            user_created: None,
            user_updated: None,
            user_deleted: None,
        };
        let json = serde_json::to_value(&supplier).unwrap();
        assert_eq!(json["originArea"]["code"], "N");
        assert_eq!(json["bankAccount"][0]["swiftCode"], "CENAIDJA");
        assert_eq!(json["phoneNumber"], "+62 21 000");
    }
}
