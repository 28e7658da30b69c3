use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

use crate::audit::UserStamp;
use crate::error::ApiError;

/// SQL type of a column, used to type the binds built from untyped JSON
/// filter/body values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColKind {
    Text,
    Int,
    Float,
    Uuid,
    Timestamp,
    Json,
}

/// One column of an entity table: wire name, column name, bind type, and
/// whether request bodies may write it.
#[derive(Debug)]
pub struct Column {
    pub api: &'static str,
    pub sql: &'static str,
    pub kind: ColKind,
    pub writable: bool,
    pub required: bool,
}

pub const fn required(api: &'static str, sql: &'static str, kind: ColKind) -> Column {
    Column {
        api,
        sql,
        kind,
        writable: true,
        required: true,
    }
}

pub const fn optional(api: &'static str, sql: &'static str, kind: ColKind) -> Column {
    Column {
        api,
        sql,
        kind,
        writable: true,
        required: false,
    }
}

const fn readonly(api: &'static str, sql: &'static str, kind: ColKind) -> Column {
    Column {
        api,
        sql,
        kind,
        writable: false,
        required: false,
    }
}

/// Columns every entity table carries: id, status and the audit-trail shape.
/// The `user*` snapshots are owned by the mutation pipeline and never
/// writable from a request body.
pub const COMMON: &[Column] = &[
    readonly("id", "id", ColKind::Uuid),
    optional("status", "status", ColKind::Int),
    readonly("createdAt", "created_at", ColKind::Timestamp),
    readonly("updatedAt", "updated_at", ColKind::Timestamp),
    optional("statusDeleted", "status_deleted", ColKind::Int),
    optional("deletedAt", "deleted_at", ColKind::Timestamp),
    readonly("userCreated", "user_created", ColKind::Json),
    readonly("userUpdated", "user_updated", ColKind::Json),
    readonly("userDeleted", "user_deleted", ColKind::Json),
];

/// A table exposed through the generic CRUD pipeline.
pub trait Resource: Send + Sync + 'static {
    const TABLE: &'static str;
    /// Entity-specific columns; `COMMON` is implied.
    const COLUMNS: &'static [Column];
    type Row: for<'r> FromRow<'r, PgRow> + Serialize + Send + Unpin;
}

fn lookup(columns: &'static [Column], api: &str) -> Option<&'static Column> {
    columns
        .iter()
        .chain(COMMON.iter())
        .find(|c| c.api == api)
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Structured list filter: `{"where": .., "order": .., "limit": ..,
/// "skip": .., "fields": ..}`, passed URL-encoded in a `filter` query
/// parameter.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ListFilter {
    #[serde(rename = "where")]
    pub where_: Option<Map<String, Value>>,
    pub fields: Option<Value>,
    pub order: Option<Value>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
    pub offset: Option<i64>,
}

impl ListFilter {
    pub fn from_query(raw: Option<&str>) -> Result<Self, ApiError> {
        match raw {
            None => Ok(Self::default()),
            Some(s) => serde_json::from_str(s)
                .map_err(|e| ApiError::BadRequest(format!("invalid filter: {e}"))),
        }
    }

    fn skip(&self) -> Option<i64> {
        self.skip.or(self.offset)
    }
}

/// Standalone `where` query parameter used by count and update-all.
pub fn parse_where(raw: Option<&str>) -> Result<Option<Map<String, Value>>, ApiError> {
    match raw {
        None => Ok(None),
        Some(s) => serde_json::from_str(s)
            .map(Some)
            .map_err(|e| ApiError::BadRequest(format!("invalid where: {e}"))),
    }
}

fn type_mismatch(col: &Column) -> ApiError {
    ApiError::BadRequest(format!("invalid value for property {}", col.api))
}

fn parse_timestamp(col: &Column, v: &Value) -> Result<OffsetDateTime, ApiError> {
    let s = v.as_str().ok_or_else(|| type_mismatch(col))?;
    OffsetDateTime::parse(s, &Rfc3339).map_err(|_| type_mismatch(col))
}

fn parse_uuid(col: &Column, v: &Value) -> Result<Uuid, ApiError> {
    let s = v.as_str().ok_or_else(|| type_mismatch(col))?;
    Uuid::parse_str(s).map_err(|_| type_mismatch(col))
}

fn push_scalar(
    qb: &mut QueryBuilder<'static, Postgres>,
    col: &Column,
    v: &Value,
) -> Result<(), ApiError> {
    match col.kind {
        ColKind::Text => {
            let s = v.as_str().ok_or_else(|| type_mismatch(col))?;
            qb.push_bind(s.to_string());
        }
        ColKind::Int => {
            qb.push_bind(v.as_i64().ok_or_else(|| type_mismatch(col))?);
        }
        ColKind::Float => {
            qb.push_bind(v.as_f64().ok_or_else(|| type_mismatch(col))?);
        }
        ColKind::Uuid => {
            qb.push_bind(parse_uuid(col, v)?);
        }
        ColKind::Timestamp => {
            qb.push_bind(parse_timestamp(col, v)?);
        }
        ColKind::Json => {
            qb.push_bind(v.clone());
        }
    }
    Ok(())
}

fn push_in_list(
    qb: &mut QueryBuilder<'static, Postgres>,
    col: &Column,
    v: &Value,
) -> Result<(), ApiError> {
    let items = v.as_array().ok_or_else(|| type_mismatch(col))?;
    qb.push(col.sql);
    qb.push(" = ANY(");
    match col.kind {
        ColKind::Text => {
            let vals = items
                .iter()
                .map(|i| i.as_str().map(str::to_string).ok_or_else(|| type_mismatch(col)))
                .collect::<Result<Vec<_>, _>>()?;
            qb.push_bind(vals);
        }
        ColKind::Int => {
            let vals = items
                .iter()
                .map(|i| i.as_i64().ok_or_else(|| type_mismatch(col)))
                .collect::<Result<Vec<_>, _>>()?;
            qb.push_bind(vals);
        }
        ColKind::Float => {
            let vals = items
                .iter()
                .map(|i| i.as_f64().ok_or_else(|| type_mismatch(col)))
                .collect::<Result<Vec<_>, _>>()?;
            qb.push_bind(vals);
        }
        ColKind::Uuid => {
            let vals = items
                .iter()
                .map(|i| parse_uuid(col, i))
                .collect::<Result<Vec<_>, _>>()?;
            qb.push_bind(vals);
        }
        ColKind::Timestamp | ColKind::Json => return Err(type_mismatch(col)),
    }
    qb.push(")");
    Ok(())
}

fn push_operator(
    qb: &mut QueryBuilder<'static, Postgres>,
    col: &Column,
    op: &str,
    v: &Value,
) -> Result<(), ApiError> {
    let sql_op = match op {
        "gt" => " > ",
        "gte" => " >= ",
        "lt" => " < ",
        "lte" => " <= ",
        "neq" => " <> ",
        "like" => " LIKE ",
        "ilike" => " ILIKE ",
        "inq" => return push_in_list(qb, col, v),
        other => {
            return Err(ApiError::BadRequest(format!(
                "unsupported operator {other} on property {}",
                col.api
            )))
        }
    };
    if matches!(op, "like" | "ilike") && col.kind != ColKind::Text {
        return Err(type_mismatch(col));
    }
    qb.push(col.sql);
    qb.push(sql_op);
    push_scalar(qb, col, v)
}

/// Renders one `where` object (conditions joined with AND; `and`/`or` keys
/// recurse) onto the builder.
fn push_clause(
    qb: &mut QueryBuilder<'static, Postgres>,
    columns: &'static [Column],
    clause: &Map<String, Value>,
) -> Result<(), ApiError> {
    if clause.is_empty() {
        qb.push("TRUE");
        return Ok(());
    }
    let mut first = true;
    for (key, value) in clause {
        if !first {
            qb.push(" AND ");
        }
        first = false;
        match key.as_str() {
            joiner @ ("and" | "or") => {
                let parts = value
                    .as_array()
                    .ok_or_else(|| ApiError::BadRequest(format!("{joiner} must be an array")))?;
                let sep = if joiner == "and" { " AND " } else { " OR " };
                qb.push("(");
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        qb.push(sep);
                    }
                    let obj = part
                        .as_object()
                        .ok_or_else(|| ApiError::BadRequest(format!("{joiner} entries must be objects")))?;
                    qb.push("(");
                    push_clause(qb, columns, obj)?;
                    qb.push(")");
                }
                qb.push(")");
            }
            field => {
                let col = lookup(columns, field)
                    .ok_or_else(|| ApiError::BadRequest(format!("unknown property {field}")))?;
                match value {
                    Value::Null => {
                        qb.push(col.sql);
                        qb.push(" IS NULL");
                    }
                    Value::Object(ops) => {
                        let mut inner_first = true;
                        for (op, operand) in ops {
                            if !inner_first {
                                qb.push(" AND ");
                            }
                            inner_first = false;
                            push_operator(qb, col, op, operand)?;
                        }
                    }
                    scalar => {
                        qb.push(col.sql);
                        qb.push(" = ");
                        push_scalar(qb, col, scalar)?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn order_terms(columns: &'static [Column], order: &Value) -> Result<Vec<String>, ApiError> {
    let raw: Vec<&str> = match order {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items
            .iter()
            .map(|i| i.as_str().ok_or_else(|| ApiError::BadRequest("invalid order".into())))
            .collect::<Result<_, _>>()?,
        _ => return Err(ApiError::BadRequest("invalid order".into())),
    };
    let mut terms = Vec::with_capacity(raw.len());
    for term in raw {
        let mut parts = term.split_whitespace();
        let field = parts
            .next()
            .ok_or_else(|| ApiError::BadRequest("invalid order".into()))?;
        let dir = match parts.next() {
            None => "ASC",
            Some(d) if d.eq_ignore_ascii_case("asc") => "ASC",
            Some(d) if d.eq_ignore_ascii_case("desc") => "DESC",
            Some(other) => {
                return Err(ApiError::BadRequest(format!("invalid order direction {other}")))
            }
        };
        let col = lookup(columns, field)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown property {field}")))?;
        terms.push(format!("{} {dir}", col.sql));
    }
    Ok(terms)
}

/// Body keys checked against the writable column set; unknown or read-only
/// properties are rejected, mirroring a strict model schema.
fn writable_payload<R: Resource>(
    body: &Map<String, Value>,
) -> Result<Vec<(&'static Column, &Value)>, ApiError> {
    let mut cols = Vec::with_capacity(body.len());
    for (key, value) in body {
        let col = lookup(R::COLUMNS, key)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown property {key}")))?;
        if !col.writable {
            return Err(ApiError::BadRequest(format!("property {key} is read-only")));
        }
        cols.push((col, value));
    }
    Ok(cols)
}

fn check_required<R: Resource>(body: &Map<String, Value>) -> Result<(), ApiError> {
    for col in R::COLUMNS.iter().filter(|c| c.required) {
        let present = body.get(col.api).map(|v| !v.is_null()).unwrap_or(false);
        if !present {
            return Err(ApiError::BadRequest(format!("{} is required", col.api)));
        }
    }
    Ok(())
}

fn stamp_value(stamp: &UserStamp) -> Result<Value, ApiError> {
    serde_json::to_value(stamp).map_err(|e| ApiError::Internal(e.into()))
}

// ---------------------------------------------------------------------------
// Query builders (pure, unit-testable)
// ---------------------------------------------------------------------------

fn build_insert<R: Resource>(
    body: &Map<String, Value>,
    stamp: Option<&UserStamp>,
) -> Result<QueryBuilder<'static, Postgres>, ApiError> {
    check_required::<R>(body)?;
    let cols = writable_payload::<R>(body)?;

    if cols.is_empty() && stamp.is_none() {
        return Ok(QueryBuilder::new(format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING *",
            R::TABLE
        )));
    }

    let mut names: Vec<&str> = cols.iter().map(|(c, _)| c.sql).collect();
    if stamp.is_some() {
        names.push("user_created");
    }
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        R::TABLE,
        names.join(", ")
    ));
    let mut first = true;
    for (col, value) in &cols {
        if !first {
            qb.push(", ");
        }
        first = false;
        if value.is_null() {
            qb.push("NULL");
        } else {
            push_scalar(&mut qb, col, value)?;
        }
    }
    if let Some(stamp) = stamp {
        if !first {
            qb.push(", ");
        }
        qb.push_bind(stamp_value(stamp)?);
    }
    qb.push(") RETURNING *");
    Ok(qb)
}

fn push_update_set(
    qb: &mut QueryBuilder<'static, Postgres>,
    cols: &[(&'static Column, &Value)],
    stamp: Option<&UserStamp>,
) -> Result<(), ApiError> {
    let mut first = true;
    for (col, value) in cols {
        if !first {
            qb.push(", ");
        }
        first = false;
        qb.push(col.sql);
        qb.push(" = ");
        if value.is_null() {
            qb.push("NULL");
        } else {
            push_scalar(qb, col, value)?;
        }
    }
    if let Some(stamp) = stamp {
        if !first {
            qb.push(", ");
        }
        qb.push("updated_at = now(), user_updated = ");
        qb.push_bind(stamp_value(stamp)?);
    }
    Ok(())
}

fn build_update_by_id<R: Resource>(
    id: Uuid,
    body: &Map<String, Value>,
    stamp: Option<&UserStamp>,
) -> Result<Option<QueryBuilder<'static, Postgres>>, ApiError> {
    let cols = writable_payload::<R>(body)?;
    if cols.is_empty() && stamp.is_none() {
        return Ok(None);
    }
    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", R::TABLE));
    push_update_set(&mut qb, &cols, stamp)?;
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    Ok(Some(qb))
}

fn build_replace_by_id<R: Resource>(
    id: Uuid,
    body: &Map<String, Value>,
    stamp: Option<&UserStamp>,
) -> Result<QueryBuilder<'static, Postgres>, ApiError> {
    check_required::<R>(body)?;
    // Reject unknown keys up front, then write every writable column so the
    // row ends up exactly as the supplied document.
    writable_payload::<R>(body)?;
    let null = Value::Null;
    let cols: Vec<(&'static Column, &Value)> = R::COLUMNS
        .iter()
        .chain(COMMON.iter())
        .filter(|c| c.writable)
        .map(|c| (c, body.get(c.api).unwrap_or(&null)))
        .collect();
    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", R::TABLE));
    push_update_set(&mut qb, &cols, stamp)?;
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    Ok(qb)
}

fn build_update_all<R: Resource>(
    where_: Option<&Map<String, Value>>,
    body: &Map<String, Value>,
    stamp: Option<&UserStamp>,
) -> Result<Option<QueryBuilder<'static, Postgres>>, ApiError> {
    let cols = writable_payload::<R>(body)?;
    if cols.is_empty() && stamp.is_none() {
        return Ok(None);
    }
    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", R::TABLE));
    push_update_set(&mut qb, &cols, stamp)?;
    if let Some(clause) = where_ {
        qb.push(" WHERE ");
        push_clause(&mut qb, R::COLUMNS, clause)?;
    }
    Ok(Some(qb))
}

fn build_find<R: Resource>(
    filter: &ListFilter,
) -> Result<QueryBuilder<'static, Postgres>, ApiError> {
    let mut qb = QueryBuilder::new(format!("SELECT * FROM {}", R::TABLE));
    if let Some(clause) = &filter.where_ {
        qb.push(" WHERE ");
        push_clause(&mut qb, R::COLUMNS, clause)?;
    }
    if let Some(order) = &filter.order {
        let terms = order_terms(R::COLUMNS, order)?;
        if !terms.is_empty() {
            qb.push(" ORDER BY ");
            qb.push(terms.join(", "));
        }
    }
    if let Some(limit) = filter.limit {
        qb.push(" LIMIT ");
        qb.push_bind(limit);
    }
    if let Some(skip) = filter.skip() {
        qb.push(" OFFSET ");
        qb.push_bind(skip);
    }
    Ok(qb)
}

fn build_count<R: Resource>(
    where_: Option<&Map<String, Value>>,
) -> Result<QueryBuilder<'static, Postgres>, ApiError> {
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", R::TABLE));
    if let Some(clause) = where_ {
        qb.push(" WHERE ");
        push_clause(&mut qb, R::COLUMNS, clause)?;
    }
    Ok(qb)
}

// ---------------------------------------------------------------------------
// Store operations
// ---------------------------------------------------------------------------

pub async fn insert<R: Resource>(
    db: &PgPool,
    body: &Map<String, Value>,
    stamp: Option<&UserStamp>,
) -> Result<R::Row, ApiError> {
    let mut qb = build_insert::<R>(body, stamp)?;
    let row = qb.build_query_as::<R::Row>().fetch_one(db).await?;
    Ok(row)
}

pub async fn find<R: Resource>(db: &PgPool, filter: &ListFilter) -> Result<Vec<R::Row>, ApiError> {
    let mut qb = build_find::<R>(filter)?;
    let rows = qb.build_query_as::<R::Row>().fetch_all(db).await?;
    Ok(rows)
}

pub async fn count<R: Resource>(
    db: &PgPool,
    where_: Option<&Map<String, Value>>,
) -> Result<i64, ApiError> {
    let mut qb = build_count::<R>(where_)?;
    let (count,) = qb.build_query_as::<(i64,)>().fetch_one(db).await?;
    Ok(count)
}

pub async fn find_by_id<R: Resource>(db: &PgPool, id: Uuid) -> Result<Option<R::Row>, ApiError> {
    let mut qb = QueryBuilder::new(format!("SELECT * FROM {} WHERE id = ", R::TABLE));
    qb.push_bind(id);
    let row = qb.build_query_as::<R::Row>().fetch_optional(db).await?;
    Ok(row)
}

/// Returns whether a row was updated.
pub async fn update_by_id<R: Resource>(
    db: &PgPool,
    id: Uuid,
    body: &Map<String, Value>,
    stamp: Option<&UserStamp>,
) -> Result<bool, ApiError> {
    match build_update_by_id::<R>(id, body, stamp)? {
        Some(mut qb) => {
            let result = qb.build().execute(db).await?;
            Ok(result.rows_affected() > 0)
        }
        // Nothing to set; report whether the row exists.
        None => Ok(find_by_id::<R>(db, id).await?.is_some()),
    }
}

pub async fn replace_by_id<R: Resource>(
    db: &PgPool,
    id: Uuid,
    body: &Map<String, Value>,
    stamp: Option<&UserStamp>,
) -> Result<bool, ApiError> {
    let mut qb = build_replace_by_id::<R>(id, body, stamp)?;
    let result = qb.build().execute(db).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_all<R: Resource>(
    db: &PgPool,
    where_: Option<&Map<String, Value>>,
    body: &Map<String, Value>,
    stamp: Option<&UserStamp>,
) -> Result<u64, ApiError> {
    match build_update_all::<R>(where_, body, stamp)? {
        Some(mut qb) => {
            let result = qb.build().execute(db).await?;
            Ok(result.rows_affected())
        }
        None => Ok(0),
    }
}

pub async fn delete_by_id<R: Resource>(db: &PgPool, id: Uuid) -> Result<bool, ApiError> {
    let mut qb = QueryBuilder::new(format!("DELETE FROM {} WHERE id = ", R::TABLE));
    qb.push_bind(id);
    let result = qb.build().execute(db).await?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Field projection
// ---------------------------------------------------------------------------

/// Serializes rows and applies the filter's `fields` selection: an array of
/// names keeps only those, a `{name: bool}` map includes or excludes.
pub fn project<T: Serialize>(rows: &[T], fields: Option<&Value>) -> Result<Vec<Value>, ApiError> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut value = serde_json::to_value(row).map_err(|e| ApiError::Internal(e.into()))?;
        if let (Some(fields), Some(obj)) = (fields, value.as_object_mut()) {
            apply_fields(obj, fields)?;
        }
        out.push(value);
    }
    Ok(out)
}

fn apply_fields(obj: &mut Map<String, Value>, fields: &Value) -> Result<(), ApiError> {
    match fields {
        Value::Array(names) => {
            let keep: Vec<&str> = names
                .iter()
                .map(|n| n.as_str().ok_or_else(|| ApiError::BadRequest("invalid fields".into())))
                .collect::<Result<_, _>>()?;
            obj.retain(|k, _| keep.contains(&k.as_str()));
        }
        Value::Object(flags) => {
            let include: Vec<&str> = flags
                .iter()
                .filter(|(_, v)| v.as_bool() == Some(true))
                .map(|(k, _)| k.as_str())
                .collect();
            if include.is_empty() {
                let exclude: Vec<&str> = flags
                    .iter()
                    .filter(|(_, v)| v.as_bool() == Some(false))
                    .map(|(k, _)| k.as_str())
                    .collect();
                obj.retain(|k, _| !exclude.contains(&k.as_str()));
            } else {
                obj.retain(|k, _| include.contains(&k.as_str()));
            }
        }
        _ => return Err(ApiError::BadRequest("invalid fields".into())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, serde::Serialize, sqlx::FromRow)]
    struct WidgetRow {
        id: Uuid,
        name: String,
    }

    struct Widget;

    impl Resource for Widget {
        const TABLE: &'static str = "widgets";
        const COLUMNS: &'static [Column] = &[
            required("name", "name", ColKind::Text),
            optional("weight", "weight", ColKind::Float),
            optional("tags", "tags", ColKind::Json),
        ];
        type Row = WidgetRow;
    }

    fn body(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    fn stamp() -> UserStamp {
        UserStamp {
            id: Uuid::new_v4(),
            email: "ops@example.com".into(),
            display_name: "Ops".into(),
            image_url: None,
        }
    }

    #[test]
    fn insert_lists_columns_and_stamp() {
        let qb = build_insert::<Widget>(&body(json!({"name": "bolt", "weight": 1.5})), Some(&stamp()))
            .unwrap();
        assert_eq!(
            qb.sql(),
            "INSERT INTO widgets (name, weight, user_created) VALUES ($1, $2, $3) RETURNING *"
        );
    }

    #[test]
    fn insert_rejects_missing_required() {
        let err = build_insert::<Widget>(&body(json!({"weight": 2.0})), None)
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn insert_rejects_unknown_property() {
        let err = build_insert::<Widget>(&body(json!({"name": "x", "bogus": 1})), None)
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn insert_rejects_readonly_property() {
        let err = build_insert::<Widget>(
            &body(json!({"name": "x", "userCreated": {"id": "y"}})),
            None,
        )
        .err()
        .unwrap();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn where_equality_and_operator() {
        let filter = ListFilter::from_query(Some(
            r#"{"where": {"name": "bolt", "weight": {"gt": 2}}, "limit": 10, "skip": 5}"#,
        ))
        .unwrap();
        let qb = build_find::<Widget>(&filter).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT * FROM widgets WHERE name = $1 AND weight > $2 LIMIT $3 OFFSET $4"
        );
    }

    #[test]
    fn where_and_or_nesting() {
        let filter = ListFilter::from_query(Some(
            r#"{"where": {"or": [{"name": "a"}, {"and": [{"name": "b"}, {"weight": {"lt": 3}}]}]}}"#,
        ))
        .unwrap();
        let qb = build_find::<Widget>(&filter).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT * FROM widgets WHERE ((name = $1) OR (((name = $2) AND (weight < $3))))"
        );
    }

    #[test]
    fn where_null_renders_is_null() {
        let filter =
            ListFilter::from_query(Some(r#"{"where": {"deletedAt": null}}"#)).unwrap();
        let qb = build_find::<Widget>(&filter).unwrap();
        assert_eq!(qb.sql(), "SELECT * FROM widgets WHERE deleted_at IS NULL");
    }

    #[test]
    fn where_inq_uses_any() {
        let filter =
            ListFilter::from_query(Some(r#"{"where": {"name": {"inq": ["a", "b"]}}}"#)).unwrap();
        let qb = build_find::<Widget>(&filter).unwrap();
        assert_eq!(qb.sql(), "SELECT * FROM widgets WHERE name = ANY($1)");
    }

    #[test]
    fn where_unknown_property_rejected() {
        let filter = ListFilter::from_query(Some(r#"{"where": {"nope": 1}}"#)).unwrap();
        let err = build_find::<Widget>(&filter).err().unwrap();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn order_maps_api_names_to_columns() {
        let filter = ListFilter::from_query(Some(
            r#"{"order": ["createdAt DESC", "name"]}"#,
        ))
        .unwrap();
        let qb = build_find::<Widget>(&filter).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT * FROM widgets ORDER BY created_at DESC, name ASC"
        );
    }

    #[test]
    fn order_rejects_bad_direction() {
        let filter =
            ListFilter::from_query(Some(r#"{"order": "name SIDEWAYS"}"#)).unwrap();
        assert!(build_find::<Widget>(&filter).is_err());
    }

    #[test]
    fn update_by_id_stamps_pipeline_columns() {
        let qb = build_update_by_id::<Widget>(
            Uuid::new_v4(),
            &body(json!({"name": "nut"})),
            Some(&stamp()),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            qb.sql(),
            "UPDATE widgets SET name = $1, updated_at = now(), user_updated = $2 WHERE id = $3"
        );
    }

    #[test]
    fn update_by_id_without_stamp_or_body_is_noop() {
        let built =
            build_update_by_id::<Widget>(Uuid::new_v4(), &Map::new(), None).unwrap();
        assert!(built.is_none());
    }

    #[test]
    fn replace_by_id_writes_every_writable_column() {
        let qb = build_replace_by_id::<Widget>(
            Uuid::new_v4(),
            &body(json!({"name": "nut"})),
            None,
        )
        .unwrap();
        let sql = qb.sql();
        assert!(sql.contains("name = $1"));
        assert!(sql.contains("weight = NULL"));
        assert!(sql.contains("status = NULL"));
        assert!(!sql.contains("user_created"));
    }

    #[test]
    fn update_all_applies_where() {
        let where_ = body(json!({"weight": {"gte": 1}}));
        let qb = build_update_all::<Widget>(
            Some(&where_),
            &body(json!({"name": "bulk"})),
            Some(&stamp()),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            qb.sql(),
            "UPDATE widgets SET name = $1, updated_at = now(), user_updated = $2 WHERE weight >= $3"
        );
    }

    #[test]
    fn count_uses_where_only() {
        let where_ = body(json!({"name": "bolt"}));
        let qb = build_count::<Widget>(Some(&where_)).unwrap();
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM widgets WHERE name = $1");
    }

    #[test]
    fn project_keeps_listed_fields() {
        let rows = vec![WidgetRow {
            id: Uuid::new_v4(),
            name: "bolt".into(),
        }];
        let projected = project(&rows, Some(&json!(["name"]))).unwrap();
        assert_eq!(projected[0], json!({"name": "bolt"}));
    }

    #[test]
    fn project_excludes_false_flags() {
        let rows = vec![WidgetRow {
            id: Uuid::new_v4(),
            name: "bolt".into(),
        }];
        let projected = project(&rows, Some(&json!({"id": false}))).unwrap();
        assert_eq!(projected[0], json!({"name": "bolt"}));
    }
}
