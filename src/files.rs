use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/files/upload", post(upload))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Multipart relay to disk. Each file part is stored under a unique name;
/// non-file parts are ignored.
#[instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let dir = std::path::Path::new(&state.config.upload_dir);
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let Some(original) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let stored = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(&original));
        tokio::fs::write(dir.join(&stored), &data)
            .await
            .map_err(|e| {
                error!(error = %e, file = %stored, "file write failed");
                ApiError::Internal(e.into())
            })?;
        info!(file = %stored, size = data.len(), "file stored");
        files.push(stored);
    }

    Ok(Json(json!({ "message": "success", "files": files })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_safe_chars() {
        assert_eq!(sanitize_file_name("report-2024.v1.pdf"), "report-2024.v1.pdf");
    }

    #[test]
    fn sanitize_neutralizes_path_tricks() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name("a b\\c"), "a_b_c");
    }
}
