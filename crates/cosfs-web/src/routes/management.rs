use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use cosfs_storage::management::SettingsUpdate;

use super::ApiError;
use crate::models::{RefreshRequest, RefreshResponse};
use crate::state::AppState;

pub async fn refresh_default(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let status = state.management.refresh_default().await?;
    Ok(Json(RefreshResponse { status }))
}

pub async fn refresh_storage(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Option<Json<RefreshRequest>>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let mgmt = &state.management;

    let status = if req.is_settings_update() {
        mgmt.refresh_with_settings(&name, settings_update(req)?)
            .await?
    } else {
        match (req.secret_id, req.secret_key) {
            (Some(id), Some(key)) => mgmt.refresh_with_credentials(&name, &id, &key).await?,
            (None, None) => mgmt.refresh_storage(&name).await?,
            _ => {
                return Err(ApiError::BadRequest(
                    "secret_id and secret_key must be given together".into(),
                ));
            }
        }
    };
    Ok(Json(RefreshResponse { status }))
}

fn settings_update(req: RefreshRequest) -> Result<SettingsUpdate, ApiError> {
    let missing = |field: &str| ApiError::BadRequest(format!("missing field {field}"));
    Ok(SettingsUpdate {
        secret_id: req.secret_id.ok_or_else(|| missing("secret_id"))?,
        secret_key: req.secret_key.ok_or_else(|| missing("secret_key"))?,
        region: req.region.ok_or_else(|| missing("region"))?,
        bucket: req.bucket.ok_or_else(|| missing("bucket"))?,
        chunk_size_kb: req.chunk_size_kb.ok_or_else(|| missing("chunk_size_kb"))?,
        endpoint_url: req.endpoint_url,
    })
}
