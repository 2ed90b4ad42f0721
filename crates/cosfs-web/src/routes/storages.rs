use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use cosfs_core::types::StorageType;

use crate::models::StorageResponse;
use crate::state::AppState;

pub async fn list_storages(State(state): State<Arc<AppState>>) -> Json<Vec<StorageResponse>> {
    let locator = state.management.locator();
    Json(
        locator
            .all()
            .map(|s| {
                let name = s.storage_name().to_string();
                let default = name == locator.default_name();
                match s.as_cos() {
                    Some(cos) => {
                        let settings = cos.current_settings();
                        StorageResponse {
                            name,
                            storage_type: StorageType::Cos.to_string(),
                            default,
                            initialized: settings.is_some(),
                            bucket: settings.as_ref().map(|c| c.bucket.clone()),
                            region: settings.as_ref().map(|c| c.region.clone()),
                            chunk_size_kb: settings.as_ref().map(|c| c.chunk_size_kb),
                            endpoint_url: settings.map(|c| c.endpoint()),
                        }
                    }
                    None => StorageResponse {
                        name,
                        storage_type: StorageType::Local.to_string(),
                        default,
                        initialized: true,
                        bucket: None,
                        region: None,
                        chunk_size_kb: None,
                        endpoint_url: None,
                    },
                }
            })
            .collect(),
    )
}
