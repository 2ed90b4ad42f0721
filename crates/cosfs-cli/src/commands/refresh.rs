use anyhow::{Context, Result};
use std::path::Path;

use cosfs_core::config::CosfsConfig;

/// Send a refresh to the management API of the running `cosfs serve`.
pub async fn run(
    base_dir: &Path,
    storage: Option<&str>,
    credentials: Option<(&str, &str)>,
) -> Result<()> {
    let config = CosfsConfig::load(&CosfsConfig::default_path(base_dir))?;
    let base_url = management_url(&config.web.listen_addr);

    // New credentials always target a named storage.
    let storage = match (storage, credentials) {
        (None, Some(_)) => Some(config.cosfs.default_storage.as_str()),
        (s, _) => s,
    };

    let status = send(
        &base_url,
        config.web.admin_token.as_deref(),
        storage,
        credentials,
    )
    .await?;
    println!("{status}");
    Ok(())
}

/// Base URL of the management API reachable from this host.
pub fn management_url(listen_addr: &str) -> String {
    let addr = match listen_addr.rsplit_once(':') {
        Some(("0.0.0.0", port)) => format!("127.0.0.1:{port}"),
        Some(("[::]", port)) => format!("[::1]:{port}"),
        _ => listen_addr.to_string(),
    };
    format!("http://{addr}")
}

pub async fn send(
    base_url: &str,
    admin_token: Option<&str>,
    storage: Option<&str>,
    credentials: Option<(&str, &str)>,
) -> Result<String> {
    let url = match storage {
        Some(name) => format!("{base_url}/api/storages/{name}/refresh"),
        None => format!("{base_url}/api/refresh"),
    };

    let mut request = reqwest::Client::new().post(&url);
    if let Some(token) = admin_token {
        request = request.bearer_auth(token);
    }
    if let Some((secret_id, secret_key)) = credentials {
        request = request.json(&serde_json::json!({
            "secret_id": secret_id,
            "secret_key": secret_key,
        }));
    }

    let response = request
        .send()
        .await
        .with_context(|| format!("cannot reach management API at {base_url}, is `cosfs serve` running?"))?;

    let code = response.status();
    let body: serde_json::Value = response.json().await.unwrap_or_default();
    if !code.is_success() {
        let message = body["error"].as_str().unwrap_or("no details");
        anyhow::bail!("refresh failed ({code}): {message}");
    }

    body["status"]
        .as_str()
        .map(str::to_string)
        .context("management API returned no status")
}
