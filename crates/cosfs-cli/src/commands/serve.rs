use anyhow::Result;
use std::path::Path;

use super::storages;

pub async fn run(base_dir: &Path) -> Result<()> {
    let (config, locator) = storages::load(base_dir).await?;
    cosfs_web::start_management_server(config.web, locator).await
}
