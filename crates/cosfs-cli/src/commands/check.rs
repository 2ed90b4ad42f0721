use anyhow::Result;
use std::path::Path;

use super::storages;

pub async fn run(base_dir: &Path) -> Result<()> {
    let (_, locator) = storages::load(base_dir).await?;

    let mut failed = 0;
    for storage in locator.all() {
        let Some(cos) = storage.as_cos() else {
            println!("  {:<16} local, skipped", storage.storage_name());
            continue;
        };
        if !cos.is_initialized() {
            failed += 1;
            println!("  {:<16} FAILED: client not initialized", storage.storage_name());
            continue;
        }
        match cos.test_connection().await {
            Ok(()) => println!("  {:<16} OK", storage.storage_name()),
            Err(e) => {
                failed += 1;
                println!("  {:<16} FAILED: {e}", storage.storage_name());
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} storage(s) not reachable");
    }
    Ok(())
}
