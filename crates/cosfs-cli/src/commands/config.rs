use anyhow::Result;
use std::path::Path;

use cosfs_core::config::CosfsConfig;

pub fn run(base_dir: &Path) -> Result<()> {
    let config_path = CosfsConfig::default_path(base_dir);
    let config = CosfsConfig::load(&config_path)?;

    println!("Config: {}", config_path.display());
    println!();
    println!("  Default storage: {}", config.cosfs.default_storage);
    println!("  Management API:  {}", config.web.listen_addr);
    println!(
        "  Admin token:     {}",
        if config.web.admin_token.is_some() { "set" } else { "not set" }
    );
    println!();

    if config.storages.is_empty() {
        println!("  No storages configured.");
        println!();
        println!("  Add storages to {}:", config_path.display());
        println!("  [[storages]]");
        println!("  name = \"cos\"");
        println!("  type = \"cos\"    # or \"local\"");
        println!("  secret_id = \"AKID...\"");
        println!("  secret_key = \"...\"");
        println!("  bucket = \"examplebucket-1250000000\"");
        println!("  region = \"ap-guangzhou\"");
        return Ok(());
    }

    println!("  Storages ({}):", config.storages.len());
    for s in &config.storages {
        println!(
            "    - {} (type={}, bucket={}, region={}, chunk={} KB, concurrency={})",
            s.name,
            s.storage_type,
            s.bucket.as_deref().unwrap_or("-"),
            s.region.as_deref().unwrap_or("-"),
            s.chunk_size_kb,
            s.upload_concurrency,
        );
    }

    Ok(())
}
