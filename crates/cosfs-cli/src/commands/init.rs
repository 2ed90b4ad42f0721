use anyhow::Result;
use std::path::Path;

use cosfs_core::config::CosfsConfig;

pub fn run(base_dir: &Path) -> Result<()> {
    println!("Initializing cosfs in {}", base_dir.display());

    std::fs::create_dir_all(base_dir)?;

    let config_path = CosfsConfig::default_path(base_dir);
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
    } else {
        let config = CosfsConfig::default_config(base_dir);
        config.save(&config_path)?;
        println!("Created config: {}", config_path.display());
    }

    println!("\ncosfs initialized. Next steps:");
    println!("  1. Add a COS storage to {}", config_path.display());
    println!("  2. Run `cosfs check` to test the connection");
    println!("  3. Run `cosfs put <file>` to store your first file");

    Ok(())
}
