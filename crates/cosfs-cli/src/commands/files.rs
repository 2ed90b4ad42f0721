use std::path::Path;

use anyhow::{Context, Result};
use cosfs_core::types::FileRef;
use tokio::io::AsyncWriteExt;

use super::storages;

pub async fn put(
    base_dir: &Path,
    path: &Path,
    storage: Option<&str>,
    name: Option<&str>,
) -> Result<()> {
    let (_, locator) = storages::load(base_dir).await?;
    let storage = match storage {
        Some(name) => locator.by_name(name)?,
        None => locator.default_storage()?,
    };

    let file_name = match name {
        Some(n) => n.to_string(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", path.display()))?,
    };

    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("cannot open {}", path.display()))?;
    let reference = storage.save_stream(&file_name, &mut file).await?;

    println!("{reference}");
    Ok(())
}

pub async fn get(base_dir: &Path, reference: &str, dest: &Path) -> Result<()> {
    let reference: FileRef = reference.parse()?;
    let (_, locator) = storages::load(base_dir).await?;
    let storage = locator.by_name(reference.storage_name())?;

    let mut body = storage.open_stream(&reference).await?;
    if dest == Path::new("-") {
        let mut out = tokio::io::stdout();
        tokio::io::copy(&mut body, &mut out).await?;
        out.flush().await?;
    } else {
        let mut out = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("cannot create {}", dest.display()))?;
        let bytes = tokio::io::copy(&mut body, &mut out).await?;
        out.flush().await?;
        println!(
            "Downloaded {} ({bytes} bytes) to {}",
            reference.file_name(),
            dest.display()
        );
    }
    Ok(())
}

pub async fn rm(base_dir: &Path, reference: &str) -> Result<()> {
    let reference: FileRef = reference.parse()?;
    let (_, locator) = storages::load(base_dir).await?;
    locator
        .by_name(reference.storage_name())?
        .remove_file(&reference)
        .await?;
    println!("Removed {}", reference.file_name());
    Ok(())
}

pub async fn exists(base_dir: &Path, reference: &str) -> Result<()> {
    let reference: FileRef = reference.parse()?;
    let (_, locator) = storages::load(base_dir).await?;
    let found = locator
        .by_name(reference.storage_name())?
        .file_exists(&reference)
        .await?;
    println!("{}", if found { "yes" } else { "no" });
    Ok(())
}
