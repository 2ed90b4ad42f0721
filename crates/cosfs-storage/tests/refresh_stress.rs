/// Client refreshes racing with saves: every save must finish on the client
/// it started with.
use std::sync::Arc;
use std::time::Duration;

use cosfs_core::config::{SettingsOverrides, StaticSettings, StorageSettings, UploadOptions};
use cosfs_storage::memory::{MemoryClientFactory, MemoryObjectClient};
use cosfs_storage::storage::{CosFileStorage, FileStorage};

fn settings() -> StorageSettings {
    StorageSettings {
        secret_id: "AKIDexample".into(),
        secret_key: "secret".into(),
        bucket: "stress-1250000000".into(),
        region: "ap-guangzhou".into(),
        chunk_size_kb: 1,
        endpoint_url: None,
    }
}

fn options() -> UploadOptions {
    UploadOptions {
        wait_poll: Duration::from_millis(20),
        ..UploadOptions::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn saves_survive_concurrent_refreshes() {
    let store = MemoryObjectClient::new();
    let factory = Arc::new(MemoryClientFactory::new(store.clone()));
    let storage = Arc::new(
        CosFileStorage::new("cos", StaticSettings(settings()), factory.clone())
            .with_upload_options(options()),
    );
    storage.refresh().await.unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..16usize {
        let storage = storage.clone();
        tasks.spawn(async move {
            let data = vec![i as u8; 3000 + i * 100];
            let mut input = data.as_slice();
            let r = storage
                .save_stream(&format!("file-{i}.bin"), &mut input)
                .await?;
            Ok::<_, cosfs_core::error::CosfsError>((r, data))
        });
    }
    for i in 0..8 {
        let storage = storage.clone();
        tasks.spawn(async move {
            storage
                .refresh_with(SettingsOverrides::credentials(
                    format!("AKIDrotated{i}"),
                    format!("rotated{i}"),
                ))
                .await?;
            Ok::<_, cosfs_core::error::CosfsError>((
                cosfs_core::types::FileRef::new("cos", "", "refresh"),
                Vec::new(),
            ))
        });
    }

    let mut saved = 0;
    while let Some(res) = tasks.join_next().await {
        let (r, data) = res.unwrap().unwrap();
        if r.file_name() == "refresh" {
            continue;
        }
        saved += 1;
        assert_eq!(
            store.object("stress-1250000000", r.path()).unwrap(),
            data.as_slice()
        );
    }

    assert_eq!(saved, 16);
    assert_eq!(store.commits().len(), 16);
    assert_eq!(store.pending_uploads(), 0);
    assert_eq!(factory.builds(), 9);
}

#[tokio::test]
async fn in_flight_save_keeps_its_bucket() {
    let store = MemoryObjectClient::new();
    let factory = Arc::new(MemoryClientFactory::new(store.clone()));
    let storage = Arc::new(
        CosFileStorage::new("cos", StaticSettings(settings()), factory.clone())
            .with_upload_options(options()),
    );
    storage.refresh().await.unwrap();
    store.delay_part(1, Duration::from_millis(300));

    let saving = {
        let storage = storage.clone();
        tokio::spawn(async move {
            let mut input: &[u8] = &[7u8; 2048];
            storage.save_stream("slow.bin", &mut input).await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    storage
        .refresh_with(SettingsOverrides {
            bucket: Some("moved-1250000000".into()),
            ..SettingsOverrides::default()
        })
        .await
        .unwrap();
    assert_eq!(storage.current_settings().unwrap().bucket, "moved-1250000000");

    let r = saving.await.unwrap().unwrap();
    let commits = store.commits();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].bucket, "stress-1250000000");
    assert!(store.object("stress-1250000000", r.path()).is_some());
    assert!(store.object("moved-1250000000", r.path()).is_none());
}
