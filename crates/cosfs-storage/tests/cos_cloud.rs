/// Integration tests against a real Tencent COS bucket.
///
/// These tests require real credentials and are skipped if env vars are not set.
///
/// Run with:
///   COS_TEST_SECRET_ID=AKID... \
///   COS_TEST_SECRET_KEY="..." \
///   COS_TEST_BUCKET=cosfs-test-1250000000 \
///   COS_TEST_REGION=ap-guangzhou \
///   cargo test -p cosfs-storage --test cos_cloud -- --nocapture
#[cfg(feature = "cos")]
mod cos_tests {
    use std::sync::Arc;

    use cosfs_core::config::{StaticSettings, StorageSettings};
    use cosfs_storage::cos::CosClientFactory;
    use cosfs_storage::storage::{CosFileStorage, FileStorage};
    use tokio::io::AsyncReadExt;

    fn get_settings() -> Option<StorageSettings> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Some(StorageSettings {
            secret_id: var("COS_TEST_SECRET_ID")?,
            secret_key: var("COS_TEST_SECRET_KEY")?,
            bucket: var("COS_TEST_BUCKET")?,
            region: var("COS_TEST_REGION")?,
            // Smallest part size COS accepts for non-final parts.
            chunk_size_kb: 1024,
            endpoint_url: var("COS_TEST_ENDPOINT_URL"),
        })
    }

    async fn get_storage() -> Option<CosFileStorage> {
        let settings = get_settings()?;
        let storage = CosFileStorage::new(
            "cos-test",
            StaticSettings(settings),
            Arc::new(CosClientFactory),
        );
        storage.refresh().await.expect("COS client refresh failed");
        Some(storage)
    }

    #[tokio::test]
    async fn cos_connection() {
        let Some(storage) = get_storage().await else {
            eprintln!("SKIP: COS_TEST_SECRET_ID not set");
            return;
        };
        storage
            .test_connection()
            .await
            .expect("COS connection failed");
        println!("OK: COS connection succeeded");
    }

    #[tokio::test]
    async fn cos_multipart_save_load_remove() {
        let Some(storage) = get_storage().await else {
            eprintln!("SKIP: COS_TEST_SECRET_ID not set");
            return;
        };

        // Three parts: 1 MiB, 1 MiB and a short tail.
        let data: Vec<u8> = (0..(2 * 1024 * 1024 + 4096)).map(|i| (i % 251) as u8).collect();

        // Save
        let mut input = data.as_slice();
        let r = storage
            .save_stream("integration-test.bin", &mut input)
            .await
            .expect("save failed");
        println!("OK: COS save to {}", r.path());

        // Exists
        assert!(storage.file_exists(&r).await.expect("exists failed"));

        // Load
        let mut body = storage.open_stream(&r).await.expect("open failed");
        let mut downloaded = Vec::new();
        body.read_to_end(&mut downloaded).await.expect("read failed");
        assert_eq!(downloaded, data);
        println!("OK: COS download matches");

        // Remove
        storage.remove_file(&r).await.expect("remove failed");
        assert!(!storage.file_exists(&r).await.expect("exists failed"));
        println!("OK: COS file removed");
    }
}
