#[cfg(feature = "cos")]
mod inner {
    use std::sync::Arc;

    use anyhow::Context;
    use async_trait::async_trait;
    use aws_sdk_s3::Client;
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
    use bytes::Bytes;
    use cosfs_core::config::StorageSettings;

    use crate::client::{ClientFactory, ObjectBody, ObjectClient, ObjectSummary, PartTag};

    /// Tencent COS client speaking the S3-compatible API.
    ///
    /// COS addresses buckets virtual-host style
    /// (`https://<bucket>.cos.<region>.myqcloud.com`), so path-style
    /// addressing stays off.
    pub struct CosObjectClient {
        client: Client,
    }

    impl CosObjectClient {
        /// Build a client authenticated with the settings' secret id/key.
        pub async fn connect(settings: &StorageSettings) -> anyhow::Result<Self> {
            settings.validate()?;

            let creds = aws_sdk_s3::config::Credentials::new(
                &settings.secret_id,
                &settings.secret_key,
                None,
                None,
                "cosfs-settings",
            );

            let sdk_config = aws_config::from_env()
                .region(aws_config::Region::new(settings.region.clone()))
                .credentials_provider(creds)
                .load()
                .await;

            let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                .endpoint_url(settings.endpoint())
                .build();

            Ok(Self {
                client: Client::from_conf(s3_config),
            })
        }
    }

    #[async_trait]
    impl ObjectClient for CosObjectClient {
        async fn initiate_multipart_upload(
            &self,
            bucket: &str,
            key: &str,
        ) -> anyhow::Result<String> {
            let resp = self
                .client
                .create_multipart_upload()
                .bucket(bucket)
                .key(key)
                .send()
                .await?;
            resp.upload_id()
                .map(str::to_string)
                .context("service returned no upload id")
        }

        async fn upload_part(
            &self,
            bucket: &str,
            key: &str,
            upload_id: &str,
            part_number: i32,
            data: Bytes,
        ) -> anyhow::Result<PartTag> {
            let len = data.len() as i64;
            let resp = self
                .client
                .upload_part()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .content_length(len)
                .body(ByteStream::from(data))
                .send()
                .await?;
            let etag = resp
                .e_tag()
                .with_context(|| format!("no ETag returned for part {part_number}"))?;
            Ok(PartTag {
                part_number,
                etag: etag.to_string(),
            })
        }

        async fn list_parts(
            &self,
            bucket: &str,
            key: &str,
            upload_id: &str,
        ) -> anyhow::Result<Vec<PartTag>> {
            let resp = self
                .client
                .list_parts()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .send()
                .await?;
            Ok(resp
                .parts()
                .iter()
                .filter_map(|p| {
                    Some(PartTag {
                        part_number: p.part_number()?,
                        etag: p.e_tag()?.to_string(),
                    })
                })
                .collect())
        }

        async fn complete_multipart_upload(
            &self,
            bucket: &str,
            key: &str,
            upload_id: &str,
            parts: &[PartTag],
        ) -> anyhow::Result<()> {
            let completed = CompletedMultipartUpload::builder()
                .set_parts(Some(
                    parts
                        .iter()
                        .map(|p| {
                            CompletedPart::builder()
                                .part_number(p.part_number)
                                .e_tag(&p.etag)
                                .build()
                        })
                        .collect(),
                ))
                .build();

            self.client
                .complete_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .multipart_upload(completed)
                .send()
                .await?;
            Ok(())
        }

        async fn get_object(&self, bucket: &str, key: &str) -> anyhow::Result<ObjectBody> {
            let resp = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await?;
            Ok(Box::pin(resp.body.into_async_read()))
        }

        async fn delete_object(&self, bucket: &str, key: &str) -> anyhow::Result<()> {
            self.client
                .delete_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await?;
            Ok(())
        }

        async fn list_objects(
            &self,
            bucket: &str,
            prefix: &str,
            max_keys: i32,
        ) -> anyhow::Result<Vec<ObjectSummary>> {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .max_keys(max_keys)
                .send()
                .await?;
            Ok(resp
                .contents()
                .iter()
                .filter_map(|o| {
                    Some(ObjectSummary {
                        key: o.key()?.to_string(),
                        size: o.size().unwrap_or(0).max(0) as u64,
                    })
                })
                .collect())
        }

        async fn test_connection(&self, bucket: &str) -> anyhow::Result<()> {
            self.client.head_bucket().bucket(bucket).send().await?;
            Ok(())
        }

        fn name(&self) -> &str {
            "cos"
        }
    }

    /// Builds [`CosObjectClient`]s.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct CosClientFactory;

    #[async_trait]
    impl ClientFactory for CosClientFactory {
        async fn build(
            &self,
            settings: &StorageSettings,
        ) -> anyhow::Result<Arc<dyn ObjectClient>> {
            Ok(Arc::new(CosObjectClient::connect(settings).await?))
        }
    }
}

#[cfg(feature = "cos")]
pub use inner::{CosClientFactory, CosObjectClient};
