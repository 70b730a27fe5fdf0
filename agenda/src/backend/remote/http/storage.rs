use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use std::sync::Arc;
use tracing::debug;

use super::connection::HttpCore;
use crate::backend::remote::traits::ObjectStorage;

/// Storage-bucket collaborator
#[derive(Debug, Clone)]
pub struct HttpObjectStorage {
    core: Arc<HttpCore>,
}

impl HttpObjectStorage {
    pub(super) fn new(core: Arc<HttpCore>) -> Self {
        Self { core }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let url = self.core.storage_url(&format!("object/{}/{}", bucket, key));
        let size = bytes.len();
        let builder = self
            .core
            .request(Method::POST, &url)
            .header("x-upsert", "true")
            .header("content-type", content_type)
            .body(bytes);
        self.core.send(builder).await?;
        debug!(component = "storage", bucket, key, size, "Uploaded object");
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.core
            .storage_url(&format!("object/public/{}/{}", bucket, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::remote::http::HttpConnection;
    use crate::backend::remote::traits::Connection;

    #[tokio::test]
    async fn test_upload_upserts_object() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/storage/v1/object/avatars/u-1.jpg")
            .match_header("x-upsert", "true")
            .match_header("content-type", "image/jpeg")
            .match_body(vec![0xFF, 0xD8, 0xFF])
            .with_status(200)
            .with_body(r#"{"Key":"avatars/u-1.jpg"}"#)
            .create_async()
            .await;

        let connection = HttpConnection::new(&server.url(), "anon");
        let storage = connection.storage();
        storage
            .upload("avatars", "u-1.jpg", vec![0xFF, 0xD8, 0xFF], "image/jpeg")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            storage.public_url("avatars", "u-1.jpg"),
            format!("{}/storage/v1/object/public/avatars/u-1.jpg", server.url())
        );
    }

    #[tokio::test]
    async fn test_upload_failure_carries_storage_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/storage/v1/object/avatars/u-1.jpg")
            .with_status(400)
            .with_body(r#"{"statusCode":"404","error":"Bucket not found","message":"Bucket not found"}"#)
            .create_async()
            .await;

        let connection = HttpConnection::new(&server.url(), "anon");
        let error = connection
            .storage()
            .upload("avatars", "u-1.jpg", vec![1], "image/jpeg")
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "Bucket not found");
    }
}
