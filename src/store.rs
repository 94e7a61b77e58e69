//! # Object Store
//!
//! The two write operations the uploader needs: put a versioned object, then
//! copy it onto the alias key with replaced headers. The trait keeps the
//! publication flow independent of the SDK; `S3ObjectStore` is the real
//! backend.
//!
//! Neither operation retries on its own. Retry/backoff is whatever the SDK
//! client was configured with.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{MetadataDirective, ServerSideEncryption};
use aws_sdk_s3::Client;

use crate::errors::{AppError, AppResult};

/// A full-object write.
#[derive(Clone, Debug, PartialEq)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub content_disposition: Option<String>,
    pub cache_control: String,
    pub server_side_encryption: String,
    pub checksum_sha256: String,
    pub metadata: HashMap<String, String>,
}

/// A same-bucket copy with metadata directive REPLACE.
#[derive(Clone, Debug, PartialEq)]
pub struct CopyObjectRequest {
    pub bucket: String,
    pub source_key: String,
    pub dest_key: String,
    pub content_type: String,
    pub content_disposition: Option<String>,
    pub cache_control: String,
    pub server_side_encryption: String,
    pub metadata: HashMap<String, String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes the object and returns the key that was written.
    async fn put_object(&self, request: PutObjectRequest) -> AppResult<String>;

    async fn copy_object(&self, request: CopyObjectRequest) -> AppResult<()>;
}

pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

/// `CopySource` value: `{bucket}/{key}` with each key segment URL-encoded.
fn copy_source(bucket: &str, key: &str) -> String {
    let encoded: Vec<_> = key.split('/').map(urlencoding::encode).collect();
    format!("{}/{}", bucket, encoded.join("/"))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, request: PutObjectRequest) -> AppResult<String> {
        self.client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .body(ByteStream::from(request.body))
            .content_type(request.content_type)
            .set_content_disposition(request.content_disposition)
            .cache_control(request.cache_control)
            .server_side_encryption(ServerSideEncryption::from(
                request.server_side_encryption.as_str(),
            ))
            .checksum_sha256(request.checksum_sha256)
            .set_metadata(Some(request.metadata))
            .send()
            .await
            .map_err(AppError::provider)?;

        Ok(request.key)
    }

    async fn copy_object(&self, request: CopyObjectRequest) -> AppResult<()> {
        self.client
            .copy_object()
            .bucket(&request.bucket)
            .key(&request.dest_key)
            .copy_source(copy_source(&request.bucket, &request.source_key))
            .metadata_directive(MetadataDirective::Replace)
            .content_type(request.content_type)
            .set_content_disposition(request.content_disposition)
            .cache_control(request.cache_control)
            .server_side_encryption(ServerSideEncryption::from(
                request.server_side_encryption.as_str(),
            ))
            .set_metadata(Some(request.metadata))
            .send()
            .await
            .map_err(AppError::provider)?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq)]
    pub enum StoreCall {
        Put(PutObjectRequest),
        Copy(CopyObjectRequest),
    }

    /// In-memory store recording every call; optionally fails one operation.
    #[derive(Default)]
    pub struct RecordingStore {
        pub calls: Mutex<Vec<StoreCall>>,
        pub fail_put: bool,
        pub fail_copy: bool,
    }

    impl RecordingStore {
        pub fn calls(&self) -> Vec<StoreCall> {
            self.calls.lock().unwrap().clone()
        }

        fn denied() -> AppError {
            AppError::StoreClient {
                code: "AccessDenied".to_string(),
                message: "Access Denied".to_string(),
            }
        }
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn put_object(&self, request: PutObjectRequest) -> AppResult<String> {
            let key = request.key.clone();
            self.calls.lock().unwrap().push(StoreCall::Put(request));
            if self.fail_put {
                return Err(Self::denied());
            }
            Ok(key)
        }

        async fn copy_object(&self, request: CopyObjectRequest) -> AppResult<()> {
            self.calls.lock().unwrap().push(StoreCall::Copy(request));
            if self.fail_copy {
                return Err(Self::denied());
            }
            Ok(())
        }
    }
}
