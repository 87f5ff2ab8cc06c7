//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from r2img-core.

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_smithy_types::byte_stream::ByteStream;

use r2img_core::config::R2_REGION;
use r2img_core::{Config, Error, ListOptions, ListResult, ObjectInfo, ObjectStore, Result};

/// S3 client bound to the configured bucket
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Client {
    /// Create a new S3 client from the loaded configuration
    pub async fn new(config: &Config) -> Result<Self> {
        let endpoint = config.endpoint_url();

        // Build credentials provider
        let credentials = aws_credential_types::Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None, // session token
            None, // expiry
            "r2img-static-credentials",
        );

        // Build SDK config
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(R2_REGION))
            .endpoint_url(&endpoint)
            .load()
            .await;

        // Path-style addressing works for R2 and for local S3-compatible servers
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        tracing::debug!(endpoint = %endpoint, bucket = %config.bucket, "created S3 client");

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        })
    }

    fn object_path(&self, key: &str) -> String {
        format!("{}/{}", self.bucket, key)
    }

    /// Resolve a bare HEAD 404, which is the same for a missing key and a
    /// missing bucket
    async fn missing_object(&self, key: &str) -> Error {
        match self.inner.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Error::NotFound(key.to_string()),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => {
                Error::BucketNotFound(self.bucket.clone())
            }
            Err(e) => classify(e, &self.bucket, &self.bucket),
        }
    }
}

/// Map an SDK error onto the core error kinds
fn classify<E>(err: SdkError<E, HttpResponse>, target: &str, bucket: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = err.code().map(str::to_string);
    let message = match err.message() {
        Some(message) => message.to_string(),
        None => DisplayErrorContext(&err).to_string(),
    };
    classify_response(code.as_deref(), status, &message, target, bucket)
}

/// Error code first, then HTTP status, then the rendered message
///
/// HEAD responses carry no body, so they only ever have a status.
fn classify_response(
    code: Option<&str>,
    status: Option<u16>,
    message: &str,
    target: &str,
    bucket: &str,
) -> Error {
    match (code, status) {
        (Some("NoSuchBucket"), _) => Error::BucketNotFound(bucket.to_string()),
        (Some("NoSuchKey" | "NotFound"), _) => Error::NotFound(target.to_string()),
        (
            Some(
                "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "Unauthorized"
                | "Forbidden",
            ),
            _,
        ) => Error::Auth(format!("{target}: {message}")),
        (Some(_), Some(401 | 403)) => Error::Auth(format!("{target}: {message}")),
        (None, Some(status @ (401 | 403))) => {
            Error::Auth(format!("{target}: access denied (status {status})"))
        }
        (None, Some(404)) => Error::NotFound(target.to_string()),
        (None, Some(status)) => Error::Network(format!("{target}: status {status}")),
        _ if message.contains("NoSuchBucket") => Error::BucketNotFound(bucket.to_string()),
        _ => Error::Network(format!("{target}: {message}")),
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<ObjectInfo> {
        let size = data.len() as i64;

        let response = self
            .inner
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| classify(e, &self.object_path(key), &self.bucket))?;

        let mut info = ObjectInfo::new(key, size);
        if let Some(etag) = response.e_tag() {
            info.etag = Some(etag.trim_matches('"').to_string());
        }
        info.content_type = Some(content_type.to_string());
        info.last_modified = Some(jiff::Timestamp::now());

        Ok(info)
    }

    async fn list_objects(&self, options: ListOptions) -> Result<ListResult> {
        let mut request = self.inner.list_objects_v2().bucket(&self.bucket);

        if let Some(prefix) = &options.prefix {
            request = request.prefix(prefix);
        }

        if let Some(max) = options.max_keys {
            request = request.max_keys(max);
        }

        if let Some(token) = &options.continuation_token {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(e, &self.bucket, &self.bucket))?;

        let items = response
            .contents()
            .iter()
            .map(|object| {
                let key = object.key().unwrap_or_default();
                let mut info = ObjectInfo::new(key, object.size().unwrap_or(0));

                if let Some(modified) = object.last_modified() {
                    info.last_modified = jiff::Timestamp::from_second(modified.secs()).ok();
                }

                if let Some(etag) = object.e_tag() {
                    info.etag = Some(etag.trim_matches('"').to_string());
                }

                info
            })
            .collect();

        Ok(ListResult {
            items,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(|s| s.to_string()),
        })
    }

    async fn head_object(&self, key: &str) -> Result<ObjectInfo> {
        let request = self.inner.head_object().bucket(&self.bucket).key(key);
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => {
                return Err(self.missing_object(key).await);
            }
            Err(e) => return Err(classify(e, &self.object_path(key), &self.bucket)),
        };

        let mut info = ObjectInfo::new(key, response.content_length().unwrap_or(0));

        if let Some(modified) = response.last_modified() {
            info.last_modified = jiff::Timestamp::from_second(modified.secs()).ok();
        }

        if let Some(etag) = response.e_tag() {
            info.etag = Some(etag.trim_matches('"').to_string());
        }

        if let Some(ct) = response.content_type() {
            info.content_type = Some(ct.to_string());
        }

        Ok(info)
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        // DeleteObject succeeds for missing keys, so check existence first.
        self.head_object(key).await?;

        self.inner
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, &self.object_path(key), &self.bucket))?;

        tracing::debug!(key, bucket = %self.bucket, "deleted object");
        Ok(())
    }
}
