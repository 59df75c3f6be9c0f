use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use uuid::Uuid;

use crate::config::MediaConfig;

/// Folder prefix under which profile images are stored on the media host.
pub const PROFILE_FOLDER: &str = "user-profiles";

/// External media host, seen from the API layer.
///
/// `upload` failures propagate to the caller (no silent retry). `delete_by_url`
/// is best-effort: callers fire it in the background and a failure never rolls
/// back or blocks the primary mutation.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores the bytes and returns a stable, publicly retrievable URL.
    async fn upload(&self, body: Bytes, content_type: &str) -> anyhow::Result<String>;

    /// Removes the object a previously returned URL points at.
    async fn delete_by_url(&self, url: &str) -> anyhow::Result<()>;
}

/// Derives the storage key from a hosted URL: last path segment minus its
/// extension, re-prefixed with the profile folder.
///
/// Known fragility: this is a pure string operation tied to the current URL
/// layout. If the media host changes its URL scheme, deletion starts missing
/// objects silently instead of erroring.
pub fn key_from_url(url: &str) -> Option<String> {
    let segment = url.trim_end_matches('/').rsplit('/').next()?;
    let stem = segment.split('.').next().unwrap_or(segment);
    if stem.is_empty() {
        return None;
    }
    Some(format!("{PROFILE_FOLDER}/{stem}"))
}

/// S3-compatible media host (path-style, works against MinIO too). Objects are
/// keyed by a bare UUID under [`PROFILE_FOLDER`] so [`key_from_url`] recovers
/// the key exactly; the content type is carried by object metadata.
#[derive(Clone)]
pub struct S3Media {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3Media {
    pub async fn new(config: &MediaConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "static",
            ))
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&config.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MediaStore for S3Media {
    async fn upload(&self, body: Bytes, content_type: &str) -> anyhow::Result<String> {
        let key = format!("{PROFILE_FOLDER}/{}", Uuid::new_v4());
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("media put_object")?;
        Ok(format!("{}/{}/{}", self.public_base_url, self.bucket, key))
    }

    async fn delete_by_url(&self, url: &str) -> anyhow::Result<()> {
        let key = key_from_url(url).context("could not derive media key from url")?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .context("media delete_object")?;
        Ok(())
    }
}
