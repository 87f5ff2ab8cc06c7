//! Configuration management
//!
//! Configuration is read once per invocation from environment variables.
//! All required values are validated up front so that no file is opened and
//! no request is sent with a half-configured client.

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

/// Cloudflare account id, used to derive the R2 endpoint
pub const ENV_ACCOUNT_ID: &str = "R2_ACCOUNT_ID";
/// Access key id
pub const ENV_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
/// Secret access key
pub const ENV_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
/// Target bucket
pub const ENV_BUCKET_NAME: &str = "R2_BUCKET_NAME";
/// Public base URL objects are served from
pub const ENV_PUBLIC_URL: &str = "R2_PUBLIC_URL";
/// Optional endpoint override for other S3-compatible stores
pub const ENV_ENDPOINT_URL: &str = "R2_ENDPOINT_URL";

/// Region name R2 expects from S3 clients
pub const R2_REGION: &str = "auto";

/// Immutable runtime configuration
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Account identifier
    pub account_id: String,

    /// Access key ID
    pub access_key_id: String,

    /// Secret access key
    pub secret_access_key: String,

    /// Bucket name
    pub bucket: String,

    /// Public base URL, always ending with `/`
    pub public_url: Url,

    /// Explicit endpoint, when not talking to R2 directly
    pub endpoint_override: Option<Url>,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Every missing variable is reported in a single error so the user can
    /// fix their environment in one pass.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let account_id = value(ENV_ACCOUNT_ID);
        let access_key_id = value(ENV_ACCESS_KEY_ID);
        let secret_access_key = value(ENV_SECRET_ACCESS_KEY);
        let bucket = value(ENV_BUCKET_NAME);
        let public_url = value(ENV_PUBLIC_URL);

        let missing: Vec<&str> = [
            (ENV_ACCOUNT_ID, account_id.is_none()),
            (ENV_ACCESS_KEY_ID, access_key_id.is_none()),
            (ENV_SECRET_ACCESS_KEY, secret_access_key.is_none()),
            (ENV_BUCKET_NAME, bucket.is_none()),
            (ENV_PUBLIC_URL, public_url.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (
            Some(account_id),
            Some(access_key_id),
            Some(secret_access_key),
            Some(bucket),
            Some(public_url),
        ) = (account_id, access_key_id, secret_access_key, bucket, public_url)
        else {
            return Err(Error::Config(format!(
                "missing environment variable(s): {}",
                missing.join(", ")
            )));
        };

        if !account_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(Error::Config(format!(
                "{ENV_ACCOUNT_ID} must contain only letters, digits and '-'"
            )));
        }

        let public_url = parse_http_url(ENV_PUBLIC_URL, &public_url)?;
        let endpoint_override = value(ENV_ENDPOINT_URL)
            .map(|raw| parse_http_url(ENV_ENDPOINT_URL, &raw))
            .transpose()?;

        Ok(Self {
            account_id,
            access_key_id,
            secret_access_key,
            bucket,
            public_url: with_trailing_slash(public_url),
            endpoint_override,
        })
    }

    /// S3 endpoint the client talks to
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint_override {
            Some(url) => url.as_str().trim_end_matches('/').to_string(),
            None => format!("https://{}.r2.cloudflarestorage.com", self.account_id),
        }
    }

    /// Public URL an object with the given key is served from
    ///
    /// Each key segment is percent-encoded on its own, so file names with
    /// spaces still produce a valid link.
    pub fn public_url_for(&self, key: &str) -> String {
        let mut url = self.public_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(key.split('/').filter(|s| !s.is_empty()));
        }
        url.to_string()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("public_url", &self.public_url.as_str())
            .field(
                "endpoint_override",
                &self.endpoint_override.as_ref().map(Url::as_str),
            )
            .finish()
    }
}

fn parse_http_url(name: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(Error::Config(format!(
            "{name} must be an http(s) URL, got '{raw}'"
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::Config(format!(
            "{name} must not contain a query or fragment"
        )));
    }
    Ok(url)
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
