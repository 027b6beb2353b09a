//! Configuration store backed by a HashiCorp Vault KV v2 secrets engine.
//!
//! Every named configuration is a secret under the mount given by
//! [`VAULT_PATH`](crate::params::VAULT_PATH). A lookup reads the secret's
//! metadata to learn its current version and then reads exactly that version,
//! so the returned [`Config`] always comes from a single version.

use async_trait::async_trait;
use config_types::Config;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client as ReqwestClient, Url};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::params::ConnectionParams;
use crate::ConfigStore;

/// Prefix of every Vault HTTP API route.
const API_PREFIX: &str = "v1";
const TOKEN_HEADER: &str = "x-vault-token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type Resolver = dyn Fn() -> Result<ConnectionParams> + Send + Sync;

/// Fetches configurations from Vault on demand.
///
/// Connection parameters are resolved once, on first use or through
/// [`VaultStore::init`], and kept for the lifetime of the store. Secrets are
/// never cached: every [`get_config`](ConfigStore::get_config) call reads the
/// current version from the server.
pub struct VaultStore {
    resolver: Box<Resolver>,
    session: Mutex<Option<Arc<Session>>>,
}

/// Resolved parameters together with the HTTP client that carries the token.
struct Session {
    http: ReqwestClient,
    address: Url,
    base_path: Vec<String>,
    params: ConnectionParams,
}

impl VaultStore {
    /// Create a store that resolves its parameters from the environment on first use.
    pub fn new() -> Self {
        Self::with_resolver(ConnectionParams::from_env)
    }

    /// Create a store and resolve its parameters from the environment right away.
    pub fn from_env() -> Result<Self> {
        let session = Session::connect(ConnectionParams::from_env()?)?;
        Ok(Self {
            resolver: Box::new(ConnectionParams::from_env),
            session: Mutex::new(Some(Arc::new(session))),
        })
    }

    /// Create a store with explicit parameters.
    ///
    /// When `params` carries an empty token the store falls back to the
    /// environment on first use.
    pub fn with_params(params: ConnectionParams) -> Result<Self> {
        let session = if params.token.is_empty() {
            None
        } else {
            Some(Arc::new(Session::connect(params)?))
        };
        Ok(Self {
            resolver: Box::new(ConnectionParams::from_env),
            session: Mutex::new(session),
        })
    }

    /// Create a store that resolves its parameters through `resolver`.
    pub fn with_resolver<F>(resolver: F) -> Self
    where
        F: Fn() -> Result<ConnectionParams> + Send + Sync + 'static,
    {
        Self {
            resolver: Box::new(resolver),
            session: Mutex::new(None),
        }
    }

    /// Resolve the connection parameters if that has not happened yet.
    pub async fn init(&self) -> Result<()> {
        self.session().await.map(|_| ())
    }

    /// Resolve the connection parameters again and rebuild the client.
    ///
    /// On failure the previous parameters stay in place.
    pub async fn reinit(&self) -> Result<()> {
        let mut slot = self.session.lock().await;
        let session = Session::connect((self.resolver)()?)?;
        *slot = Some(Arc::new(session));
        Ok(())
    }

    /// Parameters currently in use, if they have been resolved.
    pub async fn params(&self) -> Option<ConnectionParams> {
        let slot = self.session.lock().await;
        slot.as_ref().map(|session| session.params.clone())
    }

    async fn session(&self) -> Result<Arc<Session>> {
        let mut slot = self.session.lock().await;
        if let Some(session) = slot.as_ref() {
            if !session.params.token.is_empty() {
                return Ok(Arc::clone(session));
            }
        }

        let session = Arc::new(Session::connect((self.resolver)()?)?);
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }

    async fn fetch(&self, name: &str) -> Result<Config> {
        let name = split_path(name)?;
        let session = self.session().await?;

        let metadata_path = session.logical_path("metadata", &name);
        debug!(path = %metadata_path, "reading secret metadata");
        let metadata = session
            .read(&metadata_path, session.url("metadata", &name, None))
            .await?;
        let version = current_version(&metadata_path, &metadata)?;

        let data_path = session.logical_path("data", &name);
        debug!(path = %data_path, version, "reading secret data");
        let data = session
            .read(&data_path, session.url("data", &name, Some(version)))
            .await?;

        into_config(&data_path, version, data)
    }
}

impl Default for VaultStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for VaultStore {
    async fn get_config(&self, name: &str) -> Result<Config> {
        match self.fetch(name).await {
            Ok(config) => {
                debug!(name, keys = config.len(), "fetched configuration");
                Ok(config)
            }
            Err(err) => {
                warn!(name, error = %err, "failed to fetch configuration");
                Err(err)
            }
        }
    }
}

impl Session {
    fn connect(params: ConnectionParams) -> Result<Self> {
        let address = Url::parse(params.address.trim_end_matches('/')).map_err(|e| {
            StoreError::InvalidAddress {
                address: params.address.clone(),
                reason: e.to_string(),
            }
        })?;
        if address.cannot_be_a_base() {
            return Err(StoreError::InvalidAddress {
                address: params.address.clone(),
                reason: "address cannot carry a path".to_string(),
            });
        }

        let base_path = split_path(&params.base_path)?
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut token =
            HeaderValue::from_str(&params.token).map_err(|_| StoreError::InvalidToken)?;
        token.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", params.token))
            .map_err(|_| StoreError::InvalidToken)?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, token);
        headers.insert(AUTHORIZATION, bearer);

        let http = ReqwestClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|source| StoreError::Client {
                address: params.address.clone(),
                source,
            })?;

        info!(
            address = %params.address,
            base_path = %params.base_path,
            "initialized vault session"
        );

        Ok(Self {
            http,
            address,
            base_path,
            params,
        })
    }

    /// Vault logical path, e.g. `secret/data/app`, used to identify requests in errors.
    fn logical_path(&self, section: &str, name: &[&str]) -> String {
        let mut segments: Vec<&str> = self.base_path.iter().map(String::as_str).collect();
        segments.push(section);
        segments.extend_from_slice(name);
        segments.join("/")
    }

    fn url(&self, section: &str, name: &[&str], version: Option<u64>) -> Url {
        let mut url = self.address.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(API_PREFIX)
                .extend(&self.base_path)
                .push(section)
                .extend(name);
        }
        if let Some(version) = version {
            url.query_pairs_mut()
                .append_pair("version", &version.to_string());
        }
        url
    }

    async fn read(&self, path: &str, url: Url) -> Result<Value> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| StoreError::Request {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let errors = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.errors)
                .unwrap_or_default();
            return Err(StoreError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                errors,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|source| StoreError::Decode {
                path: path.to_string(),
                source,
            })
    }
}

/// Error body Vault sends along with non-success responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

/// Split a slash separated path into its segments.
///
/// Leading and trailing slashes are ignored. Empty, `.` and `..` segments are
/// rejected so a name can never escape the mount it is read from.
fn split_path(path: &str) -> Result<Vec<&str>> {
    let invalid = |reason| StoreError::InvalidPath {
        path: path.to_string(),
        reason,
    };

    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(invalid("path is empty"));
    }

    trimmed
        .split('/')
        .map(|segment| match segment {
            "" => Err(invalid("path contains an empty segment")),
            "." | ".." => Err(invalid("path contains a relative segment")),
            _ => Ok(segment),
        })
        .collect()
}

fn current_version(path: &str, metadata: &Value) -> Result<u64> {
    match metadata.pointer("/data/current_version") {
        None | Some(Value::Null) => Err(StoreError::MissingVersion {
            path: path.to_string(),
        }),
        Some(value) => value.as_u64().ok_or_else(|| StoreError::InvalidVersion {
            path: path.to_string(),
            value: value.to_string(),
        }),
    }
}

fn into_config(path: &str, requested: u64, mut body: Value) -> Result<Config> {
    if let Some(value) = body.pointer("/data/metadata/version") {
        match value.as_u64() {
            Some(reported) if reported == requested => {}
            Some(reported) => {
                return Err(StoreError::VersionMismatch {
                    path: path.to_string(),
                    requested,
                    reported,
                });
            }
            None => {
                return Err(StoreError::InvalidVersion {
                    path: path.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }

    let Some(Value::Object(document)) = body.pointer_mut("/data/data").map(Value::take) else {
        return Err(StoreError::MissingData {
            path: path.to_string(),
        });
    };

    document
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(value) => Ok((key, value)),
            _ => Err(StoreError::NonStringValue {
                path: path.to_string(),
                key,
            }),
        })
        .collect()
}
