//! Backend-agnostic configuration retrieval.
//!
//! Callers depend on [`ConfigStore`] and receive a fresh [`Config`] per lookup.
//! [`VaultStore`] is the Vault KV v2 backend; it reads its connection
//! parameters from the environment variables listed in [`params`].

pub mod error;
pub mod params;
pub mod vault;

use async_trait::async_trait;
use std::sync::Arc;

pub use config_types::Config;
pub use error::{ErrorKind, Result, StoreError};
pub use params::ConnectionParams;
pub use vault::VaultStore;

/// A source of named configurations.
///
/// Implementations must be safe to call repeatedly and concurrently; calls for
/// different names are independent of each other.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetch the configuration called `name`.
    async fn get_config(&self, name: &str) -> Result<Config>;
}

#[async_trait]
impl<T: ConfigStore + ?Sized> ConfigStore for Arc<T> {
    async fn get_config(&self, name: &str) -> Result<Config> {
        (**self).get_config(name).await
    }
}

#[async_trait]
impl<T: ConfigStore + ?Sized> ConfigStore for Box<T> {
    async fn get_config(&self, name: &str) -> Result<Config> {
        (**self).get_config(name).await
    }
}
