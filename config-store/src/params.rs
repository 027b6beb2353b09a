use crate::error::{Result, StoreError};
use std::fmt;

/// Address of the Vault server.
pub const VAULT_ADDRESS: &str = "CUTTLE_AI_CONFIG_VAULT_ADDRESS";
/// Fallback address variable, the one the Vault CLI reads.
pub const DEFAULT_VAULT_ADDRESS: &str = "VAULT_ADDR";
/// Token used to authenticate against Vault.
pub const VAULT_TOKEN: &str = "CUTTLE_AI_CONFIG_VAULT_TOKEN";
/// Mount path under which named configurations live, e.g. `secret`.
pub const VAULT_PATH: &str = "CUTTLE_AI_CONFIG_VAULT_DEFAULT_PATH";

/// Everything needed to talk to the Vault server.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub address: String,
    pub token: String,
    pub base_path: String,
}

impl ConnectionParams {
    pub fn new(
        address: impl Into<String>,
        token: impl Into<String>,
        base_path: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            token: token.into(),
            base_path: base_path.into(),
        }
    }

    /// Resolve the parameters from the process environment.
    ///
    /// The environment is read on every call. No network activity happens here.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the parameters through `lookup`, which maps a variable name to its value.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let address = get(VAULT_ADDRESS)
            .or_else(|| get(DEFAULT_VAULT_ADDRESS))
            .ok_or_else(|| StoreError::MissingEnv {
                vars: vec![VAULT_ADDRESS, DEFAULT_VAULT_ADDRESS],
            })?;

        let token = get(VAULT_TOKEN).ok_or_else(|| StoreError::MissingEnv {
            vars: vec![VAULT_TOKEN],
        })?;

        let base_path = get(VAULT_PATH).ok_or_else(|| StoreError::MissingEnv {
            vars: vec![VAULT_PATH],
        })?;

        Ok(Self {
            address,
            token,
            base_path,
        })
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("address", &self.address)
            .field("token", &"[REDACTED]")
            .field("base_path", &self.base_path)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> Result<ConnectionParams> {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        ConnectionParams::from_lookup(|name| vars.get(name).map(|v| (*v).to_string()))
    }

    fn missing_vars(err: &StoreError) -> Vec<&'static str> {
        match err {
            StoreError::MissingEnv { vars } => vars.clone(),
            other => panic!("expected MissingEnv, got {other:?}"),
        }
    }

    #[test]
    fn test_resolves_all_parameters() {
        let params = resolve(&[
            (VAULT_ADDRESS, "https://vault.internal:8200"),
            (VAULT_TOKEN, "s.token"),
            (VAULT_PATH, "secret"),
        ])
        .unwrap();

        assert_eq!(
            params,
            ConnectionParams::new("https://vault.internal:8200", "s.token", "secret")
        );
    }

    #[test]
    fn test_falls_back_to_vault_addr() {
        let params = resolve(&[
            (DEFAULT_VAULT_ADDRESS, "http://127.0.0.1:8200"),
            (VAULT_TOKEN, "s.token"),
            (VAULT_PATH, "secret"),
        ])
        .unwrap();
        assert_eq!(params.address, "http://127.0.0.1:8200");
    }

    #[test]
    fn test_primary_address_wins_over_fallback() {
        let params = resolve(&[
            (VAULT_ADDRESS, "https://primary"),
            (DEFAULT_VAULT_ADDRESS, "https://fallback"),
            (VAULT_TOKEN, "s.token"),
            (VAULT_PATH, "secret"),
        ])
        .unwrap();
        assert_eq!(params.address, "https://primary");
    }

    #[test]
    fn test_missing_address_names_both_variables() {
        let err = resolve(&[
            (VAULT_TOKEN, "s.token"),
            (VAULT_PATH, "secret"),
        ])
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Initialization);
        assert_eq!(missing_vars(&err), vec![VAULT_ADDRESS, DEFAULT_VAULT_ADDRESS]);
        let message = err.to_string();
        assert!(message.contains(VAULT_ADDRESS));
        assert!(message.contains(DEFAULT_VAULT_ADDRESS));
    }

    #[test]
    fn test_missing_token() {
        let err = resolve(&[
            (VAULT_ADDRESS, "https://vault"),
            (VAULT_PATH, "secret"),
        ])
        .unwrap_err();
        assert_eq!(missing_vars(&err), vec![VAULT_TOKEN]);
    }

    #[test]
    fn test_missing_path() {
        let err = resolve(&[
            (VAULT_ADDRESS, "https://vault"),
            (VAULT_TOKEN, "s.token"),
        ])
        .unwrap_err();
        assert_eq!(missing_vars(&err), vec![VAULT_PATH]);
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let err = resolve(&[
            (VAULT_ADDRESS, ""),
            (DEFAULT_VAULT_ADDRESS, "https://fallback"),
            (VAULT_TOKEN, ""),
            (VAULT_PATH, "secret"),
        ])
        .unwrap_err();
        assert_eq!(missing_vars(&err), vec![VAULT_TOKEN]);
    }

    #[test]
    fn test_debug_redacts_token() {
        let params = ConnectionParams::new("https://vault", "s.very-secret", "secret");
        let debug = format!("{params:?}");
        assert!(!debug.contains("s.very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
