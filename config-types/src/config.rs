use serde::{Deserialize, Serialize};
use std::collections::hash_map::{self, HashMap};
use std::str::FromStr;

/// Resolved configuration for an application: string keys to opaque string values.
///
/// Values are never interpreted here. Consumers parse typed values themselves,
/// optionally through [`Config::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config(HashMap<String, String>);

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, returning the previous value if there was one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value for `key`, or the empty string when the key is absent.
    ///
    /// Use [`Config::get`] when an absent key must be told apart from an empty value.
    pub fn value(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    /// Parse the value for `key` with [`FromStr`].
    ///
    /// Returns `None` when the key is absent.
    pub fn parse<T: FromStr>(&self, key: &str) -> Option<Result<T, T::Err>> {
        self.get(key).map(str::parse)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> hash_map::Keys<'_, String, String> {
        self.0.keys()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, String> {
        self.0.iter()
    }
}

impl From<HashMap<String, String>> for Config {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

impl From<Config> for HashMap<String, String> {
    fn from(config: Config) -> Self {
        config.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Config {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Config {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.0
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for Config {
    type Item = (String, String);
    type IntoIter = hash_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Config {
    type Item = (&'a String, &'a String);
    type IntoIter = hash_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config_is_empty() {
        let config = Config::new();
        assert!(config.is_empty());
        assert_eq!(config.len(), 0);
        assert_eq!(config.get("anything"), None);
    }

    #[test]
    fn test_insert_and_get() {
        let mut config = Config::new();
        assert_eq!(config.insert("host", "localhost"), None);
        assert_eq!(config.insert("host", "db.internal"), Some("localhost".to_string()));

        assert_eq!(config.get("host"), Some("db.internal"));
        assert!(config.contains_key("host"));
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_value_of_absent_key_is_empty() {
        let mut config = Config::new();
        config.insert("empty", "");

        assert_eq!(config.value("missing"), "");
        assert_eq!(config.value("empty"), "");
        assert_eq!(config.get("missing"), None);
        assert_eq!(config.get("empty"), Some(""));
    }

    #[test]
    fn test_parse_typed_values() {
        let config: Config = [("port", "5432"), ("debug", "yes")].into_iter().collect();

        assert_eq!(config.parse::<u16>("port").unwrap().unwrap(), 5432);
        assert!(config.parse::<bool>("debug").unwrap().is_err());
        assert!(config.parse::<u16>("missing").is_none());
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let mut a = Config::new();
        a.insert("a", "1");
        a.insert("b", "2");

        let mut b = Config::new();
        b.insert("b", "2");
        b.insert("a", "1");

        assert_eq!(a, b);

        b.insert("c", "3");
        assert_ne!(a, b);

        b.remove("c");
        b.insert("a", "other");
        assert_ne!(a, b);
    }

    #[test]
    fn test_extend_and_iterate() {
        let mut config = Config::new();
        config.extend([("a", "1"), ("b", "2")]);

        let mut keys: Vec<&String> = config.keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);

        let mut pairs: Vec<(String, String)> = config.into_iter().collect();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let config: Config = [("user", "admin")].into_iter().collect();

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json, serde_json::json!({"user": "admin"}));

        let back: Config = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }
}
