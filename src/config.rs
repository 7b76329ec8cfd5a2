use anyhow::{anyhow, Result};
use shuttle_secrets::SecretStore;

pub const DEFAULT_DATABASE_NAME: &str = "cinema";

/// Settings read from `Secrets.toml` at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub mongodb_uri: String,
    /// Origin allowed by the CORS layer.
    pub app_url: String,
    pub database_name: String,
}

impl AppConfig {
    pub fn from_secrets(secrets: &SecretStore) -> Result<Self> {
        Self::from_lookup(|key| secrets.get(key))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("secret `{key}` was not found"));

        Ok(Self {
            mongodb_uri: required("MONGODB_URI")?,
            app_url: required("APP_URL")?,
            database_name: lookup("DATABASE_NAME")
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn database_name_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://localhost:27017"),
            ("APP_URL", "http://localhost:3000"),
        ]))
        .unwrap();

        assert_eq!(config.database_name, DEFAULT_DATABASE_NAME);
        assert_eq!(config.app_url, "http://localhost:3000");
    }

    #[test]
    fn database_name_override() {
        let config = AppConfig::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://localhost:27017"),
            ("APP_URL", "http://localhost:3000"),
            ("DATABASE_NAME", "cinema-staging"),
        ]))
        .unwrap();

        assert_eq!(config.database_name, "cinema-staging");
    }

    #[test]
    fn missing_secret_is_named() {
        let err = AppConfig::from_lookup(lookup(&[("APP_URL", "http://localhost:3000")]))
            .unwrap_err();
        assert!(err.to_string().contains("MONGODB_URI"));
    }
}
