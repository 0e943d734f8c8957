use std::env;

use super::error::{CouchDaoError, CouchResult};

const DEFAULT_DATABASE: &str = "pelada";

/// Where the CouchDB match store lives and how to authenticate.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server root, e.g. `http://localhost:5984`.
    pub base_url: String,
    /// Database holding the match documents.
    pub database: String,
    /// Basic-auth `(username, password)`, only used when both are set.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Read `COUCH_BASE_URL` (required), `COUCH_DB` (defaults to `pelada`) and the
    /// optional `COUCH_USERNAME` / `COUCH_PASSWORD` pair.
    pub fn from_env() -> CouchResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CouchResult<Self> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let base_url = non_empty("COUCH_BASE_URL").ok_or(CouchDaoError::MissingEnvVar {
            var: "COUCH_BASE_URL",
        })?;

        Ok(Self {
            base_url,
            database: non_empty("COUCH_DB").unwrap_or_else(|| DEFAULT_DATABASE.to_owned()),
            credentials: non_empty("COUCH_USERNAME").zip(non_empty("COUCH_PASSWORD")),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn base_url_is_required() {
        assert!(matches!(
            CouchConfig::from_lookup(lookup(&[("COUCH_DB", "x")])),
            Err(CouchDaoError::MissingEnvVar { var: "COUCH_BASE_URL" })
        ));
    }

    #[test]
    fn database_defaults_and_credentials_need_both_parts() {
        let config = CouchConfig::from_lookup(lookup(&[
            ("COUCH_BASE_URL", "http://localhost:5984"),
            ("COUCH_USERNAME", "admin"),
        ]))
        .unwrap();

        assert_eq!(config.database, "pelada");
        assert!(config.credentials.is_none());

        let config = CouchConfig::from_lookup(lookup(&[
            ("COUCH_BASE_URL", "http://localhost:5984"),
            ("COUCH_USERNAME", "admin"),
            ("COUCH_PASSWORD", "secret"),
        ]))
        .unwrap();
        assert_eq!(
            config.credentials,
            Some(("admin".to_owned(), "secret".to_owned()))
        );
    }
}
