use std::{env::var, sync::Arc};

use dotenv::dotenv;
use eyre::{eyre, Error};
use log::info;

const DEFAULT_RUST_LOG: &str = "info";
const DEFAULT_DB_NAME: &str = "academy_db";

#[derive(Clone)]
pub struct Env(Arc<EnvInner>);

#[derive(Clone)]
pub struct EnvInner {
    mongo_url: String,
    rust_log: String,
    db_name: String,
}

impl Env {
    pub fn mongo_url(&self) -> &str {
        &self.0.mongo_url
    }

    pub fn rust_log(&self) -> &str {
        &self.0.rust_log
    }

    pub fn db_name(&self) -> &str {
        &self.0.db_name
    }

    /// Reads the process environment, after merging a `.env` file if present.
    pub fn load() -> Result<Env, Error> {
        if let Err(err) = dotenv() {
            info!("Failed to load .env file: {}", err);
        }
        Env::from_lookup(|key| var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Env, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Env(Arc::new(EnvInner {
            mongo_url: lookup("MONGO_URL").ok_or_else(|| eyre!("MONGO_URL is not set"))?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_RUST_LOG.to_owned()),
            db_name: lookup("ACADEMY_DB").unwrap_or_else(|| DEFAULT_DB_NAME.to_owned()),
        })))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let env = Env::from_lookup(lookup(&[("MONGO_URL", "mongodb://localhost")])).unwrap();
        assert_eq!(env.mongo_url(), "mongodb://localhost");
        assert_eq!(env.rust_log(), "info");
        assert_eq!(env.db_name(), "academy_db");
    }

    #[test]
    fn test_overrides() {
        let env = Env::from_lookup(lookup(&[
            ("MONGO_URL", "mongodb://db"),
            ("RUST_LOG", "debug"),
            ("ACADEMY_DB", "school"),
        ]))
        .unwrap();
        assert_eq!(env.rust_log(), "debug");
        assert_eq!(env.db_name(), "school");
    }

    #[test]
    fn test_missing_mongo_url() {
        let err = Env::from_lookup(lookup(&[])).err().unwrap();
        assert!(err.to_string().contains("MONGO_URL"));
    }
}
