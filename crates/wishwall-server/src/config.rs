use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::info;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
}

impl Config {
    /// Read configuration from the environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("WISHWALL_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("WISHWALL_JWT_SECRET is unset or still a placeholder; set it in .env and restart");
        }

        let db_path: PathBuf = load(&lookup, "WISHWALL_DB_PATH", "wishwall.db").into();
        let host = load(&lookup, "WISHWALL_HOST", "0.0.0.0");
        let port: u16 = load(&lookup, "WISHWALL_PORT", "3000")
            .parse()
            .context("WISHWALL_PORT must be a port number")?;

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        Ok(Self {
            jwt_secret,
            db_path,
            addr,
        })
    }
}

fn load(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let cfg = Config::from_lookup(lookup(&[("WISHWALL_JWT_SECRET", "s3cret-value")])).unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("wishwall.db"));
        assert_eq!(cfg.addr, "0.0.0.0:3000".parse().unwrap());
    }

    #[test]
    fn placeholder_secret_refused() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("WISHWALL_JWT_SECRET", "dev-secret-change-me")])).is_err());
    }

    #[test]
    fn bad_port_refused() {
        let env = lookup(&[("WISHWALL_JWT_SECRET", "s3cret-value"), ("WISHWALL_PORT", "eighty")]);
        assert!(Config::from_lookup(env).is_err());
    }
}
