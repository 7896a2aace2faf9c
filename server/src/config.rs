use std::env;
use std::path::PathBuf;

/// Default listen address, matching the ProtChain API port.
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8082";

/// Server configuration settings.
pub struct Config {
    pub bind_address: String,
    /// Optional JSON file of `resource_id -> hex digest` references loaded at startup.
    pub reference_digests: Option<PathBuf>,
    jwt_secret: String,
}

impl Config {
    /// Loads configuration from the environment, after applying any `.env` file.
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    ///
    /// `JWT_SECRET` is required and must be non-empty; there is no built-in fallback secret.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, env::VarError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(env::VarError::NotPresent)?;

        Ok(Config {
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            reference_digests: lookup("REFERENCE_DIGESTS").filter(|s| !s.is_empty()).map(PathBuf::from),
            jwt_secret,
        })
    }

    pub fn jwt_secret(&self) -> &[u8] { self.jwt_secret.as_bytes() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn requires_secret() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("JWT_SECRET", "")])).is_err());
    }

    #[test]
    fn applies_defaults() {
        let cfg = Config::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(cfg.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(cfg.jwt_secret(), b"s3cret");
        assert!(cfg.reference_digests.is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("BIND_ADDRESS", "127.0.0.1:9000"),
            ("REFERENCE_DIGESTS", "/fixtures/references.json"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_address, "127.0.0.1:9000");
        assert_eq!(cfg.reference_digests, Some(PathBuf::from("/fixtures/references.json")));
    }
}
