//! Relay client configuration.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Chains the relay service sponsors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    #[default]
    Multiversx,
}

/// Target network environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    #[default]
    Mainnet,
    Testnet,
    Devnet,
}

impl Env {
    /// Default relay service base URL. Testnet has no relay deployment.
    pub fn relay_api_url(&self) -> Result<&'static str, crate::Error> {
        match self {
            Env::Mainnet => Ok("https://relay.vleap.ai"),
            Env::Devnet => Ok("https://devnet-relay.vleap.ai"),
            Env::Testnet => Err(crate::Error::Config(
                "testnet is not supported yet".into(),
            )),
        }
    }

    /// Default network API base URL used for account lookups.
    pub fn network_api_url(&self) -> &'static str {
        match self {
            Env::Mainnet => "https://api.multiversx.com",
            Env::Testnet => "https://testnet-api.multiversx.com",
            Env::Devnet => "https://devnet-api.multiversx.com",
        }
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Env::Mainnet => "mainnet",
            Env::Testnet => "testnet",
            Env::Devnet => "devnet",
        })
    }
}

impl std::str::FromStr for Env {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Env::Mainnet),
            "testnet" => Ok(Env::Testnet),
            "devnet" => Ok(Env::Devnet),
            other => Err(crate::Error::Config(format!("unknown env: {other}"))),
        }
    }
}

/// Project (tenant) identifier. Numeric ids go on the wire as JSON numbers;
/// numeric strings (env vars, CLI flags) are normalised to numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProjectId {
    Number(u64),
    Name(String),
}

impl From<u64> for ProjectId {
    fn from(id: u64) -> Self {
        ProjectId::Number(id)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        match s.trim().parse() {
            Ok(id) => ProjectId::Number(id),
            Err(_) => ProjectId::Name(s.to_string()),
        }
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        ProjectId::from(s.as_str())
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectId::Number(id) => write!(f, "{id}"),
            ProjectId::Name(name) => f.write_str(name),
        }
    }
}

impl Serialize for ProjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProjectId::Number(id) => serializer.serialize_u64(*id),
            ProjectId::Name(name) => serializer.serialize_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for ProjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Str(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Num(id) => ProjectId::Number(id),
            Raw::Str(s) => ProjectId::from(s),
        })
    }
}

/// Caller-supplied configuration. Unset fields fall back to defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayerConfig {
    /// Project (tenant) identifier registered with the relay service.
    #[serde(alias = "projectId", alias = "project_id")]
    pub project: ProjectId,

    #[serde(default)]
    pub chain: Chain,

    #[serde(default)]
    pub env: Env,

    /// Relay API base URL. Derived from `env` when absent.
    #[serde(default)]
    pub api: Option<String>,

    /// Request timeout in milliseconds.
    #[serde(default = "defaults::timeout_ms")]
    pub timeout: u64,

    /// Relay even when the sender could pay its own fees.
    #[serde(default)]
    pub force: bool,

    /// Network API base URL for account lookups. Derived from `env` when absent.
    #[serde(default)]
    pub network_api: Option<String>,
}

impl RelayerConfig {
    pub fn new(project: impl Into<ProjectId>) -> Self {
        Self {
            project: project.into(),
            chain: Chain::default(),
            env: Env::default(),
            api: None,
            timeout: defaults::timeout_ms(),
            force: false,
            network_api: None,
        }
    }

    pub fn with_env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    pub fn with_api(mut self, api: impl Into<String>) -> Self {
        self.api = Some(api.into());
        self
    }

    pub fn with_network_api(mut self, url: impl Into<String>) -> Self {
        self.network_api = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Load from `relay.{toml,json,yaml}` (optional) overlaid with `RELAY_*` env vars.
    pub fn load() -> Result<Self, crate::Error> {
        config::Config::builder()
            .add_source(config::File::with_name("relay").required(false))
            .add_source(config::Environment::with_prefix("RELAY"))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| crate::Error::Config(format!("failed to load config: {e}")))
    }

    /// Merge over defaults and derive URLs. Fails fast on testnet without an
    /// explicit `api`.
    pub fn resolve(self) -> Result<ResolvedConfig, crate::Error> {
        let api = match self.api.filter(|a| !a.trim().is_empty()) {
            Some(api) => api,
            None => self.env.relay_api_url()?.to_string(),
        };
        let network_api = self
            .network_api
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| self.env.network_api_url().to_string());

        Ok(ResolvedConfig {
            chain: self.chain,
            env: self.env,
            api: api.trim_end_matches('/').to_string(),
            network_api: network_api.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(self.timeout),
            force: self.force,
            project: self.project,
        })
    }
}

/// Fully resolved, read-only configuration shared by every relay call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub chain: Chain,
    pub env: Env,
    pub api: String,
    pub network_api: String,
    pub timeout: Duration,
    pub force: bool,
    pub project: ProjectId,
}

mod defaults {
    pub fn timeout_ms() -> u64 {
        5_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let resolved = RelayerConfig::new("42").resolve().unwrap();
        assert_eq!(resolved.chain, Chain::Multiversx);
        assert_eq!(resolved.env, Env::Mainnet);
        assert_eq!(resolved.api, "https://relay.vleap.ai");
        assert_eq!(resolved.network_api, "https://api.multiversx.com");
        assert_eq!(resolved.timeout, Duration::from_millis(5_000));
        assert!(!resolved.force);
    }

    #[test]
    fn test_devnet_urls() {
        let resolved = RelayerConfig::new("42")
            .with_env(Env::Devnet)
            .resolve()
            .unwrap();
        assert_eq!(resolved.api, "https://devnet-relay.vleap.ai");
        assert_eq!(resolved.network_api, "https://devnet-api.multiversx.com");
    }

    #[test]
    fn test_testnet_fails_fast() {
        let err = RelayerConfig::new("42")
            .with_env(Env::Testnet)
            .resolve()
            .unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_testnet_with_explicit_api() {
        let resolved = RelayerConfig::new("42")
            .with_env(Env::Testnet)
            .with_api("https://relay.example.com/")
            .resolve()
            .unwrap();
        assert_eq!(resolved.api, "https://relay.example.com");
        assert_eq!(resolved.network_api, "https://testnet-api.multiversx.com");
    }

    #[test]
    fn test_deserialize_with_project_id_alias() {
        let cfg: RelayerConfig = serde_json::from_str(
            r#"{"projectId":"7","env":"devnet","timeout":1500,"force":true}"#,
        )
        .unwrap();
        assert_eq!(cfg.project, ProjectId::Number(7));
        assert_eq!(cfg.env, Env::Devnet);
        assert_eq!(cfg.timeout, 1500);
        assert!(cfg.force);
        assert!(cfg.api.is_none());
    }

    #[test]
    fn test_project_id_number_or_name() {
        let numeric: RelayerConfig = serde_json::from_str(r#"{"project":12}"#).unwrap();
        assert_eq!(numeric.project, ProjectId::Number(12));
        assert_eq!(ProjectId::from("12"), ProjectId::Number(12));
        assert_eq!(
            ProjectId::from("acme"),
            ProjectId::Name("acme".to_string())
        );
        assert_eq!(serde_json::to_value(ProjectId::from("12")).unwrap(), 12);
        assert_eq!(serde_json::to_value(ProjectId::from("acme")).unwrap(), "acme");
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let cfg = RelayerConfig::new(1u64).with_timeout(Duration::MAX);
        assert_eq!(cfg.timeout, u64::MAX);
    }

    #[test]
    fn test_missing_project_rejected() {
        assert!(serde_json::from_str::<RelayerConfig>(r#"{"env":"mainnet"}"#).is_err());
    }
}
