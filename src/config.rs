use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    pub model_path: String,
    pub whois: WhoisConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct WhoisConfig {
    pub timeout_seconds: u64,
    pub use_mock: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: "phishing_model.json".to_string(),
            whois: WhoisConfig::default(),
        }
    }
}

impl Default for WhoisConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            use_mock: false,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read config: {}", path.as_ref().display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", path.as_ref().display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model_path, "phishing_model.json");
        assert_eq!(config.whois.timeout_seconds, 10);
        assert!(!config.whois.use_mock);
    }

    #[test]
    fn test_parse_partial_yaml() {
        let config: Config = serde_yaml::from_str("model_path: /var/lib/phishguard/model.json\n")
            .expect("partial config should parse");
        assert_eq!(config.model_path, "/var/lib/phishguard/model.json");
        assert_eq!(config.whois.timeout_seconds, 10);
    }
}
