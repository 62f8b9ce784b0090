//! Client configuration: JSON files, environment expansion and errors
//!
//! A config file carries the connection settings for one Cost Explorer
//! client. Every field is optional; missing credentials fall back to the
//! default AWS credential chain (or `profile` when set).
//!
//! ```json
//! {
//!   "accessKeyId": "${AWS_ACCESS_KEY_ID}",
//!   "secretAccessKey": "${AWS_SECRET_ACCESS_KEY}",
//!   "region": "${AWS_REGION:-us-east-1}",
//!   "timeoutSecs": 30
//! }
//! ```

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::client::CostExplorerClientBuilder;

/// Errors raised while configuring a [`crate::CostExplorerClient`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("no AWS credentials found; configure credentials via environment variables, ~/.aws/credentials, or IAM role")]
    NoCredentials,
}

/// Connection settings for a Cost Explorer client
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClientConfig {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// Only the partition is used
    pub region: Option<String>,
    /// Named profile from the shared AWS config
    pub profile: Option<String>,
    /// Custom Cost Explorer endpoint
    pub ce_endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Parse a config document, expanding `${VAR}` and `${VAR:-default}`
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content);
        let config: ClientConfig = serde_json::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());

        match (has(&self.access_key_id), has(&self.secret_access_key)) {
            (true, false) => {
                return Err(ConfigError::Invalid(
                    "'accessKeyId' is set but 'secretAccessKey' is missing".to_string(),
                ))
            }
            (false, true) => {
                return Err(ConfigError::Invalid(
                    "'secretAccessKey' is set but 'accessKeyId' is missing".to_string(),
                ))
            }
            _ => {}
        }

        if has(&self.access_key_id) && has(&self.profile) {
            return Err(ConfigError::Invalid(
                "'profile' cannot be combined with static access keys".to_string(),
            ));
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "'timeoutSecs' must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Turn these settings into a client builder
    pub fn into_builder(self) -> CostExplorerClientBuilder {
        let mut builder = CostExplorerClientBuilder::default();

        if let (Some(key), Some(secret)) = (self.access_key_id, self.secret_access_key) {
            if !key.is_empty() && !secret.is_empty() {
                let token = self.session_token.filter(|t| !t.is_empty());
                builder = builder.static_credentials(key, secret, token);
            }
        }
        if let Some(region) = self.region.filter(|r| !r.is_empty()) {
            builder = builder.region(region);
        }
        if let Some(profile) = self.profile.filter(|p| !p.is_empty()) {
            builder = builder.profile(profile);
        }
        if let Some(endpoint) = self.ce_endpoint.filter(|e| !e.is_empty()) {
            builder = builder.endpoint_url(endpoint);
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder
    }
}

/// Load client settings from a JSON file.
///
/// The path is tilde-expanded (e.g. `~/.config/awsce.json`) and the content
/// supports `${VAR}` or `${VAR:-default}` environment references.
pub async fn load_config_file(path: impl AsRef<Path>) -> Result<ClientConfig, ConfigError> {
    let path_str = path.as_ref().to_string_lossy().to_string();
    let expanded_path = shellexpand::tilde(&path_str);
    let path = Path::new(expanded_path.as_ref());

    log::debug!("loading cost explorer config from {}", path.display());

    let content = tokio::fs::read_to_string(path).await?;
    ClientConfig::from_json(&content)
}

/// Expand environment variables in a string
///
/// Supports:
/// - `${VAR}` - the value of VAR, or empty string if not set
/// - `${VAR:-default}` - the value of VAR, or "default" if not set
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            // unterminated reference is kept verbatim
            result.push_str(&rest[start..]);
            return result;
        };

        let reference = &after[..end];
        let (name, default) = match reference.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (reference, None),
        };

        match std::env::var(name) {
            Ok(value) => result.push_str(&value),
            Err(_) => result.push_str(default.unwrap_or("")),
        }

        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_expand_env_vars_simple() {
        std::env::set_var("AWSCE_TEST_VAR", "hello");
        assert_eq!(expand_env_vars("${AWSCE_TEST_VAR} world"), "hello world");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("AWSCE_NONEXISTENT_VAR");
        assert_eq!(expand_env_vars("${AWSCE_NONEXISTENT_VAR:-us-east-1}"), "us-east-1");
        assert_eq!(expand_env_vars("${AWSCE_NONEXISTENT_VAR}"), "");
    }

    #[test]
    fn test_expand_env_vars_unterminated() {
        assert_eq!(expand_env_vars("abc ${OOPS"), "abc ${OOPS");
        assert_eq!(expand_env_vars("no refs $HOME"), "no refs $HOME");
    }

    #[test]
    fn test_from_json_full() {
        let config = ClientConfig::from_json(
            r#"{
                "accessKeyId": "AKID",
                "secretAccessKey": "SECRET",
                "sessionToken": "TOKEN",
                "region": "cn-north-1",
                "ceEndpoint": "http://localhost:9000",
                "timeoutSecs": 15
            }"#,
        )
        .unwrap();

        assert_eq!(config.access_key_id.as_deref(), Some("AKID"));
        assert_eq!(config.session_token.as_deref(), Some("TOKEN"));
        assert_eq!(config.region.as_deref(), Some("cn-north-1"));
        assert_eq!(config.ce_endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.timeout_secs, Some(15));
    }

    #[test]
    fn test_from_json_empty_object() {
        assert_eq!(ClientConfig::from_json("{}").unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_from_json_rejects_unknown_field() {
        let err = ClientConfig::from_json(r#"{"acessKeyId": "typo"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_json_requires_key_pair() {
        let err = ClientConfig::from_json(r#"{"accessKeyId": "AKID"}"#).unwrap_err();
        assert!(err.to_string().contains("secretAccessKey"));

        let err = ClientConfig::from_json(r#"{"secretAccessKey": "SECRET"}"#).unwrap_err();
        assert!(err.to_string().contains("accessKeyId"));
    }

    #[test]
    fn test_from_json_profile_and_keys_conflict() {
        let err = ClientConfig::from_json(
            r#"{"accessKeyId": "A", "secretAccessKey": "S", "profile": "billing"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_from_json_zero_timeout() {
        let err = ClientConfig::from_json(r#"{"timeoutSecs": 0}"#).unwrap_err();
        assert!(err.to_string().contains("timeoutSecs"));
    }

    #[test]
    fn test_from_json_expands_env() {
        std::env::set_var("AWSCE_TEST_KEY_ID", "AKIDFROMENV");
        std::env::remove_var("AWSCE_TEST_SECRET_UNSET");
        let config = ClientConfig::from_json(
            r#"{"accessKeyId": "${AWSCE_TEST_KEY_ID}", "secretAccessKey": "${AWSCE_TEST_SECRET_UNSET:-fallback}"}"#,
        )
        .unwrap();
        assert_eq!(config.access_key_id.as_deref(), Some("AKIDFROMENV"));
        assert_eq!(config.secret_access_key.as_deref(), Some("fallback"));
    }

    #[tokio::test]
    async fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"accessKeyId": "AKID", "secretAccessKey": "SECRET", "region": "eu-west-1"}}"#
        )
        .unwrap();

        let config = load_config_file(file.path()).await.unwrap();
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));

        let client = config.into_builder().build().await.unwrap();
        assert_eq!(client.endpoint(), "https://ce.us-east-1.amazonaws.com");
    }

    #[tokio::test]
    async fn test_load_config_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_file(dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[tokio::test]
    async fn test_into_builder_uses_endpoint_and_cn_partition() {
        let config = ClientConfig {
            access_key_id: Some("AKID".into()),
            secret_access_key: Some("SECRET".into()),
            region: Some("cn-north-1".into()),
            ..Default::default()
        };
        let client = config.into_builder().build().await.unwrap();
        assert_eq!(client.signing_region(), "cn-northwest-1");
        assert_eq!(client.endpoint(), "https://ce.cn-northwest-1.amazonaws.com.cn");
    }
}
