//! Client configuration loader for lakechat.
//!
//! Reads `config.toml` from the data directory (`~/.lakechat/` by default)
//! and deserializes it into [`ClientConfig`]. Falls back to defaults when the
//! file is missing or malformed, then applies environment overrides.

use std::path::{Path, PathBuf};

use lakechat_types::config::ClientConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "LAKECHAT_DATA_DIR";
/// Environment variable overriding `backend_url`.
pub const BACKEND_URL_ENV: &str = "LAKECHAT_BACKEND_URL";
/// Environment variable overriding `user_id`.
pub const USER_ID_ENV: &str = "LAKECHAT_USER_ID";

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Load client configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ClientConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
///
/// Environment overrides are not applied here; see [`apply_env_overrides`].
pub async fn load_client_config(data_dir: &Path) -> ClientConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ClientConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ClientConfig::default();
        }
    };

    match toml::from_str::<ClientConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ClientConfig::default()
        }
    }
}

/// Apply `LAKECHAT_BACKEND_URL` and `LAKECHAT_USER_ID` from the process environment.
pub fn apply_env_overrides(config: ClientConfig) -> ClientConfig {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary variable lookup. Empty values are ignored.
pub fn apply_overrides(
    mut config: ClientConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ClientConfig {
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = non_empty(BACKEND_URL_ENV) {
        config.backend_url = url;
    }
    if let Some(user_id) = non_empty(USER_ID_ENV) {
        config.user_id = Some(user_id);
    }
    config
}

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `LAKECHAT_DATA_DIR` environment variable
/// 2. `~/.lakechat` in the user's home directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".lakechat");
    }

    // Last resort: current directory
    PathBuf::from(".lakechat")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_client_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_client_config(tmp.path()).await;
        assert_eq!(config.backend_url, "http://127.0.0.1:5000");
        assert!(config.user_id.is_none());
    }

    #[tokio::test]
    async fn load_client_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"
backend_url = "https://lake.example.com"
request_timeout_secs = 12
user_id = "acme-co"
"#,
        )
        .await
        .unwrap();

        let config = load_client_config(tmp.path()).await;
        assert_eq!(config.backend_url, "https://lake.example.com");
        assert_eq!(config.request_timeout(), Duration::from_secs(12));
        assert_eq!(config.user_id.as_deref(), Some("acme-co"));
    }

    #[tokio::test]
    async fn load_client_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join(CONFIG_FILE), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_client_config(tmp.path()).await;
        assert_eq!(config.backend_url, "http://127.0.0.1:5000");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn apply_overrides_replaces_backend_and_user() {
        let env: HashMap<&str, &str> = HashMap::from([
            (BACKEND_URL_ENV, "http://10.0.0.5:8080"),
            (USER_ID_ENV, "globex"),
        ]);
        let config = apply_overrides(ClientConfig::default(), |k| {
            env.get(k).map(|v| v.to_string())
        });

        assert_eq!(config.backend_url, "http://10.0.0.5:8080");
        assert_eq!(config.user_id.as_deref(), Some("globex"));
    }

    #[test]
    fn apply_overrides_ignores_missing_and_empty_values() {
        let base = ClientConfig {
            user_id: Some("acme-co".to_string()),
            ..ClientConfig::default()
        };
        let config = apply_overrides(base, |k| {
            (k == USER_ID_ENV).then(|| "   ".to_string())
        });

        assert_eq!(config.backend_url, "http://127.0.0.1:5000");
        assert_eq!(config.user_id.as_deref(), Some("acme-co"));
    }
}
