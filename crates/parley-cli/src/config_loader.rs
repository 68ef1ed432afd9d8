//! Configuration file discovery and loading.
//!
//! The discovery order is:
//! 1. `PARLEY_CONFIG` environment variable (absolute path).
//! 2. `~/.parley/config.json`
//! 3. If none found, an empty JSON object (`{}`), i.e. all defaults.
//!
//! JSON keys are normalized from camelCase to snake_case before returning.

use std::path::{Path, PathBuf};

use serde_json::Value;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PARLEY_CONFIG";

/// Discover the config file path using the fallback chain.
///
/// `env_path` is the value of [`CONFIG_ENV`], if set. Returns `None` if
/// no candidate applies.
pub fn discover_config_path(env_path: Option<PathBuf>, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = env_path.filter(|p| !p.as_os_str().is_empty()) {
        return Some(path);
    }

    let candidate = home_dir?.join(".parley").join("config.json");
    candidate.exists().then_some(candidate)
}

/// Read and normalize the config file at `path`.
pub async fn read_config_file(path: &Path) -> anyhow::Result<Value> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))?;

    Ok(normalize_keys(value))
}

/// Load raw JSON configuration using the discovery algorithm.
///
/// A discovered path that does not exist is logged and treated as "no
/// config".
pub async fn load_config_raw(env_path: Option<PathBuf>, home_dir: Option<PathBuf>) -> anyhow::Result<Value> {
    let Some(path) = discover_config_path(env_path, home_dir) else {
        tracing::info!("no config file found, using defaults");
        return Ok(Value::Object(serde_json::Map::new()));
    };

    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        tracing::warn!(
            path = %path.display(),
            "config path does not exist, using defaults"
        );
        return Ok(Value::Object(serde_json::Map::new()));
    }

    tracing::debug!(path = %path.display(), "loading config file");
    read_config_file(&path).await
}

/// Convert camelCase JSON keys to snake_case recursively.
///
/// Only object keys change; values (including string values that look
/// like camelCase) are left alone.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| (camel_to_snake(&key), normalize_keys(val)))
                .collect(),
        ),
        Value::Array(arr) => Value::Array(arr.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Convert a single camelCase string to snake_case.
///
/// A run of capitals is kept together as one acronym:
/// `"botTokenEnv"` -> `"bot_token_env"`, `"requestTimeoutSecs"` ->
/// `"request_timeout_secs"`, `"HTTPTimeout"` -> `"http_timeout"`.
pub fn camel_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();

            if prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next.is_some_and(|c| c.is_lowercase()))
            {
                result.push('_');
            }
        }
        result.push(ch.to_ascii_lowercase());
    }
    result
}
