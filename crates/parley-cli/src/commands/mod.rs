//! Subcommand implementations and the config helpers they share.

pub mod channels;
pub mod watch;

use std::path::{Path, PathBuf};

use serde_json::Value;

use parley_types::config::Config;

use crate::config_loader;

/// Load the raw (key-normalized) configuration.
///
/// With `config_override` the file must exist; otherwise the usual
/// discovery chain applies.
pub async fn load_config_value(config_override: Option<&str>) -> anyhow::Result<Value> {
    match config_override {
        Some(path_str) => {
            let path = expand_home(path_str);
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                anyhow::bail!("config file not found: {path_str}");
            }
            config_loader::read_config_file(&path).await
        }
        None => {
            let env_path = std::env::var_os(config_loader::CONFIG_ENV).map(PathBuf::from);
            config_loader::load_config_raw(env_path, dirs::home_dir()).await
        }
    }
}

/// Load and deserialize the configuration.
pub async fn load_config(config_override: Option<&str>) -> anyhow::Result<Config> {
    parse_config(load_config_value(config_override).await?)
}

pub fn parse_config(raw: Value) -> anyhow::Result<Config> {
    Ok(Config::from_value(raw)?)
}

/// The config section for channel `name`, or `{}`.
///
/// Built from the raw value rather than by re-serializing [`Config`],
/// which would blank out credentials.
pub fn channel_section(raw: &Value, name: &str) -> Value {
    raw.get("channels")
        .and_then(|c| c.get(name))
        .cloned()
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()))
}

/// The config file that discovery would pick, for display.
pub fn discover_config_path() -> Option<PathBuf> {
    let env_path = std::env::var_os(config_loader::CONFIG_ENV).map(PathBuf::from);
    config_loader::discover_config_path(env_path, dirs::home_dir())
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    Path::new(raw).to_path_buf()
}
