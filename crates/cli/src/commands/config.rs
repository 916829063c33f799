use std::env;
use std::fs;
use std::path::Path;

use stockroom_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

/// Effective configuration, one line per key, with where each value came from.
pub fn run(options: LoadOptions) -> String {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let overrides = options.overrides.clone();

    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: Option<&str>, overridden: bool| {
        if overridden {
            return "flag".to_string();
        }
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec![
        "effective config (source precedence: flag > env > file > default):".to_string(),
    ];

    lines.push(render_line(
        "storage.products_path",
        &config.storage.products_path.display().to_string(),
        source(
            "storage.products_path",
            Some("STOCKROOM_PRODUCTS_PATH"),
            overrides.products_path.is_some(),
        ),
    ));
    lines.push(render_line(
        "storage.credentials_path",
        &config.storage.credentials_path.display().to_string(),
        source(
            "storage.credentials_path",
            Some("STOCKROOM_CREDENTIALS_PATH"),
            overrides.credentials_path.is_some(),
        ),
    ));
    lines.push(render_line(
        "storage.bills_path",
        &config.storage.bills_path.display().to_string(),
        source("storage.bills_path", Some("STOCKROOM_BILLS_PATH"), overrides.bills_path.is_some()),
    ));

    lines.push(render_line(
        "inventory.low_stock_threshold",
        &config.inventory.low_stock_threshold.to_string(),
        source("inventory.low_stock_threshold", Some("STOCKROOM_LOW_STOCK_THRESHOLD"), false),
    ));
    lines.push(render_line(
        "inventory.unique_ids",
        &config.inventory.unique_ids.to_string(),
        source("inventory.unique_ids", Some("STOCKROOM_UNIQUE_IDS"), false),
    ));

    lines.push(render_line(
        "billing.currency_symbol",
        &config.billing.currency_symbol,
        source("billing.currency_symbol", Some("STOCKROOM_CURRENCY_SYMBOL"), false),
    ));

    let level_env = ["STOCKROOM_LOGGING_LEVEL", "STOCKROOM_LOG_LEVEL"]
        .into_iter()
        .find(|key| env::var_os(key).is_some());
    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", level_env, overrides.log_level.is_some()),
    ));
    let format_env = ["STOCKROOM_LOGGING_FORMAT", "STOCKROOM_LOG_FORMAT"]
        .into_iter()
        .find(|key| env::var_os(key).is_some());
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_ascii_lowercase(),
        source("logging.format", format_env, false),
    ));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
