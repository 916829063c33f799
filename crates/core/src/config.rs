use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::report::LOW_STOCK_THRESHOLD;

pub const DEFAULT_CONFIG_FILE: &str = "stockroom.toml";
pub const NESTED_CONFIG_FILE: &str = "config/stockroom.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub inventory: InventoryConfig,
    pub billing: BillingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub products_path: PathBuf,
    pub credentials_path: PathBuf,
    pub bills_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct InventoryConfig {
    pub low_stock_threshold: i64,
    pub unique_ids: bool,
}

#[derive(Clone, Debug)]
pub struct BillingConfig {
    pub currency_symbol: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub products_path: Option<PathBuf>,
    pub credentials_path: Option<PathBuf>,
    pub bills_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                products_path: PathBuf::from("products.txt"),
                credentials_path: PathBuf::from("credentials.txt"),
                bills_path: PathBuf::from("bills.jsonl"),
            },
            inventory: InventoryConfig {
                low_stock_threshold: LOW_STOCK_THRESHOLD,
                unique_ids: false,
            },
            billing: BillingConfig { currency_symbol: "$".to_string() },
            logging: LoggingConfig { level: "warn".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(storage) = patch.storage {
            if let Some(products_path) = storage.products_path {
                self.storage.products_path = products_path;
            }
            if let Some(credentials_path) = storage.credentials_path {
                self.storage.credentials_path = credentials_path;
            }
            if let Some(bills_path) = storage.bills_path {
                self.storage.bills_path = bills_path;
            }
        }

        if let Some(inventory) = patch.inventory {
            if let Some(low_stock_threshold) = inventory.low_stock_threshold {
                self.inventory.low_stock_threshold = low_stock_threshold;
            }
            if let Some(unique_ids) = inventory.unique_ids {
                self.inventory.unique_ids = unique_ids;
            }
        }

        if let Some(billing) = patch.billing {
            if let Some(currency_symbol) = billing.currency_symbol {
                self.billing.currency_symbol = currency_symbol;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("STOCKROOM_PRODUCTS_PATH") {
            self.storage.products_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("STOCKROOM_CREDENTIALS_PATH") {
            self.storage.credentials_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("STOCKROOM_BILLS_PATH") {
            self.storage.bills_path = PathBuf::from(value);
        }

        if let Some(value) = read_env("STOCKROOM_LOW_STOCK_THRESHOLD") {
            self.inventory.low_stock_threshold =
                parse_i64("STOCKROOM_LOW_STOCK_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("STOCKROOM_UNIQUE_IDS") {
            self.inventory.unique_ids = parse_bool("STOCKROOM_UNIQUE_IDS", &value)?;
        }

        if let Some(value) = read_env("STOCKROOM_CURRENCY_SYMBOL") {
            self.billing.currency_symbol = value;
        }

        let log_level =
            read_env("STOCKROOM_LOGGING_LEVEL").or_else(|| read_env("STOCKROOM_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("STOCKROOM_LOGGING_FORMAT").or_else(|| read_env("STOCKROOM_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(products_path) = overrides.products_path {
            self.storage.products_path = products_path;
        }
        if let Some(credentials_path) = overrides.credentials_path {
            self.storage.credentials_path = credentials_path;
        }
        if let Some(bills_path) = overrides.bills_path {
            self.storage.bills_path = bills_path;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_storage(&self.storage)?;
        validate_inventory(&self.inventory)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Config file that `load` would read for `explicit_path`, if any exists.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_storage(storage: &StorageConfig) -> Result<(), ConfigError> {
    if storage.products_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("storage.products_path must not be empty".to_string()));
    }
    if storage.credentials_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "storage.credentials_path must not be empty".to_string(),
        ));
    }
    if storage.bills_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("storage.bills_path must not be empty".to_string()));
    }
    let paths = [&storage.products_path, &storage.credentials_path, &storage.bills_path];
    if paths[0] == paths[1] || paths[0] == paths[2] || paths[1] == paths[2] {
        return Err(ConfigError::Validation(
            "storage.products_path, storage.credentials_path and storage.bills_path must point \
             to different files"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_inventory(inventory: &InventoryConfig) -> Result<(), ConfigError> {
    if inventory.low_stock_threshold < 0 {
        return Err(ConfigError::Validation(
            "inventory.low_stock_threshold must be zero or greater".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.trim().parse::<i64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    storage: Option<StoragePatch>,
    inventory: Option<InventoryPatch>,
    billing: Option<BillingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    products_path: Option<PathBuf>,
    credentials_path: Option<PathBuf>,
    bills_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct InventoryPatch {
    low_stock_threshold: Option<i64>,
    unique_ids: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct BillingPatch {
    currency_symbol: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
