use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

pub const DEFAULT_DB_PATH: &str = "purger.db";

/// Largest number of ids bound into a single `IN (...)` clause.
pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct PurgeConfig {
    pub db_path: String,
    /// Scopes whose non-last snapshots are always deleted (e.g. `DIR`, `FIL`).
    pub scopes_without_history: Vec<String>,
    pub batch_size: usize,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            scopes_without_history: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Load `Config.toml` (optional), then `PURGER_*` environment variables on top.
pub fn load_configuration() -> Result<PurgeConfig, ConfigError> {
    let builder = Config::builder()
        .set_default("db_path", DEFAULT_DB_PATH)?
        .set_default("scopes_without_history", Vec::<String>::new())?
        .set_default("batch_size", DEFAULT_BATCH_SIZE as i64)?
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("PURGER")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("scopes_without_history"),
        )
        .build()?;
    let config = builder.try_deserialize::<PurgeConfig>()?;
    validate(config)
}

fn validate(config: PurgeConfig) -> Result<PurgeConfig, ConfigError> {
    if config.batch_size == 0 {
        return Err(ConfigError::Message(
            "batch_size must be greater than zero".to_string(),
        ));
    }
    Ok(PurgeConfig {
        scopes_without_history: normalize_scopes(config.scopes_without_history),
        ..config
    })
}

/// Trim, uppercase and dedupe scope codes, dropping blanks.
pub fn normalize_scopes(scopes: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for scope in scopes {
        let code = scope.trim().to_uppercase();
        if !code.is_empty() && !result.contains(&code) {
            result.push(code);
        }
    }
    result
}
