use sea_orm::IsolationLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    /// Default isolation of every transaction the services open.
    #[serde(default)]
    pub isolation_level: Option<IsolationSetting>,
}

impl DatabaseConfig {
    pub fn isolation(&self) -> Option<IsolationLevel> {
        self.isolation_level.map(Into::into)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationSetting {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl FromStr for IsolationSetting {
    type Err = AppError;

    /// Accepts `repeatable_read`, `repeatable-read` and `Repeatable Read`.
    fn from_str(value: &str) -> AppResult<Self> {
        match value.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "read_uncommitted" => Ok(Self::ReadUncommitted),
            "read_committed" => Ok(Self::ReadCommitted),
            "repeatable_read" => Ok(Self::RepeatableRead),
            "serializable" => Ok(Self::Serializable),
            other => Err(AppError::ConfigError(format!(
                "unknown isolation level: {other}"
            ))),
        }
    }
}

impl From<IsolationSetting> for IsolationLevel {
    fn from(setting: IsolationSetting) -> Self {
        match setting {
            IsolationSetting::ReadUncommitted => IsolationLevel::ReadUncommitted,
            IsolationSetting::ReadCommitted => IsolationLevel::ReadCommitted,
            IsolationSetting::RepeatableRead => IsolationLevel::RepeatableRead,
            IsolationSetting::Serializable => IsolationLevel::Serializable,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub bcrypt_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    8
}

impl Config {
    pub fn from_toml() -> AppResult<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 配置文件不存在时完全依赖环境变量
        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::from_toml_str(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env()?,
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "cannot read config file {config_path}: {e}"
                )));
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(config_str: &str) -> AppResult<Self> {
        toml::from_str(config_str)
            .map_err(|e| AppError::ConfigError(format!("invalid config file: {e}")))
    }

    fn from_env() -> AppResult<Self> {
        fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
            env::var(name)
                .ok()
                .and_then(|v| v.parse::<T>().ok())
                .unwrap_or(default)
        }

        // 无配置文件时数据库 URL 必须提供
        let url = env::var("DATABASE_URL").map_err(|_| {
            AppError::ConfigError(
                "DATABASE_URL is not set and no config.toml was found".to_string(),
            )
        })?;

        Ok(Config {
            database: DatabaseConfig {
                url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                min_connections: get_env_parse("DB_MIN_CONNECTIONS", default_min_connections()),
                connect_timeout_secs: get_env_parse(
                    "DB_CONNECT_TIMEOUT_SECS",
                    default_connect_timeout(),
                ),
                sqlx_logging: get_env_parse("DB_SQLX_LOGGING", false),
                isolation_level: env::var("DB_ISOLATION_LEVEL")
                    .ok()
                    .map(|v| v.parse())
                    .transpose()?,
            },
            security: SecurityConfig {
                bcrypt_cost: get_env_parse("BCRYPT_COST", bcrypt::DEFAULT_COST),
            },
        })
    }

    fn apply_env_overrides(&mut self) -> AppResult<()> {
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(n) = v.parse()
        {
            self.database.max_connections = n;
        }
        if let Ok(v) = env::var("DB_MIN_CONNECTIONS")
            && let Ok(n) = v.parse()
        {
            self.database.min_connections = n;
        }
        if let Ok(v) = env::var("DB_CONNECT_TIMEOUT_SECS")
            && let Ok(n) = v.parse()
        {
            self.database.connect_timeout_secs = n;
        }
        if let Ok(v) = env::var("DB_SQLX_LOGGING")
            && let Ok(b) = v.parse()
        {
            self.database.sqlx_logging = b;
        }
        if let Ok(v) = env::var("DB_ISOLATION_LEVEL") {
            self.database.isolation_level = Some(v.parse()?);
        }
        if let Ok(v) = env::var("BCRYPT_COST")
            && let Ok(n) = v.parse()
        {
            self.security.bcrypt_cost = n;
        }
        Ok(())
    }

    fn validate(&self) -> AppResult<()> {
        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(
                "database.min_connections must not exceed max_connections".to_string(),
            ));
        }
        // bcrypt only accepts 4..=31
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(AppError::ConfigError(
                "security.bcrypt_cost must be between 4 and 31".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::from_toml_str(
            r#"
            [database]
            url = "postgres://localhost/savings"
            max_connections = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.database.connect_timeout_secs, 8);
        assert!(!config.database.sqlx_logging);
        assert!(config.database.isolation().is_none());
        assert_eq!(config.security.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml_str(
            r#"
            [database]
            url = "sqlite::memory:"
            max_connections = 2
            min_connections = 2
            connect_timeout_secs = 3
            sqlx_logging = true
            isolation_level = "serializable"

            [security]
            bcrypt_cost = 4
            "#,
        )
        .unwrap();
        assert_eq!(
            config.database.isolation_level,
            Some(IsolationSetting::Serializable)
        );
        assert_eq!(config.database.isolation(), Some(IsolationLevel::Serializable));
        assert_eq!(config.security.bcrypt_cost, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_database_section_is_rejected() {
        let err = Config::from_toml_str("[security]\nbcrypt_cost = 4\n").unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::from_toml_str(
            r#"
            [database]
            url = "sqlite::memory:"
            max_connections = 1
            "#,
        )
        .unwrap();
        config.database.min_connections = 4;
        assert!(config.validate().is_err());

        config.database.min_connections = 1;
        config.security.bcrypt_cost = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_isolation_level_is_rejected() {
        let err = Config::from_toml_str(
            r#"
            [database]
            url = "sqlite::memory:"
            max_connections = 1
            isolation_level = "snapshot"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_parse_isolation_setting() {
        assert_eq!(
            "Serializable".parse::<IsolationSetting>().unwrap(),
            IsolationSetting::Serializable
        );
        assert_eq!(
            "read committed".parse::<IsolationSetting>().unwrap(),
            IsolationSetting::ReadCommitted
        );
        assert_eq!(
            IsolationLevel::from("repeatable-read".parse::<IsolationSetting>().unwrap()),
            IsolationLevel::RepeatableRead
        );
        assert!("snapshot".parse::<IsolationSetting>().is_err());
    }
}
