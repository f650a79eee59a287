use crate::error::ConfigError;
use crate::settings::Config;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{DatabaseSettings, LedgerSettings, LogFormat, LoggingSettings, ServerSettings};

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Environment variables with this prefix override file values,
/// e.g. `TRADEBOOK__SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "TRADEBOOK";

/// Loads the application configuration from `config.toml`.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new(DEFAULT_CONFIG_PATH))
}

/// Loads the application configuration from the given TOML file.
///
/// The file is optional. Values from `TRADEBOOK__*` environment variables are
/// layered on top, and the result is validated before it is returned.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("tradebook-{}-{}.toml", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config_from(Path::new("does/not/exist.toml")).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.ledger.default_total_capital, dec!(100000));
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let path = write_temp(
            "partial",
            r#"
            [server]
            port = 8080

            [ledger]
            default_total_capital = "250000.50"

            [logging]
            format = "json"
            "#,
        );

        let config = load_config_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.ledger.default_total_capital, dec!(250000.50));
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let path = write_temp(
            "invalid",
            r#"
            [database]
            max_connections = 0
            "#,
        );

        let result = load_config_from(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn negative_default_capital_is_rejected() {
        let mut config = Config::default();
        config.ledger.default_total_capital = dec!(-1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn socket_addr_requires_an_ip() {
        let mut config = Config::default();
        assert_eq!(config.server.socket_addr().unwrap().port(), 3000);

        config.server.host = "localhost".to_string();
        assert!(config.validate().is_err());
    }
}
