use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub shipment_server: ShipmentServerConfig,
    pub customer_server: CustomerServerConfig,
    pub customer_client: CustomerClientConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: SecretString,
    pub max_connections: u32,
    pub timeout_secs: u64,
    pub connect_attempts: u32,
    pub connect_retry_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct ShipmentServerConfig {
    pub bind_address: String,
    pub http_port: u16,
    pub request_timeout_ms: u64,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CustomerServerConfig {
    pub bind_address: String,
    pub rpc_port: u16,
    pub request_timeout_ms: u64,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CustomerClientConfig {
    pub address: String,
    pub timeout_ms: u64,
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
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub http_port: Option<u16>,
    pub rpc_port: Option<u16>,
    pub customer_address: Option<String>,
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
            database: DatabaseConfig {
                url: secret_value("sqlite://parcel.db?mode=rwc".to_string()),
                max_connections: 5,
                timeout_secs: 30,
                connect_attempts: 30,
                connect_retry_delay_ms: 1_000,
            },
            shipment_server: ShipmentServerConfig {
                bind_address: "0.0.0.0".to_string(),
                http_port: 8080,
                request_timeout_ms: 10_000,
                graceful_shutdown_secs: 10,
            },
            customer_server: CustomerServerConfig {
                bind_address: "0.0.0.0".to_string(),
                rpc_port: 9090,
                request_timeout_ms: 5_000,
                graceful_shutdown_secs: 10,
            },
            customer_client: CustomerClientConfig {
                address: "127.0.0.1:9090".to_string(),
                timeout_ms: 3_000,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Json },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
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
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("parcel.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = secret_value(url);
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
            if let Some(connect_attempts) = database.connect_attempts {
                self.database.connect_attempts = connect_attempts;
            }
            if let Some(connect_retry_delay_ms) = database.connect_retry_delay_ms {
                self.database.connect_retry_delay_ms = connect_retry_delay_ms;
            }
        }

        if let Some(server) = patch.shipment_server {
            if let Some(bind_address) = server.bind_address {
                self.shipment_server.bind_address = bind_address;
            }
            if let Some(http_port) = server.http_port {
                self.shipment_server.http_port = http_port;
            }
            if let Some(request_timeout_ms) = server.request_timeout_ms {
                self.shipment_server.request_timeout_ms = request_timeout_ms;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.shipment_server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(server) = patch.customer_server {
            if let Some(bind_address) = server.bind_address {
                self.customer_server.bind_address = bind_address;
            }
            if let Some(rpc_port) = server.rpc_port {
                self.customer_server.rpc_port = rpc_port;
            }
            if let Some(request_timeout_ms) = server.request_timeout_ms {
                self.customer_server.request_timeout_ms = request_timeout_ms;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.customer_server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(client) = patch.customer_client {
            if let Some(address) = client.address {
                self.customer_client.address = address;
            }
            if let Some(timeout_ms) = client.timeout_ms {
                self.customer_client.timeout_ms = timeout_ms;
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
        if let Some(value) = read_env("PARCEL_DATABASE_URL") {
            self.database.url = secret_value(value);
        }
        if let Some(value) = read_env("PARCEL_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("PARCEL_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("PARCEL_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("PARCEL_DATABASE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("PARCEL_DATABASE_CONNECT_ATTEMPTS") {
            self.database.connect_attempts =
                parse_u32("PARCEL_DATABASE_CONNECT_ATTEMPTS", &value)?;
        }

        if let Some(value) = read_env("PARCEL_HTTP_BIND_ADDRESS") {
            self.shipment_server.bind_address = value;
        }
        if let Some(value) = read_env("PARCEL_HTTP_PORT") {
            self.shipment_server.http_port = parse_u16("PARCEL_HTTP_PORT", &value)?;
        }
        if let Some(value) = read_env("PARCEL_HTTP_REQUEST_TIMEOUT_MS") {
            self.shipment_server.request_timeout_ms =
                parse_u64("PARCEL_HTTP_REQUEST_TIMEOUT_MS", &value)?;
        }

        if let Some(value) = read_env("PARCEL_RPC_BIND_ADDRESS") {
            self.customer_server.bind_address = value;
        }
        if let Some(value) = read_env("PARCEL_RPC_PORT") {
            self.customer_server.rpc_port = parse_u16("PARCEL_RPC_PORT", &value)?;
        }
        if let Some(value) = read_env("PARCEL_RPC_REQUEST_TIMEOUT_MS") {
            self.customer_server.request_timeout_ms =
                parse_u64("PARCEL_RPC_REQUEST_TIMEOUT_MS", &value)?;
        }

        if let Some(value) = read_env("PARCEL_CUSTOMER_ADDR") {
            self.customer_client.address = value;
        }
        if let Some(value) = read_env("PARCEL_CUSTOMER_TIMEOUT_MS") {
            self.customer_client.timeout_ms = parse_u64("PARCEL_CUSTOMER_TIMEOUT_MS", &value)?;
        }

        let log_level = read_env("PARCEL_LOGGING_LEVEL").or_else(|| read_env("PARCEL_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PARCEL_LOGGING_FORMAT").or_else(|| read_env("PARCEL_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = secret_value(database_url);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(http_port) = overrides.http_port {
            self.shipment_server.http_port = http_port;
        }
        if let Some(rpc_port) = overrides.rpc_port {
            self.customer_server.rpc_port = rpc_port;
        }
        if let Some(customer_address) = overrides.customer_address {
            self.customer_client.address = customer_address;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_shipment_server(&self.shipment_server)?;
        validate_customer_server(&self.customer_server)?;
        validate_customer_client(&self.customer_client)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("parcel.toml"), PathBuf::from("config/parcel.toml")]
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

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.expose_secret().trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if database.connect_attempts == 0 {
        return Err(ConfigError::Validation(
            "database.connect_attempts must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_request_timeout(key: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 || value > 300_000 {
        return Err(ConfigError::Validation(format!("{key} must be in range 1..=300000")));
    }
    Ok(())
}

fn validate_shipment_server(server: &ShipmentServerConfig) -> Result<(), ConfigError> {
    if server.http_port == 0 {
        return Err(ConfigError::Validation(
            "shipment_server.http_port must be greater than zero".to_string(),
        ));
    }
    validate_request_timeout("shipment_server.request_timeout_ms", server.request_timeout_ms)?;

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "shipment_server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_customer_server(server: &CustomerServerConfig) -> Result<(), ConfigError> {
    if server.rpc_port == 0 {
        return Err(ConfigError::Validation(
            "customer_server.rpc_port must be greater than zero".to_string(),
        ));
    }
    validate_request_timeout("customer_server.request_timeout_ms", server.request_timeout_ms)?;

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "customer_server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_customer_client(client: &CustomerClientConfig) -> Result<(), ConfigError> {
    let address = client.address.trim();
    let has_port = address
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok_and(|p| p > 0));
    if !has_port {
        return Err(ConfigError::Validation(format!(
            "customer_client.address must be `host:port`, got `{address}`"
        )));
    }
    validate_request_timeout("customer_client.timeout_ms", client.timeout_ms)
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

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    shipment_server: Option<ShipmentServerPatch>,
    customer_server: Option<CustomerServerPatch>,
    customer_client: Option<CustomerClientPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
    connect_attempts: Option<u32>,
    connect_retry_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ShipmentServerPatch {
    bind_address: Option<String>,
    http_port: Option<u16>,
    request_timeout_ms: Option<u64>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CustomerServerPatch {
    bind_address: Option<String>,
    rpc_port: Option<u16>,
    request_timeout_ms: Option<u64>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CustomerClientPatch {
    address: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.shipment_server.http_port == 8080, "default http port should be 8080")?;
        ensure(config.customer_server.rpc_port == 9090, "default rpc port should be 9090")?;
        ensure(
            matches!(config.logging.format, LogFormat::Json),
            "default logging format should be json",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_PARCEL_CUSTOMER_HOST", "customer-service");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("parcel.toml");
            fs::write(
                &path,
                r#"
[customer_client]
address = "${TEST_PARCEL_CUSTOMER_HOST}:9090"
timeout_ms = 1500
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.customer_client.address == "customer-service:9090",
                "customer address should be interpolated from environment",
            )?;
            ensure(config.customer_client.timeout_ms == 1500, "timeout should come from file")
        })();

        clear_vars(&["TEST_PARCEL_CUSTOMER_HOST"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PARCEL_LOG_LEVEL", "warn");
        env::set_var("PARCEL_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )
        })();

        clear_vars(&["PARCEL_LOG_LEVEL", "PARCEL_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PARCEL_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("PARCEL_HTTP_PORT", "8181");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("parcel.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[shipment_server]
http_port = 8081
request_timeout_ms = 2500

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url.expose_secret() == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.shipment_server.http_port == 8181, "env http port should win over file")?;
            ensure(
                config.shipment_server.request_timeout_ms == 2500,
                "file request timeout should win over default",
            )
        })();

        clear_vars(&["PARCEL_DATABASE_URL", "PARCEL_HTTP_PORT"]);
        result
    }

    #[test]
    fn invalid_env_override_is_reported_with_its_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PARCEL_RPC_PORT", "not-a-port");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "PARCEL_RPC_PORT", "error should name the offending key")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
            Ok(_) => Err("expected invalid override to fail".to_string()),
        };

        clear_vars(&["PARCEL_RPC_PORT"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = match AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                customer_address: Some("customer-service".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }) {
            Ok(_) => {
                return Err("expected validation failure but config load succeeded".to_string())
            }
            Err(error) => error,
        };
        let has_message = matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("customer_client.address")
        );
        ensure(has_message, "validation failure should mention customer_client.address")
    }

    #[test]
    fn database_url_is_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite://secret-location.db".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;
        let debug = format!("{config:?}");

        ensure(!debug.contains("secret-location"), "debug output should not contain database url")
    }

    #[test]
    fn missing_required_file_is_an_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let result = AppConfig::load(LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "missing required config file should be reported",
        )
    }
}
