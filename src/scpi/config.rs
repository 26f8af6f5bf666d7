use std::{path::Path, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 5555;
pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;
pub const DEFAULT_ERROR_QUERY: &str = ":SYSTem:ERRor?";
pub const DEFAULT_NO_ERROR: &str = "0,\"No error\"";
pub const DEFAULT_TERMINATOR: &str = "\n";
/// Upper bound on error-queue reads per check round.
pub const DEFAULT_MAX_ERROR_READS: usize = 50;

/// Connection and error-check settings of a [`Session`](super::Session).
///
/// Everything except `host` has a default, both here and when deserializing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connect, read and write timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    #[serde(default = "default_error_query")]
    pub error_query: String,
    /// Exact reply meaning the error queue is empty.
    #[serde(default = "default_no_error")]
    pub no_error: String,
    #[serde(default = "default_terminator")]
    pub terminator: String,
    #[serde(default = "default_max_error_reads")]
    pub max_error_reads: usize,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_timeout_secs() -> f64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_error_query() -> String {
    DEFAULT_ERROR_QUERY.to_string()
}
fn default_no_error() -> String {
    DEFAULT_NO_ERROR.to_string()
}
fn default_terminator() -> String {
    DEFAULT_TERMINATOR.to_string()
}
fn default_max_error_reads() -> usize {
    DEFAULT_MAX_ERROR_READS
}

impl SessionConfig {
    pub fn new<S: Into<String>>(host: S) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            error_query: default_error_query(),
            no_error: default_no_error(),
            terminator: default_terminator(),
            max_error_reads: DEFAULT_MAX_ERROR_READS,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs_f64();
        self
    }

    pub fn with_error_query<S: Into<String>>(mut self, query: S) -> Self {
        self.error_query = query.into();
        self
    }

    pub fn with_no_error<S: Into<String>>(mut self, sentinel: S) -> Self {
        self.no_error = sentinel.into();
        self
    }

    pub fn with_terminator<S: Into<String>>(mut self, terminator: S) -> Self {
        self.terminator = terminator.into();
        self
    }

    pub fn with_max_error_reads(mut self, max: usize) -> Self {
        self.max_error_reads = max;
        self
    }

    /// Falls back to zero for values [`validate`](Self::validate) rejects.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::ZERO)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: &str| Err(ConfigError::Message(msg.to_string()));
        if self.host.trim().is_empty() {
            return fail("host must not be empty");
        }
        if self.port == 0 {
            return fail("port must be positive");
        }
        if !(self.timeout_secs.is_finite() && self.timeout_secs > 0.0) {
            return fail("timeout_secs must be a positive number of seconds");
        }
        if Duration::try_from_secs_f64(self.timeout_secs).is_err() {
            return fail("timeout_secs is too large");
        }
        if self.terminator.is_empty() {
            return fail("terminator must not be empty");
        }
        if self.error_query.trim().is_empty() {
            return fail("error_query must not be empty");
        }
        if self.max_error_reads == 0 {
            return fail("max_error_reads must be at least 1");
        }
        Ok(())
    }
}

/// Loads a session configuration from an optional TOML file, then applies
/// `SCPI_TCP_*` environment overrides (e.g. `SCPI_TCP_PORT=5025`).
pub fn load_config(config_path: Option<&Path>) -> Result<SessionConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if !path.exists() {
            return Err(ConfigError::Message(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        builder = builder.add_source(File::from(path));
    }

    builder = builder.add_source(Environment::with_prefix("SCPI_TCP").try_parsing(true));

    let config: SessionConfig = builder.build()?.try_deserialize()?;
    config.validate()?;
    log::debug!("loaded session config for {}:{}", config.host, config.port);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let c = SessionConfig::new("192.168.0.10");
        assert_eq!(c.port, 5555);
        assert_eq!(c.timeout(), Duration::from_secs(5));
        assert_eq!(c.error_query, ":SYSTem:ERRor?");
        assert_eq!(c.no_error, "0,\"No error\"");
        assert_eq!(c.terminator, "\n");
        assert_eq!(c.max_error_reads, 50);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let base = SessionConfig::new("scope.lab");
        assert!(base.clone().with_port(0).validate().is_err());
        assert!(base.clone().with_terminator("").validate().is_err());
        assert!(base.clone().with_max_error_reads(0).validate().is_err());
        assert!(base.clone().with_timeout(Duration::ZERO).validate().is_err());
        assert!(SessionConfig::new(" ").validate().is_err());
    }

    #[test]
    fn oversized_timeout_is_rejected() {
        let c = SessionConfig::new("scope.lab").with_timeout(Duration::MAX);
        assert!(c.validate().is_err());
        assert_eq!(c.timeout(), Duration::ZERO);

        let mut c = SessionConfig::new("scope.lab");
        c.timeout_secs = 1e20;
        assert!(c.validate().is_err());
    }

    #[test]
    fn loads_toml_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "host = \"10.1.2.3\"\nport = 5025\nno_error = '+0,\"No error\"'"
        )
        .unwrap();
        let c = load_config(Some(file.path())).unwrap();
        assert_eq!(c.host, "10.1.2.3");
        assert_eq!(c.port, 5025);
        assert_eq!(c.no_error, "+0,\"No error\"");
        assert_eq!(c.error_query, DEFAULT_ERROR_QUERY);
        assert_eq!(c.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn missing_file_is_error() {
        assert!(load_config(Some(Path::new("/nonexistent/scpi.toml"))).is_err());
    }
}
