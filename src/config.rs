//! Connection settings and per-run load options.

use crate::error::ConfigError;
use std::fmt;

pub const DEFAULT_PORT: u16 = 5432;

/// Environment variables read by [`ConnectionConfig::from_env`].
pub const ENV_USER: &str = "user";
pub const ENV_PASSWORD: &str = "password";
pub const ENV_HOST: &str = "host";
pub const ENV_DBNAME: &str = "dbname";

/// Where to connect. Built once at startup and never changed.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl ConnectionConfig {
    /// Read `user`, `password`, `host` and `dbname` from the process
    /// environment. The port is always [`DEFAULT_PORT`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(v) => Ok(Some(v)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(()),
        })
    }

    /// Same as [`from_env`](Self::from_env) with a caller-supplied lookup.
    /// The lookup returns `Err(())` for a value that exists but is unusable.
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&'static str) -> Result<Option<String>, ()>,
    {
        let mut required = |key: &'static str| match lookup(key) {
            Ok(Some(v)) => Ok(v),
            Ok(None) => Err(ConfigError::MissingVar(key)),
            Err(()) => Err(ConfigError::InvalidVar(key)),
        };

        Ok(Self {
            user: required(ENV_USER)?,
            password: required(ENV_PASSWORD)?,
            host: required(ENV_HOST)?,
            dbname: required(ENV_DBNAME)?,
            port: DEFAULT_PORT,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// `user@host:port/dbname`, safe to log.
    pub fn endpoint(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.dbname)
    }

    /// Credentials go through the driver's own config, so passwords with
    /// reserved URL characters need no escaping.
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .password(&self.password)
            .application_name("pgload");
        config
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How source files are read and where tables land.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub encoding: &'static encoding_rs::Encoding,
    /// Target schema; `None` uses the connection's search path.
    pub schema: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            encoding: encoding_rs::UTF_8,
            schema: None,
        }
    }
}

impl LoadOptions {
    pub fn with_encoding_label(mut self, label: &str) -> Result<Self, ConfigError> {
        self.encoding = encoding_rs::Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| ConfigError::UnknownEncoding(label.to_string()))?;
        Ok(self)
    }

    /// Accepts a single ASCII character, or `\t` for tab.
    pub fn with_delimiter(mut self, delimiter: &str) -> Result<Self, ConfigError> {
        self.delimiter = match delimiter {
            "\\t" => b'\t',
            d if d.len() == 1 && d.is_ascii() => d.as_bytes()[0],
            other => return Err(ConfigError::InvalidDelimiter(other.to_string())),
        };
        Ok(self)
    }

    pub fn with_schema(mut self, schema: Option<String>) -> Self {
        self.schema = schema.filter(|s| !s.is_empty());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(
        vars: &[(&'static str, &str)],
    ) -> impl FnMut(&'static str) -> Result<Option<String>, ()> {
        let map: HashMap<&'static str, String> =
            vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |key: &'static str| Ok(map.get(key).cloned())
    }

    #[test]
    fn reads_all_four_vars_with_fixed_port() {
        let config = ConnectionConfig::from_lookup(lookup_from(&[
            ("user", "loader"),
            ("password", "p@ss:w/rd"),
            ("host", "db.internal"),
            ("dbname", "warehouse"),
        ]))
        .unwrap();
        assert_eq!(config.port, 5432);
        assert_eq!(config.password, "p@ss:w/rd");
        assert_eq!(config.endpoint(), "loader@db.internal:5432/warehouse");
    }

    #[test]
    fn missing_var_is_named() {
        let err = ConnectionConfig::from_lookup(lookup_from(&[
            ("user", "loader"),
            ("password", "x"),
            ("dbname", "warehouse"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("host")));
    }

    #[test]
    fn debug_hides_password() {
        let config = ConnectionConfig {
            host: "h".into(),
            port: 1,
            dbname: "d".into(),
            user: "u".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn options_parse_delimiter_and_encoding() {
        let opts = LoadOptions::default()
            .with_delimiter("\\t")
            .unwrap()
            .with_encoding_label("latin1")
            .unwrap();
        assert_eq!(opts.delimiter, b'\t');
        assert_eq!(opts.encoding, encoding_rs::WINDOWS_1252);

        assert!(LoadOptions::default().with_delimiter(";;").is_err());
        assert!(LoadOptions::default().with_encoding_label("klingon").is_err());
    }
}
