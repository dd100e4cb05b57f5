use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level application configuration, loaded once at startup from the YAML
/// file named by `NLDI_CONFIG` (with `${VAR}` shell-style interpolation
/// resolved against the process environment before parsing).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub pygeoapi: PygeoapiConfig,
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub sources: Vec<SourceDeclaration>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub url: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_pretty_print")]
    pub pretty_print: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub name: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_pool_timeout_ms")]
    pub pool_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PygeoapiConfig {
    pub url: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_remote_timeout_s")]
    pub timeout_s: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetadataConfig {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub contact: String,
}

/// One entry of the declarative `sources:` list, reconciled into
/// `nldi_data.crawler_source` by [`crate::sources::SourceRegistry::align`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceDeclaration {
    pub suffix: String,
    pub source_name: String,
    pub source_uri: String,
    pub feature_id_column: String,
    pub feature_name_column: String,
    pub feature_uri_column: String,
    pub ingest_type: String,
    pub feature_type: String,
}

fn default_prefix() -> String {
    "/api/nldi".to_owned()
}
fn default_pretty_print() -> bool {
    false
}
fn default_bind_address() -> String {
    "0.0.0.0:8080".to_owned()
}
fn default_db_port() -> u16 {
    5432
}
fn default_pool_size() -> u32 {
    4
}
fn default_pool_timeout_ms() -> u64 {
    5_000
}
fn default_remote_timeout_s() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_owned()
}

impl AppConfig {
    /// Loads and parses the YAML file at `path`, interpolating `${VAR}`
    /// references against the process environment first. Environment
    /// variables named in spec.md §6 (`NLDI_URL`, `NLDI_DB_HOST`, ...) are
    /// the intended values for those references, but any env var can be
    /// substituted this way.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::ConfigurationError {
            message: format!("failed to read config file {:?}: {e}", path.as_ref()),
        })?;
        let interpolated = interpolate_env(&raw);

        config::Config::builder()
            .add_source(config::File::from_str(
                &interpolated,
                config::FileFormat::Yaml,
            ))
            .build()
            .map_err(|e| Error::ConfigurationError {
                message: format!("failed to build config: {e}"),
            })?
            .try_deserialize()
            .map_err(|e| Error::ConfigurationError {
                message: format!("failed to deserialize config: {e}"),
            })
    }
}

/// Replaces `${VAR}` (and `$VAR`) occurrences with the value of the named
/// environment variable, left untouched when the variable is unset.
fn interpolate_env(input: &str) -> String {
    let env: HashMap<String, String> = std::env::vars().collect();
    let mut out = String::with_capacity(input.len());
    let bytes = input.as_bytes();

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            if i + 1 < bytes.len() && bytes[i + 1] == b'{' {
                if let Some(end) = input[i + 2..].find('}') {
                    let name = &input[i + 2..i + 2 + end];
                    if let Some(value) = env.get(name) {
                        out.push_str(value);
                    } else {
                        out.push_str(&input[i..i + 2 + end + 1]);
                    }
                    i += 2 + end + 1;
                    continue;
                }
            }
        }
        let ch = input[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_known_vars() {
        std::env::set_var("NLDI_TEST_VAR", "wisconsin");
        let out = interpolate_env("host: ${NLDI_TEST_VAR}\nport: 5432");
        assert_eq!(out, "host: wisconsin\nport: 5432");
    }

    #[test]
    fn leaves_unknown_vars_untouched() {
        let out = interpolate_env("host: ${NLDI_DEFINITELY_UNSET_VAR}");
        assert_eq!(out, "host: ${NLDI_DEFINITELY_UNSET_VAR}");
    }
}
