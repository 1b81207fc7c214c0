//! Configuration handling for the forms service client

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::api::Credentials;

/// Configuration problems that stop a run before any request is made
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration directory available; pass --config-file")]
    NoConfigDir,
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in config file {path}: {source}")]
    Invalid {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("password is required when using username authentication")]
    MissingPassword,
    #[error("authentication required: provide --bearer-token or -u/-p, or set them in the config file")]
    MissingCredentials,
}

/// User configuration, stored as JSON
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ApiConfig {
    /// Username for Basic auth
    pub username: Option<String>,
    /// Password for Basic auth
    pub password: Option<String>,
    /// OAuth bearer token, preferred over Basic auth
    pub bearer_token: Option<String>,
    /// Form used to filter listings and to reshape submissions
    pub form_id: Option<u64>,
    /// API root override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Page size for list endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    /// Default log level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Where the loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    /// No file existed; one holding the defaults was written
    CreatedDefault(PathBuf),
    /// No file existed and none could be written
    Defaults,
}

/// Values given on the command line, which win over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub username: Option<String>,
    pub password: Option<String>,
    pub bearer_token: Option<String>,
    pub form_id: Option<u64>,
}

impl ApiConfig {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "gocanvas", "canvas-sync")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from `path`, or the default location.
    ///
    /// A missing file is created holding the defaults.
    pub fn load(path: Option<&Path>) -> Result<(Self, ConfigOrigin), ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path().ok_or(ConfigError::NoConfigDir)?,
        };

        if !path.exists() {
            let config = Self::default();
            return Ok(match config.save(&path) {
                Ok(()) => (config, ConfigOrigin::CreatedDefault(path)),
                Err(_) => (config, ConfigOrigin::Defaults),
            });
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Invalid {
            path: path.clone(),
            source,
        })?;
        Ok((config, ConfigOrigin::File(path)))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, content).map_err(write_error)
    }

    /// Apply command line values on top of the file values
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if overrides.username.is_some() {
            self.username = overrides.username;
        }
        if overrides.password.is_some() {
            self.password = overrides.password;
        }
        if overrides.bearer_token.is_some() {
            self.bearer_token = overrides.bearer_token;
        }
        if overrides.form_id.is_some() {
            self.form_id = overrides.form_id;
        }
        self
    }

    /// Resolve the credentials to authenticate with
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let username = non_empty(&self.username);
        let password = non_empty(&self.password);

        if username.is_some() && password.is_none() {
            return Err(ConfigError::MissingPassword);
        }
        if let Some(token) = non_empty(&self.bearer_token) {
            return Ok(Credentials::Bearer(token.to_string()));
        }
        match (username, password) {
            (Some(username), Some(password)) => Ok(Credentials::Basic {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}

/// Accept a tracing level name, mapping the `WARNING`/`CRITICAL`/`FATAL`
/// spellings onto `warn` and `error`
pub fn parse_log_level(value: &str) -> Result<String, String> {
    let level = match value.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "critical" | "fatal" => "error",
        other => {
            return Err(format!(
                "unknown log level '{other}'; expected error, warn, info, debug or trace"
            ))
        }
    };
    Ok(level.to_string())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.username.is_none());
        assert!(config.password.is_none());
        assert!(config.bearer_token.is_none());
        assert!(config.form_id.is_none());
        assert!(config.base_url.is_none());
        assert!(config.per_page.is_none());
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_default_file_has_null_credentials() {
        let json = serde_json::to_value(ApiConfig::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "username": null,
                "password": null,
                "bearer_token": null,
                "form_id": null
            })
        );
    }

    #[test]
    fn test_unrecognized_keys_are_skipped() {
        let parsed: ApiConfig =
            serde_json::from_str(r#"{"form_id": 5501, "legacy_output_format": "xml"}"#).unwrap();
        assert_eq!(parsed.form_id, Some(5501));
        assert!(parsed.bearer_token.is_none());
    }

    #[test]
    fn test_deserialize_from_empty_json() {
        let parsed: ApiConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, ApiConfig::default());
    }

    #[test]
    fn test_load_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let (config, origin) = ApiConfig::load(Some(&path)).unwrap();
        assert_eq!(config, ApiConfig::default());
        assert_eq!(origin, ConfigOrigin::CreatedDefault(path.clone()));
        assert!(path.exists());

        let (_, origin) = ApiConfig::load(Some(&path)).unwrap();
        assert_eq!(origin, ConfigOrigin::File(path));
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = ApiConfig {
            username: Some("user@example.com".into()),
            password: Some("pw".into()),
            form_id: Some(5501),
            per_page: Some(50),
            ..Default::default()
        };
        config.save(&path).unwrap();

        let (loaded, _) = ApiConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            ApiConfig::load(Some(&path)),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_overrides_win() {
        let config = ApiConfig {
            username: Some("file-user".into()),
            password: Some("file-pw".into()),
            form_id: Some(1),
            ..Default::default()
        }
        .with_overrides(ConfigOverrides {
            username: Some("cli-user".into()),
            form_id: Some(2),
            ..Default::default()
        });

        assert_eq!(config.username.as_deref(), Some("cli-user"));
        assert_eq!(config.password.as_deref(), Some("file-pw"));
        assert_eq!(config.form_id, Some(2));
    }

    #[test]
    fn test_bearer_preferred() {
        let config = ApiConfig {
            username: Some("u".into()),
            password: Some("p".into()),
            bearer_token: Some("tok".into()),
            ..Default::default()
        };
        assert_eq!(
            config.credentials().unwrap(),
            Credentials::Bearer("tok".into())
        );
    }

    #[test]
    fn test_basic_credentials() {
        let config = ApiConfig {
            username: Some("u".into()),
            password: Some("p".into()),
            bearer_token: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            config.credentials().unwrap(),
            Credentials::Basic {
                username: "u".into(),
                password: "p".into()
            }
        );
    }

    #[test]
    fn test_username_without_password() {
        let config = ApiConfig {
            username: Some("u".into()),
            bearer_token: Some("tok".into()),
            ..Default::default()
        };
        assert!(matches!(
            config.credentials(),
            Err(ConfigError::MissingPassword)
        ));
    }

    #[test]
    fn test_no_credentials() {
        assert!(matches!(
            ApiConfig::default().credentials(),
            Err(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    fn test_default_path_file_name() {
        if let Some(path) = ApiConfig::default_path() {
            assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("config.json"));
        }
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug").unwrap(), "debug");
        assert_eq!(parse_log_level("WARNING").unwrap(), "warn");
        assert_eq!(parse_log_level("Critical").unwrap(), "error");
        assert_eq!(parse_log_level(" info ").unwrap(), "info");
        assert!(parse_log_level("verbose").is_err());
    }
}
