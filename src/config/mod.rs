//! Configuration (layered: code > env > config file).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::auth::{ClientProfile, Endpoints, LoginSettings, ProfileSet};
use crate::error::{DuolinkError, Result};

const CONFIG_FILE_NAME: &str = "config.toml";

/// Everything needed to wire an [`crate::auth::AuthService`].
///
/// Resolution order:
/// 1. Values set in code after loading
/// 2. `DUOLINK_*` environment variables (a `.env` file is honored)
/// 3. `<home>/config.toml`, where `<home>` is `DUOLINK_HOME` or `~/.duolink`
///
/// # Example
/// ```
/// use duolink::config::DuolinkConfig;
///
/// let config: DuolinkConfig = toml::from_str(r#"
///     [profiles.primary]
///     client_id = "primary-id"
///     client_secret = "primary-secret"
///
///     [profiles.secondary]
///     client_id = "tv-id"
/// "#).unwrap();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuolinkConfig {
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub profiles: ProfileSet,
    #[serde(default = "default_home_dir")]
    pub store_dir: PathBuf,
    #[serde(default)]
    pub login: LoginSettings,
}

impl Default for DuolinkConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            profiles: ProfileSet::default(),
            store_dir: default_home_dir(),
            login: LoginSettings::default(),
        }
    }
}

impl DuolinkConfig {
    /// Load `<home>/config.toml` (if present), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let home = home_dir(|key| std::env::var(key).ok());
        let path = home.join(CONFIG_FILE_NAME);
        let mut config = if path.exists() {
            Self::read_file(&path, home)?
        } else {
            Self {
                store_dir: home,
                ..Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load an explicit config file, then apply environment overrides.
    pub fn load_with_file(path: impl AsRef<Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let home = home_dir(|key| std::env::var(key).ok());
        let mut config = Self::read_file(path.as_ref(), home)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML config file without consulting the environment.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::read_file(path.as_ref(), default_home_dir())
    }

    /// Parse `path`; a file without `store_dir` stores credentials under `home`.
    fn read_file(path: &Path, home: PathBuf) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            DuolinkError::Configuration(format!("Cannot read {}: {err}", path.display()))
        })?;
        let table: toml::Table = toml::from_str(&raw)?;
        let has_store_dir = table.contains_key("store_dir");
        let mut config: Self = toml::Value::Table(table).try_into()?;
        if !has_store_dir {
            config.store_dir = home;
        }
        Ok(config)
    }

    /// Apply `DUOLINK_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for profile in ClientProfile::LOGIN_ORDER {
            let prefix = format!("DUOLINK_{}", profile.to_string().to_ascii_uppercase());
            let credentials = self.profiles.get_mut(profile);
            if let Some(value) = lookup(&format!("{prefix}_CLIENT_ID")) {
                credentials.client_id = value;
            }
            if let Some(value) = lookup(&format!("{prefix}_CLIENT_SECRET")) {
                credentials.client_secret = value;
            }
            if let Some(value) = lookup(&format!("{prefix}_SCOPE")) {
                credentials.scope = value;
            }
        }

        let url_mappings: [(&str, &mut String); 4] = [
            ("DUOLINK_DEVICE_CODE_URL", &mut self.endpoints.device_code_url),
            ("DUOLINK_TOKEN_URL", &mut self.endpoints.token_url),
            ("DUOLINK_REVOKE_URL", &mut self.endpoints.revoke_url),
            ("DUOLINK_VERIFICATION_URL", &mut self.endpoints.verification_url),
        ];
        for (env_var, slot) in url_mappings {
            if let Some(value) = lookup(env_var) {
                *slot = value;
            }
        }

        if let Some(dir) = lookup("DUOLINK_STORE_DIR") {
            self.store_dir = PathBuf::from(dir);
        }
        if let Some(name) = lookup("DUOLINK_APP_NAME") {
            self.login.app_name = name;
        }
    }

    /// Both profiles need a client id before a login can start.
    pub fn validate(&self) -> Result<()> {
        for profile in ClientProfile::LOGIN_ORDER {
            if !self.profiles.get(profile).is_configured() {
                return Err(DuolinkError::Configuration(format!(
                    "missing client_id for the {profile} profile"
                )));
            }
        }
        let endpoints = [
            ("device_code_url", &self.endpoints.device_code_url),
            ("token_url", &self.endpoints.token_url),
            ("revoke_url", &self.endpoints.revoke_url),
        ];
        for (name, url) in endpoints {
            if url.trim().is_empty() {
                return Err(DuolinkError::Configuration(format!("{name} is empty")));
            }
        }
        Ok(())
    }
}

fn home_dir(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup("DUOLINK_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(default_home_dir)
}

fn default_home_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".duolink"))
        .unwrap_or_else(|| PathBuf::from(".duolink"))
}
