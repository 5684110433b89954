use crate::ftp::FtpConnector;
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "FTPBACKUP_";

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// `host`, `host:port` or `host port`.
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Remote directory holding one subdirectory per backup set.
    #[serde(default)]
    pub remote_path: Option<String>,
    /// Local directory holding the `FULL-*` backup sets.
    #[serde(default)]
    pub backup_root: Option<PathBuf>,
    /// Full backups to keep remotely; 0 or less disables pruning.
    #[serde(default)]
    pub max_stored_full: i32,
}

impl AppConfig {
    /// Reads the config file (if any) and applies `FTPBACKUP_*` overrides.
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_overrides(|key| env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = var("SERVER") {
            self.server = Some(v);
        }
        if let Some(v) = var("LOGIN") {
            self.login = Some(v);
        }
        if let Some(v) = var("PASSWORD") {
            self.password = Some(v);
        }
        if let Some(v) = var("REMOTE_PATH") {
            self.remote_path = Some(v);
        }
        if let Some(v) = var("BACKUP_ROOT") {
            self.backup_root = Some(PathBuf::from(v));
        }
        if let Some(v) = var("MAX_STORED_FULL") {
            self.max_stored_full = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_PREFIX}MAX_STORED_FULL is not an integer: '{v}'"))?;
        }
        Ok(())
    }

    pub fn connector(&self) -> Result<FtpConnector> {
        Ok(FtpConnector {
            address: required(&self.server, "server")?.to_string(),
            login: required(&self.login, "login")?.to_string(),
            password: self.password.clone().unwrap_or_default(),
        })
    }

    pub fn remote_path(&self) -> Result<&str> {
        required(&self.remote_path, "remote_path")
    }

    pub fn backup_root(&self) -> Result<&Path> {
        self.backup_root.as_deref().ok_or_else(|| {
            anyhow!(
                "backup_root is not configured (set it in the config or {ENV_PREFIX}BACKUP_ROOT)"
            )
        })
    }
}

fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(anyhow!(
            "{key} is not configured (set it in the config file or {ENV_PREFIX}{})",
            key.to_uppercase()
        )),
    }
}

/// `$FTPBACKUP_CONFIG`, else `~/.config/ftpbackup/config.toml`.
pub fn config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(format!("{ENV_PREFIX}CONFIG")) {
        return Ok(PathBuf::from(path));
    }
    let base = home_config_dir().ok_or_else(|| anyhow!("unable to locate config dir"))?;
    Ok(base.join("ftpbackup").join("config.toml"))
}

/// Returns ~/.config on all platforms instead of platform-specific config dirs.
fn home_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".config"))
}
