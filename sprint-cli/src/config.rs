use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sprint_core::EngineConfig;
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{default_store_path, ensure_sprint_home};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub storage: StorageSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Store file; defaults to ~/.sprint/sprint.json
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// tracing filter directive, e.g. "info" or "sprint_core=debug". RUST_LOG wins.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// `--store` beats `[storage] path` beats the default location.
    pub fn store_path(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
        match cli_override.or(self.storage.path.as_deref()) {
            Some(p) => Ok(p.to_path_buf()),
            None => default_store_path(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_sprint_home()?.join("config.toml"))
}

fn resolve(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => config_path(),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let p = resolve(path)?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<PathBuf> {
    let p = resolve(path)?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(p)
}

pub fn init_config(path: Option<&Path>) -> Result<()> {
    let p = resolve(path)?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let written = save_config(&Config::default(), Some(p.as_path()))?;
    println!("Wrote {}", written.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprint_core::HourApportionment;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[engine]
apportionment = "full_span"

[logging]
level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(cfg.engine.apportionment, HourApportionment::FullSpan);
        assert_eq!(cfg.engine.working_hours_per_day, 8);
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.storage.path.is_none());
    }

    #[test]
    fn init_writes_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        init_config(Some(p.as_path())).unwrap();
        let loaded = load_config(Some(p.as_path())).unwrap();
        assert_eq!(loaded.engine, EngineConfig::default());
        assert_eq!(loaded.logging.level, "warn");

        fs::write(&p, "[logging]\nlevel = \"info\"\n").unwrap();
        init_config(Some(p.as_path())).unwrap();
        assert_eq!(load_config(Some(p.as_path())).unwrap().logging.level, "info");
    }

    #[test]
    fn store_override_wins() {
        let cfg = Config {
            storage: StorageSection {
                path: Some(PathBuf::from("/tmp/from-config.json")),
            },
            ..Config::default()
        };
        let p = cfg.store_path(Some(Path::new("/tmp/from-flag.json"))).unwrap();
        assert_eq!(p, PathBuf::from("/tmp/from-flag.json"));
        assert_eq!(cfg.store_path(None).unwrap(), PathBuf::from("/tmp/from-config.json"));
    }
}
