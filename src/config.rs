use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

pub const STORE_FILE_NAME: &str = "quickspawn.json";
pub const LOG_FILE_NAME: &str = "quickspawn.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLocation {
    pub dir: PathBuf,
}

impl StoreLocation {
    pub fn resolve() -> Result<Self> {
        Ok(Self {
            dir: base_config_dir()?,
        })
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.join(STORE_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE_NAME)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn base_config_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("resolve home dir")?;
    Ok(base.config_dir().join("quickspawn"))
}
