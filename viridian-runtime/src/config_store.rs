use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};
use viridian_core::config::ClientConfig;

pub const CONFIG_FILE_NAME: &str = "viridian.json";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored config. A missing file yields the defaults.
    pub fn load(&self) -> anyhow::Result<ClientConfig> {
        if !self.path.exists() {
            log::debug!(
                "no config at {}; using defaults",
                self.path.display()
            );
            return Ok(ClientConfig::default());
        }
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("read config: {}", self.path.display()))?;
        let cfg: ClientConfig = serde_json::from_slice(&bytes).context("decode config JSON")?;
        Ok(cfg)
    }

    /// Written to a temp file in the target directory, then renamed over the old file.
    pub fn save(&self, cfg: &ClientConfig) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(cfg).context("encode config JSON")?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create config directory: {}", dir.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("create temp config in {}", dir.display()))?;
        tmp.write_all(&json).context("write temp config")?;
        tmp.as_file().sync_all().context("flush temp config")?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("replace config: {}", self.path.display()))?;
        log::debug!("config saved to {}", self.path.display());
        Ok(())
    }
}
