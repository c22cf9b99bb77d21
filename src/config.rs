use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "WCT_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceKey {
    Editor,
    Preview,
    Language,
}

impl PreferenceKey {
    pub const ALL: [Self; 3] = [Self::Editor, Self::Preview, Self::Language];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Editor => "editor",
            Self::Preview => "preview",
            Self::Language => "language",
        }
    }
}

impl FromStr for PreferenceKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("invalid config key: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub editor: String,
    pub preview: String,
    pub language: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            editor: "BBEdit".to_owned(),
            preview: "Marked".to_owned(),
            language: "markdown".to_owned(),
        }
    }
}

impl Preferences {
    pub fn get(&self, key: PreferenceKey) -> &str {
        match key {
            PreferenceKey::Editor => &self.editor,
            PreferenceKey::Preview => &self.preview,
            PreferenceKey::Language => &self.language,
        }
    }

    pub fn set(&mut self, key: PreferenceKey, value: String) {
        match key {
            PreferenceKey::Editor => self.editor = value,
            PreferenceKey::Preview => self.preview = value,
            PreferenceKey::Language => self.language = value,
        }
    }

    /// `"<key>: <value>"` for every key, in a fixed order.
    pub fn list(&self) -> Vec<String> {
        PreferenceKey::ALL
            .into_iter()
            .map(|key| format!("{}: {}", key.as_str(), self.get(key)))
            .collect()
    }

    /// The preview program, unless it has been cleared.
    pub fn preview_program(&self) -> Option<&str> {
        let preview = self.preview.trim();
        (!preview.is_empty()).then_some(preview)
    }
}

/// Preferences persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `explicit`, else `$WCT_CONFIG`, else `wct/config.json` under
    /// `$XDG_CONFIG_HOME` or `$HOME/.config`.
    pub fn locate(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self::new(path));
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(path));
        }
        let config_home = match std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = std::env::var_os("HOME")
                    .filter(|v| !v.is_empty())
                    .context("cannot locate config: set --config, WCT_CONFIG or HOME")?;
                PathBuf::from(home).join(".config")
            }
        };
        Ok(Self::new(config_home.join("wct").join("config.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<Preferences> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Preferences::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("read config: {}", self.path.display()));
            }
        };
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parse config: {}", self.path.display()))
    }

    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        let key: PreferenceKey = key.parse()?;
        Ok(self.load()?.get(key).to_owned())
    }

    /// Stores `value` under `key`; a missing value is stored as `""`.
    pub fn set(&self, key: &str, value: Option<&str>) -> anyhow::Result<()> {
        let key: PreferenceKey = key.parse()?;
        let mut preferences = self.load()?;
        preferences.set(key, value.unwrap_or_default().to_owned());
        tracing::info!(key = key.as_str(), path = %self.path.display(), "set config");
        self.save(&preferences)
    }

    pub fn list(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.load()?.list())
    }

    fn save(&self, preferences: &Preferences) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create config dir: {}", parent.display()))?;
        }
        let tmp_path = self
            .path
            .with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
        let data = serde_json::to_vec_pretty(preferences).context("serialize config")?;
        std::fs::write(&tmp_path, &data)
            .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("rename tmp to final: {}", self.path.display()))?;
        Ok(())
    }
}
