use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{feed::FeedOptions, store::SupabaseConfig};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Supabase,
    #[default]
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SqliteSettings {
    pub path: PathBuf,
}

impl Default for SqliteSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("til.sqlite3"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub backend: Backend,
    pub supabase: SupabaseConfig,
    pub sqlite: SqliteSettings,
    pub discard_stale_refreshes: bool,
    #[serde(skip)]
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            supabase: SupabaseConfig::default(),
            sqlite: SqliteSettings::default(),
            discard_stale_refreshes: true,
            debug: false,
        }
    }
}

impl Settings {
    /// Reads the JSON settings file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `TIL_*` overrides. Supplying both Supabase variables selects that backend.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("TIL_SUPABASE_URL").filter(|value| !value.is_empty());
        let key = lookup("TIL_SUPABASE_KEY").filter(|value| !value.is_empty());
        if let (Some(url), Some(key)) = (url, key) {
            self.supabase.url = url;
            self.supabase.api_key = key;
            self.backend = Backend::Supabase;
        }

        if let Some(path) = lookup("TIL_DB_PATH").filter(|value| !value.is_empty()) {
            self.sqlite.path = PathBuf::from(path);
        }

        self.debug = lookup("TIL_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        self
    }

    pub fn feed_options(&self) -> FeedOptions {
        FeedOptions {
            discard_stale_refreshes: self.discard_stale_refreshes,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings.backend, Backend::Sqlite);
        assert_eq!(settings.sqlite.path, PathBuf::from("til.sqlite3"));
        assert_eq!(settings.supabase.table, "facts");
        assert!(settings.feed_options().discard_stale_refreshes);
    }

    #[test]
    fn reads_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("til.json");
        fs::write(
            &path,
            r#"{ "backend": "supabase", "supabase": { "url": "https://x.supabase.co", "apiKey": "k" }, "discardStaleRefreshes": false }"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.backend, Backend::Supabase);
        assert_eq!(settings.supabase.api_key, "k");
        assert_eq!(settings.supabase.timeout_secs, 10);
        assert!(!settings.feed_options().discard_stale_refreshes);
    }

    #[test]
    fn rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("til.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("til.json");
        let mut settings = Settings::default();
        settings.sqlite.path = PathBuf::from("/tmp/elsewhere.sqlite3");
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap().sqlite, settings.sqlite);
    }

    #[test]
    fn env_overrides_select_supabase() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TIL_SUPABASE_URL", "https://abc.supabase.co"),
            ("TIL_SUPABASE_KEY", "anon"),
            ("TIL_DEBUG", "TRUE"),
        ]);
        let settings =
            Settings::default().with_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(settings.backend, Backend::Supabase);
        assert_eq!(settings.supabase.url, "https://abc.supabase.co");
        assert!(settings.debug);
    }

    #[test]
    fn half_configured_supabase_is_ignored() {
        let settings = Settings::default().with_overrides(|key| match key {
            "TIL_SUPABASE_URL" => Some("https://abc.supabase.co".into()),
            "TIL_DB_PATH" => Some("data/facts.sqlite3".into()),
            _ => None,
        });
        assert_eq!(settings.backend, Backend::Sqlite);
        assert!(settings.supabase.url.is_empty());
        assert_eq!(settings.sqlite.path, PathBuf::from("data/facts.sqlite3"));
        assert!(!settings.debug);
    }
}
