//! Settings loading and validation.
//!
//! Configuration problems are fatal at startup: a daemon running against a
//! half-valid config would sync the wrong things silently.

use std::collections::HashSet;
use std::path::Path;

use flowsync_types::SyncSettings;

use crate::error::{SyncError, SyncResult};

/// Load and validate settings from a JSON file.
pub fn load_settings(path: &Path) -> SyncResult<SyncSettings> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SyncError::Config(format!("cannot read {}: {}", path.display(), e)))?;

    let settings: SyncSettings = serde_json::from_str(&content)
        .map_err(|e| SyncError::Config(format!("cannot parse {}: {}", path.display(), e)))?;

    validate(&settings)?;
    Ok(settings)
}

/// Validate settings regardless of where they came from.
pub fn validate(settings: &SyncSettings) -> SyncResult<()> {
    if settings.token.trim().is_empty() {
        return Err(SyncError::Config("token must not be empty".into()));
    }
    if settings.bot_list.is_empty() {
        return Err(SyncError::Config("bot_list must not be empty".into()));
    }

    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for bot in &settings.bot_list {
        if bot.id.trim().is_empty() || bot.name.trim().is_empty() {
            return Err(SyncError::Config(format!(
                "bot entries need non-empty id and name, got id={:?} name={:?}",
                bot.id, bot.name
            )));
        }
        if !ids.insert(&bot.id) {
            return Err(SyncError::Config(format!("duplicate bot id {:?}", bot.id)));
        }
        // Names become mirror file stems, so collisions would cross-wire bots.
        if !names.insert(&bot.name) {
            return Err(SyncError::Config(format!("duplicate bot name {:?}", bot.name)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("config.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_valid_config() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"{
                "token": "secret",
                "bot_list": [{"id": "bot-1", "name": "support"}],
                "pull_interval": 5
            }"#,
        );
        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.pull_interval, 5);
        assert_eq!(settings.bot_list.len(), 1);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_settings(&tmp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_token_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"{"token": "  ", "bot_list": [{"id": "b", "name": "n"}]}"#,
        );
        assert!(load_settings(&path).is_err());
    }

    #[test]
    fn test_empty_bot_list_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, r#"{"token": "t", "bot_list": []}"#);
        assert!(load_settings(&path).is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"{"token": "t", "bot_list": [
                {"id": "bot-1", "name": "support"},
                {"id": "bot-2", "name": "support"}
            ]}"#,
        );
        let err = load_settings(&path).unwrap_err();
        assert!(err.to_string().contains("duplicate bot name"));
    }
}
