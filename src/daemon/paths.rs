//! Default locations for scribe data.
//!
//! - [`get_scribe_dir`] - `$SCRIBE_HOME`, else `<data dir>/scribe/`
//! - [`get_store_path`] - `<scribe dir>/transcriptions.redb`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the scribe data directory.
///
/// Resolution order:
/// 1. `SCRIBE_HOME` environment variable (if set and non-empty)
/// 2. The platform data directory joined with `scribe`
pub fn get_scribe_dir() -> Result<PathBuf> {
    resolve_scribe_dir(std::env::var("SCRIBE_HOME").ok())
}

fn resolve_scribe_dir(home: Option<String>) -> Result<PathBuf> {
    if let Some(home) = home
        && !home.is_empty()
    {
        return Ok(PathBuf::from(home));
    }

    let data = dirs::data_dir().context("Failed to determine the platform data directory")?;
    Ok(data.join("scribe"))
}

/// Get the default redb database path.
pub fn get_store_path() -> Result<PathBuf> {
    Ok(get_scribe_dir()?.join("transcriptions.redb"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_override() {
        let dir = resolve_scribe_dir(Some("/srv/scribe".to_string())).unwrap();
        assert_eq!(dir, PathBuf::from("/srv/scribe"));
    }

    #[test]
    fn test_empty_home_falls_back() {
        let dir = resolve_scribe_dir(Some(String::new())).unwrap();
        assert!(dir.ends_with("scribe"));
    }

    #[test]
    fn test_store_path_is_inside_scribe_dir() {
        let dir = get_scribe_dir().unwrap();
        let store = get_store_path().unwrap();
        assert!(store.starts_with(&dir));
        assert_eq!(store.extension().and_then(|e| e.to_str()), Some("redb"));
    }
}
