use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{anyhow, Result};
use uuid::Uuid;

const ID_FILE: &str = "conversation_id";

/// Returns the durable conversation id for this user, generating and
/// storing a fresh one on first use.
///
/// The id lives in a single file under the per-user config directory and
/// correlates every turn of this user's conversations with the answering
/// service. When the directory cannot be read or written the id degrades
/// to one stable in-memory token for the lifetime of the process.
pub fn get_or_create_id() -> String {
    match storage_dir().and_then(|dir| load_or_create_in(&dir)) {
        Ok(id) => id,
        Err(err) => {
            tracing::warn!("conversation id storage unavailable: {err:#}");
            ephemeral_id().to_string()
        }
    }
}

fn storage_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir().ok_or_else(|| anyhow!("could not determine config directory"))?;
    Ok(dir.join("lyon-assist"))
}

/// Reads the id stored in `dir`, or generates and stores a new one.
/// The write happens before the id is returned, so a second reader sees
/// the same token.
pub fn load_or_create_in(dir: &Path) -> Result<String> {
    let path = dir.join(ID_FILE);
    if let Ok(existing) = fs::read_to_string(&path) {
        let existing = existing.trim();
        if !existing.is_empty() {
            return Ok(existing.to_string());
        }
    }

    fs::create_dir_all(dir)?;
    let id = Uuid::new_v4().to_string();
    fs::write(&path, &id)?;
    Ok(id)
}

/// One in-memory id per process, used only when storage is unavailable.
fn ephemeral_id() -> &'static str {
    static ID: OnceLock<String> = OnceLock::new();
    ID.get_or_init(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn repeated_reads_return_the_same_id() {
        let dir = TempDir::new().unwrap();
        let first = load_or_create_in(dir.path()).unwrap();
        let second = load_or_create_in(dir.path()).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn clearing_storage_yields_a_different_id() {
        let dir = TempDir::new().unwrap();
        let first = load_or_create_in(dir.path()).unwrap();
        fs::remove_file(dir.path().join(ID_FILE)).unwrap();
        let second = load_or_create_in(dir.path()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn an_empty_file_is_treated_as_absent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(ID_FILE), "  \n").unwrap();
        let id = load_or_create_in(dir.path()).unwrap();
        assert!(!id.trim().is_empty());
        // and the fresh id is now stored
        assert_eq!(load_or_create_in(dir.path()).unwrap(), id);
    }

    #[test]
    fn ephemeral_fallback_is_stable_within_the_process() {
        assert_eq!(ephemeral_id(), ephemeral_id());
    }
}
