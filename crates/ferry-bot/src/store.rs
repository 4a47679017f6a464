//! Line-based `KEY=value` store.
//!
//! The download run writes the resolved source path here; the upload run
//! reads it back. Unrelated lines (other keys, comments, blanks) are
//! preserved on update.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

/// A `KEY=value`-per-line configuration store.
#[derive(Debug, Clone)]
pub struct KvStore {
    path: PathBuf,
}

impl KvStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read the value for `key`, or `None` when the file or key is absent.
    pub async fn get(&self, key: &str) -> io::Result<Option<String>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let prefix = format!("{key}=");
        Ok(content
            .lines()
            .find_map(|line| line.strip_prefix(&prefix))
            .map(|v| v.trim().to_string()))
    }

    /// Set `key` to `value`, replacing an existing line or appending a new
    /// one. Every other line is written back unchanged.
    pub async fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e),
        };

        let prefix = format!("{key}=");
        let mut lines: Vec<String> = Vec::new();
        let mut updated = false;
        for line in content.lines() {
            if line.starts_with(&prefix) {
                lines.push(format!("{key}={value}"));
                updated = true;
            } else {
                lines.push(line.to_string());
            }
        }
        if !updated {
            lines.push(format!("{key}={value}"));
        }

        fs::write(&self.path, lines.join("\n") + "\n").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = KvStore::new(dir.path().join("absent.env"));
        assert_eq!(store.get("KEY").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_creates_file() {
        let dir = TempDir::new().unwrap();
        let store = KvStore::new(dir.path().join("new.env"));
        store.set("FERRY_SOURCE_PATH", "/data/a.mp4").await.unwrap();
        assert_eq!(
            store.get("FERRY_SOURCE_PATH").await.unwrap(),
            Some("/data/a.mp4".to_string())
        );
    }

    #[tokio::test]
    async fn test_set_preserves_unrelated_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.env");
        fs::write(&path, "# comment\nTOKEN=abc\nFERRY_SOURCE_PATH=/old.mp4\nOTHER=1\n")
            .await
            .unwrap();

        let store = KvStore::new(&path);
        store.set("FERRY_SOURCE_PATH", "/new.mp4").await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert_eq!(
            content,
            "# comment\nTOKEN=abc\nFERRY_SOURCE_PATH=/new.mp4\nOTHER=1\n"
        );
    }

    #[tokio::test]
    async fn test_set_appends_new_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.env");
        fs::write(&path, "TOKEN=abc\n").await.unwrap();

        let store = KvStore::new(&path);
        store.set("FERRY_SOURCE_PATH", "/a.mp4").await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "TOKEN=abc\nFERRY_SOURCE_PATH=/a.mp4\n");
    }

    #[tokio::test]
    async fn test_similar_key_is_not_clobbered() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.env");
        fs::write(&path, "FERRY_SOURCE_PATH_BACKUP=/b.mp4\n")
            .await
            .unwrap();

        let store = KvStore::new(&path);
        store.set("FERRY_SOURCE_PATH", "/a.mp4").await.unwrap();
        assert_eq!(
            store.get("FERRY_SOURCE_PATH_BACKUP").await.unwrap(),
            Some("/b.mp4".to_string())
        );
        assert_eq!(
            store.get("FERRY_SOURCE_PATH").await.unwrap(),
            Some("/a.mp4".to_string())
        );
    }
}
