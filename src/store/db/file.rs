use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::fs;
use tracing::trace;

use crate::{
    Result,
    store::{KvStore, map_db_err},
};

/// Stores each key as `<dir>/<key>.json`.
///
/// Saves write a sibling temp file and rename it over the target, so readers
/// see either the previous document or the new one.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens the store, creating `dir` when missing.
    pub async fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await.map_err(map_db_err)?;
        Ok(Self {
            dir,
        })
    }

    fn path(
        &self,
        key: &str,
    ) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn load(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        let path = self.path(key);
        trace!("file_store::load({:?})", path);
        match fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(map_db_err(err)),
        }
    }

    async fn save(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let path = self.path(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        trace!("file_store::save({:?})", path);
        fs::write(&tmp, value).await.map_err(map_db_err)?;
        fs::rename(&tmp, &path).await.map_err(map_db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("state")).await.unwrap();
        assert_eq!(store.load("workflows").await.unwrap(), None);

        store.save("workflows", r#"[{"id":1}]"#).await.unwrap();
        store.save("workflows", r#"[{"id":2}]"#).await.unwrap();

        let reopened = FileStore::open(dir.path().join("state")).await.unwrap();
        assert_eq!(reopened.load("workflows").await.unwrap().as_deref(), Some(r#"[{"id":2}]"#));
        assert!(dir.path().join("state/workflows.json").exists());
        assert!(!dir.path().join("state/.workflows.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_unreadable_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        std::fs::create_dir(dir.path().join("credential.json")).unwrap();
        assert!(store.load("credential").await.is_err());
    }
}
