use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::dao::storage::{StorageError, StorageResult};

use super::KeyValueBackend;

/// Stores every key as its own JSON file inside a directory.
#[derive(Debug, Clone)]
pub struct FileKvBackend {
    root: PathBuf,
}

impl FileKvBackend {
    /// Use `root` as the storage directory. It is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the documents.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name = key
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '.' => c,
                _ => '_',
            })
            .collect::<String>();
        self.root.join(format!("{file_name}.json"))
    }
}

impl KeyValueBackend for FileKvBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::unavailable(
                format!("failed to read `{}`", path.display()),
                err,
            )),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        fs::create_dir_all(&self.root).map_err(|err| {
            StorageError::unavailable(
                format!("failed to create `{}`", self.root.display()),
                err,
            )
        })?;

        // Write next to the target then rename so readers never see half a document.
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value).map_err(|err| {
            StorageError::unavailable(format!("failed to write `{}`", staging.display()), err)
        })?;
        fs::rename(&staging, &path).map_err(|err| {
            StorageError::unavailable(format!("failed to replace `{}`", path.display()), err)
        })
    }
}
