//! Durable single-file storage adapter.
//!
//! Every write goes to a fresh temporary file next to the target, is flushed to
//! disk, and is then renamed over the target. A rename within one directory is
//! atomic, so readers see either the old payload or the new one, and a crash
//! mid-write leaves at worst a stray `.tmp` file behind.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};
use uuid::Uuid;

use lowdoc_core::{
    adapter::{StorageAdapter, StorageAdapterBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
};

/// Storage adapter backed by one file on disk.
///
/// # Example
///
/// ```ignore
/// use lowdoc_fs::FileAdapter;
/// use lowdoc::adapter::StorageAdapterBuilder;
///
/// let adapter = FileAdapter::builder()
///     .path("data/app.json")
///     .build()?;
/// let store = DocumentStore::new(adapter);
/// ```
#[derive(Debug, Clone)]
pub struct FileAdapter {
    path: PathBuf,
}

impl FileAdapter {
    /// Creates a builder for a file adapter.
    pub fn builder() -> FileAdapterBuilder {
        FileAdapterBuilder::default()
    }

    /// Returns the target file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();

        self.directory()
            .join(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()))
    }

    fn write_atomic(&self, payload: &str) -> io::Result<()> {
        let temp = self.temp_path();

        let result = (|| {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&temp)?;
            file.write_all(payload.as_bytes())?;
            file.sync_all()?;
            drop(file);

            fs::rename(&temp, &self.path)
        })();

        if result.is_err() {
            let _ = fs::remove_file(&temp);
            return result;
        }

        // Persist the rename itself; not every platform can open a directory.
        #[cfg(unix)]
        {
            if let Ok(dir) = File::open(self.directory()) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }

    /// Checks that a temporary file can be created next to the target and that
    /// an existing target is a readable file.
    fn probe(&self) -> io::Result<()> {
        let temp = self.temp_path();
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp)?;
        fs::remove_file(&temp)?;

        match fs::metadata(&self.path) {
            Ok(meta) if meta.is_dir() => Err(io::Error::new(
                ErrorKind::InvalidInput,
                "target path is a directory",
            )),
            Ok(_) => File::open(&self.path).map(drop),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl StorageAdapter for FileAdapter {
    fn read(&self) -> Option<String> {
        self.try_read().unwrap_or_else(|err| {
            tracing::warn!("Failed to read {}", err);
            None
        })
    }

    /// Only a missing file is absent. A file that is not valid UTF-8 is a
    /// corrupt payload; any other read error means the file is unavailable.
    fn try_read(&self) -> DocumentStoreResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) if err.kind() == ErrorKind::InvalidData => Err(DocumentStoreError::CorruptPayload(
                format!("{}: {}", self.path.display(), err),
            )),
            Err(err) => Err(DocumentStoreError::AdapterUnavailable(format!(
                "{}: {}",
                self.path.display(),
                err
            ))),
        }
    }

    fn write(&self, payload: &str) -> DocumentStoreResult<()> {
        self.write_atomic(payload).map_err(|err| {
            DocumentStoreError::AdapterUnavailable(format!("{}: {}", self.path.display(), err))
        })
    }

    fn is_durable(&self) -> bool {
        true
    }
}

/// Builder for constructing [`FileAdapter`] instances.
///
/// Building validates the location: missing parent directories are created
/// (unless disabled) and a probe file is written and removed next to the
/// target, so a successfully built adapter is known to be writable.
#[derive(Debug)]
pub struct FileAdapterBuilder {
    path: Option<PathBuf>,
    create_dirs: bool,
}

impl Default for FileAdapterBuilder {
    fn default() -> Self {
        Self {
            path: None,
            create_dirs: true,
        }
    }
}

impl FileAdapterBuilder {
    /// Sets the file holding the store.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Whether to create missing parent directories. Defaults to `true`.
    pub fn create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }
}

impl StorageAdapterBuilder for FileAdapterBuilder {
    type Adapter = FileAdapter;

    fn build(self) -> DocumentStoreResult<Self::Adapter> {
        let path = self
            .path
            .ok_or_else(|| DocumentStoreError::Initialization("no file path configured".to_string()))?;

        if path.file_name().is_none() {
            return Err(DocumentStoreError::Initialization(format!(
                "{} does not name a file",
                path.display()
            )));
        }

        let adapter = FileAdapter { path };
        let unavailable =
            |err: io::Error| DocumentStoreError::AdapterUnavailable(format!("{}: {}", adapter.path.display(), err));

        if self.create_dirs {
            fs::create_dir_all(adapter.directory()).map_err(unavailable)?;
        }
        adapter.probe().map_err(unavailable)?;

        tracing::info!("Using file storage: {}", adapter.path.display());
        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_missing_file_reads_as_none() {
        let temp = TempDir::new().unwrap();
        let adapter = FileAdapter::builder().path(temp.path().join("db.json")).build().unwrap();

        assert_eq!(adapter.read(), None);
        assert!(adapter.is_durable());
    }

    #[test]
    fn test_invalid_utf8_is_corrupt_not_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("db.json");
        fs::write(&path, [0x7b, 0xff, 0xfe, 0x7d]).unwrap();
        let adapter = FileAdapter::builder().path(&path).build().unwrap();

        assert!(matches!(adapter.try_read(), Err(DocumentStoreError::CorruptPayload(_))));
        assert_eq!(adapter.read(), None);
        assert_eq!(fs::read(&path).unwrap(), vec![0x7b, 0xff, 0xfe, 0x7d]);
    }

    #[test]
    fn test_write_read() {
        let temp = TempDir::new().unwrap();
        let adapter = FileAdapter::builder().path(temp.path().join("db.json")).build().unwrap();

        adapter.write(r#"{"users":[]}"#).unwrap();
        adapter.write(r#"{"users":[{"id":1}]}"#).unwrap();

        assert_eq!(adapter.read().as_deref(), Some(r#"{"users":[{"id":1}]}"#));
        assert_eq!(
            fs::read_to_string(temp.path().join("db.json")).unwrap(),
            r#"{"users":[{"id":1}]}"#
        );
    }

    #[test]
    fn test_writes_leave_no_temporary_files() {
        let temp = TempDir::new().unwrap();
        let adapter = FileAdapter::builder().path(temp.path().join("db.json")).build().unwrap();

        for n in 0..5 {
            adapter.write(&format!("{{\"n\":[{n}]}}")).unwrap();
        }

        assert_eq!(entries(temp.path()), vec!["db.json".to_string()]);
    }

    #[test]
    fn test_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a").join("b").join("db.json");

        let adapter = FileAdapter::builder().path(&path).build().unwrap();
        adapter.write("{}").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_missing_directory_fails_without_create_dirs() {
        let temp = TempDir::new().unwrap();

        let result = FileAdapter::builder()
            .path(temp.path().join("missing").join("db.json"))
            .create_dirs(false)
            .build();

        assert!(matches!(result, Err(DocumentStoreError::AdapterUnavailable(_))));
    }

    #[test]
    fn test_parent_that_is_a_file_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let result = FileAdapter::builder().path(blocker.join("db.json")).build();

        assert!(matches!(result, Err(DocumentStoreError::AdapterUnavailable(_))));
    }

    #[test]
    fn test_directory_target_is_unavailable() {
        let temp = TempDir::new().unwrap();

        fs::create_dir(temp.path().join("db.json")).unwrap();
        let result = FileAdapter::builder().path(temp.path().join("db.json")).build();
        assert!(matches!(result, Err(DocumentStoreError::AdapterUnavailable(_))));
    }

    #[test]
    fn test_builder_requires_path() {
        assert!(matches!(
            FileAdapter::builder().build(),
            Err(DocumentStoreError::Initialization(_))
        ));
    }

    #[test]
    fn test_failed_write_keeps_previous_payload() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("data");
        let adapter = FileAdapter::builder().path(dir.join("db.json")).build().unwrap();
        adapter.write("old").unwrap();

        // Replacing the directory with a file makes the temporary file impossible to create.
        let moved = temp.path().join("moved");
        fs::rename(&dir, &moved).unwrap();
        fs::write(&dir, "blocker").unwrap();

        assert!(matches!(adapter.write("new"), Err(DocumentStoreError::AdapterUnavailable(_))));
        assert_eq!(fs::read_to_string(moved.join("db.json")).unwrap(), "old");
    }
}
