//! Durable storage for the ledger document.
//!
//! A backend only moves whole documents: `read` returns the entire stored
//! text, `write` replaces it. There is no append log and no diffing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::Error;

pub trait Backend {
    /// Returns the stored text, or `None` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>, Error>;

    /// Replaces the stored text.
    fn write(&mut self, contents: &str) -> Result<(), Error>;
}

/// Keeps the document in a single JSON file, overwritten on every write.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for JsonFileBackend {
    fn read(&self) -> Result<Option<String>, Error> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, contents: &str) -> Result<(), Error> {
        fs::write(&self.path, contents)?;
        tracing::debug!(
            path = %self.path.display(),
            bytes = contents.len(),
            "ledger file rewritten"
        );
        Ok(())
    }
}

/// Holds the document in memory. Used by tests and benchmarks.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    contents: Option<String>,
    writes: usize,
    fail_writes: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
            ..Self::default()
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Makes every following write fail with an I/O error.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl Backend for MemoryBackend {
    fn read(&self) -> Result<Option<String>, Error> {
        Ok(self.contents.clone())
    }

    fn write(&mut self, contents: &str) -> Result<(), Error> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::Other, "write refused").into());
        }
        self.contents = Some(contents.to_string());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

    /// A fresh, empty directory under the system temp dir.
    pub(crate) fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "rusty-ledger-{}-{}",
            std::process::id(),
            NEXT_DIR.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_file_backend_missing_file_reads_none() {
        let backend = JsonFileBackend::new(scratch_dir().join("data.json"));
        assert!(backend.read().unwrap().is_none());
    }

    #[test]
    fn test_file_backend_overwrites_whole_file() {
        let path = scratch_dir().join("data.json");
        let mut backend = JsonFileBackend::new(&path);
        backend.write("{\"first\": true, \"padding\": \"xxxxxxxx\"}").unwrap();
        backend.write("{}").unwrap();
        assert_eq!(backend.read().unwrap().as_deref(), Some("{}"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_file_backend_write_into_missing_dir_fails() {
        let mut backend = JsonFileBackend::new(scratch_dir().join("missing").join("data.json"));
        let err = backend.write("{}").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_memory_backend() {
        let mut backend = MemoryBackend::new();
        assert!(backend.read().unwrap().is_none());
        backend.write("one").unwrap();
        assert_eq!(backend.contents(), Some("one"));
        assert_eq!(backend.writes(), 1);

        backend.set_fail_writes(true);
        assert!(backend.write("two").is_err());
        assert_eq!(backend.contents(), Some("one"));
        assert_eq!(backend.writes(), 1);
    }
}
