use crate::models::format::{FormatKind, classify};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use thiserror::Error;

/// Why an input path was not added to the worklist
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorklistError {
    #[error("File not found: {0}")]
    NotFound(Utf8PathBuf),

    #[error("Unsupported file type: {0}")]
    UnsupportedExtension(Utf8PathBuf),
}

/// An accepted input file.
///
/// `key` is the normalized path used for de-duplication; `path` is kept as
/// the caller supplied it for display and for building output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: Utf8PathBuf,
    pub key: Utf8PathBuf,
    pub extension: String,
    pub kind: FormatKind,
}

impl InputFile {
    /// Validate `path` and derive its extension and kind.
    pub fn from_path(path: impl AsRef<Utf8Path>) -> Result<Self, WorklistError> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(WorklistError::NotFound(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let kind = classify(&extension)
            .ok_or_else(|| WorklistError::UnsupportedExtension(path.to_path_buf()))?;

        Ok(Self {
            path: path.to_path_buf(),
            key: normalize(path),
            extension,
            kind,
        })
    }

    /// File name for status messages
    pub fn display_name(&self) -> &str {
        self.path.file_name().unwrap_or(self.path.as_str())
    }
}

/// Canonical form of a path used as the worklist key.
///
/// Falls back to the path as given when canonicalization fails.
fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    path.canonicalize_utf8().unwrap_or_else(|_| path.to_path_buf())
}

/// Ordered, de-duplicated list of files waiting for conversion
#[derive(Debug, Clone, Default)]
pub struct Worklist {
    entries: IndexMap<Utf8PathBuf, InputFile>,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, exposing the rejection reason.
    ///
    /// Returns `Ok(None)` when the file is already present.
    pub fn try_add(&mut self, path: impl AsRef<Utf8Path>) -> Result<Option<InputFile>, WorklistError> {
        let input = InputFile::from_path(path)?;

        if self.entries.contains_key(&input.key) {
            tracing::debug!("Already in worklist: {}", input.path);
            return Ok(None);
        }

        self.entries.insert(input.key.clone(), input.clone());
        Ok(Some(input))
    }

    /// Add a file; rejected paths are logged and reported as `false`.
    pub fn add(&mut self, path: impl AsRef<Utf8Path>) -> bool {
        match self.try_add(path) {
            Ok(added) => added.is_some(),
            Err(e) => {
                tracing::warn!("Skipping input: {}", e);
                false
            }
        }
    }

    /// Add several files, returning the ones that were newly added.
    pub fn add_all<I, P>(&mut self, paths: I) -> Vec<InputFile>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let mut added = Vec::new();
        for path in paths {
            match self.try_add(path) {
                Ok(Some(input)) => added.push(input),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping input: {}", e),
            }
        }
        added
    }

    /// Remove an entry by path. Returns whether it was present.
    ///
    /// Matches the normalized key, or the path as it was added when the file
    /// no longer exists and cannot be canonicalized.
    pub fn remove(&mut self, path: impl AsRef<Utf8Path>) -> bool {
        let path = path.as_ref();
        let key = normalize(path);

        let index = self
            .entries
            .get_index_of(&key)
            .or_else(|| self.entries.values().position(|f| f.path.as_path() == path));

        match index {
            Some(index) => {
                self.entries.shift_remove_index(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputFile> {
        self.entries.values()
    }

    /// Owned copy of the current entries, taken when a run starts.
    pub fn snapshot(&self) -> Vec<InputFile> {
        self.entries.values().cloned().collect()
    }
}
