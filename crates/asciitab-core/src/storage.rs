//! Storage backends for table files
//!
//! Table files live in a single folder and are addressed by file name. The
//! folder is created the first time it is needed.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Folder used for table files when none is configured
pub const DEFAULT_DIR: &str = "text files";

/// Extension every table file carries
pub const EXTENSION: &str = ".txt";

/// Append `.txt` to a file name that lacks it
pub fn ensure_extension(name: &str) -> String {
    let name = name.trim();
    if name.ends_with(EXTENSION) {
        name.to_string()
    } else {
        format!("{}{}", name, EXTENSION)
    }
}

/// Line-oriented access to named table files
pub trait Storage {
    /// Read all lines of a file
    fn read_lines(&self, name: &str) -> Result<Vec<String>>;

    /// Replace the contents of a file with `lines`, one per line
    fn write_lines(&mut self, name: &str, lines: &[String]) -> Result<()>;

    fn exists(&self, name: &str) -> bool;

    fn ensure_extension(&self, name: &str) -> String {
        ensure_extension(name)
    }

    /// Create an empty file. Returns false if it already existed.
    fn create(&mut self, name: &str) -> Result<bool>;

    /// Names of all table files, sorted
    fn list(&self) -> Result<Vec<String>>;
}

/// Table files in a folder on disk
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of a table file inside the folder
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
            info!(dir = %self.dir.display(), "created table folder");
        }
        Ok(())
    }
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new(DEFAULT_DIR)
    }
}

impl Storage for FileStorage {
    fn read_lines(&self, name: &str) -> Result<Vec<String>> {
        let path = self.path(name);
        let content = fs::read_to_string(&path).map_err(|e| Error::FileRead {
            path: path.clone(),
            source: e,
        })?;
        let lines: Vec<String> = content.lines().map(|l| l.trim().to_string()).collect();
        debug!(path = %path.display(), lines = lines.len(), "read table file");
        Ok(lines)
    }

    fn write_lines(&mut self, name: &str, lines: &[String]) -> Result<()> {
        self.ensure_dir()?;
        let path = self.path(name);

        let mut content = String::new();
        for line in lines {
            content.push_str(line);
            content.push('\n');
        }

        fs::write(&path, content).map_err(|e| Error::FileWrite {
            path: path.clone(),
            source: e,
        })?;
        info!(path = %path.display(), lines = lines.len(), "saved table file");
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    fn create(&mut self, name: &str) -> Result<bool> {
        self.ensure_dir()?;
        let path = self.path(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                info!(path = %path.display(), "created table file");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(Error::FileWrite { path, source: e }),
        }
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(EXTENSION) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// In-memory storage, used by tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: BTreeMap<String, Vec<String>>,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file with content
    pub fn with_file(mut self, name: &str, lines: &[&str]) -> Self {
        self.files.insert(
            name.to_string(),
            lines.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    /// Make every subsequent write fail with an IO error
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn contents(&self, name: &str) -> Option<&[String]> {
        self.files.get(name).map(Vec::as_slice)
    }
}

impl Storage for MemoryStorage {
    fn read_lines(&self, name: &str) -> Result<Vec<String>> {
        self.files.get(name).cloned().ok_or_else(|| Error::FileRead {
            path: PathBuf::from(name),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        })
    }

    fn write_lines(&mut self, name: &str, lines: &[String]) -> Result<()> {
        if self.fail_writes {
            return Err(Error::FileWrite {
                path: PathBuf::from(name),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "writes disabled"),
            });
        }
        self.files.insert(name.to_string(), lines.to_vec());
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    fn create(&mut self, name: &str) -> Result<bool> {
        if self.files.contains_key(name) {
            return Ok(false);
        }
        self.files.insert(name.to_string(), Vec::new());
        Ok(true)
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }
}
