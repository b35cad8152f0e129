//! Classpath resource roots.
//!
//! Maps classpath entries to [`ResourceRoot`]s a loader context can read from:
//! - directories, read straight from the filesystem
//! - JAR/ZIP archives, read through the `zip` crate

use factory_finder_api::ResourceRoot;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;
use zip::ZipArchive;
use zip::result::ZipError;

/// A directory on the classpath
#[derive(Debug, Clone)]
pub struct DirectoryRoot {
    path: PathBuf,
}

impl DirectoryRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let mut path = self.path.clone();
        for part in name.split('/').filter(|p| !p.is_empty() && *p != "." && *p != "..") {
            path.push(part);
        }
        path
    }
}

impl ResourceRoot for DirectoryRoot {
    fn open(&self, name: &str) -> io::Result<Option<Box<dyn Read + Send>>> {
        let path = self.resolve(name);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(Box::new(File::open(path)?)))
    }

    fn list(&self, prefix: &str) -> io::Result<Vec<String>> {
        if !self.path.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.path).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.path) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if name.starts_with(prefix) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn describe(&self) -> String {
        format!("dir:{}", self.path.display())
    }
}

/// A JAR or ZIP archive on the classpath.
///
/// The archive is reopened for every lookup, so a replaced file is picked up
/// without rebuilding the loader.
#[derive(Debug, Clone)]
pub struct ArchiveRoot {
    path: PathBuf,
}

impl ArchiveRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn archive(&self) -> io::Result<ZipArchive<File>> {
        let file = File::open(&self.path)?;
        ZipArchive::new(file).map_err(|e| archive_error(&self.path, e))
    }
}

fn archive_error(path: &Path, err: ZipError) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("{}: {}", path.display(), err),
    )
}

impl ResourceRoot for ArchiveRoot {
    fn open(&self, name: &str) -> io::Result<Option<Box<dyn Read + Send>>> {
        if !self.path.is_file() {
            return Ok(None);
        }

        let mut archive = self.archive()?;
        let mut entry = match archive.by_name(name.trim_start_matches('/')) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(archive_error(&self.path, e)),
        };

        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        Ok(Some(Box::new(Cursor::new(bytes))))
    }

    fn list(&self, prefix: &str) -> io::Result<Vec<String>> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }

        let archive = self.archive()?;
        let mut names: Vec<String> = archive
            .file_names()
            .filter(|name| name.starts_with(prefix) && !name.ends_with('/'))
            .map(str::to_string)
            .collect();
        names.sort();
        Ok(names)
    }

    fn describe(&self) -> String {
        format!("jar:{}", self.path.display())
    }
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Build resource roots for classpath entries, in order.
///
/// Directories become [`DirectoryRoot`]s and `.jar`/`.zip` paths become
/// [`ArchiveRoot`]s. Anything else is skipped.
pub fn classpath_roots(paths: &[PathBuf]) -> Vec<Arc<dyn ResourceRoot>> {
    let mut roots: Vec<Arc<dyn ResourceRoot>> = Vec::with_capacity(paths.len());
    for path in paths {
        if path.is_dir() {
            roots.push(Arc::new(DirectoryRoot::new(path.clone())));
        } else if is_archive(path) {
            roots.push(Arc::new(ArchiveRoot::new(path.clone())));
        } else {
            tracing::warn!("Skipping unsupported classpath entry: {}", path.display());
        }
    }
    roots
}
