//! Build directory scanning and content hashing.

use crate::mime::mime_type_for;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use updraft_core::{Error, FileEntry, Result, HASH_PREFIX};
use walkdir::WalkDir;

/// Read size used when hashing artifacts (64 KiB).
pub const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Classification rules applied while scanning.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Build-relative paths (with `/` separators) installed first
    pub critical_files: HashSet<String>,

    /// Exact file names to skip anywhere in the tree
    pub ignored_files: HashSet<String>,
}

impl ScanOptions {
    pub fn new(critical_files: &[String], ignored_files: &[String]) -> Self {
        Self {
            critical_files: critical_files.iter().cloned().collect(),
            ignored_files: ignored_files.iter().cloned().collect(),
        }
    }
}

/// A scanned artifact before a download URL is attached.
#[derive(Debug, Clone)]
pub(crate) struct ScannedFile {
    pub path: String,
    pub content_hash: String,
    pub size: u64,
    pub critical: bool,
    pub mime_type: &'static str,
}

impl ScannedFile {
    pub(crate) fn into_entry(self, url: String) -> FileEntry {
        FileEntry {
            path: self.path,
            content_hash: self.content_hash,
            size: self.size,
            url,
            critical: self.critical,
            mime_type: self.mime_type.to_string(),
        }
    }
}

/// Enumerate, hash and classify every regular file under `build_dir`.
/// Symlinks are skipped, never followed, so nothing outside the build
/// directory can end up in a manifest. Output is unsorted.
pub(crate) fn scan_build_dir(build_dir: &Path, options: &ScanOptions) -> Result<Vec<ScannedFile>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(build_dir).follow_links(false) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.depth() > 0 && entry.path_is_symlink() {
            debug!("Skipping symlink {}", entry.path().display());
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if options.ignored_files.contains(name.as_ref()) {
            debug!("Skipping metadata file {}", entry.path().display());
            continue;
        }

        let rel_path = entry
            .path()
            .strip_prefix(build_dir)
            .map_err(|e| Error::input(format!("Failed to compute relative path: {}", e)))?;
        let path = to_posix_path(rel_path)?;

        let (content_hash, size) = hash_file_with_size(entry.path())?;
        let critical = options.critical_files.contains(&path);

        files.push(ScannedFile {
            critical,
            mime_type: mime_type_for(rel_path),
            path,
            content_hash,
            size,
        });
    }

    Ok(files)
}

/// Relative path with `/` separators regardless of platform.
fn to_posix_path(rel_path: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in rel_path.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| {
                    Error::input(format!("Non UTF-8 file name: {}", rel_path.display()))
                })?;
                parts.push(part);
            }
            other => {
                return Err(Error::input(format!(
                    "Unexpected path component {:?} in {}",
                    other,
                    rel_path.display()
                )))
            }
        }
    }
    Ok(parts.join("/"))
}

/// Tagged SHA-256 digest (`sha256-<hex>`) of a file, streamed in fixed chunks.
pub fn hash_file(path: &Path) -> Result<String> {
    hash_file_with_size(path).map(|(hash, _)| hash)
}

fn hash_file_with_size(path: &Path) -> Result<(String, u64)> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
    let mut size = 0u64;

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        size += bytes_read as u64;
    }

    Ok((format!("{}{:x}", HASH_PREFIX, hasher.finalize()), size))
}

/// Tagged SHA-256 digest of an in-memory artifact.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{}{:x}", HASH_PREFIX, Sha256::digest(bytes))
}

/// Location of a manifest entry inside a build directory. Returns `None`
/// for entry paths that are absolute or would escape the directory.
pub fn artifact_path(build_dir: &Path, entry_path: &str) -> Option<PathBuf> {
    let mut path = build_dir.to_path_buf();
    for part in entry_path.split('/') {
        if part.is_empty() || part == "." || part == ".." || part.contains('\\') {
            return None;
        }
        path.push(part);
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HELLO_SHA256: &str = "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f";

    #[test]
    fn test_hash_file_known_value() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hello.txt");
        fs::write(&path, b"Hello, World!").unwrap();

        assert_eq!(hash_file(&path).unwrap(), format!("sha256-{}", HELLO_SHA256));
        assert_eq!(hash_bytes(b"Hello, World!"), format!("sha256-{}", HELLO_SHA256));
    }

    #[test]
    fn test_hash_spans_multiple_chunks() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big.bin");
        let data: Vec<u8> = (0..(HASH_CHUNK_SIZE * 3 + 17))
            .map(|i| (i % 251) as u8)
            .collect();
        fs::write(&path, &data).unwrap();

        let (hash, size) = hash_file_with_size(&path).unwrap();
        assert_eq!(size, data.len() as u64);
        assert_eq!(hash, hash_bytes(&data));
    }

    #[test]
    fn test_scan_skips_ignored_names_and_classifies() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("js")).unwrap();
        fs::write(temp.path().join("index.html"), "<html></html>").unwrap();
        fs::write(temp.path().join("js/app.bundle.js"), "boot()").unwrap();
        fs::write(temp.path().join("js/.DS_Store"), "junk").unwrap();

        let options = ScanOptions::new(
            &["js/app.bundle.js".to_string()],
            &[".DS_Store".to_string()],
        );
        let mut files = scan_build_dir(temp.path(), &options).unwrap();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "index.html");
        assert!(!files[0].critical);
        assert_eq!(files[0].mime_type, "text/html");
        assert_eq!(files[1].path, "js/app.bundle.js");
        assert!(files[1].critical);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_skips_symlinks() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.txt"), "outside").unwrap();
        fs::write(temp.path().join("index.html"), "<html></html>").unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), temp.path().join("leak.txt"))
            .unwrap();
        std::os::unix::fs::symlink(temp.path().join("index.html"), temp.path().join("alias.html"))
            .unwrap();

        let files = scan_build_dir(temp.path(), &ScanOptions::new(&[], &[])).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["index.html"]);
    }

    #[test]
    fn test_artifact_path_joins_segments() {
        let path = artifact_path(Path::new("/srv/dist"), "js/app.bundle.js").unwrap();
        assert!(path.ends_with("js/app.bundle.js"));
        assert!(path.starts_with("/srv/dist"));
    }

    #[test]
    fn test_artifact_path_rejects_escapes() {
        let root = Path::new("/srv/dist");
        assert!(artifact_path(root, "../etc/passwd").is_none());
        assert!(artifact_path(root, "/etc/passwd").is_none());
        assert!(artifact_path(root, "js//app.js").is_none());
    }
}
