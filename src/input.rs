use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::document::Metadata;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid metadata in {}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

const STDIN_MARKER: &str = "-";

/// Read markdown from a file, or from stdin when `path` is `None` or `-`.
pub fn read_markdown(path: Option<&Path>) -> Result<String, InputError> {
    match path {
        Some(p) if p.as_os_str() != STDIN_MARKER => read_file(p),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|source| InputError::Read {
                    path: PathBuf::from("<stdin>"),
                    source,
                })?;
            Ok(buf)
        }
    }
}

pub fn read_metadata(path: &Path) -> Result<Metadata, InputError> {
    let raw = read_file(path)?;
    serde_json::from_str(&raw).map_err(|source| InputError::Metadata {
        path: path.to_path_buf(),
        source,
    })
}

/// `post.md` → `post.meta.json`
pub fn sidecar_path(markdown_path: &Path) -> PathBuf {
    markdown_path.with_extension("meta.json")
}

/// Metadata sidecar for a markdown file, if one exists.
pub fn load_sidecar(markdown_path: &Path) -> Result<Option<Metadata>, InputError> {
    let sidecar = sidecar_path(markdown_path);
    if !sidecar.is_file() {
        return Ok(None);
    }
    debug!(path = %sidecar.display(), "loading metadata sidecar");
    read_metadata(&sidecar).map(Some)
}

/// All `*.md` files directly inside `dir`, sorted by path.
pub fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    let read_err = |source| InputError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_file(path: &Path) -> Result<String, InputError> {
    std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SourceKind;

    #[test]
    fn sidecar_naming() {
        assert_eq!(sidecar_path(Path::new("in/post.md")), PathBuf::from("in/post.meta.json"));
    }

    #[test]
    fn lists_markdown_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.md", "a.md", "notes.txt", "a.meta.json"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.md")).unwrap();

        let files = markdown_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.md", "b.md"]);
    }

    #[test]
    fn loads_sidecar_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let md = dir.path().join("post.md");
        std::fs::write(&md, "hello").unwrap();
        assert!(load_sidecar(&md).unwrap().is_none());

        std::fs::write(
            dir.path().join("post.meta.json"),
            r#"{"kind":"social","platform":"x"}"#,
        )
        .unwrap();
        let meta = load_sidecar(&md).unwrap().unwrap();
        assert_eq!(meta.kind(), SourceKind::Social);
    }

    #[test]
    fn bad_sidecar_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let meta = dir.path().join("broken.meta.json");
        std::fs::write(&meta, "{not json").unwrap();
        let err = read_metadata(&meta).unwrap_err();
        assert!(matches!(err, InputError::Metadata { .. }));
        assert!(err.to_string().contains("broken.meta.json"));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = read_markdown(Some(Path::new("/definitely/not/here.md"))).unwrap_err();
        assert!(matches!(err, InputError::Read { .. }));
    }
}
