//! Writing generated dream illustrations to disk.

use std::path::{Path, PathBuf};

use oneiric_core::{GeneratedImage, OneiricError};

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path.starts_with("~/") || path.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&path[2..])
    } else {
        PathBuf::from(path)
    }
}

/// Save `image` under `dir` as `dream-<timestamp>.<ext>`, never overwriting
/// an earlier file.
pub fn save_image(dir: &Path, image: &GeneratedImage) -> Result<PathBuf, OneiricError> {
    std::fs::create_dir_all(dir)?;
    let stem = format!("dream-{}", chrono::Local::now().format("%Y%m%d-%H%M%S"));
    let ext = image.extension();

    let mut path = dir.join(format!("{}.{}", stem, ext));
    let mut n = 1;
    while path.exists() {
        path = dir.join(format!("{}-{}.{}", stem, n, ext));
        n += 1;
    }
    std::fs::write(&path, &image.bytes)?;
    tracing::info!(path = %path.display(), bytes = image.bytes.len(), "Dream image saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> GeneratedImage {
        GeneratedImage {
            bytes: vec![0x89, b'P', b'N', b'G'],
            mime_type: "image/png".into(),
        }
    }

    #[test]
    fn test_expand_home() {
        let expanded = expand_home("~/.oneiric/images");
        assert!(expanded.ends_with(".oneiric/images"));
        assert!(!expanded.starts_with("~"));
        assert_eq!(expand_home("/tmp/x"), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn test_save_creates_dir_and_writes_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("images");
        let path = save_image(&dir, &png()).unwrap();

        assert!(path.starts_with(&dir));
        assert_eq!(path.extension().unwrap(), "png");
        assert_eq!(std::fs::read(&path).unwrap(), png().bytes);
    }

    #[test]
    fn test_save_never_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let first = save_image(tmp.path(), &png()).unwrap();
        let second = save_image(tmp.path(), &png()).unwrap();
        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
    }

    #[test]
    fn test_jpeg_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let image = GeneratedImage {
            bytes: vec![0xFF, 0xD8],
            mime_type: "image/jpeg".into(),
        };
        let path = save_image(tmp.path(), &image).unwrap();
        assert_eq!(path.extension().unwrap(), "jpg");
    }
}
