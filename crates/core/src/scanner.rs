use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Extensions (lowercase, no dot) treated as field photos.
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff"];

pub fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PHOTO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// List photos directly inside `dir` (no recursion), sorted by filename.
pub fn scan_photo_folder(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::PhotoFolderNotFound(dir.to_path_buf()));
    }

    let mut photos = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() && is_photo(entry.path()) {
            photos.push(entry.into_path());
        }
    }
    photos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(photos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_filters_and_sorts() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["b.JPG", "a.jpeg", "c.tiff", "d.png", "notes.txt", "e.heic", "f.Tif"] {
            std::fs::write(tmp.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(tmp.path().join("nested")).unwrap();
        std::fs::write(tmp.path().join("nested").join("z.jpg"), b"x").unwrap();

        let found: Vec<String> = scan_photo_folder(tmp.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(found, vec!["a.jpeg", "b.JPG", "c.tiff", "d.png", "f.Tif"]);
    }

    #[test]
    fn test_missing_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let err = scan_photo_folder(&tmp.path().join("absent")).unwrap_err();
        assert!(matches!(err, Error::PhotoFolderNotFound(_)));
    }
}
