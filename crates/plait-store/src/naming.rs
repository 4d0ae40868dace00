//! File naming of fragments, metadata and decoded output.

use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Paths of every file belonging to one object inside a coding directory.
///
/// For an object named `photo.jpg` with `k = 10`:
/// `photo_k01.jpg` .. `photo_k10.jpg`, `photo_m01.jpg` .., `photo_meta.toml`
/// and `photo_decoded.jpg`. Indices are 1-based and zero-padded to the
/// number of digits of `k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentNames {
    dir: PathBuf,
    stem: String,
    ext: String,
    k: usize,
    m: usize,
    width: usize,
}

impl FragmentNames {
    pub fn new(dir: impl AsRef<Path>, name: &str, k: usize, m: usize) -> Result<Self, StoreError> {
        let path = Path::new(name);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StoreError::InvalidName(name.to_string()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            stem: stem.to_string(),
            ext,
            k,
            m,
            width: k.to_string().len(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn count(&self) -> usize {
        self.k + self.m
    }

    /// Path of fragment `index` (0-based; data first, then coding).
    pub fn fragment(&self, index: usize) -> PathBuf {
        let (kind, number) = if index < self.k {
            ('k', index + 1)
        } else {
            ('m', index - self.k + 1)
        };
        self.dir.join(format!(
            "{}_{kind}{number:0width$}{}",
            self.stem,
            self.ext,
            width = self.width
        ))
    }

    /// Path of the metadata file.
    pub fn meta(&self) -> PathBuf {
        Self::meta_path(&self.dir, &self.stem)
    }

    /// Path of the decoded output.
    pub fn decoded(&self) -> PathBuf {
        self.dir.join(format!("{}_decoded{}", self.stem, self.ext))
    }

    /// Metadata path for an object name, before `k` and `m` are known.
    pub fn meta_for(dir: impl AsRef<Path>, name: &str) -> Result<PathBuf, StoreError> {
        let stem = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StoreError::InvalidName(name.to_string()))?;
        Ok(Self::meta_path(dir.as_ref(), stem))
    }

    fn meta_path(dir: &Path, stem: &str) -> PathBuf {
        dir.join(format!("{stem}_meta.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_names_pad_to_k_width() {
        let names = FragmentNames::new("Coding", "photo.jpg", 10, 4).unwrap();
        assert_eq!(names.fragment(0), Path::new("Coding/photo_k01.jpg"));
        assert_eq!(names.fragment(9), Path::new("Coding/photo_k10.jpg"));
        assert_eq!(names.fragment(10), Path::new("Coding/photo_m01.jpg"));
        assert_eq!(names.fragment(13), Path::new("Coding/photo_m04.jpg"));
    }

    #[test]
    fn test_single_digit_k() {
        let names = FragmentNames::new("out", "data.bin", 4, 2).unwrap();
        assert_eq!(names.fragment(1), Path::new("out/data_k2.bin"));
        assert_eq!(names.fragment(5), Path::new("out/data_m2.bin"));
    }

    #[test]
    fn test_meta_and_decoded_paths() {
        let names = FragmentNames::new("c", "archive.tar.gz", 4, 2).unwrap();
        assert_eq!(names.meta(), Path::new("c/archive.tar_meta.toml"));
        assert_eq!(names.decoded(), Path::new("c/archive.tar_decoded.gz"));
        assert_eq!(
            FragmentNames::meta_for("c", "archive.tar.gz").unwrap(),
            names.meta()
        );
    }

    #[test]
    fn test_name_without_extension() {
        let names = FragmentNames::new("c", "README", 2, 1).unwrap();
        assert_eq!(names.fragment(2), Path::new("c/README_m1"));
        assert_eq!(names.decoded(), Path::new("c/README_decoded"));
    }

    #[test]
    fn test_invalid_name() {
        assert!(FragmentNames::new("c", "", 2, 1).is_err());
    }
}
