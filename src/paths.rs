//! Collision-free output path allocation
//!
//! All allocation is existence-based and not atomic: a path reported free
//! can be taken by another process before the caller writes to it. Callers
//! accept that race.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Find an unused path derived from `target`.
///
/// Returns `target` unchanged if nothing exists there. Otherwise tries
/// `{stem}_1{suffix}`, `{stem}_2{suffix}`, ... in the same directory and
/// returns the first candidate that does not exist.
pub fn allocate_unique(target: &Path) -> PathBuf {
    if !target.exists() {
        return target.to_path_buf();
    }

    let parent = target.parent().unwrap_or_else(|| Path::new(""));
    let stem = target
        .file_stem()
        .map(ToOwned::to_owned)
        .unwrap_or_default();
    let extension = target.extension().map(ToOwned::to_owned);

    let mut counter: u32 = 1;
    loop {
        let mut name = OsString::from(&stem);
        name.push(format!("_{counter}"));
        if let Some(ext) = &extension {
            name.push(".");
            name.push(ext);
        }
        let candidate = parent.join(&name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Compose the `{stem}_original{suffix}` sibling of `path` and make it
/// unique. Used when a base document is renamed aside so the output file can
/// take over its name.
pub fn original_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_stem()
        .map(ToOwned::to_owned)
        .unwrap_or_default();
    name.push("_original");
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    allocate_unique(&path.with_file_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, b"x").expect("failed to create test file");
    }

    #[test]
    fn test_free_path_returned_unchanged() {
        let dir = TempDir::new().expect("temp dir");
        let target = dir.path().join("a.pdf");

        assert_eq!(allocate_unique(&target), target);
    }

    #[test]
    fn test_counter_skips_taken_names() {
        let dir = TempDir::new().expect("temp dir");
        touch(&dir.path().join("a.pdf"));
        touch(&dir.path().join("a_1.pdf"));

        let allocated = allocate_unique(&dir.path().join("a.pdf"));

        assert_eq!(allocated, dir.path().join("a_2.pdf"));
        assert!(!allocated.exists());
    }

    #[test]
    fn test_extensionless_target() {
        let dir = TempDir::new().expect("temp dir");
        touch(&dir.path().join("report"));

        let allocated = allocate_unique(&dir.path().join("report"));

        assert_eq!(allocated, dir.path().join("report_1"));
    }

    #[test]
    fn test_original_sibling_name() {
        let dir = TempDir::new().expect("temp dir");
        let base = dir.path().join("base.pdf");
        touch(&base);

        assert_eq!(original_sibling(&base), dir.path().join("base_original.pdf"));
    }

    #[test]
    fn test_original_sibling_is_made_unique() {
        let dir = TempDir::new().expect("temp dir");
        let base = dir.path().join("base.pdf");
        touch(&base);
        touch(&dir.path().join("base_original.pdf"));

        assert_eq!(
            original_sibling(&base),
            dir.path().join("base_original_1.pdf")
        );
    }
}
