//! Test utilities for kiln
//!
//! This crate provides shared testing utilities used across the kiln workspace.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Creates a temporary directory within `.tmp/` at the project root
///
/// All test temporary files are kept in a single gitignored location.
///
/// # Panics
///
/// Panics if the current directory cannot be determined or `.tmp/` or the
/// temporary subdirectory cannot be created.
///
/// # Examples
///
/// ```rust
/// use kiln_testkit::temp_dir_in_workspace;
///
/// let temp = temp_dir_in_workspace();
/// let file_path = temp.path().join("page.kiln");
/// std::fs::write(&file_path, "<%= title %>").unwrap();
/// // Cleanup happens automatically when temp is dropped
/// ```
pub fn temp_dir_in_workspace() -> TempDir {
    try_temp_dir_in_workspace().expect("Failed to create temporary directory in .tmp/")
}

/// Alternative with Result for non-test code
pub fn try_temp_dir_in_workspace() -> std::io::Result<TempDir> {
    let tmp_base = std::env::current_dir()?.join(".tmp");
    std::fs::create_dir_all(&tmp_base)?;
    TempDir::new_in(&tmp_base)
}

/// A directory of template files that is removed on drop
pub struct TemplateTree {
    dir: TempDir,
}

impl TemplateTree {
    /// Create an empty tree under `.tmp/`
    pub fn new() -> Self {
        Self {
            dir: temp_dir_in_workspace(),
        }
    }

    /// Create a tree holding `files`, given as `(relative path, content)` pairs
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let tree = Self::new();
        for (name, content) in files {
            tree.write(name, content);
        }
        tree
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `name` inside the tree
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write (or overwrite) `name`, creating parent directories
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("Failed to create {}: {}", parent.display(), e));
        }
        std::fs::write(&path, content)
            .unwrap_or_else(|e| panic!("Failed to write {}: {}", path.display(), e));
        path
    }

    pub fn remove(&self, name: &str) {
        let path = self.path(name);
        std::fs::remove_file(&path)
            .unwrap_or_else(|e| panic!("Failed to remove {}: {}", path.display(), e));
    }
}

impl Default for TemplateTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_in_workspace_creates_in_tmp() {
        let temp = temp_dir_in_workspace();
        let path = temp.path();

        assert!(
            path.to_string_lossy().contains(".tmp"),
            "Path should contain .tmp, got: {}",
            path.display()
        );
        assert!(path.is_dir(), "Path should be a directory");
    }

    #[test]
    fn test_temp_dir_auto_cleanup() {
        let path = {
            let temp = temp_dir_in_workspace();
            temp.path().to_path_buf()
        };

        assert!(
            !path.exists(),
            "Directory should not exist after drop: {}",
            path.display()
        );
    }

    #[test]
    fn test_multiple_temp_dirs_unique() {
        let temp1 = temp_dir_in_workspace();
        let temp2 = temp_dir_in_workspace();
        assert_ne!(temp1.path(), temp2.path());
    }

    #[test]
    fn test_template_tree_writes_nested_files() {
        let tree = TemplateTree::with_files(&[("page.kiln", "page"), ("layout/base.kiln", "base")]);

        assert_eq!(std::fs::read_to_string(tree.path("page.kiln")).unwrap(), "page");
        assert_eq!(
            std::fs::read_to_string(tree.path("layout/base.kiln")).unwrap(),
            "base"
        );
    }

    #[test]
    fn test_template_tree_overwrite_and_remove() {
        let tree = TemplateTree::new();
        tree.write("a.kiln", "one");
        tree.write("a.kiln", "two");
        assert_eq!(std::fs::read_to_string(tree.path("a.kiln")).unwrap(), "two");

        tree.remove("a.kiln");
        assert!(!tree.path("a.kiln").exists());
    }
}
