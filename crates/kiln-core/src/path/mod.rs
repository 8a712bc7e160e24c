//! Template path resolution
//!
//! Every template is identified by a [`TemplatePath`]: an absolute, lexically
//! normalized path that carries a file extension. Caches are keyed by it, so two
//! spellings of the same file (`./a/../page`, `page.kiln`, `/root/views/page`)
//! must land on the same key.
//!
//! ## Rules
//!
//! 1. `.` components are dropped and `..` pops the previous component
//! 2. A reference without an extension gets the configured default appended
//! 3. A reference that is not rooted is joined onto the base directory, and
//!    leading `..` components then climb out of it
//!
//! Resolution is pure: nothing touches the filesystem, symlinks are not followed.
//!
//! ```rust
//! use kiln_core::path::PathResolver;
//! use std::path::Path;
//!
//! let resolver = PathResolver::new("/srv/views", ".kiln");
//! let page = resolver.resolve("blog/../index");
//! assert_eq!(page.as_path(), Path::new("/srv/views/index.kiln"));
//!
//! // Already canonical paths come back unchanged
//! assert_eq!(resolver.resolve("/srv/views/index.kiln"), page);
//! ```

use std::ffi::OsString;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Canonical absolute identity of a template file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplatePath(PathBuf);

impl TemplatePath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Directory that references inside this template are resolved against
    pub fn dir(&self) -> &Path {
        self.0.parent().unwrap_or(&self.0)
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.0.clone()
    }
}

impl AsRef<Path> for TemplatePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for TemplatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Turns template references into [`TemplatePath`]s
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    extension: String,
}

impl PathResolver {
    /// Create a resolver rooted at `root`
    ///
    /// A relative root is made absolute against the current working directory once,
    /// here, so later resolution stays pure.
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let root = root.into();
        let root = if is_rooted(&root) {
            root
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("/"))
                .join(root)
        };
        Self {
            root: normalize(&root),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a reference against the template root
    pub fn resolve(&self, reference: impl AsRef<Path>) -> TemplatePath {
        self.resolve_from(reference, &self.root)
    }

    /// Resolve a reference against `base_dir`
    ///
    /// `base_dir` is normally the directory of the template holding the reference.
    pub fn resolve_from(&self, reference: impl AsRef<Path>, base_dir: &Path) -> TemplatePath {
        let reference = normalize(reference.as_ref());

        let mut with_extension = reference.clone();
        let names_file = matches!(reference.components().next_back(), Some(Component::Normal(_)));
        if names_file && reference.extension().is_none() {
            let mut name = OsString::from(reference.as_os_str());
            name.push(&self.extension);
            with_extension = PathBuf::from(name);
        }

        let joined = if is_rooted(&with_extension) {
            with_extension
        } else {
            base_dir.join(with_extension)
        };

        TemplatePath(normalize(&joined))
    }
}

/// Check if path is absolute OR rooted
///
/// On Windows `/views` is rooted but not absolute; both count here.
fn is_rooted(path: &Path) -> bool {
    if path.is_absolute() {
        return true;
    }
    path.components()
        .any(|c| matches!(c, Component::RootDir | Component::Prefix(_)))
}

/// Lexically normalize a path
///
/// `..` directly under the root stays at the root; leading `..` of a relative path
/// is kept.
fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    parts.iter().map(|c| c.as_os_str()).collect()
}
