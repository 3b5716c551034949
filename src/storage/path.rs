//! Path resolution
//!
//! Handles normalization of client-supplied paths and containment checks
//! against the storage root. Nothing in this module touches the filesystem.

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// A normalized path relative to the storage root.
///
/// Segments are joined with `/` and never contain empty, `.` or `..` parts.
/// The empty path denotes the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath {
    normalized: String,
}

impl RelativePath {
    /// The storage root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Normalize a raw client path.
    ///
    /// Backslashes are treated as separators and `..` pops the previous
    /// segment. Absolute paths, NUL bytes and any `..` that would climb above
    /// the root are rejected, as are drive prefixes on Windows.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let unified = unify(raw)?;
        if unified.starts_with('/') || (cfg!(windows) && has_drive_prefix(&unified)) {
            return Err(StorageError::InvalidPath(raw.to_string()));
        }

        normalize(raw, &unified, Vec::new())
    }

    /// Append a raw child path. The result is re-normalized, so `..` inside
    /// `child` may climb out of `self` but never out of the root.
    pub fn join(&self, child: &str) -> Result<Self, StorageError> {
        let unified = unify(child)?;
        if unified.starts_with('/') {
            return Err(StorageError::InvalidPath(child.to_string()));
        }

        normalize(child, &unified, self.segments().collect())
    }

    pub fn is_root(&self) -> bool {
        self.normalized.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Last segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.normalized.rsplit('/').next()
    }

    /// Path with the last segment removed, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let parent = match self.normalized.rsplit_once('/') {
            Some((parent, _)) => parent.to_string(),
            None => String::new(),
        };
        Some(Self { normalized: parent })
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.normalized.split('/').filter(|s| !s.is_empty())
    }

    /// Absolute location of this path under `root`.
    ///
    /// Fails with `InvalidPath` if the joined path is not a descendant of
    /// (or equal to) `root`.
    pub fn to_real_path(&self, root: &Path) -> Result<PathBuf, StorageError> {
        let mut real = root.to_path_buf();
        for segment in self.segments() {
            real.push(segment);
        }

        if !real.starts_with(root) {
            return Err(StorageError::InvalidPath(self.normalized.clone()));
        }

        Ok(real)
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.normalized)
        }
    }
}

impl Serialize for RelativePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.normalized)
    }
}

/// Resolve a raw client path to its normalized form and real location.
pub fn resolve(root: &Path, raw: &str) -> Result<(RelativePath, PathBuf), StorageError> {
    let relative = RelativePath::parse(raw)?;
    let real = relative.to_real_path(root)?;
    Ok((relative, real))
}

/// Validate a name that must be exactly one path segment.
pub fn validate_entry_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() {
        return Err(StorageError::NameRequired);
    }

    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(StorageError::InvalidPath(name.escape_default().to_string()));
    }

    Ok(())
}

/// Validate a name that may span several segments but must stay below the
/// directory it is created in.
pub fn validate_nested_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() {
        return Err(StorageError::NameRequired);
    }

    let climbs = name
        .split(['/', '\\'])
        .any(|segment| segment == "." || segment == "..");
    if climbs || name.contains('\0') {
        return Err(StorageError::InvalidPath(name.escape_default().to_string()));
    }

    Ok(())
}

fn unify(raw: &str) -> Result<String, StorageError> {
    if raw.contains('\0') {
        return Err(StorageError::InvalidPath(raw.escape_default().to_string()));
    }
    Ok(raw.replace('\\', "/"))
}

fn normalize<'a>(
    raw: &str,
    unified: &'a str,
    mut segments: Vec<&'a str>,
) -> Result<RelativePath, StorageError> {
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    return Err(StorageError::InvalidPath(raw.to_string()));
                }
            }
            name => segments.push(name),
        }
    }

    Ok(RelativePath {
        normalized: segments.join("/"),
    })
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> String {
        RelativePath::parse(raw).unwrap().as_str().to_string()
    }

    #[test]
    fn test_empty_is_root() {
        assert!(RelativePath::parse("").unwrap().is_root());
        assert!(RelativePath::parse(".").unwrap().is_root());
        assert!(RelativePath::parse("a/..").unwrap().is_root());
    }

    #[test]
    fn test_normalizes_segments() {
        assert_eq!(parse("reports"), "reports");
        assert_eq!(parse("reports/"), "reports");
        assert_eq!(parse("a//b/./c"), "a/b/c");
        assert_eq!(parse("a/b/../c"), "a/c");
        assert_eq!(parse("a\\b"), "a/b");
    }

    #[test]
    fn test_rejects_escapes() {
        for raw in ["..", "../etc/passwd", "a/../../b", "a\\..\\..\\b", "./.."] {
            assert!(
                matches!(RelativePath::parse(raw), Err(StorageError::InvalidPath(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_absolute_paths() {
        for raw in ["/etc/passwd", "\\windows", "/"] {
            assert!(
                matches!(RelativePath::parse(raw), Err(StorageError::InvalidPath(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[cfg(windows)]
    #[test]
    fn test_rejects_drive_prefixes() {
        for raw in ["C:\\temp", "c:/temp"] {
            assert!(matches!(
                RelativePath::parse(raw),
                Err(StorageError::InvalidPath(_))
            ));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_colon_names_are_relative() {
        assert_eq!(parse("a:b.txt"), "a:b.txt");
        assert_eq!(parse("c:/temp"), "c:/temp");
        assert_eq!(
            RelativePath::root().join("a:b.txt").unwrap().as_str(),
            "a:b.txt"
        );
    }

    #[test]
    fn test_rejects_nul_bytes() {
        assert!(RelativePath::parse("a\0b").is_err());
    }

    #[test]
    fn test_parent_and_file_name() {
        let path = RelativePath::parse("a/b/c.txt").unwrap();
        assert_eq!(path.file_name(), Some("c.txt"));
        assert_eq!(path.parent().unwrap().as_str(), "a/b");

        let top = RelativePath::parse("reports").unwrap();
        assert!(top.parent().unwrap().is_root());

        assert_eq!(RelativePath::root().parent(), None);
        assert_eq!(RelativePath::root().file_name(), None);
    }

    #[test]
    fn test_join() {
        let dir = RelativePath::parse("reports").unwrap();
        assert_eq!(dir.join("q1.txt").unwrap().as_str(), "reports/q1.txt");
        assert_eq!(dir.join("../other").unwrap().as_str(), "other");
        assert!(dir.join("../../escape").is_err());
        assert_eq!(RelativePath::root().join("x").unwrap().as_str(), "x");
        assert!(dir.join("/abs").is_err());
        assert!(RelativePath::root().join("/abs").is_err());
    }

    #[test]
    fn test_resolve_stays_under_root() {
        let root = Path::new("/srv/storage");
        let (relative, real) = resolve(root, "a/./b").unwrap();
        assert_eq!(relative.as_str(), "a/b");
        assert_eq!(real, PathBuf::from("/srv/storage/a/b"));

        let (relative, real) = resolve(root, "").unwrap();
        assert!(relative.is_root());
        assert_eq!(real, root);

        assert!(resolve(root, "../storage2/x").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(RelativePath::root().to_string(), "/");
        assert_eq!(RelativePath::parse("a/b").unwrap().to_string(), "a/b");
    }

    #[test]
    fn test_validate_entry_name() {
        assert!(validate_entry_name("q1.txt").is_ok());
        assert!(validate_entry_name("...").is_ok());
        assert!(matches!(
            validate_entry_name(""),
            Err(StorageError::NameRequired)
        ));
        for name in [".", "..", "a/b", "a\\b"] {
            assert!(matches!(
                validate_entry_name(name),
                Err(StorageError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn test_validate_nested_name() {
        assert!(validate_nested_name("archive").is_ok());
        assert!(validate_nested_name("2024/q1").is_ok());
        assert!(matches!(
            validate_nested_name(""),
            Err(StorageError::NameRequired)
        ));
        for name in ["..", "../escaped_sibling", "a/../b", "./a", "a\\..\\b"] {
            assert!(
                matches!(validate_nested_name(name), Err(StorageError::InvalidPath(_))),
                "{name} should be rejected"
            );
        }
    }
}
