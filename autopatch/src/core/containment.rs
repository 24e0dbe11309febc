//! Containment check for model-proposed file paths.
//!
//! Paths are resolved lexically against a canonical repository root and the
//! result is compared component-wise, never as a string prefix: `/repo-evil`
//! does not lie inside `/repo`.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Why a change item was excluded from application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("path is empty")]
    Empty,
    #[error("path contains a NUL byte")]
    NulByte,
    #[error("path escapes the repository root")]
    Escapes,
    #[error("path resolves to the repository root itself")]
    IsRoot,
    #[error("path targets git metadata")]
    GitMetadata,
    #[error("content is {bytes} bytes, limit is {limit}")]
    TooLarge { bytes: usize, limit: usize },
    #[error("change count exceeds the limit of {limit}")]
    OverLimit { limit: usize },
}

/// Resolve `candidate` against `root` without touching the filesystem.
///
/// `root` must already be absolute and canonical. Returns the absolute target
/// path when it lies strictly inside `root`.
pub fn resolve_within(root: &Path, candidate: &str) -> Result<PathBuf, Rejection> {
    if candidate.trim().is_empty() {
        return Err(Rejection::Empty);
    }
    if candidate.contains('\0') {
        return Err(Rejection::NulByte);
    }

    let resolved = normalize(&root.join(candidate));
    if resolved == root {
        return Err(Rejection::IsRoot);
    }
    let relative = resolved.strip_prefix(root).map_err(|_| Rejection::Escapes)?;
    // Case-insensitive filesystems resolve `.GIT` to the metadata directory.
    if matches!(
        relative.components().next(),
        Some(Component::Normal(first))
            if first.to_str().is_some_and(|name| name.eq_ignore_ascii_case(".git"))
    ) {
        return Err(Rejection::GitMetadata);
    }
    Ok(resolved)
}

/// Check that an already-resolved path (e.g. after following symlinks) is inside `root`.
pub fn is_inside(root: &Path, resolved: &Path) -> bool {
    resolved != root && resolved.starts_with(root)
}

/// Collapse `.` and `..` components. `..` at the filesystem root stays at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        PathBuf::from("/work/repo")
    }

    #[test]
    fn relative_path_resolves_inside_root() {
        let resolved = resolve_within(&root(), "src/a.js").expect("inside");
        assert_eq!(resolved, PathBuf::from("/work/repo/src/a.js"));
    }

    #[test]
    fn inner_dot_dot_that_stays_inside_is_accepted() {
        let resolved = resolve_within(&root(), "src/../lib/./b.rs").expect("inside");
        assert_eq!(resolved, PathBuf::from("/work/repo/lib/b.rs"));
    }

    #[test]
    fn escapes_are_rejected() {
        for candidate in ["../../etc/passwd", "a/../../b", "../repo-evil/x", "/etc/passwd"] {
            assert_eq!(
                resolve_within(&root(), candidate),
                Err(Rejection::Escapes),
                "{candidate}"
            );
        }
    }

    /// A sibling directory sharing the root's name as a string prefix is still outside.
    #[test]
    fn sibling_with_common_prefix_is_outside() {
        assert_eq!(
            resolve_within(&root(), "/work/repo-other/file"),
            Err(Rejection::Escapes)
        );
    }

    #[test]
    fn absolute_path_inside_root_is_accepted() {
        let resolved = resolve_within(&root(), "/work/repo/docs/x.md").expect("inside");
        assert_eq!(resolved, PathBuf::from("/work/repo/docs/x.md"));
    }

    #[test]
    fn root_itself_and_empty_are_rejected() {
        assert_eq!(resolve_within(&root(), "."), Err(Rejection::IsRoot));
        assert_eq!(resolve_within(&root(), "src/.."), Err(Rejection::IsRoot));
        assert_eq!(resolve_within(&root(), "  "), Err(Rejection::Empty));
    }

    #[test]
    fn git_metadata_is_rejected() {
        assert_eq!(
            resolve_within(&root(), ".git/hooks/pre-commit"),
            Err(Rejection::GitMetadata)
        );
        assert!(resolve_within(&root(), "docs/.git-notes").is_ok());
    }

    #[test]
    fn git_metadata_match_ignores_case() {
        for path in [".GIT/hooks/pre-commit", ".Git/config", "./.gIt/HEAD"] {
            assert_eq!(resolve_within(&root(), path), Err(Rejection::GitMetadata), "{path}");
        }
        assert!(resolve_within(&root(), ".GITIGNORE").is_ok());
    }

    #[test]
    fn is_inside_is_component_aware() {
        assert!(is_inside(&root(), Path::new("/work/repo/a")));
        assert!(!is_inside(&root(), Path::new("/work/repo")));
        assert!(!is_inside(&root(), Path::new("/work/repository/a")));
    }
}
