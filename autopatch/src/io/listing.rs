//! Bounded repository file listing for the issue prompt.

use std::path::Path;

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into.
pub const EXCLUDED_DIRS: [&str; 4] = ["node_modules", ".git", "dist", "build"];

/// List up to `max_files` repository-relative file paths, depth-first in
/// file-name order, using `/` as the separator.
///
/// The walk is lazy: traversal stops as soon as the cap is reached, whatever
/// the shape of the tree. Symlinks are listed but not followed. Entries that
/// cannot be read are logged and left out.
pub fn list_files(root: &Path, max_files: usize) -> Vec<String> {
    let mut files = Vec::new();
    if max_files == 0 {
        return files;
    }

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded_dir(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry in file listing");
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        files.push(relative_display(root, entry.path()));
        if files.len() >= max_files {
            debug!(max_files, "file listing reached cap");
            break;
        }
    }

    files
}

fn is_excluded_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| EXCLUDED_DIRS.contains(&name))
}

fn relative_display(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, "x").expect("write");
    }

    #[test]
    fn lists_files_depth_first_in_name_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        touch(root, "b.txt");
        touch(root, "a/z.rs");
        touch(root, "a/b/c.rs");

        let files = list_files(root, 10);
        assert_eq!(files, vec!["a/b/c.rs", "a/z.rs", "b.txt"]);
    }

    #[test]
    fn excluded_directories_are_skipped_at_any_depth() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        touch(root, "src/main.rs");
        touch(root, "node_modules/pkg/index.js");
        touch(root, ".git/HEAD");
        touch(root, "web/dist/bundle.js");
        touch(root, "web/build/out.js");
        touch(root, "web/app.js");
        touch(root, "docs/build.md");

        let files = list_files(root, 100);
        assert_eq!(files, vec!["docs/build.md", "src/main.rs", "web/app.js"]);
    }

    /// The cap is global: it is not reset per directory.
    #[test]
    fn cap_holds_for_wide_and_deep_trees() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        for i in 0..20 {
            touch(root, &format!("wide/f{i:02}.txt"));
        }
        let mut deep = String::from("deep");
        for i in 0..15 {
            deep.push_str(&format!("/d{i}"));
            touch(root, &format!("{deep}/leaf.txt"));
        }

        for cap in [1, 5, 7, 19, 34] {
            let files = list_files(root, cap);
            assert_eq!(files.len(), cap, "cap {cap}");
        }
        assert_eq!(list_files(root, 1000).len(), 35);
        assert!(list_files(root, 0).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        touch(root, "a.txt");
        touch(root, "locked/secret.txt");
        touch(root, "z.txt");
        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");

        // Privileged users can read the directory anyway.
        let readable = fs::read_dir(&locked).is_ok();
        let files = list_files(root, 10);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("chmod back");

        if readable {
            assert_eq!(files, vec!["a.txt", "locked/secret.txt", "z.txt"]);
        } else {
            assert_eq!(files, vec!["a.txt", "z.txt"]);
        }
    }

    #[test]
    fn missing_root_lists_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(list_files(&temp.path().join("absent"), 10).is_empty());
    }
}
