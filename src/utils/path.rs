//! Path manipulation and validation utilities

use crate::error::GitOpsError;
use anyhow::Result;
use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving `.` and `..` components
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            _ => {
                components.push(component);
            }
        }
    }

    components.iter().collect()
}

/// Validate that a repository directory name stays directly under the base path
///
/// The name must be a single normal path component: no separators, no `.`
/// or `..`, not absolute.
pub fn validate_target_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(GitOpsError::configuration("Repository name cannot be empty").into());
    }

    let mut components = Path::new(name).components();
    let first = components.next();
    let single_normal = matches!(first, Some(Component::Normal(_))) && components.next().is_none();

    if !single_normal || name.contains(['/', '\\']) {
        return Err(GitOpsError::configuration(format!(
            "Invalid repository name '{name}': must be a single directory name under the base path"
        ))
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("./a/../b/./c")),
            PathBuf::from("b/c")
        );
        assert_eq!(normalize_path(Path::new("../a/b")), PathBuf::from("../a/b"));
        assert_eq!(
            normalize_path(Path::new("/srv/repos/../cache/.")),
            PathBuf::from("/srv/cache")
        );
        assert_eq!(normalize_path(Path::new("/../x")), PathBuf::from("/x"));
    }

    #[test]
    fn test_valid_target_names() {
        for name in ["repo", "my-repo", "repo.git", ".dotfiles"] {
            assert!(validate_target_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_target_names() {
        for name in ["", " ", ".", "..", "a/b", "../escape", "/abs", "a\\b"] {
            let err = validate_target_name(name).unwrap_err();
            assert!(
                err.downcast_ref::<GitOpsError>().unwrap().is_configuration(),
                "{name:?} should be rejected"
            );
        }
    }
}
