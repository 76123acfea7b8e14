//! Path validation shared by the filesystem tools.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathValidationError {
    #[error("Path traversal detected in '{path}'")]
    PathTraversal { path: String },

    #[error("Path '{path}' matches forbidden prefix '{pattern}'")]
    ForbiddenPath { path: String, pattern: String },

    #[error("Path '{path}' is outside the allowed roots")]
    OutsideAllowedRoots { path: String },

    #[error("Cannot resolve '{path}': {reason}")]
    CanonicalizeFailed { path: String, reason: String },
}

/// Validate a path against an allowlist of roots and forbidden prefixes.
///
/// Empty `allowed_roots` means any root; `forbidden_paths` always apply.
/// Non-existent files are resolved through their parent directory so writes
/// can be validated before the file exists.
pub fn validate_path(
    path: &str,
    allowed_roots: &[String],
    forbidden_paths: &[String],
) -> Result<PathBuf, PathValidationError> {
    let input_path = Path::new(path);

    // Reject obvious traversal before touching the filesystem.
    let path_str = path.replace('\\', "/");
    if path_str.contains("../") || path_str.contains("/..") || path_str == ".." {
        return Err(PathValidationError::PathTraversal { path: path.into() });
    }

    let canonical = if input_path.exists() {
        input_path
            .canonicalize()
            .map_err(|e| PathValidationError::CanonicalizeFailed {
                path: path.into(),
                reason: e.to_string(),
            })?
    } else if let Some(parent) = input_path.parent()
        && parent.exists()
    {
        let canonical_parent =
            parent
                .canonicalize()
                .map_err(|e| PathValidationError::CanonicalizeFailed {
                    path: path.into(),
                    reason: format!("Parent dir: {e}"),
                })?;
        canonical_parent.join(input_path.file_name().unwrap_or_default())
    } else {
        input_path.to_path_buf()
    };

    let canonical_str = canonical.to_string_lossy().replace('\\', "/");

    for forbidden in forbidden_paths {
        let expanded = expand_tilde(forbidden);
        if canonical_str.starts_with(&expanded) {
            return Err(PathValidationError::ForbiddenPath {
                path: path.into(),
                pattern: forbidden.clone(),
            });
        }
    }

    if !allowed_roots.is_empty() {
        let inside = allowed_roots.iter().any(|root| {
            let expanded = expand_tilde(root);
            canonical_str.starts_with(&expanded)
        });
        if !inside {
            return Err(PathValidationError::OutsideAllowedRoots { path: path.into() });
        }
    }

    Ok(canonical)
}

fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}
