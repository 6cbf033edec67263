// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Structural checks applied to a bundle directory before it is registered.

use crate::manifest::MANIFEST_FILE;
use crate::{BundleError, ModelBundle};
use std::collections::HashSet;
use std::path::Path;

/// Directory extensions recognised as model bundles.
pub const BUNDLE_EXTENSIONS: &[&str] = &["tfbundle", "tiobundle"];

/// Returns `true` if `path` is a directory with a bundle extension.
pub fn is_bundle_dir(path: &Path) -> bool {
    path.is_dir()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| BUNDLE_EXTENSIONS.iter().any(|b| e.eq_ignore_ascii_case(b)))
}

/// Validates bundle directories and tracks which ids have been accepted.
///
/// Checks, in order:
/// - The path is a directory with a bundle extension.
/// - `model.json` exists and parses into a consistent manifest.
/// - Labels resolve and match their layer's element count.
/// - The model file exists unless the bundle is a placeholder.
/// - The id has not been accepted before.
#[derive(Debug, Default)]
pub struct BundleValidator {
    known_ids: HashSet<String>,
}

impl BundleValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the validator with ids that are already taken.
    pub fn with_known_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Validates the bundle at `dir` without recording its id.
    pub fn validate(&self, dir: &Path) -> Result<ModelBundle, BundleError> {
        if !is_bundle_dir(dir) {
            return Err(BundleError::NotABundle(dir.to_path_buf()));
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(BundleError::ResourceRead {
                path: manifest_path,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "manifest not found"),
            });
        }

        let bundle = ModelBundle::load(dir)?;

        if !bundle.is_placeholder() {
            if let Some(model) = bundle.model_path() {
                if !model.is_file() {
                    return Err(BundleError::ModelFileMissing(model));
                }
            }
        }

        if self.known_ids.contains(bundle.id()) {
            return Err(BundleError::DuplicateId(bundle.id().to_string()));
        }

        Ok(bundle)
    }

    /// Validates the bundle at `dir` and records its id on success.
    pub fn accept(&mut self, dir: &Path) -> Result<ModelBundle, BundleError> {
        let bundle = self.validate(dir)?;
        self.known_ids.insert(bundle.id().to_string());
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_bundle(root: &Path, dir: &str, id: &str, with_model: bool) -> std::path::PathBuf {
        let path = root.join(dir);
        std::fs::create_dir_all(&path).unwrap();
        let manifest = format!(
            r#"{{ "id": "{id}", "name": "{id}", "model": {{ "file": "model.tflite" }},
                 "inputs": [{{ "name": "x", "type": "array", "shape": [1] }}],
                 "outputs": [{{ "name": "z", "type": "array", "shape": [1] }}] }}"#
        );
        std::fs::write(path.join(MANIFEST_FILE), manifest).unwrap();
        if with_model {
            std::fs::write(path.join("model.tflite"), b"model").unwrap();
        }
        path
    }

    #[test]
    fn test_valid_bundle() {
        let root = tempfile::tempdir().unwrap();
        let dir = write_bundle(root.path(), "a.tfbundle", "a", true);
        let bundle = BundleValidator::new().validate(&dir).unwrap();
        assert_eq!(bundle.id(), "a");
    }

    #[test]
    fn test_wrong_extension() {
        let root = tempfile::tempdir().unwrap();
        let dir = write_bundle(root.path(), "a.zip", "a", true);
        assert!(matches!(
            BundleValidator::new().validate(&dir),
            Err(BundleError::NotABundle(_))
        ));
    }

    #[test]
    fn test_missing_manifest() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("empty.tiobundle");
        std::fs::create_dir_all(&dir).unwrap();
        assert!(matches!(
            BundleValidator::new().validate(&dir),
            Err(BundleError::ResourceRead { .. })
        ));
    }

    #[test]
    fn test_missing_model_file() {
        let root = tempfile::tempdir().unwrap();
        let dir = write_bundle(root.path(), "a.tfbundle", "a", false);
        assert!(matches!(
            BundleValidator::new().validate(&dir),
            Err(BundleError::ModelFileMissing(_))
        ));
    }

    #[test]
    fn test_duplicate_id() {
        let root = tempfile::tempdir().unwrap();
        let first = write_bundle(root.path(), "a.tfbundle", "same", true);
        let second = write_bundle(root.path(), "b.tfbundle", "same", true);

        let mut v = BundleValidator::new();
        v.accept(&first).unwrap();
        assert!(matches!(v.accept(&second), Err(BundleError::DuplicateId(id)) if id == "same"));

        let seeded = BundleValidator::with_known_ids(["same"]);
        assert!(seeded.validate(&first).is_err());
    }
}
