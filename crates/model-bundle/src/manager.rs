// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Bundle discovery and lookup by id.

use crate::{validator, BundleError, BundleValidator, ModelBundle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Registry of the bundles found under one directory.
///
/// Bundles are shared as `Arc<ModelBundle>` so a runner can hold one while
/// the registry stays usable.
#[derive(Debug, Default)]
pub struct BundleManager {
    root: PathBuf,
    bundles: BTreeMap<String, Arc<ModelBundle>>,
}

impl BundleManager {
    /// Scans `root` for bundle directories.
    ///
    /// A bundle that fails validation is logged and skipped; only failing to
    /// read `root` itself is an error.
    pub fn load(root: &Path) -> Result<Self, BundleError> {
        let entries = std::fs::read_dir(root).map_err(|source| BundleError::ResourceRead {
            path: root.to_path_buf(),
            source,
        })?;

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| validator::is_bundle_dir(p))
            .collect();
        candidates.sort();

        let mut validator = BundleValidator::new();
        let mut bundles = BTreeMap::new();
        for path in candidates {
            match validator.accept(&path) {
                Ok(bundle) => {
                    bundles.insert(bundle.id().to_string(), Arc::new(bundle));
                }
                Err(e) => {
                    tracing::warn!("skipping bundle '{}': {e}", path.display());
                }
            }
        }

        tracing::info!(
            "bundle manager: {} bundle(s) under {}",
            bundles.len(),
            root.display()
        );
        Ok(Self {
            root: root.to_path_buf(),
            bundles,
        })
    }

    /// Builds a registry from already-loaded bundles; later duplicates are
    /// dropped.
    pub fn from_bundles(bundles: impl IntoIterator<Item = ModelBundle>) -> Self {
        let mut map = BTreeMap::new();
        for bundle in bundles {
            let id = bundle.id().to_string();
            if map.contains_key(&id) {
                tracing::warn!("duplicate bundle id '{id}', keeping the first");
                continue;
            }
            map.insert(id, Arc::new(bundle));
        }
        Self {
            root: PathBuf::new(),
            bundles: map,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bundle_with_id(&self, id: &str) -> Option<Arc<ModelBundle>> {
        self.bundles.get(id).cloned()
    }

    /// Looks up several ids at once; unknown ids are skipped.
    pub fn bundles_with_ids(&self, ids: &[&str]) -> Vec<Arc<ModelBundle>> {
        ids.iter().filter_map(|id| self.bundle_with_id(id)).collect()
    }

    /// All registered ids, sorted.
    pub fn bundle_ids(&self) -> Vec<String> {
        self.bundles.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ModelBundle>> {
        self.bundles.values()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}
