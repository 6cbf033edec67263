// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model file access with memory-mapped I/O.
//!
//! [`ModelFile`] provides two modes:
//!
//! 1. **File-backed**: maps the bundle's model file read-only, so the
//!    executor can parse it without copying.
//! 2. **Placeholder**: no bytes at all, for bundles that declare no model.

use crate::RuntimeError;
use std::path::{Path, PathBuf};

/// The model resource an executor is built from.
pub struct ModelFile {
    path: Option<PathBuf>,
    mmap: Option<memmap2::Mmap>,
}

impl ModelFile {
    /// Memory-maps the model file at `path`.
    pub fn open(path: &Path) -> Result<Self, RuntimeError> {
        let file = std::fs::File::open(path).map_err(|e| {
            RuntimeError::ModelError(format!("cannot open '{}': {e}", path.display()))
        })?;
        let len = file
            .metadata()
            .map_err(|e| RuntimeError::ModelError(format!("cannot stat '{}': {e}", path.display())))?
            .len();
        if len == 0 {
            return Err(RuntimeError::ModelError(format!(
                "model file '{}' is empty",
                path.display()
            )));
        }

        let mmap = unsafe { memmap2::Mmap::map(&file) }
            .map_err(|e| RuntimeError::ModelError(format!("mmap failed: {e}")))?;
        tracing::info!(
            "model file: mmap'd {} ({:.2} MB)",
            path.display(),
            mmap.len() as f64 / (1024.0 * 1024.0),
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            mmap: Some(mmap),
        })
    }

    /// A model file with no backing bytes.
    pub fn placeholder() -> Self {
        Self {
            path: None,
            mmap: None,
        }
    }

    /// Returns `true` if operating in file-backed mode.
    pub fn is_file_backed(&self) -> bool {
        self.mmap.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The mapped model bytes (empty for placeholders).
    pub fn as_bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ModelFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelFile")
            .field("path", &self.path)
            .field("file_backed", &self.is_file_backed())
            .field("len", &self.len())
            .finish()
    }
}
