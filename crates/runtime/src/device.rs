// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Execution backends an executor can be bound to.

use std::fmt;
use std::str::FromStr;

/// Hardware backend for the tensor executor.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cpu,
    Gpu,
    /// Android Neural Networks API accelerator.
    Nnapi,
}

impl Device {
    pub const ALL: [Device; 3] = [Device::Cpu, Device::Gpu, Device::Nnapi];

    pub fn as_str(self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Gpu => "gpu",
            Device::Nnapi => "nnapi",
        }
    }

    /// `true` for every backend that needs an accelerator delegate.
    pub fn is_accelerator(self) -> bool {
        !matches!(self, Device::Cpu)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Device {
    type Err = crate::RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "gpu" => Ok(Device::Gpu),
            "nnapi" | "nnapi-accelerator" => Ok(Device::Nnapi),
            other => Err(crate::RuntimeError::ConfigError(format!(
                "unknown device '{other}'; expected 'cpu', 'gpu' or 'nnapi'"
            ))),
        }
    }
}
