// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Implementations of [`ExternalLoader`](tether_core::ExternalLoader).

mod async_loader;
mod immediate;
mod source;

pub use async_loader::AsyncSceneLoader;
pub use immediate::ImmediateSceneLoader;
pub use source::{SceneSource, SceneSourceError};

use serde::{Deserialize, Serialize};

/// Tuning of the background loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Number of worker threads parsing scene files. At least one is started.
    pub worker_threads: usize,
    /// Maximum number of finished loads instantiated per frame.
    /// `0` means no limit.
    pub max_completions_per_frame: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            max_completions_per_frame: 0,
        }
    }
}
