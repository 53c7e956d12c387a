// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
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

//! Core emulation components
//!
//! This module contains the register-level GPU emulation:
//! - GPU (status/data ports, VRAM image, display state)
//! - DMA command-chain walker
//! - Frame pacing and frame skipping
//! - Save states (freeze images and state files)
//! - Render backends

pub mod config;
pub mod dma;
pub mod error;
pub mod gpu;
pub mod renderer;
pub mod save_state;
pub mod timing;

// Re-export commonly used types
pub use config::{BackendKind, Fixes, Settings};
pub use error::{EmulatorError, GpuError, Result, SettingsError, StateError};
pub use gpu::GPU;
pub use renderer::Renderer;
pub use save_state::{FreezeImage, FreezeMode, StateFile};
pub use timing::FrameTimer;
