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

//! PlayStation 1 GPU emulation core library
//!
//! This library models the PS1 GPU at the register level: the status and
//! data ports, VRAM image transfers, the DMA command-chain walker, save
//! states and frame pacing. It is the core of a GPU plugin in the classic
//! emulator sense, with rasterization left to a pluggable render backend.
//!
//! # Example
//!
//! ```
//! use psgpu::core::config::Settings;
//! use psgpu::core::gpu::GPU;
//!
//! let mut gpu = GPU::new(Settings::default()).unwrap();
//!
//! // Upload one pixel to VRAM through the data port
//! gpu.write_data(0xA000_0000); // image load
//! gpu.write_data(0x0014_000A); // destination (10, 20)
//! gpu.write_data(0x0001_0001); // size 1x1
//! gpu.write_data(0x0000_7C1F);
//!
//! assert_eq!(gpu.vram().read_pixel(10, 20), 0x7C1F);
//! ```

pub mod core;
