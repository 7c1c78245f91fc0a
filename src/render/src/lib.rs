// Copyright 2017 The Postfx Developers.
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

//! # postfx
//!
//! Post-processing for a Direct3D 10 renderer the library is injected into.
//!
//! # Overview
//!
//! The host keeps rendering as usual. Its calls are hooked and forwarded to a
//! [`Runtime`](struct.Runtime.html), which owns everything this crate puts on the device:
//!
//! - the back-buffer wrapper: a shader-readable copy of the frame, and a single-sampled
//!   stand-in when the host renders multisampled,
//! - the depth-source detector, which picks the host depth buffer most likely to hold the
//!   scene, and the replacement that makes it readable by shaders,
//! - the loaded [`Effect`](effect/struct.Effect.html): textures, samplers, uniforms and
//!   techniques built by the [`compiler`](compiler/index.html) from an effect syntax tree.
//!
//! Every present, the runtime resolves the back buffer, runs the enabled techniques pass by
//! pass as full-screen triangles, then restores the host's pipeline state.
//!
//! ## Devices
//!
//! Nothing here talks to Direct3D directly. The runtime drives a
//! [`Device`](../postfx_core/trait.Device.html), implemented by `postfx_device_dx10` on
//! Windows and by the recording `postfx_backend_empty` everywhere else.
//!
//! ## Uniforms
//!
//! Uniform values live in CPU-side storage, one slot per constant buffer. Writes mark the
//! storage dirty and the next pass uploads it.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;
#[cfg(feature = "serialize")]
extern crate serde;
extern crate postfx_core;
#[cfg(windows)]
pub extern crate postfx_device_dx10 as dx10;

pub use postfx_core::{Device, Resources, VertexCount};
pub use postfx_core::tree;

pub use self::backbuffer::{BackBuffer, SwapChainDesc};
pub use self::config::Config;
pub use self::depth::{record_network_traffic, DepthReplacement, DepthSourceDetector, Selection};
pub use self::effect::{Effect, FrameSources, Pass, Surfaces, Technique, Texture, TextureSource,
                       Uniform, UpdateError};
pub use self::runtime::{Error, FrameStats, Runtime};
pub use self::technique::{Frame, PASS_VERTICES};
pub use self::uniform::{Component, UniformClass};

pub mod backbuffer;
pub mod compiler;
pub mod config;
pub mod depth;
pub mod effect;
pub mod runtime;
pub mod technique;
pub mod uniform;
