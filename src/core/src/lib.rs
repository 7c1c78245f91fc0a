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

#![deny(missing_docs)]

//! Backend-neutral vocabulary of postfx.
//!
//! This crate describes the device an effect runs on, without depending on any particular
//! graphics API. The device model follows Direct3D 10: a single object that both creates
//! resources and owns the immediate context. Backends implement [`Device`](trait.Device.html)
//! for their own [`Resources`](trait.Resources.html).
//!
//! It also hosts the effect syntax tree (`tree`), which is produced by the effect-language
//! parser and consumed by the effect compiler.

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate log;
extern crate draw_state;
#[cfg(feature = "serialize")]
extern crate serde;
extern crate smallvec;

use std::fmt::Debug;
use std::hash::Hash;

use smallvec::SmallVec;

pub use draw_state::state as ds;
pub use self::factory::{CreationError, MapError};

pub mod factory;
pub mod format;
pub mod shade;
pub mod state;
pub mod tex;
pub mod tree;

/// Compile-time maximum number of simultaneously bound render targets.
pub const MAX_RENDER_TARGETS: usize = 8;
/// Compile-time maximum number of constant buffers.
pub const MAX_CONSTANT_BUFFERS: usize = 14;
/// Compile-time maximum number of shader resource views (SRV).
pub const MAX_RESOURCE_VIEWS: usize = 128;
/// Compile-time maximum number of samplers.
pub const MAX_SAMPLERS: usize = 16;

/// Draw vertex count.
pub type VertexCount = u32;

/// Render targets as returned by the output merger, one entry per slot.
pub type RenderTargets<R> = SmallVec<[Option<<R as Resources>::RenderTargetView>; MAX_RENDER_TARGETS]>;

/// Describes what geometric primitives are created from vertex data.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
#[repr(u8)]
pub enum Primitive {
    /// Each vertex represents a single point.
    PointList,
    /// Each pair of vertices represent a single line segment.
    LineList,
    /// Every two consecutive vertices represent a single line segment.
    LineStrip,
    /// Each triplet of vertices represent a single triangle.
    TriangleList,
    /// Every three consecutive vertices represent a single triangle.
    TriangleStrip,
}

/// A rectangle on the render target, in pixels. Depth always spans `0..1`.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// A viewport covering a whole surface of the given size.
    pub fn full(width: u32, height: u32) -> Viewport {
        Viewport { x: 0, y: 0, width, height }
    }
}

bitflags!(
    /// Which parts of a depth-stencil view get cleared.
    pub struct ClearFlags: u8 {
        /// Clear depth.
        const DEPTH   = 0x1;
        /// Clear stencil.
        const STENCIL = 0x2;
    }
);

/// Pixels read back from a texture through a staging copy.
#[derive(Clone, Debug, PartialEq)]
pub struct MappedTexture {
    /// Raw bytes, `row_pitch * height` long.
    pub data: Vec<u8>,
    /// Bytes between the start of two consecutive rows.
    pub row_pitch: usize,
}

/// Resources pertaining to a specific API.
///
/// Every handle is reference counted: cloning it adds a reference, dropping it releases one.
/// Equality is object identity.
#[allow(missing_docs)]
pub trait Resources:          Clone + Hash + Debug + Eq + PartialEq {
    type Buffer:              Clone + Hash + Debug + Eq + PartialEq;
    type Texture:             Clone + Hash + Debug + Eq + PartialEq;
    type ShaderResourceView:  Clone + Hash + Debug + Eq + PartialEq;
    type RenderTargetView:    Clone + Hash + Debug + Eq + PartialEq;
    type DepthStencilView:    Clone + Hash + Debug + Eq + PartialEq;
    type Sampler:             Clone + Hash + Debug + Eq + PartialEq;
    type VertexShader:        Clone + Hash + Debug + Eq + PartialEq;
    type PixelShader:         Clone + Hash + Debug + Eq + PartialEq;
    type BlendState:          Clone + Hash + Debug + Eq + PartialEq;
    type DepthStencilState:   Clone + Hash + Debug + Eq + PartialEq;
    type RasterizerState:     Clone + Hash + Debug + Eq + PartialEq;
    type StateBlock:          Clone + Hash + Debug + Eq + PartialEq;
}

/// A graphics device shared with the host application.
///
/// Creation methods allocate new objects. Context methods change the pipeline state
/// immediately, exactly like the host's own calls would. Nothing here is deferred.
pub trait Device<R: Resources> {
    // resource creation

    /// Create a 2D texture, optionally filled with the contents of the top level.
    fn create_texture_2d(&mut self, info: &tex::TextureInfo, data: Option<&[u8]>)
                         -> Result<R::Texture, CreationError>;
    /// Create a shader resource view over a texture.
    fn create_shader_resource_view(&mut self, texture: &R::Texture, desc: &tex::ViewDesc)
                                   -> Result<R::ShaderResourceView, CreationError>;
    /// Create a render target view over a texture.
    fn create_render_target_view(&mut self, texture: &R::Texture, desc: &tex::ViewDesc)
                                 -> Result<R::RenderTargetView, CreationError>;
    /// Create a depth-stencil view. `None` uses the format of the texture.
    fn create_depth_stencil_view(&mut self, texture: &R::Texture, desc: Option<&tex::ViewDesc>)
                                 -> Result<R::DepthStencilView, CreationError>;
    /// Create a sampler state object.
    fn create_sampler(&mut self, info: &tex::SamplerInfo) -> Result<R::Sampler, CreationError>;
    /// Create a dynamic, CPU-writable constant buffer initialized with `data`.
    fn create_constant_buffer(&mut self, size: usize, data: &[u8]) -> Result<R::Buffer, CreationError>;
    /// Create a blend state object.
    fn create_blend_state(&mut self, desc: &state::BlendDesc) -> Result<R::BlendState, CreationError>;
    /// Create a depth-stencil state object.
    fn create_depth_stencil_state(&mut self, desc: &state::DepthStencilDesc)
                                  -> Result<R::DepthStencilState, CreationError>;
    /// Create a rasterizer state object.
    fn create_rasterizer_state(&mut self, desc: &state::RasterizerDesc)
                               -> Result<R::RasterizerState, CreationError>;
    /// Compile shader source for one entry point.
    fn compile_shader(&mut self, source: &str, entry: &str, stage: shade::Stage,
                      flags: shade::CompileFlags) -> Result<shade::Compiled, shade::CompileError>;
    /// Create a vertex shader from compiled byte code.
    fn create_vertex_shader(&mut self, code: &[u8]) -> Result<R::VertexShader, CreationError>;
    /// Create a pixel shader from compiled byte code.
    fn create_pixel_shader(&mut self, code: &[u8]) -> Result<R::PixelShader, CreationError>;
    /// Create a block capturing the whole device state.
    fn create_state_block(&mut self) -> Result<R::StateBlock, CreationError>;

    // queries

    /// Return the description of a texture.
    fn texture_info(&self, texture: &R::Texture) -> tex::TextureInfo;
    /// Return the texture a shader resource view was created on.
    fn shader_resource_texture(&self, view: &R::ShaderResourceView) -> R::Texture;
    /// Return the number of mipmap levels a shader resource view covers.
    fn shader_resource_levels(&self, view: &R::ShaderResourceView) -> u32;
    /// Return the texture a render target view was created on.
    fn render_target_texture(&self, view: &R::RenderTargetView) -> R::Texture;
    /// Return the texture a depth-stencil view was created on.
    fn depth_stencil_texture(&self, view: &R::DepthStencilView) -> R::Texture;
    /// Return the currently bound render targets and depth-stencil view.
    fn render_targets(&self) -> (RenderTargets<R>, Option<R::DepthStencilView>);

    // immediate context

    /// Set the primitive topology.
    fn set_primitive(&mut self, primitive: Primitive);
    /// Bind no input layout and no vertex buffer.
    fn unbind_vertex_input(&mut self);
    /// Bind a rasterizer state, or the default one.
    fn set_rasterizer_state(&mut self, state: Option<&R::RasterizerState>);
    /// Bind sampler states to a stage, starting at slot 0.
    fn set_samplers(&mut self, stage: shade::Stage, samplers: &[R::Sampler]);
    /// Bind constant buffers to a stage, starting at slot 0.
    fn set_constant_buffers(&mut self, stage: shade::Stage, buffers: &[Option<R::Buffer>]);
    /// Bind shader resource views to a stage, starting at slot 0.
    fn set_shader_resources(&mut self, stage: shade::Stage, views: &[Option<R::ShaderResourceView>]);
    /// Bind a vertex shader.
    fn set_vertex_shader(&mut self, shader: Option<&R::VertexShader>);
    /// Unbind the geometry shader.
    fn unbind_geometry_shader(&mut self);
    /// Bind a pixel shader.
    fn set_pixel_shader(&mut self, shader: Option<&R::PixelShader>);
    /// Bind a blend state with a blend factor and a sample mask.
    fn set_blend_state(&mut self, state: Option<&R::BlendState>, factor: [f32; 4], sample_mask: u32);
    /// Bind a depth-stencil state with a stencil reference.
    fn set_depth_stencil_state(&mut self, state: Option<&R::DepthStencilState>, stencil_ref: u32);
    /// Bind render targets and a depth-stencil view.
    fn set_render_targets(&mut self, targets: &[Option<R::RenderTargetView>],
                          depth_stencil: Option<&R::DepthStencilView>);
    /// Set the viewports.
    fn set_viewports(&mut self, viewports: &[Viewport]);
    /// Clear a render target to a color.
    fn clear_render_target(&mut self, view: &R::RenderTargetView, color: [f32; 4]);
    /// Clear a depth-stencil view.
    fn clear_depth_stencil(&mut self, view: &R::DepthStencilView, flags: ClearFlags,
                           depth: f32, stencil: u8);
    /// Draw non-indexed, non-instanced primitives.
    fn draw(&mut self, count: VertexCount, start: VertexCount);
    /// Copy the whole contents of a texture into another one of the same shape.
    fn copy_resource(&mut self, dst: &R::Texture, src: &R::Texture);
    /// Resolve a multisampled subresource into a single-sampled one.
    fn resolve_subresource(&mut self, dst: &R::Texture, dst_level: u32, src: &R::Texture,
                           src_level: u32, format: format::Format);
    /// Regenerate the mipmap chain below the most detailed level of a view.
    fn generate_mips(&mut self, view: &R::ShaderResourceView);
    /// Replace the contents of a dynamic buffer (map with discard, copy, unmap).
    fn update_buffer(&mut self, buffer: &R::Buffer, data: &[u8]) -> Result<(), MapError>;
    /// Upload data into one mipmap level of a texture.
    fn update_texture(&mut self, texture: &R::Texture, level: u32, data: &[u8], row_pitch: usize);
    /// Read the top level of a texture back through a staging copy.
    fn read_texture(&mut self, texture: &R::Texture) -> Result<MappedTexture, MapError>;
    /// Capture the current device state into a block.
    fn capture_state(&mut self, block: &R::StateBlock);
    /// Restore the device state from a block.
    fn apply_state(&mut self, block: &R::StateBlock);
    /// Drop every device object the block holds a reference to.
    fn release_state(&mut self, block: &R::StateBlock);
}
