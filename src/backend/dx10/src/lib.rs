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

//! Direct3D 10 device for postfx.
//!
//! The device is the host's own: `Device::from_borrowed` wraps the pointer a hook received,
//! and every context call lands in the host's immediate context. State blocks capture what
//! the runtime is about to overwrite, so the host never notices.

#![cfg(windows)]

#[macro_use]
extern crate log;
extern crate postfx_core;
extern crate winapi;
extern crate wio;

use winapi::um::d3d10::ID3D10Device;
use winapi::um::unknwnbase::IUnknown;
use wio::com::ComPtr;

use postfx_core::format::Format;
use postfx_core::shade::{CompileError, CompileFlags, Compiled, Stage};
use postfx_core::state::{BlendDesc, DepthStencilDesc, RasterizerDesc};
use postfx_core::tex::{SamplerInfo, TextureInfo, ViewDesc};
use postfx_core::{ClearFlags, CreationError, MapError, MappedTexture, Primitive, RenderTargets,
                  VertexCount, Viewport};

pub use self::native::{BlendState, Buffer, DepthStencilState, Dsv, PixelShader, RasterizerState,
                       Rtv, Sampler, Srv, StateBlock, Texture, VertexShader};

mod data;
mod execute;
mod factory;
pub mod native;
mod shade;
mod state;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Resources {}

impl postfx_core::Resources for Resources {
    type Buffer = native::Buffer;
    type Texture = native::Texture;
    type ShaderResourceView = native::Srv;
    type RenderTargetView = native::Rtv;
    type DepthStencilView = native::Dsv;
    type Sampler = native::Sampler;
    type VertexShader = native::VertexShader;
    type PixelShader = native::PixelShader;
    type BlendState = native::BlendState;
    type DepthStencilState = native::DepthStencilState;
    type RasterizerState = native::RasterizerState;
    type StateBlock = native::StateBlock;
}

/// The host's device and its immediate context.
pub struct Device {
    raw: ComPtr<ID3D10Device>,
    states: Vec<Option<state::Captured>>,
}

impl Device {
    /// Wrap a device the host keeps using. Adds a reference.
    pub unsafe fn from_borrowed(raw: *mut ID3D10Device) -> Device {
        (*(raw as *mut IUnknown)).AddRef();
        Device {
            raw: ComPtr::from_raw(raw),
            states: Vec::new(),
        }
    }

    pub fn as_raw(&self) -> *mut ID3D10Device {
        self.raw.as_raw()
    }
}

impl postfx_core::Device<Resources> for Device {
    fn create_texture_2d(&mut self, info: &TextureInfo, data: Option<&[u8]>)
                         -> Result<Texture, CreationError> {
        factory::create_texture_2d(&self.raw, info, data)
    }

    fn create_shader_resource_view(&mut self, texture: &Texture, desc: &ViewDesc)
                                   -> Result<Srv, CreationError> {
        factory::create_shader_resource_view(&self.raw, texture, desc)
    }

    fn create_render_target_view(&mut self, texture: &Texture, desc: &ViewDesc)
                                 -> Result<Rtv, CreationError> {
        factory::create_render_target_view(&self.raw, texture, desc)
    }

    fn create_depth_stencil_view(&mut self, texture: &Texture, desc: Option<&ViewDesc>)
                                 -> Result<Dsv, CreationError> {
        factory::create_depth_stencil_view(&self.raw, texture, desc)
    }

    fn create_sampler(&mut self, info: &SamplerInfo) -> Result<Sampler, CreationError> {
        factory::create_sampler(&self.raw, info)
    }

    fn create_constant_buffer(&mut self, size: usize, data: &[u8]) -> Result<Buffer, CreationError> {
        factory::create_constant_buffer(&self.raw, size, data)
    }

    fn create_blend_state(&mut self, desc: &BlendDesc) -> Result<BlendState, CreationError> {
        factory::create_blend_state(&self.raw, desc)
    }

    fn create_depth_stencil_state(&mut self, desc: &DepthStencilDesc)
                                  -> Result<DepthStencilState, CreationError> {
        factory::create_depth_stencil_state(&self.raw, desc)
    }

    fn create_rasterizer_state(&mut self, desc: &RasterizerDesc)
                               -> Result<RasterizerState, CreationError> {
        factory::create_rasterizer_state(&self.raw, desc)
    }

    fn compile_shader(&mut self, source: &str, entry: &str, stage: Stage, flags: CompileFlags)
                      -> Result<Compiled, CompileError> {
        shade::compile(source, entry, stage, flags)
    }

    fn create_vertex_shader(&mut self, code: &[u8]) -> Result<VertexShader, CreationError> {
        factory::create_vertex_shader(&self.raw, code)
    }

    fn create_pixel_shader(&mut self, code: &[u8]) -> Result<PixelShader, CreationError> {
        factory::create_pixel_shader(&self.raw, code)
    }

    fn create_state_block(&mut self) -> Result<StateBlock, CreationError> {
        self.states.push(None);
        Ok(StateBlock(self.states.len() - 1))
    }

    fn texture_info(&self, texture: &Texture) -> TextureInfo {
        factory::texture_info(texture)
    }

    fn shader_resource_texture(&self, view: &Srv) -> Texture {
        factory::shader_resource_texture(view)
    }

    fn shader_resource_levels(&self, view: &Srv) -> u32 {
        factory::shader_resource_levels(view)
    }

    fn render_target_texture(&self, view: &Rtv) -> Texture {
        factory::render_target_texture(view)
    }

    fn depth_stencil_texture(&self, view: &Dsv) -> Texture {
        factory::depth_stencil_texture(view)
    }

    fn render_targets(&self) -> (RenderTargets<Resources>, Option<Dsv>) {
        execute::render_targets(&self.raw)
    }

    fn set_primitive(&mut self, primitive: Primitive) {
        unsafe { self.raw.IASetPrimitiveTopology(execute::map_primitive(primitive)) }
    }

    fn unbind_vertex_input(&mut self) {
        execute::unbind_vertex_input(&self.raw)
    }

    fn set_rasterizer_state(&mut self, state: Option<&RasterizerState>) {
        unsafe { self.raw.RSSetState(state.map_or(std::ptr::null_mut(), RasterizerState::as_raw)) }
    }

    fn set_samplers(&mut self, stage: Stage, samplers: &[Sampler]) {
        execute::set_samplers(&self.raw, stage, samplers)
    }

    fn set_constant_buffers(&mut self, stage: Stage, buffers: &[Option<Buffer>]) {
        execute::set_constant_buffers(&self.raw, stage, buffers)
    }

    fn set_shader_resources(&mut self, stage: Stage, views: &[Option<Srv>]) {
        execute::set_shader_resources(&self.raw, stage, views)
    }

    fn set_vertex_shader(&mut self, shader: Option<&VertexShader>) {
        unsafe { self.raw.VSSetShader(shader.map_or(std::ptr::null_mut(), VertexShader::as_raw)) }
    }

    fn unbind_geometry_shader(&mut self) {
        unsafe { self.raw.GSSetShader(std::ptr::null_mut()) }
    }

    fn set_pixel_shader(&mut self, shader: Option<&PixelShader>) {
        unsafe { self.raw.PSSetShader(shader.map_or(std::ptr::null_mut(), PixelShader::as_raw)) }
    }

    fn set_blend_state(&mut self, state: Option<&BlendState>, factor: [f32; 4], sample_mask: u32) {
        let state = state.map_or(std::ptr::null_mut(), BlendState::as_raw);
        unsafe { self.raw.OMSetBlendState(state, &factor, sample_mask) }
    }

    fn set_depth_stencil_state(&mut self, state: Option<&DepthStencilState>, stencil_ref: u32) {
        let state = state.map_or(std::ptr::null_mut(), DepthStencilState::as_raw);
        unsafe { self.raw.OMSetDepthStencilState(state, stencil_ref) }
    }

    fn set_render_targets(&mut self, targets: &[Option<Rtv>], depth_stencil: Option<&Dsv>) {
        execute::set_render_targets(&self.raw, targets, depth_stencil)
    }

    fn set_viewports(&mut self, viewports: &[Viewport]) {
        execute::set_viewports(&self.raw, viewports)
    }

    fn clear_render_target(&mut self, view: &Rtv, color: [f32; 4]) {
        unsafe { self.raw.ClearRenderTargetView(view.as_raw(), &color) }
    }

    fn clear_depth_stencil(&mut self, view: &Dsv, flags: ClearFlags, depth: f32, stencil: u8) {
        execute::clear_depth_stencil(&self.raw, view, flags, depth, stencil)
    }

    fn draw(&mut self, count: VertexCount, start: VertexCount) {
        unsafe { self.raw.Draw(count, start) }
    }

    fn copy_resource(&mut self, dst: &Texture, src: &Texture) {
        unsafe { self.raw.CopyResource(dst.as_raw(), src.as_raw()) }
    }

    fn resolve_subresource(&mut self, dst: &Texture, dst_level: u32, src: &Texture, src_level: u32,
                           format: Format) {
        unsafe {
            self.raw.ResolveSubresource(dst.as_raw(), dst_level, src.as_raw(), src_level,
                                        data::map_format(format))
        }
    }

    fn generate_mips(&mut self, view: &Srv) {
        unsafe { self.raw.GenerateMips(view.as_raw()) }
    }

    fn update_buffer(&mut self, buffer: &Buffer, data: &[u8]) -> Result<(), MapError> {
        execute::update_buffer(buffer, data)
    }

    fn update_texture(&mut self, texture: &Texture, level: u32, data: &[u8], row_pitch: usize) {
        execute::update_texture(&self.raw, texture, level, data, row_pitch)
    }

    fn read_texture(&mut self, texture: &Texture) -> Result<MappedTexture, MapError> {
        execute::read_texture(&self.raw, texture)
    }

    fn capture_state(&mut self, block: &StateBlock) {
        let captured = unsafe { state::Captured::capture(&self.raw) };
        match self.states.get_mut(block.0) {
            Some(slot) => *slot = Some(captured),
            None => error!("Unknown state block {:?}", block),
        }
    }

    fn apply_state(&mut self, block: &StateBlock) {
        match self.states.get(block.0) {
            Some(&Some(ref captured)) => unsafe { captured.apply(&self.raw) },
            _ => warn!("State block {:?} holds no captured state", block),
        }
    }

    fn release_state(&mut self, block: &StateBlock) {
        if let Some(slot) = self.states.get_mut(block.0) {
            *slot = None;
        }
    }
}
