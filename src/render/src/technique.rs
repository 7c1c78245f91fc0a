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

//! Execution of techniques.
//!
//! A frame of post-processing is `begin`, then `render_pass` for every pass of every enabled
//! technique, then `end`. Each pass is a single full-screen triangle.

use postfx_core::shade::STAGES;
use postfx_core::{ClearFlags, Device, Primitive, Resources, VertexCount};

use crate::effect::Effect;

/// Vertices drawn by every pass.
pub const PASS_VERTICES: VertexCount = 3;

/// Swap-chain objects a frame of post-processing renders with.
#[derive(Debug)]
pub struct Frame<'a, R: Resources> {
    /// The real back buffer.
    pub back_buffer: &'a R::Texture,
    /// Shader-readable copy of the back buffer, refreshed before every pass.
    pub back_buffer_copy: &'a R::Texture,
    /// Depth-stencil view bound to passes covering the whole back buffer.
    pub depth_stencil: Option<&'a R::DepthStencilView>,
    pub width: u32,
    pub height: u32,
}

impl<R: Resources> Effect<R> {
    /// Bind the state shared by every pass.
    pub fn begin<D: Device<R>>(&self, device: &mut D, frame: &Frame<R>) {
        device.set_primitive(Primitive::TriangleList);
        device.unbind_vertex_input();
        device.set_rasterizer_state(self.rasterizer_state.as_ref());
        for &stage in STAGES.iter() {
            device.set_samplers(stage, &self.samplers);
            device.set_constant_buffers(stage, &self.constant_buffers);
        }
        if let Some(view) = frame.depth_stencil {
            device.clear_depth_stencil(view, ClearFlags::DEPTH | ClearFlags::STENCIL, 1.0, 0);
        }
    }

    /// Upload changed uniforms, then draw one pass. Returns the number of vertices drawn.
    pub fn render_pass<D: Device<R>>(&mut self, device: &mut D, frame: &Frame<R>,
                                     technique: usize, pass: usize) -> VertexCount {
        if self.store.take_dirty() {
            for (index, buffer) in self.constant_buffers.iter().enumerate() {
                if let Some(ref buffer) = *buffer {
                    if let Err(e) = device.update_buffer(buffer, self.store.contents(index)) {
                        error!("Failed to upload constant buffer {}: {}", index, e);
                    }
                }
            }
        }

        let pass = match self.techniques.get(technique).and_then(|t| t.passes.get(pass)) {
            Some(pass) => pass,
            None => return 0,
        };

        device.set_vertex_shader(pass.vertex_shader.as_ref());
        device.unbind_geometry_shader();
        device.set_pixel_shader(pass.pixel_shader.as_ref());

        device.set_blend_state(pass.blend_state.as_ref(), [1.0; 4], !0);
        device.set_depth_stencil_state(pass.depth_stencil_state.as_ref(), pass.stencil_ref);

        device.copy_resource(frame.back_buffer_copy, frame.back_buffer);

        for &stage in STAGES.iter() {
            device.set_shader_resources(stage, &pass.shader_resources);
        }

        let full = pass.viewport.width == frame.width && pass.viewport.height == frame.height;
        device.set_render_targets(&pass.render_targets,
                                  if full { frame.depth_stencil } else { None });
        device.set_viewports(&[pass.viewport]);
        for view in pass.render_targets.iter().filter_map(|v| v.as_ref()) {
            device.clear_render_target(view, [0.0; 4]);
        }

        device.draw(PASS_VERTICES, 0);

        let unbound = vec![None; pass.shader_resources.len()];
        for &stage in STAGES.iter() {
            device.set_shader_resources(stage, &unbound);
        }
        device.set_render_targets(&[None], None);

        for view in pass.render_target_resources.iter().filter_map(|v| v.as_ref()) {
            if device.shader_resource_levels(view) > 1 {
                device.generate_mips(view);
            }
        }

        PASS_VERTICES
    }

    /// Unbind the shaders and the rasterizer state.
    pub fn end<D: Device<R>>(&self, device: &mut D) {
        device.set_vertex_shader(None);
        device.set_pixel_shader(None);
        device.set_rasterizer_state(None);
    }
}
