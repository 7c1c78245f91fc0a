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

//! Compiled effects and their runtime objects.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use postfx_core::tree::{self, TextureFormat, Value};
use postfx_core::{Device, Resources, Viewport, MAX_RENDER_TARGETS};
use crate::uniform::{self, Component, UniformClass, UniformStore};

/// Annotations attached to a declaration, by name.
pub type Annotations = HashMap<String, Value>;

pub(crate) fn collect_annotations(list: &[tree::Annotation]) -> Annotations {
    list.iter().map(|a| (a.name.clone(), a.value.clone())).collect()
}

/// Interpret an annotation as a flag.
pub fn annotation_flag(annotations: &Annotations, name: &str) -> Option<bool> {
    match annotations.get(name)? {
        Value::Int(v) => v.first().map(|&x| x != 0),
        Value::Uint(v) => v.first().map(|&x| x != 0),
        Value::Float(v) => v.first().map(|&x| x != 0.0),
        Value::String(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
    }
}

/// Where the contents of a texture come from.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextureSource {
    /// Owned by the effect, filled by the host or by passes rendering into it.
    Memory,
    /// Copy of the back buffer taken before every pass.
    BackBuffer,
    /// The depth buffer picked by the depth-source detector.
    DepthStencil,
}

/// Surfaces the runtime lends to an effect while building it.
#[derive(Clone, Debug)]
pub struct Surfaces<R: Resources> {
    pub width: u32,
    pub height: u32,
    /// Linear and sRGB views of the back-buffer copy.
    pub back_buffer_resources: [Option<R::ShaderResourceView>; 2],
    /// Linear and sRGB targets on the real back buffer.
    pub back_buffer_targets: [Option<R::RenderTargetView>; 2],
    /// View of the current depth replacement, if any.
    pub depth_resource: Option<R::ShaderResourceView>,
}

/// A texture declared by an effect.
#[derive(Clone, Debug)]
pub struct Texture<R: Resources> {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub levels: u32,
    pub format: TextureFormat,
    pub source: TextureSource,
    pub annotations: Annotations,
    pub(crate) register: usize,
    pub(crate) texture: Option<R::Texture>,
    pub(crate) views: [Option<R::ShaderResourceView>; 2],
    pub(crate) targets: [Option<R::RenderTargetView>; 2],
}

impl<R: Resources> Texture<R> {
    /// Shader register of the linear view. The sRGB view sits right after it.
    pub fn register(&self) -> usize {
        self.register
    }

    /// Underlying device texture, if any.
    pub fn texture(&self) -> Option<&R::Texture> {
        self.texture.as_ref()
    }

    /// Linear (`false`) or sRGB (`true`) view.
    pub fn shader_resource_view(&self, srgb: bool) -> Option<&R::ShaderResourceView> {
        self.views[srgb as usize].as_ref()
    }

    /// Render target view created for a pass, if any.
    pub fn render_target_view(&self, srgb: bool) -> Option<&R::RenderTargetView> {
        self.targets[srgb as usize].as_ref()
    }
}

/// A uniform value, or a uniform block.
#[derive(Clone, Debug, PartialEq)]
pub struct Uniform {
    /// Declared name. Block members are named `block.member`.
    pub name: String,
    pub class: UniformClass,
    pub rows: u32,
    pub cols: u32,
    /// Array length, 0 if not an array.
    pub elements: u32,
    /// Member count of a block.
    pub fields: u32,
    /// Size in bytes.
    pub size: usize,
    /// Constant buffer holding the value.
    pub buffer_index: usize,
    /// Offset in bytes inside the buffer.
    pub buffer_offset: usize,
    pub annotations: Annotations,
}

/// A pass with every pipeline object it binds.
#[derive(Clone, Debug)]
pub struct Pass<R: Resources> {
    pub name: String,
    pub annotations: Annotations,
    pub vertex_shader: Option<R::VertexShader>,
    pub pixel_shader: Option<R::PixelShader>,
    pub blend_state: Option<R::BlendState>,
    pub depth_stencil_state: Option<R::DepthStencilState>,
    pub stencil_ref: u32,
    pub viewport: Viewport,
    pub render_targets: [Option<R::RenderTargetView>; MAX_RENDER_TARGETS],
    /// Views of the textures behind `render_targets`, for mipmap generation.
    pub render_target_resources: [Option<R::ShaderResourceView>; MAX_RENDER_TARGETS],
    /// Shader resource table, with slots aliasing a render target cleared.
    pub shader_resources: Vec<Option<R::ShaderResourceView>>,
}

/// An ordered list of passes.
#[derive(Clone, Debug)]
pub struct Technique<R: Resources> {
    pub name: String,
    pub annotations: Annotations,
    /// Whether the runtime executes the technique. Defaults to the `enabled` annotation.
    pub enabled: bool,
    pub passes: Vec<Pass<R>>,
}

/// Per-frame values fed to uniforms annotated with a `source`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameSources {
    pub frame_count: u32,
    /// Milliseconds since the runtime was created.
    pub timer: f32,
    /// Milliseconds spent on the previous frame.
    pub frame_time: f32,
    /// Draw calls issued by the host during the previous frame.
    pub draw_calls: u32,
}

/// Errors of the effect update operations.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateError {
    UnknownUniform(String),
    UnknownTexture(String),
    UnknownTechnique(String),
    /// The texture is not backed by effect-owned memory.
    NotInMemory(String),
    InvalidLevel { level: u32, levels: u32 },
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            UpdateError::UnknownUniform(ref name) => write!(f, "No uniform named '{}'", name),
            UpdateError::UnknownTexture(ref name) => write!(f, "No texture named '{}'", name),
            UpdateError::UnknownTechnique(ref name) => write!(f, "No technique named '{}'", name),
            UpdateError::NotInMemory(ref name) =>
                write!(f, "Texture '{}' is not backed by effect memory", name),
            UpdateError::InvalidLevel { level, levels } =>
                write!(f, "Mipmap level {} is out of range ({} levels)", level, levels),
        }
    }
}

impl Error for UpdateError {}

/// A compiled effect, owning every device object it created.
#[derive(Debug)]
pub struct Effect<R: Resources> {
    pub(crate) textures: Vec<Texture<R>>,
    pub(crate) uniforms: Vec<Uniform>,
    pub(crate) techniques: Vec<Technique<R>>,
    pub(crate) samplers: Vec<R::Sampler>,
    pub(crate) constant_buffers: Vec<Option<R::Buffer>>,
    pub(crate) shader_resources: Vec<Option<R::ShaderResourceView>>,
    pub(crate) rasterizer_state: Option<R::RasterizerState>,
    pub(crate) store: UniformStore,
}

impl<R: Resources> Effect<R> {
    pub(crate) fn new() -> Effect<R> {
        Effect {
            textures: Vec::new(),
            uniforms: Vec::new(),
            techniques: Vec::new(),
            samplers: Vec::new(),
            constant_buffers: Vec::new(),
            shader_resources: Vec::new(),
            rasterizer_state: None,
            store: UniformStore::new(),
        }
    }

    pub fn textures(&self) -> &[Texture<R>] {
        &self.textures
    }

    pub fn texture(&self, name: &str) -> Option<&Texture<R>> {
        self.textures.iter().find(|t| t.name == name)
    }

    pub(crate) fn texture_index(&self, name: &str) -> Option<usize> {
        self.textures.iter().position(|t| t.name == name)
    }

    pub fn uniforms(&self) -> &[Uniform] {
        &self.uniforms
    }

    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.iter().find(|u| u.name == name)
    }

    pub fn techniques(&self) -> &[Technique<R>] {
        &self.techniques
    }

    pub fn technique(&self, name: &str) -> Option<&Technique<R>> {
        self.techniques.iter().find(|t| t.name == name)
    }

    /// Sampler states, indexed by sampler register.
    pub fn samplers(&self) -> &[R::Sampler] {
        &self.samplers
    }

    /// Constant buffers, indexed by buffer register. Slot 0 is the global buffer.
    pub fn constant_buffers(&self) -> &[Option<R::Buffer>] {
        &self.constant_buffers
    }

    /// Effect-wide shader resource table, indexed by texture register.
    pub fn shader_resources(&self) -> &[Option<R::ShaderResourceView>] {
        &self.shader_resources
    }

    pub fn rasterizer_state(&self) -> Option<&R::RasterizerState> {
        self.rasterizer_state.as_ref()
    }

    /// Host copy of a constant buffer, padded to a register boundary.
    pub fn uniform_storage(&self, buffer_index: usize) -> &[u8] {
        self.store.contents(buffer_index)
    }

    /// Whether uniform values changed since the buffers were last uploaded.
    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    fn find_uniform(&self, name: &str) -> Result<&Uniform, UpdateError> {
        self.uniform(name).ok_or_else(|| UpdateError::UnknownUniform(name.to_string()))
    }

    /// Copy raw bytes into a uniform. Input beyond the uniform size is ignored.
    pub fn set_uniform_value(&mut self, name: &str, data: &[u8]) -> Result<(), UpdateError> {
        let (index, offset, size) = {
            let u = self.find_uniform(name)?;
            (u.buffer_index, u.buffer_offset, u.size)
        };
        self.store.write(index, offset, size, data);
        Ok(())
    }

    /// Copy the raw bytes of a uniform into `out`, returning how many were copied.
    pub fn get_uniform_value(&self, name: &str, out: &mut [u8]) -> Result<usize, UpdateError> {
        let u = self.find_uniform(name)?;
        Ok(self.store.read(u.buffer_index, u.buffer_offset, u.size, out))
    }

    /// Set the components of a uniform, converting them to its element class.
    pub fn set_uniform<T: Component>(&mut self, name: &str, values: &[T]) -> Result<(), UpdateError> {
        let data = {
            let u = self.find_uniform(name)?;
            uniform::encode(values, u.class, u.size)
        };
        self.set_uniform_value(name, &data)
    }

    /// Read the components of a uniform, converted from its element class.
    pub fn get_uniform<T: Component>(&self, name: &str, out: &mut [T]) -> Result<usize, UpdateError> {
        let u = self.find_uniform(name)?;
        let mut bytes = vec![0u8; u.size];
        let n = self.store.read(u.buffer_index, u.buffer_offset, u.size, &mut bytes);
        Ok(uniform::decode(&bytes[.. n], u.class, out))
    }

    /// Feed the per-frame values to uniforms annotated with a known `source`.
    pub fn update_sources(&mut self, sources: &FrameSources) {
        let mut writes = Vec::new();
        for u in &self.uniforms {
            let source = match u.annotations.get("source") {
                Some(Value::String(s)) => s.as_str(),
                _ => continue,
            };
            let data = match source {
                "framecount" => uniform::encode(&[sources.frame_count], u.class, u.size),
                "timer" => uniform::encode(&[sources.timer], u.class, u.size),
                "frametime" => uniform::encode(&[sources.frame_time], u.class, u.size),
                "drawcalls" => uniform::encode(&[sources.draw_calls], u.class, u.size),
                _ => continue,
            };
            writes.push((u.buffer_index, u.buffer_offset, u.size, data));
        }
        for (index, offset, size, data) in writes {
            self.store.write(index, offset, size, &data);
        }
    }

    /// Enable or disable a technique.
    pub fn set_technique_enabled(&mut self, name: &str, enabled: bool) -> Result<(), UpdateError> {
        match self.techniques.iter_mut().find(|t| t.name == name) {
            Some(t) => {
                t.enabled = enabled;
                Ok(())
            }
            None => Err(UpdateError::UnknownTechnique(name.to_string())),
        }
    }

    /// Point a texture at new views, updating every table that refers to it.
    ///
    /// A missing sRGB view falls back to the linear one. Dimensions follow the new resource,
    /// or drop to zero when the views are cleared.
    pub fn change_texture_source<D: Device<R>>(&mut self, device: &D, index: usize,
                                               view: Option<R::ShaderResourceView>,
                                               view_srgb: Option<R::ShaderResourceView>) {
        let view_srgb = view_srgb.or_else(|| view.clone());
        let register = {
            let texture = &mut self.textures[index];
            if texture.views[0] == view && texture.views[1] == view_srgb {
                return;
            }
            match view {
                Some(ref v) => {
                    let resource = device.shader_resource_texture(v);
                    let info = device.texture_info(&resource);
                    texture.width = info.width;
                    texture.height = info.height;
                    texture.levels = info.levels;
                    texture.texture = Some(resource);
                }
                None => {
                    texture.width = 0;
                    texture.height = 0;
                    texture.levels = 0;
                    texture.texture = None;
                }
            }
            texture.targets = [None, None];
            texture.views = [view, view_srgb];
            texture.register
        };
        let views = self.textures[index].views.clone();
        for table in Some(&mut self.shader_resources).into_iter()
            .chain(self.techniques.iter_mut()
                       .flat_map(|t| t.passes.iter_mut())
                       .map(|p| &mut p.shader_resources)) {
            for (i, view) in views.iter().enumerate() {
                if let Some(slot) = table.get_mut(register + i) {
                    *slot = view.clone();
                }
            }
        }
    }

    /// Point every depth-sourced texture at a new depth view.
    pub fn update_depth_source<D: Device<R>>(&mut self, device: &D,
                                             view: Option<R::ShaderResourceView>) {
        for index in 0 .. self.textures.len() {
            if self.textures[index].source == TextureSource::DepthStencil {
                self.change_texture_source(device, index, view.clone(), None);
            }
        }
    }

    /// Upload pixels into one level of an effect-owned texture.
    ///
    /// Writing the top level of a texture with a mipmap chain regenerates the chain.
    pub fn update_texture<D: Device<R>>(&self, device: &mut D, name: &str, level: u32, data: &[u8])
                                        -> Result<(), UpdateError> {
        let texture = self.texture(name)
            .ok_or_else(|| UpdateError::UnknownTexture(name.to_string()))?;
        let resource = match (texture.source, texture.texture.as_ref()) {
            (TextureSource::Memory, Some(resource)) => resource,
            _ => return Err(UpdateError::NotInMemory(name.to_string())),
        };
        if level >= texture.levels {
            return Err(UpdateError::InvalidLevel { level, levels: texture.levels });
        }
        let info = device.texture_info(resource);
        let (_, height) = info.level_dimensions(level);
        device.update_texture(resource, level, data, data.len() / height as usize);
        if level == 0 && texture.levels > 1 {
            if let Some(ref view) = texture.views[0] {
                device.generate_mips(view);
            }
        }
        Ok(())
    }
}
