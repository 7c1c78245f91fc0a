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

//! Effect compiler.
//!
//! Walks a syntax tree once, creating every device object the effect needs and printing the
//! HLSL every pass is compiled from. Problems are collected as diagnostics, one per line and
//! prefixed with the source location. Any error makes the whole compilation fail, warnings are
//! handed back with the effect.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

use postfx_core::format::{Format, SampleDesc};
use postfx_core::shade::{CompileError, Stage};
use postfx_core::state::{BlendChannel, BlendDesc, DepthStencilDesc, RasterizerDesc, StencilFace};
use postfx_core::tex::{Bind, FilterMethod, SamplerInfo, TextureInfo, Usage, ViewDesc, WrapMode};
use postfx_core::tree::{self, BaseClass, ExpressionKind, Function, Location, Qualifiers,
                        TextureAddressMode, TextureFilter, TextureFormat, Tree, Variable};
use postfx_core::{Device, Resources, Viewport, MAX_RESOURCE_VIEWS, MAX_SAMPLERS};

use crate::config::Config;
use crate::effect::{annotation_flag, collect_annotations, Effect, Pass, Surfaces, Technique,
                    Texture, TextureSource, Uniform};
use crate::uniform::{self, UniformClass};

pub mod emit;

use self::emit::{Emitter, PREAMBLE};

/// Compilation failed. Holds every diagnostic, warnings included.
#[derive(Clone, Debug, PartialEq)]
pub struct Error {
    pub diagnostics: String,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Effect compilation failed:\n{}", self.diagnostics)
    }
}

impl StdError for Error {}

/// A successfully compiled effect.
#[derive(Debug)]
pub struct Output<R: Resources> {
    pub effect: Effect<R>,
    /// Warnings, possibly empty.
    pub warnings: String,
}

/// Storage format of an effect texture format.
pub fn texture_format(format: TextureFormat) -> Format {
    match format {
        TextureFormat::Unknown => Format::Unknown,
        TextureFormat::R8 => Format::R8_UNORM,
        TextureFormat::R32F => Format::R32_FLOAT,
        TextureFormat::RG8 => Format::R8G8_UNORM,
        TextureFormat::RGBA8 => Format::R8G8B8A8_TYPELESS,
        TextureFormat::RGBA16 => Format::R16G16B16A16_UNORM,
        TextureFormat::RGBA16F => Format::R16G16B16A16_FLOAT,
        TextureFormat::RGBA32F => Format::R32G32B32A32_FLOAT,
        TextureFormat::DXT1 => Format::BC1_TYPELESS,
        TextureFormat::DXT3 => Format::BC2_TYPELESS,
        TextureFormat::DXT5 => Format::BC3_TYPELESS,
        TextureFormat::LATC1 => Format::BC4_UNORM,
        TextureFormat::LATC2 => Format::BC5_UNORM,
    }
}

fn is_compressed(format: TextureFormat) -> bool {
    match format {
        TextureFormat::DXT1 | TextureFormat::DXT3 | TextureFormat::DXT5 |
        TextureFormat::LATC1 | TextureFormat::LATC2 => true,
        _ => false,
    }
}

fn filter_axis(filter: TextureFilter) -> Option<bool> {
    match filter {
        TextureFilter::Point => Some(false),
        TextureFilter::Linear => Some(true),
        TextureFilter::Anisotropic => None,
    }
}

fn wrap_mode(mode: TextureAddressMode) -> WrapMode {
    match mode {
        TextureAddressMode::Wrap => WrapMode::Tile,
        TextureAddressMode::Mirror => WrapMode::Mirror,
        TextureAddressMode::Clamp => WrapMode::Clamp,
        TextureAddressMode::Border => WrapMode::Border,
    }
}

fn uniform_class(class: BaseClass) -> Option<UniformClass> {
    match class {
        BaseClass::Bool => Some(UniformClass::Bool),
        BaseClass::Int => Some(UniformClass::Int),
        BaseClass::Uint => Some(UniformClass::Uint),
        BaseClass::Float => Some(UniformClass::Float),
        _ => None,
    }
}

fn blend_desc(states: &tree::PassStates) -> BlendDesc {
    BlendDesc {
        enable: states.blend_enable,
        color: BlendChannel {
            equation: states.blend_op,
            source: states.src_blend,
            destination: states.dest_blend,
        },
        alpha: BlendChannel {
            equation: states.blend_op_alpha,
            source: states.src_blend,
            destination: states.dest_blend,
        },
        write_mask: states.render_target_write_mask,
    }
}

fn depth_stencil_desc(states: &tree::PassStates) -> DepthStencilDesc {
    DepthStencilDesc {
        depth_enable: states.depth_enable,
        depth_write: states.depth_write_mask,
        depth_fun: states.depth_func,
        stencil_enable: states.stencil_enable,
        stencil_read_mask: states.stencil_read_mask,
        stencil_write_mask: states.stencil_write_mask,
        stencil: StencilFace {
            fun: states.stencil_func,
            op_fail: states.stencil_op_fail,
            op_depth_fail: states.stencil_op_depth_fail,
            op_pass: states.stencil_op_pass,
        },
    }
}

/// Build an effect from a syntax tree.
///
/// Textures with a `COLOR` or `DEPTH` semantic are bound to the views in `surfaces`, and passes
/// without render targets of their own draw to the back buffer.
pub fn compile<R, D>(device: &mut D, tree: &Tree, surfaces: &Surfaces<R>, config: &Config)
                     -> Result<Output<R>, Error>
where
    R: Resources,
    D: Device<R>,
{
    let mut compiler = Compiler {
        device,
        surfaces,
        config,
        effect: Effect::new(),
        emitter: Emitter::new(),
        source: String::new(),
        globals: String::new(),
        diagnostics: String::new(),
        fatal: false,
        sampler_states: HashMap::new(),
        vertex_shaders: HashMap::new(),
        pixel_shaders: HashMap::new(),
    };
    compiler.effect.constant_buffers.push(None);

    for node in &tree.structs {
        compiler.emitter.structure(&mut compiler.source, node);
    }
    for node in &tree.variables {
        compiler.global_variable(node);
    }
    for node in &tree.functions {
        compiler.emitter.function(&mut compiler.source, node);
    }
    for node in &tree.techniques {
        compiler.technique(node);
    }
    compiler.finish()
}

struct Compiler<'a, R: Resources, D: 'a + Device<R>> {
    device: &'a mut D,
    surfaces: &'a Surfaces<R>,
    config: &'a Config,
    effect: Effect<R>,
    emitter: Emitter,
    /// Shader body, everything but the preamble and the global constant buffer.
    source: String,
    /// Members of the global constant buffer.
    globals: String,
    diagnostics: String,
    fatal: bool,
    sampler_states: HashMap<SamplerInfo, usize>,
    vertex_shaders: HashMap<String, Option<R::VertexShader>>,
    pixel_shaders: HashMap<String, Option<R::PixelShader>>,
}

impl<'a, R: Resources, D: Device<R>> Compiler<'a, R, D> {
    fn report(&mut self, location: Option<&Location>, level: &str, message: &str) {
        if let Some(location) = location {
            self.diagnostics.push_str(&format!("{}: ", location));
        }
        self.diagnostics.push_str(level);
        self.diagnostics.push_str(": ");
        self.diagnostics.push_str(message);
        self.diagnostics.push('\n');
    }

    fn error(&mut self, location: Option<&Location>, message: &str) {
        self.fatal = true;
        self.report(location, "error", message);
    }

    fn warning(&mut self, location: Option<&Location>, message: &str) {
        self.report(location, "warning", message);
    }

    fn global_variable(&mut self, node: &Variable) {
        if node.ty.is_texture() {
            self.texture(node);
        } else if node.ty.is_sampler() {
            self.sampler(node);
        } else if node.ty.is_struct() && node.ty.has(Qualifiers::UNIFORM) {
            self.uniform_block(node);
        } else if node.ty.has(Qualifiers::UNIFORM) {
            self.uniform(node);
        } else {
            self.emitter.variable(&mut self.source, node);
        }
    }

    fn texture(&mut self, node: &Variable) {
        let location = Some(&node.location);
        let properties = &node.properties;
        let register = self.effect.shader_resources.len();
        if register + 2 > MAX_RESOURCE_VIEWS {
            self.error(location, &format!("texture '{}' exceeds the {} available shader resource slots.",
                                          node.name, MAX_RESOURCE_VIEWS));
            return;
        }
        let mut levels = properties.mip_levels;
        if levels == 0 {
            self.warning(location, "a texture cannot have 0 miplevels, changed it to 1.");
            levels = 1;
        }

        self.source.push_str(&format!("Texture2D {0} : register(t{1}), __{0}SRGB : register(t{2});\n",
                                      node.name, register, register + 1));
        self.effect.shader_resources.push(None);
        self.effect.shader_resources.push(None);

        let mut texture = Texture {
            name: node.name.clone(),
            width: properties.width,
            height: properties.height,
            levels,
            format: properties.format,
            source: TextureSource::Memory,
            annotations: collect_annotations(&node.annotations),
            register,
            texture: None,
            views: [None, None],
            targets: [None, None],
        };

        let source = match node.semantic.to_ascii_uppercase().as_str() {
            "COLOR" | "SV_TARGET" => TextureSource::BackBuffer,
            "DEPTH" | "SV_DEPTH" => TextureSource::DepthStencil,
            _ => TextureSource::Memory,
        };
        if source != TextureSource::Memory {
            if properties.width != 1 || properties.height != 1 || levels != 1 ||
               properties.format != TextureFormat::RGBA8 {
                self.warning(location, "texture property on backbuffer textures are ignored.");
            }
            texture.source = source;
            texture.width = 0;
            texture.height = 0;
            texture.levels = 0;
            let (view, view_srgb) = match source {
                TextureSource::BackBuffer => (self.surfaces.back_buffer_resources[0].clone(),
                                              self.surfaces.back_buffer_resources[1].clone()),
                _ => (self.surfaces.depth_resource.clone(), None),
            };
            let index = self.effect.textures.len();
            self.effect.textures.push(texture);
            self.effect.change_texture_source(&*self.device, index, view, view_srgb);
            return;
        }

        let format = texture_format(properties.format);
        let compressed = is_compressed(properties.format);
        let info = TextureInfo {
            width: properties.width,
            height: properties.height,
            levels,
            format,
            samples: SampleDesc::single(),
            usage: Usage::GpuOnly,
            bind: if compressed { Bind::SHADER_RESOURCE } else { Bind::SHADER_RESOURCE | Bind::RENDER_TARGET },
            generate_mips: !compressed,
        };
        let resource = match self.device.create_texture_2d(&info, None) {
            Ok(resource) => resource,
            Err(e) => {
                self.error(location, &format!("'CreateTexture2D' failed with {}!", e));
                return;
            }
        };
        let info = self.device.texture_info(&resource);
        let linear = match self.device.create_shader_resource_view(&resource, &ViewDesc::of(&info, format.linear())) {
            Ok(view) => view,
            Err(e) => {
                self.error(location, &format!("'CreateShaderResourceView' failed with {}!", e));
                return;
            }
        };
        let srgb = if format.srgb() != format.linear() {
            match self.device.create_shader_resource_view(&resource, &ViewDesc::of(&info, format.srgb())) {
                Ok(view) => view,
                Err(e) => {
                    self.error(location, &format!("'CreateShaderResourceView' failed with {}!", e));
                    return;
                }
            }
        } else {
            linear.clone()
        };
        debug!("Created texture '{}' ({}x{}, {} levels, {:?})", node.name, info.width, info.height,
               info.levels, format);

        texture.levels = info.levels;
        texture.texture = Some(resource);
        self.effect.shader_resources[register] = Some(linear.clone());
        self.effect.shader_resources[register + 1] = Some(srgb.clone());
        texture.views = [Some(linear), Some(srgb)];
        self.effect.textures.push(texture);
    }

    fn sampler(&mut self, node: &Variable) {
        let location = Some(&node.location);
        let properties = &node.properties;
        let texture_name = match properties.texture {
            Some(ref texture) => texture.name.clone(),
            None => {
                self.error(location, &format!("sampler '{}' is missing required 'Texture' required.", node.name));
                return;
            }
        };
        let texture = match self.effect.texture_index(&texture_name) {
            Some(index) => index,
            None => {
                self.error(location, &format!("texture '{}' for sampler '{}' is missing due to previous error.",
                                              texture_name, node.name));
                return;
            }
        };

        let mut info = SamplerInfo::new(
            FilterMethod::from_axes(filter_axis(properties.min_filter),
                                    filter_axis(properties.mag_filter),
                                    filter_axis(properties.mip_filter)),
            wrap_mode(properties.address_u),
        );
        info.wrap_mode = (wrap_mode(properties.address_u),
                          wrap_mode(properties.address_v),
                          wrap_mode(properties.address_w));
        info.lod_bias = properties.mip_lod_bias;
        info.lod_range = (properties.min_lod, properties.max_lod);
        let info = info.with_anisotropy(properties.max_anisotropy);

        let register = match self.sampler_states.get(&info) {
            Some(&register) => register,
            None => {
                let register = self.effect.samplers.len();
                if register >= MAX_SAMPLERS {
                    self.error(location, &format!("sampler '{}' exceeds the {} available sampler states.",
                                                  node.name, MAX_SAMPLERS));
                    return;
                }
                match self.device.create_sampler(&info) {
                    Ok(sampler) => self.effect.samplers.push(sampler),
                    Err(e) => {
                        self.error(location, &format!("'CreateSamplerState' failed with {}!", e));
                        return;
                    }
                }
                self.sampler_states.insert(info, register);
                self.source.push_str(&format!("SamplerState __SamplerState{0} : register(s{0});\n", register));
                register
            }
        };

        let srgb = properties.srgb_texture && self.effect.textures[texture].views[1].is_some();
        let bound = if srgb { format!("__{}SRGB", texture_name) } else { texture_name };
        self.source.push_str(&format!("static const __sampler2D {} = {{ {}, __SamplerState{} }};\n",
                                      node.name, bound, register));
    }

    /// Size and initial contents of a constant buffer member, or `None` if it has no storage.
    fn storage(&mut self, node: &Variable) -> Option<(UniformClass, usize, Option<Vec<u8>>)> {
        let class = match uniform_class(node.ty.class) {
            Some(class) => class,
            None => {
                self.error(Some(&node.location),
                           &format!("uniform '{}' cannot be stored in a constant buffer.", node.name));
                return None;
            }
        };
        let elements = node.ty.array_length.max(0) as u32;
        let size = uniform::value_size(node.ty.rows, node.ty.cols, elements);
        let initial = match node.initializer {
            Some(tree::Expression { kind: ExpressionKind::Literal(ref value), .. }) => Some(value.to_bytes(size)),
            _ => None,
        };
        Some((class, size, initial))
    }

    fn uniform(&mut self, node: &Variable) {
        let (class, size, initial) = match self.storage(node) {
            Some(storage) => storage,
            None => return,
        };
        self.emitter.constant(&mut self.globals, node, None);
        let offset = self.effect.store.place(0, size, initial.as_ref().map(|v| &v[..]));
        self.effect.uniforms.push(Uniform {
            name: node.name.clone(),
            class,
            rows: node.ty.rows,
            cols: node.ty.cols,
            elements: node.ty.array_length.max(0) as u32,
            fields: 0,
            size,
            buffer_index: 0,
            buffer_offset: offset,
            annotations: collect_annotations(&node.annotations),
        });
    }

    fn uniform_block(&mut self, node: &Variable) {
        let location = Some(&node.location);
        let definition = match node.ty.definition {
            Some(ref definition) => definition.clone(),
            None => return,
        };
        let index = self.effect.store.add_slot();
        self.source.push_str(&format!("cbuffer {} : register(b{})\n{{\n", node.name, index));
        for field in &definition.fields {
            self.emitter.constant(&mut self.source, field, Some(&node.name));
            let (class, size, initial) = match self.storage(field) {
                Some(storage) => storage,
                None => continue,
            };
            let offset = self.effect.store.place(index, size, initial.as_ref().map(|v| &v[..]));
            self.effect.uniforms.push(Uniform {
                name: format!("{}.{}", node.name, field.name),
                class,
                rows: field.ty.rows,
                cols: field.ty.cols,
                elements: field.ty.array_length.max(0) as u32,
                fields: 0,
                size,
                buffer_index: index,
                buffer_offset: offset,
                annotations: collect_annotations(&field.annotations),
            });
        }
        self.source.push_str("};\n");

        let size = self.effect.store.used(index);
        self.effect.uniforms.push(Uniform {
            name: node.name.clone(),
            class: UniformClass::Struct,
            rows: 0,
            cols: 0,
            elements: 0,
            fields: definition.fields.len() as u32,
            size,
            buffer_index: index,
            buffer_offset: 0,
            annotations: collect_annotations(&node.annotations),
        });

        let buffer = if size == 0 {
            None
        } else {
            let contents = self.effect.store.contents(index).to_vec();
            match self.device.create_constant_buffer(contents.len(), &contents) {
                Ok(buffer) => Some(buffer),
                Err(e) => {
                    self.error(location, &format!("'CreateBuffer' failed with {}!", e));
                    None
                }
            }
        };
        self.effect.constant_buffers.push(buffer);
    }

    fn shader_source(&self) -> String {
        let mut source = String::from(PREAMBLE);
        if !self.globals.is_empty() {
            source.push_str("cbuffer __GLOBAL__ : register(b0)\n{\n");
            source.push_str(&self.globals);
            source.push_str("};\n");
        }
        source.push_str(&self.source);
        source
    }

    fn compile_shader(&mut self, function: &Function, stage: Stage) -> Option<Vec<u8>> {
        let source = self.shader_source();
        let flags = self.config.compile_flags();
        match self.device.compile_shader(&source, &function.name, stage, flags) {
            Ok(compiled) => {
                if !compiled.log.is_empty() {
                    self.diagnostics.push_str(&compiled.log);
                    if !compiled.log.ends_with('\n') {
                        self.diagnostics.push('\n');
                    }
                }
                Some(compiled.code)
            }
            Err(CompileError(log)) => {
                self.fatal = true;
                self.diagnostics.push_str(&log);
                if !log.ends_with('\n') {
                    self.diagnostics.push('\n');
                }
                None
            }
        }
    }

    fn vertex_shader(&mut self, function: &Function) -> Option<R::VertexShader> {
        if let Some(shader) = self.vertex_shaders.get(&function.name) {
            return shader.clone();
        }
        let shader = match self.compile_shader(function, Stage::Vertex) {
            Some(code) => match self.device.create_vertex_shader(&code) {
                Ok(shader) => Some(shader),
                Err(e) => {
                    self.error(Some(&function.location), &format!("'CreateVertexShader' failed with {}!", e));
                    None
                }
            },
            None => None,
        };
        self.vertex_shaders.insert(function.name.clone(), shader.clone());
        shader
    }

    fn pixel_shader(&mut self, function: &Function) -> Option<R::PixelShader> {
        if let Some(shader) = self.pixel_shaders.get(&function.name) {
            return shader.clone();
        }
        let shader = match self.compile_shader(function, Stage::Pixel) {
            Some(code) => match self.device.create_pixel_shader(&code) {
                Ok(shader) => Some(shader),
                Err(e) => {
                    self.error(Some(&function.location), &format!("'CreatePixelShader' failed with {}!", e));
                    None
                }
            },
            None => None,
        };
        self.pixel_shaders.insert(function.name.clone(), shader.clone());
        shader
    }

    fn technique(&mut self, node: &tree::Technique) {
        let annotations = collect_annotations(&node.annotations);
        let enabled = annotation_flag(&annotations, "enabled").unwrap_or(true);
        let mut passes = Vec::with_capacity(node.passes.len());
        for pass in &node.passes {
            if let Some(pass) = self.pass(pass) {
                passes.push(pass);
            }
        }
        self.effect.techniques.push(Technique {
            name: node.name.clone(),
            annotations,
            enabled,
            passes,
        });
    }

    /// Render target view of an effect texture, created on first use.
    fn render_target_view(&mut self, location: &Location, index: usize, srgb: usize)
                          -> Option<R::RenderTargetView> {
        if let Some(ref view) = self.effect.textures[index].targets[srgb] {
            return Some(view.clone());
        }
        let resource = match self.effect.textures[index].texture {
            Some(ref resource) => resource.clone(),
            None => {
                let name = self.effect.textures[index].name.clone();
                self.error(Some(location), &format!("texture '{}' cannot be used as a render target.", name));
                return None;
            }
        };
        let info = self.device.texture_info(&resource);
        let format = if srgb == 1 { info.format.srgb() } else { info.format.linear() };
        match self.device.create_render_target_view(&resource, &ViewDesc::of(&info, format)) {
            Ok(view) => {
                self.effect.textures[index].targets[srgb] = Some(view.clone());
                Some(view)
            }
            Err(e) => {
                self.error(Some(location), &format!("'CreateRenderTargetView' failed with {}!", e));
                None
            }
        }
    }

    fn pass(&mut self, node: &tree::Pass) -> Option<Pass<R>> {
        let location = &node.location;
        let states = &node.states;
        let srgb = states.srgb_write_enable as usize;
        let mut pass = Pass {
            name: node.name.clone(),
            annotations: collect_annotations(&node.annotations),
            vertex_shader: None,
            pixel_shader: None,
            blend_state: None,
            depth_stencil_state: None,
            stencil_ref: states.stencil_ref,
            viewport: Viewport::default(),
            render_targets: Default::default(),
            render_target_resources: Default::default(),
            shader_resources: self.effect.shader_resources.clone(),
        };

        if let Some(ref function) = states.vertex_shader {
            pass.vertex_shader = self.vertex_shader(function);
        }
        if let Some(ref function) = states.pixel_shader {
            pass.pixel_shader = self.pixel_shader(function);
        }

        pass.render_targets[0] = self.surfaces.back_buffer_targets[srgb].clone();
        pass.render_target_resources[0] = self.surfaces.back_buffer_resources[srgb].clone();

        for (slot, target) in states.render_targets.iter().enumerate() {
            let variable = match *target {
                Some(ref variable) => variable,
                None => continue,
            };
            let index = match self.effect.texture_index(&variable.name) {
                Some(index) => index,
                None => {
                    self.error(Some(location), &format!("texture '{}' for render target {} is missing due to previous error.",
                                                        variable.name, slot));
                    return None;
                }
            };
            let (width, height) = {
                let texture = &self.effect.textures[index];
                (texture.width, texture.height)
            };
            if pass.viewport.width != 0 && pass.viewport.height != 0 &&
               (width != pass.viewport.width || height != pass.viewport.height) {
                self.error(Some(location), "cannot use multiple rendertargets with different sized textures.");
                return None;
            }
            pass.viewport = Viewport::full(width, height);
            pass.render_targets[slot] = Some(self.render_target_view(location, index, srgb)?);
            pass.render_target_resources[slot] = self.effect.textures[index].views[srgb].clone();
        }
        if pass.viewport.width == 0 || pass.viewport.height == 0 {
            pass.viewport = Viewport::full(self.surfaces.width, self.surfaces.height);
        }

        match self.device.create_depth_stencil_state(&depth_stencil_desc(states)) {
            Ok(state) => pass.depth_stencil_state = Some(state),
            Err(e) => self.warning(Some(location), &format!("'CreateDepthStencilState' failed with {}!", e)),
        }
        match self.device.create_blend_state(&blend_desc(states)) {
            Ok(state) => pass.blend_state = Some(state),
            Err(e) => self.warning(Some(location), &format!("'CreateBlendState' failed with {}!", e)),
        }

        let targets = pass.render_targets
            .iter()
            .filter_map(|view| view.as_ref())
            .map(|view| self.device.render_target_texture(view))
            .collect::<Vec<_>>();
        for slot in pass.shader_resources.iter_mut() {
            let aliased = match *slot {
                Some(ref view) => targets.contains(&self.device.shader_resource_texture(view)),
                None => false,
            };
            if aliased {
                *slot = None;
            }
        }

        Some(pass)
    }

    fn finish(mut self) -> Result<Output<R>, Error> {
        let size = self.effect.store.used(0);
        if size > 0 {
            let contents = self.effect.store.contents(0).to_vec();
            match self.device.create_constant_buffer(contents.len(), &contents) {
                Ok(buffer) => self.effect.constant_buffers[0] = Some(buffer),
                Err(e) => self.error(None, &format!("'CreateBuffer' failed with {}!", e)),
            }
        }
        match self.device.create_rasterizer_state(&RasterizerDesc::default()) {
            Ok(state) => self.effect.rasterizer_state = Some(state),
            Err(e) => self.error(None, &format!("'CreateRasterizerState' failed with {}!", e)),
        }

        if self.fatal {
            Err(Error { diagnostics: self.diagnostics })
        } else {
            debug!("Compiled {} textures, {} uniforms and {} techniques",
                   self.effect.textures.len(), self.effect.uniforms.len(), self.effect.techniques.len());
            Ok(Output { effect: self.effect, warnings: self.diagnostics })
        }
    }
}
