//! Headless backend implementation to exercise the effect pipeline
//! outside of a Direct3D environment.
//!
//! Objects live in memory. Every context call is recorded as a `Command`, buffer and texture
//! contents are kept so that uploads and copies can be inspected, and failures can be injected
//! per object kind.

extern crate postfx_core;
#[macro_use]
extern crate log;

use std::collections::HashMap;
use std::sync::Arc;

use postfx_core::format::Format;
use postfx_core::shade::{CompileError, CompileFlags, Compiled, Stage};
use postfx_core::state::{BlendDesc, DepthStencilDesc, RasterizerDesc};
use postfx_core::tex::{Bind, SamplerInfo, TextureInfo, ViewDesc};
use postfx_core::{ClearFlags, CreationError, MapError, MappedTexture, Primitive, RenderTargets,
           VertexCount, Viewport, MAX_RENDER_TARGETS};

mod command;

pub use command::{Command, Id};

macro_rules! define_handles {
    ($($name:ident => $info:ty,)*) => {$(
        /// Reference-counted handle. Equality is object identity.
        #[derive(Clone, Debug)]
        pub struct $name {
            id: Id,
            info: Arc<$info>,
        }

        impl $name {
            fn new(id: Id, info: $info) -> Self {
                $name { id, info: Arc::new(info) }
            }
            /// Unique object identifier.
            pub fn id(&self) -> Id {
                self.id
            }
            /// Creation parameters.
            pub fn info(&self) -> &$info {
                &self.info
            }
            /// Number of live references, this one included.
            pub fn ref_count(&self) -> usize {
                Arc::strong_count(&self.info)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }
        impl Eq for $name {}
        impl std::hash::Hash for $name {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.id.hash(state)
            }
        }
    )*}
}

/// A view and the texture it was created on.
#[derive(Clone, Debug)]
pub struct ViewInfo {
    /// Underlying texture.
    pub texture: Texture,
    /// Resolved view description.
    pub desc: ViewDesc,
}

define_handles! {
    Buffer => usize,
    Texture => TextureInfo,
    ShaderResourceView => ViewInfo,
    RenderTargetView => ViewInfo,
    DepthStencilView => ViewInfo,
    Sampler => SamplerInfo,
    VertexShader => Vec<u8>,
    PixelShader => Vec<u8>,
    BlendState => BlendDesc,
    DepthStencilState => DepthStencilDesc,
    RasterizerState => RasterizerDesc,
    StateBlock => (),
}

/// Headless resources.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Resources {}

impl postfx_core::Resources for Resources {
    type Buffer = Buffer;
    type Texture = Texture;
    type ShaderResourceView = ShaderResourceView;
    type RenderTargetView = RenderTargetView;
    type DepthStencilView = DepthStencilView;
    type Sampler = Sampler;
    type VertexShader = VertexShader;
    type PixelShader = PixelShader;
    type BlendState = BlendState;
    type DepthStencilState = DepthStencilState;
    type RasterizerState = RasterizerState;
    type StateBlock = StateBlock;
}

/// Which object kinds fail to create or map.
#[derive(Clone, Debug, Default)]
pub struct Failures {
    pub textures: bool,
    pub views: bool,
    pub samplers: bool,
    pub constant_buffers: bool,
    pub blend_states: bool,
    pub depth_stencil_states: bool,
    pub rasterizer_states: bool,
    pub map: bool,
    /// Compiler output per entry point that fails to compile.
    pub shaders: HashMap<String, String>,
}

/// A shader compilation request.
#[derive(Clone, Debug, PartialEq)]
pub struct CompileRecord {
    pub source: String,
    pub entry: String,
    pub stage: Stage,
    pub flags: CompileFlags,
}

/// Output-merger bindings, the part of the device state the pipeline saves and restores.
#[derive(Clone, Debug, Default)]
struct Bindings {
    targets: Vec<Option<RenderTargetView>>,
    depth_stencil: Option<DepthStencilView>,
    viewports: Vec<Viewport>,
}

const E_FAIL: i32 = 0x8000_4005u32 as i32;

/// Headless device.
#[derive(Debug, Default)]
pub struct Device {
    next_id: Id,
    /// Recorded context calls, oldest first.
    pub commands: Vec<Command>,
    /// Recorded shader compilations, oldest first.
    pub compiled: Vec<CompileRecord>,
    /// Failure injection.
    pub failures: Failures,
    buffers: HashMap<Id, Vec<u8>>,
    pixels: HashMap<Id, Vec<u8>>,
    bindings: Bindings,
    snapshots: HashMap<Id, Bindings>,
}

impl Device {
    /// Create an empty device.
    pub fn new() -> Device {
        Device::default()
    }

    fn allocate(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    /// Create a texture the way a swap chain creates its back buffer.
    pub fn create_back_buffer(&mut self, width: u32, height: u32, format: Format, samples: u32)
                              -> Texture {
        let mut info = TextureInfo::new(width, height, format, Bind::RENDER_TARGET);
        info.samples.count = samples;
        let id = self.allocate();
        Texture::new(id, info)
    }

    /// Current contents of a buffer.
    pub fn buffer_contents(&self, buffer: &Buffer) -> &[u8] {
        self.buffers.get(&buffer.id).map(|v| &v[..]).unwrap_or(&[])
    }

    /// Current contents of the top level of a texture, if anything was written to it.
    pub fn texture_pixels(&self, texture: &Texture) -> Option<&[u8]> {
        self.pixels.get(&texture.id).map(|v| &v[..])
    }

    /// Replace the contents of a texture, as if the host had rendered into it.
    pub fn fill_texture(&mut self, texture: &Texture, data: Vec<u8>) {
        self.pixels.insert(texture.id, data);
    }

    /// Drain the recorded commands.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::replace(&mut self.commands, Vec::new())
    }

    /// Currently bound depth-stencil view.
    pub fn bound_depth_stencil(&self) -> Option<&DepthStencilView> {
        self.bindings.depth_stencil.as_ref()
    }

    fn view(&mut self, texture: &Texture, desc: ViewDesc, needed: Bind) -> Result<ViewInfo, CreationError> {
        if self.failures.views {
            return Err(CreationError::Backend(E_FAIL));
        }
        if !texture.info.bind.contains(needed) {
            return Err(CreationError::NoBindFlag);
        }
        Ok(ViewInfo { texture: texture.clone(), desc })
    }

    fn record(&mut self, command: Command) {
        trace!("{:?}", command);
        self.commands.push(command);
    }
}

fn ids<'a, T: 'a, I: IntoIterator<Item = &'a Option<T>>>(items: I, id: fn(&T) -> Id) -> Vec<Option<Id>> {
    items.into_iter().map(|o| o.as_ref().map(id)).collect()
}

impl postfx_core::Device<Resources> for Device {
    fn create_texture_2d(&mut self, info: &TextureInfo, data: Option<&[u8]>)
                         -> Result<Texture, CreationError> {
        if self.failures.textures {
            return Err(CreationError::Backend(E_FAIL));
        }
        if info.width == 0 || info.height == 0 {
            return Err(CreationError::InvalidDescriptor("texture dimensions must not be zero"));
        }
        let mut info = *info;
        if info.levels == 0 {
            info.levels = 32 - info.width.max(info.height).leading_zeros();
        }
        let id = self.allocate();
        if let Some(data) = data {
            self.pixels.insert(id, data.to_vec());
        }
        Ok(Texture::new(id, info))
    }

    fn create_shader_resource_view(&mut self, texture: &Texture, desc: &ViewDesc)
                                   -> Result<ShaderResourceView, CreationError> {
        let info = self.view(texture, *desc, Bind::SHADER_RESOURCE)?;
        let id = self.allocate();
        Ok(ShaderResourceView::new(id, info))
    }

    fn create_render_target_view(&mut self, texture: &Texture, desc: &ViewDesc)
                                 -> Result<RenderTargetView, CreationError> {
        let info = self.view(texture, *desc, Bind::RENDER_TARGET)?;
        let id = self.allocate();
        Ok(RenderTargetView::new(id, info))
    }

    fn create_depth_stencil_view(&mut self, texture: &Texture, desc: Option<&ViewDesc>)
                                 -> Result<DepthStencilView, CreationError> {
        let desc = desc.cloned()
            .unwrap_or_else(|| ViewDesc::of(&texture.info, texture.info.format));
        let info = self.view(texture, desc, Bind::DEPTH_STENCIL)?;
        let id = self.allocate();
        Ok(DepthStencilView::new(id, info))
    }

    fn create_sampler(&mut self, info: &SamplerInfo) -> Result<Sampler, CreationError> {
        if self.failures.samplers {
            return Err(CreationError::Backend(E_FAIL));
        }
        let id = self.allocate();
        Ok(Sampler::new(id, *info))
    }

    fn create_constant_buffer(&mut self, size: usize, data: &[u8]) -> Result<Buffer, CreationError> {
        if self.failures.constant_buffers {
            return Err(CreationError::Backend(E_FAIL));
        }
        if size == 0 || size % 16 != 0 {
            return Err(CreationError::InvalidDescriptor("constant buffer size must be a multiple of 16"));
        }
        let id = self.allocate();
        let mut contents = data.to_vec();
        contents.resize(size, 0);
        self.buffers.insert(id, contents);
        Ok(Buffer::new(id, size))
    }

    fn create_blend_state(&mut self, desc: &BlendDesc) -> Result<BlendState, CreationError> {
        if self.failures.blend_states {
            return Err(CreationError::Backend(E_FAIL));
        }
        let id = self.allocate();
        Ok(BlendState::new(id, *desc))
    }

    fn create_depth_stencil_state(&mut self, desc: &DepthStencilDesc)
                                  -> Result<DepthStencilState, CreationError> {
        if self.failures.depth_stencil_states {
            return Err(CreationError::Backend(E_FAIL));
        }
        let id = self.allocate();
        Ok(DepthStencilState::new(id, *desc))
    }

    fn create_rasterizer_state(&mut self, desc: &RasterizerDesc)
                               -> Result<RasterizerState, CreationError> {
        if self.failures.rasterizer_states {
            return Err(CreationError::Backend(E_FAIL));
        }
        let id = self.allocate();
        Ok(RasterizerState::new(id, *desc))
    }

    fn compile_shader(&mut self, source: &str, entry: &str, stage: Stage, flags: CompileFlags)
                      -> Result<Compiled, CompileError> {
        self.compiled.push(CompileRecord {
            source: source.to_string(),
            entry: entry.to_string(),
            stage,
            flags,
        });
        match self.failures.shaders.get(entry) {
            Some(log) => Err(CompileError(log.clone())),
            None => Ok(Compiled {
                code: format!("{}:{}", stage.profile(), entry).into_bytes(),
                log: String::new(),
            }),
        }
    }

    fn create_vertex_shader(&mut self, code: &[u8]) -> Result<VertexShader, CreationError> {
        let id = self.allocate();
        Ok(VertexShader::new(id, code.to_vec()))
    }

    fn create_pixel_shader(&mut self, code: &[u8]) -> Result<PixelShader, CreationError> {
        let id = self.allocate();
        Ok(PixelShader::new(id, code.to_vec()))
    }

    fn create_state_block(&mut self) -> Result<StateBlock, CreationError> {
        let id = self.allocate();
        Ok(StateBlock::new(id, ()))
    }

    fn texture_info(&self, texture: &Texture) -> TextureInfo {
        *texture.info
    }

    fn shader_resource_texture(&self, view: &ShaderResourceView) -> Texture {
        view.info.texture.clone()
    }

    fn shader_resource_levels(&self, view: &ShaderResourceView) -> u32 {
        view.info.desc.levels
    }

    fn render_target_texture(&self, view: &RenderTargetView) -> Texture {
        view.info.texture.clone()
    }

    fn depth_stencil_texture(&self, view: &DepthStencilView) -> Texture {
        view.info.texture.clone()
    }

    fn render_targets(&self) -> (RenderTargets<Resources>, Option<DepthStencilView>) {
        let mut targets: RenderTargets<Resources> = self.bindings.targets.iter().cloned().collect();
        targets.resize(MAX_RENDER_TARGETS, None);
        (targets, self.bindings.depth_stencil.clone())
    }

    fn set_primitive(&mut self, primitive: Primitive) {
        self.record(Command::SetPrimitive(primitive));
    }

    fn unbind_vertex_input(&mut self) {
        self.record(Command::UnbindVertexInput);
    }

    fn set_rasterizer_state(&mut self, state: Option<&RasterizerState>) {
        self.record(Command::SetRasterizer(state.map(RasterizerState::id)));
    }

    fn set_samplers(&mut self, stage: Stage, samplers: &[Sampler]) {
        self.record(Command::SetSamplers(stage, samplers.iter().map(Sampler::id).collect()));
    }

    fn set_constant_buffers(&mut self, stage: Stage, buffers: &[Option<Buffer>]) {
        self.record(Command::SetConstantBuffers(stage, ids(buffers, Buffer::id)));
    }

    fn set_shader_resources(&mut self, stage: Stage, views: &[Option<ShaderResourceView>]) {
        self.record(Command::SetShaderResources(stage, ids(views, ShaderResourceView::id)));
    }

    fn set_vertex_shader(&mut self, shader: Option<&VertexShader>) {
        self.record(Command::SetVertexShader(shader.map(VertexShader::id)));
    }

    fn unbind_geometry_shader(&mut self) {
        self.record(Command::UnbindGeometryShader);
    }

    fn set_pixel_shader(&mut self, shader: Option<&PixelShader>) {
        self.record(Command::SetPixelShader(shader.map(PixelShader::id)));
    }

    fn set_blend_state(&mut self, state: Option<&BlendState>, factor: [f32; 4], sample_mask: u32) {
        self.record(Command::SetBlendState(state.map(BlendState::id), factor, sample_mask));
    }

    fn set_depth_stencil_state(&mut self, state: Option<&DepthStencilState>, stencil_ref: u32) {
        self.record(Command::SetDepthStencilState(state.map(DepthStencilState::id), stencil_ref));
    }

    fn set_render_targets(&mut self, targets: &[Option<RenderTargetView>],
                          depth_stencil: Option<&DepthStencilView>) {
        self.record(Command::SetRenderTargets(ids(targets, RenderTargetView::id),
                                              depth_stencil.map(DepthStencilView::id)));
        let mut bound = targets.to_vec();
        bound.truncate(MAX_RENDER_TARGETS);
        self.bindings.targets = bound;
        self.bindings.depth_stencil = depth_stencil.cloned();
    }

    fn set_viewports(&mut self, viewports: &[Viewport]) {
        self.record(Command::SetViewports(viewports.to_vec()));
        self.bindings.viewports = viewports.to_vec();
    }

    fn clear_render_target(&mut self, view: &RenderTargetView, color: [f32; 4]) {
        self.record(Command::ClearRenderTarget(view.id, color));
    }

    fn clear_depth_stencil(&mut self, view: &DepthStencilView, flags: ClearFlags, depth: f32, stencil: u8) {
        self.record(Command::ClearDepthStencil(view.id, flags, depth, stencil));
    }

    fn draw(&mut self, count: VertexCount, start: VertexCount) {
        self.record(Command::Draw(count, start));
    }

    fn copy_resource(&mut self, dst: &Texture, src: &Texture) {
        self.record(Command::CopyResource { dst: dst.id, src: src.id });
        if let Some(data) = self.pixels.get(&src.id).cloned() {
            self.pixels.insert(dst.id, data);
        }
    }

    fn resolve_subresource(&mut self, dst: &Texture, _dst_level: u32, src: &Texture,
                           _src_level: u32, format: Format) {
        self.record(Command::ResolveSubresource { dst: dst.id, src: src.id, format });
        if let Some(data) = self.pixels.get(&src.id).cloned() {
            self.pixels.insert(dst.id, data);
        }
    }

    fn generate_mips(&mut self, view: &ShaderResourceView) {
        self.record(Command::GenerateMips(view.id));
    }

    fn update_buffer(&mut self, buffer: &Buffer, data: &[u8]) -> Result<(), MapError> {
        if self.failures.map {
            return Err(MapError::Backend(E_FAIL));
        }
        let capacity = *buffer.info;
        if data.len() > capacity {
            return Err(MapError::OutOfBounds { size: data.len(), capacity });
        }
        self.record(Command::UpdateBuffer(buffer.id, data.to_vec()));
        let contents = self.buffers.entry(buffer.id).or_insert_with(Vec::new);
        contents.clear();
        contents.extend_from_slice(data);
        contents.resize(capacity, 0);
        Ok(())
    }

    fn update_texture(&mut self, texture: &Texture, level: u32, data: &[u8], _row_pitch: usize) {
        self.record(Command::UpdateTexture(texture.id, level, data.len()));
        if level == 0 {
            self.pixels.insert(texture.id, data.to_vec());
        }
    }

    fn read_texture(&mut self, texture: &Texture) -> Result<MappedTexture, MapError> {
        if self.failures.map {
            return Err(MapError::Backend(E_FAIL));
        }
        self.record(Command::ReadTexture(texture.id));
        let row_pitch = texture.info.width as usize * 4;
        let size = row_pitch * texture.info.height as usize;
        let mut data = self.pixels.get(&texture.id).cloned().unwrap_or_default();
        data.resize(size, 0);
        Ok(MappedTexture { data, row_pitch })
    }

    fn capture_state(&mut self, block: &StateBlock) {
        self.record(Command::CaptureState(block.id));
        self.snapshots.insert(block.id, self.bindings.clone());
    }

    fn apply_state(&mut self, block: &StateBlock) {
        self.record(Command::ApplyState(block.id));
        if let Some(bindings) = self.snapshots.get(&block.id) {
            self.bindings = bindings.clone();
        }
    }

    fn release_state(&mut self, block: &StateBlock) {
        self.record(Command::ReleaseState(block.id));
        self.snapshots.remove(&block.id);
    }
}
