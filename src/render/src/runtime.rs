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

//! The runtime: what the host's hooks talk to.
//!
//! The hooks report swap-chain creation and reset, presents, draw calls and the lifetime of
//! depth-stencil views. Some of them hand objects back: the runtime substitutes its depth
//! replacement and multisampled back-buffer stand-in for the host's own objects.

use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use postfx_core::format::Format;
use postfx_core::tex::{Bind, TextureInfo};
use postfx_core::tree::Tree;
use postfx_core::{CreationError, Device, MapError, Resources, VertexCount, Viewport};

use crate::backbuffer::{BackBuffer, SwapChainDesc};
use crate::compiler;
use crate::config::Config;
use crate::depth::{DepthReplacement, DepthSourceDetector, Selection, NETWORK_TRAFFIC};
use crate::effect::{Effect, FrameSources, Surfaces, UpdateError};
use crate::technique::Frame;

/// Errors of the runtime operations.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// There is no swap chain.
    Lost,
    /// There is no effect loaded.
    NoEffect,
    Creation(CreationError),
    Compile(compiler::Error),
    Update(UpdateError),
    Map(MapError),
    /// Screenshots of this back-buffer format are not supported.
    UnsupportedFormat(Format),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Lost => write!(f, "The swap chain is not available"),
            Error::NoEffect => write!(f, "No effect is loaded"),
            Error::Creation(ref e) => write!(f, "Device object creation failed: {}", e),
            Error::Compile(ref e) => write!(f, "{}", e),
            Error::Update(ref e) => write!(f, "{}", e),
            Error::Map(ref e) => write!(f, "{}", e),
            Error::UnsupportedFormat(format) => write!(f, "Unsupported back buffer format {:?}", format),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Error::Creation(ref e) => Some(e),
            Error::Compile(ref e) => Some(e),
            Error::Update(ref e) => Some(e),
            Error::Map(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<CreationError> for Error {
    fn from(e: CreationError) -> Error {
        Error::Creation(e)
    }
}

impl From<compiler::Error> for Error {
    fn from(e: compiler::Error) -> Error {
        Error::Compile(e)
    }
}

impl From<UpdateError> for Error {
    fn from(e: UpdateError) -> Error {
        Error::Update(e)
    }
}

impl From<MapError> for Error {
    fn from(e: MapError) -> Error {
        Error::Map(e)
    }
}

/// Draw statistics.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct FrameStats {
    /// Frames presented so far.
    pub frame_count: u64,
    /// Draw calls of the current frame.
    pub draw_calls: u32,
    /// Vertices of the current frame.
    pub vertices: u32,
    pub last_draw_calls: u32,
    pub last_vertices: u32,
}

impl FrameStats {
    pub fn on_draw(&mut self, vertices: VertexCount) {
        self.draw_calls = self.draw_calls.saturating_add(1);
        self.vertices = self.vertices.saturating_add(vertices);
    }

    pub fn end_frame(&mut self) {
        self.last_draw_calls = self.draw_calls;
        self.last_vertices = self.vertices;
        self.draw_calls = 0;
        self.vertices = 0;
        self.frame_count += 1;
    }
}

fn millis(duration: Duration) -> f32 {
    duration.as_secs() as f32 * 1000.0 + duration.subsec_nanos() as f32 / 1_000_000.0
}

/// Post-processing runtime of one swap chain.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Runtime<R: Resources, D: Device<R>> {
    #[derivative(Debug = "ignore")]
    device: D,
    config: Config,
    lost: bool,
    state_block: Option<R::StateBlock>,
    back_buffer: Option<BackBuffer<R>>,
    default_depth_stencil: Option<R::DepthStencilView>,
    depth_replacement: Option<DepthReplacement<R>>,
    detector: DepthSourceDetector<R>,
    effect: Option<Effect<R>>,
    tree: Option<Rc<Tree>>,
    stats: FrameStats,
    traffic: &'static AtomicUsize,
    started: Instant,
    last_present: Instant,
    frame_time: Duration,
}

impl<R: Resources, D: Device<R>> Runtime<R, D> {
    /// Create a runtime for a device. It stays lost until `on_create`.
    pub fn new(mut device: D, config: Config) -> Self {
        let state_block = match device.create_state_block() {
            Ok(block) => Some(block),
            Err(e) => {
                error!("Failed to create the state block, host state will not be restored: {}", e);
                None
            }
        };
        let now = Instant::now();
        Runtime {
            device,
            config,
            lost: true,
            state_block,
            back_buffer: None,
            default_depth_stencil: None,
            depth_replacement: None,
            detector: DepthSourceDetector::new(),
            effect: None,
            tree: None,
            stats: FrameStats::default(),
            traffic: &NETWORK_TRAFFIC,
            started: now,
            last_present: now,
            frame_time: Duration::from_secs(0),
        }
    }

    /// Read network traffic from another counter than the process-wide one.
    pub fn with_traffic_counter(mut self, counter: &'static AtomicUsize) -> Self {
        self.traffic = counter;
        self
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn effect(&self) -> Option<&Effect<R>> {
        self.effect.as_ref()
    }

    /// The loaded effect, for setting uniforms.
    pub fn effect_mut(&mut self) -> Option<&mut Effect<R>> {
        self.effect.as_mut()
    }

    pub fn back_buffer(&self) -> Option<&BackBuffer<R>> {
        self.back_buffer.as_ref()
    }

    /// Depth-stencil view bound while drawing full-screen passes.
    pub fn default_depth_stencil(&self) -> Option<&R::DepthStencilView> {
        self.default_depth_stencil.as_ref()
    }

    pub fn depth_replacement(&self) -> Option<&DepthReplacement<R>> {
        self.depth_replacement.as_ref()
    }

    pub fn detector(&self) -> &DepthSourceDetector<R> {
        &self.detector
    }

    /// Set up for a new swap chain and rebuild the last effect for it.
    pub fn on_create(&mut self, desc: SwapChainDesc, back_buffer: R::Texture) -> Result<(), Error> {
        if !self.lost {
            self.on_reset();
        }
        if self.state_block.is_none() {
            self.state_block = self.device.create_state_block().ok();
        }

        let back_buffer = BackBuffer::new(&mut self.device, &desc, back_buffer)?;
        let depth_info = TextureInfo::new(desc.width, desc.height, Format::D24_UNORM_S8_UINT,
                                          Bind::DEPTH_STENCIL);
        let depth_texture = self.device.create_texture_2d(&depth_info, None)?;
        let depth_stencil = self.device.create_depth_stencil_view(&depth_texture, None)?;

        self.back_buffer = Some(back_buffer);
        self.default_depth_stencil = Some(depth_stencil);
        self.lost = false;
        self.last_present = Instant::now();
        info!("Swap chain is {}x{} {:?} with {} samples", desc.width, desc.height, desc.format,
              desc.samples.count);

        if let Some(tree) = self.tree.clone() {
            if let Err(e) = self.update_effect(tree) {
                error!("Failed to rebuild the effect: {}", e);
            }
        }
        Ok(())
    }

    /// The swap chain was resized. Everything is rebuilt at the new size.
    pub fn on_resize(&mut self, desc: SwapChainDesc, back_buffer: R::Texture) -> Result<(), Error> {
        self.on_reset();
        self.on_create(desc, back_buffer)
    }

    /// Release everything tied to the swap chain.
    pub fn on_reset(&mut self) {
        if self.lost {
            return;
        }
        self.effect = None;
        self.depth_replacement = None;
        self.back_buffer = None;
        if let Some(ref block) = self.state_block {
            self.device.release_state(block);
        }
        self.default_depth_stencil = None;
        self.lost = true;
        info!("Released swap chain resources");
    }

    /// Post-process the frame about to be presented.
    pub fn on_present(&mut self) {
        if self.lost {
            trace!("Present skipped, the swap chain is lost");
            return;
        }

        let network = self.traffic.swap(0, Ordering::Relaxed) > 0;
        self.detect_depth_source(network);

        if let Some(ref block) = self.state_block {
            self.device.capture_state(block);
        }
        let (targets, depth_stencil) = self.device.render_targets();

        if let Some(ref back_buffer) = self.back_buffer {
            back_buffer.resolve(&mut self.device);
            self.device.set_render_targets(&[Some(back_buffer.render_targets[0].clone())], None);
        }

        self.render_effect();

        if let Some(ref back_buffer) = self.back_buffer {
            self.device.set_render_targets(&[Some(back_buffer.render_targets[0].clone())],
                                           self.default_depth_stencil.as_ref());
            self.device.set_viewports(&[Viewport::full(back_buffer.desc.width, back_buffer.desc.height)]);
        }

        let now = Instant::now();
        self.frame_time = now.duration_since(self.last_present);
        self.last_present = now;
        self.stats.end_frame();

        if let Some(ref block) = self.state_block {
            self.device.apply_state(block);
        }
        self.device.set_render_targets(&targets, depth_stencil.as_ref());
    }

    fn render_effect(&mut self) {
        let sources = FrameSources {
            frame_count: self.stats.frame_count as u32,
            timer: millis(self.started.elapsed()),
            frame_time: millis(self.frame_time),
            draw_calls: self.stats.last_draw_calls,
        };
        let Runtime { ref mut device, ref mut effect, ref back_buffer, ref default_depth_stencil,
                      ref mut stats, .. } = *self;
        let (effect, back_buffer) = match (effect.as_mut(), back_buffer.as_ref()) {
            (Some(effect), Some(back_buffer)) => (effect, back_buffer),
            _ => return,
        };
        effect.update_sources(&sources);

        let frame = Frame {
            back_buffer: &back_buffer.texture,
            back_buffer_copy: &back_buffer.copy,
            depth_stencil: default_depth_stencil.as_ref(),
            width: back_buffer.desc.width,
            height: back_buffer.desc.height,
        };
        effect.begin(device, &frame);
        for technique in 0 .. effect.techniques.len() {
            if !effect.techniques[technique].enabled {
                continue;
            }
            for pass in 0 .. effect.techniques[technique].passes.len() {
                let vertices = effect.render_pass(device, &frame, technique, pass);
                stats.on_draw(vertices);
            }
        }
        effect.end(device);
    }

    fn detect_depth_source(&mut self, network: bool) {
        let multisampled = self.back_buffer
            .as_ref()
            .map_or(false, |b| b.desc.samples.is_multisampled());
        let current = self.depth_replacement.as_ref().map(|r| r.original.clone());
        match self.detector.select(network, multisampled, self.stats.draw_calls, current.as_ref()) {
            Selection::Keep => (),
            Selection::Release => {
                if self.depth_replacement.is_some() {
                    info!("Network activity detected, releasing the depth source");
                }
                self.replace_depth_source(None);
            }
            Selection::Switch(view) => self.replace_depth_source(Some(view)),
        }
    }

    /// Replace a host depth-stencil view from now on, or stop replacing.
    pub fn replace_depth_source(&mut self, view: Option<R::DepthStencilView>) {
        let (targets, mut bound) = self.device.render_targets();

        if let Some(previous) = self.depth_replacement.take() {
            if previous.replacement != previous.original && bound.as_ref() == Some(&previous.replacement) {
                self.device.set_render_targets(&targets, Some(&previous.original));
                bound = Some(previous.original.clone());
            }
        }

        let resource = match view {
            Some(ref original) => match DepthReplacement::new(&mut self.device, original) {
                Ok(replacement) => {
                    info!("Switched the depth source to {:?}", original);
                    if replacement.replacement != *original && bound.as_ref() == Some(original) {
                        self.device.set_render_targets(&targets, Some(&replacement.replacement));
                    }
                    let resource = replacement.shader_resource.clone();
                    self.depth_replacement = Some(replacement);
                    Some(resource)
                }
                Err(e) => {
                    error!("Failed to create a replacement for depth source {:?}: {}", original, e);
                    None
                }
            },
            None => None,
        };

        if let Some(ref mut effect) = self.effect {
            effect.update_depth_source(&self.device, resource);
        }
    }

    /// A host draw call.
    pub fn on_draw(&mut self, vertices: VertexCount) {
        self.stats.on_draw(vertices);
        let (_, bound) = self.device.render_targets();
        let view = match bound {
            Some(view) => view,
            None => return,
        };
        if self.default_depth_stencil.as_ref() == Some(&view) {
            return;
        }
        let view = match self.depth_replacement {
            Some(ref r) if r.replacement == view => r.original.clone(),
            _ => view,
        };
        self.detector.on_draw(&view, vertices, self.stats.draw_calls);
    }

    /// The host created a depth-stencil view.
    ///
    /// Views that do not match the back buffer in size, or are multisampled, are ignored.
    pub fn on_create_depth_stencil_view(&mut self, view: &R::DepthStencilView) {
        if self.lost {
            return;
        }
        let desc = match self.back_buffer {
            Some(ref back_buffer) => back_buffer.desc,
            None => return,
        };
        let texture = self.device.depth_stencil_texture(view);
        let info = self.device.texture_info(&texture);
        if info.width != desc.width || info.height != desc.height || info.samples.is_multisampled() {
            return;
        }
        debug!("Tracking depth-stencil view {:?}", view);
        self.detector.insert(view.clone(), info.width, info.height);
    }

    /// The host released its last reference to a depth-stencil view.
    pub fn on_delete_depth_stencil_view(&mut self, view: &R::DepthStencilView) {
        self.detector.remove(view);
    }

    /// Filter a depth-stencil view the host is binding.
    pub fn on_set_depth_stencil_view(&self, view: Option<R::DepthStencilView>)
                                     -> Option<R::DepthStencilView> {
        match (view, self.depth_replacement.as_ref()) {
            (Some(ref v), Some(r)) if *v == r.original => Some(r.replacement.clone()),
            (view, _) => view,
        }
    }

    /// Filter the depth-stencil view reported back to the host.
    pub fn on_get_depth_stencil_view(&self, view: Option<R::DepthStencilView>)
                                     -> Option<R::DepthStencilView> {
        match (view, self.depth_replacement.as_ref()) {
            (Some(ref v), Some(r)) if *v == r.replacement => Some(r.original.clone()),
            (view, _) => view,
        }
    }

    /// Filter a depth-stencil view the host is clearing.
    pub fn on_clear_depth_stencil_view(&self, view: R::DepthStencilView) -> R::DepthStencilView {
        match self.depth_replacement {
            Some(ref r) if view == r.original => r.replacement.clone(),
            _ => view,
        }
    }

    /// Filter the textures of a whole-resource copy, returned as `(dst, src)`.
    pub fn on_copy_resource(&self, dst: R::Texture, src: R::Texture) -> (R::Texture, R::Texture) {
        match self.depth_replacement {
            Some(ref r) => {
                let redirect = |t: R::Texture| if t == r.original_texture { r.texture.clone() } else { t };
                (redirect(dst), redirect(src))
            }
            None => (dst, src),
        }
    }

    /// Filter the back buffer handed to the host.
    pub fn on_get_back_buffer(&self, texture: R::Texture) -> R::Texture {
        match self.back_buffer {
            Some(ref b) if texture == b.texture => b.replacement.clone(),
            _ => texture,
        }
    }

    fn surfaces(&self) -> Option<Surfaces<R>> {
        let back_buffer = self.back_buffer.as_ref()?;
        Some(Surfaces {
            width: back_buffer.desc.width,
            height: back_buffer.desc.height,
            back_buffer_resources: [Some(back_buffer.shader_resources[0].clone()),
                                    Some(back_buffer.shader_resources[1].clone())],
            back_buffer_targets: [Some(back_buffer.render_targets[0].clone()),
                                  Some(back_buffer.render_targets[1].clone())],
            depth_resource: self.depth_replacement.as_ref().map(|r| r.shader_resource.clone()),
        })
    }

    /// Compile an effect and swap it in. Returns the warnings.
    ///
    /// On failure the current effect stays loaded.
    pub fn update_effect(&mut self, tree: Rc<Tree>) -> Result<String, Error> {
        let surfaces = match self.surfaces() {
            Some(surfaces) if !self.lost => surfaces,
            _ => return Err(Error::Lost),
        };
        match compiler::compile(&mut self.device, &tree, &surfaces, &self.config) {
            Ok(output) => {
                if !output.warnings.is_empty() {
                    warn!("{}", output.warnings.trim_end());
                }
                info!("Loaded an effect with {} techniques", output.effect.techniques().len());
                self.effect = Some(output.effect);
                self.tree = Some(tree);
                Ok(output.warnings)
            }
            Err(e) => {
                error!("{}", e);
                Err(Error::Compile(e))
            }
        }
    }

    /// Upload pixels into one level of an effect texture.
    pub fn update_texture(&mut self, name: &str, level: u32, data: &[u8]) -> Result<(), Error> {
        let effect = self.effect.as_ref().ok_or(Error::NoEffect)?;
        effect.update_texture(&mut self.device, name, level, data)?;
        Ok(())
    }

    pub fn set_technique_enabled(&mut self, name: &str, enabled: bool) -> Result<(), Error> {
        let effect = self.effect.as_mut().ok_or(Error::NoEffect)?;
        effect.set_technique_enabled(name, enabled)?;
        Ok(())
    }

    /// Read the back buffer as tightly packed, opaque RGBA8 pixels.
    pub fn screenshot(&mut self) -> Result<Vec<u8>, Error> {
        let back_buffer = self.back_buffer.as_ref().ok_or(Error::Lost)?;
        let info = self.device.texture_info(&back_buffer.texture);
        let bgra = info.format.is_bgra8();
        if !(bgra || info.format.is_rgba8()) {
            warn!("Screenshots are not supported for back buffer format {:?}", info.format);
            return Err(Error::UnsupportedFormat(info.format));
        }
        let mapped = self.device.read_texture(&back_buffer.texture)?;

        let row_size = info.width as usize * 4;
        let mut pixels = Vec::with_capacity(row_size * info.height as usize);
        for row in mapped.data.chunks(mapped.row_pitch.max(1)).take(info.height as usize) {
            let row = match row.get(.. row_size) {
                Some(row) => row,
                None => break,
            };
            for pixel in row.chunks(4) {
                if bgra {
                    pixels.extend_from_slice(&[pixel[2], pixel[1], pixel[0], 0xFF]);
                } else {
                    pixels.extend_from_slice(&[pixel[0], pixel[1], pixel[2], 0xFF]);
                }
            }
        }
        Ok(pixels)
    }
}
