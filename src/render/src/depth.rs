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

//! Depth-source detection.
//!
//! Hosts rarely make their depth buffer readable by shaders. Every depth-stencil view matching
//! the back buffer is tracked, draw calls are counted against whichever one is bound, and once
//! every `COOLDOWN_FRAMES` the busiest one is picked. The pick gets a shader-readable
//! replacement that the host is redirected to, so effects can sample what it rendered.
//!
//! Networked sessions may render remote players into unrelated buffers, which makes the pick
//! unreliable. While traffic keeps being reported the replacement is dropped instead.

use std::sync::atomic::{AtomicUsize, Ordering};

use postfx_core::tex::{Bind, TextureInfo, Usage, ViewDesc};
use postfx_core::{CreationError, Device, Resources, VertexCount};

/// Frames between two selections.
pub const COOLDOWN_FRAMES: u32 = 30;
/// Frames with network traffic in a cooldown period that disable the replacement.
pub const TRAFFIC_THRESHOLD: u32 = 10;

/// Bytes of network traffic reported since the last frame, process wide.
pub static NETWORK_TRAFFIC: AtomicUsize = AtomicUsize::new(0);

/// Report network traffic. Safe to call from any thread.
pub fn record_network_traffic(bytes: usize) {
    NETWORK_TRAFFIC.fetch_add(bytes, Ordering::Relaxed);
}

/// Per-candidate statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DepthSourceInfo {
    pub width: u32,
    pub height: u32,
    /// The host's per-frame draw-call counter as it stood at the last draw to this view.
    /// Overwritten on every draw, not summed, and only zeroed by a selection round, so it
    /// may come from any frame of the cooldown.
    pub draw_call_count: f32,
    /// Vertices drawn to this view since the last selection round, summed over every frame
    /// of the cooldown.
    pub draw_vertices_count: f32,
}

/// Outcome of a selection round.
#[derive(Clone, Debug, PartialEq)]
pub enum Selection<V> {
    /// Nothing changes.
    Keep,
    /// Drop the current replacement.
    Release,
    /// Replace this view from now on.
    Switch(V),
}

/// Scores depth-stencil views by how much geometry lands in them.
#[derive(Debug)]
pub struct DepthSourceDetector<R: Resources> {
    candidates: Vec<(R::DepthStencilView, DepthSourceInfo)>,
    cooldown: u32,
    traffic: u32,
}

impl<R: Resources> Default for DepthSourceDetector<R> {
    fn default() -> Self {
        DepthSourceDetector::new()
    }
}

impl<R: Resources> DepthSourceDetector<R> {
    pub fn new() -> Self {
        DepthSourceDetector {
            candidates: Vec::new(),
            cooldown: 0,
            traffic: 0,
        }
    }

    /// Track a view. Tracking it again resets its statistics.
    pub fn insert(&mut self, view: R::DepthStencilView, width: u32, height: u32) {
        let info = DepthSourceInfo { width, height, .. DepthSourceInfo::default() };
        match self.candidates.iter_mut().find(|entry| entry.0 == view) {
            Some(entry) => entry.1 = info,
            None => self.candidates.push((view, info)),
        }
    }

    /// Stop tracking a view.
    pub fn remove(&mut self, view: &R::DepthStencilView) {
        self.candidates.retain(|entry| entry.0 != *view);
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
    }

    /// Statistics of a tracked view.
    pub fn get(&self, view: &R::DepthStencilView) -> Option<&DepthSourceInfo> {
        self.candidates.iter().find(|entry| entry.0 == *view).map(|entry| &entry.1)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Account a host draw call to the bound view, if it is tracked.
    pub fn on_draw(&mut self, view: &R::DepthStencilView, vertices: VertexCount, draw_calls: u32) {
        if let Some(entry) = self.candidates.iter_mut().find(|entry| entry.0 == *view) {
            entry.1.draw_call_count = draw_calls as f32;
            entry.1.draw_vertices_count += vertices as f32;
        }
    }

    /// Run once per frame.
    ///
    /// `network` tells whether traffic was reported during the frame, `draw_calls` is the
    /// number of host draw calls of the frame so far.
    pub fn select(&mut self, network: bool, multisampled: bool, draw_calls: u32,
                  current: Option<&R::DepthStencilView>) -> Selection<R::DepthStencilView> {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            if network {
                self.traffic += 1;
            }
            return Selection::Keep;
        }
        self.cooldown = COOLDOWN_FRAMES;

        if self.traffic >= TRAFFIC_THRESHOLD {
            self.traffic = 0;
            return Selection::Release;
        }
        self.traffic = 0;

        if multisampled || self.candidates.is_empty() {
            return Selection::Keep;
        }

        let total = draw_calls.max(1) as f32;
        let mut best = None;
        let mut best_score = 0.0;
        for (index, &mut (_, ref mut info)) in self.candidates.iter_mut().enumerate() {
            if info.draw_call_count == 0.0 {
                continue;
            }
            let score = info.draw_vertices_count * (1.2 - info.draw_call_count / total);
            if score >= best_score {
                best_score = score;
                best = Some(index);
            }
            info.draw_call_count = 0.0;
            info.draw_vertices_count = 0.0;
        }

        match best {
            Some(index) if current != Some(&self.candidates[index].0) => {
                Selection::Switch(self.candidates[index].0.clone())
            }
            _ => Selection::Keep,
        }
    }
}

/// A shader-readable stand-in for the host's depth buffer.
///
/// When the original texture is already shader-readable it is used directly and
/// `replacement` equals `original`.
#[derive(Clone, Debug)]
pub struct DepthReplacement<R: Resources> {
    /// The view the host created.
    pub original: R::DepthStencilView,
    /// The view the host is redirected to.
    pub replacement: R::DepthStencilView,
    /// Texture behind `original`.
    pub original_texture: R::Texture,
    /// Texture behind `replacement`.
    pub texture: R::Texture,
    /// Shader view of `texture`, for effects.
    pub shader_resource: R::ShaderResourceView,
}

impl<R: Resources> DepthReplacement<R> {
    pub fn new<D: Device<R>>(device: &mut D, original: &R::DepthStencilView)
                             -> Result<DepthReplacement<R>, CreationError> {
        let original_texture = device.depth_stencil_texture(original);
        let info = device.texture_info(&original_texture);

        let (texture, replacement) = if info.bind.contains(Bind::SHADER_RESOURCE) {
            (original_texture.clone(), original.clone())
        } else {
            let desc = TextureInfo {
                format: info.format.depth_typeless(),
                usage: Usage::GpuOnly,
                bind: Bind::DEPTH_STENCIL | Bind::SHADER_RESOURCE,
                generate_mips: false,
                .. info
            };
            let texture = device.create_texture_2d(&desc, None)?;
            let view = device.create_depth_stencil_view(
                &texture, Some(&ViewDesc::of(&desc, info.format.depth_target())))?;
            (texture, view)
        };

        let view_desc = ViewDesc {
            format: info.format.depth_shader_resource(),
            levels: 1,
            multisampled: info.samples.is_multisampled(),
        };
        let shader_resource = device.create_shader_resource_view(&texture, &view_desc)?;

        Ok(DepthReplacement {
            original: original.clone(),
            replacement,
            original_texture,
            texture,
            shader_resource,
        })
    }
}

#[cfg(test)]
mod tests {
    use postfx_backend_empty::{self as empty, DepthStencilView};
    use postfx_core::format::Format;
    use postfx_core::tex::{Bind, TextureInfo};
    use postfx_core::Device;

    use super::*;

    type Detector = DepthSourceDetector<empty::Resources>;

    fn depth_view(device: &mut empty::Device) -> DepthStencilView {
        let info = TextureInfo::new(640, 480, Format::D24_UNORM_S8_UINT, Bind::DEPTH_STENCIL);
        let texture = device.create_texture_2d(&info, None).unwrap();
        device.create_depth_stencil_view(&texture, None).unwrap()
    }

    #[test]
    fn fewer_calls_per_vertex_wins() {
        let mut device = empty::Device::new();
        let (a, b) = (depth_view(&mut device), depth_view(&mut device));
        let mut detector = Detector::new();
        detector.insert(a.clone(), 640, 480);
        detector.insert(b.clone(), 640, 480);

        // 1000 * (1.2 - 10 / 20) beats 500 * (1.2 - 2 / 20)
        detector.on_draw(&a, 1000, 10);
        detector.on_draw(&b, 500, 2);
        assert_eq!(detector.select(false, false, 20, None), Selection::Switch(a.clone()));
        assert_eq!(detector.get(&a), Some(&DepthSourceInfo { width: 640, height: 480, .. Default::default() }));
    }

    #[test]
    fn idle_views_are_skipped() {
        let mut device = empty::Device::new();
        let (a, b) = (depth_view(&mut device), depth_view(&mut device));
        let mut detector = Detector::new();
        detector.insert(a.clone(), 640, 480);
        detector.insert(b, 640, 480);
        assert_eq!(detector.select(false, false, 0, None), Selection::Keep);

        for _ in 0 .. COOLDOWN_FRAMES {
            assert_eq!(detector.select(false, false, 0, None), Selection::Keep);
        }
        detector.on_draw(&a, 3, 1);
        assert_eq!(detector.select(false, false, 1, None), Selection::Switch(a));
    }

    #[test]
    fn ties_go_to_the_later_view() {
        let mut device = empty::Device::new();
        let (a, b) = (depth_view(&mut device), depth_view(&mut device));
        let mut detector = Detector::new();
        detector.insert(a.clone(), 640, 480);
        detector.insert(b.clone(), 640, 480);
        detector.on_draw(&a, 300, 1);
        detector.on_draw(&b, 300, 1);
        assert_eq!(detector.select(false, false, 2, None), Selection::Switch(b));
    }

    #[test]
    fn current_pick_is_kept() {
        let mut device = empty::Device::new();
        let a = depth_view(&mut device);
        let mut detector = Detector::new();
        detector.insert(a.clone(), 640, 480);
        detector.on_draw(&a, 300, 1);
        assert_eq!(detector.select(false, false, 1, Some(&a)), Selection::Keep);
    }

    #[test]
    fn traffic_releases_after_cooldown() {
        let mut detector = Detector::new();
        assert_eq!(detector.select(false, false, 0, None), Selection::Keep);
        for _ in 0 .. COOLDOWN_FRAMES {
            assert_eq!(detector.select(true, false, 0, None), Selection::Keep);
        }
        assert_eq!(detector.select(false, false, 0, None), Selection::Release);
    }
}
