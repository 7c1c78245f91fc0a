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

//! Back-buffer wrapper.
//!
//! Effects read the back buffer through a copy and write the real one through linear and sRGB
//! render target views. A host that asked for a multisampled swap chain gets a multisampled
//! stand-in to render to, which is resolved into the real back buffer before post-processing.

use postfx_core::format::{Format, SampleDesc};
use postfx_core::tex::{Bind, TextureInfo, ViewDesc};
use postfx_core::{CreationError, Device, Resources};

/// Swap chain parameters as requested by the host.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SwapChainDesc {
    pub width: u32,
    pub height: u32,
    pub format: Format,
    /// Multisampling the host asked for. The real back buffer is never multisampled.
    pub samples: SampleDesc,
}

/// The back buffer and the objects built around it.
#[derive(Clone, Debug)]
pub struct BackBuffer<R: Resources> {
    pub desc: SwapChainDesc,
    /// The real back buffer.
    pub texture: R::Texture,
    /// What the host renders to. Equal to `texture` unless the host asked for multisampling.
    pub replacement: R::Texture,
    /// Shader-readable copy refreshed before every pass.
    pub copy: R::Texture,
    /// Linear and sRGB views of `copy`.
    pub shader_resources: [R::ShaderResourceView; 2],
    /// Linear and sRGB targets on `texture`.
    pub render_targets: [R::RenderTargetView; 2],
}

impl<R: Resources> BackBuffer<R> {
    pub fn new<D: Device<R>>(device: &mut D, desc: &SwapChainDesc, texture: R::Texture)
                             -> Result<BackBuffer<R>, CreationError> {
        let info = device.texture_info(&texture);

        let replacement = if desc.samples.is_multisampled() {
            let replacement_info = TextureInfo {
                samples: desc.samples,
                levels: 1,
                bind: Bind::RENDER_TARGET,
                generate_mips: false,
                .. info
            };
            let replacement = device.create_texture_2d(&replacement_info, None)?;
            info!("Rendering the host to a {}x multisampled stand-in", desc.samples.count);
            replacement
        } else {
            texture.clone()
        };

        let copy_info = TextureInfo::new(info.width, info.height, info.format.typeless(),
                                         Bind::SHADER_RESOURCE);
        let copy = device.create_texture_2d(&copy_info, None)?;
        let shader_resources = [
            device.create_shader_resource_view(&copy, &ViewDesc::of(&copy_info, info.format.linear()))?,
            device.create_shader_resource_view(&copy, &ViewDesc::of(&copy_info, info.format.srgb()))?,
        ];
        let render_targets = [
            device.create_render_target_view(&texture, &ViewDesc::of(&info, info.format.linear()))?,
            device.create_render_target_view(&texture, &ViewDesc::of(&info, info.format.srgb()))?,
        ];

        Ok(BackBuffer {
            desc: *desc,
            texture,
            replacement,
            copy,
            shader_resources,
            render_targets,
        })
    }

    /// Whether the host renders to a stand-in.
    pub fn is_replaced(&self) -> bool {
        self.replacement != self.texture
    }

    /// Resolve the stand-in into the real back buffer.
    pub fn resolve<D: Device<R>>(&self, device: &mut D) {
        if self.is_replaced() {
            device.resolve_subresource(&self.texture, 0, &self.replacement, 0, self.desc.format);
        }
    }
}
