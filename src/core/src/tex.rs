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

//! Texture, view and sampler descriptors.

use std::hash::{Hash, Hasher};

use crate::ds::Comparison;
use crate::format::{Format, SampleDesc};

bitflags!(
    /// Bind flags
    #[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
    pub struct Bind: u8 {
        /// The resource can be rendered into.
        const RENDER_TARGET    = 0x1;
        /// The resource can serve as a depth/stencil target.
        const DEPTH_STENCIL    = 0x2;
        /// The resource can be bound to the shader for reading.
        const SHADER_RESOURCE  = 0x4;
    }
);

/// A hint as to how this texture will be used.
#[derive(Eq, Ord, PartialEq, PartialOrd, Hash, Copy, Clone, Debug)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Usage {
    /// GPU: read + write, CPU: update only. Optimal for render targets.
    GpuOnly,
    /// GPU: read, CPU: write.
    Dynamic,
    /// GPU: copy, CPU: read. Used to read back rendered images.
    Staging,
}

/// An information block that is immutable and associated with each texture.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureInfo {
    /// Width of the top level, in pixels.
    pub width: u32,
    /// Height of the top level, in pixels.
    pub height: u32,
    /// Number of mipmap levels.
    pub levels: u32,
    /// Storage format.
    pub format: Format,
    /// Multisampling.
    pub samples: SampleDesc,
    /// Usage hint.
    pub usage: Usage,
    /// Bind flags.
    pub bind: Bind,
    /// Whether `Device::generate_mips` may be used on views of this texture.
    pub generate_mips: bool,
}

impl TextureInfo {
    /// A single-sampled, single-level texture only the GPU touches.
    pub fn new(width: u32, height: u32, format: Format, bind: Bind) -> TextureInfo {
        TextureInfo {
            width,
            height,
            levels: 1,
            format,
            samples: SampleDesc::single(),
            usage: Usage::GpuOnly,
            bind,
            generate_mips: false,
        }
    }

    /// Dimensions of a mipmap level.
    pub fn level_dimensions(&self, level: u32) -> (u32, u32) {
        ((self.width >> level).max(1), (self.height >> level).max(1))
    }
}

/// How a view interprets the texture it is created on.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ViewDesc {
    /// Typed format of the view.
    pub format: Format,
    /// Number of mipmap levels seen through the view. Ignored by target views.
    pub levels: u32,
    /// Whether the texture is multisampled.
    pub multisampled: bool,
}

impl ViewDesc {
    /// View covering every level of a texture in the given format.
    pub fn of(info: &TextureInfo, format: Format) -> ViewDesc {
        ViewDesc {
            format,
            levels: info.levels,
            multisampled: info.samples.is_multisampled(),
        }
    }
}

/// How to filter samples when sampling from a texture.
#[derive(Eq, Ord, PartialEq, PartialOrd, Hash, Copy, Clone, Debug)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum FilterMethod {
    MinMagMipPoint,
    MinMagPointMipLinear,
    MinPointMagLinearMipPoint,
    MinPointMagMipLinear,
    MinLinearMagMipPoint,
    MinLinearMagPointMipLinear,
    MinMagLinearMipPoint,
    MinMagMipLinear,
    /// Anisotropic filtering with the maximum given by `SamplerInfo::max_anisotropy`.
    Anisotropic,
}

impl FilterMethod {
    /// Combine per-axis choices, `true` meaning linear. Anisotropy on any axis wins.
    pub fn from_axes(min: Option<bool>, mag: Option<bool>, mip: Option<bool>) -> FilterMethod {
        use self::FilterMethod::*;
        match (min, mag, mip) {
            (Some(false), Some(false), Some(false)) => MinMagMipPoint,
            (Some(false), Some(false), Some(true)) => MinMagPointMipLinear,
            (Some(false), Some(true), Some(false)) => MinPointMagLinearMipPoint,
            (Some(false), Some(true), Some(true)) => MinPointMagMipLinear,
            (Some(true), Some(false), Some(false)) => MinLinearMagMipPoint,
            (Some(true), Some(false), Some(true)) => MinLinearMagPointMipLinear,
            (Some(true), Some(true), Some(false)) => MinMagLinearMipPoint,
            (Some(true), Some(true), Some(true)) => MinMagMipLinear,
            _ => Anisotropic,
        }
    }
}

/// Specifies how texture coordinates outside the range `[0, 1]` are handled.
#[derive(Eq, Ord, PartialEq, PartialOrd, Hash, Copy, Clone, Debug)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum WrapMode {
    /// Tile the texture.
    Tile,
    /// Mirror the texture.
    Mirror,
    /// Clamp to the edge pixels.
    Clamp,
    /// Use the border color.
    Border,
}

/// Specifies how to sample from a texture.
///
/// Equality and hashing go through the exact bits of every field, so two descriptors are the
/// same sampler state iff they would produce the same backend descriptor.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplerInfo {
    /// Filter method to use.
    pub filter: FilterMethod,
    /// Wrapping mode for each of the U, V, and W axis.
    pub wrap_mode: (WrapMode, WrapMode, WrapMode),
    /// Bias added to the computed level of detail.
    pub lod_bias: f32,
    /// Clamp of the level of detail.
    pub lod_range: (f32, f32),
    /// Upper bound of anisotropy, 1 to 16.
    pub max_anisotropy: u8,
    /// Comparison used for comparison filters.
    pub comparison: Comparison,
    /// Border color.
    pub border: [f32; 4],
}

impl SamplerInfo {
    /// Create a sampler with linear filtering, clamping and the full level range.
    pub fn new(filter: FilterMethod, wrap: WrapMode) -> SamplerInfo {
        SamplerInfo {
            filter,
            wrap_mode: (wrap, wrap, wrap),
            lod_bias: 0.0,
            lod_range: (std::f32::MIN, std::f32::MAX),
            max_anisotropy: 1,
            comparison: Comparison::Never,
            border: [0.0; 4],
        }
    }

    /// Clamp the anisotropy to what Direct3D 10 accepts.
    pub fn with_anisotropy(mut self, max: u32) -> SamplerInfo {
        if max > 16 {
            warn!("Anisotropy of {} clamped to 16", max);
        }
        self.max_anisotropy = max.max(1).min(16) as u8;
        self
    }

    fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(48);
        out.push(self.filter as u8);
        out.push(self.wrap_mode.0 as u8);
        out.push(self.wrap_mode.1 as u8);
        out.push(self.wrap_mode.2 as u8);
        out.extend_from_slice(&self.lod_bias.to_bits().to_le_bytes());
        out.extend_from_slice(&self.lod_range.0.to_bits().to_le_bytes());
        out.extend_from_slice(&self.lod_range.1.to_bits().to_le_bytes());
        out.push(self.max_anisotropy);
        out.push(self.comparison as u8);
        for c in &self.border {
            out.extend_from_slice(&c.to_bits().to_le_bytes());
        }
        out
    }

    /// 64-bit FNV-1a hash of the descriptor bytes.
    pub fn descriptor_hash(&self) -> u64 {
        self.bytes().iter().fold(0xcbf2_9ce4_8422_2325, |h, &b| {
            (h ^ b as u64).wrapping_mul(0x0100_0000_01b3)
        })
    }
}

impl PartialEq for SamplerInfo {
    fn eq(&self, other: &SamplerInfo) -> bool {
        self.bytes() == other.bytes()
    }
}

impl Eq for SamplerInfo {}

impl Hash for SamplerInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.descriptor_hash());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_descriptors_hash_equally() {
        let a = SamplerInfo::new(FilterMethod::MinMagMipLinear, WrapMode::Clamp);
        let b = SamplerInfo::new(FilterMethod::MinMagMipLinear, WrapMode::Clamp);
        assert_eq!(a, b);
        assert_eq!(a.descriptor_hash(), b.descriptor_hash());
    }

    #[test]
    fn different_descriptors_differ() {
        let a = SamplerInfo::new(FilterMethod::MinMagMipLinear, WrapMode::Clamp);
        let mut b = a;
        b.wrap_mode.1 = WrapMode::Tile;
        assert_ne!(a, b);
        assert_ne!(a.descriptor_hash(), b.descriptor_hash());
    }

    #[test]
    fn any_anisotropic_axis() {
        assert_eq!(FilterMethod::from_axes(Some(true), None, Some(false)), FilterMethod::Anisotropic);
        assert_eq!(FilterMethod::from_axes(Some(false), Some(true), Some(true)),
                   FilterMethod::MinPointMagMipLinear);
    }

    #[test]
    fn level_dimensions_stop_at_one() {
        let info = TextureInfo::new(16, 4, Format::R8G8B8A8_UNORM, Bind::SHADER_RESOURCE);
        assert_eq!(info.level_dimensions(0), (16, 4));
        assert_eq!(info.level_dimensions(3), (2, 1));
    }
}
