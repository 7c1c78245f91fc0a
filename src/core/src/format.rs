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

//! Surface formats.
//!
//! A subset of DXGI formats that effects and host swap chains deal with, along with the
//! conversions between the typeless, linear and sRGB members of a format family, and between
//! depth formats and their shader-readable counterparts.

#![allow(missing_docs)]

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    Unknown,
    R8_UNORM,
    R8G8_UNORM,
    R16_TYPELESS,
    R16_UNORM,
    R16_FLOAT,
    R32_TYPELESS,
    R32_FLOAT,
    R8G8B8A8_TYPELESS,
    R8G8B8A8_UNORM,
    R8G8B8A8_UNORM_SRGB,
    B8G8R8A8_TYPELESS,
    B8G8R8A8_UNORM,
    B8G8R8A8_UNORM_SRGB,
    R10G10B10A2_UNORM,
    R16G16B16A16_UNORM,
    R16G16B16A16_FLOAT,
    R32G32B32A32_FLOAT,
    BC1_TYPELESS,
    BC1_UNORM,
    BC1_UNORM_SRGB,
    BC2_TYPELESS,
    BC2_UNORM,
    BC2_UNORM_SRGB,
    BC3_TYPELESS,
    BC3_UNORM,
    BC3_UNORM_SRGB,
    BC4_UNORM,
    BC5_UNORM,
    D16_UNORM,
    D32_FLOAT,
    R24G8_TYPELESS,
    D24_UNORM_S8_UINT,
    R24_UNORM_X8_TYPELESS,
    R32G8X24_TYPELESS,
    D32_FLOAT_S8X24_UINT,
    R32_FLOAT_X8X24_TYPELESS,
}

impl Default for Format {
    fn default() -> Format {
        Format::Unknown
    }
}

impl Format {
    /// The typeless member of the family, when the family has linear and sRGB members.
    pub fn typeless(self) -> Format {
        use self::Format::*;
        match self {
            R8G8B8A8_UNORM | R8G8B8A8_UNORM_SRGB => R8G8B8A8_TYPELESS,
            B8G8R8A8_UNORM | B8G8R8A8_UNORM_SRGB => B8G8R8A8_TYPELESS,
            BC1_UNORM | BC1_UNORM_SRGB => BC1_TYPELESS,
            BC2_UNORM | BC2_UNORM_SRGB => BC2_TYPELESS,
            BC3_UNORM | BC3_UNORM_SRGB => BC3_TYPELESS,
            other => other,
        }
    }

    /// The gamma-encoded member of the family, or `self` if there is none.
    pub fn srgb(self) -> Format {
        use self::Format::*;
        match self {
            R8G8B8A8_TYPELESS | R8G8B8A8_UNORM => R8G8B8A8_UNORM_SRGB,
            B8G8R8A8_TYPELESS | B8G8R8A8_UNORM => B8G8R8A8_UNORM_SRGB,
            BC1_TYPELESS | BC1_UNORM => BC1_UNORM_SRGB,
            BC2_TYPELESS | BC2_UNORM => BC2_UNORM_SRGB,
            BC3_TYPELESS | BC3_UNORM => BC3_UNORM_SRGB,
            other => other,
        }
    }

    /// The linear member of the family, or `self` if there is none.
    pub fn linear(self) -> Format {
        use self::Format::*;
        match self {
            R8G8B8A8_TYPELESS | R8G8B8A8_UNORM_SRGB => R8G8B8A8_UNORM,
            B8G8R8A8_TYPELESS | B8G8R8A8_UNORM_SRGB => B8G8R8A8_UNORM,
            BC1_TYPELESS | BC1_UNORM_SRGB => BC1_UNORM,
            BC2_TYPELESS | BC2_UNORM_SRGB => BC2_UNORM,
            BC3_TYPELESS | BC3_UNORM_SRGB => BC3_UNORM,
            other => other,
        }
    }

    pub fn is_srgb(self) -> bool {
        use self::Format::*;
        match self {
            R8G8B8A8_UNORM_SRGB | B8G8R8A8_UNORM_SRGB |
            BC1_UNORM_SRGB | BC2_UNORM_SRGB | BC3_UNORM_SRGB => true,
            _ => false,
        }
    }

    pub fn is_depth(self) -> bool {
        use self::Format::*;
        match self {
            D16_UNORM | D32_FLOAT | D24_UNORM_S8_UINT | D32_FLOAT_S8X24_UINT => true,
            _ => false,
        }
    }

    /// Storage format for a depth texture that must also be readable by shaders.
    /// Unknown depth formats fall back to the 24-bit depth family.
    pub fn depth_typeless(self) -> Format {
        use self::Format::*;
        match self {
            D16_UNORM | R16_TYPELESS => R16_TYPELESS,
            D32_FLOAT | R32_TYPELESS => R32_TYPELESS,
            D32_FLOAT_S8X24_UINT | R32G8X24_TYPELESS => R32G8X24_TYPELESS,
            _ => R24G8_TYPELESS,
        }
    }

    /// Format of a depth-stencil view over a texture of this (possibly typeless) format.
    pub fn depth_target(self) -> Format {
        use self::Format::*;
        match self.depth_typeless() {
            R16_TYPELESS => D16_UNORM,
            R32_TYPELESS => D32_FLOAT,
            R32G8X24_TYPELESS => D32_FLOAT_S8X24_UINT,
            _ => D24_UNORM_S8_UINT,
        }
    }

    /// Format of a shader resource view reading the depth part of this format.
    pub fn depth_shader_resource(self) -> Format {
        use self::Format::*;
        match self.depth_typeless() {
            R16_TYPELESS => R16_UNORM,
            R32_TYPELESS => R32_FLOAT,
            R32G8X24_TYPELESS => R32_FLOAT_X8X24_TYPELESS,
            _ => R24_UNORM_X8_TYPELESS,
        }
    }

    /// Whether the pixels are laid out as 8-bit RGBA or BGRA.
    pub fn is_rgba8(self) -> bool {
        use self::Format::*;
        match self {
            R8G8B8A8_TYPELESS | R8G8B8A8_UNORM | R8G8B8A8_UNORM_SRGB => true,
            _ => false,
        }
    }

    pub fn is_bgra8(self) -> bool {
        use self::Format::*;
        match self {
            B8G8R8A8_TYPELESS | B8G8R8A8_UNORM | B8G8R8A8_UNORM_SRGB => true,
            _ => false,
        }
    }
}

/// Multisampling parameters of a texture.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleDesc {
    pub count: u32,
    pub quality: u32,
}

impl SampleDesc {
    pub fn single() -> SampleDesc {
        SampleDesc { count: 1, quality: 0 }
    }

    pub fn is_multisampled(&self) -> bool {
        self.count > 1
    }
}

impl Default for SampleDesc {
    fn default() -> SampleDesc {
        SampleDesc::single()
    }
}
