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

use winapi::shared::dxgiformat::*;
use winapi::shared::minwindef::UINT;
use winapi::um::d3d10::*;

use postfx_core::ds::{Comparison, CullFace, Equation, Factor, StencilOp};
use postfx_core::format::Format;
use postfx_core::tex::{Bind, FilterMethod, WrapMode};

pub fn map_format(format: Format) -> DXGI_FORMAT {
    use postfx_core::format::Format::*;
    match format {
        Unknown => DXGI_FORMAT_UNKNOWN,
        R8_UNORM => DXGI_FORMAT_R8_UNORM,
        R8G8_UNORM => DXGI_FORMAT_R8G8_UNORM,
        R16_TYPELESS => DXGI_FORMAT_R16_TYPELESS,
        R16_UNORM => DXGI_FORMAT_R16_UNORM,
        R16_FLOAT => DXGI_FORMAT_R16_FLOAT,
        R32_TYPELESS => DXGI_FORMAT_R32_TYPELESS,
        R32_FLOAT => DXGI_FORMAT_R32_FLOAT,
        R8G8B8A8_TYPELESS => DXGI_FORMAT_R8G8B8A8_TYPELESS,
        R8G8B8A8_UNORM => DXGI_FORMAT_R8G8B8A8_UNORM,
        R8G8B8A8_UNORM_SRGB => DXGI_FORMAT_R8G8B8A8_UNORM_SRGB,
        B8G8R8A8_TYPELESS => DXGI_FORMAT_B8G8R8A8_TYPELESS,
        B8G8R8A8_UNORM => DXGI_FORMAT_B8G8R8A8_UNORM,
        B8G8R8A8_UNORM_SRGB => DXGI_FORMAT_B8G8R8A8_UNORM_SRGB,
        R10G10B10A2_UNORM => DXGI_FORMAT_R10G10B10A2_UNORM,
        R16G16B16A16_UNORM => DXGI_FORMAT_R16G16B16A16_UNORM,
        R16G16B16A16_FLOAT => DXGI_FORMAT_R16G16B16A16_FLOAT,
        R32G32B32A32_FLOAT => DXGI_FORMAT_R32G32B32A32_FLOAT,
        BC1_TYPELESS => DXGI_FORMAT_BC1_TYPELESS,
        BC1_UNORM => DXGI_FORMAT_BC1_UNORM,
        BC1_UNORM_SRGB => DXGI_FORMAT_BC1_UNORM_SRGB,
        BC2_TYPELESS => DXGI_FORMAT_BC2_TYPELESS,
        BC2_UNORM => DXGI_FORMAT_BC2_UNORM,
        BC2_UNORM_SRGB => DXGI_FORMAT_BC2_UNORM_SRGB,
        BC3_TYPELESS => DXGI_FORMAT_BC3_TYPELESS,
        BC3_UNORM => DXGI_FORMAT_BC3_UNORM,
        BC3_UNORM_SRGB => DXGI_FORMAT_BC3_UNORM_SRGB,
        BC4_UNORM => DXGI_FORMAT_BC4_UNORM,
        BC5_UNORM => DXGI_FORMAT_BC5_UNORM,
        D16_UNORM => DXGI_FORMAT_D16_UNORM,
        D32_FLOAT => DXGI_FORMAT_D32_FLOAT,
        R24G8_TYPELESS => DXGI_FORMAT_R24G8_TYPELESS,
        D24_UNORM_S8_UINT => DXGI_FORMAT_D24_UNORM_S8_UINT,
        R24_UNORM_X8_TYPELESS => DXGI_FORMAT_R24_UNORM_X8_TYPELESS,
        R32G8X24_TYPELESS => DXGI_FORMAT_R32G8X24_TYPELESS,
        D32_FLOAT_S8X24_UINT => DXGI_FORMAT_D32_FLOAT_S8X24_UINT,
        R32_FLOAT_X8X24_TYPELESS => DXGI_FORMAT_R32_FLOAT_X8X24_TYPELESS,
    }
}

/// Formats the host may use that have no counterpart come back as `Unknown`.
pub fn unmap_format(format: DXGI_FORMAT) -> Format {
    use postfx_core::format::Format::*;
    match format {
        DXGI_FORMAT_R8_UNORM => R8_UNORM,
        DXGI_FORMAT_R8G8_UNORM => R8G8_UNORM,
        DXGI_FORMAT_R16_TYPELESS => R16_TYPELESS,
        DXGI_FORMAT_R16_UNORM => R16_UNORM,
        DXGI_FORMAT_R16_FLOAT => R16_FLOAT,
        DXGI_FORMAT_R32_TYPELESS => R32_TYPELESS,
        DXGI_FORMAT_R32_FLOAT => R32_FLOAT,
        DXGI_FORMAT_R8G8B8A8_TYPELESS => R8G8B8A8_TYPELESS,
        DXGI_FORMAT_R8G8B8A8_UNORM => R8G8B8A8_UNORM,
        DXGI_FORMAT_R8G8B8A8_UNORM_SRGB => R8G8B8A8_UNORM_SRGB,
        DXGI_FORMAT_B8G8R8A8_TYPELESS => B8G8R8A8_TYPELESS,
        DXGI_FORMAT_B8G8R8A8_UNORM => B8G8R8A8_UNORM,
        DXGI_FORMAT_B8G8R8A8_UNORM_SRGB => B8G8R8A8_UNORM_SRGB,
        DXGI_FORMAT_R10G10B10A2_UNORM => R10G10B10A2_UNORM,
        DXGI_FORMAT_R16G16B16A16_UNORM => R16G16B16A16_UNORM,
        DXGI_FORMAT_R16G16B16A16_FLOAT => R16G16B16A16_FLOAT,
        DXGI_FORMAT_R32G32B32A32_FLOAT => R32G32B32A32_FLOAT,
        DXGI_FORMAT_BC1_TYPELESS => BC1_TYPELESS,
        DXGI_FORMAT_BC1_UNORM => BC1_UNORM,
        DXGI_FORMAT_BC1_UNORM_SRGB => BC1_UNORM_SRGB,
        DXGI_FORMAT_BC2_TYPELESS => BC2_TYPELESS,
        DXGI_FORMAT_BC2_UNORM => BC2_UNORM,
        DXGI_FORMAT_BC2_UNORM_SRGB => BC2_UNORM_SRGB,
        DXGI_FORMAT_BC3_TYPELESS => BC3_TYPELESS,
        DXGI_FORMAT_BC3_UNORM => BC3_UNORM,
        DXGI_FORMAT_BC3_UNORM_SRGB => BC3_UNORM_SRGB,
        DXGI_FORMAT_BC4_UNORM => BC4_UNORM,
        DXGI_FORMAT_BC5_UNORM => BC5_UNORM,
        DXGI_FORMAT_D16_UNORM => D16_UNORM,
        DXGI_FORMAT_D32_FLOAT => D32_FLOAT,
        DXGI_FORMAT_R24G8_TYPELESS => R24G8_TYPELESS,
        DXGI_FORMAT_D24_UNORM_S8_UINT => D24_UNORM_S8_UINT,
        DXGI_FORMAT_R24_UNORM_X8_TYPELESS => R24_UNORM_X8_TYPELESS,
        DXGI_FORMAT_R32G8X24_TYPELESS => R32G8X24_TYPELESS,
        DXGI_FORMAT_D32_FLOAT_S8X24_UINT => D32_FLOAT_S8X24_UINT,
        DXGI_FORMAT_R32_FLOAT_X8X24_TYPELESS => R32_FLOAT_X8X24_TYPELESS,
        _ => Unknown,
    }
}

pub fn map_bind(bind: Bind) -> UINT {
    let mut flags = 0;
    if bind.contains(Bind::RENDER_TARGET) {
        flags |= D3D10_BIND_RENDER_TARGET;
    }
    if bind.contains(Bind::DEPTH_STENCIL) {
        flags |= D3D10_BIND_DEPTH_STENCIL;
    }
    if bind.contains(Bind::SHADER_RESOURCE) {
        flags |= D3D10_BIND_SHADER_RESOURCE;
    }
    flags
}

pub fn unmap_bind(flags: UINT) -> Bind {
    let mut bind = Bind::empty();
    if flags & D3D10_BIND_RENDER_TARGET != 0 {
        bind |= Bind::RENDER_TARGET;
    }
    if flags & D3D10_BIND_DEPTH_STENCIL != 0 {
        bind |= Bind::DEPTH_STENCIL;
    }
    if flags & D3D10_BIND_SHADER_RESOURCE != 0 {
        bind |= Bind::SHADER_RESOURCE;
    }
    bind
}

pub fn map_function(fun: Comparison) -> D3D10_COMPARISON_FUNC {
    match fun {
        Comparison::Never => D3D10_COMPARISON_NEVER,
        Comparison::Less => D3D10_COMPARISON_LESS,
        Comparison::LessEqual => D3D10_COMPARISON_LESS_EQUAL,
        Comparison::Equal => D3D10_COMPARISON_EQUAL,
        Comparison::GreaterEqual => D3D10_COMPARISON_GREATER_EQUAL,
        Comparison::Greater => D3D10_COMPARISON_GREATER,
        Comparison::NotEqual => D3D10_COMPARISON_NOT_EQUAL,
        Comparison::Always => D3D10_COMPARISON_ALWAYS,
    }
}

pub fn map_stencil_op(op: StencilOp) -> D3D10_STENCIL_OP {
    match op {
        StencilOp::Keep => D3D10_STENCIL_OP_KEEP,
        StencilOp::Zero => D3D10_STENCIL_OP_ZERO,
        StencilOp::Replace => D3D10_STENCIL_OP_REPLACE,
        StencilOp::IncrementClamp => D3D10_STENCIL_OP_INCR_SAT,
        StencilOp::IncrementWrap => D3D10_STENCIL_OP_INCR,
        StencilOp::DecrementClamp => D3D10_STENCIL_OP_DECR_SAT,
        StencilOp::DecrementWrap => D3D10_STENCIL_OP_DECR,
        StencilOp::Invert => D3D10_STENCIL_OP_INVERT,
    }
}

/// Alpha factors cannot read color channels, `scalar` maps those to their alpha counterpart.
pub fn map_blend_factor(factor: Factor, scalar: bool) -> D3D10_BLEND {
    use postfx_core::ds::BlendValue::*;
    use postfx_core::ds::Factor::*;
    match factor {
        Zero => D3D10_BLEND_ZERO,
        One => D3D10_BLEND_ONE,
        SourceAlphaSaturated => D3D10_BLEND_SRC_ALPHA_SAT,
        ZeroPlus(SourceColor) if !scalar => D3D10_BLEND_SRC_COLOR,
        ZeroPlus(SourceColor) | ZeroPlus(SourceAlpha) => D3D10_BLEND_SRC_ALPHA,
        ZeroPlus(DestColor) if !scalar => D3D10_BLEND_DEST_COLOR,
        ZeroPlus(DestColor) | ZeroPlus(DestAlpha) => D3D10_BLEND_DEST_ALPHA,
        ZeroPlus(ConstColor) | ZeroPlus(ConstAlpha) => D3D10_BLEND_BLEND_FACTOR,
        OneMinus(SourceColor) if !scalar => D3D10_BLEND_INV_SRC_COLOR,
        OneMinus(SourceColor) | OneMinus(SourceAlpha) => D3D10_BLEND_INV_SRC_ALPHA,
        OneMinus(DestColor) if !scalar => D3D10_BLEND_INV_DEST_COLOR,
        OneMinus(DestColor) | OneMinus(DestAlpha) => D3D10_BLEND_INV_DEST_ALPHA,
        OneMinus(ConstColor) | OneMinus(ConstAlpha) => D3D10_BLEND_INV_BLEND_FACTOR,
    }
}

pub fn map_equation(equation: Equation) -> D3D10_BLEND_OP {
    match equation {
        Equation::Add => D3D10_BLEND_OP_ADD,
        Equation::Sub => D3D10_BLEND_OP_SUBTRACT,
        Equation::RevSub => D3D10_BLEND_OP_REV_SUBTRACT,
        Equation::Min => D3D10_BLEND_OP_MIN,
        Equation::Max => D3D10_BLEND_OP_MAX,
    }
}

pub fn map_cull(cull: CullFace) -> D3D10_CULL_MODE {
    match cull {
        CullFace::Nothing => D3D10_CULL_NONE,
        CullFace::Front => D3D10_CULL_FRONT,
        CullFace::Back => D3D10_CULL_BACK,
    }
}

pub fn map_filter(filter: FilterMethod) -> D3D10_FILTER {
    match filter {
        FilterMethod::MinMagMipPoint => D3D10_FILTER_MIN_MAG_MIP_POINT,
        FilterMethod::MinMagPointMipLinear => D3D10_FILTER_MIN_MAG_POINT_MIP_LINEAR,
        FilterMethod::MinPointMagLinearMipPoint => D3D10_FILTER_MIN_POINT_MAG_LINEAR_MIP_POINT,
        FilterMethod::MinPointMagMipLinear => D3D10_FILTER_MIN_POINT_MAG_MIP_LINEAR,
        FilterMethod::MinLinearMagMipPoint => D3D10_FILTER_MIN_LINEAR_MAG_MIP_POINT,
        FilterMethod::MinLinearMagPointMipLinear => D3D10_FILTER_MIN_LINEAR_MAG_POINT_MIP_LINEAR,
        FilterMethod::MinMagLinearMipPoint => D3D10_FILTER_MIN_MAG_LINEAR_MIP_POINT,
        FilterMethod::MinMagMipLinear => D3D10_FILTER_MIN_MAG_MIP_LINEAR,
        FilterMethod::Anisotropic => D3D10_FILTER_ANISOTROPIC,
    }
}

pub fn map_wrap(wrap: WrapMode) -> D3D10_TEXTURE_ADDRESS_MODE {
    match wrap {
        WrapMode::Tile => D3D10_TEXTURE_ADDRESS_WRAP,
        WrapMode::Mirror => D3D10_TEXTURE_ADDRESS_MIRROR,
        WrapMode::Clamp => D3D10_TEXTURE_ADDRESS_CLAMP,
        WrapMode::Border => D3D10_TEXTURE_ADDRESS_BORDER,
    }
}
