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

//! Fixed-function state descriptors.
//!
//! Blend and depth-stencil descriptors are expressed with the `draw_state` vocabulary. One
//! descriptor applies to every render target and to both stencil faces.

use crate::ds::{Comparison, CullFace, Equation, Factor, StencilOp};

/// Source and destination factors of one blend equation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendChannel {
    /// Blend equation.
    pub equation: Equation,
    /// Source factor.
    pub source: Factor,
    /// Destination factor.
    pub destination: Factor,
}

impl Default for BlendChannel {
    fn default() -> BlendChannel {
        BlendChannel {
            equation: Equation::Add,
            source: Factor::One,
            destination: Factor::Zero,
        }
    }
}

/// Blend state, replicated on all render targets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendDesc {
    /// Whether blending is enabled.
    pub enable: bool,
    /// Color channel blending.
    pub color: BlendChannel,
    /// Alpha channel blending.
    pub alpha: BlendChannel,
    /// Channels written, red being bit 0.
    pub write_mask: u8,
}

impl Default for BlendDesc {
    fn default() -> BlendDesc {
        BlendDesc {
            enable: false,
            color: BlendChannel::default(),
            alpha: BlendChannel::default(),
            write_mask: 0xF,
        }
    }
}

/// Stencil operations and test, shared by front and back faces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StencilFace {
    /// Comparison against the reference value.
    pub fun: Comparison,
    /// Operation when the stencil test fails.
    pub op_fail: StencilOp,
    /// Operation when the stencil test passes but the depth test fails.
    pub op_depth_fail: StencilOp,
    /// Operation when both tests pass.
    pub op_pass: StencilOp,
}

impl Default for StencilFace {
    fn default() -> StencilFace {
        StencilFace {
            fun: Comparison::Always,
            op_fail: StencilOp::Keep,
            op_depth_fail: StencilOp::Keep,
            op_pass: StencilOp::Keep,
        }
    }
}

/// Depth and stencil test state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthStencilDesc {
    /// Whether the depth test is enabled.
    pub depth_enable: bool,
    /// Whether depth values are written.
    pub depth_write: bool,
    /// Depth comparison.
    pub depth_fun: Comparison,
    /// Whether the stencil test is enabled.
    pub stencil_enable: bool,
    /// Bits read by the stencil test.
    pub stencil_read_mask: u8,
    /// Bits written by stencil operations.
    pub stencil_write_mask: u8,
    /// Stencil face state.
    pub stencil: StencilFace,
}

impl Default for DepthStencilDesc {
    fn default() -> DepthStencilDesc {
        DepthStencilDesc {
            depth_enable: false,
            depth_write: false,
            depth_fun: Comparison::Less,
            stencil_enable: false,
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
            stencil: StencilFace::default(),
        }
    }
}

/// Rasterizer state. Polygons are always filled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterizerDesc {
    /// Which faces are culled.
    pub cull_face: CullFace,
    /// Whether primitives are clipped against the depth range.
    pub depth_clip: bool,
}

impl Default for RasterizerDesc {
    fn default() -> RasterizerDesc {
        RasterizerDesc {
            cull_face: CullFace::Nothing,
            depth_clip: true,
        }
    }
}

