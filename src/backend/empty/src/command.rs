//! Context calls as recorded by the headless device.

use postfx_core::format::Format;
use postfx_core::shade::Stage;
use postfx_core::{ClearFlags, Primitive, Viewport};

/// Identifier of a device object, unique across all object kinds.
pub type Id = usize;

/// One immediate-context call, with objects referred to by id.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum Command {
    SetPrimitive(Primitive),
    UnbindVertexInput,
    SetRasterizer(Option<Id>),
    SetSamplers(Stage, Vec<Id>),
    SetConstantBuffers(Stage, Vec<Option<Id>>),
    SetShaderResources(Stage, Vec<Option<Id>>),
    SetVertexShader(Option<Id>),
    UnbindGeometryShader,
    SetPixelShader(Option<Id>),
    SetBlendState(Option<Id>, [f32; 4], u32),
    SetDepthStencilState(Option<Id>, u32),
    SetRenderTargets(Vec<Option<Id>>, Option<Id>),
    SetViewports(Vec<Viewport>),
    ClearRenderTarget(Id, [f32; 4]),
    ClearDepthStencil(Id, ClearFlags, f32, u8),
    Draw(u32, u32),
    CopyResource { dst: Id, src: Id },
    ResolveSubresource { dst: Id, src: Id, format: Format },
    GenerateMips(Id),
    UpdateBuffer(Id, Vec<u8>),
    UpdateTexture(Id, u32, usize),
    ReadTexture(Id),
    CaptureState(Id),
    ApplyState(Id),
    ReleaseState(Id),
}

impl Command {
    /// Whether this call binds render targets.
    pub fn is_target_bind(&self) -> bool {
        match *self {
            Command::SetRenderTargets(..) => true,
            _ => false,
        }
    }
}
