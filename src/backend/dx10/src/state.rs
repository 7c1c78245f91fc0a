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

//! Fixed-function state descriptors and pipeline state capture.

use std::ptr;

use winapi::shared::minwindef::{BOOL, FALSE, FLOAT, TRUE, UINT};
use winapi::um::d3d10::*;
use winapi::um::d3dcommon::D3D_PRIMITIVE_TOPOLOGY;
use winapi::Interface;
use wio::com::ComPtr;

use postfx_core::state::{BlendDesc, DepthStencilDesc, RasterizerDesc, StencilFace};
use postfx_core::tex::SamplerInfo;
use postfx_core::{MAX_CONSTANT_BUFFERS, MAX_RENDER_TARGETS, MAX_RESOURCE_VIEWS, MAX_SAMPLERS};

use crate::data::{map_blend_factor, map_cull, map_equation, map_filter, map_function,
                  map_stencil_op, map_wrap};

const MAX_VIEWPORTS: usize = 16;

fn flag(value: bool) -> BOOL {
    if value { TRUE } else { FALSE }
}

pub fn make_blend(desc: &BlendDesc) -> D3D10_BLEND_DESC {
    D3D10_BLEND_DESC {
        AlphaToCoverageEnable: FALSE,
        BlendEnable: [flag(desc.enable); MAX_RENDER_TARGETS],
        SrcBlend: map_blend_factor(desc.color.source, false),
        DestBlend: map_blend_factor(desc.color.destination, false),
        BlendOp: map_equation(desc.color.equation),
        SrcBlendAlpha: map_blend_factor(desc.alpha.source, true),
        DestBlendAlpha: map_blend_factor(desc.alpha.destination, true),
        BlendOpAlpha: map_equation(desc.alpha.equation),
        RenderTargetWriteMask: [desc.write_mask; MAX_RENDER_TARGETS],
    }
}

fn make_stencil_face(face: &StencilFace) -> D3D10_DEPTH_STENCILOP_DESC {
    D3D10_DEPTH_STENCILOP_DESC {
        StencilFailOp: map_stencil_op(face.op_fail),
        StencilDepthFailOp: map_stencil_op(face.op_depth_fail),
        StencilPassOp: map_stencil_op(face.op_pass),
        StencilFunc: map_function(face.fun),
    }
}

pub fn make_depth_stencil(desc: &DepthStencilDesc) -> D3D10_DEPTH_STENCIL_DESC {
    D3D10_DEPTH_STENCIL_DESC {
        DepthEnable: flag(desc.depth_enable),
        DepthWriteMask: if desc.depth_write {
            D3D10_DEPTH_WRITE_MASK_ALL
        } else {
            D3D10_DEPTH_WRITE_MASK_ZERO
        },
        DepthFunc: map_function(desc.depth_fun),
        StencilEnable: flag(desc.stencil_enable),
        StencilReadMask: desc.stencil_read_mask,
        StencilWriteMask: desc.stencil_write_mask,
        FrontFace: make_stencil_face(&desc.stencil),
        BackFace: make_stencil_face(&desc.stencil),
    }
}

pub fn make_rasterizer(desc: &RasterizerDesc) -> D3D10_RASTERIZER_DESC {
    D3D10_RASTERIZER_DESC {
        FillMode: D3D10_FILL_SOLID,
        CullMode: map_cull(desc.cull_face),
        FrontCounterClockwise: FALSE,
        DepthBias: 0,
        DepthBiasClamp: 0.0,
        SlopeScaledDepthBias: 0.0,
        DepthClipEnable: flag(desc.depth_clip),
        ScissorEnable: FALSE,
        MultisampleEnable: FALSE,
        AntialiasedLineEnable: FALSE,
    }
}

pub fn make_sampler(info: &SamplerInfo) -> D3D10_SAMPLER_DESC {
    D3D10_SAMPLER_DESC {
        Filter: map_filter(info.filter),
        AddressU: map_wrap(info.wrap_mode.0),
        AddressV: map_wrap(info.wrap_mode.1),
        AddressW: map_wrap(info.wrap_mode.2),
        MipLODBias: info.lod_bias,
        MaxAnisotropy: info.max_anisotropy as UINT,
        ComparisonFunc: map_function(info.comparison),
        BorderColor: info.border,
        MinLOD: info.lod_range.0,
        MaxLOD: info.lod_range.1,
    }
}

fn owned<T: Interface>(raw: *mut T) -> Option<ComPtr<T>> {
    if raw.is_null() {
        None
    } else {
        Some(unsafe { ComPtr::from_raw(raw) })
    }
}

fn raw<T: Interface>(object: &Option<ComPtr<T>>) -> *mut T {
    object.as_ref().map_or(ptr::null_mut(), |o| o.as_raw())
}

fn raw_list<T: Interface>(objects: &[Option<ComPtr<T>>]) -> Vec<*mut T> {
    objects.iter().map(raw).collect()
}

/// Everything the runtime touches while rendering, as the host left it.
pub struct Captured {
    topology: D3D_PRIMITIVE_TOPOLOGY,
    input_layout: Option<ComPtr<ID3D10InputLayout>>,
    vertex_buffer: Option<ComPtr<ID3D10Buffer>>,
    vertex_stride: UINT,
    vertex_offset: UINT,
    rasterizer: Option<ComPtr<ID3D10RasterizerState>>,
    viewports: Vec<D3D10_VIEWPORT>,
    vertex_shader: Option<ComPtr<ID3D10VertexShader>>,
    geometry_shader: Option<ComPtr<ID3D10GeometryShader>>,
    pixel_shader: Option<ComPtr<ID3D10PixelShader>>,
    vs_samplers: Vec<Option<ComPtr<ID3D10SamplerState>>>,
    ps_samplers: Vec<Option<ComPtr<ID3D10SamplerState>>>,
    vs_buffers: Vec<Option<ComPtr<ID3D10Buffer>>>,
    ps_buffers: Vec<Option<ComPtr<ID3D10Buffer>>>,
    vs_resources: Vec<Option<ComPtr<ID3D10ShaderResourceView>>>,
    ps_resources: Vec<Option<ComPtr<ID3D10ShaderResourceView>>>,
    blend_state: Option<ComPtr<ID3D10BlendState>>,
    blend_factor: [FLOAT; 4],
    sample_mask: UINT,
    depth_stencil_state: Option<ComPtr<ID3D10DepthStencilState>>,
    stencil_ref: UINT,
    render_targets: Vec<Option<ComPtr<ID3D10RenderTargetView>>>,
    depth_stencil: Option<ComPtr<ID3D10DepthStencilView>>,
}

macro_rules! get_list {
    ($device:expr, $method:ident, $count:expr) => {{
        let mut list = [ptr::null_mut(); $count];
        $device.$method(0, $count as UINT, list.as_mut_ptr());
        list.iter().map(|&p| owned(p)).collect::<Vec<_>>()
    }}
}

impl Captured {
    pub unsafe fn capture(device: &ComPtr<ID3D10Device>) -> Captured {
        let mut topology = 0;
        device.IAGetPrimitiveTopology(&mut topology);
        let mut input_layout = ptr::null_mut();
        device.IAGetInputLayout(&mut input_layout);
        let (mut vertex_buffer, mut vertex_stride, mut vertex_offset) = (ptr::null_mut(), 0, 0);
        device.IAGetVertexBuffers(0, 1, &mut vertex_buffer, &mut vertex_stride, &mut vertex_offset);

        let mut rasterizer = ptr::null_mut();
        device.RSGetState(&mut rasterizer);
        let mut viewports = [D3D10_VIEWPORT {
            TopLeftX: 0,
            TopLeftY: 0,
            Width: 0,
            Height: 0,
            MinDepth: 0.0,
            MaxDepth: 0.0,
        }; MAX_VIEWPORTS];
        let mut num_viewports = MAX_VIEWPORTS as UINT;
        device.RSGetViewports(&mut num_viewports, viewports.as_mut_ptr());

        let (mut vs, mut gs, mut ps) = (ptr::null_mut(), ptr::null_mut(), ptr::null_mut());
        device.VSGetShader(&mut vs);
        device.GSGetShader(&mut gs);
        device.PSGetShader(&mut ps);

        let mut blend_state = ptr::null_mut();
        let mut blend_factor = [0.0; 4];
        let mut sample_mask = 0;
        device.OMGetBlendState(&mut blend_state, &mut blend_factor, &mut sample_mask);
        let mut depth_stencil_state = ptr::null_mut();
        let mut stencil_ref = 0;
        device.OMGetDepthStencilState(&mut depth_stencil_state, &mut stencil_ref);

        let mut targets = [ptr::null_mut(); MAX_RENDER_TARGETS];
        let mut depth_stencil = ptr::null_mut();
        device.OMGetRenderTargets(MAX_RENDER_TARGETS as UINT, targets.as_mut_ptr(), &mut depth_stencil);

        Captured {
            topology,
            input_layout: owned(input_layout),
            vertex_buffer: owned(vertex_buffer),
            vertex_stride,
            vertex_offset,
            rasterizer: owned(rasterizer),
            viewports: viewports[.. num_viewports as usize].to_vec(),
            vertex_shader: owned(vs),
            geometry_shader: owned(gs),
            pixel_shader: owned(ps),
            vs_samplers: get_list!(device, VSGetSamplers, MAX_SAMPLERS),
            ps_samplers: get_list!(device, PSGetSamplers, MAX_SAMPLERS),
            vs_buffers: get_list!(device, VSGetConstantBuffers, MAX_CONSTANT_BUFFERS),
            ps_buffers: get_list!(device, PSGetConstantBuffers, MAX_CONSTANT_BUFFERS),
            vs_resources: get_list!(device, VSGetShaderResources, MAX_RESOURCE_VIEWS),
            ps_resources: get_list!(device, PSGetShaderResources, MAX_RESOURCE_VIEWS),
            blend_state: owned(blend_state),
            blend_factor,
            sample_mask,
            depth_stencil_state: owned(depth_stencil_state),
            stencil_ref,
            render_targets: targets.iter().map(|&p| owned(p)).collect(),
            depth_stencil: owned(depth_stencil),
        }
    }

    pub unsafe fn apply(&self, device: &ComPtr<ID3D10Device>) {
        device.IASetPrimitiveTopology(self.topology);
        device.IASetInputLayout(raw(&self.input_layout));
        let vertex_buffer = raw(&self.vertex_buffer);
        device.IASetVertexBuffers(0, 1, &vertex_buffer, &self.vertex_stride, &self.vertex_offset);

        device.RSSetState(raw(&self.rasterizer));
        device.RSSetViewports(self.viewports.len() as UINT, self.viewports.as_ptr());

        device.VSSetShader(raw(&self.vertex_shader));
        device.GSSetShader(raw(&self.geometry_shader));
        device.PSSetShader(raw(&self.pixel_shader));

        let (vs, ps) = (raw_list(&self.vs_samplers), raw_list(&self.ps_samplers));
        device.VSSetSamplers(0, vs.len() as UINT, vs.as_ptr());
        device.PSSetSamplers(0, ps.len() as UINT, ps.as_ptr());
        let (vs, ps) = (raw_list(&self.vs_buffers), raw_list(&self.ps_buffers));
        device.VSSetConstantBuffers(0, vs.len() as UINT, vs.as_ptr());
        device.PSSetConstantBuffers(0, ps.len() as UINT, ps.as_ptr());
        let (vs, ps) = (raw_list(&self.vs_resources), raw_list(&self.ps_resources));
        device.VSSetShaderResources(0, vs.len() as UINT, vs.as_ptr());
        device.PSSetShaderResources(0, ps.len() as UINT, ps.as_ptr());

        device.OMSetBlendState(raw(&self.blend_state), &self.blend_factor, self.sample_mask);
        device.OMSetDepthStencilState(raw(&self.depth_stencil_state), self.stencil_ref);
        let targets = raw_list(&self.render_targets);
        device.OMSetRenderTargets(targets.len() as UINT, targets.as_ptr(), raw(&self.depth_stencil));
    }
}
