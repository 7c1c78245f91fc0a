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

//! Immediate context operations.

use std::{mem, ptr, slice};

use winapi::shared::minwindef::UINT;
use winapi::shared::winerror;
use winapi::um::d3d10::*;
use winapi::um::d3dcommon::{D3D10_PRIMITIVE_TOPOLOGY_LINELIST, D3D10_PRIMITIVE_TOPOLOGY_LINESTRIP,
                            D3D10_PRIMITIVE_TOPOLOGY_POINTLIST,
                            D3D10_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
                            D3D10_PRIMITIVE_TOPOLOGY_TRIANGLESTRIP, D3D_PRIMITIVE_TOPOLOGY};
use wio::com::ComPtr;

use postfx_core::shade::Stage;
use postfx_core::tex::{Bind, TextureInfo, Usage};
use postfx_core::{ClearFlags, MapError, MappedTexture, Primitive, RenderTargets, Viewport,
                  MAX_RENDER_TARGETS};

use crate::factory;
use crate::native;
use crate::Resources;

pub fn map_primitive(primitive: Primitive) -> D3D_PRIMITIVE_TOPOLOGY {
    match primitive {
        Primitive::PointList => D3D10_PRIMITIVE_TOPOLOGY_POINTLIST,
        Primitive::LineList => D3D10_PRIMITIVE_TOPOLOGY_LINELIST,
        Primitive::LineStrip => D3D10_PRIMITIVE_TOPOLOGY_LINESTRIP,
        Primitive::TriangleList => D3D10_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
        Primitive::TriangleStrip => D3D10_PRIMITIVE_TOPOLOGY_TRIANGLESTRIP,
    }
}

fn raw_list<T, H, F>(handles: &[Option<H>], raw: F) -> Vec<*mut T>
    where F: Fn(&H) -> *mut T
{
    handles.iter()
           .map(|h| h.as_ref().map_or(ptr::null_mut(), |h| raw(h)))
           .collect()
}

pub fn unbind_vertex_input(device: &ComPtr<ID3D10Device>) {
    let buffer = ptr::null_mut();
    let (stride, offset) = (0, 0);
    unsafe {
        device.IASetInputLayout(ptr::null_mut());
        device.IASetVertexBuffers(0, 1, &buffer, &stride, &offset);
    }
}

pub fn set_samplers(device: &ComPtr<ID3D10Device>, stage: Stage, samplers: &[native::Sampler]) {
    let raw: Vec<_> = samplers.iter().map(native::Sampler::as_raw).collect();
    unsafe {
        match stage {
            Stage::Vertex => device.VSSetSamplers(0, raw.len() as UINT, raw.as_ptr()),
            Stage::Pixel => device.PSSetSamplers(0, raw.len() as UINT, raw.as_ptr()),
        }
    }
}

pub fn set_constant_buffers(device: &ComPtr<ID3D10Device>, stage: Stage,
                            buffers: &[Option<native::Buffer>]) {
    let raw = raw_list(buffers, native::Buffer::as_raw);
    unsafe {
        match stage {
            Stage::Vertex => device.VSSetConstantBuffers(0, raw.len() as UINT, raw.as_ptr()),
            Stage::Pixel => device.PSSetConstantBuffers(0, raw.len() as UINT, raw.as_ptr()),
        }
    }
}

pub fn set_shader_resources(device: &ComPtr<ID3D10Device>, stage: Stage,
                            views: &[Option<native::Srv>]) {
    let raw = raw_list(views, native::Srv::as_raw);
    unsafe {
        match stage {
            Stage::Vertex => device.VSSetShaderResources(0, raw.len() as UINT, raw.as_ptr()),
            Stage::Pixel => device.PSSetShaderResources(0, raw.len() as UINT, raw.as_ptr()),
        }
    }
}

pub fn set_render_targets(device: &ComPtr<ID3D10Device>, targets: &[Option<native::Rtv>],
                          depth_stencil: Option<&native::Dsv>) {
    let raw = raw_list(targets, native::Rtv::as_raw);
    let depth_stencil = depth_stencil.map_or(ptr::null_mut(), native::Dsv::as_raw);
    unsafe {
        device.OMSetRenderTargets(raw.len() as UINT, raw.as_ptr(), depth_stencil);
    }
}

pub fn render_targets(device: &ComPtr<ID3D10Device>)
                      -> (RenderTargets<Resources>, Option<native::Dsv>) {
    let mut raw = [ptr::null_mut(); MAX_RENDER_TARGETS];
    let mut depth_stencil = ptr::null_mut();
    unsafe {
        device.OMGetRenderTargets(MAX_RENDER_TARGETS as UINT, raw.as_mut_ptr(), &mut depth_stencil);
    }
    let targets = raw.iter()
        .map(|&view| if view.is_null() { None } else { Some(unsafe { native::Rtv::from_raw(view) }) })
        .collect();
    let depth_stencil = if depth_stencil.is_null() {
        None
    } else {
        Some(unsafe { native::Dsv::from_raw(depth_stencil) })
    };
    (targets, depth_stencil)
}

pub fn set_viewports(device: &ComPtr<ID3D10Device>, viewports: &[Viewport]) {
    let raw: Vec<_> = viewports.iter().map(|v| D3D10_VIEWPORT {
        TopLeftX: v.x,
        TopLeftY: v.y,
        Width: v.width,
        Height: v.height,
        MinDepth: 0.0,
        MaxDepth: 1.0,
    }).collect();
    unsafe {
        device.RSSetViewports(raw.len() as UINT, raw.as_ptr());
    }
}

pub fn clear_depth_stencil(device: &ComPtr<ID3D10Device>, view: &native::Dsv, flags: ClearFlags,
                           depth: f32, stencil: u8) {
    let mut raw = 0;
    if flags.contains(ClearFlags::DEPTH) {
        raw |= D3D10_CLEAR_DEPTH;
    }
    if flags.contains(ClearFlags::STENCIL) {
        raw |= D3D10_CLEAR_STENCIL;
    }
    unsafe {
        device.ClearDepthStencilView(view.as_raw(), raw, depth, stencil);
    }
}

pub fn update_buffer(buffer: &native::Buffer, data: &[u8]) -> Result<(), MapError> {
    let mut desc: D3D10_BUFFER_DESC = unsafe { mem::zeroed() };
    unsafe { buffer.0.GetDesc(&mut desc) };
    let capacity = desc.ByteWidth as usize;
    if data.len() > capacity {
        return Err(MapError::OutOfBounds { size: data.len(), capacity });
    }
    if desc.CPUAccessFlags & D3D10_CPU_ACCESS_WRITE == 0 {
        return Err(MapError::Access);
    }

    let mut mapped = ptr::null_mut();
    let hr = unsafe { buffer.0.Map(D3D10_MAP_WRITE_DISCARD, 0, &mut mapped) };
    if !winerror::SUCCEEDED(hr) {
        return Err(MapError::Backend(hr));
    }
    unsafe {
        ptr::copy_nonoverlapping(data.as_ptr(), mapped as *mut u8, data.len());
        buffer.0.Unmap();
    }
    Ok(())
}

pub fn update_texture(device: &ComPtr<ID3D10Device>, texture: &native::Texture, level: u32,
                      data: &[u8], row_pitch: usize) {
    unsafe {
        device.UpdateSubresource(texture.as_raw(), level, ptr::null(), data.as_ptr() as *const _,
                                 row_pitch as UINT, data.len() as UINT);
    }
}

/// Copy the top level into a staging texture and read it back.
pub fn read_texture(device: &ComPtr<ID3D10Device>, texture: &native::Texture)
                    -> Result<MappedTexture, MapError> {
    let info = factory::texture_info(texture);
    let staging_info = TextureInfo {
        usage: Usage::Staging,
        ..TextureInfo::new(info.width, info.height, info.format, Bind::empty())
    };
    let staging = factory::create_texture_2d(device, &staging_info, None)
        .map_err(|_| MapError::Access)?;
    let staging = factory::texture_2d(&staging).ok_or(MapError::Access)?;
    unsafe {
        device.CopySubresourceRegion(staging.as_raw() as *mut ID3D10Resource, 0, 0, 0, 0,
                                     texture.as_raw(), 0, ptr::null());
    }

    let mut mapped: D3D10_MAPPED_TEXTURE2D = unsafe { mem::zeroed() };
    let hr = unsafe { staging.Map(0, D3D10_MAP_READ, 0, &mut mapped) };
    if !winerror::SUCCEEDED(hr) {
        return Err(MapError::Backend(hr));
    }
    let row_pitch = mapped.RowPitch as usize;
    let data = unsafe {
        slice::from_raw_parts(mapped.pData as *const u8, row_pitch * info.height as usize).to_vec()
    };
    unsafe { staging.Unmap(0) };
    Ok(MappedTexture { data, row_pitch })
}
