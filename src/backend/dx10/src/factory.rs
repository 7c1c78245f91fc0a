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

//! Object creation and queries.

use std::{mem, ptr};

use winapi::shared::dxgitype::DXGI_SAMPLE_DESC;
use winapi::shared::minwindef::UINT;
use winapi::shared::winerror::{self, HRESULT};
use winapi::um::d3d10::*;
use winapi::um::d3dcommon::{D3D10_SRV_DIMENSION_TEXTURE2D, D3D10_SRV_DIMENSION_TEXTURE2DMS};
use wio::com::ComPtr;

use postfx_core::format::{Format, SampleDesc};
use postfx_core::state::{BlendDesc, DepthStencilDesc, RasterizerDesc};
use postfx_core::tex::{Bind, SamplerInfo, TextureInfo, Usage, ViewDesc};
use postfx_core::CreationError;

use crate::data::{map_bind, map_format, unmap_bind, unmap_format};
use crate::native;
use crate::state;

pub fn creation_error(hr: HRESULT) -> CreationError {
    match hr {
        winerror::E_OUTOFMEMORY => CreationError::OutOfMemory,
        winerror::E_INVALIDARG => CreationError::InvalidDescriptor("rejected by the device"),
        _ => CreationError::Backend(hr),
    }
}

macro_rules! create {
    ($device:expr, $method:ident ( $($arg:expr),* ) -> $handle:path) => {{
        let mut object = ptr::null_mut();
        let hr = unsafe { $device.$method($($arg,)* &mut object as *mut *mut _) };
        if winerror::SUCCEEDED(hr) && !object.is_null() {
            Ok(unsafe { $handle(object) })
        } else {
            Err(creation_error(hr))
        }
    }}
}

fn map_usage(usage: Usage) -> (D3D10_USAGE, UINT) {
    match usage {
        Usage::GpuOnly => (D3D10_USAGE_DEFAULT, 0),
        Usage::Dynamic => (D3D10_USAGE_DYNAMIC, D3D10_CPU_ACCESS_WRITE),
        Usage::Staging => (D3D10_USAGE_STAGING, D3D10_CPU_ACCESS_READ),
    }
}

fn unmap_usage(usage: D3D10_USAGE) -> Usage {
    match usage {
        D3D10_USAGE_DYNAMIC => Usage::Dynamic,
        D3D10_USAGE_STAGING => Usage::Staging,
        _ => Usage::GpuOnly,
    }
}

pub fn texture_2d(texture: &native::Texture) -> Option<ComPtr<ID3D10Texture2D>> {
    texture.0.cast::<ID3D10Texture2D>().ok()
}

pub fn create_texture_2d(device: &ComPtr<ID3D10Device>, info: &TextureInfo, data: Option<&[u8]>)
                         -> Result<native::Texture, CreationError> {
    if info.width == 0 || info.height == 0 {
        return Err(CreationError::InvalidDescriptor("zero-sized texture"));
    }
    let (usage, cpu_access) = map_usage(info.usage);
    let desc = D3D10_TEXTURE2D_DESC {
        Width: info.width,
        Height: info.height,
        MipLevels: info.levels,
        ArraySize: 1,
        Format: map_format(info.format),
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: info.samples.count,
            Quality: info.samples.quality,
        },
        Usage: usage,
        BindFlags: map_bind(info.bind),
        CPUAccessFlags: cpu_access,
        MiscFlags: if info.generate_mips { D3D10_RESOURCE_MISC_GENERATE_MIPS } else { 0 },
    };
    let texture: ComPtr<ID3D10Texture2D> =
        create!(device, CreateTexture2D(&desc, ptr::null()) -> ComPtr::from_raw)?;
    let resource = native::Texture(texture.up::<ID3D10Resource>());

    if let Some(data) = data {
        let row_pitch = data.len() / info.height as usize;
        unsafe {
            device.UpdateSubresource(resource.as_raw(), 0, ptr::null(), data.as_ptr() as *const _,
                                     row_pitch as UINT, data.len() as UINT);
        }
    }
    Ok(resource)
}

pub fn texture_info(texture: &native::Texture) -> TextureInfo {
    let texture = match texture_2d(texture) {
        Some(texture) => texture,
        None => {
            warn!("{:?} is not a 2D texture", texture);
            return TextureInfo::new(0, 0, Format::Unknown, Bind::empty());
        }
    };
    let mut desc: D3D10_TEXTURE2D_DESC = unsafe { mem::zeroed() };
    unsafe { texture.GetDesc(&mut desc) };
    TextureInfo {
        width: desc.Width,
        height: desc.Height,
        levels: desc.MipLevels,
        format: unmap_format(desc.Format),
        samples: SampleDesc {
            count: desc.SampleDesc.Count,
            quality: desc.SampleDesc.Quality,
        },
        usage: unmap_usage(desc.Usage),
        bind: unmap_bind(desc.BindFlags),
        generate_mips: desc.MiscFlags & D3D10_RESOURCE_MISC_GENERATE_MIPS != 0,
    }
}

fn check_bind(texture: &native::Texture, needed: Bind) -> Result<(), CreationError> {
    if texture_info(texture).bind.contains(needed) {
        Ok(())
    } else {
        Err(CreationError::NoBindFlag)
    }
}

pub fn create_shader_resource_view(device: &ComPtr<ID3D10Device>, texture: &native::Texture,
                                   view: &ViewDesc)
                                   -> Result<native::Srv, CreationError> {
    check_bind(texture, Bind::SHADER_RESOURCE)?;
    let mut desc: D3D10_SHADER_RESOURCE_VIEW_DESC = unsafe { mem::zeroed() };
    desc.Format = map_format(view.format);
    if view.multisampled {
        desc.ViewDimension = D3D10_SRV_DIMENSION_TEXTURE2DMS;
    } else {
        desc.ViewDimension = D3D10_SRV_DIMENSION_TEXTURE2D;
        *unsafe { desc.u.Texture2D_mut() } = D3D10_TEX2D_SRV {
            MostDetailedMip: 0,
            MipLevels: view.levels,
        };
    }
    create!(device, CreateShaderResourceView(texture.as_raw(), &desc) -> native::Srv::from_raw)
}

pub fn create_render_target_view(device: &ComPtr<ID3D10Device>, texture: &native::Texture,
                                 view: &ViewDesc)
                                 -> Result<native::Rtv, CreationError> {
    check_bind(texture, Bind::RENDER_TARGET)?;
    let mut desc: D3D10_RENDER_TARGET_VIEW_DESC = unsafe { mem::zeroed() };
    desc.Format = map_format(view.format);
    if view.multisampled {
        desc.ViewDimension = D3D10_RTV_DIMENSION_TEXTURE2DMS;
    } else {
        desc.ViewDimension = D3D10_RTV_DIMENSION_TEXTURE2D;
        *unsafe { desc.u.Texture2D_mut() } = D3D10_TEX2D_RTV { MipSlice: 0 };
    }
    create!(device, CreateRenderTargetView(texture.as_raw(), &desc) -> native::Rtv::from_raw)
}

pub fn create_depth_stencil_view(device: &ComPtr<ID3D10Device>, texture: &native::Texture,
                                 view: Option<&ViewDesc>)
                                 -> Result<native::Dsv, CreationError> {
    check_bind(texture, Bind::DEPTH_STENCIL)?;
    let view = match view {
        Some(view) => view,
        None => return create!(device,
            CreateDepthStencilView(texture.as_raw(), ptr::null()) -> native::Dsv::from_raw),
    };
    let mut desc: D3D10_DEPTH_STENCIL_VIEW_DESC = unsafe { mem::zeroed() };
    desc.Format = map_format(view.format);
    if view.multisampled {
        desc.ViewDimension = D3D10_DSV_DIMENSION_TEXTURE2DMS;
    } else {
        desc.ViewDimension = D3D10_DSV_DIMENSION_TEXTURE2D;
        *unsafe { desc.u.Texture2D_mut() } = D3D10_TEX2D_DSV { MipSlice: 0 };
    }
    create!(device, CreateDepthStencilView(texture.as_raw(), &desc) -> native::Dsv::from_raw)
}

pub fn create_sampler(device: &ComPtr<ID3D10Device>, info: &SamplerInfo)
                      -> Result<native::Sampler, CreationError> {
    let desc = state::make_sampler(info);
    create!(device, CreateSamplerState(&desc) -> native::Sampler::from_raw)
}

pub fn create_constant_buffer(device: &ComPtr<ID3D10Device>, size: usize, data: &[u8])
                              -> Result<native::Buffer, CreationError> {
    if size == 0 || size % 16 != 0 {
        return Err(CreationError::InvalidDescriptor("constant buffer size must be a nonzero multiple of 16"));
    }
    let desc = D3D10_BUFFER_DESC {
        ByteWidth: size as UINT,
        Usage: D3D10_USAGE_DYNAMIC,
        BindFlags: D3D10_BIND_CONSTANT_BUFFER,
        CPUAccessFlags: D3D10_CPU_ACCESS_WRITE,
        MiscFlags: 0,
    };
    let mut contents = data.to_vec();
    contents.resize(size, 0);
    let initial = D3D10_SUBRESOURCE_DATA {
        pSysMem: contents.as_ptr() as *const _,
        SysMemPitch: 0,
        SysMemSlicePitch: 0,
    };
    create!(device, CreateBuffer(&desc, &initial) -> native::Buffer::from_raw)
}

pub fn create_blend_state(device: &ComPtr<ID3D10Device>, desc: &BlendDesc)
                          -> Result<native::BlendState, CreationError> {
    let desc = state::make_blend(desc);
    create!(device, CreateBlendState(&desc) -> native::BlendState::from_raw)
}

pub fn create_depth_stencil_state(device: &ComPtr<ID3D10Device>, desc: &DepthStencilDesc)
                                  -> Result<native::DepthStencilState, CreationError> {
    let desc = state::make_depth_stencil(desc);
    create!(device, CreateDepthStencilState(&desc) -> native::DepthStencilState::from_raw)
}

pub fn create_rasterizer_state(device: &ComPtr<ID3D10Device>, desc: &RasterizerDesc)
                               -> Result<native::RasterizerState, CreationError> {
    let desc = state::make_rasterizer(desc);
    create!(device, CreateRasterizerState(&desc) -> native::RasterizerState::from_raw)
}

pub fn create_vertex_shader(device: &ComPtr<ID3D10Device>, code: &[u8])
                            -> Result<native::VertexShader, CreationError> {
    create!(device, CreateVertexShader(code.as_ptr() as *const _, code.len())
            -> native::VertexShader::from_raw)
}

pub fn create_pixel_shader(device: &ComPtr<ID3D10Device>, code: &[u8])
                           -> Result<native::PixelShader, CreationError> {
    create!(device, CreatePixelShader(code.as_ptr() as *const _, code.len())
            -> native::PixelShader::from_raw)
}

fn view_resource(view: *mut ID3D10View) -> native::Texture {
    let mut resource = ptr::null_mut();
    unsafe {
        (*view).GetResource(&mut resource);
        native::Texture::from_raw(resource)
    }
}

pub fn shader_resource_texture(view: &native::Srv) -> native::Texture {
    view_resource(view.as_raw() as *mut ID3D10View)
}

pub fn render_target_texture(view: &native::Rtv) -> native::Texture {
    view_resource(view.as_raw() as *mut ID3D10View)
}

pub fn depth_stencil_texture(view: &native::Dsv) -> native::Texture {
    view_resource(view.as_raw() as *mut ID3D10View)
}

pub fn shader_resource_levels(view: &native::Srv) -> u32 {
    let mut desc: D3D10_SHADER_RESOURCE_VIEW_DESC = unsafe { mem::zeroed() };
    unsafe { view.0.GetDesc(&mut desc) };
    if desc.ViewDimension == D3D10_SRV_DIMENSION_TEXTURE2D {
        unsafe { desc.u.Texture2D().MipLevels }
    } else {
        1
    }
}
