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

//! Reference-counted handles to device objects.
//!
//! Each handle owns one COM reference. Two handles are equal when they point to the same
//! object, which is how the host's objects are recognized when they come back through a hook.

use std::fmt;
use std::hash::{Hash, Hasher};

use winapi::um::d3d10;
use winapi::um::unknwnbase::IUnknown;
use wio::com::ComPtr;

macro_rules! com_handle {
    ($(#[$attr:meta])* $name:ident: $interface:ty) => {
        $(#[$attr])*
        #[derive(Clone)]
        pub struct $name(pub(crate) ComPtr<$interface>);

        impl $name {
            /// Take ownership of a reference, as returned by a `Create*` or `Get*` call.
            pub unsafe fn from_raw(raw: *mut $interface) -> Self {
                $name(ComPtr::from_raw(raw))
            }

            /// Wrap an object the caller keeps its own reference to.
            pub unsafe fn from_borrowed(raw: *mut $interface) -> Self {
                (*(raw as *mut IUnknown)).AddRef();
                $name(ComPtr::from_raw(raw))
            }

            pub fn as_raw(&self) -> *mut $interface {
                self.0.as_raw()
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &$name) -> bool {
                self.0.as_raw() == other.0.as_raw()
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                (self.0.as_raw() as usize).hash(state)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:p})"), self.0.as_raw())
            }
        }
    }
}

com_handle!(Buffer: d3d10::ID3D10Buffer);
com_handle!(
    /// Any resource. The runtime only creates 2D textures, hosts may hand in anything.
    Texture: d3d10::ID3D10Resource
);
com_handle!(Srv: d3d10::ID3D10ShaderResourceView);
com_handle!(Rtv: d3d10::ID3D10RenderTargetView);
com_handle!(Dsv: d3d10::ID3D10DepthStencilView);
com_handle!(Sampler: d3d10::ID3D10SamplerState);
com_handle!(VertexShader: d3d10::ID3D10VertexShader);
com_handle!(PixelShader: d3d10::ID3D10PixelShader);
com_handle!(BlendState: d3d10::ID3D10BlendState);
com_handle!(DepthStencilState: d3d10::ID3D10DepthStencilState);
com_handle!(RasterizerState: d3d10::ID3D10RasterizerState);

/// Slot of a captured pipeline state inside the device.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct StateBlock(pub usize);
