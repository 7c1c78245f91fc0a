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

use std::ffi::CString;
use std::{ptr, slice};

use winapi::shared::minwindef::UINT;
use winapi::shared::winerror;
use winapi::um::d3dcommon::ID3DBlob;
use winapi::um::d3dcompiler;
use wio::com::ComPtr;

use postfx_core::shade::{CompileError, CompileFlags, Compiled, Stage};

fn blob_bytes(blob: &ComPtr<ID3DBlob>) -> &[u8] {
    unsafe {
        slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize())
    }
}

fn map_flags(flags: CompileFlags) -> UINT {
    let mut out = 0;
    if flags.contains(CompileFlags::STRICT) {
        out |= d3dcompiler::D3DCOMPILE_ENABLE_STRICTNESS;
    }
    if flags.contains(CompileFlags::SKIP_OPTIMIZATION) {
        out |= d3dcompiler::D3DCOMPILE_SKIP_OPTIMIZATION;
    }
    out
}

/// Compile HLSL for one entry point with the Shader Model 4 profile of the stage.
pub fn compile(source: &str, entry: &str, stage: Stage, flags: CompileFlags)
               -> Result<Compiled, CompileError> {
    let entry_name = CString::new(entry)
        .map_err(|_| CompileError(format!("Invalid entry point name {:?}", entry)))?;
    let target = CString::new(stage.profile())
        .map_err(|_| CompileError(format!("Invalid profile {:?}", stage.profile())))?;

    let mut code: *mut ID3DBlob = ptr::null_mut();
    let mut errors: *mut ID3DBlob = ptr::null_mut();
    let hr = unsafe {
        d3dcompiler::D3DCompile(
            source.as_ptr() as *const _,
            source.len(),
            ptr::null(),
            ptr::null(),
            ptr::null_mut(),
            entry_name.as_ptr(),
            target.as_ptr(),
            map_flags(flags),
            0,
            &mut code as *mut *mut _,
            &mut errors as *mut *mut _)
    };

    let log = if errors.is_null() {
        String::new()
    } else {
        let errors = unsafe { ComPtr::from_raw(errors) };
        String::from_utf8_lossy(blob_bytes(&errors))
            .trim_end_matches('\0')
            .to_string()
    };
    let code = if code.is_null() { None } else { Some(unsafe { ComPtr::from_raw(code) }) };

    match code {
        Some(ref code) if winerror::SUCCEEDED(hr) => Ok(Compiled {
            code: blob_bytes(code).to_vec(),
            log,
        }),
        _ => {
            debug!("D3DCompile of {} failed with 0x{:08X}", entry, hr);
            Err(CompileError(log))
        }
    }
}
