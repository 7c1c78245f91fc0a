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

//! Creation and mapping errors
//!
//! Every fallible `Device` call reports one of these. The effect compiler turns them into
//! diagnostics, the per-frame code logs them and moves on.

use std::error::Error;
use std::fmt;

/// Error creating a device object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreationError {
    /// A required bind flag is not present on the texture.
    NoBindFlag,
    /// The descriptor was rejected before reaching the device.
    InvalidDescriptor(&'static str),
    /// The device ran out of memory.
    OutOfMemory,
    /// The backend refused the request.
    Unsupported,
    /// The backend returned a raw error code.
    Backend(i32),
}

impl CreationError {
    fn message(&self) -> &str {
        match *self {
            CreationError::NoBindFlag => "The required bind flag is not present on the texture",
            CreationError::InvalidDescriptor(_) => "The descriptor is invalid",
            CreationError::OutOfMemory => "Out of device memory",
            CreationError::Unsupported => "The backend refused the request",
            CreationError::Backend(_) => "The backend call failed",
        }
    }
}

impl fmt::Display for CreationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CreationError::InvalidDescriptor(what) => write!(f, "{}: {}", self.message(), what),
            CreationError::Backend(code) => write!(f, "{} with 0x{:08X}", self.message(), code),
            _ => write!(f, "{}", self.message()),
        }
    }
}

impl Error for CreationError {}

/// Error mapping a buffer or texture for CPU access.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapError {
    /// The resource was not created with the needed CPU access.
    Access,
    /// The data does not fit into the resource.
    OutOfBounds {
        /// Bytes provided.
        size: usize,
        /// Bytes available.
        capacity: usize,
    },
    /// The backend returned a raw error code.
    Backend(i32),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MapError::Access => write!(f, "The resource does not allow the requested CPU access"),
            MapError::OutOfBounds { size, capacity } =>
                write!(f, "Writing {} bytes into a resource of {} bytes", size, capacity),
            MapError::Backend(code) => write!(f, "Map failed with 0x{:08X}", code),
        }
    }
}

impl Error for MapError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_backend_code() {
        let err = CreationError::Backend(0x8007000Eu32 as i32);
        assert_eq!(err.to_string(), "The backend call failed with 0x8007000E");
    }

    #[test]
    fn display_out_of_bounds() {
        let err = MapError::OutOfBounds { size: 32, capacity: 16 };
        assert_eq!(err.to_string(), "Writing 32 bytes into a resource of 16 bytes");
    }
}
