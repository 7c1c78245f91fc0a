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

//! Shader handling.

use std::error::Error;
use std::fmt;

/// Which program stage this shader represents.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Stage {
    Vertex,
    Pixel,
}

/// The stages a full-screen pass binds resources to.
pub const STAGES: [Stage; 2] = [Stage::Vertex, Stage::Pixel];

impl Stage {
    /// Shader Model 4.0 compilation target of this stage.
    pub fn profile(&self) -> &'static str {
        match *self {
            Stage::Vertex => "vs_4_0",
            Stage::Pixel => "ps_4_0",
        }
    }
}

bitflags!(
    /// Options passed to the shader compiler.
    pub struct CompileFlags: u8 {
        /// Refuse deprecated syntax.
        const STRICT            = 0x1;
        /// Keep the code as written, for debugging.
        const SKIP_OPTIMIZATION = 0x2;
    }
);

/// Byte code produced by the shader compiler, with the messages it printed.
#[derive(Clone, Debug, PartialEq)]
pub struct Compiled {
    /// Backend byte code.
    pub code: Vec<u8>,
    /// Warnings, verbatim.
    pub log: String,
}

/// The shader compiler refused the source. Holds its output verbatim.
#[derive(Clone, Debug, PartialEq)]
pub struct CompileError(pub String);

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Shader compilation failed: {}", self.0)
    }
}

impl Error for CompileError {}
