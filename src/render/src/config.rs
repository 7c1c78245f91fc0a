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

//! Runtime configuration.

/// Options the host passes to the runtime.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct Config {
    /// Compile shaders without optimization, for readable disassembly.
    pub skip_shader_optimization: bool,
}

impl Config {
    /// Flags passed to the shader compiler.
    pub fn compile_flags(&self) -> postfx_core::shade::CompileFlags {
        use postfx_core::shade::CompileFlags;
        let mut flags = CompileFlags::STRICT;
        if self.skip_shader_optimization {
            flags |= CompileFlags::SKIP_OPTIMIZATION;
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postfx_core::shade::CompileFlags;

    #[test]
    fn strict_by_default() {
        assert_eq!(Config::default().compile_flags(), CompileFlags::STRICT);
        let debug = Config { skip_shader_optimization: true };
        assert!(debug.compile_flags().contains(CompileFlags::SKIP_OPTIMIZATION));
    }
}
