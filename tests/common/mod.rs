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

#![allow(dead_code)]

use std::rc::Rc;
use std::sync::atomic::AtomicUsize;

use postfx::tree::{BaseClass, Expression, Function, Pass, PassStates, Properties, Qualifiers,
                   Statement, Technique, Tree, Type, Value, Variable};
use postfx::{Config, Runtime, SwapChainDesc};
use postfx_backend_empty::{Device, Resources};
use postfx_core::format::{Format, SampleDesc};

pub type TestRuntime = Runtime<Resources, Device>;

pub const WIDTH: u32 = 320;
pub const HEIGHT: u32 = 240;

/// Network traffic nobody reports to.
static QUIET: AtomicUsize = AtomicUsize::new(0);

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn desc(format: Format, samples: u32) -> SwapChainDesc {
    SwapChainDesc {
        width: WIDTH,
        height: HEIGHT,
        format,
        samples: SampleDesc { count: samples, quality: 0 },
    }
}

pub fn runtime_with(desc: SwapChainDesc, config: Config) -> TestRuntime {
    init();
    let mut runtime: TestRuntime = Runtime::new(Device::new(), config).with_traffic_counter(&QUIET);
    let back_buffer = runtime.device_mut().create_back_buffer(desc.width, desc.height, desc.format, 1);
    runtime.on_create(desc, back_buffer).unwrap();
    runtime
}

pub fn runtime() -> TestRuntime {
    runtime_with(desc(Format::R8G8B8A8_UNORM, 1), Config::default())
}

pub fn uniform(name: &str, ty: Type) -> Variable {
    Variable::new(name, ty.qualified(Qualifiers::UNIFORM))
}

pub fn texture_with(name: &str, properties: Properties) -> Rc<Variable> {
    Rc::new(Variable::new(name, Type::texture()).properties(properties))
}

pub fn texture(name: &str, width: u32, height: u32) -> Rc<Variable> {
    texture_with(name, Properties { width, height, .. Properties::default() })
}

pub fn sampler(name: &str, texture: &Rc<Variable>) -> Rc<Variable> {
    let properties = Properties { texture: Some(texture.clone()), .. Properties::default() };
    Rc::new(Variable::new(name, Type::sampler()).properties(properties))
}

fn return_float4(value: [f32; 4]) -> Statement {
    Statement::compound(vec![Statement::ret(Some(Expression::literal(
        Type::vector(BaseClass::Float, 4), Value::Float(value.to_vec()))))])
}

pub fn vertex_shader(name: &str) -> Rc<Function> {
    let id = Rc::new(Variable::new("id", Type::scalar(BaseClass::Uint).qualified(Qualifiers::IN))
        .semantic("VERTEXID"));
    Rc::new(Function::new(Type::vector(BaseClass::Float, 4), name, vec![id], "POSITION",
                          return_float4([0.0, 0.0, 0.0, 1.0])))
}

pub fn pixel_shader(name: &str) -> Rc<Function> {
    Rc::new(Function::new(Type::vector(BaseClass::Float, 4), name, Vec::new(), "COLOR",
                          return_float4([1.0, 1.0, 1.0, 1.0])))
}

pub fn pass(name: &str, vs: &Rc<Function>, ps: &Rc<Function>) -> Pass {
    Pass::new(name, PassStates {
        vertex_shader: Some(vs.clone()),
        pixel_shader: Some(ps.clone()),
        .. PassStates::default()
    })
}

/// A pass rendering into effect textures instead of the back buffer.
pub fn pass_to(name: &str, vs: &Rc<Function>, ps: &Rc<Function>, targets: &[&Rc<Variable>]) -> Pass {
    let mut pass = pass(name, vs, ps);
    for (slot, target) in targets.iter().enumerate() {
        pass.states.render_targets[slot] = Some((*target).clone());
    }
    pass
}

/// An effect with the given variables and one technique `Main` of `passes` full-screen passes.
pub fn effect(variables: Vec<Rc<Variable>>, passes: usize) -> Tree {
    let vs = vertex_shader("VS");
    let ps = pixel_shader("PS");
    let passes = (0 .. passes).map(|i| pass(&format!("P{}", i), &vs, &ps)).collect();
    Tree {
        variables,
        functions: vec![vs, ps],
        techniques: vec![Technique::new("Main", passes)],
        .. Tree::default()
    }
}
