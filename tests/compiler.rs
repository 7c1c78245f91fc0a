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

mod common;

use std::rc::Rc;

use postfx::tree::{Annotation, BaseClass, Expression, Properties, Struct, Technique, TextureFilter,
                   TextureFormat, Tree, Type, Value, Variable};
use postfx::{Config, Error, TextureSource};
use postfx_core::format::Format;
use postfx_core::shade::{CompileFlags, Stage};
use postfx_core::tex::Bind;
use postfx_core::Viewport;

use common::{pass, pass_to, pixel_shader, sampler, texture, texture_with, uniform, vertex_shader};

fn compile_error(runtime: &mut common::TestRuntime, tree: Tree) -> String {
    match runtime.update_effect(Rc::new(tree)) {
        Err(Error::Compile(e)) => e.diagnostics,
        other => panic!("expected a compile error, got {:?}", other),
    }
}

#[test]
fn textures_and_samplers_are_declared_in_order() {
    let color = texture("Color", 64, 64);
    let tree = common::effect(vec![color.clone(), sampler("ColorSampler", &color)], 1);
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(tree)).unwrap();

    let source = &runtime.device().compiled[0].source;
    assert!(source.starts_with("struct __sampler2D"));
    assert!(source.contains("Texture2D Color : register(t0), __ColorSRGB : register(t1);\n"));
    assert!(source.contains("SamplerState __SamplerState0 : register(s0);\n"));
    assert!(source.contains("static const __sampler2D ColorSampler = { Color, __SamplerState0 };\n"));
    assert!(source.contains("float4 PS() : SV_TARGET\n"));
}

#[test]
fn srgb_samplers_read_the_srgb_view() {
    let color = texture("Color", 64, 64);
    let linear = texture_with("Lut", Properties { format: TextureFormat::R32F, .. Properties::default() });
    let srgb = |name: &str, texture: &Rc<Variable>| {
        let mut properties = Properties { texture: Some(texture.clone()), .. Properties::default() };
        properties.srgb_texture = true;
        Rc::new(Variable::new(name, Type::sampler()).properties(properties))
    };
    let tree = common::effect(vec![color.clone(), linear.clone(), srgb("A", &color), srgb("B", &linear)], 1);
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(tree)).unwrap();

    let source = &runtime.device().compiled[0].source;
    assert!(source.contains("A = { __ColorSRGB, __SamplerState0 }"));
    // R32F has no sRGB format, both registers hold the same view
    assert!(source.contains("B = { __LutSRGB, __SamplerState0 }"));
}

#[test]
fn identical_samplers_are_shared() {
    let a = texture("A", 16, 16);
    let b = texture("B", 16, 16);
    let mut point = Properties { texture: Some(b.clone()), .. Properties::default() };
    point.min_filter = TextureFilter::Point;
    point.mag_filter = TextureFilter::Point;
    point.mip_filter = TextureFilter::Point;
    let c = Rc::new(Variable::new("C", Type::sampler()).properties(point));
    let tree = common::effect(vec![a.clone(), b.clone(), sampler("SA", &a), sampler("SB", &b), c], 1);
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(tree)).unwrap();
    assert_eq!(runtime.effect().unwrap().samplers().len(), 2);
}

#[test]
fn memory_textures() {
    let mut noise = Properties { width: 64, height: 32, mip_levels: 4, .. Properties::default() };
    noise.format = TextureFormat::RGBA8;
    let lut = Properties { format: TextureFormat::R32F, .. Properties::default() };
    let packed = Properties { width: 16, height: 16, format: TextureFormat::DXT1, .. Properties::default() };
    let tree = common::effect(vec![texture_with("Noise", noise), texture_with("Lut", lut),
                                   texture_with("Packed", packed)], 1);
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(tree)).unwrap();
    let effect = runtime.effect().unwrap();

    let noise = effect.texture("Noise").unwrap();
    assert_eq!(noise.source, TextureSource::Memory);
    assert_eq!((noise.width, noise.height, noise.levels), (64, 32, 4));
    let info = *noise.texture().unwrap().info();
    assert_eq!(info.format, Format::R8G8B8A8_TYPELESS);
    assert_eq!(info.bind, Bind::SHADER_RESOURCE | Bind::RENDER_TARGET);
    assert!(info.generate_mips);
    assert_eq!(noise.shader_resource_view(false).unwrap().info().desc.format, Format::R8G8B8A8_UNORM);
    assert_eq!(noise.shader_resource_view(true).unwrap().info().desc.format, Format::R8G8B8A8_UNORM_SRGB);

    let lut = effect.texture("Lut").unwrap();
    assert_eq!(lut.shader_resource_view(true), lut.shader_resource_view(false));

    let packed = effect.texture("Packed").unwrap().texture().unwrap().info();
    assert_eq!(packed.bind, Bind::SHADER_RESOURCE);
    assert!(!packed.generate_mips);

    assert_eq!(effect.shader_resources().len(), 6);
    assert_eq!(effect.texture("Packed").unwrap().register(), 4);
}

#[test]
fn zero_mip_levels_is_a_warning() {
    let properties = Properties { mip_levels: 0, .. Properties::default() };
    let mut runtime = common::runtime();
    let warnings = runtime.update_effect(Rc::new(common::effect(vec![texture_with("T", properties)], 1)))
        .unwrap();
    assert!(warnings.contains("warning: a texture cannot have 0 miplevels"));
    assert_eq!(runtime.effect().unwrap().texture("T").unwrap().levels, 1);
}

#[test]
fn semantics_bind_swap_chain_surfaces() {
    let color = Rc::new(Variable::new("Screen", Type::texture()).semantic("COLOR"));
    let depth = Rc::new(Variable::new("Depth", Type::texture()).semantic("DEPTH"));
    let mut runtime = common::runtime();
    let warnings = runtime.update_effect(Rc::new(common::effect(vec![color, depth], 1))).unwrap();
    assert!(warnings.is_empty());

    let back_buffer = runtime.back_buffer().unwrap().clone();
    let effect = runtime.effect().unwrap();
    let screen = effect.texture("Screen").unwrap();
    assert_eq!(screen.source, TextureSource::BackBuffer);
    assert_eq!(screen.shader_resource_view(false), Some(&back_buffer.shader_resources[0]));
    assert_eq!(screen.shader_resource_view(true), Some(&back_buffer.shader_resources[1]));
    assert_eq!((screen.width, screen.height), (common::WIDTH, common::HEIGHT));

    // no depth source was detected yet
    let depth = effect.texture("Depth").unwrap();
    assert_eq!(depth.source, TextureSource::DepthStencil);
    assert!(depth.shader_resource_view(false).is_none());
    assert_eq!((depth.width, depth.height), (0, 0));
}

#[test]
fn surface_textures_ignore_their_properties() {
    let properties = Properties { width: 16, .. Properties::default() };
    let color = Rc::new(Variable::new("Screen", Type::texture())
        .semantic("COLOR").properties(properties));
    let mut runtime = common::runtime();
    let warnings = runtime.update_effect(Rc::new(common::effect(vec![color], 1))).unwrap();
    assert!(warnings.contains("texture property on backbuffer textures are ignored"));
}

#[test]
fn sampler_without_texture() {
    let lonely = Rc::new(Variable::new("Lonely", Type::sampler()));
    let mut runtime = common::runtime();
    let diagnostics = compile_error(&mut runtime, common::effect(vec![lonely], 1));
    assert!(diagnostics.contains("error: sampler 'Lonely' is missing required 'Texture' required."));
    assert!(runtime.effect().is_none());
}

#[test]
fn failed_compilation_keeps_the_previous_effect() {
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(common::effect(Vec::new(), 2))).unwrap();

    runtime.device_mut().failures.shaders
        .insert("Broken".to_string(), "fx(3, 1): error X3004: undeclared identifier 'x'".to_string());
    let vs = vertex_shader("VS");
    let ps = pixel_shader("Broken");
    let tree = Tree {
        functions: vec![vs.clone(), ps.clone()],
        techniques: vec![Technique::new("Other", vec![pass("P", &vs, &ps)])],
        .. Tree::default()
    };
    let diagnostics = compile_error(&mut runtime, tree);
    assert!(diagnostics.contains("X3004"));

    let effect = runtime.effect().unwrap();
    assert!(effect.technique("Main").is_some());
    assert!(effect.technique("Other").is_none());
}

#[test]
fn shaders_are_compiled_once_per_entry_point() {
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(common::effect(Vec::new(), 3))).unwrap();

    let compiled = &runtime.device().compiled;
    assert_eq!(compiled.len(), 2);
    assert_eq!((compiled[0].entry.as_str(), compiled[0].stage), ("VS", Stage::Vertex));
    assert_eq!((compiled[1].entry.as_str(), compiled[1].stage), ("PS", Stage::Pixel));
    assert_eq!(compiled[0].flags, CompileFlags::STRICT);

    let passes = &runtime.effect().unwrap().technique("Main").unwrap().passes;
    assert!(passes.iter().all(|p| p.vertex_shader == passes[0].vertex_shader));
    assert!(passes[0].vertex_shader.is_some() && passes[0].pixel_shader.is_some());
}

#[test]
fn debug_config_skips_optimization() {
    let config = Config { skip_shader_optimization: true };
    let mut runtime = common::runtime_with(common::desc(Format::R8G8B8A8_UNORM, 1), config);
    runtime.update_effect(Rc::new(common::effect(Vec::new(), 1))).unwrap();
    assert!(runtime.device().compiled[0].flags.contains(CompileFlags::STRICT | CompileFlags::SKIP_OPTIMIZATION));
}

#[test]
fn disabled_techniques() {
    let mut tree = common::effect(Vec::new(), 1);
    let mut off = tree.techniques[0].clone();
    off.name = "Off".to_string();
    off.annotations.push(Annotation::new("enabled", Value::bools(&[false])));
    tree.techniques.push(off);

    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(tree)).unwrap();
    let effect = runtime.effect().unwrap();
    assert!(effect.technique("Main").unwrap().enabled);
    assert!(!effect.technique("Off").unwrap().enabled);
}

#[test]
fn passes_default_to_the_back_buffer() {
    let mut tree = common::effect(Vec::new(), 2);
    tree.techniques[0].passes[1].states.srgb_write_enable = true;
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(tree)).unwrap();

    let back_buffer = runtime.back_buffer().unwrap().clone();
    let passes = &runtime.effect().unwrap().technique("Main").unwrap().passes;
    assert_eq!(passes[0].render_targets[0], Some(back_buffer.render_targets[0].clone()));
    assert_eq!(passes[1].render_targets[0], Some(back_buffer.render_targets[1].clone()));
    assert!(passes[0].render_targets[1 ..].iter().all(Option::is_none));
    assert_eq!(passes[0].viewport, Viewport::full(common::WIDTH, common::HEIGHT));
    assert!(passes[0].blend_state.is_some() && passes[0].depth_stencil_state.is_some());
}

#[test]
fn render_targets_are_unbound_as_inputs() {
    let target = texture("Target", 64, 32);
    let other = texture("Other", 64, 32);
    let vs = vertex_shader("VS");
    let ps = pixel_shader("PS");
    let tree = Tree {
        variables: vec![target.clone(), other.clone()],
        functions: vec![vs.clone(), ps.clone()],
        techniques: vec![Technique::new("Main", vec![pass_to("P", &vs, &ps, &[&target])])],
        .. Tree::default()
    };
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(tree)).unwrap();
    let effect = runtime.effect().unwrap();
    let pass = &effect.technique("Main").unwrap().passes[0];

    assert_eq!(pass.viewport, Viewport::full(64, 32));
    assert_eq!(pass.render_targets[0].as_ref(), effect.texture("Target").unwrap().render_target_view(false));
    assert!(pass.render_targets[0].is_some());
    assert!(effect.shader_resources()[0].is_some());
    assert_eq!(&pass.shader_resources[.. 2], &[None, None]);
    assert!(pass.shader_resources[2].is_some() && pass.shader_resources[3].is_some());
}

#[test]
fn render_targets_must_match_in_size() {
    let a = texture("A", 64, 32);
    let b = texture("B", 32, 32);
    let vs = vertex_shader("VS");
    let ps = pixel_shader("PS");
    let tree = Tree {
        variables: vec![a.clone(), b.clone()],
        functions: vec![vs.clone(), ps.clone()],
        techniques: vec![Technique::new("Main", vec![pass_to("P", &vs, &ps, &[&a, &b])])],
        .. Tree::default()
    };
    let mut runtime = common::runtime();
    let diagnostics = compile_error(&mut runtime, tree);
    assert!(diagnostics.contains("cannot use multiple rendertargets with different sized textures."));
}

#[test]
fn device_failures_are_reported() {
    let mut runtime = common::runtime();
    runtime.device_mut().failures.textures = true;
    let diagnostics = compile_error(&mut runtime, common::effect(vec![texture("T", 8, 8)], 1));
    assert!(diagnostics.contains("'CreateTexture2D' failed with"));
}

fn layout_effect() -> Tree {
    let color = texture("Color", 64, 64);
    let noise = texture("Noise", 32, 32);
    let mut point = Properties { texture: Some(noise.clone()), .. Properties::default() };
    point.min_filter = TextureFilter::Point;
    point.mag_filter = TextureFilter::Point;
    let noise_sampler = Rc::new(Variable::new("NoiseSampler", Type::sampler()).properties(point));
    let params = Rc::new(Struct::new("Params", vec![
        Rc::new(uniform("Strength", Type::scalar(BaseClass::Float)).initializer(Expression::float(0.5))),
        Rc::new(uniform("Offset", Type::vector(BaseClass::Float, 2))),
    ]));
    let variables = vec![
        color.clone(),
        noise,
        sampler("ColorSampler", &color),
        noise_sampler,
        Rc::new(uniform("Gain", Type::scalar(BaseClass::Float))),
        Rc::new(uniform("Block", Type::structure(params))),
    ];
    common::effect(variables, 2)
}

#[test]
fn compiling_twice_emits_identical_source() {
    let tree = Rc::new(layout_effect());
    let mut first = common::runtime();
    let mut second = common::runtime();
    first.update_effect(tree.clone()).unwrap();
    second.update_effect(tree).unwrap();

    let records = |runtime: &common::TestRuntime| runtime.device().compiled.clone();
    assert_eq!(records(&first).len(), 2);
    assert_eq!(records(&first), records(&second));

    let (a, b) = (first.effect().unwrap(), second.effect().unwrap());
    let registers = |effect: &postfx::Effect<postfx_backend_empty::Resources>| {
        effect.textures().iter().map(|t| (t.name.clone(), t.register())).collect::<Vec<_>>()
    };
    assert_eq!(registers(a), registers(b));
    assert_eq!(a.uniforms(), b.uniforms());
    assert_eq!(a.samplers().len(), 2);
    assert_eq!(a.samplers().len(), b.samplers().len());
    assert_eq!(a.constant_buffers().len(), 2);
    assert_eq!(a.constant_buffers().len(), b.constant_buffers().len());
    assert_eq!(a.shader_resources().len(), b.shader_resources().len());
    assert_eq!(a.technique("Main").unwrap().passes.len(), 2);
}
