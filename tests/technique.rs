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

use postfx::tree::{Properties, Technique, Tree};
use postfx::PASS_VERTICES;
use postfx_backend_empty::Command;
use postfx_core::shade::Stage;
use postfx_core::{ClearFlags, Primitive, Viewport};

use common::{pass_to, pixel_shader, texture, texture_with, vertex_shader};

fn position(commands: &[Command], command: &Command) -> usize {
    commands.iter()
        .position(|c| c == command)
        .unwrap_or_else(|| panic!("{:?} was not recorded", command))
}

fn draws(commands: &[Command]) -> usize {
    commands.iter().filter(|c| **c == Command::Draw(PASS_VERTICES, 0)).count()
}

#[test]
fn full_screen_pass() {
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(common::effect(Vec::new(), 1))).unwrap();
    runtime.device_mut().take_commands();
    runtime.on_present();
    let commands = runtime.device_mut().take_commands();

    let back_buffer = runtime.back_buffer().unwrap();
    let target = back_buffer.render_targets[0].id();
    let depth_stencil = runtime.default_depth_stencil().unwrap().id();
    let effect = runtime.effect().unwrap();
    let pass = &effect.technique("Main").unwrap().passes[0];

    let begin = position(&commands, &Command::SetPrimitive(Primitive::TriangleList));
    let shader = position(&commands, &Command::SetVertexShader(pass.vertex_shader.as_ref().map(|s| s.id())));
    let copy = position(&commands, &Command::CopyResource { dst: back_buffer.copy.id(), src: back_buffer.texture.id() });
    let mut targets = vec![None; 8];
    targets[0] = Some(target);
    let bind = position(&commands, &Command::SetRenderTargets(targets, Some(depth_stencil)));
    let clear = position(&commands, &Command::ClearRenderTarget(target, [0.0; 4]));
    let draw = position(&commands, &Command::Draw(PASS_VERTICES, 0));
    assert!(begin < shader && shader < copy && copy < bind && bind < clear && clear < draw);
    assert_eq!(draws(&commands), 1);

    let depth_clear = position(&commands, &Command::ClearDepthStencil(
        depth_stencil, ClearFlags::DEPTH | ClearFlags::STENCIL, 1.0, 0));
    assert!(begin < depth_clear && depth_clear < shader);

    assert!(commands.contains(&Command::SetViewports(vec![Viewport::full(common::WIDTH, common::HEIGHT)])));
    assert!(commands.contains(&Command::SetSamplers(Stage::Pixel, Vec::new())));
    let rasterizer = position(&commands, &Command::SetRasterizer(None));
    assert!(draw < rasterizer);
    match commands[draw + 1 ..].iter().find(|c| c.is_target_bind()) {
        Some(&Command::SetRenderTargets(ref targets, None)) => assert_eq!(targets, &vec![None]),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn every_pass_of_enabled_techniques() {
    let mut tree = common::effect(Vec::new(), 2);
    let mut second = tree.techniques[0].clone();
    second.name = "Second".to_string();
    tree.techniques.push(second);
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(tree)).unwrap();

    runtime.on_present();
    assert_eq!(draws(&runtime.device_mut().take_commands()), 4);
    assert_eq!(runtime.stats().last_draw_calls, 4);
    assert_eq!(runtime.stats().last_vertices, 4 * PASS_VERTICES);

    runtime.set_technique_enabled("Second", false).unwrap();
    runtime.on_present();
    assert_eq!(draws(&runtime.device_mut().take_commands()), 2);
    assert!(runtime.set_technique_enabled("Missing", true).is_err());
}

#[test]
fn host_draws_count_towards_the_frame() {
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(common::effect(Vec::new(), 1))).unwrap();
    runtime.on_draw(300);
    runtime.on_draw(36);
    assert_eq!(runtime.stats().draw_calls, 2);
    runtime.on_present();

    let stats = *runtime.stats();
    assert_eq!((stats.last_draw_calls, stats.last_vertices), (3, 336 + PASS_VERTICES));
    assert_eq!((stats.draw_calls, stats.vertices), (0, 0));
    assert_eq!(stats.frame_count, 1);
}

#[test]
fn off_screen_pass() {
    let target = texture("Half", common::WIDTH / 2, common::HEIGHT / 2);
    let vs = vertex_shader("VS");
    let ps = pixel_shader("PS");
    let tree = Tree {
        variables: vec![target.clone()],
        functions: vec![vs.clone(), ps.clone()],
        techniques: vec![Technique::new("Main", vec![pass_to("P", &vs, &ps, &[&target])])],
        .. Tree::default()
    };
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(tree)).unwrap();
    runtime.device_mut().take_commands();
    runtime.on_present();
    let commands = runtime.device_mut().take_commands();

    let view = runtime.effect().unwrap().texture("Half").unwrap().render_target_view(false).unwrap().id();
    let mut targets = vec![None; 8];
    targets[0] = Some(view);
    let bind = position(&commands, &Command::SetRenderTargets(targets, None));
    let viewport = position(&commands, &Command::SetViewports(vec![Viewport::full(common::WIDTH / 2,
                                                                                  common::HEIGHT / 2)]));
    assert!(bind < viewport);
    assert!(!commands.iter().any(|c| match *c {
        Command::GenerateMips(_) => true,
        _ => false,
    }));
}

#[test]
fn render_targets_with_mipmaps_are_regenerated() {
    let properties = Properties { width: 64, height: 64, mip_levels: 3, .. Properties::default() };
    let target = texture_with("Bloom", properties);
    let vs = vertex_shader("VS");
    let ps = pixel_shader("PS");
    let tree = Tree {
        variables: vec![target.clone()],
        functions: vec![vs.clone(), ps.clone()],
        techniques: vec![Technique::new("Main", vec![pass_to("P", &vs, &ps, &[&target])])],
        .. Tree::default()
    };
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(tree)).unwrap();
    runtime.device_mut().take_commands();
    runtime.on_present();
    let commands = runtime.device_mut().take_commands();

    let view = runtime.effect().unwrap().texture("Bloom").unwrap().shader_resource_view(false).unwrap().id();
    let mips = position(&commands, &Command::GenerateMips(view));
    assert!(position(&commands, &Command::Draw(PASS_VERTICES, 0)) < mips);
}

#[test]
fn nothing_runs_without_an_effect() {
    let mut runtime = common::runtime();
    runtime.on_present();
    assert_eq!(draws(&runtime.device_mut().take_commands()), 0);
    assert_eq!(runtime.stats().frame_count, 1);
}
