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

use postfx::tree::{Properties, Type, Variable};
use postfx::{Config, Error, Runtime, UpdateError};
use postfx_backend_empty::{Command, Device};
use postfx_core::format::Format;
use postfx_core::Device as _;

use common::{texture_with, TestRuntime};

fn releases(commands: &[Command]) -> usize {
    commands.iter()
        .filter(|c| match **c {
            Command::ReleaseState(_) => true,
            _ => false,
        })
        .count()
}

#[test]
fn lost_until_created() {
    common::init();
    let mut runtime: TestRuntime = Runtime::new(Device::new(), Config::default());
    assert!(runtime.is_lost());
    runtime.on_present();
    assert!(runtime.device().commands.is_empty());
    assert_eq!(runtime.update_effect(Rc::new(common::effect(Vec::new(), 1))).unwrap_err(), Error::Lost);
    assert_eq!(runtime.screenshot(), Err(Error::Lost));
    assert_eq!(runtime.update_texture("Noise", 0, &[]), Err(Error::NoEffect));
}

#[test]
fn reset_releases_swap_chain_objects() {
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(common::effect(Vec::new(), 1))).unwrap();
    assert!(!runtime.is_lost());

    runtime.on_reset();
    runtime.on_reset();
    assert!(runtime.is_lost());
    assert!(runtime.effect().is_none());
    assert!(runtime.back_buffer().is_none());
    assert!(runtime.default_depth_stencil().is_none());
    assert_eq!(releases(&runtime.device_mut().take_commands()), 1);

    runtime.on_present();
    assert!(runtime.device().commands.is_empty());
}

#[test]
fn recreation_rebuilds_the_effect() {
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(common::effect(Vec::new(), 1))).unwrap();
    runtime.on_reset();

    let desc = common::desc(Format::B8G8R8A8_UNORM, 1);
    let back_buffer = runtime.device_mut().create_back_buffer(desc.width, desc.height, desc.format, 1);
    runtime.on_create(desc, back_buffer.clone()).unwrap();
    assert!(!runtime.is_lost());
    assert_eq!(runtime.back_buffer().unwrap().texture, back_buffer);
    assert!(runtime.effect().unwrap().technique("Main").is_some());
}

#[test]
fn creating_again_resets_first() {
    let mut runtime = common::runtime();
    runtime.device_mut().take_commands();
    let desc = common::desc(Format::R8G8B8A8_UNORM, 1);
    let back_buffer = runtime.device_mut().create_back_buffer(desc.width, desc.height, desc.format, 1);
    runtime.on_create(desc, back_buffer).unwrap();
    assert_eq!(releases(&runtime.device_mut().take_commands()), 1);
    assert!(!runtime.is_lost());
}

#[test]
fn resize_rebuilds_at_the_new_size() {
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(common::effect(Vec::new(), 1))).unwrap();
    let mut desc = common::desc(Format::R8G8B8A8_UNORM, 1);
    desc.width = 800;
    desc.height = 600;
    let back_buffer = runtime.device_mut().create_back_buffer(800, 600, desc.format, 1);
    runtime.on_resize(desc, back_buffer).unwrap();

    let view = runtime.default_depth_stencil().unwrap();
    let info = *runtime.device().depth_stencil_texture(view).info();
    assert_eq!((info.width, info.height), (800, 600));
    assert!(runtime.effect().unwrap().technique("Main").is_some());
}

#[test]
fn default_depth_stencil_matches_the_swap_chain() {
    let runtime = common::runtime();
    let view = runtime.default_depth_stencil().unwrap();
    let info = *runtime.device().depth_stencil_texture(view).info();
    assert_eq!((info.width, info.height), (common::WIDTH, common::HEIGHT));
    assert_eq!(info.format, Format::D24_UNORM_S8_UINT);
}

#[test]
fn multisampled_hosts_render_to_a_stand_in() {
    let mut runtime = common::runtime_with(common::desc(Format::R8G8B8A8_UNORM, 4), Config::default());
    runtime.update_effect(Rc::new(common::effect(Vec::new(), 1))).unwrap();
    let back_buffer = runtime.back_buffer().unwrap().clone();
    assert!(back_buffer.is_replaced());
    assert_eq!(back_buffer.replacement.info().samples.count, 4);
    assert_eq!(back_buffer.texture.info().samples.count, 1);
    assert_eq!(runtime.on_get_back_buffer(back_buffer.texture.clone()), back_buffer.replacement);

    runtime.device_mut().take_commands();
    runtime.on_present();
    let commands = runtime.device_mut().take_commands();
    let resolve = Command::ResolveSubresource {
        dst: back_buffer.texture.id(),
        src: back_buffer.replacement.id(),
        format: Format::R8G8B8A8_UNORM,
    };
    let resolved = commands.iter().position(|c| *c == resolve).unwrap();
    let drawn = commands.iter().position(|c| match *c {
        Command::Draw(..) => true,
        _ => false,
    }).unwrap();
    assert!(resolved < drawn);
}

#[test]
fn single_sampled_back_buffer_is_handed_out_unchanged() {
    let runtime = common::runtime();
    let back_buffer = runtime.back_buffer().unwrap();
    assert!(!back_buffer.is_replaced());
    assert_eq!(runtime.on_get_back_buffer(back_buffer.texture.clone()), back_buffer.texture);
    let copy = back_buffer.copy.info();
    assert_eq!(copy.format, Format::R8G8B8A8_TYPELESS);
    assert_eq!((copy.width, copy.height), (common::WIDTH, common::HEIGHT));
}

#[test]
fn host_bindings_survive_present() {
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(common::effect(Vec::new(), 2))).unwrap();
    let target = runtime.back_buffer().unwrap().render_targets[1].clone();
    let depth_stencil = runtime.default_depth_stencil().unwrap().clone();
    runtime.device_mut().set_render_targets(&[Some(target.clone()), None], Some(&depth_stencil));

    runtime.on_present();
    let (targets, bound) = runtime.device().render_targets();
    assert_eq!(targets[0], Some(target));
    assert!(targets[1 ..].iter().all(Option::is_none));
    assert_eq!(bound, Some(depth_stencil));
}

fn screenshot_of(format: Format, pixels: Vec<u8>) -> Result<Vec<u8>, Error> {
    let mut runtime = common::runtime_with(common::desc(format, 1), Config::default());
    let texture = runtime.back_buffer().unwrap().texture.clone();
    let mut data = pixels;
    data.resize(common::WIDTH as usize * common::HEIGHT as usize * 4, 0x10);
    runtime.device_mut().fill_texture(&texture, data);
    runtime.screenshot()
}

#[test]
fn screenshot_swizzles_bgra() {
    let pixels = screenshot_of(Format::B8G8R8A8_UNORM, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    assert_eq!(pixels.len(), common::WIDTH as usize * common::HEIGHT as usize * 4);
    assert_eq!(&pixels[.. 8], &[3, 2, 1, 0xFF, 7, 6, 5, 0xFF]);
    assert_eq!(&pixels[pixels.len() - 4 ..], &[0x10, 0x10, 0x10, 0xFF]);
}

#[test]
fn screenshot_keeps_rgba() {
    let pixels = screenshot_of(Format::R8G8B8A8_UNORM_SRGB, vec![1, 2, 3, 4]).unwrap();
    assert_eq!(&pixels[.. 4], &[1, 2, 3, 0xFF]);
}

#[test]
fn screenshot_of_unsupported_format() {
    assert_eq!(screenshot_of(Format::R16G16B16A16_FLOAT, Vec::new()),
               Err(Error::UnsupportedFormat(Format::R16G16B16A16_FLOAT)));
}

#[test]
fn screenshot_map_failure() {
    let mut runtime = common::runtime();
    runtime.device_mut().failures.map = true;
    match runtime.screenshot() {
        Err(Error::Map(_)) => (),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn texture_uploads() {
    let noise = texture_with("Noise", Properties { width: 16, height: 16, mip_levels: 3, .. Properties::default() });
    let screen = Rc::new(Variable::new("Screen", Type::texture()).semantic("COLOR"));
    let mut runtime = common::runtime();
    runtime.update_effect(Rc::new(common::effect(vec![noise, screen], 1))).unwrap();
    runtime.device_mut().take_commands();

    runtime.update_texture("Noise", 0, &[0x80; 16 * 16 * 4]).unwrap();
    let (resource, view) = {
        let noise = runtime.effect().unwrap().texture("Noise").unwrap();
        (noise.texture().unwrap().id(), noise.shader_resource_view(false).unwrap().id())
    };
    assert_eq!(runtime.device_mut().take_commands(),
               vec![Command::UpdateTexture(resource, 0, 1024), Command::GenerateMips(view)]);

    runtime.update_texture("Noise", 2, &[0x80; 4 * 4 * 4]).unwrap();
    assert_eq!(runtime.device_mut().take_commands(), vec![Command::UpdateTexture(resource, 2, 64)]);

    assert_eq!(runtime.update_texture("Noise", 3, &[]),
               Err(Error::Update(UpdateError::InvalidLevel { level: 3, levels: 3 })));
    assert_eq!(runtime.update_texture("Screen", 0, &[]),
               Err(Error::Update(UpdateError::NotInMemory("Screen".to_string()))));
    assert_eq!(runtime.update_texture("Missing", 0, &[]),
               Err(Error::Update(UpdateError::UnknownTexture("Missing".to_string()))));
}

#[test]
fn errors_read_well() {
    assert_eq!(Error::Lost.to_string(), "The swap chain is not available");
    let e = Error::from(UpdateError::UnknownUniform("Tint".to_string()));
    assert_eq!(e.to_string(), "No uniform named 'Tint'");
    assert!(std::error::Error::source(&e).is_some());
}
