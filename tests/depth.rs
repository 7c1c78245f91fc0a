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
use std::sync::atomic::{AtomicUsize, Ordering};

use postfx::tree::{Tree, Type, Variable};
use postfx::{DepthReplacement, TextureSource};
use postfx_backend_empty::{DepthStencilView, Device, Resources};
use postfx_core::format::Format;
use postfx_core::tex::{Bind, TextureInfo, ViewDesc};
use postfx_core::Device as _;

use common::TestRuntime;

fn host_depth(runtime: &mut TestRuntime, width: u32, height: u32, samples: u32) -> DepthStencilView {
    let mut info = TextureInfo::new(width, height, Format::D24_UNORM_S8_UINT, Bind::DEPTH_STENCIL);
    info.samples.count = samples;
    let view = {
        let device = runtime.device_mut();
        let texture = device.create_texture_2d(&info, None).unwrap();
        device.create_depth_stencil_view(&texture, None).unwrap()
    };
    runtime.on_create_depth_stencil_view(&view);
    view
}

fn draw_to(runtime: &mut TestRuntime, view: &DepthStencilView, draws: u32, vertices: u32) {
    let view = runtime.on_set_depth_stencil_view(Some(view.clone()));
    runtime.device_mut().set_render_targets(&[None], view.as_ref());
    for _ in 0 .. draws {
        runtime.on_draw(vertices);
    }
}

fn depth_effect() -> Rc<Tree> {
    let depth = Rc::new(Variable::new("Depth", Type::texture()).semantic("DEPTH"));
    Rc::new(common::effect(vec![depth], 1))
}

#[test]
fn only_views_matching_the_back_buffer_are_tracked() {
    let mut runtime = common::runtime();
    let small = host_depth(&mut runtime, 128, 128, 1);
    let multisampled = host_depth(&mut runtime, common::WIDTH, common::HEIGHT, 4);
    let matching = host_depth(&mut runtime, common::WIDTH, common::HEIGHT, 1);

    let detector = runtime.detector();
    assert_eq!(detector.len(), 1);
    assert!(detector.get(&small).is_none() && detector.get(&multisampled).is_none());
    let info = detector.get(&matching).unwrap();
    assert_eq!((info.width, info.height), (common::WIDTH, common::HEIGHT));

    runtime.on_delete_depth_stencil_view(&matching);
    assert!(runtime.detector().is_empty());
}

#[test]
fn busiest_view_becomes_the_depth_source() {
    let mut runtime = common::runtime();
    runtime.update_effect(depth_effect()).unwrap();
    let scene = host_depth(&mut runtime, common::WIDTH, common::HEIGHT, 1);
    let shadow = host_depth(&mut runtime, common::WIDTH, common::HEIGHT, 1);

    // one heavy draw early in the frame beats many light ones late in it
    draw_to(&mut runtime, &scene, 1, 10_000);
    draw_to(&mut runtime, &shadow, 5, 100);
    assert_eq!(runtime.detector().get(&shadow).unwrap().draw_call_count, 6.0);
    runtime.on_present();

    let replacement = runtime.depth_replacement().unwrap().clone();
    assert_eq!(replacement.original, scene);
    assert_ne!(replacement.replacement, scene);
    let info = *replacement.texture.info();
    assert_eq!(info.format, Format::R24G8_TYPELESS);
    assert_eq!(info.bind, Bind::DEPTH_STENCIL | Bind::SHADER_RESOURCE);
    assert_eq!(replacement.shader_resource.info().desc.format, Format::R24_UNORM_X8_TYPELESS);

    // statistics start over for the next round
    assert_eq!(runtime.detector().get(&scene).unwrap().draw_vertices_count, 0.0);

    let effect = runtime.effect().unwrap();
    let depth = effect.texture("Depth").unwrap();
    assert_eq!(depth.source, TextureSource::DepthStencil);
    assert_eq!(depth.shader_resource_view(false), Some(&replacement.shader_resource));
    assert_eq!((depth.width, depth.height), (common::WIDTH, common::HEIGHT));
    let register = depth.register();
    assert_eq!(effect.technique("Main").unwrap().passes[0].shader_resources[register],
               Some(replacement.shader_resource.clone()));
}

#[test]
fn host_is_redirected_to_the_replacement() {
    let mut runtime = common::runtime();
    let scene = host_depth(&mut runtime, common::WIDTH, common::HEIGHT, 1);
    draw_to(&mut runtime, &scene, 3, 1000);
    runtime.on_present();

    let replacement = runtime.depth_replacement().unwrap().clone();
    assert_eq!(runtime.device().bound_depth_stencil(), Some(&replacement.replacement));
    assert_eq!(runtime.on_set_depth_stencil_view(Some(scene.clone())), Some(replacement.replacement.clone()));
    assert_eq!(runtime.on_get_depth_stencil_view(Some(replacement.replacement.clone())), Some(scene.clone()));
    assert_eq!(runtime.on_clear_depth_stencil_view(scene.clone()), replacement.replacement);
    assert_eq!(runtime.on_set_depth_stencil_view(None), None);

    let other = runtime.back_buffer().unwrap().copy.clone();
    let (dst, src) = runtime.on_copy_resource(replacement.original_texture.clone(), other.clone());
    assert_eq!((dst, src), (replacement.texture.clone(), other));

    // draws through the replacement are accounted to the original
    draw_to(&mut runtime, &scene, 2, 50);
    assert_eq!(runtime.detector().get(&scene).unwrap().draw_vertices_count, 100.0);
}

#[test]
fn selection_waits_for_the_cooldown() {
    let mut runtime = common::runtime();
    let first = host_depth(&mut runtime, common::WIDTH, common::HEIGHT, 1);
    let second = host_depth(&mut runtime, common::WIDTH, common::HEIGHT, 1);
    draw_to(&mut runtime, &first, 1, 1000);
    runtime.on_present();
    assert_eq!(runtime.depth_replacement().unwrap().original, first);

    for _ in 0 .. postfx::depth::COOLDOWN_FRAMES {
        draw_to(&mut runtime, &second, 1, 5000);
        runtime.on_present();
        assert_eq!(runtime.depth_replacement().unwrap().original, first);
    }
    draw_to(&mut runtime, &second, 1, 5000);
    runtime.on_present();
    assert_eq!(runtime.depth_replacement().unwrap().original, second);
}

static BUSY_NETWORK: AtomicUsize = AtomicUsize::new(0);

#[test]
fn network_traffic_releases_the_replacement() {
    let mut runtime = common::runtime().with_traffic_counter(&BUSY_NETWORK);
    runtime.update_effect(depth_effect()).unwrap();
    let scene = host_depth(&mut runtime, common::WIDTH, common::HEIGHT, 1);
    draw_to(&mut runtime, &scene, 3, 1000);
    runtime.on_present();
    assert!(runtime.depth_replacement().is_some());

    for _ in 0 .. postfx::depth::COOLDOWN_FRAMES {
        BUSY_NETWORK.fetch_add(1500, Ordering::Relaxed);
        runtime.on_present();
    }
    assert!(runtime.depth_replacement().is_some());
    runtime.on_present();

    assert!(runtime.depth_replacement().is_none());
    assert_eq!(runtime.device().bound_depth_stencil(), Some(&scene));
    assert_eq!(runtime.on_set_depth_stencil_view(Some(scene.clone())), Some(scene.clone()));
    assert!(runtime.effect().unwrap().texture("Depth").unwrap().shader_resource_view(false).is_none());
}

static LIGHT_NETWORK: AtomicUsize = AtomicUsize::new(0);

#[test]
fn occasional_traffic_is_tolerated() {
    let mut runtime = common::runtime().with_traffic_counter(&LIGHT_NETWORK);
    let scene = host_depth(&mut runtime, common::WIDTH, common::HEIGHT, 1);
    draw_to(&mut runtime, &scene, 3, 1000);
    runtime.on_present();

    for frame in 0 .. postfx::depth::COOLDOWN_FRAMES {
        if frame < postfx::depth::TRAFFIC_THRESHOLD - 1 {
            LIGHT_NETWORK.fetch_add(1500, Ordering::Relaxed);
        }
        runtime.on_present();
    }
    runtime.on_present();
    assert_eq!(runtime.depth_replacement().unwrap().original, scene);
}

#[test]
fn multisampled_swap_chains_keep_the_host_depth() {
    let mut runtime = common::runtime_with(common::desc(Format::R8G8B8A8_UNORM, 4), Default::default());
    let scene = host_depth(&mut runtime, common::WIDTH, common::HEIGHT, 1);
    assert_eq!(runtime.detector().len(), 1);
    draw_to(&mut runtime, &scene, 3, 1000);
    runtime.on_present();
    assert!(runtime.depth_replacement().is_none());
}

#[test]
fn draws_to_the_default_depth_stencil_are_ignored() {
    let mut runtime = common::runtime();
    let default = runtime.default_depth_stencil().unwrap().clone();
    runtime.on_create_depth_stencil_view(&default);
    draw_to(&mut runtime, &default, 3, 1000);
    assert_eq!(runtime.detector().get(&default).unwrap().draw_call_count, 0.0);
}

#[test]
fn shader_readable_depth_is_used_directly() {
    let mut device = Device::new();
    let info = TextureInfo::new(64, 64, Format::R24G8_TYPELESS, Bind::DEPTH_STENCIL | Bind::SHADER_RESOURCE);
    let texture = device.create_texture_2d(&info, None).unwrap();
    let view_desc = ViewDesc { format: Format::D24_UNORM_S8_UINT, levels: 1, multisampled: false };
    let view = device.create_depth_stencil_view(&texture, Some(&view_desc)).unwrap();

    let replacement = DepthReplacement::<Resources>::new(&mut device, &view).unwrap();
    assert_eq!(replacement.replacement, view);
    assert_eq!(replacement.texture, texture);
    assert_eq!(replacement.shader_resource.info().desc.format, Format::R24_UNORM_X8_TYPELESS);
}

#[test]
fn failed_replacement_leaves_the_host_alone() {
    let mut runtime = common::runtime();
    runtime.update_effect(depth_effect()).unwrap();
    let scene = host_depth(&mut runtime, common::WIDTH, common::HEIGHT, 1);
    draw_to(&mut runtime, &scene, 3, 1000);
    runtime.device_mut().failures.textures = true;
    runtime.on_present();

    assert!(runtime.depth_replacement().is_none());
    assert_eq!(runtime.device().bound_depth_stencil(), Some(&scene));
    assert!(runtime.effect().unwrap().texture("Depth").unwrap().shader_resource_view(false).is_none());
}
