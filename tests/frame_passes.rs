mod common;

use common::Harness;
use deferred_render::renderer::backend::{BackendCommand, BackendError, GraphicsBackend, RecordingBackend, Size};
use deferred_render::renderer::{
    FrameContext, MaterialCreateInfo, MaterialId, PointLight, Renderer, SpriteQuadDrawInfo,
};
use deferred_render::scene::{Camera, GameObjectKind, Scene};
use deferred_render::settings::RendererSettings;
use glam::Vec3;
use rstest::rstest;

fn lit_scene(h: &mut Harness) -> (MaterialId, MaterialId) {
    let red = h.material(MaterialCreateInfo::new("Red", "pbr"));
    let glass = h.material(MaterialCreateInfo::new("Glass", "color"));
    h.sphere("Ball", red, Vec3::ZERO);
    h.sphere("Glass ball", glass, Vec3::X * 2.0);
    h.renderer.post_initialize();
    h.clear_commands();
    (red, glass)
}

#[test]
fn passes_run_in_deferred_order() {
    let mut h = Harness::new(800, 600);
    lit_scene(&mut h);
    h.draw(false);

    let size = Size::new(800, 600);
    let targets = h.renderer.targets().unwrap().clone();
    let gbuffer = targets.gbuffer.target;
    let [first, second] = targets.offscreen;

    assert_eq!(h.commands()[0], BackendCommand::BindTarget(None));
    let geometry = h.position(&BackendCommand::BindTarget(Some(gbuffer))).unwrap();
    let depth_copy = h
        .position(&BackendCommand::BlitDepth {
            source: Some(gbuffer),
            destination: Some(first.target),
            size,
        })
        .unwrap();
    let post = h.position(&BackendCommand::BindTarget(Some(second.target))).unwrap();
    let display_depth = h
        .position(&BackendCommand::BlitDepth {
            source: Some(first.target),
            destination: None,
            size,
        })
        .unwrap();

    assert!(geometry < depth_copy);
    assert!(depth_copy < post);
    assert!(post < display_depth);
    assert_eq!(h.commands().last(), Some(&BackendCommand::Present { vsync: true }));
}

#[test]
fn frame_stats_count_each_pass() {
    let mut h = Harness::new(800, 600);
    lit_scene(&mut h);
    h.draw(false);

    let stats = h.renderer.last_frame_stats();
    // Ball plus the G-buffer combine quad
    assert_eq!(stats.deferred_draw_calls, 2);
    assert_eq!(stats.forward_draw_calls, 1);
    // Post-process and FXAA quads
    assert_eq!(stats.sprite_draw_calls, 2);
    assert_eq!(stats.batches_drawn, 2);
    assert_eq!(stats.objects_skipped, 0);
    assert_eq!(stats.backend_errors, 0);
}

#[rstest]
#[case(true, 2)]
#[case(false, 1)]
fn fxaa_adds_a_composite_pass(#[case] fxaa: bool, #[case] composite_draws: u32) {
    let settings = RendererSettings {
        enable_fxaa: fxaa,
        ..Default::default()
    };
    let mut h = Harness::with_settings(640, 480, settings);
    h.renderer.post_initialize();
    h.clear_commands();
    h.draw(false);

    assert_eq!(h.renderer.last_frame_stats().sprite_draw_calls, composite_draws);
    let second = h.renderer.targets().unwrap().offscreen[1].target;
    assert_eq!(h.position(&BackendCommand::BindTarget(Some(second))).is_some(), fxaa);
}

#[test]
fn vsync_setting_reaches_present() {
    let settings = RendererSettings {
        enable_vsync: false,
        ..Default::default()
    };
    let mut h = Harness::with_settings(640, 480, settings);
    h.renderer.post_initialize();
    h.draw(false);
    assert_eq!(h.commands().last(), Some(&BackendCommand::Present { vsync: false }));
}

#[test]
fn light_icons_only_drawn_for_editor() {
    let mut h = Harness::new(800, 600);
    lit_scene(&mut h);
    h.scene
        .add_point_light("Lamp", PointLight::new(Vec3::new(0.0, 3.0, 0.0), Vec3::ONE, 10.0))
        .unwrap();

    h.draw(false);
    assert_eq!(h.renderer.last_frame_stats().sprite_draw_calls, 2);

    h.draw(true);
    assert_eq!(h.renderer.last_frame_stats().sprite_draw_calls, 3);
}

#[test]
fn object_without_vertex_data_is_not_batched() {
    let mut h = Harness::new(800, 600);
    let red = h.material(MaterialCreateInfo::new("Red", "pbr"));
    let first = h.sphere("Ball", red, Vec3::ZERO);
    h.object("Empty", GameObjectKind::Mesh, red, Vec3::Y, None, None);
    let second = h.sphere("Other ball", red, Vec3::X);
    h.renderer.post_initialize();
    h.draw(false);

    let batch = h
        .renderer
        .batches()
        .deferred
        .iter()
        .find(|batch| batch.material_id == Some(red))
        .unwrap();
    assert_eq!(batch.objects, vec![first, second]);
    assert!(!h.renderer.batches().consistency_error);
    let stats = h.renderer.last_frame_stats();
    assert_eq!(stats.objects_skipped, 0);
    // Both balls plus the combine quad
    assert_eq!(stats.deferred_draw_calls, 3);
}

#[test]
fn object_that_failed_upload_is_skipped() {
    let mut h = Harness::new(800, 600);
    let red = h.material(MaterialCreateInfo::new("Red", "pbr"));
    h.sphere("Ball", red, Vec3::ZERO);
    h.renderer.backend_mut().fail_next_upload();
    h.sphere("Broken ball", red, Vec3::Y);
    h.sphere("Other ball", red, Vec3::X);
    h.renderer.post_initialize();
    h.draw(false);

    let stats = h.renderer.last_frame_stats();
    assert_eq!(stats.objects_skipped, 1);
    assert_eq!(stats.deferred_draw_calls, 3);
}

#[test]
fn batches_group_objects_by_material() {
    let mut h = Harness::new(800, 600);
    let a = h.material(MaterialCreateInfo::new("A", "pbr"));
    let b = h.material(MaterialCreateInfo::new("B", "pbr"));
    let a1 = h.sphere("a1", a, Vec3::ZERO);
    let b1 = h.sphere("b1", b, Vec3::X);
    let a2 = h.sphere("a2", a, Vec3::Y);
    let hidden = h.sphere("hidden", b, Vec3::Z);
    let entity = h.renderer.registry().render_object(hidden).unwrap().game_object.unwrap();
    h.scene.set_visible(entity, false);
    h.renderer.post_initialize();
    h.draw(false);

    let deferred = &h.renderer.batches().deferred;
    let batch = |material| deferred.iter().find(|batch| batch.material_id == Some(material)).unwrap();
    assert_eq!(batch(a).objects, vec![a1, a2]);
    assert_eq!(batch(b).objects, vec![b1]);
    assert!(!h.renderer.batches().consistency_error);
}

#[test]
fn orphaned_render_object_is_reported_as_inconsistent() {
    let mut h = Harness::new(800, 600);
    let red = h.material(MaterialCreateInfo::new("Red", "pbr"));
    h.sphere("Ball", red, Vec3::ZERO);
    h.renderer.post_initialize();
    h.renderer.clear_materials();
    assert!(h.renderer.registry().material(red).is_none());
    h.draw(false);

    let expected = cfg!(debug_assertions);
    assert_eq!(h.renderer.batches().consistency_error, expected);
    let stats = h.renderer.last_frame_stats();
    assert_eq!(stats.consistency_errors, u32::from(expected));
    assert_eq!(stats.batches_drawn, 0);
    assert_eq!(h.commands().last(), Some(&BackendCommand::Present { vsync: true }));
}

#[test]
fn invalid_material_falls_back_to_first() {
    let mut h = Harness::new(800, 600);
    let id = h.sphere("Lost", MaterialId::new(999), Vec3::ZERO);

    let first = h.renderer.registry().materials().next().map(|(id, _)| id).unwrap();
    assert_eq!(h.renderer.registry().render_object(id).unwrap().material_id, first);
}

#[test]
fn resize_reallocates_window_targets() {
    let mut h = Harness::new(1920, 1080);
    h.renderer.on_window_size_changed(Size::new(1280, 720));

    let expected = Size::new(1280, 720);
    let targets = h.renderer.targets().unwrap().clone();
    let backend = h.renderer.backend();
    for target in &targets.offscreen {
        assert_eq!(backend.texture(target.texture).unwrap().size, expected);
        assert_eq!(backend.target(target.target).unwrap().depth_size, expected);
    }
    for (_, texture) in &targets.gbuffer.channels {
        assert_eq!(backend.texture(*texture).unwrap().size, expected);
    }
    assert_eq!(backend.target(targets.gbuffer.target).unwrap().depth_size, expected);
    assert_eq!(backend.target(targets.capture).unwrap().depth_size, Size::new(512, 512));
    assert_eq!(h.renderer.window_size(), expected);
}

#[test]
fn minimized_window_keeps_target_size() {
    let mut h = Harness::new(1280, 720);
    h.renderer.on_window_size_changed(Size::new(0, 0));
    assert_eq!(h.renderer.window_size(), Size::new(1280, 720));
    assert_eq!(h.renderer.targets().unwrap().size(), Size::new(1280, 720));
}

#[test]
fn backend_errors_are_counted_and_frame_continues() {
    let mut h = Harness::new(800, 600);
    lit_scene(&mut h);
    h.renderer
        .backend_mut()
        .inject_error(BackendError::Api("invalid operation".into()));
    h.draw(false);

    assert_eq!(h.renderer.last_frame_stats().backend_errors, 1);
    assert_eq!(h.commands().last(), Some(&BackendCommand::Present { vsync: true }));
    assert!(h.renderer.backend_mut().take_error().is_none());
}

#[test]
fn queued_sprites_are_drawn_once() {
    let mut h = Harness::new(800, 600);
    h.renderer.post_initialize();
    let quad = h.renderer.engine_objects().quad_2d;
    h.renderer.draw_sprite(SpriteQuadDrawInfo {
        sprite_object: quad,
        screen_space: true,
        ..Default::default()
    });

    h.draw(false);
    assert_eq!(h.renderer.last_frame_stats().sprite_draw_calls, 3);
    h.draw(false);
    assert_eq!(h.renderer.last_frame_stats().sprite_draw_calls, 2);
}

#[test]
fn draw_before_initialize_does_nothing() {
    let mut renderer = Renderer::new(RecordingBackend::new(), RendererSettings::default());
    let scene = Scene::new();
    let camera = Camera::default();
    renderer.draw(&FrameContext::new(&scene, &camera));
    assert!(renderer.backend().commands().is_empty());
}

#[test]
fn destroy_releases_leaked_objects() {
    let mut h = Harness::new(800, 600);
    lit_scene(&mut h);
    h.draw(false);

    h.renderer.destroy();
    let backend = h.renderer.backend();
    assert_eq!(h.renderer.registry().render_object_count(), 0);
    assert_eq!(backend.live_geometry_count(), 0);
    assert_eq!(backend.live_texture_count(), 0);
    assert_eq!(backend.live_program_count(), 0);
    assert!(!h.renderer.is_initialized());
}
