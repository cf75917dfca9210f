mod common;

use common::Harness;
use deferred_render::renderer::backend::{BackendCommand, Size, UniformValue};
use deferred_render::renderer::{DebugInput, FrameContext, MaterialCreateInfo, RenderId, Sampler};
use glam::Vec3;

const FACES: usize = 6;
const PREFILTER_MIPS: usize = 5;

struct ProbeScene {
    probe: RenderId,
}

fn probe_scene(h: &mut Harness, probe_visible: bool) -> ProbeScene {
    let (skybox, _) = h.skybox();
    let probe_material = h.material(MaterialCreateInfo::reflection_probe("Probe"));
    h.renderer.set_reflection_probe_material(Some(probe_material));

    let red = h.material(MaterialCreateInfo::new("Red", "pbr").with_image_based_lighting(probe_material));
    h.sphere("Ball", red, Vec3::new(2.0, 0.0, 0.0));
    let probe = h.sphere("Probe", probe_material, Vec3::ZERO);
    let entity = h.renderer.registry().render_object(probe).unwrap().game_object.unwrap();
    h.scene.set_visible(entity, probe_visible);

    h.renderer.post_initialize();
    h.post_initialize_object(skybox);
    h.clear_commands();
    ProbeScene { probe }
}

/// Ball into the G-buffer faces, the combine pass, the skybox as a forward
/// object, then irradiance and every prefilter mip.
const PROBE_CAPTURE_DRAWS: usize = FACES * 3 + FACES + FACES * PREFILTER_MIPS;

#[test]
fn brdf_lut_is_rendered_at_initialize() {
    let h = Harness::new(800, 600);
    let lut = h.renderer.engine_objects().brdf_lut.unwrap();
    let record = h.renderer.backend().texture(lut).unwrap();

    assert_eq!(record.size, Size::new(512, 512));
    assert_eq!(record.format, wgpu::TextureFormat::Rg16Float);
    assert_eq!(h.renderer.registry().brdf_lut(), Some(lut));
    assert!(h.renderer.registry().material_id("BRDF").is_some());
}

#[test]
fn hdr_skybox_generates_environment_maps() {
    let mut h = Harness::new(800, 600);
    let (skybox, material) = h.skybox();
    h.clear_commands();
    h.post_initialize_object(skybox);

    // Conversion, irradiance, then five prefiltered mips
    assert_eq!(h.renderer.backend().draw_count(), FACES * (2 + PREFILTER_MIPS));
    assert!(h
        .commands()
        .iter()
        .any(|c| matches!(c, BackendCommand::LoadTexture { path, .. } if path == "textures/sky.hdr")));
    assert!(h.renderer.registry().material_id("Equirectangular to Cube").is_some());

    let sky = h.renderer.registry().material(material).unwrap();
    let cubemap = sky.texture(Sampler::Cubemap).unwrap();
    let prefiltered = sky.texture(Sampler::Prefiltered).unwrap();
    assert!(h.position(&BackendCommand::GenerateMipmaps(cubemap)).is_some());

    for mip in 0..PREFILTER_MIPS as u32 {
        let faces = h
            .commands()
            .iter()
            .filter(|c| {
                matches!(c, BackendCommand::AttachColor { attachment, .. }
                    if attachment.texture == prefiltered && attachment.mip == mip)
            })
            .count();
        assert_eq!(faces, FACES, "mip {mip}");
    }
}

#[test]
fn prefilter_roughness_rises_per_mip() {
    let mut h = Harness::new(800, 600);
    let (skybox, _) = h.skybox();
    h.clear_commands();
    h.post_initialize_object(skybox);

    let roughness: Vec<f32> = h
        .commands()
        .iter()
        .filter_map(|c| match c {
            BackendCommand::SetUniform {
                name,
                value: UniformValue::Float(v),
                ..
            } if name == "roughness" => Some(*v),
            _ => None,
        })
        .collect();
    assert_eq!(roughness, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
}

#[test]
fn reflection_probe_captures_scene_and_convolves() {
    let mut h = Harness::new(800, 600);
    let scene = probe_scene(&mut h, false);
    h.post_initialize_object(scene.probe);

    assert_eq!(h.renderer.backend().draw_count(), PROBE_CAPTURE_DRAWS);

    let probe_material = h.renderer.registry().render_object(scene.probe).unwrap().material_id;
    let probe = h.renderer.registry().material(probe_material).unwrap();
    let cubemap = probe.texture(Sampler::Cubemap).unwrap();
    assert!(h.position(&BackendCommand::GenerateMipmaps(cubemap)).is_some());

    let gbuffer_material = h.renderer.engine_objects().gbuffer_material.unwrap();
    let combine = h.renderer.registry().material(gbuffer_material).unwrap();
    assert_eq!(combine.texture(Sampler::Irradiance), probe.texture(Sampler::Irradiance));
    assert_eq!(combine.texture(Sampler::Prefiltered), probe.texture(Sampler::Prefiltered));
}

#[test]
fn visible_probe_never_draws_itself() {
    let mut h = Harness::new(800, 600);
    let scene = probe_scene(&mut h, true);
    h.post_initialize_object(scene.probe);

    assert_eq!(h.renderer.backend().draw_count(), PROBE_CAPTURE_DRAWS);
}

#[test]
fn debug_input_recaptures_probes() {
    let mut h = Harness::new(800, 600);
    probe_scene(&mut h, false);

    let ctx = FrameContext::new(&h.scene, &h.camera);
    h.renderer.update(&ctx, &DebugInput::default());
    assert_eq!(h.renderer.backend().draw_count(), 0);

    let recapture = DebugInput {
        recapture_reflection_probes: true,
        ..Default::default()
    };
    h.renderer.update(&ctx, &recapture);
    assert_eq!(h.renderer.backend().draw_count(), PROBE_CAPTURE_DRAWS);
}

#[test]
fn fxaa_edge_debug_reaches_shader() {
    let mut h = Harness::new(800, 600);
    h.renderer.post_initialize();
    let show_edges = DebugInput {
        show_fxaa_edges: true,
        ..Default::default()
    };
    let ctx = FrameContext::new(&h.scene, &h.camera);
    h.renderer.update(&ctx, &show_edges);
    h.draw(false);

    assert!(h.commands().iter().any(|c| matches!(c,
        BackendCommand::SetUniform { name, value: UniformValue::Int(1), .. } if name == "bDEBUGShowEdges")));
}

#[test]
fn gbuffer_without_probe_has_no_image_based_lighting() {
    let mut h = Harness::new(800, 600);
    h.renderer.post_initialize();

    let id = h.renderer.engine_objects().gbuffer_material.unwrap();
    let material = h.renderer.registry().material(id).unwrap();
    assert!(!material.enabled(Sampler::Irradiance));
    assert!(!material.enabled(Sampler::Prefiltered));
    assert!(material.enabled(Sampler::BrdfLut));
}
