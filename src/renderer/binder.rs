// renderer/binder.rs
//! Texture unit assignment and uniform upload for materials.

use glam::{Mat4, Vec2, Vec3};
use log::{error, warn};
use std::collections::BTreeMap;

use super::backend::{GraphicsBackend, Size, TextureHandle, UniformValue};
use super::lights::LightsUniform;
use super::material::Material;
use super::shader::{Sampler, Shader, Uniform};

/// Texture units assigned to a material at creation time.
///
/// Frame-buffer inputs take the first units; every sampler the shader needs
/// gets the next unit whether or not the material enables it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplerBindings {
    pub frame_buffers: Vec<(String, u32)>,
    pub samplers: BTreeMap<Sampler, u32>,
    pub next_unit: u32,
}

impl SamplerBindings {
    pub fn unit(&self, sampler: Sampler) -> Option<u32> {
        self.samplers.get(&sampler).copied()
    }
}

pub fn sampler_bindings(shader: &Shader) -> SamplerBindings {
    let mut bindings = SamplerBindings::default();
    let mut unit = 0;
    for name in &shader.frame_buffer_inputs {
        bindings.frame_buffers.push((name.clone(), unit));
        unit += 1;
    }
    for sampler in shader.needs.samplers() {
        bindings.samplers.insert(sampler, unit);
        unit += 1;
    }
    bindings.next_unit = unit;
    bindings
}

/// Binds the material's textures starting at `start`. Returns the unit after
/// the last needed sampler.
pub fn bind_textures<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    shader: &Shader,
    material: &Material,
    start: u32,
) -> u32 {
    let mut unit = start;
    for sampler in shader.needs.samplers() {
        if material.enabled(sampler) {
            match material.texture(sampler) {
                Some(texture) => backend.bind_texture(unit, texture),
                None => error!(
                    "Material {:?} enables {} but has no texture for it",
                    material.name,
                    sampler.uniform_name()
                ),
            }
        }
        unit += 1;
    }
    unit
}

pub fn bind_frame_buffer_textures<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    material: &Material,
    start: u32,
) -> u32 {
    bind_named_textures(backend, &material.name, &material.info.frame_buffers, start, "frame buffer")
}

/// Binds the per-face G-buffer cubemaps a reflection probe captured into.
pub fn bind_cubemap_gbuffer_textures<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    material: &Material,
    start: u32,
) -> u32 {
    bind_named_textures(backend, &material.name, &material.cubemap_gbuffer, start, "cubemap G-buffer")
}

fn bind_named_textures<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    material_name: &str,
    textures: &[(String, TextureHandle)],
    start: u32,
    kind: &str,
) -> u32 {
    if textures.is_empty() {
        warn!("Material {material_name:?} has no {kind} textures to bind");
        return start;
    }
    let mut unit = start;
    for (_, texture) in textures {
        backend.bind_texture(unit, *texture);
        unit += 1;
    }
    unit
}

/// Frame-scope values shared by every material drawn this frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub cam_pos: Vec3,
    pub lights: LightsUniform,
    pub framebuffer_size: Size,
    pub show_edges: bool,
}

impl FrameUniforms {
    pub fn texel_step(&self) -> Vec2 {
        Vec2::new(
            1.0 / self.framebuffer_size.width.max(1) as f32,
            1.0 / self.framebuffer_size.height.max(1) as f32,
        )
    }
}

/// Writes a uniform when the material's shader declares it.
pub fn set_material_uniform<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    material: &Material,
    uniform: Uniform,
    value: UniformValue,
) {
    if let Some(location) = material.location(uniform) {
        backend.set_uniform(location, value);
    }
}

pub fn update_material_uniforms<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    material: &Material,
    frame: &FrameUniforms,
) {
    set_material_uniform(backend, material, Uniform::View, UniformValue::Mat4(frame.view));
    set_material_uniform(backend, material, Uniform::ViewInv, UniformValue::Mat4(frame.view.inverse()));
    set_material_uniform(backend, material, Uniform::Projection, UniformValue::Mat4(frame.projection));
    set_material_uniform(
        backend,
        material,
        Uniform::ViewProjection,
        UniformValue::Mat4(frame.projection * frame.view),
    );
    set_material_uniform(backend, material, Uniform::CamPos, UniformValue::Vec4(frame.cam_pos.extend(0.0)));
    set_material_uniform(
        backend,
        material,
        Uniform::DirLight,
        UniformValue::Bytes(bytemuck::bytes_of(&frame.lights.directional).to_vec()),
    );
    set_material_uniform(
        backend,
        material,
        Uniform::PointLights,
        UniformValue::Bytes(bytemuck::cast_slice(&frame.lights.points).to_vec()),
    );
    set_material_uniform(backend, material, Uniform::TexelStep, UniformValue::Vec2(frame.texel_step()));
    set_material_uniform(
        backend,
        material,
        Uniform::DebugShowEdges,
        UniformValue::Int(frame.show_edges as i32),
    );
}

pub fn update_per_object_uniforms<B: GraphicsBackend + ?Sized>(backend: &mut B, material: &Material, model: Mat4) {
    let info = &material.info;

    set_material_uniform(backend, material, Uniform::Model, UniformValue::Mat4(model));
    set_material_uniform(
        backend,
        material,
        Uniform::ModelInvTranspose,
        UniformValue::Mat4(model.inverse().transpose()),
    );
    set_material_uniform(backend, material, Uniform::ColorMultiplier, UniformValue::Vec4(info.color_multiplier));

    for (uniform, sampler) in [
        (Uniform::EnableDiffuseSampler, Sampler::Diffuse),
        (Uniform::EnableNormalSampler, Sampler::Normal),
        (Uniform::EnableCubemapSampler, Sampler::Cubemap),
        (Uniform::EnableIrradianceSampler, Sampler::Irradiance),
    ] {
        set_material_uniform(backend, material, uniform, UniformValue::Int(material.enabled(sampler) as i32));
    }
    for (uniform, sampler) in [
        (Uniform::EnableAlbedoSampler, Sampler::Albedo),
        (Uniform::EnableMetallicSampler, Sampler::Metallic),
        (Uniform::EnableRoughnessSampler, Sampler::Roughness),
        (Uniform::EnableAoSampler, Sampler::AmbientOcclusion),
    ] {
        set_material_uniform(backend, material, uniform, UniformValue::UInt(material.enabled(sampler) as u32));
    }

    set_material_uniform(backend, material, Uniform::ConstAlbedo, UniformValue::Vec4(info.const_albedo.extend(0.0)));
    set_material_uniform(backend, material, Uniform::ConstMetallic, UniformValue::Float(info.const_metallic));
    set_material_uniform(backend, material, Uniform::ConstRoughness, UniformValue::Float(info.const_roughness));
    set_material_uniform(backend, material, Uniform::ConstAo, UniformValue::Float(info.const_ao));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::backend::{BackendCommand, RecordingBackend};
    use crate::renderer::handle::ShaderId;
    use crate::renderer::material::MaterialCreateInfo;
    use crate::renderer::shader::builtin_shaders;

    fn shader(name: &str) -> Shader {
        builtin_shaders().into_iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn disabled_samplers_keep_their_unit() {
        let pbr = shader("pbr");
        let bindings = sampler_bindings(&pbr);
        assert_eq!(bindings.unit(Sampler::Albedo), Some(0));
        assert_eq!(bindings.unit(Sampler::Metallic), Some(1));
        assert_eq!(bindings.unit(Sampler::Normal), Some(4));
        assert_eq!(bindings.next_unit, 5);
    }

    #[test]
    fn frame_buffers_come_first() {
        let combine = shader("deferred_combine");
        let bindings = sampler_bindings(&combine);
        assert_eq!(bindings.frame_buffers[2], ("albedoAOFrameBufferSampler".to_string(), 2));
        assert_eq!(bindings.unit(Sampler::BrdfLut), Some(3));
        assert_eq!(bindings.unit(Sampler::Prefiltered), Some(5));
    }

    #[test]
    fn bind_textures_skips_disabled_but_advances() {
        let pbr = shader("pbr");
        let mut material = Material::new(
            ShaderId::new(0),
            MaterialCreateInfo::new("Brick", "pbr").with_texture(Sampler::Normal, "brick_n.png"),
        );
        material.textures.insert(Sampler::Normal, TextureHandle::new(42));

        let mut backend = RecordingBackend::new();
        let next = bind_textures(&mut backend, &pbr, &material, 0);

        assert_eq!(next, 5);
        assert_eq!(
            backend.commands(),
            &[BackendCommand::BindTexture {
                unit: 4,
                texture: TextureHandle::new(42)
            }]
        );
    }

    #[test]
    fn empty_frame_buffer_list_binds_nothing() {
        let material = Material::new(ShaderId::new(0), MaterialCreateInfo::new("Plain", "color"));
        let mut backend = RecordingBackend::new();
        assert_eq!(bind_frame_buffer_textures(&mut backend, &material, 3), 3);
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn texel_step_is_reciprocal_of_size() {
        let frame = FrameUniforms {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            cam_pos: Vec3::ZERO,
            lights: bytemuck::Zeroable::zeroed(),
            framebuffer_size: Size::new(200, 100),
            show_edges: false,
        };
        assert_eq!(frame.texel_step(), Vec2::new(0.005, 0.01));
    }
}
