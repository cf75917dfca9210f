// renderer/capture.rs
//! Cubemap capture and the image based lighting pre-passes: equirectangular
//! conversion, irradiance convolution, specular prefiltering and the BRDF
//! lookup table.

use std::sync::Arc;
use std::time::Instant;

use glam::{Mat4, Vec3};
use log::{error, info, warn};

use super::backend::{
    Attachment, ClearFlags, CubeFace, GraphicsBackend, Size, TargetHandle, TextureDesc, TextureHandle, UniformValue,
};
use super::batch::batch_render_objects;
use super::binder::{set_material_uniform, FrameUniforms};
use super::handle::{MaterialId, RenderId};
use super::lights::LightsUniform;
use super::material::MaterialCreateInfo;
use super::primitives;
use super::registry::PREFILTER_MIP_LEVELS;
use super::render_context::{DrawCallInfo, FrameContext};
use super::render_object::RenderObjectCreateInfo;
use super::renderer::Renderer;
use super::shader::{Sampler, Uniform};
use super::vertex::VertexBufferData;
use crate::error::RenderError;

pub const BRDF_LUT_SIZE: u32 = 512;
pub const BRDF_LUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg16Float;

const EQUIRECTANGULAR_MATERIAL: &str = "Equirectangular to Cube";
const IRRADIANCE_MATERIAL: &str = "Irradiance";
const PREFILTER_MATERIAL: &str = "Prefilter";
const BRDF_MATERIAL: &str = "BRDF";
const BRDF_QUAD: &str = "1x1 Quad";

/// View matrices looking down +X, -X, +Y, -Y, +Z and -Z from the origin, in
/// cube face order.
pub fn capture_views() -> [Mat4; 6] {
    let look = |dir: Vec3, up: Vec3| Mat4::look_at_rh(Vec3::ZERO, dir, up);
    [
        look(Vec3::X, -Vec3::Y),
        look(-Vec3::X, -Vec3::Y),
        look(Vec3::Y, Vec3::Z),
        look(-Vec3::Y, -Vec3::Z),
        look(Vec3::Z, -Vec3::Y),
        look(-Vec3::Z, -Vec3::Y),
    ]
}

/// 90 degree square frustum covering exactly one cube face.
pub fn capture_projection(near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(90f32.to_radians(), 1.0, near, far)
}

/// Roughness the prefilter pass convolves mip `mip` with; 0 at the base level
/// and 1 at the last.
pub fn prefilter_roughness(mip: u32, mip_count: u32) -> f32 {
    if mip_count <= 1 {
        return 0.0;
    }
    mip as f32 / (mip_count - 1) as f32
}

pub fn prefilter_mip_size(base: Size, mip: u32) -> Size {
    let shrink = |extent: u32| extent.checked_shr(mip).unwrap_or(0).max(1);
    Size::new(shrink(base.width), shrink(base.height))
}

/// Resources of a reflection probe being rendered into.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct ProbeCapture {
    pub material_id: MaterialId,
    pub target: TargetHandle,
    pub size: Size,
    pub position: Vec3,
    pub cubemap: TextureHandle,
    pub gbuffer: Vec<TextureHandle>,
    pub depth: Option<TextureHandle>,
}

impl<B: GraphicsBackend> Renderer<B> {
    /// Looks up the capture resources of a probe, reporting what's missing.
    pub(super) fn probe_capture(&self, ctx: &FrameContext, probe_id: RenderId) -> Option<ProbeCapture> {
        let target = self.targets.as_ref()?.capture;
        let Some(probe) = self.registry.render_object(probe_id) else {
            error!("Reflection probe render object {} doesn't exist", probe_id);
            return None;
        };
        let Some(material) = self.registry.material(probe.material_id) else {
            error!("Reflection probe material {} doesn't exist", probe.material_id);
            return None;
        };
        let Some(cubemap) = material.texture(Sampler::Cubemap) else {
            error!("Reflection probe material {:?} has no cubemap", material.name);
            return None;
        };
        let position = probe
            .game_object
            .and_then(|entity| ctx.scene.world_position(entity))
            .unwrap_or(Vec3::ZERO);

        Some(ProbeCapture {
            material_id: probe.material_id,
            target,
            size: material.cubemap_size(),
            position,
            cubemap,
            gbuffer: material.cubemap_gbuffer.iter().map(|(_, texture)| *texture).collect(),
            depth: material.cubemap_depth,
        })
    }

    pub(super) fn bind_capture_target(&mut self, size: Size) {
        let Some(capture) = self.targets.as_ref().map(|t| t.capture) else {
            return;
        };
        self.backend.bind_target(Some(capture));
        self.backend.resize_depth(capture, size);
        self.backend.set_viewport(size);
    }

    /// Runs the one-time captures a freshly created render object's material
    /// asks for.
    pub fn post_initialize_render_object(&mut self, ctx: &FrameContext, id: RenderId) {
        let Some(material_id) = self.registry.render_object(id).map(|o| o.material_id) else {
            error!("post_initialize_render_object: render object {} doesn't exist", id);
            return;
        };
        let Some(material) = self.registry.material(material_id) else {
            error!("Render object {} uses missing material {}", id, material_id);
            return;
        };

        if material.generates_reflection_probe_maps() {
            self.capture_reflection_probe(ctx, id);
        } else if material.generates_irradiance() {
            if material.info.generate_hdr_cubemap_sampler {
                self.generate_cubemap_from_hdr(ctx, material_id);
            }
            self.generate_irradiance_map(ctx, material_id);
            self.generate_prefiltered_map(ctx, material_id);
        }
    }

    pub(super) fn recapture_reflection_probes(&mut self, ctx: &FrameContext) {
        let probes: Vec<RenderId> = self
            .registry
            .render_objects()
            .filter(|object| {
                self.registry
                    .material(object.material_id)
                    .is_some_and(|m| m.generates_reflection_probe_maps())
            })
            .map(|object| object.id)
            .collect();
        for probe in probes {
            self.capture_reflection_probe(ctx, probe);
        }
    }

    fn capture_reflection_probe(&mut self, ctx: &FrameContext, id: RenderId) {
        let Some(material_id) = self.registry.render_object(id).map(|o| o.material_id) else {
            return;
        };
        let start = Instant::now();
        batch_render_objects(&self.registry, ctx.scene, &mut self.batches);
        self.capture_scene_to_cubemap(ctx, id);
        info!(
            "Captured reflection probe {} in {:.2}ms",
            id,
            start.elapsed().as_secs_f64() * 1000.0
        );
        self.generate_irradiance_map(ctx, material_id);
        self.generate_prefiltered_map(ctx, material_id);
    }

    /// Renders the scene around the probe into its cubemap: clears every face,
    /// then runs the deferred, combine and forward passes in cubemap mode.
    pub(super) fn capture_scene_to_cubemap(&mut self, ctx: &FrameContext, probe_id: RenderId) {
        let Some(capture) = self.probe_capture(ctx, probe_id) else {
            return;
        };

        self.bind_capture_target(capture.size);
        self.backend.set_raster_state(&Default::default());
        for face in CubeFace::ALL {
            // Channel 0 shares the clear of the cubemap itself
            for (slot, texture) in capture.gbuffer.iter().enumerate().skip(1) {
                self.backend
                    .attach_color(capture.target, slot as u32, Attachment::cube_face(*texture, face, 0));
                self.backend.clear(ClearFlags::COLOR);
            }
            self.backend
                .attach_color(capture.target, 0, Attachment::cube_face(capture.cubemap, face, 0));
            if let Some(depth) = capture.depth {
                self.backend
                    .attach_depth(capture.target, Some(Attachment::cube_face(depth, face, 0)));
            }
            self.backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        }

        let frame = FrameUniforms {
            view: self.capture_views[0],
            projection: self.capture_projection,
            cam_pos: capture.position,
            lights: LightsUniform::from_lights(ctx.scene.lights()),
            framebuffer_size: capture.size,
            show_edges: false,
        };
        self.draw_deferred_objects(ctx, &frame, DrawCallInfo::deferred().into_cubemap(probe_id));
        self.draw_gbuffer_contents(ctx, &frame, DrawCallInfo::forward().into_cubemap(probe_id));
        self.draw_forward_objects(ctx, &frame, DrawCallInfo::forward().into_cubemap(probe_id));

        if let Some(depth) = capture.depth {
            self.backend.attach_depth(capture.target, None);
            self.backend.generate_mipmaps(depth);
        }
        self.backend.generate_mipmaps(capture.cubemap);
        self.report("reflection probe capture");
    }

    /// Creates an intermediate material once and reuses it afterwards.
    fn intermediate_material(&mut self, info: MaterialCreateInfo) -> Option<MaterialId> {
        if let Some(id) = self.registry.material_id(&info.name) {
            return Some(id);
        }
        let name = info.name.clone();
        match self.registry.create_material(&mut self.backend, info) {
            Ok(id) => Some(id),
            Err(err) => {
                error!("Failed to create {:?} material: {}", name, err);
                None
            }
        }
    }

    /// Draws the skybox cube once per face of `destination` at `mip`, sampling
    /// `source` at unit 0.
    #[allow(clippy::too_many_arguments)]
    fn render_cube_faces(
        &mut self,
        ctx: &FrameContext,
        material_id: MaterialId,
        source: TextureHandle,
        destination: TextureHandle,
        size: Size,
        mip: u32,
        roughness: Option<f32>,
    ) -> bool {
        let Some(capture) = self.targets.as_ref().map(|t| t.capture) else {
            return false;
        };
        let Some(skybox_id) = self.skybox else {
            error!("No skybox has been set, cubemap faces can't be rendered");
            return false;
        };
        let model = self.object_model(ctx, skybox_id);
        let Some(skybox) = self.registry.render_object(skybox_id) else {
            error!("Skybox render object {} doesn't exist", skybox_id);
            return false;
        };
        let (Some(geometry), Some(command)) = (skybox.geometry, skybox.draw_command()) else {
            error!("Skybox {:?} has no geometry", skybox.name);
            return false;
        };
        let raster = skybox.raster_state(None);
        let Some((material, _, program)) = self.registry.material_program(material_id) else {
            error!("Material {} doesn't exist", material_id);
            return false;
        };

        let backend = &mut self.backend;
        backend.use_program(program);
        set_material_uniform(backend, material, Uniform::Model, UniformValue::Mat4(model));
        set_material_uniform(
            backend,
            material,
            Uniform::Projection,
            UniformValue::Mat4(self.capture_projection),
        );
        if let Some(roughness) = roughness {
            set_material_uniform(backend, material, Uniform::Roughness, UniformValue::Float(roughness));
        }
        backend.bind_texture(0, source);

        backend.bind_target(Some(capture));
        backend.attach_depth(capture, None);
        backend.resize_depth(capture, size);
        backend.set_viewport(size);
        backend.bind_geometry(geometry);
        backend.set_raster_state(&raster);

        for (face_index, face) in CubeFace::ALL.into_iter().enumerate() {
            set_material_uniform(
                backend,
                material,
                Uniform::View,
                UniformValue::Mat4(self.capture_views[face_index]),
            );
            backend.attach_color(capture, 0, Attachment::cube_face(destination, face, mip));
            backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
            backend.draw(&command);
        }
        true
    }

    /// Projects the material's equirectangular environment map onto its
    /// cubemap.
    pub(super) fn generate_cubemap_from_hdr(&mut self, ctx: &FrameContext, material_id: MaterialId) {
        let Some(target) = self.registry.material(material_id) else {
            error!("Material {} doesn't exist", material_id);
            return;
        };
        let Some(cubemap) = target.texture(Sampler::Cubemap) else {
            error!("Material {:?} has no cubemap to render its environment into", target.name);
            return;
        };
        let path = target.info.environment_map_path.clone();
        let size = target.cubemap_size();
        if path.is_empty() {
            warn!("Material {:?} has no environment map path", target.name);
            return;
        }

        // The conversion material is shared; rebuild it for a different map
        if let Some(existing) = self.registry.material_id(EQUIRECTANGULAR_MATERIAL) {
            let same_source = self
                .registry
                .material(existing)
                .and_then(|m| m.info.textures.get(&Sampler::HdrEquirectangular))
                .is_some_and(|source| source.path == path);
            if !same_source {
                self.registry.remove_material(&mut self.backend, existing);
            }
        }

        let start = Instant::now();
        let info = MaterialCreateInfo::new(EQUIRECTANGULAR_MATERIAL, "equirectangular_to_cube")
            .engine()
            .with_texture(Sampler::HdrEquirectangular, path.clone());
        let Some(equirect) = self.intermediate_material(info) else {
            return;
        };
        let Some(source) = self
            .registry
            .material(equirect)
            .and_then(|m| m.texture(Sampler::HdrEquirectangular))
        else {
            error!("Environment map {} couldn't be loaded", path);
            return;
        };

        if self.render_cube_faces(ctx, equirect, source, cubemap, size, 0, None) {
            self.backend.generate_mipmaps(cubemap);
            info!(
                "Converted {} to a {}x{} cubemap in {:.2}ms",
                path,
                size.width,
                size.height,
                start.elapsed().as_secs_f64() * 1000.0
            );
        }
        self.report("equirectangular to cubemap");
    }

    /// Convolves the material's cubemap into its irradiance map.
    pub(super) fn generate_irradiance_map(&mut self, ctx: &FrameContext, material_id: MaterialId) {
        let Some(target) = self.registry.material(material_id) else {
            return;
        };
        let (Some(cubemap), Some(irradiance)) = (target.texture(Sampler::Cubemap), target.texture(Sampler::Irradiance))
        else {
            error!("Material {:?} is missing its cubemap or irradiance map", target.name);
            return;
        };
        let size = target.irradiance_size();

        let start = Instant::now();
        let Some(convolution) = self.intermediate_material(MaterialCreateInfo::new(IRRADIANCE_MATERIAL, "irradiance").engine())
        else {
            return;
        };
        if self.render_cube_faces(ctx, convolution, cubemap, irradiance, size, 0, None) {
            info!(
                "Generated {}x{} irradiance map in {:.2}ms",
                size.width,
                size.height,
                start.elapsed().as_secs_f64() * 1000.0
            );
        }
        self.report("irradiance map");
    }

    /// Fills each mip of the material's prefiltered map with the cubemap
    /// convolved at increasing roughness.
    pub(super) fn generate_prefiltered_map(&mut self, ctx: &FrameContext, material_id: MaterialId) {
        let Some(target) = self.registry.material(material_id) else {
            return;
        };
        let (Some(cubemap), Some(prefiltered)) =
            (target.texture(Sampler::Cubemap), target.texture(Sampler::Prefiltered))
        else {
            error!("Material {:?} is missing its cubemap or prefiltered map", target.name);
            return;
        };
        let base = target.prefiltered_size();

        let start = Instant::now();
        let Some(prefilter) = self.intermediate_material(MaterialCreateInfo::new(PREFILTER_MATERIAL, "prefilter").engine())
        else {
            return;
        };
        for mip in 0..PREFILTER_MIP_LEVELS {
            let size = prefilter_mip_size(base, mip);
            let roughness = prefilter_roughness(mip, PREFILTER_MIP_LEVELS);
            if !self.render_cube_faces(ctx, prefilter, cubemap, prefiltered, size, mip, Some(roughness)) {
                break;
            }
        }
        info!(
            "Generated {}x{} prefiltered map in {:.2}ms",
            base.width,
            base.height,
            start.elapsed().as_secs_f64() * 1000.0
        );
        self.report("prefiltered map");
    }

    /// Renders the split-sum BRDF lookup table shared by every material that
    /// enables it.
    pub(super) fn generate_brdf_lut(&mut self) -> Result<(), RenderError> {
        if self.engine.brdf_lut.is_some() {
            return Ok(());
        }
        let start = Instant::now();
        let size = Size::new(BRDF_LUT_SIZE, BRDF_LUT_SIZE);
        let texture = self
            .backend
            .create_texture(&TextureDesc::new_2d("BRDF LUT", size, BRDF_LUT_FORMAT))
            .map_err(|err| RenderError::Backend {
                context: "creating the BRDF LUT".to_string(),
                message: err.to_string(),
            })?;
        self.engine.brdf_lut = Some(texture);
        self.registry.set_brdf_lut(Some(texture));

        let material = self.create_material(MaterialCreateInfo::new(BRDF_MATERIAL, "brdf").engine())?;
        let quad = RenderObjectCreateInfo {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            ..RenderObjectCreateInfo::internal(
                BRDF_QUAD,
                material,
                Arc::new(VertexBufferData::from_streams(&primitives::ndc_quad_strip())),
            )
        };
        let quad = self.registry.create_render_object(&mut self.backend, quad);
        self.engine.brdf_quad = Some(quad);

        let Some(capture) = self.targets.as_ref().map(|t| t.capture) else {
            warn!("No capture target, BRDF LUT left empty");
            return Ok(());
        };
        let Some(object) = self.registry.render_object(quad) else {
            return Ok(());
        };
        let (Some(geometry), Some(command)) = (object.geometry, object.draw_command()) else {
            error!("BRDF quad has no geometry");
            return Ok(());
        };
        let raster = object.raster_state(None);
        let program = self.registry.material_program(material).and_then(|(_, _, program)| program);

        let backend = &mut self.backend;
        backend.bind_target(Some(capture));
        backend.resize_depth(capture, size);
        backend.attach_color(capture, 0, Attachment::texture(texture));
        backend.attach_depth(capture, None);
        backend.set_viewport(size);
        backend.use_program(program);
        backend.bind_geometry(geometry);
        backend.set_raster_state(&raster);
        backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        backend.draw(&command);

        info!(
            "Generated BRDF LUT in {:.2}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );
        self.report("BRDF LUT");
        Ok(())
    }
}
