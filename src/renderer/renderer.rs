// renderer/renderer.rs
use std::sync::Arc;
use std::time::Instant;

use glam::{Mat4, Vec2};
use log::{error, info, warn};

use super::backend::{report_errors, GeometryHandle, GraphicsBackend, Size, TextureHandle};
use super::batch::RenderBatches;
use super::binder::FrameUniforms;
use super::capture::{capture_projection, capture_views};
use super::handle::{MaterialId, RenderId};
use super::lights::LightsUniform;
use super::material::MaterialCreateInfo;
use super::postprocess::FxaaParameters;
use super::primitives;
use super::registry::ResourceRegistry;
use super::render_context::{DebugInput, FrameContext};
use super::render_object::RenderObjectCreateInfo;
use super::shader::Sampler;
use super::sprites::SpriteQuadDrawInfo;
use super::targets::OffscreenTargets;
use super::vertex::{VertexBufferData, VertexStreams};
use crate::error::RenderError;
use crate::scene::{Camera, Scene};
use crate::settings::RendererSettings;

pub const POINT_LIGHT_ICON: &str = "resources/textures/icons/point-light-icon-256.png";
pub const DIRECTIONAL_LIGHT_ICON: &str = "resources/textures/icons/directional-light-icon-256.png";

pub const GBUFFER_MATERIAL: &str = "GBuffer material";
pub const GBUFFER_QUAD: &str = "GBuffer quad";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RendererStats {
    pub batches_drawn: u32,
    pub deferred_draw_calls: u32,
    pub forward_draw_calls: u32,
    pub sprite_draw_calls: u32,
    pub objects_skipped: u32,
    pub consistency_errors: u32,
    pub backend_errors: u32,
}

impl RendererStats {
    pub fn total_draw_calls(&self) -> u32 {
        self.deferred_draw_calls + self.forward_draw_calls + self.sprite_draw_calls
    }
}

/// Materials, objects and textures the renderer creates for itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineObjects {
    pub sprite_material: Option<MaterialId>,
    pub font_material: Option<MaterialId>,
    pub post_process_material: Option<MaterialId>,
    pub fxaa_material: Option<MaterialId>,
    pub gbuffer_material: Option<MaterialId>,
    pub quad_2d: Option<RenderId>,
    pub quad_3d: Option<RenderId>,
    pub gbuffer_quad: Option<RenderId>,
    pub brdf_quad: Option<RenderId>,
    pub brdf_lut: Option<TextureHandle>,
    pub point_light_icon: Option<TextureHandle>,
    pub directional_light_icon: Option<TextureHandle>,
}

/// Host-built glyph geometry drawn by the text pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextGeometry {
    pub geometry: GeometryHandle,
    pub vertex_count: u32,
    pub atlas: TextureHandle,
    pub atlas_size: Vec2,
}

/// Deferred renderer orchestrating every pass of a frame over a
/// [`GraphicsBackend`].
pub struct Renderer<B: GraphicsBackend> {
    pub(super) backend: B,
    pub(super) registry: ResourceRegistry,
    pub(super) targets: Option<OffscreenTargets>,
    pub(super) batches: RenderBatches,
    pub(super) settings: RendererSettings,
    pub(super) fxaa: FxaaParameters,
    pub(super) show_fxaa_edges: bool,
    pub(super) window_size: Size,
    pub(super) capture_projection: Mat4,
    pub(super) capture_views: [Mat4; 6],
    pub(super) engine: EngineObjects,
    pub(super) skybox: Option<RenderId>,
    pub(super) reflection_probe_material: Option<MaterialId>,
    pub(super) sprite_queue: Vec<SpriteQuadDrawInfo>,
    pub(super) text: Option<TextGeometry>,
    pub(super) stats: RendererStats,
    initialized: bool,
}

impl<B: GraphicsBackend> Renderer<B> {
    pub fn new(backend: B, settings: RendererSettings) -> Self {
        Self {
            backend,
            registry: ResourceRegistry::new(),
            targets: None,
            batches: RenderBatches::default(),
            settings,
            fxaa: FxaaParameters::default(),
            show_fxaa_edges: false,
            window_size: Size::new(1, 1),
            capture_projection: Mat4::IDENTITY,
            capture_views: capture_views(),
            engine: EngineObjects::default(),
            skybox: None,
            reflection_probe_material: None,
            sprite_queue: Vec::new(),
            text: None,
            stats: RendererStats::default(),
            initialized: false,
        }
    }

    /// Loads shaders, allocates targets and creates the engine materials and
    /// quads. The BRDF lookup table is rendered here.
    pub fn initialize(&mut self, window_size: Size, camera: &Camera) -> Result<(), RenderError> {
        let start = Instant::now();
        self.window_size = window_size;

        let failures = self.registry.load_shaders(&mut self.backend);
        if failures > 0 {
            warn!("{} shaders failed to compile", failures);
        }

        self.targets = Some(OffscreenTargets::new(&mut self.backend, window_size)?);
        self.capture_projection = capture_projection(camera.near, camera.far);

        self.engine.point_light_icon = self.registry.load_texture(&mut self.backend, POINT_LIGHT_ICON, false);
        self.engine.directional_light_icon =
            self.registry
                .load_texture(&mut self.backend, DIRECTIONAL_LIGHT_ICON, false);

        let sprite = self.create_material(MaterialCreateInfo::new("Sprite material", "sprite").engine())?;
        let font = self.create_material(MaterialCreateInfo::new("Font material", "font").engine())?;
        let post = self.create_material(MaterialCreateInfo::new("Post process material", "post_process").engine())?;
        let fxaa = self.create_material(MaterialCreateInfo::new("FXAA", "post_fxaa").engine())?;
        self.engine.sprite_material = Some(sprite);
        self.engine.font_material = Some(font);
        self.engine.post_process_material = Some(post);
        self.engine.fxaa_material = Some(fxaa);

        let quad_2d = RenderObjectCreateInfo::internal(
            "Sprite Quad 2D",
            post,
            Arc::new(VertexBufferData::from_streams(&primitives::quad_2d())),
        );
        self.engine.quad_2d = Some(self.registry.create_render_object(&mut self.backend, quad_2d));

        let quad_3d = RenderObjectCreateInfo {
            editor_object: true,
            ..RenderObjectCreateInfo::internal(
                "Sprite Quad 3D",
                sprite,
                Arc::new(VertexBufferData::from_streams(&primitives::quad_3d())),
            )
        };
        self.engine.quad_3d = Some(self.registry.create_render_object(&mut self.backend, quad_3d));

        self.generate_brdf_lut()?;

        self.initialized = true;
        self.report("initialize");
        info!(
            "Renderer initialized on {} backend in {:.2}ms",
            self.backend.name(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }

    /// Runs once the host has created its scene objects.
    pub fn post_initialize(&mut self) {
        self.generate_gbuffer();
        self.report("post-initialize");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Releases every resource the renderer still owns. Render objects the
    /// host forgot to destroy are reported.
    pub fn destroy(&mut self) {
        let engine = std::mem::take(&mut self.engine);
        for id in [engine.quad_2d, engine.quad_3d, engine.gbuffer_quad, engine.brdf_quad]
            .into_iter()
            .flatten()
        {
            self.registry.destroy_render_object(&mut self.backend, id);
        }

        let leaked: Vec<(RenderId, String)> = self
            .registry
            .render_objects()
            .map(|object| (object.id, object.name.clone()))
            .collect();
        for (id, name) in leaked {
            error!("Render object {} ({:?}) was not destroyed before renderer shutdown", id, name);
            self.registry.destroy_render_object(&mut self.backend, id);
        }

        self.clear_text();
        if let Some(brdf) = engine.brdf_lut {
            self.backend.destroy_texture(brdf);
        }
        if let Some(targets) = self.targets.take() {
            targets.destroy(&mut self.backend);
        }
        self.registry.destroy(&mut self.backend);
        self.sprite_queue.clear();
        self.skybox = None;
        self.reflection_probe_material = None;
        self.initialized = false;
        report_errors(&mut self.backend, "destroy");
        info!("Renderer destroyed");
    }

    /// Polls debug toggles once per frame.
    pub fn update(&mut self, ctx: &FrameContext, input: &DebugInput) {
        self.show_fxaa_edges = input.show_fxaa_edges;
        if input.recapture_reflection_probes {
            self.recapture_reflection_probes(ctx);
        }
    }

    /// Resizes the window-sized targets. Zero sizes (minimized windows) are
    /// ignored.
    pub fn on_window_size_changed(&mut self, size: Size) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        if let Some(targets) = self.targets.as_mut() {
            if targets.resize(&mut self.backend, size) {
                info!("Resized offscreen targets to {}x{}", size.width, size.height);
            }
        }
        self.window_size = size;
    }

    pub fn on_scene_changed(&mut self) {
        self.generate_gbuffer();
    }

    /// (Re)creates the material and quad combining the G-buffer into the
    /// first offscreen target.
    pub(super) fn generate_gbuffer(&mut self) {
        let Some(targets) = self.targets.as_ref() else {
            warn!("G-buffer requested before the renderer was initialized");
            return;
        };
        let channels = targets.gbuffer.channels.clone();

        if let Some(old) = self.engine.gbuffer_quad.take() {
            self.registry.destroy_render_object(&mut self.backend, old);
        }
        if let Some(old) = self.engine.gbuffer_material.take() {
            self.registry.remove_material(&mut self.backend, old);
        }

        let mut info = MaterialCreateInfo::new(GBUFFER_MATERIAL, "deferred_combine").engine();
        info.frame_buffers = channels;
        info.enable_brdf_lut = true;
        match self.reflection_probe_material {
            Some(probe) => info = info.with_image_based_lighting(probe),
            None => warn!("No reflection probe material set, G-buffer lighting has no image based lighting"),
        }

        let material = match self.registry.create_material(&mut self.backend, info) {
            Ok(material) => material,
            Err(err) => {
                error!("Failed to create {}: {}", GBUFFER_MATERIAL, err);
                return;
            }
        };
        self.engine.gbuffer_material = Some(material);

        let quad = RenderObjectCreateInfo::internal(
            GBUFFER_QUAD,
            material,
            Arc::new(VertexBufferData::from_streams(&primitives::quad_3d())),
        );
        self.engine.gbuffer_quad = Some(self.registry.create_render_object(&mut self.backend, quad));
    }

    /// Records the skybox and shares its image based lighting maps with every
    /// material that samples a prefiltered map.
    pub fn set_skybox_mesh(&mut self, scene: &Scene, skybox: Option<hecs::Entity>) {
        let Some(entity) = skybox else {
            self.skybox = None;
            return;
        };
        let Some(handle) = scene.render_handle(entity) else {
            error!("Skybox game object has no render object");
            return;
        };
        let Some(skybox_material) = self.registry.material(handle.material_id) else {
            error!("Skybox material {} doesn't exist", handle.material_id);
            return;
        };
        let irradiance = skybox_material.texture(Sampler::Irradiance);
        let prefiltered = skybox_material.texture(Sampler::Prefiltered);
        self.skybox = Some(handle.render_id);

        let mut material_ids: Vec<MaterialId> = self.registry.render_objects().map(|o| o.material_id).collect();
        material_ids.sort();
        material_ids.dedup();

        for id in material_ids {
            let needs_prefiltered = match self.registry.material_program(id) {
                Some((_, shader, _)) => shader.needs(Sampler::Prefiltered),
                None => {
                    error!("Render object references missing material {}", id);
                    continue;
                }
            };
            if !needs_prefiltered {
                continue;
            }
            if let Some(material) = self.registry.material_mut(id) {
                if let Some(texture) = irradiance {
                    material.textures.insert(Sampler::Irradiance, texture);
                }
                if let Some(texture) = prefiltered {
                    material.textures.insert(Sampler::Prefiltered, texture);
                }
            }
        }
    }

    pub fn set_reflection_probe_material(&mut self, material: Option<MaterialId>) {
        self.reflection_probe_material = material;
    }

    pub fn reflection_probe_material(&self) -> Option<MaterialId> {
        self.reflection_probe_material
    }

    pub fn skybox(&self) -> Option<RenderId> {
        self.skybox
    }

    pub fn reload_shaders(&mut self) -> usize {
        let failures = self.registry.reload_shaders(&mut self.backend);
        self.report("reload shaders");
        failures
    }

    pub fn create_material(&mut self, info: MaterialCreateInfo) -> Result<MaterialId, RenderError> {
        self.registry.create_material(&mut self.backend, info)
    }

    /// Drops every host material ahead of a scene reload. Render objects still
    /// pointing at them are left for the host to destroy.
    pub fn clear_materials(&mut self) {
        self.registry.clear_materials(&mut self.backend);
        if let Some(probe) = self.reflection_probe_material {
            if self.registry.material(probe).is_none() {
                self.reflection_probe_material = None;
            }
        }
    }

    pub fn create_render_object(&mut self, info: RenderObjectCreateInfo) -> RenderId {
        self.registry.create_render_object(&mut self.backend, info)
    }

    pub fn destroy_render_object(&mut self, id: RenderId) {
        if self.skybox == Some(id) {
            self.skybox = None;
        }
        self.registry.destroy_render_object(&mut self.backend, id);
    }

    pub fn set_render_object_material_id(&mut self, id: RenderId, material: MaterialId) -> bool {
        self.registry.set_render_object_material_id(id, material)
    }

    /// Queues a sprite for this frame's screen-space pass.
    pub fn draw_sprite(&mut self, info: SpriteQuadDrawInfo) {
        self.sprite_queue.push(info);
    }

    /// Replaces the glyph geometry drawn every frame.
    pub fn set_text_geometry(
        &mut self,
        streams: &VertexStreams,
        atlas: TextureHandle,
        atlas_size: Vec2,
    ) -> Result<(), RenderError> {
        self.clear_text();
        let data = VertexBufferData::from_streams(streams);
        let geometry = self
            .backend
            .upload_geometry(&data, None)
            .map_err(|err| RenderError::Backend {
                context: "uploading text geometry".to_string(),
                message: err.to_string(),
            })?;
        self.text = Some(TextGeometry {
            geometry,
            vertex_count: data.vertex_count(),
            atlas,
            atlas_size,
        });
        Ok(())
    }

    pub fn clear_text(&mut self) {
        if let Some(text) = self.text.take() {
            self.backend.destroy_geometry(text.geometry);
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ResourceRegistry {
        &mut self.registry
    }

    pub fn targets(&self) -> Option<&OffscreenTargets> {
        self.targets.as_ref()
    }

    pub fn batches(&self) -> &RenderBatches {
        &self.batches
    }

    pub fn engine_objects(&self) -> &EngineObjects {
        &self.engine
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    pub fn fxaa_parameters_mut(&mut self) -> &mut FxaaParameters {
        &mut self.fxaa
    }

    pub fn window_size(&self) -> Size {
        self.window_size
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.window_size.width.max(1) as f32 / self.window_size.height.max(1) as f32
    }

    pub fn last_frame_stats(&self) -> RendererStats {
        self.stats
    }

    /// Logs pending backend errors under `context` and counts them.
    pub(super) fn report(&mut self, context: &str) {
        self.stats.backend_errors += report_errors(&mut self.backend, context) as u32;
    }

    pub(super) fn camera_frame(&self, ctx: &FrameContext) -> FrameUniforms {
        FrameUniforms {
            view: ctx.camera.view(),
            projection: ctx.camera.proj(self.aspect_ratio()),
            cam_pos: ctx.camera.position(),
            lights: LightsUniform::from_lights(ctx.scene.lights()),
            framebuffer_size: self.window_size,
            show_edges: self.show_fxaa_edges,
        }
    }

    /// Model matrix of a render object: its game object's world transform,
    /// identity when it has none.
    pub(super) fn object_model(&self, ctx: &FrameContext, id: RenderId) -> Mat4 {
        self.registry
            .render_object(id)
            .and_then(|object| object.game_object)
            .and_then(|entity| ctx.scene.world_transform(entity))
            .unwrap_or(Mat4::IDENTITY)
    }
}
