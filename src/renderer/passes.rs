// renderer/passes.rs
//! The per-frame pass sequence.
//!
//! Deferred geometry fills the G-buffer, the combine pass lights it into
//! offscreen target 0, forward objects, sprites and text are drawn on top and
//! the post-process pass composites the result to the display.

use glam::{Mat4, Vec3};
use log::{error, warn};

use super::backend::{Attachment, ClearFlags, CubeFace, DrawCommand, GraphicsBackend, RasterState, UniformValue};
use super::batch::{batch_render_objects, is_object_visible};
use super::binder::{
    bind_cubemap_gbuffer_textures, bind_frame_buffer_textures, bind_textures, set_material_uniform,
    update_material_uniforms, update_per_object_uniforms, FrameUniforms,
};
use super::handle::{MaterialId, RenderId};
use super::render_context::{DrawCallInfo, FrameContext};
use super::renderer::{Renderer, RendererStats};
use super::shader::{Uniform, GBUFFER_INPUTS};
use super::sprites::{billboard_rotation, screen_space_projection, sprite_model, SpriteQuadDrawInfo};

/// Light icons are drawn brighter than the light color.
const LIGHT_ICON_BRIGHTNESS: f32 = 1.5;

impl<B: GraphicsBackend> Renderer<B> {
    /// Draws one frame and presents it.
    pub fn draw(&mut self, ctx: &FrameContext) {
        if !self.is_initialized() {
            warn!("draw called before the renderer was initialized");
            return;
        }
        self.stats = RendererStats::default();
        let frame = self.camera_frame(ctx);

        self.backend.bind_target(None);
        self.backend.set_viewport(self.window_size);
        self.backend.set_raster_state(&RasterState::default());
        self.backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH);

        batch_render_objects(&self.registry, ctx.scene, &mut self.batches);
        if self.batches.consistency_error {
            self.stats.consistency_errors += 1;
        }

        self.draw_deferred_objects(ctx, &frame, DrawCallInfo::deferred());
        self.draw_gbuffer_contents(ctx, &frame, DrawCallInfo::forward());
        self.draw_forward_objects(ctx, &frame, DrawCallInfo::forward());
        self.draw_world_space_sprites(ctx, &frame);
        self.draw_editor_objects(ctx, &frame);
        self.draw_screen_space_sprites(ctx, &frame);
        self.draw_text();
        self.draw_offscreen_texture(ctx, &frame);

        self.backend.present(self.settings.enable_vsync);
        self.report("present");
    }

    /// Draws every deferred batch into the G-buffer, or into the probe's
    /// G-buffer cubemaps when capturing.
    pub(super) fn draw_deferred_objects(&mut self, ctx: &FrameContext, frame: &FrameUniforms, info: DrawCallInfo) {
        if !info.deferred {
            error!("draw_deferred_objects called with a forward draw call info");
            return;
        }
        let Some(targets) = self.targets.as_ref() else {
            return;
        };
        let gbuffer = targets.gbuffer.target;
        let offscreen = targets.offscreen[0].target;

        match info.cubemap_object {
            Some(probe_id) => {
                let Some(capture) = self.probe_capture(ctx, probe_id) else {
                    return;
                };
                self.bind_capture_target(capture.size);
            }
            None => {
                self.backend.bind_target(Some(gbuffer));
                self.backend.set_viewport(self.window_size);
                self.backend.set_raster_state(&RasterState::default());
                self.backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
            }
        }
        self.backend.set_draw_buffers(GBUFFER_INPUTS.len() as u32);

        let batches = std::mem::take(&mut self.batches.deferred);
        for batch in &batches {
            self.draw_render_object_batch(ctx, frame, &batch.objects, info);
        }
        self.batches.deferred = batches;

        self.backend.set_draw_buffers(1);
        if info.cubemap_object.is_none() {
            // Forward objects depth test against the deferred geometry
            self.backend.blit_depth(Some(gbuffer), Some(offscreen), self.window_size);
        }
        self.report("deferred geometry pass");
    }

    /// Lights the G-buffer with the combine material.
    pub(super) fn draw_gbuffer_contents(&mut self, ctx: &FrameContext, frame: &FrameUniforms, info: DrawCallInfo) {
        if info.deferred {
            error!("draw_gbuffer_contents called with a deferred draw call info");
            return;
        }
        if self.engine.gbuffer_quad.is_none() {
            self.generate_gbuffer();
        }
        match info.cubemap_object {
            Some(probe_id) => self.combine_cubemap_gbuffer(ctx, frame, probe_id),
            None => self.combine_gbuffer(frame),
        }
        self.report("G-buffer combine pass");
    }

    fn combine_gbuffer(&mut self, frame: &FrameUniforms) {
        let Some(offscreen) = self.targets.as_ref().map(|t| t.offscreen[0].target) else {
            return;
        };
        let (Some(material_id), Some(quad_id)) = (self.engine.gbuffer_material, self.engine.gbuffer_quad) else {
            error!("G-buffer combine material hasn't been generated");
            return;
        };
        let Some(quad) = self.registry.render_object(quad_id) else {
            error!("G-buffer quad {} doesn't exist", quad_id);
            return;
        };
        let (Some(geometry), Some(command)) = (quad.geometry, quad.draw_command()) else {
            error!("G-buffer quad has no geometry");
            return;
        };
        let raster = quad.raster_state(None);
        let Some((material, shader, program)) = self.registry.material_program(material_id) else {
            error!("G-buffer material {} doesn't exist", material_id);
            return;
        };

        let backend = &mut self.backend;
        backend.bind_target(Some(offscreen));
        backend.set_viewport(self.window_size);
        // Depth was blitted from the G-buffer and must survive
        backend.clear(ClearFlags::COLOR);

        backend.use_program(program);
        update_material_uniforms(backend, material, frame);
        update_per_object_uniforms(backend, material, Mat4::IDENTITY);
        let next = bind_frame_buffer_textures(backend, material, 0);
        bind_textures(backend, shader, material, next);

        backend.bind_geometry(geometry);
        backend.set_raster_state(&raster);
        backend.draw(&command);
        self.stats.deferred_draw_calls += 1;
    }

    /// Lights the probe's G-buffer cubemaps into its cubemap, one face at a
    /// time, drawing through the skybox cube.
    fn combine_cubemap_gbuffer(&mut self, ctx: &FrameContext, frame: &FrameUniforms, probe_id: RenderId) {
        let Some(capture) = self.probe_capture(ctx, probe_id) else {
            return;
        };
        let Some(skybox_id) = self.skybox else {
            error!("Can't combine the cubemap G-buffer without a skybox");
            return;
        };
        let skybox_model = self.object_model(ctx, skybox_id);
        let Some(skybox) = self.registry.render_object(skybox_id) else {
            error!("Skybox render object {} doesn't exist", skybox_id);
            return;
        };
        let (Some(geometry), Some(command)) = (skybox.geometry, skybox.draw_command()) else {
            error!("Skybox {:?} has no geometry", skybox.name);
            return;
        };
        let raster = RasterState {
            depth_compare: wgpu::CompareFunction::Always,
            depth_write: false,
            ..skybox.raster_state(None)
        };
        let Some((material, shader, program)) = self.registry.material_program(capture.material_id) else {
            return;
        };

        let backend = &mut self.backend;
        backend.use_program(program);
        update_material_uniforms(backend, material, frame);

        backend.bind_target(Some(capture.target));
        backend.resize_depth(capture.target, capture.size);
        backend.set_viewport(capture.size);

        update_per_object_uniforms(backend, material, skybox_model);
        let next = bind_cubemap_gbuffer_textures(backend, material, 0);
        bind_textures(backend, shader, material, next);

        backend.bind_geometry(geometry);
        backend.set_raster_state(&raster);
        set_material_uniform(backend, material, Uniform::Projection, UniformValue::Mat4(self.capture_projection));
        set_material_uniform(backend, material, Uniform::CamPos, UniformValue::Vec4(capture.position.extend(0.0)));

        for (face_index, face) in CubeFace::ALL.into_iter().enumerate() {
            set_material_uniform(
                backend,
                material,
                Uniform::View,
                UniformValue::Mat4(self.capture_views[face_index]),
            );
            backend.attach_color(capture.target, 0, Attachment::cube_face(capture.cubemap, face, 0));
            backend.draw(&command);
            self.stats.deferred_draw_calls += 1;
        }
    }

    /// Draws the forward batches on top of the combined G-buffer.
    pub(super) fn draw_forward_objects(&mut self, ctx: &FrameContext, frame: &FrameUniforms, info: DrawCallInfo) {
        if info.deferred {
            error!("draw_forward_objects called with a deferred draw call info");
            return;
        }
        match info.cubemap_object {
            Some(probe_id) => {
                let Some(capture) = self.probe_capture(ctx, probe_id) else {
                    return;
                };
                self.bind_capture_target(capture.size);
            }
            None => {
                let Some(offscreen) = self.targets.as_ref().map(|t| t.offscreen[0].target) else {
                    return;
                };
                self.backend.bind_target(Some(offscreen));
                self.backend.set_viewport(self.window_size);
            }
        }

        let batches = std::mem::take(&mut self.batches.forward);
        for batch in &batches {
            self.draw_render_object_batch(ctx, frame, &batch.objects, info);
        }
        self.batches.forward = batches;
        self.report("forward pass");
    }

    /// Editor-only objects, each drawn with its own material.
    fn draw_editor_objects(&mut self, ctx: &FrameContext, frame: &FrameUniforms) {
        if !ctx.render_editor_objects || self.batches.editor.is_empty() {
            return;
        }
        let Some(offscreen) = self.targets.as_ref().map(|t| t.offscreen[0].target) else {
            return;
        };
        self.backend.bind_target(Some(offscreen));
        self.backend.set_viewport(self.window_size);

        let batch = std::mem::take(&mut self.batches.editor);
        self.draw_render_object_batch(ctx, frame, &batch.objects, DrawCallInfo::forward());
        self.batches.editor = batch;
        self.report("editor objects");
    }

    /// Draws the visible members of one batch. Program and frame uniforms are
    /// only rebound when the material changes between consecutive objects.
    pub(super) fn draw_render_object_batch(
        &mut self,
        ctx: &FrameContext,
        frame: &FrameUniforms,
        objects: &[RenderId],
        info: DrawCallInfo,
    ) {
        if objects.is_empty() {
            return;
        }
        let capture = match info.cubemap_object {
            Some(probe_id) => match self.probe_capture(ctx, probe_id) {
                Some(capture) => Some(capture),
                None => return,
            },
            None => None,
        };
        self.stats.batches_drawn += 1;

        let mut current_material: Option<MaterialId> = None;
        for &id in objects {
            // A probe never captures itself
            if info.cubemap_object == Some(id) {
                continue;
            }
            let model = self.object_model(ctx, id);
            let Some(object) = self.registry.render_object(id) else {
                continue;
            };
            if !is_object_visible(object, ctx.scene) {
                continue;
            }
            let Some(command) = object.draw_command() else {
                error!("Render object {:?} has no vertex data, skipping its draw call", object.name);
                self.stats.objects_skipped += 1;
                continue;
            };
            let Some(geometry) = object.geometry else {
                error!("Render object {:?} was never uploaded, skipping its draw call", object.name);
                self.stats.objects_skipped += 1;
                continue;
            };
            let object_raster = object.raster_state(None);
            let material_id = object.material_id;

            let Some((material, shader, program)) = self.registry.material_program(material_id) else {
                error!("Render object {:?} uses missing material {}", object.name, material_id);
                self.stats.objects_skipped += 1;
                continue;
            };

            let backend = &mut self.backend;
            if current_material != Some(material_id) {
                backend.use_program(program);
                update_material_uniforms(backend, material, frame);
                current_material = Some(material_id);
            }

            let raster = RasterState {
                blend: shader.translucent.then_some(wgpu::BlendState::ALPHA_BLENDING),
                ..object_raster
            };
            backend.bind_geometry(geometry);
            backend.set_raster_state(&raster);
            update_per_object_uniforms(backend, material, model);

            if !material.info.frame_buffers.is_empty() {
                bind_frame_buffer_textures(backend, material, 0);
            }
            bind_textures(backend, shader, material, shader.frame_buffer_inputs.len() as u32);

            let Some(probe) = capture.as_ref() else {
                backend.set_viewport(self.window_size);
                backend.draw(&command);
                self.count_draw(info, 1);
                continue;
            };

            let Some(projection) = material.location(Uniform::Projection) else {
                warn!(
                    "Material {:?} has no projection uniform, it can't be drawn into a cubemap",
                    material.name
                );
                continue;
            };
            backend.set_uniform(projection, UniformValue::Mat4(self.capture_projection));

            let to_probe = Mat4::from_translation(-probe.position);
            for (face_index, face) in CubeFace::ALL.into_iter().enumerate() {
                set_material_uniform(
                    backend,
                    material,
                    Uniform::View,
                    UniformValue::Mat4(self.capture_views[face_index] * to_probe),
                );
                if info.deferred {
                    for (slot, texture) in probe.gbuffer.iter().enumerate() {
                        backend.attach_color(probe.target, slot as u32, Attachment::cube_face(*texture, face, 0));
                    }
                } else {
                    backend.attach_color(probe.target, 0, Attachment::cube_face(probe.cubemap, face, 0));
                }
                if let Some(depth) = probe.depth {
                    backend.attach_depth(probe.target, Some(Attachment::cube_face(depth, face, 0)));
                }
                backend.draw(&command);
            }
            self.count_draw(info, CubeFace::ALL.len() as u32);
        }
    }

    fn count_draw(&mut self, info: DrawCallInfo, draws: u32) {
        if info.deferred {
            self.stats.deferred_draw_calls += draws;
        } else {
            self.stats.forward_draw_calls += draws;
        }
    }

    /// Billboarded icons for every enabled light.
    fn draw_world_space_sprites(&mut self, ctx: &FrameContext, frame: &FrameUniforms) {
        let Some(offscreen) = self.targets.as_ref().map(|t| t.offscreen[0].target) else {
            return;
        };
        let cam_pos = ctx.camera.position();
        let cam_up = ctx.camera.up;
        let base = SpriteQuadDrawInfo {
            sprite_object: self.engine.quad_3d,
            material_id: self.engine.sprite_material,
            target: Some(offscreen),
            scale: Vec3::new(1.0, -1.0, 1.0),
            screen_space: false,
            read_depth: true,
            write_depth: true,
            ..Default::default()
        };

        let lights = ctx.scene.lights();
        let mut sprites: Vec<SpriteQuadDrawInfo> = lights
            .point_lights()
            .iter()
            .filter(|light| light.enabled)
            .map(|light| SpriteQuadDrawInfo {
                pos: light.position,
                rotation: billboard_rotation(cam_pos, light.position, cam_up),
                color: (light.color * LIGHT_ICON_BRIGHTNESS).extend(1.0),
                texture: self.engine.point_light_icon,
                ..base.clone()
            })
            .collect();
        if let Some(light) = lights.directional().filter(|light| light.enabled) {
            sprites.push(SpriteQuadDrawInfo {
                pos: light.position,
                rotation: billboard_rotation(cam_pos, light.position, cam_up),
                color: (light.color * LIGHT_ICON_BRIGHTNESS).extend(1.0),
                texture: self.engine.directional_light_icon,
                ..base
            });
        }

        for sprite in &sprites {
            self.draw_sprite_quad(ctx, frame, sprite);
        }
    }

    /// Drains the sprite queue. Sprites without a target land in offscreen
    /// target 0 so post-processing applies to them.
    fn draw_screen_space_sprites(&mut self, ctx: &FrameContext, frame: &FrameUniforms) {
        let queue = std::mem::take(&mut self.sprite_queue);
        let offscreen = self.targets.as_ref().map(|t| t.offscreen[0].target);
        for mut sprite in queue {
            if sprite.target.is_none() {
                sprite.target = offscreen;
            }
            self.draw_sprite_quad(ctx, frame, &sprite);
        }
    }

    pub(super) fn draw_sprite_quad(&mut self, ctx: &FrameContext, frame: &FrameUniforms, info: &SpriteQuadDrawInfo) {
        let Some(sprite_id) = info.sprite_object.or(self.engine.quad_3d) else {
            return;
        };
        let Some(material_id) = info.material_id.or(self.engine.sprite_material) else {
            return;
        };
        match self.registry.render_object(sprite_id) {
            Some(object) if object.editor_object && !ctx.render_editor_objects => return,
            Some(_) => {}
            None => {
                warn!("Sprite render object {} doesn't exist", sprite_id);
                return;
            }
        }
        self.registry.set_render_object_material_id(sprite_id, material_id);

        let aspect = self.aspect_ratio();
        let grading = self
            .settings
            .post_process()
            .contrast_brightness_saturation(self.settings.enable_post_processing);

        let Some(object) = self.registry.render_object(sprite_id) else {
            return;
        };
        let (Some(geometry), Some(command)) = (object.geometry, object.draw_command()) else {
            error!("Sprite render object {:?} has no geometry", object.name);
            return;
        };
        let raster = RasterState {
            cull_mode: object.cull_mode,
            front_face: object.front_face,
            depth_compare: if info.read_depth {
                wgpu::CompareFunction::LessEqual
            } else {
                wgpu::CompareFunction::Always
            },
            depth_write: info.write_depth,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
        };
        let Some((material, shader, program)) = self.registry.material_program(material_id) else {
            error!("Sprite material {} doesn't exist", material_id);
            return;
        };

        let (view, projection) = if info.screen_space {
            (Mat4::IDENTITY, screen_space_projection(aspect))
        } else {
            (frame.view, frame.projection)
        };

        let backend = &mut self.backend;
        backend.use_program(program);
        update_material_uniforms(backend, material, frame);
        self.fxaa.upload(backend, material);

        if shader.has_uniform(Uniform::Model) {
            set_material_uniform(backend, material, Uniform::Model, UniformValue::Mat4(sprite_model(info, aspect)));
        }
        set_material_uniform(backend, material, Uniform::View, UniformValue::Mat4(view));
        set_material_uniform(backend, material, Uniform::Projection, UniformValue::Mat4(projection));
        set_material_uniform(backend, material, Uniform::ColorMultiplier, UniformValue::Vec4(info.color));
        set_material_uniform(
            backend,
            material,
            Uniform::ContrastBrightnessSaturation,
            UniformValue::Mat4(grading),
        );

        backend.bind_target(info.target);
        backend.set_viewport(self.window_size);
        if let Some(texture) = info.texture {
            backend.bind_texture(0, texture);
        }
        backend.bind_geometry(geometry);
        backend.set_raster_state(&raster);
        backend.draw(&command);
        self.stats.sprite_draw_calls += 1;
    }

    /// Draws the host's glyph points with the font material.
    fn draw_text(&mut self) {
        let Some(text) = self.text else {
            return;
        };
        let (Some(font), Some(offscreen)) = (
            self.engine.font_material,
            self.targets.as_ref().map(|t| t.offscreen[0].target),
        ) else {
            return;
        };
        let aspect = self.aspect_ratio();
        let Some((material, _, program)) = self.registry.material_program(font) else {
            error!("Font material {} doesn't exist", font);
            return;
        };

        let transform = Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0)) * screen_space_projection(aspect);
        let backend = &mut self.backend;
        backend.use_program(program);
        backend.bind_target(Some(offscreen));
        backend.set_viewport(self.window_size);
        set_material_uniform(backend, material, Uniform::TransformMat, UniformValue::Mat4(transform));
        set_material_uniform(backend, material, Uniform::TexSize, UniformValue::Vec2(text.atlas_size));
        backend.bind_texture(0, text.atlas);
        backend.bind_geometry(text.geometry);
        backend.set_raster_state(&RasterState {
            cull_mode: None,
            depth_compare: wgpu::CompareFunction::Always,
            depth_write: false,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            ..RasterState::default()
        });
        backend.draw(&DrawCommand {
            topology: wgpu::PrimitiveTopology::PointList,
            vertex_count: text.vertex_count,
            index_count: None,
        });
        self.stats.sprite_draw_calls += 1;
        self.report("text pass");
    }

    /// Composites offscreen target 0 to the display, through FXAA when it is
    /// enabled.
    fn draw_offscreen_texture(&mut self, ctx: &FrameContext, frame: &FrameUniforms) {
        let Some(targets) = self.targets.as_ref() else {
            return;
        };
        let [first, second] = targets.offscreen;
        let fxaa = self.settings.fxaa_active();

        let post = SpriteQuadDrawInfo {
            sprite_object: self.engine.quad_2d,
            material_id: self.engine.post_process_material,
            texture: Some(first.texture),
            target: fxaa.then_some(second.target),
            ..Default::default()
        };
        self.draw_sprite_quad(ctx, frame, &post);

        if fxaa {
            let antialias = SpriteQuadDrawInfo {
                material_id: self.engine.fxaa_material,
                texture: Some(second.texture),
                target: None,
                scale: Vec3::new(1.0, -1.0, 1.0),
                ..post
            };
            self.draw_sprite_quad(ctx, frame, &antialias);
        }

        self.backend.blit_depth(Some(first.target), None, self.window_size);
        self.report("post-process pass");
    }
}
