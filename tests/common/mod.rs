#![allow(dead_code)]

use std::sync::Arc;

use deferred_render::renderer::backend::{BackendCommand, RecordingBackend, Size};
use deferred_render::renderer::primitives;
use deferred_render::renderer::vertex::VertexBufferData;
use deferred_render::renderer::{
    FrameContext, MaterialCreateInfo, MaterialId, RenderId, RenderObjectCreateInfo, Renderer,
};
use deferred_render::scene::{Camera, GameObjectKind, RenderHandle, Scene, Transform};
use deferred_render::settings::RendererSettings;
use glam::{Vec3, Vec4};

pub struct Harness {
    pub renderer: Renderer<RecordingBackend>,
    pub scene: Scene,
    pub camera: Camera,
}

impl Harness {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_settings(width, height, RendererSettings::default())
    }

    pub fn with_settings(width: u32, height: u32, settings: RendererSettings) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let camera = Camera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let mut renderer = Renderer::new(RecordingBackend::new(), settings);
        renderer
            .initialize(Size::new(width, height), &camera)
            .expect("renderer initializes");
        Self {
            renderer,
            scene: Scene::new(),
            camera,
        }
    }

    pub fn material(&mut self, info: MaterialCreateInfo) -> MaterialId {
        self.renderer.create_material(info).expect("material is created")
    }

    pub fn sphere(&mut self, name: &str, material: MaterialId, position: Vec3) -> RenderId {
        let (streams, indices) = primitives::sphere(8, 6, Vec4::ONE);
        self.object(
            name,
            GameObjectKind::Mesh,
            material,
            position,
            Some(Arc::new(VertexBufferData::from_streams(&streams))),
            Some(Arc::new(indices)),
        )
    }

    pub fn object(
        &mut self,
        name: &str,
        kind: GameObjectKind,
        material_id: MaterialId,
        position: Vec3,
        vertex_data: Option<Arc<VertexBufferData>>,
        indices: Option<Arc<Vec<u32>>>,
    ) -> RenderId {
        let entity = self.scene.spawn(name, kind, Transform::from_translation(position));
        let render_id = self.renderer.create_render_object(RenderObjectCreateInfo {
            name: name.to_string(),
            material_id: Some(material_id),
            game_object: Some(entity),
            vertex_data,
            indices,
            ..Default::default()
        });
        self.scene.set_render_handle(entity, RenderHandle { render_id, material_id });
        render_id
    }

    pub fn skybox(&mut self) -> (RenderId, MaterialId) {
        let material = self.material(MaterialCreateInfo::hdr_skybox("Skybox", "textures/sky.hdr"));
        let entity = self.scene.spawn("Skybox", GameObjectKind::Skybox, Transform::IDENTITY);
        let render_id = self.renderer.create_render_object(RenderObjectCreateInfo {
            name: "Skybox".to_string(),
            material_id: Some(material),
            game_object: Some(entity),
            vertex_data: Some(Arc::new(VertexBufferData::from_streams(&primitives::skybox_cube()))),
            cull_mode: None,
            depth_write: false,
            ..Default::default()
        });
        self.scene.set_render_handle(
            entity,
            RenderHandle {
                render_id,
                material_id: material,
            },
        );
        self.renderer.set_skybox_mesh(&self.scene, Some(entity));
        (render_id, material)
    }

    pub fn draw(&mut self, editor_objects: bool) {
        let ctx = FrameContext::new(&self.scene, &self.camera).with_editor_objects(editor_objects);
        self.renderer.draw(&ctx);
    }

    pub fn post_initialize_object(&mut self, id: RenderId) {
        let ctx = FrameContext::new(&self.scene, &self.camera);
        self.renderer.post_initialize_render_object(&ctx, id);
    }

    pub fn commands(&self) -> &[BackendCommand] {
        self.renderer.backend().commands()
    }

    pub fn clear_commands(&mut self) {
        self.renderer.backend_mut().clear_commands();
    }

    pub fn position(&self, command: &BackendCommand) -> Option<usize> {
        self.commands().iter().position(|c| c == command)
    }
}
