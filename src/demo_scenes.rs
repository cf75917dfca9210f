use std::sync::Arc;

use glam::{Vec3, Vec4};
use log::info;

use deferred_render::app::{DemoRenderer, SceneSetup};
use deferred_render::renderer::primitives;
use deferred_render::renderer::vertex::{VertexBufferData, VertexStreams};
use deferred_render::renderer::{
    DirectionalLight, MaterialCreateInfo, MaterialId, PointLight, RenderObjectCreateInfo,
};
use deferred_render::scene::{Camera, GameObjectKind, RenderHandle, Scene, Transform};
use deferred_render::RenderError;

const ENVIRONMENT_MAP: &str = "resources/textures/hdr/venice_sunset_1k.hdr";

#[allow(dead_code)]
#[derive(Clone, Copy, Debug)]
pub enum DemoScene {
    /// Grid of spheres sweeping metallic and roughness, lit by the skybox.
    PbrSpheres,
    /// The sphere grid lit by a reflection probe capturing the scene.
    ReflectionProbe,
}

impl DemoScene {
    pub fn setup(self) -> SceneSetup {
        match self {
            DemoScene::PbrSpheres => setup_pbr_scene,
            DemoScene::ReflectionProbe => setup_reflection_probe_scene,
        }
    }
}

struct MeshDesc {
    streams: VertexStreams,
    indices: Option<Vec<u32>>,
    cull_mode: Option<wgpu::Face>,
    depth_write: bool,
}

impl MeshDesc {
    fn sphere() -> Self {
        let (streams, indices) = primitives::sphere(32, 16, Vec4::ONE);
        Self {
            streams,
            indices: Some(indices),
            cull_mode: Some(wgpu::Face::Back),
            depth_write: true,
        }
    }

    fn skybox() -> Self {
        Self {
            streams: primitives::skybox_cube(),
            indices: None,
            cull_mode: None,
            depth_write: false,
        }
    }
}

/// Spawns a game object and creates its render object.
fn spawn_mesh(
    renderer: &mut DemoRenderer,
    scene: &mut Scene,
    name: &str,
    kind: GameObjectKind,
    transform: Transform,
    material_id: MaterialId,
    mesh: MeshDesc,
) -> hecs::Entity {
    let entity = scene.spawn(name, kind, transform);
    let render_id = renderer.create_render_object(RenderObjectCreateInfo {
        name: name.to_string(),
        material_id: Some(material_id),
        game_object: Some(entity),
        vertex_data: Some(Arc::new(VertexBufferData::from_streams(&mesh.streams))),
        indices: mesh.indices.map(Arc::new),
        cull_mode: mesh.cull_mode,
        depth_write: mesh.depth_write,
        ..Default::default()
    });
    scene.set_render_handle(entity, RenderHandle { render_id, material_id });
    entity
}

fn spawn_skybox(renderer: &mut DemoRenderer, scene: &mut Scene) -> Result<MaterialId, RenderError> {
    let material = renderer.create_material(MaterialCreateInfo::hdr_skybox("Skybox", ENVIRONMENT_MAP))?;
    let skybox = spawn_mesh(
        renderer,
        scene,
        "Skybox",
        GameObjectKind::Skybox,
        Transform::IDENTITY,
        material,
        MeshDesc::skybox(),
    );
    renderer.set_skybox_mesh(scene, Some(skybox));
    Ok(material)
}

fn spawn_lights(scene: &mut Scene) {
    scene.set_directional_light("Sun", DirectionalLight::default());
    for (name, position, color) in [
        ("Warm light", Vec3::new(-4.0, 3.0, 4.0), Vec3::new(1.0, 0.8, 0.6)),
        ("Cool light", Vec3::new(4.0, 3.0, 4.0), Vec3::new(0.6, 0.8, 1.0)),
    ] {
        scene.add_point_light(name, PointLight::new(position, color, 20.0));
    }
}

/// 5x5 spheres, metallic increasing by row and roughness by column.
fn spawn_sphere_grid(
    renderer: &mut DemoRenderer,
    scene: &mut Scene,
    ibl_source: MaterialId,
) -> Result<(), RenderError> {
    const GRID: i32 = 5;
    const SPACING: f32 = 2.5;

    for row in 0..GRID {
        for col in 0..GRID {
            let metallic = row as f32 / (GRID - 1) as f32;
            let roughness = (col as f32 / (GRID - 1) as f32).clamp(0.05, 1.0);
            let name = format!("Sphere {row}x{col}");
            let material = renderer.create_material(
                MaterialCreateInfo::new(&name, "pbr")
                    .with_pbr_constants(Vec3::new(0.9, 0.1, 0.1), metallic, roughness, 1.0)
                    .with_image_based_lighting(ibl_source),
            )?;
            let position = Vec3::new(
                (col - GRID / 2) as f32 * SPACING,
                (row - GRID / 2) as f32 * SPACING,
                0.0,
            );
            spawn_mesh(
                renderer,
                scene,
                &name,
                GameObjectKind::Mesh,
                Transform::from_translation(position),
                material,
                MeshDesc::sphere(),
            );
        }
    }
    Ok(())
}

fn spawn_glass_sphere(renderer: &mut DemoRenderer, scene: &mut Scene) -> Result<(), RenderError> {
    let mut info = MaterialCreateInfo::new("Glass", "color");
    info.color_multiplier = Vec4::new(0.6, 0.8, 1.0, 0.4);
    let material = renderer.create_material(info)?;
    spawn_mesh(
        renderer,
        scene,
        "Glass sphere",
        GameObjectKind::Mesh,
        Transform::from_translation(Vec3::new(0.0, 0.0, 3.0)).with_scale(Vec3::splat(1.5)),
        material,
        MeshDesc::sphere(),
    );
    Ok(())
}

pub fn setup_pbr_scene(renderer: &mut DemoRenderer, scene: &mut Scene, camera: &mut Camera) -> Result<(), RenderError> {
    *camera = Camera::looking_at(Vec3::new(0.0, 0.0, 16.0), Vec3::ZERO);
    let skybox = spawn_skybox(renderer, scene)?;
    renderer.set_reflection_probe_material(Some(skybox));
    spawn_lights(scene);
    spawn_sphere_grid(renderer, scene, skybox)?;
    spawn_glass_sphere(renderer, scene)?;
    info!("PBR scene ready with {} game objects", scene.len());
    Ok(())
}

pub fn setup_reflection_probe_scene(
    renderer: &mut DemoRenderer,
    scene: &mut Scene,
    camera: &mut Camera,
) -> Result<(), RenderError> {
    *camera = Camera::looking_at(Vec3::new(0.0, 2.0, 16.0), Vec3::ZERO);
    spawn_skybox(renderer, scene)?;

    let probe_material = renderer.create_material(MaterialCreateInfo::reflection_probe("Reflection probe"))?;
    let probe = spawn_mesh(
        renderer,
        scene,
        "Reflection probe",
        GameObjectKind::ReflectionProbe,
        Transform::from_translation(Vec3::new(0.0, 0.0, 2.0)),
        probe_material,
        MeshDesc::sphere(),
    );
    scene.set_visible(probe, false);
    renderer.set_reflection_probe_material(Some(probe_material));

    spawn_lights(scene);
    spawn_sphere_grid(renderer, scene, probe_material)?;
    spawn_glass_sphere(renderer, scene)?;
    info!("Reflection probe scene ready with {} game objects", scene.len());
    Ok(())
}
