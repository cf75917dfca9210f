// scene/scene.rs
use glam::{Mat4, Vec3};
use hecs::{Entity, World};
use log::{debug, warn};

use super::components::*;
use crate::renderer::lights::{DirectionalLight, Lights, PointLight};
use crate::scene::Transform;

/// Game objects of one scene. Ordered roots, parent links and the light
/// collection the renderer reads every frame.
pub struct Scene {
    pub world: World,
    roots: Vec<Entity>,
    lights: Lights,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            roots: Vec::new(),
            lights: Lights::new(),
        }
    }

    pub fn spawn(&mut self, name: &str, kind: GameObjectKind, transform: Transform) -> Entity {
        let entity = self.world.spawn((
            Name::new(name),
            kind,
            transform,
            Visible::default(),
            VisibleInSceneExplorer::default(),
        ));
        self.roots.push(entity);
        entity
    }

    /// Spawns under `parent`. Returns `None` when the parent doesn't exist.
    pub fn spawn_child(
        &mut self,
        parent: Entity,
        name: &str,
        kind: GameObjectKind,
        transform: Transform,
    ) -> Option<Entity> {
        if !self.world.contains(parent) {
            warn!("Can't spawn {name:?}: parent {parent:?} doesn't exist");
            return None;
        }
        let entity = self.world.spawn((
            Name::new(name),
            kind,
            transform,
            Visible::default(),
            VisibleInSceneExplorer::default(),
            Parent(parent),
        ));
        let appended = self
            .world
            .get::<&mut Children>(parent)
            .map(|mut children| children.0.push(entity))
            .is_ok();
        if !appended {
            let _ = self.world.insert_one(parent, Children(vec![entity]));
        }
        Some(entity)
    }

    /// Despawns the entity and its descendants.
    pub fn despawn(&mut self, entity: Entity) {
        if let Ok(parent) = self.world.get::<&Parent>(entity).map(|p| p.0) {
            if let Ok(mut children) = self.world.get::<&mut Children>(parent) {
                children.0.retain(|&c| c != entity);
            }
        }
        self.roots.retain(|&r| r != entity);

        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            if let Ok(children) = self.world.get::<&Children>(current) {
                stack.extend(children.0.iter().copied());
            }
            if self.world.despawn(current).is_err() {
                debug!("Entity {current:?} was already despawned");
            }
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    pub fn roots(&self) -> &[Entity] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.world.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }

    pub fn name(&self, entity: Entity) -> Option<String> {
        self.world.get::<&Name>(entity).ok().map(|n| n.0.clone())
    }

    pub fn kind(&self, entity: Entity) -> Option<GameObjectKind> {
        self.world.get::<&GameObjectKind>(entity).ok().map(|k| *k)
    }

    /// Missing entities are hidden.
    pub fn is_visible(&self, entity: Entity) -> bool {
        self.world.get::<&Visible>(entity).map(|v| v.0).unwrap_or(false)
    }

    pub fn set_visible(&mut self, entity: Entity, visible: bool) -> bool {
        match self.world.get::<&mut Visible>(entity) {
            Ok(mut flag) => {
                flag.0 = visible;
                true
            }
            Err(_) => false,
        }
    }

    pub fn set_transform(&mut self, entity: Entity, transform: Transform) -> bool {
        match self.world.get::<&mut Transform>(entity) {
            Ok(mut t) => {
                *t = transform;
                true
            }
            Err(_) => false,
        }
    }

    /// Model matrix of the entity, composed up its parent chain.
    pub fn world_transform(&self, entity: Entity) -> Option<Mat4> {
        let mut matrix = self.world.get::<&Transform>(entity).ok()?.matrix();
        let mut current = entity;
        while let Ok(parent) = self.world.get::<&Parent>(current).map(|p| p.0) {
            let Ok(local) = self.world.get::<&Transform>(parent) else {
                break;
            };
            matrix = local.matrix() * matrix;
            current = parent;
        }
        Some(matrix)
    }

    pub fn world_position(&self, entity: Entity) -> Option<Vec3> {
        self.world_transform(entity).map(|m| m.w_axis.truncate())
    }

    pub fn set_render_handle(&mut self, entity: Entity, handle: RenderHandle) -> bool {
        self.world.insert_one(entity, handle).is_ok()
    }

    pub fn render_handle(&self, entity: Entity) -> Option<RenderHandle> {
        self.world.get::<&RenderHandle>(entity).ok().map(|h| *h)
    }

    pub fn lights(&self) -> &Lights {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut Lights {
        &mut self.lights
    }

    /// Adds a point light and a game object at its position. Returns `None`
    /// when every light slot is taken.
    pub fn add_point_light(&mut self, name: &str, light: PointLight) -> Option<Entity> {
        self.lights.add_point(light)?;
        Some(self.spawn(name, GameObjectKind::PointLight, Transform::from_translation(light.position)))
    }

    pub fn set_directional_light(&mut self, name: &str, light: DirectionalLight) -> Entity {
        self.lights.set_directional(Some(light));
        self.spawn(
            name,
            GameObjectKind::DirectionalLight,
            Transform::from_translation(light.position),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_transform_composes_with_parent() {
        let mut scene = Scene::new();
        let parent = scene.spawn(
            "parent",
            GameObjectKind::Empty,
            Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)),
        );
        let child = scene
            .spawn_child(
                parent,
                "child",
                GameObjectKind::Mesh,
                Transform::from_translation(Vec3::new(0.0, 2.0, 0.0)),
            )
            .unwrap();
        assert_eq!(scene.world_position(child), Some(Vec3::new(1.0, 2.0, 0.0)));
        assert_eq!(scene.roots(), &[parent]);
    }

    #[test]
    fn despawn_removes_descendants() {
        let mut scene = Scene::new();
        let parent = scene.spawn("parent", GameObjectKind::Empty, Transform::default());
        let child = scene
            .spawn_child(parent, "child", GameObjectKind::Mesh, Transform::default())
            .unwrap();
        scene.despawn(parent);
        assert!(!scene.contains(child));
        assert!(!scene.is_visible(child));
        assert!(scene.roots().is_empty());
    }

    #[test]
    fn light_slots_are_bounded() {
        let mut scene = Scene::new();
        for i in 0..crate::renderer::lights::MAX_POINT_LIGHTS {
            let light = PointLight::new(Vec3::new(i as f32, 0.0, 0.0), Vec3::ONE, 1.0);
            assert!(scene.add_point_light("light", light).is_some());
        }
        let extra = PointLight::new(Vec3::ZERO, Vec3::ONE, 1.0);
        assert!(scene.add_point_light("extra", extra).is_none());
    }
}
