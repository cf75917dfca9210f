// scene/components.rs
// hecs components attached to game objects

use bitflags::bitflags;

use crate::renderer::handle::{MaterialId, RenderId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Visibility component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visible(pub bool);

impl Default for Visible {
    fn default() -> Self {
        Self(true)
    }
}

/// Whether the editor lists the object; no effect on rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleInSceneExplorer(pub bool);

impl Default for VisibleInSceneExplorer {
    fn default() -> Self {
        Self(true)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Written out when the host saves the scene.
        const SERIALIZABLE = 1 << 0;
        const RENDERABLE = 1 << 1;
        const INTERACTABLE = 1 << 2;
        /// Pushes fresh state to the renderer every frame.
        const UPDATABLE = 1 << 3;
    }
}

/// What a game object is. The discriminator is stable and used when the
/// scene is serialized by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GameObjectKind {
    Empty = 0,
    Mesh = 1,
    PointLight = 2,
    DirectionalLight = 3,
    Skybox = 4,
    ReflectionProbe = 5,
}

impl GameObjectKind {
    pub fn discriminator(self) -> u8 {
        self as u8
    }

    pub fn from_discriminator(value: u8) -> Option<Self> {
        use GameObjectKind::*;
        [Empty, Mesh, PointLight, DirectionalLight, Skybox, ReflectionProbe]
            .into_iter()
            .find(|kind| kind.discriminator() == value)
    }

    pub fn capabilities(self) -> Capabilities {
        let kind = match self {
            GameObjectKind::Empty => Capabilities::empty(),
            GameObjectKind::Mesh | GameObjectKind::Skybox | GameObjectKind::ReflectionProbe => {
                Capabilities::RENDERABLE
            }
            GameObjectKind::PointLight | GameObjectKind::DirectionalLight => Capabilities::UPDATABLE,
        };
        Capabilities::SERIALIZABLE | kind
    }
}

/// Links a game object to the render object drawing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderHandle {
    pub render_id: RenderId,
    pub material_id: MaterialId,
}

/// Parent entity reference
#[derive(Debug, Clone, Copy)]
pub struct Parent(pub hecs::Entity);

/// List of children entities
#[derive(Debug, Clone, Default)]
pub struct Children(pub Vec<hecs::Entity>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminator_round_trips() {
        for value in 0..6 {
            let kind = GameObjectKind::from_discriminator(value).unwrap();
            assert_eq!(kind.discriminator(), value);
        }
        assert!(GameObjectKind::from_discriminator(6).is_none());
    }

    #[test]
    fn capabilities_follow_kind() {
        let probe = GameObjectKind::ReflectionProbe.capabilities();
        assert!(probe.contains(Capabilities::SERIALIZABLE | Capabilities::RENDERABLE));

        let light = GameObjectKind::PointLight.capabilities();
        assert!(light.contains(Capabilities::UPDATABLE));
        assert!(!light.contains(Capabilities::RENDERABLE));

        assert_eq!(GameObjectKind::Empty.capabilities(), Capabilities::SERIALIZABLE);
        assert!(!GameObjectKind::Mesh.capabilities().contains(Capabilities::INTERACTABLE));
    }
}
