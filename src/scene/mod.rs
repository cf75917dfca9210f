// scene/mod.rs

pub mod camera;
pub mod components;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod transform;

pub use camera::Camera;
pub use components::{
    Capabilities, Children, GameObjectKind, Name, Parent, RenderHandle, Visible, VisibleInSceneExplorer,
};
pub use scene::Scene;
pub use transform::Transform;
