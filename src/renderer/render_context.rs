// src/renderer/render_context.rs

use crate::scene::{Camera, Scene};

/// Per-frame inputs the host hands to the renderer.
///
/// The renderer never owns the scene or camera; it borrows them for the
/// duration of one call.
pub struct FrameContext<'a> {
    pub scene: &'a Scene,
    pub camera: &'a Camera,
    /// Draw editor-only objects (light icons, the editor batch).
    pub render_editor_objects: bool,
}

impl<'a> FrameContext<'a> {
    pub fn new(scene: &'a Scene, camera: &'a Camera) -> Self {
        Self {
            scene,
            camera,
            render_editor_objects: false,
        }
    }

    pub fn with_editor_objects(mut self, enabled: bool) -> Self {
        self.render_editor_objects = enabled;
        self
    }
}

/// Debug toggles polled by `Renderer::update`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugInput {
    pub recapture_reflection_probes: bool,
    pub show_fxaa_edges: bool,
}

/// Selects the variant of a geometry pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawCallInfo {
    /// Writing into the G-buffer rather than a single color target.
    pub deferred: bool,
    /// Render object of the reflection probe being captured, if any.
    pub cubemap_object: Option<super::handle::RenderId>,
}

impl DrawCallInfo {
    pub fn deferred() -> Self {
        Self {
            deferred: true,
            cubemap_object: None,
        }
    }

    pub fn forward() -> Self {
        Self::default()
    }

    pub fn into_cubemap(self, probe: super::handle::RenderId) -> Self {
        Self {
            cubemap_object: Some(probe),
            ..self
        }
    }
}
