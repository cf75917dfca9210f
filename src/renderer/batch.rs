// renderer/batch.rs
use log::{error, warn};

use super::handle::{MaterialId, RenderId};
use super::registry::ResourceRegistry;
use super::render_object::RenderObject;
use crate::scene::Scene;

/// Render objects sharing one material, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderBatch {
    /// `None` for the editor batch, which mixes materials.
    pub material_id: Option<MaterialId>,
    pub objects: Vec<RenderId>,
}

impl RenderBatch {
    pub fn new(material_id: Option<MaterialId>) -> Self {
        Self {
            material_id,
            objects: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Per-frame partition of the live render objects.
///
/// Batches follow material ID order and objects follow slot order. Nothing is
/// sorted by depth or state cost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderBatches {
    pub deferred: Vec<RenderBatch>,
    pub forward: Vec<RenderBatch>,
    pub editor: RenderBatch,
    pub consistency_error: bool,
}

impl RenderBatches {
    pub fn clear(&mut self) {
        self.deferred.clear();
        self.forward.clear();
        self.editor = RenderBatch::default();
        self.consistency_error = false;
    }

    /// Objects across every deferred and forward batch.
    pub fn batched_count(&self) -> usize {
        self.deferred
            .iter()
            .chain(self.forward.iter())
            .map(RenderBatch::len)
            .sum()
    }

    pub fn batch_count(&self) -> usize {
        self.deferred.len() + self.forward.len() + usize::from(!self.editor.is_empty())
    }
}

/// Visibility of a render object: its game object's flag, or its own flag
/// when it has none. A despawned game object counts as hidden.
pub fn is_object_visible(object: &RenderObject, scene: &Scene) -> bool {
    match object.game_object {
        Some(entity) => scene.is_visible(entity),
        None => object.visible,
    }
}

fn is_batchable(object: &RenderObject, scene: &Scene) -> bool {
    !object.editor_object && object.vertex_data.is_some() && is_object_visible(object, scene)
}

pub fn batch_render_objects(registry: &ResourceRegistry, scene: &Scene, batches: &mut RenderBatches) {
    batches.clear();

    for (material_id, material) in registry.materials() {
        let Some(shader) = registry.shader(material.shader_id) else {
            warn!(
                "Material {:?} has invalid shader ID {}, skipping",
                material.name, material.shader_id
            );
            continue;
        };

        let mut batch = RenderBatch::new(Some(material_id));
        batch.objects.extend(
            registry
                .render_objects()
                .filter(|o| o.material_id == material_id && is_batchable(o, scene))
                .map(|o| o.id),
        );

        if shader.deferred {
            batches.deferred.push(batch);
        } else {
            batches.forward.push(batch);
        }
    }

    batches.editor.objects.extend(
        registry
            .render_objects()
            .filter(|o| o.editor_object && is_object_visible(o, scene))
            .map(|o| o.id),
    );

    if cfg!(debug_assertions) {
        let visible = registry
            .render_objects()
            .filter(|o| is_batchable(o, scene))
            .count();
        let batched = batches.batched_count();
        if visible != batched {
            error!(
                "Batching didn't account for every visible object ({} visible, {} batched)",
                visible, batched
            );
            batches.consistency_error = true;
        }
    }
}
