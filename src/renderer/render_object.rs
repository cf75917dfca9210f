// renderer/render_object.rs
use std::sync::Arc;

use super::backend::{DrawCommand, GeometryHandle, RasterState};
use super::handle::{MaterialId, RenderId};
use super::vertex::VertexBufferData;

#[derive(Debug, Clone)]
pub struct RenderObjectCreateInfo {
    pub name: String,
    pub material_id: Option<MaterialId>,
    /// Owning game object; `None` for renderer-internal objects.
    pub game_object: Option<hecs::Entity>,
    pub vertex_data: Option<Arc<VertexBufferData>>,
    pub indices: Option<Arc<Vec<u32>>>,
    pub cull_mode: Option<wgpu::Face>,
    pub front_face: wgpu::FrontFace,
    pub depth_compare: wgpu::CompareFunction,
    pub depth_write: bool,
    pub topology: wgpu::PrimitiveTopology,
    /// Visibility used when there is no game object to ask.
    pub visible: bool,
    pub visible_in_scene_explorer: bool,
    pub editor_object: bool,
}

impl Default for RenderObjectCreateInfo {
    fn default() -> Self {
        let raster = RasterState::default();
        Self {
            name: String::new(),
            material_id: None,
            game_object: None,
            vertex_data: None,
            indices: None,
            cull_mode: raster.cull_mode,
            front_face: raster.front_face,
            depth_compare: raster.depth_compare,
            depth_write: raster.depth_write,
            topology: wgpu::PrimitiveTopology::TriangleList,
            visible: true,
            visible_in_scene_explorer: true,
            editor_object: false,
        }
    }
}

impl RenderObjectCreateInfo {
    /// Full-screen or overlay geometry the passes draw by hand.
    pub fn internal(name: &str, material_id: MaterialId, vertex_data: Arc<VertexBufferData>) -> Self {
        Self {
            name: name.to_string(),
            material_id: Some(material_id),
            vertex_data: Some(vertex_data),
            cull_mode: None,
            depth_compare: wgpu::CompareFunction::Always,
            depth_write: false,
            visible: false,
            visible_in_scene_explorer: false,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderObject {
    pub id: RenderId,
    pub name: String,
    pub material_id: MaterialId,
    pub material_name: String,
    pub game_object: Option<hecs::Entity>,
    pub vertex_data: Option<Arc<VertexBufferData>>,
    pub indices: Option<Arc<Vec<u32>>>,
    pub geometry: Option<GeometryHandle>,
    pub cull_mode: Option<wgpu::Face>,
    pub front_face: wgpu::FrontFace,
    pub depth_compare: wgpu::CompareFunction,
    pub depth_write: bool,
    pub topology: wgpu::PrimitiveTopology,
    pub visible: bool,
    pub visible_in_scene_explorer: bool,
    pub editor_object: bool,
}

impl RenderObject {
    pub fn new(id: RenderId, material_id: MaterialId, info: RenderObjectCreateInfo) -> Self {
        Self {
            id,
            name: info.name,
            material_id,
            material_name: String::new(),
            game_object: info.game_object,
            vertex_data: info.vertex_data,
            indices: info.indices.filter(|i| !i.is_empty()),
            geometry: None,
            cull_mode: info.cull_mode,
            front_face: info.front_face,
            depth_compare: info.depth_compare,
            depth_write: info.depth_write,
            topology: info.topology,
            visible: info.visible,
            visible_in_scene_explorer: info.visible_in_scene_explorer,
            editor_object: info.editor_object,
        }
    }

    pub fn indexed(&self) -> bool {
        self.indices.is_some()
    }

    pub fn raster_state(&self, blend: Option<wgpu::BlendState>) -> RasterState {
        RasterState {
            cull_mode: self.cull_mode,
            front_face: self.front_face,
            depth_compare: self.depth_compare,
            depth_write: self.depth_write,
            blend,
        }
    }

    /// Draw call covering the whole object, or `None` without vertex data.
    pub fn draw_command(&self) -> Option<DrawCommand> {
        let vertex_data = self.vertex_data.as_ref()?;
        Some(DrawCommand {
            topology: self.topology,
            vertex_count: vertex_data.vertex_count(),
            index_count: self.indices.as_ref().map(|i| i.len() as u32),
        })
    }
}
