pub mod backend;
pub mod batch;
pub mod binder;
pub mod capture;
pub mod handle;
pub mod lights;
pub mod material;
mod passes;
pub mod postprocess;
pub mod primitives;
pub mod registry;
pub mod render_context;
pub mod render_object;
#[allow(clippy::module_inception)]
mod renderer;
pub mod shader;
pub mod sprites;
pub mod targets;
pub mod vertex;

pub use backend::{GraphicsBackend, RecordingBackend, Size};
pub use batch::{RenderBatch, RenderBatches};
pub use handle::{MaterialId, RenderId, ShaderId};
pub use lights::{DirectionalLight, Lights, PointLight};
pub use material::{Material, MaterialCreateInfo};
pub use registry::ResourceRegistry;
pub use render_context::{DebugInput, DrawCallInfo, FrameContext};
pub use render_object::{RenderObject, RenderObjectCreateInfo};
pub use renderer::{
    EngineObjects, Renderer, RendererStats, TextGeometry, DIRECTIONAL_LIGHT_ICON, GBUFFER_MATERIAL, GBUFFER_QUAD,
    POINT_LIGHT_ICON,
};
pub use shader::{Sampler, Shader, Uniform};
pub use sprites::{AnchorPoint, SpriteQuadDrawInfo};
