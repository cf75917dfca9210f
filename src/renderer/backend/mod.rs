//! Graphics backend seam.
//!
//! The orchestrator only speaks to the GPU through [`GraphicsBackend`], so the
//! pass sequencing can run against any API. [`RecordingBackend`] is the
//! headless implementation used by the tests and the demo binary.

mod recording;

pub use recording::{BackendCommand, RecordingBackend};

use bitflags::bitflags;
use std::path::PathBuf;
use thiserror::Error;
use winit::dpi::PhysicalSize;

use super::handle::Handle;
use super::shader::Shader;
use super::vertex::VertexBufferData;

pub enum ProgramTag {}
pub enum TextureTag {}
pub enum TargetTag {}
pub enum GeometryTag {}

pub type ProgramHandle = Handle<ProgramTag>;
pub type TextureHandle = Handle<TextureTag>;
pub type TargetHandle = Handle<TargetTag>;
pub type GeometryHandle = Handle<GeometryTag>;

pub type Size = PhysicalSize<u32>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("resource creation failed: {0}")]
    ResourceCreation(String),
    #[error("invalid handle: {0}")]
    InvalidHandle(String),
    #[error("incomplete render target: {0}")]
    IncompleteTarget(String),
    #[error("api error: {0}")]
    Api(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    UInt(u32),
    Float(f32),
    Vec2(glam::Vec2),
    Vec4(glam::Vec4),
    Mat4(glam::Mat4),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    D2,
    Cube,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub label: String,
    pub kind: TextureKind,
    pub size: Size,
    pub format: wgpu::TextureFormat,
    pub mip_levels: u32,
    pub trilinear: bool,
}

impl TextureDesc {
    pub fn new_2d(label: &str, size: Size, format: wgpu::TextureFormat) -> Self {
        Self {
            label: label.to_string(),
            kind: TextureKind::D2,
            size,
            format,
            mip_levels: 1,
            trilinear: false,
        }
    }

    pub fn new_cube(label: &str, size: Size, format: wgpu::TextureFormat) -> Self {
        Self {
            kind: TextureKind::Cube,
            ..Self::new_2d(label, size, format)
        }
    }

    pub fn with_mips(mut self, mip_levels: u32) -> Self {
        self.mip_levels = mip_levels.max(1);
        self
    }

    pub fn with_trilinear(mut self, trilinear: bool) -> Self {
        self.trilinear = trilinear;
        self
    }
}

/// Request to load an image file into a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureLoad {
    pub path: PathBuf,
    pub hdr: bool,
    pub alpha: bool,
    pub flip_vertically: bool,
    pub generate_mipmaps: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTargetDesc {
    pub label: String,
    pub size: Size,
    pub depth_format: wgpu::TextureFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];
}

/// A texture (optionally one cube face and mip) bound as a render output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    pub texture: TextureHandle,
    pub face: Option<CubeFace>,
    pub mip: u32,
}

impl Attachment {
    pub fn texture(texture: TextureHandle) -> Self {
        Self {
            texture,
            face: None,
            mip: 0,
        }
    }

    pub fn cube_face(texture: TextureHandle, face: CubeFace, mip: u32) -> Self {
        Self {
            texture,
            face: Some(face),
            mip,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

/// Fixed-function state applied before a draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterState {
    pub cull_mode: Option<wgpu::Face>,
    pub front_face: wgpu::FrontFace,
    pub depth_compare: wgpu::CompareFunction,
    pub depth_write: bool,
    pub blend: Option<wgpu::BlendState>,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            cull_mode: Some(wgpu::Face::Back),
            front_face: wgpu::FrontFace::Ccw,
            depth_compare: wgpu::CompareFunction::LessEqual,
            depth_write: true,
            blend: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCommand {
    pub topology: wgpu::PrimitiveTopology,
    pub vertex_count: u32,
    pub index_count: Option<u32>,
}

pub trait GraphicsBackend {
    fn name(&self) -> &str;

    fn create_program(&mut self, shader: &Shader) -> Result<ProgramHandle, BackendError>;
    fn destroy_program(&mut self, program: ProgramHandle);
    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;
    fn use_program(&mut self, program: Option<ProgramHandle>);
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle, BackendError>;
    fn load_texture(&mut self, request: &TextureLoad) -> Result<TextureHandle, BackendError>;
    /// Loads six face images (+X, -X, +Y, -Y, +Z, -Z) into one cube texture.
    fn load_cubemap(&mut self, faces: &[PathBuf; 6], hdr: bool) -> Result<TextureHandle, BackendError>;
    fn resize_texture(&mut self, texture: TextureHandle, size: Size);
    fn generate_mipmaps(&mut self, texture: TextureHandle);
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);
    fn destroy_texture(&mut self, texture: TextureHandle);

    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<TargetHandle, BackendError>;
    fn resize_depth(&mut self, target: TargetHandle, size: Size);
    fn attach_color(&mut self, target: TargetHandle, slot: u32, attachment: Attachment);
    /// `None` restores the target's own depth buffer.
    fn attach_depth(&mut self, target: TargetHandle, attachment: Option<Attachment>);
    /// `None` binds the display surface.
    fn bind_target(&mut self, target: Option<TargetHandle>);
    fn set_draw_buffers(&mut self, count: u32);
    fn set_viewport(&mut self, size: Size);
    fn clear(&mut self, flags: ClearFlags);
    fn blit_depth(&mut self, source: Option<TargetHandle>, destination: Option<TargetHandle>, size: Size);
    fn destroy_render_target(&mut self, target: TargetHandle);

    fn upload_geometry(
        &mut self,
        data: &VertexBufferData,
        indices: Option<&[u32]>,
    ) -> Result<GeometryHandle, BackendError>;
    fn bind_geometry(&mut self, geometry: GeometryHandle);
    fn destroy_geometry(&mut self, geometry: GeometryHandle);

    fn set_raster_state(&mut self, state: &RasterState);
    fn draw(&mut self, command: &DrawCommand);
    fn present(&mut self, vsync: bool);

    /// Pops the oldest pending API error, if any.
    fn take_error(&mut self) -> Option<BackendError>;
}

/// Drains and logs pending backend errors. Rendering continues regardless.
pub fn report_errors<B: GraphicsBackend + ?Sized>(backend: &mut B, context: &str) -> usize {
    let mut count = 0;
    while let Some(err) = backend.take_error() {
        log::error!("{context}: {err}");
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_raster_state_is_opaque_back_culled() {
        let state = RasterState::default();
        assert_eq!(state.cull_mode, Some(wgpu::Face::Back));
        assert!(state.blend.is_none());
        assert!(state.depth_write);
    }

    #[test]
    fn report_errors_drains_queue() {
        let mut backend = RecordingBackend::new();
        backend.inject_error(BackendError::Api("bad enum".into()));
        backend.inject_error(BackendError::Api("bad value".into()));
        assert_eq!(report_errors(&mut backend, "test"), 2);
        assert_eq!(report_errors(&mut backend, "test"), 0);
    }
}
