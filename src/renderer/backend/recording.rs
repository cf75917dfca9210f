//! Headless backend that records every call.
//!
//! No GPU work happens; resources are plain bookkeeping entries so that pass
//! ordering, state changes and target sizes can be inspected afterwards.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use super::{
    Attachment, BackendError, ClearFlags, DrawCommand, GeometryHandle, GraphicsBackend,
    ProgramHandle, RasterState, RenderTargetDesc, Size, TargetHandle, TextureDesc, TextureHandle,
    TextureKind, TextureLoad, UniformLocation, UniformValue,
};
use crate::renderer::shader::Shader;
use crate::renderer::vertex::VertexBufferData;

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    CreateProgram { program: ProgramHandle, shader: String },
    DestroyProgram(ProgramHandle),
    UseProgram(Option<ProgramHandle>),
    SetUniform { location: UniformLocation, name: String, value: UniformValue },
    CreateTexture { texture: TextureHandle, label: String, size: Size },
    LoadTexture { texture: TextureHandle, path: String },
    ResizeTexture { texture: TextureHandle, size: Size },
    GenerateMipmaps(TextureHandle),
    BindTexture { unit: u32, texture: TextureHandle },
    DestroyTexture(TextureHandle),
    CreateTarget { target: TargetHandle, label: String, size: Size },
    ResizeDepth { target: TargetHandle, size: Size },
    AttachColor { target: TargetHandle, slot: u32, attachment: Attachment },
    AttachDepth { target: TargetHandle, attachment: Option<Attachment> },
    BindTarget(Option<TargetHandle>),
    SetDrawBuffers(u32),
    SetViewport(Size),
    Clear(ClearFlags),
    BlitDepth { source: Option<TargetHandle>, destination: Option<TargetHandle>, size: Size },
    DestroyTarget(TargetHandle),
    UploadGeometry { geometry: GeometryHandle, vertex_count: u32, index_count: Option<u32> },
    BindGeometry(GeometryHandle),
    DestroyGeometry(GeometryHandle),
    SetRasterState(RasterState),
    Draw(DrawCommand),
    Present { vsync: bool },
}

#[derive(Debug, Clone)]
struct ProgramRecord {
    uniforms: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TextureRecord {
    pub label: String,
    pub kind: TextureKind,
    pub size: Size,
    pub format: wgpu::TextureFormat,
    pub mip_levels: u32,
}

#[derive(Debug, Clone)]
pub struct TargetRecord {
    pub label: String,
    pub depth_size: Size,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<BackendCommand>,
    programs: HashMap<ProgramHandle, ProgramRecord>,
    textures: HashMap<TextureHandle, TextureRecord>,
    targets: HashMap<TargetHandle, TargetRecord>,
    geometry: HashMap<GeometryHandle, u32>,
    locations: Vec<String>,
    errors: VecDeque<BackendError>,
    failing_shaders: Vec<String>,
    fail_next_upload: bool,
    next_id: u32,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[BackendCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, BackendCommand::Draw(_)))
            .count()
    }

    pub fn texture(&self, texture: TextureHandle) -> Option<&TextureRecord> {
        self.textures.get(&texture)
    }

    pub fn target(&self, target: TargetHandle) -> Option<&TargetRecord> {
        self.targets.get(&target)
    }

    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn live_geometry_count(&self) -> usize {
        self.geometry.len()
    }

    pub fn live_program_count(&self) -> usize {
        self.programs.len()
    }

    /// Queue an error to be reported by the next `take_error` call.
    pub fn inject_error(&mut self, error: BackendError) {
        self.errors.push_back(error);
    }

    /// Make `create_program` fail for the named shader.
    pub fn fail_shader(&mut self, name: &str) {
        self.failing_shaders.push(name.to_string());
    }

    /// Make the next `upload_geometry` call fail.
    pub fn fail_next_upload(&mut self) {
        self.fail_next_upload = true;
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, command: BackendCommand) {
        log::trace!("RecordingBackend: {:?}", command);
        self.commands.push(command);
    }
}

impl GraphicsBackend for RecordingBackend {
    fn name(&self) -> &str {
        "Recording Backend"
    }

    fn create_program(&mut self, shader: &Shader) -> Result<ProgramHandle, BackendError> {
        if self.failing_shaders.iter().any(|s| s == &shader.name) {
            return Err(BackendError::ResourceCreation(format!(
                "couldn't compile {:?} & {:?}",
                shader.source.vertex, shader.source.fragment
            )));
        }

        let program = ProgramHandle::new(self.allocate());
        self.programs.insert(
            program,
            ProgramRecord {
                uniforms: shader.declared_names(),
            },
        );
        self.record(BackendCommand::CreateProgram {
            program,
            shader: shader.name.clone(),
        });
        Ok(program)
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program).is_none() {
            self.errors
                .push_back(BackendError::InvalidHandle(format!("program {program}")));
        }
        self.record(BackendCommand::DestroyProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let record = self.programs.get(&program)?;
        // Array members such as "pointLights[2].color" resolve through their root
        let root = name.split(['[', '.']).next().unwrap_or(name);
        if !record.uniforms.iter().any(|u| u == name || u == root) {
            return None;
        }
        let index = match self.locations.iter().position(|l| l == name) {
            Some(index) => index,
            None => {
                self.locations.push(name.to_string());
                self.locations.len() - 1
            }
        };
        Some(UniformLocation(index as u32))
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.record(BackendCommand::UseProgram(program));
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let name = self
            .locations
            .get(location.0 as usize)
            .cloned()
            .unwrap_or_default();
        self.record(BackendCommand::SetUniform {
            location,
            name,
            value,
        });
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle, BackendError> {
        if desc.size.width == 0 || desc.size.height == 0 {
            return Err(BackendError::ResourceCreation(format!(
                "texture {:?} has zero size",
                desc.label
            )));
        }
        let texture = TextureHandle::new(self.allocate());
        self.textures.insert(
            texture,
            TextureRecord {
                label: desc.label.clone(),
                kind: desc.kind,
                size: desc.size,
                format: desc.format,
                mip_levels: desc.mip_levels,
            },
        );
        self.record(BackendCommand::CreateTexture {
            texture,
            label: desc.label.clone(),
            size: desc.size,
        });
        Ok(texture)
    }

    fn load_texture(&mut self, request: &TextureLoad) -> Result<TextureHandle, BackendError> {
        let texture = TextureHandle::new(self.allocate());
        let label = request.path.display().to_string();
        self.textures.insert(
            texture,
            TextureRecord {
                label: label.clone(),
                kind: TextureKind::D2,
                size: Size::new(1, 1),
                format: if request.hdr {
                    wgpu::TextureFormat::Rgba16Float
                } else {
                    wgpu::TextureFormat::Rgba8Unorm
                },
                mip_levels: 1,
            },
        );
        self.record(BackendCommand::LoadTexture {
            texture,
            path: label,
        });
        Ok(texture)
    }

    fn load_cubemap(&mut self, faces: &[PathBuf; 6], hdr: bool) -> Result<TextureHandle, BackendError> {
        if let Some(missing) = faces.iter().find(|p| p.as_os_str().is_empty()) {
            return Err(BackendError::ResourceCreation(format!(
                "cubemap face path {:?} is empty",
                missing
            )));
        }
        let texture = TextureHandle::new(self.allocate());
        let label = faces[0].display().to_string();
        self.textures.insert(
            texture,
            TextureRecord {
                label: label.clone(),
                kind: TextureKind::Cube,
                size: Size::new(1, 1),
                format: if hdr {
                    wgpu::TextureFormat::Rgba16Float
                } else {
                    wgpu::TextureFormat::Rgba8Unorm
                },
                mip_levels: 1,
            },
        );
        self.record(BackendCommand::LoadTexture {
            texture,
            path: label,
        });
        Ok(texture)
    }

    fn resize_texture(&mut self, texture: TextureHandle, size: Size) {
        match self.textures.get_mut(&texture) {
            Some(record) => record.size = size,
            None => self
                .errors
                .push_back(BackendError::InvalidHandle(format!("texture {texture}"))),
        }
        self.record(BackendCommand::ResizeTexture { texture, size });
    }

    fn generate_mipmaps(&mut self, texture: TextureHandle) {
        self.record(BackendCommand::GenerateMipmaps(texture));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.record(BackendCommand::BindTexture { unit, texture });
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture);
        self.record(BackendCommand::DestroyTexture(texture));
    }

    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<TargetHandle, BackendError> {
        let target = TargetHandle::new(self.allocate());
        self.targets.insert(
            target,
            TargetRecord {
                label: desc.label.clone(),
                depth_size: desc.size,
            },
        );
        self.record(BackendCommand::CreateTarget {
            target,
            label: desc.label.clone(),
            size: desc.size,
        });
        Ok(target)
    }

    fn resize_depth(&mut self, target: TargetHandle, size: Size) {
        match self.targets.get_mut(&target) {
            Some(record) => record.depth_size = size,
            None => self
                .errors
                .push_back(BackendError::InvalidHandle(format!("target {target}"))),
        }
        self.record(BackendCommand::ResizeDepth { target, size });
    }

    fn attach_color(&mut self, target: TargetHandle, slot: u32, attachment: Attachment) {
        self.record(BackendCommand::AttachColor {
            target,
            slot,
            attachment,
        });
    }

    fn attach_depth(&mut self, target: TargetHandle, attachment: Option<Attachment>) {
        self.record(BackendCommand::AttachDepth { target, attachment });
    }

    fn bind_target(&mut self, target: Option<TargetHandle>) {
        self.record(BackendCommand::BindTarget(target));
    }

    fn set_draw_buffers(&mut self, count: u32) {
        self.record(BackendCommand::SetDrawBuffers(count));
    }

    fn set_viewport(&mut self, size: Size) {
        self.record(BackendCommand::SetViewport(size));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.record(BackendCommand::Clear(flags));
    }

    fn blit_depth(&mut self, source: Option<TargetHandle>, destination: Option<TargetHandle>, size: Size) {
        self.record(BackendCommand::BlitDepth {
            source,
            destination,
            size,
        });
    }

    fn destroy_render_target(&mut self, target: TargetHandle) {
        self.targets.remove(&target);
        self.record(BackendCommand::DestroyTarget(target));
    }

    fn upload_geometry(
        &mut self,
        data: &VertexBufferData,
        indices: Option<&[u32]>,
    ) -> Result<GeometryHandle, BackendError> {
        if std::mem::take(&mut self.fail_next_upload) {
            return Err(BackendError::ResourceCreation("geometry upload failed".to_string()));
        }
        let geometry = GeometryHandle::new(self.allocate());
        self.geometry.insert(geometry, data.vertex_count());
        self.record(BackendCommand::UploadGeometry {
            geometry,
            vertex_count: data.vertex_count(),
            index_count: indices.map(|i| i.len() as u32),
        });
        Ok(geometry)
    }

    fn bind_geometry(&mut self, geometry: GeometryHandle) {
        if !self.geometry.contains_key(&geometry) {
            self.errors
                .push_back(BackendError::InvalidHandle(format!("geometry {geometry}")));
        }
        self.record(BackendCommand::BindGeometry(geometry));
    }

    fn destroy_geometry(&mut self, geometry: GeometryHandle) {
        self.geometry.remove(&geometry);
        self.record(BackendCommand::DestroyGeometry(geometry));
    }

    fn set_raster_state(&mut self, state: &RasterState) {
        self.record(BackendCommand::SetRasterState(*state));
    }

    fn draw(&mut self, command: &DrawCommand) {
        self.record(BackendCommand::Draw(*command));
    }

    fn present(&mut self, vsync: bool) {
        self.record(BackendCommand::Present { vsync });
    }

    fn take_error(&mut self) -> Option<BackendError> {
        self.errors.pop_front()
    }
}
