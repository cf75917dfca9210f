// renderer/targets.rs
//! Offscreen render targets: the post-process ping-pong pair, the G-buffer
//! and the fixed-size capture target.

use log::{debug, info};

use super::backend::{
    Attachment, BackendError, GraphicsBackend, RenderTargetDesc, Size, TargetHandle, TextureDesc, TextureHandle,
};
use super::shader::GBUFFER_INPUTS;
use crate::error::RenderError;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const GBUFFER_FORMATS: [wgpu::TextureFormat; 3] = [
    wgpu::TextureFormat::Rgba16Float,
    wgpu::TextureFormat::Rgba16Float,
    wgpu::TextureFormat::Rgba8Unorm,
];
/// Initial size of the capture target; it is resized before each use.
pub const CAPTURE_SIZE: u32 = 512;

fn backend_error(context: &str) -> impl FnOnce(BackendError) -> RenderError + '_ {
    move |err| RenderError::Backend {
        context: context.to_string(),
        message: err.to_string(),
    }
}

/// A render target with one color texture at slot 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTarget {
    pub target: TargetHandle,
    pub texture: TextureHandle,
}

impl ColorTarget {
    fn create<B: GraphicsBackend + ?Sized>(backend: &mut B, label: &str, size: Size) -> Result<Self, RenderError> {
        let target = backend
            .create_render_target(&RenderTargetDesc {
                label: label.to_string(),
                size,
                depth_format: DEPTH_FORMAT,
            })
            .map_err(backend_error(label))?;
        let texture = backend
            .create_texture(&TextureDesc::new_2d(label, size, OFFSCREEN_FORMAT))
            .map_err(backend_error(label))?;
        backend.attach_color(target, 0, Attachment::texture(texture));
        Ok(Self { target, texture })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GBuffer {
    pub target: TargetHandle,
    /// Channel textures named after the sampler the combine pass reads them through.
    pub channels: Vec<(String, TextureHandle)>,
}

impl GBuffer {
    fn create<B: GraphicsBackend + ?Sized>(backend: &mut B, size: Size) -> Result<Self, RenderError> {
        let target = backend
            .create_render_target(&RenderTargetDesc {
                label: "G-buffer".to_string(),
                size,
                depth_format: DEPTH_FORMAT,
            })
            .map_err(backend_error("G-buffer"))?;

        let mut channels = Vec::with_capacity(GBUFFER_INPUTS.len());
        for (slot, (name, format)) in GBUFFER_INPUTS.iter().zip(GBUFFER_FORMATS).enumerate() {
            let texture = backend
                .create_texture(&TextureDesc::new_2d(name, size, format))
                .map_err(backend_error(name))?;
            backend.attach_color(target, slot as u32, Attachment::texture(texture));
            channels.push((name.to_string(), texture));
        }
        Ok(Self { target, channels })
    }
}

#[derive(Debug, Clone)]
pub struct OffscreenTargets {
    pub offscreen: [ColorTarget; 2],
    pub gbuffer: GBuffer,
    pub capture: TargetHandle,
    size: Size,
}

impl OffscreenTargets {
    pub fn new<B: GraphicsBackend + ?Sized>(backend: &mut B, size: Size) -> Result<Self, RenderError> {
        let size = Size::new(size.width.max(1), size.height.max(1));
        let capture = backend
            .create_render_target(&RenderTargetDesc {
                label: "Capture".to_string(),
                size: Size::new(CAPTURE_SIZE, CAPTURE_SIZE),
                depth_format: DEPTH_FORMAT,
            })
            .map_err(backend_error("capture target"))?;
        let offscreen = [
            ColorTarget::create(backend, "Offscreen 0", size)?,
            ColorTarget::create(backend, "Offscreen 1", size)?,
        ];
        let gbuffer = GBuffer::create(backend, size)?;
        info!("Created offscreen targets at {}x{}", size.width, size.height);

        Ok(Self {
            offscreen,
            gbuffer,
            capture,
            size,
        })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Resizes every window-sized target in place. The capture target is
    /// left alone. Zero-sized (minimized) windows are ignored.
    pub fn resize<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B, size: Size) -> bool {
        if size.width == 0 || size.height == 0 {
            debug!("Ignoring resize to {}x{}", size.width, size.height);
            return false;
        }
        if size == self.size {
            return false;
        }

        for target in &self.offscreen {
            backend.resize_texture(target.texture, size);
            backend.resize_depth(target.target, size);
        }
        for (_, texture) in &self.gbuffer.channels {
            backend.resize_texture(*texture, size);
        }
        backend.resize_depth(self.gbuffer.target, size);

        self.size = size;
        true
    }

    pub fn destroy<B: GraphicsBackend + ?Sized>(self, backend: &mut B) {
        for target in self.offscreen {
            backend.destroy_texture(target.texture);
            backend.destroy_render_target(target.target);
        }
        for (_, texture) in self.gbuffer.channels {
            backend.destroy_texture(texture);
        }
        backend.destroy_render_target(self.gbuffer.target);
        backend.destroy_render_target(self.capture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::backend::RecordingBackend;
    use rstest::rstest;

    #[test]
    fn allocates_three_gbuffer_channels() {
        let mut backend = RecordingBackend::new();
        let targets = OffscreenTargets::new(&mut backend, Size::new(800, 600)).unwrap();
        assert_eq!(targets.gbuffer.channels.len(), 3);
        let albedo = targets.gbuffer.channels[2].1;
        assert_eq!(backend.texture(albedo).unwrap().format, wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(
            backend.target(targets.capture).unwrap().depth_size,
            Size::new(CAPTURE_SIZE, CAPTURE_SIZE)
        );
    }

    #[rstest]
    #[case(Size::new(0, 720))]
    #[case(Size::new(1280, 0))]
    #[case(Size::new(800, 600))]
    fn ignores_zero_and_unchanged_sizes(#[case] size: Size) {
        let mut backend = RecordingBackend::new();
        let mut targets = OffscreenTargets::new(&mut backend, Size::new(800, 600)).unwrap();
        assert!(!targets.resize(&mut backend, size));
        assert_eq!(targets.size(), Size::new(800, 600));
    }

    #[test]
    fn resize_leaves_capture_target_alone() {
        let mut backend = RecordingBackend::new();
        let mut targets = OffscreenTargets::new(&mut backend, Size::new(1920, 1080)).unwrap();
        assert!(targets.resize(&mut backend, Size::new(1280, 720)));

        for target in &targets.offscreen {
            assert_eq!(backend.texture(target.texture).unwrap().size, Size::new(1280, 720));
            assert_eq!(backend.target(target.target).unwrap().depth_size, Size::new(1280, 720));
        }
        assert_eq!(
            backend.target(targets.capture).unwrap().depth_size,
            Size::new(CAPTURE_SIZE, CAPTURE_SIZE)
        );
    }
}
