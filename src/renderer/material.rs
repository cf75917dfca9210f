// renderer/material.rs
use glam::{Vec3, Vec4};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use super::backend::{Size, TextureHandle, UniformLocation};
use super::binder::SamplerBindings;
use super::handle::{MaterialId, ShaderId};
use super::shader::{Sampler, Uniform};
use crate::error::RenderError;

/// Largest texture edge the renderer will allocate.
pub const MAX_TEXTURE_DIM: u32 = 16384;

pub fn check_texture_size(size: Size) -> Result<(), RenderError> {
    if size.width > MAX_TEXTURE_DIM || size.height > MAX_TEXTURE_DIM {
        return Err(RenderError::TextureTooLarge {
            width: size.width,
            height: size.height,
            max: MAX_TEXTURE_DIM,
        });
    }
    Ok(())
}

/// File-backed texture input of a material.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureSource {
    pub path: String,
    /// Load the file when the material is created.
    pub generate: bool,
    /// Bind the texture at draw time.
    pub enable: bool,
}

impl TextureSource {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            generate: true,
            enable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialCreateInfo {
    pub name: String,
    pub shader_name: String,

    pub textures: BTreeMap<Sampler, TextureSource>,
    pub const_albedo: Vec3,
    pub const_metallic: f32,
    pub const_roughness: f32,
    pub const_ao: f32,
    pub color_multiplier: Vec4,

    pub enable_cubemap_sampler: bool,
    pub generate_cubemap_sampler: bool,
    pub generate_hdr_cubemap_sampler: bool,
    pub generated_cubemap_size: Size,
    pub cubemap_file_paths: Option<[PathBuf; 6]>,
    pub enable_cubemap_trilinear_filtering: bool,
    pub generate_cubemap_depth_buffers: bool,

    pub enable_irradiance_sampler: bool,
    pub generate_irradiance_sampler: bool,
    pub generated_irradiance_size: Size,
    /// Material whose irradiance map is shared with this one.
    pub irradiance_source: Option<MaterialId>,

    pub enable_prefiltered_map: bool,
    pub generate_prefiltered_map: bool,
    pub generated_prefiltered_size: Size,
    pub prefilter_source: Option<MaterialId>,

    pub enable_brdf_lut: bool,

    pub environment_map_path: String,
    pub generate_reflection_probe_maps: bool,

    /// Survives `clear_materials`.
    pub engine_material: bool,
    /// Named render-target inputs, bound ahead of the material's own textures.
    pub frame_buffers: Vec<(String, TextureHandle)>,
}

impl Default for MaterialCreateInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            shader_name: String::new(),
            textures: BTreeMap::new(),
            const_albedo: Vec3::ONE,
            const_metallic: 0.0,
            const_roughness: 0.5,
            const_ao: 1.0,
            color_multiplier: Vec4::ONE,
            enable_cubemap_sampler: false,
            generate_cubemap_sampler: false,
            generate_hdr_cubemap_sampler: false,
            generated_cubemap_size: Size::new(512, 512),
            cubemap_file_paths: None,
            enable_cubemap_trilinear_filtering: false,
            generate_cubemap_depth_buffers: false,
            enable_irradiance_sampler: false,
            generate_irradiance_sampler: false,
            generated_irradiance_size: Size::new(32, 32),
            irradiance_source: None,
            enable_prefiltered_map: false,
            generate_prefiltered_map: false,
            generated_prefiltered_size: Size::new(128, 128),
            prefilter_source: None,
            enable_brdf_lut: false,
            environment_map_path: String::new(),
            generate_reflection_probe_maps: false,
            engine_material: false,
            frame_buffers: Vec::new(),
        }
    }
}

impl MaterialCreateInfo {
    pub fn new(name: &str, shader_name: &str) -> Self {
        Self {
            name: name.to_string(),
            shader_name: shader_name.to_string(),
            ..Default::default()
        }
    }

    pub fn engine(mut self) -> Self {
        self.engine_material = true;
        self
    }

    pub fn with_texture(mut self, sampler: Sampler, path: impl Into<String>) -> Self {
        self.textures.insert(sampler, TextureSource::file(path));
        self
    }

    pub fn with_pbr_constants(mut self, albedo: Vec3, metallic: f32, roughness: f32, ao: f32) -> Self {
        self.const_albedo = albedo;
        self.const_metallic = metallic;
        self.const_roughness = roughness;
        self.const_ao = ao;
        self
    }

    pub fn with_image_based_lighting(mut self, source: MaterialId) -> Self {
        self.enable_irradiance_sampler = true;
        self.irradiance_source = Some(source);
        self.enable_prefiltered_map = true;
        self.prefilter_source = Some(source);
        self.enable_brdf_lut = true;
        self
    }

    /// Skybox material generating its cubemap and IBL maps from an HDR
    /// equirectangular image.
    pub fn hdr_skybox(name: &str, environment_map_path: &str) -> Self {
        Self {
            enable_cubemap_sampler: true,
            generate_hdr_cubemap_sampler: true,
            generate_irradiance_sampler: true,
            generate_prefiltered_map: true,
            environment_map_path: environment_map_path.to_string(),
            ..Self::new(name, "background")
        }
    }

    /// Reflection probe material capturing the scene around its object.
    pub fn reflection_probe(name: &str) -> Self {
        Self {
            generate_cubemap_sampler: true,
            enable_cubemap_trilinear_filtering: true,
            generate_cubemap_depth_buffers: true,
            enable_irradiance_sampler: true,
            generate_irradiance_sampler: true,
            enable_prefiltered_map: true,
            generate_prefiltered_map: true,
            enable_brdf_lut: true,
            generate_reflection_probe_maps: true,
            ..Self::new(name, "deferred_combine_cubemap")
        }
    }
}

/// A created material: its configuration plus the resources resolved for it.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub shader_id: ShaderId,
    pub info: MaterialCreateInfo,
    pub textures: BTreeMap<Sampler, TextureHandle>,
    pub uniforms: HashMap<Uniform, UniformLocation>,
    pub bindings: SamplerBindings,
    /// Per-face G-buffer cubemaps used while capturing a reflection probe.
    pub cubemap_gbuffer: Vec<(String, TextureHandle)>,
    pub cubemap_depth: Option<TextureHandle>,
    /// Textures created for this material alone, released with it.
    pub owned_textures: Vec<TextureHandle>,
}

impl Material {
    pub fn new(shader_id: ShaderId, info: MaterialCreateInfo) -> Self {
        Self {
            name: info.name.clone(),
            shader_id,
            info,
            textures: BTreeMap::new(),
            uniforms: HashMap::new(),
            bindings: SamplerBindings::default(),
            cubemap_gbuffer: Vec::new(),
            cubemap_depth: None,
            owned_textures: Vec::new(),
        }
    }

    pub fn is_engine_material(&self) -> bool {
        self.info.engine_material
    }

    pub fn enabled(&self, sampler: Sampler) -> bool {
        match sampler {
            Sampler::Cubemap => self.info.enable_cubemap_sampler,
            Sampler::Irradiance => self.info.enable_irradiance_sampler,
            Sampler::Prefiltered => self.info.enable_prefiltered_map,
            Sampler::BrdfLut => self.info.enable_brdf_lut,
            other => self.info.textures.get(&other).map_or(false, |t| t.enable),
        }
    }

    pub fn set_enabled(&mut self, sampler: Sampler, enabled: bool) {
        let info = &mut self.info;
        match sampler {
            Sampler::Cubemap => info.enable_cubemap_sampler = enabled,
            Sampler::Irradiance => info.enable_irradiance_sampler = enabled,
            Sampler::Prefiltered => info.enable_prefiltered_map = enabled,
            Sampler::BrdfLut => info.enable_brdf_lut = enabled,
            other => {
                if let Some(source) = info.textures.get_mut(&other) {
                    source.enable = enabled;
                }
            }
        }
    }

    pub fn texture(&self, sampler: Sampler) -> Option<TextureHandle> {
        self.textures.get(&sampler).copied()
    }

    pub fn location(&self, uniform: Uniform) -> Option<UniformLocation> {
        self.uniforms.get(&uniform).copied()
    }

    pub fn cubemap_size(&self) -> Size {
        self.info.generated_cubemap_size
    }

    pub fn irradiance_size(&self) -> Size {
        self.info.generated_irradiance_size
    }

    pub fn prefiltered_size(&self) -> Size {
        self.info.generated_prefiltered_size
    }

    pub fn generates_reflection_probe_maps(&self) -> bool {
        self.info.generate_reflection_probe_maps
    }

    pub fn generates_irradiance(&self) -> bool {
        self.info.generate_irradiance_sampler
    }
}
