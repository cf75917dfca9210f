// renderer/shader.rs
use bitflags::bitflags;
use std::path::PathBuf;

pub const SHADER_DIRECTORY: &str = "resources/shaders";

bitflags! {
    /// Semantic vertex channels a shader consumes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VertexAttributes: u32 {
        const POSITION = 1 << 0;
        const POSITION_2D = 1 << 1;
        const UV = 1 << 2;
        const COLOR = 1 << 3;
        const TANGENT = 1 << 4;
        const BITANGENT = 1 << 5;
        const NORMAL = 1 << 6;
        const EXTRA_VEC4 = 1 << 7;
        const EXTRA_INT = 1 << 8;
    }
}

impl VertexAttributes {
    /// Size in bytes of one interleaved vertex carrying these attributes.
    pub fn stride(self) -> usize {
        let mut size = 0;
        for (flag, bytes) in [
            (Self::POSITION, 12),
            (Self::POSITION_2D, 8),
            (Self::UV, 8),
            (Self::COLOR, 16),
            (Self::TANGENT, 12),
            (Self::BITANGENT, 12),
            (Self::NORMAL, 12),
            (Self::EXTRA_VEC4, 16),
            (Self::EXTRA_INT, 4),
        ] {
            if self.contains(flag) {
                size += bytes;
            }
        }
        size
    }
}

/// Texture inputs a material can provide, in binding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sampler {
    Albedo,
    Metallic,
    Roughness,
    AmbientOcclusion,
    Diffuse,
    Normal,
    HdrEquirectangular,
    Cubemap,
    BrdfLut,
    Irradiance,
    Prefiltered,
}

bitflags! {
    /// Samplers a shader declares as needed. Declaration order is binding order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SamplerNeeds: u32 {
        const ALBEDO = 1 << 0;
        const METALLIC = 1 << 1;
        const ROUGHNESS = 1 << 2;
        const AMBIENT_OCCLUSION = 1 << 3;
        const DIFFUSE = 1 << 4;
        const NORMAL = 1 << 5;
        const HDR_EQUIRECTANGULAR = 1 << 6;
        const CUBEMAP = 1 << 7;
        const BRDF_LUT = 1 << 8;
        const IRRADIANCE = 1 << 9;
        const PREFILTERED = 1 << 10;
    }
}

impl Sampler {
    pub const ALL: [Sampler; 11] = [
        Sampler::Albedo,
        Sampler::Metallic,
        Sampler::Roughness,
        Sampler::AmbientOcclusion,
        Sampler::Diffuse,
        Sampler::Normal,
        Sampler::HdrEquirectangular,
        Sampler::Cubemap,
        Sampler::BrdfLut,
        Sampler::Irradiance,
        Sampler::Prefiltered,
    ];

    pub fn uniform_name(self) -> &'static str {
        match self {
            Sampler::Albedo => "albedoSampler",
            Sampler::Metallic => "metallicSampler",
            Sampler::Roughness => "roughnessSampler",
            Sampler::AmbientOcclusion => "aoSampler",
            Sampler::Diffuse => "diffuseSampler",
            Sampler::Normal => "normalSampler",
            Sampler::HdrEquirectangular => "hdrEquirectangularSampler",
            Sampler::Cubemap => "cubemapSampler",
            Sampler::BrdfLut => "brdfLUT",
            Sampler::Irradiance => "irradianceSampler",
            Sampler::Prefiltered => "prefilterMap",
        }
    }

    /// Samplers whose texture is loaded from a file path on the material.
    pub fn is_file_backed(self) -> bool {
        matches!(
            self,
            Sampler::Albedo
                | Sampler::Metallic
                | Sampler::Roughness
                | Sampler::AmbientOcclusion
                | Sampler::Diffuse
                | Sampler::Normal
                | Sampler::HdrEquirectangular
        )
    }

    pub const fn flag(self) -> SamplerNeeds {
        match self {
            Sampler::Albedo => SamplerNeeds::ALBEDO,
            Sampler::Metallic => SamplerNeeds::METALLIC,
            Sampler::Roughness => SamplerNeeds::ROUGHNESS,
            Sampler::AmbientOcclusion => SamplerNeeds::AMBIENT_OCCLUSION,
            Sampler::Diffuse => SamplerNeeds::DIFFUSE,
            Sampler::Normal => SamplerNeeds::NORMAL,
            Sampler::HdrEquirectangular => SamplerNeeds::HDR_EQUIRECTANGULAR,
            Sampler::Cubemap => SamplerNeeds::CUBEMAP,
            Sampler::BrdfLut => SamplerNeeds::BRDF_LUT,
            Sampler::Irradiance => SamplerNeeds::IRRADIANCE,
            Sampler::Prefiltered => SamplerNeeds::PREFILTERED,
        }
    }

    fn from_flag(flag: SamplerNeeds) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.flag() == flag)
    }
}

impl SamplerNeeds {
    pub fn of(samplers: &[Sampler]) -> Self {
        samplers.iter().map(|s| s.flag()).collect()
    }

    /// Needed samplers in binding order.
    pub fn samplers(self) -> impl Iterator<Item = Sampler> {
        self.iter().filter_map(Sampler::from_flag)
    }
}

/// Non-texture uniforms known to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniform {
    Model,
    ModelInvTranspose,
    ModelViewProjection,
    ColorMultiplier,
    ContrastBrightnessSaturation,
    View,
    ViewInv,
    ViewProjection,
    Projection,
    CamPos,
    PointLights,
    DirLight,
    TexelStep,
    DebugShowEdges,
    LumaThresholdMin,
    LumaThresholdMax,
    MulReduce,
    MinReduce,
    MaxSpan,
    EnableDiffuseSampler,
    EnableNormalSampler,
    EnableCubemapSampler,
    EnableAlbedoSampler,
    ConstAlbedo,
    EnableMetallicSampler,
    ConstMetallic,
    EnableRoughnessSampler,
    ConstRoughness,
    EnableAoSampler,
    ConstAo,
    EnableIrradianceSampler,
    Roughness,
    TransformMat,
    TexSize,
    Threshold,
    Soften,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UniformSet: u64 {
        const MODEL = 1 << 0;
        const MODEL_INV_TRANSPOSE = 1 << 1;
        const MODEL_VIEW_PROJECTION = 1 << 2;
        const COLOR_MULTIPLIER = 1 << 3;
        const CONTRAST_BRIGHTNESS_SATURATION = 1 << 4;
        const VIEW = 1 << 5;
        const VIEW_INV = 1 << 6;
        const VIEW_PROJECTION = 1 << 7;
        const PROJECTION = 1 << 8;
        const CAM_POS = 1 << 9;
        const POINT_LIGHTS = 1 << 10;
        const DIR_LIGHT = 1 << 11;
        const TEXEL_STEP = 1 << 12;
        const DEBUG_SHOW_EDGES = 1 << 13;
        const LUMA_THRESHOLD_MIN = 1 << 14;
        const LUMA_THRESHOLD_MAX = 1 << 15;
        const MUL_REDUCE = 1 << 16;
        const MIN_REDUCE = 1 << 17;
        const MAX_SPAN = 1 << 18;
        const ENABLE_DIFFUSE_SAMPLER = 1 << 19;
        const ENABLE_NORMAL_SAMPLER = 1 << 20;
        const ENABLE_CUBEMAP_SAMPLER = 1 << 21;
        const ENABLE_ALBEDO_SAMPLER = 1 << 22;
        const CONST_ALBEDO = 1 << 23;
        const ENABLE_METALLIC_SAMPLER = 1 << 24;
        const CONST_METALLIC = 1 << 25;
        const ENABLE_ROUGHNESS_SAMPLER = 1 << 26;
        const CONST_ROUGHNESS = 1 << 27;
        const ENABLE_AO_SAMPLER = 1 << 28;
        const CONST_AO = 1 << 29;
        const ENABLE_IRRADIANCE_SAMPLER = 1 << 30;
        const ROUGHNESS = 1 << 31;
        const TRANSFORM_MAT = 1 << 32;
        const TEX_SIZE = 1 << 33;
        const THRESHOLD = 1 << 34;
        const SOFTEN = 1 << 35;
    }
}

impl Uniform {
    pub const ALL: [Uniform; 36] = [
        Uniform::Model,
        Uniform::ModelInvTranspose,
        Uniform::ModelViewProjection,
        Uniform::ColorMultiplier,
        Uniform::ContrastBrightnessSaturation,
        Uniform::View,
        Uniform::ViewInv,
        Uniform::ViewProjection,
        Uniform::Projection,
        Uniform::CamPos,
        Uniform::PointLights,
        Uniform::DirLight,
        Uniform::TexelStep,
        Uniform::DebugShowEdges,
        Uniform::LumaThresholdMin,
        Uniform::LumaThresholdMax,
        Uniform::MulReduce,
        Uniform::MinReduce,
        Uniform::MaxSpan,
        Uniform::EnableDiffuseSampler,
        Uniform::EnableNormalSampler,
        Uniform::EnableCubemapSampler,
        Uniform::EnableAlbedoSampler,
        Uniform::ConstAlbedo,
        Uniform::EnableMetallicSampler,
        Uniform::ConstMetallic,
        Uniform::EnableRoughnessSampler,
        Uniform::ConstRoughness,
        Uniform::EnableAoSampler,
        Uniform::ConstAo,
        Uniform::EnableIrradianceSampler,
        Uniform::Roughness,
        Uniform::TransformMat,
        Uniform::TexSize,
        Uniform::Threshold,
        Uniform::Soften,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Uniform::Model => "model",
            Uniform::ModelInvTranspose => "modelInvTranspose",
            Uniform::ModelViewProjection => "modelViewProjection",
            Uniform::ColorMultiplier => "colorMultiplier",
            Uniform::ContrastBrightnessSaturation => "contrastBrightnessSaturation",
            Uniform::View => "view",
            Uniform::ViewInv => "viewInv",
            Uniform::ViewProjection => "viewProjection",
            Uniform::Projection => "projection",
            Uniform::CamPos => "camPos",
            Uniform::PointLights => "pointLights",
            Uniform::DirLight => "dirLight",
            Uniform::TexelStep => "texelStep",
            Uniform::DebugShowEdges => "bDEBUGShowEdges",
            Uniform::LumaThresholdMin => "lumaThresholdMin",
            Uniform::LumaThresholdMax => "lumaThresholdMax",
            Uniform::MulReduce => "mulReduce",
            Uniform::MinReduce => "minReduce",
            Uniform::MaxSpan => "maxSpan",
            Uniform::EnableDiffuseSampler => "enableDiffuseSampler",
            Uniform::EnableNormalSampler => "enableNormalSampler",
            Uniform::EnableCubemapSampler => "enableCubemapSampler",
            Uniform::EnableAlbedoSampler => "enableAlbedoSampler",
            Uniform::ConstAlbedo => "constAlbedo",
            Uniform::EnableMetallicSampler => "enableMetallicSampler",
            Uniform::ConstMetallic => "constMetallic",
            Uniform::EnableRoughnessSampler => "enableRoughnessSampler",
            Uniform::ConstRoughness => "constRoughness",
            Uniform::EnableAoSampler => "enableAOSampler",
            Uniform::ConstAo => "constAO",
            Uniform::EnableIrradianceSampler => "enableIrradianceSampler",
            Uniform::Roughness => "roughness",
            Uniform::TransformMat => "transformMat",
            Uniform::TexSize => "texSize",
            Uniform::Threshold => "threshold",
            Uniform::Soften => "soften",
        }
    }

    pub const fn flag(self) -> UniformSet {
        match self {
            Uniform::Model => UniformSet::MODEL,
            Uniform::ModelInvTranspose => UniformSet::MODEL_INV_TRANSPOSE,
            Uniform::ModelViewProjection => UniformSet::MODEL_VIEW_PROJECTION,
            Uniform::ColorMultiplier => UniformSet::COLOR_MULTIPLIER,
            Uniform::ContrastBrightnessSaturation => UniformSet::CONTRAST_BRIGHTNESS_SATURATION,
            Uniform::View => UniformSet::VIEW,
            Uniform::ViewInv => UniformSet::VIEW_INV,
            Uniform::ViewProjection => UniformSet::VIEW_PROJECTION,
            Uniform::Projection => UniformSet::PROJECTION,
            Uniform::CamPos => UniformSet::CAM_POS,
            Uniform::PointLights => UniformSet::POINT_LIGHTS,
            Uniform::DirLight => UniformSet::DIR_LIGHT,
            Uniform::TexelStep => UniformSet::TEXEL_STEP,
            Uniform::DebugShowEdges => UniformSet::DEBUG_SHOW_EDGES,
            Uniform::LumaThresholdMin => UniformSet::LUMA_THRESHOLD_MIN,
            Uniform::LumaThresholdMax => UniformSet::LUMA_THRESHOLD_MAX,
            Uniform::MulReduce => UniformSet::MUL_REDUCE,
            Uniform::MinReduce => UniformSet::MIN_REDUCE,
            Uniform::MaxSpan => UniformSet::MAX_SPAN,
            Uniform::EnableDiffuseSampler => UniformSet::ENABLE_DIFFUSE_SAMPLER,
            Uniform::EnableNormalSampler => UniformSet::ENABLE_NORMAL_SAMPLER,
            Uniform::EnableCubemapSampler => UniformSet::ENABLE_CUBEMAP_SAMPLER,
            Uniform::EnableAlbedoSampler => UniformSet::ENABLE_ALBEDO_SAMPLER,
            Uniform::ConstAlbedo => UniformSet::CONST_ALBEDO,
            Uniform::EnableMetallicSampler => UniformSet::ENABLE_METALLIC_SAMPLER,
            Uniform::ConstMetallic => UniformSet::CONST_METALLIC,
            Uniform::EnableRoughnessSampler => UniformSet::ENABLE_ROUGHNESS_SAMPLER,
            Uniform::ConstRoughness => UniformSet::CONST_ROUGHNESS,
            Uniform::EnableAoSampler => UniformSet::ENABLE_AO_SAMPLER,
            Uniform::ConstAo => UniformSet::CONST_AO,
            Uniform::EnableIrradianceSampler => UniformSet::ENABLE_IRRADIANCE_SAMPLER,
            Uniform::Roughness => UniformSet::ROUGHNESS,
            Uniform::TransformMat => UniformSet::TRANSFORM_MAT,
            Uniform::TexSize => UniformSet::TEX_SIZE,
            Uniform::Threshold => UniformSet::THRESHOLD,
            Uniform::Soften => UniformSet::SOFTEN,
        }
    }

    fn from_flag(flag: UniformSet) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.flag() == flag)
    }
}

impl UniformSet {
    pub fn of(uniforms: &[Uniform]) -> Self {
        uniforms.iter().map(|u| u.flag()).collect()
    }

    pub fn uniforms(self) -> impl Iterator<Item = Uniform> {
        self.iter().filter_map(Uniform::from_flag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
    pub geometry: Option<PathBuf>,
}

impl ShaderSource {
    fn from_stems(vertex: &str, fragment: &str) -> Self {
        let dir = PathBuf::from(SHADER_DIRECTORY);
        Self {
            vertex: dir.join(format!("{vertex}.vert")),
            fragment: dir.join(format!("{fragment}.frag")),
            geometry: None,
        }
    }
}

/// Immutable description of a GPU program and the inputs it consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Shader {
    pub name: String,
    pub source: ShaderSource,
    pub vertex_attributes: VertexAttributes,
    /// Geometry-pass shader writing into the G-buffer.
    pub deferred: bool,
    pub translucent: bool,
    pub depth_write: bool,
    pub needs: SamplerNeeds,
    /// Frame-scope uniforms (camera, lights, screen constants).
    pub constant_uniforms: UniformSet,
    /// Per-material or per-object uniforms.
    pub dynamic_uniforms: UniformSet,
    /// Named render-target inputs sampled ahead of the material textures.
    pub frame_buffer_inputs: Vec<String>,
}

impl Shader {
    pub fn new(name: &str, vertex: &str, fragment: &str) -> Self {
        Self {
            name: name.to_string(),
            source: ShaderSource::from_stems(vertex, fragment),
            vertex_attributes: VertexAttributes::empty(),
            deferred: false,
            translucent: false,
            depth_write: true,
            needs: SamplerNeeds::empty(),
            constant_uniforms: UniformSet::empty(),
            dynamic_uniforms: UniformSet::empty(),
            frame_buffer_inputs: Vec::new(),
        }
    }

    pub fn with_deferred(mut self) -> Self {
        self.deferred = true;
        self
    }

    pub fn with_translucent(mut self) -> Self {
        self.translucent = true;
        self
    }

    pub fn without_depth_write(mut self) -> Self {
        self.depth_write = false;
        self
    }

    pub fn with_attributes(mut self, attributes: VertexAttributes) -> Self {
        self.vertex_attributes = attributes;
        self
    }

    pub fn with_samplers(mut self, samplers: &[Sampler]) -> Self {
        self.needs = SamplerNeeds::of(samplers);
        self
    }

    pub fn with_constant(mut self, uniforms: &[Uniform]) -> Self {
        self.constant_uniforms = UniformSet::of(uniforms);
        self
    }

    pub fn with_dynamic(mut self, uniforms: &[Uniform]) -> Self {
        self.dynamic_uniforms = UniformSet::of(uniforms);
        self
    }

    pub fn with_frame_buffer_inputs(mut self, names: &[&str]) -> Self {
        self.frame_buffer_inputs = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_geometry_stage(mut self, stem: &str) -> Self {
        self.source.geometry = Some(PathBuf::from(SHADER_DIRECTORY).join(format!("{stem}.geom")));
        self
    }

    pub fn needs(&self, sampler: Sampler) -> bool {
        self.needs.contains(sampler.flag())
    }

    pub fn has_uniform(&self, uniform: Uniform) -> bool {
        (self.constant_uniforms | self.dynamic_uniforms).contains(uniform.flag())
    }

    /// Every uniform name a backend should be able to resolve for this shader.
    pub fn declared_names(&self) -> Vec<String> {
        let mut names: Vec<String> = (self.constant_uniforms | self.dynamic_uniforms)
            .uniforms()
            .map(|u| u.name().to_string())
            .collect();
        names.extend(self.needs.samplers().map(|s| s.uniform_name().to_string()));
        names.extend(self.frame_buffer_inputs.iter().cloned());
        names
    }
}

pub const GBUFFER_INPUTS: [&str; 3] = [
    "positionMetallicFrameBufferSampler",
    "normalRoughnessFrameBufferSampler",
    "albedoAOFrameBufferSampler",
];

/// The engine's shader catalog, in load order.
pub fn builtin_shaders() -> Vec<Shader> {
    use Sampler as S;
    use Uniform as U;
    use VertexAttributes as A;

    let mesh_attributes = A::POSITION | A::UV | A::COLOR | A::TANGENT | A::BITANGENT | A::NORMAL;

    vec![
        Shader::new("deferred_simple", "deferred_simple", "deferred_simple")
            .with_deferred()
            .with_attributes(mesh_attributes)
            .with_samplers(&[S::Diffuse, S::Normal])
            .with_constant(&[U::View, U::Projection])
            .with_dynamic(&[
                U::Model,
                U::ModelInvTranspose,
                U::EnableDiffuseSampler,
                U::EnableNormalSampler,
            ]),
        // Lighting pass over the G-buffer; not itself deferred
        Shader::new("deferred_combine", "deferred_combine", "deferred_combine")
            .without_depth_write()
            .with_attributes(A::POSITION | A::UV)
            .with_samplers(&[S::BrdfLut, S::Irradiance, S::Prefiltered])
            .with_constant(&[U::CamPos, U::PointLights, U::DirLight])
            .with_dynamic(&[U::EnableIrradianceSampler])
            .with_frame_buffer_inputs(&GBUFFER_INPUTS),
        Shader::new(
            "deferred_combine_cubemap",
            "deferred_combine_cubemap",
            "deferred_combine_cubemap",
        )
        .without_depth_write()
        .with_attributes(A::POSITION)
        .with_samplers(&[S::BrdfLut, S::Irradiance, S::Prefiltered])
        .with_constant(&[U::View, U::Projection, U::CamPos, U::PointLights, U::DirLight])
        .with_dynamic(&[U::Model, U::EnableIrradianceSampler])
        .with_frame_buffer_inputs(&GBUFFER_INPUTS),
        Shader::new("color", "color", "color")
            .with_translucent()
            .with_attributes(A::POSITION | A::COLOR)
            .with_constant(&[U::View, U::Projection])
            .with_dynamic(&[U::Model, U::ColorMultiplier]),
        Shader::new("pbr", "pbr", "pbr")
            .with_deferred()
            .with_attributes(mesh_attributes)
            .with_samplers(&[S::Albedo, S::Metallic, S::Roughness, S::AmbientOcclusion, S::Normal])
            .with_constant(&[U::View, U::Projection])
            .with_dynamic(&[
                U::Model,
                U::ModelInvTranspose,
                U::ConstAlbedo,
                U::EnableAlbedoSampler,
                U::ConstMetallic,
                U::EnableMetallicSampler,
                U::ConstRoughness,
                U::EnableRoughnessSampler,
                U::ConstAo,
                U::EnableAoSampler,
                U::EnableNormalSampler,
            ]),
        Shader::new("skybox", "skybox", "skybox")
            .with_attributes(A::POSITION)
            .with_samplers(&[S::Cubemap])
            .with_constant(&[U::View, U::Projection])
            .with_dynamic(&[U::Model, U::EnableCubemapSampler]),
        Shader::new("equirectangular_to_cube", "skybox", "equirectangular_to_cube")
            .with_attributes(A::POSITION)
            .with_samplers(&[S::HdrEquirectangular])
            .with_constant(&[U::View, U::Projection])
            .with_dynamic(&[U::Model]),
        Shader::new("irradiance", "skybox", "irradiance")
            .with_attributes(A::POSITION)
            .with_samplers(&[S::Cubemap])
            .with_constant(&[U::View, U::Projection])
            .with_dynamic(&[U::Model]),
        Shader::new("prefilter", "skybox", "prefilter")
            .with_attributes(A::POSITION)
            .with_samplers(&[S::Cubemap])
            .with_constant(&[U::View, U::Projection])
            .with_dynamic(&[U::Model, U::Roughness]),
        Shader::new("brdf", "brdf", "brdf").with_attributes(A::POSITION | A::UV),
        Shader::new("background", "background", "background")
            .with_attributes(A::POSITION)
            .with_samplers(&[S::Cubemap])
            .with_constant(&[U::View, U::Projection])
            .with_dynamic(&[U::Model]),
        Shader::new("sprite", "sprite", "sprite")
            .with_attributes(A::POSITION | A::UV)
            .with_constant(&[U::View, U::Projection])
            .with_dynamic(&[U::Model, U::ColorMultiplier]),
        Shader::new("post_process", "post_process", "post_process")
            .with_attributes(A::POSITION_2D | A::UV)
            .with_dynamic(&[U::Model, U::ColorMultiplier, U::ContrastBrightnessSaturation]),
        Shader::new("post_fxaa", "post_fxaa", "post_fxaa")
            .with_attributes(A::POSITION_2D | A::UV)
            .with_constant(&[
                U::LumaThresholdMin,
                U::LumaThresholdMax,
                U::MulReduce,
                U::MinReduce,
                U::MaxSpan,
                U::TexelStep,
                U::DebugShowEdges,
            ]),
        Shader::new("font", "font", "font")
            .with_geometry_stage("font")
            .with_attributes(A::POSITION_2D | A::UV | A::COLOR | A::EXTRA_VEC4 | A::EXTRA_INT)
            .with_dynamic(&[U::TransformMat, U::TexSize, U::Threshold, U::Soften]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_sums_attribute_sizes() {
        assert_eq!(VertexAttributes::POSITION.stride(), 12);
        assert_eq!((VertexAttributes::POSITION_2D | VertexAttributes::UV).stride(), 16);
        assert_eq!(VertexAttributes::empty().stride(), 0);
    }

    #[test]
    fn sampler_needs_iterate_in_binding_order() {
        let needs = SamplerNeeds::of(&[Sampler::Normal, Sampler::Albedo, Sampler::Prefiltered]);
        let order: Vec<_> = needs.samplers().collect();
        assert_eq!(order, vec![Sampler::Albedo, Sampler::Normal, Sampler::Prefiltered]);
    }

    #[test]
    fn flag_order_matches_enum_order() {
        let samplers: Vec<_> = SamplerNeeds::all().samplers().collect();
        assert_eq!(samplers, Sampler::ALL.to_vec());
        let uniforms: Vec<_> = UniformSet::all().uniforms().collect();
        assert_eq!(uniforms, Uniform::ALL.to_vec());
    }

    #[test]
    fn catalog_flags_match_pass_usage() {
        let shaders = builtin_shaders();
        let find = |name: &str| shaders.iter().find(|s| s.name == name).unwrap();

        assert!(find("pbr").deferred);
        assert!(find("deferred_simple").deferred);
        assert!(!find("deferred_combine").deferred);
        assert!(!find("deferred_combine").depth_write);
        assert!(find("color").translucent);
        assert!(find("deferred_combine").needs(Sampler::Prefiltered));
        assert!(find("prefilter").has_uniform(Uniform::Roughness));
        assert!(find("font").source.geometry.is_some());
        assert_eq!(
            find("irradiance").source.vertex,
            PathBuf::from(SHADER_DIRECTORY).join("skybox.vert")
        );
    }

    #[test]
    fn catalog_names_are_unique() {
        let shaders = builtin_shaders();
        let mut names: Vec<_> = shaders.iter().map(|s| s.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), shaders.len());
    }

    #[test]
    fn declared_names_cover_samplers_and_frame_buffers() {
        let combine = builtin_shaders()
            .into_iter()
            .find(|s| s.name == "deferred_combine")
            .unwrap();
        let names = combine.declared_names();
        assert!(names.iter().any(|n| n == "camPos"));
        assert!(names.iter().any(|n| n == "brdfLUT"));
        assert!(names.iter().any(|n| n == "albedoAOFrameBufferSampler"));
    }
}
