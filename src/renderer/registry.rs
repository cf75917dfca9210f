// renderer/registry.rs
//! Indexed storage for shaders, materials and render objects.

use log::{error, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Instant;

use super::backend::{GraphicsBackend, ProgramHandle, TextureDesc, TextureHandle, TextureLoad, UniformValue};
use super::binder::sampler_bindings;
use super::handle::{MaterialId, RenderId, ShaderId};
use super::material::{check_texture_size, Material, MaterialCreateInfo};
use super::render_object::{RenderObject, RenderObjectCreateInfo};
use super::shader::{builtin_shaders, Sampler, Shader, GBUFFER_INPUTS};
use crate::error::RenderError;

pub const PREFILTER_MIP_LEVELS: u32 = 5;

const GBUFFER_CUBE_FORMATS: [wgpu::TextureFormat; 3] = [
    wgpu::TextureFormat::Rgba16Float,
    wgpu::TextureFormat::Rgba16Float,
    wgpu::TextureFormat::Rgba8Unorm,
];

#[derive(Default)]
pub struct ResourceRegistry {
    shaders: Vec<Shader>,
    programs: Vec<Option<ProgramHandle>>,
    materials: BTreeMap<MaterialId, Material>,
    render_objects: Vec<Option<RenderObject>>,
    texture_cache: HashMap<String, TextureHandle>,
    brdf_lut: Option<TextureHandle>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Shaders
    // ------------------------------------------------------------------

    /// Compiles the shader catalog. Returns how many programs failed.
    pub fn load_shaders<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B) -> usize {
        self.shaders = builtin_shaders();
        let mut failures = 0;
        self.programs = self
            .shaders
            .iter()
            .map(|shader| match backend.create_program(shader) {
                Ok(program) => Some(program),
                Err(err) => {
                    error!("Failed to load shader {:?}: {}", shader.name, err);
                    failures += 1;
                    None
                }
            })
            .collect();
        info!("Loaded {} shaders ({} failed)", self.shaders.len(), failures);
        failures
    }

    /// Recompiles every program and re-resolves the uniforms of live materials.
    pub fn reload_shaders<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B) -> usize {
        for program in self.programs.drain(..).flatten() {
            backend.destroy_program(program);
        }
        let failures = self.load_shaders(backend);

        let ids: Vec<MaterialId> = self.materials.keys().copied().collect();
        for id in ids {
            let Some(mut material) = self.materials.remove(&id) else {
                continue;
            };
            if let Some(shader) = self.shaders.get(material.shader_id.slot()).cloned() {
                let program = self.program(material.shader_id);
                self.resolve_uniforms(backend, &mut material, &shader, program);
            }
            self.materials.insert(id, material);
        }
        failures
    }

    pub fn shader_id(&self, name: &str) -> Option<ShaderId> {
        self.shaders
            .iter()
            .position(|s| s.name == name)
            .map(|i| ShaderId::new(i as u32))
    }

    pub fn shader(&self, id: ShaderId) -> Option<&Shader> {
        self.shaders.get(id.slot())
    }

    pub fn program(&self, id: ShaderId) -> Option<ProgramHandle> {
        self.programs.get(id.slot()).copied().flatten()
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    // ------------------------------------------------------------------
    // Materials
    // ------------------------------------------------------------------

    pub fn set_brdf_lut(&mut self, texture: Option<TextureHandle>) {
        self.brdf_lut = texture;
    }

    pub fn brdf_lut(&self) -> Option<TextureHandle> {
        self.brdf_lut
    }

    fn next_material_id(&self) -> MaterialId {
        let mut index = 0;
        while self.materials.contains_key(&MaterialId::new(index)) {
            index += 1;
        }
        MaterialId::new(index)
    }

    pub fn create_material<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        info: MaterialCreateInfo,
    ) -> Result<MaterialId, RenderError> {
        if info.name.is_empty() {
            warn!("Material doesn't have a name!");
        }
        if info.shader_name.is_empty() {
            error!("Material {:?}: shader name must be filled in", info.name);
            return Err(RenderError::ShaderNotFound { name: String::new() });
        }
        let Some(shader_id) = self.shader_id(&info.shader_name) else {
            error!("Material {:?}: shader {:?} not found", info.name, info.shader_name);
            return Err(RenderError::ShaderNotFound {
                name: info.shader_name.clone(),
            });
        };

        let generates_cubemap =
            info.generate_cubemap_sampler || info.generate_hdr_cubemap_sampler || info.generate_reflection_probe_maps;
        if generates_cubemap {
            check_texture_size(info.generated_cubemap_size)?;
        }
        if info.generate_irradiance_sampler {
            check_texture_size(info.generated_irradiance_size)?;
        }
        if info.generate_prefiltered_map {
            check_texture_size(info.generated_prefiltered_size)?;
        }

        let shader = self.shaders[shader_id.slot()].clone();
        let program = self.program(shader_id);
        let id = self.next_material_id();
        let mut material = Material::new(shader_id, info);

        for sampler in Sampler::ALL {
            if material.enabled(sampler) && !shader.needs(sampler) {
                warn!(
                    "Material {:?} enables {} but shader {:?} doesn't use it, disabling",
                    material.name,
                    sampler.uniform_name(),
                    shader.name
                );
                material.set_enabled(sampler, false);
            }
        }

        self.resolve_uniforms(backend, &mut material, &shader, program);
        self.share_lighting_maps(&mut material, &shader);
        self.load_file_textures(backend, &mut material, &shader);
        Self::generate_cubemaps(backend, &mut material);

        self.materials.insert(id, material);
        Ok(id)
    }

    fn resolve_uniforms<B: GraphicsBackend + ?Sized>(
        &self,
        backend: &mut B,
        material: &mut Material,
        shader: &Shader,
        program: Option<ProgramHandle>,
    ) {
        material.uniforms.clear();
        material.bindings = sampler_bindings(shader);

        let Some(program) = program else {
            warn!(
                "Material {:?}: shader {:?} has no program, uniforms left unresolved",
                material.name, shader.name
            );
            return;
        };

        backend.use_program(Some(program));
        for uniform in (shader.constant_uniforms | shader.dynamic_uniforms).uniforms() {
            match backend.uniform_location(program, uniform.name()) {
                Some(location) => {
                    material.uniforms.insert(uniform, location);
                }
                None => warn!(
                    "Uniform {} was not found in material {:?} (shader {:?})",
                    uniform.name(),
                    material.name,
                    shader.name
                ),
            }
        }

        let units = material
            .bindings
            .frame_buffers
            .iter()
            .map(|(name, unit)| (name.clone(), *unit))
            .chain(
                material
                    .bindings
                    .samplers
                    .iter()
                    .map(|(sampler, unit)| (sampler.uniform_name().to_string(), *unit)),
            )
            .collect::<Vec<_>>();
        for (name, unit) in units {
            match backend.uniform_location(program, &name) {
                Some(location) => backend.set_uniform(location, UniformValue::Int(unit as i32)),
                None => warn!(
                    "Sampler {} was not found in material {:?} (shader {:?})",
                    name, material.name, shader.name
                ),
            }
        }
        backend.use_program(None);
    }

    /// Copies irradiance and prefiltered maps from their source materials and
    /// attaches the BRDF LUT.
    fn share_lighting_maps(&self, material: &mut Material, shader: &Shader) {
        for (sampler, source) in [
            (Sampler::Irradiance, material.info.irradiance_source),
            (Sampler::Prefiltered, material.info.prefilter_source),
        ] {
            if !shader.needs(sampler) {
                continue;
            }
            let Some(source) = source else {
                continue;
            };
            match self.materials.get(&source).and_then(|m| m.texture(sampler)) {
                Some(texture) => {
                    material.textures.insert(sampler, texture);
                }
                None => warn!(
                    "Material {:?}: source material {} has no {} to share",
                    material.name,
                    source,
                    sampler.uniform_name()
                ),
            }
        }

        if shader.needs(Sampler::BrdfLut) {
            match self.brdf_lut {
                Some(texture) => {
                    material.textures.insert(Sampler::BrdfLut, texture);
                }
                None => error!("BRDF LUT has not been generated before material {:?}", material.name),
            }
        }
    }

    fn load_file_textures<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        material: &mut Material,
        shader: &Shader,
    ) {
        let sources: Vec<_> = material
            .info
            .textures
            .iter()
            .filter(|(sampler, source)| sampler.is_file_backed() && source.generate && shader.needs(**sampler))
            .map(|(sampler, source)| (*sampler, source.path.clone()))
            .collect();

        for (sampler, path) in sources {
            if path.is_empty() {
                error!(
                    "Material {:?}: {} is generated but its path is empty",
                    material.name,
                    sampler.uniform_name()
                );
                continue;
            }
            if let Some(texture) = self.load_texture(backend, &path, sampler == Sampler::HdrEquirectangular) {
                material.textures.insert(sampler, texture);
            }
        }
    }

    /// Loads a texture file once; later requests for the same path share it.
    pub fn load_texture<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        path: &str,
        hdr: bool,
    ) -> Option<TextureHandle> {
        if let Some(texture) = self.texture_cache.get(path) {
            return Some(*texture);
        }

        let start = Instant::now();
        let request = TextureLoad {
            path: PathBuf::from(path),
            hdr,
            alpha: hdr,
            flip_vertically: hdr,
            generate_mipmaps: !hdr,
        };
        match backend.load_texture(&request) {
            Ok(texture) => {
                info!("Loaded texture {} in {:.2}ms", path, start.elapsed().as_secs_f64() * 1000.0);
                self.texture_cache.insert(path.to_string(), texture);
                Some(texture)
            }
            Err(err) => {
                error!("Failed to load texture {}: {}", path, err);
                None
            }
        }
    }

    fn create_cube<B: GraphicsBackend + ?Sized>(
        backend: &mut B,
        material: &mut Material,
        desc: TextureDesc,
    ) -> Option<TextureHandle> {
        match backend.create_texture(&desc) {
            Ok(texture) => {
                material.owned_textures.push(texture);
                Some(texture)
            }
            Err(err) => {
                error!("Material {:?}: failed to create {}: {}", material.name, desc.label, err);
                None
            }
        }
    }

    fn generate_cubemaps<B: GraphicsBackend + ?Sized>(backend: &mut B, material: &mut Material) {
        let info = material.info.clone();
        let size = info.generated_cubemap_size;

        if info.generate_reflection_probe_maps || info.generate_hdr_cubemap_sampler {
            let desc = TextureDesc::new_cube("cubemap", size, wgpu::TextureFormat::Rgba16Float)
                .with_trilinear(info.enable_cubemap_trilinear_filtering);
            if let Some(texture) = Self::create_cube(backend, material, desc) {
                material.textures.insert(Sampler::Cubemap, texture);
            }

            if info.generate_reflection_probe_maps {
                for (name, format) in GBUFFER_INPUTS.iter().zip(GBUFFER_CUBE_FORMATS) {
                    let desc = TextureDesc::new_cube(name, size, format);
                    if let Some(texture) = Self::create_cube(backend, material, desc) {
                        material.cubemap_gbuffer.push((name.to_string(), texture));
                    }
                }
            }
            if info.generate_cubemap_depth_buffers {
                let desc = TextureDesc::new_cube("cubemap depth", size, wgpu::TextureFormat::Depth24Plus);
                let depth = Self::create_cube(backend, material, desc);
                material.cubemap_depth = depth;
            }
        } else if info.generate_cubemap_sampler {
            let texture = match &info.cubemap_file_paths {
                Some(paths) => match backend.load_cubemap(paths, false) {
                    Ok(texture) => {
                        material.owned_textures.push(texture);
                        Some(texture)
                    }
                    Err(err) => {
                        error!("Material {:?}: failed to load cubemap: {}", material.name, err);
                        None
                    }
                },
                None => {
                    let desc = TextureDesc::new_cube("cubemap", size, wgpu::TextureFormat::Rgba8Unorm)
                        .with_trilinear(info.enable_cubemap_trilinear_filtering);
                    Self::create_cube(backend, material, desc)
                }
            };
            if let Some(texture) = texture {
                material.textures.insert(Sampler::Cubemap, texture);
            }
        }

        if info.generate_irradiance_sampler {
            let desc = TextureDesc::new_cube(
                "irradiance",
                info.generated_irradiance_size,
                wgpu::TextureFormat::Rgba16Float,
            );
            if let Some(texture) = Self::create_cube(backend, material, desc) {
                material.textures.insert(Sampler::Irradiance, texture);
            }
        }

        if info.generate_prefiltered_map {
            let desc = TextureDesc::new_cube(
                "prefiltered",
                info.generated_prefiltered_size,
                wgpu::TextureFormat::Rgba16Float,
            )
            .with_mips(PREFILTER_MIP_LEVELS)
            .with_trilinear(true);
            if let Some(texture) = Self::create_cube(backend, material, desc) {
                material.textures.insert(Sampler::Prefiltered, texture);
            }
        }
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(&id)
    }

    pub fn material_id(&self, name: &str) -> Option<MaterialId> {
        self.materials
            .iter()
            .find(|(_, m)| m.name == name)
            .map(|(id, _)| *id)
    }

    /// Live materials in ascending ID order.
    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> + '_ {
        self.materials.iter().map(|(id, m)| (*id, m))
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Shader and program a material draws with.
    pub fn material_program(&self, id: MaterialId) -> Option<(&Material, &Shader, Option<ProgramHandle>)> {
        let material = self.materials.get(&id)?;
        let shader = self.shaders.get(material.shader_id.slot())?;
        Some((material, shader, self.program(material.shader_id)))
    }

    pub fn remove_material<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B, id: MaterialId) -> bool {
        match self.materials.remove(&id) {
            Some(material) => {
                for texture in material.owned_textures {
                    backend.destroy_texture(texture);
                }
                true
            }
            None => false,
        }
    }

    /// Removes every material the host created; engine materials stay.
    pub fn clear_materials<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B) {
        let ids: Vec<MaterialId> = self
            .materials
            .iter()
            .filter(|(_, m)| !m.is_engine_material())
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            self.remove_material(backend, id);
        }
    }

    // ------------------------------------------------------------------
    // Render objects
    // ------------------------------------------------------------------

    fn next_render_id(&mut self) -> RenderId {
        match self.render_objects.iter().position(Option::is_none) {
            Some(slot) => RenderId::new(slot as u32),
            None => {
                self.render_objects.push(None);
                RenderId::new((self.render_objects.len() - 1) as u32)
            }
        }
    }

    /// Never fails: an invalid material falls back to the first one.
    pub fn create_render_object<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        info: RenderObjectCreateInfo,
    ) -> RenderId {
        let id = self.next_render_id();

        let material_id = match info.material_id.filter(|m| self.materials.contains_key(m)) {
            Some(material_id) => material_id,
            None => {
                let fallback = self.materials.keys().next().copied().unwrap_or(MaterialId::new(0));
                error!(
                    "Render object {:?} created with invalid material {:?}, using material {}",
                    info.name, info.material_id, fallback
                );
                fallback
            }
        };

        let mut object = RenderObject::new(id, material_id, info);

        if self.material_program(material_id).is_none() {
            error!(
                "No materials have been created, render object {:?} will not be uploaded",
                object.name
            );
            self.render_objects[id.slot()] = Some(object);
            return id;
        }

        if let Some((material, shader, _)) = self.material_program(material_id) {
            if material.name.is_empty() {
                warn!("Render object {:?} uses a material with an empty name", object.name);
            }
            object.material_name = material.name.clone();

            if let Some(data) = object.vertex_data.clone() {
                let missing = data.missing_for(shader.vertex_attributes);
                if !missing.is_empty() {
                    warn!(
                        "Render object {:?} is missing vertex attributes {:?} for shader {:?}",
                        object.name, missing, shader.name
                    );
                }
                match backend.upload_geometry(&data, object.indices.as_deref().map(Vec::as_slice)) {
                    Ok(geometry) => object.geometry = Some(geometry),
                    Err(err) => error!("Failed to upload geometry for {:?}: {}", object.name, err),
                }
            }
        }

        self.render_objects[id.slot()] = Some(object);
        id
    }

    /// Releases the object's geometry. An empty slot is left untouched.
    pub fn destroy_render_object<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B, id: RenderId) {
        if let Some(slot) = self.render_objects.get_mut(id.slot()) {
            if let Some(object) = slot.take() {
                if let Some(geometry) = object.geometry {
                    backend.destroy_geometry(geometry);
                }
            }
        }
    }

    pub fn clear_render_objects<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B) {
        for index in 0..self.render_objects.len() {
            self.destroy_render_object(backend, RenderId::new(index as u32));
        }
        self.render_objects.clear();
    }

    pub fn set_render_object_material_id(&mut self, id: RenderId, material_id: MaterialId) -> bool {
        let material_name = self.materials.get(&material_id).map(|m| m.name.clone());
        match self.render_object_mut(id) {
            Some(object) => {
                object.material_id = material_id;
                object.material_name = material_name.unwrap_or_default();
                true
            }
            None => {
                error!("set_render_object_material_id: render object {} doesn't exist", id);
                false
            }
        }
    }

    pub fn render_object(&self, id: RenderId) -> Option<&RenderObject> {
        self.render_objects.get(id.slot()).and_then(Option::as_ref)
    }

    pub fn render_object_mut(&mut self, id: RenderId) -> Option<&mut RenderObject> {
        self.render_objects.get_mut(id.slot()).and_then(Option::as_mut)
    }

    /// Live render objects in slot order.
    pub fn render_objects(&self) -> impl Iterator<Item = &RenderObject> + '_ {
        self.render_objects.iter().flatten()
    }

    pub fn render_object_count(&self) -> usize {
        self.render_objects.iter().filter(|o| o.is_some()).count()
    }

    pub fn render_object_capacity(&self) -> usize {
        self.render_objects.len()
    }

    /// Releases programs, material textures and cached file textures.
    pub fn destroy<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B) {
        self.clear_render_objects(backend);
        let ids: Vec<MaterialId> = self.materials.keys().copied().collect();
        for id in ids {
            self.remove_material(backend, id);
        }
        for (_, texture) in self.texture_cache.drain() {
            backend.destroy_texture(texture);
        }
        for program in self.programs.drain(..).flatten() {
            backend.destroy_program(program);
        }
        self.shaders.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::backend::RecordingBackend;
    use crate::renderer::material::MAX_TEXTURE_DIM;
    use crate::renderer::primitives;
    use crate::renderer::vertex::VertexBufferData;
    use std::sync::Arc;
    use winit::dpi::PhysicalSize;

    fn registry() -> (ResourceRegistry, RecordingBackend) {
        let mut backend = RecordingBackend::new();
        let mut registry = ResourceRegistry::new();
        assert_eq!(registry.load_shaders(&mut backend), 0);
        (registry, backend)
    }

    fn cube_info(material_id: Option<MaterialId>) -> RenderObjectCreateInfo {
        let (streams, indices) = primitives::sphere(6, 4, glam::Vec4::ONE);
        RenderObjectCreateInfo {
            name: "Sphere".into(),
            material_id,
            vertex_data: Some(Arc::new(VertexBufferData::from_streams(&streams))),
            indices: Some(Arc::new(indices)),
            ..Default::default()
        }
    }

    #[test]
    fn unknown_shader_is_reported() {
        let (mut registry, mut backend) = registry();
        let err = registry
            .create_material(&mut backend, MaterialCreateInfo::new("Bad", "pbr2"))
            .unwrap_err();
        assert!(matches!(err, RenderError::ShaderNotFound { name } if name == "pbr2"));
        assert_eq!(registry.material_count(), 0);
    }

    #[test]
    fn material_ids_reuse_lowest_free_slot() {
        let (mut registry, mut backend) = registry();
        let a = registry.create_material(&mut backend, MaterialCreateInfo::new("A", "color")).unwrap();
        let b = registry.create_material(&mut backend, MaterialCreateInfo::new("B", "color")).unwrap();
        let c = registry.create_material(&mut backend, MaterialCreateInfo::new("C", "color")).unwrap();
        assert_eq!((a.index(), b.index(), c.index()), (0, 1, 2));

        assert!(registry.remove_material(&mut backend, b));
        let d = registry.create_material(&mut backend, MaterialCreateInfo::new("D", "color")).unwrap();
        assert_eq!(d, b);
        assert_eq!(registry.material_id("D"), Some(d));
    }

    #[test]
    fn resolves_declared_uniforms() {
        let (mut registry, mut backend) = registry();
        let id = registry.create_material(&mut backend, MaterialCreateInfo::new("Red", "color")).unwrap();
        let material = registry.material(id).unwrap();
        assert!(material.location(crate::renderer::shader::Uniform::Model).is_some());
        assert!(material.location(crate::renderer::shader::Uniform::CamPos).is_none());
    }

    #[test]
    fn enabling_unneeded_sampler_is_turned_off() {
        let (mut registry, mut backend) = registry();
        let info = MaterialCreateInfo::new("Flat", "color").with_texture(Sampler::Albedo, "albedo.png");
        let id = registry.create_material(&mut backend, info).unwrap();
        let material = registry.material(id).unwrap();
        assert!(!material.enabled(Sampler::Albedo));
        assert!(material.texture(Sampler::Albedo).is_none());
    }

    #[test]
    fn oversized_cubemap_is_rejected() {
        let (mut registry, mut backend) = registry();
        let mut info = MaterialCreateInfo::reflection_probe("Probe");
        info.generated_cubemap_size = PhysicalSize::new(MAX_TEXTURE_DIM * 2, MAX_TEXTURE_DIM * 2);
        let err = registry.create_material(&mut backend, info).unwrap_err();
        assert!(matches!(err, RenderError::TextureTooLarge { .. }));
    }

    #[test]
    fn texture_files_are_cached() {
        let (mut registry, mut backend) = registry();
        let first = registry
            .create_material(&mut backend, MaterialCreateInfo::new("A", "pbr").with_texture(Sampler::Albedo, "wood.png"))
            .unwrap();
        let second = registry
            .create_material(&mut backend, MaterialCreateInfo::new("B", "pbr").with_texture(Sampler::Albedo, "wood.png"))
            .unwrap();
        let a = registry.material(first).unwrap().texture(Sampler::Albedo);
        let b = registry.material(second).unwrap().texture(Sampler::Albedo);
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn reflection_probe_allocates_capture_textures() {
        let (mut registry, mut backend) = registry();
        let id = registry
            .create_material(&mut backend, MaterialCreateInfo::reflection_probe("Probe"))
            .unwrap();
        let material = registry.material(id).unwrap();
        assert_eq!(material.cubemap_gbuffer.len(), 3);
        assert!(material.cubemap_depth.is_some());
        let prefiltered = material.texture(Sampler::Prefiltered).unwrap();
        assert_eq!(backend.texture(prefiltered).unwrap().mip_levels, PREFILTER_MIP_LEVELS);
        // No LUT yet
        assert!(material.texture(Sampler::BrdfLut).is_none());
    }

    #[test]
    fn invalid_material_falls_back() {
        let (mut registry, mut backend) = registry();
        let fallback = registry.create_material(&mut backend, MaterialCreateInfo::new("A", "color")).unwrap();
        let id = registry.create_render_object(&mut backend, cube_info(Some(MaterialId::new(77))));
        assert_eq!(registry.render_object(id).unwrap().material_id, fallback);
        assert!(registry.render_object(id).unwrap().geometry.is_some());
    }

    #[test]
    fn render_object_slots_are_reused() {
        let (mut registry, mut backend) = registry();
        let material = registry.create_material(&mut backend, MaterialCreateInfo::new("A", "color")).unwrap();
        let first = registry.create_render_object(&mut backend, cube_info(Some(material)));
        let second = registry.create_render_object(&mut backend, cube_info(Some(material)));
        assert_eq!(registry.render_object_capacity(), 2);

        registry.destroy_render_object(&mut backend, first);
        registry.destroy_render_object(&mut backend, first);
        assert_eq!(registry.render_object_count(), 1);
        assert_eq!(backend.live_geometry_count(), 1);

        let third = registry.create_render_object(&mut backend, cube_info(Some(material)));
        assert_eq!(third, first);
        assert_ne!(third, second);
        assert_eq!(registry.render_object_capacity(), 2);
    }

    #[test]
    fn clear_materials_keeps_engine_materials() {
        let (mut registry, mut backend) = registry();
        let engine = registry
            .create_material(&mut backend, MaterialCreateInfo::new("Sprite material", "sprite").engine())
            .unwrap();
        registry.create_material(&mut backend, MaterialCreateInfo::new("Scene", "pbr")).unwrap();
        registry.clear_materials(&mut backend);
        assert_eq!(registry.material_count(), 1);
        assert!(registry.material(engine).is_some());
    }

    #[test]
    fn reload_keeps_material_ids() {
        let (mut registry, mut backend) = registry();
        let id = registry.create_material(&mut backend, MaterialCreateInfo::new("A", "color")).unwrap();
        assert_eq!(registry.reload_shaders(&mut backend), 0);
        assert_eq!(backend.live_program_count(), registry.shader_count());
        assert!(registry.material(id).unwrap().location(crate::renderer::shader::Uniform::Model).is_some());
    }

    #[test]
    fn missing_render_object_material_change_fails() {
        let (mut registry, _) = registry();
        assert!(!registry.set_render_object_material_id(RenderId::new(3), MaterialId::new(0)));
    }
}
