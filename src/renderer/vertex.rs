use glam::{Vec2, Vec3, Vec4};

use super::shader::VertexAttributes;

/// Per-attribute source streams; every non-empty stream becomes one attribute.
#[derive(Debug, Clone, Default)]
pub struct VertexStreams {
    pub positions_3d: Vec<Vec3>,
    pub positions_2d: Vec<Vec2>,
    pub uvs: Vec<Vec2>,
    pub colors: Vec<Vec4>,
    pub tangents: Vec<Vec3>,
    pub bitangents: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub extra_vec4s: Vec<Vec4>,
    pub extra_ints: Vec<i32>,
}

impl VertexStreams {
    pub fn attributes(&self) -> VertexAttributes {
        let mut attributes = VertexAttributes::empty();
        attributes.set(VertexAttributes::POSITION, !self.positions_3d.is_empty());
        attributes.set(VertexAttributes::POSITION_2D, !self.positions_2d.is_empty());
        attributes.set(VertexAttributes::UV, !self.uvs.is_empty());
        attributes.set(VertexAttributes::COLOR, !self.colors.is_empty());
        attributes.set(VertexAttributes::TANGENT, !self.tangents.is_empty());
        attributes.set(VertexAttributes::BITANGENT, !self.bitangents.is_empty());
        attributes.set(VertexAttributes::NORMAL, !self.normals.is_empty());
        attributes.set(VertexAttributes::EXTRA_VEC4, !self.extra_vec4s.is_empty());
        attributes.set(VertexAttributes::EXTRA_INT, !self.extra_ints.is_empty());
        attributes
    }

    fn vertex_count(&self) -> usize {
        [
            self.positions_3d.len(),
            self.positions_2d.len(),
            self.uvs.len(),
            self.colors.len(),
            self.tangents.len(),
            self.bitangents.len(),
            self.normals.len(),
            self.extra_vec4s.len(),
            self.extra_ints.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// One attribute inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeLayout {
    pub attribute: VertexAttributes,
    pub offset: usize,
    pub format: wgpu::VertexFormat,
}

/// Interleaved vertex data, immutable once built and shared between
/// render objects through `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBufferData {
    attributes: VertexAttributes,
    vertex_count: u32,
    stride: usize,
    bytes: Vec<u8>,
}

impl VertexBufferData {
    pub fn from_streams(streams: &VertexStreams) -> Self {
        let attributes = streams.attributes();
        let stride = attributes.stride();
        let vertex_count = streams.vertex_count();

        let mut bytes = Vec::with_capacity(stride * vertex_count);
        for i in 0..vertex_count {
            // Short streams are padded with zeroes
            if !streams.positions_3d.is_empty() {
                push_floats(&mut bytes, &streams.positions_3d.get(i).copied().unwrap_or_default().to_array());
            }
            if !streams.positions_2d.is_empty() {
                push_floats(&mut bytes, &streams.positions_2d.get(i).copied().unwrap_or_default().to_array());
            }
            if !streams.uvs.is_empty() {
                push_floats(&mut bytes, &streams.uvs.get(i).copied().unwrap_or_default().to_array());
            }
            if !streams.colors.is_empty() {
                push_floats(&mut bytes, &streams.colors.get(i).copied().unwrap_or_default().to_array());
            }
            if !streams.tangents.is_empty() {
                push_floats(&mut bytes, &streams.tangents.get(i).copied().unwrap_or_default().to_array());
            }
            if !streams.bitangents.is_empty() {
                push_floats(&mut bytes, &streams.bitangents.get(i).copied().unwrap_or_default().to_array());
            }
            if !streams.normals.is_empty() {
                push_floats(&mut bytes, &streams.normals.get(i).copied().unwrap_or_default().to_array());
            }
            if !streams.extra_vec4s.is_empty() {
                push_floats(&mut bytes, &streams.extra_vec4s.get(i).copied().unwrap_or_default().to_array());
            }
            if !streams.extra_ints.is_empty() {
                let value = streams.extra_ints.get(i).copied().unwrap_or_default();
                bytes.extend_from_slice(bytemuck::bytes_of(&value));
            }
        }

        Self {
            attributes,
            vertex_count: vertex_count as u32,
            stride,
            bytes,
        }
    }

    pub fn attributes(&self) -> VertexAttributes {
        self.attributes
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Offsets and formats of each attribute, in interleaving order.
    pub fn layout(&self) -> Vec<AttributeLayout> {
        let mut offset = 0;
        let mut layout = Vec::new();
        for (attribute, format) in [
            (VertexAttributes::POSITION, wgpu::VertexFormat::Float32x3),
            (VertexAttributes::POSITION_2D, wgpu::VertexFormat::Float32x2),
            (VertexAttributes::UV, wgpu::VertexFormat::Float32x2),
            (VertexAttributes::COLOR, wgpu::VertexFormat::Float32x4),
            (VertexAttributes::TANGENT, wgpu::VertexFormat::Float32x3),
            (VertexAttributes::BITANGENT, wgpu::VertexFormat::Float32x3),
            (VertexAttributes::NORMAL, wgpu::VertexFormat::Float32x3),
            (VertexAttributes::EXTRA_VEC4, wgpu::VertexFormat::Float32x4),
            (VertexAttributes::EXTRA_INT, wgpu::VertexFormat::Sint32),
        ] {
            if self.attributes.contains(attribute) {
                layout.push(AttributeLayout {
                    attribute,
                    offset,
                    format,
                });
                offset += format.size() as usize;
            }
        }
        layout
    }

    /// Attributes the shader expects that this buffer does not provide.
    pub fn missing_for(&self, expected: VertexAttributes) -> VertexAttributes {
        expected - self.attributes
    }
}

fn push_floats(bytes: &mut Vec<u8>, values: &[f32]) {
    bytes.extend_from_slice(bytemuck::cast_slice(values));
}
