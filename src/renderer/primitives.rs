use glam::{Vec2, Vec3, Vec4};
use std::f32::consts::PI;

use super::vertex::VertexStreams;

/// Full-screen quad in 2D clip space, drawn as a triangle list.
pub fn quad_2d() -> VertexStreams {
    VertexStreams {
        positions_2d: vec![
            Vec2::new(-1.0, -1.0),
            Vec2::new(-1.0, 1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(-1.0, 1.0),
            Vec2::new(1.0, 1.0),
        ],
        uvs: quad_uvs(),
        ..Default::default()
    }
}

/// Unit quad on the XY plane used for sprites and billboards.
pub fn quad_3d() -> VertexStreams {
    VertexStreams {
        positions_3d: vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ],
        uvs: quad_uvs(),
        ..Default::default()
    }
}

fn quad_uvs() -> Vec<Vec2> {
    vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
    ]
}

/// Four-vertex NDC quad, drawn as a triangle strip.
pub fn ndc_quad_strip() -> VertexStreams {
    VertexStreams {
        positions_3d: vec![
            Vec3::new(-1.0, 1.0, 0.0),
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
        ],
        uvs: vec![
            Vec2::new(0.0, 1.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
        ],
        ..Default::default()
    }
}

/// Inward-facing unit cube as 36 unindexed positions, for skyboxes and
/// cubemap rendering.
pub fn skybox_cube() -> VertexStreams {
    const FACES: [[usize; 6]; 6] = [
        [0, 1, 2, 2, 3, 0],
        [4, 5, 6, 6, 7, 4],
        [1, 5, 4, 4, 0, 1],
        [3, 2, 6, 6, 7, 3],
        [0, 3, 7, 7, 4, 0],
        [1, 5, 6, 6, 2, 1],
    ];
    let corners = [
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
    ];

    VertexStreams {
        positions_3d: FACES
            .iter()
            .flat_map(|face| face.iter().map(|&i| corners[i]))
            .collect(),
        ..Default::default()
    }
}

/// UV sphere with the full PBR attribute set, returned with its indices.
pub fn sphere(segments: u32, rings: u32, color: Vec4) -> (VertexStreams, Vec<u32>) {
    let mut streams = VertexStreams::default();
    let mut indices = Vec::new();

    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        let y = phi.cos();
        let ring_radius = phi.sin();

        for segment in 0..=segments {
            let theta = 2.0 * PI * segment as f32 / segments as f32;
            let position = Vec3::new(ring_radius * theta.cos(), y, ring_radius * theta.sin());
            // Tangent points in the direction of increasing theta
            let tangent = Vec3::new(-theta.sin(), 0.0, theta.cos());

            streams.positions_3d.push(position);
            streams.normals.push(position);
            streams.tangents.push(tangent);
            streams.bitangents.push(position.cross(tangent));
            streams.uvs.push(Vec2::new(
                segment as f32 / segments as f32,
                ring as f32 / rings as f32,
            ));
            streams.colors.push(color);
        }
    }

    for ring in 0..rings {
        for segment in 0..segments {
            let current = ring * (segments + 1) + segment;
            let next = current + segments + 1;

            indices.extend_from_slice(&[current, next, current + 1]);
            indices.extend_from_slice(&[current + 1, next, next + 1]);
        }
    }

    (streams, indices)
}
