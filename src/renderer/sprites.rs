// renderer/sprites.rs
use glam::{Mat4, Quat, Vec3, Vec4};

use super::backend::{TargetHandle, TextureHandle};
use super::handle::{MaterialId, RenderId};

/// Where a screen-space sprite is pinned, in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnchorPoint {
    #[default]
    Center,
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    /// Stretch over the whole screen.
    Whole,
}

impl AnchorPoint {
    /// Offset moving a sprite of half-extent `extent` flush with the anchor.
    pub fn offset(self, extent: Vec3) -> Vec3 {
        let (x, y) = (extent.x, extent.y);
        match self {
            AnchorPoint::Center | AnchorPoint::Whole => Vec3::ZERO,
            AnchorPoint::TopLeft => Vec3::new(-1.0 + x, 1.0 - y, 0.0),
            AnchorPoint::Top => Vec3::new(0.0, 1.0 - y, 0.0),
            AnchorPoint::TopRight => Vec3::new(1.0 - x, 1.0 - y, 0.0),
            AnchorPoint::Right => Vec3::new(1.0 - x, 0.0, 0.0),
            AnchorPoint::BottomRight => Vec3::new(1.0 - x, -1.0 + y, 0.0),
            AnchorPoint::Bottom => Vec3::new(0.0, -1.0 + y, 0.0),
            AnchorPoint::BottomLeft => Vec3::new(-1.0 + x, -1.0 + y, 0.0),
            AnchorPoint::Left => Vec3::new(-1.0 + x, 0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteQuadDrawInfo {
    /// Quad to draw with; the 3D sprite quad when `None`.
    pub sprite_object: Option<RenderId>,
    /// Material to draw with; the sprite material when `None`.
    pub material_id: Option<MaterialId>,
    pub texture: Option<TextureHandle>,
    /// `None` draws to the display.
    pub target: Option<TargetHandle>,
    pub pos: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub color: Vec4,
    pub anchor: AnchorPoint,
    pub screen_space: bool,
    pub read_depth: bool,
    pub write_depth: bool,
}

impl Default for SpriteQuadDrawInfo {
    fn default() -> Self {
        Self {
            sprite_object: None,
            material_id: None,
            texture: None,
            target: None,
            pos: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            color: Vec4::ONE,
            anchor: AnchorPoint::Center,
            screen_space: true,
            read_depth: false,
            write_depth: false,
        }
    }
}

/// Model matrix of a sprite, with aspect correction for screen-space sprites.
pub fn sprite_model(info: &SpriteQuadDrawInfo, aspect: f32) -> Mat4 {
    let mut translation = info.pos;
    translation.x /= aspect;
    let mut scale = info.scale;
    let mut extent = scale.abs();
    extent.x /= aspect;

    if info.screen_space {
        if info.anchor == AnchorPoint::Whole {
            scale.x *= aspect;
        }
        translation += info.anchor.offset(extent);
    }
    translation.x *= aspect;

    Mat4::from_translation(translation) * Mat4::from_quat(info.rotation) * Mat4::from_scale(scale)
}

pub fn screen_space_projection(aspect: f32) -> Mat4 {
    Mat4::orthographic_rh(-aspect, aspect, -1.0, 1.0, -1.0, 1.0)
}

/// Rotation turning a world-space quad to face the camera.
pub fn billboard_rotation(cam_pos: Vec3, pos: Vec3, cam_up: Vec3) -> Quat {
    let look = Mat4::look_at_rh(cam_pos, pos, cam_up);
    Quat::from_mat4(&look).normalize().conjugate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn corner(model: Mat4, x: f32, y: f32) -> Vec3 {
        model.transform_point3(Vec3::new(x, y, 0.0))
    }

    #[rstest]
    #[case(AnchorPoint::TopLeft, -1.0, 1.0)]
    #[case(AnchorPoint::TopRight, 1.0, 1.0)]
    #[case(AnchorPoint::BottomLeft, -1.0, -1.0)]
    #[case(AnchorPoint::BottomRight, 1.0, -1.0)]
    fn corner_anchors_touch_screen_edges(#[case] anchor: AnchorPoint, #[case] x: f32, #[case] y: f32) {
        let aspect = 16.0 / 9.0;
        let info = SpriteQuadDrawInfo {
            anchor,
            scale: Vec3::splat(0.25),
            ..Default::default()
        };
        let model = sprite_model(&info, aspect);
        let outer = corner(model, x, y);
        assert!((outer.x - x * aspect).abs() < 1e-5, "{anchor:?}: {outer:?}");
        assert!((outer.y - y).abs() < 1e-5, "{anchor:?}: {outer:?}");
    }

    #[test]
    fn whole_anchor_covers_the_screen() {
        let aspect = 2.0;
        let info = SpriteQuadDrawInfo {
            anchor: AnchorPoint::Whole,
            ..Default::default()
        };
        let model = sprite_model(&info, aspect);
        assert!(corner(model, 1.0, 1.0).abs_diff_eq(Vec3::new(2.0, 1.0, 0.0), 1e-5));
    }

    #[test]
    fn world_space_sprites_ignore_anchor() {
        let info = SpriteQuadDrawInfo {
            pos: Vec3::new(3.0, 1.0, -2.0),
            anchor: AnchorPoint::TopLeft,
            screen_space: false,
            ..Default::default()
        };
        let model = sprite_model(&info, 1.5);
        assert!(model.w_axis.truncate().abs_diff_eq(info.pos, 1e-5));
    }

    #[test]
    fn billboard_faces_camera() {
        let cam = Vec3::new(0.0, 0.0, 5.0);
        let rotation = billboard_rotation(cam, Vec3::ZERO, Vec3::Y);
        // Quad normal (+Z) points back at the camera
        let normal = rotation * Vec3::Z;
        assert!(normal.abs_diff_eq(Vec3::Z, 1e-5));
    }
}
