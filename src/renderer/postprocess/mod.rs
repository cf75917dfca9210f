use glam::{Mat4, Vec3, Vec4};

use super::backend::{GraphicsBackend, UniformValue};
use super::material::Material;
use super::shader::Uniform;

/// Luma weights of the saturation matrix.
const LUMA_WEIGHTS: Vec3 = Vec3::new(0.3086, 0.6094, 0.0820);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostProcessSettings {
    pub brightness: Vec3,
    pub offset: Vec3,
    pub saturation: f32,
}

impl Default for PostProcessSettings {
    fn default() -> Self {
        Self {
            brightness: Vec3::ONE,
            offset: Vec3::ZERO,
            saturation: 1.0,
        }
    }
}

impl PostProcessSettings {
    pub fn saturation_matrix(&self) -> Mat4 {
        let s = self.saturation;
        let w = LUMA_WEIGHTS * (1.0 - s);
        Mat4::from_cols(
            Vec4::new(w.x + s, w.x, w.x, 0.0),
            Vec4::new(w.y, w.y + s, w.y, 0.0),
            Vec4::new(w.z, w.z, w.z + s, 0.0),
            Vec4::W,
        )
    }

    /// Color grading matrix applied by the post-process pass; identity when
    /// post-processing is off.
    pub fn contrast_brightness_saturation(&self, enabled: bool) -> Mat4 {
        if !enabled {
            return Mat4::IDENTITY;
        }
        self.saturation_matrix() * Mat4::from_scale(self.brightness) * Mat4::from_translation(self.offset)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FxaaParameters {
    pub luma_threshold_min: f32,
    pub luma_threshold_max: f32,
    pub mul_reduce: f32,
    pub min_reduce: f32,
    pub max_span: f32,
}

impl Default for FxaaParameters {
    fn default() -> Self {
        Self {
            luma_threshold_min: 0.0312,
            luma_threshold_max: 0.125,
            mul_reduce: 1.0 / 8.0,
            min_reduce: 1.0 / 128.0,
            max_span: 8.0,
        }
    }
}

impl FxaaParameters {
    pub fn upload<B: GraphicsBackend + ?Sized>(&self, backend: &mut B, material: &Material) {
        for (uniform, value) in [
            (Uniform::LumaThresholdMin, self.luma_threshold_min),
            (Uniform::LumaThresholdMax, self.luma_threshold_max),
            (Uniform::MulReduce, self.mul_reduce),
            (Uniform::MinReduce, self.min_reduce),
            (Uniform::MaxSpan, self.max_span),
        ] {
            if let Some(location) = material.location(uniform) {
                backend.set_uniform(location, UniformValue::Float(value));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_grading_is_identity() {
        let settings = PostProcessSettings {
            brightness: Vec3::splat(2.0),
            saturation: 0.0,
            ..Default::default()
        };
        assert_eq!(settings.contrast_brightness_saturation(false), Mat4::IDENTITY);
    }

    #[test]
    fn full_saturation_leaves_color_unchanged() {
        let settings = PostProcessSettings::default();
        let grading = settings.contrast_brightness_saturation(true);
        assert!(grading.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn zero_saturation_is_grayscale() {
        let settings = PostProcessSettings {
            saturation: 0.0,
            ..Default::default()
        };
        let gray = settings.saturation_matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!((gray.x - gray.y).abs() < 1e-6);
        assert!((gray.y - gray.z).abs() < 1e-6);
    }

    #[test]
    fn offset_is_scaled_by_brightness() {
        let settings = PostProcessSettings {
            brightness: Vec3::splat(2.0),
            offset: Vec3::new(0.1, 0.0, 0.0),
            ..Default::default()
        };
        let grading = settings.contrast_brightness_saturation(true);
        assert!(grading.w_axis.abs_diff_eq(Vec4::new(0.2, 0.0, 0.0, 1.0), 1e-6));
    }
}
