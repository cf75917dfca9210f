use bytemuck::{Pod, Zeroable};
use glam::Vec3;

pub const MAX_POINT_LIGHTS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
    pub brightness: f32,
    pub enabled: bool,
    /// World position of the editor icon.
    pub position: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.5, -1.0, -0.3).normalize(),
            color: Vec3::ONE,
            brightness: 1.0,
            enabled: true,
            position: Vec3::new(0.0, 8.0, 0.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub brightness: f32,
    pub enabled: bool,
}

impl PointLight {
    pub fn new(position: Vec3, color: Vec3, brightness: f32) -> Self {
        Self {
            position,
            color,
            brightness,
            enabled: true,
        }
    }
}

#[derive(Clone, Default, Debug)]
pub struct Lights {
    directional: Option<DirectionalLight>,
    point: Vec<PointLight>,
}

impl Lights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.directional = None;
        self.point.clear();
    }

    pub fn set_directional(&mut self, light: Option<DirectionalLight>) {
        self.directional = light;
    }

    /// Returns the slot of the new light, or `None` when every slot is taken.
    pub fn add_point(&mut self, light: PointLight) -> Option<usize> {
        if self.point.len() >= MAX_POINT_LIGHTS {
            log::warn!(
                "Ignoring point light at {:?}, only {} are supported",
                light.position,
                MAX_POINT_LIGHTS
            );
            return None;
        }
        self.point.push(light);
        Some(self.point.len() - 1)
    }

    pub fn point_mut(&mut self, index: usize) -> Option<&mut PointLight> {
        self.point.get_mut(index)
    }

    pub fn directional(&self) -> Option<&DirectionalLight> {
        self.directional.as_ref()
    }

    pub fn directional_mut(&mut self) -> Option<&mut DirectionalLight> {
        self.directional.as_mut()
    }

    pub fn point_lights(&self) -> &[PointLight] {
        &self.point
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DirectionalLightRaw {
    pub direction: [f32; 4],
    /// rgb = color * brightness, w = enabled
    pub color_enabled: [f32; 4],
}

impl DirectionalLightRaw {
    pub fn from_light(light: Option<&DirectionalLight>) -> Self {
        match light {
            Some(light) if light.enabled => {
                let color = light.color * light.brightness;
                Self {
                    direction: light.direction.extend(0.0).to_array(),
                    color_enabled: color.extend(1.0).to_array(),
                }
            }
            _ => Self::zeroed(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.color_enabled[3] != 0.0
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PointLightRaw {
    pub position: [f32; 4],
    /// rgb = color * brightness, w = enabled
    pub color_enabled: [f32; 4],
}

impl PointLightRaw {
    pub fn from_light(light: Option<&PointLight>) -> Self {
        match light {
            Some(light) if light.enabled => {
                let color = light.color * light.brightness;
                Self {
                    position: light.position.extend(1.0).to_array(),
                    color_enabled: color.extend(1.0).to_array(),
                }
            }
            _ => Self::zeroed(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.color_enabled[3] != 0.0
    }
}

/// Per-frame light block; every point light slot is always written.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightsUniform {
    pub directional: DirectionalLightRaw,
    pub points: [PointLightRaw; MAX_POINT_LIGHTS],
}

impl LightsUniform {
    pub fn from_lights(lights: &Lights) -> Self {
        let mut uniform = Self::zeroed();
        uniform.directional = DirectionalLightRaw::from_light(lights.directional());
        for (i, slot) in uniform.points.iter_mut().enumerate() {
            *slot = PointLightRaw::from_light(lights.point_lights().get(i));
        }
        uniform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_point_lights_are_disabled() {
        let mut lights = Lights::new();
        lights.add_point(PointLight::new(Vec3::X, Vec3::ONE, 2.0));
        let uniform = LightsUniform::from_lights(&lights);

        assert!(uniform.points[0].enabled());
        assert_eq!(uniform.points[0].color_enabled[..3], [2.0, 2.0, 2.0]);
        assert!(uniform.points[1..].iter().all(|p| !p.enabled()));
        assert!(!uniform.directional.enabled());
    }

    #[test]
    fn disabled_light_is_pushed_as_disabled() {
        let mut lights = Lights::new();
        let mut light = PointLight::new(Vec3::ZERO, Vec3::ONE, 1.0);
        light.enabled = false;
        lights.add_point(light);
        let uniform = LightsUniform::from_lights(&lights);
        assert!(!uniform.points[0].enabled());
    }

    #[test]
    fn point_lights_are_capped() {
        let mut lights = Lights::new();
        for i in 0..MAX_POINT_LIGHTS {
            assert_eq!(lights.add_point(PointLight::new(Vec3::ZERO, Vec3::ONE, 1.0)), Some(i));
        }
        assert_eq!(lights.add_point(PointLight::new(Vec3::ZERO, Vec3::ONE, 1.0)), None);
        assert_eq!(lights.point_lights().len(), MAX_POINT_LIGHTS);
    }

    #[test]
    fn directional_color_is_scaled_by_brightness() {
        let mut lights = Lights::new();
        lights.set_directional(Some(DirectionalLight {
            color: Vec3::new(1.0, 0.5, 0.25),
            brightness: 4.0,
            ..Default::default()
        }));
        let raw = LightsUniform::from_lights(&lights).directional;
        assert_eq!(raw.color_enabled, [4.0, 2.0, 1.0, 1.0]);
    }
}
