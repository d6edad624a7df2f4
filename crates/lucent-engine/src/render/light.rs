//! Lights and their volumes.
//!
//! Every light is drawn as one volume instance during the lighting pass:
//! a full-screen triangle for directional lights, a bounding sphere of the
//! attenuation radius for point lights.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3, Vec4};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LightKind {
    Directional,
    Point,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    /// World position. Ignored for directional lights.
    pub position: Vec3,
    /// Unit vector pointing towards the light. Ignored for point lights.
    pub direction: Vec3,
    /// Linear RGB, pre-scaled by intensity.
    pub colour: Vec3,
    /// `(constant, linear, quadratic, radius)`.
    pub attenuation: Vec4,
}

impl Light {
    pub fn directional(direction: Vec3, colour: Vec3) -> Self {
        Self {
            kind: LightKind::Directional,
            position: Vec3::ZERO,
            direction: direction.try_normalize().unwrap_or(Vec3::Y),
            colour,
            attenuation: Vec4::ZERO,
        }
    }

    pub fn point(position: Vec3, colour: Vec3, attenuation: Vec4) -> Self {
        Self {
            kind: LightKind::Point,
            position,
            direction: Vec3::ZERO,
            colour,
            attenuation,
        }
    }

    /// Radius beyond which a point light contributes nothing.
    #[inline]
    pub fn radius(&self) -> f32 {
        self.attenuation.w.max(0.0)
    }

    /// Screen footprint of this light.
    pub fn volume(&self) -> LightVolume {
        match self.kind {
            LightKind::Directional => LightVolume::FullScreen,
            LightKind::Point => LightVolume::Sphere {
                // Scale the unit sphere first, then move it to the light.
                model: Mat4::from_scale_rotation_translation(
                    Vec3::splat(self.radius()),
                    Quat::IDENTITY,
                    self.position,
                ),
            },
        }
    }

    fn instance(&self) -> LightInstance {
        let model = match self.volume() {
            LightVolume::FullScreen => Mat4::IDENTITY,
            LightVolume::Sphere { model } => model,
        };
        // w == 0 marks a direction-only light, w == 1 a positional one.
        let w = match self.kind {
            LightKind::Directional => 0.0,
            LightKind::Point => 1.0,
        };
        LightInstance {
            model: model.to_cols_array_2d(),
            position: self.position.extend(w).to_array(),
            direction: self.direction.extend(0.0).to_array(),
            colour: self.colour.extend(0.0).to_array(),
            attenuation: self.attenuation.to_array(),
        }
    }
}

/// Geometry rasterized to invoke the lighting shader for one light.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LightVolume {
    /// Covers every pixel.
    FullScreen,
    /// Unit light-volume sphere transformed by `model`.
    Sphere { model: Mat4 },
}

/// Per-light instance data (128 bytes), vertex locations 3..=10.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LightInstance {
    pub model: [[f32; 4]; 4],
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub colour: [f32; 4],
    pub attenuation: [f32; 4],
}

impl LightInstance {
    const ATTRS: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
        3 => Float32x4, // model col 0
        4 => Float32x4, // model col 1
        5 => Float32x4, // model col 2
        6 => Float32x4, // model col 3
        7 => Float32x4, // position
        8 => Float32x4, // direction
        9 => Float32x4, // colour
        10 => Float32x4 // attenuation
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LightInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// Lights packed for one lighting pass.
///
/// Directional instances come first, then point instances, each group in the
/// order the lights were given. One instance is one volume draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightBatch {
    pub instances: Vec<LightInstance>,
    pub directional: Range<u32>,
    pub point: Range<u32>,
}

impl LightBatch {
    /// Packs the first `max_lights` lights (clamped to `lights.len()`).
    pub fn build(lights: &[Light], max_lights: usize) -> Self {
        let active = &lights[..max_lights.min(lights.len())];

        let mut instances = Vec::with_capacity(active.len());
        instances.extend(
            active
                .iter()
                .filter(|l| l.kind == LightKind::Directional)
                .map(Light::instance),
        );
        let split = instances.len() as u32;
        instances.extend(
            active
                .iter()
                .filter(|l| l.kind == LightKind::Point)
                .map(Light::instance),
        );
        let end = instances.len() as u32;

        Self {
            instances,
            directional: 0..split,
            point: split..end,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_at(x: f32, radius: f32) -> Light {
        Light::point(Vec3::new(x, 0.5, 0.0), Vec3::ONE, Vec4::new(0.001, 0.1, 5.0, radius))
    }

    #[test]
    fn directional_covers_screen() {
        let l = Light::directional(Vec3::new(1.0, 1.0, 1.0), Vec3::ONE);
        assert_eq!(l.volume(), LightVolume::FullScreen);
        assert!((l.direction.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn point_volume_scales_then_translates() {
        let l = point_at(3.0, 2.0);
        let LightVolume::Sphere { model } = l.volume() else {
            panic!("point light must use a sphere volume");
        };
        // Unit sphere surface point lands `radius` away from the light.
        let p = model.transform_point3(Vec3::X);
        assert!((p - Vec3::new(5.0, 0.5, 0.0)).length() < 1e-5);
        assert!((model.transform_point3(Vec3::ZERO) - l.position).length() < 1e-5);
    }

    #[test]
    fn batch_orders_directional_first() {
        let lights = [
            point_at(0.0, 2.0),
            Light::directional(Vec3::Y, Vec3::ONE),
            point_at(1.0, 2.0),
        ];
        let batch = LightBatch::build(&lights, lights.len());
        assert_eq!(batch.directional, 0..1);
        assert_eq!(batch.point, 1..3);
        assert_eq!(batch.instances[0].position[3], 0.0);
        // Points keep their relative order.
        assert_eq!(batch.instances[1].position[0], 0.0);
        assert_eq!(batch.instances[2].position[0], 1.0);
    }

    #[test]
    fn batch_respects_max_lights() {
        let lights = [
            Light::directional(Vec3::Y, Vec3::ONE),
            point_at(0.0, 2.0),
            point_at(1.0, 2.0),
        ];
        let batch = LightBatch::build(&lights, 2);
        assert_eq!(batch.instances.len(), 2);
        assert_eq!(batch.point, 1..2);

        let none = LightBatch::build(&lights, 0);
        assert!(none.is_empty());
        assert_eq!(none.directional, 0..0);
        assert_eq!(none.point, 0..0);

        let clamped = LightBatch::build(&lights, 100);
        assert_eq!(clamped.instances.len(), 3);
    }

    #[test]
    fn instance_carries_attenuation() {
        let l = point_at(0.0, 2.0);
        let batch = LightBatch::build(&[l], 1);
        assert_eq!(batch.instances[0].attenuation, [0.001, 0.1, 5.0, 2.0]);
        assert_eq!(std::mem::size_of::<LightInstance>(), 128);
    }
}
