//! Scene description consumed by the deferred renderer.
//!
//! The scene owns CPU-side assets; the renderer uploads them the first time
//! it sees them and keeps the GPU copies keyed by id.

use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use super::light::Light;
use super::mesh::MeshData;
use super::texture::TextureData;

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one [`Scene`] value, unique for the life of the process.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SceneId(u64);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct MeshId(pub(crate) usize);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(pub(crate) usize);

/// Specular response written into the G-buffer alpha channels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub specular_intensity: f32,
    pub specular_power: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            specular_intensity: 0.5,
            specular_power: 32.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SceneObject {
    pub mesh: MeshId,
    pub texture: TextureId,
    pub transform: Mat4,
    pub material: Material,
}

impl SceneObject {
    fn instance(&self) -> DrawInstance {
        DrawInstance {
            model: self.transform.to_cols_array_2d(),
            material: [
                self.material.specular_intensity,
                self.material.specular_power,
                0.0,
                0.0,
            ],
        }
    }
}

/// Per-object instance data (80 bytes), vertex locations 3..=7.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct DrawInstance {
    pub model: [[f32; 4]; 4],
    /// x: specular intensity, y: specular power.
    pub material: [f32; 4],
}

impl DrawInstance {
    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        3 => Float32x4, // model col 0
        4 => Float32x4, // model col 1
        5 => Float32x4, // model col 2
        6 => Float32x4, // model col 3
        7 => Float32x4  // material
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<DrawInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// Assets are append-only, so an id plus the asset counts tell a renderer
/// exactly what it has already uploaded.
#[derive(Debug)]
pub struct Scene {
    id: SceneId,
    pub(crate) meshes: Vec<(String, MeshData)>,
    pub(crate) textures: Vec<(String, TextureData)>,
    pub objects: Vec<SceneObject>,
    pub lights: Vec<Light>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            id: SceneId(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed)),
            meshes: Vec::new(),
            textures: Vec::new(),
            objects: Vec::new(),
            lights: Vec::new(),
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn add_mesh(&mut self, name: impl Into<String>, mesh: MeshData) -> MeshId {
        self.meshes.push((name.into(), mesh));
        MeshId(self.meshes.len() - 1)
    }

    pub fn add_texture(&mut self, name: impl Into<String>, texture: TextureData) -> TextureId {
        self.textures.push((name.into(), texture));
        TextureId(self.textures.len() - 1)
    }

    pub fn add_object(&mut self, object: SceneObject) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn add_light(&mut self, light: Light) -> usize {
        self.lights.push(light);
        self.lights.len() - 1
    }

    #[inline]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    #[inline]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Instance data for every object, in object order.
    pub fn draw_instances(&self) -> Vec<DrawInstance> {
        self.objects.iter().map(SceneObject::instance).collect()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn ids_are_sequential() {
        let mut scene = Scene::new();
        let a = scene.add_mesh("cube", MeshData::cube(0.5));
        let b = scene.add_mesh("plane", MeshData::plane_xz(1.0, 1.0));
        assert_eq!((a, b), (MeshId(0), MeshId(1)));

        let t = scene.add_texture("white", TextureData::solid([255; 4]));
        assert_eq!(t, TextureId(0));
        assert_eq!(scene.mesh_count(), 2);
        assert_eq!(scene.texture_count(), 1);
    }

    #[test]
    fn every_scene_gets_its_own_id() {
        let a = Scene::new();
        let b = Scene::default();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a.id());
    }

    #[test]
    fn draw_instances_follow_objects() {
        let mut scene = Scene::new();
        let mesh = scene.add_mesh("cube", MeshData::cube(0.5));
        let texture = scene.add_texture("white", TextureData::solid([255; 4]));
        for x in 0..3 {
            scene.add_object(SceneObject {
                mesh,
                texture,
                transform: Mat4::from_translation(Vec3::new(x as f32, 0.0, 0.0)),
                material: Material { specular_intensity: 1.0, specular_power: 8.0 },
            });
        }

        let instances = scene.draw_instances();
        assert_eq!(instances.len(), 3);
        assert_eq!(instances[2].model[3][0], 2.0);
        assert_eq!(instances[0].material, [1.0, 8.0, 0.0, 0.0]);
        assert_eq!(std::mem::size_of::<DrawInstance>(), 80);
    }
}
