//! Groups scene objects into instanced geometry draws.

use std::ops::Range;

use crate::render::scene::{DrawInstance, Scene};

/// One instanced draw: `instances` all share a mesh and a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DrawBatch {
    pub mesh: usize,
    pub texture: usize,
    pub instances: Range<u32>,
}

#[derive(Debug, Default)]
pub(crate) struct DrawPlan {
    pub instances: Vec<DrawInstance>,
    pub batches: Vec<DrawBatch>,
    /// Objects referencing a mesh or texture the scene does not hold.
    pub skipped: usize,
}

/// Orders instances by (texture, mesh) and splits them into batches.
pub(crate) fn plan_draws(scene: &Scene) -> DrawPlan {
    let mut order: Vec<usize> = (0..scene.objects.len())
        .filter(|&i| {
            let o = &scene.objects[i];
            o.mesh.0 < scene.mesh_count() && o.texture.0 < scene.texture_count()
        })
        .collect();
    let skipped = scene.objects.len() - order.len();
    order.sort_by_key(|&i| (scene.objects[i].texture.0, scene.objects[i].mesh.0));

    let all = scene.draw_instances();
    let instances: Vec<DrawInstance> = order.iter().map(|&i| all[i]).collect();

    let mut batches: Vec<DrawBatch> = Vec::new();
    for (n, &i) in order.iter().enumerate() {
        let o = &scene.objects[i];
        let n = n as u32;
        match batches.last_mut() {
            Some(b) if b.mesh == o.mesh.0 && b.texture == o.texture.0 => b.instances.end = n + 1,
            _ => batches.push(DrawBatch {
                mesh: o.mesh.0,
                texture: o.texture.0,
                instances: n..n + 1,
            }),
        }
    }

    DrawPlan {
        instances,
        batches,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::*;
    use crate::render::mesh::MeshData;
    use crate::render::scene::{Material, MeshId, SceneObject, TextureId};
    use crate::render::texture::TextureData;

    fn object(mesh: MeshId, texture: TextureId, x: f32) -> SceneObject {
        SceneObject {
            mesh,
            texture,
            transform: Mat4::from_translation(Vec3::new(x, 0.0, 0.0)),
            material: Material::default(),
        }
    }

    #[test]
    fn objects_sharing_assets_become_one_batch() {
        let mut scene = Scene::new();
        let cube = scene.add_mesh("cube", MeshData::cube(0.5));
        let sphere = scene.add_mesh("sphere", MeshData::uv_sphere(0.5, 8, 6));
        let brick = scene.add_texture("brick", TextureData::solid([200, 80, 60, 255]));

        scene.add_object(object(cube, brick, 0.0));
        scene.add_object(object(sphere, brick, 1.0));
        scene.add_object(object(cube, brick, 2.0));

        let plan = plan_draws(&scene);
        assert_eq!(plan.instances.len(), 3);
        assert_eq!(
            plan.batches,
            vec![
                DrawBatch { mesh: 0, texture: 0, instances: 0..2 },
                DrawBatch { mesh: 1, texture: 0, instances: 2..3 },
            ]
        );
        // Cubes keep their relative order inside the batch.
        assert_eq!(plan.instances[0].model[3][0], 0.0);
        assert_eq!(plan.instances[1].model[3][0], 2.0);
    }

    #[test]
    fn dangling_ids_are_skipped() {
        let mut scene = Scene::new();
        let cube = scene.add_mesh("cube", MeshData::cube(0.5));
        let white = scene.add_texture("white", TextureData::solid([255; 4]));
        scene.add_object(object(cube, white, 0.0));
        scene.add_object(object(MeshId(7), white, 1.0));
        scene.add_object(object(cube, TextureId(3), 2.0));

        let plan = plan_draws(&scene);
        assert_eq!(plan.instances.len(), 1);
        assert_eq!(plan.batches.len(), 1);
        assert_eq!(plan.skipped, 2);
    }

    #[test]
    fn empty_scene_has_no_batches() {
        let plan = plan_draws(&Scene::new());
        assert!(plan.instances.is_empty());
        assert!(plan.batches.is_empty());
    }
}
