//! Demo scene: a brick floor, a row of cubes, a row of fruit and a grid of
//! animated point lights.

use std::path::PathBuf;

use glam::{Mat4, Vec3, Vec4};
use lucent_engine::render::{Light, Material, MeshData, Scene, SceneObject, TextureData};

/// Point lights per grid side.
pub const LIGHT_GRID: usize = 24;

/// Spacing between the cubes (and between the fruit).
const GRID_SPACING: f32 = 1.5;
const ROW_LENGTH: usize = 5;

/// Animation time advanced per second of frame time (0.001 per frame at 60 Hz).
pub const ANIMATION_RATE: f32 = 0.06;

const POINT_COLOURS: [Vec3; 4] = [
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(1.0, 1.0, 0.0),
    Vec3::new(0.0, 1.0, 1.0),
    Vec3::new(1.0, 0.0, 1.0),
];
const POINT_ATTENUATION: Vec4 = Vec4::new(0.001, 0.1, 5.0, 2.0);

const BRICK: [u8; 4] = [168, 74, 52, 255];
const MORTAR: [u8; 4] = [190, 184, 170, 255];
const FRUIT_RED: [u8; 4] = [178, 28, 24, 255];
const FRUIT_HIGHLIGHT: [u8; 4] = [214, 70, 40, 255];

/// Where the fruit row comes from.
#[derive(Debug, Clone)]
pub struct SceneOptions {
    pub model: Option<PathBuf>,
    pub model_scale: f32,
    pub model_texture: Option<PathBuf>,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            model: None,
            model_scale: 1.0,
            model_texture: None,
        }
    }
}

/// Builds the demo scene.
///
/// A model or texture that fails to load is replaced by the built-in sphere
/// or red texture, with a warning.
pub fn build_scene(options: &SceneOptions) -> Scene {
    let mut scene = Scene::new();

    let brick = scene.add_texture("brick", TextureData::brick(256, BRICK, MORTAR));
    let cube = scene.add_mesh("cube", MeshData::cube(0.5));

    // Floor under the cubes, wide enough for the whole light grid.
    let floor_half = LIGHT_GRID as f32 * 0.5;
    let floor = scene.add_mesh("floor", MeshData::plane_xz(floor_half, floor_half));
    let floor_centre = Vec3::new(floor_half - 5.5, -0.5, floor_half - 5.5);
    scene.add_object(SceneObject {
        mesh: floor,
        texture: brick,
        transform: Mat4::from_translation(floor_centre),
        material: Material {
            specular_intensity: 0.2,
            specular_power: 16.0,
        },
    });

    let fruit_mesh = match &options.model {
        Some(path) => MeshData::from_obj(path, options.model_scale).unwrap_or_else(|err| {
            log::warn!("{err:#}; using the built-in sphere");
            fruit_sphere()
        }),
        None => fruit_sphere(),
    };
    let fruit = scene.add_mesh("fruit", fruit_mesh);

    let fruit_texture = match &options.model_texture {
        Some(path) => TextureData::load(path).unwrap_or_else(|err| {
            log::warn!("{err:#}; using the built-in fruit texture");
            fruit_checker()
        }),
        None => fruit_checker(),
    };
    let fruit_skin = scene.add_texture("fruit", fruit_texture);

    let glossy = Material {
        specular_intensity: 0.8,
        specular_power: 64.0,
    };
    let rows = [(cube, brick, Material::default()), (fruit, fruit_skin, glossy)];
    for (row, (mesh, texture, material)) in rows.into_iter().enumerate() {
        for j in 0..ROW_LENGTH {
            scene.add_object(SceneObject {
                mesh,
                texture,
                transform: Mat4::from_translation(Vec3::new(
                    j as f32 * GRID_SPACING,
                    row as f32 * GRID_SPACING,
                    0.0,
                )),
                material,
            });
        }
    }

    add_lights(&mut scene);
    log::info!(
        "scene ready: {} objects, {} lights",
        scene.objects.len(),
        scene.lights.len()
    );
    scene
}

fn fruit_sphere() -> MeshData {
    MeshData::uv_sphere(0.5, 24, 16)
}

fn fruit_checker() -> TextureData {
    TextureData::checker(64, 8, FRUIT_RED, FRUIT_HIGHLIGHT)
}

/// One warm directional light, then the point grid in row-major order.
fn add_lights(scene: &mut Scene) {
    scene.add_light(Light::directional(
        Vec3::splat(0.5773),
        Vec3::new(1.0, 0.7, 0.6) * 0.2,
    ));

    for i in 0..LIGHT_GRID {
        for j in 0..LIGHT_GRID {
            scene.add_light(Light::point(
                Vec3::new(i as f32 - 5.0, 0.5, j as f32 - 5.0),
                POINT_COLOURS[j % POINT_COLOURS.len()] * 0.9,
                POINT_ATTENUATION,
            ));
        }
    }
}

/// Moves every grid light to its position at animation time `t`.
pub fn animate_lights(lights: &mut [Light], t: f32) {
    for i in 0..LIGHT_GRID {
        for j in 0..LIGHT_GRID {
            let Some(light) = lights.get_mut(1 + i * LIGHT_GRID + j) else { return };
            let (fi, fj) = (i as f32, j as f32);
            light.position = Vec3::new(
                fi + (fi * t).sin() - 5.0,
                (fi * fj * t).cos() + 1.0,
                fj + (fj * t).cos() - 5.0,
            );
        }
    }
}
