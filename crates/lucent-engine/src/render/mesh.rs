//! CPU mesh construction and GPU upload.
//!
//! Every builder emits triangles wound counter-clockwise when seen from
//! outside. The geometry pass culls back faces and the point-light pass culls
//! front faces, so winding is load-bearing.

use std::f32::consts::PI;
use std::path::Path;

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use wgpu::util::DeviceExt;

/// Vertex layout shared by scene meshes and light volumes (32 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x2  // uv
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    #[inline]
    fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }
}

/// Indexed triangle list in CPU memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Segment counts of the point-light volume.
    pub const LIGHT_VOLUME_SEGMENTS: u32 = 16;
    pub const LIGHT_VOLUME_RINGS: u32 = 12;

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned cube centred on the origin.
    pub fn cube(half_extent: f32) -> Self {
        // (normal, u, v) with u x v == normal.
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        ];

        let mut mesh = Self::default();
        for (n, u, v) in faces {
            mesh.push_quad(n * half_extent, u * half_extent, v * half_extent, n, 1.0);
        }
        mesh
    }

    /// Ground plane in XZ facing +Y. `uv_repeat` tiles the texture.
    pub fn plane_xz(half_extent: f32, uv_repeat: f32) -> Self {
        let mut mesh = Self::default();
        mesh.push_quad(
            Vec3::ZERO,
            Vec3::X * half_extent,
            Vec3::NEG_Z * half_extent,
            Vec3::Y,
            uv_repeat,
        );
        mesh
    }

    /// Latitude/longitude sphere with `segments` around Y and `rings` from
    /// pole to pole.
    pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);

        let mut mesh = Self::default();
        for r in 0..=rings {
            let theta = PI * r as f32 / rings as f32;
            let (st, ct) = theta.sin_cos();
            for s in 0..=segments {
                let phi = 2.0 * PI * s as f32 / segments as f32;
                let (sp, cp) = phi.sin_cos();
                let n = Vec3::new(st * cp, ct, st * sp);
                let uv = Vec2::new(s as f32 / segments as f32, r as f32 / rings as f32);
                mesh.vertices.push(MeshVertex::new(n * radius, n, uv));
            }
        }

        let stride = segments + 1;
        for r in 0..rings {
            for s in 0..segments {
                let a = r * stride + s;
                let b = (r + 1) * stride + s;
                let c = b + 1;
                let d = a + 1;
                // Pole rows collapse one triangle of each quad.
                if r != 0 {
                    mesh.indices.extend_from_slice(&[a, d, c]);
                }
                if r != rings - 1 {
                    mesh.indices.extend_from_slice(&[a, c, b]);
                }
            }
        }
        mesh
    }

    /// Unit sphere used as the point-light volume.
    ///
    /// Vertices are pushed out so every facet lies at distance >= 1 from the
    /// centre; the tessellated volume then never cuts into the light radius.
    pub fn light_volume() -> Self {
        let segs = Self::LIGHT_VOLUME_SEGMENTS;
        let rings = Self::LIGHT_VOLUME_RINGS;
        let inradius = (PI / segs as f32).cos() * (PI / (2 * rings) as f32).cos();
        Self::uv_sphere(1.0 / inradius, segs, rings)
    }

    /// Uniformly scales positions; normals are unchanged.
    pub fn scaled(mut self, factor: f32) -> Self {
        for v in &mut self.vertices {
            v.position = (Vec3::from(v.position) * factor).to_array();
        }
        self
    }

    /// Loads every model in an OBJ file into one mesh.
    ///
    /// Faces are triangulated; normals are generated from faces when the file
    /// has none; missing texture coordinates default to zero.
    pub fn from_obj(path: impl AsRef<Path>, scale: f32) -> Result<Self> {
        let path = path.as_ref();
        let options = tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        };
        let (models, _materials) = tobj::load_obj(path, &options)
            .with_context(|| format!("failed to load OBJ {}", path.display()))?;

        let mut mesh = Self::default();
        for model in &models {
            mesh.append_tobj(&model.mesh)
                .with_context(|| format!("invalid mesh '{}' in {}", model.name, path.display()))?;
        }
        anyhow::ensure!(!mesh.indices.is_empty(), "{} contains no triangles", path.display());

        log::debug!(
            "loaded {} ({} vertices, {} triangles)",
            path.display(),
            mesh.vertices.len(),
            mesh.triangle_count()
        );
        Ok(mesh.scaled(scale))
    }

    fn append_tobj(&mut self, src: &tobj::Mesh) -> Result<()> {
        let count = src.positions.len() / 3;
        let has_normals = src.normals.len() == src.positions.len();
        let has_uvs = src.texcoords.len() / 2 == count;
        let base = self.vertices.len() as u32;

        for i in 0..count {
            let p = Vec3::from_slice(&src.positions[i * 3..i * 3 + 3]);
            let n = if has_normals {
                Vec3::from_slice(&src.normals[i * 3..i * 3 + 3])
            } else {
                Vec3::ZERO
            };
            // OBJ v runs bottom-up; wgpu samples top-down.
            let uv = if has_uvs {
                Vec2::new(src.texcoords[i * 2], 1.0 - src.texcoords[i * 2 + 1])
            } else {
                Vec2::ZERO
            };
            self.vertices.push(MeshVertex::new(p, n, uv));
        }

        if let Some(bad) = src.indices.iter().find(|&&i| i as usize >= count) {
            anyhow::bail!("index {bad} out of range for {count} vertices");
        }
        let first_index = self.indices.len();
        self.indices.extend(src.indices.iter().map(|&i| base + i));

        if !has_normals {
            self.generate_normals(first_index);
        }
        Ok(())
    }

    /// Area-weighted smooth normals for the triangles starting at `first_index`.
    fn generate_normals(&mut self, first_index: usize) {
        let mut acc = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices[first_index..].chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let pa = Vec3::from(self.vertices[a].position);
            let pb = Vec3::from(self.vertices[b].position);
            let pc = Vec3::from(self.vertices[c].position);
            let n = (pb - pa).cross(pc - pa);
            acc[a] += n;
            acc[b] += n;
            acc[c] += n;
        }

        let touched: Vec<u32> = self.indices[first_index..].to_vec();
        for i in touched {
            let i = i as usize;
            self.vertices[i].normal = acc[i].try_normalize().unwrap_or(Vec3::Y).to_array();
        }
    }

    /// Pushes a quad centred at `centre` spanning `±u`, `±v`.
    fn push_quad(&mut self, centre: Vec3, u: Vec3, v: Vec3, normal: Vec3, uv_repeat: f32) {
        let base = self.vertices.len() as u32;
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        for (cu, cv) in corners {
            let p = centre + u * cu + v * cv;
            let uv = Vec2::new((cu + 1.0) * 0.5, (1.0 - cv) * 0.5) * uv_repeat;
            self.vertices.push(MeshVertex::new(p, normal, uv));
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Mesh uploaded to GPU buffers.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, data: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vbo")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} ibo")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }

    /// Binds vertex slot 0 and the index buffer.
    pub fn bind(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangles(mesh: &MeshData) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        mesh.indices.chunks_exact(3).map(|t| {
            [
                Vec3::from(mesh.vertices[t[0] as usize].position),
                Vec3::from(mesh.vertices[t[1] as usize].position),
                Vec3::from(mesh.vertices[t[2] as usize].position),
            ]
        })
    }

    fn face_normal([a, b, c]: [Vec3; 3]) -> Vec3 {
        (b - a).cross(c - a)
    }

    fn assert_outward(mesh: &MeshData) {
        for tri in triangles(mesh) {
            let n = face_normal(tri);
            assert!(n.length() > 1e-8, "degenerate triangle {tri:?}");
            let centroid = (tri[0] + tri[1] + tri[2]) / 3.0;
            assert!(n.dot(centroid) > 0.0, "inward-facing triangle {tri:?}");
        }
    }

    #[test]
    fn cube_is_closed_and_outward() {
        let cube = MeshData::cube(0.5);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert_outward(&cube);
        for v in &cube.vertices {
            assert!(Vec3::from(v.position).abs().max_element() <= 0.5 + 1e-6);
        }
    }

    #[test]
    fn cube_normals_match_winding() {
        let cube = MeshData::cube(1.0);
        for t in cube.indices.chunks_exact(3) {
            let tri = [
                Vec3::from(cube.vertices[t[0] as usize].position),
                Vec3::from(cube.vertices[t[1] as usize].position),
                Vec3::from(cube.vertices[t[2] as usize].position),
            ];
            let n = Vec3::from(cube.vertices[t[0] as usize].normal);
            assert!(face_normal(tri).normalize().dot(n) > 0.999);
        }
    }

    #[test]
    fn plane_faces_up() {
        let plane = MeshData::plane_xz(4.0, 2.0);
        for tri in triangles(&plane) {
            assert!(face_normal(tri).normalize().dot(Vec3::Y) > 0.999);
        }
        let max_uv = plane.vertices.iter().map(|v| v.uv[0].max(v.uv[1])).fold(0.0, f32::max);
        assert_eq!(max_uv, 2.0);
    }

    #[test]
    fn sphere_is_outward_without_degenerates() {
        let sphere = MeshData::uv_sphere(0.5, 12, 8);
        // Two triangles per quad, minus one per quad on each pole row.
        assert_eq!(sphere.triangle_count(), (12 * 8 * 2 - 2 * 12) as usize);
        assert_outward(&sphere);
    }

    #[test]
    fn light_volume_encloses_unit_sphere() {
        let volume = MeshData::light_volume();
        assert_outward(&volume);
        for tri in triangles(&volume) {
            let n = face_normal(tri).normalize();
            assert!(n.dot(tri[0]) >= 1.0 - 1e-4, "facet cuts into unit sphere");
        }
    }

    #[test]
    fn scaled_moves_positions_only() {
        let cube = MeshData::cube(1.0).scaled(3.0);
        let v = cube.vertices[0];
        assert_eq!(Vec3::from(v.position).abs().max_element(), 3.0);
        assert_eq!(Vec3::from(v.normal).length(), 1.0);
    }

    #[test]
    fn obj_without_normals_gets_generated_ones() {
        let dir = std::env::temp_dir().join(format!("lucent-mesh-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("quad.obj");
        std::fs::write(
            &path,
            "v 0 0 0\nv 1 0 0\nv 1 0 -1\nv 0 0 -1\nf 1 2 3 4\n",
        )
        .unwrap();

        let mesh = MeshData::from_obj(&path, 2.0).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        for v in &mesh.vertices {
            assert!(Vec3::from(v.normal).dot(Vec3::Y) > 0.999);
        }
        assert_eq!(mesh.vertices[1].position, [2.0, 0.0, 0.0]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_obj_is_an_error() {
        let err = MeshData::from_obj("/definitely/not/here.obj", 1.0).unwrap_err();
        assert!(format!("{err:#}").contains("failed to load OBJ"));
    }
}
