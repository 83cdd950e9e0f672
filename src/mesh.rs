//! Mesh primitives and spatial transforms.
//!
//! Geometry is generated on the CPU as [`MeshData`] and uploaded once as a
//! [`Mesh`]. All primitives use counter-clockwise front faces.
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Quat, Vec3};

use crate::gpu::GpuContext;

/// Vertex with position, normal and texture coordinates (32 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex3d {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// CPU-side indexed triangle list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Unit cube centered at the origin, 4 vertices per face.
    pub fn cube() -> Self {
        #[rustfmt::skip]
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            // normal,           u axis,             v axis
            ([ 0.0,  0.0,  1.0], [ 1.0, 0.0,  0.0], [0.0, 1.0,  0.0]),
            ([ 0.0,  0.0, -1.0], [-1.0, 0.0,  0.0], [0.0, 1.0,  0.0]),
            ([ 0.0,  1.0,  0.0], [ 1.0, 0.0,  0.0], [0.0, 0.0, -1.0]),
            ([ 0.0, -1.0,  0.0], [ 1.0, 0.0,  0.0], [0.0, 0.0,  1.0]),
            ([ 1.0,  0.0,  0.0], [ 0.0, 0.0, -1.0], [0.0, 1.0,  0.0]),
            ([-1.0,  0.0,  0.0], [ 0.0, 0.0,  1.0], [0.0, 1.0,  0.0]),
        ];

        let mut data = MeshData::default();
        for (normal, u, v) in faces {
            let (n, u, v) = (Vec3::from(normal), Vec3::from(u), Vec3::from(v));
            let base = data.vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = (n + u * su + v * sv) * 0.5;
                let uv = [(su + 1.0) * 0.5, (sv + 1.0) * 0.5];
                data.vertices.push(Vertex3d::new(p.into(), normal, uv));
            }
            data.indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        data
    }

    /// UV sphere of radius 0.5.
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let (segments, rings) = (segments.max(3), rings.max(2));
        let mut data = MeshData::default();

        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32;
            let (y, ring_radius) = (phi.cos(), phi.sin());
            for seg in 0..=segments {
                let theta = TAU * seg as f32 / segments as f32;
                let n = [ring_radius * theta.cos(), y, ring_radius * theta.sin()];
                let uv = [seg as f32 / segments as f32, ring as f32 / rings as f32];
                data.vertices
                    .push(Vertex3d::new([n[0] * 0.5, n[1] * 0.5, n[2] * 0.5], n, uv));
            }
        }
        data.indices = grid_indices(segments, rings, true);
        data
    }

    /// Square plane on XZ facing +Y.
    pub fn plane(size: f32) -> Self {
        let half = size * 0.5;
        let up = [0.0, 1.0, 0.0];
        MeshData {
            vertices: vec![
                Vertex3d::new([-half, 0.0, -half], up, [0.0, 0.0]),
                Vertex3d::new([-half, 0.0, half], up, [0.0, 1.0]),
                Vertex3d::new([half, 0.0, half], up, [1.0, 1.0]),
                Vertex3d::new([half, 0.0, -half], up, [1.0, 0.0]),
            ],
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    /// Torus around the Y axis; `radius` to the tube center, `tube` the tube radius.
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let (radial, tubular) = (radial_segments.max(3), tubular_segments.max(3));
        let mut data = MeshData::default();

        for j in 0..=radial {
            let v = TAU * j as f32 / radial as f32;
            for i in 0..=tubular {
                let u = TAU * i as f32 / tubular as f32;
                let center = Vec3::new(radius * u.cos(), 0.0, radius * u.sin());
                let normal = Vec3::new(v.cos() * u.cos(), v.sin(), v.cos() * u.sin());
                let position = center + normal * tube;
                let uv = [i as f32 / tubular as f32, j as f32 / radial as f32];
                data.vertices
                    .push(Vertex3d::new(position.into(), normal.into(), uv));
            }
        }
        data.indices = grid_indices(tubular, radial, false);
        data
    }
}

/// Two triangles per cell of a `(columns + 1) x (rows + 1)` vertex grid.
fn grid_indices(columns: u32, rows: u32, flip: bool) -> Vec<u32> {
    let mut indices = Vec::with_capacity((columns * rows * 6) as usize);
    for row in 0..rows {
        for col in 0..columns {
            let a = row * (columns + 1) + col;
            let b = a + columns + 1;
            if flip {
                indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            } else {
                indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
    }
    indices
}

/// GPU-resident geometry.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl Mesh {
    pub fn new(gpu: &GpuContext, data: &MeshData) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(&data.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(&data.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }
}

/// Position, rotation and scale, applied scale → rotate → translate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every triangle's winding agrees with its vertex normals.
    fn assert_ccw_outward(data: &MeshData) {
        for tri in data.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| data.vertices[i as usize]);
            let (pa, pb, pc) = (
                Vec3::from(a.position),
                Vec3::from(b.position),
                Vec3::from(c.position),
            );
            let face = (pb - pa).cross(pc - pa);
            if face.length_squared() < 1e-12 {
                continue; // degenerate pole triangle
            }
            let n = Vec3::from(a.normal) + Vec3::from(b.normal) + Vec3::from(c.normal);
            assert!(face.dot(n) > 0.0, "triangle {tri:?} winds inward");
        }
    }

    fn assert_indices_in_range(data: &MeshData) {
        let n = data.vertices.len() as u32;
        assert!(data.indices.iter().all(|&i| i < n));
        assert_eq!(data.indices.len() % 3, 0);
    }

    #[test]
    fn cube_has_six_outward_faces() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert_indices_in_range(&cube);
        assert_ccw_outward(&cube);
        assert!(cube
            .vertices
            .iter()
            .all(|v| v.position.iter().all(|c| c.abs() == 0.5)));
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let sphere = MeshData::sphere(16, 8);
        assert_eq!(sphere.vertices.len(), 17 * 9);
        assert_indices_in_range(&sphere);
        assert_ccw_outward(&sphere);
        for v in &sphere.vertices {
            assert!((Vec3::from(v.position).length() - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn plane_faces_up() {
        let plane = MeshData::plane(4.0);
        assert_indices_in_range(&plane);
        assert_ccw_outward(&plane);
    }

    #[test]
    fn torus_surface_is_tube_distance_from_ring() {
        let (radius, tube) = (1.0, 0.4);
        let torus = MeshData::torus(radius, tube, 16, 32);
        assert_eq!(torus.vertices.len(), 17 * 33);
        assert_eq!(torus.triangle_count(), 16 * 32 * 2);
        assert_indices_in_range(&torus);
        assert_ccw_outward(&torus);
        for v in &torus.vertices {
            let p = Vec3::from(v.position);
            let ring = Vec3::new(p.x, 0.0, p.z).normalize() * radius;
            assert!(((p - ring).length() - tube).abs() < 1e-4);
        }
    }

    #[test]
    fn transform_applies_scale_then_translation() {
        let t = Transform::new()
            .position(Vec3::new(1.0, 0.0, 0.0))
            .uniform_scale(2.0);
        let p = t.matrix().transform_point3(Vec3::new(0.5, 0.0, 0.0));
        assert!(p.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
    }
}
