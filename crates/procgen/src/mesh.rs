//! Primitive tessellation into flat vertex/index buffers.

use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use engine_core::{Entity, Material, Primitive, Scene};
use glam::{Mat4, Vec3};

/// Vertex with position, normal, UV coordinates, and color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Triangle list mesh.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Tessellate a primitive centered on its local origin.
    pub fn from_primitive(primitive: &Primitive) -> Self {
        match *primitive {
            Primitive::Cylinder {
                height,
                diameter_top,
                diameter_bottom,
                tessellation,
            } => cylinder(height, diameter_top * 0.5, diameter_bottom * 0.5, tessellation.max(3)),
            Primitive::Sphere { diameter, segments } => {
                let segments = segments.max(3);
                sphere(diameter * 0.5, segments, (segments / 2).max(2))
            }
            Primitive::Torus {
                diameter,
                thickness,
                tessellation,
            } => torus(diameter * 0.5, thickness * 0.5, tessellation.max(3)),
            Primitive::Cuboid { width, height, depth } => cuboid(Vec3::new(width, height, depth)),
        }
    }

    /// Flatten every mesh under `root` into world space.
    pub fn from_scene(scene: &Scene, root: Entity) -> Self {
        let mut mesh = Self::new();
        for leaf in scene.meshes(root) {
            let (Some(primitive), Some(material)) = (scene.primitive(leaf), scene.material(leaf)) else {
                continue;
            };
            mesh.append(&Self::from_primitive(&primitive), scene.world_matrix(leaf), vertex_color(&material));
        }
        mesh
    }

    /// Append `other` transformed by `matrix`, painting every new vertex with `color`.
    pub fn append(&mut self, other: &MeshData, matrix: Mat4, color: [f32; 4]) {
        let base = self.vertices.len() as u32;
        let normal_matrix = matrix.inverse().transpose();
        self.vertices.extend(other.vertices.iter().map(|v| Vertex {
            position: matrix.transform_point3(Vec3::from(v.position)).into(),
            normal: normal_matrix
                .transform_vector3(Vec3::from(v.normal))
                .normalize_or_zero()
                .into(),
            tex_coords: v.tex_coords,
            color,
        }));
        self.indices.extend(other.indices.iter().map(|i| base + i));
    }

    /// Axis-aligned bounds, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.vertices.iter().map(|v| Vec3::from(v.position));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }
}

/// Emissive materials paint with their emissive color, others with diffuse.
pub fn vertex_color(material: &Material) -> [f32; 4] {
    let rgb = if material.is_emissive() { material.emissive } else { material.diffuse };
    [rgb.r, rgb.g, rgb.b, material.alpha]
}

fn cylinder(height: f32, radius_top: f32, radius_bottom: f32, sides: u32) -> MeshData {
    let mut mesh = MeshData::new();
    let half = height * 0.5;
    let slope = radius_bottom - radius_top;

    // Side wall
    for ring in 0..=1u32 {
        let (y, radius) = if ring == 0 { (-half, radius_bottom) } else { (half, radius_top) };
        for side in 0..=sides {
            let theta = TAU * side as f32 / sides as f32;
            let (s, c) = theta.sin_cos();
            let normal = Vec3::new(c * height, slope, s * height).normalize_or_zero();
            mesh.vertices.push(Vertex::new(
                [radius * c, y, radius * s],
                normal.into(),
                [side as f32 / sides as f32, 1.0 - ring as f32],
            ));
        }
    }
    for side in 0..sides {
        let bottom = side;
        let top = side + sides + 1;
        mesh.indices.extend_from_slice(&[bottom, top, bottom + 1, bottom + 1, top, top + 1]);
    }

    // Caps
    for (y, radius, ny) in [(half, radius_top, 1.0f32), (-half, radius_bottom, -1.0)] {
        let center = mesh.vertices.len() as u32;
        mesh.vertices.push(Vertex::new([0.0, y, 0.0], [0.0, ny, 0.0], [0.5, 0.5]));
        for side in 0..=sides {
            let theta = TAU * side as f32 / sides as f32;
            let (s, c) = theta.sin_cos();
            mesh.vertices.push(Vertex::new(
                [radius * c, y, radius * s],
                [0.0, ny, 0.0],
                [0.5 + 0.5 * c, 0.5 + 0.5 * s],
            ));
        }
        for side in 0..sides {
            let a = center + 1 + side;
            if ny > 0.0 {
                mesh.indices.extend_from_slice(&[center, a + 1, a]);
            } else {
                mesh.indices.extend_from_slice(&[center, a, a + 1]);
            }
        }
    }
    mesh
}

fn sphere(radius: f32, segments: u32, rings: u32) -> MeshData {
    let mut mesh = MeshData::new();

    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        let y = radius * phi.cos();
        let ring_radius = radius * phi.sin();

        for segment in 0..=segments {
            let theta = TAU * segment as f32 / segments as f32;
            let x = ring_radius * theta.cos();
            let z = ring_radius * theta.sin();
            let normal = Vec3::new(x, y, z).normalize_or_zero();
            mesh.vertices.push(Vertex::new(
                [x, y, z],
                normal.into(),
                [segment as f32 / segments as f32, ring as f32 / rings as f32],
            ));
        }
    }

    for ring in 0..rings {
        for segment in 0..segments {
            let current = ring * (segments + 1) + segment;
            let next = current + segments + 1;
            mesh.indices.extend_from_slice(&[current, next, current + 1, current + 1, next, next + 1]);
        }
    }
    mesh
}

fn torus(radius: f32, tube: f32, tessellation: u32) -> MeshData {
    let mut mesh = MeshData::new();

    for i in 0..=tessellation {
        let u = TAU * i as f32 / tessellation as f32;
        let center = Vec3::new(u.cos() * radius, 0.0, u.sin() * radius);
        let outward = Vec3::new(u.cos(), 0.0, u.sin());
        for j in 0..=tessellation {
            let v = TAU * j as f32 / tessellation as f32;
            let normal = outward * v.cos() + Vec3::Y * v.sin();
            mesh.vertices.push(Vertex::new(
                (center + normal * tube).into(),
                normal.into(),
                [i as f32 / tessellation as f32, j as f32 / tessellation as f32],
            ));
        }
    }

    let stride = tessellation + 1;
    for i in 0..tessellation {
        for j in 0..tessellation {
            let a = i * stride + j;
            let b = a + stride;
            mesh.indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }
    mesh
}

fn cuboid(size: Vec3) -> MeshData {
    let h = size * 0.5;
    // (normal, tangent, bitangent) per face
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    ];
    let corners = [(-1.0, -1.0, [0.0, 1.0]), (1.0, -1.0, [1.0, 1.0]), (1.0, 1.0, [1.0, 0.0]), (-1.0, 1.0, [0.0, 0.0])];

    let mut mesh = MeshData::new();
    for (normal, tangent, bitangent) in faces {
        let base = mesh.vertices.len() as u32;
        for (a, b, uv) in corners {
            let p = (normal + tangent * a + bitangent * b) * h;
            mesh.vertices.push(Vertex::new(p.into(), normal.into(), uv));
        }
        mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{Color3, Transform};

    #[test]
    fn cylinder_spans_its_height_and_radius() {
        let mesh = MeshData::from_primitive(&Primitive::cone(2.0, 0.5, 1.0).with_tessellation(8));
        let (min, max) = mesh.bounds().unwrap();
        assert!((min.y + 1.0).abs() < 1e-5 && (max.y - 1.0).abs() < 1e-5);
        assert!((max.x - 0.5).abs() < 1e-5);
        // 2 wall rings + 2 caps, each ring has a seam duplicate
        assert_eq!(mesh.vertex_count(), 2 * 9 + 2 * 10);
        assert_eq!(mesh.triangle_count(), 8 * 2 + 8 * 2);
    }

    #[test]
    fn indices_stay_in_range_for_every_shape() {
        for primitive in [
            Primitive::cylinder(1.0, 0.3),
            Primitive::sphere(0.25),
            Primitive::torus(0.8, 0.15),
            Primitive::cuboid(0.15, 0.08, 0.25),
        ] {
            let mesh = MeshData::from_primitive(&primitive);
            assert!(mesh.triangle_count() > 0);
            assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
        }
    }

    #[test]
    fn cuboid_is_centered_with_full_extents() {
        let mesh = MeshData::from_primitive(&Primitive::cuboid(0.2, 0.4, 0.6));
        let (min, max) = mesh.bounds().unwrap();
        assert!((max - Vec3::new(0.1, 0.2, 0.3)).length() < 1e-6);
        assert!((min + Vec3::new(0.1, 0.2, 0.3)).length() < 1e-6);
        assert_eq!(mesh.vertex_count(), 24);
    }

    #[test]
    fn append_offsets_indices_and_transforms() {
        let cube = MeshData::from_primitive(&Primitive::cuboid(1.0, 1.0, 1.0));
        let mut merged = MeshData::new();
        merged.append(&cube, Mat4::IDENTITY, [1.0; 4]);
        merged.append(&cube, Mat4::from_translation(Vec3::Y * 10.0), [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(merged.vertex_count(), 48);
        assert_eq!(*merged.indices.last().unwrap(), 24 + 20);
        let (_, max) = merged.bounds().unwrap();
        assert!((max.y - 10.5).abs() < 1e-5);
        assert_eq!(merged.vertices[30].color, [0.5, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn scene_flattening_applies_world_transforms_and_colors() {
        let mut scene = Scene::new();
        let root = scene.create_node("root", Transform::from_y(10.0), None);
        let glow = Material::new("glow").with_emissive(Color3::new(0.0, 1.0, 0.0));
        scene.create_mesh("leaf", Primitive::cuboid(1.0, 1.0, 1.0), Transform::from_y(1.0), glow, Some(root));

        let mesh = MeshData::from_scene(&scene, root);
        let (min, max) = mesh.bounds().unwrap();
        assert!((min.y - 10.5).abs() < 1e-5 && (max.y - 11.5).abs() < 1e-5);
        assert!(mesh.vertices.iter().all(|v| v.color == [0.0, 1.0, 0.0, 1.0]));
    }
}
