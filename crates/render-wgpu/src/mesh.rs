use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use moonwake_assets::MeshData;
use moonwake_scene::Primitive;
use wgpu::util::DeviceExt;

/// Interleaved vertex layout shared by the mesh and water pipelines.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

pub const VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ],
};

/// Line vertex for the debug grid and axes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

pub const LINE_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<LineVertex>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x4,
    ],
};

/// A mesh uploaded to GPU buffers, plus the material tint it imported with.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub base_color: [f32; 4],
}

/// Upload imported mesh data.
pub fn upload_mesh(device: &wgpu::Device, mesh: &MeshData) -> GpuMesh {
    let vertices: Vec<Vertex> = (0..mesh.positions.len())
        .map(|i| Vertex {
            position: mesh.positions[i],
            normal: *mesh.normals.get(i).unwrap_or(&[0.0, 1.0, 0.0]),
            uv: *mesh.uvs.get(i).unwrap_or(&[0.0, 0.0]),
        })
        .collect();
    upload_vertices(device, &mesh.name, &vertices, &mesh.indices, mesh.base_color)
}

/// Upload raw vertex/index data.
pub fn upload_vertices(
    device: &wgpu::Device,
    label: &str,
    vertices: &[Vertex],
    indices: &[u32],
    base_color: [f32; 4],
) -> GpuMesh {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: indices.len() as u32,
        base_color,
    }
}

/// Generate vertices for a scene primitive.
pub fn primitive_mesh(primitive: Primitive) -> (Vec<Vertex>, Vec<u32>) {
    match primitive {
        Primitive::Sphere {
            radius,
            segments,
            rings,
        } => sphere(radius, segments.max(3), rings.max(2)),
        Primitive::Cylinder { radius, height } => cylinder(radius, height, 24),
    }
}

/// UV sphere centered at the origin.
fn sphere(radius: f32, segments: u32, rings: u32) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let phi = v * PI;
        for segment in 0..=segments {
            let u = segment as f32 / segments as f32;
            let theta = u * TAU;
            let normal = [
                phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            ];
            vertices.push(Vertex {
                position: [normal[0] * radius, normal[1] * radius, normal[2] * radius],
                normal,
                uv: [u, v],
            });
        }
    }

    let stride = segments + 1;
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * stride + segment;
            let b = a + stride;
            indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }

    (vertices, indices)
}

/// Capped cylinder along +Y, centered at the origin.
fn cylinder(radius: f32, height: f32, segments: u32) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let half = height / 2.0;

    // Side wall.
    for segment in 0..=segments {
        let u = segment as f32 / segments as f32;
        let theta = u * TAU;
        let (sin, cos) = theta.sin_cos();
        for (y, v) in [(-half, 1.0), (half, 0.0)] {
            vertices.push(Vertex {
                position: [cos * radius, y, sin * radius],
                normal: [cos, 0.0, sin],
                uv: [u, v],
            });
        }
    }
    for segment in 0..segments {
        let a = segment * 2;
        indices.extend_from_slice(&[a, a + 1, a + 2, a + 2, a + 1, a + 3]);
    }

    // Caps.
    for (y, ny) in [(half, 1.0_f32), (-half, -1.0)] {
        let center = vertices.len() as u32;
        vertices.push(Vertex {
            position: [0.0, y, 0.0],
            normal: [0.0, ny, 0.0],
            uv: [0.5, 0.5],
        });
        for segment in 0..=segments {
            let theta = segment as f32 / segments as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            vertices.push(Vertex {
                position: [cos * radius, y, sin * radius],
                normal: [0.0, ny, 0.0],
                uv: [0.5 + cos * 0.5, 0.5 + sin * 0.5],
            });
        }
        for segment in 0..segments {
            let a = center + 1 + segment;
            if ny > 0.0 {
                indices.extend_from_slice(&[center, a + 1, a]);
            } else {
                indices.extend_from_slice(&[center, a, a + 1]);
            }
        }
    }

    (vertices, indices)
}

/// Flat water plane of `size`×`size` at `height`, facing +Y.
pub fn water_plane(size: f32, height: f32) -> (Vec<Vertex>, Vec<u32>) {
    let half = size / 2.0;
    let vertices = vec![
        Vertex {
            position: [-half, height, -half],
            normal: [0.0, 1.0, 0.0],
            uv: [0.0, 0.0],
        },
        Vertex {
            position: [half, height, -half],
            normal: [0.0, 1.0, 0.0],
            uv: [1.0, 0.0],
        },
        Vertex {
            position: [half, height, half],
            normal: [0.0, 1.0, 0.0],
            uv: [1.0, 1.0],
        },
        Vertex {
            position: [-half, height, half],
            normal: [0.0, 1.0, 0.0],
            uv: [0.0, 1.0],
        },
    ];
    let indices = vec![0, 2, 1, 0, 3, 2];
    (vertices, indices)
}

/// Debug grid floor lines plus RGB world axes.
pub fn grid_and_axes(half_extent: i32, spacing: f32) -> Vec<LineVertex> {
    let mut verts = Vec::new();
    let color = [0.4, 0.4, 0.4, 1.0];
    let extent = half_extent as f32 * spacing;

    for i in -half_extent..=half_extent {
        let offset = i as f32 * spacing;
        verts.push(LineVertex {
            position: [-extent, 0.0, offset],
            color,
        });
        verts.push(LineVertex {
            position: [extent, 0.0, offset],
            color,
        });
        verts.push(LineVertex {
            position: [offset, 0.0, -extent],
            color,
        });
        verts.push(LineVertex {
            position: [offset, 0.0, extent],
            color,
        });
    }

    // Axes: X red, Y green, Z blue, length 5.
    let axes = [
        ([5.0, 0.0, 0.0], [1.0, 0.2, 0.2, 1.0]),
        ([0.0, 5.0, 0.0], [0.2, 1.0, 0.2, 1.0]),
        ([0.0, 0.0, 5.0], [0.2, 0.4, 1.0, 1.0]),
    ];
    for (end, color) in axes {
        verts.push(LineVertex {
            position: [0.0, 0.0, 0.0],
            color,
        });
        verts.push(LineVertex {
            position: end,
            color,
        });
    }

    verts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_counts_match_the_grid() {
        let (vertices, indices) = sphere(100.0, 64, 32);
        assert_eq!(vertices.len(), 65 * 33);
        assert_eq!(indices.len() as u32, 64 * 32 * 6);
        assert_eq!(indices.len() % 3, 0);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn sphere_normals_are_unit_and_radial() {
        let (vertices, _) = sphere(2.5, 16, 8);
        for v in &vertices {
            let n = glam::Vec3::from(v.normal);
            assert!((n.length() - 1.0).abs() < 1e-4);
            let p = glam::Vec3::from(v.position);
            assert!((p.length() - 2.5).abs() < 1e-3);
        }
    }

    #[test]
    fn cylinder_is_well_formed() {
        let (vertices, indices) = cylinder(0.25, 12.0, 24);
        assert_eq!(indices.len() % 3, 0);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
        let top = vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        let bottom = vertices.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        assert_eq!(top, 6.0);
        assert_eq!(bottom, -6.0);
    }

    #[test]
    fn water_plane_sits_at_its_height() {
        let (vertices, indices) = water_plane(2000.0, -10.0);
        assert_eq!(vertices.len(), 4);
        assert_eq!(indices.len(), 6);
        assert!(vertices.iter().all(|v| v.position[1] == -10.0));
        assert!(vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn grid_includes_axes() {
        let verts = grid_and_axes(12, 1.0);
        // 25 lines each way, 2 vertices per line, both directions, plus 3 axes.
        assert_eq!(verts.len(), 25 * 4 + 6);
    }
}
