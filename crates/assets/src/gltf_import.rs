use std::path::Path;

use glam::{Mat4, Vec3};

use crate::store::{AssetError, MeshData};

/// Import all meshes from a glTF or GLB file.
///
/// Node transforms are flattened into the vertex data, so a model imports
/// as a flat list of world-space-in-model-frame meshes; the scene node's
/// own transform is applied at render time. Animation clips and skins are
/// ignored.
pub fn import_gltf(path: impl AsRef<Path>) -> Result<Vec<MeshData>, AssetError> {
    let (document, buffers, _images) =
        gltf::import(path.as_ref()).map_err(|e| AssetError::Gltf(e.to_string()))?;

    let mut meshes = Vec::new();
    for scene in document.scenes() {
        for node in scene.nodes() {
            collect_node(&node, Mat4::IDENTITY, &buffers, &mut meshes);
        }
    }

    if meshes.is_empty() {
        return Err(AssetError::Gltf(format!(
            "{}: no mesh primitives found",
            path.as_ref().display()
        )));
    }

    tracing::debug!(
        path = %path.as_ref().display(),
        meshes = meshes.len(),
        "glTF import complete"
    );
    Ok(meshes)
}

fn collect_node(
    node: &gltf::Node<'_>,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<MeshData>,
) {
    let transform = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let name = mesh.name().unwrap_or("unnamed").to_string();
        for (index, primitive) in mesh.primitives().enumerate() {
            match read_primitive(&primitive, transform, buffers) {
                Some(mut data) => {
                    data.name = format!("{name}_{index}");
                    out.push(data);
                }
                None => {
                    tracing::warn!(mesh = %name, index, "primitive without positions, skipped");
                }
            }
        }
    }

    for child in node.children() {
        collect_node(&child, transform, buffers, out);
    }
}

fn read_primitive(
    primitive: &gltf::Primitive<'_>,
    transform: Mat4,
    buffers: &[gltf::buffer::Data],
) -> Option<MeshData> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()?
        .map(|p| transform.transform_point3(Vec3::from(p)).to_array())
        .collect();

    // Rotate normals without translation; renormalize to absorb scale.
    let normals: Vec<[f32; 3]> = match reader.read_normals() {
        Some(iter) => iter
            .map(|n| {
                transform
                    .transform_vector3(Vec3::from(n))
                    .normalize_or_zero()
                    .to_array()
            })
            .collect(),
        None => vec![[0.0, 1.0, 0.0]; positions.len()],
    };

    let uvs: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
        Some(iter) => iter.into_f32().collect(),
        None => vec![[0.0, 0.0]; positions.len()],
    };

    let indices: Vec<u32> = match reader.read_indices() {
        Some(iter) => iter.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let base_color = primitive
        .material()
        .pbr_metallic_roughness()
        .base_color_factor();

    Some(MeshData {
        name: String::new(),
        positions,
        normals,
        uvs,
        indices,
        base_color,
    })
}
