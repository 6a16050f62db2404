//! Multi-part `.obj` models. Each sub-mesh is uploaded into the
//! [`MeshStore`] and paired with its material's diffuse texture.

use std::path::{Path, PathBuf};

use crate::components::{MeshHandle, TextureHandle};
use crate::error::{RenderError, Result};
use crate::renderer::mesh::{calculate_average_normals, upload_mesh, NORMAL_OFFSET, VERTEX_LEN};
use crate::renderer::texture::TextureStore;
use crate::renderer::MeshStore;

/// CPU-side geometry for one sub-mesh, interleaved like every other mesh.
pub struct PartData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

/// A parsed model before anything touches the GPU.
pub struct ModelData {
    pub parts: Vec<PartData>,
    /// Diffuse map file name per material, directories stripped.
    pub diffuse_maps: Vec<Option<PathBuf>>,
}

impl ModelData {
    pub fn from_obj(path: &Path) -> Result<Self> {
        let (models, materials) =
            tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS).map_err(|source| RenderError::Model {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_tobj(path, models, materials))
    }

    fn from_tobj(
        path: &Path,
        models: Vec<tobj::Model>,
        materials: std::result::Result<Vec<tobj::Material>, tobj::LoadError>,
    ) -> Self {
        let materials = materials.unwrap_or_else(|e| {
            log::warn!("{}: no materials ({e})", path.display());
            Vec::new()
        });

        let diffuse_maps = materials
            .iter()
            .map(|m| m.diffuse_texture.as_deref().and_then(file_name))
            .collect();
        let parts = models.iter().map(|m| part_from_mesh(&m.mesh)).collect();

        Self { parts, diffuse_maps }
    }

    /// One handle per part. A part gets the plain fallback when its material
    /// is missing, names no diffuse map, or the map fails to load.
    pub fn part_textures(&self, textures: &mut TextureStore, texture_dir: &Path) -> Vec<TextureHandle> {
        let per_material: Vec<TextureHandle> = self
            .diffuse_maps
            .iter()
            .map(|map| match map {
                Some(file) => textures.load(&texture_dir.join(file)),
                None => TextureStore::FALLBACK,
            })
            .collect();

        self.parts
            .iter()
            .map(|part| {
                part.material
                    .and_then(|i| per_material.get(i).copied())
                    .unwrap_or(TextureStore::FALLBACK)
            })
            .collect()
    }
}

/// Material files often carry absolute paths from the authoring machine, so
/// only the last path segment is kept.
fn file_name(raw: &str) -> Option<PathBuf> {
    let name = raw.trim().rsplit(|c: char| c == '/' || c == '\\').next()?;
    (!name.is_empty()).then(|| PathBuf::from(name))
}

fn part_from_mesh(mesh: &tobj::Mesh) -> PartData {
    let count = mesh.positions.len() / 3;
    let has_normals = mesh.normals.len() == mesh.positions.len();
    let has_uvs = mesh.texcoords.len() / 2 == count;

    let mut vertices = Vec::with_capacity(count * VERTEX_LEN);
    for i in 0..count {
        vertices.extend_from_slice(&mesh.positions[i * 3..i * 3 + 3]);
        if has_uvs {
            // Image rows are uploaded top first
            vertices.extend_from_slice(&[mesh.texcoords[i * 2], 1.0 - mesh.texcoords[i * 2 + 1]]);
        } else {
            vertices.extend_from_slice(&[0.0, 0.0]);
        }
        if has_normals {
            vertices.extend_from_slice(&mesh.normals[i * 3..i * 3 + 3]);
        } else {
            vertices.extend_from_slice(&[0.0; VERTEX_LEN - NORMAL_OFFSET]);
        }
    }

    if !has_normals {
        calculate_average_normals(&mesh.indices, &mut vertices);
    }

    PartData {
        vertices,
        indices: mesh.indices.clone(),
        material: mesh.material_id,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelPart {
    pub mesh: MeshHandle,
    pub texture: TextureHandle,
}

/// Drawable made of several meshes, each with its own diffuse texture.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    parts: Vec<ModelPart>,
}

impl Model {
    /// Parse `path`, upload every part and resolve its texture under
    /// `texture_dir`.
    pub fn load(path: &Path, meshes: &mut MeshStore, textures: &mut TextureStore, texture_dir: &Path) -> Result<Self> {
        let data = ModelData::from_obj(path)?;
        let part_textures = data.part_textures(textures, texture_dir);

        let parts: Vec<ModelPart> = data
            .parts
            .iter()
            .zip(part_textures)
            .map(|(part, texture)| ModelPart {
                mesh: meshes.add(upload_mesh(&part.vertices, &part.indices)),
                texture,
            })
            .collect();

        log::info!("loaded model {} ({} parts)", path.display(), parts.len());
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[ModelPart] {
        &self.parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const QUAD_OBJ: &str = "\
mtllib quad.mtl
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl stone
f 1/1 2/2 3/3
f 1/1 3/3 4/4
";

    const QUAD_MTL: &str = "\
newmtl stone
map_Kd C:\\art\\textures\\stone.png
";

    fn parse(materials_found: bool) -> ModelData {
        let (models, materials) = tobj::load_obj_buf(&mut QUAD_OBJ.as_bytes(), &tobj::GPU_LOAD_OPTIONS, |_| {
            if materials_found {
                tobj::load_mtl_buf(&mut QUAD_MTL.as_bytes())
            } else {
                Err(tobj::LoadError::OpenFileFailed)
            }
        })
        .unwrap();
        ModelData::from_tobj(Path::new("quad.obj"), models, materials)
    }

    #[test]
    fn test_obj_parts_are_interleaved_with_generated_normals() {
        let data = parse(true);
        assert_eq!(data.parts.len(), 1);

        let part = &data.parts[0];
        assert_eq!(part.vertices.len(), 4 * VERTEX_LEN);
        assert_eq!(part.indices.len(), 6);
        assert_eq!(part.material, Some(0));
        // first vertex: uv (0, 0) flipped to (0, 1), normal along +Z
        assert_eq!(&part.vertices[3..5], &[0.0, 1.0]);
        let normal = Vec3::from_slice(&part.vertices[NORMAL_OFFSET..VERTEX_LEN]);
        assert!(normal.abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn test_diffuse_map_keeps_only_the_file_name() {
        let data = parse(true);
        assert_eq!(data.diffuse_maps, vec![Some(PathBuf::from("stone.png"))]);
    }

    #[test]
    fn test_missing_material_texture_uses_fallback() {
        let data = parse(true);
        let mut textures = TextureStore::without_gpu();
        let handles = data.part_textures(&mut textures, Path::new("no-such-dir/textures"));
        assert_eq!(handles, vec![TextureStore::FALLBACK]);
    }

    #[test]
    fn test_missing_material_file_still_loads_geometry() {
        let data = parse(false);
        assert!(data.diffuse_maps.is_empty());
        assert_eq!(data.parts[0].indices.len(), 6);

        let mut textures = TextureStore::without_gpu();
        let handles = data.part_textures(&mut textures, Path::new("textures"));
        assert_eq!(handles, vec![TextureStore::FALLBACK]);
    }
}
