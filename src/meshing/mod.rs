//! Conversion of a decoded [`VoxelGrid`] into indexed triangle meshes grouped
//! by material.
//!
//! For every solid cell, each of the six axis-aligned faces whose neighbor
//! cell is empty (or outside the grid) becomes one quad with an outward unit
//! normal; everything else is culled. Quads are routed into material groups
//! keyed by palette **color**, so palette entries that share an RGB value
//! merge into a single group. Within a group, vertex positions and normals
//! are deduplicated by exact value equality, preserving first-seen insertion
//! order, and referenced through a stream of `(position, normal)` index
//! pairs: two triangles per quad, split `[0,1,2]` / `[2,3,0]`.
//!
//! The target scene convention is Y-up: grid coordinates have their second
//! and third axes swapped on the way out, and by default the first axis is
//! negated as well ([`MeshConfig::negate_x`]; the corner order of every quad
//! is reversed under negation so winding stays outward). Anchor points are
//! not meshed; they pass through the identical mapping as transform-only
//! nodes.
//!
//! The walk over cells is ascending x, then y, then z, and deduplication is
//! insertion-ordered, so meshing the same grid twice yields identical
//! vertex, normal, and index streams.

use std::collections::BTreeSet;

use log::{debug, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::grid::VoxelGrid;
use crate::palette::{Palette, Rgb};

/// Settings for grid-to-mesh conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Uniform scale applied to every emitted coordinate.
    pub scale: f32,
    /// Scene-space translation added after scaling.
    pub origin: [f32; 3],
    /// Negate the first scene axis (the later file-format revisions expect
    /// this; disable for models authored under the earlier convention).
    pub negate_x: bool,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            origin: [0.0, 0.0, 0.0],
            negate_x: true,
        }
    }
}

impl MeshConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_origin(mut self, origin: [f32; 3]) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_negate_x(mut self, enabled: bool) -> Self {
        self.negate_x = enabled;
        self
    }
}

/// One material group: deduplicated geometry sharing a display color.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialMesh {
    pub color: Rgb,
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// `(position index, normal index)` pairs, three per triangle.
    pub indices: Vec<(u32, u32)>,
}

impl MaterialMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn normal_count(&self) -> usize {
        self.normals.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn quad_count(&self) -> usize {
        self.indices.len() / 6
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Vertex positions as a flat float array (3 per vertex).
    pub fn positions_flat(&self) -> Vec<f32> {
        self.positions.iter().flatten().copied().collect()
    }

    /// Normals as a flat float array (3 per normal).
    pub fn normals_flat(&self) -> Vec<f32> {
        self.normals.iter().flatten().copied().collect()
    }
}

/// A named transform-only node produced from an anchor point.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorNode {
    pub name: String,
    pub translation: [f32; 3],
}

/// The full conversion result handed to a scene serializer.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMesh {
    /// Material groups in first-encounter order.
    pub materials: Vec<MaterialMesh>,
    pub anchors: Vec<AnchorNode>,
    /// Palette indices referenced by at least one solid cell.
    pub used_palette_entries: BTreeSet<u8>,
}

impl ModelMesh {
    pub fn total_vertices(&self) -> usize {
        self.materials.iter().map(|m| m.vertex_count()).sum()
    }

    pub fn total_triangles(&self) -> usize {
        self.materials.iter().map(|m| m.triangle_count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.iter().all(|m| m.is_empty())
    }

    pub fn material_by_color(&self, color: Rgb) -> Option<&MaterialMesh> {
        self.materials.iter().find(|m| m.color == color)
    }
}

/// One cube face: the grid-space neighbor that occludes it, the scene-space
/// outward normal (pre-negation), and which of the low/high cell planes each
/// corner sits on, per scene axis. Corner order gives outward winding.
struct Face {
    neighbor: (i32, i32, i32),
    normal: [f32; 3],
    corners: [(usize, usize, usize); 4],
}

const FACES: [Face; 6] = [
    // Grid +Z neighbor; scene +Y face.
    Face {
        neighbor: (0, 0, 1),
        normal: [0.0, 1.0, 0.0],
        corners: [(0, 1, 0), (0, 1, 1), (1, 1, 1), (1, 1, 0)],
    },
    // Grid -Z neighbor; scene -Y face.
    Face {
        neighbor: (0, 0, -1),
        normal: [0.0, -1.0, 0.0],
        corners: [(0, 0, 0), (1, 0, 0), (1, 0, 1), (0, 0, 1)],
    },
    // Grid +Y neighbor; scene +Z face.
    Face {
        neighbor: (0, 1, 0),
        normal: [0.0, 0.0, 1.0],
        corners: [(0, 0, 1), (1, 0, 1), (1, 1, 1), (0, 1, 1)],
    },
    // Grid -Y neighbor; scene -Z face.
    Face {
        neighbor: (0, -1, 0),
        normal: [0.0, 0.0, -1.0],
        corners: [(0, 0, 0), (0, 1, 0), (1, 1, 0), (1, 0, 0)],
    },
    // Grid +X neighbor; scene +X face.
    Face {
        neighbor: (1, 0, 0),
        normal: [1.0, 0.0, 0.0],
        corners: [(1, 0, 0), (1, 1, 0), (1, 1, 1), (1, 0, 1)],
    },
    // Grid -X neighbor; scene -X face.
    Face {
        neighbor: (-1, 0, 0),
        normal: [-1.0, 0.0, 0.0],
        corners: [(0, 0, 0), (0, 0, 1), (0, 1, 1), (0, 1, 0)],
    },
];

/// Dedup key for a float triple. `-0.0` collapses to `0.0` so bitwise keys
/// agree with value equality.
fn dedup_key(v: [f32; 3]) -> [u32; 3] {
    v.map(|c| (if c == 0.0 { 0.0f32 } else { c }).to_bits())
}

struct GroupBuilder {
    color: Rgb,
    name: String,
    palette_indices: BTreeSet<u8>,
    positions: Vec<[f32; 3]>,
    position_ids: FxHashMap<[u32; 3], u32>,
    normals: Vec<[f32; 3]>,
    normal_ids: FxHashMap<[u32; 3], u32>,
    indices: Vec<(u32, u32)>,
}

impl GroupBuilder {
    fn new(color: Rgb, name: String, palette_index: u8) -> Self {
        let mut palette_indices = BTreeSet::new();
        palette_indices.insert(palette_index);
        Self {
            color,
            name,
            palette_indices,
            positions: Vec::new(),
            position_ids: FxHashMap::default(),
            normals: Vec::new(),
            normal_ids: FxHashMap::default(),
            indices: Vec::new(),
        }
    }

    fn intern_position(&mut self, position: [f32; 3]) -> u32 {
        match self.position_ids.entry(dedup_key(position)) {
            std::collections::hash_map::Entry::Occupied(e) => *e.get(),
            std::collections::hash_map::Entry::Vacant(e) => {
                let id = self.positions.len() as u32;
                self.positions.push(position);
                *e.insert(id)
            }
        }
    }

    fn intern_normal(&mut self, normal: [f32; 3]) -> u32 {
        match self.normal_ids.entry(dedup_key(normal)) {
            std::collections::hash_map::Entry::Occupied(e) => *e.get(),
            std::collections::hash_map::Entry::Vacant(e) => {
                let id = self.normals.len() as u32;
                self.normals.push(normal);
                *e.insert(id)
            }
        }
    }

    fn add_quad(&mut self, normal: [f32; 3], corners: [[f32; 3]; 4]) {
        let n = self.intern_normal(normal);
        let v = corners.map(|c| self.intern_position(c));
        self.indices.extend([
            (v[0], n),
            (v[1], n),
            (v[2], n),
            (v[2], n),
            (v[3], n),
            (v[0], n),
        ]);
    }

    fn finish(self) -> MaterialMesh {
        MaterialMesh {
            color: self.color,
            name: self.name,
            positions: self.positions,
            normals: self.normals,
            indices: self.indices,
        }
    }
}

fn material_name(grid: &VoxelGrid, global_palette: Option<&Palette>, index: u8) -> String {
    grid.palette
        .name(index as usize)
        .or_else(|| global_palette.and_then(|p| p.name(index as usize)))
        .map(str::to_string)
        .unwrap_or_else(|| format!("material{}", index))
}

/// Convert a grid into material-grouped indexed triangle meshes.
///
/// `global_palette` supplies display names when the grid's embedded palette
/// carries none (the usual case; embedded palettes are name-free).
pub fn mesh_grid(
    grid: &VoxelGrid,
    global_palette: Option<&Palette>,
    config: &MeshConfig,
) -> Result<ModelMesh> {
    let mut groups: Vec<GroupBuilder> = Vec::new();
    let mut group_by_color: FxHashMap<Rgb, usize> = FxHashMap::default();
    let mut used = BTreeSet::new();

    // Grid offsets permuted into scene axis order once up front.
    let (ox, oy, oz) = grid.offset;
    let scene_offset = [ox as f32, oz as f32, oy as f32];

    for ((x, y, z), cell) in grid.iter_solid() {
        let color = grid.palette.color(cell as usize)?;
        used.insert(cell);

        let group_index = match group_by_color.get(&color) {
            Some(&gi) => {
                let group = &mut groups[gi];
                if group.palette_indices.insert(cell) {
                    warn!(
                        "palette indices {:?} share color ({}, {}, {}); merging into one material group",
                        group.palette_indices, color.r, color.g, color.b
                    );
                }
                gi
            }
            None => {
                let name = material_name(grid, global_palette, cell);
                groups.push(GroupBuilder::new(color, name, cell));
                group_by_color.insert(color, groups.len() - 1);
                groups.len() - 1
            }
        };

        // Low/high cell planes per scene axis, scale and origin still pending.
        let planes = [
            [x as f32 + scene_offset[0], x as f32 + scene_offset[0] + 1.0],
            [z as f32 + scene_offset[1], z as f32 + scene_offset[1] + 1.0],
            [y as f32 + scene_offset[2], y as f32 + scene_offset[2] + 1.0],
        ];

        let (x, y, z) = (x as i32, y as i32, z as i32);
        for face in &FACES {
            let (dx, dy, dz) = face.neighbor;
            if grid.is_solid(x + dx, y + dy, z + dz) {
                continue;
            }

            let mut normal = face.normal;
            let mut corners = face
                .corners
                .map(|(cx, cy, cz)| [planes[0][cx], planes[1][cy], planes[2][cz]]);
            if config.negate_x {
                for corner in &mut corners {
                    corner[0] = -corner[0];
                }
                if normal[0] != 0.0 {
                    normal[0] = -normal[0];
                }
                // Mirroring reverses orientation; reversing the corner order
                // restores outward winding.
                corners.reverse();
            }
            let corners = corners.map(|c| {
                [
                    c[0] * config.scale + config.origin[0],
                    c[1] * config.scale + config.origin[1],
                    c[2] * config.scale + config.origin[2],
                ]
            });
            groups[group_index].add_quad(normal, corners);
        }
    }

    let anchors = grid
        .anchors
        .iter()
        .map(|anchor| {
            let mut sx = (anchor.x + ox) as f32;
            if config.negate_x {
                sx = -sx;
            }
            let sy = (anchor.z + oz) as f32;
            let sz = (anchor.y + oy) as f32;
            AnchorNode {
                name: anchor.name.clone(),
                translation: [
                    sx * config.scale + config.origin[0],
                    sy * config.scale + config.origin[1],
                    sz * config.scale + config.origin[2],
                ],
            }
        })
        .collect();

    let mesh = ModelMesh {
        materials: groups.into_iter().map(GroupBuilder::finish).collect(),
        anchors,
        used_palette_entries: used,
    };
    debug!(
        "meshed grid into {} material group(s), {} triangle(s), {} anchor node(s)",
        mesh.materials.len(),
        mesh.total_triangles(),
        mesh.anchors.len()
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_config_defaults() {
        let config = MeshConfig::default();
        assert_eq!(config.scale, 1.0);
        assert_eq!(config.origin, [0.0, 0.0, 0.0]);
        assert!(config.negate_x);
    }

    #[test]
    fn test_mesh_config_builder_chain() {
        let config = MeshConfig::new()
            .with_scale(0.5)
            .with_origin([1.0, 2.0, 3.0])
            .with_negate_x(false);
        assert_eq!(config.scale, 0.5);
        assert_eq!(config.origin, [1.0, 2.0, 3.0]);
        assert!(!config.negate_x);
    }

    #[test]
    fn test_mesh_config_serde_round_trip() {
        let config = MeshConfig::new().with_scale(2.0).with_negate_x(false);
        let json = serde_json::to_string(&config).unwrap();
        let back: MeshConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_mesh_config_serde_defaults_missing_fields() {
        let config: MeshConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MeshConfig::default());
    }

    #[test]
    fn test_dedup_key_collapses_negative_zero() {
        assert_eq!(dedup_key([-0.0, 1.0, 2.0]), dedup_key([0.0, 1.0, 2.0]));
        assert_ne!(dedup_key([0.5, 0.0, 0.0]), dedup_key([-0.5, 0.0, 0.0]));
    }

    #[test]
    fn test_group_builder_interning() {
        let mut group = GroupBuilder::new(Rgb::new(1, 2, 3), "m".into(), 0);
        let a = group.intern_position([0.0, 0.0, 0.0]);
        let b = group.intern_position([1.0, 0.0, 0.0]);
        let c = group.intern_position([0.0, 0.0, 0.0]);
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(group.positions.len(), 2);
    }

    #[test]
    fn test_add_quad_emits_two_triangles() {
        let mut group = GroupBuilder::new(Rgb::new(0, 0, 0), "m".into(), 0);
        group.add_quad(
            [0.0, 1.0, 0.0],
            [
                [0.0, 1.0, 0.0],
                [0.0, 1.0, 1.0],
                [1.0, 1.0, 1.0],
                [1.0, 1.0, 0.0],
            ],
        );
        let mesh = group.finish();
        assert_eq!(mesh.quad_count(), 1);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.normal_count(), 1);
        // Split [0,1,2] / [2,3,0], all pairs sharing the quad normal.
        let expected: Vec<(u32, u32)> =
            vec![(0, 0), (1, 0), (2, 0), (2, 0), (3, 0), (0, 0)];
        assert_eq!(mesh.indices, expected);
    }
}
