//! # voxmesh
//!
//! A voxel model parser and mesh conversion library.
//!
//! `voxmesh` reads the fixed little-endian `.vxi` voxel format (a dense grid
//! of palette indices plus an embedded 256-entry palette and named anchor
//! points) and converts the grid into deduplicated, material-partitioned
//! indexed triangle meshes ready for a scene-file serializer.
//!
//! ```no_run
//! use voxmesh::{formats, meshing, MeshConfig, Palette};
//!
//! # fn main() -> voxmesh::Result<()> {
//! let grid = formats::load_vxi("models/ship.vxi")?;
//! let names = Palette::load_default_global()?;
//! let mesh = meshing::mesh_grid(&grid, Some(&names), &MeshConfig::default())?;
//!
//! for material in &mesh.materials {
//!     println!("{}: {} triangles", material.name, material.triangle_count());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The conversion pipeline is single-threaded and deterministic: the same
//! input bytes always produce byte-identical vertex, normal, and index
//! streams.

pub mod byteio;
pub mod error;
pub mod formats;
pub mod grid;
pub mod meshing;
pub mod palette;

pub use byteio::{ByteReader, ByteWriter};
pub use error::{Error, Result};
pub use grid::{AnchorPoint, VoxelGrid, EMPTY_CELL};
pub use meshing::{mesh_grid, AnchorNode, MaterialMesh, MeshConfig, ModelMesh};
pub use palette::{Palette, Rgb, GLOBAL_PALETTE_FILE, PALETTE_SIZE};
