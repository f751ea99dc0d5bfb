//! The `.vxi` voxel model format.
//!
//! Fixed little-endian layout, no padding, no magic:
//!
//! ```text
//! u32  size_x, size_y, size_z
//! i32  offset_x, offset_y, offset_z
//! u8   cells[size_x * size_y * size_z]   outer X, middle Y, inner Z; 255 = empty
//! u8   palette[256 * 3]                  RGB triples, name-free
//! u8   anchor_count                      absent in legacy files (read as 0)
//! per anchor:
//!     u8 name_len; name[name_len]        UTF-8
//!     i32 x, y, z
//! ```
//!
//! No coordinate is encoded for cells; the decoder recovers `(x, y, z)`
//! purely from loop order, so the nested order above is part of the format.

use std::path::Path;

use log::debug;

use crate::byteio::{ByteReader, ByteWriter};
use crate::error::{Error, Result};
use crate::grid::{AnchorPoint, VoxelGrid};
use crate::palette::{Palette, PALETTE_SIZE};

const HEADER_LEN: usize = 24;
const PALETTE_LEN: usize = PALETTE_SIZE * 3;

/// Structural plausibility probe. The format has no magic, so this can only
/// check that the claimed dimensions fit the buffer.
pub fn is_vxi(data: &[u8]) -> bool {
    if data.len() < HEADER_LEN + PALETTE_LEN {
        return false;
    }
    let mut reader = ByteReader::new(data);
    let (sx, sy, sz) = match (reader.read_u32(), reader.read_u32(), reader.read_u32()) {
        (Ok(sx), Ok(sy), Ok(sz)) => (sx, sy, sz),
        _ => return false,
    };
    if sx == 0 || sy == 0 || sz == 0 {
        return false;
    }
    let volume = sx as u128 * sy as u128 * sz as u128;
    (HEADER_LEN + PALETTE_LEN) as u128 + volume <= data.len() as u128
}

/// Decode a `.vxi` buffer into a [`VoxelGrid`].
pub fn from_vxi(data: &[u8]) -> Result<VoxelGrid> {
    let mut reader = ByteReader::new(data);

    let size = (reader.read_u32()?, reader.read_u32()?, reader.read_u32()?);
    let offset = (reader.read_i32()?, reader.read_i32()?, reader.read_i32()?);

    let volume = size.0 as u128 * size.1 as u128 * size.2 as u128;
    if volume > reader.remaining() as u128 {
        return Err(Error::TruncatedInput {
            needed: (volume - reader.remaining() as u128).min(usize::MAX as u128) as usize,
            remaining: reader.remaining(),
        });
    }
    // Cell bytes are stored in the grid's own order, so this is a plain copy.
    let cells = reader.read_bytes(volume as usize)?.to_vec();

    let palette = Palette::decode(&mut reader, false)?;

    // Legacy files end right after the palette; treat that as zero anchors.
    let anchor_count = if reader.remaining() == 0 {
        0
    } else {
        reader.read_u8()?
    };
    let mut anchors = Vec::with_capacity(anchor_count as usize);
    for _ in 0..anchor_count {
        let name = reader.read_string()?;
        let x = reader.read_i32()?;
        let y = reader.read_i32()?;
        let z = reader.read_i32()?;
        anchors.push(AnchorPoint::new(name, x, y, z));
    }

    let grid = VoxelGrid {
        size,
        offset,
        cells,
        palette,
        anchors,
    };
    debug!(
        "decoded {}x{}x{} grid: {} solid cell(s), {} anchor(s)",
        size.0,
        size.1,
        size.2,
        grid.solid_count(),
        grid.anchors.len()
    );
    Ok(grid)
}

/// Encode a [`VoxelGrid`] back into the `.vxi` layout. Inverse of
/// [`from_vxi`] for any buffer that carries an anchor-count byte.
pub fn to_vxi(grid: &VoxelGrid) -> Vec<u8> {
    let mut writer =
        ByteWriter::with_capacity(HEADER_LEN + grid.volume() + PALETTE_LEN + 1);
    writer.write_u32(grid.size.0);
    writer.write_u32(grid.size.1);
    writer.write_u32(grid.size.2);
    writer.write_i32(grid.offset.0);
    writer.write_i32(grid.offset.1);
    writer.write_i32(grid.offset.2);
    writer.write_bytes(&grid.cells);
    grid.palette.encode(&mut writer);
    writer.write_u8(grid.anchors.len().min(u8::MAX as usize) as u8);
    for anchor in grid.anchors.iter().take(u8::MAX as usize) {
        writer.write_string(&anchor.name);
        writer.write_i32(anchor.x);
        writer.write_i32(anchor.y);
        writer.write_i32(anchor.z);
    }
    writer.into_inner()
}

/// Read and decode a `.vxi` file, attaching the path to any error.
pub fn load_vxi(path: impl AsRef<Path>) -> Result<VoxelGrid> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::from(e).in_file(path))?;
    from_vxi(&data).map_err(|e| e.in_file(path))
}
