//! The in-memory voxel model: a dense grid of palette indices, a world-space
//! offset, the embedded palette, and named anchor points.

use serde::{Deserialize, Serialize};

use crate::palette::Palette;

/// Sentinel cell value meaning "no voxel here". Valid palette indices are
/// `0..=254`; 255 never appears as a stored material.
pub const EMPTY_CELL: u8 = 255;

/// A named attachment position inside a model. Anchors are not meshed; they
/// become transform-only nodes in the output scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl AnchorPoint {
    pub fn new(name: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            z,
        }
    }
}

/// A decoded voxel model.
///
/// Cells are stored densely in outer-X / middle-Y / inner-Z order, the exact
/// on-disk order, so decoding is a straight copy. The grid is read-only for
/// the conversion pipeline once decoded; the mutating operations below exist
/// for building models programmatically and for editor-style cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoxelGrid {
    pub size: (u32, u32, u32),
    /// World-space translation applied to grid-local coordinates.
    pub offset: (i32, i32, i32),
    pub(crate) cells: Vec<u8>,
    pub palette: Palette,
    pub anchors: Vec<AnchorPoint>,
}

impl VoxelGrid {
    /// Create an empty grid of the given dimensions.
    pub fn new(size: (u32, u32, u32), palette: Palette) -> Self {
        let volume = size.0 as usize * size.1 as usize * size.2 as usize;
        Self {
            size,
            offset: (0, 0, 0),
            cells: vec![EMPTY_CELL; volume],
            palette,
            anchors: Vec::new(),
        }
    }

    pub fn volume(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as u32) < self.size.0
            && (y as u32) < self.size.1
            && (z as u32) < self.size.2
    }

    #[inline]
    fn cell_index(&self, x: u32, y: u32, z: u32) -> usize {
        (z + y * self.size.2 + x * self.size.2 * self.size.1) as usize
    }

    /// Raw cell value; [`EMPTY_CELL`] for coordinates outside the grid.
    pub fn get(&self, x: i32, y: i32, z: i32) -> u8 {
        if !self.in_bounds(x, y, z) {
            return EMPTY_CELL;
        }
        self.cells[self.cell_index(x as u32, y as u32, z as u32)]
    }

    /// Store a palette index at a cell; [`EMPTY_CELL`] clears it. Writes
    /// outside the grid are ignored.
    pub fn set(&mut self, x: i32, y: i32, z: i32, value: u8) {
        if !self.in_bounds(x, y, z) {
            return;
        }
        let index = self.cell_index(x as u32, y as u32, z as u32);
        self.cells[index] = value;
    }

    /// True iff the coordinate holds a voxel. Out-of-bounds coordinates are
    /// never solid, which is what keeps faces on the grid boundary visible.
    #[inline]
    pub fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        self.in_bounds(x, y, z)
            && self.cells[self.cell_index(x as u32, y as u32, z as u32)] != EMPTY_CELL
    }

    /// Number of non-empty cells.
    pub fn solid_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != EMPTY_CELL).count()
    }

    /// Iterate non-empty cells as `((x, y, z), palette_index)` in ascending
    /// x, then y, then z (the storage order), so the walk is deterministic.
    pub fn iter_solid(&self) -> impl Iterator<Item = ((u32, u32, u32), u8)> + '_ {
        let (sy, sz) = (self.size.1, self.size.2);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &cell)| cell != EMPTY_CELL)
            .map(move |(index, &cell)| {
                let index = index as u32;
                let z = index % sz;
                let y = (index / sz) % sy;
                let x = index / (sz * sy);
                ((x, y, z), cell)
            })
    }

    /// Minimum world-space corner of the grid.
    pub fn world_min(&self) -> (i32, i32, i32) {
        self.offset
    }

    /// Maximum world-space corner of the grid.
    pub fn world_max(&self) -> (i32, i32, i32) {
        (
            self.offset.0 + self.size.0 as i32,
            self.offset.1 + self.size.1 as i32,
            self.offset.2 + self.size.2 as i32,
        )
    }

    // ── Anchor management ───────────────────────────────────────────────────

    pub fn add_anchor(&mut self, name: impl Into<String>, x: i32, y: i32, z: i32) {
        self.anchors.push(AnchorPoint::new(name, x, y, z));
    }

    pub fn remove_anchor(&mut self, index: usize) -> Option<AnchorPoint> {
        if index < self.anchors.len() {
            Some(self.anchors.remove(index))
        } else {
            None
        }
    }

    pub fn anchor(&self, name: &str) -> Option<&AnchorPoint> {
        self.anchors.iter().find(|p| p.name == name)
    }

    // ── Editor-style cleanup ────────────────────────────────────────────────

    /// Crop to a sub-box starting at `(x1, y1, z1)` with the given dimensions.
    /// Source cells outside the old grid read as empty; the cut is folded into
    /// `offset` so world-space positions are unchanged.
    fn resize(&mut self, x1: i32, y1: i32, z1: i32, new_size: (u32, u32, u32)) {
        if (x1, y1, z1) == (0, 0, 0) && new_size == self.size {
            return;
        }
        let (nx, ny, nz) = new_size;
        let mut new_cells = vec![EMPTY_CELL; nx as usize * ny as usize * nz as usize];
        for x in 0..nx as i32 {
            for y in 0..ny as i32 {
                for z in 0..nz as i32 {
                    let cell = self.get(x + x1, y + y1, z + z1);
                    if cell != EMPTY_CELL {
                        let index = (z as u32
                            + y as u32 * nz
                            + x as u32 * nz * ny) as usize;
                        new_cells[index] = cell;
                    }
                }
            }
        }
        self.cells = new_cells;
        self.size = new_size;
        self.offset = (self.offset.0 + x1, self.offset.1 + y1, self.offset.2 + z1);
    }

    /// Trim empty border slabs so the grid tightly encloses its solid cells.
    /// A grid with no solid cells is left untouched.
    pub fn shrink_to_content(&mut self) {
        let mut min = (i32::MAX, i32::MAX, i32::MAX);
        let mut max = (i32::MIN, i32::MIN, i32::MIN);
        for ((x, y, z), _) in self.iter_solid() {
            let (x, y, z) = (x as i32, y as i32, z as i32);
            min = (min.0.min(x), min.1.min(y), min.2.min(z));
            max = (max.0.max(x), max.1.max(y), max.2.max(z));
        }
        if min.0 > max.0 {
            return;
        }
        let new_size = (
            (max.0 - min.0 + 1) as u32,
            (max.1 - min.1 + 1) as u32,
            (max.2 - min.2 + 1) as u32,
        );
        self.resize(min.0, min.1, min.2, new_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Rgb;

    fn test_palette() -> Palette {
        Palette::from_colors((0..=255).map(|i| Rgb::new(i, i, i)).collect())
    }

    #[test]
    fn test_get_set_round_trip() {
        let mut grid = VoxelGrid::new((3, 4, 5), test_palette());
        assert_eq!(grid.volume(), 60);
        grid.set(2, 3, 4, 17);
        assert_eq!(grid.get(2, 3, 4), 17);
        assert_eq!(grid.get(0, 0, 0), EMPTY_CELL);
        grid.set(2, 3, 4, EMPTY_CELL);
        assert_eq!(grid.solid_count(), 0);
    }

    #[test]
    fn test_out_of_bounds_never_solid() {
        let mut grid = VoxelGrid::new((2, 2, 2), test_palette());
        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    grid.set(x, y, z, 0);
                }
            }
        }
        assert!(grid.is_solid(1, 1, 1));
        assert!(!grid.is_solid(-1, 0, 0));
        assert!(!grid.is_solid(0, -1, 0));
        assert!(!grid.is_solid(0, 0, -1));
        assert!(!grid.is_solid(2, 0, 0));
        assert!(!grid.is_solid(0, 2, 0));
        assert!(!grid.is_solid(0, 0, 2));
        assert!(!grid.is_solid(i32::MIN, i32::MIN, i32::MIN));
    }

    #[test]
    fn test_empty_sentinel_not_solid() {
        let mut grid = VoxelGrid::new((1, 1, 1), test_palette());
        grid.set(0, 0, 0, EMPTY_CELL);
        assert!(!grid.is_solid(0, 0, 0));
        assert_eq!(grid.iter_solid().count(), 0);
    }

    #[test]
    fn test_iter_solid_order() {
        let mut grid = VoxelGrid::new((2, 2, 2), test_palette());
        grid.set(1, 0, 1, 5);
        grid.set(0, 1, 0, 3);
        grid.set(0, 0, 1, 9);
        let cells: Vec<_> = grid.iter_solid().collect();
        // Ascending x, then y, then z.
        assert_eq!(
            cells,
            vec![((0, 0, 1), 9), ((0, 1, 0), 3), ((1, 0, 1), 5)]
        );
    }

    #[test]
    fn test_world_extent() {
        let mut grid = VoxelGrid::new((3, 2, 1), test_palette());
        grid.offset = (-1, 4, 0);
        assert_eq!(grid.world_min(), (-1, 4, 0));
        assert_eq!(grid.world_max(), (2, 6, 1));
    }

    #[test]
    fn test_anchor_management() {
        let mut grid = VoxelGrid::new((1, 1, 1), test_palette());
        grid.add_anchor("hand_left", 0, 1, 2);
        grid.add_anchor("hand_right", 3, 4, 5);
        assert_eq!(grid.anchor("hand_right").unwrap().z, 5);
        assert!(grid.anchor("head").is_none());
        assert_eq!(grid.remove_anchor(0).unwrap().name, "hand_left");
        assert!(grid.remove_anchor(5).is_none());
        assert_eq!(grid.anchors.len(), 1);
    }

    #[test]
    fn test_shrink_to_content_folds_offset() {
        let mut grid = VoxelGrid::new((5, 5, 5), test_palette());
        grid.offset = (10, 20, 30);
        grid.set(2, 1, 3, 7);
        grid.set(3, 2, 3, 8);
        grid.shrink_to_content();

        assert_eq!(grid.size, (2, 2, 1));
        assert_eq!(grid.offset, (12, 21, 33));
        assert_eq!(grid.get(0, 0, 0), 7);
        assert_eq!(grid.get(1, 1, 0), 8);
        assert_eq!(grid.solid_count(), 2);
    }

    #[test]
    fn test_shrink_empty_grid_is_noop() {
        let mut grid = VoxelGrid::new((4, 4, 4), test_palette());
        grid.shrink_to_content();
        assert_eq!(grid.size, (4, 4, 4));
    }
}
