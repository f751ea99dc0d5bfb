//! Fixed 256-entry color tables.
//!
//! Every voxel model carries an embedded, name-free palette; display names live
//! in a shared "global" palette resource file that pairs the same 256 colors
//! with 256 length-prefixed UTF-8 names.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::byteio::{ByteReader, ByteWriter};
use crate::error::{Error, Result};

/// Number of entries in every palette.
pub const PALETTE_SIZE: usize = 256;

/// Default repository-relative location of the shared global palette.
pub const GLOBAL_PALETTE_FILE: &str = "palette.dat";

/// One palette entry, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// An ordered 256-entry color table, optionally paired with entry names.
///
/// The name table is present in the "global" variant loaded from the shared
/// resource file and absent in the palette embedded in a voxel model file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    colors: Vec<Rgb>,
    names: Option<Vec<String>>,
}

impl Palette {
    /// Build a name-free palette from a color table. Well-formed palettes have
    /// exactly [`PALETTE_SIZE`] entries; lookups through [`Palette::color`]
    /// guard against anything shorter.
    pub fn from_colors(colors: Vec<Rgb>) -> Self {
        Self {
            colors,
            names: None,
        }
    }

    /// Attach a parallel name table.
    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = Some(names);
        self
    }

    /// Read exactly [`PALETTE_SIZE`] RGB triples, then the parallel name table
    /// when `has_names` is set.
    pub fn decode(reader: &mut ByteReader<'_>, has_names: bool) -> Result<Self> {
        let mut colors = Vec::with_capacity(PALETTE_SIZE);
        for _ in 0..PALETTE_SIZE {
            let r = reader.read_u8()?;
            let g = reader.read_u8()?;
            let b = reader.read_u8()?;
            colors.push(Rgb::new(r, g, b));
        }

        let names = if has_names {
            let mut names = Vec::with_capacity(PALETTE_SIZE);
            for _ in 0..PALETTE_SIZE {
                names.push(reader.read_string()?);
            }
            Some(names)
        } else {
            None
        };

        Ok(Self { colors, names })
    }

    /// Inverse of [`Palette::decode`]. Writes nothing for names when the
    /// palette has none.
    pub fn encode(&self, writer: &mut ByteWriter) {
        for color in &self.colors {
            writer.write_u8(color.r);
            writer.write_u8(color.g);
            writer.write_u8(color.b);
        }
        if let Some(names) = &self.names {
            for name in names {
                writer.write_string(name);
            }
        }
    }

    /// Load the name-bearing global palette from `path`.
    pub fn load_global(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| Error::from(e).in_file(path))?;
        let mut reader = ByteReader::new(&data);
        let palette =
            Self::decode(&mut reader, true).map_err(|e| e.in_file(path))?;
        debug!("loaded global palette from {}", path.display());
        Ok(palette)
    }

    /// Load the global palette from its default repository-relative path.
    pub fn load_default_global() -> Result<Self> {
        Self::load_global(GLOBAL_PALETTE_FILE)
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn has_names(&self) -> bool {
        self.names.is_some()
    }

    /// Guarded color lookup. The cell value domain makes an out-of-range index
    /// unreachable for a well-formed 256-entry table; the guard covers
    /// undersized tables built by hand.
    pub fn color(&self, index: usize) -> Result<Rgb> {
        self.colors
            .get(index)
            .copied()
            .ok_or(Error::MalformedPalette {
                index,
                len: self.colors.len(),
            })
    }

    /// Display name for an entry, when this palette carries names.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names
            .as_ref()
            .and_then(|names| names.get(index))
            .map(String::as_str)
    }
}
