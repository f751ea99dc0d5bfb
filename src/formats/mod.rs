//! On-disk model formats.

pub mod vxi;

pub use vxi::{from_vxi, is_vxi, load_vxi, to_vxi};
