//! Quince - A writer for the binary OCD orienteering map file format
//!
//! This library serializes an in-memory vector map model into OCD files of
//! format versions 8 through 12, covering colors, point, line, area, text
//! and combined symbols, and all object types.
//!
//! # Features
//!
//! - **Five format versions**: Version 8 header blocks as well as the
//!   parameter strings of versions 9 to 12
//! - **Symbol decomposition**: Combined symbols are broken down into the
//!   primitive record types where the format can express them
//! - **Icon rendering**: Symbol icons are quantized and dithered to the
//!   fixed palettes of the old and new icon formats
//! - **Lossy-export warnings**: Everything the format cannot represent is
//!   reported instead of silently dropped
//!
//! # Example - Writing a map
//!
//! ```no_run
//! use quince::map::Map;
//! use quince::ocd::{export, ExportOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let map = Map::default();
//!
//! let result = export(&map, 9, &ExportOptions::default())?;
//! for warning in &result.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! std::fs::write("map.ocd", &result.data)?;
//! # Ok(())
//! # }
//! ```

/// Shared utilities: binary writing, text encodings and the error type
pub mod common;

/// The in-memory map model accepted by the writer
pub mod map;

/// The OCD file writer
pub mod ocd;

// Re-export the top-level API
pub use common::{Error, Result};
pub use ocd::{Export, ExportOptions, OcdVersion, export};
