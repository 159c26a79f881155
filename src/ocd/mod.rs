//! The OCD file writer.
//!
//! The submodules split along the file layout: numeric conversion, icon
//! rasterization and palette quantization feed the record encoders, which
//! feed the [`file::OcdFileBuilder`] assembling the final byte image.
//! [`export::export`] drives the whole pipeline.

/// Numeric conversions from map units to OCD fixed-point values
pub mod convert;

/// Export pipeline and per-run context
pub mod export;

/// File assembly: header, blocks and chained index blocks
pub mod file;

/// Symbol icon rasterization
mod icon;

/// Object record encoder
mod objects;

/// Palette quantization for version 6 and version 9 icons
pub mod palette;

/// Parameter string payloads (version 9 and later)
pub mod params;

/// Fixed-layout record structures shared by the encoders
pub mod records;

/// Symbol record encoder
mod symbols;

#[cfg(test)]
mod tests;

// Re-export the public entry points
pub use export::{Export, ExportOptions, export};
pub use records::OcdVersion;
