//! On-disk record layouts shared by the symbol and object encoders.
//!
//! Every record here serializes through [`ByteWriter`] to a fixed
//! little-endian layout. Index entries are the fixed-size rows of the
//! chained 256-entry index blocks; the blocks themselves are assembled in
//! [`super::file`].

use crate::common::binary::ByteWriter;
use crate::common::{Error, Result};

use super::icon::{ICON_BYTES_V6, ICON_BYTES_V9};

/// The supported file format versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OcdVersion {
    V8,
    V9,
    V10,
    V11,
    V12,
}

impl OcdVersion {
    pub fn from_number(version: u16) -> Result<Self> {
        match version {
            8 => Ok(OcdVersion::V8),
            9 => Ok(OcdVersion::V9),
            10 => Ok(OcdVersion::V10),
            11 => Ok(OcdVersion::V11),
            12 => Ok(OcdVersion::V12),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }

    pub fn number(self) -> u16 {
        match self {
            OcdVersion::V8 => 8,
            OcdVersion::V9 => 9,
            OcdVersion::V10 => 10,
            OcdVersion::V11 => 11,
            OcdVersion::V12 => 12,
        }
    }

    /// The file type byte of the generic header.
    pub fn file_type(self) -> u8 {
        // 2 marks a normal map in version 8; later versions write 0.
        if self == OcdVersion::V8 { 2 } else { 0 }
    }

    /// Factor between the two components of a symbol number.
    ///
    /// Version 8 stores "101.5" as 101 * 10 + 5 in an i16; later versions
    /// use three decimals in an i32.
    pub fn symbol_number_factor(self) -> u32 {
        if self == OcdVersion::V8 { 10 } else { 1000 }
    }

    pub fn icon_bytes(self) -> usize {
        if self == OcdVersion::V8 {
            ICON_BYTES_V6
        } else {
            ICON_BYTES_V9
        }
    }

    /// Whether settings live in parameter strings instead of header blocks.
    pub fn uses_parameter_strings(self) -> bool {
        self >= OcdVersion::V9
    }

    /// The parameter string type holding the map notes.
    pub fn notes_string_type(self) -> i32 {
        if self >= OcdVersion::V11 { 1061 } else { 11 }
    }
}

/// A coordinate pair in 24.8 fixed point, flags in the low bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OcdPoint {
    pub x: i32,
    pub y: i32,
}

impl OcdPoint {
    pub const SIZE: usize = 8;

    /// X low byte: first bezier control point.
    pub const X_CTL1: i32 = 1;
    /// X low byte: second bezier control point.
    pub const X_CTL2: i32 = 2;
    /// Y low byte: corner point.
    pub const Y_CORNER: i32 = 1;
    /// Y low byte: first point of a hole.
    pub const Y_HOLE: i32 = 2;
    /// Y low byte: dash point.
    pub const Y_DASH: i32 = 8;

    pub fn write(self, w: &mut ByteWriter) {
        w.i32(self.x);
        w.i32(self.y);
    }
}

/// Symbol type byte of a symbol record.
pub mod symbol_type {
    pub const POINT: u8 = 1;
    pub const LINE: u8 = 2;
    pub const AREA: u8 = 3;
    pub const TEXT: u8 = 4;
}

/// Status bits of a symbol record.
pub mod symbol_status {
    pub const PROTECTED: u8 = 1;
    pub const HIDDEN: u8 = 2;
}

/// Byte size of the version 8 common symbol record head.
pub const BASE_SYMBOL_SIZE_V8: usize = 346;
/// Byte size of the version 9+ common symbol record head.
pub const BASE_SYMBOL_SIZE_V9: usize = 568;

/// The rasterized icon of a symbol record, sized for the target version.
#[derive(Debug, Clone)]
pub enum SymbolIcon {
    V6(Box<[u8; ICON_BYTES_V6]>),
    V9(Box<[u8; ICON_BYTES_V9]>),
}

/// The common head shared by all symbol record types.
///
/// Variant-specific fields follow the head in the record buffer; `size`
/// covers the complete record.
#[derive(Debug, Clone)]
pub struct BaseSymbol {
    /// Total record byte size, including variant fields.
    pub size: i32,
    /// Combined symbol number, see [`OcdVersion::symbol_number_factor`].
    pub number: i32,
    pub symbol_type: u8,
    /// Secondary type byte, used by version 8 line text symbols.
    pub type2: u8,
    pub flags: u16,
    /// Symbol extent beyond the object coordinates, in 0.01 mm.
    pub extent: i32,
    pub status: u8,
    /// One bit per color table entry used by the symbol.
    pub colors: [u8; 32],
    /// Symbol description in the narrow text encoding.
    pub description: Vec<u8>,
    pub icon: SymbolIcon,
}

impl BaseSymbol {
    pub fn write(&self, w: &mut ByteWriter) {
        match &self.icon {
            SymbolIcon::V6(icon) => self.write_v8(w, icon.as_ref()),
            SymbolIcon::V9(icon) => self.write_v9(w, icon.as_ref()),
        }
    }

    fn write_v8(&self, w: &mut ByteWriter, icon: &[u8]) {
        w.i16(self.size as i16);
        w.i16(self.number as i16);
        w.u8(self.symbol_type);
        w.u8(self.type2);
        w.u16(self.flags);
        w.i16(self.extent as i16);
        w.u8(0); // selected
        w.u8(self.status);
        w.i16(0); // tool
        w.i32(0); // file position, filled by the reader
        w.bytes(&self.colors);
        w.pascal_string(&self.description, 31);
        w.bytes(icon);
        debug_assert_eq!(w.len() % BASE_SYMBOL_SIZE_V8, 0);
    }

    fn write_v9(&self, w: &mut ByteWriter, icon: &[u8]) {
        w.i32(self.size);
        w.i32(self.number);
        w.u8(self.symbol_type);
        w.u8(self.flags as u8);
        w.u8(0); // selected
        w.u8(self.status);
        w.i32(self.extent);
        w.i32(0); // file position
        w.bytes(&self.colors);
        w.pascal_string(&self.description, 31);
        w.bytes(icon);
        debug_assert_eq!(w.len() % BASE_SYMBOL_SIZE_V9, 0);
    }
}

/// Element type codes of point symbol patterns.
pub mod element_type {
    pub const LINE: i16 = 1;
    pub const AREA: i16 = 2;
    pub const CIRCLE: i16 = 3;
    pub const DOT: i16 = 4;
}

/// One drawing element inside a point symbol pattern, 16 bytes, followed by
/// its coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Element {
    pub element_type: i16,
    pub flags: u16,
    pub color: i16,
    /// Line width in 0.01 mm, for line and circle elements.
    pub line_width: i16,
    /// Diameter in 0.01 mm, for circle and dot elements.
    pub diameter: i16,
    pub num_coords: i16,
}

impl Element {
    pub const SIZE: usize = 16;

    pub fn write(self, w: &mut ByteWriter) {
        w.i16(self.element_type);
        w.u16(self.flags);
        w.i16(self.color);
        w.i16(self.line_width);
        w.i16(self.diameter);
        w.i16(self.num_coords);
        w.i32(0); // reserved
    }
}

/// One row of an object index block.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectIndexEntry {
    pub bottom_left: OcdPoint,
    pub top_right: OcdPoint,
    /// Absolute file position of the object record.
    pub position: u32,
    /// Version 8: record size in 8-byte coordinate units past the header.
    /// Version 9+: padded record byte size.
    pub size: i32,
    pub symbol: i32,
    /// Version 9+ only: the object type byte of the record.
    pub object_type: u8,
    /// Version 9+ only: 1 marks a normal, visible object.
    pub status: u8,
}

impl ObjectIndexEntry {
    pub const SIZE_V8: usize = 24;
    pub const SIZE_V9: usize = 40;

    pub fn size_for(version: OcdVersion) -> usize {
        if version == OcdVersion::V8 {
            Self::SIZE_V8
        } else {
            Self::SIZE_V9
        }
    }

    pub fn write(self, w: &mut ByteWriter, version: OcdVersion) {
        self.bottom_left.write(w);
        self.top_right.write(w);
        w.u32(self.position);
        if version == OcdVersion::V8 {
            w.u16(self.size as u16);
            w.i16(self.symbol as i16);
        } else {
            w.i32(self.size);
            w.i32(self.symbol);
            w.u8(self.object_type);
            w.u8(0); // encrypted mode
            w.u8(self.status);
            w.u8(0); // view type
            w.i16(0); // color, 0 = from symbol
            w.u16(0); // reserved
            w.u16(0); // implementation layer
            w.u16(0); // reserved
        }
    }
}

/// One row of a version 9+ string index block, 16 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringIndexEntry {
    pub position: u32,
    /// Allocated byte length of the string record.
    pub length: u32,
    /// Parameter string type, e.g. 9 for a color definition.
    pub string_type: i32,
    /// Related object index, or 0.
    pub object_index: i32,
}

impl StringIndexEntry {
    pub const SIZE: usize = 16;

    pub fn write(self, w: &mut ByteWriter) {
        w.u32(self.position);
        w.u32(self.length);
        w.i32(self.string_type);
        w.i32(self.object_index);
    }
}
