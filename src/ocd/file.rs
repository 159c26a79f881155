//! File assembly: generic header, header blocks, records and the chained
//! index blocks.
//!
//! The builder collects finished record buffers and lays the file out in
//! one pass: header, version 8 header blocks, symbol records, symbol index,
//! object records, object index, then string records and string index for
//! version 9 and later. Index blocks hold 256 entries each and chain
//! through an absolute `next` pointer in their first four bytes; at least
//! one block per index is always written.

use crate::common::binary::{ByteWriter, pad_to_chunk};

use super::records::{ObjectIndexEntry, OcdVersion, StringIndexEntry};

/// Byte value marking an OCD file.
pub const FILE_MARK: u16 = 0x0cad;

/// Byte size of the generic header.
pub const HEADER_SIZE: usize = 48;

/// Entries per index block.
const INDEX_BLOCK_ENTRIES: usize = 256;

/// Accumulates record buffers and assembles the final file image.
#[derive(Debug)]
pub struct OcdFileBuilder {
    version: OcdVersion,
    symbol_header: Vec<u8>,
    setup: Vec<u8>,
    info: Vec<u8>,
    symbols: Vec<Vec<u8>>,
    objects: Vec<(Vec<u8>, ObjectIndexEntry)>,
    strings: Vec<(i32, Vec<u8>)>,
}

impl OcdFileBuilder {
    pub fn new(version: OcdVersion) -> Self {
        Self {
            version,
            symbol_header: Vec::new(),
            setup: Vec::new(),
            info: Vec::new(),
            symbols: Vec::new(),
            objects: Vec::new(),
            strings: Vec::new(),
        }
    }

    pub fn version(&self) -> OcdVersion {
        self.version
    }

    /// Version 8 only: the color table block following the header.
    pub fn set_symbol_header(&mut self, block: Vec<u8>) {
        self.symbol_header = block;
    }

    /// Version 8 only: the view setup block.
    pub fn set_setup(&mut self, block: Vec<u8>) {
        self.setup = block;
    }

    /// Version 8 only: the map notes, in the narrow encoding.
    pub fn set_info(&mut self, block: Vec<u8>) {
        self.info = block;
    }

    pub fn add_symbol(&mut self, record: Vec<u8>) {
        self.symbols.push(record);
    }

    /// Queue an object record. The record is padded to 8 bytes; the entry's
    /// position is filled during assembly, everything else is the caller's.
    pub fn add_object(&mut self, mut record: Vec<u8>, entry: ObjectIndexEntry) {
        pad_to_chunk(&mut record, 8);
        self.objects.push((record, entry));
    }

    /// Queue a version 9+ parameter string. A terminating NUL is appended.
    pub fn add_string(&mut self, string_type: i32, mut bytes: Vec<u8>) {
        bytes.push(0);
        self.strings.push((string_type, bytes));
    }

    /// Lay out and serialize the complete file.
    pub fn finish(self) -> Vec<u8> {
        let version = self.version;
        let index_blocks = |count: usize| count.div_ceil(INDEX_BLOCK_ENTRIES).max(1);

        // First pass: assign absolute positions.
        let mut pos = HEADER_SIZE;
        let symbol_header_pos = pos;
        pos += self.symbol_header.len();
        let setup_pos = pos;
        pos += self.setup.len();
        let info_pos = pos;
        pos += self.info.len();

        let mut symbol_positions = Vec::with_capacity(self.symbols.len());
        for record in &self.symbols {
            symbol_positions.push(pos as u32);
            pos += record.len();
        }
        let first_symbol_index = pos;
        let symbol_block_size = 4 + INDEX_BLOCK_ENTRIES * 4;
        pos += index_blocks(self.symbols.len()) * symbol_block_size;

        let mut object_positions = Vec::with_capacity(self.objects.len());
        for (record, _) in &self.objects {
            object_positions.push(pos as u32);
            pos += record.len();
        }
        let first_object_index = pos;
        let object_block_size = 4 + INDEX_BLOCK_ENTRIES * ObjectIndexEntry::size_for(version);
        pos += index_blocks(self.objects.len()) * object_block_size;

        let mut string_positions = Vec::with_capacity(self.strings.len());
        for (_, bytes) in &self.strings {
            string_positions.push(pos as u32);
            pos += bytes.len();
        }
        let first_string_index = pos;
        let string_block_size = 4 + INDEX_BLOCK_ENTRIES * StringIndexEntry::SIZE;
        let total_size =
            pos + if version.uses_parameter_strings() {
                index_blocks(self.strings.len()) * string_block_size
            } else {
                0
            };

        // Second pass: serialize.
        let mut w = ByteWriter::with_capacity(total_size);
        w.u16(FILE_MARK);
        w.u8(version.file_type());
        w.u8(0); // status
        w.u16(version.number());
        w.u16(0); // subversion
        w.u32(first_symbol_index as u32);
        w.u32(first_object_index as u32);
        if version == OcdVersion::V8 {
            w.u32(setup_pos as u32);
            w.u32(self.setup.len() as u32);
            w.u32(info_pos as u32);
            w.u32(self.info.len() as u32);
            w.u32(0); // first string index
        } else {
            w.u32(0); // setup position
            w.u32(0); // setup size
            w.u32(0); // info position
            w.u32(0); // info size
            w.u32(first_string_index as u32);
        }
        w.u32(0); // filename position
        w.u32(0); // filename size
        w.u32(0); // reserved
        debug_assert_eq!(w.len(), HEADER_SIZE);

        debug_assert_eq!(w.len(), symbol_header_pos);
        w.bytes(&self.symbol_header);
        w.bytes(&self.setup);
        w.bytes(&self.info);

        for record in &self.symbols {
            w.bytes(record);
        }
        debug_assert_eq!(w.len(), first_symbol_index);
        write_index_blocks(
            &mut w,
            self.symbols.len(),
            symbol_block_size,
            |w, i| w.u32(symbol_positions[i]),
            |w| w.u32(0),
        );

        for (record, _) in &self.objects {
            w.bytes(record);
        }
        debug_assert_eq!(w.len(), first_object_index);
        write_index_blocks(
            &mut w,
            self.objects.len(),
            object_block_size,
            |w, i| {
                let mut entry = self.objects[i].1;
                entry.position = object_positions[i];
                entry.write(w, version);
            },
            |w| ObjectIndexEntry::default().write(w, version),
        );

        if version.uses_parameter_strings() {
            for (_, bytes) in &self.strings {
                w.bytes(bytes);
            }
            debug_assert_eq!(w.len(), first_string_index);
            write_index_blocks(
                &mut w,
                self.strings.len(),
                string_block_size,
                |w, i| {
                    StringIndexEntry {
                        position: string_positions[i],
                        length: self.strings[i].1.len() as u32,
                        string_type: self.strings[i].0,
                        object_index: 0,
                    }
                    .write(w)
                },
                |w| StringIndexEntry::default().write(w),
            );
        }

        debug_assert_eq!(w.len(), total_size);
        w.into_vec()
    }
}

/// Write the chained index blocks for `count` entries, filling unused rows
/// with `empty`. The blocks follow each other immediately, so each block's
/// `next` pointer is its own position plus `block_size`, zero for the last.
fn write_index_blocks(
    w: &mut ByteWriter,
    count: usize,
    block_size: usize,
    mut entry: impl FnMut(&mut ByteWriter, usize),
    mut empty: impl FnMut(&mut ByteWriter),
) {
    let blocks = count.div_ceil(INDEX_BLOCK_ENTRIES).max(1);
    for block in 0..blocks {
        let next = if block + 1 < blocks {
            w.len() + block_size
        } else {
            0
        };
        w.u32(next as u32);
        for slot in 0..INDEX_BLOCK_ENTRIES {
            let i = block * INDEX_BLOCK_ENTRIES + slot;
            if i < count {
                entry(w, i);
            } else {
                empty(w);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u16(data: &[u8], pos: usize) -> u16 {
        u16::from_le_bytes([data[pos], data[pos + 1]])
    }

    fn read_u32(data: &[u8], pos: usize) -> u32 {
        u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap())
    }

    #[test]
    fn test_empty_v9_file_layout() {
        let data = OcdFileBuilder::new(OcdVersion::V9).finish();

        assert_eq!(read_u16(&data, 0), FILE_MARK);
        assert_eq!(data[2], 0); // file type
        assert_eq!(read_u16(&data, 4), 9);

        // One empty index block each for symbols, objects and strings.
        let first_symbol_index = read_u32(&data, 8) as usize;
        let first_object_index = read_u32(&data, 12) as usize;
        let first_string_index = read_u32(&data, 32) as usize;
        assert_eq!(first_symbol_index, HEADER_SIZE);
        assert_eq!(first_object_index, first_symbol_index + 4 + 256 * 4);
        assert_eq!(first_string_index, first_object_index + 4 + 256 * 40);
        assert_eq!(data.len(), first_string_index + 4 + 256 * 16);

        // Each chain ends with a zero next pointer.
        assert_eq!(read_u32(&data, first_symbol_index), 0);
        assert_eq!(read_u32(&data, first_object_index), 0);
        assert_eq!(read_u32(&data, first_string_index), 0);
    }

    #[test]
    fn test_v8_header_blocks_and_no_string_index() {
        let mut builder = OcdFileBuilder::new(OcdVersion::V8);
        builder.set_symbol_header(vec![1; 100]);
        builder.set_setup(vec![2; 48]);
        builder.set_info(b"notes\0".to_vec());
        let data = builder.finish();

        assert_eq!(data[2], 2); // file type of a version 8 map
        assert_eq!(read_u16(&data, 4), 8);
        let setup_pos = read_u32(&data, 16) as usize;
        let setup_size = read_u32(&data, 20) as usize;
        let info_pos = read_u32(&data, 24) as usize;
        let info_size = read_u32(&data, 28) as usize;
        assert_eq!(setup_pos, HEADER_SIZE + 100);
        assert_eq!(setup_size, 48);
        assert_eq!(info_pos, setup_pos + 48);
        assert_eq!(info_size, 6);
        assert_eq!(&data[info_pos..info_pos + 6], b"notes\0");
        assert_eq!(read_u32(&data, 32), 0); // no string index

        // Symbol index then object index, nothing after.
        let first_symbol_index = read_u32(&data, 8) as usize;
        let first_object_index = read_u32(&data, 12) as usize;
        assert_eq!(first_symbol_index, info_pos + 6);
        assert_eq!(first_object_index, first_symbol_index + 4 + 256 * 4);
        assert_eq!(data.len(), first_object_index + 4 + 256 * 24);
    }

    #[test]
    fn test_records_are_indexed_and_padded() {
        let mut builder = OcdFileBuilder::new(OcdVersion::V9);
        builder.add_symbol(vec![0xaa; 568]);
        builder.add_object(
            vec![0xbb; 35],
            ObjectIndexEntry {
                symbol: 5,
                object_type: 1,
                status: 1,
                size: 40,
                ..Default::default()
            },
        );
        builder.add_string(9, b"Purple\tn1".to_vec());
        let data = builder.finish();

        let first_symbol_index = read_u32(&data, 8) as usize;
        let symbol_pos = read_u32(&data, first_symbol_index + 4) as usize;
        assert_eq!(symbol_pos, HEADER_SIZE);
        assert_eq!(data[symbol_pos], 0xaa);
        // Unused index slots stay zero.
        assert_eq!(read_u32(&data, first_symbol_index + 8), 0);

        let first_object_index = read_u32(&data, 12) as usize;
        let object_pos = read_u32(&data, first_object_index + 4 + 16) as usize;
        assert_eq!(object_pos, first_symbol_index + 4 + 256 * 4);
        assert_eq!(data[object_pos], 0xbb);
        assert_eq!(data[object_pos + 34], 0xbb);
        assert_eq!(data[object_pos + 35], 0); // padded to 40 bytes
        // Entry fields after position: size, symbol, type, status.
        assert_eq!(read_u32(&data, first_object_index + 4 + 16 + 4), 40);
        assert_eq!(read_u32(&data, first_object_index + 4 + 16 + 8), 5);
        assert_eq!(data[first_object_index + 4 + 16 + 12], 1);
        assert_eq!(data[first_object_index + 4 + 16 + 14], 1);

        let first_string_index = read_u32(&data, 32) as usize;
        let string_pos = read_u32(&data, first_string_index + 4) as usize;
        let string_len = read_u32(&data, first_string_index + 8) as usize;
        assert_eq!(string_len, 10); // "Purple\tn1" plus NUL
        assert_eq!(&data[string_pos..string_pos + string_len], b"Purple\tn1\0");
        let string_type = read_u32(&data, first_string_index + 12);
        assert_eq!(string_type, 9);
    }

    #[test]
    fn test_index_chains_over_multiple_blocks() {
        let mut builder = OcdFileBuilder::new(OcdVersion::V9);
        for _ in 0..300 {
            builder.add_symbol(vec![0; 568]);
        }
        let data = builder.finish();

        let first_symbol_index = read_u32(&data, 8) as usize;
        let next = read_u32(&data, first_symbol_index) as usize;
        assert_eq!(next, first_symbol_index + 4 + 256 * 4);
        assert_eq!(read_u32(&data, next), 0);
        // 257th entry lands in the second block.
        let pos_256 = read_u32(&data, next + 4) as usize;
        assert_eq!(pos_256, HEADER_SIZE + 256 * 568);
    }
}
