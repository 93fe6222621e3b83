// Host image plumbing: fixed-width little-endian fields, HiROM pointer
// conversion, the location -> event script pointer table, and the two
// collaborators a save goes through (block codec and free-space allocator).

use std::ops::Range;

use crate::{Result, ScriptError};

/// HiROM bank offset of file address 0.
pub const HIROM_BASE: usize = 0xC0_0000;

/// Location records begin here; each is 14 bytes with the event index at +8.
pub const LOCATION_DATA: usize = 0x36_0000;
const LOCATION_RECORD_LEN: usize = 14;
const LOCATION_EVENT_INDEX: usize = 8;

/// Table of absolute 3-byte pointers to compressed event scripts.
pub const EVENT_POINTER_TABLE: usize = 0x3C_F9F0;

/// Lossless block codec used for compressed scripts.
pub trait Codec {
    fn decompress(&self, source: &[u8], start: usize) -> std::result::Result<Vec<u8>, String>;

    fn compress(&self, data: &[u8]) -> std::result::Result<Vec<u8>, String>;

    /// Length of the compressed block at `start` without decompressing it.
    fn compressed_length(&self, source: &[u8], start: usize) -> std::result::Result<usize, String>;
}

/// Allocator over the free regions of the host image plus a write cursor.
pub trait FreeSpace {
    /// Start of at least `len` contiguous free bytes.
    fn get_free_addr(&mut self, len: usize) -> Option<usize>;

    fn mark_block(&mut self, range: Range<usize>, used: bool);

    fn seek(&mut self, addr: usize);

    fn write(&mut self, bytes: &[u8]);
}

/// Reads up to four bytes as a little-endian integer.
pub fn read_le(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .rev()
        .fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

/// Writes `value` into all of `out` (at most four bytes), low byte first.
pub fn write_le(out: &mut [u8], value: u32) {
    let bytes = value.to_le_bytes();
    for (dst, src) in out.iter_mut().zip(bytes.iter()) {
        *dst = *src;
    }
}

pub fn read_le_at(buf: &[u8], pos: usize, width: usize) -> Result<u32> {
    let end = pos.saturating_add(width);
    buf.get(pos..end)
        .map(read_le)
        .ok_or(ScriptError::AddressOutOfRange {
            addr: pos,
            len: buf.len(),
        })
}

pub fn write_le_at(buf: &mut [u8], pos: usize, width: usize, value: u32) -> Result<()> {
    let len = buf.len();
    let end = pos.saturating_add(width);
    let slot = buf
        .get_mut(pos..end)
        .ok_or(ScriptError::AddressOutOfRange { addr: pos, len })?;
    write_le(slot, value);
    Ok(())
}

pub fn to_file_ptr(rom_ptr: usize) -> usize {
    rom_ptr & 0x3F_FFFF
}

pub fn to_rom_ptr(file_ptr: usize) -> usize {
    file_ptr | HIROM_BASE
}

/// File address of the compressed event script for `location`.
pub fn location_event_pointer(rom: &[u8], location: usize) -> Result<usize> {
    let index_at = LOCATION_DATA + LOCATION_RECORD_LEN * location + LOCATION_EVENT_INDEX;
    let index = read_le_at(rom, index_at, 2)? as usize;
    let ptr = read_le_at(rom, EVENT_POINTER_TABLE + 3 * index, 3)? as usize;
    Ok(to_file_ptr(ptr))
}

/// Repoints the event table entry used by `location` at `file_ptr`.
pub fn set_location_event_pointer(rom: &mut [u8], location: usize, file_ptr: usize) -> Result<()> {
    let index_at = LOCATION_DATA + LOCATION_RECORD_LEN * location + LOCATION_EVENT_INDEX;
    let index = read_le_at(rom, index_at, 2)? as usize;
    let rom_ptr = to_rom_ptr(file_ptr) as u32;
    write_le_at(rom, EVENT_POINTER_TABLE + 3 * index, 3, rom_ptr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn le_helpers_round_trip_widths() {
        let mut buf = [0u8; 3];
        write_le(&mut buf, 0x12_3456);
        assert_eq!(buf, [0x56, 0x34, 0x12]);
        assert_eq!(read_le(&buf), 0x12_3456);
        assert_eq!(read_le(&buf[..1]), 0x56);
    }

    #[test]
    fn read_past_end_is_an_error() {
        let buf = [1u8, 2];
        assert_eq!(read_le_at(&buf, 0, 2).unwrap(), 0x0201);
        assert!(matches!(
            read_le_at(&buf, 1, 2),
            Err(ScriptError::AddressOutOfRange { addr: 1, len: 2 })
        ));
    }

    #[test]
    fn hirom_pointer_conversion() {
        assert_eq!(to_file_ptr(0xC4_1234), 0x04_1234);
        assert_eq!(to_file_ptr(0xFF_FFFF), 0x3F_FFFF);
        assert_eq!(to_rom_ptr(0x04_1234), 0xC4_1234);
    }

    #[test]
    fn location_pointer_table_lookup_and_update() {
        let mut rom = vec![0u8; 0x40_0000];
        let loc = 3;
        let index_at = LOCATION_DATA + 14 * loc + 8;
        rom[index_at] = 5;
        let entry = EVENT_POINTER_TABLE + 15;
        rom[entry..entry + 3].copy_from_slice(&[0x00, 0x80, 0xC7]);

        assert_eq!(location_event_pointer(&rom, loc).unwrap(), 0x07_8000);

        set_location_event_pointer(&mut rom, loc, 0x3E_0010).unwrap();
        assert_eq!(&rom[entry..entry + 3], &[0x10, 0x00, 0xFE]);
        assert_eq!(location_event_pointer(&rom, loc).unwrap(), 0x3E_0010);
    }
}
