// Builders and stand-in collaborators shared by the unit tests.

use std::ops::Range;

use crate::command::Platform;
use crate::rom::{read_le, Codec, FreeSpace};
use crate::script::{Script, FUNCTIONS_PER_OBJECT, OBJECT_BLOCK_LEN};

/// Lays out one body per given function, back to back. Slots past the last
/// given function alias it.
pub fn build_script(objects: &[&[&[u8]]]) -> Script {
    let block_len = OBJECT_BLOCK_LEN * objects.len();
    let mut pointers = Vec::with_capacity(block_len);
    let mut body = Vec::new();
    for funcs in objects {
        let mut last = block_len + body.len();
        for f in 0..FUNCTIONS_PER_OBJECT {
            if let Some(code) = funcs.get(f) {
                last = block_len + body.len();
                body.extend_from_slice(code);
            }
            pointers.extend_from_slice(&(last as u16).to_le_bytes());
        }
    }

    let mut bytes = vec![objects.len() as u8];
    bytes.extend(pointers);
    bytes.extend(body);
    Script::from_bytes(&bytes, Platform::Snes).unwrap()
}

/// "Compresses" by prefixing a two-byte length.
pub struct StoredCodec;

impl Codec for StoredCodec {
    fn decompress(&self, source: &[u8], start: usize) -> Result<Vec<u8>, String> {
        let len = self.compressed_length(source, start)? - 2;
        source
            .get(start + 2..start + 2 + len)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| format!("block at {start:#X} runs past the image"))
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, String> {
        let len = u16::try_from(data.len()).map_err(|_| "block too long".to_string())?;
        let mut out = len.to_le_bytes().to_vec();
        out.extend_from_slice(data);
        Ok(out)
    }

    fn compressed_length(&self, source: &[u8], start: usize) -> Result<usize, String> {
        source
            .get(start..start + 2)
            .map(|b| read_le(b) as usize + 2)
            .ok_or_else(|| format!("no block header at {start:#X}"))
    }
}

/// Image plus a list of free ranges, allocated first fit.
pub struct ImageSpace {
    pub rom: Vec<u8>,
    pub free: Vec<Range<usize>>,
    cursor: usize,
}

impl ImageSpace {
    pub fn new(rom: Vec<u8>, free: Vec<Range<usize>>) -> ImageSpace {
        ImageSpace {
            rom,
            free,
            cursor: 0,
        }
    }

    pub fn is_free(&self, addr: usize) -> bool {
        self.free.iter().any(|r| r.contains(&addr))
    }
}

impl FreeSpace for ImageSpace {
    fn get_free_addr(&mut self, len: usize) -> Option<usize> {
        self.free
            .iter()
            .find(|r| r.end - r.start >= len)
            .map(|r| r.start)
    }

    fn mark_block(&mut self, range: Range<usize>, used: bool) {
        if used {
            let mut kept = Vec::new();
            for r in self.free.drain(..) {
                if r.end <= range.start || r.start >= range.end {
                    kept.push(r);
                    continue;
                }
                if r.start < range.start {
                    kept.push(r.start..range.start);
                }
                if r.end > range.end {
                    kept.push(range.end..r.end);
                }
            }
            self.free = kept;
        } else {
            self.free.push(range);
        }
    }

    fn seek(&mut self, addr: usize) {
        self.cursor = addr;
    }

    fn write(&mut self, bytes: &[u8]) {
        let end = self.cursor + bytes.len();
        self.rom[self.cursor..end].copy_from_slice(bytes);
        self.cursor = end;
    }
}
