// Strings a script displays. In ROM they live in a block of 16-bit pointers
// (local to the block's bank) followed by 0-terminated strings; the script's
// string-index command holds the ROM address of that block.

use std::collections::{BTreeSet, HashMap};
use std::ops::Range;

use log::{debug, warn};

use crate::catalog::{STRING_INDEX_OPCODE, STRING_OPCODES};
use crate::command::{Command, Operand, Platform};
use crate::rom::{read_le_at, to_file_ptr, to_rom_ptr, write_le, Codec, FreeSpace};
use crate::script::Script;
use crate::{Result, ScriptError};

const STRING_TERMINATOR: u8 = 0x00;

/// How a loaded script relates to the string block it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringBlockUsage {
    /// The block holds exactly the script's strings and can be freed with it.
    Exclusive { range: Range<usize> },
    /// The block's pointer count differs from what the script uses; it may
    /// be shared with other scripts.
    Shared { declared: usize, loaded: usize },
}

/// Where `save` put things.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedScript {
    pub script_addr: usize,
    pub strings_addr: Option<usize>,
}

impl Script {
    /// Loads the compressed script at `file_ptr` along with its strings.
    pub fn from_rom(rom: &[u8], file_ptr: usize, codec: &impl Codec) -> Result<Script> {
        let bytes = codec.decompress(rom, file_ptr).map_err(ScriptError::Codec)?;
        let mut script = Script::from_bytes(&bytes, Platform::Snes)?;
        script.load_strings(rom)?;
        Ok(script)
    }

    fn load_strings(&mut self, rom: &[u8]) -> Result<()> {
        self.string_index = self
            .find_string_index_command()?
            .and_then(|(_, cmd)| cmd.arg(0));
        let refs = self.string_refs()?;
        if refs.is_empty() {
            return Ok(());
        }
        let Some(index) = self.string_index else {
            warn!("script references {} strings but sets no string index", refs.len());
            return Ok(());
        };

        let used: BTreeSet<u32> = refs.iter().map(|&(_, _, x)| x).collect();
        let block = index as usize;
        let bank = to_file_ptr(block & !0xFFFF);
        for &x in &used {
            let ptr_at = to_file_ptr(block + 2 * x as usize);
            let start = bank + read_le_at(rom, ptr_at, 2)? as usize;
            self.strings.push(read_terminated(rom, start)?);
        }

        let dense: HashMap<u32, u32> = used
            .iter()
            .enumerate()
            .map(|(i, &x)| (x, i as u32))
            .collect();
        for (pos, width, old) in refs {
            let new = dense[&old];
            if new != old {
                write_le(&mut self.data[pos..pos + width], new);
                self.strings_modified = true;
            }
        }
        debug!(
            "loaded {} strings from block {index:#08X}{}",
            self.strings.len(),
            if self.strings_modified { ", reindexed" } else { "" }
        );
        Ok(())
    }

    // The string-index command lives in object 0, function 0.
    fn find_string_index_command(&self) -> Result<Option<(usize, Command)>> {
        let start = self.function_start(0, 0)?;
        let end = self.function_end(0, 0)?;
        self.find_command(&[STRING_INDEX_OPCODE], start, end)
    }

    // (operand position, width, string index) of every text command.
    fn string_refs(&self) -> Result<Vec<(usize, usize, u32)>> {
        let mut refs = Vec::new();
        for item in self.commands(self.obj_start_at(0), self.data.len()) {
            let (pos, cmd) = item?;
            if !STRING_OPCODES.contains(&cmd.opcode()) {
                continue;
            }
            if let (Some(x), Some(&width)) = (cmd.arg(0), cmd.arg_lens().first()) {
                refs.push((pos + 1, width, x));
            }
        }
        Ok(refs)
    }

    /// Appends a string (terminated if it is not already) and returns its index.
    pub fn add_string(&mut self, string: &[u8]) -> usize {
        self.strings.push(terminated(string));
        self.strings_modified = true;
        self.strings.len() - 1
    }

    pub fn set_string(&mut self, index: usize, string: &[u8]) -> Result<()> {
        let count = self.strings.len();
        let slot = self
            .strings
            .get_mut(index)
            .ok_or(ScriptError::StringOutOfRange { index, count })?;
        *slot = terminated(string);
        self.strings_modified = true;
        Ok(())
    }

    /// Strings displayed by one object, with their indices, in index order.
    pub fn object_strings(&self, obj: usize) -> Result<Vec<(usize, &[u8])>> {
        let start = self.object_start(obj)?;
        let end = self.object_end(obj)?;
        let mut indices = BTreeSet::new();
        for item in self.commands(start, end) {
            let (_, cmd) = item?;
            if STRING_OPCODES.contains(&cmd.opcode()) {
                if let Some(x) = cmd.arg(0) {
                    indices.insert(x as usize);
                }
            }
        }
        indices
            .into_iter()
            .map(|index| {
                self.strings
                    .get(index)
                    .map(|s| (index, s.as_slice()))
                    .ok_or(ScriptError::StringOutOfRange {
                        index,
                        count: self.strings.len(),
                    })
            })
            .collect()
    }

    /// The pointer array and strings as they would be written at file
    /// address `base`.
    pub fn string_table_bytes(&self, base: usize) -> Result<Vec<u8>> {
        let ptrs_len = 2 * self.strings.len();
        let mut out = Vec::with_capacity(ptrs_len + self.strings.iter().map(Vec::len).sum::<usize>());
        let mut next = base % 0x1_0000 + ptrs_len;
        for s in &self.strings {
            if next > 0xFFFF {
                return Err(ScriptError::InvalidArgument(format!(
                    "string table at {base:#08X} crosses a bank boundary"
                )));
            }
            out.extend_from_slice(&(next as u16).to_le_bytes());
            next += s.len();
        }
        for s in &self.strings {
            out.extend_from_slice(s);
        }
        Ok(out)
    }

    /// Writes the string table to free space and points the script at it.
    pub fn write_strings(&mut self, space: &mut impl FreeSpace) -> Result<Option<usize>> {
        if self.strings.is_empty() {
            return Ok(None);
        }
        let len = 2 * self.strings.len() + self.strings.iter().map(Vec::len).sum::<usize>();
        let addr = space.get_free_addr(len).ok_or(ScriptError::NoFreeSpace { len })?;
        let bytes = self.string_table_bytes(addr)?;
        self.set_string_index(to_rom_ptr(addr) as u32)?;

        space.seek(addr);
        space.write(&bytes);
        space.mark_block(addr..addr + len, true);
        self.strings_modified = false;
        debug!("wrote {} strings at {addr:#08X}", self.strings.len());
        Ok(Some(addr))
    }

    /// Writes modified strings, then the compressed script. The caller
    /// repoints whatever table refers to the script.
    pub fn save(&mut self, codec: &impl Codec, space: &mut impl FreeSpace) -> Result<SavedScript> {
        let strings_addr = if self.strings_modified {
            self.write_strings(space)?
        } else {
            None
        };
        let compressed = codec.compress(&self.to_bytes()).map_err(ScriptError::Codec)?;
        let len = compressed.len();
        let script_addr = space.get_free_addr(len).ok_or(ScriptError::NoFreeSpace { len })?;
        space.seek(script_addr);
        space.write(&compressed);
        space.mark_block(script_addr..script_addr + len, true);
        Ok(SavedScript {
            script_addr,
            strings_addr,
        })
    }

    /// Points the string-index command at `rom_ptr`, inserting one at the top
    /// of object 0 when the script has strings but no such command.
    pub fn set_string_index(&mut self, rom_ptr: u32) -> Result<()> {
        match self.find_string_index_command()? {
            Some((pos, mut cmd)) => {
                cmd.set_arg(0, rom_ptr)?;
                let width = cmd.arg_lens()[0];
                write_le(&mut self.data[pos + 1..pos + 1 + width], rom_ptr);
            }
            None if self.strings.is_empty() => return Ok(()),
            None => {
                let width = match self.platform {
                    Platform::Snes => 3,
                    Platform::Pc => 1,
                };
                let cmd = Command::new(STRING_INDEX_OPCODE, vec![width], vec![Operand::Value(rom_ptr)])?;
                let start = self.function_start(0, 0)?;
                self.insert_command(&cmd, start)?;
            }
        }
        self.string_index = Some(rom_ptr);
        Ok(())
    }

    /// Compares the loaded strings with the ROM block they came from.
    pub fn string_block_usage(&self, rom: &[u8]) -> Result<Option<StringBlockUsage>> {
        let Some(index) = self.string_index else {
            return Ok(None);
        };
        let base = to_file_ptr(index as usize);
        let first = (base & !0xFFFF) + read_le_at(rom, base, 2)? as usize;
        let declared = first.saturating_sub(base) / 2;
        let loaded = self.strings.len();
        if declared != loaded {
            return Ok(Some(StringBlockUsage::Shared { declared, loaded }));
        }
        let len = 2 * loaded + self.strings.iter().map(Vec::len).sum::<usize>();
        Ok(Some(StringBlockUsage::Exclusive {
            range: base..base + len,
        }))
    }
}

/// Marks the compressed script at `file_ptr` free, and its string block too
/// when no other script can be using it.
pub fn free_script(
    rom: &[u8],
    file_ptr: usize,
    codec: &impl Codec,
    space: &mut impl FreeSpace,
) -> Result<Option<StringBlockUsage>> {
    let len = codec
        .compressed_length(rom, file_ptr)
        .map_err(ScriptError::Codec)?;
    let script = Script::from_rom(rom, file_ptr, codec)?;
    let usage = script.string_block_usage(rom)?;

    space.mark_block(file_ptr..file_ptr + len, false);
    match &usage {
        Some(StringBlockUsage::Exclusive { range }) => space.mark_block(range.clone(), false),
        Some(StringBlockUsage::Shared { declared, loaded }) => warn!(
            "strings of script at {file_ptr:#08X} left in place: block declares {declared}, script uses {loaded}"
        ),
        None => {}
    }
    Ok(usage)
}

fn terminated(string: &[u8]) -> Vec<u8> {
    let mut s = string.to_vec();
    if s.last() != Some(&STRING_TERMINATOR) {
        s.push(STRING_TERMINATOR);
    }
    s
}

fn read_terminated(rom: &[u8], start: usize) -> Result<Vec<u8>> {
    let tail = rom.get(start..).ok_or(ScriptError::AddressOutOfRange {
        addr: start,
        len: rom.len(),
    })?;
    let end = tail
        .iter()
        .position(|&b| b == STRING_TERMINATOR)
        .ok_or(ScriptError::UnterminatedString { addr: start })?;
    Ok(tail[..=end].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{build_script, ImageSpace, StoredCodec};
    use pretty_assertions::assert_eq;

    const END: u8 = 0xB2;
    const STRINGS_AT: usize = 0x01_2000;
    const SCRIPT_AT: usize = 0x02_0000;

    // A string block with five pointers of which the script uses 1, 3 and 4.
    fn rom_with_script() -> Vec<u8> {
        let mut rom = vec![0xFFu8; 0x03_0000];
        let texts: [&[u8]; 5] = [b"zero\0", b"one\0", b"two\0", b"three\0", b"four\0"];
        let mut next = STRINGS_AT + 10;
        for (i, t) in texts.iter().enumerate() {
            let at = STRINGS_AT + 2 * i;
            rom[at..at + 2].copy_from_slice(&((next & 0xFFFF) as u16).to_le_bytes());
            rom[next..next + t.len()].copy_from_slice(t);
            next += t.len();
        }

        let index = to_rom_ptr(STRINGS_AT) as u32;
        let i = index.to_le_bytes();
        let script = build_script(&[
            &[&[0xB8, i[0], i[1], i[2], 0xC1, 0x03, END], &[0xC2, 0x01, END]],
            &[&[0xBB, 0x04, 0xC1, 0x03, END]],
        ]);
        let block = StoredCodec.compress(&script.to_bytes()).unwrap();
        rom[SCRIPT_AT..SCRIPT_AT + block.len()].copy_from_slice(&block);
        rom
    }

    fn text_operands(script: &Script) -> BTreeSet<u32> {
        script
            .commands(0x40, script.len())
            .map(|item| item.unwrap().1)
            .filter(|cmd| STRING_OPCODES.contains(&cmd.opcode()))
            .filter_map(|cmd| cmd.arg(0))
            .collect()
    }

    #[test]
    fn loading_packs_string_indices() {
        let rom = rom_with_script();
        let script = Script::from_rom(&rom, SCRIPT_AT, &StoredCodec).unwrap();

        assert_eq!(script.string_index(), Some(to_rom_ptr(STRINGS_AT) as u32));
        assert_eq!(
            script.strings(),
            &[b"one\0".to_vec(), b"three\0".to_vec(), b"four\0".to_vec()]
        );
        assert!(script.strings_modified());
        assert_eq!(text_operands(&script), BTreeSet::from([0, 1, 2]));
        assert_eq!(script.command_at(0x44).unwrap().arg(0), Some(1));
        assert_eq!(script.command_at(0x47).unwrap().arg(0), Some(0));
    }

    #[test]
    fn object_strings_lists_what_one_object_shows() {
        let rom = rom_with_script();
        let script = Script::from_rom(&rom, SCRIPT_AT, &StoredCodec).unwrap();
        let strings = script.object_strings(1).unwrap();
        assert_eq!(strings, vec![(1, &b"three\0"[..]), (2, &b"four\0"[..])]);
    }

    #[test]
    fn strings_must_be_terminated() {
        assert_eq!(read_terminated(&[7, 8, 0, 9], 1).unwrap(), vec![8, 0]);
        assert!(matches!(
            read_terminated(&[1, 2, 3], 0),
            Err(ScriptError::UnterminatedString { addr: 0 })
        ));
        assert!(matches!(
            read_terminated(&[1, 2, 3], 4),
            Err(ScriptError::AddressOutOfRange { addr: 4, len: 3 })
        ));
    }

    #[test]
    fn table_layout_is_pointers_then_strings() {
        let mut script = build_script(&[&[&[END]]]);
        script.add_string(b"ab");
        script.add_string(b"c\0");
        let bytes = script.string_table_bytes(0x05_FF00).unwrap();
        assert_eq!(bytes, vec![0x04, 0xFF, 0x07, 0xFF, b'a', b'b', 0, b'c', 0]);

        assert!(script.string_table_bytes(0x05_FFFD).is_err());
    }

    #[test]
    fn adding_a_string_synthesises_the_index_command() {
        let mut script = build_script(&[&[&[0xC1, 0x00, END]]]);
        assert_eq!(script.string_index(), None);
        let i = script.add_string(b"hello");
        assert_eq!(i, 0);
        assert!(script.strings_modified());

        let mut space = ImageSpace::new(vec![0; 0x10_0000], vec![0x08_0000..0x08_1000]);
        let addr = script.write_strings(&mut space).unwrap();
        assert_eq!(addr, Some(0x08_0000));
        assert!(!script.strings_modified());
        assert_eq!(script.string_index(), Some(0xC8_0000));

        let first = script.command_at(0x20).unwrap();
        assert_eq!(first, Command::set_string_index(0xC8_0000).unwrap());
        assert_eq!(script.command_at(0x24).unwrap().opcode(), 0xC1);
        assert_eq!(&space.rom[0x08_0000..0x08_0008], &[0x02, 0x00, b'h', b'e', b'l', b'l', b'o', 0]);
        assert!(!space.is_free(0x08_0000));
        assert!(space.is_free(0x08_0008));
    }

    #[test]
    fn existing_index_command_is_overwritten() {
        let rom = rom_with_script();
        let mut script = Script::from_rom(&rom, SCRIPT_AT, &StoredCodec).unwrap();
        let len = script.len();
        script.set_string_index(0xC5_1234).unwrap();
        assert_eq!(script.len(), len);
        assert_eq!(script.command_at(0x40).unwrap().arg(0), Some(0xC5_1234));
    }

    #[test]
    fn scripts_without_strings_need_no_index() {
        let mut script = build_script(&[&[&[END]]]);
        let before = script.clone();
        script.set_string_index(0xC1_0000).unwrap();
        assert_eq!(script, before);
    }

    #[test]
    fn save_then_reload() {
        let rom = rom_with_script();
        let mut script = Script::from_rom(&rom, SCRIPT_AT, &StoredCodec).unwrap();
        script.set_string(2, b"FOUR").unwrap();
        assert!(matches!(
            script.set_string(3, b"x"),
            Err(ScriptError::StringOutOfRange { index: 3, count: 3 })
        ));

        let mut space = ImageSpace::new(rom, vec![0x02_8000..0x03_0000]);
        let saved = script.save(&StoredCodec, &mut space).unwrap();
        assert_eq!(saved.strings_addr, Some(0x02_8000));

        let reloaded = Script::from_rom(&space.rom, saved.script_addr, &StoredCodec).unwrap();
        assert_eq!(reloaded.strings(), script.strings());
        assert_eq!(reloaded.data(), script.data());
        assert!(!reloaded.strings_modified());
        assert_eq!(
            reloaded.string_block_usage(&space.rom).unwrap(),
            Some(StringBlockUsage::Exclusive {
                range: 0x02_8000..0x02_8000 + 6 + 4 + 6 + 5
            })
        );
    }

    #[test]
    fn shared_blocks_are_not_freed() {
        let rom = rom_with_script();
        let mut space = ImageSpace::new(rom.clone(), Vec::new());
        let usage = free_script(&rom, SCRIPT_AT, &StoredCodec, &mut space).unwrap();
        assert_eq!(
            usage,
            Some(StringBlockUsage::Shared {
                declared: 5,
                loaded: 3
            })
        );
        assert!(space.is_free(SCRIPT_AT));
        assert!(!space.is_free(STRINGS_AT));
    }
}
