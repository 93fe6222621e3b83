use std::ops::Range;

use crate::command::{decode, Command, Platform};
use crate::rom::{read_le, write_le};
use crate::{Result, ScriptError};

pub const MAX_OBJECTS: usize = 0x40;
pub const FUNCTIONS_PER_OBJECT: usize = 16;

// Bytes of pointer block per object.
pub(crate) const OBJECT_BLOCK_LEN: usize = 2 * FUNCTIONS_PER_OBJECT;

// Pointers are 16-bit offsets into the data buffer.
pub(crate) const MAX_DATA_LEN: usize = 0xFFFF;

/// An event script: a pointer block of 16 function offsets per object
/// followed by the command stream, plus the strings the script displays.
///
/// `data` excludes the leading object-count byte, so every pointer in the
/// block is a direct index into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub(crate) num_objects: usize,
    pub(crate) data: Vec<u8>,
    pub(crate) platform: Platform,
    pub(crate) strings: Vec<Vec<u8>>,
    pub(crate) string_index: Option<u32>,
    pub(crate) strings_modified: bool,
}

impl Script {
    /// Parses a decompressed script (`[N] ++ data`).
    pub fn from_bytes(bytes: &[u8], platform: Platform) -> Result<Script> {
        let (&count, data) = bytes
            .split_first()
            .ok_or_else(|| ScriptError::BadHeader("empty buffer".to_string()))?;
        let num_objects = count as usize;
        if !(1..=MAX_OBJECTS).contains(&num_objects) {
            return Err(ScriptError::BadHeader(format!(
                "object count {num_objects:#04X} outside 1..={MAX_OBJECTS:#04X}"
            )));
        }
        let block_len = OBJECT_BLOCK_LEN * num_objects;
        if data.len() < block_len {
            return Err(ScriptError::BadHeader(format!(
                "{} data bytes cannot hold a {block_len}-byte pointer block",
                data.len()
            )));
        }
        if data.len() > MAX_DATA_LEN {
            return Err(ScriptError::ScriptTooLarge { len: data.len() });
        }

        let script = Script {
            num_objects,
            data: data.to_vec(),
            platform,
            strings: Vec::new(),
            string_index: None,
            strings_modified: false,
        };
        for slot in 0..script.slot_count() {
            let ptr = script.ptr(slot);
            if ptr < block_len || ptr > script.data.len() {
                return Err(ScriptError::BadHeader(format!(
                    "object {} function {} points at {ptr:#06X}, outside [{block_len:#06X}, {:#06X}]",
                    slot / FUNCTIONS_PER_OBJECT,
                    slot % FUNCTIONS_PER_OBJECT,
                    script.data.len()
                )));
            }
        }
        Ok(script)
    }

    /// Serialises back to the buffer handed to the compressor.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() + 1);
        out.push(self.num_objects as u8);
        out.extend_from_slice(&self.data);
        out
    }

    pub fn num_objects(&self) -> usize {
        self.num_objects
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn strings(&self) -> &[Vec<u8>] {
        &self.strings
    }

    /// ROM address of the string pointer block recorded by the script, if any.
    pub fn string_index(&self) -> Option<u32> {
        self.string_index
    }

    pub fn strings_modified(&self) -> bool {
        self.strings_modified
    }

    /// Byte range holding commands: everything after the pointer block.
    pub fn command_area(&self) -> Range<usize> {
        self.pointer_block_len()..self.data.len()
    }

    pub fn object_start(&self, obj: usize) -> Result<usize> {
        self.check_object(obj)?;
        Ok(self.obj_start_at(obj))
    }

    /// Start of the next object, or the end of the data for the last one.
    pub fn object_end(&self, obj: usize) -> Result<usize> {
        self.check_object(obj)?;
        Ok(self.obj_end_at(obj))
    }

    pub fn function_start(&self, obj: usize, func: usize) -> Result<usize> {
        self.check_slot(obj, func)?;
        Ok(self.fn_start_at(obj, func))
    }

    /// The first later pointer anywhere in the block past this function's
    /// start, or the end of the data. Later slots pointing back at earlier
    /// code are links, not boundaries.
    pub fn function_end(&self, obj: usize, func: usize) -> Result<usize> {
        self.check_slot(obj, func)?;
        Ok(self.fn_end_at(obj, func))
    }

    pub fn is_function_linked(&self, obj: usize, func: usize) -> Result<bool> {
        self.check_slot(obj, func)?;
        Ok(self.is_linked_at(obj, func))
    }

    pub fn is_function_empty(&self, obj: usize, func: usize) -> Result<bool> {
        self.check_slot(obj, func)?;
        Ok(self.is_empty_at(obj, func))
    }

    pub fn is_function_real(&self, obj: usize, func: usize) -> Result<bool> {
        self.check_slot(obj, func)?;
        Ok(self.is_real_at(obj, func))
    }

    /// Start of the first real function after `func` in the same object,
    /// falling back to the object's end.
    pub fn next_real_function_start(&self, obj: usize, func: usize) -> Result<usize> {
        self.check_slot(obj, func)?;
        Ok(self.next_real_start_at(obj, func))
    }

    /// Decodes commands starting at `start` until `end` is reached.
    pub fn commands(&self, start: usize, end: usize) -> CommandIter<'_> {
        CommandIter {
            data: &self.data,
            pos: start,
            end: end.min(self.data.len()),
            platform: self.platform,
            failed: false,
        }
    }

    pub fn command_at(&self, pos: usize) -> Result<Command> {
        let (cmd, _) = decode(&self.data, pos, self.platform)?;
        Ok(cmd)
    }

    pub fn function_commands(&self, obj: usize, func: usize) -> Result<Vec<Command>> {
        let start = self.function_start(obj, func)?;
        let end = self.function_end(obj, func)?;
        self.commands(start, end)
            .map(|item| item.map(|(_, cmd)| cmd))
            .collect()
    }

    pub fn function_bytes(&self, obj: usize, func: usize) -> Result<&[u8]> {
        let start = self.function_start(obj, func)?;
        let end = self.function_end(obj, func)?;
        Ok(&self.data[start..end])
    }

    pub(crate) fn check_object(&self, obj: usize) -> Result<()> {
        if obj >= self.num_objects {
            return Err(ScriptError::ObjectOutOfRange {
                obj,
                count: self.num_objects,
            });
        }
        Ok(())
    }

    pub(crate) fn check_slot(&self, obj: usize, func: usize) -> Result<()> {
        self.check_object(obj)?;
        if func >= FUNCTIONS_PER_OBJECT {
            return Err(ScriptError::FunctionOutOfRange { func });
        }
        Ok(())
    }

    pub(crate) fn pointer_block_len(&self) -> usize {
        OBJECT_BLOCK_LEN * self.num_objects
    }

    pub(crate) fn slot_count(&self) -> usize {
        FUNCTIONS_PER_OBJECT * self.num_objects
    }

    pub(crate) fn ptr(&self, slot: usize) -> usize {
        read_le(&self.data[2 * slot..2 * slot + 2]) as usize
    }

    pub(crate) fn set_ptr(&mut self, slot: usize, value: usize) -> Result<()> {
        if value > MAX_DATA_LEN {
            return Err(ScriptError::ScriptTooLarge { len: value });
        }
        write_le(&mut self.data[2 * slot..2 * slot + 2], value as u32);
        Ok(())
    }

    // Unchecked forms of the public queries; callers validate indices.

    pub(crate) fn obj_start_at(&self, obj: usize) -> usize {
        self.ptr(obj * FUNCTIONS_PER_OBJECT)
    }

    pub(crate) fn obj_end_at(&self, obj: usize) -> usize {
        if obj + 1 >= self.num_objects {
            self.data.len()
        } else {
            self.obj_start_at(obj + 1)
        }
    }

    pub(crate) fn fn_start_at(&self, obj: usize, func: usize) -> usize {
        self.ptr(obj * FUNCTIONS_PER_OBJECT + func)
    }

    pub(crate) fn fn_end_at(&self, obj: usize, func: usize) -> usize {
        let slot = obj * FUNCTIONS_PER_OBJECT + func;
        let start = self.ptr(slot);
        (slot + 1..self.slot_count())
            .map(|s| self.ptr(s))
            .find(|&p| p > start)
            .unwrap_or(self.data.len())
    }

    pub(crate) fn is_linked_at(&self, obj: usize, func: usize) -> bool {
        let start = self.fn_start_at(obj, func);
        !(self.obj_start_at(obj)..self.obj_end_at(obj)).contains(&start)
    }

    pub(crate) fn is_empty_at(&self, obj: usize, func: usize) -> bool {
        let start = self.fn_start_at(obj, func);
        (0..func).any(|f| self.fn_start_at(obj, f) == start)
    }

    pub(crate) fn is_real_at(&self, obj: usize, func: usize) -> bool {
        !(self.is_empty_at(obj, func) || self.is_linked_at(obj, func))
    }

    pub(crate) fn next_real_start_at(&self, obj: usize, func: usize) -> usize {
        (func + 1..FUNCTIONS_PER_OBJECT)
            .find(|&f| self.is_real_at(obj, f))
            .map(|f| self.fn_start_at(obj, f))
            .unwrap_or_else(|| self.obj_end_at(obj))
    }
}

/// Walks decoded commands over a byte range, yielding each with its
/// position. Stops after the first decode error.
pub struct CommandIter<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
    platform: Platform,
    failed: bool,
}

impl Iterator for CommandIter<'_> {
    type Item = Result<(usize, Command)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.end {
            return None;
        }
        match decode(self.data, self.pos, self.platform) {
            Ok((cmd, len)) => {
                let at = self.pos;
                self.pos += len;
                Some(Ok((at, cmd)))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_script;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_is_validated() {
        assert!(matches!(
            Script::from_bytes(&[], Platform::Snes),
            Err(ScriptError::BadHeader(_))
        ));
        assert!(matches!(
            Script::from_bytes(&[0], Platform::Snes),
            Err(ScriptError::BadHeader(_))
        ));
        assert!(matches!(
            Script::from_bytes(&[0x41], Platform::Snes),
            Err(ScriptError::BadHeader(_))
        ));
        // One object but only four data bytes.
        assert!(matches!(
            Script::from_bytes(&[1, 0x20, 0, 0x20, 0], Platform::Snes),
            Err(ScriptError::BadHeader(_))
        ));

        let mut bytes = vec![1u8];
        for _ in 0..16 {
            bytes.extend_from_slice(&[0x40, 0x00]);
        }
        bytes.push(0x00);
        assert!(matches!(
            Script::from_bytes(&bytes, Platform::Snes),
            Err(ScriptError::BadHeader(_))
        ));
    }

    #[test]
    fn bytes_round_trip() {
        let script = build_script(&[&[&[0x10, 0x01, 0x00], &[0x00]], &[&[0x00]]]);
        let again = Script::from_bytes(&script.to_bytes(), Platform::Snes).unwrap();
        assert_eq!(again, script);
        assert_eq!(script.to_bytes()[0], 2);
        assert_eq!(script.to_bytes().len(), script.len() + 1);
    }

    #[test]
    fn addressing_queries() {
        let script = build_script(&[&[&[0x10, 0x01, 0x00], &[0x00]], &[&[0x00]]]);
        // Block is 64 bytes; obj0 fn0 at 0x40, fn1 at 0x43, obj1 at 0x44.
        assert_eq!(script.object_start(0).unwrap(), 0x40);
        assert_eq!(script.object_end(0).unwrap(), 0x44);
        assert_eq!(script.object_start(1).unwrap(), 0x44);
        assert_eq!(script.object_end(1).unwrap(), 0x45);

        assert_eq!(script.function_start(0, 1).unwrap(), 0x43);
        assert_eq!(script.function_end(0, 0).unwrap(), 0x43);
        // Slots 2..15 alias fn1, so its end is object 1's start.
        assert_eq!(script.function_end(0, 1).unwrap(), 0x44);
        assert_eq!(script.function_end(1, 0).unwrap(), 0x45);

        assert!(script.is_function_real(0, 0).unwrap());
        assert!(script.is_function_real(0, 1).unwrap());
        assert!(script.is_function_empty(0, 2).unwrap());
        assert!(!script.is_function_linked(0, 2).unwrap());
        assert!(!script.is_function_real(0, 15).unwrap());

        assert_eq!(script.next_real_function_start(0, 0).unwrap(), 0x43);
        assert_eq!(script.next_real_function_start(0, 1).unwrap(), 0x44);
        assert_eq!(script.next_real_function_start(1, 0).unwrap(), 0x45);
    }

    #[test]
    fn linked_functions_point_outside_their_object() {
        let mut script = build_script(&[&[&[0x00]], &[&[0x00]]]);
        // obj1 fn3 borrows obj0 fn0.
        let obj0 = script.object_start(0).unwrap();
        script.set_ptr(FUNCTIONS_PER_OBJECT + 3, obj0).unwrap();
        assert!(script.is_function_linked(1, 3).unwrap());
        assert!(!script.is_function_real(1, 3).unwrap());
        assert!(!script.is_function_empty(1, 3).unwrap());
    }

    #[test]
    fn backward_links_do_not_end_later_functions() {
        // obj1: fn0 at 0x42, fn1 at 0x43, fn2 borrows obj0 fn0 at 0x40.
        let mut script = build_script(&[&[&[0x00, 0x00]], &[&[0xB2], &[0xB2]]]);
        script.set_ptr(FUNCTIONS_PER_OBJECT + 2, 0x40).unwrap();
        assert!(script.is_function_linked(1, 2).unwrap());

        // The lower pointer in slot 2 is skipped; fn1 runs to the data end.
        assert_eq!(script.function_end(1, 1).unwrap(), 0x44);
        assert_eq!(script.function_bytes(1, 1).unwrap(), &[0xB2]);
        // The linked slot ends at the next higher pointer.
        assert_eq!(script.function_start(1, 2).unwrap(), 0x40);
        assert_eq!(script.function_end(1, 2).unwrap(), 0x43);
    }

    #[test]
    fn out_of_range_indices_are_errors() {
        let script = build_script(&[&[&[0x00]]]);
        assert!(matches!(
            script.object_start(1),
            Err(ScriptError::ObjectOutOfRange { obj: 1, count: 1 })
        ));
        assert!(matches!(
            script.function_start(0, 16),
            Err(ScriptError::FunctionOutOfRange { func: 16 })
        ));
    }

    #[test]
    fn commands_iterate_a_function() {
        let script = build_script(&[&[&[0x10, 0x01, 0x00], &[0x00]]]);
        let cmds = script.function_commands(0, 0).unwrap();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0].opcode(), 0x10);
        assert_eq!(cmds[0].jump_distance(), Some(1));
        assert_eq!(cmds[1].opcode(), 0x00);

        let positions: Vec<usize> = script
            .commands(0x20, script.len())
            .map(|item| item.unwrap().0)
            .collect();
        assert_eq!(positions, vec![0x20, 0x22, 0x23]);
        assert_eq!(script.function_bytes(0, 1).unwrap(), &[0x00]);
    }

    #[test]
    fn iteration_stops_after_a_decode_error() {
        // 0x4B wants four operand bytes; only one follows.
        let script = build_script(&[&[&[0x00, 0x4B, 0x01]]]);
        let items: Vec<_> = script.commands(0x20, script.len()).collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(ScriptError::Decode(_))));
    }
}
