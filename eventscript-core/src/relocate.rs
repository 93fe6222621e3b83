// Edits that move bytes around inside a script. Every pointer in the block
// and every jump distance in the command stream is patched so the script
// stays self-consistent.
//
// Primitives plan their patches before touching the buffer. Compound edits
// run on a staged copy that replaces `self` only once every step succeeded.

use log::{debug, warn};

use crate::catalog::OBJECT_OPCODES;
use crate::command::{decode, Command};
use crate::rom::write_le;
use crate::script::{Script, FUNCTIONS_PER_OBJECT, MAX_DATA_LEN, MAX_OBJECTS, OBJECT_BLOCK_LEN};
use crate::{Result, ScriptError};

struct OperandEdit {
    pos: usize,
    width: usize,
    value: u32,
}

// `value + delta` as a buffer offset, or an overflow at `pos`.
fn offset_by(value: usize, delta: isize, pos: usize) -> Result<usize> {
    let moved = value as i64 + delta as i64;
    if !(0..=MAX_DATA_LEN as i64).contains(&moved) {
        return Err(ScriptError::OperandOverflow { pos, value: moved });
    }
    Ok(moved as usize)
}

impl Script {
    /// Adds `delta` to every jump whose span `[min(pos, target), max(pos, target)]`
    /// covers the edited interval `[before, after)`.
    pub fn shift_jumps(&mut self, before: usize, after: usize, delta: isize) -> Result<()> {
        let edits = self.plan_jump_shift(before, after, delta)?;
        self.apply_operand_edits(&edits);
        Ok(())
    }

    /// Adds `delta` to every function pointer strictly above `threshold`.
    pub fn shift_starts(&mut self, threshold: isize, delta: isize) -> Result<()> {
        let edits = self.plan_start_shift(threshold, delta)?;
        self.apply_pointer_edits(&edits);
        Ok(())
    }

    fn plan_jump_shift(&self, before: usize, after: usize, delta: isize) -> Result<Vec<OperandEdit>> {
        let mut edits = Vec::new();
        for item in self.commands(self.obj_start_at(0), self.data.len()) {
            let (pos, cmd) = item?;
            let (Some(dist), Some(&width)) = (cmd.jump_distance(), cmd.arg_lens().last()) else {
                continue;
            };
            let target = cmd.jump_target(pos).unwrap_or(0);
            let (lo, hi) = (pos.min(target), pos.max(target));
            if hi < after || lo >= before {
                continue;
            }
            let at = pos + cmd.len() - width;
            let moved = dist as i64 + delta as i64;
            if moved < 0 || moved >> (8 * width) != 0 {
                return Err(ScriptError::OperandOverflow { pos: at, value: moved });
            }
            edits.push(OperandEdit {
                pos: at,
                width,
                value: moved as u32,
            });
        }
        Ok(edits)
    }

    // High slots first.
    fn plan_start_shift(&self, threshold: isize, delta: isize) -> Result<Vec<(usize, usize)>> {
        let mut edits = Vec::new();
        for slot in (0..self.slot_count()).rev() {
            let ptr = self.ptr(slot);
            if ptr as isize > threshold {
                edits.push((slot, offset_by(ptr, delta, 2 * slot)?));
            }
        }
        Ok(edits)
    }

    fn apply_operand_edits(&mut self, edits: &[OperandEdit]) {
        for edit in edits {
            write_le(&mut self.data[edit.pos..edit.pos + edit.width], edit.value);
        }
    }

    fn apply_pointer_edits(&mut self, edits: &[(usize, usize)]) {
        for &(slot, value) in edits {
            write_le(&mut self.data[2 * slot..2 * slot + 2], value as u32);
        }
    }

    fn validate_commands(&self, bytes: &[u8]) -> Result<()> {
        let mut pos = 0;
        while pos < bytes.len() {
            let (_, len) = decode(bytes, pos, self.platform)?;
            pos += len;
        }
        Ok(())
    }

    fn check_command_pos(&self, pos: usize) -> Result<()> {
        let area = self.command_area();
        if pos < area.start || pos > area.end {
            return Err(ScriptError::PositionOutOfRange {
                pos,
                start: area.start,
                len: area.end,
            });
        }
        Ok(())
    }

    /// Inserts encoded commands at `pos`. Code already at `pos` moves up
    /// with the insertion; a function starting at `pos` now starts with the
    /// new bytes.
    pub fn insert_commands(&mut self, bytes: &[u8], pos: usize) -> Result<()> {
        self.check_command_pos(pos)?;
        self.validate_commands(bytes)?;
        if bytes.is_empty() {
            return Ok(());
        }
        let new_len = self.data.len() + bytes.len();
        if new_len > MAX_DATA_LEN {
            return Err(ScriptError::ScriptTooLarge { len: new_len });
        }

        let delta = bytes.len() as isize;
        let jumps = self.plan_jump_shift(pos, pos, delta)?;
        let starts = self.plan_start_shift(pos as isize, delta)?;
        self.apply_operand_edits(&jumps);
        self.apply_pointer_edits(&starts);
        self.data.splice(pos..pos, bytes.iter().copied());
        Ok(())
    }

    pub fn insert_command(&mut self, cmd: &Command, pos: usize) -> Result<()> {
        self.insert_commands(&cmd.encode(), pos)
    }

    /// Deletes `count` whole commands starting at `pos`.
    pub fn delete_commands(&mut self, pos: usize, count: usize) -> Result<()> {
        self.check_command_pos(pos)?;
        let mut end = pos;
        for _ in 0..count {
            if end >= self.data.len() {
                return Err(ScriptError::DeletePastEnd {
                    pos: end,
                    len: self.data.len(),
                });
            }
            let (_, len) = decode(&self.data, end, self.platform)?;
            end += len;
        }
        self.delete_span(pos, end)
    }

    /// Deletes whole commands from `start` until at least `end - start`
    /// bytes are gone.
    pub fn delete_commands_range(&mut self, start: usize, end: usize) -> Result<()> {
        self.check_command_pos(start)?;
        let mut cur = start;
        while cur < end {
            if cur >= self.data.len() {
                return Err(ScriptError::DeletePastEnd {
                    pos: cur,
                    len: self.data.len(),
                });
            }
            let (_, len) = decode(&self.data, cur, self.platform)?;
            cur += len;
        }
        if cur > end {
            warn!("deleting {start:#06X}..{end:#06X} overshot to {cur:#06X}");
        }
        self.delete_span(start, cur)
    }

    /// Deletes `count` commands starting `offset` bytes into a function.
    /// The function must own its bytes and the deletion must stay inside it.
    pub fn delete_function_commands(
        &mut self,
        obj: usize,
        func: usize,
        offset: usize,
        count: usize,
    ) -> Result<()> {
        self.check_slot(obj, func)?;
        if !self.is_real_at(obj, func) {
            return Err(ScriptError::FunctionNotOwned { obj, func });
        }
        let fn_end = self.next_real_start_at(obj, func);
        let pos = self.fn_start_at(obj, func) + offset;
        let mut end = pos;
        for _ in 0..count {
            if end >= fn_end {
                return Err(ScriptError::CrossesFunctionEnd {
                    obj,
                    func,
                    pos,
                    len: end - pos,
                });
            }
            let (_, len) = decode(&self.data, end, self.platform)?;
            end += len;
        }
        if end > fn_end {
            return Err(ScriptError::CrossesFunctionEnd {
                obj,
                func,
                pos,
                len: end - pos,
            });
        }
        self.delete_span(pos, end)
    }

    fn delete_span(&mut self, start: usize, end: usize) -> Result<()> {
        if start == end {
            return Ok(());
        }
        let delta = start as isize - end as isize;
        let jumps = self.plan_jump_shift(start, end, delta)?;
        let starts = self.plan_start_shift(start as isize, delta)?;
        self.apply_operand_edits(&jumps);
        self.apply_pointer_edits(&starts);
        self.data.drain(start..end);
        Ok(())
    }

    /// First command in `[start, end)` whose opcode is one of `opcodes`.
    pub fn find_command(
        &self,
        opcodes: &[u8],
        start: usize,
        end: usize,
    ) -> Result<Option<(usize, Command)>> {
        for item in self.commands(start, end) {
            let (pos, cmd) = item?;
            if opcodes.contains(&cmd.opcode()) {
                return Ok(Some((pos, cmd)));
            }
        }
        Ok(None)
    }

    /// Position of the first command equal to `cmd`. Jumps match on every
    /// operand but the distance.
    pub fn find_exact_command(&self, cmd: &Command, start: usize, end: usize) -> Result<Option<usize>> {
        for item in self.commands(start, end) {
            let (pos, found) = item?;
            if cmd.matches_ignoring_jump(&found) {
                return Ok(Some(pos));
            }
        }
        Ok(None)
    }

    /// Replaces every exact match of `from` in `[start, end)` with `to` and
    /// returns how many were replaced.
    pub fn replace_command(&mut self, from: &Command, to: &Command, start: usize, end: usize) -> Result<usize> {
        let new = to.encode();
        self.validate_commands(&new)?;

        let mut staged = self.clone();
        let mut cursor = start;
        let mut end = end;
        let mut count = 0;
        while let Some(pos) = staged.find_exact_command(from, cursor, end)? {
            let old_len = staged.command_at(pos)?.len();
            staged.insert_commands(&new, pos)?;
            staged.delete_commands(pos + new.len(), 1)?;
            // The delete may have moved a new jump's distance.
            staged.data[pos..pos + new.len()].copy_from_slice(&new);
            cursor = pos + new.len();
            end = (end + new.len()).saturating_sub(old_len);
            count += 1;
        }
        *self = staged;
        Ok(count)
    }

    /// Deletes the first command in a function whose opcode is in `opcodes`,
    /// returning where it was.
    pub fn delete_command_from_function(
        &mut self,
        opcodes: &[u8],
        obj: usize,
        func: usize,
    ) -> Result<Option<usize>> {
        let start = self.function_start(obj, func)?;
        let end = self.function_end(obj, func)?;
        match self.find_command(opcodes, start, end)? {
            Some((pos, _)) => {
                self.delete_commands(pos, 1)?;
                Ok(Some(pos))
            }
            None => Ok(None),
        }
    }

    /// Replaces the body of a function. Empty slots that aliased the old
    /// body keep aliasing the new one.
    pub fn set_function(&mut self, obj: usize, func: usize, body: &[u8]) -> Result<()> {
        self.check_slot(obj, func)?;
        self.validate_commands(body)?;
        let mut staged = self.clone();
        staged.rewrite_function(obj, func, body)?;
        *self = staged;
        Ok(())
    }

    pub fn set_function_commands(&mut self, obj: usize, func: usize, cmds: &[Command]) -> Result<()> {
        let body: Vec<u8> = cmds.iter().flat_map(Command::encode).collect();
        self.set_function(obj, func, &body)
    }

    fn rewrite_function(&mut self, obj: usize, func: usize, body: &[u8]) -> Result<()> {
        let true_start = (0..func)
            .rev()
            .find(|&f| self.is_real_at(obj, f))
            .map(|f| self.next_real_start_at(obj, f))
            .unwrap_or_else(|| self.obj_start_at(obj));
        let true_end = self.next_real_start_at(obj, func);
        if true_end < true_start {
            return Err(ScriptError::BadHeader(format!(
                "function {func} of object {obj} ends at {true_end:#06X} before it starts at {true_start:#06X}"
            )));
        }
        let old_len = true_end - true_start;
        let new_len = self.data.len() - old_len + body.len();
        if new_len > MAX_DATA_LEN {
            return Err(ScriptError::ScriptTooLarge { len: new_len });
        }
        let shift = body.len() as isize - old_len as isize;

        // A linked slot resting on true_start sits at the next object's start,
        // unless that is the end of the data, where it aliases the new body.
        let data_len = self.data.len();
        let linked_moves = |p: usize| p > true_start || (p == true_start && p != data_len);

        let empty_end = (func + 1..FUNCTIONS_PER_OBJECT)
            .find(|&f| self.is_real_at(obj, f))
            .unwrap_or(FUNCTIONS_PER_OBJECT);
        let linked: Vec<bool> = (0..FUNCTIONS_PER_OBJECT)
            .map(|f| self.is_linked_at(obj, f))
            .collect();

        let mut edits = Vec::new();
        for slot in 0..self.slot_count() {
            let p = self.ptr(slot);
            let (o, f) = (slot / FUNCTIONS_PER_OBJECT, slot % FUNCTIONS_PER_OBJECT);
            let value = if o != obj {
                (p >= true_start).then_some(p)
            } else if f == func {
                edits.push((slot, true_start));
                continue;
            } else if linked[f] {
                linked_moves(p).then_some(p)
            } else if f < func {
                None
            } else if f < empty_end {
                edits.push((slot, true_start));
                continue;
            } else {
                (p >= true_start).then_some(p)
            };
            if let Some(p) = value {
                edits.push((slot, offset_by(p, shift, 2 * slot)?));
            }
        }

        self.apply_pointer_edits(&edits);
        self.data.splice(true_start..true_end, body.iter().copied());
        Ok(())
    }

    /// Adds `2 * delta` to the object operand of every object-referencing
    /// command naming object `first` or later.
    pub fn shift_object_calls(&mut self, first: usize, delta: isize) -> Result<()> {
        let first = 2 * first as u32;
        let mut edits = Vec::new();
        for item in self.commands(self.obj_start_at(0), self.data.len()) {
            let (pos, cmd) = item?;
            if !OBJECT_OPCODES.contains(&cmd.opcode()) {
                continue;
            }
            let (Some(value), Some(&width)) = (cmd.arg(0), cmd.arg_lens().first()) else {
                continue;
            };
            if value < first {
                continue;
            }
            let moved = value as i64 + 2 * delta as i64;
            if moved < 0 || moved >> (8 * width) != 0 {
                return Err(ScriptError::OperandOverflow { pos: pos + 1, value: moved });
            }
            edits.push(OperandEdit {
                pos: pos + 1,
                width,
                value: moved as u32,
            });
        }
        self.apply_operand_edits(&edits);
        Ok(())
    }

    // Deletes every object-referencing command that names `obj`.
    fn delete_object_references(&mut self, obj: usize) -> Result<usize> {
        let target = 2 * obj as u32;
        let mut pos = self.obj_start_at(0);
        let mut removed = 0;
        while let Some((at, cmd)) = self.find_command(&OBJECT_OPCODES, pos, self.data.len())? {
            if cmd.arg(0) == Some(target) {
                self.delete_commands(at, 1)?;
                removed += 1;
                pos = at;
            } else {
                pos = at + cmd.len();
            }
        }
        Ok(removed)
    }

    /// Removes an object with its code. Commands naming it are deleted and
    /// references to later objects are renumbered.
    pub fn remove_object(&mut self, obj: usize) -> Result<()> {
        self.check_object(obj)?;
        if self.num_objects == 1 {
            return Err(ScriptError::LastObject);
        }

        let mut staged = self.clone();
        let dropped = staged.delete_object_references(obj)?;
        staged.shift_object_calls(obj + 1, -1)?;

        let start = staged.obj_start_at(obj);
        let end = staged.obj_end_at(obj);
        let delta = start as isize - end as isize;
        staged.shift_jumps(start, end, delta)?;
        staged.data.drain(start..end);

        let block = OBJECT_BLOCK_LEN * obj;
        staged.data.drain(block..block + OBJECT_BLOCK_LEN);
        staged.num_objects -= 1;
        staged.shift_starts(start as isize, delta)?;
        staged.shift_starts(-1, -(OBJECT_BLOCK_LEN as isize))?;

        debug!(
            "removed object {obj:#04X}: {} code bytes, {dropped} referencing commands",
            end - start
        );
        *self = staged;
        Ok(())
    }

    /// Inserts a copy of object `src` so that it becomes object `dest`.
    /// Objects from `dest` on move up one and references to them follow.
    pub fn insert_copy_object(&mut self, src: usize, dest: usize) -> Result<()> {
        self.check_object(src)?;
        if dest > self.num_objects {
            return Err(ScriptError::ObjectOutOfRange {
                obj: dest,
                count: self.num_objects,
            });
        }
        if self.num_objects >= MAX_OBJECTS {
            return Err(ScriptError::TooManyObjects { max: MAX_OBJECTS });
        }

        let copy_start = self.obj_start_at(src);
        let copy_end = self.obj_end_at(src);
        let body = self.data[copy_start..copy_end].to_vec();
        let grow = body.len();
        let new_len = self.data.len() + grow + OBJECT_BLOCK_LEN;
        if new_len > MAX_DATA_LEN {
            return Err(ScriptError::ScriptTooLarge { len: new_len });
        }
        let insert_at = if dest < self.num_objects {
            self.obj_start_at(dest)
        } else {
            self.data.len()
        };

        // Own code moves with the copy; linked slots keep their target.
        let pointers: Vec<usize> = (0..FUNCTIONS_PER_OBJECT)
            .map(|f| {
                let p = self.fn_start_at(src, f);
                if !self.is_linked_at(src, f) {
                    insert_at + p - copy_start
                } else if p >= insert_at {
                    p + grow
                } else {
                    p
                }
            })
            .collect();

        let mut staged = self.clone();
        staged.shift_jumps(insert_at, insert_at, grow as isize)?;
        staged.shift_starts(insert_at as isize - 1, grow as isize)?;
        staged.data.splice(insert_at..insert_at, body);

        let block_at = OBJECT_BLOCK_LEN * dest;
        let block: Vec<u8> = pointers
            .iter()
            .flat_map(|&p| (p as u16).to_le_bytes())
            .collect();
        staged.data.splice(block_at..block_at, block);
        staged.num_objects += 1;
        staged.shift_starts(-1, OBJECT_BLOCK_LEN as isize)?;
        staged.shift_object_calls(dest, 1)?;

        debug!("copied object {src:#04X} to {dest:#04X} ({grow} code bytes)");
        *self = staged;
        Ok(())
    }

    /// Adds an object with no code; every slot points at the end of the data.
    pub fn append_empty_object(&mut self) -> Result<usize> {
        if self.num_objects >= MAX_OBJECTS {
            return Err(ScriptError::TooManyObjects { max: MAX_OBJECTS });
        }
        let new_len = self.data.len() + OBJECT_BLOCK_LEN;
        if new_len > MAX_DATA_LEN {
            return Err(ScriptError::ScriptTooLarge { len: new_len });
        }

        let starts = self.plan_start_shift(-1, OBJECT_BLOCK_LEN as isize)?;
        self.apply_pointer_edits(&starts);
        let block_at = self.pointer_block_len();
        let block: Vec<u8> = (0..FUNCTIONS_PER_OBJECT)
            .flat_map(|_| (new_len as u16).to_le_bytes())
            .collect();
        self.data.splice(block_at..block_at, block);
        self.num_objects += 1;
        Ok(self.num_objects - 1)
    }

    /// Appends a copy of object `obj` as a new last object.
    pub fn append_copy_object(&mut self, obj: usize) -> Result<usize> {
        self.check_object(obj)?;
        if self.num_objects >= MAX_OBJECTS {
            return Err(ScriptError::TooManyObjects { max: MAX_OBJECTS });
        }
        let start = self.obj_start_at(obj);
        let end = self.obj_end_at(obj);
        let old_len = self.data.len();
        let new_len = old_len + OBJECT_BLOCK_LEN + (end - start);
        if new_len > MAX_DATA_LEN {
            return Err(ScriptError::ScriptTooLarge { len: new_len });
        }

        let block: Vec<u8> = (0..FUNCTIONS_PER_OBJECT)
            .flat_map(|f| {
                let p = self.fn_start_at(obj, f);
                let moved = if self.is_linked_at(obj, f) {
                    p + OBJECT_BLOCK_LEN
                } else {
                    p - start + old_len + OBJECT_BLOCK_LEN
                };
                (moved as u16).to_le_bytes()
            })
            .collect();
        let body = self.data[start..end].to_vec();

        let starts = self.plan_start_shift(-1, OBJECT_BLOCK_LEN as isize)?;
        self.apply_pointer_edits(&starts);
        let block_at = self.pointer_block_len();
        self.data.splice(block_at..block_at, block);
        self.data.extend_from_slice(&body);
        self.num_objects += 1;
        Ok(self.num_objects - 1)
    }
}
