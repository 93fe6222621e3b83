// Named constructors, one per command meaning. Each validates its inputs
// and picks the opcode variant that addresses the requested memory range.

use crate::command::{Command, Operand};
use crate::{Result, ScriptError};

const SCRIPT_MEM: std::ops::Range<u32> = 0x7F_0200..0x7F_0400;
const LOCAL_MEM: std::ops::Range<u32> = 0x7F_0000..0x7F_0200;
const BANK_7E: std::ops::Range<u32> = 0x7E_0000..0x7F_0000;
const BANK_7F: std::ops::Range<u32> = 0x7F_0000..0x80_0000;
const RAM: std::ops::Range<u32> = 0x7E_0000..0x80_0000;

// Assignable outside RAM: the menu-disable and pause-disable flags.
const MENU_PAUSE_FLAGS: [u32; 2] = [0x110, 0x111];

/// How the caller waits on a called object function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncSync {
    /// Returns immediately.
    Cont,
    /// Waits for the call to start.
    Sync,
    /// Waits for the call to finish.
    Halt,
}

/// Comparison selector used by the memory `if` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Equals = 0,
    NotEquals = 1,
    GreaterThan = 2,
    LessThan = 3,
    GreaterOrEqual = 4,
    LessOrEqual = 5,
    BitwiseAndNonzero = 6,
    BitwiseOrNonzero = 7,
}

/// Placement of a decision box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxPosition {
    Auto,
    Top,
    Bottom,
}

fn invalid(msg: String) -> ScriptError {
    ScriptError::InvalidArgument(msg)
}

fn ensure(cond: bool, msg: impl FnOnce() -> String) -> Result<()> {
    if cond {
        Ok(())
    } else {
        Err(invalid(msg()))
    }
}

/// Script memory is addressed in words from 0x7F0200.
fn script_offset(addr: u32) -> Result<u32> {
    ensure(SCRIPT_MEM.contains(&addr), || {
        format!("{addr:#08X} is not script memory")
    })?;
    ensure(addr % 2 == 0, || format!("script memory address {addr:#08X} must be even"))?;
    Ok((addr - SCRIPT_MEM.start) / 2)
}

fn object_byte(obj: usize) -> Result<u32> {
    ensure(obj < crate::MAX_OBJECTS, || format!("object {obj} out of range"))?;
    Ok(2 * obj as u32)
}

fn call_byte(func: u8, priority: u8) -> Result<u32> {
    ensure(func < 16, || format!("function {func} out of range (0-15)"))?;
    ensure(priority < 16, || format!("priority {priority} out of range (0-15)"))?;
    Ok(((priority as u32) << 4) | func as u32)
}

fn width_ok(num_bytes: usize) -> Result<()> {
    ensure(num_bytes == 1 || num_bytes == 2, || {
        format!("byte width {num_bytes} must be 1 or 2")
    })
}

impl Command {
    pub fn return_cmd() -> Command {
        Command::zero(0x00)
    }

    pub fn break_cmd() -> Command {
        Command::zero(0xB1)
    }

    pub fn end_cmd() -> Command {
        Command::zero(0xB2)
    }

    pub fn party_follow() -> Command {
        Command::zero(0xDA)
    }

    fn zero(opcode: u8) -> Command {
        Command::bare(opcode)
    }

    pub fn jump_forward(distance: u32) -> Result<Command> {
        Command::generic(0x10, &[distance])
    }

    pub fn jump_back(distance: u32) -> Result<Command> {
        Command::generic(0x11, &[distance])
    }

    pub fn call_obj_function(obj: usize, func: u8, priority: u8, sync: FuncSync) -> Result<Command> {
        let opcode = match sync {
            FuncSync::Cont => 0x02,
            FuncSync::Sync => 0x03,
            FuncSync::Halt => 0x04,
        };
        Command::generic(opcode, &[object_byte(obj)?, call_byte(func, priority)?])
    }

    pub fn call_pc_function(pc: u8, func: u8, priority: u8, sync: FuncSync) -> Result<Command> {
        ensure(pc < 7, || format!("pc {pc} out of range (0-6)"))?;
        let opcode = match sync {
            FuncSync::Cont => 0x05,
            FuncSync::Sync => 0x06,
            FuncSync::Halt => 0x07,
        };
        Command::generic(opcode, &[2 * pc as u32, call_byte(func, priority)?])
    }

    pub fn set_object_drawing_status(obj: usize, drawn: bool) -> Result<Command> {
        let opcode = if drawn { 0x7C } else { 0x7D };
        Command::generic(opcode, &[object_byte(obj)?])
    }

    pub fn remove_object(obj: usize) -> Result<Command> {
        Command::generic(0x0A, &[object_byte(obj)?])
    }

    /// Points the script's strings at a ROM-absolute pointer block.
    pub fn set_string_index(rom_ptr: u32) -> Result<Command> {
        Command::generic(0xB8, &[rom_ptr])
    }

    pub fn personal_textbox(string: u32) -> Result<Command> {
        Command::generic(0xBB, &[string])
    }

    pub fn textbox_top(string: u32) -> Result<Command> {
        Command::generic(0xC1, &[string])
    }

    pub fn textbox_bottom(string: u32) -> Result<Command> {
        Command::generic(0xC2, &[string])
    }

    pub fn decision_box(string: u32, first_line: u8, last_line: u8, pos: BoxPosition) -> Result<Command> {
        ensure(first_line < 4 && last_line < 4, || {
            format!("decision lines {first_line}..{last_line} must be in 0-3")
        })?;
        let opcode = match pos {
            BoxPosition::Auto => 0xC0,
            BoxPosition::Top => 0xC3,
            BoxPosition::Bottom => 0xC4,
        };
        let lines = ((first_line as u32) << 2) | last_line as u32;
        Command::generic(opcode, &[string, lines])
    }

    pub fn set_bit(addr: u32, bit: u8) -> Result<Command> {
        Command::set_reset_bit(addr, bit, true)
    }

    pub fn reset_bit(addr: u32, bit: u8) -> Result<Command> {
        Command::set_reset_bit(addr, bit, false)
    }

    /// `bit` is a single-bit mask. Local memory reaches its upper page by
    /// setting 0x80 in the bit operand.
    pub fn set_reset_bit(addr: u32, bit: u8, set: bool) -> Result<Command> {
        ensure(bit.is_power_of_two(), || format!("bit mask {bit:#04X} must have one bit set"))?;
        let bit_num = bit.trailing_zeros();

        if LOCAL_MEM.contains(&addr) {
            let page = if addr >= 0x7F_0100 { 0x80 } else { 0 };
            let opcode = if set { 0x65 } else { 0x66 };
            Command::generic(opcode, &[page | bit_num, addr & 0xFF])
        } else {
            let opcode = if set { 0x63 } else { 0x64 };
            Command::generic(opcode, &[bit_num, script_offset(addr)?])
        }
    }

    pub fn set_reset_bits(addr: u32, mask: u8, set: bool) -> Result<Command> {
        let opcode = if set { 0x69 } else { 0x67 };
        Command::generic(opcode, &[mask as u32, script_offset(addr)?])
    }

    pub fn assign_val_to_mem(value: u32, addr: u32, num_bytes: usize) -> Result<Command> {
        width_ok(num_bytes)?;
        ensure(value >> (8 * num_bytes) == 0, || {
            format!("value {value:#X} does not fit {num_bytes} byte(s)")
        })?;
        ensure(RAM.contains(&addr) || MENU_PAUSE_FLAGS.contains(&addr), || {
            format!("{addr:#08X} is not RAM")
        })?;

        if SCRIPT_MEM.contains(&addr) && addr % 2 == 0 {
            let opcode = if num_bytes == 1 { 0x4F } else { 0x50 };
            Command::generic(opcode, &[value, script_offset(addr)?])
        } else if BANK_7F.contains(&addr) && num_bytes == 1 {
            Command::generic(0x56, &[value, addr - BANK_7F.start])
        } else {
            let opcode = if num_bytes == 1 { 0x4A } else { 0x4B };
            Command::generic(opcode, &[addr, value])
        }
    }

    pub fn set_storyline_counter(value: u8) -> Result<Command> {
        Command::assign_val_to_mem(value as u32, 0x7F_0000, 1)
    }

    pub fn assign_mem_to_mem(from: u32, to: u32, num_bytes: usize) -> Result<Command> {
        width_ok(num_bytes)?;
        let one = num_bytes == 1;
        let script = |a: u32| SCRIPT_MEM.contains(&a);
        let local = |a: u32| LOCAL_MEM.contains(&a);

        let (opcode, args) = if script(from) && script(to) {
            (if one { 0x51 } else { 0x52 }, [script_offset(from)?, script_offset(to)?])
        } else if local(from) && script(to) {
            (if one { 0x53 } else { 0x54 }, [from - LOCAL_MEM.start, script_offset(to)?])
        } else if script(from) && local(to) {
            (if one { 0x58 } else { 0x59 }, [script_offset(from)?, to - LOCAL_MEM.start])
        } else if BANK_7E.contains(&from) && script(to) {
            (if one { 0x48 } else { 0x49 }, [from, script_offset(to)?])
        } else if script(from) && RAM.contains(&to) {
            (if one { 0x4C } else { 0x4D }, [to, script_offset(from)?])
        } else {
            return Err(invalid(format!("no copy command from {from:#08X} to {to:#08X}")));
        };
        Command::generic(opcode, &args)
    }

    pub fn add_value_to_mem(value: u8, addr: u32) -> Result<Command> {
        Command::generic(0x5B, &[value as u32, script_offset(addr)?])
    }

    pub fn increment_mem(addr: u32, num_bytes: usize) -> Result<Command> {
        width_ok(num_bytes)?;
        let opcode = if num_bytes == 1 { 0x71 } else { 0x72 };
        Command::generic(opcode, &[script_offset(addr)?])
    }

    pub fn decrement_mem(addr: u32) -> Result<Command> {
        Command::generic(0x73, &[script_offset(addr)?])
    }

    /// Jumps `distance` bytes forward when `mem <op> value` is false.
    pub fn if_mem_op_value(
        addr: u32,
        op: Operation,
        value: u32,
        num_bytes: usize,
        distance: u32,
    ) -> Result<Command> {
        width_ok(num_bytes)?;
        let mut operator = op as u32;
        if LOCAL_MEM.contains(&addr) {
            ensure(num_bytes == 1, || "local memory compares one byte".to_string())?;
            if addr >= 0x7F_0100 {
                operator |= 0x80;
            }
            Command::generic(0x16, &[addr & 0xFF, value, operator, distance])
        } else {
            let opcode = if num_bytes == 1 { 0x12 } else { 0x13 };
            Command::generic(opcode, &[script_offset(addr)?, value, operator, distance])
        }
    }

    /// Copies `data` into RAM at `addr` when executed.
    pub fn mem_copy(addr: u32, data: &[u8]) -> Result<Command> {
        ensure(RAM.contains(&addr), || format!("{addr:#08X} is not RAM"))?;
        ensure(data.len() + 2 <= 0xFFFF, || format!("{} bytes is too much inline data", data.len()))?;
        Command::new(
            0x4E,
            vec![2, 1, 2, data.len()],
            vec![
                Operand::Value(addr & 0xFFFF),
                Operand::Value(addr >> 16),
                Operand::Value(data.len() as u32 + 2),
                Operand::Data(data.to_vec()),
            ],
        )
    }

    pub fn add_item(item: u8) -> Result<Command> {
        Command::generic(0xCA, &[item as u32])
    }

    pub fn remove_item(item: u8) -> Result<Command> {
        Command::generic(0xCB, &[item as u32])
    }

    pub fn add_gold(amount: u16) -> Result<Command> {
        Command::generic(0xCD, &[amount as u32])
    }

    pub fn remove_gold(amount: u16) -> Result<Command> {
        Command::generic(0xCE, &[amount as u32])
    }

    pub fn check_gold(amount: u16, distance: u32) -> Result<Command> {
        Command::generic(0xCC, &[amount as u32, distance])
    }

    pub fn if_has_item(item: u8, distance: u32) -> Result<Command> {
        Command::generic(0xC9, &[item as u32, distance])
    }

    pub fn if_storyline_counter_lt(value: u8, distance: u32) -> Result<Command> {
        Command::generic(0x18, &[value as u32, distance])
    }

    pub fn if_result_equals(value: u8, distance: u32) -> Result<Command> {
        Command::generic(0x1A, &[value as u32, distance])
    }

    pub fn check_active_pc(pc: u8, distance: u32) -> Result<Command> {
        Command::generic(0xD2, &[pc as u32, distance])
    }

    pub fn check_recruited_pc(pc: u8, distance: u32) -> Result<Command> {
        Command::generic(0xCF, &[pc as u32, distance])
    }

    /// `color` is a 3-bit BGR mask packed above a 5-bit intensity. A zero
    /// packed byte is a one-operand reset and takes no mode byte.
    pub fn color_add(color: u8, intensity: u8, add_sub_mode: bool) -> Result<Command> {
        ensure(color < 8, || format!("color {color:#X} out of range (0-7)"))?;
        ensure(intensity < 0x20, || format!("intensity {intensity:#X} out of range (0-0x1F)"))?;
        let packed = ((color as u32) << 5) | intensity as u32;
        if packed == 0 {
            ensure(!add_sub_mode, || "a zero color addition has no mode byte".to_string())?;
            return Command::generic(0xF1, &[0]);
        }
        let mode = if add_sub_mode { 0x80 } else { 0 };
        Command::new(
            0xF1,
            vec![1, 1],
            vec![Operand::Value(packed), Operand::Value(mode)],
        )
    }

    pub fn change_location(
        location: u32,
        x: u8,
        y: u8,
        facing: u8,
        wait_vblank: bool,
    ) -> Result<Command> {
        ensure(location < 0x200, || format!("location {location:#X} out of range"))?;
        let opcode = if wait_vblank { 0xE1 } else { 0xE0 };
        let packed = ((facing as u32 & 0x03) << 11) | location;
        Command::generic(opcode, &[packed, x as u32, y as u32])
    }

    pub fn load_pc_always(pc: u8) -> Result<Command> {
        Command::generic(0x81, &[pc as u32])
    }

    pub fn load_npc(npc: u8) -> Result<Command> {
        Command::generic(0x82, &[npc as u32])
    }

    pub fn load_enemy(enemy: u8, slot: u8, is_static: bool) -> Result<Command> {
        ensure(slot < 0x80, || format!("enemy slot {slot} out of range"))?;
        let slot_arg = slot as u32 | if is_static { 0x80 } else { 0 };
        Command::generic(0x83, &[enemy as u32, slot_arg])
    }

    /// Pause for `ticks` sixteenths of a second, using a fixed-length pause
    /// when one exists.
    pub fn pause(ticks: u8) -> Result<Command> {
        match ticks {
            4 => Command::generic(0xB9, &[]),
            8 => Command::generic(0xBA, &[]),
            16 => Command::generic(0xBC, &[]),
            32 => Command::generic(0xBD, &[]),
            _ => Command::generic(0xAD, &[ticks as u32]),
        }
    }

    pub fn set_explore_mode(on: bool) -> Result<Command> {
        Command::generic(0xE3, &[on as u32])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_calls_encode_double_index() {
        let cmd = Command::call_obj_function(3, 1, 4, FuncSync::Halt).unwrap();
        assert_eq!(cmd.encode(), vec![0x04, 0x06, 0x41]);
        let cmd = Command::call_pc_function(2, 5, 1, FuncSync::Cont).unwrap();
        assert_eq!(cmd.encode(), vec![0x05, 0x04, 0x15]);
        assert!(Command::call_obj_function(3, 16, 0, FuncSync::Sync).is_err());
        assert!(Command::call_obj_function(0x40, 0, 0, FuncSync::Sync).is_err());
        assert_eq!(Command::remove_object(5).unwrap().encode(), vec![0x0A, 0x0A]);
        assert_eq!(Command::set_object_drawing_status(1, false).unwrap().encode(), vec![0x7D, 0x02]);
    }

    #[test]
    fn flow_commands() {
        assert_eq!(Command::return_cmd().encode(), vec![0x00]);
        assert_eq!(Command::end_cmd().encode(), vec![0xB2]);
        assert_eq!(Command::break_cmd().encode(), vec![0xB1]);
        assert_eq!(Command::jump_forward(7).unwrap().encode(), vec![0x10, 0x07]);
        assert_eq!(Command::jump_back(2).unwrap().encode(), vec![0x11, 0x02]);
        assert!(Command::jump_forward(0x100).is_err());
    }

    #[test]
    fn assignments_pick_the_memory_variant() {
        let cmd = Command::assign_val_to_mem(5, 0x7F_0210, 1).unwrap();
        assert_eq!(cmd.encode(), vec![0x4F, 0x05, 0x08]);
        let cmd = Command::assign_val_to_mem(0x1234, 0x7F_0210, 2).unwrap();
        assert_eq!(cmd.encode(), vec![0x50, 0x34, 0x12, 0x08]);
        let cmd = Command::assign_val_to_mem(1, 0x7F_0050, 1).unwrap();
        assert_eq!(cmd.encode(), vec![0x56, 0x01, 0x50, 0x00]);
        let cmd = Command::assign_val_to_mem(0xBEEF, 0x7E_2000, 2).unwrap();
        assert_eq!(cmd.encode(), vec![0x4B, 0x00, 0x20, 0x7E, 0xEF, 0xBE]);
        assert!(Command::assign_val_to_mem(0x100, 0x7F_0210, 1).is_err());
        assert!(Command::assign_val_to_mem(1, 0x12_0000, 1).is_err());

        let cmd = Command::assign_mem_to_mem(0x7F_0200, 0x7F_0204, 1).unwrap();
        assert_eq!(cmd.encode(), vec![0x51, 0x00, 0x02]);
        let cmd = Command::assign_mem_to_mem(0x7E_1000, 0x7F_0202, 2).unwrap();
        assert_eq!(cmd.encode(), vec![0x49, 0x00, 0x10, 0x7E, 0x01]);
        assert!(Command::assign_mem_to_mem(0x7E_1000, 0x7E_1002, 1).is_err());
    }

    #[test]
    fn bit_commands() {
        assert_eq!(Command::set_bit(0x7F_0104, 0x10).unwrap().encode(), vec![0x65, 0x84, 0x04]);
        assert_eq!(Command::reset_bit(0x7F_0020, 0x01).unwrap().encode(), vec![0x66, 0x00, 0x20]);
        assert_eq!(Command::set_bit(0x7F_0206, 0x80).unwrap().encode(), vec![0x63, 0x07, 0x03]);
        assert!(Command::set_bit(0x7F_0207, 0x80).is_err());
        assert!(Command::set_bit(0x7F_0206, 0x81).is_err());
        assert_eq!(Command::set_reset_bits(0x7F_0200, 0x0F, false).unwrap().encode(), vec![0x67, 0x0F, 0x00]);
    }

    #[test]
    fn memory_math_and_compare() {
        assert_eq!(Command::increment_mem(0x7F_0202, 2).unwrap().encode(), vec![0x72, 0x01]);
        assert_eq!(Command::decrement_mem(0x7F_0202).unwrap().encode(), vec![0x73, 0x01]);
        assert_eq!(Command::add_value_to_mem(3, 0x7F_0204).unwrap().encode(), vec![0x5B, 0x03, 0x02]);
        let cmd = Command::if_mem_op_value(0x7F_0180, Operation::LessThan, 9, 1, 6).unwrap();
        assert_eq!(cmd.encode(), vec![0x16, 0x80, 0x09, 0x83, 0x06]);
        let cmd = Command::if_mem_op_value(0x7F_0204, Operation::Equals, 0x100, 2, 6).unwrap();
        assert_eq!(cmd.encode(), vec![0x13, 0x02, 0x00, 0x01, 0x00, 0x06]);
        assert!(cmd.is_jump());
    }

    #[test]
    fn mem_copy_records_length_plus_two() {
        let cmd = Command::mem_copy(0x7E_0200, &[1, 2, 3]).unwrap();
        assert_eq!(cmd.encode(), vec![0x4E, 0x00, 0x02, 0x7E, 0x05, 0x00, 1, 2, 3]);
        let (back, _) = crate::decode(&cmd.encode(), 0, crate::Platform::Snes).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn text_location_and_misc() {
        assert_eq!(Command::textbox_top(4).unwrap().encode(), vec![0xC1, 0x04]);
        assert_eq!(
            Command::decision_box(2, 1, 3, BoxPosition::Bottom).unwrap().encode(),
            vec![0xC4, 0x02, 0x07]
        );
        assert_eq!(
            Command::change_location(0x1F0, 3, 4, 1, true).unwrap().encode(),
            vec![0xE1, 0xF0, 0x09, 0x03, 0x04]
        );
        assert_eq!(Command::set_string_index(0xC6_0000).unwrap().encode(), vec![0xB8, 0x00, 0x00, 0xC6]);
        assert_eq!(Command::pause(8).unwrap().encode(), vec![0xBA]);
        assert_eq!(Command::pause(10).unwrap().encode(), vec![0xAD, 0x0A]);
        assert_eq!(Command::color_add(0, 0, false).unwrap().encode(), vec![0xF1, 0x00]);
        assert_eq!(Command::load_enemy(0x40, 3, true).unwrap().encode(), vec![0x83, 0x40, 0x83]);
        assert_eq!(Command::check_gold(500, 4).unwrap().encode(), vec![0xCC, 0xF4, 0x01, 0x04]);
    }

    #[test]
    fn color_add_packs_color_over_intensity() {
        let cmd = Command::color_add(0b101, 0x0C, false).unwrap();
        assert_eq!(cmd.encode(), vec![0xF1, 0xAC, 0x00]);
        let cmd = Command::color_add(0b001, 0x1F, true).unwrap();
        assert_eq!(cmd.encode(), vec![0xF1, 0x3F, 0x80]);
        // Intensity alone still reads as a two-operand command.
        assert_eq!(Command::color_add(0, 5, false).unwrap().encode(), vec![0xF1, 0x05, 0x00]);
        assert!(Command::color_add(8, 0, false).is_err());
        assert!(Command::color_add(1, 0x20, false).is_err());
        assert!(Command::color_add(0, 0, true).is_err());

        for cmd in [
            Command::color_add(0, 0, false).unwrap(),
            Command::color_add(7, 0x10, true).unwrap(),
        ] {
            let (back, used) = crate::decode(&cmd.encode(), 0, crate::Platform::Snes).unwrap();
            assert_eq!(used, cmd.len());
            assert_eq!(back, cmd);
        }
    }

    #[test]
    fn menu_and_pause_flags_are_assignable() {
        let cmd = Command::assign_val_to_mem(1, 0x110, 1).unwrap();
        assert_eq!(cmd.encode(), vec![0x4A, 0x10, 0x01, 0x00, 0x01]);
        let cmd = Command::assign_val_to_mem(0, 0x111, 1).unwrap();
        assert_eq!(cmd.encode(), vec![0x4A, 0x11, 0x01, 0x00, 0x00]);
        assert!(Command::assign_val_to_mem(1, 0x112, 1).is_err());
    }
}
