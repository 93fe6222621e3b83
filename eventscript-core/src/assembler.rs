use thiserror::Error;

use crate::catalog;
use crate::command::{decode, pc_arg_lens, Command, DecodeError, Operand, Platform};
use crate::constructors::{BoxPosition, FuncSync, Operation};
use crate::ScriptError;

/// Errors raised while assembling event-script text.
#[derive(Debug, Error)]
pub enum AsmError {
    #[error("unknown mnemonic '{mnemonic}' on line {line}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("wrong argument count for {mnemonic} on line {line}: expected {expected}, got {got}")]
    WrongArgCount {
        line: usize,
        mnemonic: String,
        expected: usize,
        got: usize,
    },

    #[error("failed to parse integer '{token}' on line {line}")]
    ParseInt {
        line: usize,
        token: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("value '{token}' on line {line} is out of range for {kind}")]
    ValueOutOfRange {
        line: usize,
        token: String,
        kind: &'static str,
    },

    #[error("line {line}: {source}")]
    Rejected {
        line: usize,
        #[source]
        source: ScriptError,
    },

    #[error("line {line}: '{text}' does not read back as itself on {platform:?}; write variable-length commands with DB")]
    ShapeMismatch {
        line: usize,
        text: String,
        platform: Platform,
    },

    #[error("line {line}: {source}")]
    BadBytes {
        line: usize,
        #[source]
        source: DecodeError,
    },
}

fn parse_u32(line: usize, token: &str) -> Result<u32, AsmError> {
    let t = token.trim_end_matches(',');
    let res = if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        t.parse::<u32>()
    };

    res.map_err(|e| AsmError::ParseInt {
        line,
        token: t.to_string(),
        source: e,
    })
}

struct Line<'a> {
    no: usize,
    mnemonic: String,
    args: Vec<&'a str>,
}

impl Line<'_> {
    fn arity(&self, expected: usize) -> Result<(), AsmError> {
        if self.args.len() != expected {
            return Err(AsmError::WrongArgCount {
                line: self.no,
                mnemonic: self.mnemonic.clone(),
                expected,
                got: self.args.len(),
            });
        }
        Ok(())
    }

    fn u32(&self, i: usize) -> Result<u32, AsmError> {
        parse_u32(self.no, self.args[i])
    }

    fn narrow<T: TryFrom<u32>>(&self, i: usize, kind: &'static str) -> Result<T, AsmError> {
        let v = self.u32(i)?;
        T::try_from(v).map_err(|_| AsmError::ValueOutOfRange {
            line: self.no,
            token: self.args[i].to_string(),
            kind,
        })
    }

    fn u8(&self, i: usize) -> Result<u8, AsmError> {
        self.narrow(i, "a byte")
    }

    fn u16(&self, i: usize) -> Result<u16, AsmError> {
        self.narrow(i, "a word")
    }

    fn usize(&self, i: usize) -> Result<usize, AsmError> {
        Ok(self.u32(i)? as usize)
    }

    fn word<T>(&self, i: usize, kind: &'static str, table: &[(&str, T)]) -> Result<T, AsmError>
    where
        T: Copy,
    {
        let tok = self.args[i].to_ascii_uppercase();
        table
            .iter()
            .find(|(name, _)| *name == tok)
            .map(|&(_, v)| v)
            .ok_or_else(|| AsmError::ValueOutOfRange {
                line: self.no,
                token: self.args[i].to_string(),
                kind,
            })
    }

    fn flag(&self, i: usize) -> Result<bool, AsmError> {
        self.word(i, "ON/OFF", &[("ON", true), ("OFF", false), ("1", true), ("0", false)])
    }

    fn sync(&self, i: usize) -> Result<FuncSync, AsmError> {
        self.word(
            i,
            "CONT/SYNC/HALT",
            &[("CONT", FuncSync::Cont), ("SYNC", FuncSync::Sync), ("HALT", FuncSync::Halt)],
        )
    }

    fn operation(&self, i: usize) -> Result<Operation, AsmError> {
        self.word(
            i,
            "a comparison",
            &[
                ("==", Operation::Equals),
                ("!=", Operation::NotEquals),
                (">", Operation::GreaterThan),
                ("<", Operation::LessThan),
                (">=", Operation::GreaterOrEqual),
                ("<=", Operation::LessOrEqual),
                ("&", Operation::BitwiseAndNonzero),
                ("|", Operation::BitwiseOrNonzero),
            ],
        )
    }

    fn position(&self, i: usize) -> Result<BoxPosition, AsmError> {
        self.word(
            i,
            "AUTO/TOP/BOTTOM",
            &[
                ("AUTO", BoxPosition::Auto),
                ("TOP", BoxPosition::Top),
                ("BOTTOM", BoxPosition::Bottom),
            ],
        )
    }

    fn bytes(&self, from: usize) -> Result<Vec<u8>, AsmError> {
        (from..self.args.len()).map(|i| self.u8(i)).collect()
    }
}

/// Assemble event-script text into command bytes for `insert_commands` or
/// `set_function`.
///
/// One command per line; mnemonics are case-insensitive and numbers are
/// decimal or 0x-prefixed hex:
///
/// - `RETURN`, `END`, `BREAK`, `PARTY_FOLLOW`
/// - `JUMP_FORWARD dist`, `JUMP_BACK dist`
/// - `CALL_OBJ obj func prio CONT|SYNC|HALT`, `CALL_PC pc func prio CONT|SYNC|HALT`
/// - `DRAW obj ON|OFF`, `REMOVE_OBJECT obj`
/// - `STRING_INDEX rom_ptr`, `TEXTBOX_PERSONAL s`, `TEXTBOX_TOP s`,
///   `TEXTBOX_BOTTOM s`, `DECISION_BOX s first last AUTO|TOP|BOTTOM`
/// - `SET_BIT addr mask`, `RESET_BIT addr mask`, `SET_BITS addr mask`, `RESET_BITS addr mask`
/// - `ASSIGN value addr width`, `ASSIGN_MEM from to width`, `ADD value addr`,
///   `INCREMENT addr width`, `DECREMENT addr`, `STORYLINE value`
/// - `IF_MEM addr op value width dist` (op is one of `== != > < >= <= & |`)
/// - `MEM_COPY addr byte…`
/// - `ADD_ITEM item`, `REMOVE_ITEM item`, `ADD_GOLD n`, `REMOVE_GOLD n`,
///   `IF_GOLD n dist`, `IF_ITEM item dist`, `IF_STORYLINE_LT value dist`,
///   `IF_RESULT value dist`, `IF_ACTIVE_PC pc dist`, `IF_RECRUITED_PC pc dist`
/// - `COLOR_ADD color intensity [ADDSUB]`, `CHANGE_LOCATION loc x y facing [VBLANK]`,
///   `LOAD_PC pc`, `LOAD_NPC npc`, `LOAD_ENEMY enemy slot [STATIC]`,
///   `PAUSE ticks`, `EXPLORE ON|OFF`
/// - `0xOP value…`: any opcode with the platform's operand widths
/// - `DB byte…`: raw bytes, which must decode as whole commands
///
/// Blank lines and lines starting with `#` or `//` are ignored. Operands
/// take the widths `platform` decodes them with, and every command must
/// read back unchanged.
pub fn assemble(src: &str, platform: Platform) -> Result<Vec<u8>, AsmError> {
    let mut out = Vec::new();

    for (idx, raw_line) in src.lines().enumerate() {
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(head) = parts.next() else {
            continue;
        };
        let line = Line {
            no: idx + 1,
            mnemonic: head.to_ascii_uppercase(),
            args: parts.collect(),
        };

        if line.mnemonic == "DB" {
            let bytes = line.bytes(0)?;
            let mut pos = 0;
            while pos < bytes.len() {
                let (_, len) = decode(&bytes, pos, platform)
                    .map_err(|source| AsmError::BadBytes { line: line.no, source })?;
                pos += len;
            }
            out.extend(bytes);
            continue;
        }

        let cmd = assemble_line(&line, platform)?
            .and_then(|cmd| widen_for(cmd, platform))
            .map_err(|source| AsmError::Rejected { line: line.no, source })?;
        let bytes = cmd.encode();
        match decode(&bytes, 0, platform) {
            Ok((back, used)) if used == bytes.len() && back == cmd => {}
            _ => {
                return Err(AsmError::ShapeMismatch {
                    line: line.no,
                    text: cmd.to_string(),
                    platform,
                })
            }
        }
        out.extend(bytes);
    }

    Ok(out)
}

fn operand_lens(opcode: u8, platform: Platform) -> &'static [usize] {
    match platform {
        Platform::Pc => pc_arg_lens(opcode).unwrap_or(catalog::lookup(opcode).arg_lens),
        Platform::Snes => catalog::lookup(opcode).arg_lens,
    }
}

// Constructors build cartridge widths; PC widens text and a few other
// operands without changing their count.
fn widen_for(cmd: Command, platform: Platform) -> crate::Result<Command> {
    let Some(lens) = pc_arg_lens(cmd.opcode()).filter(|_| platform == Platform::Pc) else {
        return Ok(cmd);
    };
    if lens.len() != cmd.args().len() {
        return Err(ScriptError::InvalidArgument(format!(
            "{cmd} has a different operand layout on PC; write it as a raw line"
        )));
    }
    Command::new(cmd.opcode(), lens.to_vec(), cmd.args().to_vec())
}

// String operands are checked against the platform's width, not the
// cartridge's.
fn with_string(cmd: Command, string: u32, platform: Platform) -> crate::Result<Command> {
    let mut cmd = widen_for(cmd, platform)?;
    cmd.set_arg(0, string)?;
    Ok(cmd)
}

// Outer error: the text itself is wrong. Inner: a constructor refused it.
fn assemble_line(line: &Line, platform: Platform) -> Result<crate::Result<Command>, AsmError> {
    let a = line;
    let cmd = match a.mnemonic.as_str() {
        "RETURN" => {
            a.arity(0)?;
            Ok(Command::return_cmd())
        }
        "END" => {
            a.arity(0)?;
            Ok(Command::end_cmd())
        }
        "BREAK" => {
            a.arity(0)?;
            Ok(Command::break_cmd())
        }
        "PARTY_FOLLOW" => {
            a.arity(0)?;
            Ok(Command::party_follow())
        }
        "JUMP_FORWARD" | "JUMP_BACK" => {
            a.arity(1)?;
            let dist = a.u32(0)?;
            if a.mnemonic == "JUMP_FORWARD" {
                Command::jump_forward(dist)
            } else {
                Command::jump_back(dist)
            }
        }
        "CALL_OBJ" => {
            a.arity(4)?;
            Command::call_obj_function(a.usize(0)?, a.u8(1)?, a.u8(2)?, a.sync(3)?)
        }
        "CALL_PC" => {
            a.arity(4)?;
            Command::call_pc_function(a.u8(0)?, a.u8(1)?, a.u8(2)?, a.sync(3)?)
        }
        "DRAW" => {
            a.arity(2)?;
            Command::set_object_drawing_status(a.usize(0)?, a.flag(1)?)
        }
        "REMOVE_OBJECT" => {
            a.arity(1)?;
            Command::remove_object(a.usize(0)?)
        }
        "STRING_INDEX" => {
            a.arity(1)?;
            Command::set_string_index(a.u32(0)?)
        }
        "TEXTBOX_PERSONAL" | "TEXTBOX_TOP" | "TEXTBOX_BOTTOM" => {
            a.arity(1)?;
            let s = a.u32(0)?;
            let cmd = match a.mnemonic.as_str() {
                "TEXTBOX_PERSONAL" => Command::personal_textbox(0),
                "TEXTBOX_TOP" => Command::textbox_top(0),
                _ => Command::textbox_bottom(0),
            };
            cmd.and_then(|cmd| with_string(cmd, s, platform))
        }
        "DECISION_BOX" => {
            a.arity(4)?;
            let s = a.u32(0)?;
            Command::decision_box(0, a.u8(1)?, a.u8(2)?, a.position(3)?)
                .and_then(|cmd| with_string(cmd, s, platform))
        }
        "SET_BIT" | "RESET_BIT" => {
            a.arity(2)?;
            Command::set_reset_bit(a.u32(0)?, a.u8(1)?, a.mnemonic == "SET_BIT")
        }
        "SET_BITS" | "RESET_BITS" => {
            a.arity(2)?;
            Command::set_reset_bits(a.u32(0)?, a.u8(1)?, a.mnemonic == "SET_BITS")
        }
        "ASSIGN" => {
            a.arity(3)?;
            Command::assign_val_to_mem(a.u32(0)?, a.u32(1)?, a.usize(2)?)
        }
        "ASSIGN_MEM" => {
            a.arity(3)?;
            Command::assign_mem_to_mem(a.u32(0)?, a.u32(1)?, a.usize(2)?)
        }
        "ADD" => {
            a.arity(2)?;
            Command::add_value_to_mem(a.u8(0)?, a.u32(1)?)
        }
        "INCREMENT" => {
            a.arity(2)?;
            Command::increment_mem(a.u32(0)?, a.usize(1)?)
        }
        "DECREMENT" => {
            a.arity(1)?;
            Command::decrement_mem(a.u32(0)?)
        }
        "STORYLINE" => {
            a.arity(1)?;
            Command::set_storyline_counter(a.u8(0)?)
        }
        "IF_MEM" => {
            a.arity(5)?;
            Command::if_mem_op_value(a.u32(0)?, a.operation(1)?, a.u32(2)?, a.usize(3)?, a.u32(4)?)
        }
        "MEM_COPY" => {
            if a.args.is_empty() {
                a.arity(1)?;
            }
            Command::mem_copy(a.u32(0)?, &a.bytes(1)?)
        }
        "ADD_ITEM" => {
            a.arity(1)?;
            Command::add_item(a.u8(0)?)
        }
        "REMOVE_ITEM" => {
            a.arity(1)?;
            Command::remove_item(a.u8(0)?)
        }
        "ADD_GOLD" => {
            a.arity(1)?;
            Command::add_gold(a.u16(0)?)
        }
        "REMOVE_GOLD" => {
            a.arity(1)?;
            Command::remove_gold(a.u16(0)?)
        }
        "IF_GOLD" => {
            a.arity(2)?;
            Command::check_gold(a.u16(0)?, a.u32(1)?)
        }
        "IF_ITEM" => {
            a.arity(2)?;
            Command::if_has_item(a.u8(0)?, a.u32(1)?)
        }
        "IF_STORYLINE_LT" => {
            a.arity(2)?;
            Command::if_storyline_counter_lt(a.u8(0)?, a.u32(1)?)
        }
        "IF_RESULT" => {
            a.arity(2)?;
            Command::if_result_equals(a.u8(0)?, a.u32(1)?)
        }
        "IF_ACTIVE_PC" => {
            a.arity(2)?;
            Command::check_active_pc(a.u8(0)?, a.u32(1)?)
        }
        "IF_RECRUITED_PC" => {
            a.arity(2)?;
            Command::check_recruited_pc(a.u8(0)?, a.u32(1)?)
        }
        "COLOR_ADD" => {
            let add_sub = a.args.len() == 3 && a.args[2].eq_ignore_ascii_case("ADDSUB");
            a.arity(if add_sub { 3 } else { 2 })?;
            Command::color_add(a.u8(0)?, a.u8(1)?, add_sub)
        }
        "CHANGE_LOCATION" => {
            let vblank = a.args.len() == 5 && a.args[4].eq_ignore_ascii_case("VBLANK");
            a.arity(if vblank { 5 } else { 4 })?;
            Command::change_location(a.u32(0)?, a.u8(1)?, a.u8(2)?, a.u8(3)?, vblank)
        }
        "LOAD_PC" => {
            a.arity(1)?;
            Command::load_pc_always(a.u8(0)?)
        }
        "LOAD_NPC" => {
            a.arity(1)?;
            Command::load_npc(a.u8(0)?)
        }
        "LOAD_ENEMY" => {
            let is_static = a.args.len() == 3 && a.args[2].eq_ignore_ascii_case("STATIC");
            a.arity(if is_static { 3 } else { 2 })?;
            Command::load_enemy(a.u8(0)?, a.u8(1)?, is_static)
        }
        "PAUSE" => {
            a.arity(1)?;
            Command::pause(a.u8(0)?)
        }
        "EXPLORE" => {
            a.arity(1)?;
            Command::set_explore_mode(a.flag(0)?)
        }
        _ if a.mnemonic.starts_with("0X") => {
            let opcode = u8::try_from(parse_u32(a.no, &a.mnemonic)?)
                .map_err(|_| AsmError::ValueOutOfRange {
                    line: a.no,
                    token: a.mnemonic.clone(),
                    kind: "an opcode",
                })?;
            let lens = operand_lens(opcode, platform);
            a.arity(lens.len())?;
            let values = (0..a.args.len())
                .map(|i| a.u32(i).map(Operand::Value))
                .collect::<Result<Vec<_>, _>>()?;
            Command::new(opcode, lens.to_vec(), values)
        }
        _ => {
            return Err(AsmError::UnknownMnemonic {
                line: a.no,
                mnemonic: a.mnemonic.clone(),
            })
        }
    };
    Ok(cmd)
}
