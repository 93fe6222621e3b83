use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{self, Descriptor};
use crate::rom::read_le;
use crate::{Result, ScriptError};

/// Which build of the VM a script targets. The PC release widens several
/// operands relative to the cartridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Snes,
    Pc,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("offset {offset:#06X} is past the end of a {len}-byte buffer")]
    OffsetOutOfRange { offset: usize, len: usize },

    #[error("command {opcode:#04X} at {offset:#06X} needs {needed} bytes but only {available} remain")]
    Truncated {
        offset: usize,
        opcode: u8,
        needed: usize,
        available: usize,
    },

    #[error("command {opcode:#04X} at {offset:#06X} has unknown mode {mode:#X}")]
    UnknownMode { offset: usize, opcode: u8, mode: u8 },

    #[error("command {opcode:#04X} at {offset:#06X} has an invalid length field {value}")]
    BadLengthField { offset: usize, opcode: u8, value: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    Value(u32),
    /// Inline bytes copied verbatim by the VM.
    Data(Vec<u8>),
}

impl Operand {
    pub fn value(&self) -> Option<u32> {
        match self {
            Operand::Value(v) => Some(*v),
            Operand::Data(_) => None,
        }
    }
}

impl From<u32> for Operand {
    fn from(v: u32) -> Self {
        Operand::Value(v)
    }
}

impl From<Vec<u8>> for Operand {
    fn from(data: Vec<u8>) -> Self {
        Operand::Data(data)
    }
}

/// One occurrence of an instruction with its resolved operand widths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    opcode: u8,
    arg_lens: Vec<usize>,
    args: Vec<Operand>,
}

impl Command {
    /// Builds a command from explicit widths and operands. Only the last
    /// operand may be inline data, and its width must equal its length.
    pub fn new(opcode: u8, arg_lens: Vec<usize>, args: Vec<Operand>) -> Result<Command> {
        if arg_lens.len() != args.len() {
            return Err(ScriptError::InvalidArgument(format!(
                "command {opcode:#04X}: {} widths for {} operands",
                arg_lens.len(),
                args.len()
            )));
        }
        let last = args.len().saturating_sub(1);
        for (i, (arg, &len)) in args.iter().zip(arg_lens.iter()).enumerate() {
            match arg {
                Operand::Value(v) => check_width(opcode, i, *v, len)?,
                Operand::Data(d) => {
                    if i != last || d.len() != len {
                        return Err(ScriptError::InvalidArgument(format!(
                            "command {opcode:#04X}: inline data must be the last operand and match its width"
                        )));
                    }
                }
            }
        }
        Ok(Command {
            opcode,
            arg_lens,
            args,
        })
    }

    /// Builds a command with the catalog's default shape for `opcode`.
    pub fn generic(opcode: u8, values: &[u32]) -> Result<Command> {
        let lens = catalog::lookup(opcode).arg_lens.to_vec();
        let args = values.iter().map(|&v| Operand::Value(v)).collect();
        Command::new(opcode, lens, args)
    }

    // Only valid for opcodes whose catalog shape has no operands.
    pub(crate) fn bare(opcode: u8) -> Command {
        Command {
            opcode,
            arg_lens: Vec::new(),
            args: Vec::new(),
        }
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn arg_lens(&self) -> &[usize] {
        &self.arg_lens
    }

    pub fn args(&self) -> &[Operand] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<u32> {
        self.args.get(index).and_then(Operand::value)
    }

    pub fn set_arg(&mut self, index: usize, value: u32) -> Result<()> {
        let len = match (self.arg_lens.get(index), self.args.get(index)) {
            (Some(&len), Some(Operand::Value(_))) => len,
            _ => {
                return Err(ScriptError::InvalidArgument(format!(
                    "command {:#04X} has no numeric operand {index}",
                    self.opcode
                )))
            }
        };
        check_width(self.opcode, index, value, len)?;
        self.args[index] = Operand::Value(value);
        Ok(())
    }

    pub fn descriptor(&self) -> &'static Descriptor {
        catalog::lookup(self.opcode)
    }

    /// Encoded size in bytes, opcode included.
    pub fn len(&self) -> usize {
        1 + self.arg_lens.iter().sum::<usize>()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        out.push(self.opcode);
        for (arg, &len) in self.args.iter().zip(self.arg_lens.iter()) {
            match arg {
                Operand::Value(v) => out.extend_from_slice(&v.to_le_bytes()[..len]),
                Operand::Data(d) => out.extend_from_slice(d),
            }
        }
        out
    }

    pub fn is_jump(&self) -> bool {
        catalog::is_jump(self.opcode)
    }

    /// Jump distance, always the final operand.
    pub fn jump_distance(&self) -> Option<u32> {
        if !self.is_jump() {
            return None;
        }
        self.args.last().and_then(Operand::value)
    }

    /// Address execution continues at when the jump is taken from `pos`.
    /// Distances count from the last byte of the jump command.
    pub fn jump_target(&self, pos: usize) -> Option<usize> {
        let dist = self.jump_distance()? as usize;
        let last_byte = pos + self.len() - 1;
        if catalog::is_backward_jump(self.opcode) {
            last_byte.checked_sub(dist)
        } else {
            Some(last_byte + dist)
        }
    }

    /// Equality that ignores the distance of jump commands.
    pub fn matches_ignoring_jump(&self, other: &Command) -> bool {
        if self.opcode != other.opcode {
            return false;
        }
        if !self.is_jump() {
            return self == other;
        }
        let n = self.args.len();
        n == other.args.len() && n > 0 && self.args[..n - 1] == other.args[..n - 1]
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X} {}", self.opcode, self.descriptor().name)?;
        for (arg, &len) in self.args.iter().zip(self.arg_lens.iter()) {
            match arg {
                Operand::Value(v) => write!(f, " {:0width$X}", v, width = 2 * len)?,
                Operand::Data(d) => {
                    write!(f, " [")?;
                    for (i, b) in d.iter().enumerate() {
                        if i > 0 {
                            write!(f, " ")?;
                        }
                        write!(f, "{b:02X}")?;
                    }
                    write!(f, "]")?;
                }
            }
        }
        Ok(())
    }
}

fn check_width(opcode: u8, index: usize, value: u32, len: usize) -> Result<()> {
    if !(1..=3).contains(&len) || (value as u64) >> (8 * len) != 0 {
        return Err(ScriptError::InvalidArgument(format!(
            "command {opcode:#04X}: operand {index} value {value:#X} does not fit {len} byte(s)"
        )));
    }
    Ok(())
}

// Operand shapes that depend on the bytes following the opcode. Each rule
// sees the buffer at the command and returns the full width list.

/// Opcodes whose operand widths are not fixed by the catalog.
pub const VARIABLE_SHAPE_OPCODES: [u8; 5] = [0x2E, 0x4E, 0x88, 0xF1, 0xFF];

struct Shape {
    lens: Vec<usize>,
    // Last operand holds inline data.
    data: bool,
}

impl Shape {
    fn fixed(lens: &[usize]) -> Shape {
        Shape {
            lens: lens.to_vec(),
            data: false,
        }
    }

    fn with_data(mut lens: Vec<usize>, data_len: usize) -> Shape {
        lens.push(data_len);
        Shape { lens, data: true }
    }
}

struct Probe<'a> {
    buf: &'a [u8],
    offset: usize,
    opcode: u8,
    platform: Platform,
}

impl Probe<'_> {
    fn byte(&self, rel: usize) -> std::result::Result<u8, DecodeError> {
        self.buf
            .get(self.offset + rel)
            .copied()
            .ok_or(DecodeError::Truncated {
                offset: self.offset,
                opcode: self.opcode,
                needed: rel + 1,
                available: self.buf.len() - self.offset,
            })
    }

    fn word(&self, rel: usize) -> std::result::Result<usize, DecodeError> {
        let lo = self.byte(rel)? as usize;
        let hi = self.byte(rel + 1)? as usize;
        Ok(lo | (hi << 8))
    }

    // Embedded length fields count themselves.
    fn copy_len(&self, raw: usize) -> std::result::Result<usize, DecodeError> {
        raw.checked_sub(2).ok_or(DecodeError::BadLengthField {
            offset: self.offset,
            opcode: self.opcode,
            value: raw,
        })
    }

    fn unknown_mode(&self, mode: u8) -> DecodeError {
        DecodeError::UnknownMode {
            offset: self.offset,
            opcode: self.opcode,
            mode,
        }
    }
}

type ShapeRule = fn(&Probe) -> std::result::Result<Shape, DecodeError>;

fn shape_rule(opcode: u8) -> Option<ShapeRule> {
    match opcode {
        0x2E => Some(color_math_shape),
        0x4E => Some(mem_copy_shape),
        0x88 => Some(multi_mode_shape),
        0xF1 => Some(color_add_shape),
        0xFF => Some(mode7_shape),
        _ => None,
    }
}

fn color_math_shape(p: &Probe) -> std::result::Result<Shape, DecodeError> {
    let mode = p.byte(1)? >> 4;
    match mode {
        4 | 5 => Ok(Shape::fixed(&[1, 1, 1, 1, 1])),
        8 if p.platform == Platform::Pc => Ok(Shape::fixed(&[1, 1, 1])),
        8 => {
            let len = p.copy_len(p.byte(3)? as usize)?;
            Ok(Shape::with_data(vec![1, 1, 2], len))
        }
        _ => Err(p.unknown_mode(mode)),
    }
}

fn mem_copy_shape(p: &Probe) -> std::result::Result<Shape, DecodeError> {
    let len = p.copy_len(p.word(4)?)?;
    Ok(Shape::with_data(vec![2, 1, 2], len))
}

fn multi_mode_shape(p: &Probe) -> std::result::Result<Shape, DecodeError> {
    let mode = p.byte(1)? >> 4;
    match mode {
        0 => Ok(Shape::fixed(&[1])),
        2 | 3 => Ok(Shape::fixed(&[1, 1, 1])),
        4 | 5 => Ok(Shape::fixed(&[1, 1, 1, 1])),
        8 if p.platform == Platform::Pc => Ok(Shape::fixed(&[1, 1])),
        8 => {
            let len = p.copy_len(p.byte(2)? as usize)?;
            Ok(Shape::with_data(vec![1, 1, 1], len))
        }
        _ => Err(p.unknown_mode(mode)),
    }
}

fn color_add_shape(p: &Probe) -> std::result::Result<Shape, DecodeError> {
    if p.byte(1)? == 0 {
        Ok(Shape::fixed(&[1]))
    } else {
        Ok(Shape::fixed(&[1, 1]))
    }
}

fn mode7_shape(p: &Probe) -> std::result::Result<Shape, DecodeError> {
    match p.byte(1)? {
        0x90 => Ok(Shape::fixed(&[1, 1, 1, 1])),
        0x97 => Ok(Shape::fixed(&[1, 1, 1])),
        _ => Ok(Shape::fixed(catalog::lookup(0xFF).arg_lens)),
    }
}

/// Operand widths the PC build uses instead of the catalog default.
pub fn pc_arg_lens(opcode: u8) -> Option<&'static [usize]> {
    let lens: &'static [usize] = match opcode {
        0xBB | 0xC1 | 0xC2 => &[2],
        0xC0 | 0xC3 | 0xC4 => &[2, 1],
        0xDC..=0xE1 => &[2, 1, 1, 1],
        0x83 | 0xC9 => &[2, 1],
        0xD5 => &[1, 1, 1],
        0xB8 => &[1],
        0x3A | 0x3D | 0x3E | 0x45 | 0x46 | 0x70 | 0x74 | 0x78 => &[1, 1],
        0x6E => &[1, 1, 1, 1],
        _ => return None,
    };
    Some(lens)
}

fn resolve_shape(
    buf: &[u8],
    offset: usize,
    platform: Platform,
) -> std::result::Result<(u8, Shape), DecodeError> {
    let opcode = *buf.get(offset).ok_or(DecodeError::OffsetOutOfRange {
        offset,
        len: buf.len(),
    })?;

    let mut lens = catalog::lookup(opcode).arg_lens;
    if platform == Platform::Pc {
        if let Some(pc) = pc_arg_lens(opcode) {
            lens = pc;
        }
    }

    let shape = match shape_rule(opcode) {
        Some(rule) => rule(&Probe {
            buf,
            offset,
            opcode,
            platform,
        })?,
        None => Shape::fixed(lens),
    };
    Ok((opcode, shape))
}

/// Decodes the command at `offset`, returning it with its encoded length.
pub fn decode(
    buf: &[u8],
    offset: usize,
    platform: Platform,
) -> std::result::Result<(Command, usize), DecodeError> {
    let (opcode, shape) = resolve_shape(buf, offset, platform)?;
    let total = 1 + shape.lens.iter().sum::<usize>();
    let available = buf.len() - offset;
    if total > available {
        return Err(DecodeError::Truncated {
            offset,
            opcode,
            needed: total,
            available,
        });
    }

    let last = shape.lens.len().saturating_sub(1);
    let mut pos = offset + 1;
    let mut args = Vec::with_capacity(shape.lens.len());
    for (i, &len) in shape.lens.iter().enumerate() {
        let bytes = &buf[pos..pos + len];
        if shape.data && i == last {
            args.push(Operand::Data(bytes.to_vec()));
        } else {
            args.push(Operand::Value(read_le(bytes)));
        }
        pos += len;
    }

    Ok((
        Command {
            opcode,
            arg_lens: shape.lens,
            args,
        },
        total,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn round_trip(bytes: &[u8], platform: Platform) -> Command {
        let (cmd, used) = decode(bytes, 0, platform).unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(cmd.len(), bytes.len());
        assert_eq!(cmd.encode(), bytes);
        let (again, _) = decode(&cmd.encode(), 0, platform).unwrap();
        assert_eq!(again, cmd);
        cmd
    }

    #[test]
    fn fixed_shapes_round_trip() {
        let samples: &[&[u8]] = &[
            &[0x00],
            &[0x02, 0x06, 0x31],
            &[0x10, 0x03],
            &[0x13, 0x04, 0x34, 0x12, 0x00, 0x09],
            &[0x4B, 0x00, 0x01, 0x7F, 0xCD, 0xAB],
            &[0xB8, 0x00, 0x80, 0xC6],
            &[0xE1, 0x12, 0x00, 0x08, 0x0A],
            &[0xB2],
        ];
        for bytes in samples {
            round_trip(bytes, Platform::Snes);
        }
        assert_eq!(round_trip(&[0xB8, 0x00, 0x80, 0xC6], Platform::Snes).arg(0), Some(0xC6_8000));
    }

    #[test]
    fn decodes_at_an_offset() {
        let buf = [0xB2, 0x10, 0x05, 0x00];
        let (cmd, used) = decode(&buf, 1, Platform::Snes).unwrap();
        assert_eq!(used, 2);
        assert_eq!(cmd.opcode(), 0x10);
        assert_eq!(cmd.arg(0), Some(5));
    }

    #[test]
    fn mem_copy_carries_inline_data() {
        let bytes = [0x4E, 0x00, 0x02, 0x7E, 0x05, 0x00, 0xAA, 0xBB, 0xCC];
        let cmd = round_trip(&bytes, Platform::Snes);
        assert_eq!(cmd.arg_lens(), &[2, 1, 2, 3]);
        assert_eq!(cmd.args()[3], Operand::Data(vec![0xAA, 0xBB, 0xCC]));
    }

    #[test]
    fn color_math_modes() {
        let cmd = round_trip(&[0x2E, 0x40, 1, 2, 3, 4], Platform::Snes);
        assert_eq!(cmd.arg_lens().len(), 5);

        let cmd = round_trip(&[0x2E, 0x80, 0x01, 0x04, 0x00, 0xEE, 0xFF], Platform::Snes);
        assert_eq!(cmd.arg_lens(), &[1, 1, 2, 2]);
        assert_eq!(cmd.args()[3], Operand::Data(vec![0xEE, 0xFF]));

        let cmd = round_trip(&[0x2E, 0x80, 0x01, 0x04], Platform::Pc);
        assert_eq!(cmd.arg_lens(), &[1, 1, 1]);

        assert_eq!(
            decode(&[0x2E, 0x30, 0, 0, 0, 0], 0, Platform::Snes).unwrap_err(),
            DecodeError::UnknownMode {
                offset: 0,
                opcode: 0x2E,
                mode: 3
            }
        );
    }

    #[test]
    fn multi_mode_shapes() {
        assert_eq!(round_trip(&[0x88, 0x00], Platform::Snes).arg_lens(), &[1]);
        assert_eq!(round_trip(&[0x88, 0x20, 1, 2], Platform::Snes).arg_lens(), &[1, 1, 1]);
        assert_eq!(round_trip(&[0x88, 0x50, 1, 2, 3], Platform::Snes).arg_lens(), &[1, 1, 1, 1]);
        assert_eq!(round_trip(&[0x88, 0x80, 0x04, 9, 8, 7], Platform::Snes).arg_lens(), &[1, 1, 1, 2]);
        assert_eq!(round_trip(&[0x88, 0x80, 0x04], Platform::Pc).arg_lens(), &[1, 1]);
        assert!(matches!(
            decode(&[0x88, 0x70], 0, Platform::Snes),
            Err(DecodeError::UnknownMode { mode: 7, .. })
        ));
    }

    #[test]
    fn color_add_and_mode7_shapes() {
        assert_eq!(round_trip(&[0xF1, 0x00], Platform::Snes).arg_lens(), &[1]);
        assert_eq!(round_trip(&[0xF1, 0x1F, 0x04], Platform::Snes).arg_lens(), &[1, 1]);
        assert_eq!(round_trip(&[0xFF, 0x90, 1, 2, 3], Platform::Snes).arg_lens(), &[1, 1, 1, 1]);
        assert_eq!(round_trip(&[0xFF, 0x97, 1, 2], Platform::Snes).arg_lens(), &[1, 1, 1]);
        assert_eq!(round_trip(&[0xFF, 0x10], Platform::Snes).arg_lens(), &[1]);
    }

    #[test]
    fn pc_overrides_widen_operands() {
        let cmd = round_trip(&[0xC1, 0x34, 0x12], Platform::Pc);
        assert_eq!(cmd.arg(0), Some(0x1234));
        assert_eq!(round_trip(&[0xB8, 0x07], Platform::Pc).arg(0), Some(7));
        assert_eq!(round_trip(&[0x3A, 1, 2], Platform::Pc).arg_lens(), &[1, 1]);
        // On the cartridge 0x3A is a zero-operand alias.
        assert_eq!(round_trip(&[0x3A], Platform::Snes).arg_lens(), &[] as &[usize]);
    }

    #[test]
    fn underruns_are_decode_errors() {
        assert_eq!(
            decode(&[0x13, 0x01, 0x02], 0, Platform::Snes).unwrap_err(),
            DecodeError::Truncated {
                offset: 0,
                opcode: 0x13,
                needed: 6,
                available: 3
            }
        );
        assert!(matches!(
            decode(&[0x4E, 0x00, 0x02, 0x7E], 0, Platform::Snes),
            Err(DecodeError::Truncated { .. })
        ));
        assert!(matches!(
            decode(&[0x4E, 0x00, 0x02, 0x7E, 0x01, 0x00], 0, Platform::Snes),
            Err(DecodeError::BadLengthField { value: 1, .. })
        ));
        assert!(matches!(
            decode(&[0x00], 1, Platform::Snes),
            Err(DecodeError::OffsetOutOfRange { offset: 1, len: 1 })
        ));
    }

    #[test]
    fn length_always_matches_encoding() {
        for op in 0..=255u8 {
            if VARIABLE_SHAPE_OPCODES.contains(&op) {
                continue;
            }
            let lens = catalog::lookup(op).arg_lens;
            let values = vec![1u32; lens.len()];
            let cmd = Command::generic(op, &values).unwrap();
            assert_eq!(cmd.len(), cmd.encode().len(), "opcode {op:#04X}");
            let (back, used) = decode(&cmd.encode(), 0, Platform::Snes).unwrap();
            assert_eq!(used, cmd.len());
            assert_eq!(back, cmd);
        }
    }

    #[test]
    fn pc_length_always_matches_encoding() {
        for op in 0..=255u8 {
            if VARIABLE_SHAPE_OPCODES.contains(&op) {
                continue;
            }
            let lens = pc_arg_lens(op).unwrap_or(catalog::lookup(op).arg_lens);
            let args = lens.iter().map(|_| Operand::Value(1)).collect();
            let cmd = Command::new(op, lens.to_vec(), args).unwrap();
            let bytes = cmd.encode();
            assert_eq!(cmd.len(), bytes.len(), "opcode {op:#04X}");
            let (back, used) = decode(&bytes, 0, Platform::Pc).unwrap();
            assert_eq!(used, bytes.len(), "opcode {op:#04X}");
            assert_eq!(back, cmd);
        }
    }

    #[test]
    fn jump_targets_count_from_the_last_byte() {
        let fwd = Command::generic(0x10, &[3]).unwrap();
        assert_eq!(fwd.jump_target(0x40), Some(0x44));
        let back = Command::generic(0x11, &[5]).unwrap();
        assert_eq!(back.jump_target(0x40), Some(0x3C));
        let cond = Command::generic(0x12, &[1, 2, 3, 4]).unwrap();
        assert_eq!(cond.jump_target(0x40), Some(0x48));
        assert_eq!(Command::generic(0xB2, &[]).unwrap().jump_target(0), None);
    }

    #[test]
    fn operands_are_range_checked() {
        assert!(Command::generic(0x10, &[0x100]).is_err());
        assert!(Command::generic(0x10, &[1, 2]).is_err());
        let mut cmd = Command::generic(0xCD, &[0x1234]).unwrap();
        assert!(cmd.set_arg(0, 0x10000).is_err());
        cmd.set_arg(0, 0xFFFF).unwrap();
        assert_eq!(cmd.encode(), vec![0xCD, 0xFF, 0xFF]);
        assert!(Command::new(0x4E, vec![2, 1], vec![Operand::Data(vec![1, 2]), Operand::Value(1)]).is_err());
    }

    #[test]
    fn exact_match_ignores_jump_distance() {
        let a = Command::generic(0x12, &[1, 2, 3, 4]).unwrap();
        let b = Command::generic(0x12, &[1, 2, 3, 9]).unwrap();
        let c = Command::generic(0x12, &[1, 2, 5, 4]).unwrap();
        assert!(a.matches_ignoring_jump(&b));
        assert!(!a.matches_ignoring_jump(&c));
        let d = Command::generic(0xCA, &[1]).unwrap();
        assert!(!d.matches_ignoring_jump(&Command::generic(0xCA, &[2]).unwrap()));
    }

    #[test]
    fn display_is_a_one_line_disassembly() {
        let cmd = Command::generic(0x4B, &[0x7F0100, 0xABCD]).unwrap();
        assert_eq!(cmd.to_string(), "4B Assignment 7F0100 ABCD");
        let (copy, _) = decode(&[0x4E, 0x00, 0x02, 0x7E, 0x04, 0x00, 0x01, 0x02], 0, Platform::Snes).unwrap();
        assert_eq!(copy.to_string(), "4E Memory Copy 0200 7E 0004 [01 02]");
    }
}
