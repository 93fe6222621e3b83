// Import of scripts saved by the Temporal Flux editor.
//
// Layout: a u16 script length at 0x13, the script itself (object count
// first) from 0x17, a string count byte right after the script, three
// unknown bytes, then one record per string: index, length, an optional
// length-extension byte, text.

use crate::command::Platform;
use crate::rom::read_le_at;
use crate::script::Script;
use crate::{Result, ScriptError};

const SCRIPT_LEN_AT: usize = 0x13;
const SCRIPT_START: usize = 0x17;
const STRING_RECORDS_SKIP: usize = 4;

// Extension bytes are unprintable; a value `b` adds 0x80 * (b - 1).
const EXTENSION_LIMIT: u8 = 12;

fn malformed(msg: impl Into<String>) -> ScriptError {
    ScriptError::MalformedFlux(msg.into())
}

impl Script {
    /// Builds a script from a `.flux` file. String text has its padding
    /// zeros dropped and is then converted by `encode_text`.
    pub fn from_flux(flux: &[u8], encode_text: impl Fn(&[u8]) -> Vec<u8>) -> Result<Script> {
        let len = read_le_at(flux, SCRIPT_LEN_AT, 2).map_err(|_| malformed("header is truncated"))? as usize;
        let end = SCRIPT_START + len;
        let bytes = flux
            .get(SCRIPT_START..end)
            .ok_or_else(|| malformed(format!("script of {len} bytes runs past the end of the file")))?;
        let mut script = Script::from_bytes(bytes, Platform::Snes)?;

        let declared = *flux
            .get(end)
            .ok_or_else(|| malformed("missing string count"))? as usize;
        let mut slots: Vec<Option<Vec<u8>>> = vec![None; declared];

        let byte_at = |pos: usize| {
            flux.get(pos)
                .copied()
                .ok_or_else(|| malformed(format!("string record truncated at {pos:#X}")))
        };
        let mut pos = end + STRING_RECORDS_SKIP;
        while pos < flux.len() {
            let index = byte_at(pos)? as usize;
            let mut text_len = byte_at(pos + 1)? as i64;
            pos += 2;
            let ext = byte_at(pos)?;
            if ext < EXTENSION_LIMIT {
                text_len += 0x80 * (ext as i64 - 1);
                pos += 1;
            }
            if text_len < 0 {
                return Err(malformed(format!("string {index} has negative length {text_len}")));
            }
            let text_end = pos + text_len as usize;
            let raw = flux
                .get(pos..text_end)
                .ok_or_else(|| malformed(format!("string {index} runs past the end of the file")))?;
            let text: Vec<u8> = raw.iter().copied().filter(|&b| b != 0).collect();

            let slot = slots
                .get_mut(index)
                .ok_or(ScriptError::StringCountMismatch {
                    declared,
                    found: index + 1,
                })?;
            *slot = Some(encode_text(&text));
            pos = text_end;
        }

        let found = slots.iter().filter(|s| s.is_some()).count();
        if found != declared {
            return Err(ScriptError::StringCountMismatch { declared, found });
        }
        script.strings = slots.into_iter().flatten().collect();
        script.strings_modified = true;
        Ok(script)
    }
}
