use thiserror::Error;

pub mod assembler;
pub mod catalog;
pub mod command;
mod constructors;
mod flux;
mod relocate;
pub mod rom;
pub mod script;
mod strings;

#[cfg(test)]
mod test_support;

pub use command::{decode, Command, DecodeError, Operand, Platform};
pub use assembler::{assemble, AsmError};
pub use constructors::{BoxPosition, FuncSync, Operation};
pub use rom::{Codec, FreeSpace};
pub use script::{CommandIter, Script, MAX_OBJECTS};
pub use strings::{free_script, SavedScript, StringBlockUsage};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("object {obj} out of range (script has {count} objects)")]
    ObjectOutOfRange { obj: usize, count: usize },

    #[error("function slot {func} out of range (0-15)")]
    FunctionOutOfRange { func: usize },

    #[error("script already holds the maximum of {max} objects")]
    TooManyObjects { max: usize },

    #[error("cannot remove the only object of a script")]
    LastObject,

    #[error("position {pos:#06X} outside the command area [{start:#06X}, {len:#06X}]")]
    PositionOutOfRange { pos: usize, start: usize, len: usize },

    #[error("deleting past the end of the script at {pos:#06X} (length {len:#06X})")]
    DeletePastEnd { pos: usize, len: usize },

    #[error("function {func} of object {obj} owns no bytes")]
    FunctionNotOwned { obj: usize, func: usize },

    #[error("deleting {len} bytes at {pos:#06X} runs past the end of function {func} of object {obj}")]
    CrossesFunctionEnd {
        obj: usize,
        func: usize,
        pos: usize,
        len: usize,
    },

    #[error("operand at {pos:#06X} cannot hold {value}")]
    OperandOverflow { pos: usize, value: i64 },

    #[error("script of {len} bytes exceeds the 16-bit offset range")]
    ScriptTooLarge { len: usize },

    #[error("malformed script header: {0}")]
    BadHeader(String),

    #[error("address {addr:#08X} is outside the source image ({len:#X} bytes)")]
    AddressOutOfRange { addr: usize, len: usize },

    #[error("string at {addr:#08X} has no terminator")]
    UnterminatedString { addr: usize },

    #[error("string index {index} out of range ({count} strings)")]
    StringOutOfRange { index: usize, count: usize },

    #[error("string count mismatch: {declared} declared, {found} present")]
    StringCountMismatch { declared: usize, found: usize },

    #[error("malformed flux file: {0}")]
    MalformedFlux(String),

    #[error("no free space for a block of {len} bytes")]
    NoFreeSpace { len: usize },

    #[error("codec error: {0}")]
    Codec(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, ScriptError>;
