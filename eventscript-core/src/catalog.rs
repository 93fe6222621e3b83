// Instruction catalog for the event script VM.
//
// Every opcode maps to a descriptor holding its default operand widths.
// Thirty-odd opcodes are unimplemented in the VM and dispatch to the same
// handler as 0x01; they share that one descriptor here as well.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Unassigned,
    Animation,
    Assignment,
    Battle,
    BitMath,
    ByteMath,
    ChangeLocation,
    CheckButton,
    CheckInventory,
    CheckParty,
    CheckResult,
    CheckStoryline,
    Comparison,
    End,
    Facing,
    Goto,
    HpMp,
    Inventory,
    MemCopy,
    Mode7,
    ObjectCoordinates,
    ObjectFunction,
    Palette,
    Pause,
    PartyManagement,
    RandomNum,
    SceneManip,
    Sound,
    SpriteCollision,
    SpriteDrawing,
    SpriteMovement,
    Text,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Subcategory {
    Unassigned,
    Animation,
    AnimationLimiter,
    ResetAnimation,
    GetPc1,
    GetStoryline,
    MemToMemAssign,
    Result,
    SetStoryline,
    ValToMemAssign,
    Battle,
    BitMath,
    Downshift,
    SetAt,
    MemToMemByte,
    ValToMemByte,
    ChangeLocation,
    ChangeLocationFromMem,
    CheckButton,
    CheckParty,
    CheckResult,
    CheckStoryline,
    CheckDrawn,
    CheckInBattle,
    MemToMemComp,
    ValToMemComp,
    End,
    FaceObject,
    GetFacing,
    SetFacing,
    SetFacingFromMem,
    Goto,
    RestoreHpmp,
    Equip,
    GetAmount,
    CheckGold,
    AddGold,
    CheckItem,
    Item,
    ItemFromMem,
    MemCopy,
    MultiMode,
    DrawGeometry,
    Mode7,
    GetObjCoord,
    SetObjCoord,
    SetObjCoordFromMem,
    Activate,
    CallObjFunc,
    ScriptProcessing,
    ChangePalette,
    Pause,
    PartyManip,
    RandomNum,
    ColorAdd,
    ColorMath,
    CopyTiles,
    Darken,
    FadeOut,
    ScriptSpeed,
    ScrollLayers,
    ScrollLayers2f,
    ScrollScreen,
    ShakeScreen,
    WaitForAdd,
    Sound,
    WaitForSilence,
    SpriteCollision,
    DrawStatus,
    DrawStatusFromMem,
    LoadSprite,
    SpritePriority,
    Controllable,
    ExploreMode,
    Jump,
    Jump7b,
    MoveParty,
    MoveSprite,
    MoveSpriteFromMem,
    MoveTowardCoord,
    MoveTowardObj,
    ObjectFollow,
    ObjectMovementProperties,
    PartyFollow,
    Destination,
    VectorMove,
    VectorMoveFromMem,
    SetSpeed,
    SetSpeedFromMem,
    LoadAscii,
    SpecialDialog,
    StringIndex,
    Textbox,
    ColorCrash,
    Unknown,
}

/// Static description of one opcode.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Descriptor {
    pub opcode: u8,
    /// Default operand widths in bytes, before any per-occurrence resolution.
    pub arg_lens: &'static [usize],
    pub category: Category,
    pub subcategory: Subcategory,
    pub name: &'static str,
    pub description: &'static str,
}

impl Descriptor {
    pub fn default_len(&self) -> usize {
        1 + self.arg_lens.iter().sum::<usize>()
    }
}

/// Jumps whose final operand moves execution forward.
pub const FORWARD_JUMPS: [u8; 31] = [
    0x10, 0x12, 0x13, 0x14, 0x15, 0x16, 0x18, 0x1A, 0x27, 0x28, 0x2D, 0x30, 0x31, 0x34, 0x35,
    0x36, 0x37, 0x38, 0x39, 0x3B, 0x3C, 0x3F, 0x40, 0x41, 0x42, 0x43, 0x44, 0xC9, 0xCC, 0xCF,
    0xD2,
];

pub const BACKWARD_JUMPS: [u8; 1] = [0x11];

/// Text display commands. Their first operand is a string index.
pub const STRING_OPCODES: [u8; 6] = [0xBB, 0xC0, 0xC1, 0xC2, 0xC3, 0xC4];

/// Commands whose first operand is `2 * object_index`.
pub const OBJECT_OPCODES: [u8; 8] = [0x02, 0x03, 0x04, 0x7C, 0x7D, 0x0A, 0x0B, 0x0C];

pub const STRING_INDEX_OPCODE: u8 = 0xB8;

pub fn is_forward_jump(opcode: u8) -> bool {
    FORWARD_JUMPS.contains(&opcode)
}

pub fn is_backward_jump(opcode: u8) -> bool {
    BACKWARD_JUMPS.contains(&opcode)
}

pub fn is_jump(opcode: u8) -> bool {
    is_forward_jump(opcode) || is_backward_jump(opcode)
}

/// All jump opcodes, forward first.
pub fn jump_opcodes() -> Vec<u8> {
    FORWARD_JUMPS.iter().chain(BACKWARD_JUMPS.iter()).copied().collect()
}

/// True for opcodes that carry no descriptor of their own.
pub fn is_alias(opcode: u8) -> bool {
    opcode != 0x01 && matches!(CATALOG[opcode as usize], Entry::Shared)
}

pub fn lookup(opcode: u8) -> &'static Descriptor {
    match &CATALOG[opcode as usize] {
        Entry::Op(desc) => desc,
        Entry::Shared => &COLOR_CRASH,
    }
}

/// The descriptor every unimplemented opcode resolves to.
pub fn unknown() -> &'static Descriptor {
    &COLOR_CRASH
}

enum Entry {
    Op(Descriptor),
    Shared,
}

const fn def(
    opcode: u8,
    arg_lens: &'static [usize],
    category: Category,
    subcategory: Subcategory,
    name: &'static str,
    description: &'static str,
) -> Entry {
    Entry::Op(Descriptor {
        opcode,
        arg_lens,
        category,
        subcategory,
        name,
        description,
    })
}

static COLOR_CRASH: Descriptor = Descriptor {
    opcode: 0x01,
    arg_lens: &[],
    category: Category::Unknown,
    subcategory: Subcategory::ColorCrash,
    name: "Color Crash",
    description: "Crashes",
};

#[rustfmt::skip]
static CATALOG: [Entry; 256] = [
    def(0x00, &[], Category::End, Subcategory::End, "Return", "Returns context, but doesn't quit"),
    Entry::Shared, // 0x01
    def(0x02, &[1, 1], Category::ObjectFunction, Subcategory::CallObjFunc, "Call Event", "Call Event"),
    def(0x03, &[1, 1], Category::ObjectFunction, Subcategory::CallObjFunc, "Call Event", "Call Event"),
    def(0x04, &[1, 1], Category::ObjectFunction, Subcategory::CallObjFunc, "Call Event", "Call Event"),
    def(0x05, &[1, 1], Category::ObjectFunction, Subcategory::CallObjFunc, "Call PC Event", "Call PC Event"),
    def(0x06, &[1, 1], Category::ObjectFunction, Subcategory::CallObjFunc, "Call PC Event", "Call PC Event"),
    def(0x07, &[1, 1], Category::ObjectFunction, Subcategory::CallObjFunc, "Call PC Event", "Call PC Event"),
    def(0x08, &[], Category::ObjectFunction, Subcategory::Activate, "Object Deactivation", "Turn off object activate & touch (PC can't interact)"),
    def(0x09, &[], Category::ObjectFunction, Subcategory::Activate, "Object Activation", "Turn on object activate & touch.)"),
    def(0x0A, &[1], Category::SpriteDrawing, Subcategory::DrawStatus, "Remove Object", "Turn off object activate & touch (PC can't interact)"),
    def(0x0B, &[1], Category::ObjectFunction, Subcategory::ScriptProcessing, "Disable Processing", "Turn off script processing"),
    def(0x0C, &[1], Category::ObjectFunction, Subcategory::ScriptProcessing, "Enable Processing", "Turn on script processing"),
    def(0x0D, &[1], Category::SpriteMovement, Subcategory::ObjectMovementProperties, "NPC Movement Properties", "Unknown details"),
    def(0x0E, &[1], Category::SpriteMovement, Subcategory::Destination, "NPC Positioning", "Unknown details"),
    def(0x0F, &[], Category::Facing, Subcategory::SetFacing, "Set NPC Facing (up)", "Overlaps A6 "),
    def(0x10, &[1], Category::Goto, Subcategory::Goto, "Jump Forward", "Jumps execution forward"),
    def(0x11, &[1], Category::Goto, Subcategory::Goto, "Jump Backwards", "Jumps execution backwards"),
    def(0x12, &[1, 1, 1, 1], Category::Comparison, Subcategory::ValToMemComp, "If", "Jumps execution if condition evaluates false"),
    def(0x13, &[1, 2, 1, 1], Category::Comparison, Subcategory::ValToMemComp, "If", "Jumps execution if operation evaluates false"),
    def(0x14, &[1, 1, 1, 1], Category::Comparison, Subcategory::MemToMemComp, "If", "Jumps execution if operation evaluates false"),
    def(0x15, &[1, 1, 1, 1], Category::Comparison, Subcategory::MemToMemComp, "If", "Jumps execution if operation evaluates false"),
    def(0x16, &[1, 1, 1, 1], Category::Comparison, Subcategory::ValToMemComp, "If", "Jumps execution if condition evaluates false"),
    def(0x17, &[], Category::Facing, Subcategory::SetFacing, "Set NPC Facing (down)", "Overlaps A6 "),
    def(0x18, &[1, 1], Category::CheckStoryline, Subcategory::CheckStoryline, "Check Storyline", "Overlaps A6 "),
    def(0x19, &[1], Category::Assignment, Subcategory::Result, "Get Result", "Overlaps 1C "),
    def(0x1A, &[1, 1], Category::CheckResult, Subcategory::CheckResult, "Jump Result", "Jumps if result does not match target"),
    def(0x1B, &[], Category::Facing, Subcategory::SetFacing, "Set NPC Facing (left)", "Overlaps A6 "),
    def(0x1C, &[2], Category::Assignment, Subcategory::Result, "Get Result", "Overlapped by 0x19"),
    def(0x1D, &[], Category::Facing, Subcategory::SetFacing, "Set NPC Facing (right)", "Overlaps A6 "),
    def(0x1E, &[1], Category::Facing, Subcategory::SetFacing, "Set NPC Facing (up)", "Overlaps A6"),
    def(0x1F, &[1], Category::Facing, Subcategory::SetFacing, "Set NPC Facing (down)", "Overlaps A6"),
    def(0x20, &[1], Category::Assignment, Subcategory::GetPc1, "Get PC1", "Gets PC1 id and stores in memory"),
    def(0x21, &[1, 1, 1], Category::ObjectCoordinates, Subcategory::GetObjCoord, "Get Object Coords", "Store object coords to memory"),
    def(0x22, &[1, 1, 1], Category::ObjectCoordinates, Subcategory::GetObjCoord, "Get PC Coords", "Store PC coords to memory"),
    def(0x23, &[1, 1], Category::Facing, Subcategory::GetFacing, "Get Obj Facing", "Store object facing to memory"),
    def(0x24, &[1, 1], Category::Facing, Subcategory::GetFacing, "Get PC Facing", "Store PC facing to memory"),
    def(0x25, &[1], Category::Facing, Subcategory::SetFacing, "Set NPC Facing (left)", "Overlaps A6"),
    def(0x26, &[1], Category::Facing, Subcategory::SetFacing, "Set NPC Facing (right)", "Overlaps A6"),
    def(0x27, &[1, 1], Category::Comparison, Subcategory::CheckDrawn, "Check Object Status", "Jump when object is not visible(offcreen, not loaded, hidden)"),
    def(0x28, &[1, 1], Category::Comparison, Subcategory::CheckInBattle, "Check Battle Range", "Jump when object is out or range for battle"),
    def(0x29, &[1], Category::Text, Subcategory::LoadAscii, "Load ASCII text", "Loads ASCII text from 0x3DA000"),
    def(0x2A, &[], Category::BitMath, Subcategory::SetAt, "Unknown 0x2A", "Sets 0x04 Bit of 0x7E0154"),
    def(0x2B, &[], Category::BitMath, Subcategory::SetAt, "Unknown 0x2B", "Sets 0x08 Bit of 0x7E0154"),
    def(0x2C, &[1, 1], Category::Unknown, Subcategory::Unknown, "Unknown 0x2C", "Unknown"),
    def(0x2D, &[1], Category::CheckButton, Subcategory::CheckButton, "Check Button Pressed", "Jumps if no buttons are pressed (0x7E00F8"),
    def(0x2E, &[1], Category::SceneManip, Subcategory::ColorMath, "Color Math", ""),
    def(0x2F, &[1, 1], Category::SceneManip, Subcategory::ScrollLayers2f, "Unknown 0x2F", "Unknown"),
    def(0x30, &[1], Category::CheckButton, Subcategory::CheckButton, "Jump No Dash", "Jump if dash is not pressed"),
    def(0x31, &[1], Category::CheckButton, Subcategory::CheckButton, "Jump No Confirm", "Jump if confirm button is not pressed"),
    def(0x32, &[], Category::BitMath, Subcategory::SetAt, "Unknown 0x32", "Overlaps 0x2A, sets 0x10 Bit of 0x7E0154"),
    def(0x33, &[1], Category::Palette, Subcategory::ChangePalette, "Change Palette", "Changes the calling object's palette"),
    def(0x34, &[1], Category::CheckButton, Subcategory::CheckButton, "Jump A Button", "Jump if A is not pressed"),
    def(0x35, &[1], Category::CheckButton, Subcategory::CheckButton, "Jump B Button", "Jump if B is not pressed"),
    def(0x36, &[1], Category::CheckButton, Subcategory::CheckButton, "Jump X Button", "Jump if X is not pressed"),
    def(0x37, &[1], Category::CheckButton, Subcategory::CheckButton, "Jump Y Button", "Jump if Y is not pressed"),
    def(0x38, &[1], Category::CheckButton, Subcategory::CheckButton, "Jump L Button", "Jump if L is not pressed"),
    def(0x39, &[1], Category::CheckButton, Subcategory::CheckButton, "Jump R Button", "Jump if R is not pressed"),
    Entry::Shared, // 0x3A
    def(0x3B, &[1], Category::CheckButton, Subcategory::CheckButton, "Jump No Dash", "Jump if dash has not been pressed since last check"),
    def(0x3C, &[1], Category::CheckButton, Subcategory::CheckButton, "Jump No Confirm", "Jump if confirm has not been pressed since last check"),
    Entry::Shared, // 0x3D
    Entry::Shared, // 0x3E
    def(0x3F, &[1], Category::CheckButton, Subcategory::CheckButton, "Jump No A", "Jump if A has not been pressed since last check"),
    def(0x40, &[1], Category::CheckButton, Subcategory::CheckButton, "Jump No B", "Jump if B has not been pressed since last check"),
    def(0x41, &[1], Category::CheckButton, Subcategory::CheckButton, "Jump No X", "Jump if X has not been pressed since last check"),
    def(0x42, &[1], Category::CheckButton, Subcategory::CheckButton, "Jump No Y", "Jump if Y has not been pressed since last check"),
    def(0x43, &[1], Category::CheckButton, Subcategory::CheckButton, "Jump No L", "Jump if L has not been pressed since last check"),
    def(0x44, &[1], Category::CheckButton, Subcategory::CheckButton, "Jump No R", "Jump if R has not been pressed since last check"),
    Entry::Shared, // 0x45
    Entry::Shared, // 0x46
    def(0x47, &[1], Category::Animation, Subcategory::AnimationLimiter, "Animation Limiter", "Limits which animations can be performed"),
    def(0x48, &[3, 1], Category::Assignment, Subcategory::MemToMemAssign, "Assignment", "Assign from any address to local script memory (1 byte)"),
    def(0x49, &[3, 1], Category::Assignment, Subcategory::MemToMemAssign, "Assignment", "Assign from any address to local script memory (2 bytes)"),
    def(0x4A, &[3, 1], Category::Assignment, Subcategory::ValToMemAssign, "Assignment", "Assign value (1 byte) to any memory address"),
    def(0x4B, &[3, 2], Category::Assignment, Subcategory::ValToMemAssign, "Assignment", "Assign value (2 byte) to any memory address"),
    def(0x4C, &[3, 1], Category::Assignment, Subcategory::MemToMemAssign, "Assignment", "Assign value (1 byte) to local script memory"),
    def(0x4D, &[3, 1], Category::Assignment, Subcategory::MemToMemAssign, "Assignment", "Assign value (2 bytes) to local script memory"),
    def(0x4E, &[2, 1, 2, 1], Category::MemCopy, Subcategory::MemCopy, "Memory Copy", "Copy data from script to memory"),
    def(0x4F, &[1, 1], Category::Assignment, Subcategory::ValToMemAssign, "Assignment (Val to Mem)", "Assign value (1 byte) to local script memory"),
    def(0x50, &[2, 1], Category::Assignment, Subcategory::ValToMemAssign, "Assignment (Val to Mem)", "Assign value (2 bytes) to local script memory"),
    def(0x51, &[1, 1], Category::Assignment, Subcategory::MemToMemAssign, "Assignment (Mem to Mem)", "Assign local memory to local memory (1 byte)"),
    def(0x52, &[1, 1], Category::Assignment, Subcategory::MemToMemAssign, "Assignment (Mem to Mem)", "Assign local memory to local memory (2 bytes)"),
    def(0x53, &[2, 1], Category::Assignment, Subcategory::MemToMemAssign, "Assignment (Mem to Mem)", "Assign bank 7F memory to local memory (1 byte)"),
    def(0x54, &[2, 1], Category::Assignment, Subcategory::MemToMemAssign, "Assignment (Mem to Mem)", "Assign bank 7F memory to local memory (2 bytes)"),
    def(0x55, &[1], Category::Assignment, Subcategory::GetStoryline, "Get Storyline Counter", "Assign storyline counter to local memory"),
    def(0x56, &[1, 2], Category::Assignment, Subcategory::ValToMemAssign, "Assignment (Value to Mem)", "Assign value to bank 7F memory"),
    def(0x57, &[], Category::SpriteDrawing, Subcategory::LoadSprite, "Load Crono", "Load Crono if in party"),
    def(0x58, &[1, 2], Category::Assignment, Subcategory::MemToMemAssign, "Assignment (Mem to Mem)", "Assign local memory to bank 7F memory (1 byte)"),
    def(0x59, &[1, 2], Category::Assignment, Subcategory::MemToMemAssign, "Assignment (Mem to Mem)", "Assign local memory to bank 7F memory (2 bytes)"),
    def(0x5A, &[1], Category::Assignment, Subcategory::SetStoryline, "Assign Storyline", "Assign value to storyline (0x7F0000)"),
    def(0x5B, &[1, 1], Category::ByteMath, Subcategory::ValToMemByte, "Add (Val to Mem)", "Add a value to local memory"),
    def(0x5C, &[], Category::SpriteDrawing, Subcategory::LoadSprite, "Load Marle", "Load Marle if in party"),
    def(0x5D, &[1, 1], Category::ByteMath, Subcategory::MemToMemByte, "Add (Mem to Mem)", "Add from local memory to local memory (1 byte)"),
    def(0x5E, &[1, 1], Category::ByteMath, Subcategory::MemToMemByte, "Add (Mem to Mem)", "Add from local memory to local memory (2 bytes)"),
    def(0x5F, &[1, 1], Category::ByteMath, Subcategory::ValToMemByte, "Subtract (Val to Mem)", "Subtract a value from local memory (1 byte)"),
    def(0x60, &[2, 1], Category::ByteMath, Subcategory::ValToMemByte, "Subtract (Val to Mem)", "Subtract a value from local memory (2 bytes)"),
    def(0x61, &[1, 1], Category::ByteMath, Subcategory::MemToMemByte, "Add (Mem to Mem)", "Subtract local memory from local memory (1 byte?)"),
    def(0x62, &[], Category::SpriteDrawing, Subcategory::LoadSprite, "Load Lucca", "Load Lucca if in party"),
    def(0x63, &[1, 1], Category::BitMath, Subcategory::BitMath, "Set Bit", "Set bit in local memory"),
    def(0x64, &[1, 1], Category::BitMath, Subcategory::BitMath, "Reset Bit", "Reset bit in local memory"),
    def(0x65, &[1, 1], Category::BitMath, Subcategory::BitMath, "Set Bit", "Set bit in bank 7F"),
    def(0x66, &[1, 1], Category::BitMath, Subcategory::BitMath, "Reset Bit", "Reset bit in bank 7F"),
    def(0x67, &[1, 1], Category::BitMath, Subcategory::BitMath, "Reset Bits", "Reset bits in local memory"),
    def(0x68, &[], Category::SpriteDrawing, Subcategory::LoadSprite, "Load Frog", "Load Frog if in party"),
    def(0x69, &[1, 1], Category::BitMath, Subcategory::BitMath, "Set Bits", "Set bits in local memory"),
    def(0x6A, &[], Category::SpriteDrawing, Subcategory::LoadSprite, "Load Robo", "Load Robo if in party"),
    def(0x6B, &[1, 1], Category::BitMath, Subcategory::BitMath, "Toggle Bits", "Toggle bits in local memory"),
    def(0x6C, &[], Category::SpriteDrawing, Subcategory::LoadSprite, "Load Ayla", "Load Ayla if in party"),
    def(0x6D, &[], Category::SpriteDrawing, Subcategory::LoadSprite, "Load Magus", "Load Magus if in party"),
    Entry::Shared, // 0x6E
    def(0x6F, &[1, 1], Category::BitMath, Subcategory::Downshift, "Shift Bits", "Shift bits in local memory"),
    Entry::Shared, // 0x70
    def(0x71, &[1], Category::ByteMath, Subcategory::ValToMemByte, "Increment", "Increment local memory (1 byte)"),
    def(0x72, &[1], Category::ByteMath, Subcategory::ValToMemByte, "Increment", "Increment local memory (2 bytes)"),
    def(0x73, &[1], Category::ByteMath, Subcategory::ValToMemByte, "Decrement", "Decrement local memory (1 byte)"),
    Entry::Shared, // 0x74
    def(0x75, &[1], Category::Assignment, Subcategory::ValToMemAssign, "Set Byte", "Set local memory to 1 (0xFF?) (1 byte)"),
    def(0x76, &[1], Category::Assignment, Subcategory::ValToMemAssign, "Set Byte", "Set local memory to 1 (0xFF?) (2 bytes)"),
    def(0x77, &[1], Category::Assignment, Subcategory::ValToMemAssign, "Reset Byte", "Reset local memory to 0 (1 byte?)"),
    Entry::Shared, // 0x78
    Entry::Shared, // 0x79
    def(0x7A, &[1, 1, 1], Category::SpriteMovement, Subcategory::Jump, "NPC Jump", "Jump NPC to an unoccupied, walkable spot"),
    def(0x7B, &[1, 1, 1, 1], Category::SpriteMovement, Subcategory::Jump7b, "NPC Jump", "Unused command related to NPC jumping"),
    def(0x7C, &[1], Category::SpriteDrawing, Subcategory::DrawStatusFromMem, "Turn Drawing On", "Turn drawing on for the given object"),
    def(0x7D, &[1], Category::SpriteDrawing, Subcategory::DrawStatusFromMem, "Turn Drawing Off", "Turn drawing off for the given object"),
    def(0x7E, &[], Category::SpriteDrawing, Subcategory::DrawStatus, "Turn Drawing Off", "Turn drawing off"),
    def(0x7F, &[1], Category::RandomNum, Subcategory::RandomNum, "Random", "Load random data into local memory"),
    def(0x80, &[1], Category::SpriteDrawing, Subcategory::LoadSprite, "Load PC", "Load PC if the PC is in the party"),
    def(0x81, &[1], Category::SpriteDrawing, Subcategory::LoadSprite, "Load PC", "Load PC regardless of party status"),
    def(0x82, &[1], Category::SpriteDrawing, Subcategory::LoadSprite, "Load NPC", "Load NPC"),
    def(0x83, &[1, 1], Category::SpriteDrawing, Subcategory::LoadSprite, "Load Enemy", "Load Enemy into given target slot"),
    def(0x84, &[1], Category::SpriteCollision, Subcategory::SpriteCollision, "NPC Solidity", "Alter NPC solidity properties"),
    Entry::Shared, // 0x85
    Entry::Shared, // 0x86
    def(0x87, &[1], Category::SceneManip, Subcategory::ScriptSpeed, "Script Speed", "Alter speed of script execution"),
    def(0x88, &[1], Category::MemCopy, Subcategory::MultiMode, "Mem Copy", ""),
    def(0x89, &[1], Category::SpriteMovement, Subcategory::SetSpeed, "NPC Speed", "Alter speed of NPCs"),
    def(0x8A, &[1], Category::SpriteMovement, Subcategory::SetSpeedFromMem, "NPC Speed", "Alter speed of NPCs from local memory"),
    def(0x8B, &[1, 1], Category::ObjectCoordinates, Subcategory::SetObjCoord, "Set Object Position", "Place object at given coordinates"),
    def(0x8C, &[1, 1], Category::ObjectCoordinates, Subcategory::SetObjCoordFromMem, "Set Object Position", "Place object at given coordinates from local memory"),
    def(0x8D, &[2, 2], Category::ObjectCoordinates, Subcategory::SetObjCoord, "Set Object Pixel Position", "Place object at given pixel coordinates"),
    def(0x8E, &[1], Category::SpriteDrawing, Subcategory::SpritePriority, "Set Sprite Priority", "Set Sprite Priority"),
    def(0x8F, &[1], Category::SpriteMovement, Subcategory::ObjectFollow, "Follow at Distance", "Follow the given character at a distance"),
    def(0x90, &[], Category::SpriteDrawing, Subcategory::DrawStatus, "Drawing On", "Turn object drawing on"),
    def(0x91, &[], Category::SpriteDrawing, Subcategory::DrawStatus, "Drawing On", "Turn object drawing off"),
    def(0x92, &[1, 1], Category::SpriteMovement, Subcategory::VectorMove, "Vector Move", "Move object along given vector"),
    Entry::Shared, // 0x93
    def(0x94, &[1], Category::SpriteMovement, Subcategory::ObjectFollow, "Follow Object", "Follow the given object"),
    def(0x95, &[1], Category::SpriteMovement, Subcategory::ObjectFollow, "Follow PC", "Follow the given PC"),
    def(0x96, &[1, 1], Category::SpriteMovement, Subcategory::MoveSprite, "NPC move", "Move the given NPC (to given coordinates? vector?)"),
    def(0x97, &[1, 1], Category::SpriteMovement, Subcategory::MoveSpriteFromMem, "NPC move", "Move the given NPC with coordinates from local memory"),
    def(0x98, &[1, 1], Category::SpriteMovement, Subcategory::MoveTowardObj, "Move Toward", "Move toward the given object"),
    def(0x99, &[1, 1], Category::SpriteMovement, Subcategory::MoveTowardObj, "Move Toward", "Move toward the given PC"),
    def(0x9A, &[1, 1], Category::SpriteMovement, Subcategory::MoveTowardCoord, "Move Toward Coordinates", "Move toward the given coordinates"),
    Entry::Shared, // 0x9B
    def(0x9C, &[1, 1], Category::SpriteMovement, Subcategory::VectorMove, "Vector Move", "Move object along given vector"),
    def(0x9D, &[1, 1], Category::SpriteMovement, Subcategory::VectorMoveFromMem, "Vector Move", "Move object along given vector"),
    def(0x9E, &[1], Category::SpriteMovement, Subcategory::MoveTowardObj, "Vector Move to Object", "Move to given object"),
    def(0x9F, &[1], Category::SpriteMovement, Subcategory::MoveTowardObj, "Vector Move to Object", "Move to given object"),
    def(0xA0, &[1, 1], Category::SpriteMovement, Subcategory::MoveSprite, "Animated Move", "Move while playing an animation"),
    def(0xA1, &[1, 1], Category::SpriteMovement, Subcategory::MoveSpriteFromMem, "Animated Move", "Move while playing an animation"),
    Entry::Shared, // 0xA2
    Entry::Shared, // 0xA3
    Entry::Shared, // 0xA4
    Entry::Shared, // 0xA5
    def(0xA6, &[1], Category::Facing, Subcategory::SetFacing, "NPC Facing", "Set NPC facing"),
    def(0xA7, &[1], Category::Facing, Subcategory::SetFacingFromMem, "NPC Facing", "Set NPC facing"),
    def(0xA8, &[1], Category::Facing, Subcategory::FaceObject, "NPC Facing", "Set NPC to face object"),
    def(0xA9, &[1], Category::Facing, Subcategory::FaceObject, "NPC Facing", "Set NPC to face PC"),
    def(0xAA, &[1], Category::Animation, Subcategory::Animation, "Animation", "Play animation"),
    def(0xAB, &[1], Category::Animation, Subcategory::Animation, "Animation", "Play animation"),
    def(0xAC, &[1], Category::Animation, Subcategory::Animation, "Static Animation", "Play static animation"),
    def(0xAD, &[1], Category::Pause, Subcategory::Pause, "Pause", "Pause"),
    def(0xAE, &[], Category::Animation, Subcategory::ResetAnimation, "Reset Animation", "Resets the object's animation"),
    def(0xAF, &[], Category::SpriteMovement, Subcategory::Controllable, "Exploration", "Allows player to control PCs (single controller check)"),
    def(0xB0, &[], Category::SpriteMovement, Subcategory::Controllable, "Exploration", "Allows player to control PCs (infinite controller check)"),
    def(0xB1, &[], Category::End, Subcategory::End, "Break", "End command for arbitrary access contexts"),
    def(0xB2, &[], Category::End, Subcategory::End, "End", "End command for arbitrary access contexts"),
    def(0xB3, &[], Category::Animation, Subcategory::Animation, "Animation", "Should be equivalent to 0xAA with hardcoded 00"),
    def(0xB4, &[], Category::Animation, Subcategory::Animation, "Animation", "Should be equivalent to 0xAA with hardcoded 01"),
    def(0xB5, &[1], Category::SpriteMovement, Subcategory::ObjectFollow, "Move to Object", "Loops 0x94"),
    def(0xB6, &[1], Category::SpriteMovement, Subcategory::ObjectFollow, "Move to PC", "Loops 0x95"),
    def(0xB7, &[1, 1], Category::Animation, Subcategory::Animation, "Loop Animation", "Play animation some number of times"),
    def(0xB8, &[3], Category::Text, Subcategory::StringIndex, "String Index", "Sets String Index"),
    def(0xB9, &[], Category::Pause, Subcategory::Pause, "Pause 1/4", "Pauses 1/4 second"),
    def(0xBA, &[], Category::Pause, Subcategory::Pause, "Pause 1/2", "Pauses 1/2 second"),
    def(0xBB, &[1], Category::Text, Subcategory::Textbox, "Personal Textbox", "Displays textbox"),
    def(0xBC, &[], Category::Pause, Subcategory::Pause, "Pause 1", "Pauses 1 second"),
    def(0xBD, &[], Category::Pause, Subcategory::Pause, "Pause 2", "Pauses 2 seconds"),
    Entry::Shared, // 0xBE
    Entry::Shared, // 0xBF
    def(0xC0, &[1, 1], Category::Text, Subcategory::Textbox, "Dec Box Auto", "Decision box"),
    def(0xC1, &[1], Category::Text, Subcategory::Textbox, "Textbox Top", "Textbox displayed at top of screen"),
    def(0xC2, &[1], Category::Text, Subcategory::Textbox, "Textbox Bottom", "Textbox displayed at bottom of screen"),
    def(0xC3, &[1, 1], Category::Text, Subcategory::Textbox, "Dec Box Auto", "Decision box at top"),
    def(0xC4, &[1, 1], Category::Text, Subcategory::Textbox, "Dec Box Bottom", "Decision box at bottom"),
    Entry::Shared, // 0xC5
    Entry::Shared, // 0xC6
    def(0xC7, &[1], Category::Inventory, Subcategory::ItemFromMem, "Add Item", "Add item stored in local memory to inventory"),
    def(0xC8, &[1], Category::Text, Subcategory::SpecialDialog, "Special Dialog", "Special Dialog"),
    def(0xC9, &[1, 1], Category::Inventory, Subcategory::CheckItem, "Check Inventory", "Jump if item not present in inventory"),
    def(0xCA, &[1], Category::Inventory, Subcategory::Item, "Add Item", "Add item to inventory"),
    def(0xCB, &[1], Category::Inventory, Subcategory::Item, "Remove Item", "Remove item from inventory"),
    def(0xCC, &[2, 1], Category::Inventory, Subcategory::CheckGold, "Check Gold", "Jump if the player does not have enough gold"),
    def(0xCD, &[2], Category::Inventory, Subcategory::AddGold, "Add Gold", "Add Gold"),
    def(0xCE, &[2], Category::Inventory, Subcategory::AddGold, "Remove Gold", "Remove Gold"),
    def(0xCF, &[1, 1], Category::CheckParty, Subcategory::CheckParty, "Check Recruited", "Check if a PC is recruited"),
    def(0xD0, &[1], Category::PartyManagement, Subcategory::PartyManip, "Add Reserve", "Add PC to the reserve party"),
    def(0xD1, &[1], Category::PartyManagement, Subcategory::PartyManip, "Remove PC", "Remove PC (from party? recruited?)"),
    def(0xD2, &[1, 1], Category::CheckParty, Subcategory::CheckParty, "Check Active PC", "Jump if PC not active"),
    def(0xD3, &[1], Category::PartyManagement, Subcategory::PartyManip, "Add PC to Party", "Add PC to Party"),
    def(0xD4, &[1], Category::PartyManagement, Subcategory::PartyManip, "Move to Reserve", "Move PC to reserve party"),
    def(0xD5, &[1, 1], Category::Inventory, Subcategory::Equip, "Equip Item", "Equip PC with an item"),
    def(0xD6, &[1], Category::PartyManagement, Subcategory::PartyManip, "Remove Active PC", "Remove PC from active party"),
    def(0xD7, &[1, 1], Category::Inventory, Subcategory::GetAmount, "Get Item Quantity", "Get quantity of item in inventory"),
    def(0xD8, &[1, 1], Category::Battle, Subcategory::Battle, "Battle", "Battle"),
    def(0xD9, &[1, 1, 1, 1, 1, 1], Category::SpriteMovement, Subcategory::MoveParty, "Move Party", "Move party to specified coordinates"),
    def(0xDA, &[], Category::SpriteMovement, Subcategory::PartyFollow, "Party Follow", "Makes PC2 and PC3 follow PC1"),
    Entry::Shared, // 0xDB
    def(0xDC, &[2, 1, 1], Category::ChangeLocation, Subcategory::ChangeLocation, "Change Location", "Instantly moves party to another location"),
    def(0xDD, &[2, 1, 1], Category::ChangeLocation, Subcategory::ChangeLocation, "Change Location", "Instantly moves party to another location"),
    def(0xDE, &[2, 1, 1], Category::ChangeLocation, Subcategory::ChangeLocation, "Change Location", "Instantly moves party to another location"),
    def(0xDF, &[2, 1, 1], Category::ChangeLocation, Subcategory::ChangeLocation, "Change Location", "Instantly moves party to another location"),
    def(0xE0, &[2, 1, 1], Category::ChangeLocation, Subcategory::ChangeLocation, "Change Location", "Instantly moves party to another location"),
    def(0xE1, &[2, 1, 1], Category::ChangeLocation, Subcategory::ChangeLocation, "Change Location", "Instantly moves party to another location"),
    def(0xE2, &[1, 1, 1, 1], Category::ChangeLocation, Subcategory::ChangeLocationFromMem, "Change Location", "Instantly moves party to another location"),
    def(0xE3, &[1], Category::SpriteMovement, Subcategory::ExploreMode, "Explore Mode", "Set whether the party can freely move"),
    def(0xE4, &[1, 1, 1, 1, 1, 1, 1], Category::SceneManip, Subcategory::CopyTiles, "Copy Tiles", "Copies tiles (from data onto map?)"),
    def(0xE5, &[1, 1, 1, 1, 1, 1, 1], Category::SceneManip, Subcategory::CopyTiles, "Copy Tiles", "Copies tiles (from data onto map?)"),
    def(0xE6, &[2, 1, 1], Category::SceneManip, Subcategory::ScrollLayers, "Scroll Layers", "Scroll Layers"),
    def(0xE7, &[1, 1], Category::SceneManip, Subcategory::ScrollScreen, "Scroll Screen", "Scroll Screen"),
    def(0xE8, &[1], Category::Sound, Subcategory::Sound, "Play Sound", "Plays a sound"),
    Entry::Shared, // 0xE9
    def(0xEA, &[1], Category::Sound, Subcategory::Sound, "Play Song", "Plays a song"),
    def(0xEB, &[1, 1], Category::Sound, Subcategory::Sound, "Change Volume", "Change Volume"),
    def(0xEC, &[1, 1, 1], Category::Sound, Subcategory::Sound, "All Purpose Sound", "All Purpose Sound Command"),
    def(0xED, &[], Category::Sound, Subcategory::WaitForSilence, "Wait for Silence", "Wait for Silence"),
    def(0xEE, &[], Category::Sound, Subcategory::WaitForSilence, "Wait for Song End", "Wait for Song End"),
    Entry::Shared, // 0xEF
    def(0xF0, &[1], Category::SceneManip, Subcategory::Darken, "Darken Screen", "Darken Screen"),
    def(0xF1, &[1, 1], Category::SceneManip, Subcategory::ColorAdd, "Color Addition", "Color Addition"),
    def(0xF2, &[], Category::SceneManip, Subcategory::FadeOut, "Fade Out", "Fade Out"),
    def(0xF3, &[], Category::SceneManip, Subcategory::WaitForAdd, "Wait for Brighten End", "Wait for brighten end"),
    def(0xF4, &[1], Category::SceneManip, Subcategory::ShakeScreen, "Shake Screen", "Shake screen"),
    Entry::Shared, // 0xF5
    Entry::Shared, // 0xF6
    Entry::Shared, // 0xF7
    def(0xF8, &[], Category::HpMp, Subcategory::RestoreHpmp, "Restore hp/mp", "Restore hp/mp"),
    def(0xF9, &[], Category::HpMp, Subcategory::RestoreHpmp, "Restore hp", "Restore hp"),
    def(0xFA, &[], Category::HpMp, Subcategory::RestoreHpmp, "Restore mp", "Restore mp"),
    Entry::Shared, // 0xFB
    Entry::Shared, // 0xFC
    Entry::Shared, // 0xFD
    def(0xFE, &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1], Category::Mode7, Subcategory::DrawGeometry, "Unknown Geometry", "Something relating to on screen geometry"),
    def(0xFF, &[1], Category::Mode7, Subcategory::Mode7, "Mode 7 Scene", "Mode 7 Scene"),
];
