use crate::u4;

/// A raw 16-bit instruction word split into its operand fields.
///
/// Layout: `GXYN`, where `NN` is the low byte and `NNN` the low 12 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction(pub u16);

impl Instruction {
    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }

    /// The leading nibble selecting the instruction family.
    pub fn group(self) -> u4 {
        u4::low((self.0 >> 12) as u8)
    }

    pub fn x(self) -> u4 {
        u4::low((self.0 >> 8) as u8)
    }

    pub fn y(self) -> u4 {
        u4::low((self.0 >> 4) as u8)
    }

    pub fn n(self) -> u4 {
        u4::low(self.0 as u8)
    }

    pub fn nn(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    pub fn nnn(self) -> u16 {
        self.0 & 0x0FFF
    }
}

/// A decoded instruction, named by what it does.
///
/// Operand fields keep the names of the encoding slots they came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// `00E0`
    ClearDisplay,
    /// `00EE`: pop the return address.
    Return,
    /// `1nnn`
    Jump { nnn: u16 },
    /// `2nnn`: push PC, then jump.
    Call { nnn: u16 },
    /// `Bnnn`: jump to nnn + V0.
    JumpWithOffset { nnn: u16 },

    /// `3xnn`
    SkipRegEqualImm { x: u4, nn: u8 },
    /// `4xnn`
    SkipRegNotEqualImm { x: u4, nn: u8 },
    /// `5xy0`
    SkipRegEqualReg { x: u4, y: u4 },
    /// `9xy0`
    SkipRegNotEqualReg { x: u4, y: u4 },

    /// `6xnn`
    SetRegImm { x: u4, nn: u8 },
    /// `7xnn`: wrapping add, VF untouched.
    AddRegImm { x: u4, nn: u8 },
    /// `8xyN`
    ALU { x: u4, y: u4, op: OpcodeALU },
    /// `Cxnn`: random byte masked with nn.
    Random { x: u4, nn: u8 },

    /// `Annn`
    SetIndexImm { nnn: u16 },
    /// `Fx1E`
    AddIndexReg { x: u4 },

    /// `Dxyn`: XOR an n-row sprite from I at (Vx, Vy).
    Draw { x: u4, y: u4, n: u4 },

    /// `Ex9E`
    SkipIfPressed { x: u4 },
    /// `ExA1`
    SkipIfNotPressed { x: u4 },
    /// `Fx0A`: blocks by re-running itself.
    WaitForKey { x: u4 },

    /// `Fx07`
    ReadDelayTimer { x: u4 },
    /// `Fx15`
    SetDelayTimer { x: u4 },
    /// `Fx18`
    SetSoundTimer { x: u4 },

    /// `Fx29`: point I at the glyph for the low nibble of Vx.
    FontChar { x: u4 },
    /// `Fx33`
    BCD { x: u4 },
    /// `Fx55`: V0..=Vx to memory at I.
    StoreRegs { x: u4 },
    /// `Fx65`: memory at I to V0..=Vx.
    LoadRegs { x: u4 },

    /// No pattern matched, including 0nnn machine-code calls.
    Invalid(u16),
}

/// The `N` selector of an `8xyN` instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpcodeALU {
    Set,
    Or,
    And,
    Xor,
    /// VF = carry
    Add,
    /// Vx - Vy, VF = no borrow
    Sub,
    /// VF = bit shifted out
    ShiftRight,
    /// Vy - Vx, VF = no borrow
    SubReverse,
    /// VF = bit shifted out
    ShiftLeft,
}

impl OpcodeALU {
    /// Maps the low nibble of an `8xyN` word, `None` for the unassigned ones.
    pub fn from_nibble(n: u4) -> Option<Self> {
        Some(match n.get() {
            0x0 => Self::Set,
            0x1 => Self::Or,
            0x2 => Self::And,
            0x3 => Self::Xor,
            0x4 => Self::Add,
            0x5 => Self::Sub,
            0x6 => Self::ShiftRight,
            0x7 => Self::SubReverse,
            0xE => Self::ShiftLeft,
            _ => return None,
        })
    }
}

impl From<Instruction> for Opcode {
    fn from(ins: Instruction) -> Self {
        let (x, y) = (ins.x(), ins.y());

        let decoded = match ins.group().get() {
            0x0 => match ins.nnn() {
                0x0E0 => Some(Opcode::ClearDisplay),
                0x0EE => Some(Opcode::Return),
                _ => None,
            },
            0x1 => Some(Opcode::Jump { nnn: ins.nnn() }),
            0x2 => Some(Opcode::Call { nnn: ins.nnn() }),
            0x3 => Some(Opcode::SkipRegEqualImm { x, nn: ins.nn() }),
            0x4 => Some(Opcode::SkipRegNotEqualImm { x, nn: ins.nn() }),
            0x5 if ins.n().get() == 0 => Some(Opcode::SkipRegEqualReg { x, y }),
            0x6 => Some(Opcode::SetRegImm { x, nn: ins.nn() }),
            0x7 => Some(Opcode::AddRegImm { x, nn: ins.nn() }),
            0x8 => OpcodeALU::from_nibble(ins.n()).map(|op| Opcode::ALU { x, y, op }),
            0x9 if ins.n().get() == 0 => Some(Opcode::SkipRegNotEqualReg { x, y }),
            0xA => Some(Opcode::SetIndexImm { nnn: ins.nnn() }),
            0xB => Some(Opcode::JumpWithOffset { nnn: ins.nnn() }),
            0xC => Some(Opcode::Random { x, nn: ins.nn() }),
            0xD => Some(Opcode::Draw { x, y, n: ins.n() }),
            0xE => match ins.nn() {
                0x9E => Some(Opcode::SkipIfPressed { x }),
                0xA1 => Some(Opcode::SkipIfNotPressed { x }),
                _ => None,
            },
            0xF => match ins.nn() {
                0x07 => Some(Opcode::ReadDelayTimer { x }),
                0x0A => Some(Opcode::WaitForKey { x }),
                0x15 => Some(Opcode::SetDelayTimer { x }),
                0x18 => Some(Opcode::SetSoundTimer { x }),
                0x1E => Some(Opcode::AddIndexReg { x }),
                0x29 => Some(Opcode::FontChar { x }),
                0x33 => Some(Opcode::BCD { x }),
                0x55 => Some(Opcode::StoreRegs { x }),
                0x65 => Some(Opcode::LoadRegs { x }),
                _ => None,
            },
            _ => None,
        };

        decoded.unwrap_or(Opcode::Invalid(ins.0))
    }
}

impl Opcode {
    /// Decodes a raw big-endian instruction word.
    pub fn decode(opcode: u16) -> Self {
        Instruction(opcode).into()
    }
}
