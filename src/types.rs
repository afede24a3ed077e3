/// Outcome of a single CPU cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chip8Result {
    /// The framebuffer was not touched.
    Continue,
    /// The instruction cleared or drew to the framebuffer; a renderer should redraw.
    DisplayChanged,
}

impl Chip8Result {
    pub fn display_changed(self) -> bool {
        matches!(self, Chip8Result::DisplayChanged)
    }
}

/// Error types that can occur during CHIP-8 emulation.
///
/// All cycle errors are fatal: once a machine has returned one, it keeps
/// returning it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },

    #[error("Memory access out of bounds at address {address:#06X}")]
    MemoryFault { address: usize },

    #[error("Stack overflow: subroutine call with {depth} return addresses already on the stack")]
    StackOverflow { depth: usize },

    #[error("Stack underflow: attempted to return from a subroutine with empty call stack")]
    StackUnderflow,

    #[error("Invalid opcode: {opcode:#06X}")]
    InvalidOpcode { opcode: u16 },
}

/// Error types for configuring a [`crate::Chip8Runner`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RunnerError {
    #[error("CPU rate must be a finite number of Hz above zero, got {hz}")]
    InvalidCpuRate { hz: f32 },
}

pub const DISPLAY_X: usize = 64;
pub const DISPLAY_Y: usize = 32;
/// A type alias for the CHIP-8 display buffer representation, indexed `[y][x]`.
pub type Display<T> = [[T; DISPLAY_X]; DISPLAY_Y];
