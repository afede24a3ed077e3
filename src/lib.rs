//! A CHIP-8 interpreter core.
//!
//! [`Chip8`] holds the whole machine and executes one instruction per
//! [`Chip8::cpu_cycle`]. Drivers own everything else: reading ROM files,
//! deciding when to cycle and tick timers, feeding keys and rendering the
//! framebuffer.

mod chip8;
pub mod display;
mod execute;
pub mod font;
mod nibble;
mod opcode;
mod quirks;
mod runner;
mod types;

pub use chip8::*;
pub use nibble::u4;
pub use opcode::*;
pub use quirks::*;
pub use runner::*;
pub use types::*;

pub(crate) use font::{FONT, FONT_END_ADDRESS, FONT_START_ADDRESS};
