use std::ops::Range;

use log::{debug, error, trace};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    Chip8Error, Chip8Result, DISPLAY_X, DISPLAY_Y, Display, FONT, FONT_END_ADDRESS,
    FONT_START_ADDRESS, Instruction, Opcode, Quirks, u4,
};

// Fixed by the CHIP-8 memory map
pub const ROM_START_ADDRESS: usize = 0x200;
pub const MEMORY_SIZE: usize = 4096;
pub const STACK_SIZE: usize = 16;

/// CHIP-8 virtual machine state
pub struct Chip8 {
    /// 4KB memory array
    pub(crate) memory: [u8; MEMORY_SIZE],
    /// Display buffer: 64x32 monochrome pixels
    pub(crate) display: Display<bool>,

    /// Program counter: address of the next instruction to execute
    pub(crate) pc: u16,
    /// Index register: used for memory operations
    pub(crate) i: u16,
    /// General-purpose registers V0-VF (VF is used as a flag register)
    pub(crate) v: [u8; 16],
    /// Return addresses, valid up to `sp`
    pub(crate) stack: [u16; STACK_SIZE],
    pub(crate) sp: usize,

    /// Delay timer: decrements at 60Hz until it reaches 0
    pub(crate) delay_timer: u8,
    /// Sound timer: decrements at 60Hz, beeps while non-zero
    pub(crate) sound_timer: u8,

    /// Tracks which key is waiting to be released for the FX0A instruction
    pub(crate) wait_release_key: Option<u4>,
    /// Keypad state: 16 keys mapped as booleans (true = pressed)
    pub(crate) keypad: [bool; 16],

    pub(crate) quirks: Quirks,
    pub(crate) rng: StdRng,
    /// First error returned by a cycle; the machine refuses to run past it.
    fault: Option<Chip8Error>,
}

/// Configures a [`Chip8`] before it starts running.
#[derive(Debug, Default)]
pub struct Chip8Builder {
    quirks: Quirks,
    rng_seed: Option<u64>,
}

impl Chip8Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quirks(mut self, quirks: Quirks) -> Self {
        self.quirks = quirks;
        self
    }

    /// Makes `Cxnn` reproducible across machines built with the same seed.
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Builds a machine with the font installed and no program loaded.
    pub fn build(self) -> Chip8 {
        let rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        debug!("Creating CHIP-8 with {:?}, seed {:?}", self.quirks, self.rng_seed);

        let mut memory = [0; MEMORY_SIZE];
        memory[FONT_START_ADDRESS..FONT_END_ADDRESS].copy_from_slice(&FONT);

        Chip8 {
            memory,
            display: [[false; DISPLAY_X]; DISPLAY_Y],
            pc: ROM_START_ADDRESS as u16,
            i: 0,
            v: [0; 16],
            stack: [0; STACK_SIZE],
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            wait_release_key: None,
            keypad: [false; 16],
            quirks: self.quirks,
            rng,
            fault: None,
        }
    }

    /// Builds a machine and loads `rom` at the program origin.
    pub fn load(self, rom: &[u8]) -> Result<Chip8, Chip8Error> {
        let mut chip8 = self.build();
        chip8.load(rom)?;
        Ok(chip8)
    }
}

impl Chip8 {
    pub fn new() -> Self {
        Chip8Builder::new().build()
    }

    /// Loads a ROM into memory and initializes the font set.
    ///
    /// Memory is left untouched if the ROM does not fit.
    pub fn load(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        let rom_end = ROM_START_ADDRESS + rom.len();
        self.memory
            .get_mut(ROM_START_ADDRESS..rom_end)
            .ok_or(Chip8Error::RomTooLarge {
                size: rom.len(),
                max_size: MEMORY_SIZE - ROM_START_ADDRESS,
            })?
            .copy_from_slice(rom);

        self.memory[FONT_START_ADDRESS..FONT_END_ADDRESS].copy_from_slice(&FONT);

        // Set program counter to start of ROM
        self.pc = ROM_START_ADDRESS as u16;
        debug!("Loaded {} byte ROM at {ROM_START_ADDRESS:#05X}", rom.len());

        Ok(())
    }

    /// Executes a single CPU cycle (fetch, decode, execute).
    ///
    /// After the first error every further call returns that same error.
    pub fn cpu_cycle(&mut self) -> Result<Chip8Result, Chip8Error> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }

        let pc = self.pc;
        let result = self.fetch().and_then(|instruction| {
            let opcode = Opcode::from(instruction);
            trace!("{pc:#05X}: {:04X} {opcode:?}", instruction.0);
            self.execute(opcode)
        });

        if let Err(err) = &result {
            error!("CHIP-8 halted at {pc:#05X}: {err}");
            self.fault = Some(err.clone());
        }
        result
    }

    /// Updates the delay and sound timers. Should be called at 60Hz.
    pub fn timers_cycle(&mut self) {
        self.decrement_delay_timer();
        self.decrement_sound_timer();
    }

    pub fn decrement_delay_timer(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
    }

    pub fn decrement_sound_timer(&mut self) {
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// Returns true if the sound timer is greater than zero, indicating a beep should be played.
    pub fn should_beep(&self) -> bool {
        self.sound_timer > 0
    }

    /// Set the state of a key on the keypad.
    pub fn set_key(&mut self, key: u4, pressed: bool) {
        self.keypad[key] = pressed;
    }

    /// Replace the whole keypad state at once.
    pub fn set_keys(&mut self, keys: [bool; 16]) {
        self.keypad = keys;
    }

    /// Get the state of a pixel on the display (true = on, false = off).
    ///
    /// Returns `None` when `(x, y)` lies outside the 64x32 framebuffer.
    pub fn get_display_pixel(&self, y: usize, x: usize) -> Option<bool> {
        self.display.get(y)?.get(x).copied()
    }

    pub fn display(&self) -> &Display<bool> {
        &self.display
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.memory
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn v(&self) -> &[u8; 16] {
        &self.v
    }

    pub fn register(&self, x: u4) -> u8 {
        self.v[x]
    }

    /// Return addresses currently on the stack, oldest first.
    pub fn stack(&self) -> &[u16] {
        &self.stack[..self.sp]
    }

    pub fn stack_pointer(&self) -> usize {
        self.sp
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn keypad(&self) -> &[bool; 16] {
        &self.keypad
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    /// The error that halted this machine, if any.
    pub fn fault(&self) -> Option<&Chip8Error> {
        self.fault.as_ref()
    }

    /// Fetches the next 16-bit opcode from memory and advances the program counter.
    fn fetch(&mut self) -> Result<Instruction, Chip8Error> {
        let addr = self.mem_range(self.pc as usize, 2)?.start;
        let instruction = Instruction::from_be_bytes([self.memory[addr], self.memory[addr + 1]]);
        self.pc = self.pc.wrapping_add(2);

        Ok(instruction)
    }

    /// Bounds-checks `len` bytes starting at `start`.
    pub(crate) fn mem_range(&self, start: usize, len: usize) -> Result<Range<usize>, Chip8Error> {
        let end = start + len;
        if end > MEMORY_SIZE {
            return Err(Chip8Error::MemoryFault {
                address: start.max(MEMORY_SIZE),
            });
        }
        Ok(start..end)
    }

    pub(crate) fn push(&mut self, addr: u16) -> Result<(), Chip8Error> {
        let slot = self
            .stack
            .get_mut(self.sp)
            .ok_or(Chip8Error::StackOverflow { depth: self.sp })?;
        *slot = addr;
        self.sp += 1;
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Result<u16, Chip8Error> {
        self.sp = self.sp.checked_sub(1).ok_or(Chip8Error::StackUnderflow)?;
        Ok(self.stack[self.sp])
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_machine_has_font_and_origin() {
        let chip8 = Chip8::new();
        assert_eq!(chip8.pc(), 0x200);
        assert_eq!(chip8.index(), 0);
        assert_eq!(chip8.stack_pointer(), 0);
        assert_eq!(&chip8.memory()[FONT_START_ADDRESS..FONT_END_ADDRESS], &FONT);
        assert!(chip8.memory()[ROM_START_ADDRESS..].iter().all(|&b| b == 0));
    }

    #[test]
    fn load_copies_rom_at_origin() {
        let chip8 = Chip8Builder::new().load(&[0x12, 0x34, 0x56]).unwrap();
        assert_eq!(&chip8.memory()[0x200..0x203], &[0x12, 0x34, 0x56]);
        assert_eq!(chip8.memory()[0x203], 0);
    }

    #[test]
    fn load_rejects_oversized_rom() {
        let mut chip8 = Chip8::new();
        let rom = vec![0xAA; MEMORY_SIZE - ROM_START_ADDRESS + 1];
        assert_eq!(
            chip8.load(&rom),
            Err(Chip8Error::RomTooLarge {
                size: rom.len(),
                max_size: 0xE00,
            })
        );
        assert!(chip8.memory()[ROM_START_ADDRESS..].iter().all(|&b| b == 0));

        let rom = vec![0xAA; MEMORY_SIZE - ROM_START_ADDRESS];
        assert!(chip8.load(&rom).is_ok());
    }

    #[test]
    fn display_pixel_outside_framebuffer_is_none() {
        let mut chip8 = Chip8::new();
        chip8.display[31][63] = true;
        assert_eq!(chip8.get_display_pixel(31, 63), Some(true));
        assert_eq!(chip8.get_display_pixel(0, 0), Some(false));
        assert_eq!(chip8.get_display_pixel(32, 0), None);
        assert_eq!(chip8.get_display_pixel(0, 64), None);
        assert_eq!(chip8.get_display_pixel(usize::MAX, usize::MAX), None);
    }

    #[test]
    fn fetch_past_end_of_memory_faults() {
        let mut chip8 = Chip8::new();
        chip8.pc = 0xFFF;
        assert_eq!(
            chip8.cpu_cycle(),
            Err(Chip8Error::MemoryFault { address: 0x1000 })
        );
    }

    #[test]
    fn faults_are_sticky() {
        let mut chip8 = Chip8Builder::new().load(&[0x00, 0xEE, 0x60, 0x01]).unwrap();
        assert_eq!(chip8.cpu_cycle(), Err(Chip8Error::StackUnderflow));

        // Even with a valid instruction at pc, the machine stays halted.
        chip8.pc = 0x202;
        assert_eq!(chip8.cpu_cycle(), Err(Chip8Error::StackUnderflow));
        assert_eq!(chip8.v[0], 0);
        assert_eq!(chip8.fault(), Some(&Chip8Error::StackUnderflow));
    }

    #[test]
    fn timers_stop_at_zero() {
        let mut chip8 = Chip8::new();
        chip8.delay_timer = 2;
        chip8.sound_timer = 1;
        assert!(chip8.should_beep());

        chip8.timers_cycle();
        assert_eq!((chip8.delay_timer(), chip8.sound_timer()), (1, 0));
        assert!(!chip8.should_beep());

        chip8.decrement_delay_timer();
        chip8.decrement_delay_timer();
        chip8.decrement_sound_timer();
        assert_eq!((chip8.delay_timer(), chip8.sound_timer()), (0, 0));
    }

    #[test]
    fn stack_is_bounded() {
        let mut chip8 = Chip8::new();
        for addr in 0..STACK_SIZE as u16 {
            chip8.push(addr).unwrap();
        }
        assert_eq!(chip8.push(0xABC), Err(Chip8Error::StackOverflow { depth: 16 }));
        assert_eq!(chip8.stack().len(), 16);
        assert_eq!(chip8.pop(), Ok(15));
        assert_eq!(chip8.stack_pointer(), 15);
    }

    #[test]
    fn keys_can_be_set_individually_or_wholesale() {
        let mut chip8 = Chip8::new();
        chip8.set_key(u4::new(3), true);
        assert!(chip8.keypad()[3]);

        let mut keys = [false; 16];
        keys[0xF] = true;
        chip8.set_keys(keys);
        assert!(!chip8.keypad()[3]);
        assert!(chip8.keypad()[0xF]);
    }
}
