use log::debug;

use crate::{Chip8, Chip8Error, Chip8Result, RunnerError};

pub const DEFAULT_CPU_HZ: f32 = 700.0;
pub const TIMER_HZ: f32 = 60.0;

const TIMER_TIME_STEP: f32 = 1.0 / TIMER_HZ;

/// High-level emulator runner that converts elapsed time into cycles.
///
/// The runner never sleeps; the driver decides when to call [`Chip8Runner::update`].
pub struct Chip8Runner {
    chip8: Chip8,
    cpu_time_step: f32,
    cpu_dt_accumulator: f32,
    timer_dt_accumulator: f32,
    stop_at: Option<u16>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chip8RunnerResult {
    /// The time budget ran out or a frame needs to be rendered.
    Ok { display_changed: bool },
    /// The program counter reached the stop address.
    Stopped,
}

impl Chip8Runner {
    pub fn new(chip8: Chip8) -> Self {
        Self::from_time_step(chip8, 1.0 / DEFAULT_CPU_HZ)
    }

    /// Runs `cpu_hz` instructions per second of elapsed time.
    ///
    /// Zero, negative and non-finite rates are rejected; they would either
    /// never run a cycle or never finish an update.
    pub fn with_cpu_hz(chip8: Chip8, cpu_hz: f32) -> Result<Self, RunnerError> {
        if !cpu_hz.is_finite() || cpu_hz <= 0.0 {
            return Err(RunnerError::InvalidCpuRate { hz: cpu_hz });
        }
        Ok(Self::from_time_step(chip8, 1.0 / cpu_hz))
    }

    fn from_time_step(chip8: Chip8, cpu_time_step: f32) -> Self {
        debug!("Runner at {} Hz", 1.0 / cpu_time_step);
        Self {
            chip8,
            cpu_time_step,
            cpu_dt_accumulator: 0.0,
            timer_dt_accumulator: 0.0,
            stop_at: None,
        }
    }

    /// Halt `update` as soon as the program counter equals `addr`.
    pub fn stop_at(&mut self, addr: Option<u16>) {
        self.stop_at = addr;
    }

    /// Update emulator by delta time, handles both CPU and timer cycles.
    ///
    /// Runs as many CPU cycles and timer updates as needed based on the elapsed time `dt`.
    /// Returns early once a cycle changes the display, so at most one draw lands per frame.
    pub fn update(&mut self, dt: f32) -> Result<Chip8RunnerResult, Chip8Error> {
        self.cpu_dt_accumulator += dt;
        self.timer_dt_accumulator += dt;

        while self.timer_dt_accumulator >= TIMER_TIME_STEP {
            self.timer_dt_accumulator -= TIMER_TIME_STEP;
            self.chip8.timers_cycle();
        }

        while self.cpu_dt_accumulator >= self.cpu_time_step {
            self.cpu_dt_accumulator -= self.cpu_time_step;

            let cpu_result = self.chip8.cpu_cycle()?;

            if self.stop_at == Some(self.chip8.pc()) {
                self.cpu_dt_accumulator = 0.0;
                return Ok(Chip8RunnerResult::Stopped);
            }

            if cpu_result == Chip8Result::DisplayChanged {
                // We clear the accumulator to avoid "catching up" in the next frame.
                self.cpu_dt_accumulator = 0.0;
                return Ok(Chip8RunnerResult::Ok {
                    display_changed: true,
                });
            }
        }

        Ok(Chip8RunnerResult::Ok {
            display_changed: false,
        })
    }

    /// Returns true if the sound timer is active, indicating a beep should be played.
    pub fn should_beep(&self) -> bool {
        self.chip8.should_beep()
    }

    /// Forwards a keypad snapshot to the machine.
    pub fn set_keys(&mut self, keys: [bool; 16]) {
        self.chip8.set_keys(keys)
    }

    pub fn chip8_ref(&self) -> &Chip8 {
        &self.chip8
    }

    pub fn chip8_mut(&mut self) -> &mut Chip8 {
        &mut self.chip8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chip8Builder;

    #[test]
    fn runs_cycles_for_elapsed_time() {
        // 7001 forever: V0 += 1, jump back.
        let chip8 = Chip8Builder::new().load(&[0x70, 0x01, 0x12, 0x00]).unwrap();
        let mut runner = Chip8Runner::with_cpu_hz(chip8, 100.0).unwrap();

        let result = runner.update(0.105).unwrap();
        assert_eq!(result, Chip8RunnerResult::Ok { display_changed: false });
        // 10 cycles: five adds, five jumps.
        assert_eq!(runner.chip8_ref().register(crate::u4::new(0)), 5);
    }

    #[test]
    fn stops_early_after_a_draw() {
        // Draw, then V0 = 1.
        let chip8 = Chip8Builder::new().load(&[0xD0, 0x01, 0x60, 0x01]).unwrap();
        let mut runner = Chip8Runner::with_cpu_hz(chip8, 100.0).unwrap();

        let result = runner.update(1.0).unwrap();
        assert_eq!(result, Chip8RunnerResult::Ok { display_changed: true });
        assert_eq!(runner.chip8_ref().pc(), 0x202);
    }

    #[test]
    fn ticks_timers_at_sixty_hz() {
        // Delay timer = 10, then spin.
        let chip8 = Chip8Builder::new().load(&[0x60, 0x0A, 0xF0, 0x15, 0x12, 0x04]).unwrap();
        let mut runner = Chip8Runner::new(chip8);
        runner.update(0.01).unwrap();
        assert_eq!(runner.chip8_ref().delay_timer(), 10);

        runner.update(0.1).unwrap();
        assert_eq!(runner.chip8_ref().delay_timer(), 4);
        assert!(!runner.should_beep());
    }

    #[test]
    fn stops_at_address() {
        let chip8 = Chip8Builder::new().load(&[0x60, 0x01, 0x61, 0x02, 0x12, 0x04]).unwrap();
        let mut runner = Chip8Runner::new(chip8);
        runner.stop_at(Some(0x204));

        assert_eq!(runner.update(1.0), Ok(Chip8RunnerResult::Stopped));
        assert_eq!(runner.chip8_ref().register(crate::u4::new(1)), 2);
    }

    #[test]
    fn rejects_rates_that_cannot_make_progress() {
        for hz in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let chip8 = Chip8Builder::new().load(&[0x70, 0x01, 0x12, 0x00]).unwrap();
            match Chip8Runner::with_cpu_hz(chip8, hz) {
                Err(RunnerError::InvalidCpuRate { .. }) => {}
                Err(err) => panic!("unexpected error for {hz}: {err}"),
                Ok(_) => panic!("{hz} Hz was accepted"),
            }
        }
    }

    #[test]
    fn slow_rate_still_makes_progress() {
        let chip8 = Chip8Builder::new().load(&[0x70, 0x01, 0x12, 0x00]).unwrap();
        let mut runner = Chip8Runner::with_cpu_hz(chip8, 1.0).unwrap();
        runner.update(2.5).unwrap();
        assert_eq!(runner.chip8_ref().register(crate::u4::new(0)), 1);
        assert_eq!(runner.chip8_ref().pc(), 0x200);
    }

    #[test]
    fn propagates_faults() {
        let chip8 = Chip8Builder::new().load(&[0x00, 0xEE]).unwrap();
        let mut runner = Chip8Runner::new(chip8);
        assert_eq!(runner.update(1.0), Err(Chip8Error::StackUnderflow));
    }
}
