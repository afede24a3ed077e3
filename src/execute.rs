use rand::Rng;

use crate::{Chip8, Chip8Error, Chip8Result, Opcode, OpcodeALU, display, font::glyph_address, u4};

impl Chip8 {
    /// Applies one decoded instruction. The program counter already points past it.
    pub(crate) fn execute(&mut self, opcode: Opcode) -> Result<Chip8Result, Chip8Error> {
        match opcode {
            Opcode::ClearDisplay => {
                display::clear(&mut self.display);
                return Ok(Chip8Result::DisplayChanged);
            }
            Opcode::Jump { nnn } => {
                self.pc = nnn;
            }
            Opcode::JumpWithOffset { nnn } => {
                self.pc = nnn.wrapping_add(self.v[0].into());
            }
            Opcode::Call { nnn } => {
                self.push(self.pc)?;
                self.pc = nnn;
            }
            Opcode::Return => {
                self.pc = self.pop()?;
            }
            Opcode::SkipRegEqualImm { x, nn } => {
                self.skip_if(self.v[x] == nn);
            }
            Opcode::SkipRegNotEqualImm { x, nn } => {
                self.skip_if(self.v[x] != nn);
            }
            Opcode::SkipRegEqualReg { x, y } => {
                self.skip_if(self.v[x] == self.v[y]);
            }
            Opcode::SkipRegNotEqualReg { x, y } => {
                self.skip_if(self.v[x] != self.v[y]);
            }
            Opcode::SetRegImm { x, nn } => {
                self.v[x] = nn;
            }
            Opcode::AddRegImm { x, nn } => {
                self.v[x] = self.v[x].wrapping_add(nn);
            }
            Opcode::ALU { x, y, op } => {
                self.execute_alu(x, y, op);
            }
            Opcode::Random { x, nn } => {
                let rand_byte: u8 = self.rng.random();
                self.v[x] = rand_byte & nn;
            }
            Opcode::SetIndexImm { nnn } => {
                self.i = nnn;
            }
            Opcode::AddIndexReg { x } => {
                self.i = self.i.wrapping_add(self.v[x].into());
                if self.quirks.index_add_sets_flag {
                    self.v[u4::FLAG] = u8::from(self.i > 0x0FFF);
                }
            }
            Opcode::Draw { x, y, n } => {
                return self.execute_draw(x, y, n);
            }
            Opcode::SkipIfPressed { x } => {
                self.skip_if(self.keypad[u4::low(self.v[x])]);
            }
            Opcode::SkipIfNotPressed { x } => {
                self.skip_if(!self.keypad[u4::low(self.v[x])]);
            }
            Opcode::WaitForKey { x } => {
                self.execute_wait_for_key(x);
            }
            Opcode::ReadDelayTimer { x } => {
                self.v[x] = self.delay_timer;
            }
            Opcode::SetDelayTimer { x } => {
                self.delay_timer = self.v[x];
            }
            Opcode::SetSoundTimer { x } => {
                self.sound_timer = self.v[x];
            }
            Opcode::FontChar { x } => {
                self.i = glyph_address(u4::low(self.v[x]));
            }
            Opcode::BCD { x } => {
                let value = self.v[x];
                let range = self.mem_range(self.i as usize, 3)?;
                self.memory[range].copy_from_slice(&[value / 100, (value / 10) % 10, value % 10]);
            }
            Opcode::StoreRegs { x } => {
                let count = usize::from(x) + 1;
                let range = self.mem_range(self.i as usize, count)?;
                self.memory[range].copy_from_slice(&self.v[..count]);
                self.advance_index_after_transfer(count);
            }
            Opcode::LoadRegs { x } => {
                let count = usize::from(x) + 1;
                let range = self.mem_range(self.i as usize, count)?;
                self.v[..count].copy_from_slice(&self.memory[range]);
                self.advance_index_after_transfer(count);
            }
            Opcode::Invalid(opcode) => {
                return Err(Chip8Error::InvalidOpcode { opcode });
            }
        };

        Ok(Chip8Result::Continue)
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc = self.pc.wrapping_add(2);
        }
    }

    /// Both operands are read before VX is written, so the flag is computed
    /// correctly even when X or Y is F. The flag write lands last.
    fn execute_alu(&mut self, x: u4, y: u4, op: OpcodeALU) {
        let vx = self.v[x];
        let vy = self.v[y];
        let shift_source = if self.quirks.shift_uses_vy { vy } else { vx };
        let logic_flag = self.quirks.logic_resets_flag.then_some(0);

        let (result, flag) = match op {
            OpcodeALU::Set => (vy, None),
            OpcodeALU::Or => (vx | vy, logic_flag),
            OpcodeALU::And => (vx & vy, logic_flag),
            OpcodeALU::Xor => (vx ^ vy, logic_flag),
            OpcodeALU::Add => {
                let (res, overflow) = vx.overflowing_add(vy);
                (res, Some(u8::from(overflow)))
            }
            OpcodeALU::Sub => {
                let (res, borrow) = vx.overflowing_sub(vy);
                (res, Some(u8::from(!borrow))) // Notice that borrow is inverted
            }
            OpcodeALU::SubReverse => {
                let (res, borrow) = vy.overflowing_sub(vx);
                (res, Some(u8::from(!borrow)))
            }
            OpcodeALU::ShiftRight => (shift_source >> 1, Some(shift_source & 1)),
            OpcodeALU::ShiftLeft => (shift_source << 1, Some(shift_source >> 7)),
        };

        self.v[x] = result;
        if let Some(flag) = flag {
            self.v[u4::FLAG] = flag;
        }
    }

    fn execute_draw(&mut self, x: u4, y: u4, n: u4) -> Result<Chip8Result, Chip8Error> {
        let range = self.mem_range(self.i as usize, usize::from(n))?;
        let erased = display::blit(&mut self.display, self.v[x], self.v[y], &self.memory[range]);

        self.v[u4::FLAG] = u8::from(erased);
        Ok(Chip8Result::DisplayChanged)
    }

    fn execute_wait_for_key(&mut self, x: u4) {
        if !self.quirks.wait_for_release {
            if let Some(key) = self.first_pressed_key() {
                self.v[x] = key.get();
                return;
            }
        } else if let Some(key) = self.wait_release_key {
            if !self.keypad[key] {
                // The key we were waiting for has been released
                self.v[x] = key.get();
                self.wait_release_key = None;
                return;
            }
        } else {
            self.wait_release_key = self.first_pressed_key();
        }

        // Repeat this instruction on the next cycle
        self.pc = self.pc.wrapping_sub(2);
    }

    fn first_pressed_key(&self) -> Option<u4> {
        (0..16).map(u4::new).find(|&key| self.keypad[key])
    }

    fn advance_index_after_transfer(&mut self, count: usize) {
        if self.quirks.load_store_increments_index {
            self.i = self.i.wrapping_add(count as u16);
        }
    }
}
