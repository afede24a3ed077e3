use crate::{DISPLAY_X, DISPLAY_Y, Display};

/// Turns every pixel off.
pub fn clear(display: &mut Display<bool>) {
    for row in display.iter_mut() {
        row.fill(false);
    }
}

/// XORs `sprite` onto `display`, one byte per row, MSB leftmost.
///
/// The starting coordinate wraps around the screen, but the sprite itself is
/// clipped at the right and bottom edges. Returns true if any lit pixel was
/// turned off.
pub fn blit(display: &mut Display<bool>, x: u8, y: u8, sprite: &[u8]) -> bool {
    let x_pos = x as usize % DISPLAY_X;
    let y_pos = y as usize % DISPLAY_Y;

    // Don't draw out of bounds
    let row_count = std::cmp::min(sprite.len(), DISPLAY_Y - y_pos);
    let col_count = std::cmp::min(8, DISPLAY_X - x_pos);

    let mut any_erased = false;
    for (row, &sprite_byte) in sprite.iter().take(row_count).enumerate() {
        for col in 0..col_count {
            // If current sprite bit is non-zero
            if (sprite_byte & (0x80 >> col)) != 0 {
                let pixel = &mut display[y_pos + row][x_pos + col];

                // Flip the pixel
                *pixel ^= true;

                if !*pixel {
                    any_erased = true;
                }
            }
        }
    }

    any_erased
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> Display<bool> {
        [[false; DISPLAY_X]; DISPLAY_Y]
    }

    fn lit(display: &Display<bool>) -> usize {
        display.iter().flatten().filter(|&&p| p).count()
    }

    #[test]
    fn draws_msb_first() {
        let mut display = blank();
        assert!(!blit(&mut display, 2, 1, &[0b1010_0000, 0b0000_0001]));
        assert!(display[1][2]);
        assert!(!display[1][3]);
        assert!(display[1][4]);
        assert!(display[2][9]);
        assert_eq!(lit(&display), 3);
    }

    #[test]
    fn redraw_erases_and_reports_collision() {
        let mut display = blank();
        assert!(!blit(&mut display, 10, 10, &[0xFF]));
        assert_eq!(lit(&display), 8);
        assert!(blit(&mut display, 10, 10, &[0xFF]));
        assert_eq!(lit(&display), 0);
    }

    #[test]
    fn partial_overlap_only_flips_set_bits() {
        let mut display = blank();
        blit(&mut display, 0, 0, &[0xF0]);
        assert!(blit(&mut display, 0, 0, &[0x18]));
        assert_eq!(display[0][..8], [true, true, true, false, true, false, false, false]);
    }

    #[test]
    fn clips_at_edges() {
        let mut display = blank();
        blit(&mut display, 60, 30, &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(lit(&display), 4 * 2);
        assert!(display[31][63]);
        assert!(!display[0][0]);
        assert!(display[0].iter().all(|&p| !p));
        assert!(display.iter().all(|row| !row[0]));
    }

    #[test]
    fn start_coordinate_wraps() {
        let mut display = blank();
        blit(&mut display, 64 + 3, 32 + 5, &[0x80]);
        assert!(display[5][3]);
        assert_eq!(lit(&display), 1);
    }

    #[test]
    fn clear_turns_everything_off() {
        let mut display = [[true; DISPLAY_X]; DISPLAY_Y];
        clear(&mut display);
        assert_eq!(lit(&display), 0);
    }
}
