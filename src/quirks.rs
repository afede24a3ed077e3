/// Behaviours that differ between historical CHIP-8 interpreters.
///
/// The default leaves every toggle off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quirks {
    /// 8xy6/8xyE shift VY into VX instead of shifting VX in place.
    pub shift_uses_vy: bool,
    /// Fx0A only completes once the pressed key is released again.
    pub wait_for_release: bool,
    /// Fx1E sets VF to 1 when I moves past 0x0FFF, else 0.
    pub index_add_sets_flag: bool,
    /// 8xy1/8xy2/8xy3 reset VF to 0.
    pub logic_resets_flag: bool,
    /// Fx55/Fx65 leave I pointing one past the last register transferred.
    pub load_store_increments_index: bool,
}

impl Default for Quirks {
    fn default() -> Self {
        Self::NONE
    }
}

impl Quirks {
    /// Every toggle off.
    pub const NONE: Self = Self {
        shift_uses_vy: false,
        wait_for_release: false,
        index_add_sets_flag: false,
        logic_resets_flag: false,
        load_store_increments_index: false,
    };

    /// The original COSMAC VIP interpreter.
    pub const fn cosmac_vip() -> Self {
        Self {
            shift_uses_vy: true,
            wait_for_release: true,
            index_add_sets_flag: false,
            logic_resets_flag: true,
            load_store_increments_index: true,
        }
    }

    /// Amiga-era interpreters, which flag Fx1E overflow (relied on by Spacefight 2091!).
    pub const fn amiga() -> Self {
        Self {
            index_add_sets_flag: true,
            ..Self::NONE
        }
    }
}
