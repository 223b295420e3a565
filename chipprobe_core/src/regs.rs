//! Fixed register map of the custom chips and motherboard controllers.
//!
//! Addresses are 24-bit physical addresses. Mirrors listed here are only
//! populated on the board generations that decode them loosely.

// ── Kickstart ROM ────────────────────────────────────────────────────────────

pub const ROM_BASE: u32 = 0x00F8_0000;
/// Reads `$1111` on a 256K ROM.
pub const ROM_SIZE_MAGIC: u32 = 0x00F8_0000;
pub const ROM_VERSION: u32 = 0x00F8_000C;
pub const ROM_REVISION: u32 = 0x00F8_000E;
/// Same register seen through bit 28. Wraps onto `ROM_VERSION` on a 24-bit bus.
pub const ROM_VERSION_MIRROR: u32 = 0x10F8_000C;
pub const ROM_256K_MAGIC: u16 = 0x1111;

// ── Custom chips ─────────────────────────────────────────────────────────────

pub const BLTDDAT: u32 = 0x00DF_F000;
/// Agnus/Alice id lives in bits 8-14.
pub const VPOSR: u32 = 0x00DF_F004;
pub const JOY0DAT: u32 = 0x00DF_F00A;
pub const JOY1DAT: u32 = 0x00DF_F00C;
/// POTGOR; Paula revision in bits 1-7.
pub const PAULA_ID: u32 = 0x00DF_F016;
pub const DENISE_ID: u32 = 0x00DF_F07C;

pub const JOY0DAT_MIRROR: u32 = 0x00DA_F00A;
pub const JOY1DAT_MIRROR: u32 = 0x00DA_F00C;

pub const PAULA_ID_MASK: u16 = 0x00FE;
pub const AGNUS_ID_SHIFT: u32 = 8;
pub const AGNUS_ID_MASK: u16 = 0x7F;

// ── Gary / Gayle / Fat Gary ──────────────────────────────────────────────────

pub const GAYLE_ID: u32 = 0x00DE_1000;
pub const FAT_GARY_POWER: u32 = 0x00DE_0002;
pub const FAT_GARY_POWER_CYCLE: u8 = 0x80;

// ── Ramsey ───────────────────────────────────────────────────────────────────

pub const RAMSEY_CTRL: u32 = 0x00DE_0003;
pub const RAMSEY_VERSION: u32 = 0x00DE_0043;

pub mod ramsey {
    pub const PAGE_MODE: u8 = 0x01;
    pub const BURST_MODE: u8 = 0x02;
    pub const WRAP_MODE: u8 = 0x04;
    pub const SIZE_1M: u8 = 0x08;
    pub const SKIP_MODE: u8 = 0x10;
    pub const REFRESH_SHIFT: u8 = 5;
    pub const REFRESH_MASK: u8 = 0x03;

    pub const REV_04: u8 = 0x0D;
    pub const REV_07: u8 = 0x0F;
}

// ── SDMAC / NCR 53C710 ───────────────────────────────────────────────────────

pub const SDMAC_ISTR: u32 = 0x00DD_001F;
/// Only implemented by ReSDMAC.
pub const SDMAC_REVISION: u32 = 0x00DD_0020;
pub const SDMAC_WTC: u32 = 0x00DD_0024;
pub const SDMAC_WTC_ALT: u32 = 0x00DD_0028;
/// Chip revision in the upper nibble (A4000T).
pub const NCR_CTEST8: u32 = 0x00DD_0061;

pub mod istr {
    pub const FIFO_EMPTY: u8 = 0x01;
    pub const FIFO_FULL: u8 = 0x02;
}

// ── Battery backed clock ─────────────────────────────────────────────────────

pub const RTC_BASE: u32 = 0x00DC_0000;
pub const RTC_NIBBLE: u8 = 0x0F;

/// Clock registers sit on every fourth byte, odd lane.
pub const fn rtc_register(reg: u32) -> u32 {
    RTC_BASE + reg * 4 + 3
}

pub const RTC_REG_A: u32 = rtc_register(0xA);
pub const RTC_REG_C: u32 = rtc_register(0xC);
pub const RTC_REG_D: u32 = rtc_register(0xD);
pub const RTC_REG_F: u32 = rtc_register(0xF);

// ── CPU side ─────────────────────────────────────────────────────────────────

/// Exec attention flags.
pub mod attn {
    pub const M68010: u16 = 1 << 0;
    pub const M68020: u16 = 1 << 1;
    pub const M68030: u16 = 1 << 2;
    pub const M68040: u16 = 1 << 3;
    pub const M68881: u16 = 1 << 4;
    pub const M68882: u16 = 1 << 5;
    pub const FPU40: u16 = 1 << 6;
    pub const M68060: u16 = 1 << 7;
    pub const M68080: u16 = 1 << 10;
}

/// Cache control register bits as reported by exec.
pub mod cacr {
    pub const ENABLE_I: u32 = 1 << 0;
    pub const IBURST: u32 = 1 << 4;
    pub const ENABLE_D: u32 = 1 << 8;
    pub const DBURST: u32 = 1 << 12;
    pub const COPYBACK: u32 = 1 << 31;
}

/// 68060 processor configuration register.
pub mod pcr {
    pub const ID_SHIFT: u32 = 16;
    pub const ID_FULL: u32 = 0x0430;
    pub const ID_REDUCED: u32 = 0x0431;
    pub const REVISION_SHIFT: u32 = 8;
    pub const SUPERSCALAR: u32 = 1 << 0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_registers_are_on_the_odd_lane() {
        assert_eq!(RTC_REG_A, 0x00DC_002B);
        assert_eq!(RTC_REG_C, 0x00DC_0033);
        assert_eq!(RTC_REG_D, 0x00DC_0037);
        assert_eq!(RTC_REG_F, 0x00DC_003F);
    }

    #[test]
    fn rom_mirror_wraps_on_a_24_bit_bus() {
        assert_eq!(ROM_VERSION_MIRROR & 0x00FF_FFFF, ROM_VERSION);
    }
}
