use log::debug;

use crate::bus::RegisterAccess;
use crate::hardware::{BusController, ClockChip};
use crate::regs::{self, RTC_NIBBLE};

const MSM6242B_SIGNATURE: u8 = 0b0100;
/// Timer enabled, no alarm, mode 01.
const RP5C01A_MODE: u8 = 0b1001;
const RP5C01A_24H: u8 = 0b0001;

fn nibble<B: RegisterAccess + ?Sized>(bus: &mut B, reg: u32) -> u8 {
    bus.read_byte(reg) & RTC_NIBBLE
}

/// Identifies the battery backed clock.
///
/// Register F tells the MSM6242B apart. A zero there is not conclusive, so
/// the RP5C01A is confirmed through its mode register (D), the write-ignoring
/// register C and the 12/24 hour register A. Forcing the mode makes an
/// MSM6242B skip 30 seconds, which is why that path is only taken last.
pub fn detect_clock<B: RegisterAccess + ?Sized>(bus: &mut B, gary: BusController) -> ClockChip {
    if gary == BusController::A1000 {
        return ClockChip::NotProbed;
    }

    let id = nibble(bus, regs::RTC_REG_F);
    if id == MSM6242B_SIGNATURE {
        return ClockChip::Msm6242b;
    }
    if id != 0 {
        debug!("rtc register F reads {id:#x}: no clock");
        return ClockChip::None;
    }

    let mut mode = nibble(bus, regs::RTC_REG_D);
    if mode != RP5C01A_MODE {
        bus.write_byte(regs::RTC_REG_D, RP5C01A_MODE);
        mode = nibble(bus, regs::RTC_REG_D);
    }
    if mode != RP5C01A_MODE {
        return ClockChip::None;
    }

    bus.write_byte(regs::RTC_REG_C, 5);
    if nibble(bus, regs::RTC_REG_C) != 0 {
        return ClockChip::None;
    }
    if nibble(bus, regs::RTC_REG_A) == RP5C01A_24H {
        ClockChip::Rp5c01a
    } else {
        ClockChip::None
    }
}
