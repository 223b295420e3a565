//! Register maps and operating system answers of well known machines, for
//! running the classifier without the hardware.

use crate::host::{CARD_RESOURCE, FPU040_LIBRARY, FPU060_LIBRARY, MMU_LIBRARY};
use crate::regs::{self, attn, cacr, istr};
use crate::sim::{Register, ScriptedBus, SimulatedHost};

pub const PAL_ECLOCK: u32 = 709_379;
pub const NTSC_ECLOCK: u32 = 715_909;

#[derive(Debug)]
pub struct SimulatedMachine {
    pub bus: ScriptedBus,
    pub host: SimulatedHost,
}

pub struct MachineProfile {
    pub name: &'static str,
    pub summary: &'static str,
    build: fn() -> SimulatedMachine,
}

impl MachineProfile {
    pub fn build(&self) -> SimulatedMachine {
        (self.build)()
    }
}

pub const PROFILES: [MachineProfile; 7] = [
    MachineProfile { name: "a500", summary: "A500, 68000, ECS Agnus, OCS Denise, A501 clock", build: a500 },
    MachineProfile { name: "a1000", summary: "A1000, 68000, OCS NTSC", build: a1000 },
    MachineProfile { name: "a1200", summary: "A1200, 68EC020, AGA, Gayle", build: a1200 },
    MachineProfile { name: "a3000", summary: "A3000, 68030/68882, ECS, Ramsey-04, SDMAC-02", build: a3000 },
    MachineProfile { name: "a4000", summary: "A4000, 68040, AGA, Ramsey-07", build: a4000 },
    MachineProfile { name: "a4000t", summary: "A4000T, 68060, AGA, Ramsey-07, NCR 53C710", build: a4000t },
    MachineProfile { name: "vampire", summary: "Vampire V4, 68080, SAGA", build: vampire },
];

pub fn find_profile(name: &str) -> Option<&'static MachineProfile> {
    PROFILES.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Custom chips, ROM and an undecoded Gary area. Callers add what their
/// board decodes on top.
fn motherboard(seed: u64, vposr: u32, denise: Option<u32>, kickstart: (u32, u32), rom_256k: bool) -> ScriptedBus {
    let mut bus = ScriptedBus::new(seed)
        .with(regs::ROM_VERSION, Register::Fixed(kickstart.0))
        .with(regs::ROM_REVISION, Register::Fixed(kickstart.1))
        .with(regs::ROM_SIZE_MAGIC, Register::Fixed(if rom_256k { 0x1111 } else { 0x1114 }))
        .with(regs::VPOSR, Register::Fixed(vposr))
        .with(regs::PAULA_ID, Register::Fixed(0x0000))
        .with(regs::BLTDDAT, Register::Fixed(0x5A5A))
        .with(regs::JOY0DAT, Register::Fixed(0x0101))
        .with(regs::JOY1DAT, Register::Fixed(0x0202))
        .with(regs::JOY0DAT_MIRROR, Register::Fixed(0xFFFF))
        .with(regs::JOY1DAT_MIRROR, Register::Fixed(0xFFFF))
        .with(regs::FAT_GARY_POWER, Register::Fixed(0x00))
        .with(regs::GAYLE_ID, Register::mirror(regs::BLTDDAT));
    // an OCS Denise leaves the id register undriven
    if let Some(id) = denise {
        bus.set(regs::DENISE_ID, Register::Fixed(id));
    }
    bus
}

fn with_fat_gary(bus: ScriptedBus, ramsey_rev: u32, ramsey_ctl: u32) -> ScriptedBus {
    bus.with(regs::FAT_GARY_POWER, Register::latch(0x00, regs::FAT_GARY_POWER_CYCLE as u32))
        .with(regs::RAMSEY_VERSION, Register::Fixed(ramsey_rev))
        .with(regs::RAMSEY_CTRL, Register::Fixed(ramsey_ctl))
}

fn with_ricoh_clock(bus: ScriptedBus) -> ScriptedBus {
    bus.with(regs::RTC_REG_F, Register::Fixed(0xF0))
        .with(regs::RTC_REG_D, Register::latch(0x08, 0x0F))
        .with(regs::RTC_REG_C, Register::Fixed(0xF0))
        .with(regs::RTC_REG_A, Register::Fixed(0xF1))
}

fn with_oki_clock(bus: ScriptedBus) -> ScriptedBus {
    bus.with(regs::RTC_REG_F, Register::Fixed(0xF4))
}

fn without_clock(bus: ScriptedBus) -> ScriptedBus {
    bus.with(regs::RTC_REG_F, Register::Fixed(0xFF))
}

/// SCSI DMA area. `wtc` is how the chip answers at the read-back address.
fn with_scsi(bus: ScriptedBus, resdmac: u32, ncr: u32, wtc: Option<Register>) -> ScriptedBus {
    let bus = bus
        .with(regs::SDMAC_REVISION, Register::Fixed(resdmac))
        .with(regs::NCR_CTEST8, Register::Fixed(ncr));
    match wtc {
        Some(wtc) => bus
            .with(regs::SDMAC_ISTR, Register::Fixed(istr::FIFO_EMPTY as u32))
            .with(regs::SDMAC_WTC_ALT, Register::latch(0, u32::MAX))
            .with(regs::SDMAC_WTC, wtc),
        None => bus.with(regs::SDMAC_ISTR, Register::Fixed(0xFF)),
    }
}

fn host(attn: u16, pal: bool, exec: (u16, u16), code_address: u32) -> SimulatedHost {
    SimulatedHost {
        attn,
        pal,
        exec,
        eclock: if pal { PAL_ECLOCK } else { NTSC_ECLOCK },
        code_address,
        ..Default::default()
    }
}

const ATTN_020: u16 = attn::M68010 | attn::M68020;
const ATTN_030: u16 = ATTN_020 | attn::M68030;
const ATTN_040: u16 = ATTN_030 | attn::M68040 | attn::FPU40;

fn a500() -> SimulatedMachine {
    let bus = with_oki_clock(motherboard(500, 0x2000, None, (34, 5), true));
    SimulatedMachine { bus, host: host(0, true, (34, 5), 0x00C0_4000) }
}

fn a1000() -> SimulatedMachine {
    let bus = motherboard(1000, 0x1000, None, (34, 5), true)
        .with(regs::JOY0DAT_MIRROR, Register::mirror(regs::JOY0DAT))
        .with(regs::JOY1DAT_MIRROR, Register::mirror(regs::JOY1DAT));
    SimulatedMachine { bus, host: host(0, false, (34, 5), 0x0002_0000) }
}

fn a1200() -> SimulatedMachine {
    let bus = without_clock(motherboard(1200, 0x2300, Some(0x00F8), (40, 68), false))
        .with(regs::ROM_VERSION_MIRROR, Register::mirror(regs::ROM_VERSION))
        .with(regs::GAYLE_ID, Register::serial_id(0xD1, 0x00));
    let mut host = host(ATTN_020, true, (40, 68), 0x0000_8000);
    host.cacr = cacr::ENABLE_I;
    host.resources.push(CARD_RESOURCE.to_string());
    SimulatedMachine { bus, host }
}

fn a3000() -> SimulatedMachine {
    let board = with_fat_gary(motherboard(3000, 0x3000, Some(0x00FC), (40, 68), false), 0x0D, 0x2B);
    let sdmac02 = Register::Mirror { of: regs::SDMAC_WTC_ALT, and: 0x00FF_FFFF, or: 0 };
    let bus = with_ricoh_clock(with_scsi(board, 0x00, 0x00, Some(sdmac02)));

    let mut host = host(ATTN_030 | attn::M68881 | attn::M68882, false, (40, 68), 0x07F0_0000);
    host.mmu = true;
    host.fpu = true;
    host.cacr = cacr::ENABLE_I | cacr::IBURST | cacr::ENABLE_D;
    SimulatedMachine { bus, host }
}

fn a4000() -> SimulatedMachine {
    let board = with_fat_gary(motherboard(4000, 0x2300, Some(0x00F8), (40, 68), false), 0x0F, 0x4B);
    let bus = with_ricoh_clock(with_scsi(board, 0xFF, 0xFF, None));

    let mut host = host(ATTN_040, true, (40, 68), 0x07C0_0000);
    host.mmu = true;
    host.fpu = true;
    host.vbr = 0x07FF_0000;
    host.cacr = cacr::ENABLE_I | cacr::ENABLE_D | cacr::COPYBACK;
    host.modules.push(FPU040_LIBRARY.to_string());
    SimulatedMachine { bus, host }
}

fn a4000t() -> SimulatedMachine {
    let board = with_fat_gary(motherboard(4001, 0x2300, Some(0x00F8), (40, 70), false), 0x0F, 0x4B);
    let bus = with_ricoh_clock(with_scsi(board, 0x00, 0x20, None));

    let mut host = host(ATTN_040 | attn::M68060, true, (45, 57), 0x0800_0000);
    host.pcr = Some(0x0430_0601);
    host.mmu = true;
    host.fpu = true;
    host.vbr = 0x0800_0000;
    host.cacr = cacr::ENABLE_I | cacr::ENABLE_D | cacr::COPYBACK;
    host.modules.extend([FPU060_LIBRARY.to_string(), MMU_LIBRARY.to_string()]);
    SimulatedMachine { bus, host }
}

fn vampire() -> SimulatedMachine {
    let bus = without_clock(motherboard(80, 0x2300, Some(0x00F8), (40, 68), false))
        .with(regs::PAULA_ID, Register::Fixed(0x0002))
        .with(regs::GAYLE_ID, Register::serial_id(0xD0, 0x00));
    let mut host = host(ATTN_040 | attn::M68060 | attn::M68080, true, (47, 96), 0x0100_0000);
    host.fpu = true;
    host.cacr = cacr::ENABLE_I | cacr::ENABLE_D;
    SimulatedMachine { bus, host }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_found_case_insensitively() {
        for profile in &PROFILES {
            assert_eq!(PROFILES.iter().filter(|p| p.name == profile.name).count(), 1);
            assert!(find_profile(&profile.name.to_uppercase()).is_some());
        }
        assert!(find_profile("cd32").is_none());
    }

    #[test]
    fn every_profile_builds() {
        for profile in &PROFILES {
            let machine = profile.build();
            assert!(machine.bus.log().is_empty(), "{}", profile.name);
            assert_ne!(machine.host.eclock, 0);
        }
    }
}
