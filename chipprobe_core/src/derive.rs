//! Facts that follow from what was detected rather than from a probe of their own.

use serde::Serialize;

use crate::bus::RegisterAccess;
use crate::hardware::{AgnusFamily, MemoryController, RamseyConfig, RomInfo, ScreenTiming, VideoStandard};
use crate::host::SystemServices;
use crate::regs;

pub const KB: u32 = 1024;
pub const MB: u32 = 1024 * KB;

/// Chip RAM addressable by each graphics generation. The first entry is the
/// floor used when the generation is unknown.
const CHIP_RAM_CEILINGS: [(AgnusGeneration, u32); 3] = [
    (AgnusGeneration::Original, 512 * KB),
    (AgnusGeneration::Enhanced, 2 * MB),
    (AgnusGeneration::Advanced, 2 * MB),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgnusGeneration {
    Original,
    Enhanced,
    Advanced,
}

fn generation(agnus: AgnusFamily) -> Option<AgnusGeneration> {
    match agnus {
        AgnusFamily::OcsPal | AgnusFamily::OcsNtsc => Some(AgnusGeneration::Original),
        AgnusFamily::EcsPal | AgnusFamily::EcsNtsc => Some(AgnusGeneration::Enhanced),
        AgnusFamily::AlicePal | AgnusFamily::AliceNtsc | AgnusFamily::Saga => Some(AgnusGeneration::Advanced),
        AgnusFamily::Unknown => None,
    }
}

pub fn max_chip_ram(agnus: AgnusFamily) -> u32 {
    let floor = CHIP_RAM_CEILINGS[0].1;
    generation(agnus)
        .and_then(|gen| CHIP_RAM_CEILINGS.iter().find(|(g, _)| *g == gen))
        .map_or(floor, |(_, bytes)| *bytes)
}

/// Motherboard fast RAM Ramsey can address.
pub fn max_board_ram(memory: MemoryController, config: &RamseyConfig) -> u32 {
    match memory {
        MemoryController::Absent => 0,
        _ if config.size_1m => 16 * MB,
        _ => 4 * MB,
    }
}

pub fn screen_timing(pal: bool) -> ScreenTiming {
    if pal {
        ScreenTiming { standard: VideoStandard::Pal, horiz_hz: 15625, vert_hz: 50, supply_hz: 50 }
    } else {
        ScreenTiming { standard: VideoStandard::Ntsc, horiz_hz: 15734, vert_hz: 60, supply_hz: 60 }
    }
}

pub fn detect_rom<B, S>(bus: &mut B, services: &mut S) -> RomInfo
where
    B: RegisterAccess + ?Sized,
    S: SystemServices + ?Sized,
{
    let (exec_version, exec_revision) = services.exec_version();

    let mut version = bus.read_word(regs::ROM_VERSION);
    let mut revision = bus.read_word(regs::ROM_REVISION);
    if version == 0 {
        version = exec_version;
        revision = exec_revision;
    }

    let size_kb = if bus.read_word(regs::ROM_SIZE_MAGIC) == regs::ROM_256K_MAGIC { 256 } else { 512 };

    RomInfo { version, revision, patch_version: exec_version, patch_revision: exec_revision, size_kb }
}

/// Where an address lives in the 68k memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MemoryLocation {
    Rom,
    ChipRam,
    Ram24Bit,
    Ram32Bit,
}

impl MemoryLocation {
    pub fn of(address: u32) -> Self {
        match address {
            0x00F8_0000..=0x00FF_FFFF | 0x00E0_0000..=0x00E7_FFFF => MemoryLocation::Rom,
            0..=0x001F_FFFF => MemoryLocation::ChipRam,
            0x0020_0000..=0x00FF_FFFF => MemoryLocation::Ram24Bit,
            _ => MemoryLocation::Ram32Bit,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MemoryLocation::Rom => "ROM",
            MemoryLocation::ChipRam => "CHIP RAM",
            MemoryLocation::Ram24Bit => "24BitRAM",
            MemoryLocation::Ram32Bit => "32BitRAM",
        }
    }
}

/// True for real fast RAM the 68000 can run from without chip bus contention.
/// Slow "ranger" memory from $C00000 up shares the chip bus timing.
pub fn runs_from_fast_ram(address: u32) -> bool {
    MemoryLocation::of(address) == MemoryLocation::Ram24Bit && address < 0x00C0_0000
}
