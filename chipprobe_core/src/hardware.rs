use serde::Serialize;

use crate::format::NOT_AVAILABLE;

/// Processor families, oldest first. The derived ordering is relied upon for
/// "at least a 68030" style capability checks; `Unknown` sorts last and must be
/// excluded explicitly by such checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum CpuFamily {
    M68000,
    M68010,
    M68020,
    M68EC020,
    M68030,
    M68EC030,
    M68040,
    M68LC040,
    M68EC040,
    M68060,
    M68EC060,
    M68LC060,
    M68080,
    #[default]
    Unknown,
}

impl CpuFamily {
    pub const ALL: [CpuFamily; 14] = [
        CpuFamily::M68000,
        CpuFamily::M68010,
        CpuFamily::M68020,
        CpuFamily::M68EC020,
        CpuFamily::M68030,
        CpuFamily::M68EC030,
        CpuFamily::M68040,
        CpuFamily::M68LC040,
        CpuFamily::M68EC040,
        CpuFamily::M68060,
        CpuFamily::M68EC060,
        CpuFamily::M68LC060,
        CpuFamily::M68080,
        CpuFamily::Unknown,
    ];

    pub fn is_known(self) -> bool {
        self != CpuFamily::Unknown
    }

    /// True for this family or any newer known one.
    pub fn at_least(self, other: CpuFamily) -> bool {
        self.is_known() && self >= other
    }

    pub fn label(self) -> &'static str {
        match self {
            CpuFamily::M68000 => "68000",
            CpuFamily::M68010 => "68010",
            CpuFamily::M68020 => "68020",
            CpuFamily::M68EC020 => "68EC020",
            CpuFamily::M68030 => "68030",
            CpuFamily::M68EC030 => "68EC030",
            CpuFamily::M68040 => "68040",
            CpuFamily::M68LC040 => "68LC040",
            CpuFamily::M68EC040 => "68EC040",
            CpuFamily::M68060 => "68060",
            CpuFamily::M68EC060 => "68EC060",
            CpuFamily::M68LC060 => "68LC060",
            CpuFamily::M68080 => "68080",
            CpuFamily::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum FpuFamily {
    #[default]
    None,
    M68881,
    M68882,
    M68040,
    M68060,
    M68080,
    Unknown,
}

impl FpuFamily {
    pub const ALL: [FpuFamily; 7] = [
        FpuFamily::None,
        FpuFamily::M68881,
        FpuFamily::M68882,
        FpuFamily::M68040,
        FpuFamily::M68060,
        FpuFamily::M68080,
        FpuFamily::Unknown,
    ];

    pub fn is_present(self) -> bool {
        !matches!(self, FpuFamily::None | FpuFamily::Unknown)
    }

    pub fn label(self) -> &'static str {
        match self {
            FpuFamily::None => NOT_AVAILABLE,
            FpuFamily::M68881 => "68881",
            FpuFamily::M68882 => "68882",
            FpuFamily::M68040 => "68040",
            FpuFamily::M68060 => "68060",
            FpuFamily::M68080 => "68080",
            FpuFamily::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum MmuFamily {
    #[default]
    None,
    M68851,
    M68030,
    M68040,
    M68060,
    Unknown,
}

impl MmuFamily {
    pub const ALL: [MmuFamily; 6] = [
        MmuFamily::None,
        MmuFamily::M68851,
        MmuFamily::M68030,
        MmuFamily::M68040,
        MmuFamily::M68060,
        MmuFamily::Unknown,
    ];

    pub fn is_present(self) -> bool {
        !matches!(self, MmuFamily::None | MmuFamily::Unknown)
    }

    pub fn label(self) -> &'static str {
        match self {
            MmuFamily::None => NOT_AVAILABLE,
            MmuFamily::M68851 => "68851",
            MmuFamily::M68030 => "68030",
            MmuFamily::M68040 => "68040",
            MmuFamily::M68060 => "68060",
            MmuFamily::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AgnusFamily {
    #[default]
    Unknown,
    OcsNtsc,
    OcsPal,
    EcsNtsc,
    EcsPal,
    AliceNtsc,
    AlicePal,
    Saga,
}

impl AgnusFamily {
    pub const ALL: [AgnusFamily; 8] = [
        AgnusFamily::Unknown,
        AgnusFamily::OcsNtsc,
        AgnusFamily::OcsPal,
        AgnusFamily::EcsNtsc,
        AgnusFamily::EcsPal,
        AgnusFamily::AliceNtsc,
        AgnusFamily::AlicePal,
        AgnusFamily::Saga,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AgnusFamily::Unknown => "UNKNOWN",
            AgnusFamily::OcsNtsc => "OCS NTSC Agnus",
            AgnusFamily::OcsPal => "OCS PAL Agnus",
            AgnusFamily::EcsNtsc => "ECS NTSC Agnus",
            AgnusFamily::EcsPal => "ECS PAL Agnus",
            AgnusFamily::AliceNtsc => "NTSC Alice",
            AgnusFamily::AlicePal => "PAL Alice",
            AgnusFamily::Saga => "SAGA",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum DeniseFamily {
    #[default]
    Unknown,
    Ocs,
    Ecs,
    Lisa,
    Isabel,
    Monica,
}

impl DeniseFamily {
    pub const ALL: [DeniseFamily; 6] = [
        DeniseFamily::Unknown,
        DeniseFamily::Ocs,
        DeniseFamily::Ecs,
        DeniseFamily::Lisa,
        DeniseFamily::Isabel,
        DeniseFamily::Monica,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DeniseFamily::Unknown => "UNKNOWN",
            DeniseFamily::Ocs => "OCS Denise",
            DeniseFamily::Ecs => "ECS Denise",
            DeniseFamily::Lisa => "Lisa",
            DeniseFamily::Isabel => "Isabel",
            DeniseFamily::Monica => "Monica",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum PaulaFamily {
    #[default]
    Unknown,
    Original,
    Saga,
}

impl PaulaFamily {
    pub const ALL: [PaulaFamily; 3] = [PaulaFamily::Unknown, PaulaFamily::Original, PaulaFamily::Saga];

    pub fn label(self) -> &'static str {
        match self {
            PaulaFamily::Unknown => "UNKNOWN",
            PaulaFamily::Original => "Paula",
            PaulaFamily::Saga => "SAGA Paula",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ClockChip {
    /// Not probed because the board generation keeps no clock at the usual address.
    #[default]
    NotProbed,
    None,
    Msm6242b,
    Rp5c01a,
}

impl ClockChip {
    pub const ALL: [ClockChip; 4] = [ClockChip::NotProbed, ClockChip::None, ClockChip::Msm6242b, ClockChip::Rp5c01a];

    pub fn label(self) -> &'static str {
        match self {
            ClockChip::NotProbed => NOT_AVAILABLE,
            ClockChip::None => "NOT FOUND",
            ClockChip::Msm6242b => "OKI MSM6242B",
            ClockChip::Rp5c01a => "RICOH RP5C01A",
        }
    }
}

/// Motherboard bus controller generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum BusController {
    #[default]
    Unknown,
    /// No controller at all; custom chip registers are mirrored.
    A1000,
    /// Gary (A500, A2000, CDTV).
    A500,
    /// Gayle (A600, A1200), carries a revision byte.
    Gayle,
    /// Fat Gary (A3000, A4000).
    FatGary,
}

impl BusController {
    pub const ALL: [BusController; 5] = [
        BusController::Unknown,
        BusController::A1000,
        BusController::A500,
        BusController::Gayle,
        BusController::FatGary,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BusController::Unknown => "UNKNOWN",
            BusController::A1000 => "A1000 (none)",
            BusController::A500 => "Gary",
            BusController::Gayle => "Gayle",
            BusController::FatGary => "Fat Gary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum MemoryController {
    #[default]
    Absent,
    Ramsey04,
    Ramsey07,
    Unknown,
}

impl MemoryController {
    pub const ALL: [MemoryController; 4] = [
        MemoryController::Absent,
        MemoryController::Ramsey04,
        MemoryController::Ramsey07,
        MemoryController::Unknown,
    ];

    pub fn is_present(self) -> bool {
        self != MemoryController::Absent
    }

    pub fn label(self) -> &'static str {
        match self {
            MemoryController::Absent => NOT_AVAILABLE,
            MemoryController::Ramsey04 => "Ramsey-04",
            MemoryController::Ramsey07 => "Ramsey-07",
            MemoryController::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum DmaController {
    #[default]
    Absent,
    Sdmac02,
    Sdmac04,
    ReSdmac,
    /// A4000T on-board SCSI; no SDMAC at all.
    Ncr53c710,
    Unknown,
}

impl DmaController {
    pub const ALL: [DmaController; 6] = [
        DmaController::Absent,
        DmaController::Sdmac02,
        DmaController::Sdmac04,
        DmaController::ReSdmac,
        DmaController::Ncr53c710,
        DmaController::Unknown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DmaController::Absent => NOT_AVAILABLE,
            DmaController::Sdmac02 => "SDMAC-02",
            DmaController::Sdmac04 => "SDMAC-04",
            DmaController::ReSdmac => "ReSDMAC",
            DmaController::Ncr53c710 => "NCR 53C710",
            DmaController::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum VideoStandard {
    #[default]
    Ntsc,
    Pal,
}

impl VideoStandard {
    pub fn label(self) -> &'static str {
        match self {
            VideoStandard::Ntsc => "NTSC",
            VideoStandard::Pal => "PAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheFlags {
    pub icache: bool,
    pub dcache: bool,
    pub iburst: bool,
    pub dburst: bool,
    pub copyback: bool,
}

impl CacheFlags {
    pub const NONE: CacheFlags = CacheFlags {
        icache: false,
        dcache: false,
        iburst: false,
        dburst: false,
        copyback: false,
    };

    pub fn as_array(&self) -> [bool; 5] {
        [self.icache, self.dcache, self.iburst, self.dburst, self.copyback]
    }

    pub fn get(&self, feature: CacheFeature) -> bool {
        match feature {
            CacheFeature::InstructionCache => self.icache,
            CacheFeature::DataCache => self.dcache,
            CacheFeature::InstructionBurst => self.iburst,
            CacheFeature::DataBurst => self.dburst,
            CacheFeature::CopyBack => self.copyback,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CacheFeature {
    InstructionCache,
    DataCache,
    InstructionBurst,
    DataBurst,
    CopyBack,
}

impl CacheFeature {
    pub const ALL: [CacheFeature; 5] = [
        CacheFeature::InstructionCache,
        CacheFeature::DataCache,
        CacheFeature::InstructionBurst,
        CacheFeature::DataBurst,
        CacheFeature::CopyBack,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CacheFeature::InstructionCache => "ICache",
            CacheFeature::DataCache => "DCache",
            CacheFeature::InstructionBurst => "IBurst",
            CacheFeature::DataBurst => "DBurst",
            CacheFeature::CopyBack => "CBack",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheState {
    /// Fixed by processor family.
    pub available: CacheFlags,
    /// Live CACR contents, only meaningful where `available` is set.
    pub enabled: CacheFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RamseyConfig {
    pub page_mode: bool,
    pub burst_mode: bool,
    pub wrap_mode: bool,
    pub size_1m: bool,
    pub skip_mode: bool,
    pub refresh_rate: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScreenTiming {
    pub standard: VideoStandard,
    pub horiz_hz: u32,
    pub vert_hz: u32,
    pub supply_hz: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RomInfo {
    pub version: u16,
    pub revision: u16,
    pub patch_version: u16,
    pub patch_revision: u16,
    pub size_kb: u32,
}

impl RomInfo {
    /// A soft-loaded ROM update runs on top of the physical ROM.
    pub fn has_patch(&self) -> bool {
        (self.patch_version, self.patch_revision) != (self.version, self.revision)
    }
}

/// Everything the classifier learned about the machine.
///
/// Built once by [`crate::detect_hardware`]. Afterwards only the cache
/// `enabled` flags (cache toggles) and the two clock fields (benchmark
/// calibration) change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HardwareDescription {
    pub cpu: CpuFamily,
    pub cpu_revision: u16,
    /// Hundredths of MHz, 0 when not measured.
    pub cpu_mhz: u32,
    pub superscalar_enabled: bool,

    pub fpu: FpuFamily,
    pub fpu_mhz: u32,
    pub fpu_enabled: bool,

    pub mmu: MmuFamily,
    pub mmu_enabled: bool,

    pub vbr: u32,
    /// Where this program was loaded.
    pub code_address: u32,

    pub cache: CacheState,

    pub agnus: AgnusFamily,
    pub agnus_rev: u16,
    pub denise: DeniseFamily,
    pub denise_rev: u16,
    pub paula: PaulaFamily,
    pub paula_rev: u16,
    pub max_chip_ram: u32,

    pub bus_controller: BusController,
    pub gary_rev: u8,
    pub memory_controller: MemoryController,
    pub ramsey_rev: u8,
    pub ramsey: RamseyConfig,
    pub max_board_ram: u32,
    pub dma_controller: DmaController,
    pub dma_rev: u8,

    pub clock: ClockChip,

    pub has_zorro_slots: bool,
    pub zorro_iii: bool,
    pub has_pcmcia: bool,

    pub timing: ScreenTiming,
    pub eclock_hz: u32,

    pub rom: RomInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_order_runs_oldest_to_newest() {
        assert!(CpuFamily::M68000 < CpuFamily::M68010);
        assert!(CpuFamily::M68030 < CpuFamily::M68040);
        assert!(CpuFamily::M68LC060 < CpuFamily::M68080);
        assert!(CpuFamily::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn unknown_never_satisfies_a_capability_check() {
        assert!(!CpuFamily::Unknown.at_least(CpuFamily::M68000));
        assert!(CpuFamily::M68030.at_least(CpuFamily::M68020));
        assert!(!CpuFamily::M68010.at_least(CpuFamily::M68020));
    }

    #[test]
    fn rom_patch_is_flagged_only_when_versions_differ() {
        let mut rom = RomInfo { version: 40, revision: 68, patch_version: 40, patch_revision: 68, size_kb: 512 };
        assert!(!rom.has_patch());
        rom.patch_version = 47;
        rom.patch_revision = 96;
        assert!(rom.has_patch());
    }
}
