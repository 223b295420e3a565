use log::{debug, warn};

use crate::bus::RegisterAccess;
use crate::hardware::{CacheFeature, CacheFlags, CpuFamily, FpuFamily, HardwareDescription, MmuFamily};
use crate::host::{CpuProbe, SystemServices, FPU040_LIBRARY, FPU060_LIBRARY, MMU_LIBRARY};
use crate::regs::{self, attn, cacr, pcr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuInfo {
    pub family: CpuFamily,
    pub revision: u16,
    pub superscalar: bool,
}

pub fn detect_cpu<B, H>(bus: &mut B, host: &mut H) -> CpuInfo
where
    B: RegisterAccess + ?Sized,
    H: CpuProbe + ?Sized,
{
    let flags = host.attn_flags();

    if flags & attn::M68080 != 0 {
        return CpuInfo { family: CpuFamily::M68080, ..Default::default() };
    }
    if flags & attn::M68060 != 0 {
        return detect_68060(host);
    }

    let family = if flags & attn::M68040 != 0 {
        if host.has_fpu() {
            CpuFamily::M68040
        } else if host.has_mmu(CpuFamily::M68040) {
            CpuFamily::M68LC040
        } else {
            CpuFamily::M68EC040
        }
    } else if flags & attn::M68030 != 0 {
        if host.has_mmu(CpuFamily::M68030) {
            CpuFamily::M68030
        } else {
            CpuFamily::M68EC030
        }
    } else if flags & attn::M68020 != 0 {
        // only 24 address lines: bit 28 is dropped and the mirror aliases the ROM
        let direct = bus.read_word(regs::ROM_VERSION);
        let mirrored = bus.read_word(regs::ROM_VERSION_MIRROR);
        if direct == mirrored {
            CpuFamily::M68EC020
        } else {
            CpuFamily::M68020
        }
    } else if flags & attn::M68010 != 0 {
        CpuFamily::M68010
    } else {
        CpuFamily::M68000
    };

    CpuInfo { family, ..Default::default() }
}

fn detect_68060<H: CpuProbe + ?Sized>(host: &mut H) -> CpuInfo {
    let Some(config) = host.processor_config() else {
        warn!("68060 flagged but processor configuration register unreadable");
        return CpuInfo::default();
    };

    let family = match config >> pcr::ID_SHIFT {
        pcr::ID_FULL => CpuFamily::M68060,
        pcr::ID_REDUCED => {
            if host.has_mmu(CpuFamily::M68060) {
                CpuFamily::M68LC060
            } else {
                CpuFamily::M68EC060
            }
        }
        other => {
            warn!("unexpected 68060 id {other:#06x}");
            CpuFamily::Unknown
        }
    };

    CpuInfo {
        family,
        revision: ((config >> pcr::REVISION_SHIFT) & 0xFF) as u16,
        superscalar: config & pcr::SUPERSCALAR != 0,
    }
}

/// Returns the FPU family and whether it can be used right now.
pub fn detect_fpu<H>(host: &mut H, cpu: CpuFamily) -> (FpuFamily, bool)
where
    H: CpuProbe + SystemServices + ?Sized,
{
    let fpu = match cpu {
        CpuFamily::M68040 => FpuFamily::M68040,
        CpuFamily::M68060 => FpuFamily::M68060,
        CpuFamily::M68080 => FpuFamily::M68080,
        CpuFamily::M68LC040 | CpuFamily::M68EC040 | CpuFamily::M68LC060 | CpuFamily::M68EC060 => FpuFamily::None,
        _ => {
            let flags = host.attn_flags();
            if flags & attn::M68882 != 0 {
                FpuFamily::M68882
            } else if flags & attn::M68881 != 0 {
                FpuFamily::M68881
            } else if host.has_fpu() {
                FpuFamily::Unknown
            } else {
                FpuFamily::None
            }
        }
    };

    // integrated units trap on most instructions without their support library
    let enabled = match fpu {
        FpuFamily::M68881 | FpuFamily::M68882 | FpuFamily::M68080 => true,
        FpuFamily::M68040 => host.module_loaded(FPU040_LIBRARY),
        FpuFamily::M68060 => host.module_loaded(FPU060_LIBRARY),
        FpuFamily::None | FpuFamily::Unknown => false,
    };

    (fpu, enabled)
}

pub fn detect_mmu<H>(host: &mut H, cpu: CpuFamily) -> (MmuFamily, bool)
where
    H: CpuProbe + SystemServices + ?Sized,
{
    let mmu = match cpu {
        CpuFamily::M68030 => MmuFamily::M68030,
        CpuFamily::M68040 | CpuFamily::M68LC040 => MmuFamily::M68040,
        CpuFamily::M68060 | CpuFamily::M68LC060 => MmuFamily::M68060,
        CpuFamily::M68020 => {
            if host.has_mmu(CpuFamily::M68020) {
                MmuFamily::M68851
            } else {
                MmuFamily::None
            }
        }
        CpuFamily::Unknown => MmuFamily::Unknown,
        _ => MmuFamily::None,
    };

    let enabled = mmu.is_present() && host.module_loaded(MMU_LIBRARY);
    (mmu, enabled)
}

pub fn detect_vbr<H: CpuProbe + ?Sized>(host: &mut H, cpu: CpuFamily) -> u32 {
    // MOVEC is privileged-illegal on a 68000
    if cpu.at_least(CpuFamily::M68010) {
        host.vector_base()
    } else {
        0
    }
}

/// Caches a processor family physically has.
pub fn cache_capabilities(cpu: CpuFamily) -> CacheFlags {
    if !cpu.is_known() {
        return CacheFlags::NONE;
    }
    let data = cpu.at_least(CpuFamily::M68030);
    CacheFlags {
        icache: cpu.at_least(CpuFamily::M68020),
        dcache: data,
        iburst: data,
        dburst: data,
        copyback: cpu.at_least(CpuFamily::M68040) && cpu != CpuFamily::M68LC040,
    }
}

fn cacr_bit(feature: CacheFeature) -> u32 {
    match feature {
        CacheFeature::InstructionCache => cacr::ENABLE_I,
        CacheFeature::DataCache => cacr::ENABLE_D,
        CacheFeature::InstructionBurst => cacr::IBURST,
        CacheFeature::DataBurst => cacr::DBURST,
        CacheFeature::CopyBack => cacr::COPYBACK,
    }
}

fn decode_cacr(value: u32, available: &CacheFlags) -> CacheFlags {
    let on = |feature| available.get(feature) && value & cacr_bit(feature) != 0;
    CacheFlags {
        icache: on(CacheFeature::InstructionCache),
        dcache: on(CacheFeature::DataCache),
        iburst: on(CacheFeature::InstructionBurst),
        dburst: on(CacheFeature::DataBurst),
        copyback: on(CacheFeature::CopyBack),
    }
}

/// Re-reads the cache control register into the enabled flags.
pub fn refresh_cache_status<H: CpuProbe + ?Sized>(hw: &mut HardwareDescription, host: &mut H) {
    hw.cache.available = cache_capabilities(hw.cpu);
    if hw.cache.available == CacheFlags::NONE {
        hw.cache.enabled = CacheFlags::NONE;
        return;
    }
    let value = host.cache_control(0, 0);
    hw.cache.enabled = decode_cacr(value, &hw.cache.available);
    debug!("CACR {value:#010x} -> {:?}", hw.cache.enabled);
}

/// Flips one cache feature. Returns the new state, or `None` if the processor
/// lacks the feature, in which case nothing is touched.
pub fn toggle_cache<H: CpuProbe + ?Sized>(
    hw: &mut HardwareDescription,
    host: &mut H,
    feature: CacheFeature,
) -> Option<bool> {
    if !hw.cache.available.get(feature) {
        return None;
    }
    let bit = cacr_bit(feature);
    let bits = if hw.cache.enabled.get(feature) { 0 } else { bit };
    host.cache_control(bits, bit);
    refresh_cache_status(hw, host);
    Some(hw.cache.enabled.get(feature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Register, ScriptedBus, SimulatedHost};

    fn host_with(flags: u16) -> SimulatedHost {
        SimulatedHost { attn: flags, ..Default::default() }
    }

    fn detect(host: &mut SimulatedHost) -> CpuInfo {
        let mut bus = ScriptedBus::new(1)
            .with(regs::ROM_VERSION, Register::Fixed(40))
            .with(regs::ROM_VERSION_MIRROR, Register::Fixed(40));
        detect_cpu(&mut bus, host)
    }

    #[test]
    fn plain_68000_needs_no_probes() {
        let mut host = host_with(0);
        assert_eq!(detect(&mut host).family, CpuFamily::M68000);
        assert_eq!(host.mmu_probes + host.fpu_probes, 0);
    }

    #[test]
    fn ec020_is_recognised_by_the_wrapping_mirror() {
        let mut host = host_with(attn::M68010 | attn::M68020);
        assert_eq!(detect(&mut host).family, CpuFamily::M68EC020);

        let mut bus = ScriptedBus::new(1)
            .with(regs::ROM_VERSION, Register::Fixed(40))
            .with(regs::ROM_VERSION_MIRROR, Register::Fixed(0xFFFF));
        assert_eq!(detect_cpu(&mut bus, &mut host).family, CpuFamily::M68020);
    }

    #[test]
    fn mmu_probe_splits_68030_variants() {
        let flags = attn::M68010 | attn::M68020 | attn::M68030;
        let mut host = SimulatedHost { attn: flags, mmu: true, ..Default::default() };
        assert_eq!(detect(&mut host).family, CpuFamily::M68030);
        host.mmu = false;
        assert_eq!(detect(&mut host).family, CpuFamily::M68EC030);
    }

    #[test]
    fn probes_split_68040_variants() {
        let flags = attn::M68010 | attn::M68020 | attn::M68030 | attn::M68040;
        let mut host = SimulatedHost { attn: flags, fpu: true, mmu: true, ..Default::default() };
        assert_eq!(detect(&mut host).family, CpuFamily::M68040);
        host.fpu = false;
        assert_eq!(detect(&mut host).family, CpuFamily::M68LC040);
        host.mmu = false;
        assert_eq!(detect(&mut host).family, CpuFamily::M68EC040);
    }

    #[test]
    fn pcr_decides_68060_variant_and_revision() {
        let mut host = SimulatedHost {
            attn: attn::M68040 | attn::M68060,
            pcr: Some(0x0430_0601),
            ..Default::default()
        };
        let info = detect(&mut host);
        assert_eq!(info.family, CpuFamily::M68060);
        assert_eq!(info.revision, 6);
        assert!(info.superscalar);

        host.pcr = Some(0x0431_0100);
        host.mmu = true;
        let info = detect(&mut host);
        assert_eq!(info.family, CpuFamily::M68LC060);
        assert!(!info.superscalar);

        host.mmu = false;
        assert_eq!(detect(&mut host).family, CpuFamily::M68EC060);

        host.pcr = Some(0x0999_0000);
        assert_eq!(detect(&mut host).family, CpuFamily::Unknown);
    }

    #[test]
    fn integrated_fpu_needs_its_library() {
        let mut host = SimulatedHost::default();
        assert_eq!(detect_fpu(&mut host, CpuFamily::M68040), (FpuFamily::M68040, false));
        host.modules.push(FPU040_LIBRARY.to_string());
        assert_eq!(detect_fpu(&mut host, CpuFamily::M68040), (FpuFamily::M68040, true));
        assert_eq!(detect_fpu(&mut host, CpuFamily::M68060), (FpuFamily::M68060, false));
        assert_eq!(detect_fpu(&mut host, CpuFamily::M68080), (FpuFamily::M68080, true));
        assert_eq!(detect_fpu(&mut host, CpuFamily::M68LC040), (FpuFamily::None, false));
    }

    #[test]
    fn coprocessor_flags_prefer_68882() {
        let mut host = host_with(attn::M68881 | attn::M68882);
        assert_eq!(detect_fpu(&mut host, CpuFamily::M68030), (FpuFamily::M68882, true));
        host.attn = attn::M68881;
        assert_eq!(detect_fpu(&mut host, CpuFamily::M68020), (FpuFamily::M68881, true));
        host.attn = 0;
        host.fpu = true;
        assert_eq!(detect_fpu(&mut host, CpuFamily::M68020), (FpuFamily::Unknown, false));
    }

    #[test]
    fn mmu_follows_the_refined_family() {
        let mut host = SimulatedHost::default();
        assert_eq!(detect_mmu(&mut host, CpuFamily::M68EC030).0, MmuFamily::None);
        assert_eq!(detect_mmu(&mut host, CpuFamily::M68LC040).0, MmuFamily::M68040);
        assert_eq!(detect_mmu(&mut host, CpuFamily::M68LC060).0, MmuFamily::M68060);
        assert_eq!(detect_mmu(&mut host, CpuFamily::M68080).0, MmuFamily::None);
        assert_eq!(host.mmu_probes, 0);

        host.mmu = true;
        assert_eq!(detect_mmu(&mut host, CpuFamily::M68020), (MmuFamily::M68851, false));
        host.modules.push(MMU_LIBRARY.to_string());
        assert_eq!(detect_mmu(&mut host, CpuFamily::M68030), (MmuFamily::M68030, true));
    }

    #[test]
    fn vbr_is_not_read_on_a_68000() {
        let mut host = SimulatedHost { vbr: 0x0800_0000, ..Default::default() };
        assert_eq!(detect_vbr(&mut host, CpuFamily::M68000), 0);
        assert_eq!(host.vbr_reads, 0);
        assert_eq!(detect_vbr(&mut host, CpuFamily::M68030), 0x0800_0000);
    }

    #[test]
    fn cache_capability_table() {
        assert_eq!(cache_capabilities(CpuFamily::M68000), CacheFlags::NONE);
        assert_eq!(cache_capabilities(CpuFamily::M68EC020).as_array(), [true, false, false, false, false]);
        assert_eq!(cache_capabilities(CpuFamily::M68030).as_array(), [true, true, true, true, false]);
        assert_eq!(cache_capabilities(CpuFamily::M68040).as_array(), [true; 5]);
        assert!(!cache_capabilities(CpuFamily::M68LC040).copyback);
        assert!(cache_capabilities(CpuFamily::M68EC040).copyback);
        assert_eq!(cache_capabilities(CpuFamily::Unknown), CacheFlags::NONE);
    }

    #[test]
    fn cacr_is_only_read_when_there_is_a_cache() {
        let mut host = SimulatedHost { cacr: cacr::ENABLE_I, ..Default::default() };
        let mut hw = HardwareDescription { cpu: CpuFamily::M68000, ..Default::default() };
        refresh_cache_status(&mut hw, &mut host);
        assert_eq!(host.cacr_reads, 0);

        hw.cpu = CpuFamily::M68030;
        refresh_cache_status(&mut hw, &mut host);
        assert_eq!(host.cacr_reads, 1);
        assert!(hw.cache.enabled.icache);
        assert!(!hw.cache.enabled.dcache);
    }

    #[test]
    fn toggling_flips_one_bit_and_refreshes() {
        let mut host = SimulatedHost { cacr: cacr::ENABLE_I | cacr::ENABLE_D, ..Default::default() };
        let mut hw = HardwareDescription { cpu: CpuFamily::M68030, ..Default::default() };
        refresh_cache_status(&mut hw, &mut host);

        assert_eq!(toggle_cache(&mut hw, &mut host, CacheFeature::DataCache), Some(false));
        assert_eq!(host.cacr, cacr::ENABLE_I);
        assert_eq!(toggle_cache(&mut hw, &mut host, CacheFeature::DataBurst), Some(true));
        assert_eq!(host.cacr, cacr::ENABLE_I | cacr::DBURST);

        let before = host.cacr;
        assert_eq!(toggle_cache(&mut hw, &mut host, CacheFeature::CopyBack), None);
        assert_eq!(host.cacr, before);
    }
}
