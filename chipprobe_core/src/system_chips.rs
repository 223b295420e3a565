//! Motherboard controllers: Gary family, Ramsey, SCSI DMA and the expansion bus.
//!
//! Every probe that writes a register puts the saved value back before it
//! returns, on every path.

use log::{debug, warn};

use crate::bus::RegisterAccess;
use crate::hardware::{BusController, DmaController, MemoryController, RamseyConfig};
use crate::host::{SystemServices, CARD_RESOURCE};
use crate::regs::{self, istr, ramsey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaryInfo {
    pub controller: BusController,
    /// Gayle revision, zero for everything else.
    pub revision: u8,
}

impl GaryInfo {
    fn plain(controller: BusController) -> Self {
        GaryInfo { controller, revision: 0 }
    }
}

pub fn detect_gary<B: RegisterAccess + ?Sized>(bus: &mut B) -> GaryInfo {
    if custom_chips_mirrored(bus) {
        debug!("custom chip registers mirrored at $DA0000: A1000");
        return GaryInfo::plain(BusController::A1000);
    }

    if fat_gary_power_register(bus) {
        debug!("power register bit 7 settable and clearable: Fat Gary");
        return GaryInfo::plain(BusController::FatGary);
    }

    match read_gayle_id(bus) {
        Some(id) if id != 0x00 && id != 0xFF => {
            debug!("gayle id {id:#04x}");
            GaryInfo { controller: BusController::Gayle, revision: id }
        }
        id => {
            debug!("no gayle id ({id:?}): Gary");
            GaryInfo::plain(BusController::A500)
        }
    }
}

fn custom_chips_mirrored<B: RegisterAccess + ?Sized>(bus: &mut B) -> bool {
    let mut mirrored = |reg, other, mirror| {
        let direct = bus.read_word(reg);
        bus.settle(other);
        direct == bus.read_word(mirror)
    };
    mirrored(regs::JOY0DAT, regs::JOY1DAT, regs::JOY0DAT_MIRROR)
        && mirrored(regs::JOY1DAT, regs::JOY0DAT, regs::JOY1DAT_MIRROR)
}

fn fat_gary_power_register<B: RegisterAccess + ?Sized>(bus: &mut B) -> bool {
    let saved = bus.read_byte(regs::FAT_GARY_POWER);
    let cycle = regs::FAT_GARY_POWER_CYCLE;

    bus.write_byte(regs::FAT_GARY_POWER, cycle);
    bus.settle(regs::JOY0DAT);
    let set = bus.read_byte(regs::FAT_GARY_POWER) & cycle == cycle;

    let cleared = set && {
        bus.write_byte(regs::FAT_GARY_POWER, 0);
        bus.settle(regs::JOY0DAT);
        bus.read_byte(regs::FAT_GARY_POWER) & cycle == 0
    };

    bus.write_byte(regs::FAT_GARY_POWER, saved);
    set && cleared
}

/// Gayle shifts its id out through bit 7, one bit per read, MSB first.
/// `None` when the first read just echoes the last bus value (plain Gary).
fn read_gayle_id<B: RegisterAccess + ?Sized>(bus: &mut B) -> Option<u8> {
    let echo = bus.read_byte(regs::BLTDDAT);
    bus.write_byte(regs::GAYLE_ID, 0);

    let mut id = 0u8;
    for i in 0..8 {
        let value = bus.read_byte(regs::GAYLE_ID);
        if i == 0 && value == echo {
            return None;
        }
        id = (id << 1) | (value >> 7);
    }
    Some(id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RamseyInfo {
    pub controller: MemoryController,
    pub revision: u8,
    pub config: RamseyConfig,
}

pub fn detect_ramsey<B: RegisterAccess + ?Sized>(bus: &mut B, gary: BusController) -> RamseyInfo {
    if gary != BusController::FatGary {
        return RamseyInfo::default();
    }

    let revision = bus.read_byte(regs::RAMSEY_VERSION);
    let controller = match revision {
        0x00 | 0xFF => return RamseyInfo::default(),
        ramsey::REV_04 => MemoryController::Ramsey04,
        ramsey::REV_07 => MemoryController::Ramsey07,
        _ => MemoryController::Unknown,
    };

    let ctl = bus.read_byte(regs::RAMSEY_CTRL);
    let config = RamseyConfig {
        page_mode: ctl & ramsey::PAGE_MODE != 0,
        burst_mode: ctl & ramsey::BURST_MODE != 0,
        wrap_mode: ctl & ramsey::WRAP_MODE != 0,
        size_1m: ctl & ramsey::SIZE_1M != 0,
        skip_mode: ctl & ramsey::SKIP_MODE != 0,
        refresh_rate: (ctl >> ramsey::REFRESH_SHIFT) & ramsey::REFRESH_MASK,
    };
    debug!("ramsey rev {revision:#04x}, control {ctl:#04x}");

    RamseyInfo { controller, revision, config }
}

pub const WTC_PATTERNS: [u32; 6] = [0x0000_0000, 0xFFFF_FFFF, 0xA5A5_A5A5, 0x5A5A_5A5A, 0xC2C2_C3C3, 0x3C3C_3C3C];

const WTC_BIT2: u32 = 1 << 2;

/// What one write/read-back pass of the WTC probe says about the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WtcEvidence {
    /// Read back exactly as written; consistent with either revision.
    Unchanged,
    /// Only the upper byte differs.
    Rev02,
    /// Bit 2 forced low.
    Rev04,
    Unexplained,
}

pub fn classify_wtc(written: u32, read: u32) -> WtcEvidence {
    if read == written {
        WtcEvidence::Unchanged
    } else if (read ^ written) & 0x00FF_FFFF == 0 {
        WtcEvidence::Rev02
    } else if read & WTC_BIT2 == 0 && written & WTC_BIT2 != 0 {
        WtcEvidence::Rev04
    } else {
        WtcEvidence::Unexplained
    }
}

/// Combines the evidence of all passes; a single pass never decides alone.
pub fn aggregate_wtc(passes: &[WtcEvidence]) -> DmaController {
    let votes_02 = passes.iter().any(|e| *e == WtcEvidence::Rev02);
    let votes_04 = passes.iter().any(|e| *e == WtcEvidence::Rev04);

    if passes.contains(&WtcEvidence::Unexplained) {
        return DmaController::Unknown;
    }
    match (votes_02, votes_04) {
        (true, true) => DmaController::Unknown,
        (true, false) => DmaController::Sdmac02,
        (false, true) => DmaController::Sdmac04,
        // nothing but faithful echoes: a plain latch, not an SDMAC
        (false, false) => DmaController::Absent,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DmaInfo {
    pub controller: DmaController,
    pub revision: u8,
}

pub fn detect_dma<B: RegisterAccess + ?Sized>(bus: &mut B, memory: MemoryController) -> DmaInfo {
    if !memory.is_present() {
        return DmaInfo::default();
    }

    let revision = bus.read_byte(regs::SDMAC_REVISION);
    if revision != 0x00 && revision != 0xFF {
        debug!("ReSDMAC rev {revision:#04x}");
        return DmaInfo { controller: DmaController::ReSdmac, revision };
    }

    let ncr = bus.read_byte(regs::NCR_CTEST8) >> 4;
    if ncr != 0x0 && ncr != 0xF {
        debug!("NCR 53C710 rev {ncr}");
        return DmaInfo { controller: DmaController::Ncr53c710, revision: ncr };
    }

    let status = bus.read_byte(regs::SDMAC_ISTR);
    let both = istr::FIFO_EMPTY | istr::FIFO_FULL;
    if status == 0xFF || status & both == both {
        debug!("implausible ISTR {status:#04x}: no SDMAC");
        return DmaInfo::default();
    }

    let evidence: Vec<WtcEvidence> = WTC_PATTERNS
        .iter()
        .map(|&pattern| {
            let saved = bus.read_long(regs::SDMAC_WTC_ALT);
            bus.write_long(regs::SDMAC_WTC_ALT, pattern);
            // any write to Ramsey flushes the posted write out to the SDMAC
            bus.write_byte(regs::RAMSEY_VERSION, 0);
            let read = bus.read_long(regs::SDMAC_WTC);
            bus.write_long(regs::SDMAC_WTC_ALT, saved);
            classify_wtc(pattern, read)
        })
        .collect();

    let controller = aggregate_wtc(&evidence);
    if controller == DmaController::Unknown {
        warn!("inconsistent SDMAC WTC readback: {evidence:?}");
    }
    let revision = match controller {
        DmaController::Sdmac02 => 2,
        DmaController::Sdmac04 => 4,
        _ => 0,
    };
    DmaInfo { controller, revision }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slots {
    pub zorro: bool,
    pub zorro_iii: bool,
    pub pcmcia: bool,
}

/// First conclusive check wins.
pub fn detect_slots<S: SystemServices + ?Sized>(
    services: &mut S,
    gary: BusController,
    memory: MemoryController,
) -> Slots {
    if services.resource_present(CARD_RESOURCE) {
        return Slots { pcmcia: true, ..Default::default() };
    }
    if memory.is_present() {
        return Slots { zorro: true, zorro_iii: true, ..Default::default() };
    }
    if gary == BusController::Gayle {
        return Slots { pcmcia: true, ..Default::default() };
    }
    Slots { zorro: true, ..Default::default() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Register, ScriptedBus, SimulatedHost};

    fn gayle_bus(id: u8) -> ScriptedBus {
        ScriptedBus::new(5)
            .with(regs::JOY0DAT, Register::Fixed(0x0101))
            .with(regs::JOY1DAT, Register::Fixed(0x0202))
            .with(regs::BLTDDAT, Register::Fixed(0x5A5A))
            .with(regs::FAT_GARY_POWER, Register::Fixed(0x00))
            .with(regs::GAYLE_ID, Register::serial_id(id, 0x00))
    }

    #[test]
    fn mirrored_joystick_registers_mean_a1000() {
        let mut bus = ScriptedBus::new(5)
            .with(regs::JOY0DAT, Register::Fixed(0x1234))
            .with(regs::JOY1DAT, Register::Fixed(0x4321))
            .with(regs::JOY0DAT_MIRROR, Register::mirror(regs::JOY0DAT))
            .with(regs::JOY1DAT_MIRROR, Register::mirror(regs::JOY1DAT));
        assert_eq!(detect_gary(&mut bus).controller, BusController::A1000);
        assert_eq!(bus.writes().count(), 0);
    }

    #[test]
    fn one_matching_mirror_is_not_enough() {
        let mut bus = gayle_bus(0xD0)
            .with(regs::JOY0DAT_MIRROR, Register::mirror(regs::JOY0DAT))
            .with(regs::JOY1DAT_MIRROR, Register::Fixed(0xBEEF));
        assert_eq!(detect_gary(&mut bus).controller, BusController::Gayle);
    }

    #[test]
    fn fat_gary_power_register_is_restored() {
        let mut bus = ScriptedBus::new(5)
            .with(regs::JOY0DAT, Register::Fixed(0x0101))
            .with(regs::JOY1DAT, Register::Fixed(0x0202))
            .with(regs::FAT_GARY_POWER, Register::latch(0x80, 0x80));
        assert_eq!(detect_gary(&mut bus).controller, BusController::FatGary);
        assert_eq!(bus.peek(regs::FAT_GARY_POWER), 0x80);
        assert_eq!(bus.writes_to(regs::FAT_GARY_POWER), vec![0x80, 0x00, 0x80]);
    }

    #[test]
    fn settable_but_sticky_power_register_is_not_fat_gary() {
        let mut bus = gayle_bus(0xD0).with(regs::FAT_GARY_POWER, Register::Fixed(0x80));
        assert_eq!(detect_gary(&mut bus).controller, BusController::Gayle);
        assert_eq!(bus.writes_to(regs::FAT_GARY_POWER).last(), Some(&0x80));
    }

    #[test]
    fn gayle_id_is_shifted_in_msb_first() {
        let mut bus = gayle_bus(0xD1);
        assert_eq!(
            detect_gary(&mut bus),
            GaryInfo { controller: BusController::Gayle, revision: 0xD1 }
        );
        assert_eq!(bus.reads_of(regs::GAYLE_ID), 8);
    }

    #[test]
    fn gayle_echo_of_blitter_data_means_gary() {
        let mut bus = gayle_bus(0).with(regs::GAYLE_ID, Register::mirror(regs::BLTDDAT));
        assert_eq!(detect_gary(&mut bus).controller, BusController::A500);
        assert_eq!(bus.reads_of(regs::GAYLE_ID), 1);
    }

    #[test]
    fn degenerate_gayle_ids_mean_gary() {
        let mut bus = gayle_bus(0xFF);
        assert_eq!(detect_gary(&mut bus).controller, BusController::A500);
        let mut bus = gayle_bus(0x00);
        assert_eq!(detect_gary(&mut bus).controller, BusController::A500);
    }

    #[test]
    fn ramsey_is_only_probed_behind_fat_gary() {
        let mut bus = ScriptedBus::new(5).with(regs::RAMSEY_VERSION, Register::Fixed(0x0F));
        assert_eq!(detect_ramsey(&mut bus, BusController::Gayle), RamseyInfo::default());
        assert_eq!(bus.reads_of(regs::RAMSEY_VERSION), 0);
    }

    #[test]
    fn ramsey_revision_and_control_register() {
        let mut bus = ScriptedBus::new(5)
            .with(regs::RAMSEY_VERSION, Register::Fixed(0x0F))
            .with(regs::RAMSEY_CTRL, Register::Fixed(0x4B));
        let info = detect_ramsey(&mut bus, BusController::FatGary);
        assert_eq!(info.controller, MemoryController::Ramsey07);
        assert_eq!(
            info.config,
            RamseyConfig {
                page_mode: true,
                burst_mode: true,
                wrap_mode: false,
                size_1m: true,
                skip_mode: false,
                refresh_rate: 2,
            }
        );

        let mut bus = ScriptedBus::new(5).with(regs::RAMSEY_VERSION, Register::Fixed(0xFF));
        assert_eq!(detect_ramsey(&mut bus, BusController::FatGary).controller, MemoryController::Absent);

        let mut bus = ScriptedBus::new(5)
            .with(regs::RAMSEY_VERSION, Register::Fixed(0x0E))
            .with(regs::RAMSEY_CTRL, Register::Fixed(0));
        assert_eq!(detect_ramsey(&mut bus, BusController::FatGary).controller, MemoryController::Unknown);
    }

    fn sdmac_bus(wtc: Register) -> ScriptedBus {
        ScriptedBus::new(5)
            .with(regs::SDMAC_REVISION, Register::Fixed(0x00))
            .with(regs::NCR_CTEST8, Register::Fixed(0xFF))
            .with(regs::SDMAC_ISTR, Register::Fixed(istr::FIFO_EMPTY as u32))
            .with(regs::SDMAC_WTC_ALT, Register::latch(0x1234_5678, 0xFFFF_FFFF))
            .with(regs::SDMAC_WTC, wtc)
    }

    #[test]
    fn sdmac_02_drops_the_upper_byte() {
        let mut bus = sdmac_bus(Register::Mirror { of: regs::SDMAC_WTC_ALT, and: 0x00FF_FFFF, or: 0 });
        assert_eq!(detect_dma(&mut bus, MemoryController::Ramsey04).controller, DmaController::Sdmac02);
        assert_eq!(bus.peek(regs::SDMAC_WTC_ALT), 0x1234_5678);
    }

    #[test]
    fn sdmac_04_forces_bit_two_low() {
        let mut bus = sdmac_bus(Register::Mirror { of: regs::SDMAC_WTC_ALT, and: !WTC_BIT2, or: 0 });
        let info = detect_dma(&mut bus, MemoryController::Ramsey07);
        assert_eq!(info, DmaInfo { controller: DmaController::Sdmac04, revision: 4 });
        assert_eq!(bus.peek(regs::SDMAC_WTC_ALT), 0x1234_5678);
        assert_eq!(bus.writes_to(regs::RAMSEY_VERSION).len(), WTC_PATTERNS.len());
    }

    #[test]
    fn transparent_wtc_is_absent() {
        let mut bus = sdmac_bus(Register::mirror(regs::SDMAC_WTC_ALT));
        assert_eq!(detect_dma(&mut bus, MemoryController::Ramsey07).controller, DmaController::Absent);
    }

    #[test]
    fn contradicting_evidence_is_unknown() {
        use WtcEvidence::*;
        assert_eq!(aggregate_wtc(&[Rev02, Rev04, Unchanged]), DmaController::Unknown);
        assert_eq!(aggregate_wtc(&[Rev04, Unexplained]), DmaController::Unknown);
        assert_eq!(aggregate_wtc(&[Unchanged; 6]), DmaController::Absent);
        assert_eq!(classify_wtc(0xA5A5_A5A5, 0x00A5_A5A5), Rev02);
        assert_eq!(classify_wtc(0x3C3C_3C3C, 0x3C3C_3C38), Rev04);
        assert_eq!(classify_wtc(0x5A5A_5A5A, 0x1111_1111), Unexplained);
    }

    #[test]
    fn resdmac_and_ncr_are_checked_first() {
        let mut bus = sdmac_bus(Register::Fixed(0)).with(regs::SDMAC_REVISION, Register::Fixed(0x42));
        assert_eq!(
            detect_dma(&mut bus, MemoryController::Ramsey07),
            DmaInfo { controller: DmaController::ReSdmac, revision: 0x42 }
        );

        let mut bus = sdmac_bus(Register::Fixed(0)).with(regs::NCR_CTEST8, Register::Fixed(0x20));
        assert_eq!(
            detect_dma(&mut bus, MemoryController::Ramsey07),
            DmaInfo { controller: DmaController::Ncr53c710, revision: 2 }
        );
        assert_eq!(bus.writes().count(), 0);
    }

    #[test]
    fn implausible_fifo_status_skips_the_probe() {
        let both = (istr::FIFO_EMPTY | istr::FIFO_FULL) as u32;
        let mut bus = sdmac_bus(Register::Fixed(0)).with(regs::SDMAC_ISTR, Register::Fixed(both));
        assert_eq!(detect_dma(&mut bus, MemoryController::Ramsey07).controller, DmaController::Absent);
        assert_eq!(bus.writes().count(), 0);
    }

    #[test]
    fn no_memory_controller_no_dma_probe() {
        let mut bus = ScriptedBus::new(5);
        assert_eq!(detect_dma(&mut bus, MemoryController::Absent), DmaInfo::default());
        assert!(bus.log().is_empty());
    }

    #[test]
    fn slot_priority() {
        let mut host = SimulatedHost::default();
        let zorro3 = detect_slots(&mut host, BusController::FatGary, MemoryController::Ramsey07);
        assert_eq!(zorro3, Slots { zorro: true, zorro_iii: true, pcmcia: false });
        let gayle = detect_slots(&mut host, BusController::Gayle, MemoryController::Absent);
        assert_eq!(gayle, Slots { pcmcia: true, ..Default::default() });
        let zorro2 = detect_slots(&mut host, BusController::A500, MemoryController::Absent);
        assert_eq!(zorro2, Slots { zorro: true, ..Default::default() });

        host.resources.push(CARD_RESOURCE.to_string());
        let card = detect_slots(&mut host, BusController::FatGary, MemoryController::Ramsey07);
        assert_eq!(card, Slots { pcmcia: true, ..Default::default() });
    }
}
